use fibre_wire::{Binding, Container, ProviderRef, Result, ServiceProvider};
use std::sync::Arc;

struct Settings {
  environment: &'static str,
}

struct SettingsProvider {
  environment: &'static str,
}

impl ServiceProvider for SettingsProvider {
  fn register(&self, container: &Container) -> Result<()> {
    container.add_with("Settings", Binding::instance(Settings {
      environment: self.environment,
    }))?;
    Ok(())
  }
}

fn main() -> Result<()> {
  // An application-wide container and a request scoped one.
  let application = Arc::new(Container::new());
  let request = Arc::new(Container::new());

  application.register([ProviderRef::instance(SettingsProvider { environment: "production" })])?;
  request.register([ProviderRef::instance(SettingsProvider { environment: "scratch" })])?;

  // The request scope hands `Settings` over to the application container.
  request.ignore(["Settings"]).connect_with([&application]);

  let settings = request.get_as::<Settings>("Settings")?;
  println!("request sees the {} settings", settings.environment);
  assert_eq!(settings.environment, "production");

  request.unignore(["Settings"]);
  let local = request.get_as::<Settings>("Settings")?;
  println!("after unignore the request sees the {} settings", local.environment);

  Ok(())
}
