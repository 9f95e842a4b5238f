use fibre_wire::{Class, ClassMap, Container, ManualWiringStrategy, WiringConfig};
use std::sync::Arc;

const WIRING: &str = r#"
share_by_default: true
services:
  - interface: Greeter
    class: ConsoleGreeter
    parameters:
      greeting: { literal: "Hello" }
      punctuation: { literal: "!" }
"#;

struct ConsoleGreeter {
  greeting: String,
  punctuation: String,
}

impl ConsoleGreeter {
  fn greet(&self, name: &str) -> String {
    format!("{}, {}{}", self.greeting, name, self.punctuation)
  }
}

fn main() -> fibre_wire::Result<()> {
  let classes = Arc::new(ClassMap::new());
  classes.insert(
    Class::new::<ConsoleGreeter>("ConsoleGreeter")
      .implements("Greeter")
      .constructor(|args| {
        Ok(ConsoleGreeter {
          greeting: args.cloned::<String>("greeting")?,
          punctuation: args.cloned::<String>("punctuation")?,
        })
      }),
  );

  let container = Container::with_strategy(ManualWiringStrategy::new(classes));
  container.configure(&WiringConfig::from_yaml_str(WIRING)?)?;

  let greeter = container.get_as::<ConsoleGreeter>("Greeter")?;
  println!("{}", greeter.greet("wire"));
  assert!(container.does_share(["Greeter"]));

  Ok(())
}
