use fibre_wire::{literal, AutowiringStrategy, Class, ClassMap, Container, Extension};
use std::sync::Arc;

struct Database {
  url: String,
}

struct Repository {
  database: Arc<Database>,
  table: String,
  queries: Vec<String>,
}

fn main() -> fibre_wire::Result<()> {
  let classes = Arc::new(ClassMap::new());
  classes
    .insert(
      Class::new::<Database>("PostgresDatabase")
        .implements("Database")
        .parameter_with_default("url", String::from("postgres://localhost/app"))
        .constructor(|args| {
          Ok(Database {
            url: args.cloned::<String>("url")?,
          })
        })
        .wire_shared(true),
    )
    .insert(
      Class::new::<Repository>("UserRepository")
        .parameter("database", Some("Database"))
        .parameter_with_default("table", String::from("users"))
        .constructor(|args| {
          Ok(Repository {
            database: args.get::<Database>("database")?,
            table: args.cloned::<String>("table")?,
            queries: Vec::new(),
          })
        }),
    );

  let container = Container::with_strategy(AutowiringStrategy::new(classes));

  // The class declares itself shared, so every consumer gets one database.
  container.add_with("Database", "PostgresDatabase")?;
  container
    .add_with("Users", "UserRepository")?
    .with_parameter("table", literal(String::from("accounts")))?
    .extend(Extension::new(|repository: &mut Repository, _: &Container| {
      repository.queries.push(format!("SELECT * FROM {}", repository.table));
      Ok(())
    }))?;

  let users = container.get_as::<Repository>("Users")?;
  println!("{} via {}", users.table, users.database.url);
  println!("warm-up queries: {:?}", users.queries);

  let again = container.make_as::<Repository>("Users")?;
  assert!(Arc::ptr_eq(&users.database, &again.database));
  assert!(!Arc::ptr_eq(&users, &again));

  Ok(())
}
