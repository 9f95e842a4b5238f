use fibre_wire::{
  bindings, literal, resolve, wiring, Binding, Class, ClassMap, Container, Extension, Factory,
  ManualWiringStrategy, Slot,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

// --- Test Fixtures ---

#[derive(Debug)]
struct Clock {
  zone: String,
}

#[derive(Debug)]
struct Journal {
  clock: Arc<Clock>,
  entries: Vec<String>,
}

fn classes() -> Arc<ClassMap> {
  let classes = Arc::new(ClassMap::new());
  classes
    .insert(
      Class::new::<Clock>("Clock")
        .implements("TimeSource")
        .constructor(|args| {
          Ok(Clock {
            zone: args.cloned::<String>("zone").unwrap_or_else(|_| "UTC".to_owned()),
          })
        }),
    )
    .insert(
      Class::new::<Journal>("Journal")
        .constructor(|args| {
          Ok(Journal {
            clock: args.get::<Clock>("clock")?,
            entries: Vec::new(),
          })
        })
        .method("write", |journal: &mut Journal, args| {
          journal.entries.push(args.cloned::<String>(0)?);
          Ok(())
        }),
    );
  classes
}

fn container() -> Container {
  Container::with_strategy(ManualWiringStrategy::new(classes()))
}

fn note(entry: &'static str) -> Extension {
  Extension::new(move |journal: &mut Journal, _: &Container| {
    journal.entries.push(entry.to_owned());
    Ok(())
  })
}

// --- Basic Tests ---

#[test]
fn test_unregistered_interface_is_not_found() {
  // Arrange
  let container = container();

  // Act
  let result = container.get("Clock");

  // Assert
  assert!(!container.has("Clock"));
  assert!(result.unwrap_err().is_not_found());
}

#[test]
fn test_singleton_is_reused_until_unshared() {
  // Arrange
  let container = container();
  container
    .singleton("Clock")
    .unwrap()
    .with_parameters(bindings!["zone" => literal(String::from("CET"))])
    .unwrap();

  // Act
  let first = container.get_as::<Clock>("Clock").unwrap();
  let second = container.get_as::<Clock>("Clock").unwrap();
  container.unshare(["Clock"]);
  let third = container.get_as::<Clock>("Clock").unwrap();

  // Assert
  assert_eq!(first.zone, "CET");
  assert!(Arc::ptr_eq(&first, &second));
  assert!(!Arc::ptr_eq(&first, &third));
  assert!(!container.does_share(["Clock"]));
}

#[test]
fn test_wire_matches_individual_adds() {
  // Arrange
  let container = container();

  // Act
  container.wire(wiring!["Clock", "TimeSource" => "Clock"]).unwrap();

  // Assert
  let own = container.definition("Clock").unwrap();
  let aliased = container.definition("TimeSource").unwrap();
  assert_eq!(own.concrete_class(), "Clock");
  assert_eq!(aliased.concrete_class(), "Clock");
  assert_eq!(container.get_as::<Clock>("TimeSource").unwrap().zone, "UTC");
}

#[test]
fn test_wire_rejects_values_that_are_not_class_names() {
  // Arrange
  let container = container();

  // Act
  let result = container.wire(wiring!["Clock" => Binding::instance(5_u32)]);

  // Assert
  assert!(result.unwrap_err().is_incompatibility());
  assert!(!container.has("Clock"));
}

#[test]
fn test_wire_positional_entries_must_name_an_interface() {
  // Arrange
  let container = container();
  container.ignore(["Clock"]);

  // Act
  let unnamed = container.wire(vec![(Slot::Positional(0), Binding::instance(5_u32))]);
  let blocked = container.wire(vec![(Slot::Positional(0), Binding::class("Clock"))]);

  // Assert
  assert!(unnamed.unwrap_err().is_incompatibility());
  assert!(blocked.unwrap_err().is_blocked());
}

#[test]
fn test_extensions_accumulate_and_run_in_order() {
  // Arrange
  let container = container();
  container.add("Clock").unwrap();
  container
    .add("Journal")
    .unwrap()
    .with_parameter("clock", "Clock")
    .unwrap()
    .extend(note("first"))
    .unwrap();
  container.extend("Journal", note("second")).unwrap();

  // Act
  let built = container.get_as::<Journal>("Journal").unwrap();
  let made = container.make_as::<Journal>("Journal").unwrap();

  // Assert
  assert_eq!(built.entries, vec!["first", "second"]);
  assert_eq!(made.entries, vec!["first", "second"]);
  assert_eq!(built.clock.zone, "UTC");
}

#[test]
fn test_make_bypasses_the_singleton_cache() {
  // Arrange
  let container = container();
  container.singleton("Clock").unwrap();

  // Act
  let made_first = container.make("Clock").unwrap();
  let cached_after_make = container.definition("Clock").unwrap().has_instance();
  let got = container.get("Clock").unwrap();
  let made_second = container.make("Clock").unwrap();

  // Assert
  assert!(!cached_after_make);
  assert!(!Arc::ptr_eq(&made_first, &made_second));
  assert!(!Arc::ptr_eq(&got, &made_second));
  assert!(Arc::ptr_eq(&got, &container.get("Clock").unwrap()));
}

#[test]
fn test_instance_binding_is_shared() {
  // Arrange
  let container = container();
  container
    .add_with("Clock", Binding::instance(Clock { zone: "JST".to_owned() }))
    .unwrap();

  // Act
  let first = resolve!(container, "Clock" as Clock);
  let second = resolve!(container, "Clock" as Clock);

  // Assert
  assert_eq!(first.zone, "JST");
  assert!(Arc::ptr_eq(&first, &second));
  assert!(container.does_share(["Clock"]));
}

#[test]
fn test_instance_binding_can_not_be_rebuilt() {
  // Arrange
  let container = container();
  container
    .add_with("Clock", Binding::instance(Clock { zone: "JST".to_owned() }))
    .unwrap();

  // Act
  let made = container.make("Clock");
  container.unshare(["Clock"]);
  let unshared = container.get("Clock");

  // Assert
  assert!(made.unwrap_err().is_incompatibility());
  assert!(unshared.unwrap_err().is_incompatibility());
}

#[test]
fn test_factory_binding_takes_precedence_over_the_class() {
  // Arrange
  let container = container();
  container
    .add_with(
      "Clock",
      Factory::new(|_: &Container| Ok(Clock { zone: "factory".to_owned() })),
    )
    .unwrap();

  // Act
  let clock = container.get_as::<Clock>("Clock").unwrap();

  // Assert
  assert_eq!(clock.zone, "factory");
}

#[test]
fn test_method_calls_run_after_construction() {
  // Arrange
  let container = container();
  container.add("Clock").unwrap();
  container
    .add("Journal")
    .unwrap()
    .with_parameter("clock", "Clock")
    .unwrap()
    .with_method_call("write", bindings![0 => literal(String::from("opened"))])
    .unwrap()
    .extend(note("extended"))
    .unwrap();

  // Act
  let journal = container.get_as::<Journal>("Journal").unwrap();

  // Assert
  assert_eq!(journal.entries, vec!["opened", "extended"]);
}

#[test]
fn test_get_as_reports_a_type_mismatch() {
  // Arrange
  let container = container();
  container.add("Clock").unwrap();

  // Act
  let result = container.get_as::<Journal>("Clock");

  // Assert
  assert!(result.unwrap_err().is_incompatibility());
}

#[test]
#[should_panic(expected = "Failed to resolve required service `Journal`")]
fn test_resolve_macro_panics_when_missing() {
  let container = container();
  let _ = resolve!(container, "Journal" as Journal);
}

#[test]
fn test_default_to_share_applies_to_later_adds() {
  // Arrange
  let container = container();
  container.add("TimeSource").unwrap();

  // Act
  container.default_to_share(true);
  container.add("Clock").unwrap();

  // Assert
  assert!(container.does_share(["Clock"]));
  assert!(!container.does_share(["TimeSource"]));
  assert!(!container.does_share(["Clock", "TimeSource"]));
}

#[test]
fn test_forget_removes_the_definition() {
  // Arrange
  let container = container();
  container.add("Clock").unwrap();

  // Act
  let forgotten = container.forget("Clock");

  // Assert
  assert!(forgotten);
  assert!(!container.has("Clock"));
  assert!(!container.forget("Clock"));
}
