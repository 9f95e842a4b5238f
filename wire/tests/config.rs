use fibre_wire::{
  ArgumentConfig, AutowiringStrategy, Class, ClassMap, Container, Error, ManualWiringStrategy, WiringConfig,
};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::sync::Arc;

// --- Test Fixtures ---

#[derive(Debug)]
struct Transport {
  host: String,
  port: i64,
}

#[derive(Debug)]
struct Mailer {
  transport: Arc<Transport>,
  signature: String,
  verbose: bool,
}

const YAML: &str = r#"
services:
  - interface: Transport
    class: SmtpTransport
    shared: true
    parameters:
      host: { literal: "smtp.local" }
      port: { literal: 2525 }
  - interface: Mailer
    parameters:
      "0": Transport
    properties:
      verbose: { literal: true }
    calls:
      - method: sign
        arguments:
          "0": { literal: "-- ops" }
ignore: [Clock]
"#;

fn classes() -> Arc<ClassMap> {
  let classes = Arc::new(ClassMap::new());
  classes
    .insert(
      Class::new::<Transport>("SmtpTransport")
        .implements("Transport")
        .constructor(|args| {
          Ok(Transport {
            host: args.cloned::<String>("host")?,
            port: args.cloned::<i64>("port")?,
          })
        }),
    )
    .insert(
      Class::new::<Mailer>("Mailer")
        .constructor(|args| {
          Ok(Mailer {
            transport: args.get::<Transport>(0)?,
            signature: String::new(),
            verbose: false,
          })
        })
        .property("verbose", |mailer: &mut Mailer, value| {
          mailer.verbose = *fibre_wire::downcast::<bool>(value)?;
          Ok(())
        })
        .method("sign", |mailer: &mut Mailer, args| {
          mailer.signature = args.cloned::<String>(0)?;
          Ok(())
        }),
    );
  classes
}

// --- Loading ---

#[test]
fn test_yaml_configuration_is_parsed() {
  // Act
  let config = WiringConfig::from_yaml_str(YAML).unwrap();

  // Assert
  assert!(!config.share_by_default);
  assert_eq!(config.ignore, vec!["Clock".to_string()]);
  assert_eq!(config.services.len(), 2);
  assert_eq!(config.services[0].class.as_deref(), Some("SmtpTransport"));
  assert_eq!(
    config.services[1].parameters["0"],
    ArgumentConfig::Service("Transport".to_owned())
  );
}

#[test]
fn test_json_and_yaml_describe_the_same_wiring() {
  // Arrange
  let json = serde_json::to_string(&WiringConfig::from_yaml_str(YAML).unwrap()).unwrap();

  // Act
  let reparsed = WiringConfig::from_json_str(&json).unwrap();

  // Assert
  assert_eq!(reparsed, WiringConfig::from_yaml_str(YAML).unwrap());
}

#[test]
fn test_configuration_is_loaded_from_a_file() {
  // Arrange
  let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
  file.write_all(YAML.as_bytes()).unwrap();

  // Act
  let config = WiringConfig::from_path(file.path()).unwrap();

  // Assert
  assert_eq!(config, WiringConfig::from_yaml_str(YAML).unwrap());
}

#[test]
fn test_unknown_file_extension_is_rejected() {
  // Arrange
  let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
  file.write_all(b"services = []").unwrap();

  // Act
  let result = WiringConfig::from_path(file.path());

  // Assert
  assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_malformed_yaml_is_reported() {
  let result = WiringConfig::from_yaml_str("services: [ { interface: ");

  assert!(matches!(result, Err(Error::Yaml(_))));
}

// --- Applying ---

#[test]
fn test_configure_wires_the_container() {
  // Arrange
  let container = Container::with_strategy(ManualWiringStrategy::new(classes()));
  let config = WiringConfig::from_yaml_str(YAML).unwrap();

  // Act
  container.configure(&config).unwrap();
  let mailer = container.get_as::<Mailer>("Mailer").unwrap();

  // Assert
  assert_eq!(mailer.transport.host, "smtp.local");
  assert_eq!(mailer.transport.port, 2525);
  assert_eq!(mailer.signature, "-- ops");
  assert!(mailer.verbose);
  assert!(container.does_share(["Transport"]));
  assert!(container.does_ignore(["Clock"]));
}

#[test]
fn test_configure_keeps_strategy_validation() {
  // Arrange
  let container = Container::with_strategy(ManualWiringStrategy::new(classes()));
  let config = WiringConfig::from_json_str(
    r#"{ "services": [ { "interface": "Mailer", "parameters": { "transport": { "infer": true } } } ] }"#,
  )
  .unwrap();

  // Act
  let result = container.configure(&config);

  // Assert
  assert!(result.unwrap_err().is_incompatibility());
}

#[test]
fn test_share_by_default_and_inference_under_autowiring() {
  // Arrange
  let container = Container::with_strategy(AutowiringStrategy::new(classes()));
  let config = WiringConfig::from_json_str(
    r#"{
      "share_by_default": true,
      "services": [
        { "interface": "Transport", "class": "SmtpTransport",
          "parameters": { "host": { "literal": "relay" }, "port": { "literal": 25 } } },
        { "interface": "Mailer", "parameters": { "0": "Transport" } }
      ]
    }"#,
  )
  .unwrap();

  // Act
  container.configure(&config).unwrap();
  let first = container.get_as::<Mailer>("Mailer").unwrap();
  let second = container.get_as::<Mailer>("Mailer").unwrap();

  // Assert
  assert_eq!(first.transport.host, "relay");
  assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_share_by_default_stays_scoped_to_the_configuration() {
  // Arrange
  let container = Container::with_strategy(ManualWiringStrategy::new(classes()));
  let config = WiringConfig::from_json_str(
    r#"{ "share_by_default": true, "services": [ { "interface": "Transport", "class": "SmtpTransport" } ] }"#,
  )
  .unwrap();
  let invalid = WiringConfig::from_json_str(r#"{ "share_by_default": true, "services": [ { "interface": " " } ] }"#)
    .unwrap();

  // Act
  container.configure(&config).unwrap();
  let failed = container.configure(&invalid);
  container.add("Mailer").unwrap();

  // Assert
  assert!(failed.is_err());
  assert!(!container.shares_by_default());
  assert!(container.does_share(["Transport"]));
  assert!(!container.does_share(["Mailer"]));
}
