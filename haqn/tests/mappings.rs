use std::sync::Arc;

use haqn::prelude::*;

#[derive(Injectable)]
#[injectable(name = "Mail\\SmtpTransport", implements = "Mail\\Transport")]
struct SmtpTransport {
    #[inject(default = "localhost")]
    host: String,
    #[inject(default = 25)]
    port: i64,
}

#[derive(Injectable)]
#[injectable(name = "Mail\\Mailer")]
struct Mailer {
    #[inject(class = "Mail\\Transport")]
    transport: Arc<SmtpTransport>,
    #[inject(default = "noreply@example.com")]
    sender: String,
}

const CONFIG: &str = r#"{
    "sharedAliases": {
        "Mail\\Transport": "Mail\\SmtpTransport"
    },
    "argumentDefinitions": {
        "Mail\\SmtpTransport": {
            "host": "smtp.example.com",
            ":port": 587
        }
    },
    "argumentProviders": {
        "sender": {
            "interface": "Mail\\Sender",
            "mappings": {
                "Mail\\Mailer": "mail\\sender_for"
            }
        }
    }
}"#;

fn injector() -> Injector {
    let table = DescriptorTable::from_inventory().with_function(FunctionDescriptor::function(
        "mail\\sender_for",
        [Parameter::new("class"), Parameter::new("interface")],
        |_, args| {
            let class = args.get::<String>(0)?;
            Ok(Value::from(format!("{}@example.com", class.replace('\\', ".").to_lowercase())))
        },
    ));
    Injector::builder().introspector(table).build()
}

#[test]
fn json_mappings_configure_the_injector() {
    let mut injector = injector();
    let config: Value = serde_json::from_str(CONFIG).unwrap();
    injector.register_mappings(&config).unwrap();

    let mailer: Arc<Mailer> = injector.make_as("Mail\\Mailer").unwrap();
    assert_eq!(mailer.transport.host, "smtp.example.com");
    assert_eq!(mailer.transport.port, 587);
    assert_eq!(mailer.sender, "mail.mailer@example.com");

    let transport: Arc<SmtpTransport> = injector.make_as("Mail\\Transport").unwrap();
    assert!(Arc::ptr_eq(&transport, &mailer.transport));
}

#[test]
fn mappings_apply_as_a_provider() {
    let mut injector = injector();
    let config: Value = serde_json::from_str(CONFIG).unwrap();
    let mappings = ConfigMappings::from_source(&config).unwrap();
    injector.add_provider(&mappings).unwrap();

    let snapshot = injector.inspect(None, Inspect::ALIASES | Inspect::SHARES | Inspect::BINDINGS);
    assert_eq!(snapshot.aliases.len(), 1);
    assert_eq!(snapshot.shares.len(), 1);
    assert_eq!(snapshot.bindings.len(), 2);
}

#[test]
fn invalid_mappings_report_their_cause() {
    let mut injector = injector();
    let config: Value = serde_json::from_str(r#"{"preparations": {"Mail\\Mailer": 42}}"#).unwrap();

    let err = injector.register_mappings(&config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidMappings);
    assert!(std::error::Error::source(&err).is_some());
}
