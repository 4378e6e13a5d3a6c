//! Basic example of the Haqn injector.

use std::sync::Arc;

use haqn::prelude::*;

// === Define your types ===

#[derive(Injectable)]
#[injectable(name = "App\\Config")]
struct Config {
    #[inject(name = "databaseUrl")]
    database_url: String,
    #[inject(default = false)]
    debug: bool,
}

#[derive(Injectable)]
#[injectable(name = "App\\ConsoleLogger", implements = "App\\Logger")]
struct ConsoleLogger;

impl ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

#[derive(Injectable)]
#[injectable(name = "App\\Database")]
struct Database {
    config: Arc<Config>,
    #[inject(class = "App\\Logger")]
    logger: Arc<ConsoleLogger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.config.database_url)
    }
}

#[derive(Injectable)]
#[injectable(name = "App\\UserRepository")]
struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    fn find_user(&self, id: u64) -> String {
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt().with_env_filter("haqn_container=debug").init();

    let mut injector = Injector::new();
    injector
        .alias("App\\Logger", "App\\ConsoleLogger")?
        .share("App\\Logger")?
        .share("App\\Database")?;
    injector.define_param("databaseUrl", "postgres://localhost/myapp");

    // Log every repository the injector hands out
    injector.prepare(
        "App\\UserRepository",
        Invokable::closure([Parameter::new("repository")], |_, _| {
            tracing::info!("Prepared a repository");
            Ok(Value::Null)
        }),
    )?;

    println!("Injector ready: {injector:?}");

    let config: Arc<Config> = injector.make_as("App\\Config")?;
    println!("Config: database_url={}, debug={}", config.database_url, config.debug);

    let repo: Arc<UserRepository> = injector.make_as("App\\UserRepository")?;
    println!("{}", repo.find_user(42));

    // The database is shared, so a second repository reuses it
    let again: Arc<UserRepository> = injector.make_as("App\\UserRepository")?;
    println!("Same database: {}", Arc::ptr_eq(&repo.db, &again.db));

    // Call a closure with injected parameters
    let user = injector.execute(Invokable::closure(
        [Parameter::new("repo").class("App\\UserRepository")],
        |_, args| {
            let repo = args.get::<Arc<UserRepository>>(0)?;
            Ok(Value::from(repo.find_user(7)))
        },
    ))?;
    println!("Executed: {user:?}");

    Ok(())
}
