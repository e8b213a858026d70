//! Basic example of the Wirebox DI container.

use std::sync::Arc;

use wirebox::prelude::*;

// === Define your traits and types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

type SharedLogger = Arc<dyn Logger>;

struct Config {
    database_url: String,
    debug: bool,
}

struct Database {
    url: String,
    logger: Arc<SharedLogger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

#[derive(Injectable)]
#[injectable(scoped)]
struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    fn find_user(&self, id: u64) -> String {
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

#[derive(Injectable)]
#[injectable(token = "IUserService")]
struct UserService {
    repo: Arc<UserRepository>,
    #[inject(token = "logger")]
    logger: Arc<SharedLogger>,
}

impl UserService {
    fn get_user(&self, id: u64) -> String {
        self.logger.log(&format!("Getting user {id}"));
        self.repo.find_user(id)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("basic=info,wirebox_container=debug")
        .init();

    let container = Container::builder()
        .instance(
            Token::of::<Config>(),
            Config {
                database_url: "postgres://localhost/myapp".to_string(),
                debug: true,
            },
        )
        .singleton(
            "logger",
            Provider::factory(|_| Ok(Arc::new(ConsoleLogger) as SharedLogger)),
        )
        .singleton(
            Token::of::<Database>(),
            Provider::factory(|r| {
                let config: Arc<Config> = r.resolve_type()?;
                let logger: Arc<SharedLogger> = r.resolve("logger")?;
                Ok(Database {
                    url: config.database_url.clone(),
                    logger,
                })
            }),
        )
        .injectable::<UserRepository>()
        .injectable::<UserService>()
        .build()?;

    println!("Container built: {container:?}");

    let config: Arc<Config> = container.resolve_type()?;
    println!("Config: database_url={}, debug={}", config.database_url, config.debug);

    // One scope per request
    {
        let scope = container.create_scope();
        tracing::info!(scope = %scope.id(), "Handling request");

        let service: Arc<UserService> = scope.resolve("IUserService")?;
        println!("{}", service.get_user(42));

        let again: Arc<UserService> = scope.resolve("IUserService")?;
        assert!(Arc::ptr_eq(&service.repo, &again.repo));
        println!("{}", again.get_user(7));
    }

    for info in container.registrations() {
        println!("{} {} {} {}", info.id, info.token, info.provider, info.lifetime);
    }

    Ok(())
}
