use std::time::Duration;

use cached::proc_macro::cached;
use config::{Config, File, FileFormat};
use futures_locks::RwLock;
use once_cell::sync::Lazy;
use serde::Deserialize;

static CONFIG_BUILDER: Lazy<RwLock<Config>> = Lazy::new(|| {
    RwLock::new({
        let mut builder = Config::builder().add_source(File::from_str(
            include_str!("../Studiq.toml"),
            FileFormat::Toml,
        ));

        if std::path::Path::new("Studiq.toml").exists() {
            builder = builder.add_source(File::new("Studiq.toml", FileFormat::Toml));
        }

        builder.build().unwrap()
    })
});

#[derive(Deserialize, Debug, Clone)]
pub struct Database {
    pub mongodb: String,
}

/// Values written to freshly created preference records
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SyncDefaults {
    pub theme: String,
    pub language: String,
    pub notifications: bool,
    pub tutor_tone: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ProfileSync {
    pub max_concurrent: usize,
    pub timeout_ms: u64,
    pub defaults: SyncDefaults,
}

impl ProfileSync {
    /// Concurrency cap, `None` when unlimited
    pub fn max_concurrent(&self) -> Option<usize> {
        (self.max_concurrent > 0).then_some(self.max_concurrent)
    }

    /// Producer deadline, `None` when syncs may run forever
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub database: Database,
    pub sync: ProfileSync,
}

pub async fn init() {
    println!(
        ":: StudIQ Configuration ::\n\x1b[32m{:?}\x1b[0m",
        config().await
    );
}

pub async fn read() -> Config {
    CONFIG_BUILDER.read().await.clone()
}

#[cached(time = 30)]
pub async fn config() -> Settings {
    read().await.try_deserialize::<Settings>().unwrap()
}

/// Configure logging and common Rust variables
pub fn setup_logging() {
    dotenv::dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }

    // Tests and embedders may have installed a logger already
    if pretty_env_logger::try_init().is_err() {
        log::debug!("Logger already initialised.");
    }
}
