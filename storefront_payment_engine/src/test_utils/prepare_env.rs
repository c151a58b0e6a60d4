use std::path::Path;

use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

/// Sets up logging and a fresh database file for an integration test.
pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
}

/// A unique database URL in the system temp directory. Tests run in parallel, so paths must not collide.
pub fn random_db_path() -> String {
    format!("sqlite://{}/spg_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

pub async fn create_database<P: AsRef<Path>>(path: P) {
    let p = path.as_ref().as_os_str().to_str().unwrap();
    if let Err(e) = Sqlite::drop_database(p).await {
        warn!("Error dropping database {p}: {e:?}");
    }
    Sqlite::create_database(p).await.expect("Error creating database");
    info!("Created Sqlite database {p}");
}
