use studiq_database::DatabaseInfo;

#[tokio::main]
async fn main() {
    studiq_config::setup_logging();

    let db = DatabaseInfo::Auto.connect().await.unwrap();
    db.migrate_database().await.unwrap();
}
