use futures::future::join_all;
use studiq_database::{AuthUser, DatabaseInfo, ProfileSync};

#[tokio::main]
async fn main() {
    studiq_config::setup_logging();
    studiq_config::init().await;

    let db = DatabaseInfo::Auto.connect().await.unwrap();
    let sync = ProfileSync::from_config().await;

    let user = AuthUser {
        auth_id: "did:privy:demo".to_string(),
        wallet_address: "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU".to_string(),
        email: Some("ada.lovelace@campus.edu".to_string()),
        display_name: None,
        avatar_url: None,
    };

    // Two tabs reconnecting the same wallet at once only sync once.
    let results = join_all((0..2).map(|_| sync.sync(&*db, &user))).await;
    for synced in results {
        let synced = synced.unwrap();
        println!(
            "{} ({}) new = {}",
            synced.profile.display_name, synced.profile.avatar_initials, synced.is_new_user
        );
    }
}
