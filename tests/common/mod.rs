pub mod http_mock;

use std::sync::Arc;

use offerfeed::{ApiClient, ClientConfig, CredentialStore, Credentials, MemoryCredentialStore};

/// Build a client against `base_url` backed by an in-memory store.
#[allow(dead_code)]
pub fn client_with(
    base_url: &str,
    access: Option<&str>,
    refresh: Option<&str>,
) -> (ApiClient, Arc<MemoryCredentialStore>) {
    let store = Arc::new(MemoryCredentialStore::with_credentials(Credentials {
        access_token: access.map(str::to_string),
        refresh_token: refresh.map(str::to_string),
    }));
    let config = ClientConfig::new(base_url).unwrap();
    let dyn_store: Arc<dyn CredentialStore> = store.clone();
    let client = ApiClient::new(&config, dyn_store).unwrap();
    (client, store)
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

/// `offerfeed` command isolated from the caller's home, config and env.
#[allow(dead_code)]
pub fn offerfeed_cmd(home: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("offerfeed").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env_remove("OFFERFEED_API_ENDPOINT")
        .env_remove("API_ENDPOINT")
        .env_remove("OFFERFEED_CONFIG")
        .env_remove("OFFERFEED_CREDENTIALS")
        .env_remove("OFFERFEED_ACCESS_TOKEN")
        .env_remove("OFFERFEED_REFRESH_TOKEN")
        .env_remove("OFFERFEED_USD_PER_ETH");
    cmd
}
