pub mod server;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: Option<String>,
        token_secret: SecretString,
        token_ttl: i64,
        uploads_dir: String,
        frontend_url: String,
    },
}
