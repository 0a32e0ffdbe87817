use crate::cli::actions::Action;
use anyhow::Result;
use secrecy::SecretString;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        dsn: matches.get_one::<String>("dsn").cloned(),
        token_secret: matches
            .get_one::<String>("token-secret")
            .map(|secret| SecretString::from(secret.clone()))
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --token-secret"))?,
        token_ttl: matches
            .get_one::<i64>("token-ttl")
            .copied()
            .unwrap_or(86_400),
        uploads_dir: matches
            .get_one::<String>("uploads-dir")
            .cloned()
            .unwrap_or_else(|| "uploads".to_string()),
        frontend_url: matches
            .get_one::<String>("frontend-url")
            .cloned()
            .unwrap_or_else(|| "http://localhost:3000".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    #[test]
    fn handler_builds_server_action() {
        temp_env::with_vars(
            [
                ("BYLINE_DSN", None::<String>),
                ("BYLINE_UPLOADS_DIR", None),
                ("BYLINE_FRONTEND_URL", None),
            ],
            || {
                let matches = commands::new().get_matches_from(vec![
                    "byline",
                    "--token-secret",
                    "sssht",
                    "--port",
                    "9000",
                    "--token-ttl",
                    "60",
                ]);

                let Action::Server {
                    port,
                    dsn,
                    token_secret,
                    token_ttl,
                    uploads_dir,
                    frontend_url,
                } = handler(&matches).unwrap();

                assert_eq!(port, 9000);
                assert_eq!(dsn, None);
                assert_eq!(token_secret.expose_secret(), "sssht");
                assert_eq!(token_ttl, 60);
                assert_eq!(uploads_dir, "uploads");
                assert_eq!(frontend_url, "http://localhost:3000");
            },
        );
    }
}
