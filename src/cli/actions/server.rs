use crate::{
    account::{
        avatar::FsAvatarStore,
        password::PasswordHasher,
        store::{MemoryUserStore, PgUserStore, UserStore},
        token::TokenService,
        AccountService,
    },
    api,
    cli::actions::Action,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            token_secret,
            token_ttl,
            uploads_dir,
            frontend_url,
        } => {
            let users: Arc<dyn UserStore> = match dsn {
                Some(dsn) => Arc::new(PgUserStore::connect(&dsn).await?),
                None => {
                    warn!("no --dsn provided, using the in-memory user store (state is lost on exit)");
                    Arc::new(MemoryUserStore::new())
                }
            };

            let avatars = Arc::new(FsAvatarStore::open(uploads_dir).await?);
            let tokens = TokenService::new(token_secret, token_ttl);
            let service = Arc::new(AccountService::new(
                users,
                avatars,
                PasswordHasher::new(),
                tokens,
            ));

            api::serve(port, service, &frontend_url).await?;
        }
    }

    Ok(())
}
