//! Account orchestration: registration, login, profile reads and
//! identity-scoped mutation.

pub mod avatar;
mod error;
pub mod password;
pub mod store;
pub mod token;

pub use error::{AccountError, EMAIL_EXISTS, INVALID_CREDENTIALS, UNAUTHORIZED};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use avatar::AvatarStore;
use password::PasswordHasher;
use store::{NewUser, PublicProfile, UserStore, UserUpdate};
use token::TokenService;

pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MAX_AVATAR_BYTES: usize = 500_000;

/// Verified claims attached to a request by the auth gate and threaded
/// explicitly into every protected operation.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
}

/// What a caller learns about a freshly registered account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdentitySummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginGrant {
    pub token: String,
    pub id: Uuid,
    pub name: String,
}

/// Input for `edit_details`. All fields are required.
#[derive(Debug, Clone)]
pub struct ProfileEdit {
    pub name: String,
    pub email: String,
    pub current_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic format check on already-normalized input.
fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

fn validation(message: &str) -> AccountError {
    AccountError::Validation(message.to_string())
}

/// Composes the hasher, token service and the two stores into the account
/// operations. Holds no mutable state of its own; shared behind an `Arc` by
/// the request handlers.
pub struct AccountService {
    users: Arc<dyn UserStore>,
    avatars: Arc<dyn AvatarStore>,
    passwords: PasswordHasher,
    tokens: TokenService,
}

impl AccountService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        avatars: Arc<dyn AvatarStore>,
        passwords: PasswordHasher,
        tokens: TokenService,
    ) -> Self {
        Self {
            users,
            avatars,
            passwords,
            tokens,
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    /// Create an account. The stored password is always a hash; a hashing
    /// failure aborts the operation.
    ///
    /// # Errors
    ///
    /// `Validation` for missing or malformed fields, `Conflict` when the
    /// email is already taken (case-insensitively), `Storage` on internal
    /// failure.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password2: &str,
    ) -> Result<IdentitySummary, AccountError> {
        let name = name.trim();
        if name.is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(validation("Fill in all fields."));
        }

        let email = normalize_email(email);
        if !valid_email(&email) {
            return Err(validation("Invalid email address."));
        }
        if password.trim().chars().count() < MIN_PASSWORD_CHARS {
            return Err(validation("Password should be at least 6 characters."));
        }
        if password != password2 {
            return Err(validation("Passwords do not match."));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AccountError::Conflict(EMAIL_EXISTS));
        }

        let password_hash = self.passwords.hash(password).map_err(AccountError::Storage)?;

        // A concurrent registration can still win between the check above and
        // this insert; the store reports it as a duplicate and the caller
        // sees the same conflict.
        let record = self
            .users
            .create(NewUser {
                name: name.to_string(),
                email,
                password_hash,
            })
            .await?;

        Ok(IdentitySummary {
            id: record.id,
            name: record.name,
            email: record.email,
        })
    }

    /// Verify credentials and issue a session token.
    ///
    /// # Errors
    ///
    /// Unknown email and wrong password both yield the identical `Auth`
    /// error, leaving no signal for account enumeration.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginGrant, AccountError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(validation("Fill in all fields."));
        }

        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            return Err(AccountError::Auth(INVALID_CREDENTIALS));
        };
        if !self.passwords.verify(password, &user.password_hash) {
            return Err(AccountError::Auth(INVALID_CREDENTIALS));
        }

        let token = self.tokens.issue(user.id, &user.name).map_err(|err| {
            AccountError::Storage(anyhow::Error::new(err).context("failed to issue session token"))
        })?;

        Ok(LoginGrant {
            token,
            id: user.id,
            name: user.name,
        })
    }

    /// Fetch a user's public profile.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids.
    pub async fn profile(&self, id: Uuid) -> Result<PublicProfile, AccountError> {
        self.users
            .find_by_id(id)
            .await?
            .map(PublicProfile::from)
            .ok_or(AccountError::NotFound)
    }

    /// Update name, email and password in one atomic record write.
    ///
    /// The requester's own record is the only one reachable: the id comes
    /// from the verified token, never from the request body.
    ///
    /// # Errors
    ///
    /// `Validation` for missing fields, a wrong current password or a new
    /// password mismatch; `Conflict` when the new email belongs to another
    /// account.
    pub async fn edit_details(
        &self,
        requester: &Identity,
        edit: ProfileEdit,
    ) -> Result<PublicProfile, AccountError> {
        if edit.name.trim().is_empty()
            || edit.email.trim().is_empty()
            || edit.current_password.is_empty()
            || edit.new_password.is_empty()
        {
            return Err(validation("Fill in all fields."));
        }

        let Some(user) = self.users.find_by_id(requester.id).await? else {
            return Err(AccountError::NotFound);
        };

        let email = normalize_email(&edit.email);
        if !valid_email(&email) {
            return Err(validation("Invalid email address."));
        }
        if let Some(existing) = self.users.find_by_email(&email).await? {
            if existing.id != user.id {
                return Err(AccountError::Conflict(EMAIL_EXISTS));
            }
        }

        if !self.passwords.verify(&edit.current_password, &user.password_hash) {
            return Err(validation("Invalid current password."));
        }
        if edit.new_password != edit.confirm_new_password {
            return Err(validation("New passwords do not match."));
        }

        let password_hash = self
            .passwords
            .hash(&edit.new_password)
            .map_err(AccountError::Storage)?;

        let updated = self
            .users
            .update(
                user.id,
                UserUpdate {
                    name: Some(edit.name.trim().to_string()),
                    email: Some(email),
                    password_hash: Some(password_hash),
                    avatar: None,
                },
            )
            .await?;

        Ok(updated.into())
    }

    /// Replace the requester's avatar.
    ///
    /// Ordering is fixed: write the new file, update the record, then try to
    /// delete the old file. An interruption leaves at worst an unreferenced
    /// file on disk; the record never points at a deleted file.
    ///
    /// # Errors
    ///
    /// `Validation` for a missing or oversize upload; `Storage` when the new
    /// file cannot be written, with the record left untouched.
    pub async fn change_avatar(
        &self,
        requester: &Identity,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<PublicProfile, AccountError> {
        if original_name.trim().is_empty() || bytes.is_empty() {
            return Err(validation("Please choose an image."));
        }
        if bytes.len() > MAX_AVATAR_BYTES {
            return Err(validation(
                "Profile picture too big. Should be less than 500kb.",
            ));
        }

        let Some(user) = self.users.find_by_id(requester.id).await? else {
            return Err(AccountError::NotFound);
        };

        let new_name = self.avatars.generate_name(original_name);
        self.avatars
            .write(&new_name, bytes)
            .await
            .map_err(AccountError::Storage)?;

        let updated = match self
            .users
            .update(
                user.id,
                UserUpdate {
                    avatar: Some(new_name.clone()),
                    ..UserUpdate::default()
                },
            )
            .await
        {
            Ok(updated) => updated,
            Err(err) => {
                // The record still points at the old file; drop the one we
                // just wrote so it does not linger unreferenced.
                if let Err(cleanup) = self.avatars.delete(&new_name).await {
                    warn!("failed to remove unreferenced avatar {new_name}: {cleanup:#}");
                }
                return Err(err.into());
            }
        };

        if let Some(previous) = &user.avatar {
            if let Err(err) = self.avatars.delete(previous).await {
                warn!("failed to delete previous avatar {previous}: {err:#}");
            }
        }

        Ok(updated.into())
    }

    /// All user records, password hashes stripped by the store contract.
    ///
    /// # Errors
    ///
    /// `Storage` when the store fails.
    pub async fn authors(&self) -> Result<Vec<PublicProfile>, AccountError> {
        self.users.list_all().await.map_err(Into::into)
    }
}
