//! Marketplace user commands.
//!
//! # Usage
//!
//! ```bash
//! rinkside-cli user create -e wayne@example.com -p hunter99 -f Wayne -l Gretzky
//! ```

use rinkside_api::db::{RepositoryError, UserRepository};
use rinkside_api::models::{SignupInput, ValidationErrors};
use rinkside_api::services::auth::{AuthError, hash_password};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur while creating a user.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// The input failed the same validation as signup.
    #[error("Invalid user: {}", .0.messages().join(", "))]
    Invalid(ValidationErrors),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] AuthError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create a user, returning its ID.
pub async fn create(
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
) -> Result<i32, UserError> {
    let new_user = SignupInput {
        email: Some(email.to_owned()),
        password: Some(password.to_owned()),
        first_name: Some(first_name.to_owned()),
        last_name: Some(last_name.to_owned()),
    }
    .validate()
    .map_err(UserError::Invalid)?;

    let password_hash = hash_password(&new_user.password)?;

    let pool = connect().await?;
    let user = UserRepository::new(&pool)
        .create(
            &new_user.email,
            &password_hash,
            &new_user.first_name,
            &new_user.last_name,
        )
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::UserExists(new_user.email.to_string()),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, email = %user.email, "User created");
    Ok(user.id.as_i32())
}
