//! Authentication service.
//!
//! Password accounts hashed with Argon2id, and stateless bearer tokens.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{TokenError, TokenIssuer};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use rinkside_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::ValidationErrors;
use crate::models::user::{SignupInput, User};

/// Well-formed Argon2id hash with default parameters that matches no
/// password. Unknown emails are verified against it so that login takes the
/// same time whether or not the account exists.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$cSiBQPnjUSbtQp/Eo8WKRA$VnRicaseiN3fnclIW0cZ3LCwKRX471jbR6mi90apZvw";

/// A user together with a freshly issued bearer token.
#[derive(Debug)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Authentication service.
///
/// Handles registration, login, and token resolution.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenIssuer,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenIssuer) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
        }
    }

    /// Register a new user and sign them in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the input is invalid or the email is
    /// already registered. Nothing is persisted in either case.
    #[tracing::instrument(skip(self, input))]
    pub async fn register(&self, input: SignupInput) -> Result<AuthSession, AuthError> {
        let new_user = input.validate().map_err(AuthError::Validation)?;
        let password_hash = hash_password(&new_user.password)?;

        let user = self
            .users
            .create(
                &new_user.email,
                &password_hash,
                &new_user.first_name,
                &new_user.last_name,
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    AuthError::Validation(ValidationErrors::single("email", "has already been taken"))
                }
                other => AuthError::Repository(other),
            })?;

        let token = self.tokens.issue(user.id)?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(AuthSession { user, token })
    }

    /// Verify an email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email, malformed
    /// email, or wrong password, without saying which.
    #[tracing::instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let Some((user, password_hash)) = self.users.get_with_password_hash(&email).await? else {
            let _ = verify_password(password, DUMMY_PASSWORD_HASH);
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &password_hash)?;

        let token = self.tokens.issue(user.id)?;
        Ok(AuthSession { user, token })
    }

    /// Load a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` if the user does not exist.
    pub async fn user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::NotAuthenticated)
    }
}

/// Hash a password with Argon2id and a random salt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("greatone99").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("greatone99", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_dummy_hash_costs_a_real_verify() {
        let real = hash_password("greatone99").unwrap();
        let params = |hash: &str| hash.rsplitn(3, '$').nth(2).unwrap().to_owned();
        assert_eq!(params(DUMMY_PASSWORD_HASH), params(&real));

        assert!(PasswordHash::new(DUMMY_PASSWORD_HASH).is_ok());
        assert!(matches!(
            verify_password("greatone99", DUMMY_PASSWORD_HASH),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_corrupt_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
