//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rinkside_core::{Email, UserId};

use super::validation::{ValidationErrors, check_text, normalize};

/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A marketplace account (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login email, lowercased.
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    /// Linked Stripe Connect account, if the user has started seller onboarding.
    pub payment_account_id: Option<String>,
    /// Set once the gateway reports the account can accept charges.
    pub payment_onboarding_completed: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// `"First Last"`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Public user projection. Never includes credentials or payout details.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            created_at: user.created_at,
        }
    }
}

/// Signup form as submitted by the client.
#[derive(Debug, Default, Deserialize)]
pub struct SignupInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// A validated signup, ready to hash and insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl SignupInput {
    /// Validate every field, collecting all failures.
    ///
    /// Email uniqueness is enforced by the database and surfaces as a
    /// conflict when the user is inserted.
    ///
    /// # Errors
    ///
    /// Returns the full list of validation messages.
    pub fn validate(self) -> Result<NewUser, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let email = match normalize(self.email) {
            None => {
                errors.add("email", "can't be blank");
                None
            }
            Some(raw) => Email::parse(&raw)
                .inspect_err(|_| errors.add("email", "is invalid"))
                .ok(),
        };

        let first_name = normalize(self.first_name);
        check_text(&mut errors, "first_name", first_name.as_deref(), 2, 100);
        let last_name = normalize(self.last_name);
        check_text(&mut errors, "last_name", last_name.as_deref(), 2, 100);

        // Passwords are taken as typed; surrounding whitespace is significant.
        let password = self.password.filter(|p| !p.is_empty());
        match password.as_deref() {
            None => errors.add("password", "can't be blank"),
            Some(p) if p.chars().count() < MIN_PASSWORD_LENGTH => errors.add(
                "password",
                &format!("is too short (minimum is {MIN_PASSWORD_LENGTH} characters)"),
            ),
            Some(_) => {}
        }

        match (email, first_name, last_name, password) {
            (Some(email), Some(first_name), Some(last_name), Some(password))
                if errors.is_empty() =>
            {
                Ok(NewUser {
                    email,
                    first_name,
                    last_name,
                    password,
                })
            }
            _ => Err(errors),
        }
    }
}
