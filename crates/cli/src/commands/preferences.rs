//! Site preference commands.

use rinkside_api::db::{PreferenceRepository, RepositoryError};

use super::{ConnectError, connect};

/// Errors that can occur while managing preferences.
#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create the preference row with defaults if it does not exist.
pub async fn init() -> Result<(), PreferencesError> {
    let pool = connect().await?;
    let preferences = PreferenceRepository::new(&pool);

    if preferences.initialize().await? {
        tracing::info!("Site preferences created");
    } else {
        tracing::info!("Site preferences already exist");
    }

    let current = preferences.get().await?;
    tracing::info!(
        owner = %current.owner_name,
        favorite_number = current.favorite_number,
        "Current site preferences"
    );
    Ok(())
}
