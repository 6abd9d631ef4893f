//! Business logic services.

pub mod auth;
pub mod media;
pub mod payments;

pub use auth::{AuthError, AuthService, AuthSession, TokenIssuer};
pub use media::{ImageUpload, MediaError, MediaService, UploadedImage};
pub use payments::{PaymentError, PaymentService};
