pub mod auth;
pub mod envelope;
pub mod error;
pub mod notification;

pub use envelope::ApiResponse;
pub use error::AppError;
