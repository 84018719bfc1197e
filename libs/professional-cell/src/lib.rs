pub mod directory;
pub mod handlers;
pub mod models;
pub mod router;

pub use directory::ProfessionalDirectory;
pub use models::Professional;
