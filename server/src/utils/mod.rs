pub mod error;
pub mod pagination;
pub mod response;

pub use error::AppError;
