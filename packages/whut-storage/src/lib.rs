pub mod db;
pub mod models;
pub mod preferences;
pub mod schema;
pub mod sent;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
