pub mod db;
pub mod links;
pub mod models;
pub mod schema;
pub mod tags;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
