pub mod config;
pub mod db;
pub mod error;

pub use config::{AppConfig, DEFAULT_HOST, DEFAULT_PORT, GoogleAuthConfig, ResponseMode};
pub use error::{CalendarError, DeliveryFailure};
