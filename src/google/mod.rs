pub mod gcal;
pub mod oauth;
pub mod service_account;
pub mod store;
pub mod token;

pub use gcal::{CalendarEvent, CalendarFetcher, CalendarWindow, LookaheadDays};
pub use oauth::OAuthClient;
pub use service_account::ServiceAccountTokenProvider;
pub use store::{CredentialRecord, CredentialStore, SqliteCredentialStore};
pub use token::{StoredTokenProvider, TokenProvider};
