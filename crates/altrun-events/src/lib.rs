pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use client::SupabaseClient;
pub use error::EventsError;
pub use types::EventRecord;
