#[macro_use]
mod log_macros;

pub mod client;
pub mod error;
pub mod query;
pub mod tracing_init;

pub use client::QueryClient;
pub use error::{ClientError, ClientReason, ClientResult};
pub use query::{RestQuery, SortDirection};
