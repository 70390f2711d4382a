pub mod logging;
pub mod rq;
pub mod schema;
pub mod service;
pub mod translator;
mod validate;

pub use logging::{LogFormat, LoggingConfig};
pub use rq::RqConfig;
pub use schema::SchemaConfig;
pub use service::ServiceConfig;
pub use translator::TranslatorConfig;
