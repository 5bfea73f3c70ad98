pub mod http;
#[cfg(test)]
pub mod testing;
pub mod traits;
pub mod types;

pub use http::HttpBackend;
pub use traits::ChatBackend;
pub use types::{ApiError, Envelope, NewMessage, RelationKind};
