//! Data models for the ingestion pipeline
//!
//! Persistent records, derived artifacts and the request/response shapes of the
//! upload and delete entry points.

mod category;
mod delete;
mod stored_file;
mod thumbnail;
mod upload;

pub use category::*;
pub use delete::*;
pub use stored_file::*;
pub use thumbnail::*;
pub use upload::*;
