//! Couchwire Core Library
//!
//! Shared building blocks for talking to a CouchDB-style document database:
//! - Wire models for server, database, document and view replies
//! - View query argument encoding
//! - Client configuration

pub mod config;
pub mod document;
pub mod models;
pub mod view_args;

// Re-export commonly used types
pub use config::ClientConfig;
pub use document::{AttachmentStub, Document};
pub use models::*;
pub use view_args::{fix_view_args, ViewArgs};
