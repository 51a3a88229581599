pub mod broker;
pub mod catalog;
pub mod error;
pub mod generic_types;
pub mod message;
pub mod microphone;
pub mod orb;
pub mod overrides;
pub mod realtime_api;
pub mod session;
pub mod topic;
pub mod transcript;

pub use catalog::{Catalog, CatalogError};
pub use error::SessionError;
pub use session::{ConversationController, SessionUpdate};
