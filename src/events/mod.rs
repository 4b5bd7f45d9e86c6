//! Events Module
//! Mission: Campus event management guarded by campus roles

pub mod api;
pub mod error;
pub mod models;
pub mod store;

pub use api::EventState;
pub use error::EventError;
pub use models::{Event, EventStatus};
pub use store::EventStore;
