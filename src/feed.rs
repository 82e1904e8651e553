pub mod store;
pub mod structs;

pub use store::{FeedState, SharedFeed, Snapshot};
