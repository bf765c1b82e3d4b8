pub mod handler;
pub mod types;

pub use handler::{handle_follow_up, handle_not_found, handle_search};
pub use types::{FollowUpRequest, SearchParams, SearchResponse};
