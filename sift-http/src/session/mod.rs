mod conversation;
mod manager;

pub use conversation::SearchSession;
pub use manager::{SessionManager, SessionManagerConfig};
