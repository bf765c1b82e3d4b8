pub mod http;
pub mod apis;
pub mod error;
pub mod format;
pub mod session;

pub use error::{ApiError, ApiJson, ApiQuery, ErrorResponse};
pub use format::{FormattedResponse, Source};
pub use session::{SearchSession, SessionManager, SessionManagerConfig};
pub use http::{build_router, start_server, ServerConfig, ServerState};
