//! HTTP/JSON surface over [`chat_core`].

pub mod api;
pub mod error;
pub mod extract;
pub mod state;

pub use api::create_router;
pub use error::ApiError;
pub use state::AppState;
