//! JSON-lines sidecar surface: one request object per stdin line, one
//! response object per stdout line, matched by `id`.

mod error;
mod handlers;
mod helpers;
mod router;
mod types;

pub use router::handle_request;
pub use types::{AppState, Request};
