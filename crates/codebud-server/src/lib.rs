//! Local HTTP API for CodeBud: exposes the focused document, its
//! diagnostics and mode-gated edits to a polling client.

pub mod mirror;
pub mod router;
pub mod server;
pub mod state;

pub use mirror::{sync_from_disk, FileMirror};
pub use router::{handle, ApiResponse};
pub use server::{start_api_server, ApiServer};
pub use state::ApiState;
