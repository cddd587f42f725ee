//! HTTP server for notes.
//!
//! Exposes create/read/update/delete endpoints over one [`nts_store`]
//! backend. Every note endpoint answers HTTP 200 with a JSON
//! [`Envelope`](note::Envelope): `{"result": "OK"|"ERROR", "data": ..., "error": "..."}`.

pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod note;
pub mod router;
pub mod server;

pub use config::{LogConfig, ServerConfig};
pub use error::{ApiError, ServerError, ServerResult};
pub use handler::AppState;
pub use logging::init_logging;
pub use note::{Envelope, Note, Outcome, PureNote};
pub use server::NotesServer;
