//! Terminal client for research-agent servers.
//!
//! One research run opens one WebSocket, sends `start <JSON>` and renders the
//! streamed status lines, Markdown report and download link until the server
//! closes the socket.

pub mod cli;
pub mod client;
pub mod clipboard;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod render;
pub mod research;
pub mod session;
pub mod view;

pub use client::ResearchClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use protocol::{ResearchRequest, ServerMessage};
pub use session::ResearchSession;
pub use view::ResearchView;
