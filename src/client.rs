//! Socket driver: one WebSocket per research run.
//!
//! ## Run lifecycle
//! 1. Previous output is cleared and the initial status line is shown
//! 2. The socket URI is derived from the page URL and the socket is opened
//! 3. `start <JSON>` is sent once
//! 4. Every text frame is parsed and dispatched to the session and view
//! 5. The run ends when the server closes the socket
//!
//! There is no reconnect. A frame that fails to parse is logged and skipped.

use futures_util::{SinkExt, StreamExt};
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::endpoint::{resolve_download, ws_uri};
use crate::error::{ClientError, Result};
use crate::protocol::{encode_start, parse_server_message, ResearchRequest};
use crate::session::ResearchSession;
use crate::view::ResearchView;

pub struct ResearchClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl ResearchClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build a request for `task` with the configured report type and agent.
    pub fn request(&self, task: impl Into<String>) -> ResearchRequest {
        ResearchRequest {
            task: task.into(),
            report_type: self.config.report_type.clone(),
            agent: self.config.agent.clone(),
        }
    }

    /// Execute one research run to completion.
    pub async fn run(
        &self,
        request: &ResearchRequest,
        view: &mut dyn ResearchView,
    ) -> Result<ResearchSession> {
        let uri = ws_uri(&self.config.page_url)?;
        let mut session = ResearchSession::new();
        let run = session.id();

        session.start_research(view)?;

        info!(%run, uri = %uri, "connecting");
        let connect = tokio_tungstenite::connect_async(uri.as_str());
        let (ws_stream, _) = match self.config.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, connect)
                .await
                .map_err(|_| ClientError::Timeout(limit.as_secs()))??,
            None => connect.await?,
        };

        let (mut ws_sink, mut ws_stream) = ws_stream.split();

        let command = encode_start(request)?;
        info!(%run, report_type = %request.report_type, agent = %request.agent, "sending start command");
        ws_sink.send(WsMessage::Text(command)).await?;

        while let Some(frame) = ws_stream.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => dispatch(&mut session, &text, view)?,
                Ok(WsMessage::Close(reason)) => {
                    info!(%run, ?reason, "server closed the socket");
                }
                Ok(_) => {}
                Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => break,
                Err(WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake)) => {
                    warn!(%run, "server dropped the connection without a close frame");
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(
            %run,
            responses = session.responses().len(),
            report_chunks = session.report_chunks().len(),
            ignored = session.ignored(),
            "run finished"
        );
        view.finish(&session)?;
        Ok(session)
    }

    /// Absolute URL of the session's report file, if the server sent one.
    pub fn download_url(&self, session: &ResearchSession) -> Result<Option<Url>> {
        session
            .download_path()
            .map(|path| resolve_download(&self.config.page_url, path))
            .transpose()
    }

    /// Fetch the report file into `dest_dir`. Returns the written path, or
    /// `None` when the server never sent a `path` message.
    pub async fn download_report(
        &self,
        session: &ResearchSession,
        dest_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        let Some(url) = self.download_url(session)? else {
            return Ok(None);
        };

        debug!(run = %session.id(), %url, "downloading report");
        let response = self.http.get(url.clone()).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        tokio::fs::create_dir_all(dest_dir).await?;
        let dest = dest_dir.join(file_name_for(&url));
        tokio::fs::write(&dest, &bytes).await?;
        info!(run = %session.id(), dest = %dest.display(), bytes = bytes.len(), "report downloaded");
        Ok(Some(dest))
    }
}

fn dispatch(session: &mut ResearchSession, text: &str, view: &mut dyn ResearchView) -> Result<()> {
    match parse_server_message(text) {
        Ok(message) => {
            debug!(run = %session.id(), kind = message.kind(), "frame");
            session.apply(message, view)
        }
        Err(e) => {
            warn!(run = %session.id(), error = %e, "skipping frame");
            Ok(())
        }
    }
}

/// Decoded last path segment of the download URL, safe to join onto the
/// destination directory. Falls back to `report`.
fn file_name_for(url: &Url) -> String {
    let decoded = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
        .unwrap_or_default();

    let name: String = decoded
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    let name = name.trim();

    if name.is_empty() || name.chars().all(|c| c == '.') {
        "report".to_string()
    } else {
        name.to_string()
    }
}
