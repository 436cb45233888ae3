//! Output surfaces for a research run.

use colored::*;
use std::io::{self, Write};
use url::Url;

use crate::endpoint::resolve_download;
use crate::error::Result;
use crate::render::{render_terminal, RenderedReport};
use crate::session::ResearchSession;

/// Receives every visible change of a [`ResearchSession`].
pub trait ResearchView {
    /// Drop output from a previous run.
    fn clear(&mut self) -> Result<()> {
        Ok(())
    }

    fn add_agent_response(&mut self, text: &str) -> Result<()>;

    fn write_report(&mut self, chunk: &RenderedReport) -> Result<()>;

    fn update_download_link(&mut self, path: &str) -> Result<()>;

    /// Called once after the server closes the socket.
    fn finish(&mut self, _session: &ResearchSession) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------------

/// Interactive rendering: colored status lines, the report as styled text,
/// and a summary at the end. Every write is flushed so output follows the
/// stream.
pub struct TerminalView<W: Write = io::Stdout> {
    out: W,
    page_url: Option<Url>,
    report_started: bool,
}

impl TerminalView<io::Stdout> {
    pub fn stdout(page_url: Option<Url>) -> Self {
        Self::new(io::stdout(), page_url)
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W, page_url: Option<Url>) -> Self {
        Self {
            out,
            page_url,
            report_started: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResearchView for TerminalView<W> {
    fn clear(&mut self) -> Result<()> {
        self.report_started = false;
        Ok(())
    }

    fn add_agent_response(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{} {}", "▸".bright_blue(), text)?;
        self.out.flush()?;
        Ok(())
    }

    fn write_report(&mut self, chunk: &RenderedReport) -> Result<()> {
        if !self.report_started {
            writeln!(self.out, "{}", "=".repeat(50).bright_blue())?;
            writeln!(self.out, "{}", "Report:".bright_green())?;
            writeln!(self.out)?;
            self.report_started = true;
        }
        writeln!(self.out, "{}", render_terminal(&chunk.markdown))?;
        self.out.flush()?;
        Ok(())
    }

    fn update_download_link(&mut self, path: &str) -> Result<()> {
        let link = match &self.page_url {
            Some(base) => resolve_download(base, path)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| path.to_string()),
            None => path.to_string(),
        };
        writeln!(self.out, "{}: {}", "Download".bright_yellow(), link.underline())?;
        self.out.flush()?;
        Ok(())
    }

    fn finish(&mut self, session: &ResearchSession) -> Result<()> {
        writeln!(self.out, "\n{}", "=".repeat(50).bright_blue())?;
        writeln!(
            self.out,
            "Complete! Received {} status lines and {} report chunk(s).",
            session.responses().len(),
            session.report_chunks().len()
        )?;
        self.out.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Quiet
// ---------------------------------------------------------------------------

/// Writes nothing but the final report Markdown, for piping.
pub struct QuietView<W: Write = io::Stdout> {
    out: W,
}

impl QuietView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> QuietView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResearchView for QuietView<W> {
    fn add_agent_response(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    fn write_report(&mut self, _chunk: &RenderedReport) -> Result<()> {
        Ok(())
    }

    fn update_download_link(&mut self, _path: &str) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self, session: &ResearchSession) -> Result<()> {
        let markdown = session.report_markdown();
        if !markdown.is_empty() {
            writeln!(self.out, "{}", markdown.trim_end())?;
            self.out.flush()?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Recording
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Cleared,
    Response(String),
    Report(String),
    DownloadLink(String),
    Finished,
}

/// Headless view that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingView {
    pub events: Vec<ViewEvent>,
}

impl ResearchView for RecordingView {
    fn clear(&mut self) -> Result<()> {
        self.events.push(ViewEvent::Cleared);
        Ok(())
    }

    fn add_agent_response(&mut self, text: &str) -> Result<()> {
        self.events.push(ViewEvent::Response(text.to_string()));
        Ok(())
    }

    fn write_report(&mut self, chunk: &RenderedReport) -> Result<()> {
        self.events.push(ViewEvent::Report(chunk.markdown.clone()));
        Ok(())
    }

    fn update_download_link(&mut self, path: &str) -> Result<()> {
        self.events.push(ViewEvent::DownloadLink(path.to_string()));
        Ok(())
    }

    fn finish(&mut self, _session: &ResearchSession) -> Result<()> {
        self.events.push(ViewEvent::Finished);
        Ok(())
    }
}
