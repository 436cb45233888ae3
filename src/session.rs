//! Research run state and inbound message dispatch.
//!
//! A [`ResearchSession`] lives for exactly one run. It keeps what the server
//! has streamed so far and mirrors every change onto a [`ResearchView`].

use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::protocol::ServerMessage;
use crate::render::RenderedReport;
use crate::view::ResearchView;

/// Status line shown as soon as a run starts, before the server says anything.
pub const INITIAL_RESPONSE: &str = "🤔 Generating research questions for the task...";

#[derive(Debug, Clone)]
pub struct ResearchSession {
    id: Uuid,
    responses: Vec<String>,
    report: Vec<RenderedReport>,
    download_path: Option<String>,
    ignored: usize,
}

impl Default for ResearchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ResearchSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            responses: Vec::new(),
            report: Vec::new(),
            download_path: None,
            ignored: 0,
        }
    }

    /// Run identifier, used to correlate log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Reset previous output and announce the run.
    pub fn start_research(&mut self, view: &mut dyn ResearchView) -> Result<()> {
        self.responses.clear();
        self.report.clear();
        self.download_path = None;
        self.ignored = 0;
        view.clear()?;
        self.add_agent_response(INITIAL_RESPONSE, view)
    }

    /// Dispatch one inbound message on its type.
    pub fn apply(&mut self, message: ServerMessage, view: &mut dyn ResearchView) -> Result<()> {
        match message {
            ServerMessage::Logs { output } => self.add_agent_response(&output, view),
            ServerMessage::Report { output } => self.write_report(&output, view),
            ServerMessage::Path { output } => self.update_download_link(output, view),
            ServerMessage::Unknown(kind) => {
                debug!(run = %self.id, kind = %kind, "ignoring message with unknown type");
                self.ignored += 1;
                Ok(())
            }
        }
    }

    fn add_agent_response(&mut self, text: &str, view: &mut dyn ResearchView) -> Result<()> {
        self.responses.push(text.to_string());
        view.add_agent_response(text)
    }

    fn write_report(&mut self, markdown: &str, view: &mut dyn ResearchView) -> Result<()> {
        let chunk = RenderedReport::from_markdown(markdown);
        view.write_report(&chunk)?;
        self.report.push(chunk);
        Ok(())
    }

    fn update_download_link(&mut self, path: String, view: &mut dyn ResearchView) -> Result<()> {
        view.update_download_link(&path)?;
        self.download_path = Some(path);
        Ok(())
    }

    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    pub fn report_chunks(&self) -> &[RenderedReport] {
        &self.report
    }

    pub fn has_report(&self) -> bool {
        !self.report.is_empty()
    }

    /// The report's Markdown, chunks concatenated as received.
    pub fn report_markdown(&self) -> String {
        self.report.iter().map(|c| c.markdown.as_str()).collect()
    }

    pub fn report_html(&self) -> String {
        self.report.iter().map(|c| c.html.as_str()).collect()
    }

    /// Plain text of the rendered report, as copied to the clipboard.
    pub fn report_text(&self) -> String {
        self.report
            .iter()
            .map(|c| c.plain.as_str())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Latest `path` received, if any.
    pub fn download_path(&self) -> Option<&str> {
        self.download_path.as_deref()
    }

    /// Count of messages dropped because their type was not recognized.
    pub fn ignored(&self) -> usize {
        self.ignored
    }
}
