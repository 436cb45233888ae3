use crate::cli::{resolve_config, Args};
use crate::client::ResearchClient;
use crate::clipboard;
use crate::config::FileConfig;
use crate::error::{ClientError, Result};
use crate::protocol::ResearchRequest;
use crate::session::ResearchSession;
use crate::view::{QuietView, TerminalView};
use colored::*;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub schema_version: u8,
    pub run_id: String,
    pub task: String,
    pub report_type: String,
    pub agent: String,
    pub responses: Vec<String>,
    pub report_markdown: String,
    pub download_path: Option<String>,
    pub downloaded_to: Option<PathBuf>,
    pub ignored_messages: usize,
}

impl RunSummary {
    fn new(
        session: &ResearchSession,
        request: &ResearchRequest,
        downloaded_to: Option<PathBuf>,
    ) -> Self {
        Self {
            schema_version: 1,
            run_id: session.id().to_string(),
            task: request.task.clone(),
            report_type: request.report_type.clone(),
            agent: request.agent.clone(),
            responses: session.responses().to_vec(),
            report_markdown: session.report_markdown(),
            download_path: session.download_path().map(str::to_string),
            downloaded_to,
            ignored_messages: session.ignored(),
        }
    }
}

/// Run one research task from parsed command-line arguments, then handle the
/// requested outputs (files, download, clipboard).
pub async fn run_research(args: &Args) -> Result<ResearchSession> {
    let file = FileConfig::load_or_default(args.config.as_deref())?;
    let config = resolve_config(args, &file)?;
    let task = args
        .task
        .clone()
        .ok_or_else(|| ClientError::Config("a research task is required".to_string()))?;

    let client = ResearchClient::new(config);
    let request = client.request(task);

    let session = if args.quiet {
        let mut view = QuietView::stdout();
        client.run(&request, &mut view).await?
    } else {
        let mut view = TerminalView::stdout(Some(client.config().page_url.clone()));
        client.run(&request, &mut view).await?
    };

    if let Some(path) = &args.save {
        std::fs::write(path, session.report_markdown())?;
        note(args, &format!("report saved to {}", path.display()));
    }

    if let Some(path) = &args.html {
        std::fs::write(path, session.report_html())?;
        note(args, &format!("HTML report saved to {}", path.display()));
    }

    let mut downloaded_to = None;
    if let Some(dir) = &args.download {
        match client.download_report(&session, dir).await? {
            Some(dest) => {
                note(args, &format!("report file downloaded to {}", dest.display()));
                downloaded_to = Some(dest);
            }
            None => note(args, "server sent no download link"),
        }
    }

    if let Some(path) = &args.summary {
        let summary = RunSummary::new(&session, &request, downloaded_to);
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, &json)?;
        note(args, &format!("wrote {} bytes to {}", json.len(), path.display()));
    }

    if client.config().copy {
        clipboard::copy_report(&session)?;
        note(args, "report copied to clipboard");
    }

    Ok(session)
}

fn note(args: &Args, message: &str) {
    if !args.quiet {
        eprintln!("{} {}", "[research]".bright_black(), message);
    }
}
