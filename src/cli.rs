use crate::config::{parse_page_url, ClientConfig, FileConfig};
use crate::error::Result;
use clap::{ArgAction, CommandFactory, Parser};
use clap_complete::Shell;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "research-console")]
#[command(version)]
#[command(about = "Run a research agent over WebSocket and stream its report to the terminal")]
pub struct Args {
    /// Research task or question to send to the agent
    #[arg(required_unless_present = "completions")]
    pub task: Option<String>,

    /// Report type requested from the server (e.g. research_report, resource_report)
    #[arg(long)]
    pub report_type: Option<String>,

    /// Agent the server should use
    #[arg(long)]
    pub agent: Option<String>,

    /// URL of the research page; the socket is opened at `<url>ws`
    #[arg(long)]
    pub url: Option<String>,

    /// Config file (defaults to the platform config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Copy the finished report to the clipboard
    #[arg(long)]
    pub copy: bool,

    /// Do not copy the report, even if the config file enables it
    #[arg(long, conflicts_with = "copy")]
    pub no_copy: bool,

    /// Print only the final report Markdown
    #[arg(long, short)]
    pub quiet: bool,

    /// Write the report Markdown to this file
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Write the rendered report HTML to this file
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// Download the server-generated report file into this directory
    #[arg(long)]
    pub download: Option<PathBuf>,

    /// Write a JSON summary of the run to this file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Seconds to wait for the socket to open
    #[arg(long)]
    pub connect_timeout: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print shell completions and exit
    #[arg(long, value_enum)]
    pub completions: Option<Shell>,
}

/// Layer command-line flags over the config file over the built-in defaults.
pub fn resolve_config(args: &Args, file: &FileConfig) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_file(file)?;
    if let Some(url) = &args.url {
        config.page_url = parse_page_url(url)?;
    }
    if let Some(report_type) = &args.report_type {
        config.report_type = report_type.clone();
    }
    if let Some(agent) = &args.agent {
        config.agent = agent.clone();
    }
    if let Some(secs) = args.connect_timeout {
        config.connect_timeout = Some(Duration::from_secs(secs));
    }
    if args.copy {
        config.copy = true;
    } else if args.no_copy {
        config.copy = false;
    }
    Ok(config)
}

pub fn print_completions(shell: Shell, out: &mut dyn Write) {
    clap_complete::generate(shell, &mut Args::command(), "research-console", out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_minimal() {
        let args = Args::parse_from(["rc", "Why is the sky blue?"]);
        assert_eq!(args.task.as_deref(), Some("Why is the sky blue?"));
        assert!(args.report_type.is_none());
        assert!(args.agent.is_none());
        assert!(args.url.is_none());
        assert!(!args.copy);
        assert!(!args.quiet);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_args_parse_full() {
        let args = Args::parse_from([
            "rc",
            "task",
            "--report-type",
            "resource_report",
            "--agent",
            "Finance Agent",
            "--url",
            "https://example.com/",
            "--copy",
            "--quiet",
            "--save",
            "report.md",
            "--html",
            "report.html",
            "--download",
            "out",
            "--summary",
            "run.json",
            "--connect-timeout",
            "5",
            "-vv",
        ]);
        assert_eq!(args.report_type.as_deref(), Some("resource_report"));
        assert_eq!(args.agent.as_deref(), Some("Finance Agent"));
        assert_eq!(args.url.as_deref(), Some("https://example.com/"));
        assert!(args.copy);
        assert!(args.quiet);
        assert_eq!(args.save, Some(PathBuf::from("report.md")));
        assert_eq!(args.html, Some(PathBuf::from("report.html")));
        assert_eq!(args.download, Some(PathBuf::from("out")));
        assert_eq!(args.summary, Some(PathBuf::from("run.json")));
        assert_eq!(args.connect_timeout, Some(5));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_args_task_required() {
        assert!(Args::try_parse_from(["rc"]).is_err());
    }

    #[test]
    fn test_args_completions_without_task() {
        let args = Args::parse_from(["rc", "--completions", "bash"]);
        assert!(args.task.is_none());
        assert_eq!(args.completions, Some(Shell::Bash));
    }

    #[test]
    fn test_args_short_quiet() {
        let args = Args::parse_from(["rc", "task", "-q"]);
        assert!(args.quiet);
    }

    #[test]
    fn test_resolve_config_defaults() {
        let args = Args::parse_from(["rc", "task"]);
        let config = resolve_config(&args, &FileConfig::default()).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_resolve_config_flags_beat_file() {
        let file = FileConfig {
            agent: Some("File Agent".to_string()),
            report_type: Some("outline_report".to_string()),
            copy: Some(false),
            ..Default::default()
        };
        let args = Args::parse_from(["rc", "task", "--agent", "Flag Agent", "--copy"]);
        let config = resolve_config(&args, &file).unwrap();
        assert_eq!(config.agent, "Flag Agent");
        assert_eq!(config.report_type, "outline_report");
        assert!(config.copy);
    }

    #[test]
    fn test_resolve_config_no_copy_beats_file() {
        let file = FileConfig {
            copy: Some(true),
            ..Default::default()
        };
        let args = Args::parse_from(["rc", "task", "--no-copy"]);
        assert!(!resolve_config(&args, &file).unwrap().copy);

        let args = Args::parse_from(["rc", "task"]);
        assert!(resolve_config(&args, &file).unwrap().copy);
    }

    #[test]
    fn test_args_copy_conflicts_with_no_copy() {
        assert!(Args::try_parse_from(["rc", "task", "--copy", "--no-copy"]).is_err());
    }

    #[test]
    fn test_resolve_config_bad_url() {
        let args = Args::parse_from(["rc", "task", "--url", "::"]);
        assert!(resolve_config(&args, &FileConfig::default()).is_err());
    }

    #[test]
    fn test_print_completions_mentions_binary() {
        let mut buf = Vec::new();
        print_completions(Shell::Bash, &mut buf);
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("research-console"));
    }
}
