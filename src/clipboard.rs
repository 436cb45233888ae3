//! Copy the report to the system clipboard through the platform's clipboard
//! command.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::{ClientError, Result};
use crate::session::ResearchSession;

/// Copy the plain text of a session's report.
pub fn copy_report(session: &ResearchSession) -> Result<()> {
    copy_to_clipboard(&session.report_text())
}

pub fn copy_to_clipboard(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(ClientError::EmptyReport);
    }

    #[cfg(target_os = "macos")]
    {
        run_with_stdin("pbcopy", &[], text)
    }
    #[cfg(target_os = "windows")]
    {
        run_with_stdin("cmd", &["/C", "clip"], text)
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        const CANDIDATES: &[(&str, &[&str])] = &[
            ("wl-copy", &[]),
            ("xclip", &["-selection", "clipboard"]),
            ("xsel", &["--clipboard", "--input"]),
        ];
        for (cmd, args) in CANDIDATES {
            match run_with_stdin(cmd, args, text) {
                Ok(()) => return Ok(()),
                Err(e) => tracing::debug!(error = %e, "clipboard command unavailable"),
            }
        }
        Err(ClientError::Clipboard(
            "no clipboard command found (install wl-copy, xclip, or xsel)".to_string(),
        ))
    }
}

fn run_with_stdin(cmd: &str, args: &[&str], input: &str) -> Result<()> {
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|_| ClientError::Clipboard(format!("clipboard command `{cmd}` not available")))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes())?;
    }
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(ClientError::Clipboard(format!("clipboard command `{cmd}` failed")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_rejected() {
        assert!(matches!(copy_to_clipboard(""), Err(ClientError::EmptyReport)));
        assert!(matches!(copy_to_clipboard("  \n"), Err(ClientError::EmptyReport)));
    }

    #[test]
    fn test_copy_report_without_report_is_rejected() {
        let session = ResearchSession::new();
        assert!(matches!(copy_report(&session), Err(ClientError::EmptyReport)));
    }

    #[test]
    fn test_missing_command_is_clipboard_error() {
        let err = run_with_stdin("definitely-not-a-clipboard-tool", &[], "x").unwrap_err();
        assert!(matches!(err, ClientError::Clipboard(_)));
    }
}
