//! Wire contract between the console and a research server.
//!
//! Client to server is a single text frame, `start <JSON>`, carrying the
//! [`ResearchRequest`]. Server to client frames are JSON objects of the form
//! `{"type": "logs" | "report" | "path", "output": "..."}`.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Prefix of the one command the client ever sends.
pub const START_COMMAND: &str = "start";

/// The research task sent when the socket opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub task: String,
    pub report_type: String,
    pub agent: String,
}

/// One inbound frame, dispatched on its `type` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// A status line to append to the agent output.
    Logs { output: String },
    /// A Markdown chunk of the final report.
    Report { output: String },
    /// Server path of the generated report file.
    Path { output: String },
    /// Any other tag. Carried so callers can log it; never rendered.
    Unknown(String),
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    output: Option<String>,
}

impl ServerMessage {
    /// Tag name as it appears on the wire.
    pub fn kind(&self) -> &str {
        match self {
            ServerMessage::Logs { .. } => "logs",
            ServerMessage::Report { .. } => "report",
            ServerMessage::Path { .. } => "path",
            ServerMessage::Unknown(tag) => tag,
        }
    }

    /// Serialize back into a wire frame. Unknown messages carry no output.
    pub fn to_json(&self) -> String {
        let value = match self {
            ServerMessage::Logs { output }
            | ServerMessage::Report { output }
            | ServerMessage::Path { output } => {
                serde_json::json!({ "type": self.kind(), "output": output })
            }
            ServerMessage::Unknown(tag) => serde_json::json!({ "type": tag }),
        };
        value.to_string()
    }
}

/// Build the `start <JSON>` command for a request.
pub fn encode_start(request: &ResearchRequest) -> Result<String> {
    let json = serde_json::to_string(request)?;
    Ok(format!("{START_COMMAND} {json}"))
}

/// Parse a `start <JSON>` command. Used by servers and test doubles.
pub fn decode_start(text: &str) -> Result<ResearchRequest> {
    let json = text
        .strip_prefix(START_COMMAND)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or_else(|| {
            ClientError::Protocol(format!("expected `{START_COMMAND} <json>` command"))
        })?;
    Ok(serde_json::from_str(json)?)
}

/// Parse one inbound text frame.
pub fn parse_server_message(text: &str) -> Result<ServerMessage> {
    let raw: RawMessage = serde_json::from_str(text)
        .map_err(|e| ClientError::Protocol(format!("malformed server frame: {e}")))?;

    let need_output = |output: Option<String>| {
        output.ok_or_else(|| {
            ClientError::Protocol(format!("`{}` message without `output`", raw.kind))
        })
    };

    match raw.kind.as_str() {
        "logs" => Ok(ServerMessage::Logs {
            output: need_output(raw.output.clone())?,
        }),
        "report" => Ok(ServerMessage::Report {
            output: need_output(raw.output.clone())?,
        }),
        "path" => Ok(ServerMessage::Path {
            output: need_output(raw.output.clone())?,
        }),
        _ => Ok(ServerMessage::Unknown(raw.kind.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn request() -> ResearchRequest {
        ResearchRequest {
            task: "Is coffee good for you?".to_string(),
            report_type: "research_report".to_string(),
            agent: "Auto Agent".to_string(),
        }
    }

    #[test]
    fn test_encode_start_prefix_and_fields() {
        let cmd = encode_start(&request()).expect("encode");
        assert!(cmd.starts_with("start {"));
        let v: serde_json::Value = serde_json::from_str(&cmd["start ".len()..]).expect("json");
        assert_eq!(v["task"], "Is coffee good for you?");
        assert_eq!(v["report_type"], "research_report");
        assert_eq!(v["agent"], "Auto Agent");
    }

    #[test]
    fn test_decode_start_accepts_encoded_command() {
        let cmd = encode_start(&request()).expect("encode");
        assert_eq!(decode_start(&cmd).expect("decode"), request());
    }

    #[rstest]
    #[case("stop {}")]
    #[case("start")]
    #[case("start{\"task\":\"x\"}")]
    #[case("{\"task\":\"x\",\"report_type\":\"r\",\"agent\":\"a\"}")]
    fn test_decode_start_rejects(#[case] text: &str) {
        assert!(decode_start(text).is_err());
    }

    #[rstest]
    #[case(r#"{"type":"logs","output":"searching"}"#, ServerMessage::Logs { output: "searching".into() })]
    #[case(r##"{"type":"report","output":"# Title"}"##, ServerMessage::Report { output: "# Title".into() })]
    #[case(r#"{"type":"path","output":"outputs/r.pdf"}"#, ServerMessage::Path { output: "outputs/r.pdf".into() })]
    #[case(r#"{"type":"heartbeat"}"#, ServerMessage::Unknown("heartbeat".into()))]
    fn test_parse_server_message(#[case] text: &str, #[case] expected: ServerMessage) {
        assert_eq!(parse_server_message(text).expect("parse"), expected);
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let msg = parse_server_message(r#"{"type":"logs","output":"x","ts":1}"#).expect("parse");
        assert_eq!(msg, ServerMessage::Logs { output: "x".into() });
    }

    #[rstest]
    #[case("not json")]
    #[case(r#"{"output":"no type"}"#)]
    #[case(r#"{"type":"logs"}"#)]
    #[case(r#"{"type":"report","output":42}"#)]
    fn test_parse_rejects_malformed(#[case] text: &str) {
        let err = parse_server_message(text).unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[test]
    fn test_to_json_parses_back() {
        let msg = ServerMessage::Path { output: "a/b.md".into() };
        assert_eq!(parse_server_message(&msg.to_json()).expect("parse"), msg);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ServerMessage::Logs { output: String::new() }.kind(), "logs");
        assert_eq!(ServerMessage::Unknown("x".into()).kind(), "x");
    }
}
