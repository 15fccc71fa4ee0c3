use serde::{Deserialize, Serialize};

/// One publish request read from the ingest socket
///
/// `endpoint` names the broadcast channel and is matched verbatim against
/// subscriber paths. The optional fields map one-to-one onto SSE record
/// fields. Unknown JSON keys are ignored.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Command {
    pub endpoint: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Command {
    /// Parse one ingest line
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Serialize to a newline-terminated JSON line
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}
