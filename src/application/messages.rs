use crate::application::install::install_record;
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Commands accepted from the trusted web page.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum Command {
    Installed,
    Bust { key: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Response {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Response {
    fn ok(timestamp: Option<i64>) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp,
        }
    }

    fn error() -> Self {
        Self {
            status: "error".to_string(),
            timestamp: None,
        }
    }
}

pub fn parse_command(message: &Value) -> Option<Command> {
    Command::deserialize(message).ok()
}

/// Answer an inbound message; `None` means no reply is sent.
pub async fn handle_message(state: &AppState, message: &Value) -> Option<Response> {
    let Some(command) = parse_command(message) else {
        tracing::debug!(message = %message, "ignoring unrecognized message");
        return None;
    };

    let response = match command {
        Command::Installed => {
            match install_record(state.store.as_ref(), &state.config.install_key).await {
                Ok(record) => Response::ok(record.map(|r| r.timestamp)),
                Err(e) => {
                    tracing::warn!(error = %e, "could not read install record");
                    Response::error()
                }
            }
        }
        Command::Bust { key } => match state.cache.evict(&key).await {
            Ok(()) => Response::ok(None),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache bust failed");
                Response::error()
            }
        },
    };

    Some(response)
}
