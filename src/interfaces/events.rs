// Line-delimited JSON protocol spoken with the browser shim
use crate::application::messages::{handle_message, Response};
use crate::application::navigation::{on_action_clicked, on_tab_removed, on_tab_updated};
use crate::domain::model::{IconPaths, TabId};
use crate::domain::traits::BrowserHost;
use crate::state::AppState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    TabUpdated { tab_id: TabId, url: String },
    TabRemoved { tab_id: TabId },
    ActionClicked { tab_id: TabId, url: String },
    Message { id: Value, message: Value },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    SetIcon { tab_id: TabId, path: IconPaths },
    Show { tab_id: TabId },
    OpenTab { url: String },
    Reply { id: Value, response: Response },
}

/// Browser host that turns every call into an outbound event.
pub struct ChannelHost {
    tx: UnboundedSender<OutboundEvent>,
}

impl ChannelHost {
    pub fn new(tx: UnboundedSender<OutboundEvent>) -> Self {
        Self { tx }
    }

    fn emit(&self, event: OutboundEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!("output closed, dropping event");
        }
    }
}

#[async_trait]
impl BrowserHost for ChannelHost {
    async fn set_icon(&self, tab_id: TabId, paths: &IconPaths) {
        self.emit(OutboundEvent::SetIcon {
            tab_id,
            path: paths.clone(),
        });
    }

    async fn show(&self, tab_id: TabId) {
        self.emit(OutboundEvent::Show { tab_id });
    }

    async fn open_tab(&self, url: &str) {
        self.emit(OutboundEvent::OpenTab {
            url: url.to_string(),
        });
    }
}

/// Host for one-shot commands, where nothing is listening.
pub struct LogHost;

#[async_trait]
impl BrowserHost for LogHost {
    async fn set_icon(&self, tab_id: TabId, paths: &IconPaths) {
        tracing::info!(tab_id, ?paths, "set icon");
    }

    async fn show(&self, tab_id: TabId) {
        tracing::info!(tab_id, "show icon");
    }

    async fn open_tab(&self, url: &str) {
        tracing::info!(url, "open tab");
    }
}

pub async fn dispatch(
    state: &AppState,
    event: InboundEvent,
    replies: &UnboundedSender<OutboundEvent>,
) {
    match event {
        InboundEvent::TabUpdated { tab_id, url } => {
            on_tab_updated(state, tab_id, &url).await;
        }
        InboundEvent::TabRemoved { tab_id } => on_tab_removed(state, tab_id),
        InboundEvent::ActionClicked { tab_id, url } => {
            if let Err(e) = on_action_clicked(state, &url).await {
                tracing::warn!(tab_id, error = %e, "could not open report page");
            }
        }
        InboundEvent::Message { id, message } => {
            if let Some(response) = handle_message(state, &message).await {
                if replies.send(OutboundEvent::Reply { id, response }).is_err() {
                    tracing::warn!("output closed, dropping reply");
                }
            }
        }
    }
}

/// Read events until EOF, handling each one on its own task.
///
/// Returns once the input is exhausted and every started handler finished.
pub async fn serve<R>(
    state: AppState,
    input: R,
    replies: UnboundedSender<OutboundEvent>,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut tasks = JoinSet::new();
    let mut handled = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = match serde_json::from_str::<InboundEvent>(line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed event");
                continue;
            }
        };

        handled += 1;
        let state = state.clone();
        let replies = replies.clone();
        tasks.spawn(async move { dispatch(&state, event, &replies).await });

        // Reap finished handlers so the set does not grow without bound
        while let Some(done) = tasks.try_join_next() {
            if let Err(e) = done {
                tracing::error!(error = %e, "event handler panicked");
            }
        }
    }

    while let Some(done) = tasks.join_next().await {
        if let Err(e) = done {
            tracing::error!(error = %e, "event handler panicked");
        }
    }

    Ok(handled)
}

/// Write outbound events as JSON lines until every sender is gone.
pub async fn write_events<W>(
    mut rx: UnboundedReceiver<OutboundEvent>,
    mut out: W,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = rx.recv().await {
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        out.write_all(&line).await?;
        out.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inbound_events_parse() {
        let event: InboundEvent =
            serde_json::from_str(r#"{"type":"tab_updated","tab_id":3,"url":"https://a.com"}"#)
                .unwrap();
        assert_eq!(
            event,
            InboundEvent::TabUpdated {
                tab_id: 3,
                url: "https://a.com".to_string()
            }
        );

        let event: InboundEvent = serde_json::from_str(
            r#"{"type":"message","id":"m1","message":{"command":"installed"}}"#,
        )
        .unwrap();
        assert!(matches!(event, InboundEvent::Message { .. }));
    }

    #[test]
    fn outbound_icon_paths_use_string_keys() {
        let mut path = IconPaths::new();
        path.insert(19, "assets/bg19.png".to_string());
        let value = serde_json::to_value(OutboundEvent::SetIcon { tab_id: 1, path }).unwrap();
        assert_eq!(
            value,
            json!({"type": "set_icon", "tab_id": 1, "path": {"19": "assets/bg19.png"}})
        );
    }

    #[tokio::test]
    async fn writer_emits_one_line_per_event() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        tx.send(OutboundEvent::Show { tab_id: 4 }).unwrap();
        tx.send(OutboundEvent::OpenTab {
            url: "https://x".to_string(),
        })
        .unwrap();
        drop(tx);

        let mut out = Vec::new();
        write_events(rx, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"type":"show","tab_id":4}"#);
    }
}
