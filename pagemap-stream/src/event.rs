use crate::error::{Result, StreamError};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Everything a discovery session can report over its progress stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Start {
        message: Option<String>,
    },
    Running {
        message: Option<String>,
    },
    PageDiscovered {
        url: String,
        total_pages: u64,
    },
    FlowDiscovered {
        name: String,
        total_flows: u64,
    },
    Progress {
        progress: f64,
        current_url: Option<String>,
        elements_found: u64,
        forms_found: u64,
    },
    Error {
        message: String,
    },
    Complete {
        pages_found: Option<u64>,
        flows_found: Option<u64>,
    },
    Failed {
        error: String,
    },
    Cancelled,
    Paused,
    Resumed,
    Keepalive,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MessagePayload {
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageRef {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PagePayload {
    page: PageRef,
    total_pages: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FlowRef {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FlowPayload {
    flow: FlowRef,
    total_flows: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProgressPayload {
    progress: f64,
    current_url: Option<String>,
    elements_found: u64,
    forms_found: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CompletePayload {
    pages_found: Option<u64>,
    flows_found: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FailedPayload {
    error: Option<String>,
    message: Option<String>,
}

fn parse<T: DeserializeOwned>(name: &str, data: &str) -> Result<T> {
    let data = data.trim();
    let data = if data.is_empty() { "{}" } else { data };
    serde_json::from_str(data).map_err(|e| StreamError::MalformedPayload {
        event: name.to_string(),
        reason: e.to_string(),
    })
}

impl ProgressEvent {
    /// Decode a named event and its JSON payload.
    ///
    /// Returns `Ok(None)` for names outside the vocabulary and `MalformedPayload` when the JSON
    /// cannot be read. Events without meaningful fields never look at their payload.
    pub fn decode(name: &str, data: &str) -> Result<Option<Self>> {
        let event = match name {
            "start" => {
                let p: MessagePayload = parse(name, data)?;
                ProgressEvent::Start { message: p.message }
            }
            "running" => {
                let p: MessagePayload = parse(name, data)?;
                ProgressEvent::Running { message: p.message }
            }
            "page_discovered" => {
                let p: PagePayload = parse(name, data)?;
                ProgressEvent::PageDiscovered {
                    url: p.page.url,
                    total_pages: p.total_pages,
                }
            }
            "flow_discovered" => {
                let p: FlowPayload = parse(name, data)?;
                ProgressEvent::FlowDiscovered {
                    name: p.flow.name,
                    total_flows: p.total_flows,
                }
            }
            "progress" => {
                let p: ProgressPayload = parse(name, data)?;
                ProgressEvent::Progress {
                    progress: p.progress,
                    current_url: p.current_url,
                    elements_found: p.elements_found,
                    forms_found: p.forms_found,
                }
            }
            "error" => {
                let p: MessagePayload = parse(name, data)?;
                ProgressEvent::Error {
                    message: p.message.unwrap_or_else(|| "Unknown error".to_string()),
                }
            }
            "complete" => {
                let p: CompletePayload = parse(name, data)?;
                ProgressEvent::Complete {
                    pages_found: p.pages_found,
                    flows_found: p.flows_found,
                }
            }
            "failed" => {
                let p: FailedPayload = parse(name, data)?;
                ProgressEvent::Failed {
                    error: p
                        .error
                        .or(p.message)
                        .unwrap_or_else(|| "Discovery failed".to_string()),
                }
            }
            "cancelled" => ProgressEvent::Cancelled,
            "paused" => ProgressEvent::Paused,
            "resumed" => ProgressEvent::Resumed,
            "keepalive" => ProgressEvent::Keepalive,
            other => {
                debug!("Ignoring unknown event '{}'", other);
                return Ok(None);
            }
        };
        Ok(Some(event))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProgressEvent::Start { .. } => "start",
            ProgressEvent::Running { .. } => "running",
            ProgressEvent::PageDiscovered { .. } => "page_discovered",
            ProgressEvent::FlowDiscovered { .. } => "flow_discovered",
            ProgressEvent::Progress { .. } => "progress",
            ProgressEvent::Error { .. } => "error",
            ProgressEvent::Complete { .. } => "complete",
            ProgressEvent::Failed { .. } => "failed",
            ProgressEvent::Cancelled => "cancelled",
            ProgressEvent::Paused => "paused",
            ProgressEvent::Resumed => "resumed",
            ProgressEvent::Keepalive => "keepalive",
        }
    }

    /// The session will not send anything after this event.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Complete { .. } | ProgressEvent::Failed { .. } | ProgressEvent::Cancelled
        )
    }
}
