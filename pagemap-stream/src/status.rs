use crate::event::ProgressEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Oldest activity entries are dropped past this size.
pub const MAX_ACTIVITY_ENTRIES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Pending => "pending",
            SessionState::Running => "running",
            SessionState::Paused => "paused",
            SessionState::Completed => "completed",
            SessionState::Failed => "failed",
            SessionState::Cancelled => "cancelled",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Failed | SessionState::Cancelled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: ActivityKind,
    pub message: String,
}

/// Control actions a user can take on a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Pause,
    Resume,
    Cancel,
}

impl SessionCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionCommand::Pause => "pause",
            SessionCommand::Resume => "resume",
            SessionCommand::Cancel => "cancel",
        }
    }
}

/// Local view of a discovery session, folded from its progress events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: String,
    pub state: SessionState,
    /// Percentage, 0 to 100
    pub progress: f64,
    pub pages_found: u64,
    pub flows_found: u64,
    pub elements_found: u64,
    pub forms_found: u64,
    pub current_page: Option<String>,
    pub last_error: Option<String>,
    pub connection_error: Option<String>,
    pub last_event_at: Option<DateTime<Utc>>,
    pub activity: Vec<ActivityEntry>,
}

impl SessionStatus {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            state: SessionState::Pending,
            progress: 0.0,
            pages_found: 0,
            flows_found: 0,
            elements_found: 0,
            forms_found: 0,
            current_page: None,
            last_error: None,
            connection_error: None,
            last_event_at: None,
            activity: Vec::new(),
        }
    }

    pub fn log(&mut self, kind: ActivityKind, message: impl Into<String>) {
        self.activity.push(ActivityEntry {
            timestamp: Utc::now(),
            kind,
            message: message.into(),
        });
        if self.activity.len() > MAX_ACTIVITY_ENTRIES {
            let excess = self.activity.len() - MAX_ACTIVITY_ENTRIES;
            self.activity.drain(..excess);
        }
    }

    /// Fold one event into the record.
    pub fn apply(&mut self, event: &ProgressEvent) {
        self.last_event_at = Some(Utc::now());

        match event {
            ProgressEvent::Start { message } => {
                self.state = SessionState::Running;
                self.log(
                    ActivityKind::Info,
                    message.clone().unwrap_or_else(|| "Discovery started".to_string()),
                );
            }
            ProgressEvent::Running { message } => {
                self.state = SessionState::Running;
                if let Some(message) = message {
                    self.log(ActivityKind::Info, message.clone());
                }
            }
            ProgressEvent::PageDiscovered { url, total_pages } => {
                self.pages_found = *total_pages;
                self.current_page = Some(url.clone());
                self.log(ActivityKind::Success, format!("Discovered page: {}", url));
            }
            ProgressEvent::FlowDiscovered { name, total_flows } => {
                self.flows_found = *total_flows;
                self.log(ActivityKind::Success, format!("Discovered flow: {}", name));
            }
            ProgressEvent::Progress {
                progress,
                current_url,
                elements_found,
                forms_found,
            } => {
                self.state = SessionState::Running;
                self.progress = progress.clamp(0.0, 100.0);
                if current_url.is_some() {
                    self.current_page = current_url.clone();
                }
                self.elements_found = *elements_found;
                self.forms_found = *forms_found;
            }
            ProgressEvent::Error { message } => {
                self.last_error = Some(message.clone());
                self.log(ActivityKind::Error, message.clone());
            }
            ProgressEvent::Complete {
                pages_found,
                flows_found,
            } => {
                self.state = SessionState::Completed;
                self.progress = 100.0;
                if let Some(pages) = pages_found {
                    self.pages_found = *pages;
                }
                if let Some(flows) = flows_found {
                    self.flows_found = *flows;
                }
                self.log(
                    ActivityKind::Success,
                    format!(
                        "Discovery complete: {} pages, {} flows",
                        self.pages_found, self.flows_found
                    ),
                );
            }
            ProgressEvent::Failed { error } => {
                self.state = SessionState::Failed;
                self.last_error = Some(error.clone());
                self.log(ActivityKind::Error, format!("Discovery failed: {}", error));
            }
            ProgressEvent::Cancelled => {
                self.state = SessionState::Cancelled;
                self.log(ActivityKind::Warning, "Discovery cancelled");
            }
            ProgressEvent::Paused => {
                self.state = SessionState::Paused;
                self.log(ActivityKind::Info, "Discovery paused");
            }
            ProgressEvent::Resumed => {
                self.state = SessionState::Running;
                self.log(ActivityKind::Info, "Discovery resumed");
            }
            ProgressEvent::Keepalive => {}
        }
    }

    /// Optimistic update after the backend accepted a control command.
    pub fn apply_command(&mut self, command: SessionCommand) {
        let (state, message) = match command {
            SessionCommand::Pause => (SessionState::Paused, "Pause requested"),
            SessionCommand::Resume => (SessionState::Running, "Resume requested"),
            SessionCommand::Cancel => (SessionState::Cancelled, "Cancellation requested"),
        };
        self.state = state;
        self.log(ActivityKind::Info, message);
    }

    pub fn mark_connection_lost(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.connection_error = Some(message.clone());
        self.log(ActivityKind::Error, message);
    }
}
