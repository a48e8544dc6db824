use crate::error::{Result, StreamError};
use crate::event::ProgressEvent;
use crate::reconnect::{ConnectionEvent, ConnectionState, RetryPolicy, transition};
use crate::sse::{SseDecoder, SseFrame};
use crate::status::{ActivityKind, SessionStatus};
use futures::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

pub type EventCallback = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;
pub type StatusCallback = Arc<dyn Fn(&SessionStatus) + Send + Sync>;
pub type ConnectionCallback = Arc<dyn Fn(ConnectionState) + Send + Sync>;

const USER_AGENT: &str = concat!("pagemap/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_http_client(connect_timeout_secs: u64) -> Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .tcp_keepalive(Duration::from_secs(60))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()?;
    Ok(client)
}

pub(crate) fn parse_base_url(base_url: &str) -> Result<Url> {
    Url::parse(base_url).map_err(|e| StreamError::InvalidUrl(format!("{}: {}", base_url, e)))
}

/// `{base}/api/discovery/sessions/{session_id}/{action}`, keeping any path prefix of `base`.
pub fn session_endpoint(base: &Url, session_id: &str, action: &str) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| StreamError::InvalidUrl(format!("{} cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(["api", "discovery", "sessions", session_id, action]);
    Ok(url)
}

enum StreamOutcome {
    /// The session reported a terminal event.
    Finished,
    Shutdown,
    Dropped(StreamError),
}

/// Resolves once shutdown has been requested. Never resolves if the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Follows the progress stream of one discovery session.
#[derive(Clone)]
pub struct StreamClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
    retry: RetryPolicy,
    event_callback: Option<EventCallback>,
    status_callback: Option<StatusCallback>,
    connection_callback: Option<ConnectionCallback>,
}

impl StreamClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, 10)
    }

    /// `connect_timeout_secs` bounds connection setup only; an open stream may stay idle indefinitely.
    pub fn with_timeout(base_url: &str, connect_timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_http_client(connect_timeout_secs)?,
            base_url: parse_base_url(base_url)?,
            token: None,
            retry: RetryPolicy::default(),
            event_callback: None,
            status_callback: None,
            connection_callback: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    pub fn with_status_callback(mut self, callback: StatusCallback) -> Self {
        self.status_callback = Some(callback);
        self
    }

    pub fn with_connection_callback(mut self, callback: ConnectionCallback) -> Self {
        self.connection_callback = Some(callback);
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Stream endpoint for `session_id`. The token travels as a query parameter because an
    /// event-stream request cannot carry custom headers from a browser.
    pub fn stream_url(&self, session_id: &str) -> Result<Url> {
        let mut url = session_endpoint(&self.base_url, session_id, "stream")?;
        if let Some(ref token) = self.token {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url)
    }

    /// Follow the stream until the session finishes, shutdown is requested, or reconnecting is
    /// exhausted.
    pub async fn run(
        &self,
        session_id: &str,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<SessionStatus> {
        let url = self.stream_url(session_id)?;
        let mut status = SessionStatus::new(session_id);
        let mut state = ConnectionState::initial();
        info!("Following progress stream for session {}", session_id);

        loop {
            self.notify_connection(state);

            match state {
                ConnectionState::Connecting { .. } => {
                    let opened = tokio::select! {
                        result = self.open(&url) => Some(result),
                        _ = shutdown_requested(&mut shutdown) => None,
                    };

                    state = match opened {
                        None => transition(state, ConnectionEvent::Close, &self.retry),
                        Some(Ok(response)) => {
                            state = transition(state, ConnectionEvent::Opened, &self.retry);
                            self.notify_connection(state);
                            match self
                                .consume(response, &mut state, &mut status, &mut shutdown)
                                .await
                            {
                                StreamOutcome::Finished => {
                                    info!(
                                        "Session {} finished: {}",
                                        session_id,
                                        status.state.as_str()
                                    );
                                    transition(state, ConnectionEvent::Close, &self.retry)
                                }
                                StreamOutcome::Shutdown => {
                                    transition(state, ConnectionEvent::Close, &self.retry)
                                }
                                StreamOutcome::Dropped(err) => {
                                    warn!("Progress stream for {} dropped: {}", session_id, err);
                                    transition(state, ConnectionEvent::TransportFailed, &self.retry)
                                }
                            }
                        }
                        Some(Err(err)) => {
                            warn!("Could not open progress stream for {}: {}", session_id, err);
                            transition(state, ConnectionEvent::TransportFailed, &self.retry)
                        }
                    };

                    if let ConnectionState::Retrying { failures, delay } = state {
                        status.log(
                            ActivityKind::Warning,
                            format!(
                                "Connection lost, retrying in {}s (attempt {}/{})",
                                delay.as_secs_f64(),
                                failures + 1,
                                self.retry.max_attempts
                            ),
                        );
                        self.notify_status(&status);
                    }
                }
                ConnectionState::Retrying { delay, .. } => {
                    debug!("Waiting {:?} before reconnecting", delay);
                    let elapsed = tokio::select! {
                        _ = tokio::time::sleep(delay) => true,
                        _ = shutdown_requested(&mut shutdown) => false,
                    };
                    let event = if elapsed {
                        ConnectionEvent::RetryElapsed
                    } else {
                        ConnectionEvent::Close
                    };
                    state = transition(state, event, &self.retry);
                }
                ConnectionState::Open { .. } => {
                    // consume() always leaves Open; treat a stray Open as a dropped connection
                    state = transition(state, ConnectionEvent::TransportFailed, &self.retry);
                }
                ConnectionState::Failed { failures } => {
                    let err = StreamError::ConnectionExhausted { attempts: failures };
                    warn!("Giving up on session {}: {}", session_id, err);
                    status.mark_connection_lost(err.to_string());
                    self.notify_status(&status);
                    return Err(err);
                }
                ConnectionState::Closed => {
                    debug!("Progress stream for {} closed", session_id);
                    return Ok(status);
                }
            }
        }
    }

    /// Run on a background task. The caller keeps control through the returned handle.
    pub fn spawn(&self, session_id: impl Into<String>) -> StreamHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let client = self.clone();
        let session_id = session_id.into();
        let task = tokio::spawn(async move { client.run(&session_id, shutdown_rx).await });
        StreamHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn open(&self, url: &Url) -> Result<Response> {
        // only the path is logged, the query carries the token
        debug!("Connecting to {}", url.path());

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::Transport(format!(
                "unexpected status {}",
                status.as_u16()
            )));
        }
        Ok(response)
    }

    async fn consume(
        &self,
        response: Response,
        state: &mut ConnectionState,
        status: &mut SessionStatus,
        shutdown: &mut watch::Receiver<bool>,
    ) -> StreamOutcome {
        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::new();

        loop {
            let next = tokio::select! {
                chunk = stream.next() => Some(chunk),
                _ = shutdown_requested(shutdown) => None,
            };

            match next {
                None => return StreamOutcome::Shutdown,
                Some(Some(Ok(bytes))) => {
                    for frame in decoder.push(&bytes) {
                        if self.handle_frame(frame, state, status) {
                            return StreamOutcome::Finished;
                        }
                    }
                }
                Some(Some(Err(e))) => {
                    return StreamOutcome::Dropped(StreamError::Transport(e.to_string()));
                }
                Some(None) => {
                    if let Some(frame) = decoder.finish()
                        && self.handle_frame(frame, state, status)
                    {
                        return StreamOutcome::Finished;
                    }
                    return StreamOutcome::Dropped(StreamError::Transport(
                        "stream closed before the session finished".to_string(),
                    ));
                }
            }
        }
    }

    /// Fold one frame into `status`. Returns true when the session is over.
    fn handle_frame(
        &self,
        frame: SseFrame,
        state: &mut ConnectionState,
        status: &mut SessionStatus,
    ) -> bool {
        *state = transition(*state, ConnectionEvent::EventReceived, &self.retry);

        match ProgressEvent::decode(&frame.event, &frame.data) {
            Ok(Some(event)) => {
                debug!("Received '{}' event", event.name());
                status.apply(&event);
                if let Some(ref callback) = self.event_callback {
                    callback(&event);
                }
                self.notify_status(status);
                event.is_terminal()
            }
            Ok(None) => false,
            Err(err) => {
                warn!("Dropping event: {}", err);
                false
            }
        }
    }

    fn notify_status(&self, status: &SessionStatus) {
        if let Some(ref callback) = self.status_callback {
            callback(status);
        }
    }

    fn notify_connection(&self, state: ConnectionState) {
        if let Some(ref callback) = self.connection_callback {
            callback(state);
        }
    }
}

/// Handle to a stream running on a background task.
pub struct StreamHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Result<SessionStatus>>,
}

impl StreamHandle {
    /// Stop listening and close the transport.
    pub fn close(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn join(self) -> Result<SessionStatus> {
        self.task.await?
    }
}
