use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::{mpsc, Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

use crate::config::ClaudeWebConfig;
use crate::error::{rejection_from_body, ClaudeWebError, SessionError};
use crate::events::PartialResponse;
use crate::headers::{build_headers, HeaderProfile};
use crate::model_cache::ModelCache;
use crate::payload::{
    created_conversation_id, first_organization_id, AppendMessageRequest, Attachment,
    CreateConversationRequest,
};
use crate::retry::{RetryDecision, RetryPlan};
use crate::session::Session;
use crate::sse::{decode_frame, FrameOutcome, LineReader};
use crate::transport::{
    ByteStream, HttpMethod, ReqwestTransport, Transport, TransportRequest, TransportResponse,
};
use crate::url::{conversation_route, conversations_route, endpoint};

/// Cooperative cancellation flag, polled once per stream line.
pub type CancellationSignal = Arc<AtomicBool>;

/// Ordered partial responses for one reply; closes after the terminal item.
pub type PartialResponseReceiver = mpsc::Receiver<PartialResponse>;

/// Fragments buffered ahead of the receiver before the stream task waits.
pub const STREAM_CHANNEL_CAPACITY: usize = 32;

const ORGANIZATIONS_ROUTE: &str = "organizations";
const APPEND_MESSAGE_ROUTE: &str = "append_message";

const ORGANIZATION_TIMEOUT: Duration = Duration::from_secs(30);
const CONVERSATION_TIMEOUT: Duration = Duration::from_secs(30);
const MESSAGE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const DELETE_TIMEOUT: Duration = Duration::from_secs(10);

/// One logical conversation against the web chat endpoint.
///
/// Replies are single-flight: the session lock is taken when `reply` starts
/// and released only after the spawned stream task finishes, so a second
/// `reply` waits for the first stream to drain.
pub struct ClaudeWebClient {
    config: ClaudeWebConfig,
    transport: Arc<dyn Transport>,
    models: Arc<ModelCache>,
    retry: RetryPlan,
    session: Arc<Mutex<Session>>,
}

impl ClaudeWebClient {
    pub fn new(config: ClaudeWebConfig) -> Result<Self, ClaudeWebError> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: ClaudeWebConfig, transport: Arc<dyn Transport>) -> Self {
        let retry = RetryPlan::new(
            config.effective_retry_budget(),
            config.primary_model.clone(),
            config.secondary_model.clone(),
        );
        let session = Session::new(config.primary_model.clone());

        Self {
            config,
            transport,
            models: ModelCache::global(),
            retry,
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Use `models` instead of the process-wide cache.
    pub fn with_model_cache(mut self, models: Arc<ModelCache>) -> Self {
        self.models = models;
        self
    }

    /// Start from a prepared session, e.g. to resume a known conversation.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Arc::new(Mutex::new(session));
        self
    }

    pub fn config(&self) -> &ClaudeWebConfig {
        &self.config
    }

    pub fn model_cache(&self) -> &Arc<ModelCache> {
        &self.models
    }

    pub fn retry_plan(&self) -> &RetryPlan {
        &self.retry
    }

    /// Snapshot of the session; waits for any in-flight reply to finish.
    pub async fn session(&self) -> Session {
        self.session.lock().await.clone()
    }

    /// Resolve organization and conversation identifiers if still unset.
    pub async fn resolve(&self) -> Result<(), ClaudeWebError> {
        let mut session = self.session.lock().await;
        self.resolve_session(&mut session).await
    }

    /// Post `prompt` and stream the generated reply.
    ///
    /// Setup and retry failures are returned directly. Once the stream has
    /// started, failures arrive as one terminal [`PartialResponse::Error`].
    ///
    /// The session stays locked until the stream task ends. A receiver that
    /// is kept alive but stops reading leaves the task parked on a full
    /// channel, where cancellation is not observed, so `session()`,
    /// `teardown()` and further replies wait until it is drained or dropped.
    pub async fn reply(
        &self,
        prompt: &str,
        attachments: &[Attachment],
        cancellation: Option<CancellationSignal>,
    ) -> Result<PartialResponseReceiver, ClaudeWebError> {
        let mut session = Arc::clone(&self.session).lock_owned().await;
        self.resolve_session(&mut session).await?;

        let organization_id = session
            .organization_id
            .clone()
            .ok_or(SessionError::OrganizationUnresolved)?;
        let conversation_id = session
            .conversation_id
            .clone()
            .ok_or(SessionError::ConversationUnresolved)?;

        if let Some(model) = self.models.get(&organization_id) {
            session.model = model;
        }
        self.models.put(&organization_id, &session.model);

        let response = self
            .post_with_fallback(
                &mut session,
                &organization_id,
                &conversation_id,
                prompt,
                attachments,
            )
            .await?;

        if response.status != 200 {
            let status = response.status;
            let body = match response.bytes().await {
                Ok(body) => String::from_utf8_lossy(&body).into_owned(),
                Err(error) => {
                    debug!(status, %error, "failed to read unexpected-status body");
                    format!("unreadable body: {error}")
                }
            };
            return Err(ClaudeWebError::UnexpectedStatus { status, body });
        }

        let (sender, receiver) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        tokio::spawn(drain_stream(response.body, sender, cancellation, session));
        Ok(receiver)
    }

    /// Best-effort deletion of the remote conversation.
    ///
    /// Also sweeps stale entries from the model cache. Does nothing when the
    /// conversation was never resolved.
    pub async fn teardown(&self) {
        let session = self.session.lock().await;
        let (Some(organization_id), Some(conversation_id)) =
            (session.organization_id(), session.conversation_id())
        else {
            return;
        };

        let evicted = self.models.evict_stale(Instant::now());
        if evicted > 0 {
            debug!(evicted, "evicted stale memoized models");
        }

        let route = conversation_route(organization_id, conversation_id);
        match self
            .send(
                HttpMethod::Delete,
                &route,
                HeaderProfile::Standard,
                None,
                DELETE_TIMEOUT,
            )
            .await
        {
            Ok(_) => debug!(%conversation_id, "deleted conversation"),
            Err(error) => debug!(%conversation_id, %error, "conversation delete failed"),
        }
    }

    async fn resolve_session(&self, session: &mut Session) -> Result<(), ClaudeWebError> {
        if session.organization_id.is_none() {
            let body = self
                .send(
                    HttpMethod::Get,
                    ORGANIZATIONS_ROUTE,
                    HeaderProfile::Standard,
                    None,
                    ORGANIZATION_TIMEOUT,
                )
                .await?
                .bytes()
                .await?;
            let organization_id =
                first_organization_id(&body)?.ok_or(SessionError::OrganizationUnresolved)?;
            debug!(%organization_id, "resolved organization");
            session.organization_id = Some(organization_id);
        }

        if session.conversation_id.is_none() {
            let organization_id = session
                .organization_id
                .as_deref()
                .ok_or(SessionError::OrganizationUnresolved)?;
            let request = serde_json::to_value(CreateConversationRequest::generated())?;
            let body = self
                .send(
                    HttpMethod::Post,
                    &conversations_route(organization_id),
                    HeaderProfile::Standard,
                    Some(request),
                    CONVERSATION_TIMEOUT,
                )
                .await?
                .bytes()
                .await?;
            let conversation_id =
                created_conversation_id(&body)?.ok_or(SessionError::ConversationUnresolved)?;
            debug!(%conversation_id, "created conversation");
            session.conversation_id = Some(conversation_id);
        }

        Ok(())
    }

    async fn post_with_fallback(
        &self,
        session: &mut Session,
        organization_id: &str,
        conversation_id: &str,
        prompt: &str,
        attachments: &[Attachment],
    ) -> Result<TransportResponse, ClaudeWebError> {
        let mut attempt = 1;

        loop {
            let request = AppendMessageRequest::new(
                organization_id,
                conversation_id,
                session.model.clone(),
                prompt,
                self.config.timezone.clone(),
                attachments,
            );
            let error = match self
                .send(
                    HttpMethod::Post,
                    APPEND_MESSAGE_ROUTE,
                    HeaderProfile::EventStream,
                    Some(serde_json::to_value(&request)?),
                    MESSAGE_TIMEOUT,
                )
                .await
            {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            match self.retry.decide(attempt, &error, &session.model) {
                RetryDecision::Exhausted => {
                    self.models.remove(organization_id);
                    error!(attempt, %error, "message post failed; retries exhausted");
                    return Err(error);
                }
                RetryDecision::SwitchModel { model } => {
                    if model != session.model {
                        info!(from = %session.model, to = %model, "model rejected; trying fallback model");
                        session.model = model;
                    }
                    self.models.put(organization_id, &session.model);
                }
                RetryDecision::Retry => {
                    warn!(attempt, %error, "message post failed; retrying");
                }
            }

            attempt += 1;
        }
    }

    async fn send(
        &self,
        method: HttpMethod,
        route: &str,
        profile: HeaderProfile,
        body: Option<Value>,
        timeout: Duration,
    ) -> Result<TransportResponse, ClaudeWebError> {
        let request = TransportRequest {
            method,
            url: endpoint(&self.config.base_url, route),
            headers: build_headers(&self.config, profile),
            body,
            timeout: Some(timeout),
            fingerprint: self.config.fingerprint.clone(),
        };

        let response = self.transport.execute(request).await?;
        if response.status >= 400 {
            let status = response.status;
            let body = response.bytes().await?;
            return Err(rejection_from_body(status, &body));
        }

        Ok(response)
    }
}

/// Why a stream task stopped.
#[derive(Debug)]
enum StreamEnd {
    StopSequence,
    EndOfStream,
    ReceiverClosed,
    Failed(ClaudeWebError),
}

async fn drain_stream(
    body: ByteStream,
    sender: mpsc::Sender<PartialResponse>,
    cancellation: Option<CancellationSignal>,
    session: OwnedMutexGuard<Session>,
) {
    let mut lines = LineReader::new(body);
    let end = pump_frames(&mut lines, &sender, cancellation.as_ref()).await;

    match end {
        StreamEnd::Failed(error) => {
            debug!(%error, "reply stream failed");
            let _ = sender.send(PartialResponse::Error(error)).await;
        }
        end => debug!(?end, "reply stream finished"),
    }

    drop(session);
    drop(sender);
}

async fn pump_frames<S>(
    lines: &mut LineReader<S>,
    sender: &mpsc::Sender<PartialResponse>,
    cancellation: Option<&CancellationSignal>,
) -> StreamEnd
where
    S: futures_util::Stream<Item = Result<bytes::Bytes, ClaudeWebError>> + Unpin,
{
    loop {
        if is_cancelled(cancellation) {
            return StreamEnd::Failed(ClaudeWebError::Cancelled);
        }

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return StreamEnd::EndOfStream,
            Err(error) => return StreamEnd::Failed(error),
        };

        // The read itself is never interrupted; a cancel that landed during it
        // still drops the line.
        if is_cancelled(cancellation) {
            return StreamEnd::Failed(ClaudeWebError::Cancelled);
        }

        let event = match decode_frame(&line) {
            FrameOutcome::Event(event) => event,
            FrameOutcome::Skipped => continue,
            FrameOutcome::Malformed(reason) => {
                debug!(%reason, "skipping malformed frame");
                continue;
            }
        };

        let stop = event.is_stop_sequence();
        if sender.send(event.into()).await.is_err() {
            return StreamEnd::ReceiverClosed;
        }
        if stop {
            return StreamEnd::StopSequence;
        }
    }
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}
