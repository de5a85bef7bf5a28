//! Stateful adapter that persists a stream of agent-runtime events.

use std::fmt;
use std::sync::Arc;

use bon::Builder;
use serde_json::Value;
use tracing::{debug, warn};

use super::event::{classify, session_id_of, EventKind};
use super::normalize::{normalize_event, NormalizedMessage};
use crate::client::{CreateSessionRequest, SessionApi, StoredMessage};
use crate::error::{AcontextError, Result};
use crate::types::{MessageBlob, MessageFormat};

/// Receives persistence failures together with the blob that was abandoned.
pub type ErrorCallback = Arc<dyn Fn(&AcontextError, &MessageBlob) + Send + Sync>;

/// Construction options for [`ConversationAdapter`].
#[derive(Clone, Default, Builder)]
pub struct AdapterOptions {
    /// Session id to use instead of waiting for one to be discovered.
    #[builder(into)]
    pub session_id: Option<String>,
    /// User the session is created for.
    #[builder(into)]
    pub user: Option<String>,
    /// Persist thinking blocks.
    #[builder(default)]
    pub include_thinking: bool,
    /// Replaces the default warning log on persistence failure.
    pub on_error: Option<ErrorCallback>,
}

impl fmt::Debug for AdapterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterOptions")
            .field("session_id", &self.session_id)
            .field("user", &self.user)
            .field("include_thinking", &self.include_thinking)
            .field("on_error", &self.on_error.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

/// How far the adapter has got with its backing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No id known yet.
    Unknown,
    /// An id was supplied or observed; the backend has not confirmed it.
    Discovered,
    /// The backend created the session or reported that it already exists.
    Created,
    /// Creation was attempted and failed. It is not attempted again.
    Failed,
}

/// What [`ConversationAdapter::process`] did with one event.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// Control or unrecognized event.
    Ignored,
    /// Replayed user turn.
    Discarded,
    /// User or assistant event with nothing left after normalization.
    Dropped,
    Stored(StoredMessage),
    /// Session creation or storage failed and the message was abandoned.
    Failed,
}

/// Turns raw runtime events into stored session messages.
///
/// The first valid session id the adapter sees, from its options or from any
/// event, is kept for the adapter's lifetime. The backing session is created
/// lazily before the first store, and creation is attempted at most once. A
/// conflict on creation means it already exists and counts as success.
pub struct ConversationAdapter {
    client: Arc<dyn SessionApi>,
    options: AdapterOptions,
    session_id: Option<String>,
    state: SessionState,
}

impl ConversationAdapter {
    pub fn new(client: Arc<dyn SessionApi>, options: AdapterOptions) -> Self {
        let session_id = options.session_id.clone().filter(|id| !id.is_empty());
        let state = if session_id.is_some() {
            SessionState::Discovered
        } else {
            SessionState::Unknown
        };
        Self {
            client,
            options,
            session_id,
            state,
        }
    }

    /// Current session id, if one has been supplied, observed or created.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    /// Process one event.
    ///
    /// Persistence failures are reported through the error callback (or a
    /// warning) and surface as [`ProcessOutcome::Failed`]. An `Err` is only
    /// returned for payloads that are not JSON objects.
    pub async fn process(&mut self, event: &Value) -> Result<ProcessOutcome> {
        if !event.is_object() {
            return Err(AcontextError::validation(format!(
                "event must be a JSON object, got {}",
                json_kind(event)
            )));
        }

        let kind = classify(event);
        if kind == EventKind::Replay {
            debug!("discarding replayed user event");
            return Ok(ProcessOutcome::Discarded);
        }

        self.observe_session_id(event);

        match kind {
            EventKind::User | EventKind::Assistant => {}
            _ => return Ok(ProcessOutcome::Ignored),
        }

        let Some(message) = normalize_event(event, self.options.include_thinking) else {
            debug!(kind = ?kind, "dropping event with no persistable content");
            return Ok(ProcessOutcome::Dropped);
        };

        Ok(self.persist(message).await)
    }

    fn observe_session_id(&mut self, event: &Value) {
        if self.session_id.is_some() {
            return;
        }
        if let Some(id) = session_id_of(event) {
            debug!(session_id = %id, "discovered session id");
            self.session_id = Some(id.to_string());
            if self.state == SessionState::Unknown {
                self.state = SessionState::Discovered;
            }
        }
    }

    async fn persist(&mut self, message: NormalizedMessage) -> ProcessOutcome {
        let session_id = match self.ensure_session().await {
            Ok(id) => id,
            Err(err) => return self.report(err, &message.blob),
        };

        match self
            .client
            .store_message(
                &session_id,
                &message.blob,
                MessageFormat::Anthropic,
                message.meta.as_ref(),
            )
            .await
        {
            Ok(stored) => {
                debug!(
                    session_id = %session_id,
                    message_id = %stored.id,
                    role = %message.blob.role,
                    "stored message"
                );
                ProcessOutcome::Stored(stored)
            }
            Err(err) => self.report(err, &message.blob),
        }
    }

    /// Create the backing session once and return its id.
    ///
    /// Whatever the outcome, creation is never requested twice. After a
    /// failed attempt a known id is used as is.
    async fn ensure_session(&mut self) -> Result<String> {
        match (self.state, &self.session_id) {
            (SessionState::Created | SessionState::Failed, Some(id)) => return Ok(id.clone()),
            (SessionState::Failed, None) => {
                return Err(AcontextError::InvalidState(
                    "session creation already failed and no session id is known".into(),
                ))
            }
            _ => {}
        }

        let request = CreateSessionRequest {
            use_uuid: self.session_id.clone(),
            user: self.options.user.clone(),
        };

        match self.client.create_session(&request).await {
            Ok(session) => {
                let id = match &self.session_id {
                    Some(known) => known.clone(),
                    None => session.id,
                };
                debug!(session_id = %id, "created session");
                self.session_id = Some(id.clone());
                self.state = SessionState::Created;
                Ok(id)
            }
            Err(err) if err.is_conflict() => match &self.session_id {
                Some(known) => {
                    debug!(session_id = %known, "session already exists");
                    self.state = SessionState::Created;
                    Ok(known.clone())
                }
                None => {
                    self.state = SessionState::Failed;
                    Err(err)
                }
            },
            Err(err) => {
                self.state = SessionState::Failed;
                Err(err)
            }
        }
    }

    fn report(&self, err: AcontextError, blob: &MessageBlob) -> ProcessOutcome {
        match &self.options.on_error {
            Some(callback) => callback(&err, blob),
            None => warn!(
                error = %err,
                category = ?err.category(),
                role = %blob.role,
                "failed to persist message"
            ),
        }
        ProcessOutcome::Failed
    }
}

impl fmt::Debug for ConversationAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationAdapter")
            .field("session_id", &self.session_id)
            .field("state", &self.state)
            .field("options", &self.options)
            .finish()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
