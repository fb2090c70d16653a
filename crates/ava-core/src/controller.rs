//! The widget's conversation state machine.
//!
//! A submission is split in two halves so a UI event loop never blocks on the
//! network: [`WidgetController::begin_submit`] applies the optimistic update
//! and hands back a [`PendingExchange`] that can be driven on another task,
//! and [`WidgetController::complete`] folds its outcome back into the
//! transcript. [`WidgetController::submit`] runs both halves inline.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::client::{ChatBackend, ChatReply, ChatRequest, HttpChatClient};
use crate::config::WidgetConfig;
use crate::error::{ChatError, FailureKind};
use crate::state::{ChatMessage, Transcript};

/// State of the most recent exchange with the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Exchange {
    #[default]
    Idle,
    Pending,
    Succeeded(ChatReply),
    Failed(FailureKind),
}

/// One outstanding request, detached from the controller.
pub struct PendingExchange {
    request: ChatRequest,
    backend: Arc<dyn ChatBackend>,
    timeout: Duration,
}

impl PendingExchange {
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    /// Send the request, turning an elapsed timeout into [`ChatError::Timeout`].
    pub async fn run(self) -> Result<ChatReply, ChatError> {
        debug!(
            history_len = self.request.history.len(),
            "sending chat request"
        );
        match tokio::time::timeout(self.timeout, self.backend.send(&self.request)).await {
            Ok(result) => result,
            Err(_) => Err(ChatError::Timeout(self.timeout)),
        }
    }
}

pub struct WidgetController {
    config: WidgetConfig,
    backend: Arc<dyn ChatBackend>,
    transcript: Transcript,
    draft: String,
    is_open: bool,
    exchange: Exchange,
    scroll_requested: bool,
}

impl WidgetController {
    pub fn new(config: WidgetConfig, backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            config,
            backend,
            transcript: Transcript::new(),
            draft: String::new(),
            is_open: false,
            exchange: Exchange::Idle,
            scroll_requested: true,
        }
    }

    /// Controller backed by the HTTP client for `config.backend_url`.
    pub fn connect(config: WidgetConfig) -> Result<Self, ChatError> {
        let client = HttpChatClient::new(&config.backend_url, config.request_timeout)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_loading(&self) -> bool {
        self.exchange == Exchange::Pending
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// Whether a submission would currently be accepted.
    pub fn can_submit(&self) -> bool {
        !self.is_loading() && !self.draft.trim().is_empty()
    }

    pub fn toggle(&mut self) {
        self.is_open = !self.is_open;
        if self.is_open {
            self.scroll_requested = true;
        }
    }

    /// Returns true once after each change that should bring the newest
    /// message into view.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }

    /// Apply the optimistic half of a submission.
    ///
    /// Returns `None` without touching any state when the draft is blank or
    /// a request is already outstanding.
    pub fn begin_submit(&mut self) -> Option<PendingExchange> {
        if self.is_loading() {
            debug!("submission ignored, request already outstanding");
            return None;
        }

        let message = self.draft.trim().to_string();
        if message.is_empty() {
            return None;
        }

        self.push(ChatMessage::user(message.clone()));
        self.draft.clear();
        self.exchange = Exchange::Pending;

        let history = self.transcript.to_history();
        if history.len() > self.config.history_warn_threshold {
            warn!(
                history_len = history.len(),
                threshold = self.config.history_warn_threshold,
                "sending long conversation history, payload is not truncated"
            );
        }

        Some(PendingExchange {
            request: ChatRequest { message, history },
            backend: Arc::clone(&self.backend),
            timeout: self.config.request_timeout,
        })
    }

    /// Fold the outcome of the outstanding request into the transcript.
    pub fn complete(&mut self, outcome: Result<ChatReply, ChatError>) {
        if !self.is_loading() {
            warn!("dropping chat outcome with no request outstanding");
            return;
        }

        match outcome {
            Ok(reply) => {
                self.push(ChatMessage::model(reply.response.clone()));
                if reply.wants_contact_support() {
                    self.push(ChatMessage::contact_support());
                }
                self.exchange = Exchange::Succeeded(reply);
            }
            Err(err) => {
                warn!(error = %err, "chat exchange failed");
                self.push(ChatMessage::apology());
                self.exchange = Exchange::Failed(err.kind());
            }
        }
    }

    /// Run a whole submission inline. Returns whether a request was issued.
    pub async fn submit(&mut self) -> bool {
        match self.begin_submit() {
            Some(pending) => {
                let outcome = pending.run().await;
                self.complete(outcome);
                true
            }
            None => false,
        }
    }

    fn push(&mut self, message: ChatMessage) {
        self.transcript.push(message);
        self.scroll_requested = true;
    }
}
