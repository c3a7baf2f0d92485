//! Request bridge between a host and the archive pipeline.
//!
//! The host submits a JSON payload together with a [`ResultSink`]. Each
//! submission runs on its own tokio task and settles the sink exactly once,
//! either with the base64 encoded archive or with an error message. Progress
//! is observable through the [`RequestHandle`] returned by
//! [`RequestBridge::submit`].
//!
//! ```text
//! Created -> Parsing -> ParseFailed
//!                    -> Running -> Succeeded
//!                               -> Failed
//! ```

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, info, info_span, warn};

use crate::archive::Assembler;
use crate::config::Config;
use crate::error::{ArchiveError, Result};
use crate::io::InputSource;
use crate::model::Request;
use crate::pdf::PdfEngine;

/// Lifecycle of one submitted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeState {
    /// Submitted, task not started yet.
    Created,
    /// Decoding the payload.
    Parsing,
    /// The payload was not a valid request.
    ParseFailed {
        /// Message handed to the sink.
        message: String,
    },
    /// Assembling the archive.
    Running,
    /// The sink received the archive.
    Succeeded {
        /// Archive size before transport encoding.
        archive_bytes: usize,
    },
    /// Assembly failed or timed out.
    Failed {
        /// Message handed to the sink.
        message: String,
    },
}

impl BridgeState {
    /// Whether the request has settled.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ParseFailed { .. } | Self::Succeeded { .. } | Self::Failed { .. }
        )
    }
}

/// Outbound result payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveResult {
    /// Base64 encoded ZIP archive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_archive: Option<String>,

    /// Error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ArchiveResult {
    /// A successful result.
    pub fn success(archive: String) -> Self {
        Self {
            result_archive: Some(archive),
            error: None,
        }
    }

    /// A failed result.
    pub fn failure(message: String) -> Self {
        Self {
            result_archive: None,
            error: Some(message),
        }
    }

    /// Convert into the encoded archive or the error message.
    pub fn into_result(self) -> std::result::Result<String, String> {
        match (self.result_archive, self.error) {
            (_, Some(message)) => Err(message),
            (Some(archive), None) => Ok(archive),
            (None, None) => Err("request settled without a result".to_string()),
        }
    }
}

/// Receiver of a request's outcome. Settled exactly once.
pub trait ResultSink: Send + 'static {
    /// Deliver the base64 encoded archive.
    fn resolve(self, archive: String);

    /// Deliver a failure message.
    fn reject(self, message: String);
}

/// [`ResultSink`] that forwards an [`ArchiveResult`] over a oneshot channel.
#[derive(Debug)]
pub struct ChannelSink {
    tx: oneshot::Sender<ArchiveResult>,
}

impl ChannelSink {
    /// Create a sink and the receiver for its result.
    pub fn new() -> (Self, oneshot::Receiver<ArchiveResult>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    fn deliver(self, result: ArchiveResult) {
        if self.tx.send(result).is_err() {
            warn!("result receiver dropped before the request settled");
        }
    }
}

impl ResultSink for ChannelSink {
    fn resolve(self, archive: String) {
        self.deliver(ArchiveResult::success(archive));
    }

    fn reject(self, message: String) {
        self.deliver(ArchiveResult::failure(message));
    }
}

/// Handle to a submitted request.
#[derive(Debug)]
pub struct RequestHandle {
    state: watch::Receiver<BridgeState>,
    task: JoinHandle<BridgeState>,
}

impl RequestHandle {
    /// Current state.
    pub fn state(&self) -> BridgeState {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<BridgeState> {
        self.state.clone()
    }

    /// Wait for the request to settle and return its terminal state.
    pub async fn wait(self) -> BridgeState {
        self.task.await.unwrap_or_else(|e| BridgeState::Failed {
            message: format!("request task failed: {e}"),
        })
    }
}

/// Accepts archive requests and runs each on its own task.
///
/// The engine and input source are shared read-only between requests.
/// Nothing else is shared.
pub struct RequestBridge<E, S> {
    engine: Arc<E>,
    source: Arc<S>,
    config: Config,
}

impl<E, S> Clone for RequestBridge<E, S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            source: Arc::clone(&self.source),
            config: self.config.clone(),
        }
    }
}

impl<E, S> RequestBridge<E, S>
where
    E: PdfEngine + 'static,
    S: InputSource + 'static,
{
    /// Create a bridge.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidConfig`] if `config` does not validate.
    pub fn new(engine: E, source: S, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine: Arc::new(engine),
            source: Arc::new(source),
            config,
        })
    }

    /// The bridge's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start processing `payload`. The outcome is delivered to `sink`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit<K>(&self, payload: String, sink: K) -> RequestHandle
    where
        K: ResultSink,
    {
        let (state_tx, state_rx) = watch::channel(BridgeState::Created);
        let bridge = self.clone();
        let span = info_span!("request", payload_bytes = payload.len());

        let task = tokio::spawn(
            async move { bridge.process(payload, sink, state_tx).await }.instrument(span),
        );

        RequestHandle {
            state: state_rx,
            task,
        }
    }

    /// Process `payload` and return the encoded archive or the error message.
    pub async fn create_archive(&self, payload: String) -> std::result::Result<String, String> {
        let (sink, rx) = ChannelSink::new();
        let handle = self.submit(payload, sink);

        match rx.await {
            Ok(result) => result.into_result(),
            Err(_) => match handle.wait().await {
                BridgeState::Failed { message } | BridgeState::ParseFailed { message } => {
                    Err(message)
                }
                state => Err(format!("request ended in state {state:?} without a result")),
            },
        }
    }

    /// Parse and assemble `payload` on the calling task.
    ///
    /// Unlike [`create_archive`](Self::create_archive) the failure keeps its
    /// [`ArchiveError`] type, so callers can map it to an exit code.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Parse`] for a malformed payload, the assembly
    /// error otherwise, or [`ArchiveError::Timeout`] if the configured
    /// timeout elapses first.
    pub async fn build_archive(&self, payload: &str) -> Result<Vec<u8>> {
        let request = Request::from_json(payload)?;
        self.run(&request).await
    }

    async fn process<K>(
        self,
        payload: String,
        sink: K,
        state: watch::Sender<BridgeState>,
    ) -> BridgeState
    where
        K: ResultSink,
    {
        state.send_replace(BridgeState::Parsing);

        let request = match Request::from_json(&payload) {
            Ok(request) => request,
            Err(err) => {
                let message = err.to_string();
                warn!(error = %message, "rejecting malformed request");
                sink.reject(message.clone());
                let settled = BridgeState::ParseFailed { message };
                state.send_replace(settled.clone());
                return settled;
            }
        };

        state.send_replace(BridgeState::Running);
        info!(
            files = request.files.len(),
            documents = request.documents.len(),
            "processing request"
        );

        let settled = match self.run(&request).await {
            Ok(archive) => {
                let archive_bytes = archive.len();
                sink.resolve(BASE64.encode(&archive));
                info!(archive_bytes, "request succeeded");
                BridgeState::Succeeded { archive_bytes }
            }
            Err(err) => {
                let message = err.to_string();
                warn!(error = %message, "request failed");
                sink.reject(message.clone());
                BridgeState::Failed { message }
            }
        };

        state.send_replace(settled.clone());
        settled
    }

    async fn run(&self, request: &Request) -> Result<Vec<u8>> {
        let timestamp = self
            .config
            .timestamp
            .unwrap_or_else(|| Local::now().naive_local());
        let assembler = Assembler::new(Arc::clone(&self.engine), self.source.as_ref(), timestamp);
        let work = assembler.assemble_zip(request, self.config.compression);

        match self.config.timeout {
            Some(after) => tokio::time::timeout(after, work)
                .await
                .unwrap_or(Err(ArchiveError::Timeout { after })),
            None => work.await,
        }
    }
}
