//! The AI collaborator.
//!
//! An [`Assistant`] turns a prompt plus the current itinerary into command
//! text, which the engine applies as an AI-originated batch. The engine never
//! talks to a completion provider itself.
//!
//! [`ProcessAssistant`] bridges to any external program: each call runs the
//! program once, writes one JSON request to its stdin and reads the reply
//! from its stdout.

use std::{future::Future, pin::Pin, process::Stdio, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{io::AsyncWriteExt, process::Command};

/// Boxed future returned by [`Assistant`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors raised by an assistant. They fail the AI task, never the timeline.
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("assistant timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("failed to run assistant '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("assistant exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },
    #[error("assistant returned an invalid response: {message}")]
    InvalidResponse { message: String },
    #[error("assistant does not support {what}")]
    Unsupported { what: String },
}

/// A search the assistant asked for, with its results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: String,
    pub text: String,
}

/// Everything an assistant sees for one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantRequest {
    pub trip: String,
    /// 0 for the user's prompt; follow-up steps count up
    pub step: usize,
    pub prompt: String,
    /// Current itinerary rendered as markdown
    pub itinerary: String,
    /// Results of searches requested by the previous step
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_results: Vec<SearchResult>,
    /// Model selected with `/model`, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Source of AI-generated command text.
pub trait Assistant: Send + Sync {
    /// Returns command lines answering `request`.
    fn respond<'a>(
        &'a self,
        request: &'a AssistantRequest,
    ) -> BoxFuture<'a, Result<String, AssistantError>>;

    /// Runs a web search on the assistant's behalf.
    fn search<'a>(&'a self, _query: &'a str) -> BoxFuture<'a, Result<String, AssistantError>> {
        Box::pin(async {
            Err(AssistantError::Unsupported {
                what: "web search".to_string(),
            })
        })
    }
}

impl<T: Assistant + ?Sized> Assistant for std::sync::Arc<T> {
    fn respond<'a>(
        &'a self,
        request: &'a AssistantRequest,
    ) -> BoxFuture<'a, Result<String, AssistantError>> {
        (**self).respond(request)
    }

    fn search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<String, AssistantError>> {
        (**self).search(query)
    }
}

/// JSON written to the assistant program's stdin.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Call<'a> {
    Respond(&'a AssistantRequest),
    Search { query: &'a str },
}

/// Runs an external program per call.
#[derive(Debug, Clone)]
pub struct ProcessAssistant {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessAssistant {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Parses a shell-like command line (whitespace separated, no quoting).
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut words = command_line.split_whitespace().map(String::from);
        let program = words.next()?;
        Some(Self::new(program).with_args(words))
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(args);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn call(&self, call: Call<'_>) -> Result<String, AssistantError> {
        let input = serde_json::to_vec(&call).map_err(|e| AssistantError::InvalidResponse {
            message: e.to_string(),
        })?;
        let run = async {
            let mut child = Command::new(&self.program)
                .args(&self.args)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|source| self.spawn_error(source))?;
            if let Some(mut stdin) = child.stdin.take() {
                // a program that ignores its input may exit before reading it
                match stdin.write_all(&input).await {
                    Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                        return Err(self.spawn_error(e));
                    }
                    _ => {}
                }
            }
            child
                .wait_with_output()
                .await
                .map_err(|source| self.spawn_error(source))
        };
        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| AssistantError::Timeout {
                seconds: self.timeout.as_secs(),
            })??;

        if !output.status.success() {
            return Err(AssistantError::Exit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        String::from_utf8(output.stdout).map_err(|e| AssistantError::InvalidResponse {
            message: e.to_string(),
        })
    }

    fn spawn_error(&self, source: std::io::Error) -> AssistantError {
        AssistantError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

impl Assistant for ProcessAssistant {
    fn respond<'a>(
        &'a self,
        request: &'a AssistantRequest,
    ) -> BoxFuture<'a, Result<String, AssistantError>> {
        Box::pin(self.call(Call::Respond(request)))
    }

    fn search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<String, AssistantError>> {
        Box::pin(self.call(Call::Search { query }))
    }
}
