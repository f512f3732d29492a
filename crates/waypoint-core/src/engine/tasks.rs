//! AI work units.
//!
//! A task is a chain of steps. Each step asks the assistant for commands and
//! applies them as an AI-originated batch under the trip's single-flight
//! lock. If the batch requested web searches, the searches run and a
//! follow-up step is spawned as a separate unit of work, so anything queued
//! on the trip in between runs first. Cancellation is checked before each
//! step and before its batch is applied; committed batches stay committed.

use std::sync::Arc;

use log::{error, info, warn};

use super::{Engine, Origin};
use crate::{
    assistant::{Assistant, AssistantRequest, SearchResult},
    command::validate_identifier,
    error::{EngineError, Result},
    models::Effect,
    serializer::{TaskStatus, TaskToken},
};

/// State carried from one step of a task to the next.
struct AiStep {
    token: TaskToken,
    trip: String,
    prompt: String,
    step: usize,
    search_results: Vec<SearchResult>,
    executed: usize,
    messages: Vec<String>,
}

impl Engine {
    /// Queues an AI task for `trip` and returns its token immediately.
    pub async fn submit_ai_task(&self, trip: &str, prompt: &str) -> Result<TaskToken> {
        self.assistant()?;
        validate_identifier("trip", trip)?;
        let owned = trip.to_string();
        if !self.blocking(move |journal| journal.exists(&owned)).await? {
            return Err(super::not_found(trip));
        }

        let token = self.inner.tasks.register(trip);
        info!("queued AI task {token} for trip '{trip}'");
        self.spawn_step(AiStep {
            token,
            trip: trip.to_string(),
            prompt: prompt.to_string(),
            step: 0,
            search_results: Vec::new(),
            executed: 0,
            messages: Vec::new(),
        });
        Ok(token)
    }

    /// Current status of a task.
    pub fn task_status(&self, token: TaskToken) -> Result<TaskStatus> {
        self.inner
            .tasks
            .status(token)
            .ok_or(EngineError::TaskNotFound { token: token.0 })
    }

    /// Requests cancellation. Returns `false` if the task already finished.
    pub fn cancel_task(&self, token: TaskToken) -> Result<bool> {
        let requested = self
            .inner
            .tasks
            .cancel(token)
            .ok_or(EngineError::TaskNotFound { token: token.0 })?;
        if requested {
            info!("cancellation requested for AI task {token}");
        }
        Ok(requested)
    }

    /// Waits for a task to finish.
    pub async fn wait_for_task(&self, token: TaskToken) -> Result<TaskStatus> {
        self.inner
            .tasks
            .wait(token)
            .await
            .ok_or(EngineError::TaskNotFound { token: token.0 })
    }

    fn assistant(&self) -> Result<Arc<dyn Assistant>> {
        self.inner
            .assistant
            .clone()
            .ok_or_else(|| EngineError::Configuration {
                message: "no assistant configured".to_string(),
            })
    }

    fn spawn_step(&self, step: AiStep) {
        let engine = self.clone();
        tokio::spawn(async move {
            let token = step.token;
            match engine.run_step(step).await {
                Ok(Some(next)) => engine.spawn_step(next),
                Ok(None) => {}
                Err(e) => {
                    error!("AI task {token} failed: {e}");
                    engine.inner.tasks.set(
                        token,
                        TaskStatus::Failed {
                            error: e.to_string(),
                        },
                    );
                }
            }
        });
    }

    /// Runs one step; returns the follow-up step, if any.
    async fn run_step(&self, mut step: AiStep) -> Result<Option<AiStep>> {
        let tasks = &self.inner.tasks;
        let token = step.token;
        if self.stop_if_cancelled(token) {
            return Ok(None);
        }
        tasks.set(token, TaskStatus::Running { step: step.step });

        let assistant = self.assistant()?;
        let request = AssistantRequest {
            trip: step.trip.clone(),
            step: step.step,
            prompt: step.prompt.clone(),
            itinerary: self.current_model(&step.trip).await?.to_string(),
            search_results: std::mem::take(&mut step.search_results),
            model: self.ai_model(&step.trip).await?,
        };
        let reply = assistant.respond(&request).await?;
        if self.stop_if_cancelled(token) {
            return Ok(None);
        }

        let outcome = self
            .apply_batch_as(&step.trip, &reply, Origin::Assistant)
            .await?;
        step.executed += outcome.executed;
        step.messages.extend(outcome.messages);

        let queries: Vec<String> = outcome
            .effects
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::WebSearch { query } => Some(query),
                _ => None,
            })
            .collect();
        if !queries.is_empty() && step.step + 1 >= self.inner.max_ai_steps {
            warn!("AI task {token} reached its step limit; ignoring follow-up searches");
            step.messages
                .push(format!("Step limit reached; {} search(es) not run.", queries.len()));
        }
        if queries.is_empty() || step.step + 1 >= self.inner.max_ai_steps {
            info!("AI task {token} completed after {} step(s)", step.step + 1);
            tasks.set(
                token,
                TaskStatus::Completed {
                    executed: step.executed,
                    summary: step.messages.join("\n"),
                },
            );
            return Ok(None);
        }

        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            if self.stop_if_cancelled(token) {
                return Ok(None);
            }
            let text = assistant.search(&query).await?;
            results.push(SearchResult { query, text });
        }
        tasks.set(token, TaskStatus::Queued);
        Ok(Some(AiStep {
            step: step.step + 1,
            search_results: results,
            ..step
        }))
    }

    fn stop_if_cancelled(&self, token: TaskToken) -> bool {
        if !self.inner.tasks.is_cancelled(token) {
            return false;
        }
        info!("AI task {token} cancelled");
        self.inner.tasks.set(token, TaskStatus::Cancelled);
        true
    }
}
