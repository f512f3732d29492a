//! Single-flight execution per trip, and bookkeeping for AI work units.
//!
//! [`TaskSerializer`] hands out one async lock per key. Whoever holds the
//! guard owns the per-key state; waiters are served in FIFO order, so a
//! human batch queued behind an AI step runs before that step's follow-up.
//!
//! [`TaskRegistry`] tracks AI work units by [`TaskToken`]. Callers poll
//! [`TaskRegistry::status`] or await [`TaskRegistry::wait`].

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex as AsyncMutex, OwnedMutexGuard};

/// One async lock per key, each guarding a `S`.
pub struct TaskSerializer<S> {
    slots: Mutex<HashMap<String, Arc<AsyncMutex<S>>>>,
}

impl<S: Default> TaskSerializer<S> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Waits for exclusive access to the state of `key`.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<S> {
        let slot = {
            let mut slots = lock(&self.slots);
            Arc::clone(slots.entry(key.to_string()).or_default())
        };
        slot.lock_owned().await
    }

    /// Releases `guard`; with `forget`, also drops the slot of `key` unless
    /// another caller holds or awaits it.
    pub fn release(&self, key: &str, guard: OwnedMutexGuard<S>, forget: bool) {
        if !forget {
            return;
        }
        let mut slots = lock(&self.slots);
        // the map and `guard` hold the only references when nobody waits
        let idle = slots.get(key).is_some_and(|slot| {
            Arc::ptr_eq(slot, OwnedMutexGuard::mutex(&guard)) && Arc::strong_count(slot) == 2
        });
        if idle {
            slots.remove(key);
        }
        drop(guard);
    }

    /// Keys that have been acquired at least once.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.slots).keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Default> Default for TaskSerializer<S> {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Identifies an AI work unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskToken(pub u64);

impl fmt::Display for TaskToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of an AI work unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    /// Working on chained step `step` (0-based)
    Running { step: usize },
    Completed { executed: usize, summary: String },
    Failed { error: String },
    Cancelled,
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed { .. } | TaskStatus::Failed { .. } | TaskStatus::Cancelled
        )
    }
}

struct TaskRecord {
    trip: String,
    status: watch::Sender<TaskStatus>,
    cancel: AtomicBool,
}

/// Finished tasks kept for status queries before the oldest are dropped.
pub const DEFAULT_FINISHED_TASKS: usize = 64;

/// Status and cancellation flags of the AI work units in this process.
///
/// Running tasks are always tracked; only the most recent finished ones are.
pub struct TaskRegistry {
    next: AtomicU64,
    tasks: Mutex<HashMap<TaskToken, Arc<TaskRecord>>>,
    retained: usize,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_FINISHED_TASKS)
    }

    /// Keeps at most `retained` finished tasks.
    pub fn with_retention(retained: usize) -> Self {
        Self {
            next: AtomicU64::new(0),
            tasks: Mutex::new(HashMap::new()),
            retained,
        }
    }

    /// Registers a queued task for `trip`, pruning old finished tasks.
    pub fn register(&self, trip: &str) -> TaskToken {
        let token = TaskToken(self.next.fetch_add(1, Ordering::Relaxed) + 1);
        let (status, _) = watch::channel(TaskStatus::Queued);
        let record = TaskRecord {
            trip: trip.to_string(),
            status,
            cancel: AtomicBool::new(false),
        };
        let mut tasks = lock(&self.tasks);
        let mut finished: Vec<TaskToken> = tasks
            .iter()
            .filter(|(_, record)| record.status.borrow().is_finished())
            .map(|(token, _)| *token)
            .collect();
        if finished.len() > self.retained {
            finished.sort_unstable();
            for stale in &finished[..finished.len() - self.retained] {
                tasks.remove(stale);
            }
        }
        tasks.insert(token, Arc::new(record));
        token
    }

    /// Number of tracked tasks, finished ones included.
    pub fn tracked(&self) -> usize {
        lock(&self.tasks).len()
    }

    fn record(&self, token: TaskToken) -> Option<Arc<TaskRecord>> {
        lock(&self.tasks).get(&token).cloned()
    }

    pub fn status(&self, token: TaskToken) -> Option<TaskStatus> {
        self.record(token).map(|record| record.status.borrow().clone())
    }

    /// Trip a task works on.
    pub fn trip(&self, token: TaskToken) -> Option<String> {
        self.record(token).map(|record| record.trip.clone())
    }

    /// Records a new status. Finished tasks keep their final status.
    pub fn set(&self, token: TaskToken, status: TaskStatus) {
        if let Some(record) = self.record(token) {
            record.status.send_if_modified(|current| {
                if current.is_finished() {
                    return false;
                }
                *current = status;
                true
            });
        }
    }

    /// Requests cooperative cancellation. Returns `None` for unknown tokens
    /// and `Some(false)` if the task had already finished.
    pub fn cancel(&self, token: TaskToken) -> Option<bool> {
        let record = self.record(token)?;
        if record.status.borrow().is_finished() {
            return Some(false);
        }
        record.cancel.store(true, Ordering::SeqCst);
        Some(true)
    }

    pub fn is_cancelled(&self, token: TaskToken) -> bool {
        self.record(token)
            .is_some_and(|record| record.cancel.load(Ordering::SeqCst))
    }

    /// Waits until the task finishes and returns its final status.
    pub async fn wait(&self, token: TaskToken) -> Option<TaskStatus> {
        let mut receiver = self.record(token)?.status.subscribe();
        let status = receiver
            .wait_for(TaskStatus::is_finished)
            .await
            .map(|status| status.clone())
            .ok();
        status
    }
}
