//! Task lifecycle
//!
//! Every orchestrated call runs as a tokio task that moves through
//! `Suspended -> Running -> Completed`, or ends `Cancelled`. The completion
//! is delivered at most once, and exactly once unless the task is cancelled.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::response::StatusValidator;

/// The lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Created but not started
    Suspended,
    /// Waiting on the transport or finalizing
    Running,
    /// The completion has been delivered
    Completed,
    /// Aborted before completion
    Cancelled,
}

impl TaskState {
    /// Check if the task reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Cancelled)
    }
}

/// Per-call options for orchestrated tasks
#[derive(Debug, Clone)]
pub struct TaskOptions {
    /// Start the task as soon as it is created
    pub start_immediately: bool,
    /// Decides which status codes are acceptable
    pub validator: StatusValidator,
}

impl TaskOptions {
    /// Create default options: started immediately, 4xx rejected
    pub fn new() -> Self {
        Self::default()
    }

    /// Create options for a task that waits for [`TaskHandle::resume`]
    pub fn suspended() -> Self {
        Self::new().start_immediately(false)
    }

    /// Set whether the task starts immediately
    pub fn start_immediately(mut self, start_immediately: bool) -> Self {
        self.start_immediately = start_immediately;
        self
    }

    /// Set the status validator
    pub fn validator(mut self, validator: StatusValidator) -> Self {
        self.validator = validator;
        self
    }
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            start_immediately: true,
            validator: StatusValidator::default(),
        }
    }
}

/// Handle to a spawned task
///
/// Dropping the handle of a running task detaches it; dropping the handle of
/// a suspended task cancels it.
#[derive(Debug)]
pub struct TaskHandle {
    state: Arc<Mutex<TaskState>>,
    resume: Mutex<Option<oneshot::Sender<()>>>,
    join: JoinHandle<()>,
}

impl TaskHandle {
    /// Spawn `work` on the ambient tokio runtime and hand its output to
    /// `completion`
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub(crate) fn spawn<T, W, C>(work: W, completion: C, start_immediately: bool) -> Self
    where
        T: Send + 'static,
        W: Future<Output = T> + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        let state = Arc::new(Mutex::new(TaskState::Suspended));
        let (resume_tx, resume_rx) = oneshot::channel();

        let task_state = Arc::clone(&state);
        let join = tokio::spawn(async move {
            if resume_rx.await.is_err() {
                // Handle dropped or cancelled before the task started
                transition(&task_state, TaskState::Cancelled);
                return;
            }

            let output = work.await;
            if transition(&task_state, TaskState::Completed) {
                completion(output);
            }
        });

        let handle = Self {
            state,
            resume: Mutex::new(Some(resume_tx)),
            join,
        };
        if start_immediately {
            handle.resume();
        }
        handle
    }

    /// Start a suspended task; does nothing otherwise
    pub fn resume(&self) {
        let sender = self
            .resume
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(sender) = sender {
            if transition(&self.state, TaskState::Running) {
                tracing::trace!("task resumed");
                let _ = sender.send(());
            }
        }
    }

    /// Abort the task; the completion will not be called
    pub fn cancel(&self) {
        if transition(&self.state, TaskState::Cancelled) {
            tracing::debug!("task cancelled");
        }
        self.resume
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.join.abort();
    }

    /// Get the current state
    pub fn state(&self) -> TaskState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check if the task reached a terminal state
    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Wait until the task terminates and return its final state
    ///
    /// A suspended task never terminates on its own; resume or cancel it
    /// first.
    pub async fn join(self) -> TaskState {
        let TaskHandle { state, resume, join } = self;
        // Keep the resume channel open so a suspended task is not cancelled
        let _resume = resume;
        if join.await.is_err() {
            transition(&state, TaskState::Cancelled);
        }
        let final_state = *state.lock().unwrap_or_else(PoisonError::into_inner);
        final_state
    }
}

/// Move to `next` if the transition is allowed; returns whether it happened
fn transition(state: &Mutex<TaskState>, next: TaskState) -> bool {
    let mut current = state.lock().unwrap_or_else(PoisonError::into_inner);
    let allowed = match (*current, next) {
        (TaskState::Suspended, TaskState::Running) => true,
        (TaskState::Running, TaskState::Completed) => true,
        (TaskState::Suspended | TaskState::Running, TaskState::Cancelled) => true,
        _ => false,
    };
    if allowed {
        *current = next;
    }
    allowed
}
