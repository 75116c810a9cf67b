//! Task linkage for focus sessions

use focus_store::Store;
use focus_util::TaskId;
use tracing::{debug, warn};

/// Optional task the current focus session counts towards
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskLinkage {
    linked: Option<TaskId>,
}

impl TaskLinkage {
    pub fn new(linked: Option<TaskId>) -> Self {
        Self { linked }
    }

    pub fn link(&mut self, task_id: Option<TaskId>) {
        self.linked = task_id;
    }

    pub fn linked(&self) -> Option<&TaskId> {
        self.linked.as_ref()
    }

    /// Drop the link if it points at `task_id`
    pub fn unlink_if(&mut self, task_id: &TaskId) -> bool {
        if self.linked.as_ref() == Some(task_id) {
            self.linked = None;
            return true;
        }
        false
    }

    /// Credit one completed focus session to the linked task.
    ///
    /// A task that no longer exists is skipped, as is a failing store; the
    /// rest of the completion pipeline is unaffected either way.
    pub fn credit_completion(&self, store: &dyn Store) -> Option<u64> {
        let task_id = self.linked.as_ref()?;

        match store.increment_task_sessions(task_id) {
            Ok(Some(sessions)) => {
                debug!(task_id = %task_id, sessions, "Task credited");
                Some(sessions)
            }
            Ok(None) => {
                debug!(task_id = %task_id, "Linked task missing, skipping credit");
                None
            }
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "Failed to credit linked task");
                None
            }
        }
    }
}
