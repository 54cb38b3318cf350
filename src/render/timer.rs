//! Deferred single-shot tasks for the cooperative event-loop model.
//!
//! The grid never blocks: work it defers (post-render passes, batched
//! cleanup, throttled re-renders) is represented by a [`DeferredTask`]
//! holding a due time. The host pumps `Grid::tick(now_ms)` from its
//! event loop; a task fires at most once per schedule, and
//! re-scheduling resets rather than stacks the callback.

/// A cancelable, coalescing one-shot task.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeferredTask {
    due_at: Option<f64>,
}

impl DeferredTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule (or reset) the task to fire `delay_ms` from `now_ms`.
    pub fn schedule(&mut self, now_ms: f64, delay_ms: f64) {
        self.due_at = Some(now_ms + delay_ms);
    }

    /// Cancel without firing.
    pub fn cancel(&mut self) {
        self.due_at = None;
    }

    /// Whether the task is waiting to fire.
    pub fn is_scheduled(&self) -> bool {
        self.due_at.is_some()
    }

    /// Consume the schedule if due. Returns whether the task fired.
    pub fn fire_if_due(&mut self, now_ms: f64) -> bool {
        match self.due_at {
            Some(due) if due <= now_ms => {
                self.due_at = None;
                true
            }
            _ => false,
        }
    }
}
