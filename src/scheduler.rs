use std::time::{Duration, Instant};

/// Version counter used to tell current work from superseded work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// A page advance waiting for its delay to elapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAdvance {
    pub generation: Generation,
    pub from_page: usize,
    pub due_at: Instant,
}

/// Holds at most one scheduled page advance.
///
/// Every [`AdvanceScheduler::invalidate`] bumps the generation, and a task is
/// only handed out by [`AdvanceScheduler::take_due`] while its generation is
/// still the current one.
#[derive(Debug, Default)]
pub struct AdvanceScheduler {
    generation: Generation,
    pending: Option<PendingAdvance>,
}

impl AdvanceScheduler {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn pending(&self) -> Option<&PendingAdvance> {
        self.pending.as_ref()
    }

    pub fn schedule(&mut self, from_page: usize, now: Instant, delay: Duration) -> PendingAdvance {
        let task = PendingAdvance {
            generation: self.generation,
            from_page,
            due_at: now + delay,
        };
        self.pending = Some(task);
        task
    }

    /// Drop any pending task and move to a new generation.
    pub fn invalidate(&mut self) -> Option<PendingAdvance> {
        self.generation = self.generation.next();
        self.pending.take()
    }

    /// Take the pending task if it is due and still current.
    pub fn take_due(&mut self, now: Instant) -> Option<PendingAdvance> {
        match self.pending {
            Some(task) if task.generation != self.generation => {
                self.pending = None;
                None
            }
            Some(task) if now >= task.due_at => self.pending.take(),
            _ => None,
        }
    }
}
