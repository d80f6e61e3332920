// Scheduler - Cancellable deferred actions for the control loop
// Replaces fire-and-forget timers: every task has an id and a group

/// Identifier of a scheduled task
pub type TaskId = u64;

/// Identifier shared by tasks that can be cancelled together
pub type GroupId = u64;

#[derive(Debug)]
struct ScheduledTask<A> {
    id: TaskId,
    group: GroupId,
    fire_at: f64,
    action: A,
}

/// Time-ordered queue of deferred actions
///
/// Nothing runs on its own: the control loop calls [`TaskScheduler::take_due`]
/// with the current clock reading and executes what it gets back, in fire
/// time order (ties in scheduling order). The queue is expected to stay
/// small (a few chord strums in flight), so a flat vector is enough.
#[derive(Debug)]
pub struct TaskScheduler<A> {
    tasks: Vec<ScheduledTask<A>>,
    next_id: TaskId,
}

impl<A> TaskScheduler<A> {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
        }
    }

    /// Schedule `action` to run at clock time `fire_at`
    pub fn schedule(&mut self, fire_at: f64, group: GroupId, action: A) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push(ScheduledTask {
            id,
            group,
            fire_at,
            action,
        });
        id
    }

    /// Cancel one task; returns its action if it was still pending
    pub fn cancel(&mut self, id: TaskId) -> Option<A> {
        let index = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(index).action)
    }

    /// Cancel every pending task of a group, returning their actions
    pub fn cancel_group(&mut self, group: GroupId) -> Vec<A> {
        let (cancelled, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.tasks)
            .into_iter()
            .partition(|t| t.group == group);
        self.tasks = kept;
        cancelled.into_iter().map(|t| t.action).collect()
    }

    /// Cancel everything
    pub fn cancel_all(&mut self) -> Vec<A> {
        self.tasks.drain(..).map(|t| t.action).collect()
    }

    /// Remove and return every task due at `now`, in execution order
    pub fn take_due(&mut self, now: f64) -> Vec<(TaskId, A)> {
        let (mut due, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.tasks)
            .into_iter()
            .partition(|t| t.fire_at <= now);
        self.tasks = kept;

        due.sort_by(|a, b| a.fire_at.total_cmp(&b.fire_at).then(a.id.cmp(&b.id)));
        due.into_iter().map(|t| (t.id, t.action)).collect()
    }

    /// Check if a group still has pending tasks
    pub fn has_group(&self, group: GroupId) -> bool {
        self.tasks.iter().any(|t| t.group == group)
    }

    /// Earliest pending fire time
    pub fn next_fire_time(&self) -> Option<f64> {
        self.tasks
            .iter()
            .map(|t| t.fire_at)
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<A> Default for TaskScheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}
