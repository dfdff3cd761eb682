//----------------------------------------------------------------------------------------- std lib
use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
    thread,
    time::Duration,
};
//--------------------------------------------------------------------------------- other libraries
use log::{debug, error, info, warn};

use super::{Scheduler, panic_message};
use crate::errors::TaskError;

/// The unit of work of a [`Task`].
pub type Work = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;
/// Called with the id of the task and the outcome of every run.
pub type Callback = Arc<dyn Fn(&str, &Outcome) + Send + Sync>;

/// When a finished task is started again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Restart {
    #[default]
    Never,
    OnFailure,
    OnSuccess,
    Always,
}

impl Restart {
    #[must_use]
    pub const fn should_restart(self, succeeded: bool) -> bool {
        match self {
            Self::Never => false,
            Self::OnFailure => !succeeded,
            Self::OnSuccess => succeeded,
            Self::Always => true,
        }
    }
}

/// How a single run of a [`Task`] ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed(String),
    Panicked(String),
}

impl Outcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

#[derive(Debug, Default)]
struct TaskState {
    running: bool,
    started_count: u64,
}

/// A unit of work that runs on its own thread, at most once at a time, and may be restarted
/// through a [`Scheduler`] after it finishes.
pub struct Task {
    id: String,
    work: Work,
    restart: Restart,
    cooldown: Duration,
    callbacks: Mutex<Vec<Callback>>,
    state: Mutex<TaskState>,
    scheduler: OnceLock<Arc<Scheduler>>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("restart", &self.restart)
            .field("cooldown", &self.cooldown)
            .field("state", &*self.lock_state())
            .finish_non_exhaustive()
    }
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        work: impl Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            work: Arc::new(work),
            restart: Restart::default(),
            cooldown: Duration::ZERO,
            callbacks: Mutex::default(),
            state: Mutex::default(),
            scheduler: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn with_restart(mut self, restart: Restart, cooldown: Duration) -> Self {
        self.restart = restart;
        self.cooldown = cooldown;
        self
    }

    #[must_use]
    pub fn with_callback(self, callback: impl Fn(&str, &Outcome) + Send + Sync + 'static) -> Self {
        self.add_callback(callback);
        self
    }

    pub fn add_callback(&self, callback: impl Fn(&str, &Outcome) + Send + Sync + 'static) {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(callback));
    }

    /// Restarts go through `scheduler`. Only the first call has an effect.
    pub(crate) fn attach(&self, scheduler: Arc<Scheduler>) {
        let _ = self.scheduler.set(scheduler);
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn restart(&self) -> Restart {
        self.restart
    }

    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }

    fn lock_state(&self) -> MutexGuard<'_, TaskState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lock_state().running
    }

    /// How often the task has been started.
    #[must_use]
    pub fn started_count(&self) -> u64 {
        self.lock_state().started_count
    }

    /// Run the work on a new thread.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::AlreadyRunning`] if the previous run has not finished yet, and
    /// [`TaskError::Spawn`] if no thread could be spawned.
    pub fn start(self: &Arc<Self>) -> Result<(), TaskError> {
        {
            let mut state = self.lock_state();
            if state.running {
                return Err(TaskError::AlreadyRunning(self.id.clone()));
            }
            state.running = true;
            state.started_count += 1;
        }

        let task = Arc::clone(self);
        match thread::Builder::new()
            .name(format!("task-{}", self.id))
            .spawn(move || task.execute())
        {
            Ok(_) => Ok(()),
            Err(source) => {
                let mut state = self.lock_state();
                state.running = false;
                state.started_count -= 1;
                Err(TaskError::Spawn {
                    id: self.id.clone(),
                    source,
                })
            }
        }
    }

    fn execute(self: Arc<Self>) {
        debug!("task {:?} started", self.id);
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| (self.work)())) {
            Ok(Ok(())) => Outcome::Succeeded,
            Ok(Err(e)) => Outcome::Failed(format!("{e:#}")),
            Err(payload) => Outcome::Panicked(panic_message(payload.as_ref())),
        };
        match &outcome {
            Outcome::Succeeded => debug!("task {:?} finished", self.id),
            Outcome::Failed(reason) | Outcome::Panicked(reason) => error!(
                "task {:?} failed (restart policy {:?}): {reason}",
                self.id, self.restart
            ),
        }

        self.lock_state().running = false;

        // callbacks may register more callbacks, so don't hold the lock while running them
        let callbacks = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for callback in &callbacks {
            if let Err(payload) =
                panic::catch_unwind(AssertUnwindSafe(|| callback(&self.id, &outcome)))
            {
                error!(
                    "completion callback of task {:?} panicked: {}",
                    self.id,
                    panic_message(payload.as_ref())
                );
            }
        }

        if self.restart.should_restart(outcome.is_success()) {
            self.schedule_restart();
        }
    }

    fn schedule_restart(self: Arc<Self>) {
        let Some(scheduler) = self.scheduler.get().cloned() else {
            warn!("task {:?} is not attached to a scheduler, not restarting", self.id);
            return;
        };
        info!("restarting task {:?} in {:?}", self.id, self.cooldown);
        let cooldown = self.cooldown;
        scheduler.schedule_in(cooldown, move || {
            if let Err(e) = self.start() {
                warn!("{e}");
            }
        });
    }
}
