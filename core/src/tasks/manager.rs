use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
};

use log::{error, info};

use super::{Scheduler, Task};
use crate::errors::TaskError;

/// Owns a set of [`Task`]s and the thread running their [`Scheduler`].
#[derive(Debug, Default)]
pub struct TaskManager {
    scheduler: Arc<Scheduler>,
    tasks: Mutex<Vec<Arc<Task>>>,
    scheduler_thread: Mutex<Option<JoinHandle<()>>>,
}

impl TaskManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    fn lock_tasks(&self) -> MutexGuard<'_, Vec<Arc<Task>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a task, restarts of the task go through this manager's scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::DuplicateId`] if a task with the same id is already registered.
    pub fn register_task(&self, task: Task) -> Result<Arc<Task>, TaskError> {
        let mut tasks = self.lock_tasks();
        if tasks.iter().any(|t| t.id() == task.id()) {
            return Err(TaskError::DuplicateId(task.id().to_string()));
        }
        task.attach(Arc::clone(&self.scheduler));
        let task = Arc::new(task);
        tasks.push(Arc::clone(&task));
        Ok(task)
    }

    #[must_use]
    pub fn task(&self, id: &str) -> Option<Arc<Task>> {
        self.lock_tasks().iter().find(|t| t.id() == id).cloned()
    }

    /// Start the scheduler thread (once) and every task that has never been started.
    ///
    /// # Errors
    ///
    /// Fails if a thread can't be spawned.
    pub fn start(&self) -> Result<(), TaskError> {
        {
            let mut handle = self
                .scheduler_thread
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if handle.is_none() {
                let scheduler = Arc::clone(&self.scheduler);
                *handle = Some(
                    thread::Builder::new()
                        .name("task-scheduler".into())
                        .spawn(move || scheduler.run())
                        .map_err(|source| TaskError::Spawn {
                            id: "task-scheduler".into(),
                            source,
                        })?,
                );
            }
        }

        for task in self.lock_tasks().iter() {
            if task.started_count() == 0 {
                info!("starting task {:?}", task.id());
                task.start()?;
            }
        }
        Ok(())
    }

    /// Stop the scheduler, no restarts happen afterwards. Tasks that are running keep running.
    pub fn stop(&self) {
        self.scheduler.stop();
        let handle = self
            .scheduler_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("the scheduler thread panicked");
            }
        }
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{Outcome, Restart};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::{
        sync::mpsc,
        time::{Duration, Instant},
    };

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_duplicate_id() {
        let manager = TaskManager::new();
        manager.register_task(Task::new("sync", || Ok(()))).unwrap();

        let err = manager.register_task(Task::new("sync", || Ok(()))).unwrap_err();
        assert!(matches!(err, TaskError::DuplicateId(id) if id == "sync"));
        assert!(manager.task("sync").is_some());
        assert!(manager.task("other").is_none());
    }

    #[test]
    fn test_start_only_starts_fresh_tasks() {
        let manager = TaskManager::new();
        let (tx, rx) = mpsc::channel();
        let early_tx = tx.clone();
        let early = manager
            .register_task(
                Task::new("early", || Ok(())).with_callback(move |id, _| {
                    early_tx.send(id.to_string()).unwrap();
                }),
            )
            .unwrap();
        let late = manager
            .register_task(Task::new("late", || Ok(())).with_callback(move |id, _| {
                tx.send(id.to_string()).unwrap();
            }))
            .unwrap();

        early.start().unwrap();
        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), "early");

        manager.start().unwrap();
        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), "late");
        assert_eq!(early.started_count(), 1);
        assert_eq!(late.started_count(), 1);

        manager.stop();
    }

    #[rstest]
    #[case::never_after_failure(Restart::Never, false, false)]
    #[case::on_failure_after_success(Restart::OnFailure, true, false)]
    #[case::on_failure_after_failure(Restart::OnFailure, false, true)]
    #[case::on_success_after_success(Restart::OnSuccess, true, true)]
    #[case::on_success_after_failure(Restart::OnSuccess, false, false)]
    #[case::always_after_success(Restart::Always, true, true)]
    fn test_restart_policy(
        #[case] policy: Restart,
        #[case] succeed: bool,
        #[case] restarts: bool,
    ) {
        let manager = TaskManager::new();
        let (tx, rx) = mpsc::channel();
        manager
            .register_task(
                Task::new("policy", move || {
                    if succeed {
                        Ok(())
                    } else {
                        Err(anyhow::anyhow!("failed on purpose"))
                    }
                })
                .with_restart(policy, Duration::from_millis(10))
                .with_callback(move |_, outcome| {
                    let _ = tx.send(outcome.is_success());
                }),
            )
            .unwrap();
        manager.start().unwrap();

        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), succeed);
        let second = rx.recv_timeout(Duration::from_millis(500));
        assert_eq!(second.is_ok(), restarts);

        manager.stop();
    }

    #[test]
    fn test_panic_counts_as_failure() {
        let manager = TaskManager::new();
        let (tx, rx) = mpsc::channel();
        let task = manager
            .register_task(
                Task::new("panics", || panic!("work panicked"))
                    .with_restart(Restart::OnFailure, Duration::ZERO)
                    .with_callback(move |_, outcome| {
                        let _ = tx.send(outcome.clone());
                    }),
            )
            .unwrap();
        manager.start().unwrap();

        for _ in 0..2 {
            assert_eq!(
                rx.recv_timeout(TIMEOUT).unwrap(),
                Outcome::Panicked("work panicked".into())
            );
        }
        manager.stop();
        assert!(task.started_count() >= 2);
    }

    #[test]
    fn test_cooldown_is_a_lower_bound() {
        let cooldown = Duration::from_millis(150);
        let manager = TaskManager::new();
        let (tx, rx) = mpsc::channel();
        manager
            .register_task(
                Task::new("cooldown", move || {
                    let _ = tx.send(Instant::now());
                    Err(anyhow::anyhow!("always fails"))
                })
                .with_restart(Restart::Always, cooldown),
            )
            .unwrap();
        manager.start().unwrap();

        let first = rx.recv_timeout(TIMEOUT).unwrap();
        let second = rx.recv_timeout(TIMEOUT).unwrap();
        let third = rx.recv_timeout(TIMEOUT).unwrap();
        manager.stop();

        assert!(second - first >= cooldown, "{:?}", second - first);
        assert!(third - second >= cooldown, "{:?}", third - second);
    }

    #[test]
    fn test_stop_prevents_restarts() {
        let manager = TaskManager::new();
        let (tx, rx) = mpsc::channel();
        let task = manager
            .register_task(
                Task::new("stopped", || Ok(()))
                    .with_restart(Restart::Always, Duration::from_millis(100))
                    .with_callback(move |_, _| {
                        let _ = tx.send(());
                    }),
            )
            .unwrap();
        manager.start().unwrap();
        assert!(rx.recv_timeout(TIMEOUT).is_ok());

        manager.stop();
        assert!(rx.recv_timeout(Duration::from_millis(400)).is_err());
        assert_eq!(task.started_count(), 1);
        assert!(manager.scheduler().is_stopped());
    }
}
