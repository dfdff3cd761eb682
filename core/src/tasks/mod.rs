//! Background tasks that restart themselves after a cooldown.
//!
//! A [`Task`] runs its work on a dedicated thread. Once the work finishes, the task's
//! [`Restart`] policy decides whether it is handed to the [`Scheduler`], which starts it again
//! when the cooldown has passed. The [`TaskManager`] owns the scheduler thread and the tasks.

mod manager;
mod scheduler;
mod task;

pub use manager::TaskManager;
pub use scheduler::{Job, Scheduler};
pub use task::{Callback, Outcome, Restart, Task, Work};

/// Extract the message of a panic payload.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let value = 42;
        let payload = std::panic::catch_unwind(|| panic!("formatted {value}")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 42");

        let payload = std::panic::catch_unwind(|| std::panic::panic_any(7_u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
