//! Tracked background tasks.
//!
//! Every task started with [`run`] is reported to `#[beacon::runtime]`, which waits for all of them
//! before the program ends: a running scheduler loop keeps the program alive until it is shut down.
use std::future::Future;

use log::error;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

use crate::errors::{Error, RuntimeError, Unknown};

/// What a tracked task ended with.
///
/// Task futures may output either `()` or `Result<(), Error>`: both convert into an outcome.
pub enum TaskOutcome {
    Done,
    Failed(Error),
}

impl From<()> for TaskOutcome {
    fn from(_: ()) -> Self {
        Self::Done
    }
}

impl From<Result<(), Error>> for TaskOutcome {
    fn from(result: Result<(), Error>) -> Self {
        match result {
            Ok(()) => Self::Done,
            Err(err) => Self::Failed(err),
        }
    }
}

/// Handle to a task started with [`run`].
pub type TaskHandler = JoinHandle<Result<(), Error>>;

/// Each tracked task reports its outcome on its own channel; the receiving ends are queued here.
type OutcomeReceiver = UnboundedReceiver<TaskOutcome>;

static TRACKER_TX: OnceCell<Mutex<Option<UnboundedSender<OutcomeReceiver>>>> =
    OnceCell::const_new();
static TRACKER_RX: OnceCell<Mutex<Option<UnboundedReceiver<OutcomeReceiver>>>> =
    OnceCell::const_new();

/// Sets up task tracking. Called first thing by `#[beacon::runtime]`; later calls do nothing.
pub async fn init_task_channel() {
    TRACKER_RX
        .get_or_init(|| async {
            let (tx, rx) = unbounded_channel::<OutcomeReceiver>();
            TRACKER_TX.get_or_init(|| async { Mutex::new(Some(tx)) }).await;
            Mutex::new(Some(rx))
        })
        .await;
}

/// Waits for every tracked task to finish, including the ones started meanwhile.
/// Called last thing by `#[beacon::runtime]`. Failures are logged.
pub async fn wait_for_tasks() {
    let Some(cell) = TRACKER_RX.get() else {
        return;
    };
    // Out of the lock while awaiting.
    let Some(mut receiver) = cell.lock().take() else {
        return;
    };

    while let Ok(mut outcome) = receiver.try_recv() {
        if let Some(TaskOutcome::Failed(err)) = outcome.recv().await {
            error!("Task failed: {}", err);
        }
    }

    *cell.lock() = Some(receiver);
}

/// Spawns `future` on the current tokio runtime as a tracked task.
///
/// # Errors
/// * `RuntimeError`: no task tracking is set up, or no tokio runtime is running on this thread
///   (the code does not run inside `#[beacon::runtime]`).
/// * `Unknown`: the task could not be tracked.
///
/// # Example
/// ```
/// use beacon::utils::task;
///
/// #[beacon::runtime]
/// async fn main() {
///     task::run(async move {
///         beacon::pause!(10);
///     })
///     .unwrap();
///     // main only returns once the task is done.
/// }
/// ```
pub fn run<F, T>(future: F) -> Result<TaskHandler, Error>
where
    F: Future<Output = T> + Send + 'static,
    T: Into<TaskOutcome> + Send + 'static,
{
    // Tracking outlives the runtime that set it up: check both before spawning anything.
    let runtime = Handle::try_current().map_err(|_| RuntimeError)?;
    let cell = TRACKER_TX.get().ok_or(RuntimeError)?;
    let mut lock = cell.lock();
    let tracker = lock.as_mut().ok_or(RuntimeError)?;

    let (outcome_tx, outcome_rx) = unbounded_channel();
    let handler = runtime.spawn(async move {
        let outcome = future.await.into();
        outcome_tx.send(outcome).map_err(|err| Unknown {
            info: err.to_string(),
        })?;
        Ok(())
    });

    tracker.send(outcome_rx).map_err(|err| Unknown {
        info: err.to_string(),
    })?;

    Ok(handler)
}

/// Suspends the current async context for the given number of milliseconds.
#[macro_export]
macro_rules! pause {
    ($ms:expr) => {
        $crate::utils::sleep(std::time::Duration::from_millis($ms as u64)).await
    };
}

/// Blocks the current thread for the given number of milliseconds.
#[macro_export]
macro_rules! pause_sync {
    ($ms:expr) => {
        std::thread::sleep(std::time::Duration::from_millis($ms as u64))
    };
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU8, Ordering};
    use std::sync::Arc;

    use crate::errors::{Error, Unknown};
    use crate::utils::task;

    #[beacon_macros::test]
    #[serial_test::serial]
    async fn test_task_runs_in_background() {
        let counter = Arc::new(AtomicU8::new(0));
        let task_counter = counter.clone();

        task::run(async move {
            pause!(100);
            task_counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        pause!(50);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        pause!(100);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[beacon_macros::test]
    #[serial_test::serial]
    async fn test_task_abort() {
        let counter = Arc::new(AtomicU8::new(0));
        let task_counter = counter.clone();

        let handler = task::run(async move {
            pause!(100);
            task_counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        pause!(50);
        handler.abort();
        pause!(100);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[beacon_macros::test]
    #[serial_test::serial]
    async fn test_task_outcomes() {
        assert!(task::run(async move { Ok::<(), Error>(()) }).is_ok());
        assert!(task::run(async move {
            Err::<(), _>(Unknown {
                info: String::from("failing task"),
            })
        })
        .is_ok());
    }

    #[test]
    #[serial_test::serial]
    fn test_wait_without_tasks() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            task::init_task_channel().await;
            task::wait_for_tasks().await;
        });
    }

    #[test]
    #[serial_test::serial]
    fn test_run_after_runtime_is_gone() {
        // Tracking set up by a runtime that no longer exists.
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(task::init_task_channel());
        drop(runtime);

        let result = task::run(async move {});
        assert_eq!(
            format!("{}", result.unwrap_err()),
            "Runtime error: Are you sure your code runs inside #[beacon::runtime]?"
        );
    }
}
