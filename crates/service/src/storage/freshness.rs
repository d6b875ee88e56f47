//! Debounced refresh of the per-type freshness markers.
//!
//! Mutations call [`RefreshCoordinator::signal`]; the coordinator turns any
//! burst of signals for one type into at most one running refresh plus at most
//! one queued behind it. Refreshes run on a fixed pool of worker tasks fed by
//! a bounded queue, so `signal` itself never waits on I/O.
//!
//! Per type the coordinator guarantees:
//! - at most one refresh body executes at any instant;
//! - every signal is followed by a refresh that starts after the signal;
//! - signals arriving while a refresh is queued or running add at most one
//!   further refresh.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use models::ObjectType;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender, WeakSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Body of a refresh task. Failures are the refresher's to log; nothing is
/// reported back to whoever signalled.
#[async_trait]
pub trait MarkerRefresher: Send + Sync + 'static {
    async fn refresh(&self, object_type: ObjectType);
}

/// Observable coordinator state of one object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    /// A refresh is queued and has not started yet.
    Pending,
    Running,
    /// A refresh is running and another one will follow it.
    RunningWithPending,
}

#[derive(Debug, Default)]
struct ModificationTimeState {
    needs_update: bool,
    update_running: bool,
}

impl ModificationTimeState {
    /// Record a mutation. Returns whether the caller has to submit a task.
    ///
    /// `needs_update` must be checked too, or near-simultaneous calls would
    /// each submit a task before the first one gets to run.
    fn update_needed(&mut self) -> bool {
        let needed_update = self.needs_update;
        self.needs_update = true;
        !needed_update && !self.update_running
    }

    /// Claims every signal received so far.
    fn task_started(&mut self) {
        self.update_running = true;
        self.needs_update = false;
    }

    /// Returns whether signals arrived during the run and a follow-up task is due.
    fn task_finished(&mut self) -> bool {
        self.update_running = false;
        self.needs_update
    }

    fn snapshot(&self) -> RefreshState {
        match (self.update_running, self.needs_update) {
            (false, false) => RefreshState::Idle,
            (false, true) => RefreshState::Pending,
            (true, false) => RefreshState::Running,
            (true, true) => RefreshState::RunningWithPending,
        }
    }
}

/// One state cell per object type, indexed by [`ObjectType::index`].
#[derive(Debug)]
struct TypeStates {
    cells: Vec<Mutex<ModificationTimeState>>,
}

impl TypeStates {
    fn new() -> Self {
        Self { cells: ObjectType::ALL.iter().map(|_| Mutex::default()).collect() }
    }

    // The guarded state is two booleans that are consistent after every
    // statement, so a poisoned lock is still usable.
    fn lock(&self, object_type: ObjectType) -> MutexGuard<'_, ModificationTimeState> {
        self.cells[object_type.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Queue a refresh for `object_type`. Called with the type's state locked.
fn submit(queue: &Sender<ObjectType>, object_type: ObjectType, state: &mut ModificationTimeState) {
    match queue.try_send(object_type) {
        Ok(()) => debug!(%object_type, "scheduled last-modified refresh"),
        Err(TrySendError::Full(_)) => {
            // capacity is one slot per type and a type is never queued twice
            warn!(%object_type, "refresh queue full; dropping last-modified refresh");
            state.needs_update = false;
        }
        Err(TrySendError::Closed(_)) => {
            warn!(%object_type, "refresh workers stopped; dropping last-modified refresh");
            state.needs_update = false;
        }
    }
}

pub struct RefreshCoordinator {
    states: Arc<TypeStates>,
    queue: Sender<ObjectType>,
    workers: Vec<JoinHandle<()>>,
}

impl RefreshCoordinator {
    /// Spawn `workers` refresh workers on the current tokio runtime.
    ///
    /// # Panics
    /// When called outside a tokio runtime.
    pub fn start(refresher: Arc<dyn MarkerRefresher>, workers: usize) -> Self {
        let (queue, rx) = mpsc::channel(ObjectType::ALL.len());
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let states = Arc::new(TypeStates::new());
        let workers = (0..workers.max(1))
            .map(|id| {
                tokio::spawn(run_worker(
                    id,
                    Arc::clone(&states),
                    Arc::clone(&rx),
                    queue.downgrade(),
                    Arc::clone(&refresher),
                ))
            })
            .collect();
        Self { states, queue, workers }
    }

    /// Note that an object of `object_type` changed. Never blocks on I/O.
    pub fn signal(&self, object_type: ObjectType) {
        let mut state = self.states.lock(object_type);
        if state.update_needed() {
            submit(&self.queue, object_type, &mut state);
        }
    }

    pub fn state(&self, object_type: ObjectType) -> RefreshState {
        self.states.lock(object_type).snapshot()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting work, let queued refreshes drain and wait for the workers.
    pub async fn shutdown(self) {
        let Self { queue, workers, .. } = self;
        drop(queue);
        for handle in workers {
            if let Err(error) = handle.await {
                warn!(%error, "refresh worker ended abnormally");
            }
        }
    }
}

async fn run_worker(
    id: usize,
    states: Arc<TypeStates>,
    rx: Arc<tokio::sync::Mutex<Receiver<ObjectType>>>,
    queue: WeakSender<ObjectType>,
    refresher: Arc<dyn MarkerRefresher>,
) {
    debug!(worker = id, "refresh worker started");
    loop {
        let next = rx.lock().await.recv().await;
        let Some(object_type) = next else { break };

        states.lock(object_type).task_started();

        // Run the body as its own task so a panicking refresher cannot leave
        // the type stuck in the running state.
        let body = Arc::clone(&refresher);
        if let Err(error) = tokio::spawn(async move { body.refresh(object_type).await }).await {
            warn!(%object_type, %error, "last-modified refresh aborted");
        }

        finish(&states, &queue, object_type);
    }
    debug!(worker = id, "refresh worker stopped");
}

/// Mark the run of `object_type` complete, resubmitting if signals arrived meanwhile.
fn finish(states: &TypeStates, queue: &WeakSender<ObjectType>, object_type: ObjectType) {
    let mut state = states.lock(object_type);
    if state.task_finished() {
        match queue.upgrade() {
            Some(queue) => submit(&queue, object_type, &mut state),
            None => {
                debug!(%object_type, "coordinator gone; pending refresh abandoned");
                state.needs_update = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::{Notify, Semaphore};
    use tokio::time::{sleep, timeout};

    #[derive(Default)]
    struct CountingRefresher {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl MarkerRefresher for CountingRefresher {
        async fn refresh(&self, _object_type: ObjectType) {
            self.runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Blocks every refresh of `gated` until a permit is released.
    struct GatedRefresher {
        gated: ObjectType,
        gate: Semaphore,
        started: Notify,
        runs: AtomicUsize,
    }

    impl GatedRefresher {
        fn new(gated: ObjectType) -> Self {
            Self { gated, gate: Semaphore::new(0), started: Notify::new(), runs: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl MarkerRefresher for GatedRefresher {
        async fn refresh(&self, object_type: ObjectType) {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if object_type == self.gated {
                self.started.notify_one();
                if let Ok(permit) = self.gate.acquire().await {
                    permit.forget();
                }
            }
        }
    }

    struct PanickingRefresher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarkerRefresher for PanickingRefresher {
        async fn refresh(&self, _object_type: ObjectType) {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("backend client blew up");
            }
        }
    }

    async fn wait_idle(coordinator: &RefreshCoordinator, object_type: ObjectType) {
        timeout(Duration::from_secs(5), async {
            while coordinator.state(object_type) != RefreshState::Idle {
                sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("coordinator did not settle");
    }

    #[test]
    fn state_machine_transitions() {
        let mut state = ModificationTimeState::default();
        assert_eq!(state.snapshot(), RefreshState::Idle);

        assert!(state.update_needed());
        assert!(!state.update_needed());
        assert_eq!(state.snapshot(), RefreshState::Pending);

        state.task_started();
        assert_eq!(state.snapshot(), RefreshState::Running);
        assert!(!state.update_needed());
        assert_eq!(state.snapshot(), RefreshState::RunningWithPending);

        assert!(state.task_finished());
        assert_eq!(state.snapshot(), RefreshState::Pending);
        state.task_started();
        assert!(!state.task_finished());
        assert_eq!(state.snapshot(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn burst_before_start_runs_once() {
        let refresher = Arc::new(CountingRefresher::default());
        let coordinator = RefreshCoordinator::start(refresher.clone(), 2);

        // current-thread runtime: no worker runs until we yield
        for _ in 0..100 {
            coordinator.signal(ObjectType::Pipeline);
        }
        assert_eq!(coordinator.state(ObjectType::Pipeline), RefreshState::Pending);

        wait_idle(&coordinator, ObjectType::Pipeline).await;
        assert_eq!(refresher.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn signals_during_run_queue_exactly_one_more() {
        let refresher = Arc::new(GatedRefresher::new(ObjectType::Application));
        let coordinator = RefreshCoordinator::start(refresher.clone(), 2);

        coordinator.signal(ObjectType::Application);
        refresher.started.notified().await;
        assert_eq!(coordinator.state(ObjectType::Application), RefreshState::Running);

        for _ in 0..50 {
            coordinator.signal(ObjectType::Application);
        }
        assert_eq!(coordinator.state(ObjectType::Application), RefreshState::RunningWithPending);

        refresher.gate.add_permits(2);
        wait_idle(&coordinator, ObjectType::Application).await;
        assert_eq!(refresher.runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn types_refresh_independently() {
        let refresher = Arc::new(GatedRefresher::new(ObjectType::Pipeline));
        let coordinator = RefreshCoordinator::start(refresher.clone(), 2);

        coordinator.signal(ObjectType::Pipeline);
        refresher.started.notified().await;

        coordinator.signal(ObjectType::Project);
        wait_idle(&coordinator, ObjectType::Project).await;
        assert_eq!(coordinator.state(ObjectType::Pipeline), RefreshState::Running);

        refresher.gate.add_permits(1);
        wait_idle(&coordinator, ObjectType::Pipeline).await;
        assert_eq!(refresher.runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn panicking_refresh_does_not_wedge_the_type() {
        let refresher = Arc::new(PanickingRefresher { calls: AtomicUsize::new(0) });
        let coordinator = RefreshCoordinator::start(refresher.clone(), 1);

        coordinator.signal(ObjectType::Snapshot);
        wait_idle(&coordinator, ObjectType::Snapshot).await;

        coordinator.signal(ObjectType::Snapshot);
        wait_idle(&coordinator, ObjectType::Snapshot).await;
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn shutdown_drains_and_stops_workers() {
        let refresher = Arc::new(CountingRefresher::default());
        let coordinator = RefreshCoordinator::start(refresher.clone(), 3);
        assert_eq!(coordinator.worker_count(), 3);

        coordinator.signal(ObjectType::EntityTags);
        coordinator.shutdown().await;
        assert_eq!(refresher.runs.load(Ordering::SeqCst), 1);
    }
}
