use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use models::ObjectType;
use service::storage::{MarkerRefresher, RefreshCoordinator, RefreshState};
use tokio::time::{sleep, timeout};

const TYPES: [ObjectType; 3] = [ObjectType::Application, ObjectType::Pipeline, ObjectType::Project];

/// Slow refresher that records overlap and start times per type.
#[derive(Default)]
struct TracingRefresher {
    in_flight: [AtomicUsize; 3],
    max_in_flight: [AtomicUsize; 3],
    starts: [Mutex<Vec<Instant>>; 3],
}

fn slot(object_type: ObjectType) -> usize {
    TYPES.iter().position(|t| *t == object_type).unwrap_or(0)
}

#[async_trait]
impl MarkerRefresher for TracingRefresher {
    async fn refresh(&self, object_type: ObjectType) {
        let i = slot(object_type);
        self.starts[i].lock().unwrap().push(Instant::now());
        let now = self.in_flight[i].fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight[i].fetch_max(now, Ordering::SeqCst);
        sleep(Duration::from_millis(2)).await;
        self.in_flight[i].fetch_sub(1, Ordering::SeqCst);
    }
}

async fn settle(coordinator: &RefreshCoordinator) -> anyhow::Result<()> {
    timeout(Duration::from_secs(10), async {
        while TYPES.iter().any(|t| coordinator.state(*t) != RefreshState::Idle) {
            sleep(Duration::from_millis(1)).await;
        }
    })
    .await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_signals_never_overlap_or_get_lost() -> anyhow::Result<()> {
    common::utils::logging::init_test_logging();
    let refresher = Arc::new(TracingRefresher::default());
    let coordinator = Arc::new(RefreshCoordinator::start(refresher.clone(), 4));
    let last_signal: Arc<[Mutex<Option<Instant>>; 3]> = Arc::new(Default::default());

    let mut handles = Vec::new();
    for task in 0..8usize {
        let coordinator = coordinator.clone();
        let last_signal = last_signal.clone();
        handles.push(tokio::spawn(async move {
            for n in 0..200usize {
                let object_type = TYPES[(task + n) % TYPES.len()];
                let issued = Instant::now();
                {
                    let mut last = last_signal[slot(object_type)].lock().unwrap();
                    if last.map_or(true, |prev| issued > prev) {
                        *last = Some(issued);
                    }
                }
                coordinator.signal(object_type);
                if n % 16 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        }));
    }
    for handle in handles {
        handle.await?;
    }
    settle(&coordinator).await?;

    for object_type in TYPES {
        let i = slot(object_type);
        assert_eq!(refresher.max_in_flight[i].load(Ordering::SeqCst), 1, "{object_type} overlapped");

        let starts = refresher.starts[i].lock().unwrap();
        assert!(!starts.is_empty());
        // debounced: far fewer runs than the ~530 signals each type received
        assert!(starts.len() < 530, "{object_type} ran {} times", starts.len());

        let last_start = starts.iter().max().copied();
        let last_signal = *last_signal[i].lock().unwrap();
        assert!(last_start >= last_signal, "{object_type} lost its final signal");
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn single_worker_still_serves_every_type() -> anyhow::Result<()> {
    let refresher = Arc::new(TracingRefresher::default());
    let coordinator = RefreshCoordinator::start(refresher.clone(), 1);
    assert_eq!(coordinator.worker_count(), 1);

    for _ in 0..10 {
        for object_type in TYPES {
            coordinator.signal(object_type);
        }
    }
    settle(&coordinator).await?;

    for object_type in TYPES {
        let runs = refresher.starts[slot(object_type)].lock().unwrap().len();
        assert!((1..=10).contains(&runs), "{object_type} ran {runs} times");
    }
    coordinator.shutdown().await;
    Ok(())
}
