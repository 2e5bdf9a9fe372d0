use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crudkit_core::managed::{run_managed, ManagedResource};

#[derive(Default)]
struct Counters {
    acquired: AtomicUsize,
    committed: AtomicUsize,
    rolled_back: AtomicUsize,
}

struct Probe {
    counters: Arc<Counters>,
    writes: Vec<&'static str>,
}

#[derive(Debug)]
struct ProbeError(String);

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ManagedResource<Arc<Counters>> for Probe {
    type Error = ProbeError;

    async fn acquire(state: &Arc<Counters>) -> Result<Self, Self::Error> {
        state.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Probe {
            counters: state.clone(),
            writes: Vec::new(),
        })
    }

    async fn release(self, success: bool) -> Result<(), Self::Error> {
        if success {
            self.counters.committed.fetch_add(self.writes.len(), Ordering::SeqCst);
        } else {
            self.counters.rolled_back.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[tokio::test]
async fn success_releases_with_commit() {
    let counters = Arc::new(Counters::default());
    let out: Result<u32, ProbeError> = run_managed::<_, Probe, _, _, _>(&counters, |probe| {
        Box::pin(async move {
            probe.writes.push("a");
            probe.writes.push("b");
            Ok(7)
        })
    })
    .await;

    assert_eq!(out.unwrap(), 7);
    assert_eq!(counters.acquired.load(Ordering::SeqCst), 1);
    assert_eq!(counters.committed.load(Ordering::SeqCst), 2);
    assert_eq!(counters.rolled_back.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failure_releases_with_rollback() {
    let counters = Arc::new(Counters::default());
    let out: Result<u32, ProbeError> = run_managed::<_, Probe, _, _, _>(&counters, |probe| {
        Box::pin(async move {
            probe.writes.push("a");
            Err(ProbeError("boom".into()))
        })
    })
    .await;

    assert_eq!(out.unwrap_err().0, "boom");
    assert_eq!(counters.committed.load(Ordering::SeqCst), 0);
    assert_eq!(counters.rolled_back.load(Ordering::SeqCst), 1);
}
