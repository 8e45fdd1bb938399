use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Barrier, mpsc};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use nsvisor::{
    Event, EventKind, FactoryFn, FactoryRef, FailurePolicy, LoopError, LoopFn, LoopRef, Namespace,
    RuntimeError, Subscribe, SupervisionHandle, Supervisor, SupervisorConfig, error_channel,
};

const WAIT: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(100);

/// Loops named in `failing` fail immediately; every other loop parks until
/// stopped and then reports its namespace on `stopped`.
fn factory(failing: &[&str], stopped: mpsc::UnboundedSender<String>) -> FactoryRef {
    let failing: HashSet<String> = failing.iter().map(|s| s.to_string()).collect();
    FactoryFn::arc(move |ns: &Namespace| {
        let ns = ns.clone();
        let fails = failing.contains(ns.as_str());
        let stopped = stopped.clone();
        Ok(LoopFn::boxed(move |stop: CancellationToken| async move {
            if fails {
                return Err(LoopError::failed(ns, "watch closed"));
            }
            stop.cancelled().await;
            let _ = stopped.send(ns.to_string());
            Ok(())
        }))
    })
}

fn supervisor(policy: FailurePolicy, factory: FactoryRef) -> Arc<Supervisor> {
    Supervisor::builder(factory).with_policy(policy).build()
}

async fn drain(rx: &mut mpsc::UnboundedReceiver<String>, n: usize) -> Vec<String> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let ns = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        out.push(ns);
    }
    out.sort();
    out
}

async fn wait_running(handle: &SupervisionHandle, n: usize) -> Vec<String> {
    timeout(WAIT, async {
        loop {
            let running = handle.running().await;
            if running.len() == n {
                break running;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_duplicates_each_launch_a_loop() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    let factory = FactoryFn::arc(move |_ns: &Namespace| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(LoopFn::boxed(|stop: CancellationToken| async move {
            stop.cancelled().await;
            Ok(())
        }))
    });
    let sup = supervisor(FailurePolicy::ContinueOnError, factory);

    let (handle, _errors) = sup.start(["a", "a", "b"], CancellationToken::new());
    assert_eq!(handle.len(), 3);

    timeout(WAIT, async {
        while built.load(Ordering::SeqCst) < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    handle.shutdown_within(WAIT).await.unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_continue_on_error_keeps_siblings_running() {
    let (tx, mut stopped) = mpsc::unbounded_channel();
    let sup = supervisor(FailurePolicy::ContinueOnError, factory(&["a"], tx));
    let stop = CancellationToken::new();

    let (mut handle, mut errors) = sup.start(["a", "b"], stop.clone());

    let err = timeout(WAIT, errors.recv()).await.unwrap().unwrap();
    assert_eq!(err, LoopError::failed("a", "watch closed"));
    assert!(err.to_string().contains("namespace a"));

    assert!(timeout(QUIET, stopped.recv()).await.is_err(), "b must still run");
    assert!(!handle.is_stopped());

    stop.cancel();
    timeout(WAIT, handle.wait()).await.unwrap();
    assert_eq!(drain(&mut stopped, 1).await, vec!["b".to_string()]);
    assert!(!errors.is_closed());
}

#[tokio::test]
async fn test_continue_on_error_delivers_every_failure() {
    let (tx, _stopped) = mpsc::unbounded_channel();
    let sup = supervisor(
        FailurePolicy::ContinueOnError,
        factory(&["a", "b", "c"], tx),
    );

    let (_handle, mut errors) = sup.start(["a", "b", "c"], CancellationToken::new());

    let mut seen = Vec::new();
    while let Some(err) = timeout(WAIT, errors.recv()).await.unwrap() {
        seen.push(err.namespace().map(|n| n.to_string()).unwrap_or_default());
    }
    seen.sort();
    assert_eq!(seen, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_fail_fast_forwards_one_error_and_stops_siblings() {
    let (tx, mut stopped) = mpsc::unbounded_channel();
    let sup = supervisor(FailurePolicy::FailFast, factory(&["b"], tx));

    let (mut handle, mut errors) = sup.start(["a", "b", "c"], CancellationToken::new());

    let err = timeout(WAIT, errors.recv()).await.unwrap().unwrap();
    assert_eq!(err, LoopError::failed("b", "watch closed"));
    assert_eq!(timeout(WAIT, errors.recv()).await.unwrap(), None);
    assert!(errors.is_closed());

    timeout(WAIT, handle.wait()).await.unwrap();
    assert!(handle.is_stopped());
    assert_eq!(drain(&mut stopped, 2).await, vec!["a", "c"]);
}

#[tokio::test]
async fn test_fail_fast_external_stop_leaves_channel_open() {
    let (tx, mut stopped) = mpsc::unbounded_channel();
    let sup = supervisor(FailurePolicy::FailFast, factory(&[], tx));
    let stop = CancellationToken::new();
    let (sink, mut errors) = error_channel(4);

    let mut handle = sup.start_with_sink(["a", "b"], stop.clone(), sink.clone());
    stop.cancel();
    timeout(WAIT, handle.wait()).await.unwrap();
    assert_eq!(drain(&mut stopped, 2).await, vec!["a", "b"]);

    assert!(timeout(QUIET, errors.recv()).await.is_err(), "no value, no close");
    assert!(!errors.is_closed());
    assert!(!sink.is_closed());
}

#[tokio::test]
async fn test_fail_fast_concurrent_failures_yield_one_error() {
    let barrier = Arc::new(Barrier::new(2));
    let factory = FactoryFn::arc(move |ns: &Namespace| {
        let ns = ns.clone();
        let barrier = Arc::clone(&barrier);
        Ok(LoopFn::boxed(move |_stop: CancellationToken| async move {
            barrier.wait().await;
            Err(LoopError::failed(ns, "lost lease"))
        }))
    });
    let sup = supervisor(FailurePolicy::FailFast, factory);

    let (_handle, mut errors) = sup.start(["a", "b"], CancellationToken::new());

    let first = timeout(WAIT, errors.recv()).await.unwrap();
    assert!(first.is_some());
    assert_eq!(timeout(WAIT, errors.recv()).await.unwrap(), None);
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let (tx, mut stopped) = mpsc::unbounded_channel();
    let sup = supervisor(FailurePolicy::FailFast, factory(&[], tx));
    let stop = CancellationToken::new();

    let (handle, _errors) = sup.start(["a"], stop.clone());
    handle.stop();
    handle.stop();
    stop.cancel();
    stop.cancel();

    handle.shutdown_within(WAIT).await.unwrap();
    assert_eq!(drain(&mut stopped, 1).await, vec!["a"]);
}

#[tokio::test]
async fn test_error_returned_after_stop_is_not_reported() {
    let factory = FactoryFn::arc(|ns: &Namespace| {
        let ns = ns.clone();
        Ok(LoopFn::boxed(move |stop: CancellationToken| async move {
            stop.cancelled().await;
            Err(LoopError::failed(ns, "informer aborted"))
        }))
    });
    let sup = supervisor(FailurePolicy::ContinueOnError, factory);
    let stop = CancellationToken::new();

    let (mut handle, mut errors) = sup.start(["a", "b"], stop.clone());
    stop.cancel();
    timeout(WAIT, handle.wait()).await.unwrap();

    assert_eq!(timeout(WAIT, errors.recv()).await.unwrap(), None);
}

#[tokio::test]
async fn test_empty_namespaces_launch_nothing() {
    let (tx, _stopped) = mpsc::unbounded_channel();
    let sup = supervisor(FailurePolicy::FailFast, factory(&[], tx));

    let (handle, mut errors) = sup.start(Vec::<String>::new(), CancellationToken::new());
    assert!(handle.is_empty());
    assert_eq!(timeout(WAIT, errors.recv()).await.unwrap(), None);
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_factory_failure_is_reported_like_a_loop_failure() {
    let factory = FactoryFn::arc(|ns: &Namespace| {
        if ns.as_str() == "locked" {
            return Err(LoopError::factory(ns, "forbidden"));
        }
        Ok(LoopFn::boxed(|stop: CancellationToken| async move {
            stop.cancelled().await;
            Ok(())
        }))
    });
    let sup = supervisor(FailurePolicy::ContinueOnError, factory);
    let stop = CancellationToken::new();

    let (handle, mut errors) = sup.start(["open", "locked"], stop);

    let err = timeout(WAIT, errors.recv()).await.unwrap().unwrap();
    assert_eq!(err.as_label(), "loop_factory_failed");
    assert_eq!(
        err.to_string(),
        "failed to start control loop for namespace locked: forbidden"
    );
    assert!(!handle.is_stopped());
    handle.shutdown_within(WAIT).await.unwrap();
}

#[tokio::test]
async fn test_shutdown_reports_stuck_loops() {
    let factory = FactoryFn::arc(|ns: &Namespace| {
        let stubborn = ns.as_str() == "stubborn";
        Ok(LoopFn::boxed(move |stop: CancellationToken| async move {
            if stubborn {
                std::future::pending::<()>().await;
            }
            stop.cancelled().await;
            Ok(())
        }))
    });
    let sup = supervisor(FailurePolicy::ContinueOnError, factory);

    let (handle, _errors) = sup.start(["polite", "stubborn"], CancellationToken::new());
    tokio::time::sleep(Duration::from_millis(20)).await;

    match handle.shutdown_within(Duration::from_millis(100)).await {
        Err(RuntimeError::GraceExceeded { stuck, .. }) => {
            assert_eq!(stuck, vec!["stubborn#1".to_string()]);
        }
        other => panic!("unexpected shutdown result: {other:?}"),
    }
}

#[tokio::test]
async fn test_running_lists_live_loops() {
    let (tx, _stopped) = mpsc::unbounded_channel();
    let sup = supervisor(FailurePolicy::ContinueOnError, factory(&[], tx));

    let (handle, _errors) = sup.start(["a", "a"], CancellationToken::new());

    let running = wait_running(&handle, 2).await;
    assert_eq!(running, vec!["a#0".to_string(), "a#1".to_string()]);
    handle.shutdown_within(WAIT).await.unwrap();
}

struct Recorder(mpsc::UnboundedSender<EventKind>);

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        let _ = self.0.send(ev.kind);
    }
    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test]
async fn test_subscriber_observes_fail_fast() {
    let (tx, _stopped) = mpsc::unbounded_channel();
    let (kinds_tx, mut kinds) = mpsc::unbounded_channel();
    let sup = Supervisor::builder(factory(&["b"], tx))
        .with_policy(FailurePolicy::FailFast)
        .with_subscriber(Arc::new(Recorder(kinds_tx)))
        .build();

    let (_handle, mut errors) = sup.start(["a", "b"], CancellationToken::new());
    assert!(timeout(WAIT, errors.recv()).await.unwrap().is_some());

    let mut seen = HashSet::new();
    timeout(WAIT, async {
        while !seen.contains(&EventKind::SinkClosed) {
            if let Some(kind) = kinds.recv().await {
                seen.insert(kind);
            }
        }
    })
    .await
    .unwrap();

    assert!(seen.contains(&EventKind::SupervisorStarted));
    assert!(seen.contains(&EventKind::LoopFailed));
    assert!(seen.contains(&EventKind::FailFastTriggered));
    assert!(seen.contains(&EventKind::ErrorForwarded));
}

#[tokio::test]
async fn test_overlapping_runs_keep_their_own_loops() {
    let (tx, _stopped) = mpsc::unbounded_channel();
    let sup = supervisor(FailurePolicy::ContinueOnError, factory(&[], tx));

    let (first, _first_errors) = sup.start(["a"], CancellationToken::new());
    assert_eq!(wait_running(&first, 1).await, vec!["a#0".to_string()]);

    let (mut second, _second_errors) = sup.start(["a"], CancellationToken::new());
    assert_ne!(first.run_id(), second.run_id());
    assert_eq!(wait_running(&second, 1).await, vec!["a#0".to_string()]);

    second.stop();
    timeout(WAIT, second.wait()).await.unwrap();
    sup.flush().await;

    assert!(second.running().await.is_empty());
    assert!(!first.is_stopped());
    assert_eq!(first.running().await, vec!["a#0".to_string()]);
    first.shutdown_within(WAIT).await.unwrap();
}

#[tokio::test]
async fn test_fail_fast_factory_failure_cancels_siblings() {
    let (tx, mut stopped) = mpsc::unbounded_channel::<String>();
    let factory = FactoryFn::arc(move |ns: &Namespace| {
        if ns.as_str() == "locked" {
            return Err(LoopError::factory(ns, "forbidden"));
        }
        let ns = ns.clone();
        let stopped = tx.clone();
        Ok(LoopFn::boxed(move |stop: CancellationToken| async move {
            stop.cancelled().await;
            let _ = stopped.send(ns.to_string());
            Ok(())
        }))
    });
    let sup = supervisor(FailurePolicy::FailFast, factory);

    let (mut handle, mut errors) = sup.start(["a", "locked", "c"], CancellationToken::new());

    let err = timeout(WAIT, errors.recv()).await.unwrap().unwrap();
    assert_eq!(err, LoopError::factory("locked", "forbidden"));
    assert_eq!(timeout(WAIT, errors.recv()).await.unwrap(), None);
    assert!(errors.is_closed());

    timeout(WAIT, handle.wait()).await.unwrap();
    assert_eq!(drain(&mut stopped, 2).await, vec!["a", "c"]);
}

#[tokio::test]
async fn test_factory_panic_is_reported() {
    let factory = FactoryFn::arc(|ns: &Namespace| -> Result<LoopRef, LoopError> {
        if ns.as_str() == "cursed" {
            panic!("client config missing");
        }
        Ok(LoopFn::boxed(|stop: CancellationToken| async move {
            stop.cancelled().await;
            Ok(())
        }))
    });
    let sup = supervisor(FailurePolicy::ContinueOnError, factory);

    let (handle, mut errors) = sup.start(["fine", "cursed"], CancellationToken::new());

    let err = timeout(WAIT, errors.recv()).await.unwrap().unwrap();
    assert_eq!(err.as_label(), "loop_factory_failed");
    assert_eq!(err.namespace().map(|n| n.as_str()), Some("cursed"));
    assert!(err.to_string().contains("client config missing"));
    assert!(!handle.is_stopped());
    handle.shutdown_within(WAIT).await.unwrap();
}

#[tokio::test]
async fn test_slow_reader_still_receives_every_failure() {
    let names: Vec<String> = (0..10).map(|i| format!("ns-{i:02}")).collect();
    let failing: Vec<&str> = names.iter().map(String::as_str).collect();
    let (tx, _stopped) = mpsc::unbounded_channel();
    let sup = Supervisor::builder(factory(&failing, tx))
        .with_config(SupervisorConfig {
            error_capacity: 1,
            ..SupervisorConfig::default()
        })
        .build();

    let (_handle, mut errors) = sup.start(names.clone(), CancellationToken::new());
    tokio::time::sleep(QUIET).await;

    let mut seen = Vec::new();
    while let Some(err) = timeout(WAIT, errors.recv()).await.unwrap() {
        seen.push(err.namespace().map(|n| n.to_string()).unwrap_or_default());
    }
    seen.sort();
    assert_eq!(seen, names);
}

#[tokio::test]
async fn test_fail_fast_voluntary_stop_ends_stream_without_close() {
    let (tx, _stopped) = mpsc::unbounded_channel();
    let sup = supervisor(FailurePolicy::FailFast, factory(&[], tx));
    let stop = CancellationToken::new();

    let (mut handle, mut errors) = sup.start(["a", "b"], stop.clone());
    stop.cancel();
    timeout(WAIT, handle.wait()).await.unwrap();

    assert_eq!(timeout(WAIT, errors.recv()).await.unwrap(), None);
    assert!(!errors.is_closed());
}

#[tokio::test]
async fn test_stop_watcher_ends_when_loops_return() {
    let factory = FactoryFn::arc(|_ns: &Namespace| {
        Ok(LoopFn::boxed(|_stop: CancellationToken| async move { Ok(()) }))
    });
    let sup = supervisor(FailurePolicy::ContinueOnError, factory);
    let mut events = sup.subscribe();
    let stop = CancellationToken::new();

    let (mut handle, _errors) = sup.start(["a", "b"], stop.clone());
    timeout(WAIT, handle.wait()).await.unwrap();
    tokio::time::sleep(QUIET).await;

    stop.cancel();
    tokio::time::sleep(QUIET).await;

    while let Ok(ev) = events.try_recv() {
        assert_ne!(ev.kind, EventKind::StopRequested);
    }
}

#[tokio::test]
async fn test_flush_delivers_earlier_events_to_subscribers() {
    let (tx, _stopped) = mpsc::unbounded_channel();
    let (kinds_tx, mut kinds) = mpsc::unbounded_channel();
    let sup = Supervisor::builder(factory(&["a"], tx))
        .with_subscriber(Arc::new(Recorder(kinds_tx)))
        .build();

    let (mut handle, mut errors) = sup.start(["a"], CancellationToken::new());
    assert!(timeout(WAIT, errors.recv()).await.unwrap().is_some());
    timeout(WAIT, handle.wait()).await.unwrap();
    sup.flush().await;

    let mut seen = HashSet::new();
    while let Ok(kind) = kinds.try_recv() {
        seen.insert(kind);
    }
    for kind in [
        EventKind::SupervisorStarted,
        EventKind::LoopStarting,
        EventKind::LoopFailed,
        EventKind::ErrorForwarded,
    ] {
        assert!(seen.contains(&kind), "missing {kind:?}");
    }
}

#[tokio::test]
async fn test_fail_fast_losing_failure_is_reported_dropped() {
    let barrier = Arc::new(Barrier::new(2));
    let factory = FactoryFn::arc(move |ns: &Namespace| {
        let ns = ns.clone();
        let barrier = Arc::clone(&barrier);
        Ok(LoopFn::boxed(move |_stop: CancellationToken| async move {
            barrier.wait().await;
            Err(LoopError::failed(ns, "lost lease"))
        }))
    });
    let sup = supervisor(FailurePolicy::FailFast, factory);
    let mut events = sup.subscribe();

    let (_handle, mut errors) = sup.start(["a", "b"], CancellationToken::new());
    assert!(timeout(WAIT, errors.recv()).await.unwrap().is_some());

    let (mut forwarded, mut dropped) = (0, 0);
    timeout(WAIT, async {
        while forwarded + dropped < 2 {
            let ev = events.recv().await.unwrap();
            match ev.kind {
                EventKind::ErrorForwarded => forwarded += 1,
                EventKind::ErrorDropped => dropped += 1,
                _ => {}
            }
        }
    })
    .await
    .unwrap();
    assert_eq!((forwarded, dropped), (1, 1));
}
