use super::*;
use crate::mock::{snapshot, ScriptedSource, Step};
use shared::dto::swap::SwapState;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

async fn settled(rx: &mut watch::Receiver<TrackingState>) -> TrackingState {
    rx.wait_for(|s| !s.is_loading).await.unwrap().clone()
}

fn fast() -> TrackerOptions {
    TrackerOptions::default().poll_interval(Duration::from_millis(100))
}

#[tokio::test(start_paused = true)]
async fn test_tracks_to_completion() {
    let source = ScriptedSource::new(vec![Step::Status("PENDING"), Step::Status("COMPLETED")]);
    let session = TrackingSession::new(source.clone(), fast());
    let mut rx = session.subscribe();

    session.set_swap_id(Some("abc".to_string()));
    assert!(session.state().is_loading);

    let state = settled(&mut rx).await;
    assert_eq!(state.swap_id.as_deref(), Some("abc"));
    assert_eq!(state.status.unwrap().status, SwapState::Completed);
    assert_eq!(state.error, None);
    assert_eq!(source.calls_for("abc"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_refund_surfaces_as_error() {
    let source = ScriptedSource::new(vec![Step::Status("REFUNDED")]);
    let session = TrackingSession::new(source, fast());
    let mut rx = session.subscribe();

    session.set_swap_id(Some("abc".to_string()));
    let state = settled(&mut rx).await;

    assert!(matches!(state.error, Some(TrackerError::Refunded { .. })));
    assert_eq!(state.status.unwrap().client_status, "REFUNDED");
}

#[tokio::test(start_paused = true)]
async fn test_switching_swap_id_stops_previous_tracker() {
    let source = ScriptedSource::pending_forever();
    let session = TrackingSession::new(source.clone(), fast());

    session.set_swap_id(Some("abc".to_string()));
    tokio::time::sleep(Duration::from_millis(250)).await;
    let abc_calls = source.calls_for("abc");
    assert_eq!(abc_calls, 3);

    session.set_swap_id(Some("xyz".to_string()));
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(source.calls_for("abc"), abc_calls);
    assert!(source.calls_for("xyz") > 1);

    let state = session.state();
    assert_eq!(state.swap_id.as_deref(), Some("xyz"));
    assert_eq!(state.status.unwrap().id, "xyz");
    assert!(state.is_loading);
}

#[tokio::test(start_paused = true)]
async fn test_same_swap_id_is_noop() {
    let source = ScriptedSource::pending_forever();
    let session = TrackingSession::new(source.clone(), fast());

    session.set_swap_id(Some("abc".to_string()));
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(session.progress().unwrap().completed, 3);

    session.set_swap_id(Some("abc".to_string()));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(session.progress().unwrap().completed, 3);
}

#[tokio::test(start_paused = true)]
async fn test_clearing_swap_id_returns_to_idle() {
    let source = ScriptedSource::pending_forever();
    let session = TrackingSession::new(source.clone(), fast());

    session.set_swap_id(Some("abc".to_string()));
    tokio::time::sleep(Duration::from_millis(150)).await;
    session.set_swap_id(None);
    let calls = source.calls();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(source.calls(), calls);
    assert_eq!(session.state(), TrackingState::default());
    assert!(session.progress().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_stop_and_restart() {
    let source = ScriptedSource::pending_forever();
    let session = TrackingSession::new(source.clone(), fast());

    session.set_swap_id(Some("abc".to_string()));
    tokio::time::sleep(Duration::from_millis(150)).await;
    session.stop_tracking();
    assert!(!session.state().is_loading);

    let calls = source.calls();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(source.calls(), calls);

    session.start_tracking();
    assert!(session.state().is_loading);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(source.calls(), calls + 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_swap_id_reports_error() {
    let session = TrackingSession::new(ScriptedSource::pending_forever(), fast());

    session.set_swap_id(Some(String::new()));

    let state = session.state();
    assert_eq!(state.error, Some(TrackerError::InvalidSwapId));
    assert!(!state.is_loading);
    assert!(session.progress().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_drop_stops_tracker() {
    let source = ScriptedSource::pending_forever();
    let session = TrackingSession::new(source.clone(), fast());

    session.set_swap_id(Some("abc".to_string()));
    tokio::time::sleep(Duration::from_millis(150)).await;
    drop(session);

    let calls = source.calls();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(source.calls(), calls);
}

#[tokio::test(start_paused = true)]
async fn test_observer_callbacks_pass_through() {
    let completes = Arc::new(AtomicUsize::new(0));
    let updates = Arc::new(AtomicUsize::new(0));
    let options = fast()
        .on_status_update({
            let updates = Arc::clone(&updates);
            move |_| {
                updates.fetch_add(1, Ordering::SeqCst);
            }
        })
        .on_complete({
            let completes = Arc::clone(&completes);
            move |_| {
                completes.fetch_add(1, Ordering::SeqCst);
            }
        });

    let source = ScriptedSource::new(vec![Step::Status("PENDING"), Step::Status("COMPLETED")]);
    let session = TrackingSession::new(source, options);
    let mut rx = session.subscribe();

    session.set_swap_id(Some("abc".to_string()));
    settled(&mut rx).await;

    assert_eq!(updates.load(Ordering::SeqCst), 2);
    assert_eq!(completes.load(Ordering::SeqCst), 1);
}

// region:    --- Bridge guard

fn bridge_fixture(observer: &TrackerOptions) -> (TrackerOptions, Arc<AtomicU64>, watch::Receiver<TrackingState>) {
    let current = Arc::new(AtomicU64::new(1));
    let (state, rx) = watch::channel(TrackingState::default());
    let options = bridge_options(
        observer,
        BridgeContext {
            swap_id: "abc".to_string(),
            epoch: 1,
            current: Arc::clone(&current),
            state: Arc::new(state),
            metrics: None,
        },
    );
    (options, current, rx)
}

#[test]
fn test_terminal_callback_delivered_once() {
    let completes = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(AtomicUsize::new(0));
    let observer = TrackerOptions::default()
        .on_complete({
            let completes = Arc::clone(&completes);
            move |_| {
                completes.fetch_add(1, Ordering::SeqCst);
            }
        })
        .on_error({
            let errors = Arc::clone(&errors);
            move |_| {
                errors.fetch_add(1, Ordering::SeqCst);
            }
        });
    let (options, _current, rx) = bridge_fixture(&observer);

    let done = snapshot("abc", "COMPLETED");
    let on_complete = options.on_complete.unwrap();
    on_complete(&done);
    on_complete(&done);
    options.on_error.unwrap()(&TrackerError::Failed { swap_id: "abc".to_string() });

    assert_eq!(completes.load(Ordering::SeqCst), 1);
    assert_eq!(errors.load(Ordering::SeqCst), 0);
    assert_eq!(rx.borrow().error, None);
}

#[test]
fn test_superseded_instance_is_ignored() {
    let (options, current, rx) = bridge_fixture(&TrackerOptions::default());

    current.store(2, Ordering::SeqCst);
    options.on_status_update.unwrap()(&snapshot("abc", "PENDING"));
    options.on_error.unwrap()(&TrackerError::Refunded { swap_id: "abc".to_string() });

    assert_eq!(*rx.borrow(), TrackingState::default());
}

// endregion: --- Bridge guard

// region:    --- Concurrency and metrics

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_switches_leave_one_tracker() {
    let source = ScriptedSource::pending_forever();
    let options = TrackerOptions::default().poll_interval(Duration::from_millis(20));
    let session = Arc::new(TrackingSession::new(source.clone(), options));
    let ids: Vec<String> = (0..8).map(|i| format!("swap-{}", i)).collect();
    let handle = tokio::runtime::Handle::current();

    std::thread::scope(|scope| {
        for id in &ids {
            let session = Arc::clone(&session);
            let handle = handle.clone();
            scope.spawn(move || {
                let _runtime = handle.enter();
                session.set_swap_id(Some(id.clone()));
            });
        }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    let live = session.state().swap_id.unwrap();
    let before: Vec<usize> = ids.iter().map(|id| source.calls_for(id)).collect();

    tokio::time::sleep(Duration::from_millis(200)).await;
    for (id, calls) in ids.iter().zip(before) {
        if *id == live {
            assert!(source.calls_for(id) > calls, "{} should still be polled", id);
        } else {
            assert_eq!(source.calls_for(id), calls, "{} should be stopped", id);
        }
    }
}

async fn spawn_metrics_backend() -> (String, tokio::sync::mpsc::UnboundedReceiver<serde_json::Value>) {
    use axum::{routing::post, Json, Router};

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let app = Router::new().route(
        "/metrics/swaps",
        post(move |Json(body): Json<serde_json::Value>| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(body);
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), rx)
}

#[tokio::test]
async fn test_metrics_recorded_once_per_outcome() {
    let (base, mut posted) = spawn_metrics_backend().await;
    let source = ScriptedSource::with_latency(vec![Step::Status("COMPLETED")], Duration::from_millis(50));
    let session = TrackingSession::new(source.clone(), TrackerOptions::default().poll_interval(Duration::from_millis(10)))
        .with_metrics(MetricsClient::new(&base));
    let mut rx = session.subscribe();

    // "old" is superseded while its first fetch is in flight
    session.set_swap_id(Some("old".to_string()));
    tokio::time::sleep(Duration::from_millis(10)).await;
    session.set_swap_id(Some("abc".to_string()));
    settled(&mut rx).await;

    let first = tokio::time::timeout(Duration::from_secs(5), posted.recv()).await.unwrap().unwrap();
    assert_eq!(first["swapId"], "abc");
    assert_eq!(first["outcome"], "COMPLETED");

    session.set_swap_id(Some("xyz".to_string()));
    rx.wait_for(|s| s.swap_id.as_deref() == Some("xyz") && !s.is_loading).await.unwrap();

    let second = tokio::time::timeout(Duration::from_secs(5), posted.recv()).await.unwrap().unwrap();
    assert_eq!(second["swapId"], "xyz");

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(posted.try_recv().is_err());
    assert_eq!(source.calls_for("old"), 1);
}

// endregion: --- Concurrency and metrics
