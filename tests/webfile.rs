//! Integration tests for the download coordinator
//!
//! These tests drive the public API against a local HTTP server, with the
//! test body acting as the host's main context.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::runtime::Handle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use webfile::app::{ManualScheduler, PollConfig, ReqwestFetcher, WebFile};

type Results = Arc<Mutex<Vec<bool>>>;

fn create_coordinator() -> (Arc<WebFile>, Arc<ManualScheduler>) {
    let scheduler = Arc::new(ManualScheduler::new());
    let webfile = WebFile::new(
        Handle::current(),
        scheduler.clone(),
        Arc::new(ReqwestFetcher::default()),
        PollConfig::default(),
    );
    (webfile, scheduler)
}

fn record(results: &Results) -> impl FnOnce(bool) + Send + 'static {
    let results = Arc::clone(results);
    move |ok| results.lock().push(ok)
}

/// Tick like a host would until `expected` callbacks have fired
async fn tick_until_delivered(webfile: &WebFile, results: &Results, expected: usize) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while results.lock().len() < expected {
        assert!(
            Instant::now() < deadline,
            "only {} of {} callbacks delivered",
            results.lock().len(),
            expected
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
        webfile.tick(Duration::from_millis(10));
    }
}

async fn serve(server: &MockServer, route: &str, body: &[u8], delay: Duration, hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body.to_vec())
                .set_delay(delay),
        )
        .expect(hits)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_destination_is_fetched_once() {
    let server = MockServer::start().await;
    serve(&server, "/a.bin", b"asset bytes", Duration::from_millis(300), 1).await;

    let temp_dir = TempDir::new().unwrap();
    let dest = temp_dir.path().join("a.bin");
    let url = format!("{}/a.bin", server.uri());
    let (webfile, _scheduler) = create_coordinator();
    let results: Results = Arc::new(Mutex::new(Vec::new()));

    webfile.get(&url, &dest, record(&results));
    webfile.get(&url, &dest, record(&results));
    webfile.get(&url, &dest, record(&results));

    assert!(results.lock().is_empty());
    assert_eq!(webfile.in_flight(), 1);

    tick_until_delivered(&webfile, &results, 3).await;

    assert_eq!(*results.lock(), vec![true, true, true]);
    assert_eq!(std::fs::read(&dest).unwrap(), b"asset bytes");
    assert_eq!(webfile.pending_operations(), 0);
    assert_eq!(webfile.in_flight(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_existing_destination_skips_network() {
    let server = MockServer::start().await;
    serve(&server, "/a.bin", b"fresh", Duration::ZERO, 0).await;

    let temp_dir = TempDir::new().unwrap();
    let dest = temp_dir.path().join("a.bin");
    std::fs::write(&dest, b"already here").unwrap();

    let (webfile, scheduler) = create_coordinator();
    let results: Results = Arc::new(Mutex::new(Vec::new()));

    webfile.get(&format!("{}/a.bin", server.uri()), &dest, record(&results));

    assert_eq!(*results.lock(), vec![true]);
    assert!(!scheduler.is_active());
    assert_eq!(webfile.pending_operations(), 0);
    assert_eq!(std::fs::read(&dest).unwrap(), b"already here");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_http_error_fails_every_waiter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let dest = temp_dir.path().join("missing.bin");
    let url = format!("{}/missing.bin", server.uri());
    let (webfile, _scheduler) = create_coordinator();
    let results: Results = Arc::new(Mutex::new(Vec::new()));

    webfile.get(&url, &dest, record(&results));
    webfile.get(&url, &dest, record(&results));
    tick_until_delivered(&webfile, &results, 2).await;

    assert_eq!(*results.lock(), vec![false, false]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_unreachable_directory_fails() {
    let temp_dir = TempDir::new().unwrap();
    let dest = temp_dir.path().join("absent").join("a.bin");
    let (webfile, _scheduler) = create_coordinator();
    let results: Results = Arc::new(Mutex::new(Vec::new()));

    webfile.get("http://127.0.0.1:9/a.bin", &dest, record(&results));
    tick_until_delivered(&webfile, &results, 1).await;

    assert_eq!(*results.lock(), vec![false]);
    assert!(!webfile.is_downloading(&dest));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_completed_destination_can_be_fetched_again() {
    let server = MockServer::start().await;
    serve(&server, "/a.bin", b"v", Duration::ZERO, 2).await;

    let temp_dir = TempDir::new().unwrap();
    let dest = temp_dir.path().join("a.bin");
    let url = format!("{}/a.bin", server.uri());
    let (webfile, _scheduler) = create_coordinator();
    let results: Results = Arc::new(Mutex::new(Vec::new()));

    webfile.get(&url, &dest, record(&results));
    tick_until_delivered(&webfile, &results, 1).await;

    std::fs::remove_file(&dest).unwrap();
    webfile.get(&url, &dest, record(&results));
    assert!(webfile.is_downloading(&dest));
    tick_until_delivered(&webfile, &results, 2).await;

    assert_eq!(*results.lock(), vec![true, true]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_destinations_run_concurrently() {
    let server = MockServer::start().await;
    for i in 0..10 {
        serve(
            &server,
            &format!("/file_{}.bin", i),
            format!("body {}", i).as_bytes(),
            Duration::from_millis(100),
            1,
        )
        .await;
    }

    let temp_dir = TempDir::new().unwrap();
    let (webfile, _scheduler) = create_coordinator();
    let results: Results = Arc::new(Mutex::new(Vec::new()));

    for i in 0..10 {
        webfile.get(
            &format!("{}/file_{}.bin", server.uri(), i),
            temp_dir.path().join(format!("file_{}.bin", i)),
            record(&results),
        );
    }
    assert_eq!(webfile.in_flight(), 10);

    tick_until_delivered(&webfile, &results, 10).await;

    assert!(results.lock().iter().all(|ok| *ok));
    for i in 0..10 {
        let content = std::fs::read(temp_dir.path().join(format!("file_{}.bin", i))).unwrap();
        assert_eq!(content, format!("body {}", i).as_bytes());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_clear_storage_is_delivered_by_tick() {
    let (webfile, scheduler) = create_coordinator();
    let results: Results = Arc::new(Mutex::new(Vec::new()));

    webfile.clear_storage(record(&results));
    assert!(results.lock().is_empty());
    assert!(scheduler.is_active());

    tick_until_delivered(&webfile, &results, 1).await;
    assert_eq!(*results.lock(), vec![true]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_callbacks_run_on_main_context_only() {
    let server = MockServer::start().await;
    serve(&server, "/a.bin", b"x", Duration::from_millis(50), 1).await;

    let temp_dir = TempDir::new().unwrap();
    let dest = temp_dir.path().join("a.bin");
    let (webfile, _scheduler) = create_coordinator();
    let main_thread = std::thread::current().id();
    let threads = Arc::new(Mutex::new(Vec::new()));
    let results: Results = Arc::new(Mutex::new(Vec::new()));

    for _ in 0..3 {
        let threads = Arc::clone(&threads);
        let results = Arc::clone(&results);
        webfile.get(&format!("{}/a.bin", server.uri()), &dest, move |ok| {
            threads.lock().push(std::thread::current().id());
            results.lock().push(ok);
        });
    }
    tick_until_delivered(&webfile, &results, 3).await;

    assert!(threads.lock().iter().all(|id| *id == main_thread));
    assert!(Path::new(&dest).exists());
}
