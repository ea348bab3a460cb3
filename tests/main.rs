use std::fs::{self, File};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use dirwatch::{Event, EventMask, InitError, ReadMode, WatchMask, Watcher};

fn collector() -> (
    Arc<Mutex<Vec<Event>>>,
    impl Fn(Event) + Send + Sync + 'static,
) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    (seen, move |event| sink.lock().unwrap().push(event))
}

fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);

    while !condition() {
        assert!(Instant::now() < deadline, "Timed out waiting for events");
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn it_should_dispatch_created_files_in_order() {
    let dir = TempDir::new().unwrap();
    let (seen, callback) = collector();
    let mut watcher = Watcher::new(dir.path(), callback).unwrap();

    File::create(dir.path().join("first")).unwrap();
    File::create(dir.path().join("second")).unwrap();

    let dispatched = watcher.listen().unwrap();

    assert_eq!(2, dispatched);

    let seen = seen.lock().unwrap();
    assert_eq!("first", seen[0].file);
    assert!(seen[0].mask.contains(EventMask::CREATE));
    assert_eq!(dir.path(), seen[0].path);
    assert_eq!("second", seen[1].file);
}

#[test]
fn it_should_classify_events_by_kind() {
    let dir = TempDir::new().unwrap();
    let mut file = File::create(dir.path().join("subject")).unwrap();

    let (seen, callback) = collector();
    let mut watcher = Watcher::new(dir.path(), callback).unwrap();

    write!(file, "This should trigger a modify event.").unwrap();
    file.sync_all().unwrap();
    fs::remove_file(dir.path().join("subject")).unwrap();

    // Both events are queued by now; one read returns them all.
    watcher.listen().unwrap();

    let seen = seen.lock().unwrap();
    let kinds: Vec<_> = seen.iter().map(Event::kind_name).collect();
    assert!(kinds.contains(&"MODIFY"), "kinds: {kinds:?}");
    assert!(kinds.contains(&"DELETE"), "kinds: {kinds:?}");
}

#[test]
fn it_should_strip_trailing_slashes_from_the_reported_path() {
    let dir = TempDir::new().unwrap();
    let slashed = format!("{}///", dir.path().display());

    let (seen, callback) = collector();
    let mut watcher = Watcher::new(&slashed, callback).unwrap();

    assert_eq!(dir.path(), watcher.path());

    File::create(dir.path().join("created")).unwrap();
    watcher.listen().unwrap();

    assert_eq!(dir.path(), seen.lock().unwrap()[0].path);
}

#[test]
fn it_should_return_immediately_when_nothing_is_pending() {
    let dir = TempDir::new().unwrap();
    let mut watcher =
        Watcher::with_options(dir.path(), WatchMask::DEFAULT, ReadMode::NonBlocking, |_| {})
            .unwrap();

    assert_eq!(0, watcher.listen().unwrap());
}

#[test]
fn it_should_fail_to_watch_a_missing_path() {
    let result = Watcher::new("/dirwatch-test/no/such/path", |_| {});

    match result {
        Err(InitError::AddWatch(err)) => {
            assert_eq!(std::io::ErrorKind::NotFound, err.kind());
        }
        other => panic!("Expected AddWatch error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn it_should_dispatch_from_the_background_listener() {
    let dir = TempDir::new().unwrap();
    let (seen, callback) = collector();
    let mut watcher =
        Watcher::with_options(dir.path(), WatchMask::DEFAULT, ReadMode::NonBlocking, callback)
            .unwrap();

    watcher.listen_async().unwrap();

    File::create(dir.path().join("created-in-background")).unwrap();
    wait_until(|| !seen.lock().unwrap().is_empty());

    watcher.stop();

    let seen = seen.lock().unwrap();
    assert_eq!("created-in-background", seen[0].file);
}

#[test]
fn it_should_not_dispatch_after_stop_returns() {
    let dir = TempDir::new().unwrap();
    let (seen, callback) = collector();
    let mut watcher =
        Watcher::with_options(dir.path(), WatchMask::DEFAULT, ReadMode::NonBlocking, callback)
            .unwrap();

    watcher.listen_async().unwrap();

    File::create(dir.path().join("before-stop")).unwrap();
    wait_until(|| !seen.lock().unwrap().is_empty());

    watcher.stop();
    let dispatched_at_stop = seen.lock().unwrap().len();

    // The listener is joined; events queued from here on go unread.
    File::create(dir.path().join("after-stop")).unwrap();
    thread::sleep(Duration::from_millis(100));

    assert_eq!(dispatched_at_stop, seen.lock().unwrap().len());
}

#[test]
fn it_should_drop_cleanly_without_a_background_listener() {
    let dir = TempDir::new().unwrap();
    let watcher = Watcher::new(dir.path(), |_| {}).unwrap();

    // Never started a listener; drop has no thread to join.
    drop(watcher);
}

#[test]
fn it_should_drop_cleanly_with_a_background_listener() {
    let dir = TempDir::new().unwrap();
    let (_seen, callback) = collector();
    let mut watcher =
        Watcher::with_options(dir.path(), WatchMask::DEFAULT, ReadMode::NonBlocking, callback)
            .unwrap();

    watcher.listen_async().unwrap();
    drop(watcher);
}
