use std::collections::HashSet;
use std::fs;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use httpmock::prelude::*;
use pathferret::{
    checkpoint::{Checkpoint, ProgressStore, ProgressTracker},
    requester::{Outcome, Requester},
    results::ResultSink,
    scanner::{Scanner, UrlTemplate},
    statistics::ScanSummary,
    wordlist::{transform, CaseMode},
};
use tempfile::{tempdir, TempDir};
use tokio::task::JoinHandle;

/// knobs for a single scan against a test server
struct ScanSetup<'a> {
    template: String,
    words: &'a [&'a str],
    suffixes: &'a [&'a str],
    case: CaseMode,
    resume: bool,
    checkpoint: Checkpoint,
    requester: Requester,
}

impl<'a> ScanSetup<'a> {
    fn new(template: String, words: &'a [&'a str]) -> Self {
        Self {
            template,
            words,
            suffixes: &[],
            case: CaseMode::None,
            resume: false,
            checkpoint: Checkpoint::Completion,
            requester: Requester::new(reqwest::Client::new(), &[200]),
        }
    }
}

/// paths used by every scan in a test
struct Workspace {
    _dir: TempDir,
    output: PathBuf,
    progress: PathBuf,
}

fn workspace() -> Workspace {
    let dir = tempdir().unwrap();
    let output = dir.path().join("results").join("output.txt");
    let progress = dir.path().join("scan_progress.txt");

    Workspace {
        _dir: dir,
        output,
        progress,
    }
}

/// run a full scan the same way the binary does, minus the terminal
async fn scan(workspace: &Workspace, setup: ScanSetup<'_>) -> ScanSummary {
    let template = UrlTemplate::new(&setup.template, "FUZZ").unwrap();
    let store = ProgressStore::new(&workspace.progress);

    let completed = if setup.resume {
        store.load().unwrap()
    } else {
        HashSet::new()
    };

    let suffixes: Vec<String> = setup.suffixes.iter().map(|s| s.to_string()).collect();
    let candidates = transform(setup.words, &suffixes, setup.case, &completed);

    let sink = Arc::new(ResultSink::new(&workspace.output).with_notifications(false));
    let tracker = Arc::new(ProgressTracker::new(store, setup.checkpoint, completed));

    Scanner::new(template, setup.requester, sink, tracker)
        .concurrency(4)
        .run(candidates)
        .await
        .unwrap()
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

fn progress_words(path: &Path) -> HashSet<String> {
    read_lines(path).into_iter().collect()
}

#[tokio::test]
/// only urls answering with a match code land in the output file
async fn scanner_records_only_matches() {
    let server = MockServer::start_async().await;

    let admin = server
        .mock_async(|when, then| {
            when.method(GET).path("/admin");
            then.status(200).body("welcome");
        })
        .await;

    let login = server
        .mock_async(|when, then| {
            when.method(GET).path("/login");
            then.status(404);
        })
        .await;

    let ws = workspace();
    let summary = scan(&ws, ScanSetup::new(server.url("/FUZZ"), &["admin", "login"])).await;

    admin.assert_hits_async(1).await;
    login.assert_hits_async(1).await;

    assert_eq!(
        read_lines(&ws.output),
        vec![format!("[200] {}", server.url("/admin"))]
    );

    assert_eq!(summary.dispatched, 2);
    assert_eq!(summary.requests, 2);
    assert_eq!(summary.matches, 1);
    assert_eq!(summary.exhausted, 0);

    let expected: HashSet<String> = ["admin", "login"].iter().map(|s| s.to_string()).collect();
    assert_eq!(progress_words(&ws.progress), expected);
}

#[tokio::test]
/// with suffixes configured, the bare word is never requested
async fn scanner_requests_suffixed_candidates_only() {
    let server = MockServer::start_async().await;

    let admin_php = server
        .mock_async(|when, then| {
            when.method(GET).path("/admin.php");
            then.status(200);
        })
        .await;

    let login_php = server
        .mock_async(|when, then| {
            when.method(GET).path("/login.php");
            then.status(404);
        })
        .await;

    let bare_admin = server
        .mock_async(|when, then| {
            when.method(GET).path("/admin");
            then.status(200);
        })
        .await;

    let bare_login = server
        .mock_async(|when, then| {
            when.method(GET).path("/login");
            then.status(200);
        })
        .await;

    let ws = workspace();
    let mut setup = ScanSetup::new(server.url("/FUZZ"), &["admin", "login"]);
    setup.suffixes = &[".php"];

    scan(&ws, setup).await;

    admin_php.assert_hits_async(1).await;
    login_php.assert_hits_async(1).await;
    bare_admin.assert_hits_async(0).await;
    bare_login.assert_hits_async(0).await;

    assert_eq!(
        read_lines(&ws.output),
        vec![format!("[200] {}", server.url("/admin.php"))]
    );

    // progress is tracked against the raw word, not the suffixed candidate
    let expected: HashSet<String> = ["admin", "login"].iter().map(|s| s.to_string()).collect();
    assert_eq!(progress_words(&ws.progress), expected);
}

#[tokio::test]
/// words already in the progress file are skipped on resume
async fn scanner_resume_skips_completed_words() {
    let server = MockServer::start_async().await;

    let admin = server
        .mock_async(|when, then| {
            when.method(GET).path("/admin");
            then.status(200);
        })
        .await;

    let login = server
        .mock_async(|when, then| {
            when.method(GET).path("/login");
            then.status(200);
        })
        .await;

    let ws = workspace();
    fs::write(&ws.progress, "admin\n").unwrap();

    let mut setup = ScanSetup::new(server.url("/FUZZ"), &["admin", "login"]);
    setup.resume = true;

    let summary = scan(&ws, setup).await;

    admin.assert_hits_async(0).await;
    login.assert_hits_async(1).await;
    assert_eq!(summary.dispatched, 1);

    assert_eq!(
        read_lines(&ws.output),
        vec![format!("[200] {}", server.url("/login"))]
    );

    let expected: HashSet<String> = ["admin", "login"].iter().map(|s| s.to_string()).collect();
    assert_eq!(progress_words(&ws.progress), expected);
}

#[tokio::test]
/// resuming a finished scan sends nothing
async fn scanner_resume_after_full_run_is_a_noop() {
    let server = MockServer::start_async().await;

    let admin = server
        .mock_async(|when, then| {
            when.method(GET).path("/admin");
            then.status(200);
        })
        .await;

    let ws = workspace();
    let words = ["admin", "login", "backup"];

    let first = scan(&ws, ScanSetup::new(server.url("/FUZZ"), &words)).await;
    assert_eq!(first.dispatched, 3);

    let mut setup = ScanSetup::new(server.url("/FUZZ"), &words);
    setup.resume = true;

    let second = scan(&ws, setup).await;

    assert_eq!(second, ScanSummary::default());
    admin.assert_hits_async(1).await;
    assert_eq!(progress_words(&ws.progress).len(), 3);
}

#[tokio::test]
/// the dispatch checkpoint records every submitted word as well
async fn scanner_dispatch_checkpoint_records_words() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/admin");
            then.status(403);
        })
        .await;

    let ws = workspace();
    let mut setup = ScanSetup::new(server.url("/FUZZ"), &["admin", "static", "images"]);
    setup.checkpoint = Checkpoint::Dispatch;
    setup.requester = Requester::new(reqwest::Client::new(), &[403]);

    scan(&ws, setup).await;

    let expected: HashSet<String> = ["admin", "static", "images"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(progress_words(&ws.progress), expected);

    assert_eq!(
        read_lines(&ws.output),
        vec![format!("[403] {}", server.url("/admin"))]
    );
}

#[tokio::test]
/// case is applied to the requested value while progress keeps the word as written
async fn scanner_applies_case_mode() {
    let server = MockServer::start_async().await;

    let lowered = server
        .mock_async(|when, then| {
            when.method(GET).path("/admin");
            then.status(200);
        })
        .await;

    let ws = workspace();
    let mut setup = ScanSetup::new(server.url("/FUZZ"), &["AdMiN"]);
    setup.case = CaseMode::Lowercase;

    scan(&ws, setup).await;

    lowered.assert_hits_async(1).await;

    let expected: HashSet<String> = ["AdMiN".to_string()].into_iter().collect();
    assert_eq!(progress_words(&ws.progress), expected);
}

/// a server that accepts connections and never answers, returning its port and the number of
/// connections accepted so far
fn silent_server() -> (u16, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();

    thread::spawn(move || {
        let mut held = Vec::new();

        for stream in listener.incoming().flatten() {
            counter.fetch_add(1, Ordering::SeqCst);
            held.push(stream);
        }
    });

    (port, accepted)
}

#[tokio::test]
/// a url that never answers is attempted exactly `retries` times and then given up on
async fn requester_gives_up_after_retries() {
    let (port, accepted) = silent_server();

    let requester = Requester::new(reqwest::Client::new(), &[200])
        .timeout(Duration::from_millis(250))
        .retries(3);

    let outcome = requester
        .execute(&format!("http://127.0.0.1:{port}/slow"))
        .await;

    assert_eq!(outcome, Outcome::Exhausted { attempts: 3 });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(accepted.load(Ordering::SeqCst), 3);
}

#[tokio::test]
/// exhausted candidates produce no output but still count as attempted
async fn scanner_unresponsive_target() {
    let (port, accepted) = silent_server();

    let ws = workspace();
    let mut setup = ScanSetup::new(format!("http://127.0.0.1:{port}/FUZZ"), &["ghost"]);
    setup.requester = Requester::new(reqwest::Client::new(), &[200])
        .timeout(Duration::from_millis(200))
        .retries(2);

    let summary = scan(&ws, setup).await;

    assert_eq!(summary.dispatched, 1);
    assert_eq!(summary.requests, 2);
    assert_eq!(summary.matches, 0);
    assert_eq!(summary.exhausted, 1);

    // one connection per attempt actually reached the target
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(accepted.load(Ordering::SeqCst), 2);

    assert!(!ws.output.exists());

    let expected: HashSet<String> = ["ghost".to_string()].into_iter().collect();
    assert_eq!(progress_words(&ws.progress), expected);
}

/// poll `condition` every 50ms, failing the test after 5 seconds
async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    panic!("condition not met within 5 seconds");
}

/// start scanning a single word against a target that never answers, without waiting on it
fn start_pending_scan(ws: &Workspace, port: u16, checkpoint: Checkpoint) -> JoinHandle<ScanSummary> {
    let template = UrlTemplate::new(&format!("http://127.0.0.1:{port}/FUZZ"), "FUZZ").unwrap();
    let candidates = transform(&["pending"], &[], CaseMode::None, &HashSet::new());

    let sink = Arc::new(ResultSink::new(&ws.output).with_notifications(false));
    let store = ProgressStore::new(&ws.progress);
    let tracker = Arc::new(ProgressTracker::new(store, checkpoint, HashSet::new()));

    let requester = Requester::new(reqwest::Client::new(), &[200])
        .timeout(Duration::from_secs(30))
        .retries(1);

    let scanner = Scanner::new(template, requester, sink, tracker);

    tokio::spawn(async move { scanner.run(candidates).await.unwrap() })
}

#[tokio::test]
/// under the dispatch checkpoint a word is persisted while its request is still in flight
async fn scanner_dispatch_checkpoint_persists_before_response() {
    let (port, accepted) = silent_server();
    let ws = workspace();

    let scan = start_pending_scan(&ws, port, Checkpoint::Dispatch);

    let progress = ws.progress.clone();
    wait_until(|| accepted.load(Ordering::SeqCst) == 1 && progress.exists()).await;

    let expected: HashSet<String> = ["pending".to_string()].into_iter().collect();
    assert_eq!(progress_words(&ws.progress), expected);

    // the only request is still waiting on the target
    assert!(!scan.is_finished());
    scan.abort();
}

#[tokio::test]
/// under the completion checkpoint nothing is persisted until the request returns
async fn scanner_completion_checkpoint_waits_for_response() {
    let (port, accepted) = silent_server();
    let ws = workspace();

    let scan = start_pending_scan(&ws, port, Checkpoint::Completion);

    wait_until(|| accepted.load(Ordering::SeqCst) == 1).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(!scan.is_finished());
    assert!(!ws.progress.exists());
    scan.abort();
}
