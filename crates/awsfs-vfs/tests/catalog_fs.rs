//! End-to-end tests through the host-facing surface.
//!
//! A fake catalog stands in for real providers: an `iam` family with users
//! that link to their groups, and an `ec2` family whose instance listing is
//! cached and counted. Every call goes `Operations` → `Dispatcher` →
//! `CatalogFs` → nodes, with logs captured in memory.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use awsfs_telemetry::{CaptureWriter, Telemetry};
use awsfs_vfs::{
    CatalogFs, Clock, CrashHandler, Dispatcher, Errno, ManualClock, Node, Operations, Provider,
    ProviderError, RootBuilder, Ttl,
};
use parking_lot::Mutex;
use serde_json::json;

// ============================================================================
// Fake catalog
// ============================================================================

struct Iam;

impl Provider for Iam {
    fn mount_name(&self) -> &str {
        "iam"
    }

    fn root(&self, _cache_ttl: Ttl) -> Node {
        let alice = Node::static_dir([
            (
                "info",
                Node::json_file(&json!({"UserName": "alice", "UserId": "AIDA1"})).unwrap(),
            ),
            ("groups", Node::static_dir([("admins", Node::symlink("../../../groups/admins"))])),
        ]);
        Node::static_dir([
            ("users", Node::static_dir([("alice", alice)])),
            (
                "groups",
                Node::static_dir([("admins", Node::static_dir([("info", Node::static_file("{}\n"))]))]),
            ),
        ])
    }
}

struct Ec2 {
    clock: Arc<ManualClock>,
    listings: Arc<AtomicUsize>,
    failure: Arc<Mutex<Option<fn() -> ProviderError>>>,
}

impl Provider for Ec2 {
    fn mount_name(&self) -> &str {
        "ec2"
    }

    fn root(&self, cache_ttl: Ttl) -> Node {
        let listings = Arc::clone(&self.listings);
        let failure = Arc::clone(&self.failure);
        let clock: Arc<dyn Clock> = self.clock.clone();
        let instances = Node::cached_dir_with_clock(cache_ttl, clock, move || {
            if let Some(make) = *failure.lock() {
                return Err(make());
            }
            listings.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                ("i-0a1".to_string(), Node::static_file("running\n")),
                ("i-0b2".to_string(), Node::static_file("stopped\n")),
            ])
        });

        let console = Node::lazy_file(|| Ok(b"hello".to_vec()));
        let broken = Node::lazy_file(|| -> Result<Vec<u8>, ProviderError> {
            panic!("attempt to divide by zero")
        });

        Node::static_dir([
            ("instances", instances),
            ("console", console),
            ("broken", broken),
        ])
    }
}

#[derive(Clone, Default)]
struct RecordCrash {
    crashed: Arc<Mutex<Vec<String>>>,
}

impl CrashHandler for RecordCrash {
    fn crash(&self, op: &str) -> ! {
        self.crashed.lock().push(op.to_string());
        panic!("crashed in {op}");
    }
}

struct Harness {
    ops: Operations,
    clock: Arc<ManualClock>,
    listings: Arc<AtomicUsize>,
    failure: Arc<Mutex<Option<fn() -> ProviderError>>>,
    capture: CaptureWriter,
    crash: RecordCrash,
}

fn harness() -> Harness {
    let clock = Arc::new(ManualClock::new());
    let listings = Arc::new(AtomicUsize::new(0));
    let failure = Arc::new(Mutex::new(None));
    let ec2 = Ec2 {
        clock: Arc::clone(&clock),
        listings: Arc::clone(&listings),
        failure: Arc::clone(&failure),
    };

    let root = RootBuilder::new()
        .cache_ttl(Ttl::seconds(60))
        .provider(&Iam)
        .provider(&ec2)
        .mount("motd", Node::static_file("hello"))
        .build();

    let capture = CaptureWriter::new();
    let telemetry = Telemetry::from_writer(capture.clone(), "debug").unwrap();
    let crash = RecordCrash::default();
    let dispatcher = Dispatcher::new(Arc::new(telemetry)).with_crash_handler(crash.clone());

    Harness {
        ops: Operations::new(CatalogFs::new(root), dispatcher),
        clock,
        listings,
        failure,
        capture,
        crash,
    }
}

// ============================================================================
// Reading
// ============================================================================

#[test]
fn read_returns_empty_past_end() {
    let h = harness();
    assert!(h.ops.read("/motd", 10, 0).unwrap().is_empty());
    assert_eq!(h.ops.read("/motd", 3, 0).unwrap(), b"hel");
    assert_eq!(h.ops.read("/motd", 3, 2).unwrap(), b"llo");
}

#[test]
fn lazy_file_reads_through() {
    let h = harness();
    assert_eq!(h.ops.getattr("/ec2/console").unwrap().size, 5);
    assert_eq!(h.ops.read("/ec2/console", 5, 0).unwrap(), b"hello");
}

#[test]
fn readdir_lists_in_mount_order() {
    let h = harness();
    assert_eq!(h.ops.readdir("/").unwrap(), ["iam", "ec2", "motd"]);
    assert_eq!(h.ops.readdir("/iam/users/").unwrap(), ["alice"]);
    assert_eq!(h.ops.readdir("/motd").unwrap_err(), Errno::NotADirectory);
}

#[test]
fn info_files_are_canonical_json() {
    let h = harness();
    let size = h.ops.getattr("/iam/users/alice/info").unwrap().size;
    let info = h.ops.read("/iam/users/alice/info", size as u32, 0).unwrap();
    assert_eq!(
        String::from_utf8(info).unwrap(),
        "{\n    \"UserId\": \"AIDA1\",\n    \"UserName\": \"alice\"\n}\n"
    );
}

#[test]
fn symlinks() {
    let h = harness();
    let attr = h.ops.getattr("/iam/users/alice/groups/admins").unwrap();
    assert!(attr.is_symlink());
    assert_eq!(attr.perm, 0o777);
    assert_eq!(
        h.ops.readlink("/iam/users/alice/groups/admins").unwrap(),
        "../../../groups/admins"
    );
    assert_eq!(h.ops.readlink("/motd").unwrap_err(), Errno::InvalidArgument);
    assert_eq!(h.ops.readlink("/iam").unwrap_err(), Errno::InvalidArgument);
}

#[test]
fn missing_paths() {
    let h = harness();
    assert_eq!(h.ops.getattr("/iam/roles").unwrap_err(), Errno::NoEntry);
    assert_eq!(h.ops.getattr("/motd/x").unwrap_err(), Errno::NotADirectory);
    assert_eq!(h.ops.getattr("motd").unwrap_err(), Errno::InvalidArgument);
    assert_eq!(h.ops.open("/iam", 0).unwrap_err(), Errno::IsADirectory);
    assert_eq!(h.ops.read("/iam", 1, 0).unwrap_err(), Errno::IsADirectory);
}

// ============================================================================
// Caching
// ============================================================================

#[test]
fn cached_listing_reloads_after_ttl() {
    let h = harness();
    assert_eq!(h.ops.readdir("/ec2/instances").unwrap(), ["i-0a1", "i-0b2"]);
    assert_eq!(h.listings.load(Ordering::SeqCst), 1);

    h.ops.getattr("/ec2/instances/i-0a1").unwrap();
    assert_eq!(h.listings.load(Ordering::SeqCst), 1);

    h.clock.advance(Duration::from_secs(61));
    h.ops.readdir("/ec2/instances").unwrap();
    assert_eq!(h.listings.load(Ordering::SeqCst), 2);
}

#[test]
fn failed_listing_is_retried() {
    let h = harness();
    *h.failure.lock() = Some(|| ProviderError::NoCredentials);
    assert_eq!(h.ops.readdir("/ec2/instances").unwrap_err(), Errno::NoLink);

    *h.failure.lock() = None;
    assert_eq!(h.ops.readdir("/ec2/instances").unwrap().len(), 2);
    assert_eq!(h.listings.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Writing
// ============================================================================

#[test]
fn every_mutator_is_eperm() {
    let h = harness();
    let ops = &h.ops;
    let results = [
        ops.create("/motd2", 0o644).map(drop),
        ops.write("/motd", b"bye", 0).map(drop),
        ops.truncate("/motd", 0),
        ops.rename("/motd", "/motd.old"),
        ops.unlink("/motd"),
        ops.mkdir("/iam/roles", 0o755),
        ops.rmdir("/iam/groups"),
        ops.chmod("/motd", 0o777),
        ops.chown("/motd", 0, 0),
        ops.symlink("/link", "/motd"),
        ops.link("/motd", "/hard"),
        ops.setxattr("/motd", "user.tag", b"x", 0),
        ops.removexattr("/motd", "user.tag"),
        ops.utimens("/motd", None, None),
    ];
    for result in results {
        assert_eq!(result, Err(Errno::PermissionDenied));
    }
}

#[test]
fn metadata_stubs() {
    let h = harness();
    assert_eq!(h.ops.statfs("/").unwrap().blocks, 0);
    assert!(h.ops.getxattr("/nowhere", "user.tag").unwrap().is_empty());
    assert!(h.ops.listxattr("/nowhere").unwrap().is_empty());
}

// ============================================================================
// Classification and crash-only
// ============================================================================

#[test]
fn service_errors_are_classified() {
    let cases: [(fn() -> ProviderError, Errno); 4] = [
        (
            || ProviderError::service(
                "DescribeInstances",
                json!({"Error": {"Code": "AuthFailure", "HTTPStatusCode": 401}}),
            ),
            Errno::PermissionDenied,
        ),
        (
            || ProviderError::service("DescribeInstances", json!({"Error": {"HTTPStatusCode": 409}})),
            Errno::Stale,
        ),
        (
            || ProviderError::service("DescribeInstances", json!({"Error": {"HTTPStatusCode": 503}})),
            Errno::Io,
        ),
        (
            || ProviderError::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out")),
            Errno::Io,
        ),
    ];

    let h = harness();
    for (make, errno) in cases {
        *h.failure.lock() = Some(make);
        assert_eq!(h.ops.readdir("/ec2/instances").unwrap_err(), errno);
    }
    assert!(h.crash.crashed.lock().is_empty());
}

#[test]
fn unclassified_failure_crashes() {
    let h = harness();
    *h.failure.lock() = Some(|| ProviderError::Other(anyhow::anyhow!("attempt to divide by zero")));

    let result = panic::catch_unwind(AssertUnwindSafe(|| h.ops.readdir("/ec2/instances")));
    assert!(result.is_err());
    assert_eq!(*h.crash.crashed.lock(), ["readdir"]);
    assert_eq!(h.capture.lines_containing("fatal=true").len(), 1);
}

#[test]
fn panicking_supplier_crashes() {
    let h = harness();
    let result = panic::catch_unwind(AssertUnwindSafe(|| h.ops.read("/ec2/broken", 1, 0)));
    assert!(result.is_err());
    assert_eq!(*h.crash.crashed.lock(), ["read"]);
}

#[test]
fn operations_are_traced() {
    let h = harness();
    h.ops.getattr("/iam").unwrap();
    let lines = h.capture.lines_containing("getattr");
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("->"));
    assert!(lines[1].contains("<-"));
}
