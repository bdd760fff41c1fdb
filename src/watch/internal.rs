//! Internal implementation for watch module

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::build::{self, BuildReport};
use crate::bundler::Bundler;
use crate::project::Project;

/// Quiet period that ends a burst of change events
const DEBOUNCE: Duration = Duration::from_millis(150);

/// Directories under a project root whose changes never trigger a build
const IGNORED_DIRS: &[&str] = &["dist", "types", "node_modules", ".git"];

// =============================================================================
// Session
// =============================================================================

/// Result of waiting on a [`WatchSession`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wait {
    /// Relevant paths changed (debounced)
    Changed(Vec<PathBuf>),
    /// Nothing happened before the timeout
    Idle,
    /// The session was closed
    Closed,
}

/// Filesystem observation of one project root
pub struct WatchSession {
    root: PathBuf,
    watcher: Option<RecommendedWatcher>,
    rx: Receiver<notify::Result<Event>>,
}

impl WatchSession {
    /// Start observing `root` recursively
    pub fn open(root: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        debug!(root = %root.display(), "watch session opened");

        Ok(Self {
            root: root.to_path_buf(),
            watcher: Some(watcher),
            rx,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_open(&self) -> bool {
        self.watcher.is_some()
    }

    /// Stop observing and release the watch handles. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            let _ = watcher.unwatch(&self.root);
            debug!(root = %self.root.display(), "watch session closed");
        }
    }

    /// Wait up to `timeout` for relevant changes, then debounce the burst
    pub fn wait(&self, timeout: Duration) -> Wait {
        if !self.is_open() {
            return Wait::Closed;
        }

        let mut changed = match self.rx.recv_timeout(timeout) {
            Ok(res) => self.relevant_paths(res),
            Err(RecvTimeoutError::Timeout) => return Wait::Idle,
            Err(RecvTimeoutError::Disconnected) => return Wait::Closed,
        };

        loop {
            match self.rx.recv_timeout(DEBOUNCE) {
                Ok(res) => changed.extend(self.relevant_paths(res)),
                Err(_) => break,
            }
        }

        if changed.is_empty() {
            Wait::Idle
        } else {
            changed.sort();
            changed.dedup();
            Wait::Changed(changed)
        }
    }

    fn relevant_paths(&self, res: notify::Result<Event>) -> Vec<PathBuf> {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, "watch error");
                return Vec::new();
            }
        };

        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
            _ => return Vec::new(),
        }

        event
            .paths
            .into_iter()
            .filter(|path| !should_ignore_path(&self.root, path))
            .collect()
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Check if a changed path should be ignored
pub fn should_ignore_path(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);

    if let Some(Component::Normal(first)) = relative.components().next() {
        if IGNORED_DIRS.iter().any(|dir| first == *dir) {
            return true;
        }
    }

    if let Some(name) = path.file_name() {
        let name = name.to_string_lossy();
        if name.starts_with('.') || name.ends_with('~') || name.ends_with(".partial") {
            return true;
        }
    }

    false
}

/// Close every session; run once when a shutdown is requested
pub fn shutdown(sessions: &mut [&mut WatchSession]) {
    for session in sessions.iter_mut() {
        session.close();
    }
    info!(count = sessions.len(), "watch sessions closed");
}

// =============================================================================
// Signals
// =============================================================================

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Route SIGINT/SIGTERM to the shutdown flag
///
/// The handler only sets the flag; watch loops poll it and close their
/// sessions themselves.
pub fn install_signal_handlers() -> &'static AtomicBool {
    #[cfg(unix)]
    unsafe {
        libc::signal(
            libc::SIGINT,
            signal_handler as *const () as libc::sighandler_t,
        );
        libc::signal(
            libc::SIGTERM,
            signal_handler as *const () as libc::sighandler_t,
        );
    }
    &SHUTDOWN_REQUESTED
}

#[cfg(unix)]
extern "C" fn signal_handler(_: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

// =============================================================================
// Coordinator
// =============================================================================

/// Where a watch session is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Building,
}

/// Lifecycle events of one build cycle
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    Start,
    End(BuildReport),
    Error(String),
}

/// Drives sequential builds of one project in response to changes
pub struct WatchCoordinator<'a> {
    project: Project,
    bundler: &'a dyn Bundler,
    state: WatchState,
    last_written: Option<String>,
}

impl<'a> WatchCoordinator<'a> {
    pub fn new(project: Project, bundler: &'a dyn Bundler) -> Self {
        Self {
            project,
            bundler,
            state: WatchState::Idle,
            last_written: None,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// One IDLE -> BUILDING -> IDLE cycle
    ///
    /// START re-reads the descriptor from disk so hand edits reach the
    /// header; END carries the persisted, restamped build. Failures are
    /// reported as events, never returned.
    pub fn cycle(&mut self, emit: &mut dyn FnMut(WatchEvent)) {
        self.state = WatchState::Building;
        emit(WatchEvent::Start);

        if let Err(e) = self.project.reload() {
            let message = format!("{:#}", e);
            error!(error = %message, "failed to re-read project metadata");
            self.state = WatchState::Idle;
            emit(WatchEvent::Error(message));
            return;
        }

        match build::build(&mut self.project, self.bundler) {
            Ok(report) => {
                if let Some(text) = &report.descriptor {
                    self.last_written = Some(text.clone());
                }
                self.state = WatchState::Idle;
                emit(WatchEvent::End(report));
            }
            Err(e) => {
                let message = format!("{:#}", e);
                error!(error = %message, "build failed");
                self.state = WatchState::Idle;
                emit(WatchEvent::Error(message));
            }
        }
    }

    /// True when the only change is the descriptor this coordinator just wrote
    pub fn is_own_write(&self, changed: &[PathBuf]) -> bool {
        let descriptor = self.project.descriptor_path();
        let only_descriptor = changed.iter().all(|path| path == &descriptor);
        if changed.is_empty() || !only_descriptor {
            return false;
        }

        match (&self.last_written, fs::read_to_string(&descriptor)) {
            (Some(written), Ok(current)) => *written == current,
            _ => false,
        }
    }

    /// Build once, then rebuild on every relevant change until shutdown
    ///
    /// Changes that land while a build runs stay queued in the session and
    /// are coalesced into the next cycle.
    pub fn run(
        &mut self,
        session: &WatchSession,
        shutdown: &AtomicBool,
        poll: Duration,
        emit: &mut dyn FnMut(WatchEvent),
    ) {
        self.cycle(emit);

        while !shutdown.load(Ordering::SeqCst) {
            match session.wait(poll) {
                Wait::Idle => continue,
                Wait::Closed => break,
                Wait::Changed(paths) => {
                    if self.is_own_write(&paths) {
                        debug!("ignoring descriptor write from last build");
                        continue;
                    }
                    debug!(?paths, "change detected");
                    self.cycle(emit);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{BundleOutput, BundleRequest};
    use crate::metadata;
    use crate::paths;
    use crate::project;
    use anyhow::bail;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    struct CopyBundler;

    impl Bundler for CopyBundler {
        fn name(&self) -> &'static str {
            "copy"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn bundle(&self, request: &BundleRequest<'_>) -> Result<BundleOutput> {
            let text = format!("{}{}", request.header, fs::read_to_string(request.entry)?);
            fs::create_dir_all(request.output.parent().unwrap())?;
            fs::write(request.output, &text)?;
            Ok(BundleOutput {
                bytes: text.len() as u64,
            })
        }
    }

    /// Takes a while, like a real bundler
    struct SlowBundler(Duration);

    impl Bundler for SlowBundler {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn bundle(&self, request: &BundleRequest<'_>) -> Result<BundleOutput> {
            thread::sleep(self.0);
            CopyBundler.bundle(request)
        }
    }

    struct FailingBundler;

    impl Bundler for FailingBundler {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn bundle(&self, _request: &BundleRequest<'_>) -> Result<BundleOutput> {
            bail!("unexpected token")
        }
    }

    fn project_in(dir: &Path) -> Project {
        let root = dir.join("watched");
        fs::create_dir_all(paths::project::source_dir(&root)).unwrap();
        fs::write(paths::project::entry_point(&root), "export {};\n").unwrap();
        project::resolve(&root).unwrap()
    }

    fn collect(coordinator: &mut WatchCoordinator<'_>) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        coordinator.cycle(&mut |event| events.push(event));
        events
    }

    #[test]
    fn test_should_ignore_path() {
        let root = Path::new("/p");
        assert!(should_ignore_path(root, Path::new("/p/dist/p.js")));
        assert!(should_ignore_path(root, Path::new("/p/types/host.d.ts")));
        assert!(should_ignore_path(root, Path::new("/p/.git/index")));
        assert!(should_ignore_path(root, Path::new("/p/src/.index.ts.swp")));
        assert!(should_ignore_path(root, Path::new("/p/src/index.ts~")));
        assert!(!should_ignore_path(root, Path::new("/p/src/index.ts")));
        assert!(!should_ignore_path(root, Path::new("/p/project.yaml")));
        assert!(!should_ignore_path(root, Path::new("/p/src/dist/helper.ts")));
    }

    #[test]
    fn test_cycle_picks_up_hand_edits() {
        let tmp = TempDir::new().unwrap();
        let project = project_in(tmp.path());
        let root = project.root().to_path_buf();

        let mut edited = project.meta.clone();
        edited.version = "5.0.0".to_string();
        edited.description = "edited\nby hand".to_string();
        metadata::save(&root, &edited).unwrap();

        let bundler = CopyBundler;
        let mut coordinator = WatchCoordinator::new(project, &bundler);
        let events = collect(&mut coordinator);

        assert_eq!(events.first(), Some(&WatchEvent::Start));
        let Some(WatchEvent::End(report)) = events.last() else {
            panic!("expected End, got {:?}", events);
        };
        assert_eq!(coordinator.project().meta.version, "5.0.0");
        assert!(fs::read_to_string(&report.output).unwrap().contains("// version: 5.0.0"));

        let persisted = metadata::load_or_default(&root).unwrap();
        assert_eq!(persisted.version, "5.0.0");
        assert_eq!(persisted.description, "edited\nby hand");
        assert_eq!(coordinator.state(), WatchState::Idle);
    }

    #[test]
    fn test_cycle_failure_is_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let project = project_in(tmp.path());

        let bundler = FailingBundler;
        let mut coordinator = WatchCoordinator::new(project, &bundler);
        let events = collect(&mut coordinator);

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], WatchEvent::Error(msg) if msg.contains("unexpected token")));
        assert_eq!(coordinator.state(), WatchState::Idle);
        assert!(!coordinator.project().descriptor_path().exists());
    }

    #[test]
    fn test_cycle_reports_malformed_descriptor() {
        let tmp = TempDir::new().unwrap();
        let project = project_in(tmp.path());
        fs::write(project.descriptor_path(), "name: [broken").unwrap();

        let bundler = CopyBundler;
        let mut coordinator = WatchCoordinator::new(project, &bundler);
        let events = collect(&mut coordinator);

        assert!(matches!(events.last(), Some(WatchEvent::Error(_))));
        assert_eq!(coordinator.state(), WatchState::Idle);
    }

    #[test]
    fn test_own_descriptor_write_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let project = project_in(tmp.path());
        let descriptor = project.descriptor_path();

        let bundler = CopyBundler;
        let mut coordinator = WatchCoordinator::new(project, &bundler);
        collect(&mut coordinator);

        assert!(coordinator.is_own_write(&[descriptor.clone()]));
        assert!(!coordinator.is_own_write(&[coordinator.project().entry_point()]));
        assert!(!coordinator.is_own_write(&[]));

        // Same file name elsewhere in the tree is a source change
        let nested = coordinator.project().root().join("src").join("project.yaml");
        assert!(!coordinator.is_own_write(&[nested]));

        // A hand edit after the build is a real change
        fs::write(&descriptor, "version: 7.0.0\n").unwrap();
        assert!(!coordinator.is_own_write(&[descriptor]));
    }

    #[test]
    fn test_session_close_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let mut session = WatchSession::open(tmp.path()).unwrap();
        assert!(session.is_open());

        shutdown(&mut [&mut session]);
        assert!(!session.is_open());
        assert_eq!(session.wait(Duration::from_millis(10)), Wait::Closed);

        session.close();
        assert!(!session.is_open());
    }

    #[test]
    fn test_run_stops_when_shutdown_requested() {
        let tmp = TempDir::new().unwrap();
        let project = project_in(tmp.path());
        let session = WatchSession::open(project.root()).unwrap();

        let bundler = CopyBundler;
        let mut coordinator = WatchCoordinator::new(project, &bundler);
        let stop = AtomicBool::new(true);

        let mut events = Vec::new();
        coordinator.run(&session, &stop, Duration::from_millis(10), &mut |e| events.push(e));

        // Only the initial build ran
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], WatchEvent::End(_)));
    }

    #[test]
    fn test_run_rebuilds_once_per_burst() {
        let tmp = TempDir::new().unwrap();
        let project = project_in(tmp.path());
        let src = paths::project::source_dir(project.root());
        let session = WatchSession::open(project.root()).unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let editor = {
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                // Let the initial build finish and its descriptor write settle
                thread::sleep(Duration::from_millis(800));
                fs::write(src.join("util.ts"), "export const y = 2;\n").unwrap();
                thread::sleep(Duration::from_millis(50));
                fs::write(src.join("index.ts"), "export { y } from './util';\n").unwrap();
                thread::sleep(Duration::from_millis(2000));
                stop.store(true, Ordering::SeqCst);
            })
        };

        let bundler = SlowBundler(Duration::from_millis(300));
        let mut coordinator = WatchCoordinator::new(project, &bundler);
        let mut events = Vec::new();
        coordinator.run(&session, &stop, Duration::from_millis(50), &mut |e| events.push(e));
        editor.join().unwrap();

        let starts = events.iter().filter(|e| **e == WatchEvent::Start).count();
        let ends = events
            .iter()
            .filter(|e| matches!(e, WatchEvent::End(_)))
            .count();
        assert_eq!(starts, 2, "events: {:?}", events);
        assert_eq!(ends, 2, "events: {:?}", events);
    }
}
