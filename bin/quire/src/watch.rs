//! Watch-rebuild loop
//!
//! File system events from the content, template and asset roots are fed
//! into a single task that rebuilds the site. The gate works like this:
//!
//! 1. An event is admitted when at least `debounce_ms` have passed since the
//!    start of the previous rebuild; otherwise it is dropped.
//! 2. An admitted event opens a quiet period of `settle_ms`, never shorter
//!    than `debounce_ms`. Events arriving in that period are absorbed, so one
//!    rebuild sees the final file state and nothing inside the window is lost.
//! 3. The rebuild runs to completion. A failure replaces `index.html` in the
//!    output root with an error page that reloads itself.
//!
//! The loop stops when its handle is stopped or dropped, or when the event
//! channel closes.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use color_eyre::eyre::{Report, Result, WrapErr};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher, event::ModifyKind};
use quire_core::{SiteLayout, config::WatchSettings, is_ignored_path};
use quire_generator::{Builder, FsSink, OutputSink};
use tokio::{
    sync::{mpsc, oneshot},
    task::{JoinError, JoinHandle},
    time::{Instant, sleep_until},
};
use tracing::{debug, error, info, warn};

/// Capacity of the channel between the file watcher and the loop.
const EVENT_BUFFER: usize = 256;

/// Page replaced with the error page when a rebuild fails.
pub const ERROR_PAGE: &str = "index.html";

/// A relevant change under one of the watched roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Changed paths, ignored names already removed.
    pub paths: Vec<PathBuf>,
    /// When the event was observed.
    pub at: Instant,
}

impl WatchEvent {
    /// Create an event.
    pub fn new(paths: Vec<PathBuf>, at: Instant) -> Self {
        Self { paths, at }
    }

    /// Convert a watcher event, keeping creates, data writes and removes of
    /// non-ignored paths.
    pub fn from_notify(event: notify::Event, at: Instant) -> Option<Self> {
        if !is_relevant(&event.kind) {
            return None;
        }
        let paths: Vec<_> = event
            .paths
            .into_iter()
            .filter(|path| !is_ignored_path(path))
            .collect();
        (!paths.is_empty()).then(|| Self::new(paths, at))
    }
}

fn is_relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Data(_)) | EventKind::Remove(_)
    )
}

/// Cool-down gate keyed on the start of the last rebuild.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    window: Duration,
    last_build: Option<Instant>,
}

impl DebounceGate {
    /// Create a gate that has not seen a build yet.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_build: None,
        }
    }

    /// Whether an event observed at `at` may trigger a rebuild.
    #[must_use]
    pub fn admits(&self, at: Instant) -> bool {
        self.last_build
            .is_none_or(|last| at.saturating_duration_since(last) >= self.window)
    }

    /// Record the start of a rebuild.
    pub fn record(&mut self, started: Instant) {
        self.last_build = Some(started);
    }

    /// Start of the last rebuild.
    #[must_use]
    pub fn last_build(&self) -> Option<Instant> {
        self.last_build
    }
}

/// Something the loop can rebuild. Returns the number of documents built.
pub trait Rebuild: Send + 'static {
    /// Run one build to completion.
    fn rebuild(&mut self) -> Result<usize>;
}

impl<F> Rebuild for F
where
    F: FnMut() -> Result<usize> + Send + 'static,
{
    fn rebuild(&mut self) -> Result<usize> {
        self()
    }
}

/// Rebuilds a site layout with a configured builder.
#[derive(Debug, Clone)]
pub struct SiteRebuild {
    builder: Builder,
    layout: SiteLayout,
}

impl SiteRebuild {
    /// Create a rebuild for `layout`.
    #[must_use]
    pub fn new(builder: Builder, layout: SiteLayout) -> Self {
        Self { builder, layout }
    }
}

impl Rebuild for SiteRebuild {
    fn rebuild(&mut self) -> Result<usize> {
        let outcome = self.builder.build(&self.layout).wrap_err("Build failed")?;
        if let Some(warning) = outcome.asset_warning() {
            eprintln!("  ⚠ Asset processing warning: {warning}");
        }
        Ok(outcome.documents)
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WatchExit {
    /// The handle requested shutdown or was dropped.
    #[default]
    Shutdown,
    /// The event source went away.
    EventsClosed,
}

/// Counters returned when the loop stops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchReport {
    /// Rebuilds started.
    pub builds: usize,
    /// Rebuilds that failed.
    pub failures: usize,
    /// Events rejected by the debounce gate.
    pub dropped: usize,
    /// Events folded into a pending rebuild.
    pub absorbed: usize,
    /// Exit reason.
    pub exit: WatchExit,
}

/// The rebuild task state.
pub struct WatchLoop<R> {
    rebuild: R,
    gate: DebounceGate,
    settle: Duration,
    output: FsSink,
    events: mpsc::Receiver<WatchEvent>,
    shutdown: oneshot::Receiver<()>,
}

impl<R: Rebuild> WatchLoop<R> {
    /// Create a loop writing error pages under `output_root`.
    pub fn new(
        rebuild: R,
        output_root: impl Into<PathBuf>,
        settings: &WatchSettings,
        events: mpsc::Receiver<WatchEvent>,
        shutdown: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            rebuild,
            gate: DebounceGate::new(settings.debounce()),
            settle: settings.settle().max(settings.debounce()),
            output: FsSink::new(output_root),
            events,
            shutdown,
        }
    }

    /// Process events until shutdown or until the event channel closes.
    pub async fn run(mut self) -> WatchReport {
        let mut report = WatchReport::default();

        'events: loop {
            let event = tokio::select! {
                biased;
                _ = &mut self.shutdown => {
                    report.exit = WatchExit::Shutdown;
                    break;
                }
                event = self.events.recv() => match event {
                    Some(event) => event,
                    None => {
                        report.exit = WatchExit::EventsClosed;
                        break;
                    }
                },
            };

            if !self.gate.admits(event.at) {
                debug!(paths = ?event.paths, "change inside debounce window, dropped");
                report.dropped += 1;
                continue;
            }

            let deadline = Instant::now() + self.settle;
            let mut closed = false;
            while !closed {
                tokio::select! {
                    biased;
                    _ = &mut self.shutdown => {
                        report.exit = WatchExit::Shutdown;
                        break 'events;
                    }
                    () = sleep_until(deadline) => break,
                    absorbed = self.events.recv() => match absorbed {
                        Some(absorbed) => {
                            debug!(paths = ?absorbed.paths, "change absorbed into pending rebuild");
                            report.absorbed += 1;
                        }
                        None => closed = true,
                    },
                }
            }

            if let Some(path) = event.paths.first() {
                println!();
                println!("  File changed: {} - rebuilding...", path.display());
            }
            self.build(&mut report);

            if closed {
                report.exit = WatchExit::EventsClosed;
                break;
            }
        }

        info!(
            builds = report.builds,
            failures = report.failures,
            dropped = report.dropped,
            absorbed = report.absorbed,
            exit = ?report.exit,
            "watch loop stopped"
        );
        report
    }

    fn build(&mut self, report: &mut WatchReport) {
        let started = Instant::now();
        self.gate.record(started);
        report.builds += 1;

        match self.rebuild.rebuild() {
            Ok(documents) => {
                let elapsed = started.elapsed().as_millis();
                info!(documents, elapsed_ms = elapsed, "rebuild complete");
                println!("  ✓ Rebuilt {documents} pages in {elapsed}ms");
            }
            Err(e) => {
                report.failures += 1;
                error!("Rebuild failed: {e:#}");
                eprintln!("  ✗ Rebuild failed: {e:#}");
                if let Err(io) = self.output.write(Path::new(ERROR_PAGE), error_page(&e).as_bytes()) {
                    warn!(error = %io, "failed to write error page");
                }
            }
        }
    }
}

/// Handle to a running watch loop.
pub struct WatchHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<WatchReport>,
    _watcher: Option<RecommendedWatcher>,
}

impl WatchHandle {
    /// Whether the loop has already stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the loop and wait for its report.
    ///
    /// An in-flight rebuild finishes first.
    pub async fn stop(mut self) -> std::result::Result<WatchReport, JoinError> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.task.await
    }
}

/// Spawn a loop fed by `events`.
pub fn spawn_loop<R: Rebuild>(
    rebuild: R,
    output_root: impl Into<PathBuf>,
    settings: &WatchSettings,
    events: mpsc::Receiver<WatchEvent>,
) -> WatchHandle {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let watch_loop = WatchLoop::new(rebuild, output_root, settings, events, shutdown_rx);

    WatchHandle {
        shutdown: Some(shutdown_tx),
        task: tokio::spawn(watch_loop.run()),
        _watcher: None,
    }
}

/// Watch the layout's source roots and spawn a loop rebuilding with
/// `rebuild`.
///
/// Roots that do not exist yet are not watched. Fails when the watcher
/// cannot be created or a root cannot be watched.
pub fn spawn_watch<R: Rebuild>(
    layout: &SiteLayout,
    settings: &WatchSettings,
    rebuild: R,
) -> notify::Result<WatchHandle> {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                if let Some(event) = WatchEvent::from_notify(event, Instant::now())
                    && tx.blocking_send(event).is_err()
                {
                    debug!("watch loop stopped, event discarded");
                }
            }
            Err(e) => warn!(error = %e, "file watcher error"),
        },
        notify::Config::default(),
    )?;

    for root in layout.watch_roots() {
        if root.exists() {
            watcher.watch(root, RecursiveMode::Recursive)?;
            debug!(dir = %root.display(), "watching directory");
        } else {
            debug!(dir = %root.display(), "directory missing, not watched");
        }
    }

    let mut handle = spawn_loop(rebuild, &layout.output_root, settings, rx);
    handle._watcher = Some(watcher);
    Ok(handle)
}

/// Self-refreshing HTML page describing a failed build.
#[must_use]
pub fn error_page(error: &Report) -> String {
    let message = error
        .chain()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n  caused by: ");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Build Error</title>
    <style>
        body {{ font-family: monospace; margin: 2rem; background: #1a1a1a; color: #ff6b6b; }}
        .error {{ background: #2d1b1b; padding: 1rem; border-left: 4px solid #ff6b6b; }}
        pre {{ white-space: pre-wrap; word-wrap: break-word; }}
        .hint {{ color: #4ecdc4; margin-top: 1rem; }}
    </style>
</head>
<body>
    <h1>Build Error</h1>
    <div class="error"><pre>{}</pre></div>
    <div class="hint">This page reloads automatically; fix the error and save.</div>
    <script>
        setTimeout(() => location.reload(), 2000);
    </script>
</body>
</html>
"#,
        escape_html(&message)
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
