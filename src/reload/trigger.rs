//! External reload event sources.
//!
//! A trigger blocks until the next "please reload" event. Events carry no
//! payload; at most one pending event is buffered, so a burst of
//! notifications during a reload collapses into a single follow-up cycle.

use async_trait::async_trait;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::config::ReloadSignal;

/// What woke the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadEvent {
    Signal(ReloadSignal),
    FileChanged,
    Tick,
    Manual,
}

/// A source of reload events.
#[async_trait]
pub trait ReloadTrigger: Send {
    /// Wait for the next event. `None` means no further events will arrive.
    async fn next_event(&mut self) -> Option<ReloadEvent>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

// -- SignalTrigger ------------------------------------------------------

/// Reloads on a unix signal (SIGUSR2 by default).
#[cfg(unix)]
pub struct SignalTrigger {
    signal: ReloadSignal,
    stream: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalTrigger {
    /// Install the signal handler. Must be called inside a Tokio runtime.
    pub fn new(signal: ReloadSignal) -> std::io::Result<Self> {
        use tokio::signal::unix::{signal as listen, SignalKind};

        let kind = match signal {
            ReloadSignal::Hup => SignalKind::hangup(),
            ReloadSignal::Usr1 => SignalKind::user_defined1(),
            ReloadSignal::Usr2 => SignalKind::user_defined2(),
        };
        Ok(Self {
            signal,
            stream: listen(kind)?,
        })
    }
}

#[cfg(unix)]
#[async_trait]
impl ReloadTrigger for SignalTrigger {
    async fn next_event(&mut self) -> Option<ReloadEvent> {
        self.stream.recv().await.map(|()| ReloadEvent::Signal(self.signal))
    }

    fn describe(&self) -> String {
        format!("signal {}", self.signal)
    }
}

// -- FileChangeTrigger --------------------------------------------------

/// Reloads when the watched file is written, created or renamed into place.
///
/// The parent directory is watched so editors that replace the file
/// atomically keep triggering.
pub struct FileChangeTrigger {
    path: PathBuf,
    rx: mpsc::Receiver<()>,
    _watcher: RecommendedWatcher,
}

impl FileChangeTrigger {
    pub fn new(path: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel(1);
        let file_name = path.file_name().map(|name| name.to_os_string());
        let watch_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = (event.kind.is_modify() || event.kind.is_create())
                        && event
                            .paths
                            .iter()
                            .any(|p| p.file_name() == file_name.as_deref());
                    if relevant {
                        tracing::debug!(paths = ?event.paths, "Config file change detected");
                        // Full channel: a reload is already pending.
                        let _ = tx.try_send(());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config file watcher started");
        Ok(Self {
            path: path.to_path_buf(),
            rx,
            _watcher: watcher,
        })
    }
}

#[async_trait]
impl ReloadTrigger for FileChangeTrigger {
    async fn next_event(&mut self) -> Option<ReloadEvent> {
        self.rx.recv().await.map(|()| ReloadEvent::FileChanged)
    }

    fn describe(&self) -> String {
        format!("changes to {}", self.path.display())
    }
}

// -- IntervalTrigger ----------------------------------------------------

/// Reloads on a fixed period. The first event fires one period after creation.
pub struct IntervalTrigger {
    period: Duration,
    interval: Interval,
}

impl IntervalTrigger {
    /// Must be called inside a Tokio runtime.
    pub fn new(period: Duration) -> Self {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { period, interval }
    }
}

#[async_trait]
impl ReloadTrigger for IntervalTrigger {
    async fn next_event(&mut self) -> Option<ReloadEvent> {
        self.interval.tick().await;
        Some(ReloadEvent::Tick)
    }

    fn describe(&self) -> String {
        format!("every {:?}", self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test(start_paused = true)]
    async fn test_interval_trigger_waits_one_period() {
        let mut trigger = IntervalTrigger::new(Duration::from_secs(10));
        let started = Instant::now();

        assert_eq!(trigger.next_event().await, Some(ReloadEvent::Tick));
        assert!(started.elapsed() >= Duration::from_secs(10));
        assert_eq!(trigger.next_event().await, Some(ReloadEvent::Tick));
        assert!(started.elapsed() >= Duration::from_secs(20));
        assert_eq!(trigger.describe(), "every 10s");
    }

    #[tokio::test]
    async fn test_file_trigger_fires_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "mode: a\n").unwrap();

        let mut trigger = FileChangeTrigger::new(&path).unwrap();
        fs::write(&path, "mode: b\n").unwrap();

        let event = time::timeout(Duration::from_secs(10), trigger.next_event())
            .await
            .expect("no file change event");
        assert_eq!(event, Some(ReloadEvent::FileChanged));
    }

    #[tokio::test]
    async fn test_file_trigger_ignores_sibling_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "mode: a\n").unwrap();

        let mut trigger = FileChangeTrigger::new(&path).unwrap();
        fs::write(dir.path().join("other.yaml"), "mode: z\n").unwrap();

        let event = time::timeout(Duration::from_millis(500), trigger.next_event()).await;
        assert!(event.is_err(), "sibling write must not trigger a reload");
    }

    #[tokio::test]
    async fn test_file_trigger_collapses_burst_into_one_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "mode: a\n").unwrap();

        let mut trigger = FileChangeTrigger::new(&path).unwrap();
        for i in 0..5 {
            fs::write(&path, format!("mode: burst-{}\n", i)).unwrap();
        }
        // Let every notification reach the channel before draining it.
        time::sleep(Duration::from_millis(500)).await;

        let first = time::timeout(Duration::from_secs(5), trigger.next_event())
            .await
            .expect("no file change event");
        assert_eq!(first, Some(ReloadEvent::FileChanged));

        let second = time::timeout(Duration::from_millis(500), trigger.next_event()).await;
        assert!(second.is_err(), "a burst must buffer at most one pending event");
    }
}
