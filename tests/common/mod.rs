//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use live_config::codec::Format;
use live_config::reload::{ReloadEvent, ReloadTrigger, WatchSummary};
use live_config::source::{ConfigSource, RawConfig, SourceError};
use live_config::{AppConfig, ConfigStore, ReloadController, Shutdown, SignalWatcher};

// -- Scripted source ----------------------------------------------------

/// A source whose next answer is set by the test.
pub struct ScriptedSource {
    next: Mutex<Result<RawConfig, SourceError>>,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(initial: Result<RawConfig, SourceError>) -> Arc<Self> {
        Arc::new(Self {
            next: Mutex::new(initial),
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, next: Result<RawConfig, SourceError>) {
        *self.next.lock().unwrap() = next;
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigSource for ScriptedSource {
    async fn fetch(&self, _key: &str) -> Result<RawConfig, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.next.lock().unwrap().clone()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// A source that holds every fetch until the test releases it.
pub struct GatedSource {
    answer: Result<RawConfig, SourceError>,
    gate: Semaphore,
}

impl GatedSource {
    pub fn new(answer: Result<RawConfig, SourceError>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            gate: Semaphore::new(0),
        })
    }

    /// Let one pending or future fetch complete.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl ConfigSource for GatedSource {
    async fn fetch(&self, _key: &str) -> Result<RawConfig, SourceError> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| SourceError::unavailable("gated", "gate closed"))?;
        permit.forget();
        self.answer.clone()
    }

    fn name(&self) -> &str {
        "gated"
    }
}

/// A JSON payload at `version`.
pub fn json_config(mode: &str, cache_size: u64, version: u64) -> Result<RawConfig, SourceError> {
    Ok(RawConfig::new(
        format!(r#"{{"mode":"{}","cacheSize":{}}}"#, mode, cache_size),
        version,
    ))
}

pub fn json_controller(source: Arc<ScriptedSource>) -> ReloadController<AppConfig> {
    ReloadController::new(source, Arc::new(Format::Json), "samples/app", ConfigStore::new())
}

/// `(mode, cache_size, version)` currently in the store.
pub fn current(store: &ConfigStore<AppConfig>) -> (String, u64, u64) {
    let snapshot = store.get().expect("store not loaded");
    (
        snapshot.config().mode.clone(),
        snapshot.config().cache_size,
        snapshot.version().get(),
    )
}

// -- Fake trigger -------------------------------------------------------

/// Trigger fed by the test. Reports every time the watcher comes back to
/// wait, which is how tests know a reload cycle has finished.
pub struct ChannelTrigger {
    events: mpsc::Receiver<ReloadEvent>,
    waiting: mpsc::UnboundedSender<()>,
}

#[async_trait]
impl ReloadTrigger for ChannelTrigger {
    async fn next_event(&mut self) -> Option<ReloadEvent> {
        let _ = self.waiting.send(());
        self.events.recv().await
    }

    fn describe(&self) -> String {
        "test channel".to_string()
    }
}

pub struct TriggerHandle {
    events: Option<mpsc::Sender<ReloadEvent>>,
    waiting: mpsc::UnboundedReceiver<()>,
}

impl TriggerHandle {
    /// Deliver one reload request and wait until the cycle has finished.
    pub async fn reload(&mut self) {
        self.send(ReloadEvent::Manual).await;
        self.wait_idle().await;
    }

    pub async fn send(&mut self, event: ReloadEvent) {
        self.events
            .as_ref()
            .expect("trigger closed")
            .send(event)
            .await
            .expect("watcher gone");
    }

    /// Wait until the watcher is blocked on the trigger again.
    pub async fn wait_idle(&mut self) {
        self.waiting.recv().await.expect("watcher gone");
    }

    /// Close the event stream, ending the watch loop.
    pub fn close(&mut self) {
        self.events = None;
    }
}

pub fn channel_trigger() -> (ChannelTrigger, TriggerHandle) {
    let (events_tx, events_rx) = mpsc::channel(1);
    let (waiting_tx, waiting_rx) = mpsc::unbounded_channel();
    (
        ChannelTrigger {
            events: events_rx,
            waiting: waiting_tx,
        },
        TriggerHandle {
            events: Some(events_tx),
            waiting: waiting_rx,
        },
    )
}

/// Spawn a watcher on a fake trigger and wait until it is listening.
pub async fn spawn_watcher<T>(
    controller: ReloadController<T>,
) -> (TriggerHandle, Shutdown, JoinHandle<WatchSummary>)
where
    T: Send + Sync + 'static,
{
    let (trigger, mut handle) = channel_trigger();
    let shutdown = Shutdown::new();
    let task = SignalWatcher::new(controller, Box::new(trigger)).spawn(shutdown.subscribe());
    handle.wait_idle().await;
    (handle, shutdown, task)
}

// -- Mock Consul agent --------------------------------------------------

#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl MockRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Body of a `GET /v1/kv/<key>` answer.
pub fn kv_body(key: &str, value: &str, modify_index: u64) -> String {
    format!(
        r#"[{{"LockIndex":0,"Key":"{}","Flags":0,"Value":"{}","CreateIndex":1,"ModifyIndex":{}}}]"#,
        key,
        STANDARD.encode(value),
        modify_index
    )
}

/// Start a programmable HTTP server standing in for a Consul agent.
pub async fn start_mock_consul<F>(handler: F) -> SocketAddr
where
    F: Fn(MockRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = handler(request);
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            403 => "403 Forbidden",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request(socket: &mut TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(MockRequest {
        method,
        path,
        headers,
        body,
    })
}
