//! Client-side state of the console: the registry mirror, unsaved weight
//! edits, the auto-refresh schedule and the outcome of every request.
//!
//! Requests run on spawned tasks that only do I/O and report back a
//! [`Completion`] over the event channel. [`Console::handle`] applies them, so
//! all state changes happen on whichever single task drives the console.

pub mod diagnostics;
pub mod edits;
pub mod filter;
pub mod mirror;
pub mod refresh;
pub mod register;

#[cfg(test)]
pub(crate) mod mock;

use crate::common::{
    BACKENDS_PATH, Backend, BackendKey, SYNC_PATH, Snapshot, Transport, TransportError,
    payload_ok, pretty,
};
use crate::utils::{fmt_timestamp, fmt_weight};
use diagnostics::{AuditTail, Diagnostics, PingResult};
use edits::{PendingEdits, WeightSubmission};
use mirror::{RefreshError, RegistryMirror};
use refresh::{LoopState, RefreshLoop};
use register::{RegisterResult, Registration};
use serde_json::{Value, json};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Operator intents the console knows how to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Refresh,
    ToggleAutoRefresh,
    Sync,
    /// Stores unsaved weight input for a backend.
    EditWeight { key: BackendKey, text: String },
    DiscardEdit(BackendKey),
    /// Submits the pending edit of a backend, or its current weight.
    SaveWeight(BackendKey),
    Ping(String),
    TailAuditLog(String),
    Register {
        ip: String,
        port: String,
        weight: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOrigin {
    Startup,
    Manual,
    Periodic,
}

/// Result of a finished request task.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Refresh {
        seq: u64,
        origin: RefreshOrigin,
        outcome: Result<Value, TransportError>,
    },
    Weight {
        seq: u64,
        submission: WeightSubmission,
    },
    Sync {
        seq: u64,
        write: Result<Value, TransportError>,
        refresh: Result<Value, TransportError>,
    },
    Ping(PingResult),
    AuditTail(AuditTail),
    Register {
        seq: u64,
        result: RegisterResult,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleEvent {
    /// The auto-refresh schedule fired.
    RefreshTick,
    Completed(Completion),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    /// A request is on its way.
    Busy,
    Success,
    Error,
}

/// Human readable outcome of the last operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub text: String,
}

impl Status {
    pub fn new(level: StatusLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::new(StatusLevel::Info, "")
    }
}

#[derive(Debug)]
pub struct Console<T: Transport> {
    transport: Arc<T>,
    events: UnboundedSender<ConsoleEvent>,
    mirror: RegistryMirror,
    edits: PendingEdits,
    refresh_loop: RefreshLoop,
    diagnostics: Diagnostics,
    status: Status,
    /// Sequence of the last issued backend list read.
    issued_seq: u64,
    /// Requests spawned and not yet completed.
    in_flight: usize,
}

impl<T: Transport> Console<T> {
    /// Creates the console along with the receiving end of its event channel.
    pub fn new(
        transport: Arc<T>,
        refresh_interval: Duration,
    ) -> (Self, UnboundedReceiver<ConsoleEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let console = Self {
            transport,
            events,
            mirror: RegistryMirror::default(),
            edits: PendingEdits::default(),
            refresh_loop: RefreshLoop::new(refresh_interval),
            diagnostics: Diagnostics::default(),
            status: Status::default(),
            issued_seq: 0,
            in_flight: 0,
        };
        (console, rx)
    }

    /// Loads the first snapshot.
    pub fn init(&mut self) {
        self.status = Status::new(StatusLevel::Busy, "loading backends...");
        self.issue_refresh(RefreshOrigin::Startup);
    }

    pub fn snapshot(&self) -> &Snapshot {
        self.mirror.snapshot()
    }

    pub fn mirror(&self) -> &RegistryMirror {
        &self.mirror
    }

    pub fn edits(&self) -> &PendingEdits {
        &self.edits
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn auto_refresh(&self) -> LoopState {
        self.refresh_loop.state()
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_loop.period()
    }

    /// Backends currently on screen for `predicate`.
    pub fn visible(&self, predicate: &str) -> Vec<&Backend> {
        filter::apply(self.mirror.snapshot(), predicate)
    }

    /// Points subsequent requests at another control plane; in-flight ones finish as issued.
    pub fn set_transport(&mut self, transport: Arc<T>) {
        self.transport = transport;
    }

    pub fn set_refresh_interval(&mut self, period: Duration) {
        self.refresh_loop.set_period(period, self.events.clone());
    }

    pub fn start_auto_refresh(&mut self) -> bool {
        self.refresh_loop.start(self.events.clone())
    }

    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::Refresh => {
                self.status = Status::new(StatusLevel::Busy, "refreshing...");
                self.issue_refresh(RefreshOrigin::Manual);
            }
            Action::ToggleAutoRefresh => {
                let text = match self.refresh_loop.toggle(self.events.clone()) {
                    LoopState::Running => format!(
                        "auto-refresh on, every {} ms",
                        self.refresh_loop.period().as_millis()
                    ),
                    LoopState::Stopped => "auto-refresh off".to_string(),
                };
                self.status = Status::new(StatusLevel::Info, text);
            }
            Action::Sync => self.sync(),
            Action::EditWeight { key, text } => self.edits.set(key, text),
            Action::DiscardEdit(key) => self.edits.discard(&key),
            Action::SaveWeight(key) => self.save_weight(key),
            Action::Ping(raw) => self.ping(&raw),
            Action::TailAuditLog(raw) => self.tail_audit_log(&raw),
            Action::Register { ip, port, weight } => self.register(&ip, &port, &weight),
        }
    }

    pub fn handle(&mut self, event: ConsoleEvent) {
        match event {
            ConsoleEvent::RefreshTick => self.issue_refresh(RefreshOrigin::Periodic),
            ConsoleEvent::Completed(completion) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.complete(completion);
            }
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.issued_seq += 1;
        self.issued_seq
    }

    /// Runs `job` on its own task and routes its completion back through the channel.
    fn spawn<F>(&mut self, job: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        self.in_flight += 1;
        let events = self.events.clone();
        tokio::spawn(async move {
            let completion = job.await;
            // receiver gone means the console was dropped
            let _ = events.send(ConsoleEvent::Completed(completion));
        });
    }

    fn issue_refresh(&mut self, origin: RefreshOrigin) {
        let seq = self.next_seq();
        let transport = Arc::clone(&self.transport);
        self.spawn(async move {
            let outcome = transport.read(BACKENDS_PATH).await;
            Completion::Refresh {
                seq,
                origin,
                outcome,
            }
        });
    }

    fn sync(&mut self) {
        self.status = Status::new(StatusLevel::Busy, "syncing...");
        tracing::info!("manual sync");

        let seq = self.next_seq();
        let transport = Arc::clone(&self.transport);
        self.spawn(async move {
            let write = transport.write(SYNC_PATH, json!({})).await;
            // a failed sync may still have changed upstream state
            let refresh = transport.read(BACKENDS_PATH).await;
            Completion::Sync {
                seq,
                write,
                refresh,
            }
        });
    }

    fn save_weight(&mut self, key: BackendKey) {
        let raw = match self.edits.get(&key) {
            Some(text) => text.to_string(),
            None => match self.mirror.snapshot().get(&key) {
                Some(backend) => fmt_weight(backend.weight),
                None => {
                    self.status = Status::new(
                        StatusLevel::Error,
                        format!("backend {} is not in the current snapshot", key),
                    );
                    return;
                }
            },
        };

        self.status = Status::new(StatusLevel::Busy, format!("saving weight of {}...", key));
        let seq = self.next_seq();
        let transport = Arc::clone(&self.transport);
        self.spawn(async move {
            let submission = edits::submit_weight(transport.as_ref(), key, raw).await;
            Completion::Weight { seq, submission }
        });
    }

    fn ping(&mut self, raw: &str) {
        let ip = match diagnostics::ping_target(raw) {
            Ok(ip) => ip,
            Err(err) => {
                self.diagnostics.ping_output = err.to_string();
                self.status = Status::new(StatusLevel::Error, err.to_string());
                return;
            }
        };

        self.diagnostics.ping_output = format!("pinging {}...", ip);
        self.diagnostics.ping_pending = true;
        self.status = Status::new(StatusLevel::Busy, format!("pinging {}...", ip));

        let transport = Arc::clone(&self.transport);
        self.spawn(async move {
            Completion::Ping(diagnostics::ping(transport.as_ref(), ip).await)
        });
    }

    fn tail_audit_log(&mut self, raw: &str) {
        let lines = diagnostics::tail_lines(raw);
        self.diagnostics.audit_pending = true;
        self.status = Status::new(StatusLevel::Busy, "loading audit log...");

        let transport = Arc::clone(&self.transport);
        self.spawn(async move {
            Completion::AuditTail(diagnostics::tail_audit_log(transport.as_ref(), lines).await)
        });
    }

    fn register(&mut self, ip: &str, port: &str, weight: &str) {
        let registration = match Registration::parse(ip, port, weight) {
            Ok(registration) => registration,
            Err(err) => {
                self.status = Status::new(StatusLevel::Error, err.to_string());
                return;
            }
        };

        self.status = Status::new(
            StatusLevel::Busy,
            format!("registering {}...", registration.key),
        );
        let seq = self.next_seq();
        let transport = Arc::clone(&self.transport);
        self.spawn(async move {
            let result = register::register(transport.as_ref(), registration).await;
            Completion::Register { seq, result }
        });
    }

    /// Applies a backend list read to the mirror, pruning edits of vanished backends.
    fn apply_refresh(
        &mut self,
        seq: u64,
        outcome: Result<Value, TransportError>,
    ) -> Result<String, RefreshError> {
        match self.mirror.apply(seq, outcome) {
            Ok(snapshot) => {
                let summary = summarize(snapshot);
                self.edits.retain_present(self.mirror.snapshot());
                Ok(summary)
            }
            Err(err) => {
                tracing::warn!(seq, %err, "refresh failed, keeping previous snapshot");
                Err(err)
            }
        }
    }

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Refresh {
                seq,
                origin,
                outcome,
            } => match self.apply_refresh(seq, outcome) {
                // periodic refreshes stay quiet unless they fail
                Ok(_) if origin == RefreshOrigin::Periodic => {}
                Ok(summary) => self.status = Status::new(StatusLevel::Success, summary),
                Err(err) => {
                    self.status =
                        Status::new(StatusLevel::Error, format!("refresh failed: {}", err))
                }
            },
            Completion::Weight { seq, submission } => self.complete_weight(seq, submission),
            Completion::Sync {
                seq,
                write,
                refresh,
            } => {
                let (level, mut text) = match &write {
                    Ok(payload) if payload_ok(payload) => (StatusLevel::Success, pretty(payload)),
                    Ok(payload) => (StatusLevel::Error, pretty(payload)),
                    Err(err) => (StatusLevel::Error, format!("sync failed: {}", err)),
                };
                let level = self.append_refresh(seq, refresh, level, &mut text);
                self.status = Status::new(level, text);
            }
            Completion::Ping(PingResult { ip, outcome }) => {
                self.diagnostics.ping_pending = false;
                self.status = match outcome {
                    Ok(payload) => {
                        let output = diagnostics::ping_output(&payload);
                        self.diagnostics.ping_output = output.clone();
                        self.diagnostics.log = output;
                        if payload_ok(&payload) {
                            Status::new(StatusLevel::Success, format!("ping {} done", ip))
                        } else {
                            Status::new(StatusLevel::Error, format!("ping {} failed", ip))
                        }
                    }
                    Err(err) => {
                        self.diagnostics.ping_output = format!("ping request failed: {}", err);
                        Status::new(StatusLevel::Error, format!("ping {} failed: {}", ip, err))
                    }
                };
            }
            Completion::AuditTail(AuditTail { lines, outcome }) => {
                self.diagnostics.audit_pending = false;
                let text = match outcome {
                    Ok(payload) => diagnostics::audit_text(&payload),
                    Err(err) => Err(format!("failed to load audit log: {}", err)),
                };
                self.status = match text {
                    Ok(text) => {
                        self.diagnostics.log = text;
                        Status::new(
                            StatusLevel::Success,
                            format!("audit.log loaded (tail={})", lines),
                        )
                    }
                    Err(message) => {
                        self.diagnostics.log = message;
                        Status::new(StatusLevel::Error, "failed to load audit log")
                    }
                };
            }
            Completion::Register { seq, result } => {
                let key = &result.registration.key;
                let (level, mut text) = match &result.write {
                    Ok(payload) if payload_ok(payload) => {
                        (StatusLevel::Success, format!("registered {}", key))
                    }
                    Ok(payload) => (
                        StatusLevel::Error,
                        format!("registering {} rejected\n{}", key, pretty(payload)),
                    ),
                    Err(err) => (
                        StatusLevel::Error,
                        format!("registering {} failed: {}", key, err),
                    ),
                };
                let level = match result.refresh {
                    Some(refresh) => self.append_refresh(seq, refresh, level, &mut text),
                    None => level,
                };
                self.status = Status::new(level, text);
            }
        }
    }

    fn complete_weight(&mut self, seq: u64, submission: WeightSubmission) {
        let WeightSubmission {
            key,
            raw,
            weight,
            write,
            refresh,
        } = submission;

        let payload = match write {
            Ok(payload) => payload,
            Err(err) => {
                // the edit stays so the operator can retry
                self.status = Status::new(
                    StatusLevel::Error,
                    format!("saving weight of {} failed: {}", key, err),
                );
                return;
            }
        };

        let accepted = payload_ok(&payload);
        if accepted {
            self.edits.settle(&key, &raw);
        }

        let report = payload.get("sync").unwrap_or(&payload);
        let mut text = format!("weight {} -> {}\n{}", key, fmt_weight(weight), pretty(report));
        let level = if accepted {
            StatusLevel::Success
        } else {
            StatusLevel::Error
        };
        let level = match refresh {
            Some(refresh) => self.append_refresh(seq, refresh, level, &mut text),
            None => level,
        };
        self.status = Status::new(level, text);
    }

    /// Applies a follow-up refresh and appends its outcome to a status text.
    fn append_refresh(
        &mut self,
        seq: u64,
        refresh: Result<Value, TransportError>,
        level: StatusLevel,
        text: &mut String,
    ) -> StatusLevel {
        match self.apply_refresh(seq, refresh) {
            Ok(summary) => {
                text.push('\n');
                text.push_str(&summary);
                level
            }
            Err(err) => {
                text.push_str(&format!("\nrefresh failed: {}", err));
                StatusLevel::Error
            }
        }
    }
}

/// One-line description of a snapshot for the status area.
fn summarize(snapshot: &Snapshot) -> String {
    format!(
        "backends={}  k8s_updated_at={}  runtime_updated_at={}",
        snapshot.len(),
        fmt_timestamp(snapshot.k8s_updated_at),
        fmt_timestamp(snapshot.runtime_updated_at),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{PING_PATH, REGISTER_PATH, weight_path};
    use mock::MockTransport;

    fn listing(weight: u32) -> Value {
        json!({
            "ok": true,
            "k8s_updated_at": 0,
            "runtime_updated_at": 0,
            "updated_at": 5,
            "backends": [
                {
                    "ip": "10.0.0.1",
                    "port": 8000,
                    "weight": weight,
                    "enabled": true,
                    "source": "runtime"
                },
                {"ip": "10.0.0.2", "port": 8000, "weight": 2, "enabled": false, "source": "k8s"}
            ]
        })
    }

    fn key() -> BackendKey {
        BackendKey::new("10.0.0.1", 8000)
    }

    fn setup() -> (
        Arc<MockTransport>,
        Console<MockTransport>,
        UnboundedReceiver<ConsoleEvent>,
    ) {
        let transport = Arc::new(MockTransport::default());
        let (console, rx) = Console::new(Arc::clone(&transport), Duration::from_millis(2000));
        (transport, console, rx)
    }

    /// Feeds the next event back into the console.
    async fn step(
        console: &mut Console<MockTransport>,
        rx: &mut UnboundedReceiver<ConsoleEvent>,
    ) -> ConsoleEvent {
        let event = rx.recv().await.unwrap();
        console.handle(event.clone());
        event
    }

    #[tokio::test]
    async fn test_init_loads_snapshot() {
        let (transport, mut console, mut rx) = setup();
        transport.reply(BACKENDS_PATH, Ok(listing(1)));

        console.init();
        assert_eq!(console.status().level, StatusLevel::Busy);
        assert_eq!(console.in_flight(), 1);

        step(&mut console, &mut rx).await;
        assert_eq!(console.in_flight(), 0);
        assert_eq!(console.snapshot().len(), 2);
        assert_eq!(console.status().level, StatusLevel::Success);
        assert!(console.status().text.starts_with("backends=2"));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_snapshot() {
        let (transport, mut console, mut rx) = setup();
        transport.reply(BACKENDS_PATH, Ok(listing(1)));
        transport.reply(BACKENDS_PATH, Ok(json!({"ok": false, "error": "k8s unavailable"})));

        console.init();
        step(&mut console, &mut rx).await;
        let before = console.snapshot().clone();

        console.dispatch(Action::Refresh);
        step(&mut console, &mut rx).await;
        assert_eq!(console.snapshot(), &before);
        assert_eq!(console.status().level, StatusLevel::Error);
        assert!(console.status().text.contains("k8s unavailable"));
    }

    #[tokio::test]
    async fn test_transport_and_payload_failures_read_differently() {
        let (transport, mut console, mut rx) = setup();
        transport.reply(BACKENDS_PATH, Err(TransportError::Decode("(502) expected value".into())));

        console.dispatch(Action::Refresh);
        step(&mut console, &mut rx).await;
        assert_eq!(
            console.status().text,
            "refresh failed: transport failure: response is not JSON: (502) expected value"
        );
        assert!(!console.mirror().is_loaded());
    }

    #[tokio::test]
    async fn test_save_weight_refreshes_before_completion() {
        let (transport, mut console, mut rx) = setup();
        transport.reply(BACKENDS_PATH, Ok(listing(1)));
        transport.reply(BACKENDS_PATH, Ok(listing(5)));
        transport.reply(
            &weight_path("10.0.0.1", 8000),
            Ok(json!({"ok": true, "updated": {"ip": "10.0.0.1", "port": 8000, "weight": 5}})),
        );

        console.init();
        step(&mut console, &mut rx).await;

        console.dispatch(Action::EditWeight {
            key: key(),
            text: "5".into(),
        });
        console.dispatch(Action::SaveWeight(key()));
        let event = step(&mut console, &mut rx).await;

        // the write and its refresh come back as a single completion
        assert!(matches!(
            event,
            ConsoleEvent::Completed(Completion::Weight {
                submission: WeightSubmission {
                    refresh: Some(_),
                    ..
                },
                ..
            })
        ));
        assert_eq!(transport.count(BACKENDS_PATH), 2);
        assert_eq!(console.snapshot().get(&key()).map(|b| b.weight), Some(5.0));
        assert!(!console.edits().is_pending(&key()));
        assert_eq!(console.status().level, StatusLevel::Success);
        assert_eq!(console.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_saves_settle_independently() {
        let (transport, mut console, mut rx) = setup();
        let other = BackendKey::new("10.0.0.2", 8000);
        transport.reply(BACKENDS_PATH, Ok(listing(1)));
        transport.reply(&weight_path("10.0.0.1", 8000), Ok(json!({"ok": true})));
        transport.reply(&weight_path("10.0.0.2", 8000), Ok(json!({"ok": true})));

        console.init();
        step(&mut console, &mut rx).await;

        console.dispatch(Action::EditWeight {
            key: key(),
            text: "5".into(),
        });
        console.dispatch(Action::EditWeight {
            key: other.clone(),
            text: "7".into(),
        });
        console.dispatch(Action::SaveWeight(key()));
        console.dispatch(Action::SaveWeight(other.clone()));
        assert_eq!(console.in_flight(), 2);

        step(&mut console, &mut rx).await;
        step(&mut console, &mut rx).await;

        assert!(!console.edits().is_pending(&key()));
        assert!(!console.edits().is_pending(&other));
        assert!(console.edits().is_empty());
        // one read at startup plus one after each write
        assert_eq!(transport.count(BACKENDS_PATH), 3);
        assert_eq!(transport.count(&weight_path("10.0.0.1", 8000)), 1);
        assert_eq!(transport.count(&weight_path("10.0.0.2", 8000)), 1);
        assert_eq!(console.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_save_without_edit_resubmits_current_weight() {
        let (transport, mut console, mut rx) = setup();
        transport.reply(BACKENDS_PATH, Ok(listing(3)));
        transport.reply(&weight_path("10.0.0.1", 8000), Ok(json!({"ok": true})));

        console.init();
        step(&mut console, &mut rx).await;
        console.dispatch(Action::SaveWeight(key()));
        step(&mut console, &mut rx).await;

        let body = transport
            .requests()
            .into_iter()
            .find(|r| r.path == weight_path("10.0.0.1", 8000))
            .and_then(|r| r.body);
        assert_eq!(body, Some(json!({"weight": 3})));
    }

    #[tokio::test]
    async fn test_save_unknown_backend_sends_nothing() {
        let (transport, mut console, _rx) = setup();
        console.dispatch(Action::SaveWeight(key()));

        assert!(transport.requests().is_empty());
        assert_eq!(console.status().level, StatusLevel::Error);
        assert_eq!(console.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_rejected_weight_keeps_edit() {
        let (transport, mut console, mut rx) = setup();
        transport.reply(BACKENDS_PATH, Ok(listing(1)));
        transport.reply(&weight_path("10.0.0.1", 8000), Ok(json!({"ok": false, "error": "nope"})));

        console.init();
        step(&mut console, &mut rx).await;
        console.dispatch(Action::EditWeight {
            key: key(),
            text: "9".into(),
        });
        console.dispatch(Action::SaveWeight(key()));
        step(&mut console, &mut rx).await;

        assert_eq!(console.edits().get(&key()), Some("9"));
        assert_eq!(console.status().level, StatusLevel::Error);
        // still refreshed after the write went through
        assert_eq!(transport.count(BACKENDS_PATH), 2);
    }

    #[tokio::test]
    async fn test_failed_weight_write_keeps_edit_without_refresh() {
        let (transport, mut console, mut rx) = setup();
        transport.reply(BACKENDS_PATH, Ok(listing(1)));

        console.init();
        step(&mut console, &mut rx).await;
        console.dispatch(Action::EditWeight {
            key: key(),
            text: "9".into(),
        });
        console.dispatch(Action::SaveWeight(key()));
        step(&mut console, &mut rx).await;

        assert_eq!(console.edits().get(&key()), Some("9"));
        assert_eq!(transport.count(BACKENDS_PATH), 1);
        assert!(
            console
                .status()
                .text
                .starts_with("saving weight of 10.0.0.1:8000 failed: network error")
        );
    }

    #[tokio::test]
    async fn test_edit_survives_periodic_refresh() {
        let (transport, mut console, mut rx) = setup();
        transport.reply(BACKENDS_PATH, Ok(listing(1)));

        console.init();
        step(&mut console, &mut rx).await;
        console.dispatch(Action::EditWeight {
            key: key(),
            text: "42".into(),
        });

        console.handle(ConsoleEvent::RefreshTick);
        step(&mut console, &mut rx).await;
        assert_eq!(console.edits().get(&key()), Some("42"));
        assert_eq!(console.snapshot().get(&key()).map(|b| b.weight), Some(1.0));
    }

    #[tokio::test]
    async fn test_edit_of_vanished_backend_is_dropped() {
        let (transport, mut console, mut rx) = setup();
        transport.reply(BACKENDS_PATH, Ok(listing(1)));
        transport.reply(BACKENDS_PATH, Ok(json!({"ok": true, "backends": []})));

        console.init();
        step(&mut console, &mut rx).await;
        console.dispatch(Action::EditWeight {
            key: key(),
            text: "42".into(),
        });
        console.dispatch(Action::Refresh);
        step(&mut console, &mut rx).await;
        assert!(console.edits().is_empty());
    }

    #[tokio::test]
    async fn test_periodic_refresh_is_quiet() {
        let (transport, mut console, mut rx) = setup();
        transport.reply(BACKENDS_PATH, Ok(listing(1)));
        transport.reply(PING_PATH, Ok(json!({"ok": true, "output": "pong"})));

        console.dispatch(Action::Ping("10.0.0.1".into()));
        step(&mut console, &mut rx).await;
        let status = console.status().clone();

        console.handle(ConsoleEvent::RefreshTick);
        step(&mut console, &mut rx).await;
        assert_eq!(console.status(), &status);
        assert_eq!(console.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_sync_always_refreshes() {
        let (transport, mut console, mut rx) = setup();
        transport.reply(
            SYNC_PATH,
            Ok(json!({"ok": false, "reload": {"ok": false, "info": "pid file not found"}})),
        );
        transport.reply(BACKENDS_PATH, Ok(listing(1)));

        console.dispatch(Action::Sync);
        step(&mut console, &mut rx).await;

        assert_eq!(transport.count(SYNC_PATH), 1);
        assert_eq!(transport.count(BACKENDS_PATH), 1);
        assert_eq!(console.snapshot().len(), 2);
        assert_eq!(console.status().level, StatusLevel::Error);
        assert!(console.status().text.contains("pid file not found"));
        assert_eq!(
            transport.requests()[0].body,
            Some(json!({}))
        );
    }

    #[tokio::test]
    async fn test_sync_refreshes_after_transport_failure() {
        let (transport, mut console, mut rx) = setup();
        transport.reply(BACKENDS_PATH, Ok(listing(1)));

        console.dispatch(Action::Sync);
        step(&mut console, &mut rx).await;

        assert_eq!(transport.count(BACKENDS_PATH), 1);
        assert!(console.status().text.starts_with("sync failed: network error"));
        assert!(console.mirror().is_loaded());
    }

    #[tokio::test]
    async fn test_empty_ping_is_local() {
        let (transport, mut console, _rx) = setup();
        console.dispatch(Action::Ping("   ".into()));

        assert!(transport.requests().is_empty());
        assert_eq!(console.in_flight(), 0);
        assert_eq!(console.diagnostics().ping_output, "enter an IP address to ping");
        assert_eq!(console.status().level, StatusLevel::Error);
    }

    #[tokio::test]
    async fn test_ping_trims_target() {
        let (transport, mut console, mut rx) = setup();
        transport.reply(PING_PATH, Ok(json!({"ok": true, "output": "64 bytes from 10.0.0.5"})));

        console.dispatch(Action::Ping(" 10.0.0.5 ".into()));
        assert!(console.diagnostics().ping_pending);
        step(&mut console, &mut rx).await;

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body, Some(json!({"ip": "10.0.0.5"})));
        assert_eq!(console.diagnostics().ping_output, "64 bytes from 10.0.0.5");
        assert_eq!(console.diagnostics().log, "64 bytes from 10.0.0.5");
        assert!(!console.diagnostics().ping_pending);
        assert_eq!(console.status().text, "ping 10.0.0.5 done");
    }

    #[tokio::test]
    async fn test_ping_leaves_mirror_alone() {
        let (transport, mut console, mut rx) = setup();
        transport.reply(PING_PATH, Ok(json!({"ok": false, "output": "ping timeout"})));

        console.dispatch(Action::Ping("10.0.0.5".into()));
        step(&mut console, &mut rx).await;
        assert_eq!(transport.count(BACKENDS_PATH), 0);
        assert!(!console.mirror().is_loaded());
        assert_eq!(console.status().text, "ping 10.0.0.5 failed");
    }

    #[tokio::test]
    async fn test_tail_audit_log_defaults_to_100() {
        let (transport, mut console, mut rx) = setup();
        transport.reply("/api/logs/audit?tail=100", Ok(json!({"ok": true, "data": "line\n"})));

        console.dispatch(Action::TailAuditLog("".into()));
        step(&mut console, &mut rx).await;
        assert_eq!(transport.requests()[0].path, "/api/logs/audit?tail=100");
        assert_eq!(console.diagnostics().log, "line\n");
        assert_eq!(console.status().text, "audit.log loaded (tail=100)");
    }

    #[tokio::test]
    async fn test_tail_audit_log_failure() {
        let (transport, mut console, mut rx) = setup();
        transport.reply("/api/logs/audit?tail=20", Ok(json!({"ok": false})));

        console.dispatch(Action::TailAuditLog("20".into()));
        step(&mut console, &mut rx).await;
        assert!(console.diagnostics().log.starts_with("failed to load audit log"));
        assert_eq!(console.status().level, StatusLevel::Error);
    }

    #[tokio::test]
    async fn test_register_then_refresh() {
        let (transport, mut console, mut rx) = setup();
        transport.reply(REGISTER_PATH, Ok(json!({"ok": true, "message": "registered"})));
        transport.reply(BACKENDS_PATH, Ok(listing(1)));

        console.dispatch(Action::Register {
            ip: "10.0.0.1".into(),
            port: "8000".into(),
            weight: "".into(),
        });
        step(&mut console, &mut rx).await;

        assert_eq!(
            transport.requests()[0].body,
            Some(json!({"ip": "10.0.0.1", "port": 8000, "weight": 10}))
        );
        assert!(console.snapshot().contains(&key()));
        assert!(console.status().text.starts_with("registered 10.0.0.1:8000"));
    }

    #[tokio::test]
    async fn test_register_validation_is_local() {
        let (transport, mut console, _rx) = setup();
        console.dispatch(Action::Register {
            ip: "10.0.0.1".into(),
            port: "http".into(),
            weight: "1".into(),
        });
        assert!(transport.requests().is_empty());
        assert_eq!(console.status().text, "invalid port 'http', expected 1-65535");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_loop_still_applies_in_flight_refresh() {
        let (transport, mut console, mut rx) = setup();
        transport.reply(BACKENDS_PATH, Ok(listing(1)));

        console.dispatch(Action::ToggleAutoRefresh);
        assert_eq!(console.auto_refresh(), LoopState::Running);

        // immediate tick issues the refresh
        let tick = step(&mut console, &mut rx).await;
        assert_eq!(tick, ConsoleEvent::RefreshTick);
        assert_eq!(console.in_flight(), 1);

        console.dispatch(Action::ToggleAutoRefresh);
        assert_eq!(console.auto_refresh(), LoopState::Stopped);

        let event = step(&mut console, &mut rx).await;
        assert!(matches!(
            event,
            ConsoleEvent::Completed(Completion::Refresh {
                origin: RefreshOrigin::Periodic,
                ..
            })
        ));
        assert_eq!(console.snapshot().len(), 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(transport.count(BACKENDS_PATH), 1);
    }
}
