//! Board connection and transactions
//!
//! [`EbbController`] owns the single connection to the board and enforces the
//! connection state machine: `Disconnected -> Connecting -> Connected`, with
//! `Connected` split into `Idle` and `AwaitingAck`. Only one transaction may
//! be in flight; a second caller gets [`ProtocolError::Busy`] immediately.
//!
//! Transactions run on the blocking pool because the transport is a plain
//! blocking byte pipe. Write and read deadlines are checked on every poll, so
//! a timeout ends the transaction without touching the connection. Each
//! transaction is driven by its own task: a caller that stops waiting does
//! not strand the link in `AwaitingAck`.
//!
//! While a [`JobGuard`] is held, only the handle returned by
//! [`JobGuard::controller`] may run transactions.

use crate::transport::{Connector, Transport};
use parking_lot::{Mutex, RwLock};
use plotkit_core::{ConnectionState, ControllerEvent, EventDispatcher, LinkState, ProtocolError};
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Line terminator appended to every command
pub const LINE_TERMINATOR: &str = "\r";
/// Token present in every successful reply
pub const ACK_TOKEN: &str = "OK";
/// Prefix of board error replies
pub const ERROR_PREFIX: char = '!';

/// Sleep between polls when the transport reports no data
const IDLE_POLL: Duration = Duration::from_millis(1);

/// Transaction timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Time allowed for a command to be written and drained, in milliseconds
    pub write_timeout_ms: u64,
    /// Time allowed for the reply after the write, in milliseconds
    pub read_timeout_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            write_timeout_ms: 1000,
            read_timeout_ms: 3000,
        }
    }
}

impl ControllerConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// What a transaction waits for after writing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    /// Lines up to and including the one carrying the acknowledgment token
    Ack,
    /// The first non-empty line
    Line,
    /// Nothing; the write is the whole transaction
    None,
}

/// Result of one exchange on the blocking pool
enum Exchange {
    Reply(Vec<String>),
    Rejected(String),
    WriteTimeout,
    ReadTimeout,
    Lost(io::Error),
}

fn is_retryable(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

fn write_all(
    transport: &mut dyn Transport,
    data: &[u8],
    deadline: Instant,
) -> Result<(), Exchange> {
    let mut written = 0;
    while written < data.len() {
        if Instant::now() >= deadline {
            return Err(Exchange::WriteTimeout);
        }
        match transport.write(&data[written..]) {
            Ok(0) => std::thread::sleep(IDLE_POLL),
            Ok(n) => written += n,
            Err(e) if is_retryable(&e) => {}
            Err(e) => return Err(Exchange::Lost(e)),
        }
    }
    loop {
        match transport.flush() {
            Ok(()) => return Ok(()),
            Err(e) if is_retryable(&e) => {
                if Instant::now() >= deadline {
                    return Err(Exchange::WriteTimeout);
                }
            }
            Err(e) => return Err(Exchange::Lost(e)),
        }
    }
}

fn read_reply(transport: &mut dyn Transport, mode: ReplyMode, deadline: Instant) -> Exchange {
    let mut pending = String::new();
    let mut lines = Vec::new();
    let mut buf = [0u8; 256];
    loop {
        if Instant::now() >= deadline {
            return Exchange::ReadTimeout;
        }
        match transport.read(&mut buf) {
            Ok(0) => std::thread::sleep(IDLE_POLL),
            Ok(n) => {
                pending.push_str(&String::from_utf8_lossy(&buf[..n]));
                while let Some(end) = pending.find(|c: char| c == '\r' || c == '\n') {
                    let line = pending[..end].trim().to_string();
                    pending.drain(..=end);
                    if line.is_empty() {
                        continue;
                    }
                    if line.starts_with(ERROR_PREFIX) {
                        return Exchange::Rejected(line);
                    }
                    let done = match mode {
                        ReplyMode::Ack => line.contains(ACK_TOKEN),
                        ReplyMode::Line | ReplyMode::None => true,
                    };
                    lines.push(line);
                    if done {
                        return Exchange::Reply(lines);
                    }
                }
            }
            Err(e) if is_retryable(&e) => {}
            Err(e) => return Exchange::Lost(e),
        }
    }
}

fn exchange(
    transport: &mut dyn Transport,
    command: &str,
    mode: ReplyMode,
    config: ControllerConfig,
) -> Exchange {
    let data = format!("{}{}", command, LINE_TERMINATOR).into_bytes();
    let write_deadline = Instant::now() + config.write_timeout();
    if let Err(outcome) = write_all(transport, &data, write_deadline) {
        return outcome;
    }
    if mode == ReplyMode::None {
        return Exchange::Reply(Vec::new());
    }
    read_reply(transport, mode, Instant::now() + config.read_timeout())
}

/// No job holds the connection
const NO_JOB: u64 = 0;

/// Exclusive ownership of the connection by a running job, released on drop
pub struct JobGuard {
    controller: EbbController,
}

impl JobGuard {
    /// Handle whose transactions are allowed while the job runs
    pub fn controller(&self) -> &EbbController {
        &self.controller
    }
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        let _ = self.controller.job_owner.compare_exchange(
            self.controller.job,
            NO_JOB,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}

impl std::fmt::Debug for JobGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobGuard")
            .field("job", &self.controller.job)
            .finish()
    }
}

/// The single owner of the board connection
#[derive(Clone)]
pub struct EbbController {
    state: Arc<RwLock<ConnectionState>>,
    transport: Arc<Mutex<Option<Box<dyn Transport>>>>,
    port_name: Arc<RwLock<Option<String>>>,
    events: EventDispatcher,
    config: ControllerConfig,
    job_owner: Arc<AtomicU64>,
    next_job: Arc<AtomicU64>,
    /// Job this handle acts for, `NO_JOB` for ordinary handles
    job: u64,
}

impl EbbController {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            transport: Arc::new(Mutex::new(None)),
            port_name: Arc::new(RwLock::new(None)),
            events: EventDispatcher::default(),
            config,
            job_owner: Arc::new(AtomicU64::new(NO_JOB)),
            next_job: Arc::new(AtomicU64::new(NO_JOB)),
            job: NO_JOB,
        }
    }

    pub fn config(&self) -> ControllerConfig {
        self.config
    }

    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    /// Subscribe to connection and job events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Name of the open port, if any
    pub fn port_name(&self) -> Option<String> {
        self.port_name.read().clone()
    }

    pub fn is_job_active(&self) -> bool {
        self.job_owner.load(Ordering::SeqCst) != NO_JOB
    }

    /// Claim the connection for a job
    ///
    /// Fails with `NotConnected` when closed and `Busy` when another job holds it.
    /// Until the guard is dropped, transactions on any other handle fail with
    /// `Busy`.
    pub fn begin_job(&self) -> Result<JobGuard, ProtocolError> {
        if !self.is_connected() {
            return Err(ProtocolError::NotConnected);
        }
        let job = self.next_job.fetch_add(1, Ordering::SeqCst) + 1;
        if self
            .job_owner
            .compare_exchange(NO_JOB, job, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ProtocolError::Busy);
        }
        tracing::debug!("Job {} claimed the connection", job);
        let mut controller = self.clone();
        controller.job = job;
        Ok(JobGuard { controller })
    }

    /// Move to `next`, publishing the change; returns false if not allowed
    fn transition(
        state: &mut ConnectionState,
        next: ConnectionState,
        events: &EventDispatcher,
    ) -> bool {
        if !state.can_transition_to(next) {
            tracing::warn!("Rejected connection transition {} -> {}", state, next);
            return false;
        }
        if *state != next {
            tracing::debug!("Connection {} -> {}", state, next);
            *state = next;
            events.publish(ControllerEvent::StateChanged(next));
        }
        true
    }

    fn begin_connect(&self) -> Result<(), ProtocolError> {
        let mut state = self.state.write();
        if *state != ConnectionState::Disconnected {
            return Err(ProtocolError::AlreadyConnected);
        }
        Self::transition(&mut state, ConnectionState::Connecting, &self.events);
        Ok(())
    }

    fn abort_connect(&self) {
        let mut state = self.state.write();
        Self::transition(&mut state, ConnectionState::Disconnected, &self.events);
    }

    fn finish_connect(&self, mut transport: Box<dyn Transport>) -> Result<(), ProtocolError> {
        let name = transport.name();
        if let Err(e) = transport.clear_input() {
            tracing::warn!("Failed to flush stale input on {}: {}", name, e);
            self.abort_connect();
            return Err(ProtocolError::FailedToOpen {
                port: name,
                reason: e.to_string(),
            });
        }

        *self.transport.lock() = Some(transport);
        *self.port_name.write() = Some(name.clone());
        {
            let mut state = self.state.write();
            Self::transition(
                &mut state,
                ConnectionState::Connected(LinkState::Idle),
                &self.events,
            );
        }
        tracing::info!("Connected to board on {}", name);
        self.events.publish(ControllerEvent::Connected(name));
        Ok(())
    }

    /// Open a transport through `connector` and mark the connection ready
    pub async fn connect_with(&self, connector: &dyn Connector) -> Result<(), ProtocolError> {
        self.begin_connect()?;
        match connector.connect().await {
            Ok(transport) => self.finish_connect(transport),
            Err(e) => {
                tracing::warn!("Connect failed: {}", e);
                self.abort_connect();
                Err(e)
            }
        }
    }

    /// Adopt an already open transport
    pub async fn attach(&self, transport: Box<dyn Transport>) -> Result<(), ProtocolError> {
        self.begin_connect()?;
        self.finish_connect(transport)
    }

    /// Close the connection; a no-op when already closed
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        let was_open = {
            let mut state = self.state.write();
            let was_open = *state != ConnectionState::Disconnected;
            Self::transition(&mut state, ConnectionState::Disconnected, &self.events);
            was_open
        };
        self.transport.lock().take();
        self.port_name.write().take();
        if was_open {
            tracing::info!("Disconnected from board");
            self.events
                .publish(ControllerEvent::Disconnected { requested: true });
        }
        Ok(())
    }

    /// Tear down after the port failed underneath us
    fn connection_lost(&self, reason: String) -> ProtocolError {
        {
            let mut state = self.state.write();
            Self::transition(&mut state, ConnectionState::Disconnected, &self.events);
        }
        self.transport.lock().take();
        self.port_name.write().take();
        tracing::error!("Connection lost: {}", reason);
        self.events.publish(ControllerEvent::Error(reason.clone()));
        self.events
            .publish(ControllerEvent::Disconnected { requested: false });
        ProtocolError::ConnectionLost { reason }
    }

    /// Probe an idle link and tear it down if the port has vanished
    ///
    /// Does nothing unless the link is `Connected(Idle)`; a transaction in
    /// flight notices a dead port on its own.
    pub fn check_link(&self) -> Result<(), ProtocolError> {
        let reason = {
            let mut state = self.state.write();
            if *state != ConnectionState::Connected(LinkState::Idle) {
                return Ok(());
            }
            let mut transport = self.transport.lock();
            let Some(open) = transport.as_mut() else {
                return Ok(());
            };
            match open.check_alive() {
                Ok(()) => return Ok(()),
                Err(e) => {
                    transport.take();
                    Self::transition(&mut state, ConnectionState::Disconnected, &self.events);
                    e.to_string()
                }
            }
        };
        Err(self.connection_lost(reason))
    }

    /// Send `command` and wait for its acknowledgment
    ///
    /// Returns every reply line up to and including the acknowledgment.
    pub async fn command(&self, command: &str) -> Result<Vec<String>, ProtocolError> {
        self.transact(command, ReplyMode::Ack).await
    }

    /// Send `command` and return its first reply line
    pub async fn query_line(&self, command: &str) -> Result<String, ProtocolError> {
        let lines = self.transact(command, ReplyMode::Line).await?;
        lines
            .into_iter()
            .next()
            .ok_or_else(|| ProtocolError::InvalidResponse {
                command: command.to_string(),
                reply: String::new(),
            })
    }

    /// Write `command` without waiting for a reply
    pub async fn write_line(&self, command: &str) -> Result<(), ProtocolError> {
        self.transact(command, ReplyMode::None).await.map(|_| ())
    }

    /// Run one transaction
    pub async fn transact(
        &self,
        command: &str,
        mode: ReplyMode,
    ) -> Result<Vec<String>, ProtocolError> {
        let owner = self.job_owner.load(Ordering::SeqCst);
        if owner != NO_JOB && owner != self.job {
            return Err(ProtocolError::Busy);
        }
        {
            let mut state = self.state.write();
            match *state {
                ConnectionState::Connected(LinkState::Idle) => {}
                ConnectionState::Connected(LinkState::AwaitingAck) => {
                    return Err(ProtocolError::Busy)
                }
                _ => return Err(ProtocolError::NotConnected),
            }
            Self::transition(
                &mut state,
                ConnectionState::Connected(LinkState::AwaitingAck),
                &self.events,
            );
        }

        let taken = self.transport.lock().take();
        let Some(transport) = taken else {
            return Err(self.connection_lost("transport missing".to_string()));
        };

        tracing::trace!("> {}", command);
        let this = self.clone();
        let line = command.to_string();
        let driver = tokio::spawn(async move { this.drive(line, mode, transport).await });
        match driver.await {
            Ok(result) => result,
            Err(e) => Err(ProtocolError::Io {
                reason: format!("transaction task failed: {}", e),
            }),
        }
    }

    /// Run the exchange and return the link to `Idle`
    async fn drive(
        self,
        command: String,
        mode: ReplyMode,
        transport: Box<dyn Transport>,
    ) -> Result<Vec<String>, ProtocolError> {
        let config = self.config;
        let line = command.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let mut transport = transport;
            let outcome = exchange(transport.as_mut(), &line, mode, config);
            (transport, outcome)
        })
        .await;

        let (mut transport, outcome) = match joined {
            Ok(result) => result,
            Err(e) => {
                return Err(self.connection_lost(format!("transaction task failed: {}", e)))
            }
        };

        if let Exchange::Lost(e) = &outcome {
            return Err(self.connection_lost(e.to_string()));
        }
        if matches!(outcome, Exchange::WriteTimeout | Exchange::ReadTimeout) {
            if let Err(e) = transport.clear_input() {
                tracing::warn!("Failed to clear input after timeout: {}", e);
            }
        }

        {
            let mut state = self.state.write();
            if *state != ConnectionState::Connected(LinkState::AwaitingAck) {
                // closed while the transaction was running
                return Err(ProtocolError::ConnectionLost {
                    reason: "disconnected during transaction".to_string(),
                });
            }
            *self.transport.lock() = Some(transport);
            Self::transition(
                &mut state,
                ConnectionState::Connected(LinkState::Idle),
                &self.events,
            );
        }

        match outcome {
            Exchange::Reply(lines) => {
                tracing::trace!("< {:?}", lines);
                if mode != ReplyMode::None {
                    self.events.publish(ControllerEvent::CommandComplete(command));
                }
                Ok(lines)
            }
            Exchange::Rejected(reply) => {
                tracing::error!("Board rejected '{}': {}", command, reply);
                Err(ProtocolError::Rejected { command, reply })
            }
            Exchange::WriteTimeout => {
                tracing::error!("Write of '{}' timed out", command);
                Err(ProtocolError::WriteTimeout {
                    timeout_ms: config.write_timeout_ms,
                })
            }
            Exchange::ReadTimeout => {
                tracing::error!("No reply to '{}'", command);
                Err(ProtocolError::ReadTimeout {
                    command,
                    timeout_ms: config.read_timeout_ms,
                })
            }
            Exchange::Lost(e) => Err(ProtocolError::Io {
                reason: e.to_string(),
            }),
        }
    }
}

impl Default for EbbController {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}
