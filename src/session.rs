//! IEC 60870-5-104 session engine.
//!
//! Each session runs as one tokio task that multiplexes, through a
//! single `select!`, four event sources: frames from the transport,
//! commands from the [`Session`] handle, timer deadlines (T0..T3) and
//! abort requests. The task exclusively owns the connection state, the
//! send/receive windows and the timers; the handle communicates only
//! through channels.
//!
//! Lifecycle: `Closed -> Connecting -> Running -> Stopped`. `Stopped`
//! is terminal; a new connection means a new session object.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tokio_util::codec::Framed;
use tracing::{debug, info, trace, warn};

use crate::codec::{Apdu, Iec104Codec, DEFAULT_MAX_RECV_BUFFER};
use crate::error::{Iec104Error, Result};
use crate::policy::{FrameMeta, SessionPolicy};
use crate::registry::{TypeRegistry, UnhandledAsdu};
use crate::types::{Apci, Asdu, AsduHeader, FrameType, UFunction};
use crate::window::{RecvWindow, SendWindow};

/// Default k parameter (max unacknowledged outbound I-frames).
pub const DEFAULT_K: u16 = 12;

/// Default w parameter (inbound acknowledge threshold).
pub const DEFAULT_W: u16 = 8;

/// Default T0 (connection establishment) in seconds.
pub const DEFAULT_T0: u64 = 30;

/// Default T1 (send/test acknowledgement) in seconds.
pub const DEFAULT_T1: u64 = 15;

/// Default T2 (acknowledge delay) in seconds.
pub const DEFAULT_T2: u64 = 10;

/// Default T3 (idle test interval) in seconds.
pub const DEFAULT_T3: u64 = 20;

const EVENT_QUEUE: usize = 64;
const COMMAND_QUEUE: usize = 8;

/// Session parameters.
///
/// Defaults follow the standard profile: `k=12, w=8, T0=30s, T1=15s,
/// T2=10s, T3=20s`.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Max unacknowledged outbound I-frames, 1..=32767
    pub k: u16,
    /// Inbound acknowledge threshold, 1..=k-1
    pub w: u16,
    /// Connection establishment timeout
    pub t0: Duration,
    /// Send/test acknowledgement timeout
    pub t1: Duration,
    /// Acknowledge delay (only used with `delayed_ack`), <= t1
    pub t2: Duration,
    /// Idle interval before a TESTFR cycle
    pub t3: Duration,
    /// Receive buffer bound; overflow without a complete frame is fatal
    pub max_recv_buffer: usize,
    /// Delay acknowledgements up to T2 instead of acknowledging
    /// immediately. Off by default; the `w` threshold forces an
    /// S-frame in both modes.
    pub delayed_ack: bool,
    /// Client role: perform the STARTDT handshake during
    /// [`crate::open_client`] instead of waiting for
    /// [`Session::start_data_transfer`]
    pub auto_start: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            w: DEFAULT_W,
            t0: Duration::from_secs(DEFAULT_T0),
            t1: Duration::from_secs(DEFAULT_T1),
            t2: Duration::from_secs(DEFAULT_T2),
            t3: Duration::from_secs(DEFAULT_T3),
            max_recv_buffer: DEFAULT_MAX_RECV_BUFFER,
            delayed_ack: false,
            auto_start: true,
        }
    }
}

impl SessionConfig {
    /// Create a configuration with standard defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the k parameter.
    pub fn k(mut self, k: u16) -> Self {
        self.k = k;
        self
    }

    /// Set the w parameter.
    pub fn w(mut self, w: u16) -> Self {
        self.w = w;
        self
    }

    /// Set T0 (connection establishment timeout).
    pub fn t0(mut self, t0: Duration) -> Self {
        self.t0 = t0;
        self
    }

    /// Set T1 (send/test acknowledgement timeout).
    pub fn t1(mut self, t1: Duration) -> Self {
        self.t1 = t1;
        self
    }

    /// Set T2 (acknowledge delay).
    pub fn t2(mut self, t2: Duration) -> Self {
        self.t2 = t2;
        self
    }

    /// Set T3 (idle test interval).
    pub fn t3(mut self, t3: Duration) -> Self {
        self.t3 = t3;
        self
    }

    /// Set the receive buffer bound.
    pub fn max_recv_buffer(mut self, bytes: usize) -> Self {
        self.max_recv_buffer = bytes;
        self
    }

    /// Honour T2 by delaying acknowledgements instead of acknowledging
    /// immediately.
    pub fn delayed_ack(mut self, delayed: bool) -> Self {
        self.delayed_ack = delayed;
        self
    }

    /// Control the automatic STARTDT handshake of the client role.
    pub fn auto_start(mut self, auto: bool) -> Self {
        self.auto_start = auto;
        self
    }

    /// Validate the parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Iec104Error::config_static("k must be at least 1"));
        }
        if self.w == 0 || self.w >= self.k {
            return Err(Iec104Error::config_static("w must be in 1..=k-1"));
        }
        if self.t2 > self.t1 {
            return Err(Iec104Error::config_static("t2 must not exceed t1"));
        }
        if self.t0.is_zero() || self.t1.is_zero() || self.t3.is_zero() {
            return Err(Iec104Error::config_static("timers must be non-zero"));
        }
        if self.max_recv_buffer < 255 {
            return Err(Iec104Error::config_static(
                "receive buffer must hold at least one frame",
            ));
        }
        Ok(())
    }
}

/// Session role on the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// Controlling station: initiates STARTDT
    Client,
    /// Controlled station: answers STARTDT
    Server,
}

/// Externally visible session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport yet
    Closed,
    /// Transport up, STARTDT handshake outstanding
    Connecting,
    /// Data transfer active
    Running,
    /// Terminal; the transport is closed
    Stopped,
}

/// Events delivered through [`Session::receive`].
#[derive(Debug)]
pub enum SessionEvent {
    /// STARTDT handshake completed; data transfer is active
    Started,
    /// A decoded ASDU
    Asdu(Asdu),
    /// An ASDU whose type identification has no registered codec;
    /// the session continues
    Unhandled(UnhandledAsdu),
    /// Terminal event: the session reached `Stopped`. `None` means a
    /// clean local or remote stop; the error kind is surfaced exactly
    /// once.
    Stopped(Option<Iec104Error>),
}

enum Command {
    Submit(Asdu, oneshot::Sender<Result<()>>),
    StartDt(oneshot::Sender<Result<()>>),
    Stop(oneshot::Sender<Result<()>>),
}

/// Handle to a running session task.
///
/// Dropping the handle stops the session gracefully.
pub struct Session {
    cmd_tx: mpsc::Sender<Command>,
    abort_tx: mpsc::Sender<()>,
    events: mpsc::Receiver<SessionEvent>,
    state_rx: watch::Receiver<SessionState>,
    peer: Option<SocketAddr>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("peer", &self.peer)
            .finish()
    }
}

impl Session {
    /// Spawn a session task over an arbitrary byte-stream transport.
    ///
    /// The transport only needs to be a bidirectional byte stream; TCP
    /// and TLS-wrapped streams both qualify, and tests use in-memory
    /// duplex pipes. The task starts in `Connecting` with T0 armed.
    pub fn spawn<T>(
        io: T,
        role: SessionRole,
        config: SessionConfig,
        policy: Arc<dyn SessionPolicy>,
        registry: Arc<TypeRegistry>,
        peer: Option<SocketAddr>,
    ) -> Result<Self>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        config.validate()?;

        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE);
        let (abort_tx, abort_rx) = mpsc::channel(1);
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE);
        let (state_tx, state_rx) = watch::channel(SessionState::Connecting);

        let framed = Framed::new(io, Iec104Codec::with_max_buffer(config.max_recv_buffer));
        let task = SessionTask {
            framed,
            role,
            send_window: SendWindow::new(config.k),
            recv_window: RecvWindow::new(config.w),
            config,
            policy,
            registry,
            peer,
            state: SessionState::Connecting,
            state_tx,
            events: event_tx,
            cmd_rx,
            abort_rx,
            t0_deadline: None,
            t1_deadline: None,
            t2_deadline: None,
            t3_deadline: None,
            testfr_pending: false,
            pending_start: None,
            pending_stop: None,
            pending_submit: None,
            stopping: false,
            stopdt_sent: false,
            cmds_closed: false,
            abort_closed: false,
        };
        tokio::spawn(task.run());

        Ok(Self {
            cmd_tx,
            abort_tx,
            events: event_rx,
            state_rx,
            peer,
        })
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Peer address, when the transport has one.
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Submit an ASDU for transmission.
    ///
    /// Suspends until the frame is admitted to the send window and
    /// written to the transport; with the window full this is the
    /// backpressure point.
    pub async fn submit(&self, asdu: Asdu) -> Result<()> {
        self.command(|done| Command::Submit(asdu, done)).await
    }

    /// Perform the STARTDT handshake (client role).
    ///
    /// Only needed with [`SessionConfig::auto_start`] disabled.
    pub async fn start_data_transfer(&self) -> Result<()> {
        self.command(Command::StartDt).await
    }

    /// Stop data transfer and close the session gracefully.
    ///
    /// Frames already admitted to the send window are acknowledged (or
    /// time out under T1) before the STOPDT handshake and close.
    pub async fn stop_data_transfer(&self) -> Result<()> {
        self.command(Command::Stop).await
    }

    /// Close the session gracefully. Alias of the STOPDT drain;
    /// `Stopped` is terminal either way.
    pub async fn close(&self) -> Result<()> {
        self.command(Command::Stop).await
    }

    /// Abort immediately: close the transport without the STOPDT
    /// handshake and report `Stopped` with `Aborted`.
    pub fn abort(&self) {
        let _ = self.abort_tx.try_send(());
    }

    /// Receive the next session event.
    ///
    /// Yields decoded ASDUs in N(S) order, unhandled-type payloads and
    /// finally exactly one `Stopped` event. Returns `None` after the
    /// terminal event has been consumed.
    pub async fn receive(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    async fn command(&self, build: impl FnOnce(oneshot::Sender<Result<()>>) -> Command) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.cmd_tx
            .send(build(done_tx))
            .await
            .map_err(|_| Iec104Error::ChannelClosed)?;
        done_rx.await.map_err(|_| Iec104Error::ChannelClosed)?
    }
}

struct SessionTask<T> {
    framed: Framed<T, Iec104Codec>,
    role: SessionRole,
    config: SessionConfig,
    policy: Arc<dyn SessionPolicy>,
    registry: Arc<TypeRegistry>,
    peer: Option<SocketAddr>,
    state: SessionState,
    state_tx: watch::Sender<SessionState>,
    send_window: SendWindow,
    recv_window: RecvWindow,
    events: mpsc::Sender<SessionEvent>,
    cmd_rx: mpsc::Receiver<Command>,
    abort_rx: mpsc::Receiver<()>,
    t0_deadline: Option<Instant>,
    t1_deadline: Option<Instant>,
    t2_deadline: Option<Instant>,
    t3_deadline: Option<Instant>,
    testfr_pending: bool,
    pending_start: Option<oneshot::Sender<Result<()>>>,
    pending_stop: Option<oneshot::Sender<Result<()>>>,
    pending_submit: Option<(Bytes, oneshot::Sender<Result<()>>)>,
    stopping: bool,
    stopdt_sent: bool,
    cmds_closed: bool,
    abort_closed: bool,
}

impl<T> SessionTask<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn run(mut self) {
        let result = self.run_inner().await;

        if let Err(err) = &result {
            warn!(peer = ?self.peer, %err, "session stopped on error");
        } else {
            info!(peer = ?self.peer, "session stopped");
        }

        let _ = self.framed.close().await;
        self.set_state(SessionState::Stopped);

        // Resolve outstanding completions with the terminal kind, then
        // surface the kind itself exactly once through the event stream.
        let fail = |err: &Option<Iec104Error>| match err {
            Some(err) => terminal_kind(err),
            None => Iec104Error::NotRunning,
        };
        let kind = result.as_ref().err().map(terminal_kind);
        if let Some((_, done)) = self.pending_submit.take() {
            let _ = done.send(Err(fail(&kind)));
        }
        if let Some(done) = self.pending_start.take() {
            let _ = done.send(Err(fail(&kind)));
        }
        if let Some(done) = self.pending_stop.take() {
            let _ = done.send(match &kind {
                Some(err) => Err(terminal_kind(err)),
                None => Ok(()),
            });
        }
        let _ = self.events.send(SessionEvent::Stopped(result.err())).await;
    }

    async fn run_inner(&mut self) -> Result<()> {
        self.t0_deadline = Some(Instant::now() + self.config.t0);
        info!(peer = ?self.peer, role = ?self.role, "session connecting");

        if self.role == SessionRole::Client && self.config.auto_start {
            self.send_startdt_act().await?;
        }

        loop {
            let deadline = self.next_deadline();
            let accept_cmds =
                !self.cmds_closed && self.pending_submit.is_none() && !self.stopping;

            tokio::select! {
                maybe_abort = self.abort_rx.recv(), if !self.abort_closed => {
                    match maybe_abort {
                        Some(()) => return Err(Iec104Error::Aborted),
                        None => self.abort_closed = true,
                    }
                }

                frame = self.framed.next() => {
                    match frame {
                        Some(Ok(apdu)) => {
                            if self.on_frame(apdu).await? {
                                return Ok(());
                            }
                        }
                        Some(Err(err)) => return Err(err),
                        None => return Err(Iec104Error::TransportClosed),
                    }
                }

                cmd = self.cmd_rx.recv(), if accept_cmds => {
                    match cmd {
                        Some(cmd) => {
                            if self.on_command(cmd).await? {
                                return Ok(());
                            }
                        }
                        None => {
                            // Handle dropped: stop gracefully.
                            self.cmds_closed = true;
                            if self.begin_stop(None).await? {
                                return Ok(());
                            }
                        }
                    }
                }

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_deadline().await?;
                }
            }

            self.try_admit_pending().await?;
            self.try_finish_stop().await?;
        }
    }

    // ---- frame handling ----

    /// Returns `true` when the session stopped cleanly.
    async fn on_frame(&mut self, apdu: Apdu) -> Result<bool> {
        trace!(peer = ?self.peer, frame = %apdu, "rx");

        // T3 measures idle-since-last-frame-received.
        if self.state == SessionState::Running {
            self.t3_deadline = Some(Instant::now() + self.config.t3);
        }

        match apdu.apci {
            Apci::UFrame { function } => self.on_u_frame(function).await,
            Apci::SFrame { recv_seq } => {
                self.apply_ack(recv_seq)?;
                Ok(false)
            }
            Apci::IFrame { send_seq, recv_seq } => {
                self.on_i_frame(send_seq, recv_seq, apdu.body).await?;
                Ok(false)
            }
        }
    }

    async fn on_u_frame(&mut self, function: UFunction) -> Result<bool> {
        match function {
            UFunction::StartDtAct => {
                if self.role != SessionRole::Server {
                    return Err(Iec104Error::protocol_static(
                        "STARTDT act received by controlling station",
                    ));
                }
                self.send_u(UFunction::StartDtCon).await?;
                if self.state == SessionState::Connecting {
                    self.enter_running().await;
                }
                Ok(false)
            }

            UFunction::StartDtCon => {
                if self.state != SessionState::Connecting || self.role != SessionRole::Client {
                    return Err(Iec104Error::protocol_static("unexpected STARTDT con"));
                }
                if let Some(done) = self.pending_start.take() {
                    let _ = done.send(Ok(()));
                }
                self.refresh_t1(true);
                self.enter_running().await;
                Ok(false)
            }

            UFunction::StopDtAct => {
                // Drain owed acknowledgements, confirm, close.
                self.flush_ack().await?;
                self.send_u(UFunction::StopDtCon).await?;
                info!(peer = ?self.peer, "remote stop");
                Ok(true)
            }

            UFunction::StopDtCon => {
                if !self.stopdt_sent {
                    return Err(Iec104Error::protocol_static("unexpected STOPDT con"));
                }
                if let Some(done) = self.pending_stop.take() {
                    let _ = done.send(Ok(()));
                }
                Ok(true)
            }

            UFunction::TestFrAct => {
                self.send_u(UFunction::TestFrCon).await?;
                Ok(false)
            }

            UFunction::TestFrCon => {
                self.testfr_pending = false;
                self.refresh_t1(false);
                Ok(false)
            }
        }
    }

    async fn on_i_frame(&mut self, send_seq: u16, recv_seq: u16, body: Bytes) -> Result<()> {
        if self.state != SessionState::Running {
            return Err(Iec104Error::protocol_static(
                "I-frame outside data transfer",
            ));
        }

        self.apply_ack(recv_seq)?;
        self.recv_window.accept(send_seq)?;

        let (header, consumed) = AsduHeader::parse(&body)?;

        let meta = FrameMeta {
            frame_type: FrameType::IFrame,
            type_id: header.type_id,
            cot: header.cot,
            common_address: header.common_address,
            num_objects: header.vsq.count,
            peer: self.peer,
        };
        if !self.policy.check_frame(&meta).is_accept() {
            return Err(Iec104Error::PolicyViolation(
                "frame rejected by rate check".into(),
            ));
        }

        let event = match self.registry.decode_objects(&header, &body[consumed..]) {
            Ok(objects) => SessionEvent::Asdu(Asdu { header, objects }),
            Err(Iec104Error::UnhandledType(type_id)) => {
                debug!(peer = ?self.peer, type_id, "unhandled ASDU type");
                SessionEvent::Unhandled(UnhandledAsdu {
                    header,
                    raw: body.slice(consumed..),
                })
            }
            Err(err) => return Err(err),
        };
        let _ = self.events.send(event).await;

        self.schedule_ack().await
    }

    // ---- command handling ----

    /// Returns `true` when the command completed the session cleanly.
    async fn on_command(&mut self, cmd: Command) -> Result<bool> {
        match cmd {
            Command::Submit(asdu, done) => {
                if self.state != SessionState::Running {
                    let _ = done.send(Err(Iec104Error::NotRunning));
                    return Ok(false);
                }
                match self.registry.encode(&asdu) {
                    Ok(body) => {
                        if self.send_window.has_room() {
                            self.send_i_frame(body).await?;
                            let _ = done.send(Ok(()));
                        } else {
                            // Window full: hold the submission; the select
                            // loop stops polling commands until it drains.
                            self.pending_submit = Some((body, done));
                        }
                    }
                    Err(err) => {
                        let _ = done.send(Err(err));
                    }
                }
                Ok(false)
            }

            Command::StartDt(done) => match self.state {
                SessionState::Running => {
                    let _ = done.send(Ok(()));
                    Ok(false)
                }
                SessionState::Connecting if self.role == SessionRole::Client => {
                    if self.pending_start.is_some() {
                        let _ = done.send(Err(Iec104Error::protocol_static(
                            "STARTDT already in progress",
                        )));
                        return Ok(false);
                    }
                    self.pending_start = Some(done);
                    self.send_startdt_act().await?;
                    Ok(false)
                }
                _ => {
                    let _ = done.send(Err(Iec104Error::NotRunning));
                    Ok(false)
                }
            },

            Command::Stop(done) => self.begin_stop(Some(done)).await,
        }
    }

    /// Start the graceful STOPDT drain. Returns `true` when the session
    /// can stop right away (nothing to drain and no handshake owed).
    async fn begin_stop(&mut self, done: Option<oneshot::Sender<Result<()>>>) -> Result<bool> {
        match self.state {
            SessionState::Stopped => {
                if let Some(done) = done {
                    let _ = done.send(Ok(()));
                }
                Ok(true)
            }
            SessionState::Connecting => {
                // No data transfer yet; just close.
                if let Some(done) = done {
                    let _ = done.send(Ok(()));
                }
                Ok(true)
            }
            _ => {
                self.stopping = true;
                self.pending_stop = done;
                if let Some((_, pending)) = self.pending_submit.take() {
                    let _ = pending.send(Err(Iec104Error::NotRunning));
                }
                self.try_finish_stop().await?;
                Ok(false)
            }
        }
    }

    /// Once the send window drains, flush acknowledgements and send
    /// STOPDT act bounded by T1.
    async fn try_finish_stop(&mut self) -> Result<()> {
        if !self.stopping || self.stopdt_sent {
            return Ok(());
        }
        if !self.send_window.is_empty() {
            return Ok(()); // drain continues under the armed T1
        }
        self.flush_ack().await?;
        self.send_u(UFunction::StopDtAct).await?;
        self.stopdt_sent = true;
        self.t1_deadline = Some(Instant::now() + self.config.t1);
        Ok(())
    }

    // ---- timer handling ----

    fn next_deadline(&self) -> Option<Instant> {
        [
            self.t0_deadline,
            self.t1_deadline,
            self.t2_deadline,
            self.t3_deadline,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    async fn on_deadline(&mut self) -> Result<()> {
        let now = Instant::now();

        if self.t0_deadline.is_some_and(|d| d <= now) {
            return Err(Iec104Error::T0Timeout);
        }

        if self.t1_deadline.is_some_and(|d| d <= now) {
            // An expired test cycle with no I-frames outstanding is the
            // idle-test failure; anything else is a missing data ack.
            if self.testfr_pending && self.send_window.is_empty() && !self.stopdt_sent {
                return Err(Iec104Error::T3Timeout);
            }
            return Err(Iec104Error::T1Timeout);
        }

        if self.t2_deadline.is_some_and(|d| d <= now) {
            self.t2_deadline = None;
            self.flush_ack().await?;
        }

        if self.t3_deadline.is_some_and(|d| d <= now) {
            self.t3_deadline = None;
            // A TESTFR cycle already waiting on its con is not duplicated.
            if !self.testfr_pending {
                self.send_u(UFunction::TestFrAct).await?;
                self.testfr_pending = true;
                if self.t1_deadline.is_none() {
                    self.t1_deadline = Some(now + self.config.t1);
                }
            }
        }

        Ok(())
    }

    // ---- send paths ----

    async fn send_startdt_act(&mut self) -> Result<()> {
        self.send_u(UFunction::StartDtAct).await?;
        self.t1_deadline = Some(Instant::now() + self.config.t1);
        Ok(())
    }

    async fn send_u(&mut self, function: UFunction) -> Result<()> {
        let apdu = Apdu::u_frame(function);
        trace!(peer = ?self.peer, frame = %apdu, "tx");
        self.framed.send(apdu).await
    }

    async fn send_i_frame(&mut self, body: Bytes) -> Result<()> {
        let was_empty = self.send_window.is_empty();
        let ns = self.send_window.push(body.clone())?;
        let apdu = Apdu::i_frame(ns, self.recv_window.v_r(), body);
        trace!(peer = ?self.peer, frame = %apdu, "tx");
        self.framed.send(apdu).await?;

        // The I-frame piggybacks the acknowledgement.
        self.recv_window.ack_sent();
        self.t2_deadline = None;

        if was_empty {
            self.t1_deadline = Some(Instant::now() + self.config.t1);
        }
        Ok(())
    }

    async fn flush_ack(&mut self) -> Result<()> {
        if !self.recv_window.owes_ack() {
            return Ok(());
        }
        let apdu = Apdu::s_frame(self.recv_window.v_r());
        trace!(peer = ?self.peer, frame = %apdu, "tx");
        self.framed.send(apdu).await?;
        self.recv_window.ack_sent();
        self.t2_deadline = None;
        Ok(())
    }

    async fn schedule_ack(&mut self) -> Result<()> {
        if self.recv_window.must_ack() || !self.config.delayed_ack {
            return self.flush_ack().await;
        }
        if self.t2_deadline.is_none() {
            self.t2_deadline = Some(Instant::now() + self.config.t2);
        }
        Ok(())
    }

    async fn try_admit_pending(&mut self) -> Result<()> {
        if self.send_window.has_room() {
            if let Some((body, done)) = self.pending_submit.take() {
                self.send_i_frame(body).await?;
                let _ = done.send(Ok(()));
            }
        }
        Ok(())
    }

    // ---- state helpers ----

    fn apply_ack(&mut self, recv_seq: u16) -> Result<()> {
        let released = self.send_window.acknowledge(recv_seq)?;
        if released > 0 {
            self.refresh_t1(true);
        }
        Ok(())
    }

    /// Re-arm or cancel T1 after acknowledgement progress or a
    /// completed U-frame cycle. With `progress` the deadline restarts
    /// for the new oldest unacknowledged frame.
    fn refresh_t1(&mut self, progress: bool) {
        let needed = !self.send_window.is_empty()
            || self.testfr_pending
            || self.pending_start.is_some()
            || self.stopdt_sent;
        if !needed {
            self.t1_deadline = None;
        } else if progress {
            self.t1_deadline = Some(Instant::now() + self.config.t1);
        }
    }

    async fn enter_running(&mut self) {
        self.t0_deadline = None;
        self.t3_deadline = Some(Instant::now() + self.config.t3);
        self.set_state(SessionState::Running);
        info!(peer = ?self.peer, role = ?self.role, "data transfer started");
        let _ = self.events.send(SessionEvent::Started).await;
    }

    fn set_state(&mut self, state: SessionState) {
        self.state = state;
        let _ = self.state_tx.send(state);
    }
}

/// Reconstruct a terminal error kind for pending command completions.
/// The original error itself travels once through the event stream.
fn terminal_kind(err: &Iec104Error) -> Iec104Error {
    match err {
        Iec104Error::T0Timeout => Iec104Error::T0Timeout,
        Iec104Error::T1Timeout => Iec104Error::T1Timeout,
        Iec104Error::T3Timeout => Iec104Error::T3Timeout,
        Iec104Error::TransportClosed => Iec104Error::TransportClosed,
        Iec104Error::Aborted => Iec104Error::Aborted,
        Iec104Error::WindowOverflow(k) => Iec104Error::WindowOverflow(*k),
        Iec104Error::PolicyViolation(msg) => Iec104Error::PolicyViolation(msg.clone()),
        Iec104Error::BufferExceeded(n) => Iec104Error::BufferExceeded(*n),
        _ => Iec104Error::ChannelClosed,
    }
}
