//! Async front end.
//!
//! A hub task exclusively owns the [`HubState`] of one connection. Callers
//! talk to it through a [`HubClient`]: requests go in over an `mpsc`
//! channel, each command's result comes back on its own `oneshot`, and
//! events fan out on a `broadcast` channel. A separate writer task owns the
//! write half of the stream so the hub task never waits on the socket.

use std::future::pending;
use std::time::Duration;

use insteon_protocol::{Command, DeviceId, DeviceInfo, LinkRecord, Message, DEFAULT_HUB_PORT};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::command::{CommandOptions, CommandStatus, OutgoingCommand, PendingMatcher};
use crate::config::HubConfig;
use crate::devices::DeviceKind;
use crate::error::{CommandError, CommandResult, HubError, HubResult, TransportError};
use crate::event::HubEvent;
use crate::hub::HubState;
use crate::transport::ChannelTransport;

/// Size of the socket read buffer.
const READ_BUFFER_SIZE: usize = 1024;

/// Frames the writer task may have queued.
const WRITE_QUEUE_CAPACITY: usize = 64;

// ============================================================================
// Types
// ============================================================================

/// Requests handled by the hub task.
enum Request {
    /// Queue a command.
    Send(OutgoingCommand),
    /// Cancel the in-flight command.
    CancelInProgress(oneshot::Sender<bool>),
    /// Cancel matching queued commands.
    CancelPending(PendingMatcher, oneshot::Sender<usize>),
    /// Register a device.
    Register(DeviceId, DeviceKind),
    /// Stop the hub task.
    Shutdown,
}

/// The IM's own address and firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImInfo {
    /// IM address.
    pub id: DeviceId,
    /// Category, subcategory and firmware.
    pub info: DeviceInfo,
}

/// Handle to a running hub task. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HubClient {
    requests: mpsc::Sender<Request>,
    events: broadcast::Sender<HubEvent>,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Request::Send(cmd) => write!(f, "Send({})", cmd.hex()),
            Request::CancelInProgress(_) => write!(f, "CancelInProgress"),
            Request::CancelPending(m, _) => write!(f, "CancelPending({:?})", m),
            Request::Register(id, kind) => write!(f, "Register({}, {:?})", id, kind),
            Request::Shutdown => write!(f, "Shutdown"),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

impl HubClient {
    /// Start a hub task over any byte stream.
    ///
    /// Must be called within a tokio runtime. The returned receiver is
    /// subscribed before the task starts, so it sees every event from
    /// `Connect` on. Receivers from [`subscribe`](Self::subscribe) only see
    /// events published after they were created.
    pub fn connect<S>(stream: S, config: HubConfig) -> HubResult<(Self, broadcast::Receiver<HubEvent>)>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        config.validate()?;
        let (request_tx, request_rx) = mpsc::channel(config.request_capacity);
        let (event_tx, event_rx) = broadcast::channel(config.event_capacity);
        let (frame_tx, frame_rx) = mpsc::channel(WRITE_QUEUE_CAPACITY);
        let (error_tx, error_rx) = mpsc::unbounded_channel();

        let (reader, writer) = tokio::io::split(stream);
        let state = HubState::new(config, ChannelTransport::new(frame_tx));

        tokio::spawn(run_writer(writer, frame_rx, error_tx));
        tokio::spawn(run_hub(state, reader, request_rx, error_rx, event_tx.clone()));

        let client = HubClient {
            requests: request_tx,
            events: event_tx,
        };
        Ok((client, event_rx))
    }

    /// Connect to a hub over TCP. A bare host uses the default hub port.
    pub async fn connect_tcp(
        addr: impl ToSocketAddrs,
        config: HubConfig,
    ) -> HubResult<(Self, broadcast::Receiver<HubEvent>)> {
        config.validate()?;
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        if let Ok(peer) = stream.peer_addr() {
            info!(%peer, "connected to hub");
        }
        Self::connect(stream, config)
    }

    /// Connect to `host` on the default hub port.
    pub async fn connect_host(
        host: &str,
        config: HubConfig,
    ) -> HubResult<(Self, broadcast::Receiver<HubEvent>)> {
        Self::connect_tcp((host, DEFAULT_HUB_PORT), config).await
    }

    /// Receive hub events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.events.subscribe()
    }

    async fn request(&self, request: Request) -> Result<(), CommandError> {
        self.requests
            .send(request)
            .await
            .map_err(|_| CommandError::Closed)
    }

    /// Queue a command and wait for it to settle.
    pub async fn send(&self, mut command: OutgoingCommand) -> CommandResult {
        let result = command.subscribe();
        self.request(Request::Send(command)).await?;
        result.await.map_err(|_| CommandError::Closed)?
    }

    /// Queue a command with its usual settle rules.
    pub async fn send_command(&self, command: Command) -> CommandResult {
        self.send(OutgoingCommand::new(command)).await
    }

    /// Register a device so its messages become device events.
    pub async fn register_device(&self, id: DeviceId, kind: DeviceKind) -> HubResult<()> {
        Ok(self.request(Request::Register(id, kind)).await?)
    }

    /// Cancel the in-flight command. Returns whether there was one.
    pub async fn cancel_in_progress(&self) -> HubResult<bool> {
        let (tx, rx) = oneshot::channel();
        self.request(Request::CancelInProgress(tx)).await?;
        Ok(rx.await.map_err(|_| CommandError::Closed)?)
    }

    /// Cancel queued commands selected by `matcher`. Returns how many.
    pub async fn cancel_pending(&self, matcher: PendingMatcher) -> HubResult<usize> {
        let (tx, rx) = oneshot::channel();
        self.request(Request::CancelPending(matcher, tx)).await?;
        Ok(rx.await.map_err(|_| CommandError::Closed)?)
    }

    /// Stop the hub task. Outstanding commands fail with `Closed`.
    pub async fn shutdown(&self) {
        let _ = self.requests.send(Request::Shutdown).await;
    }

    // ========================================================================
    // Convenience
    // ========================================================================

    /// Read the IM's address and firmware.
    pub async fn im_info(&self) -> HubResult<ImInfo> {
        let status = self.send_command(Command::GetImInfo).await?;
        match status.echo {
            Some(Message::ImInfo { id, info, ack: true, .. }) => Ok(ImInfo { id, info }),
            _ => Err(HubError::NoResponse("get IM info")),
        }
    }

    /// Ping a device.
    pub async fn ping(&self, id: DeviceId) -> HubResult<CommandStatus> {
        Ok(self.send_command(Command::ping(id)).await?)
    }

    /// Turn a device on at `level`.
    pub async fn turn_on(&self, id: DeviceId, level: u8) -> HubResult<CommandStatus> {
        Ok(self.send_command(Command::turn_on(id, level)).await?)
    }

    /// Turn a device off.
    pub async fn turn_off(&self, id: DeviceId) -> HubResult<CommandStatus> {
        Ok(self.send_command(Command::turn_off(id)).await?)
    }

    /// Read a device's level. The device ACK carries it in cmd2.
    pub async fn status(&self, id: DeviceId) -> HubResult<u8> {
        let status = self.send_command(Command::status_request(id, 0x00)).await?;
        match status.standard {
            Some(ack) if status.success => Ok(ack.cmd2),
            _ => Err(HubError::NoResponse("status request")),
        }
    }

    /// Read the IM's ALL-Link database.
    pub async fn links(&self) -> HubResult<Vec<LinkRecord>> {
        let mut records = Vec::new();
        let mut command = Command::GetFirstLink;
        loop {
            let status = self.send_command(command).await?;
            match status.response {
                Some(Message::LinkRecord { record, .. }) => records.push(record),
                _ => break,
            }
            command = Command::GetNextLink;
        }
        debug!(count = records.len(), "read link database");
        Ok(records)
    }

    /// Put the IM in linking mode until a device links or `timeout` passes.
    pub async fn start_linking(&self, code: u8, group: u8, timeout: Duration) -> HubResult<CommandStatus> {
        let command = Command::start_linking(code, group);
        // Linking is not worth repeating on timeout
        let options = CommandOptions::for_command(&command)
            .with_timeout(timeout)
            .with_retries(0);
        Ok(self.send(OutgoingCommand::with_options(command, options)).await?)
    }

    /// Leave linking mode.
    pub async fn cancel_linking(&self) -> HubResult<CommandStatus> {
        Ok(self.send_command(Command::CancelLinking).await?)
    }

    /// Send an ALL-Link command to a group and wait for the cleanup report.
    pub async fn scene(&self, group: u8, cmd1: u8, cmd2: u8) -> HubResult<CommandStatus> {
        Ok(self.send_command(Command::all_link(group, cmd1, cmd2)).await?)
    }
}

// ============================================================================
// Tasks
// ============================================================================

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

/// Write queued frames until the channel closes or a write fails.
async fn run_writer<S: AsyncWrite>(
    mut writer: WriteHalf<S>,
    mut frames: mpsc::Receiver<Vec<u8>>,
    errors: mpsc::UnboundedSender<TransportError>,
) {
    while let Some(frame) = frames.recv().await {
        let result = match writer.write_all(&frame).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(error = %e, "hub write failed");
            let _ = errors.send(e.into());
            return;
        }
    }
}

/// Own the hub state until the stream ends or every client is gone.
async fn run_hub<S: AsyncRead>(
    mut state: HubState<ChannelTransport>,
    mut reader: ReadHalf<S>,
    mut requests: mpsc::Receiver<Request>,
    mut write_errors: mpsc::UnboundedReceiver<TransportError>,
    events: broadcast::Sender<HubEvent>,
) {
    let _ = events.send(HubEvent::Connect);
    let mut read_buf = [0u8; READ_BUFFER_SIZE];
    let mut had_error = false;

    loop {
        let deadline = state.poll_timeout();
        let timer = async {
            match deadline {
                Some(deadline) => sleep_until(Instant::from_std(deadline)).await,
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            request = requests.recv() => {
                match request {
                    Some(Request::Shutdown) | None => break,
                    Some(request) => handle_request(&mut state, request),
                }
            }

            result = reader.read(&mut read_buf) => {
                match result {
                    Ok(0) => {
                        debug!("hub closed the connection");
                        break;
                    }
                    Ok(n) => state.push_bytes(&read_buf[..n], now()),
                    Err(e) => {
                        warn!(error = %e, "hub read failed");
                        let _ = events.send(HubEvent::Error(e.to_string()));
                        had_error = true;
                        break;
                    }
                }
            }

            Some(error) = write_errors.recv() => {
                had_error = true;
                state.transport_failed(error, now());
            }

            _ = timer => state.handle_timeout(now()),
        }

        publish(&mut state, &events);
    }

    state.close();
    publish(&mut state, &events);
    let _ = events.send(HubEvent::Close { had_error });
}

fn handle_request(state: &mut HubState<ChannelTransport>, request: Request) {
    match request {
        Request::Send(command) => state.enqueue(command, now()),
        Request::CancelInProgress(reply) => {
            let _ = reply.send(state.cancel_in_progress(now()));
        }
        Request::CancelPending(matcher, reply) => {
            let _ = reply.send(state.cancel_pending(&matcher));
        }
        Request::Register(id, kind) => state.register_device(id, kind),
        Request::Shutdown => {}
    }
}

fn publish(state: &mut HubState<ChannelTransport>, events: &broadcast::Sender<HubEvent>) {
    while let Some(event) = state.poll_event() {
        // No subscribers is fine
        let _ = events.send(event);
    }
}
