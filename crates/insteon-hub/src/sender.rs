//! Command queue and single-flight sender.
//!
//! The IM handles one command at a time, so exactly zero or one command is
//! in flight and the rest wait in a FIFO queue. The in-flight command moves
//! through three timers:
//!
//! ```text
//!   enqueue ──► Write ──(write)──► Response ──(settled)──► next command
//!                 ▲                   │  │
//!                 │                   │  └─(timeout, retries left)─► write again
//!                 └──── NakRetry ◄────┘ (NAK)
//! ```
//!
//! Nothing here does I/O on its own: writes go through the [`Transport`]
//! passed in and every time-dependent call takes `now`.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use insteon_protocol::{DeviceId, Message, MessageType};
use tracing::{debug, trace, warn};

use crate::command::{CommandKind, CommandStatus, OutgoingCommand, PendingMatcher};
use crate::config::RetryPolicy;
use crate::error::{CommandError, CommandResult, TransportError};
use crate::event::HubEvent;
use crate::transport::Transport;

// ============================================================================
// Types
// ============================================================================

/// What the in-flight command's timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// First write, after the write delay.
    Write,
    /// Waiting for the response.
    Response,
    /// Resend after a NAK.
    NakRetry,
}

/// The command currently owning the IM.
#[derive(Debug)]
struct InFlight {
    command: OutgoingCommand,
    status: CommandStatus,
    timer: TimerKind,
    deadline: Instant,
    written: bool,
}

/// Last settled direct command, for recognising late ACKs.
#[derive(Debug, Clone, Copy)]
struct SettledDirect {
    target: DeviceId,
    cmd1: u8,
    at: Instant,
}

/// Command queue with at most one command in flight.
#[derive(Debug)]
pub struct CommandSender {
    policy: RetryPolicy,
    queue: VecDeque<OutgoingCommand>,
    current: Option<InFlight>,
    last_settled: Option<SettledDirect>,
}

impl CommandSender {
    /// Create an idle sender.
    pub fn new(policy: RetryPolicy) -> Self {
        CommandSender {
            policy,
            queue: VecDeque::new(),
            current: None,
            last_settled: None,
        }
    }

    /// The retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The in-flight command.
    pub fn in_flight(&self) -> Option<&OutgoingCommand> {
        self.current.as_ref().map(|c| &c.command)
    }

    /// Current timer of the in-flight command.
    pub fn timer(&self) -> Option<TimerKind> {
        self.current.as_ref().map(|c| c.timer)
    }

    /// Number of queued commands, not counting the in-flight one.
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Nothing in flight and nothing queued.
    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.queue.is_empty()
    }

    /// The in-flight command has been written and awaits its response.
    pub fn is_awaiting_response(&self) -> bool {
        matches!(&self.current, Some(c) if c.written && c.timer == TimerKind::Response)
    }

    /// When the in-flight command's timer fires.
    pub fn poll_timeout(&self) -> Option<Instant> {
        self.current.as_ref().map(|c| c.deadline)
    }

    /// Whether an ACK from `id` with `cmd1` answers a command we sent: the
    /// in-flight one, or the last settled one within `window`.
    pub fn recently_sent(&self, id: DeviceId, cmd1: u8, now: Instant, window: Duration) -> bool {
        if let Some(current) = &self.current {
            if current.command.target() == Some(id) && current.command.command().cmd1() == Some(cmd1) {
                return true;
            }
        }
        matches!(self.last_settled, Some(last)
            if last.target == id
                && last.cmd1 == cmd1
                && now.saturating_duration_since(last.at) < window)
    }

    // ========================================================================
    // Queue
    // ========================================================================

    /// Queue a command, making it current if nothing is in flight.
    pub fn enqueue(&mut self, command: OutgoingCommand, now: Instant) {
        if self.current.is_none() {
            self.start(command, now);
        } else {
            trace!(raw = %command.hex(), queued = self.queue.len() + 1, "command queued");
            self.queue.push_back(command);
        }
    }

    fn start(&mut self, command: OutgoingCommand, now: Instant) {
        trace!(raw = %command.hex(), "command current");
        self.current = Some(InFlight {
            command,
            status: CommandStatus::default(),
            timer: TimerKind::Write,
            deadline: now + self.policy.write_delay,
            written: false,
        });
    }

    fn advance(&mut self, now: Instant) {
        if let Some(next) = self.queue.pop_front() {
            self.start(next, now);
        }
    }

    /// Resolve the in-flight command and make the next one current.
    fn settle(&mut self, result: CommandResult, now: Instant) {
        let Some(mut current) = self.current.take() else {
            return;
        };
        if let (Some(target), Some(cmd1)) = (current.command.target(), current.command.command().cmd1()) {
            self.last_settled = Some(SettledDirect {
                target,
                cmd1,
                at: now,
            });
        }
        match &result {
            Ok(status) => debug!(
                raw = %current.command.hex(),
                success = status.success,
                nack = status.nack,
                timed_out = status.timed_out,
                "command settled"
            ),
            Err(e) => debug!(raw = %current.command.hex(), error = %e, "command failed"),
        }
        current.command.resolve(result);
        self.advance(now);
    }

    fn settle_current(&mut self, now: Instant) {
        if let Some(current) = &self.current {
            let status = current.status.clone();
            self.settle(Ok(status), now);
        }
    }

    /// Reject the in-flight command with `Cancelled`.
    pub fn cancel_in_progress(&mut self, now: Instant) -> bool {
        if self.current.is_none() {
            return false;
        }
        self.settle(Err(CommandError::Cancelled), now);
        true
    }

    /// Reject every queued command selected by `matcher`. The in-flight
    /// command is never touched.
    pub fn cancel_pending(&mut self, matcher: &PendingMatcher) -> usize {
        let mut kept = VecDeque::with_capacity(self.queue.len());
        let mut removed = 0;
        for mut command in self.queue.drain(..) {
            if matcher.matches(command.raw()) {
                command.reject(CommandError::Cancelled);
                removed += 1;
            } else {
                kept.push_back(command);
            }
        }
        self.queue = kept;
        if removed > 0 {
            debug!(removed, ?matcher, "cancelled queued commands");
        }
        removed
    }

    /// Reject the in-flight command after a write failure.
    pub fn transport_failed(&mut self, error: TransportError, now: Instant) {
        if self.current.is_some() {
            self.settle(Err(CommandError::Transport(error)), now);
        }
    }

    /// Reject everything with `Closed`.
    pub fn close(&mut self) {
        if let Some(mut current) = self.current.take() {
            current.command.reject(CommandError::Closed);
        }
        for mut command in self.queue.drain(..) {
            command.reject(CommandError::Closed);
        }
    }

    // ========================================================================
    // Timers
    // ========================================================================

    /// Fire the in-flight timer if it is due.
    pub fn handle_timeout<T: Transport>(
        &mut self,
        now: Instant,
        transport: &mut T,
        events: &mut VecDeque<HubEvent>,
    ) {
        let Some(current) = &mut self.current else {
            return;
        };
        if current.deadline > now {
            return;
        }

        match current.timer {
            TimerKind::Write | TimerKind::NakRetry => self.write_current(now, transport, events),
            TimerKind::Response => {
                let options = *current.command.options();
                let definitive = options.wait_for_extended && current.status.standard.is_some();
                let retries = options.retries.unwrap_or(self.policy.retries);
                if current.status.retries < retries && !definitive {
                    current.status.retries += 1;
                    debug!(
                        raw = %current.command.hex(),
                        retry = current.status.retries,
                        "response timeout, resending"
                    );
                    current.timer = TimerKind::Write;
                    current.deadline = now + self.policy.write_delay;
                } else {
                    current.status.timed_out = true;
                    debug!(raw = %current.command.hex(), "response timeout, giving up");
                    self.settle_current(now);
                }
            }
        }
    }

    fn write_current<T: Transport>(
        &mut self,
        now: Instant,
        transport: &mut T,
        events: &mut VecDeque<HubEvent>,
    ) {
        let Some(current) = &mut self.current else {
            return;
        };

        events.push_back(HubEvent::SendCommand {
            raw: current.command.hex().to_string(),
        });
        match transport.write(current.command.raw()) {
            Ok(()) => {
                trace!(raw = %current.command.hex(), "command written");
                let timeout = current.command.options().timeout.unwrap_or(self.policy.timeout);
                current.written = true;
                current.timer = TimerKind::Response;
                current.deadline = now + timeout;
            }
            Err(e) => {
                warn!(raw = %current.command.hex(), error = %e, "write failed");
                events.push_back(HubEvent::Error(e.to_string()));
                self.transport_failed(e, now);
            }
        }
    }

    // ========================================================================
    // Responses
    // ========================================================================

    /// A NAK for the in-flight command: back off and resend, or give up
    /// once the NAK budget is spent.
    pub fn on_nak(&mut self, now: Instant) {
        let Some(current) = &mut self.current else {
            return;
        };
        current.status.naks += 1;
        let naks = current.status.naks;

        if naks > self.policy.nak_max_retries {
            warn!(raw = %current.command.hex(), naks, "NAK limit reached");
            current.status.nack = true;
            self.settle_current(now);
            return;
        }

        let delay = self.policy.nak_delay(naks);
        debug!(
            raw = %current.command.hex(),
            naks,
            delay_ms = delay.as_millis() as u64,
            "NAK, backing off"
        );
        current.timer = TimerKind::NakRetry;
        current.deadline = now + delay;
    }

    /// Offer a received message to the in-flight command. Returns whether
    /// the command consumed it; the command may settle as a result.
    pub fn offer(&mut self, msg: &Message, now: Instant) -> bool {
        let Some(current) = &mut self.current else {
            return false;
        };
        if !current.written {
            return false;
        }

        let options = *current.command.options();
        let kind = current.command.kind();
        let target = current.command.target();

        if let Some(ack) = msg.echo_ack() {
            let body = msg.echo_body().unwrap_or_default();
            if !body.starts_with(current.command.hex()) {
                return false;
            }
            current.status.echo = Some(msg.clone());
            if ack {
                current.status.ack = true;
                if options.exit_on_ack {
                    current.status.success = true;
                    self.settle_current(now);
                }
            } else if options.nak_ends_exchange {
                current.status.nack = true;
                self.settle_current(now);
            } else {
                self.on_nak(now);
            }
            return true;
        }

        match msg {
            Message::Standard(m) if target == Some(m.from) => match m.message_type() {
                MessageType::DirectAck if current.status.ack => {
                    current.status.standard = Some(m.clone());
                    if !options.wait_for_extended && !options.is_standard_response {
                        current.status.success = true;
                        self.settle_current(now);
                    }
                    true
                }
                MessageType::DirectNak if current.status.ack => {
                    current.status.standard = Some(m.clone());
                    current.status.nack = true;
                    self.settle_current(now);
                    true
                }
                MessageType::Direct if options.is_standard_response => {
                    current.status.response = Some(msg.clone());
                    current.status.success = true;
                    self.settle_current(now);
                    true
                }
                _ => false,
            },
            Message::Extended(m)
                if target == Some(m.from)
                    && (options.wait_for_extended || options.response_count.is_some()) =>
            {
                if options.wait_for_extended && current.status.standard.is_none() {
                    return false;
                }
                current.status.extended.push(m.clone());
                if current.status.extended.len() >= options.expected_responses() {
                    current.status.success = true;
                    self.settle_current(now);
                }
                true
            }
            Message::LinkComplete { .. } if options.wait_for_linking => {
                current.status.response = Some(msg.clone());
                current.status.success = true;
                self.settle_current(now);
                true
            }
            Message::LinkRecord { .. }
                if matches!(kind, CommandKind::GetFirstLink | CommandKind::GetNextLink) =>
            {
                current.status.response = Some(msg.clone());
                current.status.success = true;
                self.settle_current(now);
                true
            }
            Message::CleanupStatus { ack, .. } if kind == CommandKind::AllLink => {
                current.status.response = Some(msg.clone());
                current.status.success = *ack;
                current.status.nack = !*ack;
                self.settle_current(now);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use insteon_protocol::{Command, DeviceId};

    use super::*;

    fn light() -> DeviceId {
        "1A2B3C".parse().unwrap()
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::default()
    }

    #[test]
    fn test_enqueue_waits_for_write_delay() {
        let mut sender = CommandSender::new(policy());
        let mut frames: Vec<Vec<u8>> = Vec::new();
        let mut events = VecDeque::new();
        let t0 = Instant::now();

        sender.enqueue(OutgoingCommand::new(Command::ping(light())), t0);
        assert_eq!(sender.timer(), Some(TimerKind::Write));
        assert_eq!(sender.poll_timeout(), Some(t0 + Duration::from_millis(50)));

        sender.handle_timeout(t0 + Duration::from_millis(10), &mut frames, &mut events);
        assert!(frames.is_empty());

        sender.handle_timeout(t0 + Duration::from_millis(50), &mut frames, &mut events);
        assert_eq!(frames.len(), 1);
        assert!(sender.is_awaiting_response());
        assert_eq!(
            sender.poll_timeout(),
            Some(t0 + Duration::from_millis(50) + Duration::from_millis(5000))
        );
    }

    #[test]
    fn test_timeout_resend_waits_for_write_delay() {
        let mut sender = CommandSender::new(policy());
        let mut frames: Vec<Vec<u8>> = Vec::new();
        let mut events = VecDeque::new();
        let t0 = Instant::now();
        let timed_out = t0 + Duration::from_millis(50) + Duration::from_millis(5000);

        sender.enqueue(OutgoingCommand::new(Command::ping(light())), t0);
        sender.handle_timeout(t0 + Duration::from_millis(50), &mut frames, &mut events);
        assert_eq!(frames.len(), 1);

        sender.handle_timeout(timed_out, &mut frames, &mut events);
        assert_eq!(frames.len(), 1);
        assert_eq!(sender.timer(), Some(TimerKind::Write));
        assert_eq!(sender.poll_timeout(), Some(timed_out + Duration::from_millis(50)));

        sender.handle_timeout(timed_out + Duration::from_millis(50), &mut frames, &mut events);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], frames[1]);
        assert_eq!(sender.timer(), Some(TimerKind::Response));
    }

    #[test]
    fn test_second_command_is_queued() {
        let mut sender = CommandSender::new(policy());
        let t0 = Instant::now();
        sender.enqueue(OutgoingCommand::new(Command::ping(light())), t0);
        sender.enqueue(OutgoingCommand::new(Command::GetImInfo), t0);
        assert_eq!(sender.pending_len(), 1);
        assert_eq!(sender.in_flight().unwrap().kind(), CommandKind::Direct);
    }

    #[test]
    fn test_cancel_in_progress_advances() {
        let mut sender = CommandSender::new(policy());
        let t0 = Instant::now();
        let mut first = OutgoingCommand::new(Command::ping(light()));
        let mut rx = first.subscribe();
        sender.enqueue(first, t0);
        sender.enqueue(OutgoingCommand::new(Command::GetImInfo), t0);

        assert!(sender.cancel_in_progress(t0));
        assert_eq!(rx.try_recv().unwrap(), Err(CommandError::Cancelled));
        assert_eq!(sender.in_flight().unwrap().kind(), CommandKind::ImInfo);
        assert_eq!(sender.pending_len(), 0);
    }

    #[test]
    fn test_close_rejects_everything() {
        let mut sender = CommandSender::new(policy());
        let t0 = Instant::now();
        let mut first = OutgoingCommand::new(Command::ping(light()));
        let mut second = OutgoingCommand::new(Command::GetImInfo);
        let mut rx1 = first.subscribe();
        let mut rx2 = second.subscribe();
        sender.enqueue(first, t0);
        sender.enqueue(second, t0);

        sender.close();
        assert_eq!(rx1.try_recv().unwrap(), Err(CommandError::Closed));
        assert_eq!(rx2.try_recv().unwrap(), Err(CommandError::Closed));
        assert!(sender.is_idle());
    }

    #[test]
    fn test_recently_sent_window() {
        let mut sender = CommandSender::new(policy());
        let mut frames: Vec<Vec<u8>> = Vec::new();
        let mut events = VecDeque::new();
        let t0 = Instant::now();
        let window = Duration::from_secs(5);

        sender.enqueue(OutgoingCommand::new(Command::turn_on(light(), 0xFF)), t0);
        assert!(sender.recently_sent(light(), 0x11, t0, window));
        assert!(!sender.recently_sent(light(), 0x13, t0, window));

        sender.handle_timeout(t0 + Duration::from_millis(50), &mut frames, &mut events);
        sender.cancel_in_progress(t0 + Duration::from_secs(1));
        assert!(sender.recently_sent(light(), 0x11, t0 + Duration::from_secs(5), window));
        assert!(!sender.recently_sent(light(), 0x11, t0 + Duration::from_secs(7), window));
    }

    #[test]
    fn test_write_failure_rejects_with_transport_error() {
        struct Broken;
        impl Transport for Broken {
            fn write(&mut self, _bytes: &[u8]) -> Result<(), TransportError> {
                Err(TransportError::Closed)
            }
        }

        let mut sender = CommandSender::new(policy());
        let mut events = VecDeque::new();
        let t0 = Instant::now();
        let mut cmd = OutgoingCommand::new(Command::GetImInfo);
        let mut rx = cmd.subscribe();
        sender.enqueue(cmd, t0);
        sender.handle_timeout(t0 + Duration::from_millis(50), &mut Broken, &mut events);

        assert_eq!(
            rx.try_recv().unwrap(),
            Err(CommandError::Transport(TransportError::Closed))
        );
        assert!(events.iter().any(|e| matches!(e, HubEvent::Error(_))));
        assert!(sender.is_idle());
    }
}
