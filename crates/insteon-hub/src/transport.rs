//! Outgoing side of a connection to the IM.
//!
//! The engine only ever writes whole commands and never blocks. Inbound data
//! is pushed into [`HubState`](crate::HubState) by whoever owns the read side.

use tokio::sync::mpsc;

use crate::error::TransportError;

/// Sink for bytes written to the IM.
pub trait Transport: Send {
    /// Queue `bytes` for writing.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }
}

/// Collects written frames in memory.
impl Transport for Vec<Vec<u8>> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.push(bytes.to_vec());
        Ok(())
    }
}

/// Transport that hands frames to a writer task over a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChannelTransport {
    /// Wrap the sending half of a writer channel.
    pub fn new(tx: mpsc::Sender<Vec<u8>>) -> Self {
        ChannelTransport { tx }
    }
}

impl Transport for ChannelTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        // Use try_send so the engine never waits on the socket
        self.tx.try_send(bytes.to_vec()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_transport_reports_full_and_closed() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut transport = ChannelTransport::new(tx);

        transport.write(&[0x02, 0x60]).unwrap();
        assert_eq!(transport.write(&[0x02, 0x60]), Err(TransportError::QueueFull));
        assert_eq!(rx.try_recv().unwrap(), vec![0x02, 0x60]);

        drop(rx);
        assert_eq!(transport.write(&[0x02, 0x60]), Err(TransportError::Closed));
    }

    #[test]
    fn test_vec_transport_records() {
        let mut frames: Vec<Vec<u8>> = Vec::new();
        frames.write(&[1, 2]).unwrap();
        frames.write(&[3]).unwrap();
        assert_eq!(frames, vec![vec![1, 2], vec![3]]);
    }
}
