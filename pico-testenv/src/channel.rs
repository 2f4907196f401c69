use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use pico_continuous::Channel;

/// A [`Channel`] backed by a pair of in-process `mpsc` queues rather than a
/// real socket, for driving both sides of a handshake or reauth cycle from
/// the same test thread (or from two spawned threads, for the drivers'
/// genuinely blocking read path). `read_message` respects whatever timeout
/// `set_timeout` last armed, the same contract a real rendezvous transport
/// must honor.
pub struct InMemoryChannel {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    timeout: Duration,
    url: String,
}

impl InMemoryChannel {
    /// Builds a connected pair: writes to one arrive as reads on the other.
    pub fn pair(url: impl Into<String>) -> (Self, Self) {
        let url = url.into();
        let (tx_a, rx_b) = mpsc::channel();
        let (tx_b, rx_a) = mpsc::channel();
        (
            InMemoryChannel { tx: tx_a, rx: rx_a, timeout: Duration::from_millis(0), url: url.clone() },
            InMemoryChannel { tx: tx_b, rx: rx_b, timeout: Duration::from_millis(0), url },
        )
    }
}

impl Channel for InMemoryChannel {
    fn open(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn read_message(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        match self.rx.recv_timeout(self.timeout) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "peer dropped the channel"))
            }
        }
    }

    fn write_message(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.tx
            .send(bytes.to_vec())
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::BrokenPipe, "peer dropped the channel"))
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    fn get_url(&self) -> String {
        self.url.clone()
    }
}

/// A single, one-shot transformation applied to a message before it reaches
/// the peer: used to reproduce spec.md section 8's tamper and replay
/// scenarios without hand-rolling byte surgery in every test.
#[cfg(feature = "testing")]
#[derive(Clone, Copy)]
pub enum Fault {
    /// Flip one byte at `offset` in the next message written.
    FlipByte { offset: usize },
    /// Resend the previous message instead of the new one (replay).
    ReplayPrevious,
    /// Drop the next message silently; the peer's read times out.
    Drop,
}

/// Wraps an [`InMemoryChannel`] so a test can corrupt or replay exactly one
/// outgoing message, matching spec.md section 8 scenarios 4 ("Replay") and
/// 5 ("Tampered ciphertext") without touching the protocol engine itself.
#[cfg(feature = "testing")]
pub struct FaultInjectingChannel {
    inner: InMemoryChannel,
    pending_fault: Option<Fault>,
    last_sent: Option<Vec<u8>>,
}

#[cfg(feature = "testing")]
impl FaultInjectingChannel {
    pub fn new(inner: InMemoryChannel) -> Self {
        FaultInjectingChannel { inner, pending_fault: None, last_sent: None }
    }

    /// Arms a fault to apply to the very next `write_message` call.
    pub fn inject(&mut self, fault: Fault) {
        self.pending_fault = Some(fault);
    }
}

#[cfg(feature = "testing")]
impl Channel for FaultInjectingChannel {
    fn open(&mut self) -> std::io::Result<()> {
        self.inner.open()
    }

    fn close(&mut self) -> std::io::Result<()> {
        self.inner.close()
    }

    fn read_message(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        self.inner.read_message()
    }

    fn write_message(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let result = match self.pending_fault.take() {
            Some(Fault::FlipByte { offset }) => {
                let mut corrupted = bytes.to_vec();
                if let Some(byte) = corrupted.get_mut(offset) {
                    *byte ^= 0xff;
                }
                self.inner.write_message(&corrupted)
            }
            Some(Fault::ReplayPrevious) => match &self.last_sent {
                Some(previous) => self.inner.write_message(previous),
                None => self.inner.write_message(bytes),
            },
            Some(Fault::Drop) => Ok(()),
            None => self.inner.write_message(bytes),
        };
        self.last_sent = Some(bytes.to_vec());
        result
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.inner.set_timeout(timeout);
    }

    fn get_url(&self) -> String {
        self.inner.get_url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_delivers_writes_as_reads() {
        let (mut a, mut b) = InMemoryChannel::pair("mem://test");
        b.set_timeout(Duration::from_millis(50));
        a.write_message(b"hello").unwrap();
        assert_eq!(b.read_message().unwrap(), Some(b"hello".to_vec()));
    }

    #[test]
    fn read_times_out_with_none_rather_than_error() {
        let (_a, mut b) = InMemoryChannel::pair("mem://test");
        b.set_timeout(Duration::from_millis(10));
        assert_eq!(b.read_message().unwrap(), None);
    }
}
