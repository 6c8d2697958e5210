//! Capabilities consumed by the link.
//!
//! The link never owns a socket or a consumer. It pushes framed bytes into a
//! [`Transport`] and hands validated payloads to a [`Client`].

use std::io;
use std::sync::Arc;

/// The raw byte transport underneath the link.
///
/// Best-effort and order-preserving: bytes may be dropped or corrupted but
/// never reordered or duplicated. Each call carries exactly one encoded
/// frame.
pub trait Transport: Send + Sync {
    /// Push one encoded frame onto the wire.
    fn transmit(&self, bytes: &[u8]) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn transmit(&self, bytes: &[u8]) -> io::Result<()> {
        (**self).transmit(bytes)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn transmit(&self, bytes: &[u8]) -> io::Result<()> {
        (**self).transmit(bytes)
    }
}

/// The upper-layer consumer of delivered payloads.
///
/// `deliver` is called once per distinct frame, in frame order, and only
/// with bytes that passed checksum and sequence validation.
pub trait Client: Send {
    /// Accept one validated payload.
    fn deliver(&mut self, payload: Vec<u8>);
}

/// Collects payloads in memory, mostly useful in tests.
impl Client for Vec<Vec<u8>> {
    fn deliver(&mut self, payload: Vec<u8>) {
        self.push(payload);
    }
}

#[cfg(feature = "link")]
impl Client for tokio::sync::mpsc::UnboundedSender<Vec<u8>> {
    fn deliver(&mut self, payload: Vec<u8>) {
        // A dropped consumer is a sink with nobody listening.
        if self.send(payload).is_err() {
            tracing::debug!("client channel closed, payload dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<Vec<u8>>>);

    impl Transport for Recorder {
        fn transmit(&self, bytes: &[u8]) -> io::Result<()> {
            self.0
                .lock()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "poisoned"))?
                .push(bytes.to_vec());
            Ok(())
        }
    }

    #[test]
    fn test_arc_transport_forwards() {
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let shared: Arc<dyn Transport> = recorder.clone();
        shared.transmit(b"{abc}").unwrap();
        shared.transmit(b"{}").unwrap();

        let frames = recorder.0.lock().unwrap();
        assert_eq!(*frames, vec![b"{abc}".to_vec(), b"{}".to_vec()]);
    }

    #[test]
    fn test_vec_client_collects_in_order() {
        let mut client: Vec<Vec<u8>> = Vec::new();
        client.deliver(vec![1, 2]);
        client.deliver(vec![]);
        client.deliver(vec![3]);
        assert_eq!(client, vec![vec![1, 2], vec![], vec![3]]);
    }
}
