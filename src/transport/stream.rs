//! Running a link over async byte streams.
//!
//! The link's [`Transport`](crate::core::Transport) is synchronous, so the
//! write side goes through a channel drained by a writer task. The read
//! side is a loop feeding every read into a [`LinkReceiver`].
//!
//! ```ignore
//! let (read, write) = tokio::io::split(stream);
//! let (transport, writer) = stream::spawn_writer(write);
//! let (mut sender, mut receiver) =
//!     DataLink::new(transport, client, LinkConfig::default())?.into_split();
//! tokio::spawn(async move { stream::pump(read, &mut receiver).await });
//! sender.send(b"hello").await?;
//! ```

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::{Client, LinkResult, Transport};
use crate::link::LinkReceiver;

use super::channel::ChannelTransport;

/// Read buffer size for [`pump`].
pub const READ_BUFFER_SIZE: usize = 4096;

/// Spawn a task writing every transmitted frame to `writer`.
///
/// The task ends, returning `Ok(())`, once every clone of the transport is
/// dropped, or with the first write error.
pub fn spawn_writer<W>(writer: W) -> (ChannelTransport, JoinHandle<std::io::Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (transport, rx) = ChannelTransport::pair();
    let handle = tokio::spawn(write_loop(writer, rx));
    (transport, handle)
}

async fn write_loop<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = rx.recv().await {
        writer.write_all(&frame).await?;
        writer.flush().await?;
    }
    writer.shutdown().await
}

/// Feed everything read from `reader` into `receiver` until end of stream.
pub async fn pump<R, T, C>(mut reader: R, receiver: &mut LinkReceiver<T, C>) -> LinkResult<()>
where
    R: AsyncRead + Unpin,
    T: Transport,
    C: Client,
{
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            tracing::debug!(buffered = receiver.buffered(), "stream closed");
            return Ok(());
        }
        receiver.receive(&buf[..n])?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::{DataLink, LinkConfig};

    #[tokio::test]
    async fn test_writer_forwards_frames() {
        let (client_end, mut server_end) = tokio::io::duplex(64);
        let (transport, writer) = spawn_writer(client_end);

        transport.transmit(b"{one}").unwrap();
        transport.transmit(b"{two}").unwrap();
        drop(transport);
        writer.await.unwrap().unwrap();

        let mut received = Vec::new();
        server_end.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"{one}{two}");
    }

    #[tokio::test]
    async fn test_link_over_duplex_streams() {
        let (a, b) = tokio::io::duplex(16);
        let (a_read, a_write) = tokio::io::split(a);
        let (b_read, b_write) = tokio::io::split(b);

        let (a_transport, _a_writer) = spawn_writer(a_write);
        let (b_transport, _b_writer) = spawn_writer(b_write);

        let (mut a_sender, mut a_receiver) =
            DataLink::new(a_transport, Vec::new(), LinkConfig::default())
                .unwrap()
                .into_split();
        let (delivered_tx, mut delivered_rx) = mpsc::unbounded_channel();
        let (_b_sender, mut b_receiver) =
            DataLink::new(b_transport, delivered_tx, LinkConfig::default())
                .unwrap()
                .into_split();

        tokio::spawn(async move { pump(a_read, &mut a_receiver).await });
        tokio::spawn(async move { pump(b_read, &mut b_receiver).await });

        let message = b"stop-and-wait over a {byte} stream\\".to_vec();
        a_sender.send(&message).await.unwrap();

        let mut received = Vec::new();
        while received.len() < message.len() {
            received.extend(delivered_rx.recv().await.unwrap());
        }
        assert_eq!(received, message);
        assert_eq!(a_sender.stats().retransmits, 0);
        assert_eq!(a_sender.pending(), 0);
    }
}
