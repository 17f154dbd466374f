//! Byte stream plumbing.
//!
//! The session works over anything that is [`RgaStream`]: a TCP socket in
//! production, `tokio::io::DuplexStream` or [`crate::mock_stream::MockRgaStream`]
//! in tests.

use crate::error::{RgaError, RgaResult};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{info, instrument};

// =============================================================================
// Stream Trait
// =============================================================================

/// Trait alias for the instrument byte stream.
pub trait RgaStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> RgaStream for T {}

// =============================================================================
// TCP
// =============================================================================

/// Opens a TCP connection to the instrument.
///
/// `address` is `host:port`. Nagle is disabled; every exchange is a short
/// command line followed by a wait for the reply.
#[instrument(err)]
pub async fn connect(address: &str, timeout: Duration) -> RgaResult<TcpStream> {
    let stream = tokio::time::timeout(timeout, TcpStream::connect(address))
        .await
        .map_err(|_| RgaError::Timeout(timeout))??;
    stream.set_nodelay(true)?;
    info!(peer = %address, "connected to RGA");
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn connects_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let accept = tokio::spawn(async move { listener.accept().await.unwrap() });
        let stream = connect(&addr, Duration::from_secs(2)).await.unwrap();
        assert!(stream.nodelay().unwrap());
        accept.await.unwrap();
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = connect(&addr, Duration::from_secs(2)).await.unwrap_err();
        assert!(err.is_connection_fatal());
    }
}
