use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::protocol::frame::{self, FrameError, Packet};
use crate::transport::Transport;

/// Default timeout for writes (30 seconds).
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// Timeouts and limits applied by [`TcpTransport`].
#[derive(Debug, Clone, Copy)]
pub struct TransportConfig {
    /// `None` waits indefinitely; the server paces turns.
    pub read_timeout: Option<Duration>,
    pub write_timeout: Duration,
    pub max_payload: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            read_timeout: None,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            max_payload: MAX_PAYLOAD,
        }
    }
}

pub struct TcpTransport {
    stream: TcpStream,
    config: TransportConfig,
    closed: bool,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self::with_config(stream, TransportConfig::default())
    }

    pub fn with_config(stream: TcpStream, config: TransportConfig) -> Self {
        if let Err(e) = stream.set_nodelay(true) {
            log::debug!("could not disable Nagle: {}", e);
        }
        Self {
            stream,
            config,
            closed: false,
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> std::io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }

    pub async fn connect_with<A: ToSocketAddrs>(
        addr: A,
        config: TransportConfig,
    ) -> std::io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::with_config(stream, config))
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, packet: Packet) -> Result<(), FrameError> {
        if self.closed {
            return Err(FrameError::Shutdown);
        }
        let limit = self.config.write_timeout;
        timeout(limit, frame::write_packet(&mut self.stream, &packet))
            .await
            .map_err(|_| FrameError::Timeout(limit))?
    }

    async fn recv(&mut self) -> Result<Packet, FrameError> {
        if self.closed {
            return Err(FrameError::Shutdown);
        }
        let max = self.config.max_payload;
        match self.config.read_timeout {
            Some(limit) => timeout(limit, frame::read_packet(&mut self.stream, max))
                .await
                .map_err(|_| FrameError::Timeout(limit))?,
            None => frame::read_packet(&mut self.stream, max).await,
        }
    }

    async fn close(&mut self) -> Result<(), FrameError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream.shutdown().await?;
        Ok(())
    }
}
