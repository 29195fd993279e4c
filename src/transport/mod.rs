use crate::protocol::{FrameError, Packet};

/// Ordered, reliable packet pipe to the game server.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&mut self, packet: Packet) -> Result<(), FrameError>;
    async fn recv(&mut self) -> Result<Packet, FrameError>;

    /// Release the underlying connection. Further sends fail.
    async fn close(&mut self) -> Result<(), FrameError> {
        Ok(())
    }
}

pub mod in_memory;
pub mod tcp;
