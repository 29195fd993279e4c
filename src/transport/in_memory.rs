use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::task::yield_now;

use crate::core::config::HEADER_LEN;
use crate::protocol::frame::{FrameError, FrameStage, Packet};
use crate::transport::Transport;

/// One direction of the pair. `hung_up` is set when either end closes.
#[derive(Default)]
struct Pipe {
    packets: VecDeque<Packet>,
    hung_up: bool,
}

type Queue = Arc<Mutex<Pipe>>;

/// Pair of connected in-process endpoints. Useful for scripting a server in
/// tests: packets queued before the client reads are delivered in order.
///
/// Closing or dropping one end is seen by the other: its `recv` drains what
/// was already queued and then fails with `Closed`, its `send` fails with
/// `PeerClosed`.
pub struct InMemoryTransport {
    recv_queue: Queue,
    send_queue: Queue,
    closed: bool,
}

impl InMemoryTransport {
    pub fn pair() -> (Self, Self) {
        let q1 = Queue::default();
        let q2 = Queue::default();
        (
            Self {
                recv_queue: q1.clone(),
                send_queue: q2.clone(),
                closed: false,
            },
            Self {
                recv_queue: q2,
                send_queue: q1,
                closed: false,
            },
        )
    }

    /// Packets sent from this end that the peer has not read yet.
    pub fn queued_outbound(&self) -> usize {
        self.send_queue
            .lock()
            .map(|pipe| pipe.packets.len())
            .unwrap_or(0)
    }

    fn hang_up(queue: &Queue) {
        if let Ok(mut pipe) = queue.lock() {
            pipe.hung_up = true;
        }
    }
}

fn peer_gone(queue: &Queue, pipe: &Pipe) -> bool {
    pipe.hung_up || Arc::strong_count(queue) == 1
}

#[async_trait::async_trait]
impl Transport for InMemoryTransport {
    async fn send(&mut self, packet: Packet) -> Result<(), FrameError> {
        if self.closed {
            return Err(FrameError::Shutdown);
        }
        let mut pipe = self.send_queue.lock().map_err(|_| FrameError::PeerClosed)?;
        if peer_gone(&self.send_queue, &pipe) {
            return Err(FrameError::PeerClosed);
        }
        pipe.packets.push_back(packet);
        Ok(())
    }

    async fn recv(&mut self) -> Result<Packet, FrameError> {
        if self.closed {
            return Err(FrameError::Shutdown);
        }
        loop {
            {
                let mut pipe = self.recv_queue.lock().map_err(|_| FrameError::PeerClosed)?;
                if let Some(packet) = pipe.packets.pop_front() {
                    return Ok(packet);
                }
                if peer_gone(&self.recv_queue, &pipe) {
                    return Err(FrameError::Closed {
                        stage: FrameStage::Header,
                        expected: HEADER_LEN,
                        received: 0,
                    });
                }
            }
            yield_now().await;
        }
    }

    async fn close(&mut self) -> Result<(), FrameError> {
        if !self.closed {
            self.closed = true;
            Self::hang_up(&self.send_queue);
            Self::hang_up(&self.recv_queue);
        }
        Ok(())
    }
}

impl Drop for InMemoryTransport {
    fn drop(&mut self) {
        Self::hang_up(&self.send_queue);
        Self::hang_up(&self.recv_queue);
    }
}
