//! Packet framing: a 4-byte header followed by the payload.
//!
//! Header layout: length low byte, length high byte, type tag, zero pad.

use core::fmt;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Duration;

use crate::core::config::HEADER_LEN;

/// One framed unit on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub kind: u8,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn new(kind: u8, payload: Vec<u8>) -> Self {
        Self { kind, payload }
    }

    /// Packet with no payload.
    pub fn empty(kind: u8) -> Self {
        Self {
            kind,
            payload: Vec::new(),
        }
    }
}

/// Which part of a frame was being read when the stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    Header,
    Payload,
}

impl fmt::Display for FrameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameStage::Header => f.write_str("header"),
            FrameStage::Payload => f.write_str("payload"),
        }
    }
}

#[derive(Debug)]
pub enum FrameError {
    /// Stream ended before a complete header or payload arrived.
    Closed {
        stage: FrameStage,
        expected: usize,
        received: usize,
    },
    /// Incoming payload length exceeds the configured limit.
    TooLarge { len: usize, max: usize },
    /// Outgoing payload does not fit the 16-bit length field.
    PayloadTooLong(usize),
    /// Peer reset or closed the connection while writing.
    PeerClosed,
    /// Operation did not finish within the configured time.
    Timeout(Duration),
    /// The transport was closed locally.
    Shutdown,
    Io(io::Error),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Closed {
                stage,
                expected,
                received,
            } => write!(
                f,
                "connection closed mid-{}: expected {} bytes, received {}",
                stage, expected, received
            ),
            FrameError::TooLarge { len, max } => {
                write!(f, "payload of {} bytes exceeds limit of {}", len, max)
            }
            FrameError::PayloadTooLong(len) => {
                write!(f, "payload of {} bytes does not fit a 16-bit length", len)
            }
            FrameError::PeerClosed => f.write_str("connection closed by peer"),
            FrameError::Timeout(d) => write!(f, "timed out after {:?}", d),
            FrameError::Shutdown => f.write_str("transport is shut down"),
            FrameError::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FrameError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset => FrameError::PeerClosed,
            _ => FrameError::Io(e),
        }
    }
}

/// High byte as computed by the reference clients: `(len << 8) & 0xff`,
/// which is zero for every length. Kept for comparison only.
pub fn legacy_high_byte(len: u16) -> u8 {
    ((u32::from(len) << 8) & 0xff) as u8
}

pub fn encode_header(kind: u8, len: usize) -> Result<[u8; HEADER_LEN], FrameError> {
    let len = u16::try_from(len).map_err(|_| FrameError::PayloadTooLong(len))?;
    let [lo, hi] = len.to_le_bytes();
    Ok([lo, hi, kind, 0])
}

/// Returns (type tag, payload length).
pub fn decode_header(header: [u8; HEADER_LEN]) -> (u8, u16) {
    (header[2], u16::from_le_bytes([header[0], header[1]]))
}

/// Header and payload in one buffer, so a single write puts the whole frame
/// on the wire.
pub fn encode_frame(packet: &Packet) -> Result<Vec<u8>, FrameError> {
    let header = encode_header(packet.kind, packet.payload.len())?;
    let mut buf = Vec::with_capacity(HEADER_LEN + packet.payload.len());
    buf.extend_from_slice(&header);
    buf.extend_from_slice(&packet.payload);
    Ok(buf)
}

async fn fill<R>(reader: &mut R, buf: &mut [u8], stage: FrameStage) -> Result<(), FrameError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut received = 0;
    while received < buf.len() {
        let n = reader.read(&mut buf[received..]).await?;
        if n == 0 {
            return Err(FrameError::Closed {
                stage,
                expected: buf.len(),
                received,
            });
        }
        received += n;
    }
    Ok(())
}

/// Read exactly one frame, waiting as long as the reader blocks.
pub async fn read_packet<R>(reader: &mut R, max_payload: usize) -> Result<Packet, FrameError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut header = [0u8; HEADER_LEN];
    fill(reader, &mut header, FrameStage::Header).await?;
    let (kind, len) = decode_header(header);
    let len = len as usize;
    if len > max_payload {
        return Err(FrameError::TooLarge {
            len,
            max: max_payload,
        });
    }
    let mut payload = vec![0u8; len];
    fill(reader, &mut payload, FrameStage::Payload).await?;
    Ok(Packet { kind, payload })
}

pub async fn write_packet<W>(writer: &mut W, packet: &Packet) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let frame = encode_frame(packet)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}
