//! Frame codec for the IPC socket.
//!
//! ```text
//! [4 bytes LE i32: opcode]
//! [4 bytes LE u32: body length]
//! [length bytes: body]
//! ```
//!
//! No terminator, no padding. The codec never looks inside the body.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::IpcError;

/// Size of the fixed frame header.
pub const HEADER_LEN: usize = 8;

/// Upper bound on an incoming body. The peer's largest reply (READY with
/// the user object) is a few KiB; anything near this is a corrupt header.
pub const MAX_BODY_LEN: usize = 1024 * 1024;

/// Known opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Opcode {
    Handshake = 0,
    Frame = 1,
    Close = 2,
    Ping = 3,
    Pong = 4,
}

impl Opcode {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Handshake),
            1 => Some(Self::Frame),
            2 => Some(Self::Close),
            3 => Some(Self::Ping),
            4 => Some(Self::Pong),
            _ => None,
        }
    }
}

/// One wire unit. `body.len()` is the header's length field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpcFrame {
    pub opcode: i32,
    pub body: Bytes,
}

impl IpcFrame {
    pub fn new(opcode: Opcode, body: impl Into<Bytes>) -> Self {
        Self {
            opcode: opcode as i32,
            body: body.into(),
        }
    }

    /// Body as text, lossily decoded, for logging.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Encode a single frame into a fresh buffer. Same size limit as
/// [`IpcCodec`].
pub fn encode_frame(opcode: i32, body: &[u8]) -> Result<Vec<u8>, IpcError> {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + body.len());
    let frame = IpcFrame {
        opcode,
        body: Bytes::copy_from_slice(body),
    };
    IpcCodec.encode(frame, &mut buf)?;
    Ok(buf.to_vec())
}

/// Decode a single frame from the start of `bytes`.
///
/// Reads the 8-byte header, then exactly `length` body bytes. Trailing
/// bytes past the body are ignored.
pub fn decode_frame(bytes: &[u8]) -> Result<(i32, Vec<u8>), IpcError> {
    if bytes.len() < HEADER_LEN {
        return Err(IpcError::Truncated {
            needed: HEADER_LEN,
            available: bytes.len(),
        });
    }
    let mut header = &bytes[..HEADER_LEN];
    let opcode = header.get_i32_le();
    let len = header.get_u32_le() as usize;

    let rest = &bytes[HEADER_LEN..];
    if rest.len() < len {
        return Err(IpcError::Truncated {
            needed: HEADER_LEN + len,
            available: bytes.len(),
        });
    }
    Ok((opcode, rest[..len].to_vec()))
}

/// Streaming codec over the socket, for use with `Framed`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IpcCodec;

impl Decoder for IpcCodec {
    type Item = IpcFrame;
    type Error = IpcError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<IpcFrame>, IpcError> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let mut header = &src[..HEADER_LEN];
        let opcode = header.get_i32_le();
        let len = header.get_u32_le() as usize;

        if len > MAX_BODY_LEN {
            return Err(IpcError::FrameTooLarge(len));
        }

        if src.len() < HEADER_LEN + len {
            src.reserve(HEADER_LEN + len - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let body = src.split_to(len).freeze();
        Ok(Some(IpcFrame { opcode, body }))
    }
}

impl Encoder<IpcFrame> for IpcCodec {
    type Error = IpcError;

    fn encode(&mut self, frame: IpcFrame, dst: &mut BytesMut) -> Result<(), IpcError> {
        if frame.body.len() > MAX_BODY_LEN {
            return Err(IpcError::FrameTooLarge(frame.body.len()));
        }
        dst.reserve(HEADER_LEN + frame.body.len());
        dst.put_i32_le(frame.opcode);
        dst.put_u32_le(frame.body.len() as u32);
        dst.put_slice(&frame.body);
        Ok(())
    }
}
