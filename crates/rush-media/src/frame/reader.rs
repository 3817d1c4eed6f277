//! RUSH frame parsing.

use std::io::{self, Read};

use bytes::Bytes;

use super::{FrameType, HEADER_SIZE, LENGTH_SIZE};
use crate::error::{Error, Result};

/// Upper bound on a single frame, guards against reading garbage lengths.
const MAX_FRAME_SIZE: u64 = 64 * 1024 * 1024;

/// A parsed RUSH frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "serialize", serde(tag = "type", rename_all = "lowercase"))]
pub enum Frame {
    Connect {
        id: u64,
        version: u8,
        video_timescale: u16,
        audio_timescale: u16,
        broadcast_id: u64,
        #[cfg_attr(feature = "serialize", serde(serialize_with = "as_utf8"))]
        payload: Bytes,
    },
    Audio {
        id: u64,
        codec: u8,
        dts: i64,
        track_id: u8,
        #[cfg_attr(feature = "serialize", serde(serialize_with = "as_len"))]
        extradata: Bytes,
        #[cfg_attr(feature = "serialize", serde(serialize_with = "as_len"))]
        payload: Bytes,
    },
    Video {
        id: u64,
        codec: u8,
        pts: i64,
        dts: i64,
        track_id: u8,
        required_frame_offset: u16,
        #[cfg_attr(feature = "serialize", serde(serialize_with = "as_len"))]
        payload: Bytes,
    },
    /// Frame with a tag this reader does not know; kept so a stream can be
    /// walked past it.
    Unknown {
        id: u64,
        tag: u8,
        #[cfg_attr(feature = "serialize", serde(serialize_with = "as_len"))]
        body: Bytes,
    },
}

impl Frame {
    pub fn id(&self) -> u64 {
        match self {
            Frame::Connect { id, .. }
            | Frame::Audio { id, .. }
            | Frame::Video { id, .. }
            | Frame::Unknown { id, .. } => *id,
        }
    }

    pub fn frame_type(&self) -> Option<FrameType> {
        match self {
            Frame::Connect { .. } => Some(FrameType::Connect),
            Frame::Audio { .. } => Some(FrameType::Audio),
            Frame::Video { .. } => Some(FrameType::Video),
            Frame::Unknown { .. } => None,
        }
    }

    /// Parse one frame from the start of `buf`.
    ///
    /// Returns the frame and the number of bytes it occupied.
    pub fn parse(buf: &[u8]) -> Result<(Frame, usize)> {
        let mut cur = Cursor::new(buf);
        let len = cur.u64()?;
        if len < (HEADER_SIZE - LENGTH_SIZE + 1) as u64 {
            return Err(Error::invalid_frame(format!("length {len} too small")));
        }
        if len > MAX_FRAME_SIZE {
            return Err(Error::invalid_frame(format!("length {len} exceeds limit")));
        }
        let total = LENGTH_SIZE + len as usize;
        if buf.len() < total {
            return Err(Error::Truncated {
                need: total,
                have: buf.len(),
            });
        }
        let frame = Self::parse_body(&buf[LENGTH_SIZE..total])?;
        Ok((frame, total))
    }

    /// Parse everything after the length field.
    fn parse_body(body: &[u8]) -> Result<Frame> {
        let mut cur = Cursor::new(body);
        let id = cur.u64()?;
        let tag = cur.u8()?;

        let frame = match FrameType::from_tag(tag) {
            Some(FrameType::Connect) => Frame::Connect {
                id,
                version: cur.u8()?,
                video_timescale: cur.u16()?,
                audio_timescale: cur.u16()?,
                broadcast_id: cur.u64()?,
                payload: cur.rest(),
            },
            Some(FrameType::Audio) => {
                let codec = cur.u8()?;
                let dts = cur.u64()? as i64;
                let track_id = cur.u8()?;
                let extradata_len = cur.u16()? as usize;
                let extradata = cur.take(extradata_len)?;
                Frame::Audio {
                    id,
                    codec,
                    dts,
                    track_id,
                    extradata,
                    payload: cur.rest(),
                }
            }
            Some(FrameType::Video) => Frame::Video {
                id,
                codec: cur.u8()?,
                pts: cur.u64()? as i64,
                dts: cur.u64()? as i64,
                track_id: cur.u8()?,
                required_frame_offset: cur.u16()?,
                payload: cur.rest(),
            },
            None => Frame::Unknown {
                id,
                tag,
                body: cur.rest(),
            },
        };
        Ok(frame)
    }
}

/// Little-endian field reader over a frame body.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn slice(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos + n;
        if end > self.buf.len() {
            return Err(Error::Truncated {
                need: end,
                have: self.buf.len(),
            });
        }
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.slice(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let mut b = [0u8; 2];
        b.copy_from_slice(self.slice(2)?);
        Ok(u16::from_le_bytes(b))
    }

    fn u64(&mut self) -> Result<u64> {
        let mut b = [0u8; 8];
        b.copy_from_slice(self.slice(8)?);
        Ok(u64::from_le_bytes(b))
    }

    fn take(&mut self, n: usize) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(self.slice(n)?))
    }

    fn rest(&mut self) -> Bytes {
        let out = Bytes::copy_from_slice(&self.buf[self.pos..]);
        self.pos = self.buf.len();
        out
    }
}

/// Iterator over the frames of a RUSH stream.
///
/// Stops cleanly at end of input on a frame boundary; a frame cut short is
/// reported as [`Error::Truncated`].
pub struct FrameReader<R> {
    inner: R,
    done: bool,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, done: false }
    }

    /// Read the next frame, or `None` at end of stream.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut len_buf = [0u8; LENGTH_SIZE];
        let got = read_full(&mut self.inner, &mut len_buf)?;
        if got == 0 {
            return Ok(None);
        }
        if got < LENGTH_SIZE {
            return Err(Error::Truncated {
                need: LENGTH_SIZE,
                have: got,
            });
        }

        let len = u64::from_le_bytes(len_buf);
        if len > MAX_FRAME_SIZE {
            return Err(Error::invalid_frame(format!("length {len} exceeds limit")));
        }
        let mut body = vec![0u8; len as usize];
        let got = read_full(&mut self.inner, &mut body)?;
        if got < body.len() {
            return Err(Error::Truncated {
                need: LENGTH_SIZE + body.len(),
                have: LENGTH_SIZE + got,
            });
        }
        Frame::parse_body(&body).map(Some)
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Read until `buf` is full or the reader hits EOF; returns bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(feature = "serialize")]
fn as_len<S: serde::Serializer>(bytes: &Bytes, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(bytes.len() as u64)
}

#[cfg(feature = "serialize")]
fn as_utf8<S: serde::Serializer>(bytes: &Bytes, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(bytes))
}
