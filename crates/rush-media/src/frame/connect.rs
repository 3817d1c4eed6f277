//! Connect frame: the session header.

use bytes::{BufMut, Bytes};
use rush_common::Timescales;

use super::{FrameBuf, FrameType, BROADCAST_ID, CONNECT_PAYLOAD, RUSH_VERSION};

/// Encode the Connect frame.
///
/// ```text
/// version(1) video_timescale(2) audio_timescale(2) broadcast_id(8) payload "{}"
/// ```
pub fn encode_connect(id: u64, timescales: Timescales) -> Bytes {
    let mut frame = FrameBuf::new(id, FrameType::Connect, 13 + CONNECT_PAYLOAD.len());
    let buf = frame.body();
    buf.put_u8(RUSH_VERSION);
    buf.put_u16_le(timescales.video);
    buf.put_u16_le(timescales.audio);
    buf.put_u64_le(BROADCAST_ID);
    buf.put_slice(CONNECT_PAYLOAD);
    frame.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_layout() {
        let bytes = encode_connect(1, Timescales::default());

        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[0..8], &24u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &1u64.to_le_bytes());
        assert_eq!(bytes[16], 0x00); // frame type
        assert_eq!(bytes[17], 0x00); // version
        assert_eq!(&bytes[18..20], &1000u16.to_le_bytes());
        assert_eq!(&bytes[20..22], &44100u16.to_le_bytes());
        assert_eq!(&bytes[22..30], &[0u8; 8]);
        assert_eq!(&bytes[30..32], b"{}");
    }

    #[test]
    fn test_connect_host_timescales() {
        let scales = Timescales {
            video: 30,
            audio: 48000,
        };
        let bytes = encode_connect(1, scales);
        assert_eq!(&bytes[18..20], &[30, 0]);
        assert_eq!(&bytes[20..22], &[0x80, 0xbb]);
    }
}
