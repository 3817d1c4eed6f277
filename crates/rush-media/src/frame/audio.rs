//! Audio frame: AAC with codec header.

use bytes::{BufMut, Bytes};
use rush_common::{EncoderPacket, Track};

use super::{AudioCodec, FrameBuf, FrameType};
use crate::rescale::rescale;

/// Encode an audio frame.
///
/// ```text
/// codec(1) dts(8) track(1) extradata_len(2) extradata payload
/// ```
///
/// `extradata` is the encoder's current codec header and is written in front
/// of every packet. Only the first `u16::MAX` bytes of it fit the length field.
pub fn encode_audio(
    id: u64,
    timescale: u16,
    track: Track,
    packet: &EncoderPacket,
    extradata: &[u8],
) -> Bytes {
    let extradata = &extradata[..extradata.len().min(u16::MAX as usize)];
    let dts = rescale(packet.dts, packet.timebase, i64::from(timescale));

    let mut frame = FrameBuf::new(
        id,
        FrameType::Audio,
        12 + extradata.len() + packet.data.len(),
    );
    let buf = frame.body();
    buf.put_u8(AudioCodec::Aac as u8);
    buf.put_i64_le(dts);
    buf.put_u8(track.id());
    buf.put_u16_le(extradata.len() as u16);
    buf.put_slice(extradata);
    buf.put_slice(&packet.data);
    frame.finish()
}
