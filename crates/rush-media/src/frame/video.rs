//! Video frame: H.264 with track id.

use bytes::{BufMut, Bytes};
use rush_common::{EncoderPacket, Track};

use super::{FrameBuf, FrameType, VideoCodec};
use crate::avc::annexb_to_avcc;
use crate::rescale::rescale;

/// Encode a video frame.
///
/// ```text
/// codec(1) pts(8) dts(8) track(1) required_frame_offset(2) payload
/// ```
///
/// The payload is converted from Annex-B to length-prefixed NAL units. The
/// required frame offset is always 0.
pub fn encode_video(id: u64, timescale: u16, track: Track, packet: &EncoderPacket) -> Bytes {
    let timescale = i64::from(timescale);
    let pts = rescale(packet.pts, packet.timebase, timescale);
    let dts = rescale(packet.dts, packet.timebase, timescale);
    let payload = annexb_to_avcc(&packet.data);

    let mut frame = FrameBuf::new(id, FrameType::Video, 20 + payload.len());
    let buf = frame.body();
    buf.put_u8(VideoCodec::H264 as u8);
    buf.put_i64_le(pts);
    buf.put_i64_le(dts);
    buf.put_u8(track.id());
    buf.put_u16_le(0);
    buf.put_slice(&payload);
    frame.finish()
}
