//! In-process capture host and packet generator.
//!
//! Used by the `generate` command and the tests to drive a [`RushOutput`]
//! without a real encoder. The video stream is a plausible H.264 Annex-B
//! byte stream (SPS/PPS/IDR every GOP, non-IDR slices in between) and the
//! audio stream is 1024-sample AAC access units.
//!
//! [`RushOutput`]: crate::output::RushOutput

use bytes::{BufMut, Bytes, BytesMut};
use parking_lot::Mutex;
use rush_common::{EncoderPacket, Timebase};

use crate::host::{AudioInfo, CaptureHost, MediaInfoSource, VideoInfo};

/// Lifecycle calls a [`SyntheticHost`] has received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    BeginCapture,
    EndCapture,
    SignalStop(i32),
}

/// Capture host with configurable answers that records what it is told.
pub struct SyntheticHost {
    permit_capture: bool,
    encoders_ok: bool,
    video: Option<VideoInfo>,
    audio: Option<AudioInfo>,
    audio_extradata: Option<Bytes>,
    events: Mutex<Vec<HostEvent>>,
}

/// AudioSpecificConfig for AAC-LC, 48 kHz, stereo.
const AAC_LC_48K_STEREO: [u8; 2] = [0x11, 0x90];

impl SyntheticHost {
    /// A cooperative host: 30 fps video, 48 kHz stereo audio.
    pub fn new() -> Self {
        Self {
            permit_capture: true,
            encoders_ok: true,
            video: Some(VideoInfo {
                fps_num: 30,
                fps_den: 1,
            }),
            audio: Some(AudioInfo {
                samples_per_sec: 48000,
                channels: 2,
            }),
            audio_extradata: Some(Bytes::from_static(&AAC_LC_48K_STEREO)),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Whether `can_begin_capture` answers yes.
    pub fn permit_capture(mut self, permit: bool) -> Self {
        self.permit_capture = permit;
        self
    }

    /// Whether `initialize_encoders` succeeds.
    pub fn encoders_ok(mut self, ok: bool) -> Self {
        self.encoders_ok = ok;
        self
    }

    pub fn with_video(mut self, video: Option<VideoInfo>) -> Self {
        self.video = video;
        self
    }

    pub fn with_audio(mut self, audio: Option<AudioInfo>) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_audio_extradata(mut self, extradata: Option<Bytes>) -> Self {
        self.audio_extradata = extradata;
        self
    }

    /// Lifecycle calls received so far, in order.
    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().clone()
    }

    /// Whether the host has been told capture ended, gracefully or not.
    pub fn capture_ended(&self) -> bool {
        self.events
            .lock()
            .iter()
            .any(|e| matches!(e, HostEvent::EndCapture | HostEvent::SignalStop(_)))
    }

    fn record(&self, event: HostEvent) {
        tracing::debug!(?event, "Synthetic host event");
        self.events.lock().push(event);
    }
}

impl Default for SyntheticHost {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureHost for SyntheticHost {
    fn can_begin_capture(&self) -> bool {
        self.permit_capture
    }

    fn initialize_encoders(&self) -> bool {
        self.encoders_ok
    }

    fn begin_capture(&self) {
        self.record(HostEvent::BeginCapture);
    }

    fn end_capture(&self) {
        self.record(HostEvent::EndCapture);
    }

    fn signal_stop(&self, code: i32) {
        self.record(HostEvent::SignalStop(code));
    }

    fn audio_extra_data(&self) -> Option<Bytes> {
        self.audio_extradata.clone()
    }
}

impl MediaInfoSource for SyntheticHost {
    fn video_info(&self) -> Option<VideoInfo> {
        self.video
    }

    fn audio_info(&self) -> Option<AudioInfo> {
        self.audio
    }
}

/// Interleaved audio/video packet generator ordered by system time.
pub struct SyntheticSource {
    fps: u32,
    sample_rate: u32,
    gop: u64,
    start_usec: i64,
    end_usec: i64,
    video_index: u64,
    audio_index: u64,
}

/// Samples per AAC access unit.
const AAC_FRAME_SAMPLES: u64 = 1024;

impl SyntheticSource {
    /// Packets covering `duration_usec` of media, starting at system time
    /// `start_usec`.
    pub fn new(fps: u32, sample_rate: u32, start_usec: i64, duration_usec: i64) -> Self {
        Self {
            fps: fps.max(1),
            sample_rate: sample_rate.max(1),
            gop: u64::from(fps.max(1)),
            start_usec,
            end_usec: start_usec.saturating_add(duration_usec),
            video_index: 0,
            audio_index: 0,
        }
    }

    /// Source matching a host's reported media info.
    pub fn for_host(host: &dyn MediaInfoSource, start_usec: i64, duration_usec: i64) -> Self {
        let fps = host.video_info().map_or(30, |v| v.fps_num);
        let rate = host.audio_info().map_or(48000, |a| a.samples_per_sec);
        Self::new(fps, rate, start_usec, duration_usec)
    }

    /// Frames between keyframes.
    pub fn gop(mut self, gop: u64) -> Self {
        self.gop = gop.max(1);
        self
    }

    fn video_sys_usec(&self) -> i64 {
        self.start_usec + (self.video_index * 1_000_000 / u64::from(self.fps)) as i64
    }

    fn audio_sys_usec(&self) -> i64 {
        self.start_usec
            + (self.audio_index * AAC_FRAME_SAMPLES * 1_000_000 / u64::from(self.sample_rate))
                as i64
    }

    fn next_video(&mut self) -> EncoderPacket {
        let index = self.video_index;
        let sys = self.video_sys_usec();
        self.video_index += 1;

        let keyframe = index % self.gop == 0;
        let data = access_unit(index, keyframe);
        let ts = index as i64;
        EncoderPacket::video(Timebase::new(1, i64::from(self.fps)), ts, ts, sys, data)
            .with_keyframe(keyframe)
    }

    fn next_audio(&mut self) -> EncoderPacket {
        let index = self.audio_index;
        let sys = self.audio_sys_usec();
        self.audio_index += 1;

        let mut data = BytesMut::with_capacity(256);
        data.put_u8(0x21);
        data.put_bytes((index & 0xff) as u8, 255);
        EncoderPacket::audio(
            Timebase::new(1, i64::from(self.sample_rate)),
            (index * AAC_FRAME_SAMPLES) as i64,
            sys,
            data.freeze(),
        )
    }
}

impl Iterator for SyntheticSource {
    type Item = EncoderPacket;

    fn next(&mut self) -> Option<EncoderPacket> {
        let video = self.video_sys_usec();
        let audio = self.audio_sys_usec();
        if video.min(audio) >= self.end_usec {
            return None;
        }
        if video <= audio {
            Some(self.next_video())
        } else {
            Some(self.next_audio())
        }
    }
}

/// One Annex-B access unit. Keyframes carry SPS, PPS and an IDR slice.
fn access_unit(index: u64, keyframe: bool) -> Bytes {
    const SPS: &[u8] = &[0x67, 0x42, 0xc0, 0x1e, 0xda, 0x02, 0x80, 0xbf, 0xe5];
    const PPS: &[u8] = &[0x68, 0xce, 0x3c, 0x80];

    let mut buf = BytesMut::with_capacity(if keyframe { 2048 } else { 512 });
    buf.put_slice(&[0x00, 0x00, 0x00, 0x01, 0x09, 0xf0]);
    if keyframe {
        buf.put_slice(&[0x00, 0x00, 0x00, 0x01]);
        buf.put_slice(SPS);
        buf.put_slice(&[0x00, 0x00, 0x00, 0x01]);
        buf.put_slice(PPS);
        buf.put_slice(&[0x00, 0x00, 0x01, 0x65]);
        buf.put_bytes(0x88, 2000);
    } else {
        buf.put_slice(&[0x00, 0x00, 0x01, 0x41]);
        buf.put_u8(0x9a);
        // Nonzero filler never forms a start code.
        buf.put_bytes((0x5a ^ (index & 0x0f) as u8) | 0x10, 480);
    }
    buf.freeze()
}
