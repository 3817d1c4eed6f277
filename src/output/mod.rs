//! The RUSH output controller.
//!
//! [`RushOutput`] ties the host, the frame encoders and a sink together. The
//! host calls [`start`](RushOutput::start) and [`stop`](RushOutput::stop) from
//! its control thread and [`encoded_packet`](RushOutput::encoded_packet) from
//! its encoder thread; everything that touches the session runs under one
//! lock so frames are written whole and in id order.
//!
//! Stopping is deferred: `stop` records a threshold on the host's system
//! clock and capture keeps writing until the first packet at or past it
//! arrives. That packet is dropped and the session finalizes.

mod session;
mod state;

pub use session::SessionStats;
pub use state::OutputState;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rush_common::{EncoderPacket, Error, Result, StopCode, Timescales};
use rush_media::SinkTarget;

use crate::host::{CaptureHost, MediaInfoSource};
use session::Session;

/// Real-time RUSH muxer driven by a capture host.
pub struct RushOutput {
    host: Arc<dyn CaptureHost>,
    info: Arc<dyn MediaInfoSource>,
    target: SinkTarget,
    session: Mutex<Option<Session>>,
    /// Mirrors "a stop has been requested" for lock-free reads.
    stopping: AtomicBool,
}

impl RushOutput {
    pub fn new(
        host: Arc<dyn CaptureHost>,
        info: Arc<dyn MediaInfoSource>,
        target: SinkTarget,
    ) -> Self {
        tracing::debug!(path = %target.describe().display(), "Created RUSH output");
        Self {
            host,
            info,
            target,
            session: Mutex::new(None),
            stopping: AtomicBool::new(false),
        }
    }

    /// Begin a capture session.
    ///
    /// Checks host permission, initializes encoders, opens the sink and then
    /// tells the host to begin delivering packets. Nothing is written and the
    /// state is unchanged if any step fails.
    ///
    /// Host callbacks run without the session lock held, so a host may call
    /// back into the output from any of them.
    pub fn start(&self) -> Result<()> {
        if !self.state().can_start() {
            return Err(Error::AlreadyActive);
        }

        if !self.host.can_begin_capture() {
            tracing::warn!("Host refused to begin data capture");
            return Err(Error::CaptureNotPermitted);
        }
        if !self.host.initialize_encoders() {
            tracing::warn!("Failed to initialize encoders");
            return Err(Error::EncoderInit);
        }

        {
            let mut guard = self.session.lock();
            // Another start may have won while the host was being asked.
            let state = guard.as_ref().map_or(OutputState::Created, |s| s.state);
            if !state.can_start() {
                return Err(Error::AlreadyActive);
            }

            let sink = self.target.open().map_err(|e| {
                let path = self.target.describe();
                tracing::error!(path = %path.display(), error = %e, "Failed to open RUSH sink");
                Error::sink_unavailable(path, e)
            })?;

            *guard = Some(Session::new(sink));
            self.stopping.store(false, Ordering::Release);
        }

        self.host.begin_capture();
        tracing::info!(path = %self.target.describe().display(), "RUSH output started");
        Ok(())
    }

    /// Request a stop at `ts_ns` on the host's system clock, in nanoseconds.
    ///
    /// Packets whose system decode timestamp is before the threshold are
    /// still written. Ignored unless the output is capturing; a second stop
    /// while stopping replaces the threshold.
    pub fn stop(&self, ts_ns: u64) {
        let threshold_usec = (ts_ns / 1000) as i64;
        let mut guard = self.session.lock();
        match guard.as_mut() {
            Some(session) if session.state.is_active() => {
                session.request_stop(threshold_usec);
                self.stopping.store(true, Ordering::Release);
                tracing::info!(threshold_usec, "RUSH output stopping");
            }
            _ => tracing::debug!("Stop requested while not capturing; ignored"),
        }
    }

    /// Handle one encoded packet from the host.
    ///
    /// Writes the Connect frame before the first data frame of a session.
    /// Packets that arrive when no session is active are ignored.
    pub fn encoded_packet(&self, packet: &EncoderPacket) {
        let finalized = {
            let mut guard = self.session.lock();
            let Some(session) = guard.as_mut().filter(|s| s.state.is_active()) else {
                tracing::trace!(kind = %packet.kind, "Packet outside of capture; ignored");
                return;
            };

            if self.stopping.load(Ordering::Acquire) && session.stop_reached(packet.sys_dts_usec) {
                tracing::debug!(
                    sys_dts_usec = packet.sys_dts_usec,
                    "Stop threshold reached; dropping packet"
                );
                Some(self.finalize(session, StopCode::Success))
            } else {
                session.write_headers(self.info.as_ref());
                session.write_packet(packet, self.host.as_ref());
                None
            }
        };

        if let Some(code) = finalized {
            self.notify_host(code);
        }
    }

    /// Finalize immediately with `code`, without waiting for a threshold.
    ///
    /// Used when the host aborts capture. Ignored unless capturing.
    pub fn force_stop(&self, code: StopCode) {
        let finalized = {
            let mut guard = self.session.lock();
            match guard.as_mut() {
                Some(session) if session.state.is_active() => Some(self.finalize(session, code)),
                _ => None,
            }
        };

        match finalized {
            Some(code) => self.notify_host(code),
            None => tracing::debug!(%code, "Force stop while not capturing; ignored"),
        }
    }

    pub fn state(&self) -> OutputState {
        self.session
            .lock()
            .as_ref()
            .map_or(OutputState::Created, |s| s.state)
    }

    /// Whether a stop has been requested and the session is not yet
    /// finalized. Does not take the lock.
    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    /// Counters of the current or most recent session.
    pub fn stats(&self) -> Option<SessionStats> {
        self.session.lock().as_ref().map(|s| s.stats)
    }

    /// Timescales the current session wrote into its Connect frame.
    pub fn timescales(&self) -> Option<Timescales> {
        self.session.lock().as_ref().and_then(Session::timescales)
    }

    fn finalize(&self, session: &mut Session, code: StopCode) -> StopCode {
        session.finalize();
        self.stopping.store(false, Ordering::Release);
        let stats = session.stats;
        tracing::info!(
            %code,
            frames = stats.frames_written,
            video_frames = stats.video_frames,
            audio_frames = stats.audio_frames,
            bytes = stats.bytes_written,
            write_errors = stats.write_errors,
            "RUSH file output complete"
        );
        code
    }

    fn notify_host(&self, code: StopCode) {
        if code.is_success() {
            self.host.end_capture();
        } else {
            self.host.signal_stop(code.raw());
        }
    }
}

impl Drop for RushOutput {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().as_mut() {
            if session.state.is_active() {
                tracing::debug!("RUSH output dropped while capturing; closing sink");
                session.close_sink();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{HostEvent, SyntheticHost};
    use assert_matches::assert_matches;
    use bytes::Bytes;
    use rush_common::Timebase;
    use rush_media::MemorySink;
    use std::sync::{OnceLock, Weak};

    fn output(host: &Arc<SyntheticHost>) -> (RushOutput, MemorySink) {
        let sink = MemorySink::new();
        let output = RushOutput::new(host.clone(), host.clone(), SinkTarget::Memory(sink.clone()));
        (output, sink)
    }

    fn video_at(sys_dts_usec: i64) -> EncoderPacket {
        EncoderPacket::video(Timebase::new(1, 1000), 0, 0, sys_dts_usec, Bytes::new())
    }

    #[test]
    fn test_initial_state() {
        let host = Arc::new(SyntheticHost::new());
        let (output, sink) = output(&host);
        assert_eq!(output.state(), OutputState::Created);
        assert!(!output.is_stopping());
        assert!(output.stats().is_none());

        output.encoded_packet(&video_at(0));
        assert_eq!(sink.frame_count(), 0);
    }

    #[test]
    fn test_start_twice_rejected() {
        let host = Arc::new(SyntheticHost::new());
        let (output, _sink) = output(&host);
        output.start().unwrap();
        assert_matches!(output.start(), Err(Error::AlreadyActive));
        output.stop(0);
        assert_matches!(output.start(), Err(Error::AlreadyActive));
    }

    #[test]
    fn test_stop_while_idle_ignored() {
        let host = Arc::new(SyntheticHost::new());
        let (output, _sink) = output(&host);
        output.stop(1_000_000);
        assert_eq!(output.state(), OutputState::Created);
        assert!(!output.is_stopping());
    }

    #[test]
    fn test_stop_converts_nanoseconds() {
        let host = Arc::new(SyntheticHost::new());
        let (output, sink) = output(&host);
        output.start().unwrap();
        output.stop(5_000_999);

        output.encoded_packet(&video_at(4_999));
        assert_eq!(output.state(), OutputState::Stopping);
        output.encoded_packet(&video_at(5_000));
        assert_eq!(output.state(), OutputState::Finalized);
        // Connect + one video frame.
        assert_eq!(sink.frame_count(), 2);
        assert_eq!(host.events(), vec![HostEvent::BeginCapture, HostEvent::EndCapture]);
    }

    #[test]
    fn test_force_stop_error_code() {
        let host = Arc::new(SyntheticHost::new());
        let (output, sink) = output(&host);
        output.start().unwrap();
        output.encoded_packet(&video_at(0));
        output.force_stop(StopCode::Error(-4));

        assert_eq!(output.state(), OutputState::Finalized);
        assert!(sink.is_closed());
        assert_eq!(
            host.events(),
            vec![HostEvent::BeginCapture, HostEvent::SignalStop(-4)]
        );

        output.force_stop(StopCode::Error(-5));
        assert_eq!(host.events().len(), 2);
    }

    /// Host that reads back into the output from its start-up callbacks.
    struct ReentrantHost {
        inner: SyntheticHost,
        output: OnceLock<Weak<RushOutput>>,
        seen: Mutex<Vec<OutputState>>,
    }

    impl ReentrantHost {
        fn observe(&self) {
            if let Some(output) = self.output.get().and_then(Weak::upgrade) {
                self.seen.lock().push(output.state());
                output.stop(0);
                output.encoded_packet(&video_at(0));
            }
        }
    }

    impl CaptureHost for ReentrantHost {
        fn can_begin_capture(&self) -> bool {
            self.observe();
            self.inner.can_begin_capture()
        }

        fn initialize_encoders(&self) -> bool {
            self.observe();
            self.inner.initialize_encoders()
        }

        fn begin_capture(&self) {
            self.inner.begin_capture();
            self.observe();
        }

        fn end_capture(&self) {
            self.inner.end_capture()
        }

        fn signal_stop(&self, code: i32) {
            self.inner.signal_stop(code)
        }

        fn audio_extra_data(&self) -> Option<Bytes> {
            self.inner.audio_extra_data()
        }
    }

    #[test]
    fn test_host_may_reenter_during_start() {
        let host = Arc::new(ReentrantHost {
            inner: SyntheticHost::new(),
            output: OnceLock::new(),
            seen: Mutex::new(Vec::new()),
        });
        let sink = MemorySink::new();
        let output = Arc::new(RushOutput::new(
            host.clone(),
            Arc::new(SyntheticHost::new()),
            SinkTarget::Memory(sink.clone()),
        ));
        host.output.set(Arc::downgrade(&output)).unwrap();

        output.start().unwrap();

        // The stop issued from begin_capture is cut by its own packet.
        assert_eq!(
            *host.seen.lock(),
            vec![OutputState::Created, OutputState::Created, OutputState::Capturing]
        );
        assert_eq!(output.state(), OutputState::Finalized);
        assert!(sink.is_closed());
        assert_eq!(
            host.inner.events(),
            vec![HostEvent::BeginCapture, HostEvent::EndCapture]
        );
    }

    #[test]
    fn test_drop_closes_active_sink() {
        let host = Arc::new(SyntheticHost::new());
        let (output, sink) = output(&host);
        output.start().unwrap();
        output.encoded_packet(&video_at(0));
        drop(output);
        assert!(sink.is_closed());
        assert_eq!(host.events(), vec![HostEvent::BeginCapture]);
    }
}
