//! Concurrent packet delivery and stop signalling.
//!
//! The host delivers audio and video from separate encoder threads while a
//! control thread stops the output. Whatever the interleaving, the stream
//! must parse cleanly with one Connect frame and strictly increasing ids.

mod common;

use common::{parse_frames, TestHarness};
use rush_common::MediaKind;
use rush_media::Frame;
use rush_output::synthetic::SyntheticSource;
use rush_output::OutputState;
use std::sync::{Arc, Barrier};
use std::thread;

fn check_stream(frames: &[Frame]) {
    assert!(!frames.is_empty());
    assert!(matches!(frames[0], Frame::Connect { .. }));
    assert_eq!(
        frames.iter().filter(|f| matches!(f, Frame::Connect { .. })).count(),
        1
    );
    assert!(frames.windows(2).all(|w| w[0].id() < w[1].id()));
    assert_eq!(frames[0].id(), 1);
}

#[test]
fn parallel_encoders_do_not_interleave_frames() {
    let harness = Arc::new(TestHarness::started());
    let packets: Vec<_> = SyntheticSource::for_host(harness.host.as_ref(), 0, 2_000_000).collect();
    let (video, audio): (Vec<_>, Vec<_>) = packets.into_iter().partition(|p| p.kind == MediaKind::Video);
    let expected = video.len() + audio.len();

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [video, audio]
        .into_iter()
        .map(|stream| {
            let harness = harness.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for packet in &stream {
                    harness.output.encoded_packet(packet);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let frames = harness.frames();
    check_stream(&frames);
    assert_eq!(frames.len(), expected + 1);
    assert_eq!(harness.output.state(), OutputState::Capturing);
}

#[test]
fn stop_from_control_thread_during_delivery() {
    let harness = Arc::new(TestHarness::started());
    let packets: Vec<_> = SyntheticSource::for_host(harness.host.as_ref(), 0, 3_000_000).collect();
    let delivered = packets.len();

    let encoder = {
        let harness = harness.clone();
        thread::spawn(move || {
            for packet in &packets {
                harness.output.encoded_packet(packet);
                if harness.output.state() == OutputState::Finalized {
                    return;
                }
            }
            // The stop may land after the source ran dry; keep the host
            // clock moving until it does.
            while harness.output.state() == OutputState::Capturing {
                thread::yield_now();
            }
            harness.output.encoded_packet(&common::video(10_000, 10_000, 10_000_000));
        })
    };

    let control = {
        let harness = harness.clone();
        thread::spawn(move || harness.output.stop(1_500_000_000))
    };

    control.join().unwrap();
    encoder.join().unwrap();

    let frames = parse_frames(&harness.sink.contents());
    check_stream(&frames);
    assert!(frames.len() <= delivered + 1);
    assert_eq!(harness.output.state(), OutputState::Finalized);
    assert_eq!(
        harness.output.stats().unwrap().frames_written,
        frames.len() as u64
    );
    assert!(harness.sink.is_closed());
    assert!(harness.host.capture_ended());
}

#[test]
fn stop_issued_first_cuts_at_threshold() {
    let harness = Arc::new(TestHarness::started());
    harness.output.stop(1_500_000_000);
    let packets: Vec<_> = SyntheticSource::for_host(harness.host.as_ref(), 0, 3_000_000).collect();

    let (video, audio): (Vec<_>, Vec<_>) = packets.into_iter().partition(|p| p.kind == MediaKind::Video);
    let handles: Vec<_> = [video, audio]
        .into_iter()
        .map(|stream| {
            let harness = harness.clone();
            thread::spawn(move || {
                for packet in &stream {
                    harness.output.encoded_packet(packet);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let frames = harness.frames();
    check_stream(&frames);
    assert_eq!(harness.output.state(), OutputState::Finalized);

    // Video is 30 fps in a 30 tick/s timescale and audio is 48 kHz in a
    // 48000 tick/s timescale, so nothing at or past 1.5 s made it out.
    for frame in &frames {
        match frame {
            Frame::Video { dts, .. } => assert!(*dts < 45),
            Frame::Audio { dts, .. } => assert!(*dts < 72_000),
            _ => {}
        }
    }
}

#[test]
fn concurrent_stop_and_force_stop_finalize_once() {
    let harness = Arc::new(TestHarness::started());
    harness.output.encoded_packet(&common::video(0, 0, 0));

    let barrier = Arc::new(Barrier::new(3));
    let handles: Vec<_> = (0..3)
        .map(|i| {
            let harness = harness.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                match i {
                    0 => harness.output.stop(0),
                    1 => harness.output.force_stop(rush_common::StopCode::Error(7)),
                    _ => harness.output.encoded_packet(&common::audio(1, 1000)),
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Either the forced stop or the threshold may win, but only one of
    // them reaches the host.
    if harness.output.state() == OutputState::Stopping {
        harness.output.encoded_packet(&common::video(2, 2, 2000));
    }
    assert_eq!(harness.output.state(), OutputState::Finalized);
    let ends = harness
        .host
        .events()
        .into_iter()
        .filter(|e| !matches!(e, rush_output::synthetic::HostEvent::BeginCapture))
        .count();
    assert_eq!(ends, 1);
    check_stream(&harness.frames());
}
