#![cfg(unix)]

mod support;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use flowerwave::config::{DecodeTimeoutSettings, WaveformSettings};
use flowerwave::media::LocalMediaFile;
use flowerwave::waveform::{
    DecodeError, DecodeRequest, FfmpegDecoder, PcmDecoder, WaveformScope, WaveformService,
};
use support::decoders::{
    FAILS_WITH_LINGERING_CHILD, FAILS_WITH_STDERR, NEVER_EXITS, WRITES_NOTHING, WRITES_THREE_SAMPLES, script_lock,
    write_script,
};
use tempfile::tempdir;

fn decoder_for(script: &Path, temp_dir: &Path) -> FfmpegDecoder {
    FfmpegDecoder::default()
        .with_program(script)
        .with_temp_dir(temp_dir)
}

fn assert_no_leftovers(temp_dir: &Path) {
    let leftovers: Vec<_> = std::fs::read_dir(temp_dir).unwrap().collect();
    assert!(leftovers.is_empty(), "temporary PCM left behind: {leftovers:?}");
}

#[test]
fn decoded_pcm_is_read_back_and_temp_file_removed() {
    let _lock = script_lock();
    let bin = tempdir().unwrap();
    let scratch = tempdir().unwrap();
    let script = write_script(bin.path(), "fake-ffmpeg", WRITES_THREE_SAMPLES);

    let pcm = decoder_for(&script, scratch.path())
        .decode(&DecodeRequest::new("input.mp4"))
        .unwrap();

    assert_eq!(pcm, vec![0x00, 0x40, 0x00, 0xC0, 0x00, 0x20]);
    assert_no_leftovers(scratch.path());
}

#[test]
fn service_reduces_decoder_output() {
    let _lock = script_lock();
    let bin = tempdir().unwrap();
    let scratch = tempdir().unwrap();
    let script = write_script(bin.path(), "fake-ffmpeg", WRITES_THREE_SAMPLES);
    let media = bin.path().join("clip.mov");
    std::fs::write(&media, b"moov").unwrap();

    let settings = WaveformSettings {
        sample_count: 3,
        ..WaveformSettings::default()
    };
    let service = WaveformService::with_decoder(
        &settings,
        Arc::new(decoder_for(&script, scratch.path())),
    );
    let envelope = service.generate_blocking(&LocalMediaFile::new(media), WaveformScope::Full);

    assert_eq!(envelope.as_slice(), &[1.0, 1.0, 0.5]);
    assert_no_leftovers(scratch.path());
}

#[test]
fn non_zero_exit_reports_code_and_stderr() {
    let _lock = script_lock();
    let bin = tempdir().unwrap();
    let scratch = tempdir().unwrap();
    let script = write_script(bin.path(), "fake-ffmpeg", FAILS_WITH_STDERR);

    let err = decoder_for(&script, scratch.path())
        .decode(&DecodeRequest::new("broken.avi"))
        .unwrap_err();

    match err {
        DecodeError::Failed { exit_code, stderr } => {
            assert_eq!(exit_code, Some(3));
            assert_eq!(stderr, "boom");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_no_leftovers(scratch.path());
}

#[test]
fn stderr_is_truncated_to_limit() {
    let _lock = script_lock();
    let bin = tempdir().unwrap();
    let scratch = tempdir().unwrap();
    let script = write_script(bin.path(), "fake-ffmpeg", FAILS_WITH_STDERR);

    let err = decoder_for(&script, scratch.path())
        .with_stderr_limit(2)
        .decode(&DecodeRequest::new("broken.avi"))
        .unwrap_err();

    assert!(matches!(err, DecodeError::Failed { stderr, .. } if stderr == "bo"));
}

#[test]
fn empty_output_is_an_error() {
    let _lock = script_lock();
    let bin = tempdir().unwrap();
    let scratch = tempdir().unwrap();
    let script = write_script(bin.path(), "fake-ffmpeg", WRITES_NOTHING);

    let err = decoder_for(&script, scratch.path())
        .decode(&DecodeRequest::new("silent.flac"))
        .unwrap_err();

    assert!(matches!(err, DecodeError::EmptyResult));
    assert_no_leftovers(scratch.path());
}

#[test]
fn hung_decoder_is_killed_after_timeout() {
    let _lock = script_lock();
    let bin = tempdir().unwrap();
    let scratch = tempdir().unwrap();
    let script = write_script(bin.path(), "fake-ffmpeg", NEVER_EXITS);
    let timeout = DecodeTimeoutSettings {
        base_seconds: 0.5,
        per_media_second: 0.0,
        min_seconds: 0.5,
        max_seconds: 0.5,
    };

    let started = Instant::now();
    let err = decoder_for(&script, scratch.path())
        .with_timeout(timeout)
        .decode(&DecodeRequest::new("endless.ts"))
        .unwrap_err();

    assert!(matches!(err, DecodeError::Timeout { after } if after == Duration::from_millis(500)));
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_no_leftovers(scratch.path());
}

#[test]
fn failure_is_reported_while_a_child_keeps_stderr_open() {
    let _lock = script_lock();
    let bin = tempdir().unwrap();
    let scratch = tempdir().unwrap();
    let script = write_script(bin.path(), "fake-ffmpeg", FAILS_WITH_LINGERING_CHILD);
    let timeout = DecodeTimeoutSettings {
        base_seconds: 1.0,
        per_media_second: 0.0,
        min_seconds: 1.0,
        max_seconds: 1.0,
    };

    let started = Instant::now();
    let err = decoder_for(&script, scratch.path())
        .with_timeout(timeout)
        .decode(&DecodeRequest::new("broken.avi"))
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(matches!(err, DecodeError::Failed { exit_code: Some(1), .. }));
    assert_no_leftovers(scratch.path());
}

#[test]
fn enormous_timeout_still_decodes() {
    let _lock = script_lock();
    let bin = tempdir().unwrap();
    let scratch = tempdir().unwrap();
    let script = write_script(bin.path(), "fake-ffmpeg", WRITES_THREE_SAMPLES);
    let timeout = DecodeTimeoutSettings {
        max_seconds: 1e19,
        ..DecodeTimeoutSettings::default()
    };

    let pcm = decoder_for(&script, scratch.path())
        .with_timeout(timeout)
        .decode(&DecodeRequest::new("input.mp4"))
        .unwrap();

    assert_eq!(pcm.len(), 6);
    assert_no_leftovers(scratch.path());
}
