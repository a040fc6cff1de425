use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures while turning a media file into raw PCM.
///
/// None of these reach the renderer: waveform generation logs them and
/// substitutes a silent envelope.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Audio decoder not found ({} locations searched)", .searched.len())]
    DecoderNotFound { searched: Vec<PathBuf> },
    #[error("Media {path} is not readable: {source}")]
    SourceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to create temporary PCM file: {source}")]
    TempFile { source: std::io::Error },
    #[error("Failed to launch decoder {program}: {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed while waiting for decoder: {source}")]
    Wait { source: std::io::Error },
    #[error("Decoder exited with {}: {stderr}", exit_label(.exit_code))]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("Decoder did not finish within {:.1}s", .after.as_secs_f64())]
    Timeout { after: Duration },
    #[error("Decoder produced no audio")]
    EmptyResult,
    #[error("Failed to read decoded PCM {path}: {source}")]
    ReadOutput {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_exit_details() {
        let failed = DecodeError::Failed {
            exit_code: Some(1),
            stderr: "Invalid data found when processing input".to_string(),
        };
        assert_eq!(
            failed.to_string(),
            "Decoder exited with code 1: Invalid data found when processing input"
        );

        let timeout = DecodeError::Timeout {
            after: Duration::from_millis(2500),
        };
        assert_eq!(timeout.to_string(), "Decoder did not finish within 2.5s");
    }
}
