//! Video duration probing.
//!
//! The organizer only needs one number per file, so probing sits behind the
//! [`DurationProbe`] trait. [`FfprobeProbe`] shells out to `ffprobe`; tests
//! substitute a table of canned durations.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Marker ffmpeg prints for files it cannot demux at all.
const INVALID_DATA_MARKER: &str = "Invalid data found when processing input";

/// Why a duration could not be determined.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },
    #[error("ffprobe exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("unreadable ffprobe output: {0}")]
    InvalidOutput(String),
    #[error("no duration found")]
    NoDuration,
    #[error("invalid duration '{0}'")]
    InvalidDuration(String),
}

/// Reports the playback length of a media file.
pub trait DurationProbe: Send + Sync {
    /// Returns `Ok(Some(seconds))` on success, `Ok(None)` when the file is
    /// not decodable media and should simply be left alone, or an error.
    fn probe(&self, path: &Path) -> Result<Option<f64>, ProbeError>;
}

/// [`DurationProbe`] backed by the `ffprobe` executable.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: PathBuf,
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl FfprobeProbe {
    /// Uses `program` as the ffprobe executable, looked up in `PATH` when
    /// it is a bare name.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The ffprobe executable this probe runs.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl DurationProbe for FfprobeProbe {
    fn probe(&self, path: &Path) -> Result<Option<f64>, ProbeError> {
        let output = Command::new(&self.program)
            .args(["-v", "error", "-print_format", "json", "-show_format"])
            .arg(path)
            .output()
            .map_err(|source| ProbeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains(INVALID_DATA_MARKER) {
            return Ok(None);
        }
        if !output.status.success() {
            return Err(ProbeError::Failed {
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        let stdout = std::str::from_utf8(&output.stdout)
            .map_err(|e| ProbeError::InvalidOutput(e.to_string()))?;
        parse_ffprobe_duration(stdout).map(Some)
    }
}

/// Extracts `format.duration` from `ffprobe -print_format json -show_format`
/// output.
pub fn parse_ffprobe_duration(json: &str) -> Result<f64, ProbeError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| ProbeError::InvalidOutput(e.to_string()))?;

    // ffprobe reports numbers as strings, but accept plain numbers too.
    let raw = match &value["format"]["duration"] {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err(ProbeError::NoDuration),
    };

    let seconds: f64 = raw
        .parse()
        .map_err(|_| ProbeError::InvalidDuration(raw.clone()))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ProbeError::InvalidDuration(raw));
    }
    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string_duration() {
        let json = r#"{"format": {"filename": "a.mp4", "duration": "12.345000"}}"#;
        assert_eq!(parse_ffprobe_duration(json).unwrap(), 12.345);
    }

    #[test]
    fn test_parse_numeric_duration() {
        let json = r#"{"format": {"duration": 3600}}"#;
        assert_eq!(parse_ffprobe_duration(json).unwrap(), 3600.0);
    }

    #[test]
    fn test_missing_duration() {
        let json = r#"{"format": {"filename": "a.mp4"}}"#;
        assert!(matches!(
            parse_ffprobe_duration(json),
            Err(ProbeError::NoDuration)
        ));
        assert!(matches!(
            parse_ffprobe_duration(r#"{"format": {"duration": ""}}"#),
            Err(ProbeError::NoDuration)
        ));
    }

    #[test]
    fn test_unparsable_duration() {
        let json = r#"{"format": {"duration": "N/A"}}"#;
        assert!(matches!(
            parse_ffprobe_duration(json),
            Err(ProbeError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_negative_duration_rejected() {
        let json = r#"{"format": {"duration": "-1.0"}}"#;
        assert!(matches!(
            parse_ffprobe_duration(json),
            Err(ProbeError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_ffprobe_duration("not json"),
            Err(ProbeError::InvalidOutput(_))
        ));
    }

    #[test]
    fn test_missing_program_is_a_spawn_error() {
        let probe = FfprobeProbe::new("/nonexistent/bin/ffprobe-for-tests");
        let result = probe.probe(Path::new("whatever.mp4"));
        assert!(matches!(result, Err(ProbeError::Spawn { .. })));
    }
}
