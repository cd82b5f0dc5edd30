//! ffmpeg-backed transcoding

use super::Transcoder;
use crate::config::{AudioFormat, AudioQuality};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Transcoder shelling out to an ffmpeg binary
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
}

impl FfmpegTranscoder {
    /// Locate ffmpeg on the PATH
    pub fn discover() -> Result<Self> {
        let binary = which::which("ffmpeg")
            .map_err(|e| Error::ExternalTool(format!("ffmpeg not found on PATH: {e}")))?;
        tracing::debug!(binary = %binary.display(), "ffmpeg located");
        Ok(Self { binary })
    }

    /// Use a specific ffmpeg binary
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        format: AudioFormat,
        quality: AudioQuality,
    ) -> Result<()> {
        let mut command = Command::new(&self.binary);
        command
            .arg("-i")
            .arg(input)
            .arg("-vn")
            .args(format.ffmpeg_args(quality))
            .arg("-y")
            .arg(output)
            .kill_on_drop(true);

        tracing::debug!(
            input = %input.display(),
            output = %output.display(),
            ?format,
            ?quality,
            "running ffmpeg"
        );

        let result = command.output().await.map_err(|e| {
            Error::ExternalTool(format!(
                "failed to launch ffmpeg at {}: {e}",
                self.binary.display()
            ))
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            // ffmpeg writes its diagnostics to stderr; keep the tail, the
            // head is mostly banner output
            let tail: String = stderr
                .lines()
                .rev()
                .take(5)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("\n");
            return Err(Error::Transcode(format!(
                "ffmpeg exited with {}: {tail}",
                result.status
            )));
        }
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_an_external_tool_error() {
        let transcoder = FfmpegTranscoder::with_binary("/nonexistent/ffmpeg");
        let err = transcoder
            .transcode(
                Path::new("/tmp/in.tmp"),
                Path::new("/tmp/out.mp3"),
                AudioFormat::Mp3,
                AudioQuality::High,
            )
            .await
            .unwrap_err();
        match err {
            Error::ExternalTool(message) => assert!(message.contains("ffmpeg")),
            other => panic!("expected ExternalTool error, got {other:?}"),
        }
    }
}
