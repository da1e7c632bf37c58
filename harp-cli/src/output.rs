//! Result delivery
//!
//! Moves a finished job's result to the caller's output path.

use harp_core::domain::job::JobOutput;
use std::path::Path;
use tracing::{debug, info};

use crate::error::RunError;

/// Write a job result to `output_path`
///
/// A downloaded file is moved into place; structured data is written as
/// pretty-printed JSON.
pub async fn deliver(output: JobOutput, output_path: &Path) -> Result<(), RunError> {
    match output {
        JobOutput::File(source) => {
            move_file(&source, output_path).await?;
            info!("Moved {} to {}", source.display(), output_path.display());
        }
        JobOutput::Data(value) => {
            let json = serde_json::to_string_pretty(&value)
                .map_err(|e| RunError::Io(std::io::Error::other(e)))?;
            tokio::fs::write(output_path, json).await?;
            info!("Wrote result to {}", output_path.display());
        }
    }
    Ok(())
}

/// Rename, falling back to copy and remove when crossing filesystems
async fn move_file(source: &Path, dest: &Path) -> std::io::Result<()> {
    if let Err(e) = tokio::fs::rename(source, dest).await {
        debug!("Rename failed ({}), copying instead", e);
        tokio::fs::copy(source, dest).await?;
        tokio::fs::remove_file(source).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_file_output_moved_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("download.wav");
        let dest = dir.path().join("out.wav");
        let bytes: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        std::fs::write(&source, &bytes).unwrap();

        deliver(JobOutput::File(source.clone()), &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), bytes);
        assert!(!source.exists());
    }

    #[tokio::test]
    async fn test_data_output_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("ctrls.json");
        let value = json!({
            "ctrls": [{"ctrl_type": "audio_in", "label": "Input Audio"}],
            "card": {"name": "Pitch Shifter"}
        });

        deliver(JobOutput::Data(value.clone()), &dest).await.unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&dest).unwrap()).unwrap();
        assert_eq!(written, value);
    }

    #[tokio::test]
    async fn test_missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = deliver(
            JobOutput::File(dir.path().join("missing.wav")),
            &dir.path().join("out.wav"),
        )
        .await;

        assert!(matches!(result, Err(RunError::Io(_))));
    }
}
