use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tokio::process::Command;
use tracing::instrument;

use super::{EncryptedArtifact, EncryptionError, Encrypter};
use crate::config::EncryptionConfig;

/// Longest stderr excerpt carried in an error.
const STDERR_EXCERPT: usize = 1024;

/// JSON document the external tool prints on stdout.
#[derive(Deserialize)]
struct ToolReport {
    #[serde(rename = "content-encryption-key")]
    content_key: String,
    #[serde(rename = "protected-content-sha256", default)]
    sha256: Option<String>,
    #[serde(rename = "protected-content-length", default)]
    length: Option<i64>,
}

/// Runs an external program as
/// `{program} {args...} <source> <output> <disposition>`.
pub struct CommandEncrypter {
    program: String,
    args: Vec<String>,
    work_dir: PathBuf,
}

impl CommandEncrypter {
    pub fn new(program: impl Into<String>, args: Vec<String>, work_dir: PathBuf) -> Self {
        Self {
            program: program.into(),
            args,
            work_dir,
        }
    }

    pub fn from_config(config: &EncryptionConfig) -> Self {
        Self::new(
            config.program.clone(),
            config.args.clone(),
            config.work_dir.clone(),
        )
    }

    fn output_path(&self) -> PathBuf {
        self.work_dir
            .join(format!("quire-encrypted-{}", uuid::Uuid::new_v4()))
    }
}

#[async_trait]
impl Encrypter for CommandEncrypter {
    #[instrument(skip(self), fields(program = %self.program))]
    async fn encrypt(
        &self,
        source: &Path,
        disposition: &str,
    ) -> Result<EncryptedArtifact, EncryptionError> {
        tokio::fs::create_dir_all(&self.work_dir).await?;
        let output_path = self.output_path();

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(source)
            .arg(&output_path)
            .arg(disposition)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(EncryptionError::Spawn)?;

        let result = parse_report(&output, &output_path, disposition).await;
        if result.is_err() {
            // Best effort.
            let _ = tokio::fs::remove_file(&output_path).await;
        }
        result
    }
}

async fn parse_report(
    output: &std::process::Output,
    output_path: &Path,
    disposition: &str,
) -> Result<EncryptedArtifact, EncryptionError> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr: String = stderr.trim().chars().take(STDERR_EXCERPT).collect();
        return Err(EncryptionError::Failed {
            status: output.status.to_string(),
            stderr,
        });
    }

    let report: ToolReport = serde_json::from_slice(&output.stdout)
        .map_err(|e| EncryptionError::MalformedOutput(e.to_string()))?;

    let content_key = STANDARD
        .decode(report.content_key.trim())
        .map_err(|e| EncryptionError::MalformedOutput(format!("content key: {e}")))?;
    if content_key.is_empty() {
        return Err(EncryptionError::MalformedOutput(
            "content key is empty".into(),
        ));
    }

    if !tokio::fs::try_exists(output_path).await? {
        return Err(EncryptionError::MissingOutput(output_path.to_path_buf()));
    }

    tracing::debug!(
        output = %output_path.display(),
        length = ?report.length,
        "Encrypter finished"
    );

    Ok(EncryptedArtifact {
        path: output_path.to_path_buf(),
        content_key,
        sha256: report.sha256.filter(|s| !s.is_empty()),
        length: report.length,
        disposition: Some(disposition.to_string()),
    })
}
