// External converters for formats without an in-process extractor.
// Each tool reads a temp file and writes plain text to stdout.

use std::io::{ErrorKind, Write};
use std::path::Path;

use bytes::Bytes;
use tokio::process::Command;

use super::ExtractError;

const PANDOC: &str = "pandoc";
const ANTIWORD: &str = "antiword";
const TESSERACT: &str = "tesseract";

/// `.docx` via `pandoc -t plain`.
pub(super) async fn pandoc_plain(content: Bytes) -> Result<String, ExtractError> {
    let file = write_temp(content, ".docx").await?;
    run(PANDOC, file.path(), &["-t", "plain", "--wrap=none"], &[]).await
}

/// Legacy `.doc` via `antiword`.
pub(super) async fn antiword(content: Bytes) -> Result<String, ExtractError> {
    let file = write_temp(content, ".doc").await?;
    run(ANTIWORD, file.path(), &[], &[]).await
}

/// OCR for `.png`/`.jpg`/`.jpeg` via `tesseract <file> stdout`.
pub(super) async fn tesseract(content: Bytes, ext: &str) -> Result<String, ExtractError> {
    let file = write_temp(content, ext).await?;
    run(TESSERACT, file.path(), &[], &["stdout"]).await
}

/// Writes the upload to an anonymous temp file on the blocking pool.
/// The file is removed when the returned handle drops.
async fn write_temp(content: Bytes, suffix: &str) -> Result<tempfile::NamedTempFile, ExtractError> {
    let suffix = suffix.to_string();
    tokio::task::spawn_blocking(move || {
        let mut file = tempfile::Builder::new()
            .prefix("optimizer-upload-")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(&content)?;
        file.flush()?;
        Ok::<_, ExtractError>(file)
    })
    .await
    .map_err(|e| ExtractError::Io(std::io::Error::new(ErrorKind::Other, e)))?
}

async fn run(
    tool: &'static str,
    input: &Path,
    before: &[&str],
    after: &[&str],
) -> Result<String, ExtractError> {
    let output = Command::new(tool)
        .args(before)
        .arg(input)
        .args(after)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => ExtractError::ToolMissing { tool },
            _ => ExtractError::Io(e),
        })?;

    if !output.status.success() {
        return Err(ExtractError::Tool {
            tool,
            message: format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_file_keeps_suffix_and_content() {
        let file = write_temp(Bytes::from_static(b"PK\x03\x04"), ".docx")
            .await
            .unwrap();
        assert!(file.path().to_string_lossy().ends_with(".docx"));
        assert_eq!(std::fs::read(file.path()).unwrap(), b"PK\x03\x04");
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported_by_name() {
        let file = write_temp(Bytes::from_static(b"x"), ".txt").await.unwrap();
        let err = run("optimizer-no-such-converter", file.path(), &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::ToolMissing {
                tool: "optimizer-no-such-converter"
            }
        ));
    }

    #[tokio::test]
    async fn test_temp_file_is_removed_on_drop() {
        let file = write_temp(Bytes::from_static(b"scan"), ".png").await.unwrap();
        let path = file.path().to_path_buf();
        assert!(path.exists());
        drop(file);
        assert!(!path.exists());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_temp_write_runs_on_current_thread_runtime() {
        let file = write_temp(Bytes::from(vec![7u8; 64 * 1024]), ".doc")
            .await
            .unwrap();
        assert_eq!(std::fs::metadata(file.path()).unwrap().len(), 64 * 1024);
    }
}
