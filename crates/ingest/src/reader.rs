use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncReadExt;

pub struct FileReader;

impl FileReader {
    /// Read a plain-text policy document.
    pub async fn read_file(path: &Path) -> Result<String> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match extension {
            "txt" | "md" => {
                let content = fs::read_to_string(path)
                    .await
                    .context(format!("Failed to read file: {:?}", path))?;
                Ok(content)
            }
            _ => anyhow::bail!("Unsupported file format: {}", extension),
        }
    }

    /// Read the whole document from standard input.
    pub async fn read_stdin() -> Result<String> {
        let mut content = String::new();
        tokio::io::stdin()
            .read_to_string(&mut content)
            .await
            .context("Failed to read document from stdin")?;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_unsupported_extension() {
        let err = FileReader::read_file(Path::new("policy.pdf")).await.unwrap_err();
        assert!(err.to_string().contains("Unsupported file format"));
    }

    #[tokio::test]
    async fn test_reads_text_file() {
        let path = std::env::temp_dir().join(format!("ingest-reader-{}.txt", std::process::id()));
        tokio::fs::write(&path, "Folksam Bas\n").await.unwrap();

        let content = FileReader::read_file(&path).await.unwrap();
        assert_eq!(content, "Folksam Bas\n");

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
