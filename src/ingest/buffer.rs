use std::path::Path;

use bytes::Bytes;
use photostore_common::{Error, Result};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

/// Per-upload spool file.
///
/// The request body is streamed to a temporary file as it arrives. The file
/// is removed when the buffer is dropped, whichever way the ingest ends.
pub struct UploadBuffer {
    file: NamedTempFile,
    writer: tokio::fs::File,
    len: u64,
}

impl UploadBuffer {
    /// Create a spool file in `dir`, or the system temp dir.
    ///
    /// File creation runs on the blocking pool.
    pub async fn new(dir: Option<&Path>) -> Result<Self> {
        let dir = dir.map(Path::to_path_buf);
        let (file, std_file) = tokio::task::spawn_blocking(move || -> Result<_> {
            let mut builder = tempfile::Builder::new();
            builder.prefix("photostore-upload-");
            let file = match dir {
                Some(dir) => builder.tempfile_in(dir)?,
                None => builder.tempfile()?,
            };
            let std_file = file.reopen()?;
            Ok((file, std_file))
        })
        .await
        .map_err(|e| Error::internal(format!("Spool file task failed: {}", e)))??;

        Ok(Self {
            file,
            writer: tokio::fs::File::from_std(std_file),
            len: 0,
        })
    }

    pub async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.writer.write_all(chunk).await?;
        self.len += chunk.len() as u64;
        Ok(())
    }

    /// Bytes written so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the spooled upload back into memory and remove the file.
    pub async fn into_bytes(mut self) -> Result<Bytes> {
        self.writer.flush().await?;
        let data = tokio::fs::read(self.file.path()).await?;
        Ok(Bytes::from(data))
    }
}
