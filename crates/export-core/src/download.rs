// File: crates/export-core/src/download.rs
// Summary: "Hand bytes to the platform's save-file mechanism" seam plus filesystem and in-memory sinks.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::encode::data_url;
use crate::error::Result;

/// A finished artifact ready to be saved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl Download {
    pub fn data_url(&self) -> String {
        data_url(&self.bytes, self.mime)
    }
}

#[allow(async_fn_in_trait)]
pub trait DownloadSink {
    async fn deliver(&self, download: Download) -> Result<()>;
}

impl<S: DownloadSink + ?Sized> DownloadSink for &S {
    async fn deliver(&self, download: Download) -> Result<()> {
        (**self).deliver(download).await
    }
}

/// Saves into a download directory. Existing files are never overwritten;
/// a numeric suffix is appended instead (`gdp.png`, `gdp-1.png`, ...).
#[derive(Clone, Debug)]
pub struct DirectorySink {
    dir: PathBuf,
}

/// Gives up after this many name collisions for one download.
const MAX_SUFFIX: u32 = 10_000;

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidate(&self, file_name: &str, n: u32) -> PathBuf {
        if n == 0 {
            return self.dir.join(file_name);
        }
        match file_name.rsplit_once('.') {
            Some((stem, ext)) => self.dir.join(format!("{stem}-{n}.{ext}")),
            None => self.dir.join(format!("{file_name}-{n}")),
        }
    }
}

impl DownloadSink for DirectorySink {
    async fn deliver(&self, download: Download) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        for n in 0..MAX_SUFFIX {
            let path = self.candidate(&download.file_name, n);
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            let file = match opened {
                Ok(f) => f,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("{} exists, trying next suffix", path.display());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            write_or_discard(file, &path, &download.bytes).await?;
            info!("Wrote {} ({} bytes, {})", path.display(), download.bytes.len(), download.mime);
            return Ok(());
        }
        Err(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free file name for {} in {}", download.file_name, self.dir.display()),
        )
        .into())
    }
}

/// Write `bytes` through `out`. On failure the partly written file at `path` is removed.
async fn write_or_discard<W>(mut out: W, path: &Path, bytes: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = match out.write_all(bytes).await {
        Ok(()) => out.flush().await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        drop(out);
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            warn!("Could not remove partial {}: {}", path.display(), cleanup);
        }
        return Err(e);
    }
    Ok(())
}

/// Keeps every delivered artifact in memory, in delivery order.
#[derive(Debug, Default)]
pub struct MemorySink {
    downloads: Mutex<Vec<Download>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downloads(&self) -> Vec<Download> {
        self.downloads.lock().clone()
    }

    pub fn file_names(&self) -> Vec<String> {
        self.downloads.lock().iter().map(|d| d.file_name.clone()).collect()
    }

    pub fn data_urls(&self) -> Vec<String> {
        self.downloads.lock().iter().map(Download::data_url).collect()
    }

    pub fn len(&self) -> usize {
        self.downloads.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.downloads.lock().is_empty()
    }

    pub fn take(&self) -> Vec<Download> {
        std::mem::take(&mut *self.downloads.lock())
    }
}

impl DownloadSink for MemorySink {
    async fn deliver(&self, download: Download) -> Result<()> {
        debug!("Captured {} ({} bytes)", download.file_name, download.bytes.len());
        self.downloads.lock().push(download);
        Ok(())
    }
}
