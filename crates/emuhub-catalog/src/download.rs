//! Archive download with resume support

use crate::{CatalogError, RemoteArchive};
use emuhub_progress::ProgressHandle;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Downloads release archives with retry, resume and cancellation
pub struct Downloader {
    download_dir: PathBuf,
    max_retries: u32,
    client: reqwest::Client,
}

impl Downloader {
    pub fn new(download_dir: PathBuf) -> Self {
        Self::with_retries(download_dir, 3)
    }

    pub fn with_retries(download_dir: PathBuf, max_retries: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .user_agent(format!("EmuHub/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            download_dir,
            max_retries,
            client,
        }
    }

    /// Download an archive into the download directory
    ///
    /// A `.partial` file holds the in-flight data and is resumed across
    /// retries via Range requests. Cancellation removes it; success renames
    /// it to the final file name.
    pub async fn download(
        &self,
        archive: &RemoteArchive,
        progress: &ProgressHandle,
    ) -> Result<PathBuf, CatalogError> {
        fs::create_dir_all(&self.download_dir)?;

        let output_path = self.download_dir.join(&archive.filename);
        let partial_path = self
            .download_dir
            .join(format!("{}.partial", archive.filename));

        if archive.size > 0 {
            let available = self.available_space()?;
            if available < archive.size {
                return Err(CatalogError::InsufficientSpace {
                    needed: archive.size,
                    available,
                });
            }
        }

        tracing::info!(
            "Downloading {} ({} bytes) from {}",
            archive.filename,
            archive.size,
            archive.download_url
        );
        progress.begin(
            &format!("Downloading {}", archive.filename),
            archive.size,
            "bytes",
        );
        progress.set_status("Downloading...");

        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if progress.is_cancelled() {
                break;
            }
            if attempt > 0 {
                let backoff = std::time::Duration::from_secs(2u64.pow(attempt));
                tracing::warn!(
                    "Retrying download ({} of {}) after {:?}",
                    attempt + 1,
                    self.max_retries,
                    backoff
                );
                tokio::time::sleep(backoff).await;
            }

            match self
                .stream_to_file(&archive.download_url, &partial_path, progress)
                .await
            {
                Ok(()) => {
                    fs::rename(&partial_path, &output_path)?;
                    progress.finish();
                    tracing::info!("Downloaded {}", output_path.display());
                    return Ok(output_path);
                }
                Err(CatalogError::Cancelled) => break,
                Err(e) => {
                    tracing::warn!("Download attempt failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        if progress.is_cancelled() {
            let _ = fs::remove_file(&partial_path);
            return Err(CatalogError::Cancelled);
        }

        progress.fail();
        Err(last_error
            .unwrap_or_else(|| CatalogError::DownloadFailed("All retry attempts exhausted".into())))
    }

    async fn stream_to_file(
        &self,
        url: &str,
        path: &Path,
        progress: &ProgressHandle,
    ) -> Result<(), CatalogError> {
        let resume_from = if path.exists() {
            fs::metadata(path)?.len()
        } else {
            0
        };

        let mut request = self.client.get(url);
        if resume_from > 0 {
            request = request.header("Range", format!("bytes={}-", resume_from));
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() && status != reqwest::StatusCode::PARTIAL_CONTENT {
            return Err(CatalogError::Status(status));
        }

        // A 200 to a ranged request means the server restarted from zero
        let mut downloaded = if resume_from > 0 && status == reqwest::StatusCode::PARTIAL_CONTENT {
            resume_from
        } else {
            0
        };

        let mut file = if downloaded > 0 {
            OpenOptions::new().append(true).open(path)?
        } else {
            fs::File::create(path)?
        };
        progress.set_completed(downloaded);

        let mut stream = response.bytes_stream();

        use futures_util::StreamExt;
        while let Some(chunk) = stream.next().await {
            if progress.is_cancelled() {
                return Err(CatalogError::Cancelled);
            }

            let chunk = chunk.map_err(|e| CatalogError::DownloadFailed(e.to_string()))?;
            file.write_all(&chunk)?;

            downloaded += chunk.len() as u64;
            progress.set_completed(downloaded);
        }

        file.sync_all()?;
        Ok(())
    }

    /// Remove stale `.partial` files left by interrupted downloads
    pub fn cleanup(&self) -> Result<(), CatalogError> {
        if self.download_dir.exists() {
            for entry in fs::read_dir(&self.download_dir)? {
                let path = entry?.path();
                if path.extension().is_some_and(|e| e == "partial") {
                    tracing::debug!("Removing stale partial {}", path.display());
                    fs::remove_file(path)?;
                }
            }
        }
        Ok(())
    }

    /// Get available disk space for the download directory
    pub fn available_space(&self) -> Result<u64, CatalogError> {
        // Use statvfs on Unix
        #[cfg(unix)]
        {
            use std::os::unix::ffi::OsStrExt;

            let path = self.download_dir.as_os_str();
            let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };

            let c_path = std::ffi::CString::new(path.as_bytes()).map_err(|e| {
                CatalogError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
            })?;

            let result = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };

            if result == 0 {
                Ok(stat.f_bavail as u64 * stat.f_bsize as u64)
            } else {
                Err(CatalogError::Io(std::io::Error::last_os_error()))
            }
        }

        #[cfg(not(unix))]
        {
            // Fallback: assume enough space
            Ok(u64::MAX)
        }
    }
}
