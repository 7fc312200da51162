// Weight Downloader - fetches catalog weights to their conventional path
// Plain URLs go through reqwest, Hub entries through the HuggingFace Hub cache

use hf_hub::{api::sync::ApiBuilder, Repo, RepoType};
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::catalog::{CatalogEntry, WeightCatalog, WeightSource};
use super::weights::WeightFormat;
use crate::errors::LoadError;

/// Fetches a weight artifact to a local path.
///
/// The target's file stem (e.g. `swin_b.cuda` for `.../swin_b.cuda.pth`)
/// names the artifact. Only called when the target is absent.
pub trait Downloader {
    fn download(&self, target: &Path, format: WeightFormat) -> Result<(), LoadError>;
}

/// Downloader backed by a [`WeightCatalog`]
pub struct CatalogDownloader {
    catalog: WeightCatalog,
    hub_token: Option<String>,
    hub_cache_dir: Option<PathBuf>,
    hub_endpoint: Option<String>,
    show_progress: bool,
}

impl CatalogDownloader {
    pub fn new(catalog: WeightCatalog) -> Self {
        Self {
            catalog,
            hub_token: None,
            hub_cache_dir: None,
            hub_endpoint: None,
            show_progress: false,
        }
    }

    /// HuggingFace token for gated or private repos
    pub fn with_hub_token(mut self, token: Option<String>) -> Self {
        self.hub_token = token;
        self
    }

    /// Custom HuggingFace cache (default: ~/.cache/huggingface/)
    pub fn with_hub_cache_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.hub_cache_dir = dir;
        self
    }

    /// Hub mirror to fetch from (default: https://huggingface.co)
    pub fn with_hub_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.hub_endpoint = endpoint;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn catalog(&self) -> &WeightCatalog {
        &self.catalog
    }

    fn fetch_url(&self, url: &str, out: &mut File) -> Result<(), String> {
        let response = reqwest::blocking::get(url)
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?;

        let pb = self.progress_bar(response.content_length());
        let mut reader = pb.wrap_read(response);
        io::copy(&mut reader, out).map_err(|e| format!("read failed: {}", e))?;
        out.flush().map_err(|e| e.to_string())?;
        pb.finish_and_clear();

        Ok(())
    }

    fn fetch_hub(
        &self,
        repo: &str,
        file: &str,
        revision: Option<&str>,
        out: &mut File,
    ) -> Result<(), String> {
        let mut builder = ApiBuilder::new()
            .with_progress(self.show_progress)
            .with_token(self.hub_token.clone());
        if let Some(ref dir) = self.hub_cache_dir {
            builder = builder.with_cache_dir(dir.clone());
        }
        if let Some(ref endpoint) = self.hub_endpoint {
            builder = builder.with_endpoint(endpoint.trim_end_matches('/').to_string());
        }
        let api = builder.build().map_err(|e| e.to_string())?;

        let repo = match revision {
            Some(rev) => Repo::with_revision(repo.to_string(), RepoType::Model, rev.to_string()),
            None => Repo::new(repo.to_string(), RepoType::Model),
        };

        // Download file (with resume support) into the hub cache, then copy out
        let cached = api.repo(repo).get(file).map_err(|e| e.to_string())?;
        tracing::debug!("Hub file {} cached at {:?}", file, cached);

        let mut src = File::open(&cached).map_err(|e| e.to_string())?;
        io::copy(&mut src, out).map_err(|e| e.to_string())?;
        out.flush().map_err(|e| e.to_string())?;

        Ok(())
    }

    fn progress_bar(&self, len: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        match len {
            Some(len) => {
                let pb = ProgressBar::new(len);
                pb.set_style(
                    ProgressStyle::with_template(
                        "[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} {msg}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
                );
                pb
            }
            None => ProgressBar::new_spinner(),
        }
    }
}

impl Downloader for CatalogDownloader {
    fn download(&self, target: &Path, format: WeightFormat) -> Result<(), LoadError> {
        let name = target
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| LoadError::WeightResolution {
                spec: target.display().to_string(),
                reason: "target path has no file name".to_string(),
            })?
            .to_string();

        let entry = self
            .catalog
            .lookup(&name, format)
            .ok_or_else(|| LoadError::UnknownWeight {
                name: name.clone(),
                format,
            })?;

        // Any failure from here on is a failed fetch, filesystem ones included
        let download_error = |reason: String| LoadError::Download {
            name: name.clone(),
            path: target.to_path_buf(),
            reason,
        };

        let dir = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)
            .map_err(|e| download_error(format!("cannot create {}: {}", dir.display(), e)))?;

        // Write next to the target so the final rename stays on one filesystem
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| {
            download_error(format!("cannot create temp file in {}: {}", dir.display(), e))
        })?;

        tracing::info!("Downloading {} ({}) to {:?}", name, format, target);
        let fetched = match &entry.source {
            WeightSource::Url { url } => self.fetch_url(url, tmp.as_file_mut()),
            WeightSource::Hub {
                repo,
                file,
                revision,
            } => self.fetch_hub(repo, file, revision.as_deref(), tmp.as_file_mut()),
        };

        fetched.map_err(download_error)?;
        verify_checksum(entry, tmp.path()).map_err(download_error)?;

        tmp.persist(target)
            .map_err(|e| download_error(format!("cannot move download into place: {}", e.error)))?;

        tracing::info!("Downloaded {} to {:?}", name, target);
        Ok(())
    }
}

fn verify_checksum(entry: &CatalogEntry, path: &Path) -> Result<(), String> {
    let Some(ref expected) = entry.sha256 else {
        return Ok(());
    };

    let actual = sha256_file(path).map_err(|e| format!("failed to hash download: {}", e))?;
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(format!(
            "checksum mismatch (expected {}, got {})",
            expected, actual
        ));
    }
    Ok(())
}

/// Lowercase hex SHA-256 of a file
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut file = File::open(path)?;
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
