// Weight catalog - where each symbolic weight name is fetched from

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::weights::WeightFormat;
use crate::errors;

/// Remote location of a weight artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightSource {
    /// Plain HTTP(S) download
    Url { url: String },
    /// File inside a HuggingFace Hub model repository
    Hub {
        repo: String,
        file: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        revision: Option<String>,
    },
}

/// One `[[weights]]` entry in config.toml:
///
/// ```toml
/// [[weights]]
/// name = "swin_b.cuda"
/// format = "torch"
/// url = "https://example.com/unicl/swin_b.cuda.pth"
/// sha256 = "..."
/// ```
///
/// `name` is the file stem, so accelerator variants are separate entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(default)]
    pub format: WeightFormat,
    #[serde(flatten)]
    pub source: WeightSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl CatalogEntry {
    pub fn url(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: WeightFormat::default(),
            source: WeightSource::Url { url: url.into() },
            sha256: None,
        }
    }

    pub fn hub(name: impl Into<String>, repo: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: WeightFormat::default(),
            source: WeightSource::Hub {
                repo: repo.into(),
                file: file.into(),
                revision: None,
            },
            sha256: None,
        }
    }

    pub fn with_format(mut self, format: WeightFormat) -> Self {
        self.format = format;
        self
    }

    /// Pin a Hub entry to a branch, tag or commit; ignored for URL entries
    pub fn with_revision(mut self, rev: impl Into<String>) -> Self {
        if let WeightSource::Hub { ref mut revision, .. } = self.source {
            *revision = Some(rev.into());
        }
        self
    }

    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }
}

/// Known weights, keyed by (name, format)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeightCatalog {
    entries: Vec<CatalogEntry>,
}

impl WeightCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn lookup(&self, name: &str, format: WeightFormat) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.name == name && e.format == format)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Names available in `format`, in catalog order
    pub fn names(&self, format: WeightFormat) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.format == format)
            .map(|e| e.name.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reject duplicate keys, empty fields and malformed checksums
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();

        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.name.trim().is_empty() {
                anyhow::bail!("weights[{}] has an empty name", idx);
            }

            if !seen.insert((entry.name.as_str(), entry.format)) {
                anyhow::bail!(errors::wrap_error_with_suggestion(
                    format!(
                        "Duplicate catalog entry '{}' ({}) at weights[{}]",
                        entry.name, entry.format, idx
                    ),
                    "Each name may appear once per format.\n\
                     Accelerator builds use their own name, e.g. \"swin_b.cuda\"."
                ));
            }

            match &entry.source {
                WeightSource::Url { url } => {
                    if !(url.starts_with("http://") || url.starts_with("https://")) {
                        anyhow::bail!(
                            "weights[{}] ('{}') url must start with http:// or https://",
                            idx,
                            entry.name
                        );
                    }
                }
                WeightSource::Hub { repo, file, .. } => {
                    if repo.trim().is_empty() || file.trim().is_empty() {
                        anyhow::bail!(
                            "weights[{}] ('{}') needs both repo and file",
                            idx,
                            entry.name
                        );
                    }
                }
            }

            if let Some(ref sha) = entry.sha256 {
                if sha.len() != 64 || !sha.chars().all(|c| c.is_ascii_hexdigit()) {
                    anyhow::bail!(errors::wrap_error_with_suggestion(
                        format!("weights[{}] ('{}') has a malformed sha256", idx, entry.name),
                        "Expected 64 hex characters, e.g. the output of `sha256sum`."
                    ));
                }
            }
        }

        Ok(())
    }
}
