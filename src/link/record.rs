use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

/// Extension used when the asset URL has none
pub const DEFAULT_EXTENSION: &str = ".jpg";

/// A discovered reference to one downloadable wallpaper
///
/// Records are created by the extractor, sent once over the link channel and
/// consumed once by the retriever. All fields are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    source_url: String,
    collection_label: String,
    variant_key: String,
    period_label: String,
    sequence_index: u32,
}

impl LinkRecord {
    /// Creates a new record
    ///
    /// Returns `None` when `source_url` is empty.
    pub fn new(
        source_url: impl Into<String>,
        collection_label: impl Into<String>,
        variant_key: impl Into<String>,
        period_label: impl Into<String>,
        sequence_index: u32,
    ) -> Option<Self> {
        let source_url = source_url.into();
        if source_url.trim().is_empty() {
            return None;
        }

        Some(Self {
            source_url,
            collection_label: collection_label.into(),
            variant_key: variant_key.into(),
            period_label: period_label.into(),
            sequence_index,
        })
    }

    /// Absolute URL of the asset
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Grouping name, e.g. a release title or `Media`
    pub fn collection_label(&self) -> &str {
        &self.collection_label
    }

    /// Size discriminator used for filtering, e.g. `1920x1080`
    pub fn variant_key(&self) -> &str {
        &self.variant_key
    }

    /// `YYYY-MM` label, empty for undated records
    pub fn period_label(&self) -> &str {
        &self.period_label
    }

    /// 1-based listing position within the source page
    pub fn sequence_index(&self) -> u32 {
        self.sequence_index
    }

    /// Returns true if this record matches the requested variant exactly
    pub fn matches_variant(&self, variant: &str) -> bool {
        self.variant_key == variant
    }

    /// Filesystem-safe name derived from the label fields
    ///
    /// Dated records render as `"{period} {collection} {index} {variant}"`,
    /// undated ones as `"{collection} {index} {variant}"`. Every character other
    /// than ASCII letters, digits, whitespace and `-` is removed.
    ///
    /// # Example
    ///
    /// ```
    /// use gw2walls::LinkRecord;
    ///
    /// let record = LinkRecord::new(
    ///     "https://cdn.example.com/wall.jpg",
    ///     "Path of Fire: Release!",
    ///     "1920x1080",
    ///     "2017-09",
    ///     2,
    /// )
    /// .unwrap();
    /// assert_eq!(record.display_name(), "2017-09 Path of Fire Release 2 1920x1080");
    /// ```
    pub fn display_name(&self) -> String {
        let raw = if self.period_label.is_empty() {
            format!(
                "{} {} {}",
                self.collection_label, self.sequence_index, self.variant_key
            )
        } else {
            format!(
                "{} {} {} {}",
                self.period_label, self.collection_label, self.sequence_index, self.variant_key
            )
        };

        sanitize_name(&raw)
    }

    /// Display name with a short digest of the source URL appended
    ///
    /// Two records from different pages can share every label field; the digest
    /// keeps their files apart.
    pub fn disambiguated_name(&self) -> String {
        let digest = Sha256::digest(self.source_url.as_bytes());
        let short = hex::encode(&digest[..4]);
        format!("{} {}", self.display_name(), short)
    }

    /// File extension taken from the URL path, including the leading dot
    pub fn extension(&self) -> String {
        url_extension(&self.source_url).unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
    }

    /// Destination path inside `output_dir`
    pub fn destination(&self, output_dir: &Path, disambiguate: bool) -> PathBuf {
        let stem = if disambiguate {
            self.disambiguated_name()
        } else {
            self.display_name()
        };
        output_dir.join(format!("{}{}", stem, self.extension()))
    }
}

impl fmt::Display for LinkRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.display_name(), self.source_url)
    }
}

/// Strips every character that is not an ASCII letter, digit, whitespace or `-`
pub fn sanitize_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_ascii_whitespace() || *c == '-')
        .collect()
}

/// Extracts the extension of the last path segment of a URL
fn url_extension(source: &str) -> Option<String> {
    let path = match ::url::Url::parse(source) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => source
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let file_name = path.rsplit('/').next()?;
    let dot = file_name.rfind('.')?;
    let ext = &file_name[dot..];
    if ext.len() > 1 {
        Some(ext.to_string())
    } else {
        None
    }
}
