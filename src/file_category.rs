/// File classification into destination buckets.
///
/// A bucket is the name of the subfolder a file is sorted into. Depending on the
/// [`OrganizeMode`], the bucket comes from the file's extension (looked up in a
/// [`CategoryRuleTable`]), its modification month, or its size tier.
///
/// # Examples
///
/// ```
/// use dirsort::file_category::{CategoryRuleTable, OrganizeMode, classify};
///
/// let rules = CategoryRuleTable::default();
/// let modified = chrono::Local::now();
/// assert_eq!(classify(".PNG", 10, modified, OrganizeMode::Category, &rules), "Images");
/// assert_eq!(classify(".xyz", 10, modified, OrganizeMode::Category, &rules), "Others");
/// assert_eq!(classify(".xyz", 10, modified, OrganizeMode::Size, &rules), "Small");
/// ```
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Bucket that receives every extension no rule matches.
pub const OTHERS_BUCKET: &str = "Others";

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;

/// How files are assigned to buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OrganizeMode {
    /// By extension, using the rule table.
    #[default]
    Category,
    /// By modification month (`YYYY-MM`).
    Date,
    /// By size tier.
    Size,
}

impl std::fmt::Display for OrganizeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrganizeMode::Category => "category",
            OrganizeMode::Date => "date",
            OrganizeMode::Size => "size",
        };
        f.write_str(name)
    }
}

/// Fixed size tiers used by [`OrganizeMode::Size`].
///
/// Upper bounds are exclusive and use 1024-based units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SizeTier {
    /// Under 1 MiB.
    Small,
    /// 1 MiB up to (not including) 10 MiB.
    Medium,
    /// 10 MiB up to (not including) 100 MiB.
    Large,
    /// 100 MiB and above.
    VeryLarge,
}

impl SizeTier {
    /// Picks the tier for a byte count.
    pub fn from_bytes(size: u64) -> Self {
        if size < MIB {
            SizeTier::Small
        } else if size < 10 * MIB {
            SizeTier::Medium
        } else if size < 100 * MIB {
            SizeTier::Large
        } else {
            SizeTier::VeryLarge
        }
    }

    /// Returns the bucket name for this tier.
    pub fn bucket_name(&self) -> &'static str {
        match self {
            SizeTier::Small => "Small",
            SizeTier::Medium => "Medium",
            SizeTier::Large => "Large",
            SizeTier::VeryLarge => "Very Large",
        }
    }
}

/// Errors raised while building a [`CategoryRuleTable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// A bucket name was empty or only whitespace.
    #[error("bucket name must not be empty")]
    EmptyBucketName,
    /// The same bucket name was added twice.
    #[error("bucket '{0}' is defined more than once")]
    DuplicateBucket(String),
    /// An extension could not be normalized.
    #[error("invalid extension '{extension}' in bucket '{bucket}'")]
    InvalidExtension {
        /// The bucket the extension was listed under.
        bucket: String,
        /// The raw extension as supplied.
        extension: String,
    },
}

/// A single bucket and the extensions that route to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRule {
    name: String,
    extensions: BTreeSet<String>,
}

impl CategoryRule {
    /// The bucket name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized extensions (lowercase, leading dot).
    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }
}

/// Ordered mapping from bucket name to a set of extensions.
///
/// Lookups are first-match-wins in insertion order, so an extension listed
/// under two buckets always lands in the earlier one. Extensions matched by no
/// rule go to [`OTHERS_BUCKET`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRuleTable {
    rules: Vec<CategoryRule>,
}

impl CategoryRuleTable {
    /// Creates an empty table. Every lookup returns [`OTHERS_BUCKET`].
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Appends a bucket after validating its name and normalizing its extensions.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] for an empty or duplicate bucket name, or an
    /// extension that is empty or contains a path separator.
    pub fn add_rule<I, S>(&mut self, name: &str, extensions: I) -> Result<(), RuleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(RuleError::EmptyBucketName);
        }
        if self.rules.iter().any(|rule| rule.name == name) {
            return Err(RuleError::DuplicateBucket(name.to_string()));
        }

        let extensions = extensions
            .into_iter()
            .map(|raw| {
                normalize_extension(raw.as_ref()).ok_or_else(|| RuleError::InvalidExtension {
                    bucket: name.to_string(),
                    extension: raw.as_ref().to_string(),
                })
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        self.rules.push(CategoryRule {
            name: name.to_string(),
            extensions,
        });
        Ok(())
    }

    /// Returns the bucket for an extension, or [`OTHERS_BUCKET`] when no rule matches.
    ///
    /// The extension may be given with or without its leading dot, in any case.
    pub fn bucket_for(&self, extension: &str) -> &str {
        let Some(extension) = normalize_extension(extension) else {
            return OTHERS_BUCKET;
        };

        self.rules
            .iter()
            .find(|rule| rule.extensions.contains(&extension))
            .map(|rule| rule.name.as_str())
            .unwrap_or(OTHERS_BUCKET)
    }

    /// Iterates over the rules in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = &CategoryRule> {
        self.rules.iter()
    }

    /// Number of buckets in the table.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the table has no buckets.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for CategoryRuleTable {
    fn default() -> Self {
        const DEFAULT_RULES: &[(&str, &[&str])] = &[
            (
                "Images",
                &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".ico", ".webp", ".tiff"],
            ),
            (
                "Videos",
                &[".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm", ".m4v"],
            ),
            ("Audio", &[".mp3", ".wav", ".flac", ".aac", ".ogg", ".wma", ".m4a"]),
            (
                "Documents",
                &[
                    ".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt", ".xls", ".xlsx", ".ppt",
                    ".pptx",
                ],
            ),
            ("Archives", &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz"]),
            (
                "Code",
                &[
                    ".py", ".java", ".cpp", ".c", ".js", ".html", ".css", ".php", ".rb", ".go",
                    ".rs",
                ],
            ),
            (
                "Executables",
                &[".exe", ".msi", ".bat", ".sh", ".app", ".deb", ".rpm"],
            ),
            (OTHERS_BUCKET, &[]),
        ];

        let rules = DEFAULT_RULES
            .iter()
            .map(|(name, extensions)| CategoryRule {
                name: (*name).to_string(),
                extensions: extensions.iter().map(|ext| (*ext).to_string()).collect(),
            })
            .collect();

        Self { rules }
    }
}

/// Normalizes an extension to lowercase with a single leading dot.
///
/// Returns `None` for empty input or input containing a path separator.
///
/// ```
/// use dirsort::file_category::normalize_extension;
///
/// assert_eq!(normalize_extension("JPG").as_deref(), Some(".jpg"));
/// assert_eq!(normalize_extension(".Tar").as_deref(), Some(".tar"));
/// assert_eq!(normalize_extension(""), None);
/// ```
pub fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() || trimmed.contains(['/', '\\']) || trimmed.contains(char::is_whitespace)
    {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}

/// Computes the destination bucket for a file.
///
/// * `Category` - first rule in `rules` whose extension set contains `extension`.
/// * `Date` - `YYYY-MM` of `modified`.
/// * `Size` - the [`SizeTier`] bucket for `size`.
pub fn classify(
    extension: &str,
    size: u64,
    modified: DateTime<Local>,
    mode: OrganizeMode,
    rules: &CategoryRuleTable,
) -> String {
    match mode {
        OrganizeMode::Category => rules.bucket_for(extension).to_string(),
        OrganizeMode::Date => modified.format("%Y-%m").to_string(),
        OrganizeMode::Size => SizeTier::from_bytes(size).bucket_name().to_string(),
    }
}
