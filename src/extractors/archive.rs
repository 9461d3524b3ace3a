//! Zip archive expansion.
//!
//! The expander only unpacks; dispatching the members (and nested archives)
//! is done by the [`crate::Ingestor`] so each member goes through the same
//! routing as a top-level input.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::error::ArchiveError;

/// macOS resource-fork directory added by Finder when zipping.
const MACOS_METADATA_DIR: &str = "__MACOSX";

/// Hardening limits for untrusted archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLimits {
    /// Archives nested deeper than this are rejected.
    pub max_depth: usize,
    pub max_entries: usize,
    pub max_total_bytes: u64,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_entries: 10_000,
            max_total_bytes: 1024 * 1024 * 1024,
        }
    }
}

/// A file unpacked from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    /// Path inside the archive, `/` separated.
    pub name: String,
    /// Location of the extracted copy.
    pub path: PathBuf,
}

/// Result of unpacking: members to dispatch plus entries that failed.
#[derive(Debug, Default)]
pub struct Unpacked {
    pub members: Vec<ArchiveMember>,
    /// Entry name and [`ArchiveError::ExtractFailed`] for entries that could
    /// not be extracted.
    pub failures: Vec<(String, ArchiveError)>,
}

impl Unpacked {
    fn fail(&mut self, name: String, reason: impl ToString) {
        let error = ArchiveError::ExtractFailed {
            name: name.clone(),
            reason: reason.to_string(),
        };
        self.failures.push((name, error));
    }
}

/// Unpacks zip archives into a caller-owned scratch directory.
#[derive(Debug, Clone, Default)]
pub struct ArchiveExpander {
    limits: ArchiveLimits,
}

impl ArchiveExpander {
    pub fn new(limits: ArchiveLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ArchiveLimits {
        &self.limits
    }

    /// Extract `archive` into `dest` and list every regular file found there.
    ///
    /// Blocking. Entry count and declared size are checked up front; actual
    /// bytes written are bounded too, so lying headers cannot exceed the limit.
    pub fn unpack(&self, archive: &Path, dest: &Path) -> Result<Unpacked, ArchiveError> {
        let file = File::open(archive).map_err(|e| ArchiveError::OpenFailed(e.to_string()))?;
        let mut zip = ZipArchive::new(file)?;

        if zip.len() > self.limits.max_entries {
            return Err(ArchiveError::TooManyEntries(self.limits.max_entries));
        }

        let mut declared: u64 = 0;
        for i in 0..zip.len() {
            if let Ok(entry) = zip.by_index_raw(i) {
                declared = declared.saturating_add(entry.size());
            }
        }
        if declared > self.limits.max_total_bytes {
            return Err(ArchiveError::TooLarge(self.limits.max_total_bytes));
        }

        let mut unpacked = Unpacked::default();
        let mut remaining = self.limits.max_total_bytes;

        for i in 0..zip.len() {
            let fallback_name = zip
                .name_for_index(i)
                .map(str::to_string)
                .unwrap_or_else(|| format!("entry-{}", i));
            let mut entry = match zip.by_index(i) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read {}: {}", fallback_name, e);
                    unpacked.fail(fallback_name, e);
                    continue;
                }
            };

            let name = entry.name().to_string();
            if entry.is_dir() || is_resource_fork(Path::new(&name)) {
                continue;
            }

            let Some(relative) = entry.enclosed_name() else {
                warn!("Refusing unsafe entry path {}", name);
                unpacked.fail(name, "entry path escapes the archive");
                continue;
            };

            let target = dest.join(&relative);
            match write_entry(&mut entry, &target, remaining) {
                Ok(written) => remaining -= written,
                Err(e) => {
                    warn!("Failed to extract {}: {}", name, e);
                    // A partial file must not be picked up by the walk below.
                    let _ = fs::remove_file(&target);
                    match e {
                        EntryError::OverBudget => {
                            return Err(ArchiveError::TooLarge(self.limits.max_total_bytes))
                        }
                        EntryError::Io(e) => unpacked.fail(name, e),
                    }
                }
            }
        }

        unpacked.members = walk_members(dest);
        debug!(
            archive = %archive.display(),
            members = unpacked.members.len(),
            failures = unpacked.failures.len(),
            "Unpacked archive"
        );
        Ok(unpacked)
    }
}

#[derive(Debug)]
enum EntryError {
    Io(io::Error),
    OverBudget,
}

impl std::fmt::Display for EntryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "{}", e),
            Self::OverBudget => f.write_str("archive expands beyond size limit"),
        }
    }
}

impl From<io::Error> for EntryError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Copy at most `budget` bytes of an entry to `target`.
fn write_entry(entry: &mut impl Read, target: &Path, budget: u64) -> Result<u64, EntryError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = File::create(target)?;
    let written = io::copy(&mut entry.take(budget.saturating_add(1)), &mut out)?;
    if written > budget {
        return Err(EntryError::OverBudget);
    }
    Ok(written)
}

/// Finder's `__MACOSX/` resource forks are never members.
///
/// Dot-files are ordinary members; they reach the dispatcher like any other
/// file and fail there if their kind is unsupported.
fn is_resource_fork(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(part) if part == MACOS_METADATA_DIR))
}

/// Every regular file under `root`, sorted by archive-relative name.
fn walk_members(root: &Path) -> Vec<ArchiveMember> {
    let mut members: Vec<ArchiveMember> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let relative = e.path().strip_prefix(root).ok()?;
            if is_resource_fork(relative) {
                return None;
            }
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            Some(ArchiveMember {
                name,
                path: e.path().to_path_buf(),
            })
        })
        .collect();

    members.sort_by(|a, b| a.name.cmp(&b.name));
    members
}
