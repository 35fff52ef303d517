use super::errors::RemapError;
use super::ini_file::{ApplyOutcome, IniFile, DEFAULT_MANAGED_RESOURCE_PATTERN};
use crate::models::{ModType, ModTypes, RemapSettings};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::sync::Arc;

/// What to do with each file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemapOptions {
    /// Only add generated content, never remove earlier content
    pub fix_only: bool,

    /// Only remove generated content
    pub undo_only: bool,

    /// Mod types to look for; empty means every configured type
    pub types: Vec<String>,

    /// Type assumed when a file matches none of `types`
    pub default_type: Option<String>,

    /// Variants to generate; empty means every variant of the detected type
    pub variants: Vec<String>,

    pub managed_resource_pattern: String,
}

impl Default for RemapOptions {
    fn default() -> Self {
        Self {
            fix_only: false,
            undo_only: false,
            types: Vec::new(),
            default_type: None,
            variants: Vec::new(),
            managed_resource_pattern: DEFAULT_MANAGED_RESOURCE_PATTERN.to_string(),
        }
    }
}

impl RemapOptions {
    /// Options taken from the saved user settings
    pub fn from_settings(settings: &RemapSettings) -> Self {
        Self {
            types: settings.types.clone(),
            default_type: settings.default_type.clone(),
            variants: settings.variants.clone(),
            managed_resource_pattern: settings.managed_resource_pattern.clone(),
            ..Self::default()
        }
    }

    /// Reject option combinations before any file is touched
    pub fn validate(&self) -> Result<(), RemapError> {
        if self.fix_only && self.undo_only {
            return Err(RemapError::ConflictingOptions(vec![
                "--fix-only".to_string(),
                "--undo-only".to_string(),
            ]));
        }
        Ok(())
    }
}

/// Status of one processed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Fixed { variants: Vec<String> },
    AlreadyFixed,
    Undone,

    /// A mod file with nothing to add or remove
    Unchanged,
    NotMod,
}

/// Result of processing one file
#[derive(Debug, Clone)]
pub struct FileResult {
    pub path: Utf8PathBuf,
    pub status: FileStatus,

    /// Whether the file on disk was rewritten
    pub written: bool,

    /// Generated buffer files whose resource sections were removed
    pub removed_files: Vec<Utf8PathBuf>,

    /// Buffer files the new resource sections point at, to be produced from
    /// the originals
    pub generated_files: Vec<Utf8PathBuf>,
}

/// Counters over a whole run
#[derive(Debug, Clone, Default)]
pub struct RemapSummary {
    pub fixed: usize,
    pub already_fixed: usize,
    pub undone: usize,
    pub unchanged: usize,
    pub not_mod: usize,

    /// Files that failed, with the reason
    pub skipped: Vec<(Utf8PathBuf, String)>,

    pub removed_files: Vec<Utf8PathBuf>,
    pub generated_files: Vec<Utf8PathBuf>,
}

impl RemapSummary {
    pub fn record(&mut self, result: FileResult) {
        match result.status {
            FileStatus::Fixed { .. } => self.fixed += 1,
            FileStatus::AlreadyFixed => self.already_fixed += 1,
            FileStatus::Undone => self.undone += 1,
            FileStatus::Unchanged => self.unchanged += 1,
            FileStatus::NotMod => self.not_mod += 1,
        }
        self.removed_files.extend(result.removed_files);
        self.generated_files.extend(result.generated_files);
    }

    pub fn has_failures(&self) -> bool {
        !self.skipped.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if self.fixed > 0 {
            parts.push(format!("{} fixed", self.fixed));
        }
        if self.already_fixed > 0 {
            parts.push(format!("{} already fixed", self.already_fixed));
        }
        if self.undone > 0 {
            parts.push(format!("{} undone", self.undone));
        }
        if self.unchanged > 0 {
            parts.push(format!("{} unchanged", self.unchanged));
        }
        if self.not_mod > 0 {
            parts.push(format!("{} not mod files", self.not_mod));
        }
        if !self.skipped.is_empty() {
            parts.push(format!("{} skipped", self.skipped.len()));
        }

        if parts.is_empty() {
            "Nothing to do".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Runs undo and apply over a set of `.ini` files, one at a time
pub struct RemapService {
    options: RemapOptions,
    mod_types: Vec<Arc<ModType>>,
    default_type: Option<Arc<ModType>>,
}

impl RemapService {
    /// # Errors
    ///
    /// Returns [`RemapError::ConflictingOptions`] for contradictory options and
    /// [`RemapError::InvalidModType`] for a type name that is not configured.
    pub fn new(mod_types: &ModTypes, options: RemapOptions) -> Result<Self, RemapError> {
        options.validate()?;

        let types = if options.types.is_empty() {
            mod_types.all().to_vec()
        } else {
            options
                .types
                .iter()
                .map(|name| {
                    mod_types
                        .search(name)
                        .ok_or_else(|| RemapError::InvalidModType(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let default_type = options
            .default_type
            .as_deref()
            .map(|name| {
                mod_types
                    .search(name)
                    .ok_or_else(|| RemapError::InvalidModType(name.to_string()))
            })
            .transpose()?;

        Ok(Self {
            options,
            mod_types: types,
            default_type,
        })
    }

    pub fn options(&self) -> &RemapOptions {
        &self.options
    }

    fn open(&self, path: &Utf8Path) -> Result<IniFile, RemapError> {
        IniFile::from_path(path.to_path_buf())
            .with_mod_types(self.mod_types.clone())
            .with_default_mod_type(self.default_type.clone())
            .with_variants(self.options.variants.iter().cloned())
            .with_managed_resource_pattern(&self.options.managed_resource_pattern)
    }

    /// Undo then apply one file, writing it once if its text changed
    pub fn process_file(&self, path: &Utf8Path) -> Result<FileResult, RemapError> {
        let mut ini = self.open(path)?;
        let mut result = FileResult {
            path: path.to_path_buf(),
            status: FileStatus::NotMod,
            written: false,
            removed_files: Vec::new(),
            generated_files: Vec::new(),
        };

        if !ini.check_is_mod()? {
            tracing::debug!("{} is not a mod file", path);
            return Ok(result);
        }
        let original = ini.text().to_string();
        result.status = FileStatus::Unchanged;

        if !self.options.fix_only {
            let report = ini.undo()?;
            if !report.is_unchanged() {
                result.removed_files = report.removed_files();
                result.status = FileStatus::Undone;
            }
        }

        if !self.options.undo_only {
            result.status = match ini.apply()? {
                ApplyOutcome::Applied { variants } => {
                    result.generated_files = ini
                        .remap_models()
                        .values()
                        .flat_map(|model| model.fixed_full_paths().into_values())
                        .flat_map(IndexMap::into_values)
                        .collect();
                    FileStatus::Fixed { variants }
                }
                ApplyOutcome::AlreadyFixed => FileStatus::AlreadyFixed,
                ApplyOutcome::NoRoot => FileStatus::NotMod,
            };
        }

        if ini.text() != original {
            ini.write()?;
            result.written = true;
        }

        tracing::info!("{}: {:?}", path, result.status);
        Ok(result)
    }

    /// Process every file, recording failures and carrying on
    pub fn run<I, P>(&self, paths: I) -> RemapSummary
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        let mut summary = RemapSummary::default();

        for path in paths {
            let path = path.as_ref();
            match self.process_file(path) {
                Ok(result) => summary.record(result),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path, e);
                    summary.skipped.push((path.to_path_buf(), e.to_string()));
                }
            }
        }

        tracing::info!("Done: {}", summary.summary());
        summary
    }
}
