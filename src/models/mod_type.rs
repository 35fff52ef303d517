//! Mod types and the asset database used to translate hashes and indices.
//!
//! A [`ModType`] describes one character skeleton that mods can be written
//! for: the pattern that identifies its root section, the target variants it
//! can be remapped to, and the tables that map old asset identifiers to the
//! identifiers each variant expects.

use super::config::{AssetTable, MainConfig, ModTypeConfig};
use indexmap::IndexSet;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Which identifier namespace a lookup refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Hash,
    Index,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("Asset {0} is not recognized")]
    UnknownAsset(String),

    #[error("Asset {id} has no replacement for {variant}")]
    NoMapping { id: String, variant: String },
}

#[derive(Error, Debug)]
pub enum ModTypeError {
    #[error("Invalid root pattern for mod type {name}: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// Resolves old asset identifiers to the identifiers a target variant expects.
#[cfg_attr(test, mockall::automock)]
pub trait VersionAssetLookup {
    /// Translate `old_id` for `variant`
    fn resolve(&self, kind: AssetKind, old_id: &str, variant: &str) -> Result<String, AssetError>;

    /// Whether `id` is one of the identifiers this lookup can translate
    fn is_known(&self, kind: AssetKind, id: &str) -> bool;

    /// Variants for which every recognized identifier resolves.
    ///
    /// Returns `None` when none of the identifiers is recognized, meaning the
    /// identifiers impose no constraint.
    fn common_variants(
        &self,
        hashes: &IndexSet<String>,
        indices: &IndexSet<String>,
    ) -> Option<BTreeSet<String>>;

    /// Every variant this lookup can generate content for
    fn variants(&self) -> BTreeSet<String>;
}

/// One identifier table: old id -> variant -> new id.
#[derive(Debug, Clone, Default)]
pub struct AssetRepo {
    table: AssetTable,
}

impl AssetRepo {
    pub fn new(table: AssetTable) -> Self {
        Self { table }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.table.contains_key(id)
    }

    pub fn replace(&self, id: &str, variant: &str) -> Result<String, AssetError> {
        let replacements = self
            .table
            .get(id)
            .ok_or_else(|| AssetError::UnknownAsset(id.to_string()))?;

        replacements
            .get(variant)
            .cloned()
            .ok_or_else(|| AssetError::NoMapping {
                id: id.to_string(),
                variant: variant.to_string(),
            })
    }

    /// Variants `id` can be translated to, or `None` if `id` is unknown
    pub fn variants_for(&self, id: &str) -> Option<BTreeSet<String>> {
        self.table
            .get(id)
            .map(|replacements| replacements.keys().cloned().collect())
    }

    pub fn all_variants(&self) -> BTreeSet<String> {
        self.table
            .values()
            .flat_map(|replacements| replacements.keys().cloned())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ModType {
    name: String,
    aliases: Vec<String>,
    root_pattern: Regex,
    variants: Vec<String>,
    hashes: AssetRepo,
    indices: AssetRepo,
}

impl ModType {
    pub fn new(name: impl Into<String>, root_pattern: Regex) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            root_pattern,
            variants: Vec::new(),
            hashes: AssetRepo::default(),
            indices: AssetRepo::default(),
        }
    }

    pub fn from_config(name: &str, config: &ModTypeConfig) -> Result<Self, ModTypeError> {
        let root_pattern =
            Regex::new(&config.root_pattern).map_err(|source| ModTypeError::InvalidPattern {
                name: name.to_string(),
                source,
            })?;

        Ok(Self {
            name: name.to_string(),
            aliases: config.aliases.clone(),
            root_pattern,
            variants: config.variants.clone(),
            hashes: AssetRepo::new(config.hashes.clone()),
            indices: AssetRepo::new(config.indices.clone()),
        })
    }

    pub fn with_variants<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variants = variants.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hashes(mut self, table: AssetTable) -> Self {
        self.hashes = AssetRepo::new(table);
        self
    }

    pub fn with_indices(mut self, table: AssetTable) -> Self {
        self.indices = AssetRepo::new(table);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name with line breaks and tabs removed, for use inside generated comments
    pub fn display_name(&self) -> String {
        self.name.replace(['\n', '\t'], "")
    }

    /// Whether a section header line is this type's root section
    pub fn is_type(&self, line: &str) -> bool {
        self.root_pattern.is_match(line)
    }

    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.trim();
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name))
    }

    fn repo(&self, kind: AssetKind) -> &AssetRepo {
        match kind {
            AssetKind::Hash => &self.hashes,
            AssetKind::Index => &self.indices,
        }
    }
}

impl VersionAssetLookup for ModType {
    fn resolve(&self, kind: AssetKind, old_id: &str, variant: &str) -> Result<String, AssetError> {
        self.repo(kind).replace(old_id, variant)
    }

    fn is_known(&self, kind: AssetKind, id: &str) -> bool {
        self.repo(kind).contains(id)
    }

    fn common_variants(
        &self,
        hashes: &IndexSet<String>,
        indices: &IndexSet<String>,
    ) -> Option<BTreeSet<String>> {
        let hash_variants = hashes.iter().filter_map(|id| self.hashes.variants_for(id));
        let index_variants = indices.iter().filter_map(|id| self.indices.variants_for(id));

        hash_variants
            .chain(index_variants)
            .reduce(|common, variants| common.intersection(&variants).cloned().collect())
    }

    fn variants(&self) -> BTreeSet<String> {
        if !self.variants.is_empty() {
            return self.variants.iter().cloned().collect();
        }

        let mut variants = self.hashes.all_variants();
        variants.extend(self.indices.all_variants());
        variants
    }
}

/// Every mod type known to the tool, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct ModTypes {
    types: Vec<Arc<ModType>>,
}

impl ModTypes {
    pub fn from_config(config: &MainConfig) -> Result<Self, ModTypeError> {
        let types = config
            .remap_data
            .mod_types
            .iter()
            .map(|(name, mod_type)| ModType::from_config(name, mod_type).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Loaded {} mod types", types.len());
        Ok(Self { types })
    }

    /// Find a mod type by name or alias, ignoring case
    pub fn search(&self, name: &str) -> Option<Arc<ModType>> {
        self.types
            .iter()
            .find(|mod_type| mod_type.matches_name(name))
            .cloned()
    }

    pub fn all(&self) -> &[Arc<ModType>] {
        &self.types
    }
}
