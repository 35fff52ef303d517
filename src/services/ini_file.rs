//! The `.ini` file model.
//!
//! An [`IniFile`] holds the text of one file, in memory or backed by a path,
//! and runs the apply/undo protocol over it. Every public operation starts
//! with [`IniFile::ensure_parsed`], so the text is scanned at most once per
//! change.

use super::errors::RemapError;
use super::generator::RemapFixer;
use super::graph::SectionGraph;
use super::names::{
    fixed_blend_file, remap_blend_name, remap_fix_name, remap_resource_name, sort_resources,
};
use super::parser::{ParsedIni, SectionParser};
use super::remover::{IniRemover, UndoReport};
use crate::models::{AssetKind, IniKey, ModType, RemapAssetModel, VersionAssetLookup};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Resources the engine rewrites unless configured otherwise
pub const DEFAULT_MANAGED_RESOURCE_PATTERN: &str = "^Resource";

/// Result of applying the remap to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Generated content was appended for these variants
    Applied { variants: Vec<String> },

    /// The file already holds generated content; nothing changed
    AlreadyFixed,

    /// No root section was recognized; nothing changed
    NoRoot,
}

pub struct IniFile {
    path: Option<Utf8PathBuf>,
    text: Option<String>,
    parsed: Option<ParsedIni>,

    mod_types: Vec<Arc<ModType>>,
    default_mod_type: Option<Arc<ModType>>,
    requested_variants: BTreeSet<String>,
    managed_resource_pattern: Regex,

    parser: SectionParser,
    remover: IniRemover,

    blend_graph: SectionGraph,
    non_blend_graph: SectionGraph,
    resource_graph: SectionGraph,
    remap_models: IndexMap<String, RemapAssetModel>,
    to_fix: BTreeSet<String>,
}

impl IniFile {
    fn with_source(path: Option<Utf8PathBuf>, text: Option<String>) -> Self {
        Self {
            path,
            text,
            parsed: None,
            mod_types: Vec::new(),
            default_mod_type: None,
            requested_variants: BTreeSet::new(),
            managed_resource_pattern: Regex::new(DEFAULT_MANAGED_RESOURCE_PATTERN)
                .expect("Invalid managed resource regex"),
            parser: SectionParser::new(),
            remover: IniRemover::new(),
            blend_graph: SectionGraph::new(remap_blend_name),
            non_blend_graph: SectionGraph::new(remap_fix_name),
            resource_graph: SectionGraph::new(remap_resource_name),
            remap_models: IndexMap::new(),
            to_fix: BTreeSet::new(),
        }
    }

    /// An in-memory file; [`write`](Self::write) is a no-op
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::with_source(None, Some(text.into()))
    }

    /// A file on disk, read lazily on first use
    pub fn from_path(path: impl Into<Utf8PathBuf>) -> Self {
        Self::with_source(Some(path.into()), None)
    }

    pub fn with_mod_types(mut self, mod_types: Vec<Arc<ModType>>) -> Self {
        self.mod_types = mod_types;
        self.parsed = None;
        self
    }

    /// Type assumed when no configured type's root pattern matches
    pub fn with_default_mod_type(mut self, mod_type: Option<Arc<ModType>>) -> Self {
        self.default_mod_type = mod_type;
        self.parsed = None;
        self
    }

    pub fn with_variants<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested_variants = variants.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_managed_resource_pattern(mut self, pattern: &str) -> Result<Self, RemapError> {
        self.managed_resource_pattern = Regex::new(pattern)?;
        Ok(self)
    }

    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    /// Folder that relative `filename` values are resolved against
    pub fn folder(&self) -> Utf8PathBuf {
        self.path
            .as_deref()
            .and_then(Utf8Path::parent)
            .filter(|parent| !parent.as_str().is_empty())
            .map_or_else(|| Utf8PathBuf::from("."), Utf8Path::to_path_buf)
    }

    /// Load the text from disk, discarding any parse state
    pub fn read(&mut self) -> Result<&str, RemapError> {
        if let Some(path) = &self.path {
            let text = std::fs::read_to_string(path).map_err(|source| RemapError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::debug!("Read {} ({} bytes)", path, text.len());
            self.text = Some(text);
            self.parsed = None;
        }

        Ok(self.text.as_deref().unwrap_or_default())
    }

    /// Write the current text back to disk, in full
    pub fn write(&self) -> Result<(), RemapError> {
        let (Some(path), Some(text)) = (&self.path, &self.text) else {
            return Ok(());
        };

        std::fs::write(path, text).map_err(|source| RemapError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("Wrote {}", path);
        Ok(())
    }

    /// Current text, or an empty string if nothing was loaded yet
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
        self.parsed = None;
    }

    /// Drop the loaded text and everything derived from it
    pub fn clear(&mut self) {
        if self.path.is_some() {
            self.text = None;
        }
        self.parsed = None;
        self.blend_graph = SectionGraph::new(remap_blend_name);
        self.non_blend_graph = SectionGraph::new(remap_fix_name);
        self.resource_graph = SectionGraph::new(remap_resource_name);
        self.remap_models.clear();
        self.to_fix.clear();
    }

    /// Load and scan the text unless that already happened since the last change
    pub fn ensure_parsed(&mut self) -> Result<(), RemapError> {
        if self.text.is_none() {
            self.read()?;
        }

        if self.parsed.is_none() {
            let parsed = self.parser.parse(
                self.text.as_deref().unwrap_or_default(),
                &self.mod_types,
                self.default_mod_type.as_ref(),
            );
            self.parsed = Some(parsed);
        }

        Ok(())
    }

    pub fn parsed(&self) -> Option<&ParsedIni> {
        self.parsed.as_ref()
    }

    pub fn check_is_mod(&mut self) -> Result<bool, RemapError> {
        self.ensure_parsed()?;
        Ok(self.parsed.as_ref().is_some_and(|parsed| parsed.is_mod_ini))
    }

    pub fn is_fixed(&mut self) -> Result<bool, RemapError> {
        self.ensure_parsed()?;
        Ok(self.parsed.as_ref().is_some_and(|parsed| parsed.is_fixed))
    }

    /// Type whose root pattern matched, if any
    pub fn mod_type(&self) -> Option<&Arc<ModType>> {
        self.parsed.as_ref().and_then(|parsed| parsed.mod_type.as_ref())
    }

    /// Detected type, falling back to the default type
    pub fn available_mod_type(&self) -> Option<Arc<ModType>> {
        self.mod_type().or(self.default_mod_type.as_ref()).cloned()
    }

    pub fn blend_graph(&self) -> &SectionGraph {
        &self.blend_graph
    }

    pub fn non_blend_graph(&self) -> &SectionGraph {
        &self.non_blend_graph
    }

    pub fn resource_graph(&self) -> &SectionGraph {
        &self.resource_graph
    }

    /// Buffer files of every resource section in the last built resource graph
    pub fn remap_models(&self) -> &IndexMap<String, RemapAssetModel> {
        &self.remap_models
    }

    /// Variants the last built graphs generate content for, in generation order
    pub fn to_fix(&self) -> &BTreeSet<String> {
        &self.to_fix
    }

    /// Build the blend, non-blend and resource graphs from the root section
    /// and resolve which variants to generate.
    ///
    /// Returns `false` if the file has no root section.
    pub fn build_graphs(&mut self) -> Result<bool, RemapError> {
        self.ensure_parsed()?;
        let lookup = self.available_mod_type();
        let folder = self.folder();

        let Some(parsed) = self.parsed.as_ref() else {
            return Ok(false);
        };
        let Some(root) = parsed.root.as_deref() else {
            return Ok(false);
        };

        self.blend_graph.build([root], &parsed.sections)?;

        let non_blend_roots: Vec<&str> = match &lookup {
            Some(mod_type) => parsed
                .sections
                .iter()
                .filter(|(name, _)| !self.blend_graph.contains(name))
                .filter(|(_, section)| {
                    let template = &section.template;
                    template.hashes().iter().any(|hash| mod_type.is_known(AssetKind::Hash, hash))
                        || template
                            .indices()
                            .iter()
                            .any(|index| mod_type.is_known(AssetKind::Index, index))
                })
                .map(|(name, _)| name.as_str())
                .collect(),
            None => Vec::new(),
        };
        self.non_blend_graph.build(non_blend_roots, &parsed.sections)?;

        let mut resources: Vec<String> = Vec::new();
        for (_, template) in self.blend_graph.run_sequence() {
            for resource in template.values_of(IniKey::Vb1) {
                if self.managed_resource_pattern.is_match(resource)
                    && !resources.iter().any(|known| known == resource)
                {
                    resources.push(resource.to_string());
                }
            }
        }
        sort_resources(&mut resources);
        self.resource_graph.build(&resources, &parsed.sections)?;

        self.to_fix = match &lookup {
            Some(mod_type) => self.resolve_variants(&**mod_type),
            None => BTreeSet::new(),
        };

        let variants = self.to_fix.iter().map(String::as_str);
        self.blend_graph.ensure_remap_names(variants.clone());
        self.non_blend_graph.ensure_remap_names(variants.clone());
        self.resource_graph.ensure_remap_names(variants.clone());

        self.remap_models = self
            .resource_graph
            .run_sequence()
            .map(|(name, template)| {
                let model = RemapAssetModel::from_template(
                    &folder,
                    template,
                    variants.clone(),
                    fixed_blend_file,
                );
                (name.to_string(), model)
            })
            .collect();

        tracing::info!(
            "Root [{}]: {} blend, {} non-blend, {} resource sections; variants {:?}",
            root,
            self.blend_graph.len(),
            self.non_blend_graph.len(),
            self.resource_graph.len(),
            self.to_fix
        );
        Ok(true)
    }

    /// Variants every graph supports, narrowed to the requested ones.
    ///
    /// Falls back to every variant of the type when nothing requested is
    /// supported.
    fn resolve_variants(&self, lookup: &dyn VersionAssetLookup) -> BTreeSet<String> {
        let common = [&self.blend_graph, &self.non_blend_graph, &self.resource_graph]
            .into_iter()
            .filter_map(|graph| graph.common_variants(lookup))
            .reduce(|common, variants| common.intersection(&variants).cloned().collect())
            .unwrap_or_else(|| lookup.variants());

        let to_fix: BTreeSet<String> = common
            .intersection(&self.requested_variants)
            .cloned()
            .collect();

        if to_fix.is_empty() {
            lookup.variants()
        } else {
            to_fix
        }
    }

    /// Generated block for the current text, boilerplate included
    ///
    /// # Errors
    ///
    /// Returns [`RemapError::NoModType`] if neither a detected nor a default
    /// mod type is available.
    pub fn fix_text(&mut self) -> Result<String, RemapError> {
        let Some(mod_type) = self.available_mod_type() else {
            return Err(RemapError::NoModType);
        };

        if !self.build_graphs()? {
            return Ok(String::new());
        }

        let fixer = RemapFixer::new(
            &self.blend_graph,
            &self.non_blend_graph,
            &self.resource_graph,
            &self.remap_models,
            Some(&*mod_type),
        );
        fixer.fix(
            self.to_fix.iter().map(String::as_str),
            Some(mod_type.display_name().as_str()),
        )
    }

    /// Append generated content for every resolved variant.
    ///
    /// The text only changes in memory; call [`write`](Self::write) to persist it.
    pub fn apply(&mut self) -> Result<ApplyOutcome, RemapError> {
        self.ensure_parsed()?;

        let Some(parsed) = self.parsed.as_ref() else {
            return Ok(ApplyOutcome::NoRoot);
        };
        if parsed.is_fixed {
            tracing::info!("Already fixed, skipping");
            return Ok(ApplyOutcome::AlreadyFixed);
        }
        if parsed.root.is_none() {
            tracing::info!("No root section found, skipping");
            return Ok(ApplyOutcome::NoRoot);
        }

        let newline = line_ending(self.text());
        let fix = self.fix_text()?;
        let fix = if newline == "\n" {
            fix
        } else {
            fix.replace('\n', newline)
        };
        let text = format!(
            "{}{newline}{newline}{newline}{fix}",
            self.text().trim_end()
        );
        let variants = self.to_fix.iter().cloned().collect();

        self.set_text(text);
        self.ensure_parsed()?;

        Ok(ApplyOutcome::Applied { variants })
    }

    /// Remove generated content and generated sections.
    ///
    /// The text only changes in memory, and only if something was removed;
    /// call [`write`](Self::write) to persist it.
    pub fn undo(&mut self) -> Result<UndoReport, RemapError> {
        self.ensure_parsed()?;

        let report = self.remover.remove(self.text(), &self.folder(), &self.parser)?;

        if !report.is_unchanged() {
            self.set_text(report.text.clone());
            self.ensure_parsed()?;
        }

        Ok(report)
    }
}

/// `"\r\n"` if the text's first line ends that way, `"\n"` otherwise
fn line_ending(text: &str) -> &'static str {
    match text.find('\n') {
        Some(pos) if text[..pos].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}
