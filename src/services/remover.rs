//! Removal of generated content.
//!
//! Undo runs in two passes over the text: first every boilerplate-fenced
//! block is cut out, then any leftover section carrying a generated name is
//! dropped line by line, together with any boilerplate comment left without
//! its closing rule. Both passes record the generated resource sections they
//! remove so the buffer files behind them can be cleaned up.
//!
//! Text from which nothing was removed is returned exactly as given.

use super::errors::RemapError;
use super::graph::SectionGraph;
use super::names::{remap_blend_name, REMAP_BLEND, REMAP_FIX};
use super::parser::SectionParser;
use crate::models::{Heading, IniKey, RemapAssetModel, SectionMap};
use camino::Utf8Path;
use indexmap::{IndexMap, IndexSet};
use regex::Regex;

/// Variant key used for the models of removed resources
pub const REMOVED_VARIANT: &str = "";

/// What an undo pass took out of a file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoReport {
    pub text: String,

    /// Number of boilerplate-fenced blocks removed
    pub removed_blocks: usize,

    /// Sections removed because of their generated name
    pub removed_sections: Vec<String>,

    /// Boilerplate comment lines removed outside a complete block
    pub removed_comments: usize,

    /// Generated resource sections that were removed, keyed by name.
    ///
    /// The `filename` values are the buffer files generated for them.
    pub removed_resources: IndexMap<String, RemapAssetModel>,
}

impl UndoReport {
    /// Whether neither pass found anything to remove
    pub fn is_unchanged(&self) -> bool {
        self.removed_blocks == 0 && self.removed_sections.is_empty() && self.removed_comments == 0
    }

    /// Every generated buffer file referenced by the removed resources
    pub fn removed_files(&self) -> Vec<camino::Utf8PathBuf> {
        self.removed_resources
            .values()
            .flat_map(|model| model.original_full_paths().into_values())
            .collect()
    }
}

/// Strips generated content from `.ini` text.
///
/// Regex patterns are compiled once at construction:
///
/// - `block_pattern`: a boilerplate header through its closing rule, for both
///   the current `... Remap` title and the older `... Boss Fix` title
/// - `section_pattern`: a section header carrying a generated name
/// - `resource_pattern`: a resource name carrying a generated name
/// - `comment_pattern`: a single boilerplate line (heading, credit, variant
///   heading or closing rule), for blocks that lost their closing rule
pub struct IniRemover {
    block_pattern: Regex,
    section_pattern: Regex,
    resource_pattern: Regex,
    comment_pattern: Regex,
}

impl IniRemover {
    pub fn new() -> Self {
        let old_heading = Heading::new(".*Boss Fix", 15, '-');
        let default_heading = Heading::new(".*Remap", 15, '-');

        Self {
            block_pattern: Regex::new(&format!(
                r"(; {}[\s\S]*?; {}-*)|(; {}[\s\S]*?; {}-*)",
                old_heading.open(),
                shortened_rule(&old_heading),
                default_heading.open(),
                shortened_rule(&default_heading),
            ))
            .expect("Invalid fix block regex"),
            section_pattern: Regex::new(&format!(r"^\s*\[.*({REMAP_BLEND}|{REMAP_FIX}).*\]"))
                .expect("Invalid generated section regex"),
            resource_pattern: Regex::new(&format!(r".*({REMAP_BLEND}|{REMAP_FIX}).*"))
                .expect("Invalid generated resource regex"),
            comment_pattern: Regex::new(&format!(
                concat!(
                    r"^\s*; (-{{15}} .*(Remap|Boss Fix) -{{15}}",
                    r"|\*{{5}} .* \*{{5}}",
                    r"|.*remapped by {}\b.*",
                    r"|-{{32,}})\s*$",
                ),
                regex::escape(crate::APP_NAME)
            ))
            .expect("Invalid boilerplate comment regex"),
        }
    }

    /// Remove every generated block and generated section from `text`.
    ///
    /// # Errors
    ///
    /// Returns [`RemapError::SectionNotFound`] if a removed section runs a
    /// section the file does not declare.
    pub fn remove(
        &self,
        text: &str,
        folder: &Utf8Path,
        parser: &SectionParser,
    ) -> Result<UndoReport, RemapError> {
        let mut report = UndoReport::default();

        let kept = self.remove_blocks(text, folder, parser, &mut report)?;
        let kept = self.remove_sections(&kept, folder, parser, &mut report)?;

        if report.is_unchanged() {
            report.text = text.to_string();
            return Ok(report);
        }
        report.text = kept.trim_end().to_string();

        tracing::info!(
            "Removed {} generated blocks, {} generated sections, {} boilerplate lines and {} \
             generated resources",
            report.removed_blocks,
            report.removed_sections.len(),
            report.removed_comments,
            report.removed_resources.len()
        );
        Ok(report)
    }

    fn remove_blocks(
        &self,
        text: &str,
        folder: &Utf8Path,
        parser: &SectionParser,
        report: &mut UndoReport,
    ) -> Result<String, RemapError> {
        let mut names = IndexSet::new();
        let mut kept = String::with_capacity(text.len());
        let mut last = 0;

        for block in self.block_pattern.find_iter(text) {
            names.extend(
                block
                    .as_str()
                    .lines()
                    .filter(|line| parser.is_section_header(line))
                    .map(SectionParser::section_name),
            );
            kept.push_str(&text[last..block.start()]);
            last = block.end();
            report.removed_blocks += 1;
        }
        kept.push_str(&text[last..]);

        if report.removed_blocks > 0 {
            let parsed = parser.parse(text, &[], None);
            self.record_resources(&names, &parsed.sections, folder, report)?;
        }

        Ok(kept)
    }

    fn remove_sections(
        &self,
        text: &str,
        folder: &Utf8Path,
        parser: &SectionParser,
        report: &mut UndoReport,
    ) -> Result<String, RemapError> {
        let mut names = IndexSet::new();
        let mut kept = String::with_capacity(text.len());
        let mut removing = false;

        for line in text.split_inclusive('\n') {
            if parser.is_section_header(line) {
                removing = self.section_pattern.is_match(line);
                if removing {
                    names.insert(SectionParser::section_name(line));
                }
            }

            if removing {
                continue;
            }
            if self.comment_pattern.is_match(line) {
                report.removed_comments += 1;
                continue;
            }
            kept.push_str(line);
        }

        if !names.is_empty() {
            let parsed = parser.parse(text, &[], None);
            self.record_resources(&names, &parsed.sections, folder, report)?;
            report.removed_sections.extend(names);
        }

        Ok(kept)
    }

    /// Record the generated resources referenced by the sections in `names`
    fn record_resources(
        &self,
        names: &IndexSet<String>,
        sections: &SectionMap,
        folder: &Utf8Path,
        report: &mut UndoReport,
    ) -> Result<(), RemapError> {
        let mut graph = SectionGraph::new(remap_blend_name);
        graph.build(names.iter().filter(|name| sections.contains_key(*name)), sections)?;

        let resources: IndexSet<&str> = graph
            .sections()
            .values()
            .flat_map(|template| template.values_of(IniKey::Vb1))
            .filter(|resource| self.resource_pattern.is_match(resource))
            .collect();

        for resource in resources {
            let Some(section) = sections.get(resource) else {
                tracing::debug!("Generated resource [{}] has no section", resource);
                continue;
            };

            let model = RemapAssetModel::from_template(
                folder,
                &section.template,
                [REMOVED_VARIANT],
                |filename, _| filename.to_string(),
            );
            report.removed_resources.insert(resource.to_string(), model);
        }

        Ok(())
    }
}

impl Default for IniRemover {
    fn default() -> Self {
        Self::new()
    }
}

/// Closing rule of `heading` minus its last two characters, so rules of
/// longer titles still match once followed by `-*`
fn shortened_rule(heading: &Heading) -> String {
    let rule = heading.close();
    rule[..rule.len().saturating_sub(2)].to_string()
}
