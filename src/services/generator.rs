//! Synthesis of remapped sections.
//!
//! [`fill_template`] rebuilds one section from its template, copying control
//! lines verbatim and handing every content part to a fill policy. The three
//! policies live on [`RemapFixer`], which also assembles the per-variant text
//! and the boilerplate that fences the whole generated block.

use super::errors::RemapError;
use super::graph::SectionGraph;
use super::names::fixed_blend_file;
use crate::models::{
    AssetError, AssetKind, ContentPart, Heading, IniKey, RemapAssetModel, Template, TemplateEntry,
    VersionAssetLookup,
};
use indexmap::IndexMap;

/// Title used in the file-level heading when no mod type was identified
pub const DEFAULT_HEADING_TYPE: &str = "GI";

/// Literal written for `handling` in generated blend overrides
pub const HANDLING_SKIP: &str = "skip";

/// Literal written for `type` in generated resources
pub const BUFFER_TYPE: &str = "Buffer";

/// Literal written for `stride` in generated resources
pub const BUFFER_STRIDE: &str = "32";

/// Where a content part sits while a section is being rebuilt
#[derive(Debug, Clone, Copy)]
pub struct FillContext<'a> {
    pub variant: &'a str,

    /// Name of the section being generated
    pub section_name: &'a str,

    /// Name of the section the template was parsed from
    pub original_name: &'a str,

    /// Entry index of the part inside its template
    pub part_index: usize,

    /// Prefix for every generated line of the part
    pub line_prefix: &'a str,
}

/// Rebuild `template` as a new section called `section_name`.
///
/// Control lines are written as they were. The indentation prefix handed to
/// `fill` is the leading whitespace of the last control line, plus one tab
/// unless that line closes a block.
pub fn fill_template<F>(
    variant: &str,
    section_name: &str,
    original_name: &str,
    template: &Template,
    mut fill: F,
) -> Result<String, RemapError>
where
    F: FnMut(&FillContext<'_>, &ContentPart) -> Result<String, RemapError>,
{
    let mut text = format!("[{section_name}]\n");
    let mut line_prefix = String::new();

    for (part_index, entry) in template.entries().iter().enumerate() {
        match entry {
            TemplateEntry::Control(line) => {
                text.push_str(line);
                text.push('\n');

                let body = line.trim_start_matches([' ', '\t']);
                line_prefix = line[..line.len() - body.len()].to_string();
                if !body.contains("endif") {
                    line_prefix.push('\t');
                }
            }
            TemplateEntry::Content(part) => {
                let ctx = FillContext {
                    variant,
                    section_name,
                    original_name,
                    part_index,
                    line_prefix: &line_prefix,
                };
                text.push_str(&fill(&ctx, part)?);
            }
        }
    }

    Ok(text)
}

/// Generated text of every section in `graph`, in run-sequence order
pub fn generate_sections<F>(
    graph: &SectionGraph,
    variant: &str,
    mut fill: F,
) -> Result<Vec<String>, RemapError>
where
    F: FnMut(&FillContext<'_>, &ContentPart) -> Result<String, RemapError>,
{
    graph
        .run_sequence()
        .map(|(name, template)| {
            let section_name = graph.remap_name(name, variant);
            fill_template(variant, &section_name, name, template, &mut fill)
        })
        .collect()
}

/// Generated text of `graph`, each section followed by a blank line
pub fn generate<F>(graph: &SectionGraph, variant: &str, fill: F) -> Result<String, RemapError>
where
    F: FnMut(&FillContext<'_>, &ContentPart) -> Result<String, RemapError>,
{
    Ok(generate_sections(graph, variant, fill)?
        .into_iter()
        .map(|section| section + "\n")
        .collect())
}

/// Heading fencing the whole generated block
pub fn fix_heading(type_name: Option<&str>) -> Heading {
    Heading::new(
        format!("{} Remap", type_name.unwrap_or(DEFAULT_HEADING_TYPE)),
        15,
        '-',
    )
}

/// Comment lines placed right under the opening heading
pub fn fix_credit(type_name: Option<&str>) -> String {
    let (type_name, short_name) = match type_name {
        Some(name) if !name.is_empty() => (format!("{name} "), format!("{name} ")),
        Some(_) => (String::new(), String::new()),
        None => ("Mod ".to_string(), String::new()),
    };

    format!(
        "\n; {type_name}remapped by {}. \
         When sharing remapped {short_name}mods, credit the original mod author",
        crate::APP_NAME
    )
}

fn render(prefix: &str, key: IniKey, value: &str) -> String {
    format!("{prefix}{} = {value}\n", key.as_str())
}

/// Keys kept by the blend override policy; anything else is dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlendField<'a> {
    Run(&'a str),
    Hash(&'a str),
    Vb1(&'a str),
    Handling,
    Draw(&'a str),
    MatchFirstIndex(&'a str),
}

impl<'a> BlendField<'a> {
    fn classify(key: &str, value: &'a str) -> Option<Self> {
        match IniKey::parse(key)? {
            IniKey::Run => Some(Self::Run(value)),
            IniKey::Hash => Some(Self::Hash(value)),
            IniKey::Vb1 => Some(Self::Vb1(value)),
            IniKey::Handling => Some(Self::Handling),
            IniKey::Draw => Some(Self::Draw(value)),
            IniKey::MatchFirstIndex => Some(Self::MatchFirstIndex(value)),
            _ => None,
        }
    }
}

/// Keys rewritten by the non-blend policy; the rest pass through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NonBlendField<'a> {
    Run(&'a str),
    Hash(&'a str),
    MatchFirstIndex(&'a str),
    PassThrough { key: &'a str, value: &'a str },
}

impl<'a> NonBlendField<'a> {
    fn classify(key: &'a str, value: &'a str) -> Self {
        match IniKey::parse(key) {
            Some(IniKey::Run) => Self::Run(value),
            Some(IniKey::Hash) => Self::Hash(value),
            Some(IniKey::MatchFirstIndex) => Self::MatchFirstIndex(value),
            _ => Self::PassThrough { key, value },
        }
    }
}

/// Keys kept by the resource policy; anything else is dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceField<'a> {
    Run(&'a str),
    Type,
    Stride,
    Filename(&'a str),
}

impl<'a> ResourceField<'a> {
    fn classify(key: &str, value: &'a str) -> Option<Self> {
        match IniKey::parse(key)? {
            IniKey::Run => Some(Self::Run(value)),
            IniKey::Type => Some(Self::Type),
            IniKey::Stride => Some(Self::Stride),
            IniKey::Filename => Some(Self::Filename(value)),
            _ => None,
        }
    }
}

/// Generates the remapped sections of one file from its three graphs.
pub struct RemapFixer<'a> {
    blend: &'a SectionGraph,
    non_blend: &'a SectionGraph,
    resources: &'a SectionGraph,
    models: &'a IndexMap<String, RemapAssetModel>,
    lookup: Option<&'a dyn VersionAssetLookup>,
}

impl<'a> RemapFixer<'a> {
    pub fn new(
        blend: &'a SectionGraph,
        non_blend: &'a SectionGraph,
        resources: &'a SectionGraph,
        models: &'a IndexMap<String, RemapAssetModel>,
        lookup: Option<&'a dyn VersionAssetLookup>,
    ) -> Self {
        Self {
            blend,
            non_blend,
            resources,
            models,
            lookup,
        }
    }

    /// Translate an asset id for `variant`.
    ///
    /// Ids the lookup does not know, or cannot map to `variant`, are kept.
    ///
    /// # Errors
    ///
    /// Returns [`RemapError::NoModType`] if there is no lookup to ask.
    fn replace_asset(
        &self,
        kind: AssetKind,
        id: &str,
        variant: &str,
    ) -> Result<String, RemapError> {
        let lookup = self.lookup.ok_or(RemapError::NoModType)?;

        match lookup.resolve(kind, id, variant) {
            Ok(new_id) => Ok(new_id),
            Err(err @ AssetError::UnknownAsset(_)) => {
                tracing::debug!("{}, keeping it", err);
                Ok(id.to_string())
            }
            Err(err @ AssetError::NoMapping { .. }) => {
                tracing::warn!("{}, keeping it", err);
                Ok(id.to_string())
            }
        }
    }

    fn vb1_name(&self, resource: &str, variant: &str) -> String {
        if self.resources.contains(resource) {
            self.resources.remap_name(resource, variant)
        } else {
            resource.to_string()
        }
    }

    pub fn fill_blend(
        &self,
        ctx: &FillContext<'_>,
        part: &ContentPart,
    ) -> Result<String, RemapError> {
        let mut text = String::new();
        let prefix = ctx.line_prefix;

        for (key, value) in part.iter() {
            let line = match BlendField::classify(key, value) {
                Some(BlendField::Run(target)) => {
                    render(prefix, IniKey::Run, &self.blend.remap_name(target, ctx.variant))
                }
                Some(BlendField::Hash(hash)) => render(
                    prefix,
                    IniKey::Hash,
                    &self.replace_asset(AssetKind::Hash, hash, ctx.variant)?,
                ),
                Some(BlendField::Vb1(resource)) => {
                    render(prefix, IniKey::Vb1, &self.vb1_name(resource, ctx.variant))
                }
                Some(BlendField::Handling) => render(prefix, IniKey::Handling, HANDLING_SKIP),
                Some(BlendField::Draw(draw)) => render(prefix, IniKey::Draw, draw),
                Some(BlendField::MatchFirstIndex(index)) => render(
                    prefix,
                    IniKey::MatchFirstIndex,
                    &self.replace_asset(AssetKind::Index, index, ctx.variant)?,
                ),
                None => continue,
            };
            text.push_str(&line);
        }

        Ok(text)
    }

    pub fn fill_non_blend(
        &self,
        ctx: &FillContext<'_>,
        part: &ContentPart,
    ) -> Result<String, RemapError> {
        let mut text = String::new();
        let prefix = ctx.line_prefix;

        for (key, value) in part.iter() {
            let line = match NonBlendField::classify(key, value) {
                NonBlendField::Run(target) => {
                    render(prefix, IniKey::Run, &self.non_blend.remap_name(target, ctx.variant))
                }
                NonBlendField::Hash(hash) => render(
                    prefix,
                    IniKey::Hash,
                    &self.replace_asset(AssetKind::Hash, hash, ctx.variant)?,
                ),
                NonBlendField::MatchFirstIndex(index) => render(
                    prefix,
                    IniKey::MatchFirstIndex,
                    &self.replace_asset(AssetKind::Index, index, ctx.variant)?,
                ),
                NonBlendField::PassThrough { key, value } => format!("{prefix}{key} = {value}\n"),
            };
            text.push_str(&line);
        }

        Ok(text)
    }

    pub fn fill_resource(
        &self,
        ctx: &FillContext<'_>,
        part: &ContentPart,
    ) -> Result<String, RemapError> {
        let mut text = String::new();
        let prefix = ctx.line_prefix;

        for (key, value) in part.iter() {
            let line = match ResourceField::classify(key, value) {
                Some(ResourceField::Run(target)) => {
                    render(prefix, IniKey::Run, &self.resources.remap_name(target, ctx.variant))
                }
                Some(ResourceField::Type) => render(prefix, IniKey::Type, BUFFER_TYPE),
                Some(ResourceField::Stride) => render(prefix, IniKey::Stride, BUFFER_STRIDE),
                Some(ResourceField::Filename(filename)) => {
                    let fixed = self
                        .models
                        .get(ctx.original_name)
                        .and_then(|model| model.fixed_path(ctx.part_index, ctx.variant))
                        .map(String::from)
                        .unwrap_or_else(|| fixed_blend_file(filename, ctx.variant));
                    render(prefix, IniKey::Filename, &fixed)
                }
                None => continue,
            };
            text.push_str(&line);
        }

        Ok(text)
    }

    /// Every generated section for one variant
    pub fn fix_variant(&self, variant: &str) -> Result<String, RemapError> {
        let has_non_blend = !self.non_blend.is_empty();
        let has_resources = !self.resources.is_empty();

        let mut fix = String::new();
        if !self.blend.is_empty() || has_non_blend || has_resources {
            fix.push('\n');
        }

        fix.push_str(&generate(self.blend, variant, |ctx, part| self.fill_blend(ctx, part))?);

        if has_non_blend {
            fix.push('\n');
            fix.push_str(&generate(self.non_blend, variant, |ctx, part| {
                self.fill_non_blend(ctx, part)
            })?);
        }

        if has_resources {
            fix.push('\n');
            let sections = generate_sections(self.resources, variant, |ctx, part| {
                self.fill_resource(ctx, part)
            })?;
            fix.push_str(&sections.join("\n"));
        }

        Ok(fix)
    }

    /// The full generated block for `variants`, fenced by the boilerplate
    /// headings so it can be found again on undo
    pub fn fix<'v, I>(&self, variants: I, type_name: Option<&str>) -> Result<String, RemapError>
    where
        I: IntoIterator<Item = &'v str>,
    {
        let heading = fix_heading(type_name);
        let mut fix = format!("; {}", heading.open());
        fix.push_str(&fix_credit(type_name));

        let mut variant_heading = Heading::new("", 5, '*');
        let mut generated = 0;
        for variant in variants {
            let current = self.fix_variant(variant)?;
            if current.is_empty() {
                continue;
            }

            variant_heading.title = variant.to_string();
            fix.push_str(&format!("\n\n; {}{current}", variant_heading.open()));
            generated += 1;
        }

        fix.push_str(&format!("\n\n; {}", heading.close()));

        tracing::debug!(
            "Generated {} variants ({} blend, {} non-blend, {} resource sections each)",
            generated,
            self.blend.len(),
            self.non_blend.len(),
            self.resources.len()
        );
        Ok(fix)
    }
}
