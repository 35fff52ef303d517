//! Line-oriented section parser.
//!
//! The mod loader's `.ini` dialect allows nested `if`/`else` blocks, which no
//! conventional `.ini` parser accepts. Instead of a real grammar, each section
//! body is split at control lines: control lines are kept verbatim and the data
//! lines between them go through the plain key/value parser.

use super::keyvalue::parse_key_values;
use super::names::{BLEND, REMAP_BLEND};
use crate::models::{ConfigLine, ModType, Section, SectionMap, Template, TemplateEntry};
use regex::Regex;
use std::sync::Arc;

/// Everything learned from one scan over a file
#[derive(Debug, Clone, Default)]
pub struct ParsedIni {
    pub sections: SectionMap,

    /// Name of the root section, if one was recognized
    pub root: Option<String>,

    /// Mod type whose root pattern matched
    pub mod_type: Option<Arc<ModType>>,

    /// Whether the file belongs to a moddable configuration
    pub is_mod_ini: bool,

    /// Whether the file already holds content generated by this tool
    pub is_fixed: bool,
}

impl ParsedIni {
    pub fn root_template(&self) -> Option<&Template> {
        self.root
            .as_ref()
            .and_then(|root| self.sections.get(root))
            .map(|section| &section.template)
    }
}

/// Splits `.ini` text into named sections and builds their templates.
///
/// Regex patterns are compiled once at construction:
///
/// - `section_pattern`: any section header line, `[...]`
/// - `blend_pattern`: a `TextureOverride...Blend` header, the generic root
/// - `fixed_blend_pattern`: a `TextureOverride...RemapBlend` header left by a previous run
/// - `fix_header_pattern`: the opening line of a generated block
pub struct SectionParser {
    section_pattern: Regex,
    blend_pattern: Regex,
    fixed_blend_pattern: Regex,
    fix_header_pattern: Regex,
}

impl SectionParser {
    pub fn new() -> Self {
        Self {
            section_pattern: Regex::new(r"^\s*\[.*\]").expect("Invalid section regex"),
            blend_pattern: Regex::new(&format!(r"^\s*\[\s*TextureOverride.*{BLEND}.*\s*\]"))
                .expect("Invalid blend regex"),
            fixed_blend_pattern: Regex::new(&format!(
                r"^\s*\[\s*TextureOverride.*{REMAP_BLEND}.*\s*\]"
            ))
            .expect("Invalid fixed blend regex"),
            fix_header_pattern: Regex::new(r"^\s*; -{15} .*(Remap|Boss Fix) -{15}")
                .expect("Invalid fix header regex"),
        }
    }

    pub fn is_section_header(&self, line: &str) -> bool {
        self.section_pattern.is_match(line)
    }

    /// Text between the first `[` and the last `]`, trimmed
    pub fn section_name(line: &str) -> String {
        let left = line.find('[');
        let right = line.rfind(']');

        let name = match (left, right) {
            (Some(l), Some(r)) if l < r => &line[l + 1..r],
            (_, Some(r)) => &line[..r],
            (Some(l), None) => &line[l + 1..],
            (None, None) => line,
        };
        name.trim().to_string()
    }

    /// Scan `text` once, building every section's template and detecting the
    /// root section, the mod type and whether the file was already fixed.
    ///
    /// Duplicate section names keep only their first occurrence.
    pub fn parse(
        &self,
        text: &str,
        mod_types: &[Arc<ModType>],
        default_type: Option<&Arc<ModType>>,
    ) -> ParsedIni {
        let lines: Vec<&str> = text.split_inclusive('\n').collect();

        let mut result = ParsedIni::default();
        let mut generic_blend_root: Option<String> = None;
        let mut open: Option<(String, usize)> = None;

        for (index, line) in lines.iter().enumerate() {
            if !result.is_fixed
                && (self.fixed_blend_pattern.is_match(line)
                    || self.fix_header_pattern.is_match(line))
            {
                result.is_fixed = true;
            }

            if !self.is_section_header(line) {
                continue;
            }

            let name = Self::section_name(line);
            self.check_root(
                line,
                &name,
                mod_types,
                default_type,
                &mut generic_blend_root,
                &mut result,
            );

            if let Some((open_name, start)) = open.take() {
                self.close_section(open_name, start..index, &lines, &mut result.sections);
            }
            open = Some((name, index));
        }

        if let Some((open_name, start)) = open.take() {
            self.close_section(open_name, start..lines.len(), &lines, &mut result.sections);
        }

        if result.root.is_none() && default_type.is_some() {
            result.root = generic_blend_root;
        }

        tracing::debug!(
            "Parsed {} sections (root: {:?}, mod type: {:?}, fixed: {})",
            result.sections.len(),
            result.root,
            result.mod_type.as_ref().map(|t| t.name()),
            result.is_fixed
        );

        result
    }

    fn check_root(
        &self,
        line: &str,
        name: &str,
        mod_types: &[Arc<ModType>],
        default_type: Option<&Arc<ModType>>,
        generic_blend_root: &mut Option<String>,
        result: &mut ParsedIni,
    ) {
        let is_blend = self.blend_pattern.is_match(line);

        if default_type.is_some() && generic_blend_root.is_none() && is_blend {
            *generic_blend_root = Some(name.to_string());
            result.is_mod_ini = true;
        }

        if result.root.is_some() {
            return;
        }

        if mod_types.is_empty() {
            if is_blend {
                result.root = Some(name.to_string());
                result.is_mod_ini = true;
            }
            return;
        }

        if let Some(mod_type) = mod_types.iter().find(|mod_type| mod_type.is_type(line)) {
            result.root = Some(name.to_string());
            result.mod_type = Some(Arc::clone(mod_type));
            result.is_mod_ini = true;
        }
    }

    fn close_section(
        &self,
        name: String,
        range: std::ops::Range<usize>,
        lines: &[&str],
        sections: &mut SectionMap,
    ) {
        if sections.contains_key(&name) {
            tracing::debug!("Ignoring duplicate section [{}]", name);
            return;
        }

        let body = lines[range.start + 1..range.end].iter().copied();
        let template = build_template(&name, body);
        sections.insert(
            name.clone(),
            Section {
                name,
                template,
                lines: range,
            },
        );
    }
}

impl Default for SectionParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a section template from its body lines (header excluded)
pub fn build_template<'a, I>(name: &str, body: I) -> Template
where
    I: IntoIterator<Item = &'a str>,
{
    let mut entries = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    for line in body {
        match ConfigLine::classify(line) {
            ConfigLine::Control(control) => {
                flush_pending(name, &mut pending, &mut entries);
                entries.push(TemplateEntry::Control(control.to_string()));
            }
            ConfigLine::Data(data) => pending.push(data),
        }
    }

    flush_pending(name, &mut pending, &mut entries);
    if entries.is_empty() {
        entries.push(TemplateEntry::Content(Default::default()));
    }

    Template::new(name, entries)
}

fn flush_pending(name: &str, pending: &mut Vec<&str>, entries: &mut Vec<TemplateEntry>) {
    if pending.is_empty() {
        return;
    }

    let part = parse_key_values(pending.drain(..)).unwrap_or_else(|e| {
        tracing::debug!("Treating malformed block in [{}] as empty: {}", name, e);
        Default::default()
    });
    entries.push(TemplateEntry::Content(part));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IniKey;

    fn parse(text: &str) -> ParsedIni {
        SectionParser::new().parse(text, &[], None)
    }

    #[test]
    fn test_section_name() {
        assert_eq!(
            SectionParser::section_name("  [ TextureOverrideBlend ]\n"),
            "TextureOverrideBlend"
        );
        assert_eq!(SectionParser::section_name("[A[B]]"), "A[B]");
    }

    #[test]
    fn test_section_without_control_lines_has_one_part() {
        let parsed = parse("[TextureOverrideBlend]\nhash = 111\nvb1 = ResourceA\n");
        let template = &parsed.sections["TextureOverrideBlend"].template;

        assert_eq!(template.entries().len(), 1);
        let (_, part) = template.parts().next().unwrap();
        assert_eq!(part.get("hash"), Some("111"));
        assert_eq!(part.get("vb1"), Some("ResourceA"));
    }

    #[test]
    fn test_conditionals_split_parts() {
        let text = "[TextureOverrideBlend]\nhash=111\n\
                    if x==1\n\tvb1=ResourceA\nelse\n\tvb1=ResourceB\nendif\n";
        let parsed = parse(text);
        let entries = parsed.sections["TextureOverrideBlend"].template.entries();

        assert_eq!(entries.len(), 6);
        assert_eq!(entries[1], TemplateEntry::Control("if x==1".to_string()));
        assert_eq!(entries[3], TemplateEntry::Control("else".to_string()));
        assert_eq!(entries[5], TemplateEntry::Control("endif".to_string()));
        assert_eq!(entries[2].as_content().unwrap().get("vb1"), Some("ResourceA"));
        assert_eq!(entries[4].as_content().unwrap().get("vb1"), Some("ResourceB"));
    }

    #[test]
    fn test_malformed_block_becomes_empty_part() {
        let text = "[CommandList]\nif $x\nnot a key value line\nendif\nrun = Other\n";
        let parsed = parse(text);
        let template = &parsed.sections["CommandList"].template;

        assert_eq!(template.entries()[1], TemplateEntry::Content(Default::default()));
        assert_eq!(template.values_of(IniKey::Run).collect::<Vec<_>>(), vec!["Other"]);
    }

    #[test]
    fn test_duplicate_sections_keep_first() {
        let parsed = parse("[A]\nhash = 1\n[B]\n[A]\nhash = 2\n");
        assert_eq!(parsed.sections.len(), 2);
        assert!(parsed.sections["A"].template.hashes().contains("1"));
        assert_eq!(parsed.sections["A"].lines, 0..2);
        assert_eq!(parsed.sections["B"].lines, 2..3);
    }

    #[test]
    fn test_lines_before_first_section_are_ignored() {
        let parsed = parse("; header comment\nglobal = 1\n[A]\nx = 1\n");
        assert_eq!(parsed.sections.len(), 1);
        assert_eq!(parsed.sections["A"].lines, 2..4);
    }

    #[test]
    fn test_generic_root_detection() {
        let parsed = parse(
            "[Constants]\n[TextureOverrideRaidenBlend]\nhash = 1\n[TextureOverrideOtherBlend]\n",
        );
        assert!(parsed.is_mod_ini);
        assert!(!parsed.is_fixed);
        assert_eq!(parsed.root.as_deref(), Some("TextureOverrideRaidenBlend"));
    }

    #[test]
    fn test_mod_type_root_detection() {
        let raiden = Arc::new(ModType::new(
            "Raiden",
            Regex::new(r"^\s*\[\s*TextureOverride.*Raiden.*Blend.*\s*\]").unwrap(),
        ));
        let text = "[TextureOverrideKeqingBlend]\n[TextureOverrideRaidenBlend]\n";

        let parsed = SectionParser::new().parse(text, &[Arc::clone(&raiden)], None);
        assert_eq!(parsed.root.as_deref(), Some("TextureOverrideRaidenBlend"));
        assert_eq!(parsed.mod_type.as_ref().map(|t| t.name()), Some("Raiden"));
    }

    #[test]
    fn test_default_type_adopts_generic_root() {
        let raiden = Arc::new(ModType::new("Raiden", Regex::new(r"^\[Nothing\]").unwrap()));
        let text = "[TextureOverrideKeqingBlend]\nhash = 1\n";

        let parsed = SectionParser::new().parse(text, &[Arc::clone(&raiden)], Some(&raiden));
        assert!(parsed.is_mod_ini);
        assert!(parsed.mod_type.is_none());
        assert_eq!(parsed.root.as_deref(), Some("TextureOverrideKeqingBlend"));
    }

    #[test]
    fn test_fixed_detection() {
        let parsed = parse("[TextureOverrideBlend]\n[TextureOverrideXRemapBlend]\n");
        assert!(parsed.is_fixed);

        let parsed =
            parse("[TextureOverrideBlend]\n\n; --------------- GI Remap ---------------\n");
        assert!(parsed.is_fixed);
    }

    #[test]
    fn test_crlf_lines() {
        let parsed = parse("[A]\r\nif $x\r\nhash = 1\r\nendif\r\n");
        let entries = parsed.sections["A"].template.entries();
        assert_eq!(entries[0], TemplateEntry::Control("if $x".to_string()));
        assert_eq!(entries[1].as_content().unwrap().get("hash"), Some("1"));
    }
}
