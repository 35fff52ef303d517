use super::template::Template;
use indexmap::IndexMap;
use std::ops::Range;

/// A named block of an `.ini` file together with the lines it occupied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub template: Template,

    /// Half-open range of source line indices, header line included
    pub lines: Range<usize>,
}

/// Sections keyed by name, in the order they first appear in the file
pub type SectionMap = IndexMap<String, Section>;

/// Anything that can look up a section's template by name.
///
/// Lets the graph builder work over a parsed file or a bare template map.
pub trait TemplateSource {
    fn template(&self, name: &str) -> Option<&Template>;
}

impl TemplateSource for IndexMap<String, Template> {
    fn template(&self, name: &str) -> Option<&Template> {
        self.get(name)
    }
}

impl TemplateSource for IndexMap<String, Section> {
    fn template(&self, name: &str) -> Option<&Template> {
        self.get(name).map(|section| &section.template)
    }
}
