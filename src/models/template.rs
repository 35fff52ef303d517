use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use std::sync::LazyLock;

/// Matches the conditional keywords the mod loader understands at the start of a line.
///
/// `endif` is listed first so it wins over the `if` prefix it contains.
static CONTROL_LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(endif|elif|else|if)\b").expect("Invalid control line regex")
});

/// Keys the rewrite engine gives special meaning to.
///
/// Keys are matched case-insensitively, the same way the mod loader reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IniKey {
    Run,
    Hash,
    Vb1,
    Handling,
    Draw,
    MatchFirstIndex,
    Type,
    Stride,
    Filename,
}

impl IniKey {
    /// Classify a raw key, returning `None` for keys without special meaning
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        [
            Self::Run,
            Self::Hash,
            Self::Vb1,
            Self::Handling,
            Self::Draw,
            Self::MatchFirstIndex,
            Self::Type,
            Self::Stride,
            Self::Filename,
        ]
        .into_iter()
        .find(|candidate| candidate.as_str().eq_ignore_ascii_case(key))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Hash => "hash",
            Self::Vb1 => "vb1",
            Self::Handling => "handling",
            Self::Draw => "draw",
            Self::MatchFirstIndex => "match_first_index",
            Self::Type => "type",
            Self::Stride => "stride",
            Self::Filename => "filename",
        }
    }
}

/// A single physical line of a section body, classified once when scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLine<'a> {
    /// An `if`/`elif`/`else`/`endif` line, passed through verbatim
    Control(&'a str),

    /// Candidate `key = value` content
    Data(&'a str),
}

impl<'a> ConfigLine<'a> {
    pub fn classify(line: &'a str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        if CONTROL_LINE_PATTERN.is_match(line) {
            Self::Control(line)
        } else {
            Self::Data(line)
        }
    }

    pub fn is_control(&self) -> bool {
        matches!(self, Self::Control(_))
    }
}

/// Ordered `key = value` pairs found between two control lines.
///
/// The first occurrence of a key wins; later duplicates are ignored, which is
/// how the mod loader itself resolves repeated keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentPart {
    entries: IndexMap<String, String>,
}

impl ContentPart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair unless the key is already present.
    ///
    /// Returns `true` if the pair was stored.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, value.into());
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn get_key(&self, key: IniKey) -> Option<&str> {
        self.get(key.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ContentPart {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut part = ContentPart::new();
        for (key, value) in iter {
            part.insert(key, value);
        }
        part
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateEntry {
    Control(String),
    Content(ContentPart),
}

impl TemplateEntry {
    pub fn as_content(&self) -> Option<&ContentPart> {
        match self {
            Self::Content(part) => Some(part),
            Self::Control(_) => None,
        }
    }
}

/// The parsed, conditional-aware body of one section.
///
/// Entries keep exact source order. The `run`, `hash` and `match_first_index`
/// attribute sets are derived from the entries and rebuilt whenever the entries
/// change; they are never edited directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    entries: Vec<TemplateEntry>,
    subcommands: IndexMap<usize, String>,
    hashes: IndexSet<String>,
    indices: IndexSet<String>,
}

impl Template {
    pub fn new(name: impl Into<String>, entries: Vec<TemplateEntry>) -> Self {
        let mut template = Self {
            name: name.into(),
            entries,
            subcommands: IndexMap::new(),
            hashes: IndexSet::new(),
            indices: IndexSet::new(),
        };
        template.derive_attributes();
        template
    }

    fn derive_attributes(&mut self) {
        self.subcommands.clear();
        self.hashes.clear();
        self.indices.clear();

        for (index, entry) in self.entries.iter().enumerate() {
            let TemplateEntry::Content(part) = entry else {
                continue;
            };
            if let Some(run) = part.get_key(IniKey::Run) {
                self.subcommands.insert(index, run.to_string());
            }
            if let Some(hash) = part.get_key(IniKey::Hash) {
                self.hashes.insert(hash.to_string());
            }
            if let Some(first_index) = part.get_key(IniKey::MatchFirstIndex) {
                self.indices.insert(first_index.to_string());
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[TemplateEntry] {
        &self.entries
    }

    /// Append an entry and refresh the derived attribute sets
    pub fn push(&mut self, entry: TemplateEntry) {
        self.entries.push(entry);
        self.derive_attributes();
    }

    /// Replace every entry and refresh the derived attribute sets
    pub fn set_entries(&mut self, entries: Vec<TemplateEntry>) {
        self.entries = entries;
        self.derive_attributes();
    }

    /// `run` targets keyed by the index of the entry that holds them
    pub fn subcommands(&self) -> &IndexMap<usize, String> {
        &self.subcommands
    }

    pub fn hashes(&self) -> &IndexSet<String> {
        &self.hashes
    }

    pub fn indices(&self) -> &IndexSet<String> {
        &self.indices
    }

    /// Content parts with their entry index
    pub fn parts(&self) -> impl Iterator<Item = (usize, &ContentPart)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.as_content().map(|part| (index, part)))
    }

    /// Every value of `key` across the content parts, in source order
    pub fn values_of(&self, key: IniKey) -> impl Iterator<Item = &str> {
        self.parts().filter_map(move |(_, part)| part.get_key(key))
    }

    pub fn has_control_lines(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| matches!(entry, TemplateEntry::Control(_)))
    }
}
