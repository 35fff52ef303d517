use super::template::{IniKey, Template};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

/// Buffer files referenced by one resource section, before and after remapping.
///
/// Paths are kept exactly as written in the `.ini` (relative, with the
/// original separator style); [`original_full_paths`](Self::original_full_paths)
/// and [`fixed_full_paths`](Self::fixed_full_paths) resolve them against the
/// folder holding the `.ini`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapAssetModel {
    pub folder: Utf8PathBuf,

    /// `filename` value keyed by the index of the entry holding it
    pub original_paths: IndexMap<usize, String>,

    /// Entry index -> variant -> remapped `filename` value
    pub fixed_paths: IndexMap<usize, IndexMap<String, String>>,
}

impl RemapAssetModel {
    /// Build the model for every `filename` part of `template`
    pub fn from_template<'a, I, F>(
        folder: &Utf8Path,
        template: &Template,
        variants: I,
        fixed_file: F,
    ) -> Self
    where
        I: IntoIterator<Item = &'a str> + Clone,
        F: Fn(&str, &str) -> String,
    {
        let mut model = Self {
            folder: folder.to_path_buf(),
            ..Self::default()
        };

        for (index, part) in template.parts() {
            let Some(filename) = part.get_key(IniKey::Filename) else {
                continue;
            };

            model.original_paths.insert(index, filename.to_string());
            let fixed = model.fixed_paths.entry(index).or_default();
            for variant in variants.clone() {
                fixed.insert(variant.to_string(), fixed_file(filename, variant));
            }
        }

        model
    }

    pub fn fixed_path(&self, index: usize, variant: &str) -> Option<&str> {
        self.fixed_paths
            .get(&index)
            .and_then(|paths| paths.get(variant))
            .map(String::as_str)
    }

    pub fn original_full_paths(&self) -> IndexMap<usize, Utf8PathBuf> {
        self.original_paths
            .iter()
            .map(|(index, path)| (*index, self.resolve(path)))
            .collect()
    }

    pub fn fixed_full_paths(&self) -> IndexMap<usize, IndexMap<String, Utf8PathBuf>> {
        self.fixed_paths
            .iter()
            .map(|(index, paths)| {
                let paths = paths
                    .iter()
                    .map(|(variant, path)| (variant.clone(), self.resolve(path)))
                    .collect();
                (*index, paths)
            })
            .collect()
    }

    fn resolve(&self, path: &str) -> Utf8PathBuf {
        let normalized = path.trim().replace('\\', "/");
        let normalized = normalized.strip_prefix("./").unwrap_or(&normalized);
        self.folder.join(normalized)
    }
}
