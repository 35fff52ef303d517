//! Reachability of sections through `run` subcommands.
//!
//! A [`SectionGraph`] is built from a set of root sections and discovers every
//! section they call, directly or transitively. The discovery order (pre-order
//! DFS) is the order generated sections are written in.

use super::errors::RemapError;
use super::names::RemapNameFn;
use crate::models::{Template, TemplateSource, VersionAssetLookup};
use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct SectionGraph {
    /// Reachable sections; insertion order is the run sequence
    sections: IndexMap<String, Template>,

    /// Section name -> variant -> generated name, filled lazily per variant
    remap_names: IndexMap<String, IndexMap<String, String>>,

    remap_name_fn: RemapNameFn,
}

impl SectionGraph {
    pub fn new(remap_name_fn: RemapNameFn) -> Self {
        Self {
            sections: IndexMap::new(),
            remap_names: IndexMap::new(),
            remap_name_fn,
        }
    }

    /// Rebuild the graph from `roots`, discarding any previous state.
    ///
    /// # Errors
    ///
    /// Returns [`RemapError::SectionNotFound`] if a root or a `run` target is
    /// not declared in `all_sections`.
    pub fn build<I, S, T>(&mut self, roots: I, all_sections: &T) -> Result<(), RemapError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        T: TemplateSource + ?Sized,
    {
        self.sections.clear();
        self.remap_names.clear();

        for root in roots {
            let root = root.as_ref();
            if !self.sections.contains_key(root) {
                self.visit(root, all_sections)?;
            }
        }

        tracing::debug!("Built section graph with {} sections", self.sections.len());
        Ok(())
    }

    fn visit<T>(&mut self, name: &str, all_sections: &T) -> Result<(), RemapError>
    where
        T: TemplateSource + ?Sized,
    {
        let template = all_sections
            .template(name)
            .ok_or_else(|| RemapError::SectionNotFound(name.to_string()))?;

        self.sections.insert(name.to_string(), template.clone());

        let children: IndexSet<&str> = template
            .subcommands()
            .values()
            .map(String::as_str)
            .filter(|child| !self.sections.contains_key(*child))
            .collect();

        for child in children {
            // an earlier sibling's subtree may have reached it already
            if !self.sections.contains_key(child) {
                self.visit(child, all_sections)?;
            }
        }

        Ok(())
    }

    pub fn sections(&self) -> &IndexMap<String, Template> {
        &self.sections
    }

    /// Reachable sections in first-discovery order
    pub fn run_sequence(&self) -> impl Iterator<Item = (&str, &Template)> {
        self.sections
            .iter()
            .map(|(name, template)| (name.as_str(), template))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Compute and cache the generated name of every section for each variant
    pub fn ensure_remap_names<'a, I>(
        &mut self,
        variants: I,
    ) -> &IndexMap<String, IndexMap<String, String>>
    where
        I: IntoIterator<Item = &'a str> + Clone,
    {
        let remap_name_fn = self.remap_name_fn;
        for name in self.sections.keys() {
            let names = self.remap_names.entry(name.clone()).or_default();
            for variant in variants.clone() {
                names
                    .entry(variant.to_string())
                    .or_insert_with(|| remap_name_fn(name, variant));
            }
        }
        &self.remap_names
    }

    pub fn remap_names(&self) -> &IndexMap<String, IndexMap<String, String>> {
        &self.remap_names
    }

    /// Generated name of `name` for `variant`, computed on the fly if not cached
    pub fn remap_name(&self, name: &str, variant: &str) -> String {
        self.remap_names
            .get(name)
            .and_then(|names| names.get(variant))
            .cloned()
            .unwrap_or_else(|| (self.remap_name_fn)(name, variant))
    }

    /// Variants for which every recognized asset in the graph resolves.
    ///
    /// Sections with no recognized assets add no constraint; `None` means no
    /// section constrains the result.
    pub fn common_variants(&self, lookup: &dyn VersionAssetLookup) -> Option<BTreeSet<String>> {
        self.sections
            .values()
            .filter_map(|template| lookup.common_variants(template.hashes(), template.indices()))
            .reduce(|common, variants| common.intersection(&variants).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mod_type::MockVersionAssetLookup;
    use crate::models::{ContentPart, TemplateEntry};
    use crate::services::names::{remap_blend_name, remap_fix_name};
    use proptest::prelude::*;

    fn section(name: &str, runs: &[&str]) -> (String, Template) {
        let entries = runs
            .iter()
            .map(|run| TemplateEntry::Content([("run", *run)].into_iter().collect::<ContentPart>()))
            .collect();
        (name.to_string(), Template::new(name, entries))
    }

    fn sections(specs: &[(&str, &[&str])]) -> IndexMap<String, Template> {
        specs.iter().map(|(name, runs)| section(name, runs)).collect()
    }

    fn order(graph: &SectionGraph) -> Vec<&str> {
        graph.run_sequence().map(|(name, _)| name).collect()
    }

    #[test]
    fn test_pre_order_discovery() {
        let all = sections(&[
            ("Root", &["A", "B"]),
            ("A", &["C"]),
            ("B", &["C", "D"]),
            ("C", &[]),
            ("D", &[]),
            ("Unused", &[]),
        ]);

        let mut graph = SectionGraph::new(remap_blend_name);
        graph.build(["Root"], &all).unwrap();

        assert_eq!(order(&graph), vec!["Root", "A", "C", "B", "D"]);
        assert!(!graph.contains("Unused"));
    }

    #[test]
    fn test_cycles_visit_once() {
        let all = sections(&[("A", &["B"]), ("B", &["A", "B"])]);

        let mut graph = SectionGraph::new(remap_blend_name);
        graph.build(["A", "B"], &all).unwrap();

        assert_eq!(order(&graph), vec!["A", "B"]);
    }

    #[test]
    fn test_missing_section_is_fatal() {
        let all = sections(&[("Root", &["Missing"])]);

        let mut graph = SectionGraph::new(remap_blend_name);
        let err = graph.build(["Root"], &all).unwrap_err();

        assert!(matches!(err, RemapError::SectionNotFound(name) if name == "Missing"));
    }

    #[test]
    fn test_remap_names_are_stable_across_variant_queries() {
        let all = sections(&[("TextureOverrideBlend", &["CommandList"]), ("CommandList", &[])]);

        let mut graph = SectionGraph::new(remap_fix_name);
        graph.build(["TextureOverrideBlend"], &all).unwrap();
        graph.ensure_remap_names(["A"]);
        let before = order(&graph).into_iter().map(String::from).collect::<Vec<_>>();
        graph.ensure_remap_names(["A", "B"]);

        assert_eq!(order(&graph), before);
        assert_eq!(graph.remap_names()["CommandList"]["A"], "CommandListARemapFix");
        assert_eq!(graph.remap_names()["CommandList"]["B"], "CommandListBRemapFix");
        assert_eq!(graph.remap_name("NotInGraph", "A"), "NotInGraphARemapFix");
    }

    #[test]
    fn test_common_variants_intersects_sections() {
        let mut all = IndexMap::new();
        for (name, hash) in [("Root", "h1"), ("Child", "h2")] {
            let part: ContentPart = [("hash", hash), ("run", "Child")].into_iter().collect();
            all.insert(name.to_string(), Template::new(name, vec![TemplateEntry::Content(part)]));
        }

        let mut lookup = MockVersionAssetLookup::new();
        lookup.expect_common_variants().returning(|hashes, _| {
            if hashes.contains("h1") {
                Some(BTreeSet::from(["A".to_string(), "B".to_string()]))
            } else {
                Some(BTreeSet::from(["B".to_string(), "C".to_string()]))
            }
        });

        let mut graph = SectionGraph::new(remap_blend_name);
        graph.build(["Root"], &all).unwrap();

        assert_eq!(
            graph.common_variants(&lookup),
            Some(BTreeSet::from(["B".to_string()]))
        );
    }

    #[test]
    fn test_empty_graph_is_unconstrained() {
        let lookup = MockVersionAssetLookup::new();
        let graph = SectionGraph::new(remap_blend_name);
        assert_eq!(graph.common_variants(&lookup), None);
    }

    proptest! {
        #[test]
        fn prop_run_sequence_visits_each_reachable_once(
            edges in prop::collection::vec(prop::collection::vec(0usize..8, 0..4), 8)
        ) {
            let all: IndexMap<String, Template> = edges
                .iter()
                .enumerate()
                .map(|(i, targets)| {
                    let runs: Vec<String> = targets.iter().map(|t| format!("S{t}")).collect();
                    let runs: Vec<&str> = runs.iter().map(String::as_str).collect();
                    section(&format!("S{i}"), &runs)
                })
                .collect();

            let mut graph = SectionGraph::new(remap_blend_name);
            graph.build(["S0"], &all).unwrap();

            let visited = order(&graph);
            let unique: IndexSet<&str> = visited.iter().copied().collect();
            prop_assert_eq!(unique.len(), visited.len());
            prop_assert_eq!(visited[0], "S0");

            // every section called from a reachable section is reachable
            for (_, template) in graph.run_sequence() {
                for target in template.subcommands().values() {
                    prop_assert!(graph.contains(target));
                }
            }
        }
    }
}
