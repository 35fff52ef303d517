//! Integration tests for the rewriting engine
//!
//! These tests verify:
//! - Section parsing of conditional blocks
//! - Graph discovery order and variant intersection across graphs
//! - Apply output, idempotence and undo/apply equivalence
//! - File-backed batch processing through RemapService

use camino::Utf8PathBuf;
use iniremap::models::{AssetTable, ModType, ModTypes, TemplateEntry};
use iniremap::services::names::{remap_blend_name, remap_fix_name, remap_resource_name};
use iniremap::services::{FileStatus, SectionGraph, SectionParser};
use iniremap::{ApplyOutcome, IniFile, MainConfig, RemapOptions, RemapService};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const BODY_INI: &str = "\
[Constants]
global $swap = 0

[TextureOverrideRaidenBlend]
hash = 111
handling = skip
if $swap == 1
    vb1 = ResourceRaidenBlend.1
else
    vb1 = ResourceRaidenBlend
endif
run = CommandListRaidenBody
draw = 21916,0

[CommandListRaidenBody]
if $swap == 1
    run = CommandListRaidenSwap
endif

[CommandListRaidenSwap]
$swap = 0

[TextureOverrideRaidenHead]
hash = 444
match_first_index = 0
ib = ResourceHeadIB

[ResourceRaidenBlend]
type = Buffer
stride = 32
filename = Body/RaidenBlend.buf

[ResourceRaidenBlend.1]
type = Buffer
stride = 32
filename = Body/RaidenBlendAlt.buf
";

fn table(rows: &[(&str, &[(&str, &str)])]) -> AssetTable {
    rows.iter()
        .map(|(id, replacements)| {
            let replacements = replacements
                .iter()
                .map(|(variant, new_id)| (variant.to_string(), new_id.to_string()))
                .collect();
            (id.to_string(), replacements)
        })
        .collect()
}

fn raiden() -> Arc<ModType> {
    Arc::new(
        ModType::new(
            "Raiden",
            Regex::new(r"^\s*\[\s*TextureOverride.*(Raiden|Shogun).*Blend.*\s*\]").unwrap(),
        )
        .with_variants(["RaidenBoss"])
        .with_hashes(table(&[
            ("111", &[("RaidenBoss", "222")]),
            ("444", &[("RaidenBoss", "555")]),
        ])),
    )
}

fn raiden_file(text: &str) -> IniFile {
    IniFile::from_text(text).with_mod_types(vec![raiden()])
}

fn variants(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[test]
fn test_parser_keeps_control_lines_verbatim() {
    let parsed = SectionParser::new().parse(BODY_INI, &[raiden()], None);

    assert_eq!(parsed.root.as_deref(), Some("TextureOverrideRaidenBlend"));
    assert!(parsed.is_mod_ini);
    assert!(!parsed.is_fixed);

    let root = parsed.root_template().unwrap();
    let controls: Vec<&str> = root
        .entries()
        .iter()
        .filter_map(|entry| match entry {
            TemplateEntry::Control(line) => Some(line.as_str()),
            TemplateEntry::Content(_) => None,
        })
        .collect();
    assert_eq!(controls, vec!["if $swap == 1", "else", "endif"]);
    assert_eq!(root.subcommands().values().collect::<Vec<_>>(), vec!["CommandListRaidenBody"]);
}

#[test]
fn test_graph_discovers_sections_in_pre_order() {
    let parsed = SectionParser::new().parse(BODY_INI, &[raiden()], None);
    let mut graph = SectionGraph::new(remap_blend_name);
    graph.build(["TextureOverrideRaidenBlend"], &parsed.sections).unwrap();

    let order: Vec<String> = graph.run_sequence().map(|(name, _)| name.to_string()).collect();
    assert_eq!(
        order,
        vec![
            "TextureOverrideRaidenBlend",
            "CommandListRaidenBody",
            "CommandListRaidenSwap"
        ]
    );

    // asking for more variants later does not reorder anything
    graph.ensure_remap_names(["RaidenBoss"]);
    graph.ensure_remap_names(["RaidenBoss", "Other"]);
    let again: Vec<&str> = graph.run_sequence().map(|(name, _)| name).collect();
    assert_eq!(again, order);
    assert_eq!(
        graph.remap_name("CommandListRaidenSwap", "RaidenBoss"),
        "CommandListRaidenSwapRaidenBossRemapBlend"
    );
}

#[test]
fn test_common_variants_intersect_across_graphs() {
    let text = "\
[TextureOverrideRaidenBlend]
hash = aaa

[TextureOverrideRaidenHead]
hash = bbb

[ResourceRaidenBlend]
hash = ccc
";
    let mod_type = ModType::new("Raiden", Regex::new(r"^\[TextureOverrideRaidenBlend\]").unwrap())
        .with_hashes(table(&[
            ("aaa", &[("A", "1"), ("B", "2")]),
            ("bbb", &[("B", "3"), ("C", "4")]),
            ("ccc", &[("B", "5")]),
        ]));
    let parsed = SectionParser::new().parse(text, &[], None);

    let mut graphs = [
        SectionGraph::new(remap_blend_name),
        SectionGraph::new(remap_fix_name),
        SectionGraph::new(remap_resource_name),
    ];
    let roots = [
        "TextureOverrideRaidenBlend",
        "TextureOverrideRaidenHead",
        "ResourceRaidenBlend",
    ];
    for (graph, root) in graphs.iter_mut().zip(roots) {
        graph.build([root], &parsed.sections).unwrap();
    }

    let per_graph: Vec<BTreeSet<String>> = graphs
        .iter()
        .map(|graph| graph.common_variants(&mod_type).unwrap())
        .collect();
    assert_eq!(per_graph[0], variants(&["A", "B"]));
    assert_eq!(per_graph[1], variants(&["B", "C"]));

    let common = per_graph
        .into_iter()
        .reduce(|common, set| common.intersection(&set).cloned().collect())
        .unwrap();
    assert_eq!(common, variants(&["B"]));
}

#[test]
fn test_resolved_variants_use_common_set() {
    let text = "\
[TextureOverrideRaidenBlend]
hash = aaa
run = CommandListRaidenBody

[CommandListRaidenBody]
hash = bbb

[TextureOverrideRaidenHead]
hash = ccc
";
    let mod_type = ModType::new(
        "Raiden",
        Regex::new(r"^\s*\[\s*TextureOverride.*Raiden.*Blend.*\s*\]").unwrap(),
    )
    .with_variants(["A", "B", "C"])
    .with_hashes(table(&[
        ("aaa", &[("A", "1"), ("B", "2")]),
        ("bbb", &[("B", "3"), ("C", "4")]),
        ("ccc", &[("B", "5")]),
    ]));

    let mut ini = IniFile::from_text(text)
        .with_mod_types(vec![Arc::new(mod_type)])
        .with_variants(["A", "B", "C"]);
    assert!(ini.build_graphs().unwrap());
    assert_eq!(ini.to_fix(), &variants(&["B"]));

    let outcome = ini.apply().unwrap();
    assert_eq!(
        outcome,
        ApplyOutcome::Applied {
            variants: vec!["B".to_string()]
        }
    );
    assert!(ini.text().contains(
        "[TextureOverrideRaidenBRemapBlend]\nhash = 2\nrun = CommandListRaidenBodyBRemapBlend\n"
    ));
    assert!(ini.text().contains("[TextureOverrideRaidenHeadBRemapFix]\nhash = 5\n"));
}

#[test]
fn test_apply_generates_conditional_sections() {
    let mut ini = raiden_file(BODY_INI);
    ini.apply().unwrap();
    let text = ini.text();

    assert!(text.starts_with(BODY_INI));
    assert!(text.contains(
        "[TextureOverrideRaidenRaidenBossRemapBlend]\nhash = 222\nhandling = skip\n\
         if $swap == 1\n\tvb1 = ResourceRaidenRaidenBossRemapBlend.1\n\
         else\n\tvb1 = ResourceRaidenRaidenBossRemapBlend\nendif\n"
    ));
    assert!(text.contains(
        "[CommandListRaidenBodyRaidenBossRemapBlend]\nif $swap == 1\n\
         \trun = CommandListRaidenSwapRaidenBossRemapBlend\nendif\n"
    ));
    assert!(text.contains("filename = Body/RaidenRaidenBossRemapBlend.buf"));
    assert!(text.contains("filename = Body/RaidenRaidenBossRemapBlendAlt.buf"));
    assert!(text.contains(
        "[TextureOverrideRaidenHeadRaidenBossRemapFix]\nhash = 555\n\
         match_first_index = 0\nib = ResourceHeadIB\n"
    ));

    // the resource without a merge suffix comes first
    let plain = text.find("[ResourceRaidenRaidenBossRemapBlend]").unwrap();
    let merged = text.find("[ResourceRaidenRaidenBossRemapBlend.1]").unwrap();
    assert!(plain < merged);
}

#[test]
fn test_apply_twice_is_a_no_op() {
    let mut ini = raiden_file(BODY_INI);
    ini.apply().unwrap();
    let once = ini.text().to_string();

    let mut reopened = raiden_file(&once);
    assert!(reopened.is_fixed().unwrap());
    assert_eq!(reopened.apply().unwrap(), ApplyOutcome::AlreadyFixed);
    assert_eq!(reopened.text(), once);
}

#[test]
fn test_undo_then_apply_matches_pristine_apply() {
    let mut pristine = raiden_file(BODY_INI.trim());
    pristine.apply().unwrap();
    let expected = pristine.text().to_string();

    let mut ini = raiden_file(&expected);
    let report = ini.undo().unwrap();
    assert_eq!(ini.text(), BODY_INI.trim());
    assert_eq!(report.removed_resources.len(), 2);

    ini.apply().unwrap();
    assert_eq!(ini.text(), expected);
}

#[test]
fn test_undo_removes_stray_generated_sections() {
    let text = format!(
        "{}\n\n[TextureOverrideRaidenRaidenBossRemapBlend]\nhash = 222\n",
        BODY_INI.trim()
    );
    let mut ini = raiden_file(&text);
    ini.undo().unwrap();

    assert!(!ini.text().contains("RemapBlend"));
    assert!(ini.text().contains("[ResourceRaidenBlend.1]"));
}

#[test]
fn test_service_processes_files_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join("Raiden.ini")).unwrap();
    fs::write(&path, BODY_INI).unwrap();

    let mod_types = ModTypes::from_config(&MainConfig::default()).unwrap();
    let service = RemapService::new(&mod_types, RemapOptions::default()).unwrap();

    let summary = service.run([&path]);
    assert_eq!(summary.fixed, 1);
    assert!(!summary.has_failures());
    let fixed = fs::read_to_string(&path).unwrap();
    assert!(fixed.contains("; --------------- Raiden Remap ---------------"));

    let undo = RemapService::new(
        &mod_types,
        RemapOptions {
            undo_only: true,
            ..Default::default()
        },
    )
    .unwrap();
    let result = undo.process_file(&path).unwrap();
    assert_eq!(result.status, FileStatus::Undone);
    assert!(result.written);
    assert_eq!(result.removed_files.len(), 2);
    assert_eq!(fs::read_to_string(&path).unwrap(), BODY_INI.trim());
}

#[test]
fn test_undo_of_truncated_block_lets_a_later_run_fix_again() {
    let mut ini = raiden_file(BODY_INI);
    ini.apply().unwrap();
    let applied = ini.text().to_string();
    let truncated = &applied[..applied.rfind("\n\n; ---").unwrap()];

    let dir = TempDir::new().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join("Raiden.ini")).unwrap();
    fs::write(&path, truncated).unwrap();

    let mod_types = ModTypes::from_config(&MainConfig::default()).unwrap();
    let undo = RemapService::new(
        &mod_types,
        RemapOptions {
            undo_only: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(undo.process_file(&path).unwrap().status, FileStatus::Undone);

    let undone = fs::read_to_string(&path).unwrap();
    assert!(!undone.contains("Raiden Remap"));
    assert!(!undone.contains("remapped by"));
    assert_eq!(undone, BODY_INI.trim());

    let fix = RemapService::new(
        &mod_types,
        RemapOptions {
            fix_only: true,
            ..Default::default()
        },
    )
    .unwrap();
    let result = fix.process_file(&path).unwrap();
    assert!(matches!(result.status, FileStatus::Fixed { .. }));
    assert!(fs::read_to_string(&path).unwrap().contains("RaidenBossRemapBlend"));
}
