//! Naming rules for generated sections and buffer files.
//!
//! All functions here are pure: the same `(name, variant)` always produces the
//! same result, which is what lets the section graphs cache them.

use std::cmp::Ordering;

pub const BLEND: &str = "Blend";
pub const RESOURCE: &str = "Resource";
pub const REMAP_BLEND: &str = "RemapBlend";
pub const REMAP_FIX: &str = "RemapFix";
pub const BUFFER_EXT: &str = ".buf";

/// Signature shared by the three remap-name flavours
pub type RemapNameFn = fn(&str, &str) -> String;

/// Replace the last `Blend` in `name` with `<variant>RemapBlend`, or append it
pub fn remap_blend_name(name: &str, variant: &str) -> String {
    match name.rsplit_once(BLEND) {
        Some((head, tail)) => format!("{head}{variant}{REMAP_BLEND}{tail}"),
        None => format!("{name}{variant}{REMAP_BLEND}"),
    }
}

/// Append `<variant>RemapFix`, replacing an existing `RemapFix` suffix
pub fn remap_fix_name(name: &str, variant: &str) -> String {
    let suffix = format!("{variant}{REMAP_FIX}");
    if name.ends_with(&suffix) {
        return name.to_string();
    }

    match name.strip_suffix(REMAP_FIX) {
        Some(stem) => format!("{stem}{suffix}"),
        None => format!("{name}{suffix}"),
    }
}

/// Remap-blend name, guaranteed to start with `Resource`
pub fn remap_resource_name(name: &str, variant: &str) -> String {
    with_resource_prefix(&remap_blend_name(name, variant))
}

pub fn with_resource_prefix(name: &str) -> String {
    if name.starts_with(RESOURCE) {
        name.to_string()
    } else {
        format!("{RESOURCE}{name}")
    }
}

/// Path of the remapped buffer file for `blend_file`.
///
/// The directory part and its separator style are kept as written; only the
/// file name changes, e.g. `.\Body\RaidenBlend.buf` becomes
/// `.\Body\RaidenRaidenBossRemapBlend.buf`.
pub fn fixed_blend_file(blend_file: &str, variant: &str) -> String {
    let blend_file = blend_file.trim();
    let (folder, base) = match blend_file.rfind(['/', '\\']) {
        Some(pos) => blend_file.split_at(pos + 1),
        None => ("", blend_file),
    };
    let stem = base.rsplit_once('.').map_or(base, |(stem, _)| stem);

    format!("{folder}{}{BUFFER_EXT}", remap_blend_name(stem, variant))
}

/// Trailing `.<integer>` suffix the mod merger appends to duplicated resources
pub fn merged_resource_index(name: &str) -> Option<i64> {
    name.rsplit_once('.')
        .and_then(|(_, suffix)| suffix.trim().parse().ok())
}

/// Resource ordering: names without a merge suffix first (by name), then
/// suffixed names by their integer suffix.
pub fn compare_resources(a: &str, b: &str) -> Ordering {
    match (merged_resource_index(a), merged_resource_index(b)) {
        (None, None) => a.cmp(b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(&y),
    }
}

pub fn sort_resources(names: &mut [String]) {
    names.sort_by(|a, b| compare_resources(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_remap_blend_name() {
        assert_eq!(
            remap_blend_name("TextureOverrideRaidenBlend", "RaidenBoss"),
            "TextureOverrideRaidenRaidenBossRemapBlend"
        );
        assert_eq!(
            remap_blend_name("BlendA_Blend_Tail", "X"),
            "BlendA_XRemapBlend_Tail"
        );
        assert_eq!(remap_blend_name("CommandList", "X"), "CommandListXRemapBlend");
    }

    #[test]
    fn test_remap_fix_name() {
        assert_eq!(remap_fix_name("TextureOverrideHead", "X"), "TextureOverrideHeadXRemapFix");
        assert_eq!(remap_fix_name("HeadXRemapFix", "X"), "HeadXRemapFix");
        assert_eq!(remap_fix_name("HeadRemapFix", "X"), "HeadXRemapFix");
    }

    #[test]
    fn test_remap_resource_name() {
        assert_eq!(
            remap_resource_name("ResourceRaidenBlend", "X"),
            "ResourceRaidenXRemapBlend"
        );
        assert_eq!(remap_resource_name("RaidenBlend", "X"), "ResourceRaidenXRemapBlend");
    }

    #[test]
    fn test_fixed_blend_file() {
        assert_eq!(
            fixed_blend_file(".\\Body\\RaidenBlend.buf", "RaidenBoss"),
            ".\\Body\\RaidenRaidenBossRemapBlend.buf"
        );
        assert_eq!(fixed_blend_file("Body/Blend.buf", "X"), "Body/XRemapBlend.buf");
        assert_eq!(fixed_blend_file("Hair.buf", "X"), "HairXRemapBlend.buf");
    }

    #[test]
    fn test_merged_resource_index() {
        assert_eq!(merged_resource_index("Res.2"), Some(2));
        assert_eq!(merged_resource_index("Res.-100"), Some(-100));
        assert_eq!(merged_resource_index("Res.UnitTest"), None);
        assert_eq!(merged_resource_index("Res"), None);
    }

    #[test]
    fn test_sort_resources() {
        let mut names: Vec<String> = ["Res.2", "Res", "Res.-100", "Res.UnitTest"]
            .map(String::from)
            .to_vec();
        sort_resources(&mut names);
        assert_eq!(names, vec!["Res", "Res.UnitTest", "Res.-100", "Res.2"]);
    }

    proptest! {
        #[test]
        fn prop_unsuffixed_names_sort_first(
            plain in prop::collection::vec("[A-Za-z]{1,8}", 0..6),
            suffixes in prop::collection::vec(-1000i64..1000, 0..6),
        ) {
            let mut names: Vec<String> = plain.clone();
            names.extend(suffixes.iter().map(|n| format!("Resource.{n}")));
            sort_resources(&mut names);

            let split = names.iter().take_while(|n| merged_resource_index(n).is_none()).count();
            prop_assert_eq!(split, plain.len());
            prop_assert!(names[..split].windows(2).all(|w| w[0] <= w[1]));

            let indices: Vec<i64> = names[split..]
                .iter()
                .filter_map(|n| merged_resource_index(n))
                .collect();
            prop_assert!(indices.windows(2).all(|w| w[0] <= w[1]));
        }

        #[test]
        fn prop_remap_names_are_deterministic(
            name in "[A-Za-z]{0,12}",
            variant in "[A-Za-z]{0,6}",
        ) {
            prop_assert_eq!(remap_blend_name(&name, &variant), remap_blend_name(&name, &variant));
            let fixed = remap_fix_name(&name, &variant);
            prop_assert_eq!(remap_fix_name(&fixed, &variant), fixed.clone());
            prop_assert!(remap_resource_name(&name, &variant).starts_with(RESOURCE));
        }
    }
}
