//! Data models for iniremap.
//!
//! - [`Template`]: the conditional-aware body of one `.ini` section, built from
//!   [`TemplateEntry`] control lines and [`ContentPart`] key/value blocks
//! - [`Section`]: a named template plus the source lines it occupied
//! - [`RemapAssetModel`]: buffer files a resource section points at, before and after remapping
//! - [`ModType`] / [`ModTypes`]: character skeletons and their asset replacement tables,
//!   exposed to the engine through [`VersionAssetLookup`]
//! - [`MainConfig`] / [`UserConfig`]: YAML configuration loaded by
//!   [`ConfigManager`](crate::config::ConfigManager)

pub mod config;
pub mod heading;
pub mod mod_type;
pub mod remap_model;
pub mod section;
pub mod template;

pub use config::{AssetTable, MainConfig, ModTypeConfig, RemapData, RemapSettings, UserConfig};
pub use heading::Heading;
pub use mod_type::{
    AssetError, AssetKind, AssetRepo, ModType, ModTypeError, ModTypes, VersionAssetLookup,
};
pub use remap_model::RemapAssetModel;
pub use section::{Section, SectionMap, TemplateSource};
pub use template::{ConfigLine, ContentPart, IniKey, Template, TemplateEntry};
