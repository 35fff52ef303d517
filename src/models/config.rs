use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Old asset id -> target variant -> new asset id
pub type AssetTable = IndexMap<String, IndexMap<String, String>>;

/// Main configuration from Remap Main.yaml
///
/// Contains the mod-type database: root section patterns, target variants and
/// the hash/index replacement tables for each variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainConfig {
    #[serde(rename = "Remap_Data")]
    pub remap_data: RemapData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemapData {
    pub version: String,

    #[serde(rename = "Mod_Types")]
    pub mod_types: IndexMap<String, ModTypeConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModTypeConfig {
    /// Regex matched against section header lines to find the root section
    pub root_pattern: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    /// Variants generated when the user does not request any
    #[serde(default)]
    pub variants: Vec<String>,

    #[serde(default)]
    pub hashes: AssetTable,

    #[serde(default)]
    pub indices: AssetTable,
}

/// User configuration from Remap Config.yaml
///
/// Contains user-specific settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(rename = "Remap_Settings")]
    pub remap_settings: RemapSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemapSettings {
    /// Mod types to look for; empty means every known type
    #[serde(rename = "Types", default)]
    pub types: Vec<String>,

    /// Mod type assumed for files whose type cannot be identified
    #[serde(rename = "Default Type", default)]
    pub default_type: Option<String>,

    /// Variants to generate; empty means every variant of the mod type
    #[serde(rename = "Variants", default)]
    pub variants: Vec<String>,

    /// Resource sections referenced by `vb1` are only remapped if their name matches
    #[serde(
        rename = "Managed Resource Pattern",
        default = "default_managed_resource_pattern"
    )]
    pub managed_resource_pattern: String,

    #[serde(rename = "Log Dir", default = "default_log_dir")]
    pub log_dir: String,

    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,
}

impl Default for RemapSettings {
    fn default() -> Self {
        Self {
            types: Vec::new(),
            default_type: None,
            variants: Vec::new(),
            managed_resource_pattern: default_managed_resource_pattern(),
            log_dir: default_log_dir(),
            debug_mode: false,
        }
    }
}

fn default_managed_resource_pattern() -> String {
    r"^Resource".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

/// Root pattern of the built-in Raiden type
pub const RAIDEN_ROOT_PATTERN: &str = r"^\s*\[\s*TextureOverride.*(Raiden|Shogun).*Blend.*\s*\]";

impl Default for MainConfig {
    /// Built-in database used when no Remap Main.yaml exists: the Raiden type
    /// with its boss variant and no replacement tables
    fn default() -> Self {
        let raiden = ModTypeConfig {
            root_pattern: RAIDEN_ROOT_PATTERN.to_string(),
            aliases: ["Ei", "RaidenEi", "RaidenShogun", "Shogun", "ShogunEi"]
                .map(String::from)
                .to_vec(),
            variants: vec!["RaidenBoss".to_string()],
            ..ModTypeConfig::default()
        };

        Self {
            remap_data: RemapData {
                version: "1.0".to_string(),
                mod_types: IndexMap::from([("Raiden".to_string(), raiden)]),
            },
        }
    }
}

impl MainConfig {
    /// Get the configuration of a mod type by its exact name
    pub fn get_mod_type(&self, name: &str) -> Option<&ModTypeConfig> {
        self.remap_data.mod_types.get(name)
    }
}
