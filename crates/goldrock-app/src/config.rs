use std::path::{Path, PathBuf};

use goldrock_trainer::EngineConfig;
use serde::{Deserialize, Serialize};

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 1;

const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_MODEL_ID: &str = "us.anthropic.claude-sonnet-4-20250514-v1:0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldrockConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    pub region: String,
    pub bucket: String,
    /// Bedrock model used for case and tree generation. Renamed from
    /// `model` in v1.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default)]
    pub credentials: CredentialSource,
    /// Added in v1; older configs get the engine defaults.
    #[serde(default)]
    pub engine: EngineConfig,
    pub created_at: jiff::Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialSource {
    Profile {
        profile_name: String,
    },
    #[default]
    DefaultChain,
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

impl GoldrockConfig {
    pub fn new(region: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            config_version: CURRENT_VERSION,
            region: region.into(),
            bucket: bucket.into(),
            model_id: default_model_id(),
            credentials: CredentialSource::DefaultChain,
            engine: EngineConfig::default(),
            created_at: jiff::Timestamp::now(),
        }
    }

    /// Apply `GOLDROCK_BUCKET`, `GOLDROCK_REGION` and `GOLDROCK_MODEL_ID`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from any variable lookup. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(bucket) = get("GOLDROCK_BUCKET") {
            tracing::debug!(bucket = %bucket, "bucket overridden from environment");
            self.bucket = bucket;
        }
        if let Some(region) = get("GOLDROCK_REGION") {
            tracing::debug!(region = %region, "region overridden from environment");
            self.region = region;
        }
        if let Some(model_id) = get("GOLDROCK_MODEL_ID") {
            tracing::debug!(model_id = %model_id, "model overridden from environment");
            self.model_id = model_id;
        }
    }
}

fn config_dir() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("com.goldrock.trainer"))
}

pub fn has_config() -> bool {
    config_dir()
        .map(|d| d.join(CONFIG_FILE).exists())
        .unwrap_or(false)
}

/// Load from the platform config directory and apply environment overrides.
pub fn load_config() -> eyre::Result<GoldrockConfig> {
    let mut config = load_config_from(&config_dir()?)?;
    config.apply_env_overrides();
    Ok(config)
}

pub fn load_config_from(dir: &Path) -> eyre::Result<GoldrockConfig> {
    let path = dir.join(CONFIG_FILE);
    let contents = std::fs::read_to_string(&path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(&contents)?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .map_or(Ok(0), u32::try_from)?;

    let migrated = migrate(json, on_disk_version)?;
    let config: GoldrockConfig = serde_json::from_value(migrated)?;
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
///
/// Each migration is a pure transform on the raw JSON value.
pub fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update GoldRock."
        ));
    }

    // v0 → v1: `model` renamed to `model_id`, engine settings added
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
        if let Some(model) = obj.remove("model") {
            obj.entry("model_id").or_insert(model);
        }
        obj.entry("engine")
            .or_insert(serde_json::to_value(EngineConfig::default())?);
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(1.into()),
        );
        tracing::info!("migrated config v0 → v1 (model_id, engine)");
    }

    Ok(json)
}

pub fn save_config(config: &GoldrockConfig) -> eyre::Result<PathBuf> {
    save_config_to(&config_dir()?, config)
}

/// Write `config.json` under `dir`, creating it if needed.
pub fn save_config_to(dir: &Path, config: &GoldrockConfig) -> eyre::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;

    let path = dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(&stamped)?;

    let tmp_path = dir.join("config.json.tmp");
    std::fs::write(&tmp_path, json.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, &path)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(path)
}

pub fn delete_config() -> eyre::Result<()> {
    let path = config_dir()?.join(CONFIG_FILE);
    if path.exists() {
        std::fs::remove_file(&path)?;
        tracing::info!(path = %path.display(), "config deleted");
    }
    Ok(())
}
