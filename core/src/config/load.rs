use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default codepilot data directory: ~/.codepilot
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".codepilot"))
}

/// Load configuration from an explicit file, then apply environment overrides.
pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let mut cfg = toml::from_str::<AppConfig>(&s)?;
    finalize(&mut cfg);
    Ok(cfg)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.codepilot/config.toml (highest)
    let user_config = get_data_dir()?.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg: AppConfig = if user_config.exists() {
        let s = std::fs::read_to_string(&user_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else if local_config.exists() {
        let s = std::fs::read_to_string(local_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else {
        AppConfig::default()
    };

    finalize(&mut cfg);
    Ok(cfg)
}

fn finalize(cfg: &mut AppConfig) {
    apply_env_overrides(cfg, |key| std::env::var(key).ok());

    cfg.root = shellexpand::tilde(&cfg.root).to_string();
    if let Some(dir) = cfg.logging.directory.as_mut() {
        *dir = shellexpand::tilde(dir.as_str()).to_string();
    }
}

/// Environment variable overrides (Priority 0: highest)
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("CODEPILOT_LLM_BASE_URL") {
        cfg.llm.base_url = v;
    }
    if let Some(v) = non_empty("CODEPILOT_LLM_API_KEY") {
        cfg.llm.api_key = v;
    }
    if let Some(v) = non_empty("CODEPILOT_LLM_MODEL") {
        cfg.llm.model = v;
    }
    if let Some(v) = non_empty("CODEPILOT_ROOT") {
        cfg.root = v;
    }
}
