//! Template database persistence as a TOML asset.

use crate::store::GestureStore;
use anyhow::{Result, anyhow};
use directories::UserDirs;
use log::info;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub fn default_db_path() -> PathBuf {
    let home = UserDirs::new().unwrap().home_dir().to_path_buf();
    home.join(".config").join("gesturectl").join("gestures.toml")
}

pub fn load_store(path: &Path) -> Result<GestureStore> {
    let txt =
        fs::read_to_string(path).map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
    let store: GestureStore =
        toml::from_str(&txt).map_err(|e| anyhow!("failed to parse {}: {e}", path.display()))?;
    validate_store(&store)?;
    Ok(store)
}

pub fn save_store(path: &Path, store: &GestureStore) -> Result<()> {
    validate_store(store)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let txt = toml::to_string_pretty(store)
        .map_err(|e| anyhow!("failed to serialize database: {e}"))?;
    fs::write(path, txt).map_err(|e| anyhow!("failed to write {}: {e}", path.display()))?;
    Ok(())
}

/// Load the database, installing an empty default one on first run.
pub fn load_or_create(path: &Path) -> Result<GestureStore> {
    if !path.exists() {
        let store = GestureStore::default();
        save_store(path, &store)?;
        info!("installed empty gesture database at {}", path.display());
        return Ok(store);
    }
    load_store(path)
}

pub fn validate_store(store: &GestureStore) -> Result<()> {
    if store.target_scale <= 0.0 {
        return Err(anyhow!("target_scale must be positive"));
    }
    for (i, g) in store.gestures.iter().enumerate() {
        if g.name.trim().is_empty() {
            return Err(anyhow!("gesture {} has an empty name", i));
        }
        if g.settings.first_threshold < 0.0 || g.settings.full_threshold < 0.0 {
            return Err(anyhow!("gesture '{}' has a negative threshold", g.name));
        }
        if g.settings.minimum_length == 0 {
            return Err(anyhow!("gesture '{}' has minimum_length 0", g.name));
        }
    }
    Ok(())
}
