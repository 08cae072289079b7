use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::{Mutex, MutexGuard, OnceLock};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/hearth/hearth.toml";
pub const CONFIG_ENV: &str = "HEARTH_CONFIG";

/// Resolve the platform config path.
///
/// Order: explicit `--config`, then `HEARTH_CONFIG`, then
/// `/etc/hearth/hearth.toml`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let Ok(v) = std::env::var(CONFIG_ENV)
        && !v.trim().is_empty()
    {
        return PathBuf::from(v);
    }

    PathBuf::from(DEFAULT_CONFIG_PATH)
}

#[cfg(test)]
pub(crate) fn test_config_env_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .expect("HEARTH_CONFIG test env lock poisoned")
}
