use std::env;
use std::path::PathBuf;

const DEFAULT_ERROR_PREVIEW_CAP: usize = 10;
const DEFAULT_ATTACH_DEPS_SRCJARS: bool = false;

/// Build-time configuration shared by the orchestrator and the model update
/// pipeline. Every field has a default and can be overridden through the
/// environment, so the library is usable without any config file.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Root directory of the artifact cache. Defaults to a per-user temp
    /// location when unset.
    pub cache_dir: PathBuf,
    /// Attach source archives for external dependencies to the project model
    /// in addition to compiled archives.
    pub attach_deps_srcjars: bool,
    /// How many failing targets to list before collapsing the rest into a
    /// count.
    pub error_preview_cap: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let cache_dir = env::var("SCOPESYNC_CACHE_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("scopesync-cache"));

        let attach_deps_srcjars = env::var("SCOPESYNC_ATTACH_DEPS_SRCJARS")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(DEFAULT_ATTACH_DEPS_SRCJARS);

        let error_preview_cap = env::var("SCOPESYNC_ERROR_PREVIEW_CAP")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_ERROR_PREVIEW_CAP);

        Self {
            cache_dir,
            attach_deps_srcjars,
            error_preview_cap,
        }
    }
}

impl SyncConfig {
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preview_cap() {
        let config = SyncConfig::with_cache_dir("/tmp/cache");
        assert_eq!(config.error_preview_cap, 10);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/cache"));
    }
}
