/// Centralized platform-specific path computation
///
/// Follows the XDG Base Directory specification on Unix-like systems and the
/// usual per-user locations on Windows and macOS.
use std::path::PathBuf;

const APP_DIR_NAME: &str = "git-time-machine";

/// Platform-agnostic path utilities
pub struct PlatformPaths;

/// Resolve a per-user base directory: the Windows variable, a path under
/// `$HOME` on macOS, or the XDG variable with its `$HOME` fallback elsewhere.
/// Falls back to the working directory when nothing is set.
fn base_dir(
    windows_var: &str,
    macos_home_suffix: &str,
    xdg_var: &str,
    xdg_home_suffix: &str,
) -> PathBuf {
    let home_join =
        |suffix: &str| std::env::var("HOME").map(|home| PathBuf::from(home).join(suffix));
    let resolved = if cfg!(target_os = "windows") {
        std::env::var(windows_var).map(PathBuf::from)
    } else if cfg!(target_os = "macos") {
        home_join(macos_home_suffix)
    } else {
        std::env::var(xdg_var)
            .map(PathBuf::from)
            .or_else(|_| home_join(xdg_home_suffix))
    };
    resolved.unwrap_or_else(|_| PathBuf::from("."))
}

impl PlatformPaths {
    /// Persistent storage for the vector tables and the catalog
    pub fn project_data_dir() -> PathBuf {
        base_dir(
            "LOCALAPPDATA",
            "Library/Application Support",
            "XDG_DATA_HOME",
            ".local/share",
        )
        .join(APP_DIR_NAME)
    }

    /// Disposable storage for clones
    pub fn project_cache_dir() -> PathBuf {
        base_dir("LOCALAPPDATA", "Library/Caches", "XDG_CACHE_HOME", ".cache").join(APP_DIR_NAME)
    }

    /// Get default LanceDB database path
    ///
    /// Returns: {data_dir}/git-time-machine/lancedb
    pub fn default_lancedb_path() -> PathBuf {
        Self::project_data_dir().join("lancedb")
    }

    /// Get default catalog database path
    ///
    /// Returns: {data_dir}/git-time-machine/catalog.sqlite3
    pub fn default_catalog_path() -> PathBuf {
        Self::project_data_dir().join("catalog.sqlite3")
    }

    /// Scratch directory that receives the clone of the repository being loaded.
    /// It is wiped at the start of every load.
    ///
    /// Returns: {cache_dir}/git-time-machine/temprepo
    pub fn default_scratch_dir() -> PathBuf {
        Self::project_cache_dir().join("temprepo")
    }

    /// Get default config file path
    ///
    /// Returns: {config_dir}/git-time-machine/config.toml
    pub fn default_config_path() -> PathBuf {
        base_dir("APPDATA", "Library/Application Support", "XDG_CONFIG_HOME", ".config")
            .join(APP_DIR_NAME)
            .join("config.toml")
    }
}
