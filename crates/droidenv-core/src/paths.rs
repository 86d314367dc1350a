use dirs::home_dir;
use std::path::PathBuf;

/// Default Termux prefix when `PREFIX` is not exported.
pub const DEFAULT_PREFIX: &str = "/data/data/com.termux/files/usr";

/// Returns the droidenv state directory, or None if the user's home cannot be resolved.
pub fn try_droidenv_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("DROIDENV_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".droidenv"))
}

/// Returns the canonical droidenv home directory (`~/.droidenv`).
///
/// # Panics
///
/// Panics if neither `DROIDENV_HOME` is set nor the user's home directory can be
/// resolved. Inside Termux `HOME` is always set.
pub fn droidenv_home() -> PathBuf {
    try_droidenv_home().expect("Could not determine home directory. Set DROIDENV_HOME to override.")
}

/// Optional settings file: ~/.droidenv/config.toml
pub fn config_path() -> PathBuf {
    droidenv_home().join("config.toml")
}

/// Summary of the last setup run: ~/.droidenv/last-run.json
pub fn summary_path() -> PathBuf {
    droidenv_home().join("last-run.json")
}

/// Default destination for acquired APKs: ~/.droidenv/downloads
pub fn download_dir() -> PathBuf {
    droidenv_home().join("downloads")
}

/// Termux installation prefix (`$PREFIX`).
pub fn termux_prefix() -> PathBuf {
    std::env::var_os("PREFIX").map_or_else(|| PathBuf::from(DEFAULT_PREFIX), PathBuf::from)
}

/// The package manager's sources list: $PREFIX/etc/apt/sources.list
pub fn sources_list_path() -> PathBuf {
    termux_prefix().join("etc").join("apt").join("sources.list")
}

/// Extract the filename from a URL, ignoring any query string or fragment.
pub fn filename_from_url(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.split('/').next_back().unwrap_or("")
}
