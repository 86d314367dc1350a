//! Built-in catalog of Termux companion apps.
//!
//! Each entry names where the APK can come from, in the order sources are
//! tried. Package ids that are not in the catalog are looked up on F-Droid only.

use std::path::Path;

use droidenv_core::Settings;
use droidenv_core::fetch::{AcquisitionRequest, FdroidApi, FdroidHtml, GithubRelease};

/// A companion app and its sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct App {
    /// Short name accepted on the command line.
    pub name: &'static str,
    /// Android package id.
    pub id: &'static str,
    /// Whether F-Droid publishes it.
    pub fdroid: bool,
    /// `owner/repo` and asset glob for GitHub releases.
    pub github: Option<(&'static str, &'static str)>,
}

pub const CATALOG: &[App] = &[
    App {
        name: "x11",
        id: "com.termux.x11",
        fdroid: false,
        github: Some(("termux/termux-x11", "*universal*.apk")),
    },
    App {
        name: "api",
        id: "com.termux.api",
        fdroid: true,
        github: Some(("termux/termux-api", "*github*.apk")),
    },
    App {
        name: "widget",
        id: "com.termux.widget",
        fdroid: true,
        github: Some(("termux/termux-widget", "*github*.apk")),
    },
    App {
        name: "styling",
        id: "com.termux.styling",
        fdroid: true,
        github: Some(("termux/termux-styling", "*github*.apk")),
    },
];

/// Look up by short name or package id.
pub fn find(key: &str) -> Option<&'static App> {
    CATALOG
        .iter()
        .find(|app| app.name.eq_ignore_ascii_case(key) || app.id == key)
}

/// Whether `id` looks like an Android package id (`a.b[.c]`).
pub fn is_package_id(id: &str) -> bool {
    let parts: Vec<&str> = id.split('.').collect();
    parts.len() >= 2
        && parts.iter().all(|p| {
            p.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && p.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// Build the acquisition request for a catalog name or package id.
///
/// Source order: F-Droid API, F-Droid HTML, then GitHub releases, each at the
/// endpoint configured in `settings`.
///
/// # Errors
///
/// Fails for keys that are neither a catalog name nor a package id, or when a
/// catalog asset pattern is malformed.
pub fn request_for(
    key: &str,
    dest_dir: &Path,
    min_size: u64,
    settings: &Settings,
    github_token: Option<&str>,
) -> anyhow::Result<AcquisitionRequest> {
    let (id, fdroid, github) = match find(key) {
        Some(app) => (app.id, app.fdroid, app.github),
        None if is_package_id(key) => (key, true, None),
        None => anyhow::bail!("unknown app '{key}' (try one of: {})", names().join(", ")),
    };

    let mut request = AcquisitionRequest::new(id, dest_dir, min_size);
    if fdroid {
        request = request
            .resolver(FdroidApi::with_base(&settings.fdroid_url))
            .resolver(FdroidHtml::with_base(&settings.fdroid_url));
    }
    if let Some((repository, pattern)) = github {
        request = request.resolver(
            GithubRelease::new(repository, pattern)?
                .with_api_base(&settings.github_api_url)
                .with_token(github_token.map(str::to_string)),
        );
    }
    Ok(request)
}

/// Short names in catalog order.
pub fn names() -> Vec<&'static str> {
    CATALOG.iter().map(|app| app.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_name_or_id() {
        assert_eq!(find("x11").map(|a| a.id), Some("com.termux.x11"));
        assert_eq!(find("API").map(|a| a.id), Some("com.termux.api"));
        assert_eq!(find("com.termux.widget").map(|a| a.name), Some("widget"));
        assert!(find("nope").is_none());
    }

    #[test]
    fn test_package_id_shape() {
        assert!(is_package_id("org.example.app"));
        assert!(is_package_id("com.termux_x"));
        assert!(!is_package_id("termux"));
        assert!(!is_package_id("com..termux"));
        assert!(!is_package_id("com.1termux"));
    }

    #[test]
    fn test_request_resolver_order() {
        let dir = Path::new("/tmp/apks");
        let settings = Settings::default();

        let api = request_for("api", dir, 12_288, &settings, None).unwrap();
        let names: Vec<&str> = api.resolvers.iter().map(|r| r.name()).collect();
        assert_eq!(names, ["fdroid_api", "fdroid_html", "github"]);
        assert_eq!(api.final_path(), dir.join("com.termux.api.apk"));

        let x11 = request_for("x11", dir, 12_288, &settings, None).unwrap();
        let names: Vec<&str> = x11.resolvers.iter().map(|r| r.name()).collect();
        assert_eq!(names, ["github"]);

        let other = request_for("org.example.app", dir, 12_288, &settings, None).unwrap();
        let names: Vec<&str> = other.resolvers.iter().map(|r| r.name()).collect();
        assert_eq!(names, ["fdroid_api", "fdroid_html"]);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = request_for("nonsense", Path::new("/tmp"), 1, &Settings::default(), None).unwrap_err();
        assert!(err.to_string().contains("unknown app"));
    }
}
