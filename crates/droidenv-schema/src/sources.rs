//! The `deb <url> <distribution> <component>...` line format used by the
//! package manager's sources list.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A logical repository domain. The sources list holds at most one active
/// line per domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceDomain {
    /// Main package repository.
    Main,
    /// X11 desktop packages.
    X11,
}

impl SourceDomain {
    /// Domains in the order they are written to the sources list.
    pub const ALL: [SourceDomain; 2] = [SourceDomain::Main, SourceDomain::X11];

    /// Path appended to a mirror's base URL.
    pub fn path(self) -> &'static str {
        match self {
            Self::Main => "termux-main",
            Self::X11 => "termux-x11",
        }
    }

    /// Distribution field of the `deb` line; also identifies the domain when parsing.
    pub fn distribution(self) -> &'static str {
        match self {
            Self::Main => "stable",
            Self::X11 => "x11",
        }
    }

    /// Component field of the `deb` line.
    pub fn component(self) -> &'static str {
        "main"
    }

    /// Repository URL for this domain under `base_url`.
    pub fn repo_url(self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.path())
    }

    /// Build the canonical line for this domain served from `base_url`.
    pub fn line_for(self, base_url: &str) -> SourceLine {
        SourceLine {
            url: self.repo_url(base_url),
            distribution: self.distribution().to_string(),
            components: vec![self.component().to_string()],
        }
    }

    /// Returns `true` if `line` configures this domain: the distribution
    /// matches and the URL's last path segment is [`Self::path`]. Other
    /// repositories that happen to use the same suite are not ours.
    pub fn owns(self, line: &SourceLine) -> bool {
        self.base_url_of(line).is_some()
    }

    /// Recover the mirror base URL from a line owned by this domain.
    pub fn base_url_of(self, line: &SourceLine) -> Option<String> {
        if line.distribution != self.distribution() {
            return None;
        }
        let base = line
            .url
            .trim_end_matches('/')
            .strip_suffix(self.path())?
            .strip_suffix('/')?;
        Some(base.to_string())
    }
}

impl fmt::Display for SourceDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => f.write_str("main"),
            Self::X11 => f.write_str("x11"),
        }
    }
}

/// Errors produced while parsing a repository line.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceLineError {
    /// Line starts with something other than `deb`.
    #[error("unsupported source type '{0}'")]
    UnsupportedType(String),

    /// Line is missing its URL, distribution or component.
    #[error("incomplete source line: '{0}'")]
    Incomplete(String),
}

/// One active repository line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLine {
    /// Repository URL.
    pub url: String,
    /// Distribution (suite) name.
    pub distribution: String,
    /// One or more components.
    pub components: Vec<String>,
}

impl SourceLine {
    /// Parse a single line.
    ///
    /// Returns `Ok(None)` for blank lines and comments, which carry no
    /// repository configuration. Bracketed options (`[arch=...]`) are accepted
    /// and dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SourceLineError`] if the line is neither blank, a comment,
    /// nor a complete `deb` line.
    pub fn parse(line: &str) -> Result<Option<Self>, SourceLineError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let mut tokens = trimmed.split_whitespace().peekable();
        let kind = tokens.next().unwrap_or_default();
        if kind != "deb" {
            return Err(SourceLineError::UnsupportedType(kind.to_string()));
        }

        if tokens.peek().is_some_and(|t| t.starts_with('[')) {
            for token in tokens.by_ref() {
                if token.ends_with(']') {
                    break;
                }
            }
        }

        let url = tokens.next();
        let distribution = tokens.next();
        let components: Vec<String> = tokens.map(str::to_string).collect();

        match (url, distribution) {
            (Some(url), Some(dist)) if !components.is_empty() => Ok(Some(Self {
                url: url.to_string(),
                distribution: dist.to_string(),
                components,
            })),
            _ => Err(SourceLineError::Incomplete(trimmed.to_string())),
        }
    }
}

impl fmt::Display for SourceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "deb {} {} {}",
            self.url,
            self.distribution,
            self.components.join(" ")
        )
    }
}
