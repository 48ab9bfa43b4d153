//! Candidate locations and module listings.
//!
//! A candidate is either an HTTP base serving an HTML directory listing or a
//! local directory. Both produce plain module filenames; loading a filename
//! fetches its manifest from the same candidate.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Anchor targets in an HTML listing.
static HREF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a\s[^>]*href=["']([^"']+)["']"#).expect("valid href regex"));

/// A base location that may hold module manifests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleLocation {
    /// HTTP(S) base whose GET returns an HTML directory listing.
    Http(String),
    /// Local directory.
    Directory(PathBuf),
}

impl fmt::Display for ModuleLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleLocation::Http(url) => write!(f, "{}", url),
            ModuleLocation::Directory(path) => write!(f, "{}", path.display()),
        }
    }
}

impl FromStr for ModuleLocation {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(ModuleLocation::Http(s.to_string()))
        } else {
            Ok(ModuleLocation::Directory(PathBuf::from(s)))
        }
    }
}

/// Parse an HTTP base, making sure relative joins stay inside it.
fn base_url(base: &str) -> Result<Url> {
    let normalized = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };
    Url::parse(&normalized).map_err(|e| Error::discovery(format!("invalid base URL {}: {}", base, e)))
}

/// Whether `name` is a module file for `extension`.
fn is_module_file(name: &str, extension: &str) -> bool {
    !name.starts_with('_')
        && name
            .strip_suffix(extension)
            .and_then(|stem| stem.strip_suffix('.'))
            .is_some_and(|stem| !stem.is_empty())
}

/// Extract module filenames from an HTML directory listing.
///
/// Only the last path segment of each anchor target is kept; query strings
/// and fragments are ignored. Duplicates keep their first position.
pub fn extract_module_names(html: &str, extension: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for cap in HREF_REGEX.captures_iter(html) {
        let href = &cap[1];
        let path = href.split(['?', '#']).next().unwrap_or_default();
        let Some(name) = path.rsplit('/').next() else {
            continue;
        };

        if is_module_file(name, extension) && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    names
}

/// List the module filenames available at a candidate.
///
/// Directory listings are sorted by name so load order is stable.
pub async fn list_modules(
    client: &reqwest::Client,
    location: &ModuleLocation,
    extension: &str,
) -> Result<Vec<String>> {
    match location {
        ModuleLocation::Http(base) => {
            let url = base_url(base)?;
            let response = client.get(url).send().await?;
            if !response.status().is_success() {
                return Err(Error::discovery(format!(
                    "listing {} returned HTTP {}",
                    base,
                    response.status()
                )));
            }
            let html = response.text().await?;
            Ok(extract_module_names(&html, extension))
        }
        ModuleLocation::Directory(dir) => {
            let mut entries = tokio::fs::read_dir(dir).await?;
            let mut names = Vec::new();
            while let Some(entry) = entries.next_entry().await? {
                if !entry.file_type().await?.is_file() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().to_string();
                if is_module_file(&name, extension) {
                    names.push(name);
                }
            }
            names.sort();
            Ok(names)
        }
    }
}

/// Fetch the manifest text of one module.
pub async fn fetch_module(
    client: &reqwest::Client,
    location: &ModuleLocation,
    filename: &str,
) -> Result<String> {
    match location {
        ModuleLocation::Http(base) => {
            let url = base_url(base)?
                .join(filename)
                .map_err(|e| Error::module_load(filename, format!("invalid module URL: {}", e)))?;
            let response = client.get(url).send().await?;
            if !response.status().is_success() {
                return Err(Error::module_load(
                    filename,
                    format!("HTTP {}", response.status()),
                ));
            }
            Ok(response.text().await?)
        }
        ModuleLocation::Directory(dir) => Ok(tokio::fs::read_to_string(dir.join(filename)).await?),
    }
}
