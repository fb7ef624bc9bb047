use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Mount prefix under which the whole application is served
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RootPath(String);

impl RootPath {
    pub fn new(root: impl Into<String>) -> Result<Self> {
        let root = root.into();
        if root.is_empty() {
            anyhow::bail!("Root path must not be empty");
        }
        Ok(Self(root))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix to mount routes under, without a trailing slash ("" for "/")
    pub fn mount_prefix(&self) -> &str {
        self.0.strip_suffix('/').unwrap_or(&self.0)
    }

    /// Rewrite a raw endpoint path into the path shown to users.
    ///
    /// Slash-leading paths are joined with exactly one separator. Paths
    /// without a leading slash drop the first character of the root
    /// instead, and get no separator when the root already ends with one:
    /// `("/api/", "index.html")` gives `api/index.html`.
    pub fn normalize(&self, raw: &str) -> String {
        let root = self.0.as_str();
        if root == "/" {
            return raw.to_string();
        }

        if raw.starts_with('/') {
            match root.strip_suffix('/') {
                Some(trimmed) => format!("{}{}", trimmed, raw),
                None => format!("{}{}", root, raw),
            }
        } else {
            let mut chars = root.chars();
            chars.next();
            let rest = chars.as_str();
            if root.ends_with('/') {
                format!("{}{}", rest, raw)
            } else {
                format!("{}/{}", rest, raw)
            }
        }
    }
}

impl Default for RootPath {
    fn default() -> Self {
        Self("/".to_string())
    }
}

impl fmt::Display for RootPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RootPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        RootPath::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Join a resource base path and a method sub-path with a single slash
pub fn join_paths(base: &str, sub: &str) -> String {
    if sub.is_empty() {
        return base.to_string();
    }
    let base = base.strip_suffix('/').unwrap_or(base);
    if sub.starts_with('/') {
        format!("{}{}", base, sub)
    } else {
        format!("{}/{}", base, sub)
    }
}
