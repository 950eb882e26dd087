use std::fmt;
use std::str::FromStr;

use crate::constants::cache::{CHAT_NAMESPACE, SEARCH_NAMESPACE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Search,
    Chat,
}

impl Namespace {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => SEARCH_NAMESPACE,
            Self::Chat => CHAT_NAMESPACE,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            SEARCH_NAMESPACE => Ok(Self::Search),
            CHAT_NAMESPACE => Ok(Self::Chat),
            other => Err(format!(
                "Unknown namespace '{other}', expected '{SEARCH_NAMESPACE}' or '{CHAT_NAMESPACE}'"
            )),
        }
    }
}

/// Store key of the form `{namespace}:{normalized query}`.
///
/// Only the query text participates; result limits and chat context are
/// left out so that equivalent requests share one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: Namespace,
    key: String,
}

impl CacheKey {
    #[must_use]
    pub fn derive(namespace: Namespace, query: &str) -> Self {
        Self {
            namespace,
            key: format!("{namespace}:{}", normalize_query(query)),
        }
    }

    #[must_use]
    pub const fn namespace(&self) -> Namespace {
        self.namespace
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

#[must_use]
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

#[must_use]
pub fn derive_key(namespace: Namespace, query: &str) -> CacheKey {
    CacheKey::derive(namespace, query)
}
