//! Credential extraction and the authentication gate

use crate::error::{ServiceError, ServiceResult};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Read-only lookup of accepted credentials
pub trait CredentialStore: Send + Sync {
    fn contains(&self, key: &str) -> bool;
}

/// A fixed set of API keys
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    keys: HashSet<String>,
}

impl StaticCredentials {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl CredentialStore for StaticCredentials {
    fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

/// Transport metadata accompanying a call
#[derive(Debug, Clone, Default)]
pub struct RequestMetadata {
    /// `x-api-key`
    pub api_key: Option<String>,
    /// `authorization`
    pub authorization: Option<String>,
    /// Remote address or other caller label, for logs only
    pub peer: Option<String>,
}

impl RequestMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = Some(peer.into());
        self
    }

    /// The credential carried by this call.
    ///
    /// A present `x-api-key` decides the outcome even when blank;
    /// otherwise `authorization` with an optional `Bearer `/`bearer `
    /// prefix. `None` only when neither header is present.
    pub fn credential(&self) -> Option<&str> {
        if let Some(key) = self.api_key.as_deref() {
            return Some(key);
        }
        let value = self.authorization.as_deref()?;
        Some(
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
                .unwrap_or(value),
        )
    }
}

/// Who made an accepted call, as shown in logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// First characters of the key; never the whole key
    pub key_hint: String,
    pub peer: Option<String>,
}

impl Caller {
    fn new(key: &str, peer: Option<&str>) -> Self {
        let hint: String = key.chars().take(4).collect();
        Self {
            key_hint: format!("{hint}***"),
            peer: peer.map(String::from),
        }
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.peer {
            Some(peer) => write!(f, "{}@{}", self.key_hint, peer),
            None => f.write_str(&self.key_hint),
        }
    }
}

/// Accept/reject decision made before a call reaches the pipeline
#[derive(Clone)]
pub struct AuthGate {
    store: Arc<dyn CredentialStore>,
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate").finish_non_exhaustive()
    }
}

impl AuthGate {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub fn authenticate(&self, metadata: &RequestMetadata) -> ServiceResult<Caller> {
        let key = metadata.credential().ok_or(ServiceError::Unauthenticated)?;
        if !self.store.contains(key) {
            return Err(ServiceError::PermissionDenied);
        }
        Ok(Caller::new(key, metadata.peer.as_deref()))
    }
}
