//! RLS attribute sources
//!
//! Attributes come from one of two host-controlled places, checked in order:
//! an object injected by the embedding host, or the `rls_extra_rules` claim of a
//! bearer token persisted in a storage scope. The token signature is never
//! verified; the attributes are advisory only.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use row_actions_common::config::AttributeConfig;
use row_actions_common::error::{Error, Result};
use row_actions_common::types::AttributeMap;

/// Supplies the current RLS attribute map
///
/// Implementations must not fail: anything that cannot be read resolves to an
/// empty map. The engine calls `resolve` on every evaluation and never caches.
pub trait AttributeSource {
    fn resolve(&self) -> AttributeMap;
}

impl AttributeSource for AttributeMap {
    fn resolve(&self) -> AttributeMap {
        self.clone()
    }
}

impl<S: AttributeSource + ?Sized> AttributeSource for Arc<S> {
    fn resolve(&self) -> AttributeMap {
        (**self).resolve()
    }
}

/// One place a bearer token may be persisted (local, session, ...)
pub trait TokenStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
}

/// In-memory storage scope
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_item(&self, key: &str, value: &str) {
        self.items.write().insert(key.to_string(), value.to_string());
    }

    pub fn remove_item(&self, key: &str) {
        self.items.write().remove(key);
    }
}

impl TokenStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().get(key).cloned()
    }
}

/// Host-injected attribute object, shared between the host and the engine
#[derive(Debug, Clone, Default)]
pub struct HostAttributes {
    injected: Arc<RwLock<Option<Value>>>,
}

impl HostAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the injected object from a document of host globals
    pub fn from_globals(globals: &Value, key: &str) -> Self {
        let host = Self::new();
        if let Some(value) = globals.get(key) {
            host.set(value.clone());
        }
        host
    }

    pub fn set(&self, value: Value) {
        *self.injected.write() = Some(value);
    }

    pub fn clear(&self) {
        *self.injected.write() = None;
    }

    /// The injected attributes, if the host set an object
    pub fn get(&self) -> Option<AttributeMap> {
        match self.injected.read().as_ref() {
            Some(Value::Object(map)) => Some(map.clone()),
            _ => None,
        }
    }
}

/// Host object first, then the first non-empty stored token
pub struct LayeredAttributeSource {
    host: HostAttributes,
    scopes: Vec<Arc<dyn TokenStorage>>,
    config: AttributeConfig,
}

impl LayeredAttributeSource {
    pub fn new(config: AttributeConfig) -> Self {
        Self {
            host: HostAttributes::new(),
            scopes: Vec::new(),
            config,
        }
    }

    /// Share an injected-attribute handle with the host
    #[must_use]
    pub fn with_host(mut self, host: HostAttributes) -> Self {
        self.host = host;
        self
    }

    /// Append a storage scope; scopes are consulted in insertion order
    #[must_use]
    pub fn with_scope(mut self, scope: Arc<dyn TokenStorage>) -> Self {
        self.scopes.push(scope);
        self
    }

    pub fn host(&self) -> &HostAttributes {
        &self.host
    }

    fn stored_token(&self) -> Option<String> {
        self.scopes
            .iter()
            .filter_map(|scope| scope.get_item(&self.config.token_storage_key))
            .find(|token| !token.is_empty())
    }
}

impl AttributeSource for LayeredAttributeSource {
    fn resolve(&self) -> AttributeMap {
        if let Some(attributes) = self.host.get() {
            return attributes;
        }

        let Some(token) = self.stored_token().filter(|t| t.contains('.')) else {
            return AttributeMap::new();
        };

        match decode_token_claims(&token, &self.config.token_claim) {
            Ok(Some(attributes)) => attributes,
            Ok(None) => AttributeMap::new(),
            Err(e) => {
                debug!(error = %e, code = e.error_code(), "ignoring unreadable attribute token");
                AttributeMap::new()
            }
        }
    }
}

/// Decode the payload segment of a dot-delimited token and return `claim` if it is an object
///
/// # Errors
/// Returns an error when the token has no payload segment or the segment is not
/// base64-encoded JSON.
pub fn decode_token_claims(token: &str, claim: &str) -> Result<Option<AttributeMap>> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| Error::InvalidToken("missing payload segment".to_string()))?;

    let mut normalized = payload.replace('-', "+").replace('_', "/");
    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }

    let bytes = STANDARD
        .decode(normalized.as_bytes())
        .map_err(|e| Error::TokenEncoding(e.to_string()))?;
    let claims: Value =
        serde_json::from_slice(&bytes).map_err(|e| Error::TokenClaims(e.to_string()))?;

    Ok(match claims.get(claim) {
        Some(Value::Object(attributes)) => Some(attributes.clone()),
        _ => None,
    })
}
