use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

/// In-memory bearer-token store, one token per tenant.
///
/// Two resolution modes coexist:
/// - a tenant-less "current token" (single-tenant back-compat), set by
///   passing a blank tenant key;
/// - per-tenant tokens selected through the active-tenant pointer.
///
/// The active-tenant convenience path is meant for sequential, CLI-style
/// usage. Callers driving multiple tenants concurrently should resolve and
/// pass tokens explicitly per call instead of mutating the shared pointer.
///
/// All operations are total over blank/optional inputs and never touch the
/// network.
#[derive(Debug, Default)]
pub struct CredentialStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// One live token per tenant key.
    tokens: HashMap<String, String>,
    /// Tenant-less token; takes precedence over the active tenant's token.
    current_token: Option<String>,
    /// Tenant whose token backs calls that don't carry one explicitly.
    active_tenant: Option<String>,
    /// Remembered for calls that don't specify a tenant at all.
    default_tenant: Option<String>,
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or remove a token.
    ///
    /// A blank tenant sets the tenant-less current token. A blank or absent
    /// token removes the entry. When the tenant is currently active, the
    /// current token is updated too so immediately-following calls see it.
    pub fn set_token(&self, tenant: &str, token: Option<&str>) {
        let token = token.filter(|t| !is_blank(t)).map(str::to_string);
        let mut inner = self.inner.lock().unwrap();

        if is_blank(tenant) {
            inner.current_token = token;
            return;
        }

        match &token {
            Some(t) => {
                inner.tokens.insert(tenant.to_string(), t.clone());
            }
            None => {
                inner.tokens.remove(tenant);
            }
        }
        if inner.active_tenant.as_deref() == Some(tenant) {
            inner.current_token = token;
        }
        debug!("Stored credentials for tenant {}", tenant);
    }

    /// Switch the active tenant.
    ///
    /// A non-blank tenant also becomes the remembered default tenant. The
    /// current token is refreshed from the store only when the tenant has
    /// one; a previously set tenant-less token otherwise stays in effect
    /// until overwritten.
    pub fn set_active_tenant(&self, tenant: &str) {
        let mut inner = self.inner.lock().unwrap();
        if is_blank(tenant) {
            inner.active_tenant = None;
            return;
        }
        inner.active_tenant = Some(tenant.to_string());
        inner.default_tenant = Some(tenant.to_string());
        if let Some(token) = inner.tokens.get(tenant).cloned() {
            inner.current_token = Some(token);
        }
        debug!("Active tenant is now {}", tenant);
    }

    /// Resolve the bearer token for an outgoing call.
    ///
    /// The tenant-less current token wins when set and non-blank; otherwise
    /// the active tenant's stored token; otherwise `None` (anonymous call).
    pub fn resolve_token(&self) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        if let Some(token) = &inner.current_token {
            if !is_blank(token) {
                return Some(token.clone());
            }
        }
        inner
            .active_tenant
            .as_ref()
            .and_then(|t| inner.tokens.get(t))
            .cloned()
    }

    /// Token stored for a specific tenant, bypassing the active pointer.
    pub fn token_for(&self, tenant: &str) -> Option<String> {
        self.inner.lock().unwrap().tokens.get(tenant).cloned()
    }

    pub fn active_tenant(&self) -> Option<String> {
        self.inner.lock().unwrap().active_tenant.clone()
    }

    pub fn default_tenant(&self) -> Option<String> {
        self.inner.lock().unwrap().default_tenant.clone()
    }

    /// Drop one tenant's token, or every token plus the current token.
    ///
    /// Clearing the active tenant's entry also drops the current token so a
    /// stale bearer value cannot outlive its removal.
    pub fn clear(&self, tenant: Option<&str>) {
        let mut inner = self.inner.lock().unwrap();
        match tenant.filter(|t| !is_blank(t)) {
            Some(t) => {
                inner.tokens.remove(t);
                if inner.active_tenant.as_deref() == Some(t) {
                    inner.current_token = None;
                }
            }
            None => {
                inner.tokens.clear();
                inner.current_token = None;
            }
        }
    }
}
