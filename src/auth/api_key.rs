use async_trait::async_trait;
use std::collections::HashMap;

/// Outcome of a key-store lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiKeyValidation {
    pub is_valid: bool,
    pub tenant_id: Option<String>,
    pub user_id: Option<String>,
}

impl ApiKeyValidation {
    pub fn valid(tenant_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            tenant_id: Some(tenant_id.into()),
            user_id: Some(user_id.into()),
        }
    }

    pub fn invalid() -> Self {
        Self::default()
    }
}

/// Trusted store of issued API keys.
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    async fn validate(&self, api_key: &str) -> ApiKeyValidation;
}

/// Identity an API key maps to.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyOwner {
    pub tenant_id: String,
    pub user_id: String,
}

/// Key store held in memory, loaded from configuration at startup.
#[derive(Clone, Default)]
pub struct StaticApiKeyStore {
    keys: HashMap<String, KeyOwner>,
}

impl std::fmt::Debug for StaticApiKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticApiKeyStore")
            .field("keys", &format!("[{} keys]", self.keys.len()))
            .finish()
    }
}

impl StaticApiKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(
        mut self,
        api_key: impl Into<String>,
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        self.insert(api_key, tenant_id, user_id);
        self
    }

    pub fn insert(
        &mut self,
        api_key: impl Into<String>,
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
    ) {
        self.keys.insert(
            api_key.into(),
            KeyOwner {
                tenant_id: tenant_id.into(),
                user_id: user_id.into(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<(String, KeyOwner)> for StaticApiKeyStore {
    fn from_iter<I: IntoIterator<Item = (String, KeyOwner)>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ApiKeyStore for StaticApiKeyStore {
    async fn validate(&self, api_key: &str) -> ApiKeyValidation {
        match self.keys.get(api_key) {
            Some(owner) => ApiKeyValidation::valid(&owner.tenant_id, &owner.user_id),
            None => ApiKeyValidation::invalid(),
        }
    }
}
