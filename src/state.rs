//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::auth::{AdminAllowlist, IdentityVerifier, SessionStore};
use crate::blob::BlobStore;
use crate::config::AppConfig;
use crate::mailer::ContactRelay;
use crate::rate_limit::RateLimiter;
use crate::seo::SiteInfo;
use crate::store::DocumentStore;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn DocumentStore>,
    /// `None` inlines uploads as data URLs.
    pub blobs: Option<Arc<dyn BlobStore>>,
    pub sessions: SessionStore,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub allowlist: AdminAllowlist,
    pub contact_limiter: RateLimiter,
    pub auth_limiter: RateLimiter,
    /// `None` when EmailJS is not configured; the contact form then answers 503.
    pub relay: Option<Arc<dyn ContactRelay>>,
}

impl AppState {
    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn blobs(&self) -> Option<&dyn BlobStore> {
        self.blobs.as_deref()
    }

    pub fn site(&self) -> SiteInfo {
        SiteInfo::new(&self.config.site_name, &self.config.site_url)
    }
}
