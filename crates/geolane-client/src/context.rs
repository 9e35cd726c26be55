//! Cache + dispatcher pairs that geocoders share.

use std::sync::Arc;

use geolane_cache::ResponseCache;
use geolane_core::GeocoderConfig;
use geolane_dispatch::Dispatcher;
use once_cell::sync::Lazy;

/// Process-wide defaults: one cache and one rate-limited lane for every
/// geocoder built without an explicit context.
static SHARED: Lazy<GeocoderContext> = Lazy::new(|| {
    GeocoderContext::new(
        Arc::new(ResponseCache::default_cache()),
        Arc::new(Dispatcher::default()),
    )
});

/// The cache and dispatcher a [`crate::Geocoder`] works against.
///
/// Geocoders holding clones of the same context share one cache and one
/// global rate limit.
#[derive(Clone)]
pub struct GeocoderContext {
    pub cache: Arc<ResponseCache>,
    pub dispatcher: Arc<Dispatcher>,
}

impl GeocoderContext {
    pub fn new(cache: Arc<ResponseCache>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { cache, dispatcher }
    }

    /// The process-wide shared context.
    pub fn shared() -> Self {
        (*SHARED).clone()
    }

    /// A fresh context sized from `config`, sharing nothing.
    pub fn isolated(config: &GeocoderConfig) -> Self {
        Self::new(
            Arc::new(ResponseCache::new(
                config.cache_max_entries,
                config.cache_max_age(),
            )),
            Arc::new(Dispatcher::new(config.min_interval())),
        )
    }

    /// Drop every cached response.
    pub fn reset(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_shared_is_shared() {
        let a = GeocoderContext::shared();
        let b = GeocoderContext::shared();
        assert!(Arc::ptr_eq(&a.cache, &b.cache));
        assert!(Arc::ptr_eq(&a.dispatcher, &b.dispatcher));
        assert_eq!(a.dispatcher.min_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_isolated_uses_config() {
        let config = GeocoderConfig {
            cache_max_entries: 2,
            cache_max_age_secs: 3600,
            min_interval_ms: 250,
            ..Default::default()
        };
        let ctx = GeocoderContext::isolated(&config);
        assert!(!Arc::ptr_eq(&ctx.cache, &GeocoderContext::shared().cache));
        assert_eq!(ctx.cache.max_entries(), 2);
        assert_eq!(ctx.cache.max_age(), Duration::from_secs(3600));
        assert_eq!(ctx.dispatcher.min_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_reset_clears_cache() {
        let ctx = GeocoderContext::isolated(&GeocoderConfig::default());
        let key = geolane_core::fingerprint(&geolane_core::Query::new().with("q", "x"));
        ctx.cache.set(key, serde_json::json!([]));
        ctx.reset();
        assert!(ctx.cache.is_empty());
    }
}
