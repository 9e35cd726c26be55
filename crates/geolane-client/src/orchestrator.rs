//! Geocoder — answers queries from cache or through the rate-limited lane.

use std::sync::Arc;

use geolane_cache::ResponseCache;
use geolane_core::{fingerprint_scoped, Error, GeocoderConfig, Query, Response, Result};
use geolane_dispatch::Dispatcher;
use tracing::{debug, info, warn};

use crate::context::GeocoderContext;
use crate::transport::{HttpTransport, Transport, TransportRequest};
use crate::types::Endpoint;
use crate::url::build_url;

/// Top-level client that coordinates fingerprinting, caching, and dispatch.
pub struct Geocoder {
    config: GeocoderConfig,
    defaults: Query,
    user_agent: String,
    transport: Arc<dyn Transport>,
    context: GeocoderContext,
}

impl Geocoder {
    /// Geocoder over HTTP using the process-wide shared context.
    pub fn new(config: GeocoderConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> GeocoderBuilder {
        GeocoderBuilder::default()
    }

    pub fn config(&self) -> &GeocoderConfig {
        &self.config
    }

    pub fn context(&self) -> &GeocoderContext {
        &self.context
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.context.cache
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.context.dispatcher
    }

    /// URL for an endpoint on the configured host.
    pub fn url_for(&self, endpoint: Endpoint) -> String {
        build_url(&self.config.host, endpoint.path(), self.config.secure_transport)
    }

    /// The effective query: caller params, then configured defaults, then
    /// per-call overrides, later layers winning.
    pub fn effective_query(&self, query: &Query, overrides: Option<&Query>) -> Query {
        let mut merged = query.clone();
        merged.merge(&self.defaults);
        if let Some(overrides) = overrides {
            merged.merge(overrides);
        }
        merged
    }

    /// Look up details for OSM objects.
    pub async fn lookup(&self, query: &Query, overrides: Option<&Query>) -> Result<Response> {
        self.execute(Endpoint::Lookup, query, overrides).await
    }

    /// Forward geocoding.
    pub async fn search(&self, query: &Query, overrides: Option<&Query>) -> Result<Response> {
        self.execute(Endpoint::Search, query, overrides).await
    }

    /// Reverse geocoding.
    pub async fn reverse(&self, query: &Query, overrides: Option<&Query>) -> Result<Response> {
        self.execute(Endpoint::Reverse, query, overrides).await
    }

    /// Answer `query` against `endpoint`.
    ///
    /// Cache hits return immediately without entering the dispatch queue.
    /// Misses are sent through the dispatcher; successful responses are
    /// cached, failures are returned as-is and never cached.
    pub async fn execute(
        &self,
        endpoint: Endpoint,
        query: &Query,
        overrides: Option<&Query>,
    ) -> Result<Response> {
        let query = self.effective_query(query, overrides);
        let key = fingerprint_scoped(endpoint.path(), &query);

        if self.config.cache_enabled {
            if let Some(cached) = self.context.cache.get(&key) {
                debug!("{} cache hit {}", endpoint, key);
                return Ok(cached);
            }
        }

        let request = TransportRequest {
            url: self.url_for(endpoint),
            headers: vec![("User-Agent".to_string(), self.user_agent.clone())],
            params: query.to_params(),
        };
        debug!(
            "{} cache miss {}; queued behind {} request(s)",
            endpoint,
            key,
            self.context.dispatcher.pending()
        );

        let transport = self.transport.clone();
        let cache = self.config.cache_enabled.then(|| self.context.cache.clone());
        let ticket = self.context.dispatcher.submit(async move {
            let response = transport.perform(request).await?;
            if let Some(cache) = cache {
                cache.set(key, response.clone());
            }
            Ok::<_, Error>(response)
        });

        match ticket.await? {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!("{} request failed: {}", endpoint, e);
                Err(e)
            }
        }
    }
}

/// Builder for [`Geocoder`]. Anything left unset falls back to the HTTP
/// transport and the shared context.
#[derive(Default)]
pub struct GeocoderBuilder {
    config: GeocoderConfig,
    transport: Option<Arc<dyn Transport>>,
    cache: Option<Arc<ResponseCache>>,
    dispatcher: Option<Arc<Dispatcher>>,
}

impl GeocoderBuilder {
    pub fn config(mut self, config: GeocoderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn dispatcher(mut self, dispatcher: Arc<Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Use both halves of `context`.
    pub fn context(self, context: GeocoderContext) -> Self {
        self.cache(context.cache).dispatcher(context.dispatcher)
    }

    pub fn build(self) -> Result<Geocoder> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(self.config.request_timeout())?),
        };

        let context = match (self.cache, self.dispatcher) {
            (Some(cache), Some(dispatcher)) => GeocoderContext::new(cache, dispatcher),
            (cache, dispatcher) => {
                let shared = GeocoderContext::shared();
                GeocoderContext::new(
                    cache.unwrap_or(shared.cache),
                    dispatcher.unwrap_or(shared.dispatcher),
                )
            }
        };

        info!(
            "Geocoder initialized: host={}, cache_enabled={}, min_interval={:?}",
            self.config.host,
            self.config.cache_enabled,
            context.dispatcher.min_interval()
        );

        Ok(Geocoder {
            defaults: self.config.request_defaults(),
            user_agent: self.config.user_agent(),
            config: self.config,
            transport,
            context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use geolane_core::QueryValue;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;

    /// Records requests and replies with a JSON echo of the params.
    #[derive(Default)]
    struct EchoTransport {
        requests: Mutex<Vec<TransportRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl Transport for EchoTransport {
        async fn perform(&self, request: TransportRequest) -> Result<Response> {
            self.requests.lock().push(request.clone());
            if self.fail {
                return Err(Error::Status {
                    status: 500,
                    body: "down".into(),
                });
            }
            Ok(json!({ "url": request.url, "params": request.params }))
        }
    }

    fn geocoder(config: GeocoderConfig, transport: Arc<EchoTransport>) -> Geocoder {
        let context = GeocoderContext::isolated(&GeocoderConfig {
            min_interval_ms: 10,
            ..config.clone()
        });
        Geocoder::builder()
            .config(config)
            .transport(transport)
            .context(context)
            .build()
            .unwrap()
    }

    #[test]
    fn test_effective_query_precedence() {
        let transport = Arc::new(EchoTransport::default());
        let geo = geocoder(
            GeocoderConfig {
                default_limit: 7,
                ..Default::default()
            },
            transport,
        );

        let query = Query::new().with("q", "Lyon").with("limit", 1);
        let merged = geo.effective_query(&query, None);
        assert_eq!(merged.get("limit"), Some(&QueryValue::Int(7)));
        assert_eq!(merged.get("format"), Some(&QueryValue::from("json")));

        let overrides = Query::new().with("limit", 2).with("format", "geojson");
        let merged = geo.effective_query(&query, Some(&overrides));
        assert_eq!(merged.get("limit"), Some(&QueryValue::Int(2)));
        assert_eq!(merged.get("format"), Some(&QueryValue::from("geojson")));
        assert_eq!(merged.get("q"), Some(&QueryValue::from("Lyon")));
    }

    #[test]
    fn test_url_for_endpoints() {
        let geo = geocoder(
            GeocoderConfig {
                host: "geo.example.org/".into(),
                ..Default::default()
            },
            Arc::new(EchoTransport::default()),
        );
        assert_eq!(geo.url_for(Endpoint::Search), "https://geo.example.org/search");
        assert_eq!(geo.url_for(Endpoint::Lookup), "https://geo.example.org/lookup");
        assert_eq!(geo.url_for(Endpoint::Reverse), "https://geo.example.org/reverse");
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_shape() {
        let transport = Arc::new(EchoTransport::default());
        let geo = geocoder(
            GeocoderConfig {
                client_id: Some("Atlas".into()),
                ..Default::default()
            },
            transport.clone(),
        );

        geo.reverse(&Query::new().with("lat", 52.52).with("lon", 13.4), None)
            .await
            .unwrap();

        let requests = transport.requests.lock();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.url, "https://nominatim.openstreetmap.org/reverse");
        assert_eq!(
            request.headers,
            vec![("User-Agent".to_string(), "Atlas powered by Geolane.".to_string())]
        );
        assert_eq!(
            request.params,
            vec![
                ("lat".to_string(), "52.52".to_string()),
                ("lon".to_string(), "13.4".to_string()),
                ("format".to_string(), "json".to_string()),
                ("limit".to_string(), "3".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_skips_transport() {
        let transport = Arc::new(EchoTransport::default());
        let geo = geocoder(GeocoderConfig::default(), transport.clone());

        let a = Query::new().with("q", "Oslo").with("countrycodes", "no");
        let b = Query::new().with("countrycodes", "no").with("q", "Oslo");

        let first = geo.search(&a, None).await.unwrap();
        let second = geo.search(&b, None).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(transport.requests.lock().len(), 1);
        assert_eq!(geo.cache().stats().hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_disabled_always_dispatches() {
        let transport = Arc::new(EchoTransport::default());
        let geo = geocoder(
            GeocoderConfig {
                cache_enabled: false,
                ..Default::default()
            },
            transport.clone(),
        );

        let q = Query::new().with("q", "Oslo");
        geo.search(&q, None).await.unwrap();
        geo.search(&q, None).await.unwrap();
        assert_eq!(transport.requests.lock().len(), 2);
        assert!(geo.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_not_cached() {
        let transport = Arc::new(EchoTransport {
            fail: true,
            ..Default::default()
        });
        let geo = geocoder(GeocoderConfig::default(), transport.clone());

        let q = Query::new().with("q", "Nowhere");
        let err = geo.lookup(&q, None).await.unwrap_err();
        assert!(matches!(err, Error::Status { status: 500, .. }));
        assert!(geo.cache().is_empty());

        // Retried call reaches the transport again
        assert!(geo.lookup(&q, None).await.is_err());
        assert_eq!(transport.requests.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_endpoints_do_not_share_entries() {
        let transport = Arc::new(EchoTransport::default());
        let geo = geocoder(GeocoderConfig::default(), transport.clone());

        let q = Query::new().with("osm_ids", "R146656");
        let looked_up = geo.lookup(&q, None).await.unwrap();
        let searched = geo.search(&q, None).await.unwrap();
        assert_ne!(looked_up, searched);
        assert_eq!(transport.requests.lock().len(), 2);
        assert_eq!(geo.cache().len(), 2);
    }

    #[test]
    fn test_builder_defaults_to_shared_context() {
        let geo = Geocoder::builder()
            .transport(Arc::new(EchoTransport::default()))
            .build()
            .unwrap();
        let shared = GeocoderContext::shared();
        assert!(Arc::ptr_eq(geo.cache(), &shared.cache));
        assert!(Arc::ptr_eq(geo.dispatcher(), &shared.dispatcher));
    }

    #[test]
    fn test_builder_mixes_custom_and_shared() {
        let cache = Arc::new(ResponseCache::new(5, Duration::from_secs(60)));
        let geo = Geocoder::builder()
            .transport(Arc::new(EchoTransport::default()))
            .cache(cache.clone())
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(geo.cache(), &cache));
        assert!(Arc::ptr_eq(geo.dispatcher(), &GeocoderContext::shared().dispatcher));
    }
}
