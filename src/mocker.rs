//! Mock dispatch engine.
//!
//! [`Mocker`] owns the route registry, the global configuration and the hook
//! pipeline. [`Mocker::handle`] is the single entry point the host client
//! calls for every intercepted request.

use crate::config::{self, MockConfig, MockOptions, Mode};
use crate::error::MockError;
use crate::handler::SharedHandler;
use crate::hooks::{HookPipeline, RequestHook, ResponseHook};
use crate::matcher::find_match;
use crate::registry::{EndpointSource, Registry};
use crate::request::{merge_query, parse_body, MockRequest, MockResponse, OutgoingRequest};
use crate::url_parser::resolve_request_path;
use rand::Rng;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info};

/// Source of uniform draws in `[0, 1)` for random error injection.
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;
}

/// Thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Always returns the same draw. Useful to make error injection
/// deterministic in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn next_f64(&self) -> f64 {
        self.0
    }
}

/// Construction options for [`Mocker`].
pub struct MockerOptions {
    /// Global configuration, normalized against defaults
    pub config: Option<MockOptions>,
    /// Initial routes
    pub endpoints: Option<EndpointSource>,
    /// Diagnostics mode
    pub mode: Mode,
    pub random: Arc<dyn RandomSource>,
}

impl Default for MockerOptions {
    fn default() -> Self {
        Self {
            config: None,
            endpoints: None,
            mode: Mode::from_env(),
            random: Arc::new(ThreadRandom),
        }
    }
}

impl MockerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: MockOptions) -> Self {
        self.config = Some(config);
        self
    }

    pub fn endpoints(mut self, endpoints: impl Into<EndpointSource>) -> Self {
        self.endpoints = Some(endpoints.into());
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn random(mut self, random: impl RandomSource + 'static) -> Self {
        self.random = Arc::new(random);
        self
    }
}

/// Mock dispatch engine.
///
/// All methods take `&self`; a `Mocker` can be shared behind an `Arc` and
/// mutated between dispatches. A mutation made while a dispatch is in
/// flight may or may not be observed by it.
pub struct Mocker {
    config: RwLock<MockConfig>,
    registry: RwLock<Registry>,
    hooks: RwLock<HookPipeline>,
    random: Arc<dyn RandomSource>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

async fn sleep_ms(delay_ms: u64) {
    if delay_ms > 0 {
        debug!(delay_ms, "Applying delay");
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

impl Default for Mocker {
    fn default() -> Self {
        Self::new(MockerOptions::default())
    }
}

impl Mocker {
    /// Create a new mocker.
    pub fn new(options: MockerOptions) -> Self {
        let mut registry = Registry::new(options.mode);
        if let Some(endpoints) = options.endpoints {
            registry.load(endpoints);
        }

        info!(
            endpoints = registry.len(),
            mode = ?options.mode,
            "Mocker initialized"
        );

        Self {
            config: RwLock::new(config::normalize(options.config.as_ref())),
            registry: RwLock::new(registry),
            hooks: RwLock::new(HookPipeline::new()),
            random: options.random,
        }
    }

    pub fn mode(&self) -> Mode {
        read(&self.registry).mode()
    }

    /// Snapshot of the global configuration.
    pub fn config(&self) -> MockConfig {
        read(&self.config).clone()
    }

    /// Replace the global configuration with `options` normalized against
    /// the defaults.
    pub fn update_config(&self, options: MockOptions) {
        *write(&self.config) = config::normalize(Some(&options));
    }

    pub fn add_endpoint(&self, key: impl Into<String>, handler: SharedHandler) -> Option<SharedHandler> {
        write(&self.registry).add(key, handler)
    }

    pub fn add_endpoints(&self, endpoints: impl Into<EndpointSource>) {
        write(&self.registry).load(endpoints.into());
    }

    /// Clear the registry, then load `endpoints`.
    pub fn set_endpoints(&self, endpoints: impl Into<EndpointSource>) {
        let mut registry = write(&self.registry);
        registry.clear();
        registry.load(endpoints.into());
    }

    pub fn remove_endpoint(&self, key: &str) -> bool {
        write(&self.registry).remove(key)
    }

    pub fn clear_endpoints(&self) {
        write(&self.registry).clear();
    }

    /// Registered route keys in insertion order.
    pub fn list_endpoints(&self) -> Vec<String> {
        read(&self.registry).list()
    }

    pub fn add_request_hook(&self, hook: Arc<dyn RequestHook>) {
        write(&self.hooks).add_request_hook(hook);
    }

    pub fn add_response_hook(&self, hook: Arc<dyn ResponseHook>) {
        write(&self.hooks).add_response_hook(hook);
    }

    pub fn request_hook_count(&self) -> usize {
        read(&self.hooks).request_hook_count()
    }

    pub fn response_hook_count(&self) -> usize {
        read(&self.hooks).response_hook_count()
    }

    /// Dispatch one intercepted request.
    pub async fn handle(&self, request: OutgoingRequest) -> Result<MockResponse, MockError> {
        let config = config::merge(&self.config(), request.mock.as_ref());
        let url = request.url_or_empty().to_string();

        if !config.enabled {
            return Err(MockError::Disabled { url });
        }

        if let Some(error) = &config.error {
            sleep_ms(config.delay).await;
            return Err(MockError::Forced {
                status: error.status,
                message: error.message.clone(),
                details: error.details.clone(),
            });
        }

        if config.error_rate > 0.0 && self.random.next_f64() < config.error_rate {
            sleep_ms(config.delay).await;
            return Err(MockError::Random { status: 500 });
        }

        let method = request.method_or_default();
        let parsed = resolve_request_path(&url, request.base_url.as_deref());

        let matched = {
            let registry = read(&self.registry);
            find_match(registry.routes(), &method, &parsed.path)?
        };
        let Some(matched) = matched else {
            return Err(MockError::NotFound {
                method,
                path: parsed.path,
            });
        };

        let delay = match &config.get_delay {
            Some(get_delay) => get_delay.call(&matched.key, &request),
            None => config.delay,
        };
        sleep_ms(delay).await;

        let mut mock_request = MockRequest {
            params: matched.params.clone(),
            query: merge_query(&request.params, parsed.query),
            body: parse_body(request.data.as_ref()),
        };

        if config.enable_logging {
            info!(
                method = %method,
                url = %url,
                path = %parsed.path,
                endpoint = %matched.key,
                params = %serde_json::to_string(&matched.params).unwrap_or_default(),
                "Mock request"
            );
        }

        let hooks = read(&self.hooks).clone();
        hooks.run_request(&mut mock_request, &request).await?;

        let data = matched
            .handler
            .handle(&mock_request, &request)
            .await
            .map_err(|e| MockError::Handler {
                key: matched.key.clone(),
                message: e.to_string(),
            })?;

        let mut response = MockResponse::ok(data, config.headers.clone(), request.clone());
        hooks.run_response(&mut response, &request).await?;

        if config.enable_logging {
            info!(
                endpoint = %matched.key,
                data = %serde_json::to_string(&response.data).unwrap_or_default(),
                "Mock response"
            );
        }

        Ok(response)
    }
}
