// Startup-built registry of versioned API modules and the handler resolver

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::access::{effective_level, AccessLevel};
use crate::api::reply::HandlerResult;
use crate::dispatch::context::{RequestContext, RouteParams};
use crate::error::DispatchError;

/// One API method. Implemented for any `async fn(RequestContext, Value) -> HandlerResult`.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, ctx: RequestContext, body: Value) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(RequestContext, Value) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn call(&self, ctx: RequestContext, body: Value) -> HandlerResult {
        (self)(ctx, body).await
    }
}

/// A handler plus the minimum access level it was registered with
#[derive(Clone)]
pub struct HandlerDescriptor {
    handler: Arc<dyn Handler>,
    access_level: AccessLevel,
}

impl HandlerDescriptor {
    pub fn handler(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.handler)
    }

    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }
}

impl std::fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("access_level", &self.access_level)
            .finish_non_exhaustive()
    }
}

/// Annotate a handler with its required access level
pub fn wrap_method<H: Handler + 'static>(
    handler: H,
    access_level: AccessLevel,
) -> HandlerDescriptor {
    HandlerDescriptor {
        handler: Arc::new(handler),
        access_level,
    }
}

/// Named collection of methods with a module-wide access floor
#[derive(Debug, Clone)]
pub struct ApiModule {
    name: String,
    access_level: AccessLevel,
    methods: HashMap<String, HandlerDescriptor>,
    // names registered more than once; the registry refuses such modules
    duplicates: Vec<String>,
}

impl ApiModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            access_level: AccessLevel::All,
            methods: HashMap::new(),
            duplicates: Vec::new(),
        }
    }

    pub fn with_access_level(mut self, access_level: AccessLevel) -> Self {
        self.access_level = access_level;
        self
    }

    /// Register a method open to the module's own level
    pub fn method<H: Handler + 'static>(self, name: &str, handler: H) -> Self {
        self.register(name, wrap_method(handler, AccessLevel::All))
    }

    /// Register a method with its own minimum access level
    pub fn restricted_method<H: Handler + 'static>(
        self,
        name: &str,
        access_level: AccessLevel,
        handler: H,
    ) -> Self {
        self.register(name, wrap_method(handler, access_level))
    }

    /// Add a method. The first registration of a name is kept; repeats are
    /// reported by `ApiRegistry::register`.
    pub fn register(mut self, name: &str, descriptor: HandlerDescriptor) -> Self {
        if self.methods.contains_key(name) {
            tracing::warn!("Method '{}' registered twice on module '{}'", name, self.name);
            self.duplicates.push(name.to_string());
        } else {
            self.methods.insert(name.to_string(), descriptor);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    pub fn get(&self, method_name: &str) -> Option<&HandlerDescriptor> {
        self.methods.get(method_name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Module '{api_name}' already registered for version {version}")]
    DuplicateModule { version: String, api_name: String },

    #[error("Invalid module key: version '{version}', name '{api_name}'")]
    InvalidKey { version: String, api_name: String },

    #[error("Method '{method}' registered twice on module '{api_name}' for version {version}")]
    DuplicateMethod {
        version: String,
        api_name: String,
        method: String,
    },
}

/// Handler chosen for a request. Levels are returned unmerged so the
/// dispatcher applies the combination policy.
#[derive(Clone)]
pub struct ResolvedMethod {
    pub api_name: String,
    pub method_name: String,
    pub version: String,
    pub handler: Arc<dyn Handler>,
    pub access_level: AccessLevel,
    pub api_access_level: AccessLevel,
}

impl std::fmt::Debug for ResolvedMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedMethod")
            .field("api_name", &self.api_name)
            .field("method_name", &self.method_name)
            .field("version", &self.version)
            .field("access_level", &self.access_level)
            .field("api_access_level", &self.api_access_level)
            .finish_non_exhaustive()
    }
}

/// Row in the registry listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSummary {
    pub version: String,
    pub api_name: String,
    pub method_name: String,
    pub api_access_level: AccessLevel,
    pub access_level: AccessLevel,
    pub effective_level: AccessLevel,
}

/// (version, api name) -> module, filled once at startup and read-only afterwards
#[derive(Debug, Default)]
pub struct ApiRegistry {
    modules: HashMap<(String, String), Arc<ApiModule>>,
}

impl ApiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, version: &str, module: ApiModule) -> Result<(), RegistryError> {
        if version.is_empty() || module.name().is_empty() {
            return Err(RegistryError::InvalidKey {
                version: version.to_string(),
                api_name: module.name().to_string(),
            });
        }

        if let Some(method) = module.duplicates.first() {
            return Err(RegistryError::DuplicateMethod {
                version: version.to_string(),
                api_name: module.name().to_string(),
                method: method.clone(),
            });
        }

        let key = (version.to_string(), module.name().to_string());
        if self.modules.contains_key(&key) {
            return Err(RegistryError::DuplicateModule {
                version: key.0,
                api_name: key.1,
            });
        }

        tracing::debug!(
            "Registered api '{}' for version {} ({} methods, {})",
            module.name(),
            version,
            module.methods.len(),
            module.access_level()
        );
        self.modules.insert(key, Arc::new(module));
        Ok(())
    }

    pub fn module(&self, version: &str, api_name: &str) -> Option<Arc<ApiModule>> {
        self.modules
            .get(&(version.to_string(), api_name.to_string()))
            .cloned()
    }

    /// Locate the handler for `params`. `url` is only used in error messages.
    pub fn resolve(
        &self,
        params: &RouteParams,
        url: &str,
    ) -> Result<ResolvedMethod, DispatchError> {
        let api = self
            .module(&params.version, &params.api_name)
            .ok_or_else(|| DispatchError::ApiNotFound { url: url.to_string() })?;

        let method_name = compose_method_name(&params.action, params.kind.as_deref());

        let (method_name, descriptor) = match api.get(&method_name) {
            Some(descriptor) => (method_name, descriptor),
            None => {
                // snake_case addressing of lowerCamelCase methods
                let camel = snake_to_lower_camel(&method_name);
                match api.get(&camel) {
                    Some(descriptor) if camel != method_name => (camel, descriptor),
                    _ => {
                        return Err(DispatchError::MethodNotFound {
                            method: method_name,
                            url: url.to_string(),
                        })
                    }
                }
            }
        };

        Ok(ResolvedMethod {
            api_name: params.api_name.clone(),
            method_name,
            version: params.version.clone(),
            handler: descriptor.handler(),
            access_level: descriptor.access_level(),
            api_access_level: api.access_level(),
        })
    }

    /// All registered methods, sorted by version, api and method name
    pub fn describe(&self) -> Vec<MethodSummary> {
        let mut rows: Vec<MethodSummary> = self
            .modules
            .iter()
            .flat_map(|((version, api_name), module)| {
                module.methods.iter().map(move |(method_name, descriptor)| MethodSummary {
                    version: version.clone(),
                    api_name: api_name.clone(),
                    method_name: method_name.clone(),
                    api_access_level: module.access_level(),
                    access_level: descriptor.access_level(),
                    effective_level: effective_level(
                        module.access_level(),
                        descriptor.access_level(),
                    ),
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            (&a.version, &a.api_name, &a.method_name).cmp(&(
                &b.version,
                &b.api_name,
                &b.method_name,
            ))
        });
        rows
    }
}

/// `action` followed by `kind` with its first character uppercased
pub fn compose_method_name(action: &str, kind: Option<&str>) -> String {
    let mut name = action.to_string();

    if let Some(kind) = kind {
        let mut chars = kind.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
    }

    name
}

/// `list_all_forests` -> `listAllForests`
pub fn snake_to_lower_camel(name: &str) -> String {
    let mut parts = name.split('_').filter(|part| !part.is_empty());
    let mut out = parts.next().unwrap_or_default().to_string();

    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }

    out
}
