//! Host platform context
//!
//! Replaces the ambient platform object of the dashboard bundle with an
//! explicitly injected context: the API base URL, an optional service
//! executor and the registry of widgets and sidebar links.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::config::Config;

/// Bundle id used to qualify registrations
pub const BUNDLE_ID: &str = "lca";

/// Errors raised through the host context
#[derive(Debug, Error)]
pub enum HostError {
    #[error("No service executor is attached to this host context")]
    NoExecutor,

    #[error("Service {app}/{service} failed: {message}")]
    Service {
        app: String,
        service: String,
        message: String,
    },
}

/// Grid layout hints for a widget; unset values leave the host default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LayoutConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_w: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_h: Option<u32>,
}

/// The views this bundle can mount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewKind {
    /// The product entry wizard
    ProductWizard,
    /// Product list
    ProductDashboard,
    /// LCA overview
    LcaDashboard,
}

impl std::fmt::Display for ViewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewKind::ProductWizard => write!(f, "product-wizard"),
            ViewKind::ProductDashboard => write!(f, "product-dashboard"),
            ViewKind::LcaDashboard => write!(f, "lca-dashboard"),
        }
    }
}

/// What kind of thing was registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationKind {
    Widget,
    Link,
}

impl std::fmt::Display for RegistrationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationKind::Widget => write!(f, "widget"),
            RegistrationKind::Link => write!(f, "link"),
        }
    }
}

/// A widget or sidebar link known to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    /// Id as given by the bundle (`LCA`, `lca-widget`, ...)
    pub id: String,
    /// Host-wide id: `<bundle>/widget/<id>` or `<bundle>/sidebarlink/<id>`, lowercase
    pub qualified_id: String,
    pub kind: RegistrationKind,
    pub view: ViewKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutConfig>,
}

/// Ordered registry of widgets and links
#[derive(Debug, Clone, Default)]
pub struct WidgetRegistry {
    entries: Vec<Registration>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_widget(&mut self, id: &str, view: ViewKind, layout: LayoutConfig) {
        self.insert(Registration {
            id: id.to_string(),
            qualified_id: qualify("widget", id),
            kind: RegistrationKind::Widget,
            view,
            layout: Some(layout),
        });
    }

    pub fn register_link(&mut self, id: &str, view: ViewKind) {
        self.insert(Registration {
            id: id.to_string(),
            qualified_id: qualify("sidebarlink", id),
            kind: RegistrationKind::Link,
            view,
            layout: None,
        });
    }

    // Same qualified id replaces in place, keeping the original position
    fn insert(&mut self, registration: Registration) {
        match self
            .entries
            .iter_mut()
            .find(|r| r.qualified_id == registration.qualified_id)
        {
            Some(existing) => {
                warn!(id = %registration.qualified_id, "replacing existing registration");
                *existing = registration;
            }
            None => {
                debug!(id = %registration.qualified_id, "registered {}", registration.kind);
                self.entries.push(registration);
            }
        }
    }

    pub fn get(&self, qualified_id: &str) -> Option<&Registration> {
        let qualified_id = qualified_id.to_lowercase();
        self.entries.iter().find(|r| r.qualified_id == qualified_id)
    }

    pub fn widgets(&self) -> impl Iterator<Item = &Registration> {
        self.entries
            .iter()
            .filter(|r| r.kind == RegistrationKind::Widget)
    }

    pub fn links(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter().filter(|r| r.kind == RegistrationKind::Link)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn qualify(kind: &str, id: &str) -> String {
    format!("{}/{}/{}", BUNDLE_ID, kind, id).to_lowercase()
}

/// Registrations of the LCA bundle.
/// `ProductDashboard` is registered twice; the second replaces the first.
pub fn default_registry() -> WidgetRegistry {
    let mut registry = WidgetRegistry::new();
    registry.register_widget("LCA", ViewKind::ProductWizard, LayoutConfig::default());
    registry.register_widget(
        "ProductDashboard",
        ViewKind::ProductDashboard,
        LayoutConfig::default(),
    );
    registry.register_widget(
        "ProductDashboard",
        ViewKind::ProductDashboard,
        LayoutConfig::default(),
    );
    registry.register_link("lca-dashboard", ViewKind::LcaDashboard);
    registry.register_link("product-dashboard", ViewKind::ProductDashboard);
    registry.register_link("lca-widget", ViewKind::ProductWizard);
    registry
}

/// Options for a host service call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Ask the host to decode the result as JSON
    pub json: bool,
}

/// Runs named services on the host platform
#[async_trait]
pub trait ServiceExecutor: Send + Sync {
    async fn execute_service(
        &self,
        app: &str,
        service: &str,
        params: serde_json::Value,
        options: ExecuteOptions,
    ) -> Result<serde_json::Value, HostError>;
}

/// Everything a view needs from its host
#[derive(Clone)]
pub struct HostContext {
    api_base_url: String,
    registry: WidgetRegistry,
    executor: Option<Arc<dyn ServiceExecutor>>,
}

impl std::fmt::Debug for HostContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostContext")
            .field("api_base_url", &self.api_base_url)
            .field("registry", &self.registry)
            .field("executor", &self.executor.is_some())
            .finish()
    }
}

impl HostContext {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            registry: default_registry(),
            executor: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_base_url())
    }

    pub fn with_executor(mut self, executor: Arc<dyn ServiceExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_registry(mut self, registry: WidgetRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn registry(&self) -> &WidgetRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut WidgetRegistry {
        &mut self.registry
    }

    pub async fn execute_service(
        &self,
        app: &str,
        service: &str,
        params: serde_json::Value,
        options: ExecuteOptions,
    ) -> Result<serde_json::Value, HostError> {
        let executor = self.executor.as_ref().ok_or(HostError::NoExecutor)?;
        debug!(app, service, "executing host service");
        executor.execute_service(app, service, params, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<(String, String, serde_json::Value, bool)>>,
    }

    #[async_trait]
    impl ServiceExecutor for RecordingExecutor {
        async fn execute_service(
            &self,
            app: &str,
            service: &str,
            params: serde_json::Value,
            options: ExecuteOptions,
        ) -> Result<serde_json::Value, HostError> {
            self.calls.lock().unwrap().push((
                app.to_string(),
                service.to_string(),
                params.clone(),
                options.json,
            ));
            if service == "Broken" {
                return Err(HostError::Service {
                    app: app.to_string(),
                    service: service.to_string(),
                    message: "boom".to_string(),
                });
            }
            Ok(serde_json::json!({"echo": params}))
        }
    }

    #[test]
    fn test_default_registry_collapses_duplicate_widget() {
        let registry = default_registry();
        assert_eq!(registry.widgets().count(), 2);
        assert_eq!(registry.links().count(), 3);
        assert!(registry.get("lca/widget/productdashboard").is_some());
        assert_eq!(
            registry.get("LCA/sidebarlink/lca-widget").unwrap().view,
            ViewKind::ProductWizard
        );
    }

    #[test]
    fn test_reregistration_replaces_in_place() {
        let mut registry = WidgetRegistry::new();
        registry.register_widget("A", ViewKind::LcaDashboard, LayoutConfig::default());
        registry.register_link("b", ViewKind::ProductDashboard);
        registry.register_widget(
            "a",
            ViewKind::ProductWizard,
            LayoutConfig {
                w: Some(12),
                ..Default::default()
            },
        );
        assert_eq!(registry.len(), 2);
        let first = registry.iter().next().unwrap();
        assert_eq!(first.id, "a");
        assert_eq!(first.view, ViewKind::ProductWizard);
        assert_eq!(first.layout.unwrap().w, Some(12));
    }

    #[tokio::test]
    async fn test_execute_service_without_executor() {
        let host = HostContext::new("http://localhost:8000");
        let err = host
            .execute_service("LCA", "GetProducts", serde_json::json!({}), ExecuteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::NoExecutor));
    }

    #[tokio::test]
    async fn test_execute_service_forwards_to_executor() {
        let executor = Arc::new(RecordingExecutor::default());
        let host = HostContext::new("http://localhost:8000").with_executor(executor.clone());

        let result = host
            .execute_service(
                "LCA",
                "GetProducts",
                serde_json::json!({"code": "P1"}),
                ExecuteOptions { json: true },
            )
            .await
            .unwrap();
        assert_eq!(result["echo"]["code"], "P1");

        let err = host
            .execute_service("LCA", "Broken", serde_json::Value::Null, ExecuteOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));

        let calls = executor.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].3);
    }
}
