//! HTTP implementation of [`LcaService`] on top of `reqwest`

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::{
    materials_from_wire, processes_from_wire, BomClassificationRequest, CategorySuggestion,
    LcaService, MaterialProcesses, ProcessClassificationRequest, ProductClassificationRequest,
    ProductPayload, RawMaterial, RawMaterialProcesses, RemoteProduct, ServiceError,
};
use crate::core::categorize::CategoryTaxonomy;
use crate::core::host::HostContext;
use crate::entities::material::MaterialLine;

/// Talks to the LCA API rooted at `base_url`
#[derive(Debug, Clone)]
pub struct HttpLcaService {
    client: Client,
    base_url: String,
}

impl HttpLcaService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build from the injected host context
    pub fn from_host(host: &HostContext) -> Self {
        Self::new(host.api_base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/{}", self.base_url, endpoint)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str) -> Result<T, ServiceError> {
        let url = self.url(endpoint);
        debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|source| ServiceError::Transport {
                url: url.clone(),
                source,
            })?;
        Self::decode(endpoint, url, response).await
    }

    async fn post_json<B, T>(&self, endpoint: &'static str, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(endpoint);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| ServiceError::Transport {
                url: url.clone(),
                source,
            })?;
        Self::decode(endpoint, url, response).await
    }

    async fn decode<T: DeserializeOwned>(
        endpoint: &'static str,
        url: String,
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ServiceError::Transport {
                url: url.clone(),
                source,
            })?;

        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "service returned an error status");
            return Err(ServiceError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ServiceError::InvalidResponse {
            endpoint,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl LcaService for HttpLcaService {
    async fn classify_bom(
        &self,
        request: &BomClassificationRequest,
    ) -> Result<Vec<MaterialLine>, ServiceError> {
        let raw: Vec<RawMaterial> = self.post_json("classify-bom", request).await?;
        materials_from_wire(raw)
    }

    async fn product_categories(&self) -> Result<CategoryTaxonomy, ServiceError> {
        self.get_json("productCategories").await
    }

    async fn classify_product(
        &self,
        request: &ProductClassificationRequest,
    ) -> Result<CategorySuggestion, ServiceError> {
        self.post_json("classify-product", request).await
    }

    async fn classify_processes(
        &self,
        request: &ProcessClassificationRequest,
    ) -> Result<Vec<MaterialProcesses>, ServiceError> {
        let raw: Vec<RawMaterialProcesses> = self
            .post_json("classify-manufacturing-process", request)
            .await?;
        processes_from_wire(raw)
    }

    async fn submit_product(
        &self,
        payload: &ProductPayload,
    ) -> Result<serde_json::Value, ServiceError> {
        self.post_json("products", payload).await
    }

    async fn list_products(&self) -> Result<Vec<RemoteProduct>, ServiceError> {
        self.get_json("products").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let service = HttpLcaService::new("http://localhost:8000/");
        assert_eq!(service.base_url(), "http://localhost:8000");
        assert_eq!(
            service.url("classify-bom"),
            "http://localhost:8000/api/classify-bom"
        );
    }
}
