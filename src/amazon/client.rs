use crate::amazon::SpApiError;
use crate::amazon::auth::{AccessTokenProvider, LwaCredentials};
use crate::amazon::config::{DEFINITIONS_VERSION, FEEDS_VERSION, MARKETPLACE_ID, ROOT};
use crate::catalog::{FeedService, ProductTypeDirectory};
use crate::http::build_client;
use crate::models::Candidate;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::path::Path;
use tracing::debug;
use urlencoding::encode;

/// Selling Partner API client covering product type definitions and feeds.
pub struct SpApiClient {
    http: Client,
    root: String,
    marketplace_id: String,
    tokens: AccessTokenProvider,
}

impl SpApiClient {
    pub fn from_env() -> Result<Self, SpApiError> {
        let credentials = LwaCredentials::from_env()?;
        Ok(Self::new(credentials, ROOT.as_str(), MARKETPLACE_ID.as_str()))
    }

    pub fn new(credentials: LwaCredentials, root: &str, marketplace_id: &str) -> Self {
        let http = build_client();
        Self {
            tokens: AccessTokenProvider::new(http.clone(), credentials),
            http,
            root: root.trim_end_matches('/').to_string(),
            marketplace_id: marketplace_id.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.root, path)
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, SpApiError> {
        let token = self.tokens.access_token().await?;
        Ok(request.header("x-amz-access-token", token))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SpApiError> {
        let response = self
            .authorized(request)
            .await?
            .send()
            .await
            .map_err(|err| SpApiError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SpApiError::Request(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| SpApiError::InvalidResponse(err.to_string()))
    }
}

#[async_trait]
impl ProductTypeDirectory for SpApiClient {
    async fn search_product_types(&self, keywords: &str) -> Result<Vec<Candidate>, SpApiError> {
        let url = self.url(&format!("/definitions/{DEFINITIONS_VERSION}/productTypes"));
        let request = self.http.get(url).query(&[
            ("keywords", keywords),
            ("marketplaceIds", self.marketplace_id.as_str()),
        ]);
        let payload: ProductTypeList = self.send_json(request).await?;
        Ok(payload
            .product_types
            .into_iter()
            .map(|item| Candidate::new(item.name, item.display_name))
            .collect())
    }

    async fn product_type_schema(
        &self,
        product_type: &str,
        requirements: &str,
        locale: &str,
    ) -> Result<Value, SpApiError> {
        let url = self.url(&format!(
            "/definitions/{DEFINITIONS_VERSION}/productTypes/{}",
            encode(product_type)
        ));
        let request = self.http.get(url).query(&[
            ("marketplaceIds", self.marketplace_id.as_str()),
            ("requirements", requirements),
            ("locale", locale),
        ]);
        let definition: ProductTypeDefinition = self.send_json(request).await?;

        // The definition only links to the schema; the link is pre-signed.
        let link = definition.schema.link;
        debug!(target = "listing.sp_api", product_type, verb = %link.verb, "schema_download");
        let response = self
            .http
            .get(&link.resource)
            .send()
            .await
            .map_err(|err| SpApiError::Request(err.to_string()))?;
        if !response.status().is_success() {
            return Err(SpApiError::Request(format!(
                "schema download HTTP {}",
                response.status()
            )));
        }
        response
            .json::<Value>()
            .await
            .map_err(|err| SpApiError::InvalidResponse(err.to_string()))
    }
}

#[async_trait]
impl FeedService for SpApiClient {
    async fn create_feed_document(
        &self,
        document: &Path,
        content_type: &str,
    ) -> Result<String, SpApiError> {
        let body = tokio::fs::read(document)
            .await
            .map_err(|err| SpApiError::Io(err.to_string()))?;

        let url = self.url(&format!("/feeds/{FEEDS_VERSION}/documents"));
        let request = self.http.post(url).json(&CreateDocumentRequest { content_type });
        let created: CreateDocumentResponse = self.send_json(request).await?;

        let upload = self
            .http
            .put(&created.url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|err| SpApiError::Request(err.to_string()))?;
        if !upload.status().is_success() {
            return Err(SpApiError::Request(format!(
                "document upload HTTP {}",
                upload.status()
            )));
        }
        Ok(created.feed_document_id)
    }

    async fn create_feed(&self, feed_type: &str, document_id: &str) -> Result<String, SpApiError> {
        let url = self.url(&format!("/feeds/{FEEDS_VERSION}/feeds"));
        let request = self.http.post(url).json(&CreateFeedRequest {
            feed_type,
            marketplace_ids: vec![self.marketplace_id.as_str()],
            input_feed_document_id: document_id,
        });
        let created: CreateFeedResponse = self.send_json(request).await?;
        Ok(created.feed_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductTypeList {
    #[serde(default)]
    product_types: Vec<ProductTypeItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductTypeItem {
    name: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct ProductTypeDefinition {
    schema: SchemaLink,
}

#[derive(Debug, Deserialize)]
struct SchemaLink {
    link: Link,
}

#[derive(Debug, Deserialize)]
struct Link {
    resource: String,
    #[serde(default)]
    verb: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDocumentRequest<'a> {
    content_type: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDocumentResponse {
    feed_document_id: String,
    url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateFeedRequest<'a> {
    feed_type: &'a str,
    marketplace_ids: Vec<&'a str>,
    input_feed_document_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateFeedResponse {
    feed_id: String,
}
