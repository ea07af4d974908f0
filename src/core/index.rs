//! LlamaCloud pipeline client: context retrieval and document management.
//!
//! Every request carries the API key as a bearer token and the organization
//! id as a query parameter. Document routes are scoped to the configured
//! pipeline.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::core::config::Config;
use crate::core::error::{GatewayError, Service};
use crate::core::http;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the LlamaCloud pipeline API.
pub struct IndexClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    org_id: String,
    pipeline_id: String,
}

/// One retrieval hit: source document, matched text, relevance score.
#[derive(Debug, Clone)]
pub struct SourceNode {
    pub file_name: String,
    pub text: String,
    pub score: Option<f64>,
}

/// A document registered in the pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineFile {
    #[serde(default)]
    pub id: String,
    #[serde(default = "unknown_file_name")]
    pub name: String,
    pub file_size: Option<u64>,
    pub last_modified_at: Option<String>,
}

fn unknown_file_name() -> String {
    "Unknown".to_string()
}

#[derive(Deserialize)]
struct FileListResponse {
    #[serde(default)]
    files: Vec<PipelineFile>,
}

#[derive(Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    retrieval_nodes: Vec<RetrievedNode>,
}

#[derive(Deserialize)]
struct RetrievedNode {
    node: NodeContent,
    #[serde(default)]
    score: Option<f64>,
}

#[derive(Deserialize)]
struct NodeContent {
    #[serde(default)]
    text: String,
    #[serde(default)]
    metadata: serde_json::Value,
}

impl From<RetrievedNode> for SourceNode {
    fn from(hit: RetrievedNode) -> Self {
        let file_name = hit
            .node
            .metadata
            .get("file_name")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
            .to_string();
        SourceNode {
            file_name,
            text: hit.node.text,
            score: hit.score,
        }
    }
}

#[derive(Deserialize)]
struct UploadedFile {
    id: String,
}

impl IndexClient {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");
        IndexClient {
            http,
            base_url: config.llama_base_url.clone(),
            api_key: config.credentials.llama_api_key.clone(),
            org_id: config.credentials.llama_org_id.clone(),
            pipeline_id: config.credentials.pipeline_id.clone(),
        }
    }

    fn authed(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .query(&[("organization_id", self.org_id.as_str())])
    }

    fn pipeline_path(&self, rest: &str) -> String {
        format!("/pipelines/{}{}", self.pipeline_id, rest)
    }

    /// Retrieve the best-matching document chunks for a query.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SourceNode>, GatewayError> {
        log::debug!("retrieving context for query ({} chars)", query.len());
        let request = self
            .authed(reqwest::Method::POST, &self.pipeline_path("/retrieve"))
            .json(&json!({ "query": query }));
        let response: RetrieveResponse = http::send_json(Service::Index, request).await?;
        Ok(response
            .retrieval_nodes
            .into_iter()
            .map(SourceNode::from)
            .collect())
    }

    /// List the documents registered in the pipeline.
    pub async fn list_files(&self) -> Result<Vec<PipelineFile>, GatewayError> {
        let request = self.authed(reqwest::Method::GET, &self.pipeline_path("/files2"));
        let response: FileListResponse = http::send_json(Service::Index, request).await?;
        Ok(response.files)
    }

    /// Remove a document from the pipeline. 200 and 204 both mean deleted.
    pub async fn delete_file(&self, file_id: &str) -> Result<(), GatewayError> {
        log::info!("deleting file {}", file_id);
        let request = self.authed(
            reqwest::Method::DELETE,
            &self.pipeline_path(&format!("/files/{}", file_id)),
        );
        http::send_ok(Service::Index, request).await
    }

    /// Trigger re-ingestion of the pipeline's documents.
    pub async fn sync(&self) -> Result<(), GatewayError> {
        let request = self.authed(reqwest::Method::POST, &self.pipeline_path("/sync"));
        http::send_ok(Service::Index, request).await
    }

    /// Upload a local file, then register it with the pipeline. Returns the
    /// file id assigned by the service.
    pub async fn upload_file(&self, path: &Path) -> Result<String, GatewayError> {
        let bytes = std::fs::read(path).map_err(|source| GatewayError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        log::info!("uploading {} ({} bytes)", name, bytes.len());

        let part = reqwest::multipart::Part::bytes(bytes).file_name(name);
        let form = reqwest::multipart::Form::new().part("upload_file", part);
        let request = self.authed(reqwest::Method::POST, "/files").multipart(form);
        let uploaded: UploadedFile = http::send_json(Service::Index, request).await?;

        // Registration makes the pipeline pick the file up on its next sync.
        let request = self
            .authed(reqwest::Method::PUT, &self.pipeline_path("/files"))
            .json(&json!([{ "file_id": uploaded.id }]));
        http::send_ok(Service::Index, request).await?;
        Ok(uploaded.id)
    }
}

/// Filter pipeline files by case-insensitive match on name or id.
/// Returns all files when the query is empty.
pub fn filter_files<'a>(files: &'a [PipelineFile], query: &str) -> Vec<&'a PipelineFile> {
    if query.is_empty() {
        return files.iter().collect();
    }
    let q = query.to_lowercase();
    files
        .iter()
        .filter(|f| f.name.to_lowercase().contains(&q) || f.id.to_lowercase().contains(&q))
        .collect()
}
