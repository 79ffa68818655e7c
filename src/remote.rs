use crate::config::RemoteConfig;
use crate::errors::{FetchError, WriteError};
use crate::models::Act;
use async_trait::async_trait;
use rand::{Rng, distributions::Alphanumeric};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::{debug, warn};

pub const ACTS_COLLECTION: &str = "acts";
pub const COMPLETED_COLLECTION: &str = "completedActs";

const PAGE_SIZE: u32 = 300;
const AUTO_ID_LEN: usize = 20;

/// The remote document store holding the act catalog and completion events.
#[async_trait]
pub trait ActStore: Send + Sync {
    async fn fetch_acts(&self) -> Result<Vec<Act>, FetchError>;
    async fn record_completion(&self, act_id: &str) -> Result<(), WriteError>;
}

/// Talks to the Firestore REST API.
pub struct FirestoreClient {
    http: Client,
    base_url: String,
    project_id: String,
    api_key: Option<String>,
}

impl FirestoreClient {
    pub fn new(config: &RemoteConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn database_path(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    fn documents_url(&self) -> String {
        format!("{}/v1/{}", self.base_url, self.database_path())
    }

    fn auth_query(&self) -> Vec<(&'static str, String)> {
        self.api_key
            .iter()
            .map(|key| ("key", key.clone()))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: HashMap<String, FieldValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldValue {
    string_value: Option<String>,
}

impl Document {
    fn string_field(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|value| value.string_value.as_deref())
    }

    fn into_act(self) -> Option<Act> {
        let id = self.name.rsplit('/').next().unwrap_or_default().to_string();
        if id.is_empty() {
            warn!("skipping act document with empty name");
            return None;
        }
        let Some(text) = self.string_field("act").map(str::to_string) else {
            warn!("skipping act document {id} without text");
            return None;
        };
        Some(Act {
            act: text,
            category: self.string_field("category").unwrap_or_default().to_string(),
            difficulty: self.string_field("difficulty").unwrap_or_default().to_string(),
            id,
        })
    }
}

#[async_trait]
impl ActStore for FirestoreClient {
    async fn fetch_acts(&self) -> Result<Vec<Act>, FetchError> {
        let url = format!("{}/{ACTS_COLLECTION}", self.documents_url());
        let mut acts = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = self.auth_query();
            query.push(("pageSize", PAGE_SIZE.to_string()));
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let response = self.http.get(&url).query(&query).send().await?;
            let response = check_status(response).await.map_err(|(status, body)| {
                FetchError::Status { status, body }
            })?;
            let page: ListDocumentsResponse = response
                .json()
                .await
                .map_err(|err| FetchError::Decode(err.to_string()))?;

            debug!(documents = page.documents.len(), "fetched act page");
            acts.extend(page.documents.into_iter().filter_map(Document::into_act));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(acts)
    }

    async fn record_completion(&self, act_id: &str) -> Result<(), WriteError> {
        let url = format!("{}:commit", self.documents_url());
        let body = completion_commit(&self.database_path(), &auto_id(), act_id);

        let response = self
            .http
            .post(&url)
            .query(&self.auth_query())
            .json(&body)
            .send()
            .await?;
        check_status(response)
            .await
            .map_err(|(status, body)| WriteError::Status { status, body })?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, (u16, String)> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err((status.as_u16(), body))
}

fn completion_commit(database_path: &str, doc_id: &str, act_id: &str) -> serde_json::Value {
    json!({
        "writes": [{
            "update": {
                "name": format!("{database_path}/{COMPLETED_COLLECTION}/{doc_id}"),
                "fields": { "actId": { "stringValue": act_id } }
            },
            "updateTransforms": [{
                "fieldPath": "timestamp",
                "setToServerValue": "REQUEST_TIME"
            }],
            "currentDocument": { "exists": false }
        }]
    })
}

fn auto_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}
