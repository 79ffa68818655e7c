use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single suggested act of kindness, as stored in the remote `acts` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Act {
    pub id: String,
    pub act: String,
    pub category: String,
    pub difficulty: String,
}

/// Everything the tracker remembers between visits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressState {
    pub completed: BTreeSet<String>,
    pub streak: u32,
    pub completed_today: u32,
    pub last_reset: Option<NaiveDate>,
    pub last_active: Option<NaiveDate>,
}

/// Shape of the main progress record in local storage.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProgressRecord {
    #[serde(default)]
    pub completed: Vec<String>,
    #[serde(default)]
    pub streak: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingCompletion {
    pub act_id: String,
    pub queued_at: String,
}

#[derive(Debug, Deserialize)]
pub struct RandomActRequest {
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub act_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub date: String,
    pub streak: u32,
    pub completed_today: u32,
    pub completed_total: usize,
    pub daily_goal: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub recorded: bool,
    pub progress: ProgressResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub count: usize,
    pub categories: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareResponse {
    pub share_url: String,
    pub clipboard_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DonateResponse {
    pub url: String,
}
