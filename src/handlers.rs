use crate::catalog::{ActCatalog, CategoryFilter};
use crate::errors::AppError;
use crate::models::{
    Act, CatalogResponse, CompleteRequest, CompletionResponse, DonateResponse, GenerateForm,
    ProgressResponse, RandomActRequest, ShareResponse,
};
use crate::outbox::dispatch_completion;
use crate::progress::Completion;
use crate::share::{clipboard_text, share_intent_url};
use crate::state::AppState;
use crate::ui::{PageView, render_index};
use axum::{
    Form, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};
use url::form_urlencoded::byte_serialize;

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    pub missing: Option<String>,
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> Result<Html<String>, AppError> {
    let progress = current_progress(&state).await?;
    let current = state.current.lock().await.clone();
    let completed = match &current {
        Some(act) => state.progress.lock().await.is_completed(&act.id),
        None => false,
    };
    let catalog = state.catalog.lock().await;

    let view = PageView {
        progress: &progress,
        current: current.as_ref(),
        current_completed: completed,
        categories: catalog.categories(),
        catalog_error: catalog.last_error(),
        missing_category: query.missing.as_deref(),
    };
    Ok(Html(render_index(&view)))
}

pub async fn get_progress(State(state): State<AppState>) -> Result<Json<ProgressResponse>, AppError> {
    Ok(Json(current_progress(&state).await?))
}

pub async fn get_acts(State(state): State<AppState>) -> Json<CatalogResponse> {
    let catalog = state.catalog.lock().await;
    Json(CatalogResponse {
        count: catalog.len(),
        categories: catalog.categories(),
        error: catalog.last_error().map(str::to_string),
    })
}

pub async fn reload_acts(State(state): State<AppState>) -> Result<Json<CatalogResponse>, AppError> {
    state.refresh_catalog().await?;
    Ok(get_acts(State(state)).await)
}

pub async fn random_act(
    State(state): State<AppState>,
    Json(payload): Json<RandomActRequest>,
) -> Result<Json<Act>, AppError> {
    let filter = CategoryFilter::from(payload.category.as_deref());
    let act = draw(&state, &filter).await?;
    Ok(Json(act))
}

pub async fn get_current(State(state): State<AppState>) -> Result<Json<Act>, AppError> {
    let current = state.current.lock().await.clone();
    current
        .map(Json)
        .ok_or_else(|| AppError::not_found("no act drawn yet"))
}

pub async fn complete(
    State(state): State<AppState>,
    Json(payload): Json<CompleteRequest>,
) -> Result<Json<CompletionResponse>, AppError> {
    let response = apply_completion(&state, &payload.act_id).await?;
    Ok(Json(response))
}

pub async fn get_share(State(state): State<AppState>) -> Result<Json<ShareResponse>, AppError> {
    let act = current_act(&state).await?;
    Ok(Json(ShareResponse {
        share_url: share_intent_url(&act),
        clipboard_text: clipboard_text(&act),
    }))
}

pub async fn get_donate(State(state): State<AppState>) -> Json<DonateResponse> {
    Json(DonateResponse {
        url: state.donate_url.clone(),
    })
}

pub async fn generate_form(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Result<Redirect, AppError> {
    let filter = CategoryFilter::from(form.category.as_deref());
    match draw(&state, &filter).await {
        Ok(_) => Ok(Redirect::to("/")),
        Err(err) if err.status == StatusCode::NOT_FOUND => {
            let missing: String = byte_serialize(filter.as_str().as_bytes()).collect();
            Ok(Redirect::to(&format!("/?missing={missing}")))
        }
        // The page already shows the catalog error banner.
        Err(err) if err.status == StatusCode::SERVICE_UNAVAILABLE => Ok(Redirect::to("/")),
        Err(err) => Err(err),
    }
}

pub async fn complete_form(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let act = current_act(&state).await?;
    apply_completion(&state, &act.id).await?;
    Ok(Redirect::to("/"))
}

pub async fn reload_form(State(state): State<AppState>) -> Redirect {
    // A failure shows up as the banner on the page.
    let _ = state.refresh_catalog().await;
    Redirect::to("/")
}

pub async fn share_redirect(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let act = current_act(&state).await?;
    Ok(Redirect::to(&share_intent_url(&act)))
}

pub async fn donate_redirect(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.donate_url)
}

async fn draw(state: &AppState, filter: &CategoryFilter) -> Result<Act, AppError> {
    let catalog = state.catalog.lock().await;
    if catalog.is_empty() {
        let reason = catalog.last_error().unwrap_or("no acts loaded");
        return Err(AppError::unavailable(format!("act catalog is empty: {reason}")));
    }
    let picked = pick(&catalog, filter);
    drop(catalog);

    let Some(act) = picked else {
        debug!(category = filter.as_str(), "no acts in category");
        return Err(AppError::not_found(format!(
            "no acts in category '{}'",
            filter.as_str()
        )));
    };

    *state.current.lock().await = Some(act.clone());
    Ok(act)
}

fn pick(catalog: &ActCatalog, filter: &CategoryFilter) -> Option<Act> {
    catalog.pick_random(filter, &mut rand::thread_rng()).cloned()
}

async fn current_act(state: &AppState) -> Result<Act, AppError> {
    state
        .current
        .lock()
        .await
        .clone()
        .ok_or_else(|| AppError::not_found("no act drawn yet"))
}

async fn current_progress(state: &AppState) -> Result<ProgressResponse, AppError> {
    let date = today();
    let mut progress = state.progress.lock().await;
    progress.check_daily_reset(date).await?;
    Ok(progress.summary(date))
}

async fn apply_completion(state: &AppState, act_id: &str) -> Result<CompletionResponse, AppError> {
    let act_id = act_id.trim();
    if act_id.is_empty() {
        return Err(AppError::bad_request("act_id must not be empty"));
    }
    if state.catalog.lock().await.get(act_id).is_none() {
        return Err(AppError::not_found(format!("unknown act '{act_id}'")));
    }

    let date = today();
    let (outcome, summary) = {
        let mut progress = state.progress.lock().await;
        progress.check_daily_reset(date).await?;
        let outcome = progress.mark_complete(act_id).await?;
        (outcome, progress.summary(date))
    };

    let recorded = if let Completion::Recorded { completed_today } = outcome {
        info!(act_id, completed_today, "act completed");
        dispatch_completion(Arc::clone(&state.remote), Arc::clone(&state.outbox), act_id).await;
        true
    } else {
        debug!(act_id, "act was already completed");
        false
    };

    Ok(CompletionResponse {
        recorded,
        progress: summary,
    })
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
