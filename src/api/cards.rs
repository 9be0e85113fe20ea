use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{middleware::auth::AuthenticatedUser, AppState};
use crate::error::Result;
use crate::models::CardView;
use crate::services::card_service::{self, CardRequest, ProcessingResult};

async fn register_card(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CardRequest>,
) -> Result<StatusCode> {
    card_service::register_card(&state.repo, &state.codec, request, &user.username).await?;

    Ok(StatusCode::CREATED)
}

/// Bulk upload: the request body is the raw batch file.
async fn upload_card_file(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Bytes,
) -> Result<Json<ProcessingResult>> {
    let result =
        card_service::ingest_batch_file(&state.repo, &state.codec, &body, &user.username).await?;

    Ok(Json(result))
}

async fn get_cards_by_user(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<CardView>>> {
    let cards = card_service::get_cards_by_owner(&state.repo, &state.codec, user_id).await?;

    Ok(Json(cards))
}

async fn get_card_by_id(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(card_id): Path<Uuid>,
) -> Result<Json<CardView>> {
    let card = card_service::get_card_by_id(&state.repo, &state.codec, card_id).await?;

    Ok(Json(card))
}

#[derive(Debug, Deserialize)]
struct NumberQuery {
    number: String,
}

async fn get_card_by_number(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<NumberQuery>,
) -> Result<Json<CardView>> {
    let card = card_service::find_by_card_number(
        &state.repo,
        &state.codec,
        &query.number,
        &user.username,
    )
    .await?;

    Ok(Json(card))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cards", post(register_card))
        .route("/api/cards/upload", post(upload_card_file))
        .route("/api/cards/by-number", get(get_card_by_number))
        .route("/api/cards/user/:user_id", get(get_cards_by_user))
        .route("/api/cards/:card_id", get(get_card_by_id))
}
