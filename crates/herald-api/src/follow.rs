//! Handlers for follower endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/documents/:model/:res_id/followers` | wildcard rows included |
//! | `POST`   | `/documents/:model/:res_id/followers` | 409 when already following |
//! | `DELETE` | `/documents/:model/:res_id/followers/:partner_id` | 204 / 404 |
//! | `PUT`    | `/documents/:model/:res_id/followers/:partner_id/subtypes` | replace set |

use std::collections::BTreeSet;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use herald_core::{
  document::DocumentRef, store::SubscriptionStore, subscription::Subscription,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// JSON body accepted by `POST .../followers`.
#[derive(Debug, Deserialize)]
pub struct FollowBody {
  pub partner_id: Uuid,
  #[serde(default)]
  pub subtypes:   BTreeSet<String>,
}

/// `POST /documents/:model/:res_id/followers` — returns 201 + the
/// subscription, or 409 when the partner already follows the document.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Path((model, res_id)): Path<(String, i64)>,
  Json(body): Json<FollowBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SubscriptionStore,
  S::Error: Into<herald_core::Error>,
{
  let subscription = state
    .store
    .follow(DocumentRef::new(model, res_id), body.partner_id, body.subtypes)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(subscription)))
}

/// `GET /documents/:model/:res_id/followers`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Path((model, res_id)): Path<(String, i64)>,
) -> Result<Json<Vec<Subscription>>, ApiError>
where
  S: SubscriptionStore,
  S::Error: Into<herald_core::Error>,
{
  let followers = state
    .store
    .followers_of(&DocumentRef::new(model, res_id))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(followers))
}

/// `DELETE /documents/:model/:res_id/followers/:partner_id`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  Path((model, res_id, partner_id)): Path<(String, i64, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: SubscriptionStore,
  S::Error: Into<herald_core::Error>,
{
  let document = DocumentRef::new(model, res_id);
  let removed = state
    .store
    .unfollow(&document, partner_id)
    .await
    .map_err(ApiError::from_store)?;
  if removed {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!(
      "partner {partner_id} does not follow {document}"
    )))
  }
}

/// JSON body accepted by `PUT .../subtypes`.
#[derive(Debug, Deserialize)]
pub struct SubtypesBody {
  pub subtypes: BTreeSet<String>,
}

/// `PUT /documents/:model/:res_id/followers/:partner_id/subtypes` — replace
/// the followed subtype set.
pub async fn set_subtypes<S>(
  State(state): State<AppState<S>>,
  Path((model, res_id, partner_id)): Path<(String, i64, Uuid)>,
  Json(body): Json<SubtypesBody>,
) -> Result<Json<Subscription>, ApiError>
where
  S: SubscriptionStore,
  S::Error: Into<herald_core::Error>,
{
  let subscription = state
    .store
    .set_subtypes(&DocumentRef::new(model, res_id), partner_id, body.subtypes)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(subscription))
}
