//! Handlers for `/partners` endpoints.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use herald_core::partner::{EmailPreference, NewPartner, Partner};
use herald_notify::NotifyStore;
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// JSON body accepted by `POST /partners`.
#[derive(Debug, Deserialize)]
pub struct NewPartnerBody {
  pub name:             String,
  pub email:            Option<String>,
  #[serde(default)]
  pub email_preference: EmailPreference,
  pub signature:        Option<String>,
}

/// `POST /partners` — returns 201 + the stored [`Partner`].
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewPartnerBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: NotifyStore,
  <S as NotifyStore>::Err: Into<herald_core::Error>,
{
  let partner = state
    .store
    .add_partner(NewPartner {
      name:             body.name,
      email:            body.email,
      email_preference: body.email_preference,
      signature:        body.signature,
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(partner)))
}

/// `GET /partners/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Partner>, ApiError>
where
  S: NotifyStore,
  <S as NotifyStore>::Err: Into<herald_core::Error>,
{
  let partner = state
    .store
    .partner(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("partner {id} not found")))?;
  Ok(Json(partner))
}
