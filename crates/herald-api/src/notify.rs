//! Handler for `POST /notify` — the fan-out entry point.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use herald_core::{
  mail::Envelope, message::Message, notification::Notification,
};
use herald_notify::{NotifyContext, NotifyStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

fn default_true() -> bool { true }

/// JSON body accepted by `POST /notify`.
#[derive(Debug, Deserialize)]
pub struct NotifyBody {
  pub message:           Message,
  /// Candidate recipients, in notification order.
  pub recipients:        Vec<Uuid>,
  #[serde(default)]
  pub force_send:        bool,
  #[serde(default = "default_true")]
  pub include_signature: bool,
  #[serde(default)]
  pub suppress_email:    bool,
  pub auto_delete:       Option<bool>,
  pub server_id:         Option<String>,
}

/// What the fan-out call did, serialised back to the caller.
#[derive(Debug, Serialize)]
pub struct NotifyResponse {
  pub created:   Vec<Notification>,
  pub envelopes: Vec<Envelope>,
}

/// `POST /notify` — reconcile notification state for the message and email
/// the eligible subset of newly notified partners.
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NotifyBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: NotifyStore,
  <S as NotifyStore>::Err: Into<herald_core::Error>,
{
  let ctx = NotifyContext {
    suppress_email: body.suppress_email,
    auto_delete: body.auto_delete,
    server_id: body.server_id,
    ..NotifyContext::default()
  };

  let outcome = state
    .notifier
    .notify(
      &body.message,
      &body.recipients,
      body.force_send,
      body.include_signature,
      &ctx,
    )
    .await
    .map_err(ApiError::from_store)?;

  Ok((StatusCode::OK, Json(NotifyResponse {
    created:   outcome.created,
    envelopes: outcome.envelopes,
  })))
}
