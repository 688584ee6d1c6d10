//! JSON REST API for Herald.
//!
//! Exposes an axum [`Router`] backed by any store implementing the
//! `herald-core` ports. Auth, TLS, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", herald_api::api_router(state))
//! ```

pub mod error;
pub mod follow;
pub mod inbox;
pub mod notify;
pub mod partners;


use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post, put},
};
use herald_core::store::SubscriptionStore;
use herald_notify::{Notifier, NotifyStore, footer::Branding};
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8787 }

/// Server configuration, deserialised from `config.toml` plus `HERALD_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  pub store_path:       PathBuf,
  #[serde(default)]
  pub branding:         Branding,
  /// Document models with group/broadcast semantics (no personal signature
  /// in outbound bodies).
  #[serde(default)]
  pub broadcast_models: Vec<String>,
}

// ─── State ───────────────────────────────────────────────────────────────────

/// Shared state handed to every handler.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub notifier: Arc<Notifier<S>>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      notifier: self.notifier.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: SubscriptionStore + NotifyStore + 'static,
  <S as SubscriptionStore>::Error: Into<herald_core::Error>,
  <S as NotifyStore>::Err: Into<herald_core::Error>,
{
  Router::new()
    // Partners
    .route("/partners", post(partners::create::<S>))
    .route("/partners/{id}", get(partners::get_one::<S>))
    // Followers
    .route(
      "/documents/{model}/{res_id}/followers",
      get(follow::list::<S>).post(follow::create::<S>),
    )
    .route(
      "/documents/{model}/{res_id}/followers/{partner_id}",
      axum::routing::delete(follow::remove::<S>),
    )
    .route(
      "/documents/{model}/{res_id}/followers/{partner_id}/subtypes",
      put(follow::set_subtypes::<S>),
    )
    // Inbox
    .route("/inbox", get(inbox::list::<S>))
    .route("/notifications/{id}/read", post(inbox::set_read::<S>))
    .route("/notifications/{id}/star", post(inbox::set_starred::<S>))
    // Fan-out
    .route("/notify", post(notify::handler::<S>))
    .with_state(state)
}
