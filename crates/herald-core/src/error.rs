//! Error types for `herald-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("partner {partner_id} already follows {model},{res_id}")]
  AlreadyFollowing {
    model:      String,
    res_id:     i64,
    partner_id: Uuid,
  },

  #[error("subscription not found for partner {0}")]
  SubscriptionNotFound(Uuid),

  #[error("notification not found: {0}")]
  NotificationNotFound(Uuid),

  #[error("envelope not found: {0}")]
  EnvelopeNotFound(Uuid),

  #[error("partner not found: {0}")]
  PartnerNotFound(Uuid),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// Backend failure surfaced through a store implementation.
  #[error("storage error: {0}")]
  Storage(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
