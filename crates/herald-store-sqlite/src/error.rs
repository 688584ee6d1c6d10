//! Error type for `herald-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] herald_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("column decode error: {0}")]
  Decode(String),

  /// The (document, partner) pair already has a subscription.
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
}

impl From<Error> for herald_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      Error::AlreadyFollowing {
        model,
        res_id,
        partner_id,
      } => herald_core::Error::AlreadyFollowing {
        model,
        res_id,
        partner_id,
      },
      Error::SubscriptionNotFound(id) => {
        herald_core::Error::SubscriptionNotFound(id)
      }
      Error::NotificationNotFound(id) => {
        herald_core::Error::NotificationNotFound(id)
      }
      other => herald_core::Error::Storage(other.to_string()),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
