//! Notification — per-(message, partner) delivery and read state.
//!
//! No storage-level uniqueness is enforced, but (message_id, partner_id) is
//! the natural key: reconciliation never introduces a second row for the
//! same pair. Rows carry no timestamps.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  pub partner_id:      Uuid,
  pub message_id:      Uuid,
  pub is_read:         bool,
  /// Starred notifications go into the todo mailbox.
  pub starred:         bool,
}
