//! Subscription — the follower record tying a partner to a document.
//!
//! At most one subscription exists per (document, partner) pair; the store
//! enforces this with a uniqueness constraint. Follower state also gates
//! document visibility, which is why every mutation goes through the access
//! cache invalidator.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::DocumentRef;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
  pub subscription_id: Uuid,
  pub document:        DocumentRef,
  pub partner_id:      Uuid,
  /// Message subtypes the partner has chosen to be notified about.
  pub subtypes:        BTreeSet<String>,
  pub created_at:      DateTime<Utc>,
}
