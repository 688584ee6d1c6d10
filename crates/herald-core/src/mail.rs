//! Outbound envelope types.
//!
//! An envelope is one delivery unit: one rendered body addressed to one
//! bounded chunk of recipients. Envelopes are created in a queued state and
//! either sent immediately (single-chunk force path) or picked up later by
//! an external scheduler.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
  Queued,
  Sent,
}

impl EnvelopeStatus {
  pub fn is_sent(&self) -> bool { matches!(self, Self::Sent) }
}

/// Input to [`crate::store::OutboundMailer::create_envelope`].
#[derive(Debug, Clone)]
pub struct NewEnvelope {
  pub message_id:    Uuid,
  pub body_html:     String,
  pub recipient_ids: Vec<Uuid>,
  /// Value for the References header (threading), if any.
  pub references:    Option<String>,
  /// Delete the envelope after successful transport.
  pub auto_delete:   bool,
  /// Outgoing mail server override.
  pub server_id:     Option<String>,
  /// Arbitrary extra header fields merged into the envelope.
  pub extra_headers: BTreeMap<String, String>,
}

impl NewEnvelope {
  /// Apply per-document overrides on top of the base fields. Set override
  /// fields win on conflict; extra headers are merged key by key with the
  /// override side winning.
  pub fn apply_override(&mut self, ov: EnvelopeOverride) {
    if let Some(auto_delete) = ov.auto_delete {
      self.auto_delete = auto_delete;
    }
    if let Some(server_id) = ov.server_id {
      self.server_id = Some(server_id);
    }
    if let Some(references) = ov.references {
      self.references = Some(references);
    }
    self.extra_headers.extend(ov.extra_headers);
  }
}

/// A persisted envelope as returned by the mailer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
  pub envelope_id:   Uuid,
  pub message_id:    Uuid,
  pub body_html:     String,
  pub recipient_ids: Vec<Uuid>,
  pub references:    Option<String>,
  pub auto_delete:   bool,
  pub server_id:     Option<String>,
  pub extra_headers: BTreeMap<String, String>,
  pub status:        EnvelopeStatus,
  pub created_at:    DateTime<Utc>,
}

/// Envelope field overrides contributed by a document type that implements
/// the overrides capability. Unset fields leave the base value untouched.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeOverride {
  pub auto_delete:   Option<bool>,
  pub server_id:     Option<String>,
  pub references:    Option<String>,
  pub extra_headers: BTreeMap<String, String>,
}
