//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Set-valued fields (subtype
//! sets, recipient lists, extra headers) are stored as compact JSON. UUIDs
//! are stored as hyphenated lowercase strings.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use herald_core::{
  document::DocumentRef,
  mail::{Envelope, EnvelopeStatus},
  notification::Notification,
  partner::{EmailPreference, Partner},
  subscription::Subscription,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── EmailPreference ─────────────────────────────────────────────────────────

pub fn encode_preference(p: EmailPreference) -> &'static str {
  match p {
    EmailPreference::Always => "always",
    EmailPreference::None => "none",
  }
}

pub fn decode_preference(s: &str) -> Result<EmailPreference> {
  match s {
    "always" => Ok(EmailPreference::Always),
    "none" => Ok(EmailPreference::None),
    other => Err(Error::Decode(format!("unknown preference: {other:?}"))),
  }
}

// ─── EnvelopeStatus ──────────────────────────────────────────────────────────

pub fn encode_status(s: EnvelopeStatus) -> &'static str {
  match s {
    EnvelopeStatus::Queued => "queued",
    EnvelopeStatus::Sent => "sent",
  }
}

pub fn decode_status(s: &str) -> Result<EnvelopeStatus> {
  match s {
    "queued" => Ok(EnvelopeStatus::Queued),
    "sent" => Ok(EnvelopeStatus::Sent),
    other => Err(Error::Decode(format!("unknown status: {other:?}"))),
  }
}

// ─── Set-valued columns ──────────────────────────────────────────────────────

pub fn encode_subtypes(subtypes: &BTreeSet<String>) -> Result<String> {
  Ok(serde_json::to_string(subtypes)?)
}

pub fn decode_subtypes(s: &str) -> Result<BTreeSet<String>> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_recipients(ids: &[Uuid]) -> Result<String> {
  let strings: Vec<String> = ids.iter().copied().map(encode_uuid).collect();
  Ok(serde_json::to_string(&strings)?)
}

pub fn decode_recipients(s: &str) -> Result<Vec<Uuid>> {
  let strings: Vec<String> = serde_json::from_str(s)?;
  strings.iter().map(|s| decode_uuid(s)).collect()
}

pub fn encode_headers(headers: &BTreeMap<String, String>) -> Result<String> {
  Ok(serde_json::to_string(headers)?)
}

pub fn decode_headers(s: &str) -> Result<BTreeMap<String, String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `followers` row.
pub struct RawSubscription {
  pub subscription_id: String,
  pub model:           String,
  pub res_id:          i64,
  pub partner_id:      String,
  pub subtypes:        String,
  pub created_at:      String,
}

impl RawSubscription {
  pub fn into_subscription(self) -> Result<Subscription> {
    Ok(Subscription {
      subscription_id: decode_uuid(&self.subscription_id)?,
      document:        DocumentRef::new(self.model, self.res_id),
      partner_id:      decode_uuid(&self.partner_id)?,
      subtypes:        decode_subtypes(&self.subtypes)?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `notifications` row.
pub struct RawNotification {
  pub notification_id: String,
  pub partner_id:      String,
  pub message_id:      String,
  pub is_read:         bool,
  pub starred:         bool,
}

impl RawNotification {
  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      partner_id:      decode_uuid(&self.partner_id)?,
      message_id:      decode_uuid(&self.message_id)?,
      is_read:         self.is_read,
      starred:         self.starred,
    })
  }
}

/// Raw strings read directly from a `partners` row.
pub struct RawPartner {
  pub partner_id:       String,
  pub name:             String,
  pub email:            Option<String>,
  pub email_preference: String,
  pub signature:        Option<String>,
}

impl RawPartner {
  pub fn into_partner(self) -> Result<Partner> {
    Ok(Partner {
      partner_id:       decode_uuid(&self.partner_id)?,
      name:             self.name,
      email:            self.email,
      email_preference: decode_preference(&self.email_preference)?,
      signature:        self.signature,
    })
  }
}

/// Raw strings read directly from an `outbox` row.
pub struct RawEnvelope {
  pub envelope_id:   String,
  pub message_id:    String,
  pub body_html:     String,
  pub recipient_ids: String,
  pub refs:          Option<String>,
  pub auto_delete:   bool,
  pub server_id:     Option<String>,
  pub extra_headers: String,
  pub status:        String,
  pub created_at:    String,
}

impl RawEnvelope {
  pub fn into_envelope(self) -> Result<Envelope> {
    Ok(Envelope {
      envelope_id:   decode_uuid(&self.envelope_id)?,
      message_id:    decode_uuid(&self.message_id)?,
      body_html:     self.body_html,
      recipient_ids: decode_recipients(&self.recipient_ids)?,
      references:    self.refs,
      auto_delete:   self.auto_delete,
      server_id:     self.server_id,
      extra_headers: decode_headers(&self.extra_headers)?,
      status:        decode_status(&self.status)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
