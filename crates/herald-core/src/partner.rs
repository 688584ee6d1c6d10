//! Partner directory entries — the parties that follow documents and receive
//! notifications.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a partner wants to receive email for their notifications.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EmailPreference {
  #[default]
  Always,
  /// Full opt-out; the partner still gets inbox notifications.
  None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
  pub partner_id:       Uuid,
  pub name:             String,
  pub email:            Option<String>,
  pub email_preference: EmailPreference,
  /// Personal signature appended to outbound notification bodies, as an
  /// HTML fragment.
  pub signature:        Option<String>,
}

/// Input to [`crate::store::PartnerDirectory::add_partner`].
#[derive(Debug, Clone)]
pub struct NewPartner {
  pub name:             String,
  pub email:            Option<String>,
  pub email_preference: EmailPreference,
  pub signature:        Option<String>,
}

impl NewPartner {
  /// Convenience constructor with default preference and no signature.
  pub fn new(name: impl Into<String>, email: Option<String>) -> Self {
    Self {
      name: name.into(),
      email,
      email_preference: EmailPreference::default(),
      signature: None,
    }
  }
}
