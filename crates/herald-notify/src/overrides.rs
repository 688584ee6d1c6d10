//! Per-document envelope overrides.
//!
//! Document types can contribute custom envelope fields (extra headers, a
//! reply-to server, threading tweaks) by implementing [`EnvelopeOverrides`]
//! and registering under their model name. Models that register nothing are
//! simply skipped.

use std::{collections::HashMap, sync::Arc};

use herald_core::{mail::EnvelopeOverride, message::Message};

/// Capability implemented by document types that customise outbound mail.
pub trait EnvelopeOverrides: Send + Sync {
  fn email_values(&self, message: &Message) -> EnvelopeOverride;
}

/// Registry mapping document model names to their overrides capability.
#[derive(Default)]
pub struct OverrideRegistry {
  by_model: HashMap<String, Arc<dyn EnvelopeOverrides>>,
}

impl OverrideRegistry {
  pub fn new() -> Self { Self::default() }

  pub fn register(
    &mut self,
    model: impl Into<String>,
    overrides: Arc<dyn EnvelopeOverrides>,
  ) {
    self.by_model.insert(model.into(), overrides);
  }

  /// Overrides for the message's target document type, if registered.
  pub fn for_message(&self, message: &Message) -> Option<EnvelopeOverride> {
    let document = message.document.as_ref()?;
    let overrides = self.by_model.get(&document.model)?;
    Some(overrides.email_values(message))
  }
}
