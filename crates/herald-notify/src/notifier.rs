//! [`Notifier`] — the top-level entry point for one message.

use std::{collections::HashSet, sync::Arc};

use herald_core::{
  mail::{Envelope, EnvelopeStatus, NewEnvelope},
  message::Message,
  notification::Notification,
  store::Visibility,
};
use uuid::Uuid;

use crate::{
  NotifyContext, NotifyStore,
  filter::eligible_for_email,
  footer::{Branding, append_content_to_html, compose_footer},
  overrides::OverrideRegistry,
  reconcile::reconcile,
};

/// Hard cap on recipients per outbound envelope. Larger fan-outs are split
/// into consecutive chunks and always go through the deferred queue.
pub const MAX_RECIPIENTS_PER_ENVELOPE: usize = 50;

/// What one [`Notifier::notify`] call did.
#[derive(Debug, Clone)]
pub struct NotifyOutcome {
  /// Newly created notification records (not the merely reset ones).
  pub created:   Vec<Notification>,
  /// Envelopes created for this call, queued or already sent.
  pub envelopes: Vec<Envelope>,
}

/// Composes reconciliation, eligibility filtering, footer composition, and
/// delivery batching for one message.
pub struct Notifier<S> {
  store:            Arc<S>,
  branding:         Branding,
  /// Document models with group/broadcast semantics; members usually add
  /// their own signatures, so the personal signature is skipped.
  broadcast_models: HashSet<String>,
  overrides:        OverrideRegistry,
}

impl<S: NotifyStore> Notifier<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      branding: Branding::default(),
      broadcast_models: HashSet::new(),
      overrides: OverrideRegistry::new(),
    }
  }

  pub fn with_branding(mut self, branding: Branding) -> Self {
    self.branding = branding;
    self
  }

  pub fn with_broadcast_models(
    mut self,
    models: impl IntoIterator<Item = String>,
  ) -> Self {
    self.broadcast_models = models.into_iter().collect();
    self
  }

  pub fn with_overrides(mut self, overrides: OverrideRegistry) -> Self {
    self.overrides = overrides;
    self
  }

  /// Notify `recipients` about `message`: upsert notification state, then
  /// email the eligible subset of the newly notified partners.
  pub async fn notify(
    &self,
    message: &Message,
    recipients: &[Uuid],
    force_send: bool,
    include_signature: bool,
    ctx: &NotifyContext,
  ) -> Result<NotifyOutcome, S::Err> {
    // The notifier is the authority on who gets notified; row-level
    // visibility is bypassed on purpose.
    let existing = self
      .store
      .notifications_for_message(
        message.message_id,
        recipients,
        message.document.as_ref(),
        Visibility::Bypass,
      )
      .await?;

    let created =
      reconcile(&*self.store, message.message_id, &existing, recipients)
        .await?;

    if ctx.suppress_email {
      tracing::debug!(
        message_id = %message.message_id,
        created = created.len(),
        "notification state updated, email suppressed"
      );
      return Ok(NotifyOutcome {
        created,
        envelopes: Vec::new(),
      });
    }

    let partner_ids: Vec<Uuid> =
      created.iter().map(|n| n.partner_id).collect();
    let partners = self.store.partners_by_ids(&partner_ids).await?;
    let eligible = eligible_for_email(&created, &partners, message);

    let envelopes = self
      .deliver(message, &eligible, force_send, include_signature, ctx)
      .await?;

    tracing::debug!(
      message_id = %message.message_id,
      created = created.len(),
      eligible = eligible.len(),
      envelopes = envelopes.len(),
      "message notified"
    );

    Ok(NotifyOutcome { created, envelopes })
  }

  /// Build and queue outbound envelopes for `eligible`, chunked at
  /// [`MAX_RECIPIENTS_PER_ENVELOPE`] recipients, preserving input order.
  ///
  /// The immediate-send path runs only for a single chunk with `force_send`,
  /// and never while the registry is cold-starting (unless in a test
  /// execution) — multi-chunk fan-out always goes through the queue.
  pub async fn deliver(
    &self,
    message: &Message,
    eligible: &[Uuid],
    force_send: bool,
    include_signature: bool,
    ctx: &NotifyContext,
  ) -> Result<Vec<Envelope>, S::Err> {
    if eligible.is_empty() {
      return Ok(Vec::new());
    }

    // Group documents skip the personal signature; members usually sign
    // their own posts.
    let broadcast = message
      .document
      .as_ref()
      .is_some_and(|d| self.broadcast_models.contains(&d.model));

    let actor = match &message.author {
      Some(author) => self
        .store
        .partners_by_ids(&[author.partner_id])
        .await?
        .remove(&author.partner_id),
      None => None,
    };

    let footer = compose_footer(
      actor.as_ref(),
      &self.branding,
      include_signature && !broadcast,
    );

    let body_html = if footer.is_empty() {
      message.body.clone()
    } else {
      append_content_to_html(&message.body, &footer, Some("div"))
    };

    let references = message.parent_thread_id.clone();
    let envelope_override = self.overrides.for_message(message);

    let mut envelopes = Vec::new();
    for chunk in eligible.chunks(MAX_RECIPIENTS_PER_ENVELOPE) {
      let mut input = NewEnvelope {
        message_id:    message.message_id,
        body_html:     body_html.clone(),
        recipient_ids: chunk.to_vec(),
        references:    references.clone(),
        auto_delete:   ctx.auto_delete.unwrap_or(true),
        server_id:     ctx.server_id.clone(),
        extra_headers: Default::default(),
      };
      if let Some(ov) = &envelope_override {
        input.apply_override(ov.clone());
      }
      envelopes.push(self.store.create_envelope(input).await?);
    }

    if force_send && envelopes.len() < 2 && ctx.immediate_send_allowed() {
      self.store.send_now(&envelopes).await?;
      for envelope in &mut envelopes {
        envelope.status = EnvelopeStatus::Sent;
      }
      tracing::info!(
        message_id = %message.message_id,
        recipients = eligible.len(),
        "envelope sent immediately"
      );
    }

    Ok(envelopes)
  }
}
