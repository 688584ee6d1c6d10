//! Store and collaborator traits.
//!
//! Implemented by storage backends (e.g. `herald-store-sqlite`). Higher
//! layers (`herald-notify`, `herald-api`) depend on these abstractions, not
//! on any concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::{
  collections::{BTreeSet, HashMap},
  future::Future,
};

use uuid::Uuid;

use crate::{
  document::DocumentRef,
  mail::{Envelope, NewEnvelope},
  notification::Notification,
  partner::{NewPartner, Partner},
  subscription::Subscription,
};

// ─── Execution mode ──────────────────────────────────────────────────────────

/// Execution mode for notification reads.
///
/// `Enforced` restricts results to partners whose subscriptions cover the
/// message's document; `Bypass` skips the check. Privileged callers (the
/// notify orchestrator is the authority on who gets notified) read with
/// `Bypass`, and the mode is an explicit parameter so that authority is
/// visible at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
  Enforced,
  Bypass,
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`NotificationStore::inbox`].
#[derive(Debug, Clone, Default)]
pub struct InboxQuery {
  pub partner_id:   Uuid,
  pub unread_only:  bool,
  pub starred_only: bool,
  pub limit:        Option<usize>,
}

// ─── Access cache invalidation ───────────────────────────────────────────────

/// Invalidation hook for caches of access rights derived from follower
/// state. Called synchronously after every subscription mutation, before the
/// mutating call returns.
pub trait AccessCacheInvalidator: Send + Sync {
  fn invalidate(&self);
}

/// Default invalidator for deployments without a derived-rights cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInvalidator;

impl AccessCacheInvalidator for NoopInvalidator {
  fn invalidate(&self) {}
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

/// Durable mapping of (document, partner) to followed message subtypes.
pub trait SubscriptionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create a subscription. Fails with an already-following conflict if the
  /// (document, partner) pair exists.
  fn follow(
    &self,
    document: DocumentRef,
    partner_id: Uuid,
    subtypes: BTreeSet<String>,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;

  /// Delete a subscription. Returns `false` if the partner was not
  /// following.
  fn unfollow<'a>(
    &'a self,
    document: &'a DocumentRef,
    partner_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Replace the followed subtype set of an existing subscription.
  fn set_subtypes<'a>(
    &'a self,
    document: &'a DocumentRef,
    partner_id: Uuid,
    subtypes: BTreeSet<String>,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + 'a;

  /// All subscriptions covering `document`, wildcard rows included.
  fn followers_of<'a>(
    &'a self,
    document: &'a DocumentRef,
  ) -> impl Future<Output = Result<Vec<Subscription>, Self::Error>> + Send + 'a;

  /// Partners whose subscription covers `document` and includes `subtype`
  /// in its followed set.
  fn followers_for_subtype<'a>(
    &'a self,
    document: &'a DocumentRef,
    subtype: &'a str,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + 'a;

  /// Everything a partner follows.
  fn subscriptions_of(
    &self,
    partner_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Subscription>, Self::Error>> + Send + '_;
}

// ─── Notifications ───────────────────────────────────────────────────────────

pub trait NotificationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Notification records for one message.
  ///
  /// A non-empty `partner_ids` restricts the result to those partners; an
  /// empty slice means no restriction. With [`Visibility::Enforced`] and a
  /// document, rows whose partner does not follow the document are dropped.
  fn notifications_for_message<'a>(
    &'a self,
    message_id: Uuid,
    partner_ids: &'a [Uuid],
    document: Option<&'a DocumentRef>,
    visibility: Visibility,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + 'a;

  /// Create an unread, unstarred notification for `(message_id, partner_id)`.
  fn create_notification(
    &self,
    message_id: Uuid,
    partner_id: Uuid,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// Bulk-reset `is_read` to false on the given records.
  fn mark_unread<'a>(
    &'a self,
    notification_ids: &'a [Uuid],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn set_read(
    &self,
    notification_id: Uuid,
    is_read: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn set_starred(
    &self,
    notification_id: Uuid,
    starred: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Inbox-style listing for one partner, newest first. Served by the
  /// composite (partner, is_read, starred, message) index.
  fn inbox<'a>(
    &'a self,
    query: &'a InboxQuery,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + 'a;
}

// ─── Partner directory ───────────────────────────────────────────────────────

pub trait PartnerDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn add_partner(
    &self,
    input: NewPartner,
  ) -> impl Future<Output = Result<Partner, Self::Error>> + Send + '_;

  /// Retrieve one partner. Returns `None` if not found.
  fn partner(
    &self,
    partner_id: Uuid,
  ) -> impl Future<Output = Result<Option<Partner>, Self::Error>> + Send + '_;

  /// Batch lookup; unknown ids are simply absent from the result map.
  fn partners_by_ids<'a>(
    &'a self,
    partner_ids: &'a [Uuid],
  ) -> impl Future<Output = Result<HashMap<Uuid, Partner>, Self::Error>> + Send + 'a;
}

// ─── Outbound mail ───────────────────────────────────────────────────────────

/// Envelope creation and dispatch. Implementations persist envelopes in a
/// queued state; actual transport is an external concern.
pub trait OutboundMailer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn create_envelope(
    &self,
    input: NewEnvelope,
  ) -> impl Future<Output = Result<Envelope, Self::Error>> + Send + '_;

  /// Dispatch the given envelopes immediately, marking them sent.
  fn send_now<'a>(
    &'a self,
    envelopes: &'a [Envelope],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Envelopes still waiting for the external scheduler.
  fn queued(
    &self,
  ) -> impl Future<Output = Result<Vec<Envelope>, Self::Error>> + Send + '_;
}
