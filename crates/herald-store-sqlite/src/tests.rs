//! Integration tests for `SqliteStore` against an in-memory database.

use std::{
  collections::BTreeSet,
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
};

use herald_core::{
  document::DocumentRef,
  mail::NewEnvelope,
  partner::{EmailPreference, NewPartner},
  store::{
    AccessCacheInvalidator, InboxQuery, NotificationStore, OutboundMailer,
    PartnerDirectory, SubscriptionStore, Visibility,
  },
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn subtype_set(names: &[&str]) -> BTreeSet<String> {
  names.iter().map(|s| s.to_string()).collect()
}

async fn add_partner(s: &SqliteStore, name: &str) -> Uuid {
  s.add_partner(NewPartner::new(
    name,
    Some(format!("{name}@example.com")),
  ))
  .await
  .unwrap()
  .partner_id
}

/// Counts invalidation calls.
#[derive(Default)]
struct CountingInvalidator(AtomicUsize);

impl AccessCacheInvalidator for CountingInvalidator {
  fn invalidate(&self) {
    self.0.fetch_add(1, Ordering::SeqCst);
  }
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn follow_and_list_followers() {
  let s = store().await;
  let alice = add_partner(&s, "alice").await;
  let task = DocumentRef::new("project.task", 7);

  let sub = s
    .follow(task.clone(), alice, subtype_set(&["comment"]))
    .await
    .unwrap();
  assert_eq!(sub.partner_id, alice);
  assert_eq!(sub.document, task);

  let followers = s.followers_of(&task).await.unwrap();
  assert_eq!(followers.len(), 1);
  assert_eq!(followers[0].partner_id, alice);
}

#[tokio::test]
async fn follow_twice_is_a_conflict() {
  let s = store().await;
  let alice = add_partner(&s, "alice").await;
  let task = DocumentRef::new("project.task", 7);

  s.follow(task.clone(), alice, BTreeSet::new())
    .await
    .unwrap();
  let err = s
    .follow(task.clone(), alice, BTreeSet::new())
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::AlreadyFollowing { .. }));

  // no silent duplicate row
  let followers = s.followers_of(&task).await.unwrap();
  assert_eq!(followers.len(), 1);
}

#[tokio::test]
async fn same_partner_may_follow_different_documents() {
  let s = store().await;
  let alice = add_partner(&s, "alice").await;

  s.follow(DocumentRef::new("project.task", 7), alice, BTreeSet::new())
    .await
    .unwrap();
  s.follow(DocumentRef::new("project.task", 8), alice, BTreeSet::new())
    .await
    .unwrap();

  let subs = s.subscriptions_of(alice).await.unwrap();
  assert_eq!(subs.len(), 2);
}

#[tokio::test]
async fn wildcard_subscription_shows_up_for_every_instance() {
  let s = store().await;
  let alice = add_partner(&s, "alice").await;
  let bob = add_partner(&s, "bob").await;

  s.follow(DocumentRef::new("project.task", 0), alice, BTreeSet::new())
    .await
    .unwrap();
  s.follow(DocumentRef::new("project.task", 7), bob, BTreeSet::new())
    .await
    .unwrap();

  let followers = s
    .followers_of(&DocumentRef::new("project.task", 7))
    .await
    .unwrap();
  let ids: Vec<Uuid> = followers.iter().map(|f| f.partner_id).collect();
  assert_eq!(ids.len(), 2);
  assert!(ids.contains(&alice));
  assert!(ids.contains(&bob));

  // an unrelated instance only sees the wildcard follower
  let followers = s
    .followers_of(&DocumentRef::new("project.task", 99))
    .await
    .unwrap();
  assert_eq!(followers.len(), 1);
  assert_eq!(followers[0].partner_id, alice);
}

#[tokio::test]
async fn unfollow_deletes_the_subscription() {
  let s = store().await;
  let alice = add_partner(&s, "alice").await;
  let task = DocumentRef::new("project.task", 7);

  s.follow(task.clone(), alice, BTreeSet::new())
    .await
    .unwrap();
  assert!(s.unfollow(&task, alice).await.unwrap());
  assert!(!s.unfollow(&task, alice).await.unwrap());
  assert!(s.followers_of(&task).await.unwrap().is_empty());
}

#[tokio::test]
async fn set_subtypes_replaces_the_followed_set() {
  let s = store().await;
  let alice = add_partner(&s, "alice").await;
  let task = DocumentRef::new("project.task", 7);

  s.follow(task.clone(), alice, subtype_set(&["comment"]))
    .await
    .unwrap();
  let sub = s
    .set_subtypes(&task, alice, subtype_set(&["comment", "stage_change"]))
    .await
    .unwrap();
  assert_eq!(sub.subtypes, subtype_set(&["comment", "stage_change"]));
}

#[tokio::test]
async fn set_subtypes_on_missing_subscription_errors() {
  let s = store().await;
  let alice = add_partner(&s, "alice").await;

  let err = s
    .set_subtypes(
      &DocumentRef::new("project.task", 7),
      alice,
      BTreeSet::new(),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::SubscriptionNotFound(_)));
}

#[tokio::test]
async fn followers_for_subtype_filters_on_the_followed_set() {
  let s = store().await;
  let alice = add_partner(&s, "alice").await;
  let bob = add_partner(&s, "bob").await;
  let task = DocumentRef::new("project.task", 7);

  s.follow(task.clone(), alice, subtype_set(&["comment"]))
    .await
    .unwrap();
  s.follow(task.clone(), bob, subtype_set(&["stage_change"]))
    .await
    .unwrap();

  let ids = s.followers_for_subtype(&task, "comment").await.unwrap();
  assert_eq!(ids, vec![alice]);
}

#[tokio::test]
async fn every_subscription_mutation_invalidates_the_access_cache() {
  let invalidator = Arc::new(CountingInvalidator::default());
  let s = store().await.with_invalidator(invalidator.clone());
  let alice = add_partner(&s, "alice").await;
  let task = DocumentRef::new("project.task", 7);

  s.follow(task.clone(), alice, BTreeSet::new())
    .await
    .unwrap();
  s.set_subtypes(&task, alice, subtype_set(&["comment"]))
    .await
    .unwrap();
  s.unfollow(&task, alice).await.unwrap();

  assert_eq!(invalidator.0.load(Ordering::SeqCst), 3);

  // a no-op unfollow is not a mutation
  s.unfollow(&task, alice).await.unwrap();
  assert_eq!(invalidator.0.load(Ordering::SeqCst), 3);
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_fetch_notifications_for_message() {
  let s = store().await;
  let alice = add_partner(&s, "alice").await;
  let bob = add_partner(&s, "bob").await;
  let message_id = Uuid::new_v4();

  s.create_notification(message_id, alice).await.unwrap();
  s.create_notification(message_id, bob).await.unwrap();
  s.create_notification(Uuid::new_v4(), bob).await.unwrap();

  let all = s
    .notifications_for_message(message_id, &[], None, Visibility::Bypass)
    .await
    .unwrap();
  assert_eq!(all.len(), 2);

  let restricted = s
    .notifications_for_message(message_id, &[alice], None, Visibility::Bypass)
    .await
    .unwrap();
  assert_eq!(restricted.len(), 1);
  assert_eq!(restricted[0].partner_id, alice);
}

#[tokio::test]
async fn enforced_visibility_drops_non_followers() {
  let s = store().await;
  let alice = add_partner(&s, "alice").await;
  let bob = add_partner(&s, "bob").await;
  let task = DocumentRef::new("project.task", 7);
  let message_id = Uuid::new_v4();

  s.follow(task.clone(), alice, BTreeSet::new())
    .await
    .unwrap();
  s.create_notification(message_id, alice).await.unwrap();
  s.create_notification(message_id, bob).await.unwrap();

  let enforced = s
    .notifications_for_message(
      message_id,
      &[],
      Some(&task),
      Visibility::Enforced,
    )
    .await
    .unwrap();
  assert_eq!(enforced.len(), 1);
  assert_eq!(enforced[0].partner_id, alice);

  let bypassed = s
    .notifications_for_message(message_id, &[], Some(&task), Visibility::Bypass)
    .await
    .unwrap();
  assert_eq!(bypassed.len(), 2);
}

#[tokio::test]
async fn mark_unread_resets_the_read_flag_in_bulk() {
  let s = store().await;
  let alice = add_partner(&s, "alice").await;
  let bob = add_partner(&s, "bob").await;
  let message_id = Uuid::new_v4();

  let n1 = s.create_notification(message_id, alice).await.unwrap();
  let n2 = s.create_notification(message_id, bob).await.unwrap();
  s.set_read(n1.notification_id, true).await.unwrap();
  s.set_read(n2.notification_id, true).await.unwrap();

  s.mark_unread(&[n1.notification_id, n2.notification_id])
    .await
    .unwrap();

  let all = s
    .notifications_for_message(message_id, &[], None, Visibility::Bypass)
    .await
    .unwrap();
  assert!(all.iter().all(|n| !n.is_read));
}

#[tokio::test]
async fn set_read_on_missing_notification_errors() {
  let s = store().await;
  let err = s.set_read(Uuid::new_v4(), true).await.unwrap_err();
  assert!(matches!(err, crate::Error::NotificationNotFound(_)));
}

#[tokio::test]
async fn inbox_filters_unread_and_starred() {
  let s = store().await;
  let alice = add_partner(&s, "alice").await;

  let n1 = s.create_notification(Uuid::new_v4(), alice).await.unwrap();
  let n2 = s.create_notification(Uuid::new_v4(), alice).await.unwrap();
  let n3 = s.create_notification(Uuid::new_v4(), alice).await.unwrap();
  s.set_read(n1.notification_id, true).await.unwrap();
  s.set_starred(n2.notification_id, true).await.unwrap();

  let all = s
    .inbox(&InboxQuery {
      partner_id: alice,
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(all.len(), 3);
  // newest first
  assert_eq!(all[0].notification_id, n3.notification_id);

  let unread = s
    .inbox(&InboxQuery {
      partner_id: alice,
      unread_only: true,
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(unread.len(), 2);

  let starred = s
    .inbox(&InboxQuery {
      partner_id: alice,
      starred_only: true,
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(starred.len(), 1);
  assert_eq!(starred[0].notification_id, n2.notification_id);
}

// ─── Partners ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn partner_roundtrip_with_preference_and_signature() {
  let s = store().await;

  let mut input = NewPartner::new("carol", Some("carol@example.com".into()));
  input.email_preference = EmailPreference::None;
  input.signature = Some("<p>Carol</p>".into());
  let created = s.add_partner(input).await.unwrap();

  let fetched = s.partner(created.partner_id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "carol");
  assert_eq!(fetched.email.as_deref(), Some("carol@example.com"));
  assert_eq!(fetched.email_preference, EmailPreference::None);
  assert_eq!(fetched.signature.as_deref(), Some("<p>Carol</p>"));
}

#[tokio::test]
async fn partners_by_ids_skips_unknown_ids() {
  let s = store().await;
  let alice = add_partner(&s, "alice").await;

  let map = s
    .partners_by_ids(&[alice, Uuid::new_v4()])
    .await
    .unwrap();
  assert_eq!(map.len(), 1);
  assert!(map.contains_key(&alice));
}

// ─── Outbox ──────────────────────────────────────────────────────────────────

fn envelope_input(recipients: Vec<Uuid>) -> NewEnvelope {
  NewEnvelope {
    message_id:    Uuid::new_v4(),
    body_html:     "<p>hello</p>".into(),
    recipient_ids: recipients,
    references:    Some("<parent@example.com>".into()),
    auto_delete:   true,
    server_id:     None,
    extra_headers: Default::default(),
  }
}

#[tokio::test]
async fn created_envelopes_are_queued() {
  let s = store().await;
  let recipients = vec![Uuid::new_v4(), Uuid::new_v4()];

  let envelope = s
    .create_envelope(envelope_input(recipients.clone()))
    .await
    .unwrap();
  assert!(!envelope.status.is_sent());

  let queued = s.queued().await.unwrap();
  assert_eq!(queued.len(), 1);
  assert_eq!(queued[0].envelope_id, envelope.envelope_id);
  assert_eq!(queued[0].recipient_ids, recipients);
  assert_eq!(
    queued[0].references.as_deref(),
    Some("<parent@example.com>")
  );
}

#[tokio::test]
async fn send_now_marks_envelopes_sent() {
  let s = store().await;

  let e1 = s
    .create_envelope(envelope_input(vec![Uuid::new_v4()]))
    .await
    .unwrap();
  let e2 = s
    .create_envelope(envelope_input(vec![Uuid::new_v4()]))
    .await
    .unwrap();

  s.send_now(&[e1.clone()]).await.unwrap();

  let queued = s.queued().await.unwrap();
  assert_eq!(queued.len(), 1);
  assert_eq!(queued[0].envelope_id, e2.envelope_id);
}
