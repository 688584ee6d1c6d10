//! Notification reconciliation — idempotent upsert of per-partner
//! notification state against a target recipient set.

use std::collections::HashSet;

use herald_core::{notification::Notification, store::NotificationStore};
use uuid::Uuid;

/// Reconcile the notification records of one message against `targets`.
///
/// All `existing` records are bulk-reset to unread — re-notification always
/// surfaces as unread regardless of prior read state. One record is then
/// created per target partner without one, in target order.
///
/// Returns only the newly created records: downstream email delivery
/// operates on new notifications, never on re-notified existing ones.
/// Repeated calls with overlapping target sets are idempotent in membership.
pub async fn reconcile<S: NotificationStore>(
  store: &S,
  message_id: Uuid,
  existing: &[Notification],
  targets: &[Uuid],
) -> Result<Vec<Notification>, S::Error> {
  let existing_ids: Vec<Uuid> =
    existing.iter().map(|n| n.notification_id).collect();
  store.mark_unread(&existing_ids).await?;

  let mut covered: HashSet<Uuid> =
    existing.iter().map(|n| n.partner_id).collect();

  let mut created = Vec::new();
  for &partner_id in targets {
    if !covered.insert(partner_id) {
      continue;
    }
    created.push(store.create_notification(message_id, partner_id).await?);
  }
  Ok(created)
}
