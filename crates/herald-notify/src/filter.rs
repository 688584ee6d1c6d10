//! Recipient filter — which notified partners actually get an email.

use std::collections::HashMap;

use herald_core::{
  message::Message,
  notification::Notification,
  partner::{EmailPreference, Partner},
};
use uuid::Uuid;

/// Partners eligible for email delivery of `message`, drawn from its
/// notification records.
///
/// A notification is excluded when it is already read, when its partner has
/// no email address, when the partner's email equals the author's email
/// (loop prevention), or when the partner has opted out. Partners missing
/// from `partners` are silently ineligible. The result preserves the input
/// order of `notifications`.
pub fn eligible_for_email(
  notifications: &[Notification],
  partners: &HashMap<Uuid, Partner>,
  message: &Message,
) -> Vec<Uuid> {
  let author_email =
    message.author.as_ref().and_then(|a| a.email.as_deref());

  let mut eligible = Vec::new();
  for notification in notifications {
    if notification.is_read {
      continue;
    }
    let Some(partner) = partners.get(&notification.partner_id) else {
      continue;
    };
    let Some(email) = partner.email.as_deref() else {
      continue;
    };
    if email.is_empty() {
      continue;
    }
    // Exact string equality: case variants or aliases of the author's
    // address are not treated as self-notifications.
    if author_email == Some(email) {
      continue;
    }
    if partner.email_preference == EmailPreference::None {
      continue;
    }
    eligible.push(notification.partner_id);
  }
  eligible
}

#[cfg(test)]
mod tests {
  use herald_core::message::MessageAuthor;

  use super::*;

  fn partner(email: Option<&str>, preference: EmailPreference) -> Partner {
    Partner {
      partner_id: Uuid::new_v4(),
      name: "p".into(),
      email: email.map(str::to_string),
      email_preference: preference,
      signature: None,
    }
  }

  fn notification(partner_id: Uuid, is_read: bool) -> Notification {
    Notification {
      notification_id: Uuid::new_v4(),
      partner_id,
      message_id: Uuid::new_v4(),
      is_read,
      starred: false,
    }
  }

  fn message(author_email: Option<&str>) -> Message {
    Message {
      message_id:       Uuid::new_v4(),
      body:             "<p>hi</p>".into(),
      author:           author_email.map(|e| MessageAuthor {
        partner_id: Uuid::new_v4(),
        email:      Some(e.into()),
      }),
      parent_thread_id: None,
      document:         None,
      subtype:          None,
    }
  }

  fn setup(
    entries: Vec<(Partner, bool)>,
  ) -> (Vec<Notification>, HashMap<Uuid, Partner>) {
    let mut notifications = Vec::new();
    let mut partners = HashMap::new();
    for (partner, is_read) in entries {
      notifications.push(notification(partner.partner_id, is_read));
      partners.insert(partner.partner_id, partner);
    }
    (notifications, partners)
  }

  #[test]
  fn unread_partner_with_email_is_eligible() {
    let (notifications, partners) = setup(vec![(
      partner(Some("a@x.com"), EmailPreference::Always),
      false,
    )]);
    let eligible =
      eligible_for_email(&notifications, &partners, &message(None));
    assert_eq!(eligible.len(), 1);
  }

  #[test]
  fn read_notifications_are_excluded() {
    let (notifications, partners) = setup(vec![(
      partner(Some("a@x.com"), EmailPreference::Always),
      true,
    )]);
    assert!(
      eligible_for_email(&notifications, &partners, &message(None))
        .is_empty()
    );
  }

  #[test]
  fn missing_or_empty_email_is_excluded() {
    let (notifications, partners) = setup(vec![
      (partner(None, EmailPreference::Always), false),
      (partner(Some(""), EmailPreference::Always), false),
    ]);
    assert!(
      eligible_for_email(&notifications, &partners, &message(None))
        .is_empty()
    );
  }

  #[test]
  fn opted_out_partner_is_excluded() {
    let (notifications, partners) = setup(vec![(
      partner(Some("a@x.com"), EmailPreference::None),
      false,
    )]);
    assert!(
      eligible_for_email(&notifications, &partners, &message(None))
        .is_empty()
    );
  }

  #[test]
  fn author_email_match_is_excluded() {
    let (notifications, partners) = setup(vec![(
      partner(Some("a@x.com"), EmailPreference::Always),
      false,
    )]);
    assert!(
      eligible_for_email(&notifications, &partners, &message(Some("a@x.com")))
        .is_empty()
    );
  }

  #[test]
  fn author_email_comparison_is_case_sensitive() {
    // "A@x.com" is not deduped against "a@x.com" — exact match only.
    let (notifications, partners) = setup(vec![(
      partner(Some("a@x.com"), EmailPreference::Always),
      false,
    )]);
    let eligible =
      eligible_for_email(&notifications, &partners, &message(Some("A@x.com")));
    assert_eq!(eligible.len(), 1);
  }

  #[test]
  fn unknown_partner_is_silently_ineligible() {
    let notifications = vec![notification(Uuid::new_v4(), false)];
    let partners = HashMap::new();
    assert!(
      eligible_for_email(&notifications, &partners, &message(None))
        .is_empty()
    );
  }

  #[test]
  fn result_preserves_notification_order() {
    let a = partner(Some("a@x.com"), EmailPreference::Always);
    let b = partner(Some("b@x.com"), EmailPreference::Always);
    let c = partner(Some("c@x.com"), EmailPreference::Always);
    let expected = vec![a.partner_id, b.partner_id, c.partner_id];

    let (notifications, partners) =
      setup(vec![(a, false), (b, false), (c, false)]);
    assert_eq!(
      eligible_for_email(&notifications, &partners, &message(None)),
      expected
    );
  }
}
