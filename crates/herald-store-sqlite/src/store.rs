//! [`SqliteStore`] — the SQLite implementation of every Herald port.

use std::{
  collections::{BTreeSet, HashMap},
  path::Path,
  sync::Arc,
};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, types::Value};
use uuid::Uuid;

use herald_core::{
  document::DocumentRef,
  mail::{Envelope, EnvelopeStatus, NewEnvelope},
  notification::Notification,
  partner::{NewPartner, Partner},
  store::{
    AccessCacheInvalidator, InboxQuery, NoopInvalidator, NotificationStore,
    OutboundMailer, PartnerDirectory, SubscriptionStore, Visibility,
  },
  subscription::Subscription,
};

use crate::{
  encode::{
    RawEnvelope, RawNotification, RawPartner, RawSubscription, encode_dt,
    encode_headers, encode_preference, encode_recipients, encode_status,
    encode_subtypes, encode_uuid,
  },
  error::{Error, Result},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Herald store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. The store
/// owns an [`AccessCacheInvalidator`] that fires synchronously after every
/// subscription mutation.
#[derive(Clone)]
pub struct SqliteStore {
  conn:        tokio_rusqlite::Connection,
  invalidator: Arc<dyn AccessCacheInvalidator>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self {
      conn,
      invalidator: Arc::new(NoopInvalidator),
    };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self {
      conn,
      invalidator: Arc::new(NoopInvalidator),
    };
    store.init_schema().await?;
    Ok(store)
  }

  /// Replace the access-cache invalidation hook.
  pub fn with_invalidator(
    mut self,
    invalidator: Arc<dyn AccessCacheInvalidator>,
  ) -> Self {
    self.invalidator = invalidator;
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch one subscription row by its natural key.
  async fn subscription_row(
    &self,
    document: &DocumentRef,
    partner_id: Uuid,
  ) -> Result<Option<Subscription>> {
    let model = document.model.clone();
    let res_id = document.res_id;
    let partner_str = encode_uuid(partner_id);

    let raw: Option<RawSubscription> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT subscription_id, model, res_id, partner_id, subtypes, created_at
               FROM followers
               WHERE model = ?1 AND res_id = ?2 AND partner_id = ?3",
              rusqlite::params![model, res_id, partner_str],
              |row| {
                Ok(RawSubscription {
                  subscription_id: row.get(0)?,
                  model:           row.get(1)?,
                  res_id:          row.get(2)?,
                  partner_id:      row.get(3)?,
                  subtypes:        row.get(4)?,
                  created_at:      row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubscription::into_subscription).transpose()
  }
}

/// Map a UNIQUE-constraint failure on the followers table to the typed
/// conflict error; pass everything else through.
fn map_follow_conflict(
  e: tokio_rusqlite::Error,
  document: &DocumentRef,
  partner_id: Uuid,
) -> Error {
  if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
    failure,
    _,
  )) = &e
    && failure.code == rusqlite::ErrorCode::ConstraintViolation
  {
    return Error::AlreadyFollowing {
      model: document.model.clone(),
      res_id: document.res_id,
      partner_id,
    };
  }
  Error::Database(e)
}

/// `?, ?, ...` — placeholder list for a dynamic IN clause.
fn placeholders(count: usize) -> String { vec!["?"; count].join(", ") }

// ─── SubscriptionStore impl ──────────────────────────────────────────────────

impl SubscriptionStore for SqliteStore {
  type Error = Error;

  async fn follow(
    &self,
    document: DocumentRef,
    partner_id: Uuid,
    subtypes: BTreeSet<String>,
  ) -> Result<Subscription> {
    let subscription = Subscription {
      subscription_id: Uuid::new_v4(),
      document: document.clone(),
      partner_id,
      subtypes,
      created_at: Utc::now(),
    };

    let id_str       = encode_uuid(subscription.subscription_id);
    let model        = document.model.clone();
    let res_id       = document.res_id;
    let partner_str  = encode_uuid(partner_id);
    let subtypes_str = encode_subtypes(&subscription.subtypes)?;
    let at_str       = encode_dt(subscription.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO followers
             (subscription_id, model, res_id, partner_id, subtypes, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str,
            model,
            res_id,
            partner_str,
            subtypes_str,
            at_str
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(|e| map_follow_conflict(e, &document, partner_id))?;

    self.invalidator.invalidate();
    Ok(subscription)
  }

  async fn unfollow(
    &self,
    document: &DocumentRef,
    partner_id: Uuid,
  ) -> Result<bool> {
    let model = document.model.clone();
    let res_id = document.res_id;
    let partner_str = encode_uuid(partner_id);

    let deleted: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM followers
           WHERE model = ?1 AND res_id = ?2 AND partner_id = ?3",
          rusqlite::params![model, res_id, partner_str],
        )?)
      })
      .await?;

    if deleted > 0 {
      self.invalidator.invalidate();
    }
    Ok(deleted > 0)
  }

  async fn set_subtypes(
    &self,
    document: &DocumentRef,
    partner_id: Uuid,
    subtypes: BTreeSet<String>,
  ) -> Result<Subscription> {
    let model = document.model.clone();
    let res_id = document.res_id;
    let partner_str = encode_uuid(partner_id);
    let subtypes_str = encode_subtypes(&subtypes)?;

    let updated: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE followers SET subtypes = ?1
           WHERE model = ?2 AND res_id = ?3 AND partner_id = ?4",
          rusqlite::params![subtypes_str, model, res_id, partner_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::SubscriptionNotFound(partner_id));
    }

    self.invalidator.invalidate();

    self
      .subscription_row(document, partner_id)
      .await?
      .ok_or(Error::SubscriptionNotFound(partner_id))
  }

  async fn followers_of(
    &self,
    document: &DocumentRef,
  ) -> Result<Vec<Subscription>> {
    let model = document.model.clone();
    let res_id = document.res_id;

    let raws: Vec<RawSubscription> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT subscription_id, model, res_id, partner_id, subtypes, created_at
           FROM followers
           WHERE model = ?1 AND (res_id = ?2 OR res_id = 0)
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![model, res_id], |row| {
            Ok(RawSubscription {
              subscription_id: row.get(0)?,
              model:           row.get(1)?,
              res_id:          row.get(2)?,
              partner_id:      row.get(3)?,
              subtypes:        row.get(4)?,
              created_at:      row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawSubscription::into_subscription)
      .collect()
  }

  async fn followers_for_subtype(
    &self,
    document: &DocumentRef,
    subtype: &str,
  ) -> Result<Vec<Uuid>> {
    let subscriptions = self.followers_of(document).await?;
    Ok(
      subscriptions
        .into_iter()
        .filter(|s| s.subtypes.contains(subtype))
        .map(|s| s.partner_id)
        .collect(),
    )
  }

  async fn subscriptions_of(&self, partner_id: Uuid) -> Result<Vec<Subscription>> {
    let partner_str = encode_uuid(partner_id);

    let raws: Vec<RawSubscription> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT subscription_id, model, res_id, partner_id, subtypes, created_at
           FROM followers
           WHERE partner_id = ?1
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![partner_str], |row| {
            Ok(RawSubscription {
              subscription_id: row.get(0)?,
              model:           row.get(1)?,
              res_id:          row.get(2)?,
              partner_id:      row.get(3)?,
              subtypes:        row.get(4)?,
              created_at:      row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawSubscription::into_subscription)
      .collect()
  }
}

// ─── NotificationStore impl ──────────────────────────────────────────────────

impl NotificationStore for SqliteStore {
  type Error = Error;

  async fn notifications_for_message(
    &self,
    message_id: Uuid,
    partner_ids: &[Uuid],
    document: Option<&DocumentRef>,
    visibility: Visibility,
  ) -> Result<Vec<Notification>> {
    let message_str = encode_uuid(message_id);
    let partner_strs: Vec<String> =
      partner_ids.iter().copied().map(encode_uuid).collect();
    // The follower check only applies in enforced mode.
    let follower_check = match visibility {
      Visibility::Enforced => document.cloned(),
      Visibility::Bypass => None,
    };

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut sql = String::from(
          "SELECT n.notification_id, n.partner_id, n.message_id, n.is_read, n.starred
           FROM notifications n
           WHERE n.message_id = ?",
        );
        let mut values: Vec<Value> = vec![Value::Text(message_str)];

        if !partner_strs.is_empty() {
          sql.push_str(&format!(
            " AND n.partner_id IN ({})",
            placeholders(partner_strs.len())
          ));
          values.extend(partner_strs.into_iter().map(Value::Text));
        }

        if let Some(doc) = follower_check {
          sql.push_str(
            " AND EXISTS (SELECT 1 FROM followers f
               WHERE f.partner_id = n.partner_id
                 AND f.model = ? AND (f.res_id = ? OR f.res_id = 0))",
          );
          values.push(Value::Text(doc.model));
          values.push(Value::Integer(doc.res_id));
        }

        sql.push_str(" ORDER BY n.rowid");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(values), |row| {
            Ok(RawNotification {
              notification_id: row.get(0)?,
              partner_id:      row.get(1)?,
              message_id:      row.get(2)?,
              is_read:         row.get(3)?,
              starred:         row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawNotification::into_notification)
      .collect()
  }

  async fn create_notification(
    &self,
    message_id: Uuid,
    partner_id: Uuid,
  ) -> Result<Notification> {
    let notification = Notification {
      notification_id: Uuid::new_v4(),
      partner_id,
      message_id,
      is_read: false,
      starred: false,
    };

    let id_str = encode_uuid(notification.notification_id);
    let partner_str = encode_uuid(partner_id);
    let message_str = encode_uuid(message_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications
             (notification_id, partner_id, message_id, is_read, starred)
           VALUES (?1, ?2, ?3, 0, 0)",
          rusqlite::params![id_str, partner_str, message_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(notification)
  }

  async fn mark_unread(&self, notification_ids: &[Uuid]) -> Result<()> {
    if notification_ids.is_empty() {
      return Ok(());
    }
    let id_strs: Vec<String> =
      notification_ids.iter().copied().map(encode_uuid).collect();

    self
      .conn
      .call(move |conn| {
        let sql = format!(
          "UPDATE notifications SET is_read = 0
           WHERE notification_id IN ({})",
          placeholders(id_strs.len())
        );
        conn.execute(
          &sql,
          rusqlite::params_from_iter(id_strs.into_iter().map(Value::Text)),
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn set_read(&self, notification_id: Uuid, is_read: bool) -> Result<()> {
    let id_str = encode_uuid(notification_id);

    let updated: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET is_read = ?1 WHERE notification_id = ?2",
          rusqlite::params![is_read, id_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::NotificationNotFound(notification_id));
    }
    Ok(())
  }

  async fn set_starred(
    &self,
    notification_id: Uuid,
    starred: bool,
  ) -> Result<()> {
    let id_str = encode_uuid(notification_id);

    let updated: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET starred = ?1 WHERE notification_id = ?2",
          rusqlite::params![starred, id_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::NotificationNotFound(notification_id));
    }
    Ok(())
  }

  async fn inbox(&self, query: &InboxQuery) -> Result<Vec<Notification>> {
    let partner_str = encode_uuid(query.partner_id);
    let unread_only = query.unread_only;
    let starred_only = query.starred_only;
    let limit = query.limit.map(|l| l as i64).unwrap_or(-1);

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut sql = String::from(
          "SELECT notification_id, partner_id, message_id, is_read, starred
           FROM notifications
           WHERE partner_id = ?",
        );
        if unread_only {
          sql.push_str(" AND is_read = 0");
        }
        if starred_only {
          sql.push_str(" AND starred = 1");
        }
        sql.push_str(" ORDER BY rowid DESC LIMIT ?");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![partner_str, limit], |row| {
            Ok(RawNotification {
              notification_id: row.get(0)?,
              partner_id:      row.get(1)?,
              message_id:      row.get(2)?,
              is_read:         row.get(3)?,
              starred:         row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawNotification::into_notification)
      .collect()
  }
}

// ─── PartnerDirectory impl ───────────────────────────────────────────────────

impl PartnerDirectory for SqliteStore {
  type Error = Error;

  async fn add_partner(&self, input: NewPartner) -> Result<Partner> {
    let partner = Partner {
      partner_id:       Uuid::new_v4(),
      name:             input.name,
      email:            input.email,
      email_preference: input.email_preference,
      signature:        input.signature,
    };

    let id_str = encode_uuid(partner.partner_id);
    let name = partner.name.clone();
    let email = partner.email.clone();
    let preference = encode_preference(partner.email_preference).to_owned();
    let signature = partner.signature.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO partners
             (partner_id, name, email, email_preference, signature)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, email, preference, signature],
        )?;
        Ok(())
      })
      .await?;

    Ok(partner)
  }

  async fn partner(&self, partner_id: Uuid) -> Result<Option<Partner>> {
    let id_str = encode_uuid(partner_id);

    let raw: Option<RawPartner> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT partner_id, name, email, email_preference, signature
               FROM partners WHERE partner_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawPartner {
                  partner_id:       row.get(0)?,
                  name:             row.get(1)?,
                  email:            row.get(2)?,
                  email_preference: row.get(3)?,
                  signature:        row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPartner::into_partner).transpose()
  }

  async fn partners_by_ids(
    &self,
    partner_ids: &[Uuid],
  ) -> Result<HashMap<Uuid, Partner>> {
    if partner_ids.is_empty() {
      return Ok(HashMap::new());
    }
    let id_strs: Vec<String> =
      partner_ids.iter().copied().map(encode_uuid).collect();

    let raws: Vec<RawPartner> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT partner_id, name, email, email_preference, signature
           FROM partners WHERE partner_id IN ({})",
          placeholders(id_strs.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params_from_iter(id_strs.into_iter().map(Value::Text)),
            |row| {
              Ok(RawPartner {
                partner_id:       row.get(0)?,
                name:             row.get(1)?,
                email:            row.get(2)?,
                email_preference: row.get(3)?,
                signature:        row.get(4)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut map = HashMap::with_capacity(raws.len());
    for raw in raws {
      let partner = raw.into_partner()?;
      map.insert(partner.partner_id, partner);
    }
    Ok(map)
  }
}

// ─── OutboundMailer impl ─────────────────────────────────────────────────────

impl OutboundMailer for SqliteStore {
  type Error = Error;

  async fn create_envelope(&self, input: NewEnvelope) -> Result<Envelope> {
    let envelope = Envelope {
      envelope_id:   Uuid::new_v4(),
      message_id:    input.message_id,
      body_html:     input.body_html,
      recipient_ids: input.recipient_ids,
      references:    input.references,
      auto_delete:   input.auto_delete,
      server_id:     input.server_id,
      extra_headers: input.extra_headers,
      status:        EnvelopeStatus::Queued,
      created_at:    Utc::now(),
    };

    let id_str = encode_uuid(envelope.envelope_id);
    let message_str = encode_uuid(envelope.message_id);
    let body = envelope.body_html.clone();
    let recipients_str = encode_recipients(&envelope.recipient_ids)?;
    let refs = envelope.references.clone();
    let auto_delete = envelope.auto_delete;
    let server_id = envelope.server_id.clone();
    let headers_str = encode_headers(&envelope.extra_headers)?;
    let status_str = encode_status(envelope.status).to_owned();
    let at_str = encode_dt(envelope.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO outbox
             (envelope_id, message_id, body_html, recipient_ids, refs,
              auto_delete, server_id, extra_headers, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            message_str,
            body,
            recipients_str,
            refs,
            auto_delete,
            server_id,
            headers_str,
            status_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(envelope)
  }

  async fn send_now(&self, envelopes: &[Envelope]) -> Result<()> {
    if envelopes.is_empty() {
      return Ok(());
    }
    let id_strs: Vec<String> = envelopes
      .iter()
      .map(|e| encode_uuid(e.envelope_id))
      .collect();

    self
      .conn
      .call(move |conn| {
        let sql = format!(
          "UPDATE outbox SET status = 'sent' WHERE envelope_id IN ({})",
          placeholders(id_strs.len())
        );
        conn.execute(
          &sql,
          rusqlite::params_from_iter(id_strs.into_iter().map(Value::Text)),
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn queued(&self) -> Result<Vec<Envelope>> {
    let raws: Vec<RawEnvelope> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT envelope_id, message_id, body_html, recipient_ids, refs,
                  auto_delete, server_id, extra_headers, status, created_at
           FROM outbox WHERE status = 'queued'
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawEnvelope {
              envelope_id:   row.get(0)?,
              message_id:    row.get(1)?,
              body_html:     row.get(2)?,
              recipient_ids: row.get(3)?,
              refs:          row.get(4)?,
              auto_delete:   row.get(5)?,
              server_id:     row.get(6)?,
              extra_headers: row.get(7)?,
              status:        row.get(8)?,
              created_at:    row.get(9)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEnvelope::into_envelope).collect()
  }
}
