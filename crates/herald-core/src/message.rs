//! Message — the read-only input the engine is notified about.
//!
//! Messages live in an external system; the engine only needs the fields
//! below and never writes them back.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::DocumentRef;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageAuthor {
  pub partner_id: Uuid,
  pub email:      Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
  pub message_id:       Uuid,
  /// HTML body.
  pub body:             String,
  pub author:           Option<MessageAuthor>,
  /// Thread identifier of the parent message, used for the References
  /// header of outbound mail.
  pub parent_thread_id: Option<String>,
  /// The document the message was posted on, if any.
  pub document:         Option<DocumentRef>,
  pub subtype:          Option<String>,
}
