//! Document references — the (model, id) pair a subscription points at.

use serde::{Deserialize, Serialize};

/// `res_id` value meaning "every instance of the model".
pub const ALL_INSTANCES: i64 = 0;

/// A reference to one document (or, with `res_id == 0`, to every document of
/// the model).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
  pub model:  String,
  pub res_id: i64,
}

impl DocumentRef {
  pub fn new(model: impl Into<String>, res_id: i64) -> Self {
    Self {
      model: model.into(),
      res_id,
    }
  }

  /// Whether a subscription at `self` covers `other`. A wildcard subscription
  /// (`res_id == 0`) covers every instance of its model.
  pub fn covers(&self, other: &DocumentRef) -> bool {
    self.model == other.model
      && (self.res_id == ALL_INSTANCES || self.res_id == other.res_id)
  }
}

impl std::fmt::Display for DocumentRef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{},{}", self.model, self.res_id)
  }
}
