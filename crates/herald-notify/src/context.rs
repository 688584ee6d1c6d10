//! Execution-context flags consumed by the engine.

/// Caller-supplied flags gating email delivery for one notify call.
#[derive(Debug, Clone, Default)]
pub struct NotifyContext {
  /// Update notification state but send no email at all.
  pub suppress_email:   bool,
  /// The system is still loading its registry (e.g. a command-line schema
  /// update); immediate sends are skipped in this state.
  pub registry_loading: bool,
  /// Test executions may send immediately even while the registry loads.
  pub test_mode:        bool,
  /// Override for the envelope auto-delete flag (default true).
  pub auto_delete:      Option<bool>,
  /// Outgoing mail server override.
  pub server_id:        Option<String>,
}

impl NotifyContext {
  /// Whether the immediate-send path may run at all in this context.
  pub fn immediate_send_allowed(&self) -> bool {
    !self.registry_loading || self.test_mode
  }
}
