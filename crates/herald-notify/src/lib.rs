//! The Herald fan-out engine.
//!
//! Given a posted message and a candidate recipient set, [`Notifier::notify`]
//! reconciles per-partner notification records, filters the email-eligible
//! subset, composes the outbound body, and partitions delivery into
//! bounded-size envelopes with an immediate-vs-queued send policy.
//!
//! The engine is generic over any backend implementing the `herald-core`
//! ports; `herald-store-sqlite` provides the reference implementation.

pub mod context;
pub mod filter;
pub mod footer;
pub mod overrides;
pub mod reconcile;

mod notifier;

pub use context::NotifyContext;
pub use notifier::{MAX_RECIPIENTS_PER_ENVELOPE, Notifier, NotifyOutcome};

use herald_core::store::{NotificationStore, OutboundMailer, PartnerDirectory};

/// The three ports the notifier needs, unified behind one error type.
pub trait NotifyStore:
  NotificationStore<Error = Self::Err>
  + PartnerDirectory<Error = Self::Err>
  + OutboundMailer<Error = Self::Err>
{
  type Err: std::error::Error + Send + Sync + 'static;
}

impl<T, E> NotifyStore for T
where
  T: NotificationStore<Error = E>
    + PartnerDirectory<Error = E>
    + OutboundMailer<Error = E>,
  E: std::error::Error + Send + Sync + 'static,
{
  type Err = E;
}
