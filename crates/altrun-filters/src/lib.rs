//! Reconciles auto-detected, manual and default filters into the one
//! filter set the event listing uses.

pub mod reconciler;
pub mod session;

pub use reconciler::{FilterReconciler, FilterSignal, ReconcilerState};
pub use session::{Clock, FilterSession, SessionConfig, SessionHandle, DEFAULT_FILTER_DELAY};
