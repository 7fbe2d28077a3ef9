//! Result of applying one delivery event to the store.

/// Explicit outcome of `EmailRepository::apply_event`; reconciliation problems
/// are data, not errors, so a batch of independent notifications never needs
/// exception-style short-circuiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Event applied; `status_changed` is false when only a counter moved or
    /// the status update was blocked by a more terminal status.
    Applied { status_changed: bool },
    /// Dedup key already seen; nothing was modified.
    Duplicate,
    /// No record matches the event's provider message id.
    NoMatch,
    /// Event kind carries no effect (send, reject, unrecognized); acknowledged
    /// and discarded.
    Ignored,
}
