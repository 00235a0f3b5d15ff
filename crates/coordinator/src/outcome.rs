//! Status-code-agnostic outcomes of a reserve/release call. The HTTP
//! boundary maps these to status codes and response envelopes; the
//! coordinator itself knows nothing about HTTP.

/// Result of the reserve flow (`/v1/pre-reboot`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Reserved (and, if clustered, drained). Maps to 200 `success`.
    Success,
    /// Group is at capacity. Maps to 423 `all_slots_full`.
    AllSlotsFull,
    /// Reserved; drain running in the background. Maps to 202
    /// `waiting_for_node_drain`.
    WaitingForNodeDrain,
    /// Backend or cluster failure. Maps to 500 `error`.
    Error,
}

/// Result of the release flow (`/v1/steady-state`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Released (and, if clustered, uncordoned). Maps to 200 `success`.
    Success,
    /// Backend or cluster failure. Maps to 500 `error`.
    Error,
}
