//! # taxpulse-state — Return Lifecycle
//!
//! The maker-checker state machine a tax return moves through between
//! computation and filing, and the append-only approval log that records
//! every attempt to move it.
//!
//! The state machine holds no tax figures. The run layer owns the
//! computed artifacts and freezes them when a return leaves Draft; this
//! crate decides *whether* it may leave, and who is allowed to say so.

pub mod actor;
pub mod lifecycle;

pub use actor::{Actor, Role};
pub use lifecycle::{
    ApprovalLogEntry, ReturnState, TaxReturn, TransitionError, ValidationSummary,
};
