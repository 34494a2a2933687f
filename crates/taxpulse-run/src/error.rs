//! Run-level errors.

use taxpulse_core::{CompanyCode, Period, TaxType};
use taxpulse_registry::ConfigError;
use taxpulse_state::{ReturnState, TransitionError};
use thiserror::Error;

/// Errors from the compute pipeline and return store.
#[derive(Error, Debug)]
pub enum RunError {
    /// Registry or snapshot configuration defect.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A lifecycle guard rejected the requested transition.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The current return version is frozen; its figures cannot change.
    #[error("return {company}/{tax_type}/{period} is {state} and cannot be recomputed")]
    Frozen {
        /// Company the return is for.
        company: CompanyCode,
        /// Tax obligation the return covers.
        tax_type: TaxType,
        /// Filing period.
        period: Period,
        /// The state refusing the computation.
        state: ReturnState,
    },

    /// No return exists under the requested key.
    #[error("no return exists for {company}/{tax_type}/{period}")]
    UnknownReturn {
        /// Company the return is for.
        company: CompanyCode,
        /// Tax obligation the return covers.
        tax_type: TaxType,
        /// Filing period.
        period: Period,
    },
}
