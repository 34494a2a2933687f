//! # Return Lifecycle State Machine
//!
//! Models the maker-checker lifecycle of one tax return version.
//!
//! ## States
//!
//! ```text
//! Draft ──▶ ForReview ──▶ Approved ──▶ Filed (terminal)
//!   ▲           │
//!   └───────────┘ (rejection)
//! ```
//!
//! ## Design Decision
//!
//! Four states with one loop-back do not justify typestate types; the
//! enum with guarded `Result` transitions keeps the whole lifecycle in
//! one readable impl and lets the approval log record refused attempts
//! alongside performed transitions. The guards carry the governance
//! rules: a return with blocking validation errors cannot leave Draft,
//! outstanding warnings need an acknowledgment comment from both the
//! submitter and the approver, the reviewer must be a different person
//! than the submitter, and filing requires the authority's reference.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use taxpulse_core::{CompanyCode, Period, ReturnId, TaxType, Tin};

use crate::actor::{Actor, Role};

// ─── States ──────────────────────────────────────────────────────────

/// The lifecycle state of a return version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnState {
    /// Being prepared; recomputation allowed.
    Draft,
    /// Submitted for review; figures frozen.
    ForReview,
    /// Review passed; awaiting filing.
    Approved,
    /// Filed with the authority (terminal).
    Filed,
}

impl ReturnState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Filed)
    }

    /// Whether the computed figures may still change.
    pub fn is_mutable(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl std::fmt::Display for ReturnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Draft => "DRAFT",
            Self::ForReview => "FOR_REVIEW",
            Self::Approved => "APPROVED",
            Self::Filed => "FILED",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors rejecting a lifecycle transition.
#[derive(Error, Debug)]
pub enum TransitionError {
    /// Attempted transition is not valid from the current state.
    #[error("invalid return transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: ReturnState,
        /// Attempted target state.
        to: ReturnState,
    },

    /// The return is filed and can never transition again.
    #[error("return {return_id} is filed and immutable")]
    AlreadyFiled {
        /// The return identifier.
        return_id: ReturnId,
    },

    /// The return has never been computed.
    #[error("return has no computed validation result; run compute first")]
    NotComputed,

    /// Blocking validation errors prevent submission.
    #[error("{blocking} blocking validation error(s) prevent submission for review")]
    ValidationBlocked {
        /// Number of error-level violations.
        blocking: usize,
    },

    /// Warnings present and no acknowledgment comment given.
    #[error("{warnings} validation warning(s) must be acknowledged with a comment")]
    WarningsUnacknowledged {
        /// Number of warning-level violations.
        warnings: usize,
    },

    /// The actor's role does not permit the transition.
    #[error("actor {actor} may not perform this transition; {required} role required")]
    WrongRole {
        /// The acting user.
        actor: String,
        /// The role the transition requires.
        required: Role,
    },

    /// The reviewer is the same person who submitted.
    #[error("actor {actor} submitted this return and cannot review it")]
    SelfReview {
        /// The acting user.
        actor: String,
    },

    /// A rejection was attempted without a reason.
    #[error("rejection requires a reason")]
    MissingRejectReason,

    /// Filing was attempted without the authority's reference.
    #[error("filing requires the authority's confirmation reference")]
    MissingFilingReference,
}

// ─── Approval Log ────────────────────────────────────────────────────

/// Frozen counts from the validation run backing a submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Error-level violations.
    pub errors: usize,
    /// Warning-level violations.
    pub warnings: usize,
}

/// One entry in a return's append-only approval log.
///
/// Every attempt is logged: performed transitions, reviewer rejections,
/// and guard-refused attempts. The log is the audit trail, so refusals
/// are as much a part of it as approvals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalLogEntry {
    /// Who acted.
    pub actor: Actor,
    /// State before the action.
    pub from_state: ReturnState,
    /// Attempted target state. The return stays in `from_state` when
    /// the attempt was refused by a guard.
    pub to_state: ReturnState,
    /// When the action was recorded.
    pub at: DateTime<Utc>,
    /// `true` for a performed submit/approve/file; `false` for a
    /// reviewer rejection or a guard-refused attempt.
    pub accepted: bool,
    /// Free-text comment; carries the rejection or refusal reason, or
    /// the warning acknowledgment.
    pub comment: Option<String>,
}

// ─── Return ──────────────────────────────────────────────────────────

/// One version of one return, with its lifecycle state and approval log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxReturn {
    /// Unique return identifier.
    pub id: ReturnId,
    /// Company the return is for.
    pub company_code: CompanyCode,
    /// Tax obligation the return covers.
    pub tax_type: TaxType,
    /// Filing period.
    pub period: Period,
    /// Taxpayer identification number on the return header.
    #[serde(default)]
    pub tin: Option<Tin>,
    /// BIR revenue district office code.
    #[serde(default)]
    pub rdo_code: Option<String>,
    /// Version number; amendments of a filed return get a new version.
    pub version: u32,
    /// Current lifecycle state.
    pub state: ReturnState,
    /// Validation counts from the most recent computation.
    pub validation: Option<ValidationSummary>,
    /// Authority confirmation reference, set at filing.
    pub filing_reference: Option<String>,
    /// Date the return was filed, set at filing.
    pub filing_date: Option<NaiveDate>,
    /// When this version was created.
    pub created_at: DateTime<Utc>,
    /// Ordered log of all lifecycle actions, including rejections.
    pub approval_log: Vec<ApprovalLogEntry>,
}

impl TaxReturn {
    /// Create a new Draft return version.
    pub fn new(
        company_code: CompanyCode,
        tax_type: TaxType,
        period: Period,
        version: u32,
    ) -> Self {
        Self {
            id: ReturnId::new(),
            company_code,
            tax_type,
            period,
            tin: None,
            rdo_code: None,
            version,
            state: ReturnState::Draft,
            validation: None,
            filing_reference: None,
            filing_date: None,
            created_at: Utc::now(),
            approval_log: Vec::new(),
        }
    }

    /// Record the validation counts of a fresh computation.
    ///
    /// Only Draft returns may be recomputed; anywhere else the figures
    /// are frozen.
    pub fn record_computation(
        &mut self,
        summary: ValidationSummary,
    ) -> Result<(), TransitionError> {
        self.require_state(ReturnState::Draft, ReturnState::Draft)?;
        self.validation = Some(summary);
        Ok(())
    }

    /// Submit for review (DRAFT → FOR_REVIEW).
    ///
    /// Requires a computed return with no blocking errors; outstanding
    /// warnings must be acknowledged with a comment.
    pub fn submit_for_review(
        &mut self,
        actor: Actor,
        comment: Option<String>,
    ) -> Result<(), TransitionError> {
        self.require_state(ReturnState::Draft, ReturnState::ForReview)?;
        if let Err(err) = self.submit_guards(&actor, comment.as_deref()) {
            return Err(self.refuse(actor, ReturnState::ForReview, err));
        }
        self.do_transition(actor, ReturnState::ForReview, true, comment);
        Ok(())
    }

    fn submit_guards(&self, actor: &Actor, comment: Option<&str>) -> Result<(), TransitionError> {
        require_role(actor, Role::Preparer)?;
        let summary = self.validation.ok_or(TransitionError::NotComputed)?;
        if summary.errors > 0 {
            return Err(TransitionError::ValidationBlocked {
                blocking: summary.errors,
            });
        }
        require_warning_ack(summary.warnings, comment)
    }

    /// Approve (FOR_REVIEW → APPROVED).
    ///
    /// The reviewer must not be the person who submitted, and must
    /// acknowledge outstanding warnings with a comment.
    pub fn approve(
        &mut self,
        actor: Actor,
        comment: Option<String>,
    ) -> Result<(), TransitionError> {
        self.require_state(ReturnState::ForReview, ReturnState::Approved)?;
        if let Err(err) = self.approve_guards(&actor, comment.as_deref()) {
            return Err(self.refuse(actor, ReturnState::Approved, err));
        }
        self.do_transition(actor, ReturnState::Approved, true, comment);
        Ok(())
    }

    fn approve_guards(&self, actor: &Actor, comment: Option<&str>) -> Result<(), TransitionError> {
        require_role(actor, Role::Reviewer)?;
        self.require_distinct_reviewer(actor)?;
        require_warning_ack(self.validation.map_or(0, |s| s.warnings), comment)
    }

    /// Reject back to the preparer (FOR_REVIEW → DRAFT).
    ///
    /// A reason is mandatory and is logged as the entry's comment.
    pub fn reject(&mut self, actor: Actor, reason: String) -> Result<(), TransitionError> {
        self.require_state(ReturnState::ForReview, ReturnState::Draft)?;
        if let Err(err) = self.reject_guards(&actor, &reason) {
            return Err(self.refuse(actor, ReturnState::Draft, err));
        }
        self.do_transition(actor, ReturnState::Draft, false, Some(reason));
        Ok(())
    }

    fn reject_guards(&self, actor: &Actor, reason: &str) -> Result<(), TransitionError> {
        require_role(actor, Role::Reviewer)?;
        self.require_distinct_reviewer(actor)?;
        if reason.trim().is_empty() {
            return Err(TransitionError::MissingRejectReason);
        }
        Ok(())
    }

    /// Registered agency details for the return header.
    pub fn with_agency(mut self, tin: Tin, rdo_code: impl Into<String>) -> Self {
        self.tin = Some(tin);
        self.rdo_code = Some(rdo_code.into());
        self
    }

    /// File with the authority (APPROVED → FILED, terminal).
    ///
    /// A reviewer may file directly where no separate filer role exists.
    pub fn file(
        &mut self,
        actor: Actor,
        filing_reference: String,
        filing_date: NaiveDate,
    ) -> Result<(), TransitionError> {
        self.require_state(ReturnState::Approved, ReturnState::Filed)?;
        if let Err(err) = file_guards(&actor, &filing_reference) {
            return Err(self.refuse(actor, ReturnState::Filed, err));
        }
        self.filing_reference = Some(filing_reference.clone());
        self.filing_date = Some(filing_date);
        self.do_transition(actor, ReturnState::Filed, true, Some(filing_reference));
        Ok(())
    }

    /// Whether the return is filed.
    pub fn is_filed(&self) -> bool {
        self.state.is_terminal()
    }

    /// The actor who most recently moved the return into review.
    fn last_submitter(&self) -> Option<&Actor> {
        self.approval_log
            .iter()
            .rev()
            .find(|entry| entry.to_state == ReturnState::ForReview && entry.accepted)
            .map(|entry| &entry.actor)
    }

    fn require_distinct_reviewer(&self, actor: &Actor) -> Result<(), TransitionError> {
        if self.last_submitter().map(|a| a.id.as_str()) == Some(actor.id.as_str()) {
            return Err(TransitionError::SelfReview {
                actor: actor.id.clone(),
            });
        }
        Ok(())
    }

    /// Validate that the return is in the expected state.
    fn require_state(
        &self,
        expected: ReturnState,
        target: ReturnState,
    ) -> Result<(), TransitionError> {
        if self.state.is_terminal() {
            return Err(TransitionError::AlreadyFiled {
                return_id: self.id,
            });
        }
        if self.state != expected {
            return Err(TransitionError::InvalidTransition {
                from: self.state,
                to: target,
            });
        }
        Ok(())
    }

    /// Record a lifecycle action and move to the target state.
    fn do_transition(
        &mut self,
        actor: Actor,
        to: ReturnState,
        accepted: bool,
        comment: Option<String>,
    ) {
        self.approval_log.push(ApprovalLogEntry {
            actor,
            from_state: self.state,
            to_state: to,
            at: Utc::now(),
            accepted,
            comment,
        });
        self.state = to;
    }

    /// Record a guard-refused attempt. The state does not change; the
    /// refusal reason lands in the entry's comment.
    fn refuse(
        &mut self,
        actor: Actor,
        attempted: ReturnState,
        err: TransitionError,
    ) -> TransitionError {
        self.approval_log.push(ApprovalLogEntry {
            actor,
            from_state: self.state,
            to_state: attempted,
            at: Utc::now(),
            accepted: false,
            comment: Some(err.to_string()),
        });
        err
    }
}

fn require_role(actor: &Actor, required: Role) -> Result<(), TransitionError> {
    if actor.role != required {
        return Err(TransitionError::WrongRole {
            actor: actor.id.clone(),
            required,
        });
    }
    Ok(())
}

fn require_warning_ack(warnings: usize, comment: Option<&str>) -> Result<(), TransitionError> {
    if warnings > 0 && comment.map_or(true, str::is_empty) {
        return Err(TransitionError::WarningsUnacknowledged { warnings });
    }
    Ok(())
}

fn file_guards(actor: &Actor, filing_reference: &str) -> Result<(), TransitionError> {
    if !matches!(actor.role, Role::Filer | Role::Reviewer) {
        return Err(TransitionError::WrongRole {
            actor: actor.id.clone(),
            required: Role::Filer,
        });
    }
    if filing_reference.trim().is_empty() {
        return Err(TransitionError::MissingFilingReference);
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────
