//! # Versioned Return Store
//!
//! In-memory storage for returns, keyed by (company, tax type, period).
//! Each key holds a version history; only the newest version is ever
//! acted on, and a Filed version is immutable forever. All access goes
//! through one mutex, so a compute-and-commit is atomic with respect to
//! concurrent lifecycle transitions.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use taxpulse_core::{CompanyCode, Period, ReturnId, TaxType};
use taxpulse_registry::Registry;
use taxpulse_state::{Actor, ReturnState, TaxReturn};

use crate::error::RunError;
use crate::pipeline::{compute, RunConfig, RunOutcome, RunRequest};

type ReturnKey = (CompanyCode, TaxType, Period);

/// One stored return version: the lifecycle record plus the computed
/// artifacts backing it.
#[derive(Debug, Clone)]
pub struct StoredReturn {
    /// Lifecycle state and approval log.
    pub lifecycle: TaxReturn,
    /// Artifacts from the most recent computation; `None` until the
    /// version has been computed.
    pub outcome: Option<RunOutcome>,
}

/// In-memory, mutex-guarded return storage.
#[derive(Debug, Default)]
pub struct ReturnStore {
    inner: Mutex<BTreeMap<ReturnKey, Vec<StoredReturn>>>,
}

impl ReturnStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute a return and commit it as the current Draft version.
    ///
    /// Creates version 1 if the key is new; updates the Draft in place
    /// if one is open; refuses if the current version is frozen for
    /// review or approval; opens the next version as an amendment if the
    /// current one is Filed. The prior-period figure is resolved from
    /// this store's filed history before computing.
    pub fn compute_and_commit(
        &self,
        registry: &Registry,
        config: &RunConfig,
        mut request: RunRequest<'_>,
    ) -> Result<(ReturnId, RunOutcome), RunError> {
        let mut inner = self.lock();

        if request.prior_amount.is_none() {
            request.prior_amount = prior_filed_amount(&inner, &request);
        }
        let outcome = compute(registry, config, &request)?;
        let summary = outcome.summary();

        let key = (
            request.company_code.clone(),
            request.tax_type,
            request.period,
        );
        let versions = inner.entry(key).or_default();

        match versions.last().map(|stored| stored.lifecycle.state) {
            None => {
                let mut lifecycle = TaxReturn::new(
                    request.company_code.clone(),
                    request.tax_type,
                    request.period,
                    1,
                );
                lifecycle.record_computation(summary)?;
                versions.push(StoredReturn {
                    lifecycle,
                    outcome: Some(outcome.clone()),
                });
            }
            Some(ReturnState::Draft) => {
                if let Some(stored) = versions.last_mut() {
                    stored.lifecycle.record_computation(summary)?;
                    stored.outcome = Some(outcome.clone());
                }
            }
            Some(state @ (ReturnState::ForReview | ReturnState::Approved)) => {
                return Err(RunError::Frozen {
                    company: request.company_code.clone(),
                    tax_type: request.tax_type,
                    period: request.period,
                    state,
                });
            }
            Some(ReturnState::Filed) => {
                let next_version = versions.len() as u32 + 1;
                tracing::info!(
                    company = %request.company_code,
                    period = %request.period,
                    version = next_version,
                    "opening amendment of filed return"
                );
                let mut lifecycle = TaxReturn::new(
                    request.company_code.clone(),
                    request.tax_type,
                    request.period,
                    next_version,
                );
                lifecycle.record_computation(summary)?;
                versions.push(StoredReturn {
                    lifecycle,
                    outcome: Some(outcome.clone()),
                });
            }
        }

        let id = versions
            .last()
            .map(|stored| stored.lifecycle.id)
            .unwrap_or_default();
        Ok((id, outcome))
    }

    /// Submit the current version for review.
    pub fn submit_for_review(
        &self,
        company: &CompanyCode,
        tax_type: TaxType,
        period: Period,
        actor: Actor,
        comment: Option<String>,
    ) -> Result<(), RunError> {
        self.with_current(company, tax_type, period, |stored| {
            stored.lifecycle.submit_for_review(actor, comment)?;
            Ok(())
        })
    }

    /// Approve the current version.
    pub fn approve(
        &self,
        company: &CompanyCode,
        tax_type: TaxType,
        period: Period,
        actor: Actor,
        comment: Option<String>,
    ) -> Result<(), RunError> {
        self.with_current(company, tax_type, period, |stored| {
            stored.lifecycle.approve(actor, comment)?;
            Ok(())
        })
    }

    /// Reject the current version back to Draft.
    pub fn reject(
        &self,
        company: &CompanyCode,
        tax_type: TaxType,
        period: Period,
        actor: Actor,
        reason: String,
    ) -> Result<(), RunError> {
        self.with_current(company, tax_type, period, |stored| {
            stored.lifecycle.reject(actor, reason)?;
            Ok(())
        })
    }

    /// File the current version with the authority's reference.
    pub fn file(
        &self,
        company: &CompanyCode,
        tax_type: TaxType,
        period: Period,
        actor: Actor,
        filing_reference: String,
        filing_date: NaiveDate,
    ) -> Result<(), RunError> {
        self.with_current(company, tax_type, period, |stored| {
            stored
                .lifecycle
                .file(actor, filing_reference, filing_date)?;
            Ok(())
        })
    }

    /// A clone of the current version under a key, if any.
    pub fn current(
        &self,
        company: &CompanyCode,
        tax_type: TaxType,
        period: Period,
    ) -> Option<StoredReturn> {
        let inner = self.lock();
        inner
            .get(&(company.clone(), tax_type, period))
            .and_then(|versions| versions.last())
            .cloned()
    }

    /// A clone of the full version history under a key.
    pub fn versions(
        &self,
        company: &CompanyCode,
        tax_type: TaxType,
        period: Period,
    ) -> Vec<StoredReturn> {
        let inner = self.lock();
        inner
            .get(&(company.clone(), tax_type, period))
            .cloned()
            .unwrap_or_default()
    }

    fn with_current<F>(
        &self,
        company: &CompanyCode,
        tax_type: TaxType,
        period: Period,
        f: F,
    ) -> Result<(), RunError>
    where
        F: FnOnce(&mut StoredReturn) -> Result<(), RunError>,
    {
        let mut inner = self.lock();
        let stored = inner
            .get_mut(&(company.clone(), tax_type, period))
            .and_then(|versions| versions.last_mut())
            .ok_or_else(|| RunError::UnknownReturn {
                company: company.clone(),
                tax_type,
                period,
            })?;
        f(stored)
    }

    /// Lock the store, recovering from a poisoned mutex. The data is
    /// plain values; a panic mid-update cannot leave a torn record.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<ReturnKey, Vec<StoredReturn>>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// The control amount of the latest Filed version for the preceding
/// period, if one exists.
fn prior_filed_amount(
    inner: &BTreeMap<ReturnKey, Vec<StoredReturn>>,
    request: &RunRequest<'_>,
) -> Option<Decimal> {
    let prior_key = (
        request.company_code.clone(),
        request.tax_type,
        request.period.preceding(),
    );
    inner.get(&prior_key).and_then(|versions| {
        versions
            .iter()
            .rev()
            .find(|stored| stored.lifecycle.state == ReturnState::Filed)
            .and_then(|stored| stored.outcome.as_ref())
            .map(|outcome| outcome.control_amount)
    })
}
