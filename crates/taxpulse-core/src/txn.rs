//! # Canonical Transaction Record
//!
//! The read-only transaction shape the engine consumes. Upstream
//! connectors (ERP extracts, import batches) produce these records; the
//! core never mutates them.
//!
//! The schema is closed: [`Transaction::FIELD_NAMES`] declares exactly
//! which fields rule conditions may reference, and the pack loader
//! rejects conditions naming anything else.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{DocType, TaxType};
use crate::fields::{FieldContext, FieldValue};
use crate::identity::{AtcCode, CompanyCode, Tin, TxnId};

/// An immutable accounting transaction supplied by an upstream system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Source-system transaction identifier.
    pub txn_id: TxnId,
    /// Company the transaction belongs to.
    pub company_code: CompanyCode,
    /// Source document classification.
    pub doc_type: DocType,
    /// Source document number.
    pub doc_number: String,
    /// Document date; scopes the transaction to a filing period.
    pub doc_date: NaiveDate,

    // Partner attributes
    /// Partner identifier in the source system.
    #[serde(default)]
    pub partner_id: Option<String>,
    /// Partner display name.
    #[serde(default)]
    pub partner_name: Option<String>,
    /// Partner classification (individual, corporation, ...).
    #[serde(default)]
    pub partner_type: Option<String>,
    /// Vendor sub-classification used by withholding rules.
    #[serde(default)]
    pub vendor_type: Option<String>,
    /// Partner TIN.
    #[serde(default)]
    pub partner_tin: Option<Tin>,

    // Amounts
    /// Gross (tax-inclusive) document amount.
    #[serde(default)]
    pub gross_amount: Decimal,
    /// Amount net of VAT.
    #[serde(default)]
    pub net_of_vat: Decimal,
    /// VAT portion as recorded upstream.
    #[serde(default)]
    pub vat_amount: Decimal,
    /// Base amount subject to withholding.
    #[serde(default)]
    pub withholding_base: Decimal,

    // Tax labels
    /// Upstream tax code label.
    #[serde(default)]
    pub tax_code: Option<String>,
    /// Tax obligation this transaction feeds.
    pub tax_type: TaxType,
    /// BIR alphanumeric tax code for withholding categories.
    #[serde(default)]
    pub atc_code: Option<AtcCode>,
    /// Whether the tax applies on the sale or purchase side.
    #[serde(default)]
    pub type_tax_use: Option<String>,

    // Accounting labels
    /// General ledger account code.
    #[serde(default)]
    pub gl_account: Option<String>,
    /// Cost center label.
    #[serde(default)]
    pub cost_center: Option<String>,
    /// Project code label.
    #[serde(default)]
    pub project_code: Option<String>,

    // Provenance
    /// Originating system name.
    #[serde(default)]
    pub source_system: Option<String>,
    /// Import batch the record arrived in.
    #[serde(default)]
    pub import_batch_id: Option<String>,
}

impl Transaction {
    /// Every field name a rule condition may reference.
    ///
    /// The pack loader validates condition field references against this
    /// list; an undeclared name is a configuration error at load time.
    pub const FIELD_NAMES: &'static [&'static str] = &[
        "txn_id",
        "company_code",
        "doc_type",
        "doc_number",
        "doc_date",
        "partner_id",
        "partner_name",
        "partner_type",
        "vendor_type",
        "partner_tin",
        "gross_amount",
        "net_of_vat",
        "vat_amount",
        "withholding_base",
        "tax_code",
        "tax_type",
        "atc_code",
        "type_tax_use",
        "gl_account",
        "cost_center",
        "project_code",
        "source_system",
        "import_batch_id",
    ];

    /// Whether a field name is part of the declared transaction schema.
    pub fn is_declared_field(name: &str) -> bool {
        Self::FIELD_NAMES.contains(&name)
    }
}

impl FieldContext for Transaction {
    fn field(&self, name: &str) -> FieldValue {
        match name {
            "txn_id" => self.txn_id.as_str().into(),
            "company_code" => self.company_code.as_str().into(),
            "doc_type" => self.doc_type.to_string().into(),
            "doc_number" => self.doc_number.as_str().into(),
            "doc_date" => self.doc_date.format("%Y-%m-%d").to_string().into(),
            "partner_id" => self.partner_id.as_deref().into(),
            "partner_name" => self.partner_name.as_deref().into(),
            "partner_type" => self.partner_type.as_deref().into(),
            "vendor_type" => self.vendor_type.as_deref().into(),
            "partner_tin" => self.partner_tin.as_ref().map(|t| t.as_str()).into(),
            "gross_amount" => self.gross_amount.into(),
            "net_of_vat" => self.net_of_vat.into(),
            "vat_amount" => self.vat_amount.into(),
            "withholding_base" => self.withholding_base.into(),
            "tax_code" => self.tax_code.as_deref().into(),
            "tax_type" => self.tax_type.to_string().into(),
            "atc_code" => self.atc_code.as_ref().map(|a| a.as_str()).into(),
            "type_tax_use" => self.type_tax_use.as_deref().into(),
            "gl_account" => self.gl_account.as_deref().into(),
            "cost_center" => self.cost_center.as_deref().into(),
            "project_code" => self.project_code.as_deref().into(),
            "source_system" => self.source_system.as_deref().into(),
            "import_batch_id" => self.import_batch_id.as_deref().into(),
            _ => FieldValue::Null,
        }
    }
}
