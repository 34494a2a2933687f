//! # Bucket-to-Form-Line Mapping
//!
//! Projects the final bucket state onto regulatory form lines. Every
//! configured mapping emits a line, including zero amounts, so a form
//! rendered from the result always has its full line set. Buckets with
//! no mapping are returned separately; the caller decides whether an
//! unmapped bucket is noise or a configuration gap.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use taxpulse_core::{BucketName, FormId};
use taxpulse_registry::RegistrySnapshot;

use crate::buckets::Buckets;

/// One populated form line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormLine {
    /// The form the line belongs to.
    pub form_id: FormId,
    /// Line code on the form.
    pub line_code: String,
    /// Human-readable line label.
    pub line_label: String,
    /// The bucket the amount came from.
    pub bucket: BucketName,
    /// The line amount.
    pub amount: Decimal,
}

/// The result of projecting buckets onto form lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappedLines {
    /// Lines in (form, line code) order.
    pub lines: Vec<FormLine>,
    /// Buckets present in the run with no configured form line.
    pub unmapped: Vec<BucketName>,
}

/// Project the bucket state onto every configured form line.
pub fn map_lines(buckets: &Buckets, snapshot: &RegistrySnapshot) -> MappedLines {
    let mut lines: Vec<FormLine> = snapshot
        .mappings()
        .map(|mapping| FormLine {
            form_id: mapping.form_id.clone(),
            line_code: mapping.line_code.clone(),
            line_label: mapping.line_label.clone(),
            bucket: mapping.output_bucket.clone(),
            amount: buckets.amount(&mapping.output_bucket),
        })
        .collect();
    lines.sort_by(|a, b| {
        a.form_id
            .cmp(&b.form_id)
            .then_with(|| a.line_code.cmp(&b.line_code))
    });

    let unmapped: Vec<BucketName> = buckets
        .iter()
        .filter(|(bucket, _)| snapshot.mapping(bucket).is_none())
        .map(|(bucket, _)| bucket.clone())
        .collect();
    for bucket in &unmapped {
        tracing::debug!(%bucket, "bucket has no form line mapping");
    }

    MappedLines { lines, unmapped }
}
