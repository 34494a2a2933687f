//! # taxpulse-registry — Effective-Dated Rule & Rate Registry
//!
//! Holds the data that defines a tax jurisdiction's behavior: rates,
//! rules, validation rules, and bucket-to-form-line mappings, each with a
//! `[valid_from, valid_to)` validity interval. A run never reads these
//! records directly — it pins a [`RegistrySnapshot`] resolved "as of" a
//! date once at run start, and registry updates can never retroactively
//! alter an in-flight run.
//!
//! ## Load-time rigor
//!
//! A registry is only constructed through [`Registry::new`] (or the YAML
//! pack [`loader`]), which rejects every configuration defect up front:
//! malformed condition or formula ASTs, undeclared
//! field references, transaction formulas reaching beyond `{base, rate}`,
//! rules that reference `rate` without naming a rate code, and duplicate
//! rule codes. A run refuses to start rather than silently skip.

pub mod error;
pub mod loader;
pub mod records;
pub mod snapshot;

pub use error::ConfigError;
pub use loader::load_pack;
pub use records::{OutputMapping, TaxRate, TaxRule, ValidationRule};
pub use snapshot::{Registry, RegistrySnapshot};
