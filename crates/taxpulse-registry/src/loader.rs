//! # YAML Tax-Pack Loader
//!
//! A tax pack is a directory of YAML files grouped by record kind:
//!
//! ```text
//! packs/ph/
//!   rates/        *.yaml   { rates: [...] }
//!   rules/        *.yaml   { rules: [...] }
//!   validations/  *.yaml   { validations: [...] }
//!   mappings/     *.yaml   { form: 2550Q, lines: [{bucket, line, label}] }
//! ```
//!
//! Missing subdirectories are treated as empty. Files within a
//! subdirectory load in name order so the resulting registry does not
//! depend on directory-entry ordering.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use taxpulse_core::{BucketName, FormId};

use crate::error::ConfigError;
use crate::records::{OutputMapping, TaxRate, TaxRule, ValidationRule};
use crate::snapshot::Registry;

#[derive(Deserialize)]
struct RateFile {
    rates: Vec<TaxRate>,
}

#[derive(Deserialize)]
struct RuleFile {
    rules: Vec<TaxRule>,
}

#[derive(Deserialize)]
struct ValidationFile {
    validations: Vec<ValidationRule>,
}

/// One form's mapping file. Flattened into per-bucket [`OutputMapping`]
/// records on load.
#[derive(Deserialize)]
struct MappingFile {
    form: FormId,
    lines: Vec<MappingLine>,
}

#[derive(Deserialize)]
struct MappingLine {
    bucket: BucketName,
    line: String,
    label: String,
}

/// Load a tax pack directory into a compiled [`Registry`].
///
/// Any unreadable or malformed file, and any cross-record defect found
/// by [`Registry::new`], aborts the load.
pub fn load_pack(dir: &Path) -> Result<Registry, ConfigError> {
    let mut rates = Vec::new();
    for path in yaml_files(&dir.join("rates"))? {
        let file: RateFile = read_yaml(&path)?;
        rates.extend(file.rates);
    }

    let mut rules = Vec::new();
    for path in yaml_files(&dir.join("rules"))? {
        let file: RuleFile = read_yaml(&path)?;
        rules.extend(file.rules);
    }

    let mut validations = Vec::new();
    for path in yaml_files(&dir.join("validations"))? {
        let file: ValidationFile = read_yaml(&path)?;
        validations.extend(file.validations);
    }

    let mut mappings = Vec::new();
    for path in yaml_files(&dir.join("mappings"))? {
        let file: MappingFile = read_yaml(&path)?;
        for line in file.lines {
            mappings.push(OutputMapping {
                output_bucket: line.bucket,
                form_id: file.form.clone(),
                line_code: line.line,
                line_label: line.label,
            });
        }
    }

    tracing::info!(
        pack = %dir.display(),
        rates = rates.len(),
        rules = rules.len(),
        validations = validations.len(),
        mappings = mappings.len(),
        "loaded tax pack"
    );

    Registry::new(rates, rules, validations, mappings)
}

/// The `.yaml`/`.yml` files directly under `dir`, sorted by name.
/// A missing directory yields an empty list.
fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir).map_err(|source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_yaml = path
            .extension()
            .map_or(false, |ext| ext == "yaml" || ext == "yml");
        if path.is_file() && is_yaml {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}
