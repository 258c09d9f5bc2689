// ─────────────────────────────────────────────────────────────────────
// PField — Intake
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
//! Typed "add electrode" / "add particle" validation over plain field maps.
//!
//! A form front-end hands over its text entries keyed by JSON field name.
//! Each function parses the numbers, builds the typed record through the
//! same serde schema as the config files, and validates it, so a record
//! accepted here is exactly one that `load_case` would accept.

use pfield_types::error::{PfieldError, PfieldResult};
use pfield_types::geometry::Electrode;
use pfield_types::species::ParticleRecord;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Form entries keyed by JSON field name.
pub type FieldMap = BTreeMap<String, String>;

/// Keys whose values stay strings.
const TEXT_KEYS: [&str; 2] = ["type", "axis"];

fn to_json_object(kind: &str, fields: &FieldMap) -> PfieldResult<Value> {
    let mut obj = Map::new();
    for (key, raw) in fields {
        let raw = raw.trim();
        let value = if TEXT_KEYS.contains(&key.as_str()) {
            Value::String(raw.to_string())
        } else {
            let x: f64 = raw.parse().map_err(|_| {
                PfieldError::ConfigError(format!("{kind}: field '{key}' is not a number: '{raw}'"))
            })?;
            if !x.is_finite() {
                return Err(PfieldError::ConfigError(format!(
                    "{kind}: field '{key}' must be finite, got {raw}"
                )));
            }
            Value::from(x)
        };
        obj.insert(key.clone(), value);
    }
    obj.insert("type".to_string(), Value::String(kind.to_string()));
    Ok(Value::Object(obj))
}

/// Build and validate an electrode of `kind` (a JSON `type` tag such as
/// `"Cylinder"` or `"Spherical"`).
pub fn electrode_from_fields(kind: &str, fields: &FieldMap) -> PfieldResult<Electrode> {
    let value = to_json_object(kind, fields)?;
    let electrode: Electrode = serde_json::from_value(value)
        .map_err(|e| PfieldError::ConfigError(format!("{kind}: {e}")))?;
    electrode.validate(kind)?;
    Ok(electrode)
}

/// Build and validate a particle entry of `kind` (a species name or
/// `"Custom"`).
pub fn particle_from_fields(kind: &str, fields: &FieldMap) -> PfieldResult<ParticleRecord> {
    let value = to_json_object(kind, fields)?;
    let record: ParticleRecord = serde_json::from_value(value)
        .map_err(|e| PfieldError::ConfigError(format!("{kind}: {e}")))?;
    record.kind()?;
    if record.energy < 0.0 {
        return Err(PfieldError::ConfigError(format!(
            "{kind}: Energy must be >= 0, got {}",
            record.energy
        )));
    }
    Ok(record)
}
