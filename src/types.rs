//! Core types for patient-risk

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// One patient record as returned by the upstream API
///
/// Vital-sign fields are kept as raw JSON because the upstream sends strings,
/// numbers, nulls, or omits them entirely. Parsing happens in [`crate::scoring`].
/// A numeric `patient_id` is kept as its decimal string; a wrong-typed `name` is dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    /// Opaque patient identifier
    #[serde(deserialize_with = "lenient::identifier")]
    pub patient_id: String,

    /// Display name, only used in log output
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,

    /// Expected as "systolic/diastolic"
    #[serde(default)]
    pub blood_pressure: Option<Value>,

    /// Degrees Fahrenheit
    #[serde(default)]
    pub temperature: Option<Value>,

    /// Age in years
    #[serde(default)]
    pub age: Option<Value>,
}

impl Patient {
    /// Record with only an identifier, all vitals absent
    pub fn new(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            name: None,
            blood_pressure: None,
            temperature: None,
            age: None,
        }
    }

    /// Set the blood pressure field
    pub fn with_blood_pressure(mut self, value: impl Into<Value>) -> Self {
        self.blood_pressure = Some(value.into());
        self
    }

    /// Set the temperature field
    pub fn with_temperature(mut self, value: impl Into<Value>) -> Self {
        self.temperature = Some(value.into());
        self
    }

    /// Set the age field
    pub fn with_age(mut self, value: impl Into<Value>) -> Self {
        self.age = Some(value.into());
        self
    }
}

/// Pagination block of a page response
///
/// Only `has_next` drives the fetch loop. Every field tolerates a wrong type:
/// informational counters fall back to `None` and `has_next` to `false`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Page number of this response
    #[serde(default, deserialize_with = "lenient::count")]
    pub page: Option<u32>,
    /// Page size the server applied
    #[serde(default, deserialize_with = "lenient::count")]
    pub limit: Option<u32>,
    /// Total number of records
    #[serde(default, deserialize_with = "lenient::count")]
    pub total: Option<u64>,
    /// Total number of pages
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_pages: Option<u32>,
    /// Whether another page follows
    #[serde(default, deserialize_with = "lenient::flag")]
    pub has_next: bool,
    /// Whether a previous page exists
    #[serde(default, deserialize_with = "lenient::optional_flag")]
    pub has_previous: Option<bool>,
}

/// One page of `GET /patients`
///
/// A response without a usable `pagination` object is treated as the last page.
/// Records that cannot be read (no usable `patient_id`, not an object) are skipped
/// so the rest of the page survives.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientPage {
    /// Records on this page, in server order
    #[serde(default, deserialize_with = "lenient::records")]
    pub data: Vec<Patient>,
    /// Pagination indicator
    #[serde(default, deserialize_with = "lenient::pagination")]
    pub pagination: Pagination,
}

// Field deserializers that degrade instead of rejecting the whole page body
mod lenient {
    use super::{Pagination, Patient};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) if !s.trim().is_empty() => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(D::Error::custom(format!(
                "patient_id must be a non-empty string or a number, got {other}"
            ))),
        }
    }

    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    pub fn count<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<u64>,
    {
        let raw = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        Ok(raw.and_then(|n| T::try_from(n).ok()))
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(optional_flag(deserializer)?.unwrap_or(false))
    }

    pub fn optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(b) => Some(b),
            _ => None,
        })
    }

    pub fn records<'de, D>(deserializer: D) -> Result<Vec<Patient>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Value::Array(items) = Value::deserialize(deserializer)? else {
            tracing::warn!("Page `data` is not an array, treating page as empty");
            return Ok(Vec::new());
        };

        let mut patients = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<Patient>(item) {
                Ok(patient) => patients.push(patient),
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping unreadable patient record")
                }
            }
        }
        Ok(patients)
    }

    pub fn pagination<'de, D>(deserializer: D) -> Result<Pagination, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }
}

/// Aggregated assessment, serialized as the body of `POST /submit-assessment`
///
/// Sets serialize as JSON arrays in sorted order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResult {
    /// Patients whose total score reaches the high-risk threshold
    pub high_risk_patients: BTreeSet<String>,
    /// Patients with a raw temperature at or above the fever threshold
    pub fever_patients: BTreeSet<String>,
    /// Patients with at least one field that could not be scored
    pub data_quality_issues: BTreeSet<String>,
}

impl AssessmentResult {
    /// True when no patient landed in any list
    pub fn is_empty(&self) -> bool {
        self.high_risk_patients.is_empty()
            && self.fever_patients.is_empty()
            && self.data_quality_issues.is_empty()
    }

    /// Total memberships across the three lists
    pub fn total(&self) -> usize {
        self.high_risk_patients.len() + self.fever_patients.len() + self.data_quality_issues.len()
    }
}
