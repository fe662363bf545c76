//! Clinical risk scoring from vital signs
//!
//! Each patient gets three independent sub-scores. A field that cannot be parsed
//! yields `None` for its sub-score, which flags the patient as a data-quality issue
//! and contributes 0 to the total.
//!
//! | Sub-score      | Rule                                                      | Score |
//! |----------------|-----------------------------------------------------------|-------|
//! | Blood pressure | systolic >= 140 or diastolic >= 90 (Stage 2)              | 4     |
//! |                | systolic 130-139 or diastolic 80-89 (Stage 1)             | 3     |
//! |                | systolic 120-129 and diastolic < 80 (Elevated)            | 2     |
//! |                | systolic < 120 and diastolic < 80 (Normal)                | 1     |
//! | Temperature    | >= 101.0 F                                                | 2     |
//! |                | >= 99.6 F                                                 | 1     |
//! |                | otherwise                                                 | 0     |
//! | Age            | > 65                                                      | 2     |
//! |                | otherwise (40-65 and under 40 both score 1)               | 1     |
//!
//! Blood-pressure stages are checked from most to least severe, so when systolic
//! and diastolic fall in different bands the higher stage wins.

use crate::types::{AssessmentResult, Patient};
use serde_json::Value;

/// Total score at or above which a patient is high-risk
pub const HIGH_RISK_THRESHOLD: u8 = 4;

/// Raw temperature (Fahrenheit) at or above which a patient has a fever
pub const FEVER_THRESHOLD_F: f64 = 99.6;

/// Sub-scores for one patient
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RiskScore {
    /// Blood-pressure sub-score (1-4)
    pub blood_pressure: Option<u8>,
    /// Temperature sub-score (0-2)
    pub temperature: Option<u8>,
    /// Age sub-score (1-2)
    pub age: Option<u8>,
    /// Parsed temperature in Fahrenheit, used for the fever check
    pub temperature_f: Option<f64>,
}

impl RiskScore {
    /// Sum of sub-scores, unparseable fields counting as 0
    pub fn total(&self) -> u8 {
        self.blood_pressure.unwrap_or(0) + self.temperature.unwrap_or(0) + self.age.unwrap_or(0)
    }

    /// At least one sub-score could not be computed
    pub fn has_data_quality_issue(&self) -> bool {
        self.blood_pressure.is_none() || self.temperature.is_none() || self.age.is_none()
    }

    /// Total reaches [`HIGH_RISK_THRESHOLD`]
    pub fn is_high_risk(&self) -> bool {
        self.total() >= HIGH_RISK_THRESHOLD
    }

    /// Raw temperature reaches [`FEVER_THRESHOLD_F`], independent of the bucket
    pub fn has_fever(&self) -> bool {
        self.temperature_f.is_some_and(|t| t >= FEVER_THRESHOLD_F)
    }
}

/// Parse a numeric-like JSON value: a number, or a string holding one
///
/// Non-finite values, empty strings, and any other JSON type are rejected.
pub fn parse_numeric(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Parse "systolic/diastolic" into its two components
pub fn parse_blood_pressure(value: Option<&Value>) -> Option<(f64, f64)> {
    let Value::String(raw) = value? else {
        return None;
    };
    let (systolic, diastolic) = raw.trim().split_once('/')?;
    let systolic = parse_component(systolic)?;
    let diastolic = parse_component(diastolic)?;
    Some((systolic, diastolic))
}

fn parse_component(raw: &str) -> Option<f64> {
    let n = raw.trim().parse::<f64>().ok()?;
    n.is_finite().then_some(n)
}

/// Blood-pressure sub-score for parsed components
pub fn blood_pressure_score(systolic: f64, diastolic: f64) -> u8 {
    if systolic >= 140.0 || diastolic >= 90.0 {
        4
    } else if systolic >= 130.0 || diastolic >= 80.0 {
        3
    } else if systolic >= 120.0 {
        2
    } else {
        1
    }
}

/// Blood-pressure sub-score for a raw field, `None` when malformed
pub fn blood_pressure_risk(value: Option<&Value>) -> Option<u8> {
    parse_blood_pressure(value).map(|(s, d)| blood_pressure_score(s, d))
}

/// Temperature sub-score for a Fahrenheit reading
pub fn temperature_score(fahrenheit: f64) -> u8 {
    if fahrenheit >= 101.0 {
        2
    } else if fahrenheit >= FEVER_THRESHOLD_F {
        1
    } else {
        0
    }
}

/// Temperature sub-score for a raw field, `None` when not numeric
pub fn temperature_risk(value: Option<&Value>) -> Option<u8> {
    parse_numeric(value).map(temperature_score)
}

/// Age sub-score for a parsed age
pub fn age_score(age: f64) -> u8 {
    if age > 65.0 { 2 } else { 1 }
}

/// Age sub-score for a raw field, `None` when not numeric
pub fn age_risk(value: Option<&Value>) -> Option<u8> {
    parse_numeric(value).map(age_score)
}

/// Compute all sub-scores for one patient
pub fn score_patient(patient: &Patient) -> RiskScore {
    let temperature_f = parse_numeric(patient.temperature.as_ref());
    RiskScore {
        blood_pressure: blood_pressure_risk(patient.blood_pressure.as_ref()),
        temperature: temperature_f.map(temperature_score),
        age: age_risk(patient.age.as_ref()),
        temperature_f,
    }
}

/// Score every patient and collect the three submission lists
pub fn assess_patients(patients: &[Patient]) -> AssessmentResult {
    let mut result = AssessmentResult::default();

    for patient in patients {
        let score = score_patient(patient);

        tracing::trace!(
            patient_id = %patient.patient_id,
            name = patient.name.as_deref().unwrap_or(""),
            bp = ?score.blood_pressure,
            temp = ?score.temperature,
            age = ?score.age,
            total = score.total(),
            "Scored patient"
        );

        if score.has_data_quality_issue() {
            result.data_quality_issues.insert(patient.patient_id.clone());
        }
        if score.is_high_risk() {
            result.high_risk_patients.insert(patient.patient_id.clone());
        }
        if score.has_fever() {
            result.fever_patients.insert(patient.patient_id.clone());
        }
    }

    tracing::info!(
        patients = patients.len(),
        high_risk = result.high_risk_patients.len(),
        fever = result.fever_patients.len(),
        data_quality = result.data_quality_issues.len(),
        "Assessed patient risk"
    );

    result
}
