//! Translation of raw user answers into model features

use super::{FeatureField, FeatureVector};
use crate::error::{Result, StressError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Income bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl IncomeLevel {
    pub const ALL: [IncomeLevel; 3] = [IncomeLevel::Low, IncomeLevel::Medium, IncomeLevel::High];

    pub fn code(self) -> f64 {
        match self {
            IncomeLevel::Low => -1.0,
            IncomeLevel::Medium => 0.0,
            IncomeLevel::High => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IncomeLevel::Low => "low",
            IncomeLevel::Medium => "medium",
            IncomeLevel::High => "high",
        }
    }

    /// Parse an English key or survey label
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" | "低" => Some(IncomeLevel::Low),
            "medium" | "mid" | "中" => Some(IncomeLevel::Medium),
            "high" | "高" => Some(IncomeLevel::High),
            _ => None,
        }
    }

    pub fn from_code(code: f64) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.code() == code)
    }
}

/// Highest completed education
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    HighSchoolOrBelow,
    Associate,
    #[default]
    Bachelor,
    MasterOrAbove,
}

impl EducationLevel {
    pub const ALL: [EducationLevel; 4] = [
        EducationLevel::HighSchoolOrBelow,
        EducationLevel::Associate,
        EducationLevel::Bachelor,
        EducationLevel::MasterOrAbove,
    ];

    pub fn code(self) -> f64 {
        match self {
            EducationLevel::HighSchoolOrBelow => 0.0,
            EducationLevel::Associate => 1.0,
            EducationLevel::Bachelor => 2.0,
            EducationLevel::MasterOrAbove => 3.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EducationLevel::HighSchoolOrBelow => "high_school_or_below",
            EducationLevel::Associate => "associate",
            EducationLevel::Bachelor => "bachelor",
            EducationLevel::MasterOrAbove => "master_or_above",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "high_school_or_below" | "high_school" | "高中及以下" => {
                Some(EducationLevel::HighSchoolOrBelow)
            }
            "associate" | "大专" => Some(EducationLevel::Associate),
            "bachelor" | "本科" => Some(EducationLevel::Bachelor),
            "master_or_above" | "master" | "硕士及以上" => Some(EducationLevel::MasterOrAbove),
            _ => None,
        }
    }

    pub fn from_code(code: f64) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.code() == code)
    }
}

/// Marital status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    #[default]
    Single,
    MarriedCohabiting,
    MarriedSeparated,
    Divorced,
    Widowed,
}

impl MaritalStatus {
    pub const ALL: [MaritalStatus; 5] = [
        MaritalStatus::Single,
        MaritalStatus::MarriedCohabiting,
        MaritalStatus::MarriedSeparated,
        MaritalStatus::Divorced,
        MaritalStatus::Widowed,
    ];

    pub fn code(self) -> f64 {
        match self {
            MaritalStatus::Single => 1.0,
            MaritalStatus::MarriedCohabiting => 2.0,
            MaritalStatus::MarriedSeparated => 3.0,
            MaritalStatus::Divorced => 4.0,
            MaritalStatus::Widowed => 5.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MaritalStatus::Single => "single",
            MaritalStatus::MarriedCohabiting => "married_cohabiting",
            MaritalStatus::MarriedSeparated => "married_separated",
            MaritalStatus::Divorced => "divorced",
            MaritalStatus::Widowed => "widowed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "single" | "未婚" => Some(MaritalStatus::Single),
            "married_cohabiting" | "married" | "已婚同居" => Some(MaritalStatus::MarriedCohabiting),
            "married_separated" | "separated" | "已婚分居" => Some(MaritalStatus::MarriedSeparated),
            "divorced" | "离婚" => Some(MaritalStatus::Divorced),
            "widowed" | "丧偶" => Some(MaritalStatus::Widowed),
            _ => None,
        }
    }

    pub fn from_code(code: f64) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.code() == code)
    }
}

/// Self-reported fatigue, graded 0..=3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatigueGrade {
    #[default]
    None,
    Mild,
    Moderate,
    Severe,
}

impl FatigueGrade {
    pub fn code(self) -> f64 {
        match self {
            FatigueGrade::None => 0.0,
            FatigueGrade::Mild => 1.0,
            FatigueGrade::Moderate => 2.0,
            FatigueGrade::Severe => 3.0,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "none" | "无" => Some(FatigueGrade::None),
            "mild" | "轻度" => Some(FatigueGrade::Mild),
            "moderate" | "中度" => Some(FatigueGrade::Moderate),
            "severe" | "重度" => Some(FatigueGrade::Severe),
            _ => None,
        }
    }
}

/// Loosely-typed user answers keyed by input name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawInput {
    values: HashMap<String, Value>,
}

impl RawInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_null())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<HashMap<String, Value>> for RawInput {
    fn from(values: HashMap<String, Value>) -> Self {
        Self { values }
    }
}

/// Result of mapping: the model features plus the education code
///
/// Education is part of the input contract but not a model feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MappedInput {
    pub features: FeatureVector,
    pub education: EducationLevel,
}

impl MappedInput {
    pub fn education_code(&self) -> f64 {
        self.education.code()
    }
}

/// Maps raw user answers to a [`FeatureVector`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureMapper;

impl FeatureMapper {
    pub fn new() -> Self {
        Self
    }

    /// Map raw input, substituting defaults for absent fields.
    ///
    /// Unknown category labels fall back to the category default. A numeric
    /// field that is present but not a number is rejected.
    pub fn map(&self, raw: &RawInput) -> Result<MappedInput> {
        let mut features = FeatureVector::default();

        for field in FeatureField::ALL {
            let value = match field {
                FeatureField::Income => Self::category(
                    raw.get(field.name()),
                    field,
                    IncomeLevel::parse,
                    IncomeLevel::from_code,
                )
                .unwrap_or_default()
                .code(),
                FeatureField::MaritalStatus => Self::category(
                    raw.get(field.name()),
                    field,
                    MaritalStatus::parse,
                    MaritalStatus::from_code,
                )
                .unwrap_or_default()
                .code(),
                _ => Self::numeric(raw.get(field.name()), field)?,
            };
            features.set(field, value);
        }

        let education = Self::code_or_label(
            raw.get("education"),
            EducationLevel::parse,
            EducationLevel::from_code,
        )
        .unwrap_or_default();

        Ok(MappedInput { features, education })
    }

    fn numeric(value: Option<&Value>, field: FeatureField) -> Result<f64> {
        let parsed = match value {
            None => return Ok(field.default_value()),
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(field.default_value());
                }
                s.parse::<f64>().ok().or_else(|| {
                    if field == FeatureField::FatigueLevel {
                        FatigueGrade::parse(s).map(FatigueGrade::code)
                    } else {
                        None
                    }
                })
            }
            Some(_) => None,
        };

        match parsed {
            Some(v) if v.is_finite() => Ok(v),
            _ => Err(StressError::PredictionInput(format!(
                "field '{}' must be a finite number, got {}",
                field,
                value.map(|v| v.to_string()).unwrap_or_default()
            ))),
        }
    }

    fn category<T>(
        value: Option<&Value>,
        field: FeatureField,
        parse: fn(&str) -> Option<T>,
        from_code: fn(f64) -> Option<T>,
    ) -> Option<T> {
        let parsed = Self::code_or_label(value, parse, from_code);
        if parsed.is_none() {
            if let Some(value) = value {
                debug!(field = %field, value = %value, "Unrecognized category, using default");
            }
        }
        parsed
    }

    /// A category given as a label, a numeric code, or a code in a string
    fn code_or_label<T>(
        value: Option<&Value>,
        parse: fn(&str) -> Option<T>,
        from_code: fn(f64) -> Option<T>,
    ) -> Option<T> {
        match value? {
            Value::String(s) => parse(s).or_else(|| s.trim().parse::<f64>().ok().and_then(from_code)),
            Value::Number(n) => n.as_f64().and_then(from_code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_input_uses_defaults() {
        let mapped = FeatureMapper::new().map(&RawInput::new()).unwrap();
        assert_eq!(mapped.features, FeatureVector::default());
        assert_eq!(mapped.education, EducationLevel::Bachelor);
    }

    #[test]
    fn test_income_table_is_total() {
        for (label, code) in [("low", -1.0), ("medium", 0.0), ("high", 1.0), ("低", -1.0), ("高", 1.0)] {
            let raw = RawInput::new().with("income", label);
            let mapped = FeatureMapper::new().map(&raw).unwrap();
            assert_eq!(mapped.features[FeatureField::Income], code, "label {}", label);
        }
    }

    #[test]
    fn test_marital_table_is_total() {
        for status in MaritalStatus::ALL {
            let raw = RawInput::new().with("marital_status", status.label());
            let mapped = FeatureMapper::new().map(&raw).unwrap();
            assert_eq!(mapped.features[FeatureField::MaritalStatus], status.code());
        }
    }

    #[test]
    fn test_education_table_is_total() {
        for level in EducationLevel::ALL {
            let raw = RawInput::new().with("education", level.label());
            let mapped = FeatureMapper::new().map(&raw).unwrap();
            assert_eq!(mapped.education, level);
        }
    }

    #[test]
    fn test_unknown_categories_fall_back() {
        let raw = RawInput::new()
            .with("income", "astronomical")
            .with("education", "bootcamp")
            .with("marital_status", "it's complicated");
        let mapped = FeatureMapper::new().map(&raw).unwrap();
        assert_eq!(mapped.features[FeatureField::Income], 0.0);
        assert_eq!(mapped.education_code(), 2.0);
        assert_eq!(mapped.features[FeatureField::MaritalStatus], 1.0);
    }

    #[test]
    fn test_numeric_strings_and_fatigue_labels() {
        let raw = RawInput::new()
            .with("age", "42")
            .with("weekly_hours", json!(55.5))
            .with("fatigue_level", "moderate");
        let mapped = FeatureMapper::new().map(&raw).unwrap();
        assert_eq!(mapped.features[FeatureField::Age], 42.0);
        assert_eq!(mapped.features[FeatureField::WeeklyHours], 55.5);
        assert_eq!(mapped.features[FeatureField::FatigueLevel], 2.0);
    }

    #[test]
    fn test_malformed_numeric_is_rejected() {
        let raw = RawInput::new().with("age", "forty");
        let err = FeatureMapper::new().map(&raw).unwrap_err();
        assert!(matches!(err, StressError::PredictionInput(_)));

        let raw = RawInput::new().with("smoking", json!(true));
        assert!(FeatureMapper::new().map(&raw).is_err());
    }

    #[test]
    fn test_null_counts_as_absent() {
        let raw = RawInput::new().with("weekly_hours", Value::Null);
        let mapped = FeatureMapper::new().map(&raw).unwrap();
        assert_eq!(mapped.features[FeatureField::WeeklyHours], 40.0);
    }

    #[test]
    fn test_raw_input_from_json() {
        let raw = RawInput::from_json(r#"{"age": 30, "income": "high"}"#).unwrap();
        let mapped = FeatureMapper::new().map(&raw).unwrap();
        assert_eq!(mapped.features[FeatureField::Age], 30.0);
        assert_eq!(mapped.features[FeatureField::Income], 1.0);
    }
}
