//! Model feature layout and user-input mapping
//!
//! The classifier consumes exactly twelve numeric fields in a fixed order.
//! [`FeatureField`] names them, [`FeatureVector`] holds one value per field,
//! and [`FeatureMapper`] turns loosely-typed user answers into a vector.

mod mapper;

pub use mapper::{
    EducationLevel, FatigueGrade, FeatureMapper, IncomeLevel, MappedInput, MaritalStatus, RawInput,
};

use crate::error::{Result, StressError};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Number of model features
pub const N_FEATURES: usize = 12;

/// Name of the binary label column
pub const LABEL_COLUMN: &str = "is_stressed";

/// Header of the label column in the original spreadsheet
pub const LABEL_ALIAS: &str = "是否职业紧张";

/// One of the twelve model features, in training order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureField {
    Age,
    WorkYears,
    PositionYears,
    WeeklyHours,
    DailyOvertime,
    LifeSatisfaction,
    FatigueLevel,
    Income,
    Alcohol,
    LowExercise,
    Smoking,
    MaritalStatus,
}

impl FeatureField {
    /// All fields in canonical order
    pub const ALL: [FeatureField; N_FEATURES] = [
        FeatureField::Age,
        FeatureField::WorkYears,
        FeatureField::PositionYears,
        FeatureField::WeeklyHours,
        FeatureField::DailyOvertime,
        FeatureField::LifeSatisfaction,
        FeatureField::FatigueLevel,
        FeatureField::Income,
        FeatureField::Alcohol,
        FeatureField::LowExercise,
        FeatureField::Smoking,
        FeatureField::MaritalStatus,
    ];

    /// Position of the field in a feature vector
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column / input key name
    pub fn name(self) -> &'static str {
        match self {
            FeatureField::Age => "age",
            FeatureField::WorkYears => "work_years",
            FeatureField::PositionYears => "position_years",
            FeatureField::WeeklyHours => "weekly_hours",
            FeatureField::DailyOvertime => "daily_overtime",
            FeatureField::LifeSatisfaction => "life_satisfaction",
            FeatureField::FatigueLevel => "fatigue_level",
            FeatureField::Income => "income",
            FeatureField::Alcohol => "alcohol",
            FeatureField::LowExercise => "low_exercise",
            FeatureField::Smoking => "smoking",
            FeatureField::MaritalStatus => "marital_status",
        }
    }

    /// Header used for this field by the original survey spreadsheet
    pub fn alias(self) -> &'static str {
        match self {
            FeatureField::Age => "年龄",
            FeatureField::WorkYears => "工龄",
            FeatureField::PositionYears => "本岗位工龄",
            FeatureField::WeeklyHours => "周均工作时间",
            FeatureField::DailyOvertime => "日均加班时间",
            FeatureField::LifeSatisfaction => "生活满意度得分",
            FeatureField::FatigueLevel => "疲劳程度分级",
            FeatureField::Income => "收入水平",
            FeatureField::Alcohol => "饮酒量",
            FeatureField::LowExercise => "低强度锻炼",
            FeatureField::Smoking => "吸烟量",
            FeatureField::MaritalStatus => "婚姻状况",
        }
    }

    /// Value substituted when the user leaves the field out
    pub fn default_value(self) -> f64 {
        match self {
            FeatureField::WeeklyHours => 40.0,
            FeatureField::LifeSatisfaction => 5.0,
            FeatureField::Income => IncomeLevel::default().code(),
            FeatureField::MaritalStatus => MaritalStatus::default().code(),
            _ => 0.0,
        }
    }

    /// True for fields whose raw form is a category label
    pub fn is_categorical(self) -> bool {
        matches!(self, FeatureField::Income | FeatureField::MaritalStatus)
    }

    /// Look a field up by its name or spreadsheet alias
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == name || f.alias() == name)
    }

    /// Canonical names in training order
    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|f| f.name().to_string()).collect()
    }
}

impl std::fmt::Display for FeatureField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-layout feature vector, one value per [`FeatureField`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: [f64; N_FEATURES],
}

impl Default for FeatureVector {
    fn default() -> Self {
        let mut values = [0.0; N_FEATURES];
        for field in FeatureField::ALL {
            values[field.index()] = field.default_value();
        }
        Self { values }
    }
}

impl FeatureVector {
    /// Build from values already in canonical order
    pub fn new(values: [f64; N_FEATURES]) -> Self {
        Self { values }
    }

    /// Build from a slice, which must hold exactly twelve values
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        let values: [f64; N_FEATURES] = values.try_into().map_err(|_| {
            StressError::PredictionInput(format!(
                "expected {} feature values, got {}",
                N_FEATURES,
                values.len()
            ))
        })?;
        Ok(Self { values })
    }

    pub fn get(&self, field: FeatureField) -> f64 {
        self.values[field.index()]
    }

    pub fn set(&mut self, field: FeatureField, value: f64) {
        self.values[field.index()] = value;
    }

    /// Builder-style setter
    pub fn with(mut self, field: FeatureField, value: f64) -> Self {
        self.set(field, value);
        self
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Iterate `(field, value)` pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (FeatureField, f64)> + '_ {
        FeatureField::ALL.iter().map(move |&f| (f, self.values[f.index()]))
    }

    /// Fail on NaN or infinite entries
    pub fn validate(&self) -> Result<()> {
        match self.iter().find(|(_, v)| !v.is_finite()) {
            Some((field, value)) => Err(StressError::PredictionInput(format!(
                "field '{}' is not finite ({})",
                field, value
            ))),
            None => Ok(()),
        }
    }

    /// Single-row matrix for model input
    pub fn to_row(&self) -> Array2<f64> {
        Array2::from_shape_fn((1, N_FEATURES), |(_, j)| self.values[j])
    }
}

impl Index<FeatureField> for FeatureVector {
    type Output = f64;

    fn index(&self, field: FeatureField) -> &f64 {
        &self.values[field.index()]
    }
}

impl IndexMut<FeatureField> for FeatureVector {
    fn index_mut(&mut self, field: FeatureField) -> &mut f64 {
        &mut self.values[field.index()]
    }
}
