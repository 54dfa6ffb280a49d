//! Customer record data structures for churn prediction

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const YES_NO: &[&str] = &["Yes", "No"];
const PHONE_ADDON: &[&str] = &["Yes", "No", "No phone service"];
const INTERNET_ADDON: &[&str] = &["Yes", "No", "No internet service"];

/// Customer attributes in the column order the scaler and classifiers were fitted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    #[serde(rename = "gender")]
    Gender,
    SeniorCitizen,
    Partner,
    Dependents,
    #[serde(rename = "tenure")]
    Tenure,
    PhoneService,
    MultipleLines,
    InternetService,
    OnlineSecurity,
    OnlineBackup,
    DeviceProtection,
    TechSupport,
    StreamingTV,
    StreamingMovies,
    Contract,
    PaperlessBilling,
    PaymentMethod,
    MonthlyCharges,
    TotalCharges,
}

impl Field {
    /// Every field, in training order.
    pub const ALL: [Field; 19] = [
        Field::Gender,
        Field::SeniorCitizen,
        Field::Partner,
        Field::Dependents,
        Field::Tenure,
        Field::PhoneService,
        Field::MultipleLines,
        Field::InternetService,
        Field::OnlineSecurity,
        Field::OnlineBackup,
        Field::DeviceProtection,
        Field::TechSupport,
        Field::StreamingTV,
        Field::StreamingMovies,
        Field::Contract,
        Field::PaperlessBilling,
        Field::PaymentMethod,
        Field::MonthlyCharges,
        Field::TotalCharges,
    ];

    /// Column name as it appears in the training data and artifact file names
    pub fn name(self) -> &'static str {
        match self {
            Field::Gender => "gender",
            Field::SeniorCitizen => "SeniorCitizen",
            Field::Partner => "Partner",
            Field::Dependents => "Dependents",
            Field::Tenure => "tenure",
            Field::PhoneService => "PhoneService",
            Field::MultipleLines => "MultipleLines",
            Field::InternetService => "InternetService",
            Field::OnlineSecurity => "OnlineSecurity",
            Field::OnlineBackup => "OnlineBackup",
            Field::DeviceProtection => "DeviceProtection",
            Field::TechSupport => "TechSupport",
            Field::StreamingTV => "StreamingTV",
            Field::StreamingMovies => "StreamingMovies",
            Field::Contract => "Contract",
            Field::PaperlessBilling => "PaperlessBilling",
            Field::PaymentMethod => "PaymentMethod",
            Field::MonthlyCharges => "MonthlyCharges",
            Field::TotalCharges => "TotalCharges",
        }
    }

    /// Position of the field in the feature vector
    pub fn index(self) -> usize {
        self as usize
    }

    /// Options offered for a categorical field; empty for numeric fields
    pub fn options(self) -> &'static [&'static str] {
        match self {
            Field::Gender => &["Male", "Female"],
            Field::Partner
            | Field::Dependents
            | Field::PhoneService
            | Field::PaperlessBilling => YES_NO,
            Field::MultipleLines => PHONE_ADDON,
            Field::InternetService => &["DSL", "Fiber optic", "No"],
            Field::OnlineSecurity
            | Field::OnlineBackup
            | Field::DeviceProtection
            | Field::TechSupport
            | Field::StreamingTV
            | Field::StreamingMovies => INTERNET_ADDON,
            Field::Contract => &["Month-to-month", "One year", "Two year"],
            Field::PaymentMethod => &[
                "Electronic check",
                "Mailed check",
                "Bank transfer (automatic)",
                "Credit card (automatic)",
            ],
            Field::SeniorCitizen
            | Field::Tenure
            | Field::MonthlyCharges
            | Field::TotalCharges => &[],
        }
    }

    /// Whether the field is label-encoded before scaling
    pub fn is_categorical(self) -> bool {
        !self.options().is_empty()
    }

    /// Whether a number lies in the domain the form collects.
    /// Categorical fields accept anything; their encoder decides.
    pub fn accepts(self, value: f64) -> bool {
        match self {
            Field::SeniorCitizen => value == 0.0 || value == 1.0,
            Field::Tenure => (0.0..=72.0).contains(&value),
            Field::MonthlyCharges | Field::TotalCharges => value >= 0.0 && value.is_finite(),
            _ => true,
        }
    }

    /// Column names in training order.
    pub fn names() -> impl Iterator<Item = &'static str> {
        Self::ALL.iter().map(|f| f.name())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// A single user-entered value: form selections arrive as text, inputs as numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    /// Anything else (null, booleans, nested JSON), kept so the error can name the field
    Other(serde_json::Value),
}

impl FieldValue {
    /// Category label used for encoder lookup
    pub fn as_category(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(s.as_str()),
            FieldValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                Cow::Owned(format!("{}", *n as i64))
            }
            FieldValue::Number(n) => Cow::Owned(n.to_string()),
            FieldValue::Other(value) => Cow::Owned(value.to_string()),
        }
    }

    /// Finite numeric value for pass-through fields
    pub fn as_number(&self) -> Option<f64> {
        let number = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => s.trim().parse().ok()?,
            FieldValue::Other(_) => return None,
        };
        number.is_finite().then_some(number)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(value as f64)
    }
}

/// Raw customer attributes exactly as submitted, keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.name().to_string(), value.into());
        self
    }

    pub fn set(&mut self, field: Field, value: impl Into<FieldValue>) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    pub fn remove(&mut self, field: Field) -> Option<FieldValue> {
        self.fields.remove(field.name())
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(field.name())
    }

    /// Submitted names that are not part of the schema
    pub fn unknown_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .keys()
            .map(String::as_str)
            .filter(|name| name.parse::<Field>().is_err())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_matches_index() {
        for (i, field) in Field::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
        }
        assert_eq!(Field::ALL.iter().filter(|f| f.is_categorical()).count(), 15);
    }

    #[test]
    fn test_field_name_roundtrip() {
        assert_eq!("tenure".parse::<Field>(), Ok(Field::Tenure));
        assert_eq!("gender".parse::<Field>(), Ok(Field::Gender));
        assert!("Churn".parse::<Field>().is_err());
    }

    #[test]
    fn test_record_from_form_json() {
        let json = r#"{"gender": "Female", "SeniorCitizen": 0, "tenure": 12, "Contract": "One year", "Extra": "x"}"#;
        let record: RawRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.len(), 5);
        assert_eq!(record.get(Field::Gender), Some(&FieldValue::Text("Female".into())));
        assert_eq!(record.get(Field::Tenure).and_then(FieldValue::as_number), Some(12.0));
        assert_eq!(record.unknown_fields().collect::<Vec<_>>(), vec!["Extra"]);
    }

    #[test]
    fn test_numeric_value_as_category() {
        assert_eq!(FieldValue::Number(1.0).as_category(), "1");
        assert_eq!(FieldValue::Number(1.5).as_category(), "1.5");
        assert_eq!(FieldValue::Text(" 29.85 ".into()).as_number(), Some(29.85));
        assert_eq!(FieldValue::Text("Yes".into()).as_number(), None);
    }

    #[test]
    fn test_non_finite_text_is_not_a_number() {
        for text in ["NaN", "nan", "inf", "-infinity", "+Infinity"] {
            assert_eq!(FieldValue::Text(text.into()).as_number(), None, "{text}");
        }
        assert_eq!(FieldValue::Number(f64::NAN).as_number(), None);
    }

    #[test]
    fn test_null_and_bool_values_are_kept() {
        let json = r#"{"Partner": null, "tenure": true}"#;
        let record: RawRecord = serde_json::from_str(json).unwrap();

        let partner = record.get(Field::Partner).unwrap();
        assert_eq!(partner, &FieldValue::Other(serde_json::Value::Null));
        assert_eq!(partner.as_category(), "null");
        assert_eq!(record.get(Field::Tenure).and_then(FieldValue::as_number), None);
    }

    #[test]
    fn test_numeric_domain() {
        assert!(Field::SeniorCitizen.accepts(1.0));
        assert!(!Field::SeniorCitizen.accepts(7.0));
        assert!(!Field::SeniorCitizen.accepts(0.5));
        assert!(Field::Tenure.accepts(0.0) && Field::Tenure.accepts(72.0));
        assert!(!Field::Tenure.accepts(-500.0));
        assert!(!Field::Tenure.accepts(73.0));
        assert!(!Field::MonthlyCharges.accepts(-3.0));
        assert!(Field::TotalCharges.accepts(8684.8));
        assert!(Field::Contract.accepts(-1.0));
    }
}
