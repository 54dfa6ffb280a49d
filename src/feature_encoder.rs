//! Feature encoding for churn model inference.
//!
//! Turns a raw customer record into the vector the scaler and classifiers
//! were fitted on: label-encode categorical columns, pass numeric columns
//! through, then standardize the whole vector.

use crate::error::EncodingError;
use crate::models::encoder::EncoderTable;
use crate::models::scaler::StandardScaler;
use crate::types::record::{Field, FieldValue, RawRecord};

/// Fully numeric, ordered representation of a customer record
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Encodes records in the column order of [`Field::ALL`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEncoder;

impl FeatureEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode and scale one record.
    ///
    /// Fails on the first field that cannot be encoded; nothing is
    /// substituted for an unseen category.
    pub fn encode(
        &self,
        record: &RawRecord,
        encoders: &EncoderTable,
        scaler: &StandardScaler,
    ) -> Result<FeatureVector, EncodingError> {
        self.check_schema(scaler)?;

        let mut values = self.encode_unscaled(record, encoders)?;
        scaler.transform(&mut values);

        Ok(FeatureVector(values))
    }

    /// Categorical encoding only, before scaling
    pub fn encode_unscaled(
        &self,
        record: &RawRecord,
        encoders: &EncoderTable,
    ) -> Result<Vec<f64>, EncodingError> {
        if let Some(name) = record.unknown_fields().next() {
            return Err(EncodingError::UnknownField(name.to_string()));
        }

        Field::ALL
            .iter()
            .map(|&field| {
                let value = record
                    .get(field)
                    .ok_or(EncodingError::MissingField(field))?;
                self.encode_field(field, value, encoders)
            })
            .collect()
    }

    fn encode_field(
        &self,
        field: Field,
        value: &FieldValue,
        encoders: &EncoderTable,
    ) -> Result<f64, EncodingError> {
        if let Some(encoder) = encoders.get(field) {
            let category = value.as_category();
            return encoder
                .transform(&category)
                .ok_or_else(|| EncodingError::UnseenCategory {
                    field,
                    value: category.into_owned(),
                });
        }

        match value.as_number() {
            Some(number) if field.accepts(number) => Ok(number),
            Some(number) => Err(EncodingError::OutOfRange {
                field,
                value: number,
            }),
            None if field.is_categorical() => Err(EncodingError::MissingEncoder(field)),
            None => Err(EncodingError::NotNumeric {
                field,
                value: value.as_category().into_owned(),
            }),
        }
    }

    /// Verify the scaler was fitted on this schema, in this order
    pub fn check_schema(&self, scaler: &StandardScaler) -> Result<(), EncodingError> {
        if scaler.n_features() != Field::ALL.len() {
            return Err(EncodingError::ScalerShape {
                expected: scaler.n_features(),
                actual: Field::ALL.len(),
            });
        }

        if let Some(names) = scaler.feature_names() {
            for (position, (field, found)) in Field::ALL.iter().zip(names).enumerate() {
                if field.name() != found {
                    return Err(EncodingError::SchemaMismatch {
                        position,
                        expected: *field,
                        found: found.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Column names in vector order
    pub fn feature_names(&self) -> Vec<&'static str> {
        Field::names().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_encode_unscaled_codes() {
        let encoders = testing::encoder_table();
        let record = testing::base_record()
            .with(Field::Contract, "Two year")
            .with(Field::PaymentMethod, "Electronic check")
            .with(Field::Tenure, 60);

        let values = FeatureEncoder::new()
            .encode_unscaled(&record, &encoders)
            .unwrap();

        assert_eq!(values.len(), 19);
        assert_eq!(values[Field::Contract.index()], 2.0);
        assert_eq!(values[Field::PaymentMethod.index()], 2.0);
        assert_eq!(values[Field::Tenure.index()], 60.0);
        assert_eq!(values[Field::SeniorCitizen.index()], 0.0);
    }

    #[test]
    fn test_encode_scales() {
        let encoders = testing::encoder_table();
        let scaler = testing::scaler();
        let record = testing::base_record().with(Field::Tenure, 8);

        let vector = FeatureEncoder::new().encode(&record, &encoders, &scaler).unwrap();

        assert_eq!(vector.len(), 19);
        assert!((vector.as_slice()[Field::Tenure.index()] - (-1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let encoders = testing::encoder_table();
        let scaler = testing::scaler();
        let record = testing::base_record();
        let encoder = FeatureEncoder::new();

        let first = encoder.encode(&record, &encoders, &scaler).unwrap();
        let second = encoder.encode(&record, &encoders, &scaler).unwrap();

        let bits = |v: &FeatureVector| v.as_slice().iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn test_unseen_category_names_field() {
        let encoders = testing::encoder_table();
        let scaler = testing::scaler();
        let encoder = FeatureEncoder::new();

        for field in Field::ALL.iter().copied().filter(|f| f.is_categorical()) {
            let record = testing::base_record().with(field, "No value");
            let err = encoder.encode(&record, &encoders, &scaler).unwrap_err();
            assert_eq!(
                err,
                EncodingError::UnseenCategory {
                    field,
                    value: "No value".to_string()
                }
            );
        }
    }

    #[test]
    fn test_missing_and_unknown_fields() {
        let encoders = testing::encoder_table();
        let encoder = FeatureEncoder::new();

        let mut record = testing::base_record();
        record.remove(Field::TotalCharges);

        assert_eq!(
            encoder.encode_unscaled(&record, &encoders),
            Err(EncodingError::MissingField(Field::TotalCharges))
        );

        let mut json = serde_json::to_value(testing::base_record()).unwrap();
        json["customerID"] = serde_json::json!("7590-VHVEG");
        let record: RawRecord = serde_json::from_value(json).unwrap();

        assert_eq!(
            encoder.encode_unscaled(&record, &encoders),
            Err(EncodingError::UnknownField("customerID".to_string()))
        );
    }

    #[test]
    fn test_numeric_field_rejects_text() {
        let encoders = testing::encoder_table();
        let record = testing::base_record().with(Field::MonthlyCharges, "lots");

        assert!(matches!(
            FeatureEncoder::new().encode_unscaled(&record, &encoders),
            Err(EncodingError::NotNumeric {
                field: Field::MonthlyCharges,
                ..
            })
        ));
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let encoders = testing::encoder_table();
        let encoder = FeatureEncoder::new();

        for text in ["NaN", "inf", "-infinity"] {
            let record = testing::base_record().with(Field::MonthlyCharges, text);
            assert_eq!(
                encoder.encode_unscaled(&record, &encoders),
                Err(EncodingError::NotNumeric {
                    field: Field::MonthlyCharges,
                    value: text.to_string()
                })
            );
        }
    }

    #[test]
    fn test_out_of_range_numbers_rejected() {
        let encoders = testing::encoder_table();
        let encoder = FeatureEncoder::new();

        for (field, value) in [
            (Field::Tenure, -500.0),
            (Field::SeniorCitizen, 7.0),
            (Field::MonthlyCharges, -3.0),
        ] {
            let record = testing::base_record().with(field, value);
            assert_eq!(
                encoder.encode_unscaled(&record, &encoders),
                Err(EncodingError::OutOfRange { field, value })
            );
        }
    }

    #[test]
    fn test_null_and_bool_name_the_field() {
        let encoders = testing::encoder_table();
        let encoder = FeatureEncoder::new();

        let mut json = serde_json::to_value(testing::base_record()).unwrap();
        json["Partner"] = serde_json::Value::Null;
        let record: RawRecord = serde_json::from_value(json).unwrap();
        assert_eq!(
            encoder.encode_unscaled(&record, &encoders),
            Err(EncodingError::UnseenCategory {
                field: Field::Partner,
                value: "null".to_string()
            })
        );

        let mut json = serde_json::to_value(testing::base_record()).unwrap();
        json["tenure"] = serde_json::json!(true);
        let record: RawRecord = serde_json::from_value(json).unwrap();
        assert_eq!(
            encoder.encode_unscaled(&record, &encoders),
            Err(EncodingError::NotNumeric {
                field: Field::Tenure,
                value: "true".to_string()
            })
        );
    }

    #[test]
    fn test_categorical_without_encoder_fails_loudly() {
        let record = testing::base_record();

        assert_eq!(
            FeatureEncoder::new().encode_unscaled(&record, &EncoderTable::new()),
            Err(EncodingError::MissingEncoder(Field::Gender))
        );
    }

    #[test]
    fn test_schema_checks() {
        let encoder = FeatureEncoder::new();

        let narrow = StandardScaler::new(vec![0.0; 18], vec![1.0; 18]);
        assert_eq!(
            encoder.check_schema(&narrow),
            Err(EncodingError::ScalerShape {
                expected: 18,
                actual: 19
            })
        );

        let mut names: Vec<&str> = Field::names().collect();
        names.swap(4, 17);
        let reordered = StandardScaler::new(vec![0.0; 19], vec![1.0; 19]).with_feature_names(names);
        assert_eq!(
            encoder.check_schema(&reordered),
            Err(EncodingError::SchemaMismatch {
                position: 4,
                expected: Field::Tenure,
                found: "MonthlyCharges".to_string()
            })
        );

        assert!(encoder.check_schema(&testing::scaler()).is_ok());
    }

    #[test]
    fn test_feature_names() {
        let encoder = FeatureEncoder::new();
        assert_eq!(encoder.feature_names().len(), 19);
        assert_eq!(encoder.feature_names()[0], "gender");
        assert_eq!(encoder.feature_names()[18], "TotalCharges");
    }
}
