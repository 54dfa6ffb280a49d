//! Test fixtures: a small but complete artifact set
//!
//! The forest is hand-built so that long-contract, long-tenure, cheap
//! customers score low and new month-to-month customers on high charges
//! paying by electronic check score high.

use crate::config::ArtifactsConfig;
use crate::models::encoder::{EncoderTable, LabelEncoder};
use crate::models::forest::{Node, RandomForest, Tree};
use crate::models::logistic::LogisticRegression;
use crate::models::scaler::StandardScaler;
use crate::types::record::{Field, RawRecord};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Artifact directory living as long as the fixture
pub struct ArtifactFixture {
    pub _dir: TempDir,
    pub config: ArtifactsConfig,
}

impl ArtifactFixture {
    pub fn models_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.models_dir)
    }
}

/// Sorted vocabulary, as a label encoder learns it
pub fn encoder_for(field: Field) -> LabelEncoder {
    let mut classes: Vec<&str> = field.options().to_vec();
    classes.sort_unstable();
    LabelEncoder::new(classes)
}

pub fn encoder_table() -> EncoderTable {
    let mut table = EncoderTable::new();
    for field in Field::ALL.iter().copied().filter(|f| f.is_categorical()) {
        table.insert(field, encoder_for(field));
    }
    table
}

/// Identity on categorical codes, standardizes the numeric columns
pub fn scaler() -> StandardScaler {
    let mut mean = vec![0.0; Field::ALL.len()];
    let mut scale = vec![1.0; Field::ALL.len()];
    for (field, m, s) in [
        (Field::Tenure, 32.0, 24.0),
        (Field::MonthlyCharges, 65.0, 30.0),
        (Field::TotalCharges, 2280.0, 2266.0),
    ] {
        mean[field.index()] = m;
        scale[field.index()] = s;
    }
    StandardScaler::new(mean, scale).with_feature_names(Field::names())
}

fn scaled(field: Field, raw: f64) -> f64 {
    let scaler = scaler();
    let mut values = vec![0.0; Field::ALL.len()];
    values[field.index()] = raw;
    scaler.transform(&mut values);
    values[field.index()]
}

fn split(field: Field, threshold: f64, left: usize, right: usize) -> Node {
    Node::Split {
        feature: field.index(),
        threshold,
        left,
        right,
    }
}

fn leaf(no: f64, yes: f64) -> Node {
    Node::Leaf {
        value: vec![no, yes],
    }
}

pub fn forest() -> RandomForest {
    // Contract codes: Month-to-month 0, One year 1, Two year 2
    let contract = Tree::new(vec![
        split(Field::Contract, 0.5, 1, 4),
        split(Field::Tenure, scaled(Field::Tenure, 12.5), 2, 3),
        leaf(20.0, 80.0),
        leaf(70.0, 30.0),
        leaf(95.0, 5.0),
    ]);

    // PaymentMethod codes: Bank transfer 0, Credit card 1, Electronic check 2, Mailed check 3
    let charges = Tree::new(vec![
        split(Field::MonthlyCharges, scaled(Field::MonthlyCharges, 70.5), 1, 2),
        leaf(80.0, 20.0),
        split(Field::PaymentMethod, 1.5, 3, 4),
        leaf(60.0, 40.0),
        split(Field::PaymentMethod, 2.5, 5, 6),
        leaf(25.0, 75.0),
        leaf(55.0, 45.0),
    ]);

    let tenure = Tree::new(vec![
        split(Field::Tenure, scaled(Field::Tenure, 24.5), 1, 2),
        leaf(30.0, 70.0),
        leaf(90.0, 10.0),
    ]);

    RandomForest::new(Field::ALL.len(), vec![0, 1], vec![contract, charges, tenure])
}

pub fn logistic() -> LogisticRegression {
    let mut coefficients = vec![0.0; Field::ALL.len()];
    coefficients[Field::Contract.index()] = -1.2;
    coefficients[Field::Tenure.index()] = -0.9;
    coefficients[Field::MonthlyCharges.index()] = 0.8;
    LogisticRegression::new(coefficients, -0.4)
}

/// Every field set to a valid value; service fields "No"
pub fn base_record() -> RawRecord {
    let mut record = RawRecord::new();
    for field in Field::ALL {
        match field {
            Field::Gender => record.set(field, "Female"),
            Field::MultipleLines
            | Field::InternetService
            | Field::OnlineSecurity
            | Field::OnlineBackup
            | Field::DeviceProtection
            | Field::TechSupport
            | Field::StreamingTV
            | Field::StreamingMovies
            | Field::Partner
            | Field::Dependents
            | Field::PhoneService
            | Field::PaperlessBilling => record.set(field, "No"),
            Field::Contract => record.set(field, "One year"),
            Field::PaymentMethod => record.set(field, "Mailed check"),
            Field::SeniorCitizen => record.set(field, 0),
            Field::Tenure => record.set(field, 24),
            Field::MonthlyCharges => record.set(field, 50.0),
            Field::TotalCharges => record.set(field, 1200.0),
        }
    }
    record
}

/// Long two-year contract, cheap plan
pub fn loyal_record() -> RawRecord {
    base_record()
        .with(Field::Contract, "Two year")
        .with(Field::Tenure, 60)
        .with(Field::MonthlyCharges, 25.0)
        .with(Field::TotalCharges, 1500.0)
}

/// New month-to-month customer on an expensive plan
pub fn at_risk_record() -> RawRecord {
    base_record()
        .with(Field::Contract, "Month-to-month")
        .with(Field::Tenure, 1)
        .with(Field::MonthlyCharges, 95.0)
        .with(Field::TotalCharges, 95.0)
        .with(Field::PaymentMethod, "Electronic check")
        .with(Field::InternetService, "Fiber optic")
        .with(Field::PaperlessBilling, "Yes")
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) {
    fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

/// Write the whole artifact set to a temporary directory
pub fn artifact_dir() -> ArtifactFixture {
    let dir = tempfile::tempdir().unwrap();
    let models_dir = dir.path().join("models");
    let encoders_dir = dir.path().join("encoders");
    fs::create_dir_all(&models_dir).unwrap();
    fs::create_dir_all(&encoders_dir).unwrap();

    write_json(&models_dir.join("randomforest.json"), &forest());
    write_json(&models_dir.join("logistic.json"), &logistic());
    write_json(&models_dir.join("scaler.json"), &scaler());

    for field in Field::ALL.iter().copied().filter(|f| f.is_categorical()) {
        write_json(&encoders_dir.join(format!("{}.json", field)), &encoder_for(field));
    }
    // target column encoder shipped alongside the feature encoders
    write_json(&encoders_dir.join("Churn.json"), &LabelEncoder::new(["No", "Yes"]));

    let mut classifiers = BTreeMap::new();
    classifiers.insert("random_forest".to_string(), "randomforest.json".to_string());
    classifiers.insert("logistic".to_string(), "logistic.json".to_string());

    let config = ArtifactsConfig {
        models_dir: models_dir.display().to_string(),
        encoders_dir: encoders_dir.display().to_string(),
        scaler_file: "scaler.json".to_string(),
        classifiers,
        onnx_threads: 1,
    };

    ArtifactFixture { _dir: dir, config }
}
