//! Fitted categorical encoders

use crate::models::loader::Artifact;
use crate::types::record::Field;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Label encoder: a category's code is its position in the learned vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new<S: Into<String>>(classes: impl IntoIterator<Item = S>) -> Self {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    /// Code for a category, `None` when it was never seen during fitting
    pub fn transform(&self, value: &str) -> Option<f64> {
        self.classes
            .iter()
            .position(|class| class == value)
            .map(|code| code as f64)
    }
}

impl Artifact for LabelEncoder {
    const KIND: &'static str = "label_encoder";

    fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("encoder has no classes".to_string());
        }
        let mut seen = HashSet::new();
        for class in &self.classes {
            if !seen.insert(class.as_str()) {
                return Err(format!("duplicate class {:?}", class));
            }
        }
        Ok(())
    }
}

/// Encoders keyed by schema field. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct EncoderTable {
    encoders: BTreeMap<Field, LabelEncoder>,
}

impl EncoderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from encoders keyed by artifact file stem.
    ///
    /// Returns the table and the keys that name no schema field (the target
    /// column's encoder is usually among them).
    pub fn from_named(named: BTreeMap<String, LabelEncoder>) -> (Self, Vec<String>) {
        let mut table = Self::new();
        let mut ignored = Vec::new();

        for (name, encoder) in named {
            match name.parse::<Field>() {
                Ok(field) => {
                    table.encoders.insert(field, encoder);
                }
                Err(name) => ignored.push(name),
            }
        }

        (table, ignored)
    }

    pub fn insert(&mut self, field: Field, encoder: LabelEncoder) {
        self.encoders.insert(field, encoder);
    }

    pub fn get(&self, field: Field) -> Option<&LabelEncoder> {
        self.encoders.get(&field)
    }

    /// Categorical fields that have no encoder
    pub fn missing(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| f.is_categorical() && !self.encoders.contains_key(f))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}
