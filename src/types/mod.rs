//! Type definitions for the churn prediction service

pub mod record;
pub mod verdict;

pub use record::{Field, FieldValue, RawRecord};
pub use verdict::{PredictionReply, Verdict};
