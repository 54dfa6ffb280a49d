//! Learned artifacts and the inference engine built on them

pub mod aggregator;
pub mod classifier;
pub mod encoder;
pub mod forest;
pub mod inference;
pub mod loader;
pub mod logistic;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod scaler;

pub use aggregator::ScoreAggregator;
pub use classifier::{ClassPrediction, Classifier};
pub use encoder::{EncoderTable, LabelEncoder};
pub use forest::RandomForest;
pub use inference::{InferenceEngine, PredictionResult};
pub use loader::{load_artifact, load_encoder_set, predict, ArtifactStore, Artifacts, LoadedModel};
pub use logistic::LogisticRegression;
pub use scaler::StandardScaler;
