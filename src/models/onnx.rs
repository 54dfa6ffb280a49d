//! ONNX classifier backed by ONNX Runtime

use crate::error::{InferenceError, LoadCause, LoadFailure};
use crate::models::classifier::{ClassPrediction, Classifier};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Exported classifier (e.g. skl2onnx with `zipmap=False`) run through an ORT session
pub struct OnnxClassifier {
    name: String,
    /// Sessions need exclusive access to run
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    n_features: usize,
}

impl OnnxClassifier {
    /// Load a model file. `n_features` is the width the graph was exported for.
    pub fn load(path: &Path, name: &str, n_features: usize, threads: usize) -> Result<Self, LoadFailure> {
        let runtime = |reason: String| LoadFailure::new(path, LoadCause::Runtime(reason));

        info!(model = %name, path = %path.display(), threads = threads, "Loading ONNX model");

        let session = Session::builder()
            .map_err(|e| runtime(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| runtime(e.to_string()))?
            .with_intra_threads(threads)
            .map_err(|e| runtime(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| runtime(e.to_string()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .map(|o| o.name.clone())
            .or_else(|| session.outputs.last().map(|o| o.name.clone()))
            .unwrap_or_else(|| "probabilities".to_string());

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "ONNX model loaded"
        );

        Ok(Self {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name,
            output_name,
            n_features,
        })
    }

    fn backend(&self, reason: impl ToString) -> InferenceError {
        InferenceError::Backend {
            model: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}

impl Classifier for OnnxClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<ClassPrediction, InferenceError> {
        let input: Vec<f32> = features.iter().map(|&x| x as f32).collect();
        let shape = vec![1_i64, input.len() as i64];
        let tensor = Tensor::from_array((shape, input)).map_err(|e| self.backend(e))?;

        let mut session = self.session.lock().map_err(|e| self.backend(e))?;
        let outputs = session
            .run(ort::inputs![&self.input_name => tensor])
            .map_err(|e| self.backend(e))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| self.backend(format!("missing output {}", self.output_name)))?;
        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| self.backend(e))?;

        let dims: Vec<i64> = shape.iter().copied().collect();
        let n_classes = dims.last().copied().unwrap_or(0);

        // [batch, classes] or [classes]; a single column is already P(churn)
        let prediction = match (n_classes, data) {
            (n, [p0, p1, ..]) if n >= 2 => ClassPrediction {
                label: if p1 > p0 { 1 } else { 0 },
                churn_probability: *p1 as f64,
            },
            (_, [p, ..]) => ClassPrediction {
                label: if *p > 0.5 { 1 } else { 0 },
                churn_probability: *p as f64,
            },
            _ => return Err(self.backend("empty probability output")),
        };

        debug!(model = %self.name, churn_probability = prediction.churn_probability, "ONNX inference complete");
        Ok(prediction)
    }
}
