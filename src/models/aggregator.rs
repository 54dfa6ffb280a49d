//! Probability aggregation for the multi-model ensemble

use std::collections::HashMap;

/// Combines per-model churn probabilities into a single probability.
pub struct ScoreAggregator {
    /// Model weights for weighted average
    weights: HashMap<String, f64>,
    /// Default weight for models not in the weights map
    default_weight: f64,
}

impl ScoreAggregator {
    /// Create a new score aggregator with model weights.
    pub fn new(weights: HashMap<String, f64>) -> Self {
        Self {
            weights,
            default_weight: 0.1,
        }
    }

    /// Weighted average of the model probabilities, weights normalized to sum to 1.
    pub fn aggregate(&self, model_probabilities: &HashMap<String, f64>) -> f64 {
        if model_probabilities.is_empty() {
            return 0.5;
        }

        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;

        for (model_name, &probability) in model_probabilities {
            let weight = self.weight(model_name);
            weighted_sum += probability * weight;
            total_weight += weight;
        }

        if total_weight > 0.0 {
            (weighted_sum / total_weight).clamp(0.0, 1.0)
        } else {
            0.5
        }
    }

    /// Weight applied to a model
    pub fn weight(&self, model_name: &str) -> f64 {
        self.weights
            .get(model_name)
            .copied()
            .unwrap_or(self.default_weight)
    }

    /// Spread between models: 1 when they all agree, lower as they diverge
    pub fn agreement(model_probabilities: &HashMap<String, f64>) -> f64 {
        if model_probabilities.len() < 2 {
            return 1.0;
        }

        let n = model_probabilities.len() as f64;
        let mean = model_probabilities.values().sum::<f64>() / n;
        let variance = model_probabilities
            .values()
            .map(|p| (p - mean).powi(2))
            .sum::<f64>()
            / n;

        1.0 - variance.sqrt().min(1.0)
    }
}

impl Default for ScoreAggregator {
    fn default() -> Self {
        let mut weights = HashMap::new();
        weights.insert("random_forest".to_string(), 0.7);
        weights.insert("logistic".to_string(), 0.3);

        Self {
            weights,
            default_weight: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_aggregation() {
        let aggregator = ScoreAggregator::default();

        let mut probabilities = HashMap::new();
        probabilities.insert("random_forest".to_string(), 0.8);
        probabilities.insert("logistic".to_string(), 0.4);

        let aggregated = aggregator.aggregate(&probabilities);

        // 0.8*0.7 + 0.4*0.3 = 0.68
        assert!((aggregated - 0.68).abs() < 1e-9);
    }

    #[test]
    fn test_unweighted_models_average_evenly() {
        let aggregator = ScoreAggregator::new(HashMap::new());

        let mut probabilities = HashMap::new();
        probabilities.insert("model1".to_string(), 0.8);
        probabilities.insert("model2".to_string(), 0.6);

        assert!((aggregator.aggregate(&probabilities) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_model_gets_default_weight() {
        let aggregator = ScoreAggregator::default();
        assert_eq!(aggregator.weight("gradient_boosting"), 0.1);
    }

    #[test]
    fn test_agreement() {
        let mut probabilities = HashMap::new();
        probabilities.insert("model1".to_string(), 0.8);
        probabilities.insert("model2".to_string(), 0.82);
        probabilities.insert("model3".to_string(), 0.79);

        assert!(ScoreAggregator::agreement(&probabilities) > 0.9);
    }

    #[test]
    fn test_empty_probabilities() {
        let aggregator = ScoreAggregator::default();
        assert_eq!(aggregator.aggregate(&HashMap::new()), 0.5);
    }
}
