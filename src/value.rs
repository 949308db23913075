use serde::Deserialize;

/// Scores one encoded `(state, action)` vector. Training happens elsewhere.
pub trait ValueFunction {
    fn estimate(&self, features: &[f32]) -> f32;
}

impl<F> ValueFunction for F
where
    F: Fn(&[f32]) -> f32,
{
    fn estimate(&self, features: &[f32]) -> f32 {
        self(features)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LinearValue {
    pub weights: Vec<f32>,
    #[serde(default)]
    pub bias: f32,
}

impl LinearValue {
    pub fn new(weights: Vec<f32>, bias: f32) -> Self {
        Self { weights, bias }
    }
}

impl ValueFunction for LinearValue {
    fn estimate(&self, features: &[f32]) -> f32 {
        self.weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f32>()
            + self.bias
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_value_ignores_extra_features() {
        let model = LinearValue::new(vec![2.0, -1.0], 0.5);
        assert_eq!(model.estimate(&[1.0, 1.0, 100.0]), 1.5);
        assert_eq!(model.estimate(&[]), 0.5);
    }

    #[test]
    fn closures_are_value_functions() {
        let first = |features: &[f32]| features.first().copied().unwrap_or(0.0);
        assert_eq!(first.estimate(&[3.0, 1.0]), 3.0);
    }
}
