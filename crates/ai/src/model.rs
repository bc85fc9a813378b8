use crate::result::AiResult;

/// A fitted single-output regressor.
///
/// Implementors must be immutable after fitting so one instance can serve
/// concurrent predictions.
pub trait Regressor: Send + Sync {
    /// Width of the feature vector the model was fitted on.
    fn n_features(&self) -> usize;

    fn predict_row(&self, row: &[f64]) -> AiResult<f64>;

    fn predict(&self, rows: &[Vec<f64>]) -> AiResult<Vec<f64>> {
        rows.iter().map(|r| self.predict_row(r)).collect()
    }
}
