use thiserror::Error;

pub type AiResult<T> = Result<T, AiError>;

/// Estimator failures.
///
/// These are never domain errors by themselves: callers decide whether a
/// failure aborts training or selects a fallback path.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("fit failed: {0}")]
    FitFailed(String),

    #[error("model expects {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("singular system: {0}")]
    Singular(String),
}

impl AiError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn fit_failed(msg: impl Into<String>) -> Self {
        Self::FitFailed(msg.into())
    }
}

/// Reject a row whose width differs from the fitted feature count.
pub(crate) fn check_width(expected: usize, row: &[f64]) -> AiResult<()> {
    if row.len() == expected {
        Ok(())
    } else {
        Err(AiError::DimensionMismatch {
            expected,
            actual: row.len(),
        })
    }
}

/// Validate a design matrix: non-empty, rectangular and finite.
pub(crate) fn check_matrix(x: &[Vec<f64>]) -> AiResult<usize> {
    let width = x
        .first()
        .map(Vec::len)
        .ok_or_else(|| AiError::invalid("empty design matrix"))?;
    if width == 0 {
        return Err(AiError::invalid("design matrix has no columns"));
    }
    for (i, row) in x.iter().enumerate() {
        if row.len() != width {
            return Err(AiError::invalid(format!(
                "row {i} has {} columns, expected {width}",
                row.len()
            )));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(AiError::invalid(format!("row {i} contains a non-finite value")));
        }
    }
    Ok(width)
}
