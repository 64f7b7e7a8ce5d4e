use thiserror::Error;

/// Structural problems with the arguments handed to the estimator.
///
/// Sparse or noisy data is never reported here: a window without enough peaks
/// simply produces no sample.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("window size must be at least one sample")]
    ZeroWindowSize,

    #[error("minimum time interval must be a non-negative number of seconds, got {0}")]
    NegativeMinInterval(f64),

    #[error("maximum rpm must be a positive number, got {0}")]
    InvalidMaxRpm(f64),

    #[error("values and times differ in length ({values} values, {times} times)")]
    LengthMismatch { values: usize, times: usize },

    #[error("value at index {index} cannot be represented as f64")]
    UnrepresentableValue { index: usize },
}
