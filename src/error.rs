use thiserror::Error;

#[derive(Debug, Error)]
pub enum GestureError {
    #[error("invalid recording config: {reason}")]
    InvalidConfig { reason: String },

    #[error("curve has {0} control points, need at least 2")]
    TooFewControlPoints(usize),

    #[error("curve import produced no usable samples")]
    EmptyImport,
}
