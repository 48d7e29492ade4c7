//! Error types for the protocol layer.

/// Errors raised while interpreting wire values.
///
/// Each crate in Famiglia defines its own error enum, so a
/// `ProtocolError` always means "the client sent a value we can't read",
/// never a storage or authentication problem.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A field held a value outside its allowed set.
    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}
