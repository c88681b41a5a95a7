/// Errors raised by the union layer
///
/// Geometry faults during a union are recovered and counted, never returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnionError {
    #[error("Unknown union strategy: {0} (expected 'sequential' or 'pairwise')")]
    UnknownStrategy(String),
}
