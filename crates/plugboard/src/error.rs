//! Error types for plugboard

use thiserror::Error;

/// Result type alias for plugboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by hub resolution and module binding
///
/// Note the deliberate asymmetry in the resolution paths: a read of a name
/// nothing supplies fails with [`Error::NotSupplied`], while a write of the
/// same name is a silent no-op.
#[derive(Debug, Error)]
pub enum Error {
    /// An attribute read was issued for a name no attached module supplies
    #[error("the attribute `{0}` is not supplied to this hub")]
    NotSupplied(String),

    /// A module asked for its hub while not attached to one
    #[error("module is not attached to a hub")]
    NotBound,
}
