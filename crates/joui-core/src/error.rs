#![forbid(unsafe_code)]

//! Error types for surface operations.
//!
//! Only configuration mistakes are errors. Everything else on the surface
//! (detaching an unattached node, removing an absent class, cancelling a task
//! that already ran) degrades to a no-op.

/// Errors raised while configuring surface nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// A style specification was neither a class name nor a property map.
    UnrecognizedStyle {
        /// JSON type name of the rejected value.
        found: &'static str,
    },
    /// A style property map contained a non-scalar value.
    InvalidStyleProperty {
        /// Name of the offending property.
        name: String,
    },
}

impl std::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrecognizedStyle { found } => write!(
                f,
                "unrecognized style specification ({found}); must be an object or a string"
            ),
            Self::InvalidStyleProperty { name } => {
                write!(f, "style property '{name}' must be a string, number or bool")
            }
        }
    }
}

impl std::error::Error for SurfaceError {}
