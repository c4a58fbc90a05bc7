//! Graph-engine error types.
//!
//! Every variant is recoverable. A mutation that returns one of these has
//! left the graph untouched.

use thiserror::Error;

/// What a `NotFound` error failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Sensor,
    Module,
    Entity,
    DataEdge,
    StateEdge,
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Missing::Sensor => write!(f, "sensor"),
            Missing::Module => write!(f, "module"),
            Missing::Entity => write!(f, "entity"),
            Missing::DataEdge => write!(f, "data edge"),
            Missing::StateEdge => write!(f, "state edge"),
        }
    }
}

/// The role an undeclared name was expected to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRole {
    Param,
    Return,
    StateKey,
}

impl std::fmt::Display for NameRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameRole::Param => write!(f, "param"),
            NameRole::Return => write!(f, "return value"),
            NameRole::StateKey => write!(f, "state key"),
        }
    }
}

/// Errors reported by graph mutations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("{kind} does not exist: {id}")]
    NotFound { kind: Missing, id: String },

    #[error("{entity} has no {role} named {name:?}")]
    InvalidReference {
        entity: String,
        role: NameRole,
        name: String,
    },

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("{id} is not a {expected}")]
    TypeMismatch {
        id: String,
        expected: crate::types::EntityKind,
    },
}

impl GraphError {
    pub(crate) fn not_found(kind: Missing, id: impl Into<String>) -> Self {
        GraphError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn invalid_reference(
        entity: impl Into<String>,
        role: NameRole,
        name: impl Into<String>,
    ) -> Self {
        GraphError::InvalidReference {
            entity: entity.into(),
            role,
            name: name.into(),
        }
    }
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;
