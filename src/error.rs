//! Error handling for homeflow
//!
//! This module defines the crate-level error type and a Result alias used by
//! everything outside the graph engine. Engine mutations report the narrower
//! [`GraphError`], which converts into [`HomeflowError`].

use crate::graph::GraphError;
use thiserror::Error;

/// Main error type for homeflow operations
#[derive(Error, Debug)]
pub enum HomeflowError {
    /// A graph mutation was rejected
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to the module/sensor catalog
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// A permission index or label does not match any pipeline
    #[error("Policy error: {0}")]
    Policy(String),

    /// A graph store has nothing to load or refused a save
    #[error("Store error: {0}")]
    Store(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<HomeflowError>,
    },
}

impl HomeflowError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        HomeflowError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<serde_json::Error> for HomeflowError {
    fn from(err: serde_json::Error) -> Self {
        HomeflowError::Serialization(err.to_string())
    }
}

/// Result type alias for homeflow operations
pub type Result<T> = std::result::Result<T, HomeflowError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, GraphError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| HomeflowError::from(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| HomeflowError::from(e).with_context(f()))
    }
}
