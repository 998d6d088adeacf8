//! Error types for the configuration subsystem

use crate::attributes::TypeTag;
use crate::configuration::MutationType;
use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = std::result::Result<T, ConfigurationError>;

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Cannot change {mutation} of {display_name} after it has been resolved.")]
    MutationAfterArtifactsResolved {
        mutation: MutationType,
        display_name: String,
    },

    #[error("Cannot change {mutation} of {display_name} after task dependencies have been resolved.")]
    MutationAfterGraphResolved {
        mutation: MutationType,
        display_name: String,
    },

    #[error("Cannot change {mutation} of {display_name} after it has been included in dependency resolution.{hint}")]
    MutationAfterObservation {
        mutation: MutationType,
        display_name: String,
        hint: String,
    },

    #[error("Cannot change {mutation} of parent of {display_name} after it has been resolved.")]
    ParentMutationAfterArtifactsResolved {
        mutation: MutationType,
        display_name: String,
    },

    #[error("Cannot change {mutation} of parent of {display_name} after task dependencies have been resolved.")]
    ParentMutationAfterGraphResolved {
        mutation: MutationType,
        display_name: String,
    },

    #[error("Cyclic extendsFrom from {display_name} and {parent} is not allowed. See existing hierarchy: {hierarchy}")]
    CyclicExtendsFrom {
        display_name: String,
        parent: String,
        hierarchy: String,
    },

    #[error("Attempted to resolve {display_name} that has been resolved previously.")]
    ResolvedAfterModification { display_name: String },

    #[error("Resolved {display_name} again after modification.")]
    GraphResolvedAfterModification { display_name: String },

    #[error("Resolving {display_name} directly is not allowed.")]
    ResolutionNotAllowed { display_name: String },

    #[error("Unexpected type for attribute '{name}'. Expected {expected} but was: {actual}.")]
    AttributeTypeMismatch {
        name: String,
        expected: TypeTag,
        actual: TypeTag,
    },

    #[error(
        "Cannot have two attributes with the same name but different types. \
         This container already has an attribute named '{name}' of type '{existing}' \
         and you are trying to store another one of type '{requested}'."
    )]
    AttributeNameCollision {
        name: String,
        existing: TypeTag,
        requested: TypeTag,
    },

    #[error("Mutation of an immutable attribute container is not allowed.")]
    ImmutableAttributes,

    /// Broken internal invariant. Indicates a bug in the caller or in this
    /// crate, never bad user input.
    #[error("internal state error: {0}")]
    InternalState(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    ArtifactResolve(#[from] ArtifactResolveError),
}

impl ConfigurationError {
    /// User errors are raised at the call site; everything else is either
    /// stored in results or indicates a bug.
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self,
            ConfigurationError::InternalState(_)
                | ConfigurationError::Resolve(_)
                | ConfigurationError::Transform(_)
                | ConfigurationError::ArtifactResolve(_)
        )
    }
}

/// Aggregated failure for one configuration's resolution or artifact walk.
///
/// `context` names what was being collected ("dependencies", "files" or
/// "artifacts") so the aggregate message reads naturally.
#[derive(Error, Debug)]
#[error("Could not resolve all {context} for {display_name}.")]
pub struct ResolveError {
    pub context: &'static str,
    pub path: String,
    pub display_name: String,
    pub failures: Vec<String>,
}

impl ResolveError {
    pub fn new(
        context: &'static str,
        path: impl Into<String>,
        display_name: impl Into<String>,
        failures: Vec<String>,
    ) -> Self {
        Self {
            context,
            path: path.into(),
            display_name: display_name.into(),
            failures,
        }
    }
}

/// Failure while running an artifact transform.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Failed to transform file '{}' using transform {transform}: {cause}", .input.display())]
    ExecutionFailed {
        input: PathBuf,
        transform: String,
        cause: String,
    },

    #[error("No output file created by transform {transform} for '{}'.", .input.display())]
    NoOutput { input: PathBuf, transform: String },

    #[error("Expected output file '{}' was not created by transform {transform} for '{}'.", .output.display(), .input.display())]
    MissingOutput {
        input: PathBuf,
        output: PathBuf,
        transform: String,
    },
}

/// A single artifact whose backing file could not be materialized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Could not resolve artifact '{artifact}': {message}")]
pub struct ArtifactResolveError {
    pub artifact: String,
    pub message: String,
}
