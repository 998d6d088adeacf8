//! Attribute-driven artifact transforms
//!
//! A transform declares the attribute set it consumes and the attribute sets
//! it can produce. Registration fans one row out per declared output set;
//! lookup matches the registered sets as value-equal subsets of the query
//! sets, first registration winning.

use crate::attributes::ImmutableAttributes;
use crate::error::{ConfigResult, TransformError};
use crate::resolver::ResolvedArtifact;
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// User-supplied conversion between artifact formats.
///
/// `transform` performs the conversion as a side effect; `result` reports the
/// file produced for one requested output attribute set.
pub trait ArtifactTransform: Send + Sync {
    /// Short name used in failure messages.
    fn display_name(&self) -> &str;

    fn input_attributes(&self) -> ImmutableAttributes;

    fn output_attribute_sets(&self) -> Vec<ImmutableAttributes>;

    /// Directory created (including parents) before the transform runs.
    fn output_directory(&self) -> Option<PathBuf> {
        None
    }

    fn transform(&self, input: &Path) -> Result<(), String>;

    fn result(&self, output_attributes: &ImmutableAttributes) -> Option<PathBuf>;
}

type TransformFactory = Arc<dyn Fn() -> Box<dyn ArtifactTransform> + Send + Sync>;

struct TransformRegistration {
    from: ImmutableAttributes,
    to: ImmutableAttributes,
    factory: TransformFactory,
}

/// Registry of artifact transforms.
#[derive(Default)]
pub struct TransformRegistry {
    registrations: RwLock<Vec<TransformRegistration>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform. The factory is probed once to read the attribute
    /// declarations, producing one registration row per output set; a fresh
    /// instance is created for every matched lookup.
    pub fn register<F>(&self, factory: F)
    where
        F: Fn() -> Box<dyn ArtifactTransform> + Send + Sync + 'static,
    {
        let factory: TransformFactory = Arc::new(factory);
        let probe = factory();
        let from = probe.input_attributes();
        let mut registrations = self.registrations.write();
        for to in probe.output_attribute_sets() {
            registrations.push(TransformRegistration {
                from: from.clone(),
                to,
                factory: Arc::clone(&factory),
            });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.read().is_empty()
    }

    /// Find a transform converting `from` into `to`. First registration wins;
    /// `None` when nothing matches.
    pub fn get_transform(
        &self,
        from: &ImmutableAttributes,
        to: &ImmutableAttributes,
    ) -> Option<FileTransform> {
        let registrations = self.registrations.read();
        for registration in registrations.iter() {
            if attributes_match(&registration.from, from) && attributes_match(&registration.to, to)
            {
                return Some(FileTransform {
                    transform: (registration.factory)(),
                    output_attributes: registration.to.clone(),
                });
            }
        }
        None
    }
}

/// Every attribute present in `required` must have an equal value in
/// `actual`; extra attributes in `actual` are allowed.
fn attributes_match(required: &ImmutableAttributes, actual: &ImmutableAttributes) -> bool {
    required
        .keys()
        .all(|key| actual.get(key) == required.get(key))
}

/// A matched transform bound to one requested output attribute set.
pub struct FileTransform {
    transform: Box<dyn ArtifactTransform>,
    output_attributes: ImmutableAttributes,
}

impl FileTransform {
    pub fn output_attributes(&self) -> &ImmutableAttributes {
        &self.output_attributes
    }

    /// Run the transform for `input` and return the produced file.
    pub fn apply(&self, input: &Path) -> Result<PathBuf, TransformError> {
        if let Some(dir) = self.transform.output_directory() {
            fs::create_dir_all(&dir).map_err(|e| TransformError::ExecutionFailed {
                input: input.to_path_buf(),
                transform: self.transform.display_name().to_string(),
                cause: e.to_string(),
            })?;
        }

        if let Err(cause) = self.transform.transform(input) {
            return Err(TransformError::ExecutionFailed {
                input: input.to_path_buf(),
                transform: self.transform.display_name().to_string(),
                cause,
            });
        }

        match self.transform.result(&self.output_attributes) {
            None => Err(TransformError::NoOutput {
                input: input.to_path_buf(),
                transform: self.transform.display_name().to_string(),
            }),
            Some(output) if !output.exists() => Err(TransformError::MissingOutput {
                input: input.to_path_buf(),
                output,
                transform: self.transform.display_name().to_string(),
            }),
            Some(output) => Ok(output),
        }
    }
}

/// Converts visited artifacts to the consumer's requested attributes before
/// they reach the visitor. Artifacts that already satisfy the request, or for
/// which no transform is registered, pass through unchanged.
pub struct ArtifactTransformer {
    registry: Arc<TransformRegistry>,
    requested: ImmutableAttributes,
}

impl ArtifactTransformer {
    pub fn new(registry: Arc<TransformRegistry>, requested: ImmutableAttributes) -> Self {
        Self { registry, requested }
    }

    pub fn prepare(&self, artifact: &Arc<ResolvedArtifact>) -> ConfigResult<Arc<ResolvedArtifact>> {
        if self.requested.is_empty() || attributes_match(&self.requested, artifact.attributes()) {
            return Ok(Arc::clone(artifact));
        }
        let Some(transform) = self
            .registry
            .get_transform(artifact.attributes(), &self.requested)
        else {
            return Ok(Arc::clone(artifact));
        };
        debug!(artifact = %artifact.id(), to = %self.requested, "transforming artifact");
        let input = artifact.file()?;
        let output = transform.apply(input)?;
        Ok(Arc::new(
            artifact.transformed(output, transform.output_attributes().clone()),
        ))
    }
}
