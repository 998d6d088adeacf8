//! Dependency declarations, published artifacts, and exclude rules

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A declared dependency. Concrete kinds live outside this subsystem; a
/// configuration only needs identity, copying, and the file-collection
/// marker.
pub trait Dependency: fmt::Debug + Send + Sync {
    fn group(&self) -> Option<&str>;

    fn name(&self) -> &str;

    fn version(&self) -> Option<&str>;

    /// Produce an independent declaration equal to this one.
    fn copy_dependency(&self) -> Arc<dyn Dependency>;

    /// File-collection marker: `Some` for dependencies backed by local files.
    fn as_file_collection(&self) -> Option<&FileDependency> {
        None
    }

    /// Value equality across instances; copies must match their source.
    fn matches(&self, other: &dyn Dependency) -> bool;

    fn description(&self) -> String {
        match (self.group(), self.version()) {
            (Some(group), Some(version)) => format!("{}:{}:{}", group, self.name(), version),
            (Some(group), None) => format!("{}:{}", group, self.name()),
            (None, _) => self.name().to_string(),
        }
    }
}

/// Dependency on an external module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDependency {
    group: String,
    name: String,
    version: String,
    transitive: bool,
}

impl ModuleDependency {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
            transitive: true,
        }
    }

    pub fn with_transitive(mut self, transitive: bool) -> Self {
        self.transitive = transitive;
        self
    }

    pub fn is_transitive(&self) -> bool {
        self.transitive
    }
}

impl Dependency for ModuleDependency {
    fn group(&self) -> Option<&str> {
        Some(&self.group)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> Option<&str> {
        Some(&self.version)
    }

    fn copy_dependency(&self) -> Arc<dyn Dependency> {
        Arc::new(self.clone())
    }

    fn matches(&self, other: &dyn Dependency) -> bool {
        other.as_file_collection().is_none()
            && other.group() == Some(self.group.as_str())
            && other.name() == self.name
            && other.version() == Some(self.version.as_str())
    }
}

/// Dependency backed by a set of local files. Exposes the file set and the
/// tasks that build it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDependency {
    label: String,
    files: Vec<PathBuf>,
    built_by: Vec<String>,
}

impl FileDependency {
    pub fn new(label: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self {
            label: label.into(),
            files,
            built_by: Vec::new(),
        }
    }

    pub fn built_by(mut self, tasks: Vec<String>) -> Self {
        self.built_by = tasks;
        self
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn build_dependencies(&self) -> &[String] {
        &self.built_by
    }
}

impl Dependency for FileDependency {
    fn group(&self) -> Option<&str> {
        None
    }

    fn name(&self) -> &str {
        &self.label
    }

    fn version(&self) -> Option<&str> {
        None
    }

    fn copy_dependency(&self) -> Arc<dyn Dependency> {
        Arc::new(self.clone())
    }

    fn as_file_collection(&self) -> Option<&FileDependency> {
        Some(self)
    }

    fn matches(&self, other: &dyn Dependency) -> bool {
        other
            .as_file_collection()
            .map_or(false, |f| f.label == self.label && f.files == self.files)
    }

    fn description(&self) -> String {
        format!("files({})", self.label)
    }
}

/// Predicate over declared dependencies. Walks take a fast path when the
/// predicate is the satisfy-all constant.
#[derive(Clone)]
pub enum DependencySpec {
    All,
    Predicate(Arc<dyn Fn(&dyn Dependency) -> bool + Send + Sync>),
}

impl DependencySpec {
    pub fn satisfy_all() -> Self {
        DependencySpec::All
    }

    pub fn matching<F>(predicate: F) -> Self
    where
        F: Fn(&dyn Dependency) -> bool + Send + Sync + 'static,
    {
        DependencySpec::Predicate(Arc::new(predicate))
    }

    pub fn is_satisfied_by(&self, dependency: &dyn Dependency) -> bool {
        match self {
            DependencySpec::All => true,
            DependencySpec::Predicate(predicate) => predicate(dependency),
        }
    }

    pub fn is_satisfy_all(&self) -> bool {
        matches!(self, DependencySpec::All)
    }
}

impl fmt::Debug for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencySpec::All => write!(f, "DependencySpec::All"),
            DependencySpec::Predicate(_) => write!(f, "DependencySpec::Predicate"),
        }
    }
}

/// Ordered set of declared dependencies. Membership is declaration identity,
/// so two equal declarations added separately are both kept only once if they
/// are literally the same instance.
#[derive(Clone, Default)]
pub struct DependencySet {
    items: Vec<Arc<dyn Dependency>>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, dependency: Arc<dyn Dependency>) -> bool {
        if self.contains(&dependency) {
            return false;
        }
        self.items.push(dependency);
        true
    }

    pub fn remove(&mut self, dependency: &Arc<dyn Dependency>) -> bool {
        let before = self.items.len();
        self.items.retain(|d| !Arc::ptr_eq(d, dependency));
        self.items.len() != before
    }

    pub fn contains(&self, dependency: &Arc<dyn Dependency>) -> bool {
        self.items.iter().any(|d| Arc::ptr_eq(d, dependency))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Dependency>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Arc<dyn Dependency>> {
        self.items.clone()
    }

    pub fn matching(&self, spec: &DependencySpec) -> Vec<Arc<dyn Dependency>> {
        self.items
            .iter()
            .filter(|d| spec.is_satisfied_by(d.as_ref()))
            .cloned()
            .collect()
    }
}

impl fmt::Debug for DependencySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.items.iter().map(|d| d.description()))
            .finish()
    }
}

/// Group/module pair excluded from resolution. Immutable once inserted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExcludeRule {
    group: String,
    module: String,
}

impl ExcludeRule {
    pub fn new(group: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            module: module.into(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn module(&self) -> &str {
        &self.module
    }
}

impl fmt::Display for ExcludeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.module)
    }
}

/// An artifact produced by a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishArtifact {
    name: String,
    extension: String,
    artifact_type: String,
    classifier: Option<String>,
    file: PathBuf,
    built_by: Vec<String>,
}

impl PublishArtifact {
    pub fn new(name: impl Into<String>, extension: impl Into<String>, file: PathBuf) -> Self {
        let extension = extension.into();
        Self {
            name: name.into(),
            artifact_type: extension.clone(),
            extension,
            classifier: None,
            file,
            built_by: Vec::new(),
        }
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn built_by(mut self, tasks: Vec<String>) -> Self {
        self.built_by = tasks;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn artifact_type(&self) -> &str {
        &self.artifact_type
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn build_dependencies(&self) -> &[String] {
        &self.built_by
    }
}

impl fmt::Display for PublishArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.name, self.artifact_type, self.extension)
    }
}

/// Ordered, value-deduplicated set of published artifacts.
#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    items: Vec<PublishArtifact>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, artifact: PublishArtifact) -> bool {
        if self.items.contains(&artifact) {
            return false;
        }
        self.items.push(artifact);
        true
    }

    pub fn remove(&mut self, artifact: &PublishArtifact) -> bool {
        let before = self.items.len();
        self.items.retain(|a| a != artifact);
        self.items.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &PublishArtifact> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_vec(&self) -> Vec<PublishArtifact> {
        self.items.clone()
    }

    pub fn files(&self) -> Vec<PathBuf> {
        self.items.iter().map(|a| a.file.clone()).collect()
    }

    pub fn collect_build_dependencies(&self, dest: &mut Vec<String>) {
        for artifact in &self.items {
            dest.extend(artifact.built_by.iter().cloned());
        }
    }
}
