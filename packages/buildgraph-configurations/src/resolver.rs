//! External resolver contract and the resolved-result data model
//!
//! The resolver engine itself lives outside this crate. This module defines
//! what it is asked to do (`DependencyResolver`), the results object it
//! populates phase by phase (`ResolverResults`), and the retained graph data
//! the lenient view walks afterwards.

use crate::attributes::ImmutableAttributes;
use crate::configuration::Configuration;
use crate::dependency::{Dependency, FileDependency};
use crate::error::{ArtifactResolveError, ConfigResult, ConfigurationError};
use crate::lenient::ResolvedConfiguration;
use parking_lot::ReentrantMutex;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

/// Identifies a resolved component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentIdentifier {
    /// Component from an external module repository.
    Module {
        group: String,
        module: String,
        version: String,
    },
    /// Component built by a project in the current build.
    Project { project_path: String },
}

impl ComponentIdentifier {
    pub fn module(
        group: impl Into<String>,
        module: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        ComponentIdentifier::Module {
            group: group.into(),
            module: module.into(),
            version: version.into(),
        }
    }

    pub fn project(project_path: impl Into<String>) -> Self {
        ComponentIdentifier::Project {
            project_path: project_path.into(),
        }
    }

    pub fn is_external_module(&self) -> bool {
        matches!(self, ComponentIdentifier::Module { .. })
    }
}

impl fmt::Display for ComponentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentIdentifier::Module {
                group,
                module,
                version,
            } => write!(f, "{}:{}:{}", group, module, version),
            ComponentIdentifier::Project { project_path } => write!(f, "project {}", project_path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleVersionIdentifier {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl ModuleVersionIdentifier {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ModuleVersionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// Module identity of the owning project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub group: String,
    pub name: String,
    pub version: String,
    pub status: String,
    pub project_path: Option<String>,
}

impl Module {
    pub fn id(&self) -> ModuleVersionIdentifier {
        ModuleVersionIdentifier::new(&self.group, &self.name, &self.version)
    }
}

/// Identifies one artifact of a resolved component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentArtifactIdentifier {
    /// Artifact declared by the component's metadata.
    Artifact {
        component: ComponentIdentifier,
        name: String,
    },
    /// File attached to a known component.
    ComponentFile {
        component: ComponentIdentifier,
        file_name: String,
    },
    /// Standalone file with no owning component.
    OpaqueFile { path: PathBuf },
}

impl ComponentArtifactIdentifier {
    pub fn component(&self) -> Option<&ComponentIdentifier> {
        match self {
            ComponentArtifactIdentifier::Artifact { component, .. }
            | ComponentArtifactIdentifier::ComponentFile { component, .. } => Some(component),
            ComponentArtifactIdentifier::OpaqueFile { .. } => None,
        }
    }
}

impl fmt::Display for ComponentArtifactIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentArtifactIdentifier::Artifact { component, name } => {
                write!(f, "{} ({})", name, component)
            }
            ComponentArtifactIdentifier::ComponentFile {
                component,
                file_name,
            } => write!(f, "{} ({})", file_name, component),
            ComponentArtifactIdentifier::OpaqueFile { path } => write!(f, "{}", path.display()),
        }
    }
}

/// Where an artifact's backing file comes from.
#[derive(Debug, Clone)]
enum ArtifactSource {
    File(PathBuf),
    Missing(String),
}

/// One artifact in the resolved graph. The backing file may be unavailable;
/// `file()` surfaces that as an artifact-resolve failure.
#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    id: ComponentArtifactIdentifier,
    name: String,
    extension: Option<String>,
    attributes: ImmutableAttributes,
    source: ArtifactSource,
}

impl ResolvedArtifact {
    pub fn new(
        id: ComponentArtifactIdentifier,
        name: impl Into<String>,
        extension: Option<String>,
        attributes: ImmutableAttributes,
        file: PathBuf,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            extension,
            attributes,
            source: ArtifactSource::File(file),
        }
    }

    /// An artifact whose file could not be materialized.
    pub fn missing(
        id: ComponentArtifactIdentifier,
        name: impl Into<String>,
        extension: Option<String>,
        attributes: ImmutableAttributes,
        failure: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            extension,
            attributes,
            source: ArtifactSource::Missing(failure.into()),
        }
    }

    pub fn id(&self) -> &ComponentArtifactIdentifier {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn attributes(&self) -> &ImmutableAttributes {
        &self.attributes
    }

    pub fn file(&self) -> Result<&Path, ArtifactResolveError> {
        match &self.source {
            ArtifactSource::File(path) => Ok(path),
            ArtifactSource::Missing(message) => Err(ArtifactResolveError {
                artifact: self.id.to_string(),
                message: message.clone(),
            }),
        }
    }

    pub fn is_external_module(&self) -> bool {
        self.id
            .component()
            .map_or(false, ComponentIdentifier::is_external_module)
    }

    /// Same artifact, converted to another format by a transform.
    pub fn transformed(&self, file: PathBuf, attributes: ImmutableAttributes) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            extension: self.extension.clone(),
            attributes,
            source: ArtifactSource::File(file),
        }
    }
}

/// A materialized artifact result handed to consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifactResult {
    pub id: ComponentArtifactIdentifier,
    pub file: PathBuf,
}

/// Node in the resolved module graph.
#[derive(Debug, Clone)]
pub struct ResolvedGraphNode {
    pub component: ComponentIdentifier,
    pub module: ModuleVersionIdentifier,
}

/// Resolved module graph retained for artifact walks. A synthetic root node
/// stands for the resolved configuration itself; edge weights carry the
/// artifacts contributed along that edge.
pub struct TransientGraphResults {
    graph: DiGraph<ResolvedGraphNode, Vec<Arc<ResolvedArtifact>>>,
    root: NodeIndex,
    first_level: Vec<(Arc<dyn Dependency>, NodeIndex)>,
}

impl TransientGraphResults {
    pub fn new(root: ResolvedGraphNode) -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(root);
        Self {
            graph,
            root,
            first_level: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node: ResolvedGraphNode) -> NodeIndex {
        self.graph.add_node(node)
    }

    pub fn add_edge(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        artifacts: Vec<Arc<ResolvedArtifact>>,
    ) {
        self.graph.add_edge(from, to, artifacts);
    }

    /// Record a direct graph node together with the declaration that put it
    /// there, so walks can filter by dependency predicate.
    pub fn add_first_level(&mut self, declaration: Arc<dyn Dependency>, node: NodeIndex) {
        self.first_level.push((declaration, node));
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn node(&self, index: NodeIndex) -> &ResolvedGraphNode {
        &self.graph[index]
    }

    pub fn first_level(&self) -> &[(Arc<dyn Dependency>, NodeIndex)] {
        &self.first_level
    }

    /// Outgoing neighbors in edge insertion order.
    pub fn outgoing(&self, from: NodeIndex) -> Vec<NodeIndex> {
        let mut nodes: Vec<_> = self
            .graph
            .neighbors_directed(from, Direction::Outgoing)
            .collect();
        nodes.reverse();
        nodes
    }

    pub fn incoming_edge_artifacts(
        &self,
        from: NodeIndex,
        to: NodeIndex,
    ) -> &[Arc<ResolvedArtifact>] {
        self.graph
            .find_edge(from, to)
            .map(|edge| self.graph[edge].as_slice())
            .unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

/// Aggregated artifacts of a resolution, in graph emission order.
#[derive(Default)]
pub struct ResolvedArtifactResults {
    artifacts: Vec<Arc<ResolvedArtifact>>,
}

impl ResolvedArtifactResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, artifact: Arc<ResolvedArtifact>) {
        self.artifacts.push(artifact);
    }

    pub fn artifacts(&self) -> &[Arc<ResolvedArtifact>] {
        &self.artifacts
    }
}

/// Artifact set backed by a local file dependency. Yields no module
/// artifacts; contributes its files to file-visiting walks and its build
/// dependencies to the build-dependency query.
#[derive(Debug, Clone)]
pub struct LocalFileArtifactSet {
    pub component: Option<ComponentIdentifier>,
    pub files: Vec<PathBuf>,
    pub build_dependencies: Vec<String>,
}

impl LocalFileArtifactSet {
    pub fn new(component: Option<ComponentIdentifier>, files: Vec<PathBuf>) -> Self {
        Self {
            component,
            files,
            build_dependencies: Vec::new(),
        }
    }

    pub fn built_by(mut self, tasks: Vec<String>) -> Self {
        self.build_dependencies = tasks;
        self
    }

    pub fn collect_build_dependencies(&self, dest: &mut Vec<String>) {
        dest.extend(self.build_dependencies.iter().cloned());
    }
}

/// File dependencies attached to a resolution: the first level keyed by
/// declaration, per-node sets discovered deeper in the graph, and the
/// aggregate used by the satisfy-all fast path.
#[derive(Default)]
pub struct FileDependencyResults {
    first_level: Vec<(Arc<FileDependency>, LocalFileArtifactSet)>,
    by_node: FxHashMap<NodeIndex, Vec<LocalFileArtifactSet>>,
    all: Vec<LocalFileArtifactSet>,
}

impl FileDependencyResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_first_level(&mut self, declaration: Arc<FileDependency>, set: LocalFileArtifactSet) {
        self.all.push(set.clone());
        self.first_level.push((declaration, set));
    }

    pub fn add_for_node(&mut self, node: NodeIndex, set: LocalFileArtifactSet) {
        self.all.push(set.clone());
        self.by_node.entry(node).or_default().push(set);
    }

    pub fn first_level(&self) -> &[(Arc<FileDependency>, LocalFileArtifactSet)] {
        &self.first_level
    }

    pub fn for_node(&self, node: NodeIndex) -> &[LocalFileArtifactSet] {
        self.by_node.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all(&self) -> &[LocalFileArtifactSet] {
        &self.all
    }

    pub fn collect_build_dependencies(&self, dest: &mut Vec<String>) {
        for set in &self.all {
            set.collect_build_dependencies(dest);
        }
    }
}

/// Configuration of a sibling project consumed during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProjectConfiguration {
    pub project_path: String,
    pub configuration: String,
}

/// Local components that took part in a resolution.
#[derive(Default)]
pub struct ResolvedLocalComponents {
    resolved_project_configurations: Vec<ResolvedProjectConfiguration>,
    artifact_build_dependencies: Vec<String>,
}

impl ResolvedLocalComponents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_project_configuration(&mut self, project_path: impl Into<String>, configuration: impl Into<String>) {
        self.resolved_project_configurations
            .push(ResolvedProjectConfiguration {
                project_path: project_path.into(),
                configuration: configuration.into(),
            });
    }

    pub fn add_artifact_build_dependency(&mut self, task: impl Into<String>) {
        self.artifact_build_dependencies.push(task.into());
    }

    pub fn resolved_project_configurations(&self) -> &[ResolvedProjectConfiguration] {
        &self.resolved_project_configurations
    }

    pub fn collect_artifact_build_dependencies(&self, dest: &mut Vec<String>) {
        dest.extend(self.artifact_build_dependencies.iter().cloned());
    }
}

/// A dependency the resolver could not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDependency {
    pub selector: String,
    pub problem: String,
}

/// Minimal public view of the resolved module graph.
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    pub root: ModuleVersionIdentifier,
    pub components: Vec<ComponentIdentifier>,
}

/// Results cache populated by the resolver across the resolution phases and
/// retained by the owning configuration.
#[derive(Default)]
pub struct ResolverResults {
    resolution_result: Option<Arc<ResolutionResult>>,
    graph: Option<Arc<TransientGraphResults>>,
    file_dependencies: Option<Arc<FileDependencyResults>>,
    resolved_local_components: Option<Arc<ResolvedLocalComponents>>,
    artifact_results: Option<Arc<ResolvedArtifactResults>>,
    unresolved: Vec<UnresolvedDependency>,
    resolved_configuration: Option<Arc<ResolvedConfiguration>>,
}

impl ResolverResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the resolver has recorded at least one resolution failure.
    pub fn has_error(&self) -> bool {
        !self.unresolved.is_empty()
    }

    /// Called by the resolver when the graph phase completes.
    pub fn graph_resolved(
        &mut self,
        result: ResolutionResult,
        graph: TransientGraphResults,
        file_dependencies: FileDependencyResults,
        local_components: ResolvedLocalComponents,
        unresolved: Vec<UnresolvedDependency>,
    ) {
        self.resolution_result = Some(Arc::new(result));
        self.graph = Some(Arc::new(graph));
        self.file_dependencies = Some(Arc::new(file_dependencies));
        self.resolved_local_components = Some(Arc::new(local_components));
        self.unresolved = unresolved;
    }

    /// Called by the resolver when only build dependencies were traversed.
    pub fn build_dependencies_resolved(
        &mut self,
        file_dependencies: FileDependencyResults,
        local_components: ResolvedLocalComponents,
    ) {
        self.file_dependencies = Some(Arc::new(file_dependencies));
        self.resolved_local_components = Some(Arc::new(local_components));
    }

    /// Called by the resolver when the artifact phase completes.
    pub fn artifacts_resolved(&mut self, artifacts: ResolvedArtifactResults) {
        self.artifact_results = Some(Arc::new(artifacts));
    }

    pub fn resolution_result(&self) -> ConfigResult<Arc<ResolutionResult>> {
        self.resolution_result
            .clone()
            .ok_or_else(|| ConfigurationError::InternalState("graph has not been resolved".into()))
    }

    pub fn graph(&self) -> ConfigResult<Arc<TransientGraphResults>> {
        self.graph
            .clone()
            .ok_or_else(|| ConfigurationError::InternalState("graph has not been resolved".into()))
    }

    pub fn file_dependencies(&self) -> ConfigResult<Arc<FileDependencyResults>> {
        self.file_dependencies.clone().ok_or_else(|| {
            ConfigurationError::InternalState("file dependencies have not been resolved".into())
        })
    }

    pub fn resolved_local_components(&self) -> ConfigResult<Arc<ResolvedLocalComponents>> {
        self.resolved_local_components.clone().ok_or_else(|| {
            ConfigurationError::InternalState("local components have not been resolved".into())
        })
    }

    pub fn artifact_results(&self) -> ConfigResult<Arc<ResolvedArtifactResults>> {
        self.artifact_results.clone().ok_or_else(|| {
            ConfigurationError::InternalState("artifacts have not been resolved".into())
        })
    }

    pub fn unresolved(&self) -> &[UnresolvedDependency] {
        &self.unresolved
    }

    pub(crate) fn set_resolved_configuration(&mut self, view: Arc<ResolvedConfiguration>) {
        self.resolved_configuration = Some(view);
    }

    pub fn resolved_configuration(&self) -> ConfigResult<Arc<ResolvedConfiguration>> {
        self.resolved_configuration.clone().ok_or_else(|| {
            ConfigurationError::InternalState("artifacts have not been resolved".into())
        })
    }
}

/// Resolver engine contract. Implementations live outside this crate.
pub trait DependencyResolver: Send + Sync {
    /// Populate local-component build dependency information only.
    fn resolve_build_dependencies(
        &self,
        configuration: &Arc<Configuration>,
        results: &mut ResolverResults,
    ) -> ConfigResult<()>;

    /// Build the module graph and local component info.
    fn resolve_graph(
        &self,
        configuration: &Arc<Configuration>,
        results: &mut ResolverResults,
    ) -> ConfigResult<()>;

    /// Materialize resolved artifacts for a previously resolved graph.
    fn resolve_artifacts(
        &self,
        configuration: &Arc<Configuration>,
        results: &mut ResolverResults,
    ) -> ConfigResult<()>;
}

/// Supplies the module identity of the owning project.
pub trait ModuleMetadataProvider: Send + Sync {
    fn module(&self) -> Module;
}

/// Looks up configurations of sibling projects so referenced-configuration
/// observation can be propagated.
pub trait ProjectFinder: Send + Sync {
    fn find_configuration(&self, project_path: &str, name: &str) -> Option<Arc<Configuration>>;
}

/// Entry-point metadata describing this project to the resolver.
#[derive(Debug, Clone)]
pub struct RootComponentMetadata {
    pub id: ModuleVersionIdentifier,
    pub component: ComponentIdentifier,
    pub configuration_names: Vec<String>,
}

/// Assembles the root component fed to the resolver.
pub trait ComponentMetadataBuilder: Send + Sync {
    fn build_root_component(
        &self,
        module: &Module,
        configurations: &[Arc<Configuration>],
    ) -> RootComponentMetadata;
}

/// Serializes access to the on-disk artifact cache. Reads of
/// `ResolvedArtifact::file` that may materialize files run inside
/// `use_cache`.
#[derive(Default)]
pub struct CacheLockingManager {
    lock: ReentrantMutex<()>,
}

impl CacheLockingManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn use_cache<T>(&self, operation: &str, action: impl FnOnce() -> T) -> T {
        trace!(operation, "entering artifact cache");
        let _guard = self.lock.lock();
        action()
    }
}
