#![allow(dead_code)]

//! Shared fixtures for configuration integration tests
//!
//! Provides an in-memory resolver stub that turns every module dependency of
//! the configuration into one graph node with one jar artifact, and file
//! dependencies into first-level file results.

use buildgraph_configurations::{
    CacheLockingManager, ComponentArtifactIdentifier, ComponentIdentifier,
    ComponentMetadataBuilder, ConfigResult, Configuration, ConfigurationContainer,
    ConfigurationServices, ConfigurationsProvider, DependencyResolver, FileDependencyResults,
    ImmutableAttributes, ListenerManager, LocalFileArtifactSet, Module, ModuleDependency,
    ModuleMetadataProvider, ModuleVersionIdentifier, ProjectFinder, ResolutionResult,
    ResolutionStrategy, ResolvedArtifact, ResolvedArtifactResults, ResolvedGraphNode,
    ResolvedLocalComponents, ResolverResults, RootComponentMetadata, TransientGraphResults,
    UnresolvedDependency,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
pub struct StubResolver {
    pub graph_calls: AtomicUsize,
    pub artifact_calls: AtomicUsize,
    /// Dependency names whose artifact file cannot be materialized.
    pub missing_modules: Vec<String>,
    /// Attributes attached to every produced artifact, keyed by dependency
    /// name.
    pub artifact_attributes: Vec<(String, ImmutableAttributes)>,
    pub unresolved: Vec<UnresolvedDependency>,
}

impl StubResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph_calls(&self) -> usize {
        self.graph_calls.load(Ordering::Relaxed)
    }

    fn attributes_for(&self, name: &str) -> ImmutableAttributes {
        self.artifact_attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, attrs)| attrs.clone())
            .unwrap_or_else(ImmutableAttributes::empty)
    }
}

impl DependencyResolver for StubResolver {
    fn resolve_build_dependencies(
        &self,
        configuration: &Arc<Configuration>,
        results: &mut ResolverResults,
    ) -> ConfigResult<()> {
        let mut files = FileDependencyResults::new();
        for dependency in configuration.all_dependencies() {
            if let Some(file_dependency) = dependency.as_file_collection() {
                files.add_first_level(
                    Arc::new(file_dependency.clone()),
                    LocalFileArtifactSet::new(None, file_dependency.files().to_vec())
                        .built_by(file_dependency.build_dependencies().to_vec()),
                );
            }
        }
        results.build_dependencies_resolved(files, ResolvedLocalComponents::new());
        Ok(())
    }

    fn resolve_graph(
        &self,
        configuration: &Arc<Configuration>,
        results: &mut ResolverResults,
    ) -> ConfigResult<()> {
        self.graph_calls.fetch_add(1, Ordering::Relaxed);
        let root_id = ModuleVersionIdentifier::new("test", configuration.name(), "1.0");
        let mut graph = TransientGraphResults::new(ResolvedGraphNode {
            component: ComponentIdentifier::project(configuration.path()),
            module: root_id.clone(),
        });
        let mut files = FileDependencyResults::new();
        let mut components = Vec::new();

        for dependency in configuration.all_dependencies() {
            if let Some(file_dependency) = dependency.as_file_collection() {
                files.add_first_level(
                    Arc::new(file_dependency.clone()),
                    LocalFileArtifactSet::new(None, file_dependency.files().to_vec())
                        .built_by(file_dependency.build_dependencies().to_vec()),
                );
                continue;
            }
            let name = dependency.name().to_string();
            let component = ComponentIdentifier::module(
                dependency.group().unwrap_or("test"),
                &name,
                dependency.version().unwrap_or("1.0"),
            );
            let node = graph.add_node(ResolvedGraphNode {
                component: component.clone(),
                module: ModuleVersionIdentifier::new(
                    dependency.group().unwrap_or("test"),
                    &name,
                    dependency.version().unwrap_or("1.0"),
                ),
            });
            let id = ComponentArtifactIdentifier::Artifact {
                component: component.clone(),
                name: format!("{}.jar", name),
            };
            let artifact = if self.missing_modules.contains(&name) {
                ResolvedArtifact::missing(
                    id,
                    &name,
                    Some("jar".to_string()),
                    self.attributes_for(&name),
                    "could not download",
                )
            } else {
                ResolvedArtifact::new(
                    id,
                    &name,
                    Some("jar".to_string()),
                    self.attributes_for(&name),
                    PathBuf::from(format!("cache/{}.jar", name)),
                )
            };
            let root = graph.root();
            graph.add_edge(root, node, vec![Arc::new(artifact)]);
            graph.add_first_level(Arc::clone(&dependency), node);
            components.push(component);
        }

        results.graph_resolved(
            ResolutionResult {
                root: root_id,
                components,
            },
            graph,
            files,
            ResolvedLocalComponents::new(),
            self.unresolved.clone(),
        );
        Ok(())
    }

    fn resolve_artifacts(
        &self,
        _configuration: &Arc<Configuration>,
        results: &mut ResolverResults,
    ) -> ConfigResult<()> {
        self.artifact_calls.fetch_add(1, Ordering::Relaxed);
        let graph = results.graph()?;
        let mut artifacts = ResolvedArtifactResults::new();
        for (_, node) in graph.first_level() {
            for artifact in graph.incoming_edge_artifacts(graph.root(), *node) {
                artifacts.push(Arc::clone(artifact));
            }
        }
        results.artifacts_resolved(artifacts);
        Ok(())
    }
}

pub struct FixedModuleProvider;

impl ModuleMetadataProvider for FixedModuleProvider {
    fn module(&self) -> Module {
        Module {
            group: "test".to_string(),
            name: "project".to_string(),
            version: "1.0".to_string(),
            status: "integration".to_string(),
            project_path: Some(":".to_string()),
        }
    }
}

pub struct NoProjects;

impl ProjectFinder for NoProjects {
    fn find_configuration(&self, _project_path: &str, _name: &str) -> Option<Arc<Configuration>> {
        None
    }
}

pub struct SimpleMetadataBuilder;

impl ComponentMetadataBuilder for SimpleMetadataBuilder {
    fn build_root_component(
        &self,
        module: &Module,
        configurations: &[Arc<Configuration>],
    ) -> RootComponentMetadata {
        RootComponentMetadata {
            id: module.id(),
            component: ComponentIdentifier::project(
                module.project_path.clone().unwrap_or_else(|| ":".to_string()),
            ),
            configuration_names: configurations.iter().map(|c| c.name().to_string()).collect(),
        }
    }
}

pub fn services(resolver: Arc<StubResolver>) -> ConfigurationServices {
    ConfigurationServices {
        resolver,
        listener_manager: Arc::new(ListenerManager::new()),
        metadata_provider: Arc::new(FixedModuleProvider),
        project_finder: Arc::new(NoProjects),
        component_metadata_builder: Arc::new(SimpleMetadataBuilder),
        cache_locking: Arc::new(CacheLockingManager::new()),
    }
}

pub fn configuration(name: &str, services: &ConfigurationServices) -> Arc<Configuration> {
    Configuration::new(
        format!(":{}", name),
        name,
        Arc::new(ConfigurationContainer::new()) as Arc<dyn ConfigurationsProvider>,
        services.clone(),
        ResolutionStrategy::new(),
    )
}

pub fn module_dep(name: &str) -> Arc<dyn buildgraph_configurations::Dependency> {
    Arc::new(ModuleDependency::new("org.x", name, "1.0"))
}
