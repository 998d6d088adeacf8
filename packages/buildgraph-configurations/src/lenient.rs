//! Lenient view over resolved results and the artifact walk
//!
//! The lenient view exposes resolved artifacts while tolerating missing
//! files of external modules. Strict consumers go through
//! `ResolvedConfiguration`, which rethrows stored failures first.

use crate::dependency::DependencySpec;
use crate::error::{ConfigResult, ResolveError};
use crate::resolver::{
    CacheLockingManager, ComponentArtifactIdentifier, ComponentIdentifier, FileDependencyResults,
    ResolvedArtifact, ResolvedArtifactResult, ResolvedArtifactResults, ResolvedGraphNode,
    TransientGraphResults, UnresolvedDependency,
};
use crate::transform::ArtifactTransformer;
use crate::walker::{CachingGraphWalker, DirectedGraph};
use petgraph::graph::NodeIndex;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Artifact walk sink. One variant per collection strategy.
pub enum ArtifactVisitor {
    /// Collect artifacts only; file dependencies are skipped.
    Artifacts { artifacts: Vec<Arc<ResolvedArtifact>> },
    /// Collect files and artifacts. Artifact files are deferred until the
    /// walk finishes so output order is stable whether or not the first
    /// level was filtered.
    FilesAndArtifacts {
        files: Vec<PathBuf>,
        artifacts: Vec<Arc<ResolvedArtifact>>,
        failures: Vec<String>,
    },
    /// Collect artifact results, de-duplicated by artifact identifier and
    /// file path. Files without a component get an opaque identifier.
    Deduplicating {
        results: Vec<ResolvedArtifactResult>,
        seen_artifacts: FxHashSet<ComponentArtifactIdentifier>,
        seen_files: FxHashSet<PathBuf>,
        failures: Vec<String>,
    },
}

impl ArtifactVisitor {
    pub fn collecting_artifacts() -> Self {
        ArtifactVisitor::Artifacts {
            artifacts: Vec::new(),
        }
    }

    pub fn collecting_files_and_artifacts() -> Self {
        ArtifactVisitor::FilesAndArtifacts {
            files: Vec::new(),
            artifacts: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn deduplicating() -> Self {
        ArtifactVisitor::Deduplicating {
            results: Vec::new(),
            seen_artifacts: FxHashSet::default(),
            seen_files: FxHashSet::default(),
            failures: Vec::new(),
        }
    }

    pub fn wants_files(&self) -> bool {
        !matches!(self, ArtifactVisitor::Artifacts { .. })
    }

    pub fn visit_artifact(&mut self, artifact: Arc<ResolvedArtifact>) {
        match self {
            ArtifactVisitor::Artifacts { artifacts }
            | ArtifactVisitor::FilesAndArtifacts { artifacts, .. } => {
                if !artifacts.iter().any(|a| a.id() == artifact.id()) {
                    artifacts.push(artifact);
                }
            }
            ArtifactVisitor::Deduplicating {
                results,
                seen_artifacts,
                failures,
                ..
            } => {
                if seen_artifacts.insert(artifact.id().clone()) {
                    match artifact.file() {
                        Ok(file) => results.push(ResolvedArtifactResult {
                            id: artifact.id().clone(),
                            file: file.to_path_buf(),
                        }),
                        Err(e) => failures.push(e.to_string()),
                    }
                }
            }
        }
    }

    pub fn visit_files(&mut self, component: Option<&ComponentIdentifier>, files: &[PathBuf]) {
        match self {
            ArtifactVisitor::Artifacts { .. } => {
                debug_assert!(false, "file visit on an artifacts-only visitor");
            }
            ArtifactVisitor::FilesAndArtifacts {
                files: collected, ..
            } => {
                for file in files {
                    if !collected.contains(file) {
                        collected.push(file.clone());
                    }
                }
            }
            ArtifactVisitor::Deduplicating {
                results,
                seen_files,
                ..
            } => {
                for file in files {
                    if seen_files.insert(file.clone()) {
                        let id = match component {
                            Some(component) => ComponentArtifactIdentifier::ComponentFile {
                                component: component.clone(),
                                file_name: file
                                    .file_name()
                                    .map(|n| n.to_string_lossy().into_owned())
                                    .unwrap_or_default(),
                            },
                            None => ComponentArtifactIdentifier::OpaqueFile { path: file.clone() },
                        };
                        results.push(ResolvedArtifactResult {
                            id,
                            file: file.clone(),
                        });
                    }
                }
            }
        }
    }
}

/// Tolerant view over one configuration's resolved graph and artifacts.
pub struct LenientConfiguration {
    path: String,
    display_name: String,
    cache_locking: Arc<CacheLockingManager>,
    unresolved: Vec<UnresolvedDependency>,
    graph: Arc<TransientGraphResults>,
    artifact_results: Arc<ResolvedArtifactResults>,
    file_dependencies: Arc<FileDependencyResults>,
    transformer: ArtifactTransformer,
}

impl LenientConfiguration {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        path: String,
        display_name: String,
        cache_locking: Arc<CacheLockingManager>,
        unresolved: Vec<UnresolvedDependency>,
        graph: Arc<TransientGraphResults>,
        artifact_results: Arc<ResolvedArtifactResults>,
        file_dependencies: Arc<FileDependencyResults>,
        transformer: ArtifactTransformer,
    ) -> Self {
        Self {
            path,
            display_name,
            cache_locking,
            unresolved,
            graph,
            artifact_results,
            file_dependencies,
            transformer,
        }
    }

    pub fn has_error(&self) -> bool {
        !self.unresolved.is_empty()
    }

    pub fn unresolved_module_dependencies(&self) -> &[UnresolvedDependency] {
        &self.unresolved
    }

    /// Raise the stored resolution failures as one aggregated error.
    pub fn rethrow_failure(&self) -> Result<(), ResolveError> {
        if !self.has_error() {
            return Ok(());
        }
        Err(ResolveError::new(
            "dependencies",
            self.path.clone(),
            self.display_name.clone(),
            self.unresolved.iter().map(|u| u.problem.clone()).collect(),
        ))
    }

    /// Direct graph nodes whose originating declaration satisfies `spec`.
    pub fn first_level_module_dependencies(&self, spec: &DependencySpec) -> Vec<ResolvedGraphNode> {
        self.first_level_nodes(spec)
            .into_iter()
            .map(|node| self.graph.node(node).clone())
            .collect()
    }

    /// Every node reachable from the root, breadth-first, de-duplicated.
    pub fn all_module_dependencies(&self) -> Vec<ResolvedGraphNode> {
        let mut seen = FxHashSet::default();
        let mut queue: VecDeque<NodeIndex> = self.graph.outgoing(self.graph.root()).into();
        let mut nodes = Vec::new();
        while let Some(node) = queue.pop_front() {
            if !seen.insert(node) {
                continue;
            }
            nodes.push(self.graph.node(node).clone());
            queue.extend(self.graph.outgoing(node));
        }
        nodes
    }

    /// Files reachable from first-level dependencies matching `spec`.
    /// Missing files of external modules are silently dropped.
    pub fn files(&self, spec: &DependencySpec) -> ConfigResult<Vec<PathBuf>> {
        let mut visitor = ArtifactVisitor::collecting_files_and_artifacts();
        self.visit_artifacts(spec, &mut visitor)?;
        let ArtifactVisitor::FilesAndArtifacts {
            mut files,
            artifacts,
            ..
        } = visitor
        else {
            unreachable!()
        };

        let resolved = self.filter_missing_external(&artifacts);
        self.cache_locking.use_cache("resolve files", || {
            for artifact in &resolved {
                let file = artifact.file()?.to_path_buf();
                if !files.contains(&file) {
                    files.push(file);
                }
            }
            Ok(files)
        })
    }

    /// Artifacts reachable from first-level dependencies matching `spec`.
    /// Missing external-module artifacts are silently dropped.
    pub fn artifacts(&self, spec: &DependencySpec) -> ConfigResult<Vec<Arc<ResolvedArtifact>>> {
        let mut visitor = ArtifactVisitor::collecting_artifacts();
        self.visit_artifacts(spec, &mut visitor)?;
        let ArtifactVisitor::Artifacts { artifacts } = visitor else {
            unreachable!()
        };
        Ok(self.filter_missing_external(&artifacts))
    }

    /// Collect files reachable from first-level dependencies matching `spec`.
    /// Strict: every captured failure is aggregated into one error.
    pub fn collect_files(&self, spec: &DependencySpec, dest: &mut Vec<PathBuf>) -> ConfigResult<()> {
        let mut visitor = ArtifactVisitor::collecting_files_and_artifacts();
        let walk_failure = self.visit_artifacts(spec, &mut visitor).err();
        let ArtifactVisitor::FilesAndArtifacts {
            files,
            artifacts,
            mut failures,
        } = visitor
        else {
            unreachable!()
        };
        if let Some(e) = walk_failure {
            failures.push(e.to_string());
        }

        dest.extend(files);
        for artifact in &artifacts {
            match artifact.file() {
                Ok(file) => dest.push(file.to_path_buf()),
                Err(e) => failures.push(e.to_string()),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ResolveError::new("files", self.path.clone(), self.display_name.clone(), failures)
                .into())
        }
    }

    /// Collect all resolved artifact results, de-duplicated. Strict.
    pub fn collect_artifacts(&self, dest: &mut Vec<ResolvedArtifactResult>) -> ConfigResult<()> {
        let mut visitor = ArtifactVisitor::deduplicating();
        let walk_failure = self
            .visit_artifacts(&DependencySpec::satisfy_all(), &mut visitor)
            .err();
        let ArtifactVisitor::Deduplicating {
            results,
            mut failures,
            ..
        } = visitor
        else {
            unreachable!()
        };
        if let Some(e) = walk_failure {
            failures.push(e.to_string());
        }

        dest.extend(results);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ResolveError::new(
                "artifacts",
                self.path.clone(),
                self.display_name.clone(),
                failures,
            )
            .into())
        }
    }

    fn first_level_nodes(&self, spec: &DependencySpec) -> Vec<NodeIndex> {
        self.graph
            .first_level()
            .iter()
            .filter(|(declaration, _)| spec.is_satisfied_by(declaration.as_ref()))
            .map(|(_, node)| *node)
            .collect()
    }

    /// External-module artifacts whose file cannot be materialized are
    /// dropped; everything else is kept.
    fn filter_missing_external(
        &self,
        artifacts: &[Arc<ResolvedArtifact>],
    ) -> Vec<Arc<ResolvedArtifact>> {
        self.cache_locking.use_cache("retrieve artifacts", || {
            artifacts
                .iter()
                .filter(|artifact| {
                    if artifact.is_external_module() {
                        if let Err(e) = artifact.file() {
                            warn!(artifact = %artifact.id(), error = %e, "dropping missing external artifact");
                            return false;
                        }
                    }
                    true
                })
                .cloned()
                .collect()
        })
    }

    /// Walk artifacts for `spec` into `visitor`. Includes unsuccessfully
    /// resolved artifacts; lenient filtering happens afterwards.
    fn visit_artifacts(
        &self,
        spec: &DependencySpec,
        visitor: &mut ArtifactVisitor,
    ) -> ConfigResult<()> {
        // satisfy-all skips graph traversal entirely
        if spec.is_satisfy_all() {
            if visitor.wants_files() {
                for set in self.file_dependencies.all() {
                    visitor.visit_files(set.component.as_ref(), &set.files);
                }
            }
            for artifact in self.artifact_results.artifacts() {
                let prepared = self.transformer.prepare(artifact)?;
                visitor.visit_artifact(prepared);
            }
            return Ok(());
        }

        if visitor.wants_files() {
            for (declaration, set) in self.file_dependencies.first_level() {
                if spec.is_satisfied_by(declaration.as_ref() as &dyn crate::dependency::Dependency) {
                    visitor.visit_files(set.component.as_ref(), &set.files);
                }
            }
        }

        let mut walker = CachingGraphWalker::new();
        let root = self.graph.root();
        let first_level = self.first_level_nodes(spec);
        for node in &first_level {
            self.visit_edge_artifacts(root, *node, visitor)?;
            walker.add(*node);
        }
        let mut adapter = ResolvedArtifactsGraph {
            lenient: self,
            visitor,
        };
        walker.find_values(&mut adapter)
    }

    fn visit_edge_artifacts(
        &self,
        from: NodeIndex,
        to: NodeIndex,
        visitor: &mut ArtifactVisitor,
    ) -> ConfigResult<()> {
        for artifact in self.graph.incoming_edge_artifacts(from, to) {
            let prepared = self.transformer.prepare(artifact)?;
            visitor.visit_artifact(prepared);
        }
        Ok(())
    }
}

/// Graph adapter feeding the caching walker: node visits contribute attached
/// file dependencies, edge visits contribute the edge's artifacts.
struct ResolvedArtifactsGraph<'a> {
    lenient: &'a LenientConfiguration,
    visitor: &'a mut ArtifactVisitor,
}

impl DirectedGraph for ResolvedArtifactsGraph<'_> {
    type Node = NodeIndex;
    type Error = crate::error::ConfigurationError;

    fn visit_node(&mut self, node: NodeIndex, connected: &mut Vec<NodeIndex>) -> ConfigResult<()> {
        connected.extend(self.lenient.graph.outgoing(node));
        if self.visitor.wants_files() {
            for set in self.lenient.file_dependencies.for_node(node) {
                self.visitor.visit_files(set.component.as_ref(), &set.files);
            }
        }
        Ok(())
    }

    fn visit_edge(&mut self, from: NodeIndex, to: NodeIndex) -> ConfigResult<()> {
        self.lenient.visit_edge_artifacts(from, to, self.visitor)
    }
}

/// Strict view over a completed resolution.
pub struct ResolvedConfiguration {
    lenient: LenientConfiguration,
}

impl ResolvedConfiguration {
    pub fn new(lenient: LenientConfiguration) -> Self {
        Self { lenient }
    }

    pub fn has_error(&self) -> bool {
        self.lenient.has_error()
    }

    pub fn lenient_configuration(&self) -> &LenientConfiguration {
        &self.lenient
    }

    pub fn rethrow_failure(&self) -> ConfigResult<()> {
        self.lenient.rethrow_failure()?;
        Ok(())
    }

    pub fn files(&self, spec: &DependencySpec) -> ConfigResult<Vec<PathBuf>> {
        self.lenient.files(spec)
    }

    pub fn first_level_module_dependencies(
        &self,
        spec: &DependencySpec,
    ) -> ConfigResult<Vec<ResolvedGraphNode>> {
        self.rethrow_failure()?;
        Ok(self.lenient.first_level_module_dependencies(spec))
    }

    pub fn resolved_artifacts(&self) -> ConfigResult<Vec<Arc<ResolvedArtifact>>> {
        self.rethrow_failure()?;
        self.lenient.artifacts(&DependencySpec::satisfy_all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::ImmutableAttributes;
    use crate::dependency::{Dependency, FileDependency, ModuleDependency};
    use crate::resolver::{LocalFileArtifactSet, ModuleVersionIdentifier};
    use crate::transform::TransformRegistry;

    fn node(name: &str) -> ResolvedGraphNode {
        ResolvedGraphNode {
            component: ComponentIdentifier::module("org.x", name, "1.0"),
            module: ModuleVersionIdentifier::new("org.x", name, "1.0"),
        }
    }

    fn project_node(path: &str) -> ResolvedGraphNode {
        ResolvedGraphNode {
            component: ComponentIdentifier::project(path),
            module: ModuleVersionIdentifier::new("org.x", path, "1.0"),
        }
    }

    fn artifact(name: &str) -> Arc<ResolvedArtifact> {
        Arc::new(ResolvedArtifact::new(
            ComponentArtifactIdentifier::Artifact {
                component: ComponentIdentifier::module("org.x", name, "1.0"),
                name: format!("{}.jar", name),
            },
            name,
            Some("jar".to_string()),
            ImmutableAttributes::empty(),
            PathBuf::from(format!("cache/{}.jar", name)),
        ))
    }

    fn missing_external(name: &str) -> Arc<ResolvedArtifact> {
        Arc::new(ResolvedArtifact::missing(
            ComponentArtifactIdentifier::Artifact {
                component: ComponentIdentifier::module("org.x", name, "1.0"),
                name: format!("{}.jar", name),
            },
            name,
            Some("jar".to_string()),
            ImmutableAttributes::empty(),
            "download failed",
        ))
    }

    fn missing_project(name: &str) -> Arc<ResolvedArtifact> {
        Arc::new(ResolvedArtifact::missing(
            ComponentArtifactIdentifier::Artifact {
                component: ComponentIdentifier::project(format!(":{}", name)),
                name: format!("{}.jar", name),
            },
            name,
            Some("jar".to_string()),
            ImmutableAttributes::empty(),
            "not built",
        ))
    }

    struct Fixture {
        graph: TransientGraphResults,
        artifacts: ResolvedArtifactResults,
        files: FileDependencyResults,
        unresolved: Vec<UnresolvedDependency>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                graph: TransientGraphResults::new(node("root")),
                artifacts: ResolvedArtifactResults::new(),
                files: FileDependencyResults::new(),
                unresolved: Vec::new(),
            }
        }

        fn build(self) -> LenientConfiguration {
            LenientConfiguration::new(
                ":compile".to_string(),
                "configuration ':compile'".to_string(),
                Arc::new(CacheLockingManager::new()),
                self.unresolved,
                Arc::new(self.graph),
                Arc::new(self.artifacts),
                Arc::new(self.files),
                ArtifactTransformer::new(
                    Arc::new(TransformRegistry::new()),
                    ImmutableAttributes::empty(),
                ),
            )
        }
    }

    #[test]
    fn test_fast_path_visits_aggregates() {
        let mut fixture = Fixture::new();
        let a = artifact("a");
        fixture.artifacts.push(Arc::clone(&a));
        fixture.files.add_first_level(
            Arc::new(FileDependency::new("libs", vec![PathBuf::from("libs/x.jar")])),
            LocalFileArtifactSet::new(None, vec![PathBuf::from("libs/x.jar")]),
        );
        let lenient = fixture.build();

        let files = lenient.files(&DependencySpec::satisfy_all()).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("libs/x.jar"), PathBuf::from("cache/a.jar")]
        );
    }

    #[test]
    fn test_filtered_walk_follows_graph() {
        let mut fixture = Fixture::new();
        let a = fixture.graph.add_node(node("a"));
        let b = fixture.graph.add_node(node("b"));
        let c = fixture.graph.add_node(node("c"));
        let root = fixture.graph.root();
        fixture.graph.add_edge(root, a, vec![artifact("a")]);
        fixture.graph.add_edge(root, b, vec![artifact("b")]);
        fixture.graph.add_edge(a, c, vec![artifact("c")]);

        let dep_a: Arc<dyn Dependency> = Arc::new(ModuleDependency::new("org.x", "a", "1.0"));
        let dep_b: Arc<dyn Dependency> = Arc::new(ModuleDependency::new("org.x", "b", "1.0"));
        fixture.graph.add_first_level(dep_a, a);
        fixture.graph.add_first_level(dep_b, b);
        let lenient = fixture.build();

        let spec = DependencySpec::matching(|d| d.name() == "a");
        let artifacts = lenient.artifacts(&spec).unwrap();
        let names: Vec<_> = artifacts.iter().map(|a| a.name().to_string()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_walk_tolerates_cycles() {
        let mut fixture = Fixture::new();
        let a = fixture.graph.add_node(node("a"));
        let b = fixture.graph.add_node(node("b"));
        let root = fixture.graph.root();
        fixture.graph.add_edge(root, a, vec![artifact("a")]);
        fixture.graph.add_edge(a, b, vec![artifact("b")]);
        fixture.graph.add_edge(b, a, vec![]);

        let dep_a: Arc<dyn Dependency> = Arc::new(ModuleDependency::new("org.x", "a", "1.0"));
        fixture.graph.add_first_level(dep_a, a);
        let lenient = fixture.build();

        let spec = DependencySpec::matching(|_| true);
        let artifacts = lenient.artifacts(&spec).unwrap();
        assert_eq!(artifacts.len(), 2);
    }

    #[test]
    fn test_missing_external_artifact_is_dropped() {
        let mut fixture = Fixture::new();
        fixture.artifacts.push(artifact("good"));
        fixture.artifacts.push(missing_external("gone"));
        let lenient = fixture.build();

        let artifacts = lenient.artifacts(&DependencySpec::satisfy_all()).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].name(), "good");
        // leniently dropped artifacts do not make the resolution failed
        assert!(!lenient.has_error());
    }

    #[test]
    fn test_missing_project_artifact_propagates() {
        let mut fixture = Fixture::new();
        fixture.artifacts.push(missing_project("app"));
        let lenient = fixture.build();

        // kept by the lenient filter, so materializing its file fails
        let err = lenient.files(&DependencySpec::satisfy_all()).unwrap_err();
        assert!(err.to_string().contains("not built"));
    }

    #[test]
    fn test_collect_artifacts_deduplicates_and_synthesizes_ids() {
        let mut fixture = Fixture::new();
        fixture.artifacts.push(artifact("a"));
        fixture.artifacts.push(artifact("a"));
        fixture.files.add_first_level(
            Arc::new(FileDependency::new("libs", vec![PathBuf::from("libs/x.jar")])),
            LocalFileArtifactSet::new(None, vec![PathBuf::from("libs/x.jar")]),
        );
        fixture.files.add_first_level(
            Arc::new(FileDependency::new("classes", vec![PathBuf::from("out/classes")])),
            LocalFileArtifactSet::new(
                Some(ComponentIdentifier::project(":app")),
                vec![PathBuf::from("out/classes")],
            ),
        );
        let lenient = fixture.build();

        let mut results = Vec::new();
        lenient.collect_artifacts(&mut results).unwrap();

        assert_eq!(results.len(), 3);
        assert!(matches!(
            results[0].id,
            ComponentArtifactIdentifier::OpaqueFile { .. }
        ));
        assert!(matches!(
            results[1].id,
            ComponentArtifactIdentifier::ComponentFile { .. }
        ));
        assert!(matches!(
            results[2].id,
            ComponentArtifactIdentifier::Artifact { .. }
        ));
    }

    #[test]
    fn test_collect_files_aggregates_failures() {
        let mut fixture = Fixture::new();
        fixture.artifacts.push(missing_external("gone"));
        let lenient = fixture.build();

        let mut dest = Vec::new();
        let err = lenient
            .collect_files(&DependencySpec::satisfy_all(), &mut dest)
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("Could not resolve all files for configuration ':compile'."));
    }

    #[test]
    fn test_rethrow_failure_aggregates_unresolved() {
        let mut fixture = Fixture::new();
        fixture.unresolved.push(UnresolvedDependency {
            selector: "org.x:gone:1.0".to_string(),
            problem: "not found".to_string(),
        });
        let lenient = fixture.build();

        assert!(lenient.has_error());
        let err = lenient.rethrow_failure().unwrap_err();
        assert_eq!(err.failures, vec!["not found".to_string()]);
        assert_eq!(
            err.to_string(),
            "Could not resolve all dependencies for configuration ':compile'."
        );
    }

    #[test]
    fn test_first_level_and_all_module_dependencies() {
        let mut fixture = Fixture::new();
        let a = fixture.graph.add_node(node("a"));
        let b = fixture.graph.add_node(node("b"));
        let root = fixture.graph.root();
        fixture.graph.add_edge(root, a, vec![]);
        fixture.graph.add_edge(a, b, vec![]);
        let dep_a: Arc<dyn Dependency> = Arc::new(ModuleDependency::new("org.x", "a", "1.0"));
        fixture.graph.add_first_level(dep_a, a);
        let lenient = fixture.build();

        let first = lenient.first_level_module_dependencies(&DependencySpec::satisfy_all());
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].module.name, "a");

        let all = lenient.all_module_dependencies();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_node_file_dependencies_visited_during_walk() {
        let mut fixture = Fixture::new();
        let a = fixture.graph.add_node(project_node(":lib"));
        let root = fixture.graph.root();
        fixture.graph.add_edge(root, a, vec![]);
        let dep_a: Arc<dyn Dependency> = Arc::new(ModuleDependency::new("org.x", "a", "1.0"));
        fixture.graph.add_first_level(dep_a, a);
        fixture.files.add_for_node(
            a,
            LocalFileArtifactSet::new(None, vec![PathBuf::from("lib/extra.jar")]),
        );
        let lenient = fixture.build();

        let spec = DependencySpec::matching(|_| true);
        let files = lenient.files(&spec).unwrap();
        assert_eq!(files, vec![PathBuf::from("lib/extra.jar")]);
    }
}
