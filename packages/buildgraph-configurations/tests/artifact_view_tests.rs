//! End-to-end tests for the lenient artifact view and attribute-driven
//! transforms.

mod common;

use buildgraph_configurations::{
    ArtifactTransform, Attribute, AttributeValue, DependencySpec, FileDependency,
    ImmutableAttributes, InternalState, TransformRegistry,
};
use common::{configuration, module_dep, services, StubResolver};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn attrs(pairs: &[(&str, &str)]) -> ImmutableAttributes {
    ImmutableAttributes::of(
        pairs
            .iter()
            .map(|(k, v)| (Attribute::string(*k), AttributeValue::from(*v))),
    )
    .unwrap()
}

#[test]
fn missing_external_artifact_is_dropped_without_failing_resolution() {
    let mut resolver = StubResolver::new();
    resolver.missing_modules.push("gone".to_string());
    let services = services(Arc::new(resolver));
    let config = configuration("compile", &services);

    config.add_dependency(module_dep("good")).unwrap();
    config.add_dependency(module_dep("gone")).unwrap();

    let resolved = config.resolved_configuration().unwrap();

    // absence of the broken artifact does not make the resolution failed
    assert!(!resolved.has_error());
    resolved.rethrow_failure().unwrap();

    let artifacts = resolved.resolved_artifacts().unwrap();
    let names: Vec<_> = artifacts.iter().map(|a| a.name().to_string()).collect();
    assert_eq!(names, vec!["good"]);
}

#[test]
fn strict_artifact_collection_fails_on_missing_file() {
    let mut resolver = StubResolver::new();
    resolver.missing_modules.push("gone".to_string());
    let services = services(Arc::new(resolver));
    let config = configuration("compile", &services);
    config.add_dependency(module_dep("gone")).unwrap();

    config
        .resolve_to_state_or_later(InternalState::ArtifactsResolved)
        .unwrap();

    // incoming().artifacts() is the strict path
    let err = config.incoming().artifacts().unwrap_err();
    assert!(err
        .to_string()
        .contains("Could not resolve all artifacts for configuration ':compile'."));
}

#[test]
fn incoming_artifacts_deduplicate_files_and_artifacts() {
    let resolver = Arc::new(StubResolver::new());
    let services = services(resolver);
    let config = configuration("compile", &services);

    config.add_dependency(module_dep("d1")).unwrap();
    config
        .add_dependency(Arc::new(FileDependency::new(
            "libs",
            vec![PathBuf::from("libs/extra.jar")],
        )))
        .unwrap();

    let results = config.incoming().artifacts().unwrap();
    assert_eq!(results.len(), 2);

    // repeated queries return the same set
    let again = config.incoming().artifacts().unwrap();
    assert_eq!(results, again);
}

#[test]
fn file_collection_filters_by_dependency_spec() {
    let resolver = Arc::new(StubResolver::new());
    let services = services(resolver);
    let config = configuration("compile", &services);

    config.add_dependency(module_dep("keep")).unwrap();
    config.add_dependency(module_dep("drop")).unwrap();

    let collection = config
        .file_collection(DependencySpec::matching(|d| d.name() == "keep"))
        .unwrap();

    assert_eq!(collection.files().unwrap(), vec![PathBuf::from("cache/keep.jar")]);
}

/// One-step transform used by the chain scenario below: consumes one
/// attribute set and produces one output file per declared output set.
struct StepTransform {
    name: &'static str,
    from: ImmutableAttributes,
    to: ImmutableAttributes,
    out_dir: PathBuf,
    out_name: &'static str,
}

impl ArtifactTransform for StepTransform {
    fn display_name(&self) -> &str {
        self.name
    }

    fn input_attributes(&self) -> ImmutableAttributes {
        self.from.clone()
    }

    fn output_attribute_sets(&self) -> Vec<ImmutableAttributes> {
        vec![self.to.clone()]
    }

    fn output_directory(&self) -> Option<PathBuf> {
        Some(self.out_dir.clone())
    }

    fn transform(&self, input: &Path) -> Result<(), String> {
        let content = fs::read(input).map_err(|e| e.to_string())?;
        fs::write(self.out_dir.join(self.out_name), content).map_err(|e| e.to_string())
    }

    fn result(&self, _output_attributes: &ImmutableAttributes) -> Option<PathBuf> {
        Some(self.out_dir.join(self.out_name))
    }
}

#[test]
fn transform_chain_is_composed_by_the_caller() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("out");
    let registry = TransformRegistry::new();

    let t1_dir = out_dir.clone();
    registry.register(move || {
        Box::new(StepTransform {
            name: "AarToJar",
            from: attrs(&[("extension", "aar")]),
            to: attrs(&[("format", "JAR")]),
            out_dir: t1_dir.clone(),
            out_name: "step1.jar",
        })
    });
    let t2_dir = out_dir.clone();
    registry.register(move || {
        Box::new(StepTransform {
            name: "JarToClasses",
            from: attrs(&[("format", "JAR")]),
            to: attrs(&[("format", "CLASSES")]),
            out_dir: t2_dir.clone(),
            out_name: "step2.classes",
        })
    });

    let input = dir.path().join("lib.aar");
    fs::write(&input, b"aar-bytes").unwrap();

    // no single registration goes from aar to CLASSES
    assert!(registry
        .get_transform(&attrs(&[("extension", "aar")]), &attrs(&[("format", "CLASSES")]))
        .is_none());

    // each lookup matches exactly one registration; chaining is ours to do
    let first = registry
        .get_transform(&attrs(&[("extension", "aar")]), &attrs(&[("format", "JAR")]))
        .unwrap();
    let intermediate = first.apply(&input).unwrap();

    let second = registry
        .get_transform(&attrs(&[("format", "JAR")]), &attrs(&[("format", "CLASSES")]))
        .unwrap();
    let output = second.apply(&intermediate).unwrap();

    assert_eq!(output, out_dir.join("step2.classes"));
    assert_eq!(fs::read(output).unwrap(), b"aar-bytes");
}

#[test]
fn requested_attributes_transform_artifacts_during_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("out");

    // the "downloaded" aar must exist on disk for the transform to read
    let cache_dir = dir.path().join("cache");
    fs::create_dir_all(&cache_dir).unwrap();
    let aar = cache_dir.join("lib.aar");
    fs::write(&aar, b"aar-bytes").unwrap();

    struct OneArtifactResolver {
        aar: PathBuf,
    }

    impl buildgraph_configurations::DependencyResolver for OneArtifactResolver {
        fn resolve_build_dependencies(
            &self,
            _configuration: &Arc<buildgraph_configurations::Configuration>,
            _results: &mut buildgraph_configurations::ResolverResults,
        ) -> buildgraph_configurations::ConfigResult<()> {
            Ok(())
        }

        fn resolve_graph(
            &self,
            configuration: &Arc<buildgraph_configurations::Configuration>,
            results: &mut buildgraph_configurations::ResolverResults,
        ) -> buildgraph_configurations::ConfigResult<()> {
            use buildgraph_configurations::*;
            let root_id = ModuleVersionIdentifier::new("test", configuration.name(), "1.0");
            let mut graph = TransientGraphResults::new(ResolvedGraphNode {
                component: ComponentIdentifier::project(configuration.path()),
                module: root_id.clone(),
            });
            let component = ComponentIdentifier::module("org.x", "lib", "1.0");
            let node = graph.add_node(ResolvedGraphNode {
                component: component.clone(),
                module: ModuleVersionIdentifier::new("org.x", "lib", "1.0"),
            });
            let artifact = Arc::new(ResolvedArtifact::new(
                ComponentArtifactIdentifier::Artifact {
                    component: component.clone(),
                    name: "lib.aar".to_string(),
                },
                "lib",
                Some("aar".to_string()),
                ImmutableAttributes::of([(
                    Attribute::string("extension"),
                    AttributeValue::from("aar"),
                )])
                .unwrap(),
                self.aar.clone(),
            ));
            let root = graph.root();
            graph.add_edge(root, node, vec![Arc::clone(&artifact)]);
            for dependency in configuration.all_dependencies() {
                graph.add_first_level(dependency, node);
            }
            results.graph_resolved(
                ResolutionResult {
                    root: root_id,
                    components: vec![component],
                },
                graph,
                FileDependencyResults::new(),
                ResolvedLocalComponents::new(),
                vec![],
            );
            Ok(())
        }

        fn resolve_artifacts(
            &self,
            _configuration: &Arc<buildgraph_configurations::Configuration>,
            results: &mut buildgraph_configurations::ResolverResults,
        ) -> buildgraph_configurations::ConfigResult<()> {
            use buildgraph_configurations::*;
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

    let services = buildgraph_configurations::ConfigurationServices {
        resolver: Arc::new(OneArtifactResolver { aar }),
        listener_manager: Arc::new(buildgraph_configurations::ListenerManager::new()),
        metadata_provider: Arc::new(common::FixedModuleProvider),
        project_finder: Arc::new(common::NoProjects),
        component_metadata_builder: Arc::new(common::SimpleMetadataBuilder),
        cache_locking: Arc::new(buildgraph_configurations::CacheLockingManager::new()),
    };
    let config = configuration("compile", &services);
    config.add_dependency(module_dep("lib")).unwrap();

    // the consumer asks for jars; the producer made an aar
    config.string_attribute("format", "JAR").unwrap();
    let reg_dir = out_dir.clone();
    config
        .register_transform(move || {
            Box::new(StepTransform {
                name: "AarToJar",
                from: attrs(&[("extension", "aar")]),
                to: attrs(&[("format", "JAR")]),
                out_dir: reg_dir.clone(),
                out_name: "lib.jar",
            })
        })
        .unwrap();

    let files = config.files().unwrap();
    assert_eq!(files, vec![out_dir.join("lib.jar")]);
    assert_eq!(fs::read(&files[0]).unwrap(), b"aar-bytes");
}
