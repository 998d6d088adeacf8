/*
 * Buildgraph Configurations - dependency configuration subsystem
 *
 * A graph of named configurations that aggregate declared dependencies,
 * artifacts and exclude rules, inherit the contents of the configurations
 * they extend, and drive a cached two-phase resolution pipeline.
 *
 * Architecture:
 * - Configuration object and mutation/observation state machine
 * - Extension composition (allDependencies / allArtifacts views)
 * - Resolution lifecycle (UNRESOLVED -> GRAPH_RESOLVED -> ARTIFACTS_RESOLVED)
 * - Lenient artifact view with a memoized graph walk
 * - Attribute-driven artifact transforms
 *
 * The resolver engine, repositories and the task graph live outside this
 * crate; only their contracts are defined here.
 */

pub mod attributes;
pub mod configuration;
pub mod container;
pub mod dependency;
pub mod error;
pub mod lenient;
pub mod listener;
pub mod resolver;
pub mod transform;
pub mod walker;

// Re-exports
pub use attributes::{Attribute, AttributeContainer, AttributeValue, ImmutableAttributes, TypeTag};
pub use configuration::{
    Configuration, ConfigurationFileCollection, ConfigurationServices, InternalState,
    MutationType, ResolutionStrategy, ResolvableDependencies, State, TaskDependencies,
};
pub use container::{ConfigurationContainer, ConfigurationsProvider, DetachedConfigurationsProvider};
pub use dependency::{
    ArtifactSet, Dependency, DependencySet, DependencySpec, ExcludeRule, FileDependency,
    ModuleDependency, PublishArtifact,
};
pub use error::{
    ArtifactResolveError, ConfigResult, ConfigurationError, ResolveError, TransformError,
};
pub use lenient::{ArtifactVisitor, LenientConfiguration, ResolvedConfiguration};
pub use listener::{DependencyResolutionListener, ListenerBroadcast, ListenerManager};
pub use resolver::{
    CacheLockingManager, ComponentArtifactIdentifier, ComponentIdentifier,
    ComponentMetadataBuilder, DependencyResolver, FileDependencyResults, LocalFileArtifactSet,
    Module, ModuleMetadataProvider, ModuleVersionIdentifier, ProjectFinder, ResolutionResult,
    ResolvedArtifact, ResolvedArtifactResult, ResolvedArtifactResults, ResolvedGraphNode,
    ResolvedLocalComponents, ResolvedProjectConfiguration, ResolverResults,
    RootComponentMetadata, TransientGraphResults, UnresolvedDependency,
};
pub use transform::{ArtifactTransform, ArtifactTransformer, FileTransform, TransformRegistry};
pub use walker::{CachingGraphWalker, DirectedGraph};
