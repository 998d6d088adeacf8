//! The configuration object
//!
//! A configuration aggregates declared dependencies, produced artifacts and
//! exclude rules, inherits the contents of the configurations it extends,
//! and drives the two-phase resolution pipeline whose results it caches.
//! Once a configuration has influenced a resolution, directly or through a
//! child that extends it, further changes to the data that shaped that
//! resolution are rejected.

use crate::attributes::{Attribute, AttributeContainer, AttributeValue, ImmutableAttributes};
use crate::container::{ConfigurationsProvider, DetachedConfigurationsProvider};
use crate::dependency::{
    ArtifactSet, Dependency, DependencySet, DependencySpec, ExcludeRule, PublishArtifact,
};
use crate::error::{ConfigResult, ConfigurationError};
use crate::lenient::{LenientConfiguration, ResolvedConfiguration};
use crate::listener::{DependencyResolutionListener, ListenerBroadcast, ListenerManager};
use crate::resolver::{
    CacheLockingManager, ComponentMetadataBuilder, DependencyResolver, ModuleMetadataProvider,
    ProjectFinder, ResolutionResult, ResolverResults, RootComponentMetadata,
};
use crate::transform::{ArtifactTransform, ArtifactTransformer, TransformRegistry};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Kind of mutation being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationType {
    Dependencies,
    Artifacts,
    Strategy,
    Attributes,
    Role,
}

impl MutationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationType::Dependencies => "dependencies",
            MutationType::Artifacts => "artifacts",
            MutationType::Strategy => "resolution strategy",
            MutationType::Attributes => "attributes",
            MutationType::Role => "role",
        }
    }
}

impl fmt::Display for MutationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Internal resolution progress. Monotonic while the declared inputs stay
/// unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InternalState {
    Unresolved,
    GraphResolved,
    ArtifactsResolved,
}

impl InternalState {
    fn as_u8(self) -> u8 {
        match self {
            InternalState::Unresolved => 0,
            InternalState::GraphResolved => 1,
            InternalState::ArtifactsResolved => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => InternalState::Unresolved,
            1 => InternalState::GraphResolved,
            _ => InternalState::ArtifactsResolved,
        }
    }
}

/// Public resolution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unresolved,
    Resolved,
    ResolvedWithFailures,
}

/// Behavior knobs for the resolution pipeline. Strategy changes do not
/// affect the resolved graph, so they stay mutable after observation.
#[derive(Clone)]
pub struct ResolutionStrategy {
    fail_on_version_conflict: bool,
    resolve_graph_to_determine_task_dependencies: bool,
    transforms: Arc<TransformRegistry>,
}

impl ResolutionStrategy {
    pub fn new() -> Self {
        Self {
            fail_on_version_conflict: false,
            resolve_graph_to_determine_task_dependencies: false,
            transforms: Arc::new(TransformRegistry::new()),
        }
    }

    pub fn fail_on_version_conflict(&self) -> bool {
        self.fail_on_version_conflict
    }

    pub fn set_fail_on_version_conflict(&mut self, value: bool) {
        self.fail_on_version_conflict = value;
    }

    pub fn resolve_graph_to_determine_task_dependencies(&self) -> bool {
        self.resolve_graph_to_determine_task_dependencies
    }

    pub fn set_resolve_graph_to_determine_task_dependencies(&mut self, value: bool) {
        self.resolve_graph_to_determine_task_dependencies = value;
    }

    pub fn transforms(&self) -> &Arc<TransformRegistry> {
        &self.transforms
    }

    /// Copies duplicate the scalar settings and share the transform registry.
    pub fn copy(&self) -> Self {
        self.clone()
    }
}

impl Default for ResolutionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

/// Collaborators shared by every configuration of a project.
#[derive(Clone)]
pub struct ConfigurationServices {
    pub resolver: Arc<dyn DependencyResolver>,
    pub listener_manager: Arc<ListenerManager>,
    pub metadata_provider: Arc<dyn ModuleMetadataProvider>,
    pub project_finder: Arc<dyn ProjectFinder>,
    pub component_metadata_builder: Arc<dyn ComponentMetadataBuilder>,
    pub cache_locking: Arc<CacheLockingManager>,
}

/// Build dependencies derived from a resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDependencies {
    values: Vec<String>,
}

impl TaskDependencies {
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub type DefaultDependencyAction = Arc<dyn Fn(&mut DependencySet) + Send + Sync>;

/// Declared data of a configuration. Mutated on the owning build's
/// configuration thread, behind the mutation validator.
struct ConfigurationData {
    visible: bool,
    transitive: bool,
    format: Option<String>,
    description: Option<String>,
    can_be_consumed: bool,
    can_be_resolved: bool,
    extends_from: Vec<Arc<Configuration>>,
    exclude_rules: Vec<ExcludeRule>,
    dependencies: DependencySet,
    artifacts: ArtifactSet,
    attributes: AttributeContainer,
}

impl Default for ConfigurationData {
    fn default() -> Self {
        Self {
            visible: true,
            transitive: true,
            format: None,
            description: None,
            can_be_consumed: true,
            can_be_resolved: true,
            extends_from: Vec::new(),
            exclude_rules: Vec::new(),
            dependencies: DependencySet::new(),
            artifacts: ArtifactSet::new(),
            attributes: AttributeContainer::new(),
        }
    }
}

pub struct Configuration {
    path: String,
    name: String,
    services: ConfigurationServices,
    provider: Arc<dyn ConfigurationsProvider>,
    listeners: ListenerBroadcast,
    strategy: Mutex<ResolutionStrategy>,
    data: RwLock<ConfigurationData>,
    default_dependency_actions: Mutex<Vec<DefaultDependencyAction>>,
    child_validators: Mutex<Vec<Weak<Configuration>>>,

    // read lock-free by the mutation validator; written under the locks below
    resolved_state: AtomicU8,
    observed_state: AtomicU8,
    dependencies_modified: AtomicBool,
    inside_before_resolve: AtomicBool,
    failures_recorded: AtomicBool,

    /// Guards the resolution pipeline and the cached results.
    resolution_lock: Mutex<ResolverResults>,
    /// Guards advancement of `observed_state`. Never held across a resolver
    /// call.
    observation_lock: Mutex<()>,
}

struct ResetFlag<'a>(&'a AtomicBool);

impl Drop for ResetFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

impl Configuration {
    pub fn new(
        path: impl Into<String>,
        name: impl Into<String>,
        provider: Arc<dyn ConfigurationsProvider>,
        services: ConfigurationServices,
        strategy: ResolutionStrategy,
    ) -> Arc<Self> {
        let listeners = services.listener_manager.create_anonymous_broadcaster();
        Arc::new(Self {
            path: path.into(),
            name: name.into(),
            services,
            provider,
            listeners,
            strategy: Mutex::new(strategy),
            data: RwLock::new(ConfigurationData::default()),
            default_dependency_actions: Mutex::new(Vec::new()),
            child_validators: Mutex::new(Vec::new()),
            resolved_state: AtomicU8::new(InternalState::Unresolved.as_u8()),
            observed_state: AtomicU8::new(InternalState::Unresolved.as_u8()),
            dependencies_modified: AtomicBool::new(false),
            inside_before_resolve: AtomicBool::new(false),
            failures_recorded: AtomicBool::new(false),
            resolution_lock: Mutex::new(ResolverResults::new()),
            observation_lock: Mutex::new(()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn display_name(&self) -> String {
        format!("configuration '{}'", self.path)
    }

    pub fn upload_task_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => format!("upload{}{}", first.to_uppercase(), chars.as_str()),
            None => "upload".to_string(),
        }
    }

    // ------------------------------------------------------------------
    // state

    pub fn resolved_state(&self) -> InternalState {
        InternalState::from_u8(self.resolved_state.load(Ordering::Acquire))
    }

    pub fn observed_state(&self) -> InternalState {
        InternalState::from_u8(self.observed_state.load(Ordering::Acquire))
    }

    pub fn state(&self) -> State {
        match self.resolved_state() {
            InternalState::Unresolved => State::Unresolved,
            _ => {
                if self.failures_recorded.load(Ordering::Acquire) {
                    State::ResolvedWithFailures
                } else {
                    State::Resolved
                }
            }
        }
    }

    fn set_resolved_state(&self, state: InternalState) {
        self.resolved_state.store(state.as_u8(), Ordering::Release);
    }

    // ------------------------------------------------------------------
    // metadata

    pub fn is_visible(&self) -> bool {
        self.data.read().visible
    }

    pub fn set_visible(&self, visible: bool) -> ConfigResult<()> {
        self.validate_mutation(MutationType::Dependencies)?;
        self.data.write().visible = visible;
        Ok(())
    }

    pub fn is_transitive(&self) -> bool {
        self.data.read().transitive
    }

    pub fn set_transitive(&self, transitive: bool) -> ConfigResult<()> {
        self.validate_mutation(MutationType::Dependencies)?;
        self.data.write().transitive = transitive;
        Ok(())
    }

    pub fn format(&self) -> Option<String> {
        self.data.read().format.clone()
    }

    pub fn set_format(&self, format: impl Into<String>) {
        self.data.write().format = Some(format.into());
    }

    pub fn description(&self) -> Option<String> {
        self.data.read().description.clone()
    }

    pub fn set_description(&self, description: impl Into<String>) {
        self.data.write().description = Some(description.into());
    }

    pub fn can_be_consumed(&self) -> bool {
        self.data.read().can_be_consumed
    }

    pub fn set_can_be_consumed(&self, allowed: bool) -> ConfigResult<()> {
        self.validate_mutation(MutationType::Role)?;
        self.data.write().can_be_consumed = allowed;
        Ok(())
    }

    pub fn can_be_resolved(&self) -> bool {
        self.data.read().can_be_resolved
    }

    pub fn set_can_be_resolved(&self, allowed: bool) -> ConfigResult<()> {
        self.validate_mutation(MutationType::Role)?;
        self.data.write().can_be_resolved = allowed;
        Ok(())
    }

    // ------------------------------------------------------------------
    // attributes

    pub fn attribute(&self, key: Attribute, value: AttributeValue) -> ConfigResult<()> {
        self.validate_mutation(MutationType::Attributes)?;
        self.data.write().attributes.insert(key, value)
    }

    pub fn string_attribute(&self, name: &str, value: &str) -> ConfigResult<()> {
        self.attribute(Attribute::string(name), AttributeValue::from(value))
    }

    pub fn set_attributes(
        &self,
        entries: impl IntoIterator<Item = (Attribute, AttributeValue)>,
    ) -> ConfigResult<()> {
        for (key, value) in entries {
            self.attribute(key, value)?;
        }
        Ok(())
    }

    pub fn attributes(&self) -> ImmutableAttributes {
        self.data.read().attributes.as_immutable()
    }

    pub fn get_attribute(&self, key: &Attribute) -> Option<AttributeValue> {
        self.data.read().attributes.get(key).cloned()
    }

    pub fn has_attributes(&self) -> bool {
        !self.data.read().attributes.is_empty()
    }

    // ------------------------------------------------------------------
    // dependencies, artifacts, exclude rules

    pub fn dependencies(&self) -> DependencySet {
        self.data.read().dependencies.clone()
    }

    /// Own dependencies first, then each parent's, in extension insertion
    /// order, recursively.
    pub fn all_dependencies(&self) -> Vec<Arc<dyn Dependency>> {
        let (own, parents) = {
            let data = self.data.read();
            (data.dependencies.to_vec(), data.extends_from.clone())
        };
        let mut all = own;
        for parent in parents {
            for dependency in parent.all_dependencies() {
                if !all.iter().any(|d| Arc::ptr_eq(d, &dependency)) {
                    all.push(dependency);
                }
            }
        }
        all
    }

    pub fn add_dependency(&self, dependency: Arc<dyn Dependency>) -> ConfigResult<()> {
        self.validate_mutation(MutationType::Dependencies)?;
        self.data.write().dependencies.add(dependency);
        Ok(())
    }

    pub fn remove_dependency(&self, dependency: &Arc<dyn Dependency>) -> ConfigResult<()> {
        self.validate_mutation(MutationType::Dependencies)?;
        self.data.write().dependencies.remove(dependency);
        Ok(())
    }

    /// Register an action that populates the own dependency set at resolution
    /// start, if and only if the set is still empty then.
    pub fn default_dependencies<F>(&self, action: F) -> ConfigResult<()>
    where
        F: Fn(&mut DependencySet) + Send + Sync + 'static,
    {
        self.validate_mutation(MutationType::Dependencies)?;
        self.default_dependency_actions.lock().push(Arc::new(action));
        Ok(())
    }

    pub fn artifacts(&self) -> ArtifactSet {
        self.data.read().artifacts.clone()
    }

    pub fn all_artifacts(&self) -> Vec<PublishArtifact> {
        let (own, parents) = {
            let data = self.data.read();
            (data.artifacts.to_vec(), data.extends_from.clone())
        };
        let mut all = own;
        for parent in parents {
            for artifact in parent.all_artifacts() {
                if !all.contains(&artifact) {
                    all.push(artifact);
                }
            }
        }
        all
    }

    pub fn add_artifact(&self, artifact: PublishArtifact) -> ConfigResult<()> {
        self.validate_mutation(MutationType::Artifacts)?;
        self.data.write().artifacts.add(artifact);
        Ok(())
    }

    pub fn remove_artifact(&self, artifact: &PublishArtifact) -> ConfigResult<()> {
        self.validate_mutation(MutationType::Artifacts)?;
        self.data.write().artifacts.remove(artifact);
        Ok(())
    }

    pub fn exclude_rules(&self) -> Vec<ExcludeRule> {
        self.data.read().exclude_rules.clone()
    }

    pub fn set_exclude_rules(&self, rules: Vec<ExcludeRule>) -> ConfigResult<()> {
        self.validate_mutation(MutationType::Dependencies)?;
        self.data.write().exclude_rules = rules;
        Ok(())
    }

    pub fn exclude(&self, group: impl Into<String>, module: impl Into<String>) -> ConfigResult<()> {
        self.validate_mutation(MutationType::Dependencies)?;
        let rule = ExcludeRule::new(group, module);
        let mut data = self.data.write();
        if !data.exclude_rules.contains(&rule) {
            data.exclude_rules.push(rule);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // extension composition

    pub fn extends_from(self: &Arc<Self>, parent: &Arc<Configuration>) -> ConfigResult<()> {
        self.validate_mutation(MutationType::Dependencies)?;
        let hierarchy = parent.hierarchy();
        if hierarchy.iter().any(|c| Arc::ptr_eq(c, self)) {
            return Err(ConfigurationError::CyclicExtendsFrom {
                display_name: self.display_name(),
                parent: parent.display_name(),
                hierarchy: format_hierarchy(&hierarchy),
            });
        }
        let added = {
            let mut data = self.data.write();
            if data.extends_from.iter().any(|c| Arc::ptr_eq(c, parent)) {
                false
            } else {
                data.extends_from.push(Arc::clone(parent));
                true
            }
        };
        if added {
            parent.add_child_validator(self);
        }
        Ok(())
    }

    /// Replace the extension set: unregister from every current parent, then
    /// apply the new set one by one.
    pub fn set_extends_from(
        self: &Arc<Self>,
        parents: Vec<Arc<Configuration>>,
    ) -> ConfigResult<()> {
        self.validate_mutation(MutationType::Dependencies)?;
        let old = std::mem::take(&mut self.data.write().extends_from);
        for parent in &old {
            parent.remove_child_validator(self);
        }
        for parent in parents {
            self.extends_from(&parent)?;
        }
        Ok(())
    }

    pub fn extends_from_set(&self) -> Vec<Arc<Configuration>> {
        self.data.read().extends_from.clone()
    }

    /// Self first, then the transitive parents. An ancestor reachable along
    /// several paths appears once, at its last visited position.
    pub fn hierarchy(self: &Arc<Self>) -> Vec<Arc<Configuration>> {
        let mut result = vec![Arc::clone(self)];
        collect_super_configurations(self, &mut result);
        result
    }

    fn add_child_validator(&self, child: &Arc<Configuration>) {
        self.child_validators.lock().push(Arc::downgrade(child));
    }

    fn remove_child_validator(&self, child: &Arc<Configuration>) {
        let target = Arc::downgrade(child);
        self.child_validators.lock().retain(|w| !w.ptr_eq(&target));
    }

    // ------------------------------------------------------------------
    // mutation validation

    /// Validate a mutation of this configuration's own data. On success the
    /// configuration is marked modified and its children are notified.
    pub fn validate_mutation(&self, mutation: MutationType) -> ConfigResult<()> {
        match self.resolved_state() {
            InternalState::ArtifactsResolved => {
                return Err(ConfigurationError::MutationAfterArtifactsResolved {
                    mutation,
                    display_name: self.display_name(),
                });
            }
            InternalState::GraphResolved => {
                return Err(ConfigurationError::MutationAfterGraphResolved {
                    mutation,
                    display_name: self.display_name(),
                });
            }
            InternalState::Unresolved => {}
        }
        if self.observed_state() >= InternalState::GraphResolved
            && mutation != MutationType::Strategy
        {
            let hint = if self.inside_before_resolve.load(Ordering::Relaxed) {
                " Use default dependencies instead of a beforeResolve listener \
                 to specify default dependencies for a configuration."
            } else {
                ""
            };
            return Err(ConfigurationError::MutationAfterObservation {
                mutation,
                display_name: self.display_name(),
                hint: hint.to_string(),
            });
        }
        self.mark_modified_and_notify_children(mutation)
    }

    /// Validate a mutation of a parent configuration against this child.
    /// Strategy changes in a parent never affect children.
    fn validate_parent_mutation(&self, mutation: MutationType) -> ConfigResult<()> {
        if mutation == MutationType::Strategy {
            return Ok(());
        }
        match self.resolved_state() {
            InternalState::ArtifactsResolved => {
                return Err(ConfigurationError::ParentMutationAfterArtifactsResolved {
                    mutation,
                    display_name: self.display_name(),
                });
            }
            InternalState::GraphResolved if mutation == MutationType::Dependencies => {
                return Err(ConfigurationError::ParentMutationAfterGraphResolved {
                    mutation,
                    display_name: self.display_name(),
                });
            }
            _ => {}
        }
        self.mark_modified_and_notify_children(mutation)
    }

    fn mark_modified_and_notify_children(&self, mutation: MutationType) -> ConfigResult<()> {
        let children: Vec<Arc<Configuration>> = self
            .child_validators
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        for child in children {
            child.validate_parent_mutation(mutation)?;
        }
        if mutation != MutationType::Strategy {
            self.dependencies_modified.store(true, Ordering::Relaxed);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // observation

    /// Mark this configuration, its parents, and their parents observed at
    /// `requested`. Monotonic: concurrent markers converge to the max.
    pub fn mark_as_observed(&self, requested: InternalState) {
        self.mark_this_observed(requested);
        self.mark_parents_observed(requested);
    }

    fn mark_this_observed(&self, requested: InternalState) {
        let _guard = self.observation_lock.lock();
        if self.observed_state() < requested {
            self.observed_state.store(requested.as_u8(), Ordering::Release);
        }
    }

    fn mark_parents_observed(&self, requested: InternalState) {
        let parents = self.data.read().extends_from.clone();
        for parent in parents {
            parent.mark_as_observed(requested);
        }
    }

    fn mark_referenced_projects_observed(&self, requested: InternalState, results: &ResolverResults) {
        if let Ok(local) = results.resolved_local_components() {
            for reference in local.resolved_project_configurations() {
                if let Some(target) = self
                    .services
                    .project_finder
                    .find_configuration(&reference.project_path, &reference.configuration)
                {
                    target.mark_as_observed(requested);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // resolution lifecycle

    fn assert_resolving_allowed(&self) -> ConfigResult<()> {
        if !self.data.read().can_be_resolved {
            return Err(ConfigurationError::ResolutionNotAllowed {
                display_name: format!("configuration '{}'", self.name),
            });
        }
        Ok(())
    }

    pub fn resolve_to_state_or_later(self: &Arc<Self>, requested: InternalState) -> ConfigResult<()> {
        self.assert_resolving_allowed()?;
        let mut results = self.resolution_lock.lock();
        if requested >= InternalState::GraphResolved {
            self.resolve_graph_if_required(requested, &mut results)?;
        }
        if requested == InternalState::ArtifactsResolved {
            self.resolve_artifacts_if_required(&mut results)?;
        }
        Ok(())
    }

    fn resolve_graph_if_required(
        self: &Arc<Self>,
        requested: InternalState,
        results: &mut ResolverResults,
    ) -> ConfigResult<()> {
        match self.resolved_state() {
            InternalState::ArtifactsResolved => {
                if self.dependencies_modified.load(Ordering::Relaxed) {
                    return Err(ConfigurationError::ResolvedAfterModification {
                        display_name: self.display_name(),
                    });
                }
                Ok(())
            }
            InternalState::GraphResolved => {
                if self.dependencies_modified.load(Ordering::Relaxed) {
                    return Err(ConfigurationError::GraphResolvedAfterModification {
                        display_name: self.display_name(),
                    });
                }
                Ok(())
            }
            InternalState::Unresolved => {
                debug!(configuration = %self.path, "resolving dependency graph");
                let incoming = self.incoming();
                self.perform_pre_resolve(&incoming);

                self.services.resolver.resolve_graph(self, results)?;
                self.dependencies_modified.store(false, Ordering::Relaxed);
                self.failures_recorded
                    .store(results.has_error(), Ordering::Release);
                self.set_resolved_state(InternalState::GraphResolved);

                self.mark_parents_observed(requested);
                self.mark_referenced_projects_observed(requested, results);

                self.listeners.after_resolve(&incoming);
                Ok(())
            }
        }
    }

    fn perform_pre_resolve(&self, incoming: &ResolvableDependencies) {
        {
            self.inside_before_resolve.store(true, Ordering::Relaxed);
            let _reset = ResetFlag(&self.inside_before_resolve);
            self.listeners.before_resolve(incoming);
        }
        self.trigger_default_dependencies();
    }

    /// Run the registered default-dependency actions while the own set is
    /// empty, then give every parent the same chance.
    pub fn trigger_default_dependencies(&self) {
        let actions: Vec<DefaultDependencyAction> =
            self.default_dependency_actions.lock().clone();
        if !actions.is_empty() {
            let mut data = self.data.write();
            for action in &actions {
                if !data.dependencies.is_empty() {
                    break;
                }
                action(&mut data.dependencies);
            }
        }
        let parents = self.data.read().extends_from.clone();
        for parent in parents {
            parent.trigger_default_dependencies();
        }
    }

    fn resolve_artifacts_if_required(
        self: &Arc<Self>,
        results: &mut ResolverResults,
    ) -> ConfigResult<()> {
        if self.resolved_state() == InternalState::ArtifactsResolved {
            return Ok(());
        }
        if self.resolved_state() != InternalState::GraphResolved {
            return Err(ConfigurationError::InternalState(
                "cannot resolve artifacts before the graph has been resolved".into(),
            ));
        }
        debug!(configuration = %self.path, "resolving artifacts");
        self.services.resolver.resolve_artifacts(self, results)?;
        self.set_resolved_state(InternalState::ArtifactsResolved);

        let view = Arc::new(ResolvedConfiguration::new(
            self.build_lenient_view(results)?,
        ));
        results.set_resolved_configuration(view);
        Ok(())
    }

    fn build_lenient_view(&self, results: &ResolverResults) -> ConfigResult<LenientConfiguration> {
        let transformer = ArtifactTransformer::new(
            Arc::clone(self.strategy.lock().transforms()),
            self.data.read().attributes.as_immutable(),
        );
        Ok(LenientConfiguration::new(
            self.path.clone(),
            self.display_name(),
            Arc::clone(&self.services.cache_locking),
            results.unresolved().to_vec(),
            results.graph()?,
            results.artifact_results()?,
            results.file_dependencies()?,
            transformer,
        ))
    }

    // ------------------------------------------------------------------
    // consumption

    pub fn resolved_configuration(self: &Arc<Self>) -> ConfigResult<Arc<ResolvedConfiguration>> {
        self.resolve_to_state_or_later(InternalState::ArtifactsResolved)?;
        self.resolution_lock.lock().resolved_configuration()
    }

    pub fn resolution_result(self: &Arc<Self>) -> ConfigResult<Arc<ResolutionResult>> {
        self.resolve_to_state_or_later(InternalState::ArtifactsResolved)?;
        self.resolution_lock.lock().resolution_result()
    }

    /// Resolve and return all files. Alias for the satisfy-all file query.
    pub fn resolve(self: &Arc<Self>) -> ConfigResult<Vec<PathBuf>> {
        self.files()
    }

    pub fn files(self: &Arc<Self>) -> ConfigResult<Vec<PathBuf>> {
        self.files_matching(&DependencySpec::satisfy_all())
    }

    pub fn files_matching(self: &Arc<Self>, spec: &DependencySpec) -> ConfigResult<Vec<PathBuf>> {
        let resolved = self.resolved_configuration()?;
        resolved.rethrow_failure()?;
        resolved.files(spec)
    }

    /// Lazy file collection over `spec`; resolution happens when its files
    /// are first requested.
    pub fn file_collection(self: &Arc<Self>, spec: DependencySpec) -> ConfigResult<ConfigurationFileCollection> {
        self.assert_resolving_allowed()?;
        Ok(ConfigurationFileCollection {
            configuration: Arc::clone(self),
            spec,
        })
    }

    /// Task dependencies needed to build the resolved files. Depending on the
    /// strategy this either drives graph resolution or runs the lightweight
    /// build-dependency traversal into a throwaway results object.
    pub fn build_dependencies(self: &Arc<Self>) -> ConfigResult<TaskDependencies> {
        if self
            .strategy
            .lock()
            .resolve_graph_to_determine_task_dependencies()
        {
            self.resolve_to_state_or_later(InternalState::GraphResolved)?;
        }
        self.assert_resolving_allowed()?;
        let results = self.resolution_lock.lock();
        let mut values = Vec::new();
        if self.resolved_state() == InternalState::Unresolved {
            let mut scratch = ResolverResults::new();
            self.services
                .resolver
                .resolve_build_dependencies(self, &mut scratch)?;
            collect_build_dependencies(&scratch, &mut values)?;
        } else {
            collect_build_dependencies(&results, &mut values)?;
        }
        Ok(TaskDependencies { values })
    }

    pub fn incoming(self: &Arc<Self>) -> ResolvableDependencies {
        ResolvableDependencies {
            configuration: Arc::clone(self),
        }
    }

    // ------------------------------------------------------------------
    // strategy

    pub fn resolution_strategy(&self) -> ResolutionStrategy {
        self.strategy.lock().clone()
    }

    pub fn with_resolution_strategy<F>(&self, action: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut ResolutionStrategy),
    {
        self.validate_mutation(MutationType::Strategy)?;
        action(&mut self.strategy.lock());
        Ok(())
    }

    pub fn register_transform<F>(&self, factory: F) -> ConfigResult<()>
    where
        F: Fn() -> Box<dyn ArtifactTransform> + Send + Sync + 'static,
    {
        self.validate_mutation(MutationType::Strategy)?;
        self.strategy.lock().transforms().register(factory);
        Ok(())
    }

    // ------------------------------------------------------------------
    // copies

    /// Copy with the own dependencies. The copy starts unresolved, carries no
    /// `extendsFrom` edges, and resolves in isolation.
    pub fn copy(self: &Arc<Self>) -> Arc<Configuration> {
        let dependencies = self.data.read().dependencies.to_vec();
        self.create_copy(dependencies, false)
    }

    pub fn copy_matching(self: &Arc<Self>, spec: &DependencySpec) -> Arc<Configuration> {
        let dependencies = self.data.read().dependencies.matching(spec);
        self.create_copy(dependencies, false)
    }

    /// Copy with the inherited dependency view and the exclude rules of the
    /// whole hierarchy.
    pub fn copy_recursive(self: &Arc<Self>) -> Arc<Configuration> {
        let dependencies = self.all_dependencies();
        self.create_copy(dependencies, true)
    }

    pub fn copy_recursive_matching(self: &Arc<Self>, spec: &DependencySpec) -> Arc<Configuration> {
        let dependencies = self
            .all_dependencies()
            .into_iter()
            .filter(|d| spec.is_satisfied_by(d.as_ref()))
            .collect();
        self.create_copy(dependencies, true)
    }

    fn create_copy(
        self: &Arc<Self>,
        dependencies: Vec<Arc<dyn Dependency>>,
        recursive: bool,
    ) -> Arc<Configuration> {
        let provider = Arc::new(DetachedConfigurationsProvider::new());
        let copy = Configuration::new(
            format!("{}Copy", self.path),
            format!("{}Copy", self.name),
            Arc::clone(&provider) as Arc<dyn ConfigurationsProvider>,
            self.services.clone(),
            self.strategy.lock().copy(),
        );
        provider.set_configuration(Arc::clone(&copy));
        // state, cached results and extendsFrom are intentionally not copied;
        // the copy must re-resolve on its own

        let all_artifacts = self.all_artifacts();
        let mut exclude_rules = self.exclude_rules();
        if recursive {
            for ancestor in self.hierarchy().iter().skip(1) {
                for rule in ancestor.exclude_rules() {
                    if !exclude_rules.contains(&rule) {
                        exclude_rules.push(rule);
                    }
                }
            }
        }

        {
            let src = self.data.read();
            let mut dst = copy.data.write();
            dst.visible = src.visible;
            dst.transitive = src.transitive;
            dst.format = src.format.clone();
            dst.description = src.description.clone();
            dst.can_be_consumed = src.can_be_consumed;
            dst.can_be_resolved = src.can_be_resolved;
            dst.attributes = src.attributes.clone();
            dst.exclude_rules = exclude_rules;
            for artifact in all_artifacts {
                dst.artifacts.add(artifact);
            }
            for dependency in &dependencies {
                dst.dependencies.add(dependency.copy_dependency());
            }
        }
        copy.default_dependency_actions
            .lock()
            .extend(self.default_dependency_actions.lock().iter().cloned());
        copy
    }

    // ------------------------------------------------------------------
    // miscellaneous surface

    pub fn to_root_component_metadata(&self) -> RootComponentMetadata {
        let module = self.services.metadata_provider.module();
        let configurations = self.provider.all();
        self.services
            .component_metadata_builder
            .build_root_component(&module, &configurations)
    }

    /// Formatted multi-line description of this configuration's contents.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        out.push_str("\nConfiguration:");
        out.push_str(&format!(
            "  class='Configuration'  name='{}'  path='{}'",
            self.name, self.path
        ));

        out.push_str("\nLocal Dependencies:");
        push_descriptions(&mut out, self.dependencies().iter().map(|d| d.description()));

        out.push_str("\nLocal Artifacts:");
        push_descriptions(&mut out, self.artifacts().iter().map(|a| a.to_string()));

        out.push_str("\nAll Dependencies:");
        push_descriptions(&mut out, self.all_dependencies().iter().map(|d| d.description()));

        out.push_str("\nAll Artifacts:");
        push_descriptions(&mut out, self.all_artifacts().iter().map(|a| a.to_string()));

        out
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

fn push_descriptions(out: &mut String, items: impl Iterator<Item = String>) {
    let mut any = false;
    for item in items {
        any = true;
        out.push_str("\n   ");
        out.push_str(&item);
    }
    if !any {
        out.push_str("\n   none");
    }
}

fn format_hierarchy(hierarchy: &[Arc<Configuration>]) -> String {
    let names: Vec<String> = hierarchy.iter().map(|c| c.display_name()).collect();
    format!("[{}]", names.join(", "))
}

fn collect_super_configurations(
    configuration: &Arc<Configuration>,
    result: &mut Vec<Arc<Configuration>>,
) {
    let parents = configuration.data.read().extends_from.clone();
    for parent in parents {
        if let Some(position) = result.iter().position(|c| Arc::ptr_eq(c, &parent)) {
            result.remove(position);
        }
        result.push(Arc::clone(&parent));
        collect_super_configurations(&parent, result);
    }
}

fn collect_build_dependencies(results: &ResolverResults, dest: &mut Vec<String>) -> ConfigResult<()> {
    results
        .resolved_local_components()?
        .collect_artifact_build_dependencies(dest);
    results.file_dependencies()?.collect_build_dependencies(dest);
    Ok(())
}

/// Incoming dependency view handed to resolution listeners and consumers.
#[derive(Clone)]
pub struct ResolvableDependencies {
    configuration: Arc<Configuration>,
}

impl ResolvableDependencies {
    pub fn name(&self) -> &str {
        self.configuration.name()
    }

    pub fn path(&self) -> &str {
        self.configuration.path()
    }

    fn display_name(&self) -> String {
        format!("dependencies '{}'", self.configuration.path())
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    /// The inherited dependency view that will be resolved.
    pub fn dependencies(&self) -> Vec<Arc<dyn Dependency>> {
        self.configuration.all_dependencies()
    }

    pub fn files(&self) -> ConfigResult<Vec<PathBuf>> {
        self.configuration.files()
    }

    pub fn before_resolve<F>(&self, action: F)
    where
        F: Fn(&ResolvableDependencies) + Send + Sync + 'static,
    {
        self.configuration.listeners.add_before_resolve(action);
    }

    pub fn after_resolve<F>(&self, action: F)
    where
        F: Fn(&ResolvableDependencies) + Send + Sync + 'static,
    {
        self.configuration.listeners.add_after_resolve(action);
    }

    pub fn add_listener(&self, listener: Arc<dyn DependencyResolutionListener>) {
        self.configuration.listeners.add_listener(listener);
    }

    pub fn resolution_result(&self) -> ConfigResult<Arc<ResolutionResult>> {
        self.configuration.resolution_result()
    }

    /// Strict artifact results: rethrows stored failures, then collects the
    /// de-duplicated artifacts of the whole resolution.
    pub fn artifacts(&self) -> ConfigResult<Vec<crate::resolver::ResolvedArtifactResult>> {
        self.configuration
            .resolve_to_state_or_later(InternalState::ArtifactsResolved)?;
        let resolved = self
            .configuration
            .resolution_lock
            .lock()
            .resolved_configuration()?;
        resolved.rethrow_failure()?;
        let mut results = Vec::new();
        resolved.lenient_configuration().collect_artifacts(&mut results)?;
        Ok(results)
    }
}

impl fmt::Display for ResolvableDependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Lazy file collection over a dependency predicate.
pub struct ConfigurationFileCollection {
    configuration: Arc<Configuration>,
    spec: DependencySpec,
}

impl ConfigurationFileCollection {
    pub fn spec(&self) -> &DependencySpec {
        &self.spec
    }

    /// Drives resolution to the artifact phase and returns the matching
    /// files.
    pub fn files(&self) -> ConfigResult<Vec<PathBuf>> {
        self.configuration.files_matching(&self.spec)
    }

    pub fn build_dependencies(&self) -> ConfigResult<TaskDependencies> {
        self.configuration.build_dependencies()
    }
}

impl fmt::Display for ConfigurationFileCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} dependencies", self.configuration.display_name())
    }
}
