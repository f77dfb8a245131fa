//! Generator types.
//!
//! The server represents a generator as a struct with one optional field per
//! kind, of which exactly one is set. The engine works with the tagged enums
//! [`Generator`], [`NestedGenerator`] and [`LeafGenerator`] instead; the
//! `From`/`into_*` helpers here are the only place the two shapes meet.

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::JSON;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::pull_request::PullRequestGenerator;
use crate::scm::ScmProviderGenerator;
use crate::template::ApplicationSetTemplate;

/// The kinds of generator the server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeneratorKind {
    /// Parameters from a duck-typed resource listing clusters.
    ClusterDecisionResource,
    /// One parameter set per registered cluster.
    Clusters,
    /// Parameters from directories or files in a Git repository.
    Git,
    /// A literal list of parameter sets.
    List,
    /// Cross product of two child generators.
    Matrix,
    /// Key join of two or more child generators.
    Merge,
    /// One parameter set per repository of an SCM organisation.
    ScmProvider,
    /// One parameter set per open pull request.
    PullRequest,
}

impl GeneratorKind {
    /// Every kind, in dispatch order.
    pub const ALL: [Self; 8] = [
        Self::ClusterDecisionResource,
        Self::Clusters,
        Self::Git,
        Self::List,
        Self::Matrix,
        Self::Merge,
        Self::ScmProvider,
        Self::PullRequest,
    ];

    /// Whether this kind owns child generators.
    #[must_use]
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::Matrix | Self::Merge)
    }

    /// The lowercase name used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClusterDecisionResource => "cluster decision resource",
            Self::Clusters => "clusters",
            Self::Git => "git",
            Self::List => "list",
            Self::Matrix => "matrix",
            Self::Merge => "merge",
            Self::ScmProvider => "scm provider",
            Self::PullRequest => "pull request",
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Leaf generators
// =============================================================================

/// Generates one parameter set per literal element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListGenerator {
    /// Arbitrary string-keyed documents, one per parameter set.
    #[serde(default)]
    pub elements: Vec<JSON>,
    /// Per-generator template override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<ApplicationSetTemplate>,
}

/// Generates one parameter set per cluster matching the selector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterGenerator {
    /// Label selector over cluster secrets. Empty selects every cluster.
    #[serde(default)]
    pub selector: LabelSelector,
    /// Per-generator template override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<ApplicationSetTemplate>,
    /// Extra key/value pairs added to every parameter set.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, String>,
}

/// Generates parameter sets from a duck-typed resource (the cluster decision
/// resource generator).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuckTypeGenerator {
    /// Config map naming the resource's group, version and list path.
    #[serde(default)]
    pub config_map_ref: String,
    /// Name of the resource to read.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Poll interval in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requeue_after_seconds: Option<i64>,
    /// Selects resources by label when `name` is empty.
    #[serde(default)]
    pub label_selector: LabelSelector,
    /// Per-generator template override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<ApplicationSetTemplate>,
    /// Extra key/value pairs added to every parameter set.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, String>,
}

/// Generates parameter sets from a Git repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitGenerator {
    /// Repository URL.
    #[serde(default, rename = "repoURL")]
    pub repo_url: String,
    /// Directory matchers; one parameter set per matching directory.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directories: Vec<GitDirectoryGeneratorItem>,
    /// File matchers; one parameter set per matching JSON/YAML file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<GitFileGeneratorItem>,
    /// Revision to read.
    #[serde(default)]
    pub revision: String,
    /// Poll interval in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requeue_after_seconds: Option<i64>,
    /// Per-generator template override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<ApplicationSetTemplate>,
    /// Prefix for the generated path parameters.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path_param_prefix: String,
    /// Extra key/value pairs added to every parameter set.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, String>,
}

/// A directory pattern for the Git generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitDirectoryGeneratorItem {
    /// Glob pattern.
    pub path: String,
    /// Exclude matching directories instead of including them.
    #[serde(default)]
    pub exclude: bool,
}

/// A file pattern for the Git generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitFileGeneratorItem {
    /// Glob pattern.
    pub path: String,
}

/// One of the six leaf generator kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafGenerator {
    /// See [`DuckTypeGenerator`].
    ClusterDecisionResource(DuckTypeGenerator),
    /// See [`ClusterGenerator`].
    Clusters(ClusterGenerator),
    /// See [`GitGenerator`].
    Git(GitGenerator),
    /// See [`ListGenerator`].
    List(ListGenerator),
    /// See [`ScmProviderGenerator`].
    ScmProvider(ScmProviderGenerator),
    /// See [`PullRequestGenerator`].
    PullRequest(PullRequestGenerator),
}

impl LeafGenerator {
    /// The kind tag of this generator.
    #[must_use]
    pub const fn kind(&self) -> GeneratorKind {
        match self {
            Self::ClusterDecisionResource(_) => GeneratorKind::ClusterDecisionResource,
            Self::Clusters(_) => GeneratorKind::Clusters,
            Self::Git(_) => GeneratorKind::Git,
            Self::List(_) => GeneratorKind::List,
            Self::ScmProvider(_) => GeneratorKind::ScmProvider,
            Self::PullRequest(_) => GeneratorKind::PullRequest,
        }
    }
}

/// The leaf fields shared by every generator level.
///
/// Each level struct flattens this in, so the six leaf kinds have exactly one
/// definition of their wire names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafSlots {
    /// List generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListGenerator>,
    /// Clusters generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clusters: Option<ClusterGenerator>,
    /// Git generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitGenerator>,
    /// SCM provider generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scm_provider: Option<ScmProviderGenerator>,
    /// Cluster decision resource generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_decision_resource: Option<DuckTypeGenerator>,
    /// Pull request generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<PullRequestGenerator>,
}

impl LeafSlots {
    /// Slots holding just `leaf`.
    #[must_use]
    pub fn from_leaf(leaf: LeafGenerator) -> Self {
        let mut slots = Self::default();
        match leaf {
            LeafGenerator::ClusterDecisionResource(g) => slots.cluster_decision_resource = Some(g),
            LeafGenerator::Clusters(g) => slots.clusters = Some(g),
            LeafGenerator::Git(g) => slots.git = Some(g),
            LeafGenerator::List(g) => slots.list = Some(g),
            LeafGenerator::ScmProvider(g) => slots.scm_provider = Some(g),
            LeafGenerator::PullRequest(g) => slots.pull_request = Some(g),
        }
        slots
    }

    /// Whether the slot for `kind` is populated. Composite kinds have no slot.
    #[must_use]
    pub const fn has(&self, kind: GeneratorKind) -> bool {
        match kind {
            GeneratorKind::ClusterDecisionResource => self.cluster_decision_resource.is_some(),
            GeneratorKind::Clusters => self.clusters.is_some(),
            GeneratorKind::Git => self.git.is_some(),
            GeneratorKind::List => self.list.is_some(),
            GeneratorKind::ScmProvider => self.scm_provider.is_some(),
            GeneratorKind::PullRequest => self.pull_request.is_some(),
            GeneratorKind::Matrix | GeneratorKind::Merge => false,
        }
    }

    /// The first populated slot, in dispatch order.
    #[must_use]
    pub fn into_leaf(self) -> Option<LeafGenerator> {
        if let Some(g) = self.cluster_decision_resource {
            return Some(LeafGenerator::ClusterDecisionResource(g));
        }
        if let Some(g) = self.clusters {
            return Some(LeafGenerator::Clusters(g));
        }
        if let Some(g) = self.git {
            return Some(LeafGenerator::Git(g));
        }
        if let Some(g) = self.list {
            return Some(LeafGenerator::List(g));
        }
        if let Some(g) = self.scm_provider {
            return Some(LeafGenerator::ScmProvider(g));
        }
        self.pull_request.map(LeafGenerator::PullRequest)
    }

    /// Kinds of every populated slot, in dispatch order.
    #[must_use]
    pub fn kinds(&self) -> Vec<GeneratorKind> {
        GeneratorKind::ALL
            .into_iter()
            .filter(|kind| self.has(*kind))
            .collect()
    }
}

// =============================================================================
// Composite generators
// =============================================================================

/// Combines exactly two child generators by cross product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixGenerator {
    /// The two child generators.
    pub generators: Vec<ApplicationSetNestedGenerator>,
    /// Per-generator template override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<ApplicationSetTemplate>,
}

/// Combines two or more child generators by joining on `merge_keys`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeGenerator {
    /// The child generators; the first is the base.
    pub generators: Vec<ApplicationSetNestedGenerator>,
    /// Parameter names to join on, in order.
    pub merge_keys: Vec<String>,
    /// Per-generator template override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<ApplicationSetTemplate>,
}

/// A matrix generator stored two levels deep. Its children are leaves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedMatrixGenerator {
    /// The child generators.
    pub generators: Vec<ApplicationSetTerminalGenerator>,
    /// Per-generator template override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<ApplicationSetTemplate>,
}

/// A merge generator stored two levels deep. Its children are leaves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedMergeGenerator {
    /// The child generators.
    pub generators: Vec<ApplicationSetTerminalGenerator>,
    /// Parameter names to join on, in order.
    pub merge_keys: Vec<String>,
    /// Per-generator template override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<ApplicationSetTemplate>,
}

fn nested_to_terminal(
    parent: GeneratorKind,
    generators: Vec<ApplicationSetNestedGenerator>,
) -> Result<Vec<ApplicationSetTerminalGenerator>, ModelError> {
    generators
        .into_iter()
        .map(|g| match g.composite_kind() {
            Some(child) => Err(ModelError::CompositeTooDeep { parent, child }),
            None => Ok(ApplicationSetTerminalGenerator {
                leaves: g.leaves,
                selector: g.selector,
            }),
        })
        .collect()
}

fn terminal_to_nested(
    generators: Vec<ApplicationSetTerminalGenerator>,
) -> Vec<ApplicationSetNestedGenerator> {
    generators
        .into_iter()
        .map(|g| ApplicationSetNestedGenerator {
            leaves: g.leaves,
            matrix: None,
            merge: None,
            selector: g.selector,
        })
        .collect()
}

impl NestedMatrixGenerator {
    /// Narrow a matrix generator to its nested form.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::CompositeTooDeep`] if a child is itself composite.
    pub fn from_matrix(matrix: MatrixGenerator) -> Result<Self, ModelError> {
        Ok(Self {
            generators: nested_to_terminal(GeneratorKind::Matrix, matrix.generators)?,
            template: matrix.template,
        })
    }

    /// Widen back into a matrix generator.
    #[must_use]
    pub fn into_matrix(self) -> MatrixGenerator {
        MatrixGenerator {
            generators: terminal_to_nested(self.generators),
            template: self.template,
        }
    }
}

impl NestedMergeGenerator {
    /// Narrow a merge generator to its nested form.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::CompositeTooDeep`] if a child is itself composite.
    pub fn from_merge(merge: MergeGenerator) -> Result<Self, ModelError> {
        Ok(Self {
            generators: nested_to_terminal(GeneratorKind::Merge, merge.generators)?,
            merge_keys: merge.merge_keys,
            template: merge.template,
        })
    }

    /// Widen back into a merge generator.
    #[must_use]
    pub fn into_merge(self) -> MergeGenerator {
        MergeGenerator {
            generators: terminal_to_nested(self.generators),
            merge_keys: self.merge_keys,
            template: self.template,
        }
    }
}

// =============================================================================
// Generator levels
// =============================================================================

/// A top-level generator slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSetGenerator {
    /// Leaf kinds.
    #[serde(flatten)]
    pub leaves: LeafSlots,
    /// Matrix generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<MatrixGenerator>,
    /// Merge generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeGenerator>,
    /// Post-filter over the generated parameter sets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<LabelSelector>,
}

/// A child of a matrix or merge generator.
///
/// Nested composites are stored as JSON documents because the server has no
/// typed field for them at this level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSetNestedGenerator {
    /// Leaf kinds.
    #[serde(flatten)]
    pub leaves: LeafSlots,
    /// Encoded [`NestedMatrixGenerator`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<JSON>,
    /// Encoded [`NestedMergeGenerator`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<JSON>,
    /// Post-filter over the generated parameter sets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<LabelSelector>,
}

/// A grandchild of a composite generator. Leaf kinds only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSetTerminalGenerator {
    /// Leaf kinds.
    #[serde(flatten)]
    pub leaves: LeafSlots,
    /// Post-filter over the generated parameter sets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<LabelSelector>,
}

/// The variant held by an [`ApplicationSetGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub enum Generator {
    /// A leaf kind.
    Leaf(LeafGenerator),
    /// A matrix generator.
    Matrix(MatrixGenerator),
    /// A merge generator.
    Merge(MergeGenerator),
}

impl Generator {
    /// The kind tag of this generator.
    #[must_use]
    pub const fn kind(&self) -> GeneratorKind {
        match self {
            Self::Leaf(leaf) => leaf.kind(),
            Self::Matrix(_) => GeneratorKind::Matrix,
            Self::Merge(_) => GeneratorKind::Merge,
        }
    }
}

/// The variant held by an [`ApplicationSetNestedGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub enum NestedGenerator {
    /// A leaf kind.
    Leaf(LeafGenerator),
    /// An encoded nested matrix generator.
    Matrix(JSON),
    /// An encoded nested merge generator.
    Merge(JSON),
}

impl From<Generator> for ApplicationSetGenerator {
    fn from(generator: Generator) -> Self {
        match generator {
            Generator::Leaf(leaf) => Self {
                leaves: LeafSlots::from_leaf(leaf),
                ..Default::default()
            },
            Generator::Matrix(matrix) => Self {
                matrix: Some(matrix),
                ..Default::default()
            },
            Generator::Merge(merge) => Self {
                merge: Some(merge),
                ..Default::default()
            },
        }
    }
}

impl ApplicationSetGenerator {
    /// Attach a post-filter selector.
    #[must_use]
    pub fn with_selector(mut self, selector: Option<LabelSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Kinds of every populated field, in dispatch order.
    #[must_use]
    pub fn kinds(&self) -> Vec<GeneratorKind> {
        GeneratorKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                GeneratorKind::Matrix => self.matrix.is_some(),
                GeneratorKind::Merge => self.merge.is_some(),
                leaf => self.leaves.has(*leaf),
            })
            .collect()
    }

    /// The kind of the populated field, or the first one if several are set.
    #[must_use]
    pub fn kind(&self) -> Option<GeneratorKind> {
        self.kinds().into_iter().next()
    }

    /// Split into the populated variant and the selector.
    ///
    /// When several fields are set the first in dispatch order wins, the
    /// same choice expansion makes for a raw block.
    #[must_use]
    pub fn into_parts(self) -> (Option<Generator>, Option<LabelSelector>) {
        let generator = match self.kind() {
            Some(GeneratorKind::Matrix) => self.matrix.map(Generator::Matrix),
            Some(GeneratorKind::Merge) => self.merge.map(Generator::Merge),
            Some(_) => self.leaves.into_leaf().map(Generator::Leaf),
            None => None,
        };
        (generator, self.selector)
    }
}

impl From<NestedGenerator> for ApplicationSetNestedGenerator {
    fn from(generator: NestedGenerator) -> Self {
        match generator {
            NestedGenerator::Leaf(leaf) => Self {
                leaves: LeafSlots::from_leaf(leaf),
                ..Default::default()
            },
            NestedGenerator::Matrix(blob) => Self {
                matrix: Some(blob),
                ..Default::default()
            },
            NestedGenerator::Merge(blob) => Self {
                merge: Some(blob),
                ..Default::default()
            },
        }
    }
}

impl ApplicationSetNestedGenerator {
    /// Attach a post-filter selector.
    #[must_use]
    pub fn with_selector(mut self, selector: Option<LabelSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// The composite kind held, if any.
    #[must_use]
    pub const fn composite_kind(&self) -> Option<GeneratorKind> {
        if self.matrix.is_some() {
            Some(GeneratorKind::Matrix)
        } else if self.merge.is_some() {
            Some(GeneratorKind::Merge)
        } else {
            None
        }
    }

    /// Kinds of every populated field, in dispatch order.
    #[must_use]
    pub fn kinds(&self) -> Vec<GeneratorKind> {
        GeneratorKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                GeneratorKind::Matrix => self.matrix.is_some(),
                GeneratorKind::Merge => self.merge.is_some(),
                leaf => self.leaves.has(*leaf),
            })
            .collect()
    }

    /// Split into the populated variant and the selector.
    ///
    /// Several populated fields resolve as in
    /// [`ApplicationSetGenerator::into_parts`].
    #[must_use]
    pub fn into_parts(self) -> (Option<NestedGenerator>, Option<LabelSelector>) {
        let generator = match self.kinds().first().copied() {
            Some(GeneratorKind::Matrix) => self.matrix.map(NestedGenerator::Matrix),
            Some(GeneratorKind::Merge) => self.merge.map(NestedGenerator::Merge),
            Some(_) => self.leaves.into_leaf().map(NestedGenerator::Leaf),
            None => None,
        };
        (generator, self.selector)
    }
}
