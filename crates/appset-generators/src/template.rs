//! Application template blocks.
//!
//! The same codec serves the required top-level template and the optional
//! per-generator override. Overrides are classified with [`TemplateOverride`]
//! so an empty override never reaches the wire or the configuration.

use appset_core::{Feature, FeatureSet};
use appset_model::{
    ApplicationDestination, ApplicationSetTemplate, ApplicationSetTemplateMeta, ApplicationSource,
    ApplicationSourceDirectory, ApplicationSourceHelm, ApplicationSourceKustomize, ApplicationSpec,
    Backoff, HelmParameter, ResourceIgnoreDifferences, RetryStrategy, SyncPolicy,
    SyncPolicyAutomated,
};

use crate::attrs::{self, BlockWriter, RawMap};
use crate::error::{GeneratorError, Result};

/// Presence of a per-generator template override.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateOverride {
    /// No template was given.
    Absent,
    /// A template was given but every field is zero.
    Empty,
    /// A template with content.
    Populated(ApplicationSetTemplate),
}

impl TemplateOverride {
    /// Classify an optional template after normalising a zero-valued source.
    #[must_use]
    pub fn classify(template: Option<&ApplicationSetTemplate>) -> Self {
        match template.map(ApplicationSetTemplate::normalized) {
            None => Self::Absent,
            Some(template) if template == ApplicationSetTemplate::default() => Self::Empty,
            Some(template) => Self::Populated(template),
        }
    }

    /// The populated template, if any.
    #[must_use]
    pub fn into_template(self) -> Option<ApplicationSetTemplate> {
        match self {
            Self::Populated(template) => Some(template),
            Self::Absent | Self::Empty => None,
        }
    }
}

// =============================================================================
// Expand
// =============================================================================

/// Read the optional `template` override of a generator block.
///
/// # Errors
///
/// Returns an error if the block is malformed or needs an unsupported
/// feature.
pub fn expand_override(
    raw: &RawMap,
    features: &FeatureSet,
) -> Result<Option<ApplicationSetTemplate>> {
    let template = attrs::block(raw, "template")?
        .map(|block| expand(block, features))
        .transpose()?;
    Ok(TemplateOverride::classify(template.as_ref()).into_template())
}

/// Read a template block.
///
/// # Errors
///
/// Returns an error if the block is malformed, or if it lists several
/// sources and the server does not support multi-source applications.
pub fn expand(raw: &RawMap, features: &FeatureSet) -> Result<ApplicationSetTemplate> {
    let metadata = attrs::block(raw, "metadata")?
        .map(expand_metadata)
        .transpose()?
        .unwrap_or_default();
    let spec = attrs::block(raw, "spec")?
        .map(|block| expand_spec(block, features))
        .transpose()?
        .unwrap_or_default();
    Ok(ApplicationSetTemplate { metadata, spec })
}

fn expand_metadata(raw: &RawMap) -> Result<ApplicationSetTemplateMeta> {
    Ok(ApplicationSetTemplateMeta {
        name: attrs::string(raw, "name")?,
        namespace: attrs::string(raw, "namespace")?,
        labels: attrs::string_map(raw, "labels")?,
        annotations: attrs::string_map(raw, "annotations")?,
        finalizers: attrs::strings(raw, "finalizers")?,
    })
}

fn expand_spec(raw: &RawMap, features: &FeatureSet) -> Result<ApplicationSpec> {
    let mut sources = attrs::blocks(raw, "source")?
        .into_iter()
        .map(expand_source)
        .collect::<Result<Vec<_>>>()?;
    let source = if sources.len() > 1 {
        features.require(Feature::MultipleApplicationSources)?;
        None
    } else {
        sources.pop()
    };

    Ok(ApplicationSpec {
        source,
        destination: attrs::block(raw, "destination")?
            .map(expand_destination)
            .transpose()?
            .unwrap_or_default(),
        project: attrs::string(raw, "project")?,
        sync_policy: attrs::block(raw, "sync_policy")?
            .map(expand_sync_policy)
            .transpose()?,
        ignore_differences: attrs::blocks(raw, "ignore_difference")?
            .into_iter()
            .map(expand_ignore_difference)
            .collect::<Result<_>>()?,
        revision_history_limit: attrs::integer(raw, "revision_history_limit")?,
        sources,
    })
}

fn expand_destination(raw: &RawMap) -> Result<ApplicationDestination> {
    Ok(ApplicationDestination {
        server: attrs::string(raw, "server")?,
        namespace: attrs::string(raw, "namespace")?,
        name: attrs::string(raw, "name")?,
    })
}

fn expand_source(raw: &RawMap) -> Result<ApplicationSource> {
    Ok(ApplicationSource {
        repo_url: attrs::string(raw, "repo_url")?,
        path: attrs::string(raw, "path")?,
        target_revision: attrs::string(raw, "target_revision")?,
        helm: attrs::block(raw, "helm")?.map(expand_helm).transpose()?,
        kustomize: attrs::block(raw, "kustomize")?
            .map(expand_kustomize)
            .transpose()?,
        directory: attrs::block(raw, "directory")?
            .map(expand_directory)
            .transpose()?,
        chart: attrs::string(raw, "chart")?,
        reference: attrs::string(raw, "ref")?,
        name: attrs::string(raw, "name")?,
    })
}

fn expand_helm(raw: &RawMap) -> Result<ApplicationSourceHelm> {
    let parameters = attrs::blocks(raw, "parameter")?
        .into_iter()
        .map(|param| {
            Ok(HelmParameter {
                name: attrs::string(param, "name")?,
                value: attrs::string(param, "value")?,
                force_string: attrs::boolean(param, "force_string")?,
            })
        })
        .collect::<Result<_>>()?;
    Ok(ApplicationSourceHelm {
        value_files: attrs::strings(raw, "value_files")?,
        parameters,
        release_name: attrs::string(raw, "release_name")?,
        values: attrs::string(raw, "values")?,
        pass_credentials: attrs::boolean(raw, "pass_credentials")?,
        ignore_missing_value_files: attrs::boolean(raw, "ignore_missing_value_files")?,
        skip_crds: attrs::boolean(raw, "skip_crds")?,
    })
}

fn expand_kustomize(raw: &RawMap) -> Result<ApplicationSourceKustomize> {
    Ok(ApplicationSourceKustomize {
        name_prefix: attrs::string(raw, "name_prefix")?,
        name_suffix: attrs::string(raw, "name_suffix")?,
        images: attrs::strings(raw, "images")?,
        common_labels: attrs::string_map(raw, "common_labels")?,
        version: attrs::string(raw, "version")?,
        common_annotations: attrs::string_map(raw, "common_annotations")?,
    })
}

fn expand_directory(raw: &RawMap) -> Result<ApplicationSourceDirectory> {
    Ok(ApplicationSourceDirectory {
        recurse: attrs::boolean(raw, "recurse")?,
        exclude: attrs::string(raw, "exclude")?,
        include: attrs::string(raw, "include")?,
    })
}

fn expand_sync_policy(raw: &RawMap) -> Result<SyncPolicy> {
    let automated = attrs::block(raw, "automated")?
        .map(|block| {
            Ok::<_, GeneratorError>(SyncPolicyAutomated {
                prune: attrs::boolean(block, "prune")?,
                self_heal: attrs::boolean(block, "self_heal")?,
                allow_empty: attrs::boolean(block, "allow_empty")?,
            })
        })
        .transpose()?;
    let retry = attrs::block(raw, "retry")?
        .map(|block| {
            let backoff = attrs::block(block, "backoff")?
                .map(|backoff| {
                    Ok::<_, GeneratorError>(Backoff {
                        duration: attrs::string(backoff, "duration")?,
                        factor: attrs::numeric_string(backoff, "factor")?,
                        max_duration: attrs::string(backoff, "max_duration")?,
                    })
                })
                .transpose()?;
            Ok::<_, GeneratorError>(RetryStrategy {
                limit: attrs::numeric_string(block, "limit")?,
                backoff,
            })
        })
        .transpose()?;
    Ok(SyncPolicy {
        automated,
        sync_options: attrs::strings(raw, "sync_options")?,
        retry,
    })
}

fn expand_ignore_difference(raw: &RawMap) -> Result<ResourceIgnoreDifferences> {
    Ok(ResourceIgnoreDifferences {
        group: attrs::string(raw, "group")?,
        kind: attrs::string(raw, "kind")?,
        name: attrs::string(raw, "name")?,
        namespace: attrs::string(raw, "namespace")?,
        json_pointers: attrs::strings(raw, "json_pointers")?,
        jq_path_expressions: attrs::strings(raw, "jq_path_expressions")?,
        managed_fields_managers: attrs::strings(raw, "managed_fields_managers")?,
    })
}

// =============================================================================
// Flatten
// =============================================================================

/// Write a per-generator template override. Absent and empty overrides
/// produce no block.
#[must_use]
pub fn flatten_override(template: Option<&ApplicationSetTemplate>) -> Option<RawMap> {
    TemplateOverride::classify(template)
        .into_template()
        .map(|template| flatten(&template))
}

/// Write a template block.
#[must_use]
pub fn flatten(template: &ApplicationSetTemplate) -> RawMap {
    let template = template.normalized();
    let metadata = (template.metadata != ApplicationSetTemplateMeta::default())
        .then(|| flatten_metadata(&template.metadata));
    let spec = (template.spec != ApplicationSpec::default()).then(|| flatten_spec(&template.spec));
    BlockWriter::new()
        .block("metadata", metadata)
        .block("spec", spec)
        .build()
}

fn flatten_metadata(meta: &ApplicationSetTemplateMeta) -> RawMap {
    BlockWriter::new()
        .string("name", &meta.name)
        .string("namespace", &meta.namespace)
        .string_map("labels", &meta.labels)
        .string_map("annotations", &meta.annotations)
        .strings("finalizers", &meta.finalizers)
        .build()
}

fn flatten_spec(spec: &ApplicationSpec) -> RawMap {
    let sources: Vec<RawMap> = if spec.sources.is_empty() {
        spec.source.iter().map(flatten_source).collect()
    } else {
        spec.sources.iter().map(flatten_source).collect()
    };
    let destination = (spec.destination != ApplicationDestination::default()).then(|| {
        BlockWriter::new()
            .string("server", &spec.destination.server)
            .string("namespace", &spec.destination.namespace)
            .string("name", &spec.destination.name)
            .build()
    });

    BlockWriter::new()
        .string("project", &spec.project)
        .blocks("source", sources)
        .block("destination", destination)
        .block("sync_policy", spec.sync_policy.as_ref().map(flatten_sync_policy))
        .blocks(
            "ignore_difference",
            spec.ignore_differences
                .iter()
                .map(flatten_ignore_difference)
                .collect(),
        )
        .integer("revision_history_limit", spec.revision_history_limit)
        .build()
}

fn flatten_source(source: &ApplicationSource) -> RawMap {
    BlockWriter::new()
        .string("repo_url", &source.repo_url)
        .string("path", &source.path)
        .string("target_revision", &source.target_revision)
        .string("chart", &source.chart)
        .string("ref", &source.reference)
        .string("name", &source.name)
        .block("helm", source.helm.as_ref().map(flatten_helm))
        .block("kustomize", source.kustomize.as_ref().map(flatten_kustomize))
        .block(
            "directory",
            source.directory.as_ref().map(|dir| {
                BlockWriter::new()
                    .boolean("recurse", dir.recurse)
                    .string("exclude", &dir.exclude)
                    .string("include", &dir.include)
                    .build()
            }),
        )
        .build()
}

fn flatten_helm(helm: &ApplicationSourceHelm) -> RawMap {
    let parameters = helm
        .parameters
        .iter()
        .map(|param| {
            BlockWriter::new()
                .string("name", &param.name)
                .string("value", &param.value)
                .boolean("force_string", param.force_string)
                .build()
        })
        .collect();
    BlockWriter::new()
        .strings("value_files", &helm.value_files)
        .blocks("parameter", parameters)
        .string("release_name", &helm.release_name)
        .string("values", &helm.values)
        .boolean("pass_credentials", helm.pass_credentials)
        .boolean("ignore_missing_value_files", helm.ignore_missing_value_files)
        .boolean("skip_crds", helm.skip_crds)
        .build()
}

fn flatten_kustomize(kustomize: &ApplicationSourceKustomize) -> RawMap {
    BlockWriter::new()
        .string("name_prefix", &kustomize.name_prefix)
        .string("name_suffix", &kustomize.name_suffix)
        .strings("images", &kustomize.images)
        .string_map("common_labels", &kustomize.common_labels)
        .string("version", &kustomize.version)
        .string_map("common_annotations", &kustomize.common_annotations)
        .build()
}

fn flatten_sync_policy(policy: &SyncPolicy) -> RawMap {
    let automated = policy.automated.as_ref().map(|automated| {
        BlockWriter::new()
            .boolean("prune", automated.prune)
            .boolean("self_heal", automated.self_heal)
            .boolean("allow_empty", automated.allow_empty)
            .build()
    });
    let retry = policy.retry.as_ref().map(|retry| {
        let backoff = retry.backoff.as_ref().map(|backoff| {
            BlockWriter::new()
                .string("duration", &backoff.duration)
                .numeric_string("factor", backoff.factor)
                .string("max_duration", &backoff.max_duration)
                .build()
        });
        BlockWriter::new()
            .numeric_string("limit", retry.limit)
            .block("backoff", backoff)
            .build()
    });
    BlockWriter::new()
        .block("automated", automated)
        .strings("sync_options", &policy.sync_options)
        .block("retry", retry)
        .build()
}

fn flatten_ignore_difference(diff: &ResourceIgnoreDifferences) -> RawMap {
    BlockWriter::new()
        .string("group", &diff.group)
        .string("kind", &diff.kind)
        .string("name", &diff.name)
        .string("namespace", &diff.namespace)
        .strings("json_pointers", &diff.json_pointers)
        .strings("jq_path_expressions", &diff.jq_path_expressions)
        .strings("managed_fields_managers", &diff.managed_fields_managers)
        .build()
}
