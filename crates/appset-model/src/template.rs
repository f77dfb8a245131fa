//! Application template types.
//!
//! An [`ApplicationSetTemplate`] describes the application rendered for each
//! parameter set. The spec fragment carries the parts of an application spec
//! that can be set from an application set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Template for the generated applications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSetTemplate {
    /// Metadata of the generated application.
    #[serde(default)]
    pub metadata: ApplicationSetTemplateMeta,
    /// Spec of the generated application.
    #[serde(default)]
    pub spec: ApplicationSpec,
}

impl ApplicationSetTemplate {
    /// Copy of this template with a zero-valued single source cleared.
    ///
    /// Servers that treat `source` as a required field send back an empty
    /// object where others omit it; both mean "no source".
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut template = self.clone();
        if template
            .spec
            .source
            .as_ref()
            .is_some_and(|source| *source == ApplicationSource::default())
        {
            template.spec.source = None;
        }
        template
    }
}

/// Metadata of a generated application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSetTemplateMeta {
    /// Application name (usually templated).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Application namespace.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    /// Labels.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Annotations.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    /// Finalizers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finalizers: Vec<String>,
}

/// Spec of a generated application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    /// Single source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ApplicationSource>,
    /// Where to deploy.
    #[serde(default)]
    pub destination: ApplicationDestination,
    /// Project the application belongs to.
    #[serde(default)]
    pub project: String,
    /// Sync behaviour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_policy: Option<SyncPolicy>,
    /// Fields ignored when diffing live state.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_differences: Vec<ResourceIgnoreDifferences>,
    /// Number of history entries kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_history_limit: Option<i64>,
    /// Multiple sources.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<ApplicationSource>,
}

/// Where an application deploys to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDestination {
    /// Cluster API URL.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server: String,
    /// Target namespace.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    /// Cluster name (alternative to `server`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// Where an application's manifests come from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSource {
    /// Repository URL (Git or Helm).
    #[serde(default, rename = "repoURL")]
    pub repo_url: String,
    /// Directory within the repository.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    /// Revision, tag or chart version.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_revision: String,
    /// Helm options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm: Option<ApplicationSourceHelm>,
    /// Kustomize options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kustomize: Option<ApplicationSourceKustomize>,
    /// Plain directory options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<ApplicationSourceDirectory>,
    /// Helm chart name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub chart: String,
    /// Reference name used by other sources (`$ref/...`).
    #[serde(default, rename = "ref", skip_serializing_if = "String::is_empty")]
    pub reference: String,
    /// Source name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// Helm options of a source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSourceHelm {
    /// Values files, relative to the source path.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value_files: Vec<String>,
    /// Individual value overrides.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<HelmParameter>,
    /// Release name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub release_name: String,
    /// Inline values YAML.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub values: String,
    /// Pass repository credentials to every domain.
    #[serde(default)]
    pub pass_credentials: bool,
    /// Ignore value files that do not exist.
    #[serde(default)]
    pub ignore_missing_value_files: bool,
    /// Skip installing CRDs.
    #[serde(default)]
    pub skip_crds: bool,
}

/// A Helm value override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmParameter {
    /// Value path.
    #[serde(default)]
    pub name: String,
    /// Value.
    #[serde(default)]
    pub value: String,
    /// Pass the value as a string even if it looks like another type.
    #[serde(default)]
    pub force_string: bool,
}

/// Kustomize options of a source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSourceKustomize {
    /// Prefix added to resource names.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name_prefix: String,
    /// Suffix added to resource names.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name_suffix: String,
    /// Image overrides.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Labels added to every resource.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub common_labels: BTreeMap<String, String>,
    /// Kustomize version.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    /// Annotations added to every resource.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub common_annotations: BTreeMap<String, String>,
}

/// Plain directory options of a source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSourceDirectory {
    /// Recurse into subdirectories.
    #[serde(default)]
    pub recurse: bool,
    /// Glob of files to exclude.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub exclude: String,
    /// Glob of files to include.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub include: String,
}

/// Sync behaviour of an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPolicy {
    /// Automatic sync settings. `None` means manual sync.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automated: Option<SyncPolicyAutomated>,
    /// Sync options such as `CreateNamespace=true`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sync_options: Vec<String>,
    /// Retry behaviour for failed syncs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryStrategy>,
}

/// Automatic sync settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPolicyAutomated {
    /// Delete resources no longer in the source.
    #[serde(default)]
    pub prune: bool,
    /// Revert drift in the live state.
    #[serde(default)]
    pub self_heal: bool,
    /// Allow syncing to an empty set of resources.
    #[serde(default)]
    pub allow_empty: bool,
}

/// Retry behaviour for failed syncs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryStrategy {
    /// Maximum attempts; negative retries forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// Delay between attempts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff: Option<Backoff>,
}

/// Delay between sync attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backoff {
    /// Initial delay (`5s`, `2m`, ...).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub duration: String,
    /// Multiplier applied after each failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<i64>,
    /// Upper bound on the delay.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub max_duration: String,
}

/// Fields of a resource ignored when diffing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceIgnoreDifferences {
    /// API group.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    /// Resource kind.
    #[serde(default)]
    pub kind: String,
    /// Resource name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Resource namespace.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    /// JSON pointers to ignore.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub json_pointers: Vec<String>,
    /// JQ path expressions to ignore.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jq_path_expressions: Vec<String>,
    /// Field managers whose fields are ignored.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub managed_fields_managers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalized_clears_zero_source() {
        let template = ApplicationSetTemplate {
            spec: ApplicationSpec {
                source: Some(ApplicationSource::default()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(template.normalized(), ApplicationSetTemplate::default());
    }

    #[test]
    fn normalized_keeps_real_source() {
        let template = ApplicationSetTemplate {
            spec: ApplicationSpec {
                source: Some(ApplicationSource {
                    repo_url: "https://charts.example.com".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(template.normalized(), template);
    }

    #[test]
    fn template_from_server_with_empty_source_object() {
        let template: ApplicationSetTemplate = serde_json::from_value(json!({
            "metadata": {},
            "spec": {"source": {"repoURL": ""}, "destination": {}, "project": ""}
        }))
        .unwrap();
        assert!(template.spec.source.is_some());
        assert_eq!(template.normalized(), ApplicationSetTemplate::default());
    }
}
