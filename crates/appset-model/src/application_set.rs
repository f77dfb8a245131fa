//! Application set spec types.

use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde::{Deserialize, Serialize};

use crate::generator::ApplicationSetGenerator;
use crate::template::ApplicationSetTemplate;

/// Spec of an application set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSetSpec {
    /// Render templates with Go templating instead of fasttemplate.
    #[serde(default)]
    pub go_template: bool,
    /// Top-level generators.
    #[serde(default)]
    pub generators: Vec<ApplicationSetGenerator>,
    /// Default template for generated applications.
    #[serde(default)]
    pub template: ApplicationSetTemplate,
    /// How generated applications are created, updated and deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_policy: Option<ApplicationSetSyncPolicy>,
    /// Progressive sync strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ApplicationSetStrategy>,
    /// Go template options such as `missingkey=error`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub go_template_options: Vec<String>,
    /// Fields of generated applications the controller leaves alone.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_application_differences: Vec<ApplicationSetIgnoreDifferences>,
    /// Go template patch applied after rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_patch: Option<String>,
}

/// How generated applications are managed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSetSyncPolicy {
    /// Keep application resources when the application set is deleted.
    #[serde(default)]
    pub preserve_resources_on_deletion: bool,
    /// `create-only`, `create-update`, `create-delete` or `sync`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applications_sync: Option<String>,
}

/// Progressive sync strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSetStrategy {
    /// Strategy type, e.g. `RollingSync`.
    #[serde(default, rename = "type")]
    pub strategy_type: String,
    /// Rolling sync steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolling_sync: Option<ApplicationSetRolloutStrategy>,
}

/// Ordered rolling sync steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSetRolloutStrategy {
    /// Steps, synced in order.
    #[serde(default)]
    pub steps: Vec<ApplicationSetRolloutStep>,
}

/// One rolling sync step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSetRolloutStep {
    /// Applications in this step.
    #[serde(default)]
    pub match_expressions: Vec<ApplicationMatchExpression>,
    /// Applications synced at once: a count or a percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_update: Option<IntOrString>,
}

/// A label expression selecting applications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationMatchExpression {
    /// Label key.
    #[serde(default)]
    pub key: String,
    /// `In` or `NotIn`.
    #[serde(default)]
    pub operator: String,
    /// Label values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// Fields of generated applications ignored by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSetIgnoreDifferences {
    /// Application name this entry applies to; empty means all.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// JSON pointers to ignore.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub json_pointers: Vec<String>,
    /// JQ path expressions to ignore.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jq_path_expressions: Vec<String>,
}
