//! SCM provider generator types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::secret::{BasicAuthBitbucketServer, SecretRef};
use crate::template::ApplicationSetTemplate;

/// Generates one parameter set per repository (or branch) of an SCM
/// organisation. Exactly one provider field is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmProviderGenerator {
    /// GitHub organisation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<ScmProviderGeneratorGithub>,
    /// GitLab group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitlab: Option<ScmProviderGeneratorGitlab>,
    /// Bitbucket Cloud workspace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitbucket: Option<ScmProviderGeneratorBitbucket>,
    /// Bitbucket Server project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitbucket_server: Option<ScmProviderGeneratorBitbucketServer>,
    /// Gitea owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitea: Option<ScmProviderGeneratorGitea>,
    /// Azure DevOps team project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_dev_ops: Option<ScmProviderGeneratorAzureDevOps>,
    /// Repository filters; a repository passes if any filter matches.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<ScmProviderGeneratorFilter>,
    /// `https` or `ssh`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub clone_protocol: String,
    /// Poll interval in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requeue_after_seconds: Option<i64>,
    /// Per-generator template override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<ApplicationSetTemplate>,
    /// Extra key/value pairs added to every parameter set.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, String>,
}

/// The provider variant of an [`ScmProviderGenerator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScmProvider {
    /// GitHub.
    Github(ScmProviderGeneratorGithub),
    /// GitLab.
    Gitlab(ScmProviderGeneratorGitlab),
    /// Gitea.
    Gitea(ScmProviderGeneratorGitea),
    /// Bitbucket Cloud.
    BitbucketCloud(ScmProviderGeneratorBitbucket),
    /// Bitbucket Server.
    BitbucketServer(ScmProviderGeneratorBitbucketServer),
    /// Azure DevOps.
    AzureDevOps(ScmProviderGeneratorAzureDevOps),
}

impl ScmProviderGenerator {
    /// Set `provider` as the single populated provider field.
    pub fn set_provider(&mut self, provider: ScmProvider) {
        self.github = None;
        self.gitlab = None;
        self.gitea = None;
        self.bitbucket = None;
        self.bitbucket_server = None;
        self.azure_dev_ops = None;
        match provider {
            ScmProvider::Github(p) => self.github = Some(p),
            ScmProvider::Gitlab(p) => self.gitlab = Some(p),
            ScmProvider::Gitea(p) => self.gitea = Some(p),
            ScmProvider::BitbucketCloud(p) => self.bitbucket = Some(p),
            ScmProvider::BitbucketServer(p) => self.bitbucket_server = Some(p),
            ScmProvider::AzureDevOps(p) => self.azure_dev_ops = Some(p),
        }
    }

    /// The first populated provider field.
    #[must_use]
    pub fn provider(&self) -> Option<ScmProvider> {
        if let Some(p) = &self.github {
            return Some(ScmProvider::Github(p.clone()));
        }
        if let Some(p) = &self.gitlab {
            return Some(ScmProvider::Gitlab(p.clone()));
        }
        if let Some(p) = &self.gitea {
            return Some(ScmProvider::Gitea(p.clone()));
        }
        if let Some(p) = &self.bitbucket {
            return Some(ScmProvider::BitbucketCloud(p.clone()));
        }
        if let Some(p) = &self.bitbucket_server {
            return Some(ScmProvider::BitbucketServer(p.clone()));
        }
        self.azure_dev_ops.clone().map(ScmProvider::AzureDevOps)
    }
}

/// GitHub organisation source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmProviderGeneratorGithub {
    /// Organisation to scan.
    #[serde(default)]
    pub organization: String,
    /// API URL for GitHub Enterprise.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api: String,
    /// Access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_ref: Option<SecretRef>,
    /// Secret holding GitHub App credentials.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub app_secret_name: String,
    /// Scan every branch, not just the default one.
    #[serde(default)]
    pub all_branches: bool,
}

/// GitLab group source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmProviderGeneratorGitlab {
    /// Group to scan.
    #[serde(default)]
    pub group: String,
    /// Include repositories of subgroups.
    #[serde(default)]
    pub include_subgroups: bool,
    /// API URL for self-hosted GitLab.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api: String,
    /// Access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_ref: Option<SecretRef>,
    /// Scan every branch, not just the default one.
    #[serde(default)]
    pub all_branches: bool,
    /// Skip TLS verification.
    #[serde(default)]
    pub insecure: bool,
}

/// Gitea owner source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmProviderGeneratorGitea {
    /// Owner to scan.
    #[serde(default)]
    pub owner: String,
    /// API URL.
    #[serde(default)]
    pub api: String,
    /// Access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_ref: Option<SecretRef>,
    /// Scan every branch, not just the default one.
    #[serde(default)]
    pub all_branches: bool,
    /// Skip TLS verification.
    #[serde(default)]
    pub insecure: bool,
}

/// Bitbucket Cloud workspace source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmProviderGeneratorBitbucket {
    /// Workspace to scan.
    #[serde(default)]
    pub owner: String,
    /// Username for the API.
    #[serde(default)]
    pub user: String,
    /// App password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_password_ref: Option<SecretRef>,
    /// Scan every branch, not just the main one.
    #[serde(default)]
    pub all_branches: bool,
}

/// Bitbucket Server project source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmProviderGeneratorBitbucketServer {
    /// Project to scan.
    #[serde(default)]
    pub project: String,
    /// API URL.
    #[serde(default)]
    pub api: String,
    /// Credentials for the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<BasicAuthBitbucketServer>,
    /// Scan every branch, not just the default one.
    #[serde(default)]
    pub all_branches: bool,
}

/// Azure DevOps team project source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmProviderGeneratorAzureDevOps {
    /// Organisation name.
    #[serde(default)]
    pub organization: String,
    /// API URL.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api: String,
    /// Team project to scan.
    #[serde(default)]
    pub team_project: String,
    /// Personal access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_ref: Option<SecretRef>,
    /// Scan every branch, not just the default one.
    #[serde(default)]
    pub all_branches: bool,
}

/// A repository filter. Every predicate that is set must match.
///
/// A predicate that is `None` is not applied; `Some("")` is a real (if odd)
/// predicate and is kept as such.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmProviderGeneratorFilter {
    /// Regex over the repository name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_match: Option<String>,
    /// Paths that must exist in the repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths_exist: Option<Vec<String>>,
    /// Paths that must not exist in the repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths_do_not_exist: Option<Vec<String>>,
    /// Regex over repository labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_match: Option<String>,
    /// Regex over branch names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_match: Option<String>,
}
