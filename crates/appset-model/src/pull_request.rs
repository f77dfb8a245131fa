//! Pull request generator types.

use serde::{Deserialize, Serialize};

use crate::secret::{BasicAuthBitbucketServer, BearerTokenBitbucketCloud, SecretRef};
use crate::template::ApplicationSetTemplate;

/// Generates one parameter set per open pull request. Exactly one provider
/// field is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestGenerator {
    /// GitHub repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<PullRequestGeneratorGithub>,
    /// GitLab project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitlab: Option<PullRequestGeneratorGitlab>,
    /// Gitea repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitea: Option<PullRequestGeneratorGitea>,
    /// Bitbucket Server repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitbucket_server: Option<PullRequestGeneratorBitbucketServer>,
    /// Bitbucket Cloud repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitbucket: Option<PullRequestGeneratorBitbucket>,
    /// Azure DevOps repository.
    #[serde(default, rename = "azuredevops", skip_serializing_if = "Option::is_none")]
    pub azure_dev_ops: Option<PullRequestGeneratorAzureDevOps>,
    /// Pull request filters; a pull request passes if any filter matches.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<PullRequestGeneratorFilter>,
    /// Poll interval in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requeue_after_seconds: Option<i64>,
    /// Per-generator template override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<ApplicationSetTemplate>,
}

/// The provider variant of a [`PullRequestGenerator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestProvider {
    /// GitHub.
    Github(PullRequestGeneratorGithub),
    /// GitLab.
    Gitlab(PullRequestGeneratorGitlab),
    /// Gitea.
    Gitea(PullRequestGeneratorGitea),
    /// Bitbucket Cloud.
    BitbucketCloud(PullRequestGeneratorBitbucket),
    /// Bitbucket Server.
    BitbucketServer(PullRequestGeneratorBitbucketServer),
    /// Azure DevOps.
    AzureDevOps(PullRequestGeneratorAzureDevOps),
}

impl PullRequestGenerator {
    /// Set `provider` as the single populated provider field.
    pub fn set_provider(&mut self, provider: PullRequestProvider) {
        self.github = None;
        self.gitlab = None;
        self.gitea = None;
        self.bitbucket = None;
        self.bitbucket_server = None;
        self.azure_dev_ops = None;
        match provider {
            PullRequestProvider::Github(p) => self.github = Some(p),
            PullRequestProvider::Gitlab(p) => self.gitlab = Some(p),
            PullRequestProvider::Gitea(p) => self.gitea = Some(p),
            PullRequestProvider::BitbucketCloud(p) => self.bitbucket = Some(p),
            PullRequestProvider::BitbucketServer(p) => self.bitbucket_server = Some(p),
            PullRequestProvider::AzureDevOps(p) => self.azure_dev_ops = Some(p),
        }
    }

    /// The first populated provider field.
    #[must_use]
    pub fn provider(&self) -> Option<PullRequestProvider> {
        if let Some(p) = &self.github {
            return Some(PullRequestProvider::Github(p.clone()));
        }
        if let Some(p) = &self.gitlab {
            return Some(PullRequestProvider::Gitlab(p.clone()));
        }
        if let Some(p) = &self.gitea {
            return Some(PullRequestProvider::Gitea(p.clone()));
        }
        if let Some(p) = &self.bitbucket {
            return Some(PullRequestProvider::BitbucketCloud(p.clone()));
        }
        if let Some(p) = &self.bitbucket_server {
            return Some(PullRequestProvider::BitbucketServer(p.clone()));
        }
        self.azure_dev_ops
            .clone()
            .map(PullRequestProvider::AzureDevOps)
    }
}

/// GitHub repository source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestGeneratorGithub {
    /// Repository owner.
    #[serde(default)]
    pub owner: String,
    /// Repository name.
    #[serde(default)]
    pub repo: String,
    /// API URL for GitHub Enterprise.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api: String,
    /// Access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_ref: Option<SecretRef>,
    /// Secret holding GitHub App credentials.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub app_secret_name: String,
    /// Only pull requests carrying all these labels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// GitLab project source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestGeneratorGitlab {
    /// Project ID or path.
    #[serde(default)]
    pub project: String,
    /// API URL for self-hosted GitLab.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api: String,
    /// Access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_ref: Option<SecretRef>,
    /// Only merge requests carrying all these labels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Merge request state (`opened`, `merged`, ...).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pull_request_state: String,
    /// Skip TLS verification.
    #[serde(default)]
    pub insecure: bool,
}

/// Gitea repository source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestGeneratorGitea {
    /// Repository owner.
    #[serde(default)]
    pub owner: String,
    /// Repository name.
    #[serde(default)]
    pub repo: String,
    /// API URL.
    #[serde(default)]
    pub api: String,
    /// Access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_ref: Option<SecretRef>,
    /// Skip TLS verification.
    #[serde(default)]
    pub insecure: bool,
}

/// Bitbucket Server repository source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestGeneratorBitbucketServer {
    /// Project key.
    #[serde(default)]
    pub project: String,
    /// Repository slug.
    #[serde(default)]
    pub repo: String,
    /// API URL.
    #[serde(default)]
    pub api: String,
    /// Credentials for the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<BasicAuthBitbucketServer>,
}

/// Bitbucket Cloud repository source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestGeneratorBitbucket {
    /// Workspace.
    #[serde(default)]
    pub owner: String,
    /// Repository slug.
    #[serde(default)]
    pub repo: String,
    /// API URL.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api: String,
    /// App password credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<BasicAuthBitbucketServer>,
    /// Bearer token credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<BearerTokenBitbucketCloud>,
}

/// Azure DevOps repository source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestGeneratorAzureDevOps {
    /// Organisation name.
    #[serde(default)]
    pub organization: String,
    /// Project name.
    #[serde(default)]
    pub project: String,
    /// Repository name.
    #[serde(default)]
    pub repo: String,
    /// API URL.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api: String,
    /// Personal access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_ref: Option<SecretRef>,
    /// Only pull requests carrying all these labels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// A pull request filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestGeneratorFilter {
    /// Regex over the source branch name. `None` means no predicate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_match: Option<String>,
}
