//! Pull request generator: one parameter set per open pull request.

use appset_model::{
    GeneratorKind, PullRequestGenerator, PullRequestGeneratorAzureDevOps,
    PullRequestGeneratorBitbucket, PullRequestGeneratorBitbucketServer,
    PullRequestGeneratorFilter, PullRequestGeneratorGitea, PullRequestGeneratorGithub,
    PullRequestGeneratorGitlab, PullRequestProvider,
};

use super::pick_provider;
use crate::attrs::{self, BlockWriter, RawMap};
use crate::error::Result;
use crate::{secret_ref, template, ExpandContext};

/// Read a `pull_request` block.
///
/// # Errors
///
/// Returns [`crate::GeneratorError::NoProvider`] if no provider block is
/// set, [`crate::GeneratorError::AmbiguousKind`] in strict mode if several
/// are, and field errors for malformed values.
pub fn expand(raw: &RawMap, ctx: &ExpandContext) -> Result<PullRequestGenerator> {
    let mut providers = Vec::new();
    if let Some(block) = attrs::block(raw, "github")? {
        providers.push(("github", PullRequestProvider::Github(github(block)?)));
    }
    if let Some(block) = attrs::block(raw, "gitlab")? {
        providers.push(("gitlab", PullRequestProvider::Gitlab(gitlab(block)?)));
    }
    if let Some(block) = attrs::block(raw, "gitea")? {
        providers.push(("gitea", PullRequestProvider::Gitea(gitea(block)?)));
    }
    if let Some(block) = attrs::block(raw, "bitbucket_cloud")? {
        providers.push((
            "bitbucket_cloud",
            PullRequestProvider::BitbucketCloud(bitbucket(block)?),
        ));
    }
    if let Some(block) = attrs::block(raw, "bitbucket_server")? {
        providers.push((
            "bitbucket_server",
            PullRequestProvider::BitbucketServer(bitbucket_server(block)?),
        ));
    }
    if let Some(block) = attrs::block(raw, "azure_devops")? {
        providers.push((
            "azure_devops",
            PullRequestProvider::AzureDevOps(azure_devops(block)?),
        ));
    }
    let provider = pick_provider(GeneratorKind::PullRequest, providers, ctx)?;

    let filters = attrs::blocks(raw, "filter")?
        .into_iter()
        .map(|filter| {
            Ok(PullRequestGeneratorFilter {
                branch_match: attrs::opt_string(filter, "branch_match")?,
            })
        })
        .collect::<Result<_>>()?;

    let mut generator = PullRequestGenerator {
        filters,
        requeue_after_seconds: attrs::numeric_string(raw, "requeue_after_seconds")?,
        template: template::expand_override(raw, &ctx.features)?,
        ..Default::default()
    };
    generator.set_provider(provider);
    Ok(generator)
}

fn github(raw: &RawMap) -> Result<PullRequestGeneratorGithub> {
    Ok(PullRequestGeneratorGithub {
        owner: attrs::string(raw, "owner")?,
        repo: attrs::string(raw, "repo")?,
        api: attrs::string(raw, "api")?,
        token_ref: secret_ref::expand(raw, "token_ref")?,
        app_secret_name: attrs::string(raw, "app_secret_name")?,
        labels: attrs::strings(raw, "labels")?,
    })
}

fn gitlab(raw: &RawMap) -> Result<PullRequestGeneratorGitlab> {
    Ok(PullRequestGeneratorGitlab {
        project: attrs::string(raw, "project")?,
        api: attrs::string(raw, "api")?,
        token_ref: secret_ref::expand(raw, "token_ref")?,
        labels: attrs::strings(raw, "labels")?,
        pull_request_state: attrs::string(raw, "pull_request_state")?,
        insecure: attrs::boolean(raw, "insecure")?,
    })
}

fn gitea(raw: &RawMap) -> Result<PullRequestGeneratorGitea> {
    Ok(PullRequestGeneratorGitea {
        owner: attrs::string(raw, "owner")?,
        repo: attrs::string(raw, "repo")?,
        api: attrs::string(raw, "api")?,
        token_ref: secret_ref::expand(raw, "token_ref")?,
        insecure: attrs::boolean(raw, "insecure")?,
    })
}

fn bitbucket(raw: &RawMap) -> Result<PullRequestGeneratorBitbucket> {
    Ok(PullRequestGeneratorBitbucket {
        owner: attrs::string(raw, "owner")?,
        repo: attrs::string(raw, "repo")?,
        api: attrs::string(raw, "api")?,
        basic_auth: secret_ref::expand_basic_auth(raw, "basic_auth")?,
        bearer_token: secret_ref::expand_bearer_token(raw, "bearer_token")?,
    })
}

fn bitbucket_server(raw: &RawMap) -> Result<PullRequestGeneratorBitbucketServer> {
    Ok(PullRequestGeneratorBitbucketServer {
        project: attrs::string(raw, "project")?,
        repo: attrs::string(raw, "repo")?,
        api: attrs::string(raw, "api")?,
        basic_auth: secret_ref::expand_basic_auth(raw, "basic_auth")?,
    })
}

fn azure_devops(raw: &RawMap) -> Result<PullRequestGeneratorAzureDevOps> {
    Ok(PullRequestGeneratorAzureDevOps {
        organization: attrs::string(raw, "organization")?,
        project: attrs::string(raw, "project")?,
        repo: attrs::string(raw, "repo")?,
        api: attrs::string(raw, "api")?,
        token_ref: secret_ref::expand(raw, "token_ref")?,
        labels: attrs::strings(raw, "labels")?,
    })
}

/// Write a `pull_request` block. Only the first populated provider is
/// written.
#[must_use]
pub fn flatten(generator: &PullRequestGenerator) -> RawMap {
    let filters = generator
        .filters
        .iter()
        .map(|filter| {
            BlockWriter::new()
                .opt_string("branch_match", filter.branch_match.as_deref())
                .build()
        })
        .collect();

    let writer = BlockWriter::new()
        .numeric_string("requeue_after_seconds", generator.requeue_after_seconds)
        .blocks("filter", filters)
        .block(
            "template",
            template::flatten_override(generator.template.as_ref()),
        );

    match generator.provider() {
        Some(provider) => {
            let (key, block) = flatten_provider(&provider);
            writer.block(key, Some(block)).build()
        }
        None => writer.build(),
    }
}

fn flatten_provider(provider: &PullRequestProvider) -> (&'static str, RawMap) {
    match provider {
        PullRequestProvider::Github(p) => (
            "github",
            BlockWriter::new()
                .string("owner", &p.owner)
                .string("repo", &p.repo)
                .string("api", &p.api)
                .string("app_secret_name", &p.app_secret_name)
                .strings("labels", &p.labels)
                .block("token_ref", secret_ref::flatten(p.token_ref.as_ref()))
                .build(),
        ),
        PullRequestProvider::Gitlab(p) => (
            "gitlab",
            BlockWriter::new()
                .string("project", &p.project)
                .string("api", &p.api)
                .strings("labels", &p.labels)
                .string("pull_request_state", &p.pull_request_state)
                .boolean("insecure", p.insecure)
                .block("token_ref", secret_ref::flatten(p.token_ref.as_ref()))
                .build(),
        ),
        PullRequestProvider::Gitea(p) => (
            "gitea",
            BlockWriter::new()
                .string("owner", &p.owner)
                .string("repo", &p.repo)
                .string("api", &p.api)
                .boolean("insecure", p.insecure)
                .block("token_ref", secret_ref::flatten(p.token_ref.as_ref()))
                .build(),
        ),
        PullRequestProvider::BitbucketCloud(p) => (
            "bitbucket_cloud",
            BlockWriter::new()
                .string("owner", &p.owner)
                .string("repo", &p.repo)
                .string("api", &p.api)
                .block(
                    "basic_auth",
                    secret_ref::flatten_basic_auth(p.basic_auth.as_ref()),
                )
                .block(
                    "bearer_token",
                    secret_ref::flatten_bearer_token(p.bearer_token.as_ref()),
                )
                .build(),
        ),
        PullRequestProvider::BitbucketServer(p) => (
            "bitbucket_server",
            BlockWriter::new()
                .string("project", &p.project)
                .string("repo", &p.repo)
                .string("api", &p.api)
                .block(
                    "basic_auth",
                    secret_ref::flatten_basic_auth(p.basic_auth.as_ref()),
                )
                .build(),
        ),
        PullRequestProvider::AzureDevOps(p) => (
            "azure_devops",
            BlockWriter::new()
                .string("organization", &p.organization)
                .string("project", &p.project)
                .string("repo", &p.repo)
                .string("api", &p.api)
                .strings("labels", &p.labels)
                .block("token_ref", secret_ref::flatten(p.token_ref.as_ref()))
                .build(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appset_model::SecretRef;
    use serde_json::{json, Value};

    #[test]
    fn bitbucket_server_with_basic_auth() {
        let raw = json!({
            "requeue_after_seconds": "1800",
            "bitbucket_server": [{
                "project": "myproject",
                "repo": "myrepository",
                "api": "https://mycompany.bitbucket.org",
                "basic_auth": [{
                    "username": "myuser",
                    "password_ref": [{"secret_name": "mypassword", "key": "password"}],
                }],
            }],
            "filter": [{"branch_match": ".*-argocd"}],
        });
        let generator = expand(raw.as_object().unwrap(), &ExpandContext::default()).unwrap();
        let server = generator.bitbucket_server.as_ref().unwrap();
        assert_eq!(
            server.basic_auth.as_ref().unwrap().password_ref,
            Some(SecretRef::new("mypassword", "password"))
        );
        assert_eq!(generator.requeue_after_seconds, Some(1800));
        assert_eq!(Value::Object(flatten(&generator)), raw);
    }

    #[test]
    fn azure_devops_wire_name() {
        let raw = json!({"azure_devops": [{
            "organization": "myorg",
            "project": "proj",
            "repo": "repo",
            "labels": ["preview"],
        }]});
        let generator = expand(raw.as_object().unwrap(), &ExpandContext::default()).unwrap();
        let wire = serde_json::to_value(&generator).unwrap();
        assert_eq!(wire["azuredevops"]["organization"], json!("myorg"));
        assert_eq!(Value::Object(flatten(&generator)), raw);
    }
}
