//! SCM provider generator: one parameter set per repository of an
//! organisation on a source control host.

use appset_model::{
    GeneratorKind, ScmProvider, ScmProviderGenerator, ScmProviderGeneratorAzureDevOps,
    ScmProviderGeneratorBitbucket, ScmProviderGeneratorBitbucketServer, ScmProviderGeneratorFilter,
    ScmProviderGeneratorGitea, ScmProviderGeneratorGithub, ScmProviderGeneratorGitlab,
};

use super::pick_provider;
use crate::attrs::{self, BlockWriter, RawMap};
use crate::error::Result;
use crate::{secret_ref, template, ExpandContext};

/// Read a `scm_provider` block.
///
/// # Errors
///
/// Returns [`crate::GeneratorError::NoProvider`] if no provider block is
/// set, [`crate::GeneratorError::AmbiguousKind`] in strict mode if several
/// are, and field errors for malformed values.
pub fn expand(raw: &RawMap, ctx: &ExpandContext) -> Result<ScmProviderGenerator> {
    let mut providers = Vec::new();
    if let Some(block) = attrs::block(raw, "github")? {
        providers.push(("github", ScmProvider::Github(github(block)?)));
    }
    if let Some(block) = attrs::block(raw, "gitlab")? {
        providers.push(("gitlab", ScmProvider::Gitlab(gitlab(block)?)));
    }
    if let Some(block) = attrs::block(raw, "gitea")? {
        providers.push(("gitea", ScmProvider::Gitea(gitea(block)?)));
    }
    if let Some(block) = attrs::block(raw, "bitbucket_cloud")? {
        providers.push(("bitbucket_cloud", ScmProvider::BitbucketCloud(bitbucket(block)?)));
    }
    if let Some(block) = attrs::block(raw, "bitbucket_server")? {
        providers.push((
            "bitbucket_server",
            ScmProvider::BitbucketServer(bitbucket_server(block)?),
        ));
    }
    if let Some(block) = attrs::block(raw, "azure_devops")? {
        providers.push(("azure_devops", ScmProvider::AzureDevOps(azure_devops(block)?)));
    }
    let provider = pick_provider(GeneratorKind::ScmProvider, providers, ctx)?;

    let filters = attrs::blocks(raw, "filter")?
        .into_iter()
        .map(|filter| {
            Ok(ScmProviderGeneratorFilter {
                repository_match: attrs::opt_string(filter, "repository_match")?,
                paths_exist: attrs::opt_strings(filter, "paths_exist")?,
                paths_do_not_exist: attrs::opt_strings(filter, "paths_do_not_exist")?,
                label_match: attrs::opt_string(filter, "label_match")?,
                branch_match: attrs::opt_string(filter, "branch_match")?,
            })
        })
        .collect::<Result<_>>()?;

    let mut generator = ScmProviderGenerator {
        filters,
        clone_protocol: attrs::string(raw, "clone_protocol")?,
        requeue_after_seconds: attrs::numeric_string(raw, "requeue_after_seconds")?,
        template: template::expand_override(raw, &ctx.features)?,
        values: attrs::string_map(raw, "values")?,
        ..Default::default()
    };
    generator.set_provider(provider);
    Ok(generator)
}

fn github(raw: &RawMap) -> Result<ScmProviderGeneratorGithub> {
    Ok(ScmProviderGeneratorGithub {
        organization: attrs::string(raw, "organization")?,
        api: attrs::string(raw, "api")?,
        token_ref: secret_ref::expand(raw, "token_ref")?,
        app_secret_name: attrs::string(raw, "app_secret_name")?,
        all_branches: attrs::boolean(raw, "all_branches")?,
    })
}

fn gitlab(raw: &RawMap) -> Result<ScmProviderGeneratorGitlab> {
    Ok(ScmProviderGeneratorGitlab {
        group: attrs::string(raw, "group")?,
        include_subgroups: attrs::boolean(raw, "include_subgroups")?,
        api: attrs::string(raw, "api")?,
        token_ref: secret_ref::expand(raw, "token_ref")?,
        all_branches: attrs::boolean(raw, "all_branches")?,
        insecure: attrs::boolean(raw, "insecure")?,
    })
}

fn gitea(raw: &RawMap) -> Result<ScmProviderGeneratorGitea> {
    Ok(ScmProviderGeneratorGitea {
        owner: attrs::string(raw, "owner")?,
        api: attrs::string(raw, "api")?,
        token_ref: secret_ref::expand(raw, "token_ref")?,
        all_branches: attrs::boolean(raw, "all_branches")?,
        insecure: attrs::boolean(raw, "insecure")?,
    })
}

fn bitbucket(raw: &RawMap) -> Result<ScmProviderGeneratorBitbucket> {
    Ok(ScmProviderGeneratorBitbucket {
        owner: attrs::string(raw, "owner")?,
        user: attrs::string(raw, "user")?,
        app_password_ref: secret_ref::expand(raw, "app_password_ref")?,
        all_branches: attrs::boolean(raw, "all_branches")?,
    })
}

fn bitbucket_server(raw: &RawMap) -> Result<ScmProviderGeneratorBitbucketServer> {
    Ok(ScmProviderGeneratorBitbucketServer {
        project: attrs::string(raw, "project")?,
        api: attrs::string(raw, "api")?,
        basic_auth: secret_ref::expand_basic_auth(raw, "basic_auth")?,
        all_branches: attrs::boolean(raw, "all_branches")?,
    })
}

fn azure_devops(raw: &RawMap) -> Result<ScmProviderGeneratorAzureDevOps> {
    Ok(ScmProviderGeneratorAzureDevOps {
        organization: attrs::string(raw, "organization")?,
        api: attrs::string(raw, "api")?,
        team_project: attrs::string(raw, "team_project")?,
        access_token_ref: secret_ref::expand(raw, "access_token_ref")?,
        all_branches: attrs::boolean(raw, "all_branches")?,
    })
}

/// Write a `scm_provider` block. Only the first populated provider is
/// written.
#[must_use]
pub fn flatten(generator: &ScmProviderGenerator) -> RawMap {
    let filters = generator
        .filters
        .iter()
        .map(|filter| {
            BlockWriter::new()
                .opt_string("repository_match", filter.repository_match.as_deref())
                .opt_strings("paths_exist", filter.paths_exist.as_deref())
                .opt_strings("paths_do_not_exist", filter.paths_do_not_exist.as_deref())
                .opt_string("label_match", filter.label_match.as_deref())
                .opt_string("branch_match", filter.branch_match.as_deref())
                .build()
        })
        .collect();

    let writer = BlockWriter::new()
        .string("clone_protocol", &generator.clone_protocol)
        .numeric_string("requeue_after_seconds", generator.requeue_after_seconds)
        .blocks("filter", filters)
        .block(
            "template",
            template::flatten_override(generator.template.as_ref()),
        )
        .string_map("values", &generator.values);

    match generator.provider() {
        Some(provider) => {
            let (key, block) = flatten_provider(&provider);
            writer.block(key, Some(block)).build()
        }
        None => writer.build(),
    }
}

fn flatten_provider(provider: &ScmProvider) -> (&'static str, RawMap) {
    match provider {
        ScmProvider::Github(p) => (
            "github",
            BlockWriter::new()
                .string("organization", &p.organization)
                .string("api", &p.api)
                .string("app_secret_name", &p.app_secret_name)
                .boolean("all_branches", p.all_branches)
                .block("token_ref", secret_ref::flatten(p.token_ref.as_ref()))
                .build(),
        ),
        ScmProvider::Gitlab(p) => (
            "gitlab",
            BlockWriter::new()
                .string("group", &p.group)
                .string("api", &p.api)
                .boolean("include_subgroups", p.include_subgroups)
                .boolean("all_branches", p.all_branches)
                .boolean("insecure", p.insecure)
                .block("token_ref", secret_ref::flatten(p.token_ref.as_ref()))
                .build(),
        ),
        ScmProvider::Gitea(p) => (
            "gitea",
            BlockWriter::new()
                .string("owner", &p.owner)
                .string("api", &p.api)
                .boolean("all_branches", p.all_branches)
                .boolean("insecure", p.insecure)
                .block("token_ref", secret_ref::flatten(p.token_ref.as_ref()))
                .build(),
        ),
        ScmProvider::BitbucketCloud(p) => (
            "bitbucket_cloud",
            BlockWriter::new()
                .string("owner", &p.owner)
                .string("user", &p.user)
                .boolean("all_branches", p.all_branches)
                .block(
                    "app_password_ref",
                    secret_ref::flatten(p.app_password_ref.as_ref()),
                )
                .build(),
        ),
        ScmProvider::BitbucketServer(p) => (
            "bitbucket_server",
            BlockWriter::new()
                .string("project", &p.project)
                .string("api", &p.api)
                .boolean("all_branches", p.all_branches)
                .block(
                    "basic_auth",
                    secret_ref::flatten_basic_auth(p.basic_auth.as_ref()),
                )
                .build(),
        ),
        ScmProvider::AzureDevOps(p) => (
            "azure_devops",
            BlockWriter::new()
                .string("organization", &p.organization)
                .string("team_project", &p.team_project)
                .string("api", &p.api)
                .boolean("all_branches", p.all_branches)
                .block(
                    "access_token_ref",
                    secret_ref::flatten(p.access_token_ref.as_ref()),
                )
                .build(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeneratorError;
    use appset_model::SecretRef;
    use serde_json::{json, Value};

    #[test]
    fn github_provider_only() {
        let raw = json!({
            "github": [{
                "organization": "myorg",
                "all_branches": true,
                "token_ref": [{"secret_name": "github-token", "key": "token"}],
            }],
        });
        let generator = expand(raw.as_object().unwrap(), &ExpandContext::default()).unwrap();
        let github = generator.github.as_ref().unwrap();
        assert_eq!(github.organization, "myorg");
        assert_eq!(
            github.token_ref,
            Some(SecretRef::new("github-token", "token"))
        );
        assert!(generator.gitlab.is_none());
        assert!(generator.azure_dev_ops.is_none());

        let block = flatten(&generator);
        assert!(block.contains_key("github"));
        for key in ["gitlab", "gitea", "bitbucket_cloud", "bitbucket_server", "azure_devops"] {
            assert!(!block.contains_key(key), "{key} should be absent");
        }
        assert_eq!(Value::Object(block), raw);
    }

    #[test]
    fn filters_keep_empty_predicates() {
        let raw = json!({
            "gitea": [{"owner": "infra", "api": "https://gitea.example.com", "all_branches": false, "insecure": true}],
            "filter": [
                {"repository_match": "^app-", "paths_exist": ["kustomization.yaml"]},
                {"branch_match": "", "paths_do_not_exist": []},
            ],
        });
        let generator = expand(raw.as_object().unwrap(), &ExpandContext::default()).unwrap();
        assert_eq!(generator.filters.len(), 2);
        assert_eq!(generator.filters[1].branch_match, Some(String::new()));
        assert_eq!(generator.filters[1].paths_do_not_exist, Some(Vec::new()));
        assert_eq!(generator.filters[1].repository_match, None);
        assert_eq!(Value::Object(flatten(&generator)), raw);
    }

    #[test]
    fn missing_provider() {
        let raw = json!({"clone_protocol": "ssh"});
        assert!(matches!(
            expand(raw.as_object().unwrap(), &ExpandContext::default()),
            Err(GeneratorError::NoProvider {
                generator: GeneratorKind::ScmProvider
            })
        ));
    }

    #[test]
    fn several_providers() {
        let raw = json!({
            "github": [{"organization": "a"}],
            "gitlab": [{"group": "b"}],
        });
        let lenient = expand(raw.as_object().unwrap(), &ExpandContext::default()).unwrap();
        assert!(lenient.github.is_some());
        assert!(lenient.gitlab.is_none());

        let strict = ExpandContext::default().with_strict(true);
        match expand(raw.as_object().unwrap(), &strict) {
            Err(GeneratorError::AmbiguousKind { populated, .. }) => {
                assert_eq!(populated, "github, gitlab");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
