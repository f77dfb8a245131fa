//! End-to-end expand/flatten scenarios over whole application-set specs.
//!
//! Each scenario expands a raw configuration, checks the wire tree, and
//! flattens it back into a fresh resource data document.

use appset_core::{FeatureSet, ServerVersion};
use appset_generators::nested;
use appset_generators::{
    expand_application_set, flatten_application_set, ExpandContext, GeneratorError, ResourceData,
};
use appset_model::ApplicationSetSpec;
use serde_json::{json, Value};

// =============================================================================
// Helpers
// =============================================================================

fn raw_spec(generators: Value) -> Value {
    json!({"spec": [{
        "generator": generators,
        "go_template": false,
        "template": [{
            "metadata": [{"name": "{{name}}-guestbook"}],
            "spec": [{
                "project": "default",
                "source": [{"repo_url": "https://github.com/argoproj/argocd-example-apps/", "path": "guestbook"}],
                "destination": [{"server": "{{server}}", "namespace": "guestbook"}],
            }],
        }],
    }]})
}

fn expand(root: &Value) -> ApplicationSetSpec {
    let data = ResourceData::new(root.clone());
    expand_application_set(&data, &ExpandContext::default()).unwrap()
}

fn flatten(spec: &ApplicationSetSpec) -> Value {
    let mut data = ResourceData::default();
    flatten_application_set(spec, &mut data).unwrap();
    data.into_inner()
}

/// Push a spec through its JSON wire form, as a server round trip would.
fn over_the_wire(spec: &ApplicationSetSpec) -> ApplicationSetSpec {
    let body = serde_json::to_string(spec).unwrap();
    serde_json::from_str(&body).unwrap()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn list_elements_round_trip() {
    let root = raw_spec(json!([{"list": [{"elements": [
        {"cluster": "dev", "url": "https://1.2.3.4"},
        {"cluster": "qa", "url": "https://2.4.6.8"},
    ]}]}]));

    let spec = expand(&root);
    let list = spec.generators[0].leaves.list.as_ref().unwrap();
    assert_eq!(list.elements.len(), 2);
    assert_eq!(list.elements[0].0, json!({"cluster": "dev", "url": "https://1.2.3.4"}));
    assert_eq!(list.elements[1].0, json!({"cluster": "qa", "url": "https://2.4.6.8"}));

    assert_eq!(flatten(&over_the_wire(&spec)), root);
}

#[test]
fn list_elements_with_different_keys() {
    let root = raw_spec(json!([{"list": [{"elements": [
        {"a": "1", "b": "2"},
        {"a": "3", "c": "4"},
    ]}]}]));
    assert_eq!(flatten(&expand(&root)), root);
}

#[test]
fn matrix_of_git_and_clusters() {
    let root = raw_spec(json!([{"matrix": [{"generator": [
        {"git": [{
            "repo_url": "r",
            "revision": "HEAD",
            "directory": [{"path": "a/*", "exclude": false}],
        }]},
        {"clusters": [{
            "enabled": true,
            "selector": [{"match_labels": {"env": "prod"}}],
        }]},
    ]}]}]));

    let spec = expand(&root);
    let matrix = spec.generators[0].matrix.as_ref().unwrap();
    assert_eq!(matrix.generators.len(), 2);
    let git = matrix.generators[0].leaves.git.as_ref().unwrap();
    assert_eq!(git.repo_url, "r");
    assert_eq!(git.revision, "HEAD");
    assert_eq!(git.directories[0].path, "a/*");
    let clusters = matrix.generators[1].leaves.clusters.as_ref().unwrap();
    assert_eq!(
        clusters.selector.match_labels.as_ref().unwrap()["env"],
        "prod"
    );

    assert_eq!(flatten(&over_the_wire(&spec)), root);
}

#[test]
fn merge_nested_inside_merge() {
    let root = raw_spec(json!([{"merge": [{
        "merge_keys": ["server"],
        "generator": [
            {"list": [{"elements": [{"server": "s1"}]}]},
            {"merge": [{
                "merge_keys": ["server"],
                "generator": [
                    {"clusters": [{"enabled": true}]},
                    {"clusters": [{
                        "enabled": true,
                        "selector": [{"match_labels": {"tier": "edge"}}],
                    }]},
                ],
            }]},
        ],
    }]}]));

    let spec = expand(&root);
    let outer = spec.generators[0].merge.as_ref().unwrap();
    assert_eq!(outer.merge_keys, vec!["server".to_string()]);
    assert_eq!(outer.generators.len(), 2);

    let blob = outer.generators[1].merge.as_ref().unwrap();
    let inner = nested::decode_merge(blob).unwrap();
    assert_eq!(inner.merge_keys, vec!["server".to_string()]);
    assert_eq!(inner.generators.len(), 2);
    assert!(inner.generators[1].leaves.clusters.is_some());

    assert_eq!(flatten(&over_the_wire(&spec)), root);
}

#[test]
fn nested_matrix_template_survives_server_round_trip() {
    let wire = json!({
        "generators": [{"merge": {
            "mergeKeys": ["server"],
            "generators": [
                {"clusters": {}},
                {"matrix": {
                    "generators": [
                        {"clusters": {}},
                        {"list": {"elements": [{"a": "b"}]}},
                    ],
                    "template": {"metadata": {"name": "inner"}},
                }},
            ],
        }}],
        "template": {"metadata": {"name": "outer"}},
    });
    let spec: ApplicationSetSpec = serde_json::from_value(wire).unwrap();

    let raw = flatten(&spec);
    let inner = &raw["spec"][0]["generator"][0]["merge"][0]["generator"][1]["matrix"][0];
    assert_eq!(inner["template"], json!([{"metadata": [{"name": "inner"}]}]));

    let again = expand(&raw);
    let blob = again.generators[0].merge.as_ref().unwrap().generators[1]
        .matrix
        .as_ref()
        .unwrap();
    let matrix = nested::decode_matrix(blob).unwrap();
    assert_eq!(matrix.template.unwrap().metadata.name, "inner");
    assert_eq!(flatten(&again), raw);
}

#[test]
fn scm_provider_reports_single_provider() {
    let root = raw_spec(json!([{"scm_provider": [{
        "github": [{
            "organization": "acme",
            "all_branches": false,
            "token_ref": [{"secret_name": "s", "key": "k"}],
        }],
    }]}]));

    let spec = expand(&root);
    let flattened = flatten(&over_the_wire(&spec));
    let scm = &flattened["spec"][0]["generator"][0]["scm_provider"][0];
    assert_eq!(scm["github"][0]["organization"], json!("acme"));
    assert_eq!(scm["github"][0]["token_ref"][0]["secret_name"], json!("s"));
    for sibling in ["gitlab", "gitea", "bitbucket_cloud", "bitbucket_server", "azure_devops"] {
        assert!(scm.get(sibling).is_none(), "{sibling} should be absent");
    }
    assert_eq!(flattened, root);
}

#[test]
fn multi_source_override_needs_newer_server() {
    let root = raw_spec(json!([{"git": [{
        "repo_url": "https://example.com/apps.git",
        "revision": "HEAD",
        "file": [{"path": "apps/*/config.json"}],
        "template": [{"spec": [{"source": [
            {"repo_url": "https://example.com/charts.git", "chart": "app"},
            {"repo_url": "https://example.com/values.git", "ref": "values"},
        ]}]}],
    }]}]));
    let data = ResourceData::new(root);

    let old = ExpandContext::new(FeatureSet::for_version(ServerVersion::new(2, 7, 9)));
    match expand_application_set(&data, &old) {
        Err(GeneratorError::Unsupported(err)) => {
            assert_eq!(
                err.to_string(),
                "multiple application sources is only supported from ArgoCD 2.8.0 onwards"
            );
        }
        other => panic!("expected unsupported feature, got {other:?}"),
    }

    let new = ExpandContext::new(FeatureSet::for_version(ServerVersion::new(2, 8, 0)));
    let spec = expand_application_set(&data, &new).unwrap();
    let git = spec.generators[0].leaves.git.as_ref().unwrap();
    assert_eq!(git.template.as_ref().unwrap().spec.sources.len(), 2);
}

#[test]
fn server_response_reaches_fixed_point() {
    // Shape returned by a server: camelCase, nested composite as a document.
    let wire = json!({
        "goTemplate": true,
        "goTemplateOptions": ["missingkey=error"],
        "generators": [{
            "matrix": {"generators": [
                {"git": {"repoURL": "https://example.com/apps.git", "revision": "HEAD", "directories": [{"path": "apps/*"}]}},
                {"merge": {
                    "generators": [
                        {"clusters": {}},
                        {"list": {"elements": [{"server": "https://kubernetes.default.svc", "replicas": 2}]}},
                    ],
                    "mergeKeys": ["server"],
                }},
            ]},
            "selector": {"matchLabels": {"env": "prod"}},
        }],
        "template": {
            "metadata": {"name": "{{.path.basename}}"},
            "spec": {
                "project": "default",
                "source": {},
                "destination": {"server": "{{.server}}", "namespace": "{{.path.basename}}"},
            },
        },
    });
    let spec: ApplicationSetSpec = serde_json::from_value(wire).unwrap();

    let first = flatten(&spec);
    assert!(first["spec"][0]["template"][0]["spec"][0]
        .get("source")
        .is_none());
    let second = flatten(&expand(&first));
    assert_eq!(first, second);
}
