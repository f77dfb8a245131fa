//! Git generator: parameter sets from directories or files in a repository.

use appset_model::{GitDirectoryGeneratorItem, GitFileGeneratorItem, GitGenerator};

use crate::attrs::{self, BlockWriter, RawMap};
use crate::error::Result;
use crate::{template, ExpandContext};

/// Read a `git` block.
///
/// # Errors
///
/// Returns an error if a field is malformed or `requeue_after_seconds` is
/// not an integer.
pub fn expand(raw: &RawMap, ctx: &ExpandContext) -> Result<GitGenerator> {
    let directories = attrs::blocks(raw, "directory")?
        .into_iter()
        .map(|dir| {
            Ok(GitDirectoryGeneratorItem {
                path: attrs::string(dir, "path")?,
                exclude: attrs::boolean(dir, "exclude")?,
            })
        })
        .collect::<Result<_>>()?;
    let files = attrs::blocks(raw, "file")?
        .into_iter()
        .map(|file| {
            Ok(GitFileGeneratorItem {
                path: attrs::string(file, "path")?,
            })
        })
        .collect::<Result<_>>()?;

    Ok(GitGenerator {
        repo_url: attrs::string(raw, "repo_url")?,
        directories,
        files,
        revision: attrs::string(raw, "revision")?,
        requeue_after_seconds: attrs::numeric_string(raw, "requeue_after_seconds")?,
        template: template::expand_override(raw, &ctx.features)?,
        path_param_prefix: attrs::string(raw, "path_param_prefix")?,
        values: attrs::string_map(raw, "values")?,
    })
}

/// Write a `git` block.
#[must_use]
pub fn flatten(generator: &GitGenerator) -> RawMap {
    let directories = generator
        .directories
        .iter()
        .map(|dir| {
            BlockWriter::new()
                .string("path", &dir.path)
                .boolean("exclude", dir.exclude)
                .build()
        })
        .collect();
    let files = generator
        .files
        .iter()
        .map(|file| BlockWriter::new().string("path", &file.path).build())
        .collect();

    BlockWriter::new()
        .string("repo_url", &generator.repo_url)
        .string("revision", &generator.revision)
        .string("path_param_prefix", &generator.path_param_prefix)
        .numeric_string("requeue_after_seconds", generator.requeue_after_seconds)
        .blocks("directory", directories)
        .blocks("file", files)
        .block(
            "template",
            template::flatten_override(generator.template.as_ref()),
        )
        .string_map("values", &generator.values)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn directories_with_exclusions() {
        let raw = json!({
            "repo_url": "https://github.com/argoproj/argo-cd.git",
            "revision": "HEAD",
            "directory": [
                {"path": "applicationset/examples/git-generator-directory/excludes/cluster-addons/*", "exclude": false},
                {"path": "applicationset/examples/git-generator-directory/excludes/cluster-addons/exclude-helm-guestbook", "exclude": true},
            ],
        });
        let generator = expand(raw.as_object().unwrap(), &ExpandContext::default()).unwrap();
        assert_eq!(generator.directories.len(), 2);
        assert!(generator.directories[1].exclude);
        assert!(generator.template.is_none());
        assert_eq!(Value::Object(flatten(&generator)), raw);
    }

    #[test]
    fn files_and_prefix() {
        let raw = json!({
            "repo_url": "https://example.com/config.git",
            "path_param_prefix": "cfg",
            "requeue_after_seconds": "30",
            "file": [{"path": "clusters/**/config.json"}],
        });
        let generator = expand(raw.as_object().unwrap(), &ExpandContext::default()).unwrap();
        assert_eq!(generator.files[0].path, "clusters/**/config.json");
        assert_eq!(generator.requeue_after_seconds, Some(30));
        assert_eq!(Value::Object(flatten(&generator)), raw);
    }
}
