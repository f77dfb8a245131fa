//! JSON bridge for composites nested inside composites.
//!
//! The server has no typed field for a matrix or merge generator inside
//! another composite. The inner composite travels as a JSON document of its
//! [`NestedMatrixGenerator`] or [`NestedMergeGenerator`] form instead. Its
//! own children are restricted to leaf kinds; its template override travels
//! inside the document.

use appset_model::k8s::JSON;
use appset_model::{
    ApplicationSetGenerator, ApplicationSetNestedGenerator, Generator, GeneratorKind,
    MatrixGenerator, MergeGenerator, NestedGenerator, NestedMatrixGenerator, NestedMergeGenerator,
};
use serde::Deserialize;
use tracing::debug;

use crate::error::{GeneratorError, Result};

/// Narrow an expanded generator into the child form of a composite.
///
/// Leaves move across unchanged. Composites are encoded into JSON blobs.
///
/// # Errors
///
/// - [`GeneratorError::Model`] if a composite has a composite child
/// - [`GeneratorError::NestedEncode`] if encoding fails
pub fn into_nested(generator: ApplicationSetGenerator) -> Result<ApplicationSetNestedGenerator> {
    let (variant, selector) = generator.into_parts();
    let nested = match variant.ok_or(GeneratorError::NoKind)? {
        Generator::Leaf(leaf) => NestedGenerator::Leaf(leaf),
        Generator::Matrix(matrix) => NestedGenerator::Matrix(encode_matrix(matrix)?),
        Generator::Merge(merge) => NestedGenerator::Merge(encode_merge(merge)?),
    };
    Ok(ApplicationSetNestedGenerator::from(nested).with_selector(selector))
}

fn encode<T: serde::Serialize>(kind: GeneratorKind, nested: &T, children: usize) -> Result<JSON> {
    let value = serde_json::to_value(nested)
        .map_err(|source| GeneratorError::NestedEncode { kind, source })?;
    debug!(kind = %kind, children, "Encoded nested generator");
    Ok(JSON(value))
}

/// Encode a matrix generator as a nested blob.
///
/// # Errors
///
/// See [`into_nested`].
pub fn encode_matrix(matrix: MatrixGenerator) -> Result<JSON> {
    let nested = NestedMatrixGenerator::from_matrix(matrix)?;
    encode(GeneratorKind::Matrix, &nested, nested.generators.len())
}

/// Encode a merge generator as a nested blob.
///
/// # Errors
///
/// See [`into_nested`].
pub fn encode_merge(merge: MergeGenerator) -> Result<JSON> {
    let nested = NestedMergeGenerator::from_merge(merge)?;
    encode(GeneratorKind::Merge, &nested, nested.generators.len())
}

/// Decode a nested matrix blob.
///
/// # Errors
///
/// Returns [`GeneratorError::NestedDecode`] if the blob does not describe a
/// nested matrix generator.
pub fn decode_matrix(blob: &JSON) -> Result<NestedMatrixGenerator> {
    let nested = NestedMatrixGenerator::deserialize(&blob.0).map_err(|source| {
        GeneratorError::NestedDecode {
            kind: GeneratorKind::Matrix,
            source,
        }
    })?;
    debug!(
        kind = %GeneratorKind::Matrix,
        children = nested.generators.len(),
        "Decoded nested generator"
    );
    Ok(nested)
}

/// Decode a nested merge blob.
///
/// # Errors
///
/// Returns [`GeneratorError::NestedDecode`] if the blob does not describe a
/// nested merge generator.
pub fn decode_merge(blob: &JSON) -> Result<NestedMergeGenerator> {
    let nested = NestedMergeGenerator::deserialize(&blob.0).map_err(|source| {
        GeneratorError::NestedDecode {
            kind: GeneratorKind::Merge,
            source,
        }
    })?;
    debug!(
        kind = %GeneratorKind::Merge,
        children = nested.generators.len(),
        "Decoded nested generator"
    );
    Ok(nested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use appset_model::{
        ApplicationSetTemplate, ClusterGenerator, GitGenerator, LeafGenerator, ListGenerator,
    };
    use serde_json::json;

    fn leaf(leaf: LeafGenerator) -> ApplicationSetNestedGenerator {
        ApplicationSetNestedGenerator::from(NestedGenerator::Leaf(leaf))
    }

    fn matrix() -> MatrixGenerator {
        MatrixGenerator {
            generators: vec![
                leaf(LeafGenerator::Clusters(ClusterGenerator::default())),
                leaf(LeafGenerator::Git(GitGenerator {
                    repo_url: "https://example.com/apps.git".to_string(),
                    ..Default::default()
                })),
            ],
            template: None,
        }
    }

    #[test]
    fn matrix_blob_uses_wire_names() {
        let blob = encode_matrix(matrix()).unwrap();
        assert_eq!(
            blob.0,
            json!({"generators": [
                {"clusters": {"selector": {}}},
                {"git": {"repoURL": "https://example.com/apps.git", "revision": ""}},
            ]})
        );
        let decoded = decode_matrix(&blob).unwrap().into_matrix();
        assert_eq!(decoded, matrix());
    }

    #[test]
    fn merge_blob_keeps_keys() {
        let merge = MergeGenerator {
            generators: matrix().generators,
            merge_keys: vec!["server".to_string()],
            template: None,
        };
        let blob = encode_merge(merge.clone()).unwrap();
        assert_eq!(blob.0["mergeKeys"], json!(["server"]));
        assert_eq!(decode_merge(&blob).unwrap().into_merge(), merge);
    }

    #[test]
    fn template_override_travels_in_blob() {
        let mut matrix = matrix();
        let mut template = ApplicationSetTemplate::default();
        template.metadata.name = "{{name}}-inner".to_string();
        matrix.template = Some(template);

        let blob = encode_matrix(matrix.clone()).unwrap();
        assert_eq!(
            blob.0["template"]["metadata"]["name"],
            json!("{{name}}-inner")
        );
        assert_eq!(decode_matrix(&blob).unwrap().into_matrix(), matrix);
    }

    #[test]
    fn composite_grandchild_is_rejected() {
        let mut outer = matrix();
        outer.generators[0] = ApplicationSetNestedGenerator::from(NestedGenerator::Matrix(JSON(
            json!({"generators": []}),
        )));
        assert!(matches!(
            encode_matrix(outer),
            Err(GeneratorError::Model(_))
        ));
    }

    #[test]
    fn malformed_blob() {
        let err = decode_matrix(&JSON(json!({"generators": "nope"}))).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("failed to unmarshal nested matrix generator"));

        let err = decode_merge(&JSON(json!("merge"))).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("failed to unmarshal nested merge generator"));
    }

    #[test]
    fn leaves_pass_through() {
        let generator = ApplicationSetGenerator::from(Generator::Leaf(LeafGenerator::List(
            ListGenerator::default(),
        )));
        let nested = into_nested(generator).unwrap();
        assert!(nested.leaves.list.is_some());
        assert!(nested.composite_kind().is_none());
    }
}
