//! Matrix and merge generators.
//!
//! A matrix takes the cross product of exactly two children. A merge joins
//! two or more children on `merge_keys`, the first child being the base.
//! Children are expanded one level down; composite children are narrowed
//! through [`crate::nested`].

use appset_model::{
    ApplicationSetNestedGenerator, GeneratorKind, MatrixGenerator, MergeGenerator,
    NestedGenerator,
};
use tracing::debug;

use crate::attrs::{self, BlockWriter, RawMap};
use crate::dispatch;
use crate::error::{GeneratorError, Result};
use crate::level::NestingLevel;
use crate::{leaf, nested, template, ExpandContext};

/// Children a matrix generator takes.
pub const MATRIX_CHILDREN: usize = 2;

/// Minimum children of a merge generator.
pub const MERGE_MIN_CHILDREN: usize = 2;

fn expand_children(
    raw: &RawMap,
    level: NestingLevel,
    ctx: &ExpandContext,
) -> Result<Vec<ApplicationSetNestedGenerator>> {
    let children = attrs::blocks(raw, "generator")?;
    let child_level = level.descend();
    children
        .into_iter()
        .map(|child| {
            let generator = dispatch::expand_generator(child, child_level, ctx)?;
            nested::into_nested(generator)
        })
        .collect()
}

/// Read a `matrix` block found at `level`.
///
/// # Errors
///
/// Returns [`GeneratorError::Arity`] unless there are exactly two children,
/// and any error from expanding them.
pub fn expand_matrix(
    raw: &RawMap,
    level: NestingLevel,
    ctx: &ExpandContext,
) -> Result<MatrixGenerator> {
    let got = attrs::blocks(raw, "generator")?.len();
    if got != MATRIX_CHILDREN {
        return Err(GeneratorError::Arity {
            kind: GeneratorKind::Matrix,
            expected: "exactly 2",
            got,
        });
    }
    debug!(level = level.get(), children = got, "Expanding matrix generator");

    Ok(MatrixGenerator {
        generators: expand_children(raw, level, ctx)?,
        template: template::expand_override(raw, &ctx.features)?,
    })
}

/// Read a `merge` block found at `level`.
///
/// # Errors
///
/// Returns [`GeneratorError::MissingMergeKeys`] if `merge_keys` is empty,
/// [`GeneratorError::Arity`] for fewer than two children, and any error from
/// expanding them.
pub fn expand_merge(
    raw: &RawMap,
    level: NestingLevel,
    ctx: &ExpandContext,
) -> Result<MergeGenerator> {
    let merge_keys = attrs::strings(raw, "merge_keys")?;
    if merge_keys.is_empty() {
        return Err(GeneratorError::MissingMergeKeys);
    }
    let got = attrs::blocks(raw, "generator")?.len();
    if got < MERGE_MIN_CHILDREN {
        return Err(GeneratorError::Arity {
            kind: GeneratorKind::Merge,
            expected: "at least 2",
            got,
        });
    }
    debug!(level = level.get(), children = got, "Expanding merge generator");

    Ok(MergeGenerator {
        generators: expand_children(raw, level, ctx)?,
        merge_keys,
        template: template::expand_override(raw, &ctx.features)?,
    })
}

fn flatten_child(child: &ApplicationSetNestedGenerator) -> Result<RawMap> {
    let (variant, selector) = child.clone().into_parts();
    let (kind, block) = match variant.ok_or(GeneratorError::NoKind)? {
        NestedGenerator::Leaf(leaf) => (leaf.kind(), leaf::flatten(&leaf)?),
        NestedGenerator::Matrix(blob) => {
            let matrix = nested::decode_matrix(&blob)?.into_matrix();
            (GeneratorKind::Matrix, flatten_matrix(&matrix)?)
        }
        NestedGenerator::Merge(blob) => {
            let merge = nested::decode_merge(&blob)?.into_merge();
            (GeneratorKind::Merge, flatten_merge(&merge)?)
        }
    };
    Ok(dispatch::generator_block(kind, block, selector.as_ref()))
}

fn flatten_children(children: &[ApplicationSetNestedGenerator]) -> Result<Vec<RawMap>> {
    children.iter().map(flatten_child).collect()
}

/// Write a `matrix` block.
///
/// # Errors
///
/// Returns [`GeneratorError::NestedDecode`] if a nested composite blob is
/// malformed, or any error from flattening a child.
pub fn flatten_matrix(matrix: &MatrixGenerator) -> Result<RawMap> {
    Ok(BlockWriter::new()
        .blocks("generator", flatten_children(&matrix.generators)?)
        .block(
            "template",
            template::flatten_override(matrix.template.as_ref()),
        )
        .build())
}

/// Write a `merge` block.
///
/// # Errors
///
/// Returns [`GeneratorError::NestedDecode`] if a nested composite blob is
/// malformed, or any error from flattening a child.
pub fn flatten_merge(merge: &MergeGenerator) -> Result<RawMap> {
    Ok(BlockWriter::new()
        .strings("merge_keys", &merge.merge_keys)
        .blocks("generator", flatten_children(&merge.generators)?)
        .block(
            "template",
            template::flatten_override(merge.template.as_ref()),
        )
        .build())
}
