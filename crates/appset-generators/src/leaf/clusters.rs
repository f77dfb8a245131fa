//! Clusters generator: one parameter set per registered cluster.

use appset_model::ClusterGenerator;

use crate::attrs::{self, BlockWriter, RawMap};
use crate::error::Result;
use crate::{selector, template, ExpandContext};

/// Read a `clusters` block.
///
/// The raw-only `enabled` flag exists so an otherwise empty block can be
/// written; it carries no meaning on the wire.
///
/// # Errors
///
/// Returns an error if a field is malformed.
pub fn expand(raw: &RawMap, ctx: &ExpandContext) -> Result<ClusterGenerator> {
    Ok(ClusterGenerator {
        selector: selector::expand(raw, "selector")?.unwrap_or_default(),
        template: template::expand_override(raw, &ctx.features)?,
        values: attrs::string_map(raw, "values")?,
    })
}

/// Write a `clusters` block.
#[must_use]
pub fn flatten(generator: &ClusterGenerator) -> RawMap {
    BlockWriter::new()
        .boolean("enabled", true)
        .block("selector", selector::flatten(Some(&generator.selector)))
        .block(
            "template",
            template::flatten_override(generator.template.as_ref()),
        )
        .string_map("values", &generator.values)
        .build()
}
