//! Diagnostic text rendering for metadata buffers.
//!
//! Output grammar: one line per entry,
//! `name: type[count] = [v0, v1, ...]`, with the numeric identifier
//! standing in for unresolvable names. Purely derived and read-only;
//! nothing here mutates or can corrupt a buffer.

use std::fmt::Write;

use devmeta_common::{Result, TagId, TagValues};

use crate::buffer::{ItemView, MetadataBuffer};
use crate::registry::TagRegistry;

/// Renders the entry for `item` as a single diagnostic line.
pub fn dump_item(buffer: &MetadataBuffer, registry: &TagRegistry, item: TagId) -> Result<String> {
    let view = buffer.get(item)?;
    Ok(render_view(registry, &view))
}

/// Renders every live entry, one newline-terminated line each, in index
/// order.
pub fn dump_buffer(buffer: &MetadataBuffer, registry: &TagRegistry) -> String {
    let mut out = String::new();
    for view in buffer.iter() {
        let _ = writeln!(out, "{}", render_view(registry, &view));
    }
    out
}

fn render_view(registry: &TagRegistry, view: &ItemView) -> String {
    let name = registry
        .name_of(view.item)
        .map(str::to_string)
        .unwrap_or_else(|| view.item.to_string());
    format!(
        "{}: {}[{}] = {}",
        name,
        view.data_type,
        view.count,
        render_values(&view.values)
    )
}

fn render_values(values: &TagValues) -> String {
    fn join<T: std::fmt::Display>(items: &[T]) -> String {
        let rendered: Vec<String> = items.iter().map(|x| x.to_string()).collect();
        format!("[{}]", rendered.join(", "))
    }

    match values {
        TagValues::Byte(v) => join(v),
        TagValues::Int32(v) => join(v),
        TagValues::UInt32(v) => join(v),
        TagValues::Float(v) => join(v),
        TagValues::Int64(v) => join(v),
        TagValues::Double(v) => join(v),
        TagValues::Rational(v) => join(v),
    }
}
