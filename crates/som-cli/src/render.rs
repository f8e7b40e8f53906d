//! Diagnostic renderings of a decoded object graph.
//!
//! The text form is a two-space indented tree. A `*` after a value marks
//! its changed flag; a `!` after an object, sequence, or dictionary marks
//! the structural flag on the container itself. The JSON form carries the
//! same state as explicit `null`/`changed` fields and is stable enough to
//! feed to scripts.

use std::fmt::{self, Write as _};

use colored::Colorize;
use som_model::{DictKey, ItemSlot, MemberSlot, ObjectNode, ScalarValue};

/// Render the graph as an indented text tree with change markers.
pub fn to_text(node: &ObjectNode) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_root(&mut out, node);
    out
}

/// Render the graph as a JSON document with explicit flag fields.
pub fn to_json(node: &ObjectNode) -> serde_json::Value {
    node_json(node)
}

fn write_root(out: &mut String, node: &ObjectNode) -> fmt::Result {
    writeln!(out, "{}", node.class().name.cyan().bold())?;
    write_members(out, node, 1)
}

fn write_members(out: &mut String, node: &ObjectNode, depth: usize) -> fmt::Result {
    for (desc, slot) in node.members() {
        write_member(out, &desc.name, slot, depth)?;
    }
    Ok(())
}

fn write_member(out: &mut String, name: &str, slot: &MemberSlot, depth: usize) -> fmt::Result {
    let pad = "  ".repeat(depth);
    match slot {
        MemberSlot::Single(item) => write_item(out, name, item, depth),
        MemberSlot::Array(array) => {
            writeln!(out, "{pad}{name}:")?;
            for (index, item) in array.iter().enumerate() {
                write_item(out, &format!("[{index}]"), item, depth + 1)?;
            }
            Ok(())
        }
        MemberSlot::Sequence(seq) => {
            writeln!(
                out,
                "{pad}{name}: {}{}",
                count(seq.len(), "element", "elements"),
                structural(seq.is_changed_here())
            )?;
            for (index, item) in seq.iter().enumerate() {
                write_item(out, &format!("[{index}]"), item, depth + 1)?;
            }
            Ok(())
        }
        MemberSlot::Dictionary(dict) => {
            writeln!(
                out,
                "{pad}{name}: {}{}",
                count(dict.len(), "entry", "entries"),
                structural(dict.is_changed_here())
            )?;
            for (key, item) in dict.iter() {
                write_item(out, &format!("[{key}]"), item, depth + 1)?;
            }
            Ok(())
        }
    }
}

fn write_item(out: &mut String, label: &str, item: &ItemSlot, depth: usize) -> fmt::Result {
    let pad = "  ".repeat(depth);
    match item {
        ItemSlot::Value(slot) => writeln!(
            out,
            "{pad}{label}: {}{}",
            scalar_text(slot.value()),
            changed(slot.is_changed())
        ),
        ItemSlot::Object(slot) => match slot.node() {
            Some(node) => {
                writeln!(
                    out,
                    "{pad}{label}: {}{}",
                    node.class().name.cyan(),
                    structural(slot.is_changed_here())
                )?;
                write_members(out, node, depth + 1)
            }
            None => writeln!(
                out,
                "{pad}{label}: {}{}",
                "null".dimmed(),
                structural(slot.is_changed_here())
            ),
        },
    }
}

fn scalar_text(value: Option<&ScalarValue>) -> String {
    let Some(value) = value else {
        return "null".dimmed().to_string();
    };
    match value {
        ScalarValue::Bool(v) => v.to_string(),
        ScalarValue::Int32(v) => v.to_string(),
        ScalarValue::Int64(v) => v.to_string(),
        ScalarValue::Float32(v) => v.to_string(),
        ScalarValue::Float64(v) => v.to_string(),
        ScalarValue::Str(v) => format!("{v:?}"),
        ScalarValue::Binary(v) => binary_text(v),
        ScalarValue::Enum { ordinal, .. } => format!("#{ordinal}"),
    }
}

fn binary_text(bytes: &[u8]) -> String {
    if bytes.len() <= 16 {
        format!("0x{}", hex::encode(bytes))
    } else {
        format!("0x{}... ({} bytes)", hex::encode(&bytes[..16]), bytes.len())
    }
}

fn changed(flag: bool) -> String {
    if flag {
        format!(" {}", "*".yellow().bold())
    } else {
        String::new()
    }
}

fn structural(changed_here: bool) -> String {
    if changed_here {
        format!(" {}", "!".red().bold())
    } else {
        String::new()
    }
}

fn count(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("1 {one}")
    } else {
        format!("{n} {many}")
    }
}

fn node_json(node: &ObjectNode) -> serde_json::Value {
    let members: serde_json::Map<String, serde_json::Value> = node
        .members()
        .map(|(desc, slot)| (desc.name.clone(), member_json(slot)))
        .collect();
    serde_json::json!({
        "class": node.class().name,
        "type_id": node.type_id().to_hex(),
        "changed": node.is_changed(),
        "members": members,
    })
}

fn member_json(slot: &MemberSlot) -> serde_json::Value {
    match slot {
        MemberSlot::Single(item) => item_json(item),
        MemberSlot::Array(array) => serde_json::json!({
            "shape": "array",
            "items": array.iter().map(item_json).collect::<Vec<_>>(),
        }),
        MemberSlot::Sequence(seq) => serde_json::json!({
            "shape": "sequence",
            "changed_here": seq.is_changed_here(),
            "items": seq.iter().map(item_json).collect::<Vec<_>>(),
        }),
        MemberSlot::Dictionary(dict) => serde_json::json!({
            "shape": "dictionary",
            "changed_here": dict.is_changed_here(),
            "entries": dict
                .iter()
                .map(|(key, item)| serde_json::json!({
                    "key": key_json(key),
                    "item": item_json(item),
                }))
                .collect::<Vec<_>>(),
        }),
    }
}

fn item_json(item: &ItemSlot) -> serde_json::Value {
    match item {
        ItemSlot::Value(slot) => serde_json::json!({
            "null": slot.is_null(),
            "changed": slot.is_changed(),
            "value": slot.value().map(scalar_json),
        }),
        ItemSlot::Object(slot) => serde_json::json!({
            "null": slot.is_null(),
            "changed_here": slot.is_changed_here(),
            "node": slot.node().map(node_json),
        }),
    }
}

fn scalar_json(value: &ScalarValue) -> serde_json::Value {
    match value {
        ScalarValue::Bool(v) => serde_json::json!(v),
        ScalarValue::Int32(v) => serde_json::json!(v),
        ScalarValue::Int64(v) => serde_json::json!(v),
        ScalarValue::Float32(v) => float_json(f64::from(*v)),
        ScalarValue::Float64(v) => float_json(*v),
        ScalarValue::Str(v) => serde_json::json!(v),
        ScalarValue::Binary(v) => serde_json::json!(hex::encode(v)),
        ScalarValue::Enum { enum_id, ordinal } => serde_json::json!({
            "enum_id": enum_id.to_hex(),
            "ordinal": ordinal,
        }),
    }
}

/// JSON numbers cannot carry NaN or infinities; those fall back to text.
fn float_json(v: f64) -> serde_json::Value {
    match serde_json::Number::from_f64(v) {
        Some(n) => serde_json::Value::Number(n),
        None => serde_json::Value::String(v.to_string()),
    }
}

fn key_json(key: &DictKey) -> serde_json::Value {
    match key {
        DictKey::Int32(v) => serde_json::json!(v),
        DictKey::Int64(v) => serde_json::json!(v),
        DictKey::Str(v) => serde_json::json!(v),
        DictKey::Enum { enum_id, ordinal } => serde_json::json!({
            "enum_id": enum_id.to_hex(),
            "ordinal": ordinal,
        }),
    }
}
