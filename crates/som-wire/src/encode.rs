use som_model::{
    ArraySlot, DictKey, DictionarySlot, ItemSlot, MemberSlot, ObjectNode, ObjectSlot,
    ScalarValue, SequenceSlot, ValueSlot,
};
use som_schema::ScalarKind;

use crate::writer::BlobWriter;

pub(crate) const MAGIC: &[u8; 4] = b"SOMB";
pub(crate) const VERSION: u32 = 1;

/// Bit 0 of an item's flags byte: changed (value items) or changed-here
/// (object items and the container flags of sequences and dictionaries).
pub(crate) const FLAG_CHANGED: u8 = 0b0000_0001;
/// Bit 1 of an item's flags byte: a payload follows.
pub(crate) const FLAG_PRESENT: u8 = 0b0000_0010;

pub(crate) const KIND_BOOL: u8 = 1;
pub(crate) const KIND_INT32: u8 = 2;
pub(crate) const KIND_INT64: u8 = 3;
pub(crate) const KIND_FLOAT32: u8 = 4;
pub(crate) const KIND_FLOAT64: u8 = 5;
pub(crate) const KIND_STR: u8 = 6;
pub(crate) const KIND_BINARY: u8 = 7;
pub(crate) const KIND_ENUM: u8 = 8;

pub(crate) fn scalar_tag(kind: ScalarKind) -> u8 {
    match kind {
        ScalarKind::Bool => KIND_BOOL,
        ScalarKind::Int32 => KIND_INT32,
        ScalarKind::Int64 => KIND_INT64,
        ScalarKind::Float32 => KIND_FLOAT32,
        ScalarKind::Float64 => KIND_FLOAT64,
        ScalarKind::Str => KIND_STR,
        ScalarKind::Binary => KIND_BINARY,
        ScalarKind::Enum(_) => KIND_ENUM,
    }
}

/// Serialize the full recursive state of a graph, change flags included.
///
/// The layout is the version 1 blob: magic, version, root type id, body,
/// and a trailing CRC32 over everything before it. Decoding the result
/// against the same repository reconstructs the graph exactly.
pub fn to_binary(node: &ObjectNode) -> Vec<u8> {
    let mut w = BlobWriter::new();
    w.put_raw(MAGIC);
    w.put_u32(VERSION);
    w.put_u64(node.type_id().raw());
    encode_object(&mut w, node);
    let crc = crc32fast::hash(w.as_slice());
    w.put_u32(crc);
    w.into_inner()
}

fn encode_object(w: &mut BlobWriter, node: &ObjectNode) {
    w.put_varint(node.member_count() as u64);
    for (_, slot) in node.members() {
        encode_member(w, slot);
    }
}

fn encode_member(w: &mut BlobWriter, slot: &MemberSlot) {
    match slot {
        MemberSlot::Single(item) => encode_item(w, item),
        MemberSlot::Array(array) => encode_array(w, array),
        MemberSlot::Sequence(seq) => encode_sequence(w, seq),
        MemberSlot::Dictionary(dict) => encode_dictionary(w, dict),
    }
}

fn encode_array(w: &mut BlobWriter, array: &ArraySlot) {
    w.put_varint(array.len() as u64);
    for item in array.iter() {
        encode_item(w, item);
    }
}

fn encode_sequence(w: &mut BlobWriter, seq: &SequenceSlot) {
    w.put_u8(if seq.is_changed_here() { FLAG_CHANGED } else { 0 });
    w.put_varint(seq.len() as u64);
    for item in seq.iter() {
        encode_item(w, item);
    }
}

fn encode_dictionary(w: &mut BlobWriter, dict: &DictionarySlot) {
    w.put_u8(if dict.is_changed_here() { FLAG_CHANGED } else { 0 });
    w.put_varint(dict.len() as u64);
    for (key, item) in dict.iter() {
        encode_key(w, key);
        encode_item(w, item);
    }
}

fn encode_item(w: &mut BlobWriter, item: &ItemSlot) {
    match item {
        ItemSlot::Value(slot) => encode_value_slot(w, slot),
        ItemSlot::Object(slot) => encode_object_slot(w, slot),
    }
}

fn encode_value_slot(w: &mut BlobWriter, slot: &ValueSlot) {
    let mut flags = 0u8;
    if slot.is_changed() {
        flags |= FLAG_CHANGED;
    }
    if !slot.is_null() {
        flags |= FLAG_PRESENT;
    }
    w.put_u8(flags);
    if let Some(value) = slot.value() {
        w.put_u8(scalar_tag(slot.kind()));
        encode_scalar(w, value);
    }
}

fn encode_object_slot(w: &mut BlobWriter, slot: &ObjectSlot) {
    let mut flags = 0u8;
    if slot.is_changed_here() {
        flags |= FLAG_CHANGED;
    }
    if !slot.is_null() {
        flags |= FLAG_PRESENT;
    }
    w.put_u8(flags);
    if let Some(node) = slot.node() {
        w.put_u64(node.type_id().raw());
        encode_object(w, node);
    }
}

fn encode_scalar(w: &mut BlobWriter, value: &ScalarValue) {
    match value {
        ScalarValue::Bool(v) => w.put_u8(u8::from(*v)),
        ScalarValue::Int32(v) => w.put_i32(*v),
        ScalarValue::Int64(v) => w.put_i64(*v),
        ScalarValue::Float32(v) => w.put_f32(*v),
        ScalarValue::Float64(v) => w.put_f64(*v),
        ScalarValue::Str(s) => w.put_str(s),
        ScalarValue::Binary(b) => w.put_bytes(b),
        ScalarValue::Enum { enum_id, ordinal } => {
            w.put_u64(enum_id.raw());
            w.put_i32(*ordinal);
        }
    }
}

fn encode_key(w: &mut BlobWriter, key: &DictKey) {
    match key {
        DictKey::Int32(v) => {
            w.put_u8(KIND_INT32);
            w.put_i32(*v);
        }
        DictKey::Int64(v) => {
            w.put_u8(KIND_INT64);
            w.put_i64(*v);
        }
        DictKey::Str(s) => {
            w.put_u8(KIND_STR);
            w.put_str(s);
        }
        DictKey::Enum { enum_id, ordinal } => {
            w.put_u8(KIND_ENUM);
            w.put_u64(enum_id.raw());
            w.put_i32(*ordinal);
        }
    }
}
