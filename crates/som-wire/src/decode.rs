use std::sync::Arc;

use som_model::{
    ArraySlot, DictKey, DictionarySlot, ItemSlot, MemberSlot, ObjectNode, ObjectSlot,
    ScalarValue, SequenceSlot, ValueSlot,
};
use som_schema::{
    ClassDescriptor, Collection, ElementType, KeyKind, MemberDescriptor, Repository, ScalarKind,
    TypeId,
};

use crate::encode::{
    scalar_tag, FLAG_CHANGED, FLAG_PRESENT, KIND_ENUM, KIND_INT32, KIND_INT64, KIND_STR,
    MAGIC, VERSION,
};
use crate::error::{WireError, WireResult};
use crate::reader::BlobReader;

// Header (magic + version + type id) plus the CRC trailer.
const MIN_BLOB_LEN: usize = 4 + 4 + 8 + 4;

/// Rebuild a graph from a version 1 blob.
///
/// The repository must contain the root class and every class reachable
/// from it. Kind tags and nested type ids in the blob are checked against
/// the schema, so decoding with a different schema than the encoder's
/// surfaces as corruption rather than misread values.
pub fn from_binary(repo: &Repository, bytes: &[u8]) -> WireResult<ObjectNode> {
    check_header(bytes)?;
    if bytes.len() < MIN_BLOB_LEN {
        return Err(WireError::Truncated {
            offset: bytes.len() as u64,
        });
    }
    let (payload, trailer) = bytes.split_at(bytes.len() - 4);
    let mut crc = [0u8; 4];
    crc.copy_from_slice(trailer);
    if crc32fast::hash(payload) != u32::from_be_bytes(crc) {
        return Err(WireError::ChecksumMismatch);
    }

    let mut r = BlobReader::new(payload);
    r.read_exact(4)?;
    r.read_u32()?;
    let type_id = TypeId::from_raw(r.read_u64()?);
    let class = repo
        .class(type_id)
        .ok_or(WireError::UnknownType(type_id))?
        .clone();
    let node = decode_object(repo, &mut r, class)?;
    if !r.is_at_end() {
        return Err(r.corrupt("trailing bytes after body"));
    }
    Ok(node)
}

/// Read the root type id from a blob header without decoding the body.
pub fn peek_type_id(bytes: &[u8]) -> WireResult<TypeId> {
    check_header(bytes)?;
    if bytes.len() < 16 {
        return Err(WireError::Truncated {
            offset: bytes.len() as u64,
        });
    }
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[8..16]);
    Ok(TypeId::from_raw(u64::from_be_bytes(raw)))
}

fn check_header(bytes: &[u8]) -> WireResult<()> {
    if bytes.len() < 8 {
        return Err(WireError::Truncated {
            offset: bytes.len() as u64,
        });
    }
    if &bytes[0..4] != MAGIC {
        return Err(WireError::InvalidMagic {
            expected: String::from_utf8_lossy(MAGIC).into(),
            actual: String::from_utf8_lossy(&bytes[0..4]).into(),
        });
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&bytes[4..8]);
    let version = u32::from_be_bytes(version);
    if version != VERSION {
        return Err(WireError::UnsupportedVersion(version));
    }
    Ok(())
}

fn decode_object(
    repo: &Repository,
    r: &mut BlobReader<'_>,
    class: Arc<ClassDescriptor>,
) -> WireResult<ObjectNode> {
    let count = r.read_varint()?;
    if count != class.members.len() as u64 {
        return Err(r.corrupt(format!(
            "member count {count} does not match class {} with {} members",
            class.name,
            class.members.len()
        )));
    }
    let mut members = Vec::with_capacity(class.members.len());
    for member in &class.members {
        members.push(decode_member(repo, r, member)?);
    }
    ObjectNode::from_members(class, members).map_err(|e| r.corrupt(e.to_string()))
}

fn decode_member(
    repo: &Repository,
    r: &mut BlobReader<'_>,
    member: &MemberDescriptor,
) -> WireResult<MemberSlot> {
    match member.collection {
        Collection::Single => Ok(MemberSlot::Single(decode_item(repo, r, member.element)?)),
        Collection::Array(len) => {
            let count = r.read_varint()?;
            if count != len as u64 {
                return Err(r.corrupt(format!(
                    "array count {count} does not match schema length {len}"
                )));
            }
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(decode_item(repo, r, member.element)?);
            }
            ArraySlot::from_items(member.element, items)
                .map(MemberSlot::Array)
                .map_err(|e| r.corrupt(e.to_string()))
        }
        Collection::Sequence => {
            let changed_here = decode_container_flags(r)?;
            let count = r.read_varint()?;
            let mut items = Vec::new();
            for _ in 0..count {
                items.push(decode_item(repo, r, member.element)?);
            }
            SequenceSlot::from_items(member.element, items, changed_here)
                .map(MemberSlot::Sequence)
                .map_err(|e| r.corrupt(e.to_string()))
        }
        Collection::Dictionary(key_kind) => {
            let changed_here = decode_container_flags(r)?;
            let count = r.read_varint()?;
            let mut entries = Vec::new();
            for _ in 0..count {
                let key = decode_key(r, key_kind)?;
                let item = decode_item(repo, r, member.element)?;
                entries.push((key, item));
            }
            DictionarySlot::from_entries(key_kind, member.element, entries, changed_here)
                .map(MemberSlot::Dictionary)
                .map_err(|e| r.corrupt(e.to_string()))
        }
    }
}

fn decode_container_flags(r: &mut BlobReader<'_>) -> WireResult<bool> {
    let flags = r.read_u8()?;
    if flags & !FLAG_CHANGED != 0 {
        return Err(r.corrupt(format!("invalid container flags {flags:#04x}")));
    }
    Ok(flags & FLAG_CHANGED != 0)
}

fn decode_item_flags(r: &mut BlobReader<'_>) -> WireResult<(bool, bool)> {
    let flags = r.read_u8()?;
    if flags & !(FLAG_CHANGED | FLAG_PRESENT) != 0 {
        return Err(r.corrupt(format!("invalid item flags {flags:#04x}")));
    }
    Ok((flags & FLAG_CHANGED != 0, flags & FLAG_PRESENT != 0))
}

fn decode_item(
    repo: &Repository,
    r: &mut BlobReader<'_>,
    element: ElementType,
) -> WireResult<ItemSlot> {
    match element {
        ElementType::Scalar(kind) => {
            let (changed, present) = decode_item_flags(r)?;
            let value = if present {
                let tag = r.read_u8()?;
                if tag != scalar_tag(kind) {
                    return Err(r.corrupt(format!(
                        "kind tag {tag} does not match declared {}",
                        kind.name()
                    )));
                }
                Some(decode_scalar(r, kind)?)
            } else {
                None
            };
            ValueSlot::from_parts(kind, value, changed)
                .map(ItemSlot::Value)
                .map_err(|e| r.corrupt(e.to_string()))
        }
        ElementType::Object(class_id) => {
            let (changed_here, present) = decode_item_flags(r)?;
            let node = if present {
                let nested = TypeId::from_raw(r.read_u64()?);
                if nested != class_id {
                    return Err(r.corrupt(format!(
                        "nested type id {nested} does not match declared class {class_id}"
                    )));
                }
                let class = repo
                    .class(nested)
                    .ok_or(WireError::UnknownType(nested))?
                    .clone();
                Some(decode_object(repo, r, class)?)
            } else {
                None
            };
            ObjectSlot::from_parts(class_id, node, changed_here)
                .map(ItemSlot::Object)
                .map_err(|e| r.corrupt(e.to_string()))
        }
    }
}

fn decode_scalar(r: &mut BlobReader<'_>, kind: ScalarKind) -> WireResult<ScalarValue> {
    match kind {
        ScalarKind::Bool => match r.read_u8()? {
            0 => Ok(ScalarValue::Bool(false)),
            1 => Ok(ScalarValue::Bool(true)),
            other => Err(r.corrupt(format!("invalid bool byte {other}"))),
        },
        ScalarKind::Int32 => Ok(ScalarValue::Int32(r.read_i32()?)),
        ScalarKind::Int64 => Ok(ScalarValue::Int64(r.read_i64()?)),
        ScalarKind::Float32 => Ok(ScalarValue::Float32(r.read_f32()?)),
        ScalarKind::Float64 => Ok(ScalarValue::Float64(r.read_f64()?)),
        ScalarKind::Str => Ok(ScalarValue::Str(r.read_str()?)),
        ScalarKind::Binary => Ok(ScalarValue::Binary(r.read_bytes()?.to_vec())),
        ScalarKind::Enum(declared) => {
            let enum_id = TypeId::from_raw(r.read_u64()?);
            if enum_id != declared {
                return Err(r.corrupt(format!(
                    "enum id {enum_id} does not match declared {declared}"
                )));
            }
            let ordinal = r.read_i32()?;
            Ok(ScalarValue::Enum { enum_id, ordinal })
        }
    }
}

fn decode_key(r: &mut BlobReader<'_>, kind: KeyKind) -> WireResult<DictKey> {
    let tag = r.read_u8()?;
    let expected = match kind {
        KeyKind::Int32 => KIND_INT32,
        KeyKind::Int64 => KIND_INT64,
        KeyKind::Str => KIND_STR,
        KeyKind::Enum(_) => KIND_ENUM,
    };
    if tag != expected {
        return Err(r.corrupt(format!(
            "key tag {tag} does not match declared {}",
            kind.name()
        )));
    }
    match kind {
        KeyKind::Int32 => Ok(DictKey::Int32(r.read_i32()?)),
        KeyKind::Int64 => Ok(DictKey::Int64(r.read_i64()?)),
        KeyKind::Str => Ok(DictKey::Str(r.read_str()?)),
        KeyKind::Enum(declared) => {
            let enum_id = TypeId::from_raw(r.read_u64()?);
            if enum_id != declared {
                return Err(r.corrupt(format!(
                    "enum key id {enum_id} does not match declared {declared}"
                )));
            }
            let ordinal = r.read_i32()?;
            Ok(DictKey::Enum { enum_id, ordinal })
        }
    }
}
