use std::sync::Arc;

use som_schema::{ClassDescriptor, Collection, MemberDescriptor, TypeId};

use crate::collection::{ArraySlot, DictionarySlot, SequenceSlot};
use crate::error::{AccessError, AccessResult};
use crate::slot::{ItemSlot, ObjectSlot, ValueSlot};

// ---------------------------------------------------------------------------
// MemberSlot
// ---------------------------------------------------------------------------

/// The slot occupying one member position, shaped by the member's declared
/// collection.
///
/// The variants are public so generic walkers (the codec, the merge engine,
/// the differ) can dispatch on shape directly; the typed accessors are for
/// call sites that know what they expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberSlot {
    Single(ItemSlot),
    Array(ArraySlot),
    Sequence(SequenceSlot),
    Dictionary(DictionarySlot),
}

impl MemberSlot {
    /// The null/empty slot a freshly created object carries for `member`.
    pub fn null_of(member: &MemberDescriptor) -> Self {
        match member.collection {
            Collection::Single => Self::Single(ItemSlot::null_of(member.element)),
            Collection::Array(len) => Self::Array(ArraySlot::null(member.element, len)),
            Collection::Sequence => Self::Sequence(SequenceSlot::empty(member.element)),
            Collection::Dictionary(key_kind) => {
                Self::Dictionary(DictionarySlot::empty(key_kind, member.element))
            }
        }
    }

    /// Shape name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Single(ItemSlot::Value(_)) => "value",
            Self::Single(ItemSlot::Object(_)) => "object",
            Self::Array(_) => "array",
            Self::Sequence(_) => "sequence",
            Self::Dictionary(_) => "dictionary",
        }
    }

    /// Returns `true` if the slot's declared shape matches the descriptor.
    pub fn matches(&self, member: &MemberDescriptor) -> bool {
        match (self, member.collection) {
            (Self::Single(item), Collection::Single) => item.matches(member.element),
            (Self::Array(array), Collection::Array(len)) => {
                array.len() == len && array.element() == member.element
            }
            (Self::Sequence(seq), Collection::Sequence) => seq.element() == member.element,
            (Self::Dictionary(dict), Collection::Dictionary(key_kind)) => {
                dict.key_kind() == key_kind && dict.element() == member.element
            }
            _ => false,
        }
    }

    /// The member as a single scalar slot.
    pub fn value(&self) -> AccessResult<&ValueSlot> {
        match self {
            Self::Single(ItemSlot::Value(slot)) => Ok(slot),
            other => Err(other.shape_mismatch("value")),
        }
    }

    pub fn value_mut(&mut self) -> AccessResult<&mut ValueSlot> {
        match self {
            Self::Single(ItemSlot::Value(slot)) => Ok(slot),
            other => Err(other.shape_mismatch("value")),
        }
    }

    /// The member as a single nested-object slot.
    pub fn object(&self) -> AccessResult<&ObjectSlot> {
        match self {
            Self::Single(ItemSlot::Object(slot)) => Ok(slot),
            other => Err(other.shape_mismatch("object")),
        }
    }

    pub fn object_mut(&mut self) -> AccessResult<&mut ObjectSlot> {
        match self {
            Self::Single(ItemSlot::Object(slot)) => Ok(slot),
            other => Err(other.shape_mismatch("object")),
        }
    }

    pub fn array(&self) -> AccessResult<&ArraySlot> {
        match self {
            Self::Array(slot) => Ok(slot),
            other => Err(other.shape_mismatch("array")),
        }
    }

    pub fn array_mut(&mut self) -> AccessResult<&mut ArraySlot> {
        match self {
            Self::Array(slot) => Ok(slot),
            other => Err(other.shape_mismatch("array")),
        }
    }

    pub fn sequence(&self) -> AccessResult<&SequenceSlot> {
        match self {
            Self::Sequence(slot) => Ok(slot),
            other => Err(other.shape_mismatch("sequence")),
        }
    }

    pub fn sequence_mut(&mut self) -> AccessResult<&mut SequenceSlot> {
        match self {
            Self::Sequence(slot) => Ok(slot),
            other => Err(other.shape_mismatch("sequence")),
        }
    }

    pub fn dictionary(&self) -> AccessResult<&DictionarySlot> {
        match self {
            Self::Dictionary(slot) => Ok(slot),
            other => Err(other.shape_mismatch("dictionary")),
        }
    }

    pub fn dictionary_mut(&mut self) -> AccessResult<&mut DictionarySlot> {
        match self {
            Self::Dictionary(slot) => Ok(slot),
            other => Err(other.shape_mismatch("dictionary")),
        }
    }

    /// Aggregate change state of the member.
    pub fn is_changed(&self) -> bool {
        match self {
            Self::Single(item) => item.is_changed(),
            Self::Array(array) => array.is_changed(),
            Self::Sequence(seq) => seq.is_changed(),
            Self::Dictionary(dict) => dict.is_changed(),
        }
    }

    /// `false` clears recursively; `true` marks the nearest flags only.
    pub fn set_changed(&mut self, changed: bool) {
        match self {
            Self::Single(item) => item.set_changed(changed),
            Self::Array(array) => array.set_changed(changed),
            Self::Sequence(seq) => seq.set_changed(changed),
            Self::Dictionary(dict) => dict.set_changed(changed),
        }
    }

    fn shape_mismatch(&self, expected: &'static str) -> AccessError {
        AccessError::TypeMismatch {
            expected,
            actual: self.kind_name(),
        }
    }
}

// ---------------------------------------------------------------------------
// ObjectNode
// ---------------------------------------------------------------------------

/// A typed object instance: a class descriptor plus one slot per member,
/// in declaration order.
///
/// The graph below a node is a strict ownership tree; there is no sharing
/// and no cycles. `Clone` is a deep, independent copy that preserves every
/// null and changed flag, so derived `PartialEq` is deep state equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectNode {
    class: Arc<ClassDescriptor>,
    members: Vec<MemberSlot>,
}

impl ObjectNode {
    /// A fresh instance: every member null or empty, nothing changed.
    pub fn new(class: Arc<ClassDescriptor>) -> Self {
        let members = class.members.iter().map(MemberSlot::null_of).collect();
        Self { class, members }
    }

    /// Rebuild from raw slots, e.g. when decoding a blob. Slot count and
    /// shapes must match the descriptor exactly.
    pub fn from_members(
        class: Arc<ClassDescriptor>,
        members: Vec<MemberSlot>,
    ) -> AccessResult<Self> {
        let shape_ok = members.len() == class.members.len()
            && class
                .members
                .iter()
                .zip(&members)
                .all(|(desc, slot)| slot.matches(desc));
        if !shape_ok {
            return Err(AccessError::ShapeMismatch {
                class: class.name.clone(),
            });
        }
        Ok(Self { class, members })
    }

    /// The concrete class id.
    pub fn type_id(&self) -> TypeId {
        self.class.type_id
    }

    /// The class descriptor.
    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    /// Number of members.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Look up a member slot by name.
    pub fn member(&self, name: &str) -> AccessResult<&MemberSlot> {
        match self.class.member(name) {
            Some((ordinal, _)) => Ok(&self.members[ordinal]),
            None => Err(AccessError::UnknownMember {
                class: self.class.name.clone(),
                member: name.to_string(),
            }),
        }
    }

    pub fn member_mut(&mut self, name: &str) -> AccessResult<&mut MemberSlot> {
        let ordinal = match self.class.member(name) {
            Some((ordinal, _)) => ordinal,
            None => {
                return Err(AccessError::UnknownMember {
                    class: self.class.name.clone(),
                    member: name.to_string(),
                })
            }
        };
        Ok(&mut self.members[ordinal])
    }

    /// Look up a member slot by ordinal.
    pub fn member_at(&self, ordinal: usize) -> AccessResult<&MemberSlot> {
        self.members
            .get(ordinal)
            .ok_or(AccessError::IndexOutOfRange {
                index: ordinal,
                len: self.members.len(),
            })
    }

    pub fn member_at_mut(&mut self, ordinal: usize) -> AccessResult<&mut MemberSlot> {
        let len = self.members.len();
        self.members
            .get_mut(ordinal)
            .ok_or(AccessError::IndexOutOfRange {
                index: ordinal,
                len,
            })
    }

    /// Iterate members in declaration order, paired with descriptors.
    pub fn members(&self) -> impl Iterator<Item = (&MemberDescriptor, &MemberSlot)> {
        self.class.members.iter().zip(self.members.iter())
    }

    pub fn members_mut(&mut self) -> impl Iterator<Item = (&MemberDescriptor, &mut MemberSlot)> {
        self.class.members.iter().zip(self.members.iter_mut())
    }

    /// Aggregate change state: any member changed.
    pub fn is_changed(&self) -> bool {
        self.members.iter().any(MemberSlot::is_changed)
    }

    /// Applied to every member; `false` clears the whole subtree.
    pub fn set_changed(&mut self, changed: bool) {
        for member in &mut self.members {
            member.set_changed(changed);
        }
    }
}
