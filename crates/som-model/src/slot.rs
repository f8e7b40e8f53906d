use som_schema::{ElementType, ScalarKind, TypeId};

use crate::error::{AccessError, AccessResult};
use crate::node::ObjectNode;
use crate::scalar::ScalarValue;

// ---------------------------------------------------------------------------
// ValueSlot
// ---------------------------------------------------------------------------

/// A single scalar field: declared kind, optional value, change flag.
///
/// Null and changed are independent. Writing a value marks the slot
/// changed, and so does resetting it to null, so "changed to null" is a
/// representable state. `set_changed` exists for baseline resets and for
/// forcing retransmission of an otherwise untouched field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSlot {
    kind: ScalarKind,
    value: Option<ScalarValue>,
    changed: bool,
}

impl ValueSlot {
    /// A null, unchanged slot of the given kind.
    pub fn null(kind: ScalarKind) -> Self {
        Self {
            kind,
            value: None,
            changed: false,
        }
    }

    /// Rebuild a slot from raw parts, e.g. when decoding a blob.
    pub fn from_parts(
        kind: ScalarKind,
        value: Option<ScalarValue>,
        changed: bool,
    ) -> AccessResult<Self> {
        if let Some(v) = &value {
            if !v.matches(kind) {
                return Err(AccessError::TypeMismatch {
                    expected: kind.name(),
                    actual: v.kind_name(),
                });
            }
        }
        Ok(Self {
            kind,
            value,
            changed,
        })
    }

    /// Declared scalar kind.
    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn set_changed(&mut self, changed: bool) {
        self.changed = changed;
    }

    /// Read the value. A null read is an error, never a default.
    pub fn get(&self) -> AccessResult<&ScalarValue> {
        self.value.as_ref().ok_or(AccessError::NullValue)
    }

    /// Peek at the value without the null check.
    pub fn value(&self) -> Option<&ScalarValue> {
        self.value.as_ref()
    }

    /// Write a value of the declared kind. Clears null, marks changed.
    pub fn set(&mut self, value: ScalarValue) -> AccessResult<()> {
        if !value.matches(self.kind) {
            return Err(AccessError::TypeMismatch {
                expected: self.kind.name(),
                actual: value.kind_name(),
            });
        }
        self.value = Some(value);
        self.changed = true;
        Ok(())
    }

    /// Reset to null. Marks changed.
    pub fn set_null(&mut self) {
        self.value = None;
        self.changed = true;
    }

    /// Payload equality. Errors if either side is null or kinds differ.
    pub fn try_eq(&self, other: &Self) -> AccessResult<bool> {
        let a = self.get()?;
        let b = other.get()?;
        a.try_eq(b)
    }
}

// ---------------------------------------------------------------------------
// ObjectSlot
// ---------------------------------------------------------------------------

/// An owned nested-object slot: declared class, optional node, and the
/// structural flag recording that the slot itself was assigned.
///
/// The aggregate [`ObjectSlot::is_changed`] is computed on demand from the
/// structural flag and the subtree; it is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSlot {
    class_id: TypeId,
    node: Option<Box<ObjectNode>>,
    changed_here: bool,
}

impl ObjectSlot {
    /// A null, unchanged slot for the given class.
    pub fn null(class_id: TypeId) -> Self {
        Self {
            class_id,
            node: None,
            changed_here: false,
        }
    }

    /// Rebuild a slot from raw parts, e.g. when decoding a blob.
    pub fn from_parts(
        class_id: TypeId,
        node: Option<ObjectNode>,
        changed_here: bool,
    ) -> AccessResult<Self> {
        if let Some(n) = &node {
            if n.type_id() != class_id {
                return Err(AccessError::ClassMismatch {
                    expected: class_id,
                    actual: n.type_id(),
                });
            }
        }
        Ok(Self {
            class_id,
            node: node.map(Box::new),
            changed_here,
        })
    }

    /// Declared class of the slot.
    pub fn class_id(&self) -> TypeId {
        self.class_id
    }

    pub fn is_null(&self) -> bool {
        self.node.is_none()
    }

    /// The structural flag: was this slot itself assigned or nulled.
    pub fn is_changed_here(&self) -> bool {
        self.changed_here
    }

    pub fn set_changed_here(&mut self, changed: bool) {
        self.changed_here = changed;
    }

    /// Aggregate change state: the structural flag or any change inside
    /// the subtree.
    pub fn is_changed(&self) -> bool {
        self.changed_here || self.node.as_ref().is_some_and(|n| n.is_changed())
    }

    /// Read the node. A null read is an error.
    pub fn get(&self) -> AccessResult<&ObjectNode> {
        self.node.as_deref().ok_or(AccessError::NullValue)
    }

    pub fn get_mut(&mut self) -> AccessResult<&mut ObjectNode> {
        self.node.as_deref_mut().ok_or(AccessError::NullValue)
    }

    /// Peek at the node without the null check.
    pub fn node(&self) -> Option<&ObjectNode> {
        self.node.as_deref()
    }

    pub fn node_mut(&mut self) -> Option<&mut ObjectNode> {
        self.node.as_deref_mut()
    }

    /// Install a node of the declared class. Marks the slot assigned.
    pub fn set(&mut self, node: ObjectNode) -> AccessResult<()> {
        if node.type_id() != self.class_id {
            return Err(AccessError::ClassMismatch {
                expected: self.class_id,
                actual: node.type_id(),
            });
        }
        self.node = Some(Box::new(node));
        self.changed_here = true;
        Ok(())
    }

    /// Reset to null. Marks the slot assigned.
    pub fn set_null(&mut self) {
        self.node = None;
        self.changed_here = true;
    }

    /// Remove and return the node, leaving the slot null and assigned.
    pub fn take(&mut self) -> Option<ObjectNode> {
        self.changed_here = true;
        self.node.take().map(|boxed| *boxed)
    }

    /// `false` clears the structural flag and the whole subtree; `true`
    /// marks only this slot and leaves descendants untouched.
    pub fn set_changed(&mut self, changed: bool) {
        self.changed_here = changed;
        if !changed {
            if let Some(node) = self.node.as_deref_mut() {
                node.set_changed(false);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ItemSlot
// ---------------------------------------------------------------------------

/// One element of a collection: either a scalar slot or an object slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemSlot {
    Value(ValueSlot),
    Object(ObjectSlot),
}

impl ItemSlot {
    /// A null, unchanged item of the given element type.
    pub fn null_of(element: ElementType) -> Self {
        match element {
            ElementType::Scalar(kind) => Self::Value(ValueSlot::null(kind)),
            ElementType::Object(class_id) => Self::Object(ObjectSlot::null(class_id)),
        }
    }

    /// Precise kind name for diagnostics ("int32", "object", ...).
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Value(slot) => slot.kind().name(),
            Self::Object(_) => "object",
        }
    }

    /// Returns `true` if the item's declared type matches `element`.
    pub fn matches(&self, element: ElementType) -> bool {
        match (self, element) {
            (Self::Value(slot), ElementType::Scalar(kind)) => slot.kind() == kind,
            (Self::Object(slot), ElementType::Object(class_id)) => slot.class_id() == class_id,
            _ => false,
        }
    }

    pub fn as_value(&self) -> AccessResult<&ValueSlot> {
        match self {
            Self::Value(slot) => Ok(slot),
            Self::Object(_) => Err(AccessError::TypeMismatch {
                expected: "value",
                actual: "object",
            }),
        }
    }

    pub fn as_value_mut(&mut self) -> AccessResult<&mut ValueSlot> {
        match self {
            Self::Value(slot) => Ok(slot),
            Self::Object(_) => Err(AccessError::TypeMismatch {
                expected: "value",
                actual: "object",
            }),
        }
    }

    pub fn as_object(&self) -> AccessResult<&ObjectSlot> {
        match self {
            Self::Object(slot) => Ok(slot),
            Self::Value(slot) => Err(AccessError::TypeMismatch {
                expected: "object",
                actual: slot.kind().name(),
            }),
        }
    }

    pub fn as_object_mut(&mut self) -> AccessResult<&mut ObjectSlot> {
        match self {
            Self::Object(slot) => Ok(slot),
            Self::Value(slot) => Err(AccessError::TypeMismatch {
                expected: "object",
                actual: slot.kind().name(),
            }),
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Self::Value(slot) => slot.is_null(),
            Self::Object(slot) => slot.is_null(),
        }
    }

    /// Aggregate change state of the item.
    pub fn is_changed(&self) -> bool {
        match self {
            Self::Value(slot) => slot.is_changed(),
            Self::Object(slot) => slot.is_changed(),
        }
    }

    pub fn set_changed(&mut self, changed: bool) {
        match self {
            Self::Value(slot) => slot.set_changed(changed),
            Self::Object(slot) => slot.set_changed(changed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use som_schema::{ClassSpec, ElementSpec, MemberSpec, Repository};

    fn reading_node() -> ObjectNode {
        let repo = Repository::builder()
            .with_class(
                ClassSpec::new("Reading")
                    .with_member(MemberSpec::single("value", ElementSpec::Float64)),
            )
            .build()
            .unwrap();
        let class = repo.class_by_name("Reading").unwrap().clone();
        ObjectNode::new(class)
    }

    #[test]
    fn fresh_value_slot_is_null_and_unchanged() {
        let slot = ValueSlot::null(ScalarKind::Int32);
        assert!(slot.is_null());
        assert!(!slot.is_changed());
        assert_eq!(slot.get().unwrap_err(), AccessError::NullValue);
    }

    #[test]
    fn set_then_get() {
        let mut slot = ValueSlot::null(ScalarKind::Int32);
        slot.set(ScalarValue::Int32(42)).unwrap();
        assert!(!slot.is_null());
        assert!(slot.is_changed());
        assert_eq!(slot.get().unwrap(), &ScalarValue::Int32(42));
    }

    #[test]
    fn set_rejects_wrong_kind() {
        let mut slot = ValueSlot::null(ScalarKind::Int32);
        let err = slot.set(ScalarValue::Str("no".to_string())).unwrap_err();
        assert_eq!(
            err,
            AccessError::TypeMismatch {
                expected: "int32",
                actual: "str"
            }
        );
        assert!(slot.is_null());
        assert!(!slot.is_changed());
    }

    #[test]
    fn null_and_changed_are_independent() {
        let mut slot = ValueSlot::null(ScalarKind::Int32);
        slot.set(ScalarValue::Int32(1)).unwrap();
        slot.set_null();
        assert!(slot.is_null());
        assert!(slot.is_changed());

        slot.set_changed(false);
        assert!(slot.is_null());
        assert!(!slot.is_changed());
    }

    #[test]
    fn value_try_eq_null_errors() {
        let mut a = ValueSlot::null(ScalarKind::Int32);
        let b = ValueSlot::null(ScalarKind::Int32);
        a.set(ScalarValue::Int32(1)).unwrap();
        assert_eq!(a.try_eq(&b).unwrap_err(), AccessError::NullValue);
    }

    #[test]
    fn from_parts_validates_kind() {
        let err =
            ValueSlot::from_parts(ScalarKind::Int32, Some(ScalarValue::Bool(true)), false)
                .unwrap_err();
        assert!(matches!(err, AccessError::TypeMismatch { .. }));
    }

    #[test]
    fn object_slot_set_checks_class() {
        let node = reading_node();
        let mut slot = ObjectSlot::null(TypeId::derive("Sensor"));
        let err = slot.set(node).unwrap_err();
        assert_eq!(
            err,
            AccessError::ClassMismatch {
                expected: TypeId::derive("Sensor"),
                actual: TypeId::derive("Reading"),
            }
        );
    }

    #[test]
    fn object_slot_assignment_marks_changed_here() {
        let mut slot = ObjectSlot::null(TypeId::derive("Reading"));
        assert!(!slot.is_changed_here());
        slot.set(reading_node()).unwrap();
        assert!(slot.is_changed_here());
        assert!(!slot.is_null());

        slot.set_null();
        assert!(slot.is_null());
        assert!(slot.is_changed_here());
    }

    #[test]
    fn object_slot_aggregate_sees_subtree() {
        let mut slot = ObjectSlot::null(TypeId::derive("Reading"));
        slot.set(reading_node()).unwrap();
        slot.set_changed(false);
        assert!(!slot.is_changed());

        slot.get_mut()
            .unwrap()
            .member_mut("value")
            .unwrap()
            .value_mut()
            .unwrap()
            .set(ScalarValue::Float64(1.5))
            .unwrap();
        assert!(slot.is_changed());
        assert!(!slot.is_changed_here());
    }

    #[test]
    fn object_slot_set_changed_true_marks_only_slot() {
        let mut slot = ObjectSlot::null(TypeId::derive("Reading"));
        slot.set(reading_node()).unwrap();
        slot.set_changed(false);

        slot.set_changed(true);
        assert!(slot.is_changed_here());
        let inner = slot.get().unwrap().member("value").unwrap();
        assert!(!inner.is_changed());
    }

    #[test]
    fn take_leaves_null_and_assigned() {
        let mut slot = ObjectSlot::null(TypeId::derive("Reading"));
        slot.set(reading_node()).unwrap();
        slot.set_changed(false);

        let node = slot.take().unwrap();
        assert_eq!(node.type_id(), TypeId::derive("Reading"));
        assert!(slot.is_null());
        assert!(slot.is_changed_here());
    }

    #[test]
    fn item_slot_accessors_check_variant() {
        let item = ItemSlot::null_of(ElementType::Scalar(ScalarKind::Int32));
        assert!(item.as_value().is_ok());
        assert_eq!(
            item.as_object().unwrap_err(),
            AccessError::TypeMismatch {
                expected: "object",
                actual: "int32"
            }
        );
    }

    #[test]
    fn item_slot_matches_element_type() {
        let item = ItemSlot::null_of(ElementType::Scalar(ScalarKind::Int32));
        assert!(item.matches(ElementType::Scalar(ScalarKind::Int32)));
        assert!(!item.matches(ElementType::Scalar(ScalarKind::Int64)));
        assert!(!item.matches(ElementType::Object(TypeId::derive("Reading"))));
    }
}
