use indexmap::IndexMap;
use som_schema::{ElementType, KeyKind};

use crate::error::{AccessError, AccessResult};
use crate::key::DictKey;
use crate::node::ObjectNode;
use crate::scalar::ScalarValue;
use crate::slot::{ItemSlot, ObjectSlot, ValueSlot};

// ---------------------------------------------------------------------------
// ArraySlot
// ---------------------------------------------------------------------------

/// Fixed-length array of items.
///
/// The length comes from the schema and never changes at runtime, so there
/// is no structural flag: aggregate change is "any element changed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArraySlot {
    element: ElementType,
    items: Vec<ItemSlot>,
}

impl ArraySlot {
    /// All-null array of the declared length.
    pub fn null(element: ElementType, len: usize) -> Self {
        Self {
            element,
            items: (0..len).map(|_| ItemSlot::null_of(element)).collect(),
        }
    }

    /// Rebuild from raw items, e.g. when decoding a blob.
    pub fn from_items(element: ElementType, items: Vec<ItemSlot>) -> AccessResult<Self> {
        for item in &items {
            check_element(element, item)?;
        }
        Ok(Self { element, items })
    }

    /// Declared element type.
    pub fn element(&self) -> ElementType {
        self.element
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> AccessResult<&ItemSlot> {
        self.items.get(index).ok_or(AccessError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    pub fn get_mut(&mut self, index: usize) -> AccessResult<&mut ItemSlot> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or(AccessError::IndexOutOfRange { index, len })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemSlot> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ItemSlot> {
        self.items.iter_mut()
    }

    /// Aggregate change state: any element changed.
    pub fn is_changed(&self) -> bool {
        self.items.iter().any(ItemSlot::is_changed)
    }

    /// Applied to every element; `false` clears recursively.
    pub fn set_changed(&mut self, changed: bool) {
        for item in &mut self.items {
            item.set_changed(changed);
        }
    }
}

// ---------------------------------------------------------------------------
// SequenceSlot
// ---------------------------------------------------------------------------

/// Growable ordered list of items plus the structural flag recording
/// wholesale operations (push, insert, erase, assign, clear).
///
/// The structural flag is distinct from element-level change state: an
/// element mutated in place raises the aggregate but not the flag, and the
/// merge engine treats the two cases differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceSlot {
    element: ElementType,
    items: Vec<ItemSlot>,
    changed_here: bool,
}

impl SequenceSlot {
    /// Empty, unchanged sequence.
    pub fn empty(element: ElementType) -> Self {
        Self {
            element,
            items: Vec::new(),
            changed_here: false,
        }
    }

    /// Rebuild from raw parts, e.g. when decoding a blob.
    pub fn from_items(
        element: ElementType,
        items: Vec<ItemSlot>,
        changed_here: bool,
    ) -> AccessResult<Self> {
        for item in &items {
            check_element(element, item)?;
        }
        Ok(Self {
            element,
            items,
            changed_here,
        })
    }

    /// Declared element type.
    pub fn element(&self) -> ElementType {
        self.element
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> AccessResult<&ItemSlot> {
        self.items.get(index).ok_or(AccessError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    pub fn get_mut(&mut self, index: usize) -> AccessResult<&mut ItemSlot> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or(AccessError::IndexOutOfRange { index, len })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemSlot> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ItemSlot> {
        self.items.iter_mut()
    }

    /// Append an item of the declared element type.
    pub fn push(&mut self, item: ItemSlot) -> AccessResult<()> {
        check_element(self.element, &item)?;
        self.items.push(item);
        self.changed_here = true;
        Ok(())
    }

    /// Append a scalar value. The new element carries the value and is
    /// marked changed.
    pub fn push_value(&mut self, value: ScalarValue) -> AccessResult<()> {
        match self.element {
            ElementType::Scalar(kind) => {
                let mut slot = ValueSlot::null(kind);
                slot.set(value)?;
                self.items.push(ItemSlot::Value(slot));
                self.changed_here = true;
                Ok(())
            }
            ElementType::Object(_) => Err(AccessError::TypeMismatch {
                expected: "object",
                actual: value.kind_name(),
            }),
        }
    }

    /// Append an object node. The new element is marked assigned.
    pub fn push_object(&mut self, node: ObjectNode) -> AccessResult<()> {
        match self.element {
            ElementType::Object(class_id) => {
                let mut slot = ObjectSlot::null(class_id);
                slot.set(node)?;
                self.items.push(ItemSlot::Object(slot));
                self.changed_here = true;
                Ok(())
            }
            ElementType::Scalar(kind) => Err(AccessError::TypeMismatch {
                expected: kind.name(),
                actual: "object",
            }),
        }
    }

    /// Append a null, unchanged element. Only the structural flag records
    /// the growth.
    pub fn push_null(&mut self) {
        self.items.push(ItemSlot::null_of(self.element));
        self.changed_here = true;
    }

    /// Insert at `index`, shifting the tail. `index == len` appends.
    pub fn insert_at(&mut self, index: usize, item: ItemSlot) -> AccessResult<()> {
        if index > self.items.len() {
            return Err(AccessError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        check_element(self.element, &item)?;
        self.items.insert(index, item);
        self.changed_here = true;
        Ok(())
    }

    /// Remove and return the item at `index`.
    pub fn erase_at(&mut self, index: usize) -> AccessResult<ItemSlot> {
        if index >= self.items.len() {
            return Err(AccessError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.changed_here = true;
        Ok(self.items.remove(index))
    }

    /// Replace the whole content.
    pub fn assign(&mut self, items: Vec<ItemSlot>) -> AccessResult<()> {
        for item in &items {
            check_element(self.element, item)?;
        }
        self.items = items;
        self.changed_here = true;
        Ok(())
    }

    /// Drop all items.
    pub fn clear(&mut self) {
        self.items.clear();
        self.changed_here = true;
    }

    /// The structural flag alone.
    pub fn is_changed_here(&self) -> bool {
        self.changed_here
    }

    pub fn set_changed_here(&mut self, changed: bool) {
        self.changed_here = changed;
    }

    /// Aggregate change state: the structural flag or any element.
    pub fn is_changed(&self) -> bool {
        self.changed_here || self.items.iter().any(ItemSlot::is_changed)
    }

    /// `false` clears the structural flag and every element recursively;
    /// `true` marks only the structural flag.
    pub fn set_changed(&mut self, changed: bool) {
        self.changed_here = changed;
        if !changed {
            for item in &mut self.items {
                item.set_changed(false);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// DictionarySlot
// ---------------------------------------------------------------------------

/// Insertion-ordered dictionary of items plus the structural flag recording
/// key-set mutations (insert, remove, assign, clear).
///
/// Iteration follows insertion order and the codec writes entries in that
/// order, so a round-tripped dictionary iterates identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionarySlot {
    key_kind: KeyKind,
    element: ElementType,
    entries: IndexMap<DictKey, ItemSlot>,
    changed_here: bool,
}

impl DictionarySlot {
    /// Empty, unchanged dictionary.
    pub fn empty(key_kind: KeyKind, element: ElementType) -> Self {
        Self {
            key_kind,
            element,
            entries: IndexMap::new(),
            changed_here: false,
        }
    }

    /// Rebuild from raw entries, e.g. when decoding a blob. A repeated key
    /// keeps the last item.
    pub fn from_entries(
        key_kind: KeyKind,
        element: ElementType,
        entries: Vec<(DictKey, ItemSlot)>,
        changed_here: bool,
    ) -> AccessResult<Self> {
        let mut map = IndexMap::with_capacity(entries.len());
        for (key, item) in entries {
            check_key(key_kind, &key)?;
            check_element(element, &item)?;
            map.insert(key, item);
        }
        Ok(Self {
            key_kind,
            element,
            entries: map,
            changed_here,
        })
    }

    /// Declared key kind.
    pub fn key_kind(&self) -> KeyKind {
        self.key_kind
    }

    /// Declared element type.
    pub fn element(&self) -> ElementType {
        self.element
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &DictKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Read the item for `key`. A missing key is an error; so is a key of
    /// the wrong kind.
    pub fn get(&self, key: &DictKey) -> AccessResult<&ItemSlot> {
        check_key(self.key_kind, key)?;
        self.entries
            .get(key)
            .ok_or_else(|| AccessError::KeyNotFound {
                key: key.to_string(),
            })
    }

    pub fn get_mut(&mut self, key: &DictKey) -> AccessResult<&mut ItemSlot> {
        check_key(self.key_kind, key)?;
        self.entries
            .get_mut(key)
            .ok_or_else(|| AccessError::KeyNotFound {
                key: key.to_string(),
            })
    }

    /// Key at insertion position `ordinal`.
    pub fn key_at(&self, ordinal: usize) -> AccessResult<&DictKey> {
        self.entries
            .get_index(ordinal)
            .map(|(key, _)| key)
            .ok_or(AccessError::IndexOutOfRange {
                index: ordinal,
                len: self.entries.len(),
            })
    }

    /// Entry at insertion position `ordinal`.
    pub fn get_at(&self, ordinal: usize) -> AccessResult<(&DictKey, &ItemSlot)> {
        self.entries
            .get_index(ordinal)
            .ok_or(AccessError::IndexOutOfRange {
                index: ordinal,
                len: self.entries.len(),
            })
    }

    pub fn get_at_mut(&mut self, ordinal: usize) -> AccessResult<(&DictKey, &mut ItemSlot)> {
        let len = self.entries.len();
        self.entries
            .get_index_mut(ordinal)
            .ok_or(AccessError::IndexOutOfRange {
                index: ordinal,
                len,
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DictKey, &ItemSlot)> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&DictKey, &mut ItemSlot)> {
        self.entries.iter_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &DictKey> {
        self.entries.keys()
    }

    /// Insert or replace the entry for `key`.
    pub fn insert(&mut self, key: DictKey, item: ItemSlot) -> AccessResult<()> {
        check_key(self.key_kind, &key)?;
        check_element(self.element, &item)?;
        self.entries.insert(key, item);
        self.changed_here = true;
        Ok(())
    }

    /// Insert a scalar value. The new element carries the value and is
    /// marked changed.
    pub fn insert_value(&mut self, key: DictKey, value: ScalarValue) -> AccessResult<()> {
        match self.element {
            ElementType::Scalar(kind) => {
                let mut slot = ValueSlot::null(kind);
                slot.set(value)?;
                self.insert(key, ItemSlot::Value(slot))
            }
            ElementType::Object(_) => Err(AccessError::TypeMismatch {
                expected: "object",
                actual: value.kind_name(),
            }),
        }
    }

    /// Insert an object node. The new element is marked assigned.
    pub fn insert_object(&mut self, key: DictKey, node: ObjectNode) -> AccessResult<()> {
        match self.element {
            ElementType::Object(class_id) => {
                let mut slot = ObjectSlot::null(class_id);
                slot.set(node)?;
                self.insert(key, ItemSlot::Object(slot))
            }
            ElementType::Scalar(kind) => Err(AccessError::TypeMismatch {
                expected: kind.name(),
                actual: "object",
            }),
        }
    }

    /// Insert an entry whose element stays null and unchanged. Only the
    /// dictionary's structural flag records the insertion.
    pub fn insert_null(&mut self, key: DictKey) -> AccessResult<()> {
        check_key(self.key_kind, &key)?;
        self.entries.insert(key, ItemSlot::null_of(self.element));
        self.changed_here = true;
        Ok(())
    }

    /// Remove and return the entry for `key`. Remaining entries keep their
    /// insertion order.
    pub fn remove(&mut self, key: &DictKey) -> AccessResult<ItemSlot> {
        check_key(self.key_kind, key)?;
        let item = self
            .entries
            .shift_remove(key)
            .ok_or_else(|| AccessError::KeyNotFound {
                key: key.to_string(),
            })?;
        self.changed_here = true;
        Ok(item)
    }

    /// Replace the whole content. A repeated key keeps the last item.
    pub fn assign(&mut self, entries: Vec<(DictKey, ItemSlot)>) -> AccessResult<()> {
        let mut map = IndexMap::with_capacity(entries.len());
        for (key, item) in entries {
            check_key(self.key_kind, &key)?;
            check_element(self.element, &item)?;
            map.insert(key, item);
        }
        self.entries = map;
        self.changed_here = true;
        Ok(())
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.changed_here = true;
    }

    /// The structural flag alone.
    pub fn is_changed_here(&self) -> bool {
        self.changed_here
    }

    pub fn set_changed_here(&mut self, changed: bool) {
        self.changed_here = changed;
    }

    /// Aggregate change state: the structural flag or any element.
    pub fn is_changed(&self) -> bool {
        self.changed_here || self.entries.values().any(ItemSlot::is_changed)
    }

    /// `false` clears the structural flag and every element recursively;
    /// `true` marks only the structural flag.
    pub fn set_changed(&mut self, changed: bool) {
        self.changed_here = changed;
        if !changed {
            for item in self.entries.values_mut() {
                item.set_changed(false);
            }
        }
    }
}

fn check_element(element: ElementType, item: &ItemSlot) -> AccessResult<()> {
    if item.matches(element) {
        Ok(())
    } else {
        Err(AccessError::TypeMismatch {
            expected: element.name(),
            actual: item.kind_name(),
        })
    }
}

fn check_key(kind: KeyKind, key: &DictKey) -> AccessResult<()> {
    if key.matches(kind) {
        Ok(())
    } else {
        Err(AccessError::TypeMismatch {
            expected: kind.name(),
            actual: key.kind_name(),
        })
    }
}
