use tracing::debug;

use som_model::{
    ArraySlot, DictionarySlot, ItemSlot, MemberSlot, ObjectNode, SequenceSlot, ValueSlot,
};

use crate::error::{DiffError, DiffResult};

/// Derive the delta that turns `base` into `target`.
///
/// The result carries `target`'s content with every change flag recomputed
/// from value comparison alone; the flags the inputs arrive with do not
/// influence the outcome. Merging the result onto a graph in `base`'s
/// state yields `target`'s state.
pub fn diff_nodes(target: &ObjectNode, base: &ObjectNode) -> DiffResult<ObjectNode> {
    if target.type_id() != base.type_id() {
        return Err(DiffError::ClassMismatch {
            target: target.type_id(),
            base: base.type_id(),
        });
    }
    debug!(class = %target.type_id(), "deriving delta from graph comparison");
    let mut delta = target.clone();
    recompute_node(&mut delta, base);
    Ok(delta)
}

fn recompute_node(delta: &mut ObjectNode, base: &ObjectNode) {
    let mut base_members = base.members();
    for (_, slot) in delta.members_mut() {
        let (_, base_slot) = match base_members.next() {
            Some(pair) => pair,
            None => break,
        };
        recompute_member(slot, base_slot);
    }
}

fn recompute_member(delta: &mut MemberSlot, base: &MemberSlot) {
    match (delta, base) {
        (MemberSlot::Single(d), MemberSlot::Single(b)) => recompute_item(d, b),
        (MemberSlot::Array(d), MemberSlot::Array(b)) => recompute_array(d, b),
        (MemberSlot::Sequence(d), MemberSlot::Sequence(b)) => recompute_sequence(d, b),
        (MemberSlot::Dictionary(d), MemberSlot::Dictionary(b)) => recompute_dictionary(d, b),
        // Shapes agree for two nodes of the same class.
        _ => {}
    }
}

fn recompute_array(delta: &mut ArraySlot, base: &ArraySlot) {
    for (item, base_item) in delta.iter_mut().zip(base.iter()) {
        recompute_item(item, base_item);
    }
}

fn recompute_sequence(delta: &mut SequenceSlot, base: &SequenceSlot) {
    let same_len = delta.len() == base.len();
    delta.set_changed_here(!same_len);
    for (index, item) in delta.iter_mut().enumerate() {
        match base.get(index) {
            Ok(base_item) => recompute_item(item, base_item),
            Err(_) => recompute_item_vs_fresh(item),
        }
    }
}

fn recompute_dictionary(delta: &mut DictionarySlot, base: &DictionarySlot) {
    let same_keys =
        delta.len() == base.len() && delta.keys().all(|key| base.contains_key(key));
    delta.set_changed_here(!same_keys);
    for (key, item) in delta.iter_mut() {
        match base.get(key) {
            Ok(base_item) => recompute_item(item, base_item),
            Err(_) => recompute_item_vs_fresh(item),
        }
    }
}

fn recompute_item(delta: &mut ItemSlot, base: &ItemSlot) {
    match (delta, base) {
        (ItemSlot::Value(d), ItemSlot::Value(b)) => recompute_value(d, b),
        (ItemSlot::Object(d), ItemSlot::Object(b)) => {
            if d.is_null() && b.is_null() {
                d.set_changed_here(false);
            } else if d.is_null() || b.is_null() {
                // Presence flipped: the slot itself changed, and a subtree
                // that appeared is flagged against all-null state.
                d.set_changed_here(true);
                if let Some(node) = d.node_mut() {
                    recompute_vs_ghost(node);
                }
            } else {
                d.set_changed_here(false);
                if let (Some(node), Some(base_node)) = (d.node_mut(), b.node()) {
                    recompute_node(node, base_node);
                }
            }
        }
        // Shapes agree for two nodes of the same class.
        _ => {}
    }
}

/// Recompute an element that has no counterpart in the base: a sequence
/// element past the base's length or a dictionary entry under a new key.
fn recompute_item_vs_fresh(delta: &mut ItemSlot) {
    match delta {
        ItemSlot::Value(d) => {
            let changed = !d.is_null();
            d.set_changed(changed);
        }
        ItemSlot::Object(d) => {
            let present = !d.is_null();
            d.set_changed_here(present);
            if let Some(node) = d.node_mut() {
                recompute_vs_ghost(node);
            }
        }
    }
}

fn recompute_value(delta: &mut ValueSlot, base: &ValueSlot) {
    let changed = delta.value() != base.value();
    delta.set_changed(changed);
}

fn recompute_vs_ghost(node: &mut ObjectNode) {
    let ghost = ObjectNode::new(node.class().clone());
    recompute_node(node, &ghost);
}
