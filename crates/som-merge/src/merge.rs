use tracing::debug;

use som_model::{
    DictionarySlot, ItemSlot, MemberSlot, ObjectNode, ObjectSlot, SequenceSlot,
};

use crate::error::{MergeError, MergeResult};

/// Apply every change recorded in `from` onto `into`, leaving everything
/// else untouched.
///
/// `from` is typically a sparse delta: a graph whose flags mark exactly
/// the state a publisher wants to update. Members, elements, and entries
/// the delta does not mark are not modified. Violations abort the merge
/// in place without rolling back earlier member updates.
pub fn merge_changes(into: &mut ObjectNode, from: &ObjectNode) -> MergeResult<()> {
    if into.type_id() != from.type_id() {
        return Err(MergeError::ClassMismatch {
            into: into.type_id(),
            from: from.type_id(),
        });
    }
    debug!(class = %from.type_id(), "merging recorded changes");
    merge_node(into, from)
}

fn merge_node(into: &mut ObjectNode, from: &ObjectNode) -> MergeResult<()> {
    let mut from_members = from.members();
    for (desc, into_slot) in into.members_mut() {
        let (_, from_slot) = match from_members.next() {
            Some(pair) => pair,
            None => break,
        };
        merge_member(into_slot, from_slot).map_err(|e| e.nest(&desc.name))?;
    }
    Ok(())
}

fn merge_member(into: &mut MemberSlot, from: &MemberSlot) -> MergeResult<()> {
    match (into, from) {
        (MemberSlot::Single(into_item), MemberSlot::Single(from_item)) => {
            merge_item(into_item, from_item)
        }
        (MemberSlot::Array(into_array), MemberSlot::Array(from_array)) => {
            // Array length is schema-fixed; a disagreement means the graphs
            // were built against different schemas.
            if into_array.len() != from_array.len() {
                return Err(MergeError::LengthMismatch {
                    path: String::new(),
                    into_len: into_array.len(),
                    from_len: from_array.len(),
                });
            }
            for (index, (into_item, from_item)) in
                into_array.iter_mut().zip(from_array.iter()).enumerate()
            {
                merge_item(into_item, from_item).map_err(|e| e.nest(&format!("[{index}]")))?;
            }
            Ok(())
        }
        (MemberSlot::Sequence(into_seq), MemberSlot::Sequence(from_seq)) => {
            merge_sequence(into_seq, from_seq)
        }
        (MemberSlot::Dictionary(into_dict), MemberSlot::Dictionary(from_dict)) => {
            merge_dictionary(into_dict, from_dict)
        }
        _ => Err(MergeError::ShapeMismatch {
            path: String::new(),
        }),
    }
}

fn merge_item(into: &mut ItemSlot, from: &ItemSlot) -> MergeResult<()> {
    match (into, from) {
        (ItemSlot::Value(into_slot), ItemSlot::Value(from_slot)) => {
            // Value, null state, and the changed flag travel together.
            if from_slot.is_changed() {
                *into_slot = from_slot.clone();
            }
            Ok(())
        }
        (ItemSlot::Object(into_slot), ItemSlot::Object(from_slot)) => {
            merge_object_slot(into_slot, from_slot)
        }
        _ => Err(MergeError::ShapeMismatch {
            path: String::new(),
        }),
    }
}

fn merge_object_slot(into: &mut ObjectSlot, from: &ObjectSlot) -> MergeResult<()> {
    if !from.is_changed() {
        return Ok(());
    }
    if from.is_changed_here() {
        // The slot itself was assigned or nulled: replace wholesale,
        // subtree flags included.
        *into = from.clone();
        return Ok(());
    }
    let from_node = match from.node() {
        Some(node) => node,
        None => return Ok(()),
    };
    match into.get_mut() {
        Ok(into_node) => merge_node(into_node, from_node),
        Err(_) => Err(MergeError::NullTarget {
            path: String::new(),
        }),
    }
}

fn merge_sequence(into: &mut SequenceSlot, from: &SequenceSlot) -> MergeResult<()> {
    if !from.is_changed() {
        return Ok(());
    }
    if from.is_changed_here() {
        // Structural change: the delta's content is the new truth, keys to
        // the old content are gone.
        *into = from.clone();
        return Ok(());
    }
    if into.len() != from.len() {
        return Err(MergeError::LengthMismatch {
            path: String::new(),
            into_len: into.len(),
            from_len: from.len(),
        });
    }
    for (index, (into_item, from_item)) in into.iter_mut().zip(from.iter()).enumerate() {
        merge_item(into_item, from_item).map_err(|e| e.nest(&format!("[{index}]")))?;
    }
    Ok(())
}

fn merge_dictionary(into: &mut DictionarySlot, from: &DictionarySlot) -> MergeResult<()> {
    if !from.is_changed() {
        return Ok(());
    }
    if from.is_changed_here() {
        *into = from.clone();
        return Ok(());
    }
    for (key, from_item) in from.iter() {
        let into_item = into.get_mut(key).map_err(|_| MergeError::MissingKey {
            path: String::new(),
            key: key.to_string(),
        })?;
        merge_item(into_item, from_item).map_err(|e| e.nest(&format!("[{key}]")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use som_model::{DictKey, ObjectFactory, ScalarValue};
    use som_schema::{ClassSpec, ElementSpec, KeySpec, MemberSpec, Repository, TypeId};

    fn repo() -> Repository {
        Repository::builder()
            .with_class(
                ClassSpec::new("Reading")
                    .with_member(MemberSpec::single("value", ElementSpec::Float64))
                    .with_member(MemberSpec::single("count", ElementSpec::Int32)),
            )
            .with_class(
                ClassSpec::new("Telemetry")
                    .with_member(MemberSpec::single("source", ElementSpec::Str))
                    .with_member(MemberSpec::single(
                        "latest",
                        ElementSpec::Object("Reading".to_string()),
                    ))
                    .with_member(MemberSpec::array("axes", ElementSpec::Float32, 2))
                    .with_member(MemberSpec::sequence(
                        "history",
                        ElementSpec::Object("Reading".to_string()),
                    ))
                    .with_member(MemberSpec::dictionary(
                        "channels",
                        KeySpec::Int32,
                        ElementSpec::Object("Reading".to_string()),
                    )),
            )
            .with_class(ClassSpec::new("Unrelated"))
            .build()
            .unwrap()
    }

    fn reading(factory: &ObjectFactory<'_>, value: f64, count: i32) -> ObjectNode {
        let mut node = factory.create_by_name("Reading").unwrap();
        node.member_mut("value")
            .unwrap()
            .value_mut()
            .unwrap()
            .set(ScalarValue::Float64(value))
            .unwrap();
        node.member_mut("count")
            .unwrap()
            .value_mut()
            .unwrap()
            .set(ScalarValue::Int32(count))
            .unwrap();
        node
    }

    /// A telemetry object with one history element, one channel entry, and
    /// all flags cleared, standing in for a subscriber's cached state.
    fn baseline(factory: &ObjectFactory<'_>) -> ObjectNode {
        let mut node = factory.create_by_name("Telemetry").unwrap();
        node.member_mut("source")
            .unwrap()
            .value_mut()
            .unwrap()
            .set(ScalarValue::Str("gps".to_string()))
            .unwrap();
        node.member_mut("latest")
            .unwrap()
            .object_mut()
            .unwrap()
            .set(reading(factory, 1.0, 1))
            .unwrap();
        node.member_mut("history")
            .unwrap()
            .sequence_mut()
            .unwrap()
            .push_object(reading(factory, 1.0, 1))
            .unwrap();
        node.member_mut("channels")
            .unwrap()
            .dictionary_mut()
            .unwrap()
            .insert_object(DictKey::Int32(1), reading(factory, 2.0, 2))
            .unwrap();
        node.set_changed(false);
        node
    }

    #[test]
    fn unchanged_delta_is_a_no_op() {
        let repo = repo();
        let factory = ObjectFactory::new(&repo);
        let mut into = baseline(&factory);
        let snapshot = into.clone();
        let from = factory.create_by_name("Telemetry").unwrap();

        merge_changes(&mut into, &from).unwrap();
        assert_eq!(into, snapshot);
    }

    #[test]
    fn class_mismatch_rejected_before_any_mutation() {
        let repo = repo();
        let factory = ObjectFactory::new(&repo);
        let mut into = baseline(&factory);
        let snapshot = into.clone();
        let from = factory.create_by_name("Unrelated").unwrap();

        let err = merge_changes(&mut into, &from).unwrap_err();
        assert_eq!(
            err,
            MergeError::ClassMismatch {
                into: TypeId::derive("Telemetry"),
                from: TypeId::derive("Unrelated"),
            }
        );
        assert_eq!(into, snapshot);
    }

    #[test]
    fn changed_value_overwrites_including_null() {
        let repo = repo();
        let factory = ObjectFactory::new(&repo);
        let mut into = baseline(&factory);

        let mut from = factory.create_by_name("Telemetry").unwrap();
        from.member_mut("source").unwrap().value_mut().unwrap().set_null();

        merge_changes(&mut into, &from).unwrap();
        let source = into.member("source").unwrap().value().unwrap();
        assert!(source.is_null());
        assert!(source.is_changed());
    }

    #[test]
    fn unchanged_members_survive() {
        let repo = repo();
        let factory = ObjectFactory::new(&repo);
        let mut into = baseline(&factory);

        let mut from = factory.create_by_name("Telemetry").unwrap();
        from.member_mut("source")
            .unwrap()
            .value_mut()
            .unwrap()
            .set(ScalarValue::Str("radar".to_string()))
            .unwrap();

        merge_changes(&mut into, &from).unwrap();
        assert_eq!(
            into.member("source")
                .unwrap()
                .value()
                .unwrap()
                .get()
                .unwrap(),
            &ScalarValue::Str("radar".to_string())
        );
        // The object member the delta never touched is intact.
        assert!(!into.member("latest").unwrap().object().unwrap().is_null());
    }

    #[test]
    fn assigned_object_slot_replaces_wholesale() {
        let repo = repo();
        let factory = ObjectFactory::new(&repo);
        let mut into = baseline(&factory);

        let mut from = factory.create_by_name("Telemetry").unwrap();
        from.member_mut("latest")
            .unwrap()
            .object_mut()
            .unwrap()
            .set(reading(&factory, 9.0, 9))
            .unwrap();

        merge_changes(&mut into, &from).unwrap();
        let latest = into.member("latest").unwrap().object().unwrap();
        assert!(latest.is_changed_here());
        assert_eq!(
            latest
                .get()
                .unwrap()
                .member("value")
                .unwrap()
                .value()
                .unwrap()
                .get()
                .unwrap(),
            &ScalarValue::Float64(9.0)
        );
    }

    #[test]
    fn nested_field_change_merges_into_existing_object() {
        let repo = repo();
        let factory = ObjectFactory::new(&repo);
        let mut into = baseline(&factory);

        // Delta carries only an inner field change: slot not assigned.
        let mut from = factory.create_by_name("Telemetry").unwrap();
        let mut inner = factory.create_by_name("Reading").unwrap();
        inner
            .member_mut("count")
            .unwrap()
            .value_mut()
            .unwrap()
            .set(ScalarValue::Int32(5))
            .unwrap();
        from.member_mut("latest")
            .unwrap()
            .object_mut()
            .unwrap()
            .set(inner)
            .unwrap();
        from.member_mut("latest")
            .unwrap()
            .object_mut()
            .unwrap()
            .set_changed_here(false);

        merge_changes(&mut into, &from).unwrap();
        let latest = into.member("latest").unwrap().object().unwrap();
        assert!(!latest.is_changed_here());
        let node = latest.get().unwrap();
        // The changed field landed, the unchanged one kept its old value.
        assert_eq!(
            node.member("count").unwrap().value().unwrap().get().unwrap(),
            &ScalarValue::Int32(5)
        );
        assert_eq!(
            node.member("value").unwrap().value().unwrap().get().unwrap(),
            &ScalarValue::Float64(1.0)
        );
    }

    #[test]
    fn nested_change_into_null_object_is_a_violation() {
        let repo = repo();
        let factory = ObjectFactory::new(&repo);
        let mut into = factory.create_by_name("Telemetry").unwrap();

        let mut from = factory.create_by_name("Telemetry").unwrap();
        from.member_mut("latest")
            .unwrap()
            .object_mut()
            .unwrap()
            .set(reading(&factory, 1.0, 1))
            .unwrap();
        from.member_mut("latest")
            .unwrap()
            .object_mut()
            .unwrap()
            .set_changed_here(false);

        let err = merge_changes(&mut into, &from).unwrap_err();
        assert_eq!(
            err,
            MergeError::NullTarget {
                path: "latest".to_string()
            }
        );
    }

    #[test]
    fn replaced_sequence_wins_wholesale() {
        let repo = repo();
        let factory = ObjectFactory::new(&repo);
        let mut into = baseline(&factory);

        let mut from = factory.create_by_name("Telemetry").unwrap();
        let seq = from.member_mut("history").unwrap().sequence_mut().unwrap();
        seq.push_object(reading(&factory, 7.0, 7)).unwrap();
        seq.push_object(reading(&factory, 8.0, 8)).unwrap();

        merge_changes(&mut into, &from).unwrap();
        let history = into.member("history").unwrap().sequence().unwrap();
        assert!(history.is_changed_here());
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn sequence_content_merge_updates_elements_in_place() {
        let repo = repo();
        let factory = ObjectFactory::new(&repo);
        let mut into = baseline(&factory);

        // Same length, structural flag clear, element 0 carries one
        // changed field.
        let mut from = factory.create_by_name("Telemetry").unwrap();
        let mut inner = factory.create_by_name("Reading").unwrap();
        inner
            .member_mut("value")
            .unwrap()
            .value_mut()
            .unwrap()
            .set(ScalarValue::Float64(3.5))
            .unwrap();
        let seq = from.member_mut("history").unwrap().sequence_mut().unwrap();
        seq.push_object(inner).unwrap();
        seq.get_mut(0)
            .unwrap()
            .as_object_mut()
            .unwrap()
            .set_changed_here(false);
        seq.set_changed_here(false);

        merge_changes(&mut into, &from).unwrap();
        let history = into.member("history").unwrap().sequence().unwrap();
        assert!(!history.is_changed_here());
        assert_eq!(history.len(), 1);
        let element = history.get(0).unwrap().as_object().unwrap().get().unwrap();
        assert_eq!(
            element
                .member("value")
                .unwrap()
                .value()
                .unwrap()
                .get()
                .unwrap(),
            &ScalarValue::Float64(3.5)
        );
        assert_eq!(
            element
                .member("count")
                .unwrap()
                .value()
                .unwrap()
                .get()
                .unwrap(),
            &ScalarValue::Int32(1)
        );
    }

    #[test]
    fn sequence_content_merge_requires_equal_length() {
        let repo = repo();
        let factory = ObjectFactory::new(&repo);
        let mut into = baseline(&factory);

        let mut from = factory.create_by_name("Telemetry").unwrap();
        let seq = from.member_mut("history").unwrap().sequence_mut().unwrap();
        seq.push_object(reading(&factory, 1.0, 1)).unwrap();
        seq.push_object(reading(&factory, 2.0, 2)).unwrap();
        seq.set_changed_here(false);

        let err = merge_changes(&mut into, &from).unwrap_err();
        assert_eq!(
            err,
            MergeError::LengthMismatch {
                path: "history".to_string(),
                into_len: 1,
                from_len: 2,
            }
        );
    }

    #[test]
    fn replaced_dictionary_drops_absent_keys() {
        let repo = repo();
        let factory = ObjectFactory::new(&repo);
        let mut into = baseline(&factory);

        let mut from = factory.create_by_name("Telemetry").unwrap();
        from.member_mut("channels")
            .unwrap()
            .dictionary_mut()
            .unwrap()
            .insert_object(DictKey::Int32(2), reading(&factory, 4.0, 4))
            .unwrap();

        merge_changes(&mut into, &from).unwrap();
        let channels = into.member("channels").unwrap().dictionary().unwrap();
        assert!(channels.is_changed_here());
        assert_eq!(channels.len(), 1);
        assert!(channels.contains_key(&DictKey::Int32(2)));
        assert!(!channels.contains_key(&DictKey::Int32(1)));
    }

    #[test]
    fn dictionary_content_merge_updates_matching_keys() {
        let repo = repo();
        let factory = ObjectFactory::new(&repo);
        let mut into = baseline(&factory);

        let mut from = factory.create_by_name("Telemetry").unwrap();
        let mut inner = factory.create_by_name("Reading").unwrap();
        inner
            .member_mut("count")
            .unwrap()
            .value_mut()
            .unwrap()
            .set(ScalarValue::Int32(20))
            .unwrap();
        let dict = from.member_mut("channels").unwrap().dictionary_mut().unwrap();
        dict.insert_object(DictKey::Int32(1), inner).unwrap();
        dict.get_mut(&DictKey::Int32(1))
            .unwrap()
            .as_object_mut()
            .unwrap()
            .set_changed_here(false);
        dict.set_changed_here(false);

        merge_changes(&mut into, &from).unwrap();
        let channels = into.member("channels").unwrap().dictionary().unwrap();
        assert!(!channels.is_changed_here());
        let element = channels
            .get(&DictKey::Int32(1))
            .unwrap()
            .as_object()
            .unwrap()
            .get()
            .unwrap();
        assert_eq!(
            element
                .member("count")
                .unwrap()
                .value()
                .unwrap()
                .get()
                .unwrap(),
            &ScalarValue::Int32(20)
        );
        assert_eq!(
            element
                .member("value")
                .unwrap()
                .value()
                .unwrap()
                .get()
                .unwrap(),
            &ScalarValue::Float64(2.0)
        );
    }

    #[test]
    fn dictionary_content_merge_missing_key_is_a_violation() {
        let repo = repo();
        let factory = ObjectFactory::new(&repo);
        let mut into = baseline(&factory);

        let mut from = factory.create_by_name("Telemetry").unwrap();
        let dict = from.member_mut("channels").unwrap().dictionary_mut().unwrap();
        dict.insert_object(DictKey::Int32(99), reading(&factory, 1.0, 1))
            .unwrap();
        dict.set_changed_here(false);

        let err = merge_changes(&mut into, &from).unwrap_err();
        assert_eq!(
            err,
            MergeError::MissingKey {
                path: "channels".to_string(),
                key: "99".to_string(),
            }
        );
    }

    #[test]
    fn array_elements_merge_independently() {
        let repo = repo();
        let factory = ObjectFactory::new(&repo);
        let mut into = baseline(&factory);
        into.member_mut("axes")
            .unwrap()
            .array_mut()
            .unwrap()
            .get_mut(0)
            .unwrap()
            .as_value_mut()
            .unwrap()
            .set(ScalarValue::Float32(1.0))
            .unwrap();
        into.set_changed(false);

        let mut from = factory.create_by_name("Telemetry").unwrap();
        from.member_mut("axes")
            .unwrap()
            .array_mut()
            .unwrap()
            .get_mut(1)
            .unwrap()
            .as_value_mut()
            .unwrap()
            .set(ScalarValue::Float32(2.0))
            .unwrap();

        merge_changes(&mut into, &from).unwrap();
        let axes = into.member("axes").unwrap().array().unwrap();
        assert_eq!(
            axes.get(0).unwrap().as_value().unwrap().get().unwrap(),
            &ScalarValue::Float32(1.0)
        );
        assert_eq!(
            axes.get(1).unwrap().as_value().unwrap().get().unwrap(),
            &ScalarValue::Float32(2.0)
        );
    }

    #[test]
    fn merge_is_idempotent_for_the_same_delta() {
        let repo = repo();
        let factory = ObjectFactory::new(&repo);
        let mut into = baseline(&factory);

        let mut from = factory.create_by_name("Telemetry").unwrap();
        from.member_mut("source")
            .unwrap()
            .value_mut()
            .unwrap()
            .set(ScalarValue::Str("radar".to_string()))
            .unwrap();
        from.member_mut("history")
            .unwrap()
            .sequence_mut()
            .unwrap()
            .push_object(reading(&factory, 5.0, 5))
            .unwrap();

        merge_changes(&mut into, &from).unwrap();
        let once = into.clone();
        merge_changes(&mut into, &from).unwrap();
        assert_eq!(into, once);
    }
}
