use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::descriptor::{
    ClassDescriptor, Collection, ElementType, EnumDescriptor, KeyKind, MemberDescriptor,
    ScalarKind,
};
use crate::error::{SchemaError, SchemaResult};
use crate::source::{ClassSpec, CollectionSpec, ElementSpec, KeySpec, SchemaSource};
use crate::type_id::TypeId;

/// Immutable set of class and enumeration descriptors.
///
/// A repository is built once, validated, and then shared read-only. Class
/// descriptors live behind `Arc` so object graphs can hold their descriptor
/// without copying it.
#[derive(Debug, Clone, Default)]
pub struct Repository {
    classes: BTreeMap<TypeId, Arc<ClassDescriptor>>,
    enums: BTreeMap<TypeId, EnumDescriptor>,
    names: BTreeMap<String, TypeId>,
}

impl Repository {
    /// Start building a repository.
    pub fn builder() -> RepositoryBuilder {
        RepositoryBuilder::default()
    }

    /// Build a repository from a parsed schema source.
    pub fn from_source(source: SchemaSource) -> SchemaResult<Self> {
        build_repository(source)
    }

    /// Build a repository from the JSON source format.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        let source: SchemaSource =
            serde_json::from_str(json).map_err(|e| SchemaError::Source(e.to_string()))?;
        build_repository(source)
    }

    /// Look up a class descriptor.
    pub fn class(&self, id: TypeId) -> Option<&Arc<ClassDescriptor>> {
        self.classes.get(&id)
    }

    /// Look up a class by qualified name.
    pub fn class_by_name(&self, name: &str) -> Option<&Arc<ClassDescriptor>> {
        self.names.get(name).and_then(|id| self.classes.get(id))
    }

    /// Look up an enumeration descriptor.
    pub fn enum_type(&self, id: TypeId) -> Option<&EnumDescriptor> {
        self.enums.get(&id)
    }

    /// Look up an enumeration by name.
    pub fn enum_by_name(&self, name: &str) -> Option<&EnumDescriptor> {
        self.names.get(name).and_then(|id| self.enums.get(id))
    }

    /// Returns `true` if the id names a class or an enumeration.
    pub fn contains(&self, id: TypeId) -> bool {
        self.classes.contains_key(&id) || self.enums.contains_key(&id)
    }

    /// Number of classes.
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Number of enumerations.
    pub fn enum_count(&self) -> usize {
        self.enums.len()
    }

    /// Iterate classes in id order.
    pub fn classes(&self) -> impl Iterator<Item = &Arc<ClassDescriptor>> {
        self.classes.values()
    }

    /// Iterate enumerations in id order.
    pub fn enums(&self) -> impl Iterator<Item = &EnumDescriptor> {
        self.enums.values()
    }
}

/// Accumulates source specs and resolves them into a [`Repository`].
#[derive(Debug, Default)]
pub struct RepositoryBuilder {
    source: SchemaSource,
}

impl RepositoryBuilder {
    pub fn with_enum(mut self, name: impl Into<String>) -> Self {
        self.source.enums.push(name.into());
        self
    }

    pub fn with_class(mut self, spec: ClassSpec) -> Self {
        self.source.classes.push(spec);
        self
    }

    /// Resolve names, validate, and produce the repository.
    pub fn build(self) -> SchemaResult<Repository> {
        build_repository(self.source)
    }
}

fn build_repository(source: SchemaSource) -> SchemaResult<Repository> {
    let mut names: BTreeMap<String, TypeId> = BTreeMap::new();
    let mut ids: BTreeSet<TypeId> = BTreeSet::new();
    let mut enums: BTreeMap<TypeId, EnumDescriptor> = BTreeMap::new();
    let mut enum_ids: BTreeSet<TypeId> = BTreeSet::new();
    let mut class_ids: BTreeSet<TypeId> = BTreeSet::new();

    for name in &source.enums {
        let id = TypeId::derive(name);
        if names.contains_key(name.as_str()) || !ids.insert(id) {
            return Err(SchemaError::DuplicateType { name: name.clone() });
        }
        names.insert(name.clone(), id);
        enum_ids.insert(id);
        enums.insert(
            id,
            EnumDescriptor {
                type_id: id,
                name: name.clone(),
            },
        );
    }

    // Register every class name up front so classes can reference each
    // other regardless of declaration order.
    for spec in &source.classes {
        let id = TypeId::derive(&spec.name);
        if names.contains_key(spec.name.as_str()) || !ids.insert(id) {
            return Err(SchemaError::DuplicateType {
                name: spec.name.clone(),
            });
        }
        names.insert(spec.name.clone(), id);
        class_ids.insert(id);
    }

    let mut classes: BTreeMap<TypeId, Arc<ClassDescriptor>> = BTreeMap::new();
    for spec in &source.classes {
        let class_id = names[spec.name.as_str()];
        let mut members = Vec::with_capacity(spec.members.len());
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for member in &spec.members {
            if !seen.insert(member.name.as_str()) {
                return Err(SchemaError::DuplicateMember {
                    class: spec.name.clone(),
                    member: member.name.clone(),
                });
            }
            let referrer = format!("{}.{}", spec.name, member.name);
            let element = resolve_element(&member.element, &names, &enum_ids, &class_ids, &referrer)?;
            let collection = resolve_collection(
                &member.collection,
                &names,
                &enum_ids,
                &spec.name,
                &member.name,
            )?;
            members.push(MemberDescriptor {
                name: member.name.clone(),
                element,
                collection,
            });
        }
        classes.insert(
            class_id,
            Arc::new(ClassDescriptor {
                type_id: class_id,
                name: spec.name.clone(),
                members,
            }),
        );
    }

    check_composition_cycles(&classes)?;

    Ok(Repository {
        classes,
        enums,
        names,
    })
}

fn resolve_element(
    spec: &ElementSpec,
    names: &BTreeMap<String, TypeId>,
    enum_ids: &BTreeSet<TypeId>,
    class_ids: &BTreeSet<TypeId>,
    referrer: &str,
) -> SchemaResult<ElementType> {
    Ok(match spec {
        ElementSpec::Bool => ElementType::Scalar(ScalarKind::Bool),
        ElementSpec::Int32 => ElementType::Scalar(ScalarKind::Int32),
        ElementSpec::Int64 => ElementType::Scalar(ScalarKind::Int64),
        ElementSpec::Float32 => ElementType::Scalar(ScalarKind::Float32),
        ElementSpec::Float64 => ElementType::Scalar(ScalarKind::Float64),
        ElementSpec::Str => ElementType::Scalar(ScalarKind::Str),
        ElementSpec::Binary => ElementType::Scalar(ScalarKind::Binary),
        ElementSpec::Enum(name) => {
            ElementType::Scalar(ScalarKind::Enum(resolve_ref(name, names, enum_ids, referrer)?))
        }
        ElementSpec::Object(name) => {
            ElementType::Object(resolve_ref(name, names, class_ids, referrer)?)
        }
    })
}

fn resolve_collection(
    spec: &CollectionSpec,
    names: &BTreeMap<String, TypeId>,
    enum_ids: &BTreeSet<TypeId>,
    class: &str,
    member: &str,
) -> SchemaResult<Collection> {
    Ok(match spec {
        CollectionSpec::Single => Collection::Single,
        CollectionSpec::Array(0) => {
            return Err(SchemaError::EmptyArray {
                class: class.to_string(),
                member: member.to_string(),
            })
        }
        CollectionSpec::Array(len) => Collection::Array(*len),
        CollectionSpec::Sequence => Collection::Sequence,
        CollectionSpec::Dictionary(key) => Collection::Dictionary(match key {
            KeySpec::Int32 => KeyKind::Int32,
            KeySpec::Int64 => KeyKind::Int64,
            KeySpec::Str => KeyKind::Str,
            KeySpec::Enum(name) => {
                let referrer = format!("{class}.{member}");
                KeyKind::Enum(resolve_ref(name, names, enum_ids, &referrer)?)
            }
        }),
    })
}

fn resolve_ref(
    name: &str,
    names: &BTreeMap<String, TypeId>,
    allowed: &BTreeSet<TypeId>,
    referrer: &str,
) -> SchemaResult<TypeId> {
    names
        .get(name)
        .copied()
        .filter(|id| allowed.contains(id))
        .ok_or_else(|| SchemaError::UnknownType {
            name: name.to_string(),
            referrer: referrer.to_string(),
        })
}

/// Member composition must stay acyclic through single and array slots.
/// Sequences and dictionaries start empty, so recursive types through them
/// are allowed.
fn check_composition_cycles(
    classes: &BTreeMap<TypeId, Arc<ClassDescriptor>>,
) -> SchemaResult<()> {
    for (start, start_class) in classes {
        let mut stack = vec![*start];
        let mut visited: BTreeSet<TypeId> = BTreeSet::new();
        while let Some(id) = stack.pop() {
            if let Some(class) = classes.get(&id) {
                for member in &class.members {
                    let target = match (member.collection, member.element) {
                        (
                            Collection::Single | Collection::Array(_),
                            ElementType::Object(target),
                        ) => target,
                        _ => continue,
                    };
                    if target == *start {
                        return Err(SchemaError::CompositionCycle {
                            class: start_class.name.clone(),
                        });
                    }
                    if visited.insert(target) {
                        stack.push(target);
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemberSpec;

    fn demo_source() -> SchemaSource {
        SchemaSource {
            enums: vec!["Quality".to_string()],
            classes: vec![
                ClassSpec::new("Reading")
                    .with_member(MemberSpec::single("value", ElementSpec::Float64))
                    .with_member(MemberSpec::single("grade", ElementSpec::Enum("Quality".to_string()))),
                ClassSpec::new("Sensor")
                    .with_member(MemberSpec::single("label", ElementSpec::Str))
                    .with_member(MemberSpec::array("axes", ElementSpec::Float32, 3))
                    .with_member(MemberSpec::sequence(
                        "readings",
                        ElementSpec::Object("Reading".to_string()),
                    ))
                    .with_member(MemberSpec::dictionary(
                        "by_slot",
                        KeySpec::Int32,
                        ElementSpec::Object("Reading".to_string()),
                    )),
            ],
        }
    }

    #[test]
    fn builds_and_resolves_names() {
        let repo = Repository::from_source(demo_source()).unwrap();
        assert_eq!(repo.class_count(), 2);
        assert_eq!(repo.enum_count(), 1);

        let sensor = repo.class_by_name("Sensor").unwrap();
        assert_eq!(sensor.type_id, TypeId::derive("Sensor"));
        assert_eq!(sensor.member_count(), 4);

        let (ordinal, readings) = sensor.member("readings").unwrap();
        assert_eq!(ordinal, 2);
        assert_eq!(
            readings.element,
            ElementType::Object(TypeId::derive("Reading"))
        );
        assert_eq!(readings.collection, Collection::Sequence);
    }

    #[test]
    fn enum_references_resolve() {
        let repo = Repository::from_source(demo_source()).unwrap();
        let reading = repo.class_by_name("Reading").unwrap();
        let (_, grade) = reading.member("grade").unwrap();
        assert_eq!(
            grade.element,
            ElementType::Scalar(ScalarKind::Enum(TypeId::derive("Quality")))
        );
        assert!(repo.enum_by_name("Quality").is_some());
    }

    #[test]
    fn duplicate_class_rejected() {
        let err = Repository::builder()
            .with_class(ClassSpec::new("Sensor"))
            .with_class(ClassSpec::new("Sensor"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateType {
                name: "Sensor".to_string()
            }
        );
    }

    #[test]
    fn duplicate_member_rejected() {
        let err = Repository::builder()
            .with_class(
                ClassSpec::new("Sensor")
                    .with_member(MemberSpec::single("label", ElementSpec::Str))
                    .with_member(MemberSpec::single("label", ElementSpec::Int32)),
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateMember {
                class: "Sensor".to_string(),
                member: "label".to_string()
            }
        );
    }

    #[test]
    fn unknown_object_reference_rejected() {
        let err = Repository::builder()
            .with_class(ClassSpec::new("Sensor").with_member(MemberSpec::single(
                "peer",
                ElementSpec::Object("Missing".to_string()),
            )))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownType {
                name: "Missing".to_string(),
                referrer: "Sensor.peer".to_string()
            }
        );
    }

    #[test]
    fn enum_reference_to_class_rejected() {
        let err = Repository::builder()
            .with_class(ClassSpec::new("Reading"))
            .with_class(ClassSpec::new("Sensor").with_member(MemberSpec::single(
                "grade",
                ElementSpec::Enum("Reading".to_string()),
            )))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType { .. }));
    }

    #[test]
    fn zero_length_array_rejected() {
        let err = Repository::builder()
            .with_class(
                ClassSpec::new("Sensor")
                    .with_member(MemberSpec::array("axes", ElementSpec::Float32, 0)),
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::EmptyArray {
                class: "Sensor".to_string(),
                member: "axes".to_string()
            }
        );
    }

    #[test]
    fn self_containment_rejected() {
        let err = Repository::builder()
            .with_class(ClassSpec::new("Node").with_member(MemberSpec::single(
                "inner",
                ElementSpec::Object("Node".to_string()),
            )))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::CompositionCycle {
                class: "Node".to_string()
            }
        );
    }

    #[test]
    fn indirect_cycle_rejected() {
        let err = Repository::builder()
            .with_class(ClassSpec::new("Alpha").with_member(MemberSpec::single(
                "beta",
                ElementSpec::Object("Beta".to_string()),
            )))
            .with_class(ClassSpec::new("Beta").with_member(MemberSpec::array(
                "alphas",
                ElementSpec::Object("Alpha".to_string()),
                2,
            )))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::CompositionCycle { .. }));
    }

    #[test]
    fn recursive_sequence_allowed() {
        let repo = Repository::builder()
            .with_class(ClassSpec::new("TreeNode").with_member(MemberSpec::sequence(
                "children",
                ElementSpec::Object("TreeNode".to_string()),
            )))
            .build()
            .unwrap();
        assert!(repo.class_by_name("TreeNode").is_some());
    }

    #[test]
    fn from_json_loads() {
        let json = r#"{
            "enums": ["Quality"],
            "classes": [
                { "name": "Reading", "members": [
                    { "name": "value", "element": "float64" },
                    { "name": "grade", "element": { "enum": "Quality" } }
                ]}
            ]
        }"#;
        let repo = Repository::from_json(json).unwrap();
        assert!(repo.class_by_name("Reading").is_some());
    }

    #[test]
    fn from_json_bad_input_is_source_error() {
        let err = Repository::from_json("not json").unwrap_err();
        assert!(matches!(err, SchemaError::Source(_)));
    }
}
