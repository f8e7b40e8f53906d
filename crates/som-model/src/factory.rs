use std::sync::Arc;

use som_schema::{Repository, TypeId};

use crate::error::{AccessError, AccessResult};
use crate::node::ObjectNode;

/// Creates fresh object instances from a schema repository.
///
/// A factory is a cheap borrow of the repository; create one wherever
/// instances are needed and let it go out of scope.
#[derive(Debug, Clone, Copy)]
pub struct ObjectFactory<'a> {
    repository: &'a Repository,
}

impl<'a> ObjectFactory<'a> {
    pub fn new(repository: &'a Repository) -> Self {
        Self { repository }
    }

    /// The repository this factory creates from.
    pub fn repository(&self) -> &'a Repository {
        self.repository
    }

    /// Create an all-null, unchanged instance of the class.
    pub fn create(&self, type_id: TypeId) -> AccessResult<ObjectNode> {
        let class = self
            .repository
            .class(type_id)
            .ok_or(AccessError::UnknownClass(type_id))?;
        Ok(ObjectNode::new(Arc::clone(class)))
    }

    /// Create by qualified class name.
    pub fn create_by_name(&self, name: &str) -> AccessResult<ObjectNode> {
        let class = self
            .repository
            .class_by_name(name)
            .ok_or_else(|| AccessError::UnknownClass(TypeId::derive(name)))?;
        Ok(ObjectNode::new(Arc::clone(class)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use som_schema::{ClassSpec, ElementSpec, MemberSpec, Repository};

    fn repo() -> Repository {
        Repository::builder()
            .with_class(
                ClassSpec::new("Reading")
                    .with_member(MemberSpec::single("value", ElementSpec::Float64))
                    .with_member(MemberSpec::array("axes", ElementSpec::Float32, 2)),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn creates_instances_with_schema_shape() {
        let repo = repo();
        let factory = ObjectFactory::new(&repo);
        let node = factory.create(TypeId::derive("Reading")).unwrap();
        assert_eq!(node.type_id(), TypeId::derive("Reading"));
        assert_eq!(node.member_count(), 2);
        assert_eq!(node.member("axes").unwrap().array().unwrap().len(), 2);
        assert!(!node.is_changed());
    }

    #[test]
    fn create_by_name_resolves() {
        let repo = repo();
        let factory = ObjectFactory::new(&repo);
        let node = factory.create_by_name("Reading").unwrap();
        assert_eq!(node.type_id(), TypeId::derive("Reading"));
    }

    #[test]
    fn unknown_class_errors() {
        let repo = repo();
        let factory = ObjectFactory::new(&repo);
        let missing = TypeId::derive("Missing");
        assert_eq!(
            factory.create(missing).unwrap_err(),
            AccessError::UnknownClass(missing)
        );
        assert_eq!(
            factory.create_by_name("Missing").unwrap_err(),
            AccessError::UnknownClass(missing)
        );
    }
}
