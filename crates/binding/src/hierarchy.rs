//! Subtype relationships between named types.
//!
//! Rust types carry no runtime inheritance, so the relationships that decide
//! association matching and converter-constructor selection are declared
//! explicitly. A type may have any number of direct supertypes (a base
//! message plus marker interfaces, for instance).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::TypeName;

/// Declared supertype edges between [`TypeName`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeHierarchy {
    #[serde(default)]
    supertypes: HashMap<TypeName, Vec<TypeName>>,
}

impl TypeHierarchy {
    /// Creates an empty hierarchy in which every type is only assignable to itself.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `supertype` as a direct supertype of `subtype`.
    pub fn with_supertype(mut self, subtype: TypeName, supertype: TypeName) -> Self {
        self.declare(subtype, supertype);
        self
    }

    /// Declares `supertype` as a direct supertype of `subtype`.
    ///
    /// Repeated declarations are ignored.
    pub fn declare(&mut self, subtype: TypeName, supertype: TypeName) {
        let direct = self.supertypes.entry(subtype).or_default();
        if !direct.contains(&supertype) {
            direct.push(supertype);
        }
    }

    /// Returns the direct supertypes declared for `ty`.
    pub fn direct_supertypes(&self, ty: &TypeName) -> &[TypeName] {
        self.supertypes.get(ty).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns `true` if a value of type `candidate` may be used where `target`
    /// is expected, i.e. `target` is `candidate` or one of its transitive
    /// supertypes.
    ///
    /// Cycles in the declared edges are tolerated.
    pub fn is_assignable_from(&self, target: &TypeName, candidate: &TypeName) -> bool {
        if target == candidate {
            return true;
        }

        let mut visited: HashSet<&TypeName> = HashSet::new();
        let mut pending: Vec<&TypeName> = vec![candidate];
        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            for parent in self.direct_supertypes(current) {
                if parent == target {
                    return true;
                }
                pending.push(parent);
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(name: &str) -> TypeName {
        TypeName::new(name).unwrap()
    }

    #[test]
    fn a_type_is_assignable_to_itself() {
        let hierarchy = TypeHierarchy::new();
        assert!(hierarchy.is_assignable_from(&ty("Order"), &ty("Order")));
        assert!(!hierarchy.is_assignable_from(&ty("Order"), &ty("Invoice")));
    }

    #[test]
    fn assignability_follows_transitive_supertypes() {
        let hierarchy = TypeHierarchy::new()
            .with_supertype(ty("PriorityOrder"), ty("Order"))
            .with_supertype(ty("Order"), ty("Entity"));

        assert!(hierarchy.is_assignable_from(&ty("Entity"), &ty("PriorityOrder")));
        assert!(hierarchy.is_assignable_from(&ty("Order"), &ty("PriorityOrder")));
        // Never downwards.
        assert!(!hierarchy.is_assignable_from(&ty("PriorityOrder"), &ty("Entity")));
    }

    #[test]
    fn multiple_direct_supertypes_are_all_searched() {
        let hierarchy = TypeHierarchy::new()
            .with_supertype(ty("Circle"), ty("Shape"))
            .with_supertype(ty("Circle"), ty("Auditable"));

        assert!(hierarchy.is_assignable_from(&ty("Auditable"), &ty("Circle")));
        assert_eq!(hierarchy.direct_supertypes(&ty("Circle")).len(), 2);
    }

    #[test]
    fn cycles_terminate() {
        let hierarchy = TypeHierarchy::new()
            .with_supertype(ty("A"), ty("B"))
            .with_supertype(ty("B"), ty("A"));

        assert!(hierarchy.is_assignable_from(&ty("B"), &ty("A")));
        assert!(!hierarchy.is_assignable_from(&ty("C"), &ty("A")));
    }
}
