use crate::structure::ClassStructure;
use std::collections::{HashMap, HashSet, VecDeque};

/// Direct supertypes of the classes being rewritten.
///
/// Member references name the class they were compiled against, which may be
/// a subclass of the declaring class. Resolving such a reference walks this
/// hierarchy the way the JVM does, so a renamed inherited member is renamed
/// at every call site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassHierarchy {
    parents: HashMap<String, Vec<String>>,
}

impl ClassHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_structures<'c>(structures: impl IntoIterator<Item = &'c ClassStructure>) -> Self {
        let mut hierarchy = Self::new();
        for structure in structures {
            hierarchy.insert(structure);
        }
        hierarchy
    }

    /// Records the super class followed by the interfaces of `structure`.
    pub fn insert(&mut self, structure: &ClassStructure) {
        let parents = structure
            .super_name
            .iter()
            .chain(&structure.interfaces)
            .cloned()
            .collect();
        self.parents.insert(structure.name.clone(), parents);
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn parents(&self, class: &str) -> &[String] {
        self.parents.get(class).map(Vec::as_slice).unwrap_or_default()
    }

    /// `class` followed by every known supertype, nearest first, each once.
    pub fn lineage<'a>(&'a self, class: &'a str) -> Vec<&'a str> {
        let mut lineage = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([class]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            lineage.push(current);
            queue.extend(self.parents(current).iter().map(String::as_str));
        }
        lineage
    }
}
