use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

use crate::syntax::NodeId;

/// One level of the compile-time symbol table.
///
/// Maps names to their declaring node and borrows its enclosing scope, so a
/// scope lives exactly as long as the walk over its block.
#[derive(Debug)]
pub struct Scope<'s, 'a> {
    parent: Option<&'s Scope<'s, 'a>>,
    members: HashMap<&'a str, NodeId>,
}

impl<'s, 'a> Scope<'s, 'a> {
    /// An outermost scope.
    pub fn root() -> Self {
        Scope {
            parent: None,
            members: HashMap::new(),
        }
    }

    pub fn with_parent(parent: &'s Scope<'s, 'a>) -> Self {
        Scope {
            parent: Some(parent),
            members: HashMap::new(),
        }
    }

    /// Register `name` in this scope.
    ///
    /// Fails with the previous declaration if the name is already taken in
    /// this scope. Shadowing a name from an enclosing scope is allowed.
    pub fn declare(&mut self, name: &'a str, decl: NodeId) -> Result<(), NodeId> {
        match self.members.entry(name) {
            Entry::Occupied(previous) => Err(*previous.get()),
            Entry::Vacant(slot) => {
                slot.insert(decl);
                Ok(())
            }
        }
    }

    /// Find the declaration visible under `name`, innermost first.
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.members
            .get(name)
            .copied()
            .or_else(|| self.parent.and_then(|parent| parent.lookup(name)))
    }
}
