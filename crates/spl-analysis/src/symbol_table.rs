//! Scope tree and declaration arena.
//!
//! Scopes and entries live in flat vectors and refer to each other by index,
//! so the AST can link to declarations (`VarRef::resolved`) without any
//! pointers back into the tree.
//!
//! The SPL scope structure:
//!
//! ```text
//! Everywhere (root)
//! ├── Global      global variables
//! ├── Procedure   procedure names
//! ├── Function    function names
//! ├── Main        main's variables
//! └── Local:*     one per proc/func (params + locals), parent = Global
//! ```
//!
//! Local scopes hang off Global, not off Procedure/Function: those two
//! buckets exist only to hold callable names and are never consulted when a
//! variable use is resolved.

use std::collections::HashMap;
use std::fmt::Write as _;

use spl_syntax::ast::{EntryId, NodeId};

pub type ScopeId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Everywhere,
    Global,
    Procedure,
    Function,
    Main,
    Local,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Everywhere => "Everywhere",
            ScopeKind::Global => "Global",
            ScopeKind::Procedure => "Procedure",
            ScopeKind::Function => "Function",
            ScopeKind::Main => "Main",
            ScopeKind::Local => "Local",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Var,
    Param,
    Proc,
    Func,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Var => "var",
            EntryKind::Param => "param",
            EntryKind::Proc => "proc",
            EntryKind::Func => "func",
        }
    }
}

/// A single declared name.
#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    pub scope_id: ScopeId,
    pub decl_node_id: NodeId,
}

/// A namespace with a parent link and a name → entry table.
#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent_id: Option<ScopeId>,
    /// Display name; `Local:<def name>` for per-definition scopes.
    pub name: String,
    table: HashMap<String, EntryId>,
}

/// The complete symbol table for one compilation.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    entries: Vec<Entry>,
    pub base: BaseScopes,
}

/// Ids of the five scopes that exist for every program.
#[derive(Debug, Clone, Copy)]
pub struct BaseScopes {
    pub everywhere: ScopeId,
    pub global: ScopeId,
    pub procedure: ScopeId,
    pub function: ScopeId,
    pub main: ScopeId,
}

impl SymbolTable {
    /// Create a table holding only the base scope hierarchy.
    pub fn new() -> Self {
        let mut st = Self {
            scopes: Vec::new(),
            entries: Vec::new(),
            base: BaseScopes {
                everywhere: 0,
                global: 0,
                procedure: 0,
                function: 0,
                main: 0,
            },
        };
        let everywhere = st.new_scope(ScopeKind::Everywhere, None, "Everywhere");
        st.base = BaseScopes {
            everywhere,
            global: st.new_scope(ScopeKind::Global, Some(everywhere), "Global"),
            procedure: st.new_scope(ScopeKind::Procedure, Some(everywhere), "Procedure"),
            function: st.new_scope(ScopeKind::Function, Some(everywhere), "Function"),
            main: st.new_scope(ScopeKind::Main, Some(everywhere), "Main"),
        };
        st
    }

    pub fn new_scope(
        &mut self,
        kind: ScopeKind,
        parent_id: Option<ScopeId>,
        name: impl Into<String>,
    ) -> ScopeId {
        let id = self.scopes.len() as ScopeId;
        self.scopes.push(Scope {
            id,
            kind,
            parent_id,
            name: name.into(),
            table: HashMap::new(),
        });
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id as usize]
    }

    pub fn entry(&self, id: EntryId) -> &Entry {
        &self.entries[id as usize]
    }

    /// Declare `name` in the given scope. On a duplicate, returns the
    /// existing entry's id as the error value and leaves the table unchanged.
    pub fn declare(
        &mut self,
        scope_id: ScopeId,
        name: impl Into<String>,
        kind: EntryKind,
        decl_node_id: NodeId,
    ) -> Result<EntryId, EntryId> {
        let name = name.into();
        if let Some(&existing) = self.scopes[scope_id as usize].table.get(&name) {
            return Err(existing);
        }
        let id = self.entries.len() as EntryId;
        self.entries.push(Entry {
            name: name.clone(),
            kind,
            scope_id,
            decl_node_id,
        });
        self.scopes[scope_id as usize].table.insert(name, id);
        Ok(id)
    }

    /// Look up a name in one scope only.
    pub fn lookup_local(&self, scope_id: ScopeId, name: &str) -> Option<EntryId> {
        self.scopes[scope_id as usize].table.get(name).copied()
    }

    /// Look up a name from `scope_id` outward along the parent chain.
    pub fn lookup_chain(&self, scope_id: ScopeId, name: &str) -> Option<EntryId> {
        let mut current = Some(scope_id);
        while let Some(id) = current {
            if let Some(entry) = self.lookup_local(id, name) {
                return Some(entry);
            }
            current = self.scopes[id as usize].parent_id;
        }
        None
    }

    /// All names declared directly in a scope, sorted.
    pub fn names_in(&self, scope_id: ScopeId) -> Vec<&str> {
        let mut names: Vec<&str> = self.scopes[scope_id as usize]
            .table
            .keys()
            .map(|s| s.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Path from the root to the given scope, for diagnostics and dumps.
    pub fn scope_path(&self, scope_id: ScopeId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(scope_id);
        while let Some(id) = current {
            let scope = self.scope(id);
            parts.push(scope.name.as_str());
            current = scope.parent_id;
        }
        parts.reverse();
        parts.join(".")
    }

    /// Human-readable dump of the whole scope tree with entries.
    pub fn pretty_print(&self) -> String {
        let mut out = String::new();
        self.print_scope(&mut out, self.base.everywhere, 0);
        out
    }

    fn print_scope(&self, out: &mut String, scope_id: ScopeId, indent: usize) {
        let scope = self.scope(scope_id);
        let pad = "  ".repeat(indent);
        let _ = writeln!(out, "{}Scope #{} [{}]", pad, scope.id, scope.name);
        if scope.table.is_empty() {
            let _ = writeln!(out, "{}  (empty)", pad);
        } else {
            for name in self.names_in(scope_id) {
                let entry = self.entry(scope.table[name]);
                let _ = writeln!(
                    out,
                    "{}  {:<6} {:<16} (decl node #{})",
                    pad,
                    entry.kind.as_str(),
                    name,
                    entry.decl_node_id
                );
            }
        }
        for child in self.scopes.iter().filter(|s| s.parent_id == Some(scope_id)) {
            self.print_scope(out, child.id, indent + 1);
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_scopes_hang_off_everywhere() {
        let st = SymbolTable::new();
        for id in [st.base.global, st.base.procedure, st.base.function, st.base.main] {
            assert_eq!(st.scope(id).parent_id, Some(st.base.everywhere));
        }
    }

    #[test]
    fn declare_and_chain_lookup() {
        let mut st = SymbolTable::new();
        st.declare(st.base.global, "x", EntryKind::Var, 1).unwrap();
        let local = st.new_scope(ScopeKind::Local, Some(st.base.global), "Local:inc");
        st.declare(local, "n", EntryKind::Param, 2).unwrap();

        // local name shadows nothing, global is reachable through the chain
        let n = st.lookup_chain(local, "n").unwrap();
        assert_eq!(st.entry(n).kind, EntryKind::Param);
        let x = st.lookup_chain(local, "x").unwrap();
        assert_eq!(st.entry(x).scope_id, st.base.global);
        assert!(st.lookup_chain(local, "z").is_none());
    }

    #[test]
    fn duplicate_declaration_reports_existing_entry() {
        let mut st = SymbolTable::new();
        let first = st.declare(st.base.global, "x", EntryKind::Var, 1).unwrap();
        let err = st.declare(st.base.global, "x", EntryKind::Var, 9).unwrap_err();
        assert_eq!(err, first);
    }

    #[test]
    fn main_scope_does_not_see_globals_through_its_parent() {
        // Main's parent is Everywhere; the checker adds the Global fallback
        // explicitly rather than through the chain.
        let mut st = SymbolTable::new();
        st.declare(st.base.global, "g", EntryKind::Var, 1).unwrap();
        assert!(st.lookup_chain(st.base.main, "g").is_none());
    }

    #[test]
    fn scope_path_runs_from_the_root() {
        let mut st = SymbolTable::new();
        let local = st.new_scope(ScopeKind::Local, Some(st.base.global), "Local:p");
        assert_eq!(st.scope_path(local), "Everywhere.Global.Local:p");
    }
}
