//! Static analysis for SPL: node ids, symbol table, scope and type checking.

pub mod ids;
pub mod scope;
pub mod symbol_table;
pub mod types;

pub use ids::{assign_ids, collect_ids, count_nodes};
pub use scope::ScopeChecker;
pub use symbol_table::{BaseScopes, Entry, EntryKind, Scope, ScopeId, ScopeKind, SymbolTable};
pub use types::{TypeChecker, TypeKind, Typing};
