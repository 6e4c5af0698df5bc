//! Scope checking: declaration collection, cross-category rules, and
//! variable-use resolution.
//!
//! The checker never stops at the first problem. Every pass runs to
//! completion, diagnostics accumulate in encounter order, and the resulting
//! symbol table is always complete enough to inspect.

use std::collections::HashMap;

use spl_syntax::ast::*;
use spl_syntax::diag::{Diagnostic, DiagnosticKind};

use crate::symbol_table::{EntryKind, ScopeId, ScopeKind, SymbolTable};

pub struct ScopeChecker {
    table: SymbolTable,
    /// proc/func name → its Local scope id.
    local_scopes: HashMap<String, ScopeId>,
    diagnostics: Vec<Diagnostic>,
}

impl ScopeChecker {
    pub fn new() -> Self {
        Self {
            table: SymbolTable::new(),
            local_scopes: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Run all passes over the program, writing `resolved` links into the
    /// tree, and return the table plus whatever was found.
    pub fn run(mut self, program: &mut Program) -> (SymbolTable, Vec<Diagnostic>) {
        self.collect_globals(program);
        self.collect_procs(program);
        self.collect_funcs(program);
        self.collect_main_variables(program);
        self.check_cross_category(program);
        self.build_local_scopes(program);
        self.resolve_uses(program);
        (self.table, self.diagnostics)
    }

    // --- declaration passes ------------------------------------------------

    fn declare(
        &mut self,
        scope_id: ScopeId,
        name: &str,
        kind: EntryKind,
        decl_node_id: NodeId,
    ) {
        if let Err(existing) = self.table.declare(scope_id, name, kind, decl_node_id) {
            let prev = self.table.entry(existing).decl_node_id;
            let scope_name = self.table.scope(scope_id).name.clone();
            self.diagnostics.push(
                Diagnostic::at_node(
                    DiagnosticKind::DuplicateName,
                    format!(
                        "duplicate declaration of '{}' (previous at node #{})",
                        name, prev
                    ),
                    decl_node_id,
                )
                .in_scope(scope_name),
            );
        }
    }

    fn collect_globals(&mut self, program: &Program) {
        let global = self.table.base.global;
        for name in &program.globals {
            // bare-string declarations anchor on the owning node's id
            self.declare(global, name, EntryKind::Var, program.node_id);
        }
    }

    fn collect_procs(&mut self, program: &Program) {
        let procedure = self.table.base.procedure;
        for pdef in &program.procs {
            self.declare(procedure, &pdef.name, EntryKind::Proc, pdef.node_id);
        }
    }

    fn collect_funcs(&mut self, program: &Program) {
        let function = self.table.base.function;
        for fdef in &program.funcs {
            self.declare(function, &fdef.name, EntryKind::Func, fdef.node_id);
        }
    }

    fn collect_main_variables(&mut self, program: &Program) {
        let main = self.table.base.main;
        for name in &program.main.variables {
            self.declare(main, name, EntryKind::Var, program.main.node_id);
        }
    }

    /// The Everywhere-level rules: no variable may share a name with a
    /// procedure or function, and procedures and functions are disjoint.
    fn check_cross_category(&mut self, program: &Program) {
        let base = self.table.base;

        for fdef in &program.funcs {
            if self.table.lookup_local(base.procedure, &fdef.name).is_some() {
                self.diagnostics.push(Diagnostic::at_node(
                    DiagnosticKind::CrossCategoryClash,
                    format!("function '{}' clashes with procedure name", fdef.name),
                    fdef.node_id,
                ));
            }
        }
        for (names, label, anchor) in [
            (&program.globals, "global variable", program.node_id),
            (&program.main.variables, "main variable", program.main.node_id),
        ] {
            for name in names.iter() {
                if self.table.lookup_local(base.procedure, name).is_some() {
                    self.diagnostics.push(Diagnostic::at_node(
                        DiagnosticKind::CrossCategoryClash,
                        format!("{} '{}' clashes with procedure name", label, name),
                        anchor,
                    ));
                }
                if self.table.lookup_local(base.function, name).is_some() {
                    self.diagnostics.push(Diagnostic::at_node(
                        DiagnosticKind::CrossCategoryClash,
                        format!("{} '{}' clashes with function name", label, name),
                        anchor,
                    ));
                }
            }
        }
    }

    /// One Local scope per definition, parented to Global. Parameters go in
    /// first, then locals; a local reusing a parameter name is its own kind
    /// of error rather than a plain duplicate.
    fn build_local_scopes(&mut self, program: &Program) {
        let defs: Vec<(&str, &[String], &Body, NodeId, &str)> = program
            .procs
            .iter()
            .map(|p| (p.name.as_str(), p.params.as_slice(), &p.body, p.node_id, "proc"))
            .chain(
                program
                    .funcs
                    .iter()
                    .map(|f| (f.name.as_str(), f.params.as_slice(), &f.body, f.node_id, "func")),
            )
            .collect();

        for (name, params, body, node_id, what) in defs {
            let local_id = self.table.new_scope(
                ScopeKind::Local,
                Some(self.table.base.global),
                format!("Local:{}", name),
            );
            self.local_scopes.insert(name.to_string(), local_id);

            for param in params {
                self.declare(local_id, param, EntryKind::Param, node_id);
            }
            for local in &body.locals {
                if params.iter().any(|p| p == local) {
                    self.diagnostics.push(
                        Diagnostic::at_node(
                            DiagnosticKind::ParamShadowed,
                            format!(
                                "local '{}' shadows a parameter of {} '{}'",
                                local, what, name
                            ),
                            body.node_id,
                        )
                        .in_scope(format!("Local:{}", name)),
                    );
                    continue;
                }
                self.declare(local_id, local, EntryKind::Var, body.node_id);
            }
        }
    }

    // --- use resolution ----------------------------------------------------

    fn resolve_uses(&mut self, program: &mut Program) {
        for pdef in &mut program.procs {
            let scope = self.local_scopes[&pdef.name];
            Self::resolve_algo(
                &mut pdef.body.algo,
                scope,
                &self.table,
                &mut self.diagnostics,
            );
        }
        for fdef in &mut program.funcs {
            let scope = self.local_scopes[&fdef.name];
            Self::resolve_algo(
                &mut fdef.body.algo,
                scope,
                &self.table,
                &mut self.diagnostics,
            );
            Self::resolve_atom(&mut fdef.ret, scope, &self.table, &mut self.diagnostics);
        }
        let main_scope = self.table.base.main;
        Self::resolve_algo(
            &mut program.main.algo,
            main_scope,
            &self.table,
            &mut self.diagnostics,
        );
    }

    fn resolve_algo(
        algo: &mut Algo,
        scope: ScopeId,
        table: &SymbolTable,
        diags: &mut Vec<Diagnostic>,
    ) {
        for instr in &mut algo.instrs {
            match instr {
                Instr::Halt(_) => {}
                Instr::Print(p) => {
                    if let Output::Atom(atom) = &mut p.output {
                        Self::resolve_atom(atom, scope, table, diags);
                    }
                }
                Instr::Call(c) => {
                    for arg in &mut c.args {
                        Self::resolve_atom(arg, scope, table, diags);
                    }
                }
                Instr::Assign(a) => {
                    if Self::lookup_use_in(table, scope, &a.target).is_none() {
                        diags.push(
                            Diagnostic::at_node(
                                DiagnosticKind::UndeclaredVariable,
                                format!("undeclared variable '{}'", a.target),
                                a.node_id,
                            )
                            .in_scope(table.scope(scope).name.clone()),
                        );
                    }
                    match &mut a.rhs {
                        AssignRhs::Call(c) => {
                            for arg in &mut c.args {
                                Self::resolve_atom(arg, scope, table, diags);
                            }
                        }
                        AssignRhs::Term(t) => Self::resolve_term(t, scope, table, diags),
                    }
                }
                Instr::While(w) => {
                    Self::resolve_term(&mut w.cond, scope, table, diags);
                    Self::resolve_algo(&mut w.body, scope, table, diags);
                }
                Instr::DoUntil(d) => {
                    Self::resolve_algo(&mut d.body, scope, table, diags);
                    Self::resolve_term(&mut d.cond, scope, table, diags);
                }
                Instr::If(b) => {
                    Self::resolve_term(&mut b.cond, scope, table, diags);
                    Self::resolve_algo(&mut b.then_branch, scope, table, diags);
                    if let Some(e) = &mut b.else_branch {
                        Self::resolve_algo(e, scope, table, diags);
                    }
                }
            }
        }
    }

    fn resolve_term(
        term: &mut Term,
        scope: ScopeId,
        table: &SymbolTable,
        diags: &mut Vec<Diagnostic>,
    ) {
        match term {
            Term::Atom(ta) => Self::resolve_atom(&mut ta.atom, scope, table, diags),
            Term::Unary(tu) => Self::resolve_term(&mut tu.term, scope, table, diags),
            Term::Binary(tb) => {
                Self::resolve_term(&mut tb.left, scope, table, diags);
                Self::resolve_term(&mut tb.right, scope, table, diags);
            }
        }
    }

    fn resolve_atom(
        atom: &mut Atom,
        scope: ScopeId,
        table: &SymbolTable,
        diags: &mut Vec<Diagnostic>,
    ) {
        if let Atom::Var(v) = atom {
            match Self::lookup_use_in(table, scope, &v.name) {
                Some(entry) => v.resolved = Some(entry),
                None => diags.push(
                    Diagnostic::at_node(
                        DiagnosticKind::UndeclaredVariable,
                        format!("undeclared variable '{}'", v.name),
                        v.node_id,
                    )
                    .in_scope(table.scope(scope).name.clone()),
                ),
            }
        }
    }

    /// Lookup for a variable *use*. From a Local scope the chain runs
    /// param/local → global; from Main it is main → global. The Procedure
    /// and Function buckets are never consulted here.
    fn lookup_use_in(table: &SymbolTable, scope_id: ScopeId, name: &str) -> Option<EntryId> {
        if scope_id == table.base.main {
            table
                .lookup_local(scope_id, name)
                .or_else(|| table.lookup_chain(table.base.global, name))
        } else {
            table.lookup_chain(scope_id, name)
        }
    }
}

impl Default for ScopeChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::assign_ids;
    use spl_lexer::Lexer;
    use spl_parser::Parser;

    fn check(src: &str) -> (Program, SymbolTable, Vec<Diagnostic>) {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let mut program = Parser::new(tokens).parse_program().unwrap();
        assign_ids(&mut program);
        let (table, diags) = ScopeChecker::new().run(&mut program);
        (program, table, diags)
    }

    #[test]
    fn clean_program_has_no_diagnostics() {
        let (_, _, diags) = check(
            "glob { g } \
             proc { inc(n) { local { t } t = ( n plus 1 ) ; g = t } } \
             func { double(a) { local { } print a ; return a } } \
             main { var { x } x = double(2) ; inc(x) ; print g ; halt }",
        );
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
    }

    #[test]
    fn every_varref_is_resolved_on_success() {
        let (program, table, diags) = check(
            "glob { g } proc { p(a) { local { } print a ; print g } } func { } \
             main { var { m } m = 1 ; print m }",
        );
        assert!(diags.is_empty());
        // spot-check the proc body: 'a' resolves to a param, 'g' to a global
        let body = &program.procs[0].body.algo;
        let get = |i: usize| match &body.instrs[i] {
            Instr::Print(Print { output: Output::Atom(Atom::Var(v)), .. }) => v,
            other => panic!("unexpected instr {:?}", other),
        };
        let a = table.entry(get(0).resolved.expect("'a' resolved"));
        assert_eq!(a.kind, EntryKind::Param);
        let g = table.entry(get(1).resolved.expect("'g' resolved"));
        assert_eq!(g.scope_id, table.base.global);
    }

    #[test]
    fn param_wins_over_global_of_the_same_name() {
        let (program, table, diags) = check(
            "glob { } proc { p(n) { local { } print n } } func { } \
             main { var { n } print n }",
        );
        assert!(diags.is_empty());
        let v = match &program.procs[0].body.algo.instrs[0] {
            Instr::Print(Print { output: Output::Atom(Atom::Var(v)), .. }) => v,
            other => panic!("unexpected instr {:?}", other),
        };
        assert_eq!(table.entry(v.resolved.unwrap()).kind, EntryKind::Param);
    }

    #[test]
    fn duplicate_globals_are_reported() {
        let (_, _, diags) = check("glob { a a } proc { } func { } main { var { } halt }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::DuplicateName);
        assert!(diags[0].message.contains("'a'"));
    }

    #[test]
    fn global_clashing_with_function_is_one_cross_category_diagnostic() {
        let (_, _, diags) = check(
            "glob { foo } proc { } \
             func { foo(a) { local { } print a ; return a } } \
             main { var { } halt }",
        );
        assert_eq!(diags.len(), 1, "got: {:?}", diags);
        assert_eq!(diags[0].kind, DiagnosticKind::CrossCategoryClash);
        assert!(diags[0].message.contains("'foo'"));
    }

    #[test]
    fn proc_and_func_may_not_share_a_name() {
        let (_, _, diags) = check(
            "glob { } proc { same(a) { local { } print a } } \
             func { same(b) { local { } print b ; return b } } \
             main { var { } halt }",
        );
        assert!(diags
            .iter()
            .any(|d| d.kind == DiagnosticKind::CrossCategoryClash
                && d.message.contains("'same'")));
    }

    #[test]
    fn main_variable_clashing_with_function_mentions_main() {
        let (_, _, diags) = check(
            "glob { } proc { } \
             func { inc(a) { local { } print a ; return a } } \
             main { var { inc } halt }",
        );
        assert!(diags
            .iter()
            .any(|d| d.kind == DiagnosticKind::CrossCategoryClash
                && d.message.contains("main variable 'inc'")));
    }

    #[test]
    fn local_shadowing_param_is_reported() {
        let (_, _, diags) = check(
            "glob { } proc { p(x) { local { x } halt } } func { } \
             main { var { } halt }",
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::ParamShadowed);
        assert!(diags[0].message.contains("'x'"));
        assert!(diags[0].message.contains("'p'"));
    }

    #[test]
    fn duplicate_parameters_are_reported() {
        let (_, _, diags) = check(
            "glob { } proc { echo(a a) { local { } halt } } func { } \
             main { var { } halt }",
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::DuplicateName);
    }

    #[test]
    fn undeclared_use_in_main_names_the_scope() {
        let (_, _, diags) = check("glob { } proc { } func { } main { var { a } print b }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::UndeclaredVariable);
        assert!(diags[0].message.contains("'b'"));
        assert_eq!(diags[0].scope_path.as_deref(), Some("Main"));
        assert!(diags[0].node_id > 0);
    }

    #[test]
    fn main_sees_globals_but_not_proc_locals() {
        let (_, _, diags) = check(
            "glob { g } proc { p(a) { local { t } t = a ; g = t } } func { } \
             main { var { } print g ; print t }",
        );
        assert_eq!(diags.len(), 1, "got: {:?}", diags);
        assert_eq!(diags[0].kind, DiagnosticKind::UndeclaredVariable);
        assert!(diags[0].message.contains("'t'"));
    }

    #[test]
    fn assigning_to_an_undeclared_variable_is_reported() {
        let (_, _, diags) = check("glob { } proc { } func { } main { var { } x = 1 }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::UndeclaredVariable);
        assert!(diags[0].message.contains("'x'"));
    }

    #[test]
    fn scope_dump_lists_locals_under_global() {
        let (_, table, _) = check(
            "glob { g } proc { p(a) { local { t } halt } } func { } \
             main { var { } halt }",
        );
        let dump = table.pretty_print();
        assert!(dump.contains("[Local:p]"));
        assert!(dump.contains("param  a"));
        assert!(dump.contains("var    t"));
    }
}
