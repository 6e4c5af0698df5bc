//! Type checking.
//!
//! SPL has numeric variables only, so the interesting work is telling
//! numeric terms from boolean ones and keeping each operator honest. The
//! checker assigns a [`TypeKind`] to every term, atom, and output node it
//! visits, keyed by node id, and collects violations without stopping.

use std::collections::HashMap;

use spl_syntax::ast::*;
use spl_syntax::diag::{Diagnostic, DiagnosticKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Numeric,
    Boolean,
    String,
    Void,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Numeric => "numeric",
            TypeKind::Boolean => "boolean",
            TypeKind::String => "string",
            TypeKind::Void => "void",
        }
    }
}

/// Result of a type-checking run: the node-type map plus any findings.
#[derive(Debug)]
pub struct Typing {
    pub types: HashMap<NodeId, TypeKind>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Typing {
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

pub struct TypeChecker {
    /// Innermost-last stack of name → type frames (all Numeric in SPL).
    scopes: Vec<HashMap<String, TypeKind>>,
    procs: HashMap<String, usize>,
    funcs: HashMap<String, usize>,
    types: HashMap<NodeId, TypeKind>,
    diagnostics: Vec<Diagnostic>,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            procs: HashMap::new(),
            funcs: HashMap::new(),
            types: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn run(mut self, program: &Program) -> Typing {
        // globals and signatures first, then bodies
        for g in &program.globals {
            self.define(g);
        }
        for p in &program.procs {
            self.procs.insert(p.name.clone(), p.params.len());
        }
        for f in &program.funcs {
            self.funcs.insert(f.name.clone(), f.params.len());
        }

        for p in &program.procs {
            self.check_proc(p);
        }
        for f in &program.funcs {
            self.check_func(f);
        }
        self.check_main(&program.main);

        Typing {
            types: self.types,
            diagnostics: self.diagnostics,
        }
    }

    // --- scope frames (duplicates are the scope checker's business) --------

    fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop(&mut self) {
        self.scopes.pop();
    }

    fn define(&mut self, name: &str) {
        self.scopes
            .last_mut()
            .expect("at least one frame")
            .insert(name.to_string(), TypeKind::Numeric);
    }

    fn lookup(&self, name: &str) -> Option<TypeKind> {
        self.scopes
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).copied())
    }

    fn record(&mut self, node_id: NodeId, ty: TypeKind) -> TypeKind {
        self.types.insert(node_id, ty);
        ty
    }

    // --- definitions --------------------------------------------------------

    fn check_proc(&mut self, p: &ProcDef) {
        self.push();
        for param in &p.params {
            self.define(param);
        }
        for local in &p.body.locals {
            self.define(local);
        }
        self.check_algo(&p.body.algo);
        self.pop();
    }

    fn check_func(&mut self, f: &FuncDef) {
        self.push();
        for param in &f.params {
            self.define(param);
        }
        for local in &f.body.locals {
            self.define(local);
        }
        self.check_algo(&f.body.algo);
        match self.atom_type(&f.ret) {
            Ok(TypeKind::Numeric) => {}
            Ok(ty) => self.diagnostics.push(Diagnostic::at_node(
                DiagnosticKind::TypeError,
                format!("function '{}' must return numeric, got {}", f.name, ty.as_str()),
                f.ret.node_id(),
            )),
            Err(d) => self.diagnostics.push(d),
        }
        self.pop();
    }

    fn check_main(&mut self, m: &Main) {
        self.push();
        for var in &m.variables {
            self.define(var);
        }
        self.check_algo(&m.algo);
        self.pop();
    }

    // --- instructions --------------------------------------------------------

    /// Each instruction is checked independently so one bad instruction
    /// never hides findings in its neighbours.
    fn check_algo(&mut self, algo: &Algo) {
        for instr in &algo.instrs {
            if let Err(d) = self.check_instr(instr) {
                self.diagnostics.push(d);
            }
        }
    }

    fn check_instr(&mut self, instr: &Instr) -> Result<(), Diagnostic> {
        match instr {
            Instr::Halt(_) => Ok(()),
            Instr::Print(p) => {
                match &p.output {
                    Output::Str(s) => {
                        self.record(s.node_id, TypeKind::String);
                    }
                    Output::Atom(atom) => {
                        let ty = self.atom_type(atom)?;
                        if ty != TypeKind::Numeric {
                            return Err(Diagnostic::at_node(
                                DiagnosticKind::TypeError,
                                format!(
                                    "print expects a numeric or string value, got {}",
                                    ty.as_str()
                                ),
                                atom.node_id(),
                            ));
                        }
                    }
                }
                Ok(())
            }
            Instr::Call(c) => {
                self.check_args(c)?;
                match self.procs.get(&c.name) {
                    None => Err(Diagnostic::at_node(
                        DiagnosticKind::TypeError,
                        format!("'{}' is not a procedure", c.name),
                        c.node_id,
                    )),
                    Some(&arity) if arity != c.args.len() => Err(Diagnostic::at_node(
                        DiagnosticKind::TypeError,
                        format!(
                            "procedure '{}' expects {} argument(s), got {}",
                            c.name,
                            arity,
                            c.args.len()
                        ),
                        c.node_id,
                    )),
                    Some(_) => Ok(()),
                }
            }
            Instr::Assign(a) => {
                match self.lookup(&a.target) {
                    Some(TypeKind::Numeric) => {}
                    Some(ty) => {
                        return Err(Diagnostic::at_node(
                            DiagnosticKind::TypeError,
                            format!(
                                "assignment target '{}' must be numeric, got {}",
                                a.target,
                                ty.as_str()
                            ),
                            a.node_id,
                        ))
                    }
                    None => {
                        return Err(Diagnostic::at_node(
                            DiagnosticKind::TypeError,
                            format!("variable '{}' is not declared", a.target),
                            a.node_id,
                        ))
                    }
                }
                match &a.rhs {
                    AssignRhs::Call(c) => {
                        self.check_args(c)?;
                        match self.funcs.get(&c.name) {
                            None => Err(Diagnostic::at_node(
                                DiagnosticKind::TypeError,
                                format!("'{}' is not a function", c.name),
                                c.node_id,
                            )),
                            Some(&arity) if arity != c.args.len() => Err(Diagnostic::at_node(
                                DiagnosticKind::TypeError,
                                format!(
                                    "function '{}' expects {} argument(s), got {}",
                                    c.name,
                                    arity,
                                    c.args.len()
                                ),
                                c.node_id,
                            )),
                            Some(_) => {
                                self.record(c.node_id, TypeKind::Numeric);
                                Ok(())
                            }
                        }
                    }
                    AssignRhs::Term(t) => {
                        let ty = self.term_type(t)?;
                        if ty != TypeKind::Numeric {
                            return Err(Diagnostic::at_node(
                                DiagnosticKind::TypeError,
                                format!("assignment RHS must be numeric, got {}", ty.as_str()),
                                a.node_id,
                            ));
                        }
                        Ok(())
                    }
                }
            }
            Instr::While(w) => {
                self.check_condition(&w.cond, "while")?;
                self.check_algo(&w.body);
                Ok(())
            }
            Instr::DoUntil(d) => {
                self.check_algo(&d.body);
                self.check_condition(&d.cond, "do-until")?;
                Ok(())
            }
            Instr::If(b) => {
                self.check_condition(&b.cond, "if")?;
                self.check_algo(&b.then_branch);
                if let Some(e) = &b.else_branch {
                    self.check_algo(e);
                }
                Ok(())
            }
        }
    }

    /// Conditions are strictly boolean; a bare numeric atom is rejected.
    fn check_condition(&mut self, cond: &Term, what: &str) -> Result<(), Diagnostic> {
        let ty = self.term_type(cond)?;
        if ty != TypeKind::Boolean {
            return Err(Diagnostic::at_node(
                DiagnosticKind::TypeError,
                format!("{} condition must be boolean, got {}", what, ty.as_str()),
                term_node_id(cond),
            ));
        }
        Ok(())
    }

    fn check_args(&mut self, c: &Call) -> Result<(), Diagnostic> {
        for arg in &c.args {
            let ty = self.atom_type(arg)?;
            if ty != TypeKind::Numeric {
                return Err(Diagnostic::at_node(
                    DiagnosticKind::TypeError,
                    format!("call arguments must be numeric, got {}", ty.as_str()),
                    arg.node_id(),
                ));
            }
        }
        Ok(())
    }

    // --- terms ----------------------------------------------------------------

    fn term_type(&mut self, term: &Term) -> Result<TypeKind, Diagnostic> {
        match term {
            Term::Atom(ta) => {
                let ty = self.atom_type(&ta.atom)?;
                Ok(self.record(ta.node_id, ty))
            }
            Term::Unary(tu) => {
                let inner = self.term_type(&tu.term)?;
                let (want, result) = match tu.op {
                    UnOp::Neg => (TypeKind::Numeric, TypeKind::Numeric),
                    UnOp::Not => (TypeKind::Boolean, TypeKind::Boolean),
                };
                if inner != want {
                    return Err(Diagnostic::at_node(
                        DiagnosticKind::TypeError,
                        format!(
                            "unary '{}' requires a {} operand, got {}",
                            tu.op.as_str(),
                            want.as_str(),
                            inner.as_str()
                        ),
                        tu.node_id,
                    ));
                }
                Ok(self.record(tu.node_id, result))
            }
            Term::Binary(tb) => {
                let lt = self.term_type(&tb.left)?;
                let rt = self.term_type(&tb.right)?;
                let (want, result) = match tb.op {
                    BinOp::Plus | BinOp::Minus | BinOp::Mult | BinOp::Div => {
                        (TypeKind::Numeric, TypeKind::Numeric)
                    }
                    BinOp::Eq | BinOp::Gt => (TypeKind::Numeric, TypeKind::Boolean),
                    BinOp::Or | BinOp::And => (TypeKind::Boolean, TypeKind::Boolean),
                };
                if lt != want || rt != want {
                    return Err(Diagnostic::at_node(
                        DiagnosticKind::TypeError,
                        format!(
                            "binary '{}' requires {} operands, got {} and {}",
                            tb.op.as_str(),
                            want.as_str(),
                            lt.as_str(),
                            rt.as_str()
                        ),
                        tb.node_id,
                    ));
                }
                Ok(self.record(tb.node_id, result))
            }
        }
    }

    fn atom_type(&mut self, atom: &Atom) -> Result<TypeKind, Diagnostic> {
        match atom {
            Atom::Number(n) => Ok(self.record(n.node_id, TypeKind::Numeric)),
            Atom::Var(v) => match self.lookup(&v.name) {
                Some(ty) => Ok(self.record(v.node_id, ty)),
                None => Err(Diagnostic::at_node(
                    DiagnosticKind::TypeError,
                    format!("variable '{}' is not declared", v.name),
                    v.node_id,
                )),
            },
        }
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

fn term_node_id(term: &Term) -> NodeId {
    match term {
        Term::Atom(ta) => ta.node_id,
        Term::Unary(tu) => tu.node_id,
        Term::Binary(tb) => tb.node_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::assign_ids;
    use spl_lexer::Lexer;
    use spl_parser::Parser;

    fn typecheck(src: &str) -> Typing {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let mut program = Parser::new(tokens).parse_program().unwrap();
        assign_ids(&mut program);
        TypeChecker::new().run(&program)
    }

    #[test]
    fn arithmetic_over_numerics_passes() {
        let t = typecheck(
            "glob { x y z } proc { } func { } main { var { } \
             x = 10 ; y = 20 ; z = ( x plus y ) ; z = ( x minus y ) ; \
             z = ( x mult y ) ; z = ( x div y ) }",
        );
        assert!(t.is_ok(), "{:?}", t.diagnostics);
    }

    #[test]
    fn boolean_rhs_is_rejected() {
        let t = typecheck("glob { x } proc { } func { } main { var { } x = ( 1 eq 2 ) }");
        assert_eq!(t.diagnostics.len(), 1);
        assert_eq!(t.diagnostics[0].kind, DiagnosticKind::TypeError);
        assert!(t.diagnostics[0].message.contains("must be numeric"));
    }

    #[test]
    fn conditions_must_be_boolean() {
        let t = typecheck(
            "glob { i } proc { } func { } main { var { } \
             while ( i > 0 ) { i = ( i minus 1 ) } ; \
             if ( i eq 0 ) { halt } ; \
             do { i = ( i plus 1 ) } until ( i eq 3 ) }",
        );
        assert!(t.is_ok(), "{:?}", t.diagnostics);

        // a bare numeric atom as a condition is a type error (strict mode)
        let t = typecheck("glob { i } proc { } func { } main { var { } while i { halt } }");
        assert_eq!(t.diagnostics.len(), 1);
        assert!(t.diagnostics[0].message.contains("must be boolean"));
    }

    #[test]
    fn unary_operators_are_typed() {
        let t = typecheck(
            "glob { x } proc { } func { } main { var { } \
             x = ( neg x ) ; if ( not ( x eq 0 ) ) { halt } }",
        );
        assert!(t.is_ok(), "{:?}", t.diagnostics);

        let t = typecheck("glob { x } proc { } func { } main { var { } x = ( neg ( x eq 0 ) ) }");
        assert!(t
            .diagnostics
            .iter()
            .any(|d| d.message.contains("unary 'neg'")));

        let t = typecheck("glob { x } proc { } func { } main { var { } if ( not x ) { halt } }");
        assert!(t
            .diagnostics
            .iter()
            .any(|d| d.message.contains("unary 'not'")));
    }

    #[test]
    fn logical_operators_require_booleans() {
        let t = typecheck(
            "glob { a b } proc { } func { } main { var { } \
             if ( ( a > 0 ) and ( b eq 1 ) ) { halt } }",
        );
        assert!(t.is_ok(), "{:?}", t.diagnostics);

        let t = typecheck("glob { a b } proc { } func { } main { var { } if ( a and b ) { halt } }");
        assert!(t
            .diagnostics
            .iter()
            .any(|d| d.message.contains("binary 'and'")));
    }

    #[test]
    fn function_calls_check_target_and_arity() {
        let base = "glob { x } proc { p(a) { local { } print a } } \
                    func { f(a b) { local { } print a ; return b } } main { var { } ";

        let t = typecheck(&format!("{} x = f(1 2) }}", base));
        assert!(t.is_ok(), "{:?}", t.diagnostics);

        let t = typecheck(&format!("{} x = f(1) }}", base));
        assert!(t.diagnostics.iter().any(|d| d.message.contains("expects 2")));

        // calling a procedure in expression position
        let t = typecheck(&format!("{} x = p(1) }}", base));
        assert!(t
            .diagnostics
            .iter()
            .any(|d| d.message.contains("is not a function")));

        // calling a function in statement position
        let t = typecheck(&format!("{} f(1 2) }}", base));
        assert!(t
            .diagnostics
            .iter()
            .any(|d| d.message.contains("is not a procedure")));
    }

    #[test]
    fn function_return_must_be_numeric() {
        let t = typecheck(
            "glob { } proc { } \
             func { f(a) { local { } print a ; return a } } \
             main { var { } halt }",
        );
        assert!(t.is_ok(), "{:?}", t.diagnostics);
    }

    #[test]
    fn every_checked_term_gets_exactly_one_type() {
        let src = "glob { x } proc { } func { } main { var { } \
                   x = ( ( x plus 1 ) mult 2 ) ; if ( x > 0 ) { print x } }";
        let first = typecheck(src);
        assert!(first.is_ok());
        // fixed point: re-running produces the identical assignment
        let second = typecheck(src);
        assert_eq!(first.types, second.types);
        assert!(!first.types.is_empty());
    }

    #[test]
    fn errors_do_not_stop_the_pass() {
        let t = typecheck(
            "glob { x } proc { } func { } main { var { } \
             x = ( 1 eq 2 ) ; while x { halt } ; y = 1 }",
        );
        assert_eq!(t.diagnostics.len(), 3, "{:?}", t.diagnostics);
    }
}
