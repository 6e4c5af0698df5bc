//! Intermediate code generation.
//!
//! The generator lowers a checked AST into a flat, label-free-target listing:
//! plain statements plus symbolic `REM <label>` markers that the BASIC
//! emitter later resolves to line numbers. Every call site is inlined with
//! parameters textually substituted by the argument atoms, so the output has
//! no call mechanism at all — which also means recursion must be caught here
//! rather than looping the generator.
//!
//! Condition lowering works through a branch-true/branch-false pair. The
//! target dialect is not assumed to have `NOT`: `not` swaps the two
//! directions and branch-false of a comparison emits the inverted operator
//! (`=` becomes `<>`, `>` becomes `<=`). `and`/`or` expand into
//! short-circuit chains with `SK<k>` skip labels.

use std::collections::HashMap;

use spl_syntax::ast::*;
use spl_syntax::diag::{Diagnostic, DiagnosticKind};

/// Parameter-name → argument-text substitution active inside an inlined body.
type Subst = HashMap<String, String>;

pub struct Generator<'a> {
    procs: HashMap<&'a str, &'a ProcDef>,
    funcs: HashMap<&'a str, &'a FuncDef>,
    out: Vec<String>,
    label_count: u32,
    inline_stack: Vec<String>,
}

impl<'a> Generator<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self {
            procs: program.procs.iter().map(|p| (p.name.as_str(), p)).collect(),
            funcs: program.funcs.iter().map(|f| (f.name.as_str(), f)).collect(),
            out: Vec::new(),
            label_count: 0,
            inline_stack: Vec::new(),
        }
    }

    /// Lower the program's main algorithm (procs and funcs appear only where
    /// they are called). Returns the intermediate listing, one statement or
    /// `REM` marker per element.
    pub fn run(mut self, program: &'a Program) -> Result<Vec<String>, Diagnostic> {
        let subst = Subst::new();
        self.algo(&program.main.algo, &subst)?;
        Ok(self.out)
    }

    fn emit(&mut self, line: String) {
        self.out.push(line);
    }

    fn new_label(&mut self, prefix: &str) -> String {
        self.label_count += 1;
        format!("{}{}", prefix, self.label_count)
    }

    fn algo(&mut self, algo: &Algo, subst: &Subst) -> Result<(), Diagnostic> {
        for instr in &algo.instrs {
            self.instr(instr, subst)?;
        }
        Ok(())
    }

    fn instr(&mut self, instr: &Instr, subst: &Subst) -> Result<(), Diagnostic> {
        match instr {
            Instr::Halt(_) => {
                self.emit("STOP".to_string());
                Ok(())
            }
            Instr::Print(p) => {
                let text = match &p.output {
                    Output::Str(s) => format!("PRINT \"{}\"", s.value),
                    Output::Atom(atom) => format!("PRINT {}", atom_text(atom, subst)),
                };
                self.emit(text);
                Ok(())
            }
            Instr::Call(c) => self.inline_proc(c, subst),
            Instr::Assign(a) => {
                let target = substituted(&a.target, subst);
                match &a.rhs {
                    AssignRhs::Call(c) => self.inline_func(&target, c, subst),
                    AssignRhs::Term(t) => {
                        let rhs = value_text(t, subst)?;
                        self.emit(format!("{} = {}", target, rhs));
                        Ok(())
                    }
                }
            }
            Instr::While(w) => {
                let head = self.new_label("WH");
                let body = self.new_label("WB");
                let exit = self.new_label("WE");
                self.emit(format!("REM {}", head));
                self.branch_true(&w.cond, &body, subst)?;
                self.emit(format!("GOTO {}", exit));
                self.emit(format!("REM {}", body));
                self.algo(&w.body, subst)?;
                self.emit(format!("GOTO {}", head));
                self.emit(format!("REM {}", exit));
                Ok(())
            }
            Instr::DoUntil(d) => {
                let top = self.new_label("DO");
                let exit = self.new_label("DE");
                self.emit(format!("REM {}", top));
                self.algo(&d.body, subst)?;
                self.branch_true(&d.cond, &exit, subst)?;
                self.emit(format!("GOTO {}", top));
                self.emit(format!("REM {}", exit));
                Ok(())
            }
            Instr::If(b) => {
                let then_label = self.new_label("T");
                let exit = self.new_label("X");
                self.branch_true(&b.cond, &then_label, subst)?;
                if let Some(e) = &b.else_branch {
                    self.algo(e, subst)?;
                }
                self.emit(format!("GOTO {}", exit));
                self.emit(format!("REM {}", then_label));
                self.algo(&b.then_branch, subst)?;
                self.emit(format!("REM {}", exit));
                Ok(())
            }
        }
    }

    // --- inlining ----------------------------------------------------------

    fn push_inline(&mut self, name: &str, node_id: NodeId) -> Result<(), Diagnostic> {
        if self.inline_stack.iter().any(|n| n == name) {
            return Err(Diagnostic::at_node(
                DiagnosticKind::RecursiveInline,
                format!(
                    "cannot inline '{}': recursive call chain {} -> {}",
                    name,
                    self.inline_stack.join(" -> "),
                    name
                ),
                node_id,
            ));
        }
        self.inline_stack.push(name.to_string());
        Ok(())
    }

    fn bind_args(
        &self,
        params: &[String],
        call: &Call,
        subst: &Subst,
    ) -> Result<Subst, Diagnostic> {
        if params.len() != call.args.len() {
            return Err(Diagnostic::at_node(
                DiagnosticKind::EmitterError,
                format!(
                    "call to '{}' with {} argument(s), definition takes {}",
                    call.name,
                    call.args.len(),
                    params.len()
                ),
                call.node_id,
            ));
        }
        Ok(params
            .iter()
            .zip(&call.args)
            .map(|(p, a)| (p.clone(), atom_text(a, subst)))
            .collect())
    }

    fn inline_proc(&mut self, call: &Call, subst: &Subst) -> Result<(), Diagnostic> {
        let def = *self.procs.get(call.name.as_str()).ok_or_else(|| {
            Diagnostic::at_node(
                DiagnosticKind::EmitterError,
                format!("no procedure '{}' to inline", call.name),
                call.node_id,
            )
        })?;
        self.push_inline(&call.name, call.node_id)?;
        let inner = self.bind_args(&def.params, call, subst)?;
        self.emit(format!("REM INLINE PROC {}", call.name));
        self.algo(&def.body.algo, &inner)?;
        self.emit(format!("REM ENDINLINE PROC {}", call.name));
        self.inline_stack.pop();
        Ok(())
    }

    /// `target = f(args)` — inline f's body, then materialize its
    /// `return ATOM` as a plain assignment to the target.
    fn inline_func(
        &mut self,
        target: &str,
        call: &Call,
        subst: &Subst,
    ) -> Result<(), Diagnostic> {
        let def = *self.funcs.get(call.name.as_str()).ok_or_else(|| {
            Diagnostic::at_node(
                DiagnosticKind::EmitterError,
                format!("no function '{}' to inline", call.name),
                call.node_id,
            )
        })?;
        self.push_inline(&call.name, call.node_id)?;
        let inner = self.bind_args(&def.params, call, subst)?;
        self.emit(format!("REM INLINE FUNC {}", call.name));
        self.algo(&def.body.algo, &inner)?;
        self.emit(format!("{} = {}", target, atom_text(&def.ret, &inner)));
        self.emit(format!("REM ENDINLINE FUNC {}", call.name));
        self.inline_stack.pop();
        Ok(())
    }

    // --- condition lowering ------------------------------------------------

    /// Emit code that jumps to `target` iff `cond` is true and otherwise
    /// falls through.
    fn branch_true(&mut self, cond: &Term, target: &str, subst: &Subst) -> Result<(), Diagnostic> {
        match cond {
            Term::Atom(ta) => {
                // nonzero-as-true fallback; a strict type check rejects this
                // earlier, but the lowering stays total
                self.emit(format!("IF {} THEN {}", atom_text(&ta.atom, subst), target));
                Ok(())
            }
            Term::Unary(tu) => match tu.op {
                UnOp::Not => self.branch_false(&tu.term, target, subst),
                UnOp::Neg => Err(numeric_condition(tu.node_id)),
            },
            Term::Binary(tb) => match tb.op {
                BinOp::Eq => {
                    let l = value_text(&tb.left, subst)?;
                    let r = value_text(&tb.right, subst)?;
                    self.emit(format!("IF {} = {} THEN {}", l, r, target));
                    Ok(())
                }
                BinOp::Gt => {
                    let l = value_text(&tb.left, subst)?;
                    let r = value_text(&tb.right, subst)?;
                    self.emit(format!("IF {} > {} THEN {}", l, r, target));
                    Ok(())
                }
                BinOp::Or => {
                    self.branch_true(&tb.left, target, subst)?;
                    self.branch_true(&tb.right, target, subst)
                }
                BinOp::And => {
                    let skip = self.new_label("SK");
                    self.branch_false(&tb.left, &skip, subst)?;
                    self.branch_true(&tb.right, target, subst)?;
                    self.emit(format!("REM {}", skip));
                    Ok(())
                }
                _ => Err(numeric_condition(tb.node_id)),
            },
        }
    }

    /// Emit code that jumps to `target` iff `cond` is false.
    fn branch_false(&mut self, cond: &Term, target: &str, subst: &Subst) -> Result<(), Diagnostic> {
        match cond {
            Term::Atom(ta) => {
                self.emit(format!("IF {} = 0 THEN {}", atom_text(&ta.atom, subst), target));
                Ok(())
            }
            Term::Unary(tu) => match tu.op {
                UnOp::Not => self.branch_true(&tu.term, target, subst),
                UnOp::Neg => Err(numeric_condition(tu.node_id)),
            },
            Term::Binary(tb) => match tb.op {
                // inverted comparisons keep NOT out of the output
                BinOp::Eq => {
                    let l = value_text(&tb.left, subst)?;
                    let r = value_text(&tb.right, subst)?;
                    self.emit(format!("IF {} <> {} THEN {}", l, r, target));
                    Ok(())
                }
                BinOp::Gt => {
                    let l = value_text(&tb.left, subst)?;
                    let r = value_text(&tb.right, subst)?;
                    self.emit(format!("IF {} <= {} THEN {}", l, r, target));
                    Ok(())
                }
                BinOp::And => {
                    self.branch_false(&tb.left, target, subst)?;
                    self.branch_false(&tb.right, target, subst)
                }
                BinOp::Or => {
                    let skip = self.new_label("SK");
                    self.branch_true(&tb.left, &skip, subst)?;
                    self.branch_false(&tb.right, target, subst)?;
                    self.emit(format!("REM {}", skip));
                    Ok(())
                }
                _ => Err(numeric_condition(tb.node_id)),
            },
        }
    }
}

/// Generate the intermediate listing for a checked program.
pub fn generate(program: &Program) -> Result<Vec<String>, Diagnostic> {
    Generator::new(program).run(program)
}

fn numeric_condition(node_id: NodeId) -> Diagnostic {
    Diagnostic::at_node(
        DiagnosticKind::EmitterError,
        "numeric term in condition position",
        node_id,
    )
}

fn boolean_value(node_id: NodeId) -> Diagnostic {
    Diagnostic::at_node(
        DiagnosticKind::EmitterError,
        "boolean term in value position",
        node_id,
    )
}

fn substituted(name: &str, subst: &Subst) -> String {
    subst.get(name).cloned().unwrap_or_else(|| name.to_string())
}

fn atom_text(atom: &Atom, subst: &Subst) -> String {
    match atom {
        Atom::Var(v) => substituted(&v.name, subst),
        Atom::Number(n) => n.value.to_string(),
    }
}

/// Render a term in value position: atoms bare, `neg` as `(-x)`, arithmetic
/// parenthesized with BASIC operators. Boolean connectives never appear in
/// value position on checked input and are an internal error here.
fn value_text(term: &Term, subst: &Subst) -> Result<String, Diagnostic> {
    match term {
        Term::Atom(ta) => Ok(atom_text(&ta.atom, subst)),
        Term::Unary(tu) => match tu.op {
            UnOp::Neg => Ok(format!("(-{})", value_text(&tu.term, subst)?)),
            UnOp::Not => Err(boolean_value(tu.node_id)),
        },
        Term::Binary(tb) => {
            let op = match tb.op {
                BinOp::Plus => "+",
                BinOp::Minus => "-",
                BinOp::Mult => "*",
                BinOp::Div => "/",
                BinOp::Eq => "=",
                BinOp::Gt => ">",
                BinOp::Or | BinOp::And => return Err(boolean_value(tb.node_id)),
            };
            Ok(format!(
                "({} {} {})",
                value_text(&tb.left, subst)?,
                op,
                value_text(&tb.right, subst)?
            ))
        }
    }
}
