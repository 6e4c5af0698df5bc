//! Pretty-printer for parsed SPL programs (`--print-ast`).

use std::fmt::Write as _;

use spl_syntax::ast::*;

const IND: &str = "  ";

pub fn program_to_string(p: &Program) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Program [id={}]", p.node_id);
    let _ = writeln!(out, "{}globals: {:?}", IND, p.globals);
    for pdef in &p.procs {
        let _ = writeln!(out, "{}ProcDef '{}' [id={}]", IND, pdef.name, pdef.node_id);
        let _ = writeln!(out, "{}{}params: {:?}", IND, IND, pdef.params);
        write_body(&mut out, &pdef.body, 2);
    }
    for fdef in &p.funcs {
        let _ = writeln!(out, "{}FuncDef '{}' [id={}]", IND, fdef.name, fdef.node_id);
        let _ = writeln!(out, "{}{}params: {:?}", IND, IND, fdef.params);
        write_body(&mut out, &fdef.body, 2);
        let _ = writeln!(out, "{}{}return:", IND, IND);
        write_atom(&mut out, &fdef.ret, 3);
    }
    let _ = writeln!(out, "{}Main [id={}]", IND, p.main.node_id);
    let _ = writeln!(out, "{}{}variables: {:?}", IND, IND, p.main.variables);
    write_algo(&mut out, &p.main.algo, 2);
    out
}

fn pad(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(IND);
    }
}

fn write_body(out: &mut String, b: &Body, depth: usize) {
    pad(out, depth);
    let _ = writeln!(out, "Body [id={}]", b.node_id);
    pad(out, depth + 1);
    let _ = writeln!(out, "locals: {:?}", b.locals);
    write_algo(out, &b.algo, depth + 1);
}

fn write_algo(out: &mut String, a: &Algo, depth: usize) {
    pad(out, depth);
    let _ = writeln!(out, "Algo [id={}]", a.node_id);
    for instr in &a.instrs {
        write_instr(out, instr, depth + 1);
    }
}

fn write_instr(out: &mut String, instr: &Instr, depth: usize) {
    pad(out, depth);
    match instr {
        Instr::Halt(h) => {
            let _ = writeln!(out, "Halt [id={}]", h.node_id);
        }
        Instr::Print(p) => {
            let _ = writeln!(out, "Print [id={}]", p.node_id);
            match &p.output {
                Output::Atom(atom) => write_atom(out, atom, depth + 1),
                Output::Str(s) => {
                    pad(out, depth + 1);
                    let _ = writeln!(out, "StringLit {:?} [id={}]", s.value, s.node_id);
                }
            }
        }
        Instr::Call(c) => write_call(out, c, depth),
        Instr::Assign(a) => {
            let _ = writeln!(out, "Assign '{}' [id={}]", a.target, a.node_id);
            match &a.rhs {
                AssignRhs::Call(c) => {
                    pad(out, depth + 1);
                    write_call(out, c, depth + 1);
                }
                AssignRhs::Term(t) => write_term(out, t, depth + 1),
            }
        }
        Instr::While(w) => {
            let _ = writeln!(out, "LoopWhile [id={}]", w.node_id);
            pad(out, depth + 1);
            let _ = writeln!(out, "cond:");
            write_term(out, &w.cond, depth + 2);
            pad(out, depth + 1);
            let _ = writeln!(out, "body:");
            write_algo(out, &w.body, depth + 2);
        }
        Instr::DoUntil(d) => {
            let _ = writeln!(out, "LoopDoUntil [id={}]", d.node_id);
            pad(out, depth + 1);
            let _ = writeln!(out, "body:");
            write_algo(out, &d.body, depth + 2);
            pad(out, depth + 1);
            let _ = writeln!(out, "until:");
            write_term(out, &d.cond, depth + 2);
        }
        Instr::If(b) => {
            let _ = writeln!(out, "BranchIf [id={}]", b.node_id);
            pad(out, depth + 1);
            let _ = writeln!(out, "cond:");
            write_term(out, &b.cond, depth + 2);
            pad(out, depth + 1);
            let _ = writeln!(out, "then:");
            write_algo(out, &b.then_branch, depth + 2);
            if let Some(e) = &b.else_branch {
                pad(out, depth + 1);
                let _ = writeln!(out, "else:");
                write_algo(out, e, depth + 2);
            }
        }
    }
}

fn write_call(out: &mut String, c: &Call, depth: usize) {
    let _ = writeln!(out, "Call '{}' [id={}]", c.name, c.node_id);
    for arg in &c.args {
        write_atom(out, arg, depth + 1);
    }
}

fn write_term(out: &mut String, t: &Term, depth: usize) {
    match t {
        Term::Atom(ta) => write_atom(out, &ta.atom, depth),
        Term::Unary(tu) => {
            pad(out, depth);
            let _ = writeln!(out, "TermUn '{}' [id={}]", tu.op.as_str(), tu.node_id);
            write_term(out, &tu.term, depth + 1);
        }
        Term::Binary(tb) => {
            pad(out, depth);
            let _ = writeln!(out, "TermBin '{}' [id={}]", tb.op.as_str(), tb.node_id);
            write_term(out, &tb.left, depth + 1);
            write_term(out, &tb.right, depth + 1);
        }
    }
}

fn write_atom(out: &mut String, atom: &Atom, depth: usize) {
    pad(out, depth);
    match atom {
        Atom::Var(v) => {
            let _ = writeln!(out, "VarRef '{}' [id={}]", v.name, v.node_id);
        }
        Atom::Number(n) => {
            let _ = writeln!(out, "NumberLit {} [id={}]", n.value, n.node_id);
        }
    }
}
