//! Node id assignment.
//!
//! Ids are stamped in a single deterministic pre-order DFS starting at 1, so
//! they double as a stable primary key across pipeline stages and across
//! runs. Re-running the assigner on an already-stamped tree reassigns the
//! exact same ids.

use spl_syntax::ast::*;

struct IdAssigner {
    next_id: NodeId,
}

impl IdAssigner {
    fn new() -> Self {
        Self { next_id: 1 }
    }

    fn stamp(&mut self, id: &mut NodeId) {
        *id = self.next_id;
        self.next_id += 1;
    }

    fn program(&mut self, p: &mut Program) {
        self.stamp(&mut p.node_id);
        for pdef in &mut p.procs {
            self.stamp(&mut pdef.node_id);
            self.body(&mut pdef.body);
        }
        for fdef in &mut p.funcs {
            self.stamp(&mut fdef.node_id);
            self.body(&mut fdef.body);
            self.atom(&mut fdef.ret);
        }
        self.stamp(&mut p.main.node_id);
        self.algo(&mut p.main.algo);
    }

    fn body(&mut self, b: &mut Body) {
        self.stamp(&mut b.node_id);
        self.algo(&mut b.algo);
    }

    fn algo(&mut self, a: &mut Algo) {
        self.stamp(&mut a.node_id);
        for instr in &mut a.instrs {
            self.instr(instr);
        }
    }

    fn instr(&mut self, i: &mut Instr) {
        match i {
            Instr::Halt(h) => self.stamp(&mut h.node_id),
            Instr::Print(p) => {
                self.stamp(&mut p.node_id);
                self.output(&mut p.output);
            }
            Instr::Call(c) => self.call(c),
            Instr::Assign(a) => {
                self.stamp(&mut a.node_id);
                match &mut a.rhs {
                    AssignRhs::Call(c) => self.call(c),
                    AssignRhs::Term(t) => self.term(t),
                }
            }
            Instr::While(w) => {
                self.stamp(&mut w.node_id);
                self.term(&mut w.cond);
                self.algo(&mut w.body);
            }
            Instr::DoUntil(d) => {
                self.stamp(&mut d.node_id);
                self.algo(&mut d.body);
                self.term(&mut d.cond);
            }
            Instr::If(b) => {
                self.stamp(&mut b.node_id);
                self.term(&mut b.cond);
                self.algo(&mut b.then_branch);
                if let Some(e) = &mut b.else_branch {
                    self.algo(e);
                }
            }
        }
    }

    fn call(&mut self, c: &mut Call) {
        self.stamp(&mut c.node_id);
        for arg in &mut c.args {
            self.atom(arg);
        }
    }

    fn output(&mut self, o: &mut Output) {
        match o {
            Output::Atom(a) => self.atom(a),
            Output::Str(s) => self.stamp(&mut s.node_id),
        }
    }

    fn term(&mut self, t: &mut Term) {
        match t {
            Term::Atom(ta) => {
                self.stamp(&mut ta.node_id);
                self.atom(&mut ta.atom);
            }
            Term::Unary(tu) => {
                self.stamp(&mut tu.node_id);
                self.term(&mut tu.term);
            }
            Term::Binary(tb) => {
                self.stamp(&mut tb.node_id);
                self.term(&mut tb.left);
                self.term(&mut tb.right);
            }
        }
    }

    fn atom(&mut self, a: &mut Atom) {
        match a {
            Atom::Var(v) => self.stamp(&mut v.node_id),
            Atom::Number(n) => self.stamp(&mut n.node_id),
        }
    }
}

/// Assign ids to every node of the tree; returns the highest id handed out.
pub fn assign_ids(program: &mut Program) -> NodeId {
    let mut assigner = IdAssigner::new();
    assigner.program(program);
    assigner.next_id - 1
}

/// Collect every node id in the tree, in visit order.
pub fn collect_ids(program: &Program) -> Vec<NodeId> {
    let mut ids = Vec::new();
    collect_program(program, &mut ids);
    ids
}

/// Total number of nodes in the tree.
pub fn count_nodes(program: &Program) -> usize {
    collect_ids(program).len()
}

fn collect_program(p: &Program, ids: &mut Vec<NodeId>) {
    ids.push(p.node_id);
    for pdef in &p.procs {
        ids.push(pdef.node_id);
        collect_body(&pdef.body, ids);
    }
    for fdef in &p.funcs {
        ids.push(fdef.node_id);
        collect_body(&fdef.body, ids);
        ids.push(fdef.ret.node_id());
    }
    ids.push(p.main.node_id);
    collect_algo(&p.main.algo, ids);
}

fn collect_body(b: &Body, ids: &mut Vec<NodeId>) {
    ids.push(b.node_id);
    collect_algo(&b.algo, ids);
}

fn collect_algo(a: &Algo, ids: &mut Vec<NodeId>) {
    ids.push(a.node_id);
    for instr in &a.instrs {
        collect_instr(instr, ids);
    }
}

fn collect_instr(i: &Instr, ids: &mut Vec<NodeId>) {
    match i {
        Instr::Halt(h) => ids.push(h.node_id),
        Instr::Print(p) => {
            ids.push(p.node_id);
            match &p.output {
                Output::Atom(a) => ids.push(a.node_id()),
                Output::Str(s) => ids.push(s.node_id),
            }
        }
        Instr::Call(c) => collect_call(c, ids),
        Instr::Assign(a) => {
            ids.push(a.node_id);
            match &a.rhs {
                AssignRhs::Call(c) => collect_call(c, ids),
                AssignRhs::Term(t) => collect_term(t, ids),
            }
        }
        Instr::While(w) => {
            ids.push(w.node_id);
            collect_term(&w.cond, ids);
            collect_algo(&w.body, ids);
        }
        Instr::DoUntil(d) => {
            ids.push(d.node_id);
            collect_algo(&d.body, ids);
            collect_term(&d.cond, ids);
        }
        Instr::If(b) => {
            ids.push(b.node_id);
            collect_term(&b.cond, ids);
            collect_algo(&b.then_branch, ids);
            if let Some(e) = &b.else_branch {
                collect_algo(e, ids);
            }
        }
    }
}

fn collect_call(c: &Call, ids: &mut Vec<NodeId>) {
    ids.push(c.node_id);
    for arg in &c.args {
        ids.push(arg.node_id());
    }
}

fn collect_term(t: &Term, ids: &mut Vec<NodeId>) {
    match t {
        Term::Atom(ta) => {
            ids.push(ta.node_id);
            ids.push(ta.atom.node_id());
        }
        Term::Unary(tu) => {
            ids.push(tu.node_id);
            collect_term(&tu.term, ids);
        }
        Term::Binary(tb) => {
            ids.push(tb.node_id);
            collect_term(&tb.left, ids);
            collect_term(&tb.right, ids);
        }
    }
}
