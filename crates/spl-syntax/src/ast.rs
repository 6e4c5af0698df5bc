//! AST (abstract syntax tree) types for SPL.
//!
//! Every node carries a `node_id` stamped after parsing by the analysis
//! crate's id assigner; 0 means "not yet assigned". `VarRef::resolved` is an
//! index into the symbol-table entry arena, never a pointer back into the
//! tree, which keeps ownership linear across the pipeline stages.

/// Unique id of an AST node, assigned in pre-order DFS starting at 1.
pub type NodeId = u32;

/// Index into the symbol-table entry arena (filled in by the scope checker).
pub type EntryId = u32;

/// Root: `glob { VARIABLES } proc { PROCDEFS } func { FUNCDEFS } main { MAINPROG }`.
#[derive(Debug, Clone)]
pub struct Program {
    pub globals: Vec<String>,
    pub procs: Vec<ProcDef>,
    pub funcs: Vec<FuncDef>,
    pub main: Main,
    pub node_id: NodeId,
}

/// Procedure definition: `NAME ( MAXTHREE ) { BODY }`.
#[derive(Debug, Clone)]
pub struct ProcDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Body,
    pub node_id: NodeId,
}

/// Function definition: `NAME ( MAXTHREE ) { BODY ; return ATOM }`.
#[derive(Debug, Clone)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Body,
    pub ret: Atom,
    pub node_id: NodeId,
}

/// Shared proc/func body: `local { MAXTHREE } ALGO`.
#[derive(Debug, Clone)]
pub struct Body {
    pub locals: Vec<String>,
    pub algo: Algo,
    pub node_id: NodeId,
}

/// Main block: `var { VARIABLES } ALGO`.
#[derive(Debug, Clone)]
pub struct Main {
    pub variables: Vec<String>,
    pub algo: Algo,
    pub node_id: NodeId,
}

/// Non-empty instruction sequence: `INSTR ( ; INSTR )*`.
#[derive(Debug, Clone)]
pub struct Algo {
    pub instrs: Vec<Instr>,
    pub node_id: NodeId,
}

/// Instructions.
#[derive(Debug, Clone)]
pub enum Instr {
    Halt(Halt),
    Print(Print),
    Call(Call),
    Assign(Assign),
    While(LoopWhile),
    DoUntil(LoopDoUntil),
    If(BranchIf),
}

#[derive(Debug, Clone)]
pub struct Halt {
    pub node_id: NodeId,
}

#[derive(Debug, Clone)]
pub struct Print {
    pub output: Output,
    pub node_id: NodeId,
}

/// Procedure call statement or function call on an assignment RHS.
#[derive(Debug, Clone)]
pub struct Call {
    pub name: String,
    pub args: Vec<Atom>,
    pub node_id: NodeId,
}

/// Assignment RHS: either a function call or a term.
#[derive(Debug, Clone)]
pub enum AssignRhs {
    Call(Call),
    Term(Term),
}

#[derive(Debug, Clone)]
pub struct Assign {
    pub target: String,
    pub rhs: AssignRhs,
    pub node_id: NodeId,
}

/// `while TERM { ALGO }`
#[derive(Debug, Clone)]
pub struct LoopWhile {
    pub cond: Term,
    pub body: Algo,
    pub node_id: NodeId,
}

/// `do { ALGO } until TERM`
#[derive(Debug, Clone)]
pub struct LoopDoUntil {
    pub body: Algo,
    pub cond: Term,
    pub node_id: NodeId,
}

/// `if TERM { ALGO } [else { ALGO }]`
#[derive(Debug, Clone)]
pub struct BranchIf {
    pub cond: Term,
    pub then_branch: Algo,
    pub else_branch: Option<Algo>,
    pub node_id: NodeId,
}

/// Unary operator keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

impl UnOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnOp::Neg => "neg",
            UnOp::Not => "not",
        }
    }
}

/// Binary operator keywords (plus the `>` punctuator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Gt,
    Or,
    And,
    Plus,
    Minus,
    Mult,
    Div,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Eq => "eq",
            BinOp::Gt => ">",
            BinOp::Or => "or",
            BinOp::And => "and",
            BinOp::Plus => "plus",
            BinOp::Minus => "minus",
            BinOp::Mult => "mult",
            BinOp::Div => "div",
        }
    }
}

/// Expression: bare atom, parenthesized unary, or parenthesized binary.
/// Plain `( TERM )` grouping has no representation on purpose.
#[derive(Debug, Clone)]
pub enum Term {
    Atom(TermAtom),
    Unary(TermUn),
    Binary(TermBin),
}

#[derive(Debug, Clone)]
pub struct TermAtom {
    pub atom: Atom,
    pub node_id: NodeId,
}

#[derive(Debug, Clone)]
pub struct TermUn {
    pub op: UnOp,
    pub term: Box<Term>,
    pub node_id: NodeId,
}

#[derive(Debug, Clone)]
pub struct TermBin {
    pub left: Box<Term>,
    pub op: BinOp,
    pub right: Box<Term>,
    pub node_id: NodeId,
}

/// Leaves of a term.
#[derive(Debug, Clone)]
pub enum Atom {
    Var(VarRef),
    Number(NumberLit),
}

impl Atom {
    pub fn node_id(&self) -> NodeId {
        match self {
            Atom::Var(v) => v.node_id,
            Atom::Number(n) => n.node_id,
        }
    }
}

/// A variable use; `resolved` is written by the scope checker.
#[derive(Debug, Clone)]
pub struct VarRef {
    pub name: String,
    pub node_id: NodeId,
    pub resolved: Option<EntryId>,
}

impl VarRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_id: 0,
            resolved: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NumberLit {
    pub value: i64,
    pub node_id: NodeId,
}

#[derive(Debug, Clone)]
pub struct StringLit {
    pub value: String,
    pub node_id: NodeId,
}

/// `print` operand: atom or string literal.
#[derive(Debug, Clone)]
pub enum Output {
    Atom(Atom),
    Str(StringLit),
}
