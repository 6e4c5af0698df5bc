//! Recursive-descent parser over the LL(1)-refactored SPL grammar.
//!
//! The parser keeps one token of lookahead (`cur`, `nxt`). The single place
//! that needs more is the `IDENT = IDENT (` assignment shape, which commits
//! after reading `IDENT =` and then inspects the token after the next
//! identifier, as the grammar notes allow.

use spl_syntax::ast::*;
use spl_syntax::error::{error_at, Result};
use spl_syntax::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a parser over a token stream ending in `Eof`.
    pub fn new(tokens: Vec<Token>) -> Self {
        assert!(!tokens.is_empty(), "token stream must end with Eof");
        Self { tokens, pos: 0 }
    }

    fn cur(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn nxt(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: TokenKind) -> Result<Token> {
        if self.cur().kind == kind {
            let tok = self.cur().clone();
            self.advance();
            Ok(tok)
        } else {
            let cur = self.cur();
            error_at(
                cur.line,
                cur.col,
                format!("expected {}, found {}", kind.describe(), cur.kind.describe()),
            )
        }
    }

    fn eat_if(&mut self, kind: TokenKind) -> bool {
        if self.cur().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match &self.cur().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => {
                let cur = self.cur();
                error_at(
                    cur.line,
                    cur.col,
                    format!("expected identifier, found {}", other.describe()),
                )
            }
        }
    }

    // --- entrypoint --------------------------------------------------------

    /// `SPL_PROG ::= glob { VARIABLES } proc { PROCDEFS } func { FUNCDEFS } main { MAINPROG }`
    pub fn parse_program(&mut self) -> Result<Program> {
        self.eat(TokenKind::Glob)?;
        self.eat(TokenKind::LBrace)?;
        let globals = self.variables();
        self.eat(TokenKind::RBrace)?;

        self.eat(TokenKind::Proc)?;
        self.eat(TokenKind::LBrace)?;
        let mut procs = Vec::new();
        while matches!(self.cur().kind, TokenKind::Ident(_)) {
            procs.push(self.proc_def()?);
        }
        self.eat(TokenKind::RBrace)?;

        self.eat(TokenKind::Func)?;
        self.eat(TokenKind::LBrace)?;
        let mut funcs = Vec::new();
        while matches!(self.cur().kind, TokenKind::Ident(_)) {
            funcs.push(self.func_def()?);
        }
        self.eat(TokenKind::RBrace)?;

        self.eat(TokenKind::Main)?;
        self.eat(TokenKind::LBrace)?;
        let main = self.main_prog()?;
        self.eat(TokenKind::RBrace)?;

        self.eat(TokenKind::Eof)?;
        Ok(Program {
            globals,
            procs,
            funcs,
            main,
            node_id: 0,
        })
    }

    // --- list helpers ------------------------------------------------------

    /// `VARIABLES ::= VAR*` — an unbounded identifier list.
    fn variables(&mut self) -> Vec<String> {
        let mut names = Vec::new();
        while let TokenKind::Ident(name) = &self.cur().kind {
            names.push(name.clone());
            self.advance();
        }
        names
    }

    /// `MAXTHREE ::= (VAR (VAR (VAR)?)?)?` — at most three identifiers; a
    /// fourth is left for the caller's closing delimiter to trip over.
    fn maxthree(&mut self) -> Vec<String> {
        let mut names = Vec::new();
        for _ in 0..3 {
            if let TokenKind::Ident(name) = &self.cur().kind {
                names.push(name.clone());
                self.advance();
            } else {
                break;
            }
        }
        names
    }

    fn proc_def(&mut self) -> Result<ProcDef> {
        let name = self.expect_ident()?;
        self.eat(TokenKind::LParen)?;
        let params = self.maxthree();
        self.eat(TokenKind::RParen)?;
        self.eat(TokenKind::LBrace)?;
        let body = self.body()?;
        self.eat(TokenKind::RBrace)?;
        Ok(ProcDef {
            name,
            params,
            body,
            node_id: 0,
        })
    }

    fn func_def(&mut self) -> Result<FuncDef> {
        let name = self.expect_ident()?;
        self.eat(TokenKind::LParen)?;
        let params = self.maxthree();
        self.eat(TokenKind::RParen)?;
        self.eat(TokenKind::LBrace)?;
        let body = self.body()?;
        // the ';' before 'return' belongs to the function rule, not the ALGO
        self.eat(TokenKind::Semi)?;
        self.eat(TokenKind::Return)?;
        let ret = self.atom()?;
        self.eat(TokenKind::RBrace)?;
        Ok(FuncDef {
            name,
            params,
            body,
            ret,
            node_id: 0,
        })
    }

    /// `BODY ::= local { MAXTHREE } ALGO`
    fn body(&mut self) -> Result<Body> {
        self.eat(TokenKind::Local)?;
        self.eat(TokenKind::LBrace)?;
        let locals = self.maxthree();
        self.eat(TokenKind::RBrace)?;
        let algo = self.algo()?;
        Ok(Body {
            locals,
            algo,
            node_id: 0,
        })
    }

    /// `MAINPROG ::= var { VARIABLES } ALGO`
    fn main_prog(&mut self) -> Result<Main> {
        self.eat(TokenKind::Var)?;
        self.eat(TokenKind::LBrace)?;
        let variables = self.variables();
        self.eat(TokenKind::RBrace)?;
        let algo = self.algo()?;
        Ok(Main {
            variables,
            algo,
            node_id: 0,
        })
    }

    // --- ALGO / INSTR ------------------------------------------------------

    /// `ALGO ::= INSTR (';' INSTR)*`
    ///
    /// The repetition is guarded on `nxt` so the ';' that precedes 'return'
    /// in a function body is never absorbed here.
    fn algo(&mut self) -> Result<Algo> {
        let mut instrs = vec![self.instr()?];
        while self.cur().kind == TokenKind::Semi && self.nxt().kind.starts_instr() {
            self.eat(TokenKind::Semi)?;
            instrs.push(self.instr()?);
        }
        Ok(Algo {
            instrs,
            node_id: 0,
        })
    }

    fn instr(&mut self) -> Result<Instr> {
        match self.cur().kind.clone() {
            TokenKind::Halt => {
                self.eat(TokenKind::Halt)?;
                Ok(Instr::Halt(Halt { node_id: 0 }))
            }
            TokenKind::Print => {
                self.eat(TokenKind::Print)?;
                let output = self.output()?;
                Ok(Instr::Print(Print { output, node_id: 0 }))
            }
            TokenKind::Ident(name) => self.ident_instr(name),
            TokenKind::While => {
                self.eat(TokenKind::While)?;
                let cond = self.term()?;
                self.eat(TokenKind::LBrace)?;
                let body = self.algo()?;
                self.eat(TokenKind::RBrace)?;
                Ok(Instr::While(LoopWhile {
                    cond,
                    body,
                    node_id: 0,
                }))
            }
            TokenKind::Do => {
                self.eat(TokenKind::Do)?;
                self.eat(TokenKind::LBrace)?;
                let body = self.algo()?;
                self.eat(TokenKind::RBrace)?;
                self.eat(TokenKind::Until)?;
                let cond = self.term()?;
                Ok(Instr::DoUntil(LoopDoUntil {
                    body,
                    cond,
                    node_id: 0,
                }))
            }
            TokenKind::If => {
                self.eat(TokenKind::If)?;
                let cond = self.term()?;
                self.eat(TokenKind::LBrace)?;
                let then_branch = self.algo()?;
                self.eat(TokenKind::RBrace)?;
                let else_branch = if self.eat_if(TokenKind::Else) {
                    self.eat(TokenKind::LBrace)?;
                    let e = self.algo()?;
                    self.eat(TokenKind::RBrace)?;
                    Some(e)
                } else {
                    None
                };
                Ok(Instr::If(BranchIf {
                    cond,
                    then_branch,
                    else_branch,
                    node_id: 0,
                }))
            }
            other => {
                let cur = self.cur();
                error_at(
                    cur.line,
                    cur.col,
                    format!("expected instruction, found {}", other.describe()),
                )
            }
        }
    }

    /// Tri-way decision for an instruction starting with an identifier:
    ///
    ///   NAME '(' INPUT ')'          procedure call
    ///   VAR '=' NAME '(' INPUT ')'  assignment from function call
    ///   VAR '=' TERM                assignment from term
    fn ident_instr(&mut self, name: String) -> Result<Instr> {
        self.expect_ident()?;

        if self.cur().kind == TokenKind::LParen {
            self.eat(TokenKind::LParen)?;
            let args = self.input_atoms()?;
            self.eat(TokenKind::RParen)?;
            return Ok(Instr::Call(Call {
                name,
                args,
                node_id: 0,
            }));
        }

        if self.cur().kind == TokenKind::Assign {
            self.eat(TokenKind::Assign)?;

            // After '=': '(' opens a term; an identifier followed by '(' is a
            // function call; a bare identifier or number is an atom term.
            let rhs = match self.cur().kind.clone() {
                TokenKind::LParen => AssignRhs::Term(self.term()?),
                TokenKind::Ident(fname) => {
                    self.expect_ident()?;
                    if self.cur().kind == TokenKind::LParen {
                        self.eat(TokenKind::LParen)?;
                        let args = self.input_atoms()?;
                        self.eat(TokenKind::RParen)?;
                        AssignRhs::Call(Call {
                            name: fname,
                            args,
                            node_id: 0,
                        })
                    } else {
                        AssignRhs::Term(Term::Atom(TermAtom {
                            atom: Atom::Var(VarRef::new(fname)),
                            node_id: 0,
                        }))
                    }
                }
                TokenKind::Number(value) => {
                    self.advance();
                    AssignRhs::Term(Term::Atom(TermAtom {
                        atom: Atom::Number(NumberLit { value, node_id: 0 }),
                        node_id: 0,
                    }))
                }
                _ => AssignRhs::Term(self.term()?),
            };
            return Ok(Instr::Assign(Assign {
                target: name,
                rhs,
                node_id: 0,
            }));
        }

        let cur = self.cur();
        error_at(
            cur.line,
            cur.col,
            format!(
                "expected '(' or '=' after identifier, found {}",
                cur.kind.describe()
            ),
        )
    }

    // --- small nonterminals ------------------------------------------------

    /// `OUTPUT ::= ATOM | STRING`
    fn output(&mut self) -> Result<Output> {
        if let TokenKind::Str(s) = &self.cur().kind {
            let value = s.clone();
            self.advance();
            return Ok(Output::Str(StringLit { value, node_id: 0 }));
        }
        Ok(Output::Atom(self.atom()?))
    }

    /// `INPUT ::= 0..3 ATOM` — bounded like MAXTHREE.
    fn input_atoms(&mut self) -> Result<Vec<Atom>> {
        let mut args = Vec::new();
        for _ in 0..3 {
            if matches!(self.cur().kind, TokenKind::Ident(_) | TokenKind::Number(_)) {
                args.push(self.atom()?);
            } else {
                break;
            }
        }
        Ok(args)
    }

    /// `TERM ::= ATOM | '(' UNOP TERM ')' | '(' TERM BINOP TERM ')'`
    ///
    /// Plain grouping `( TERM )` is not in the grammar; a missing binary
    /// operator after the inner term is reported as such.
    pub fn term(&mut self) -> Result<Term> {
        if matches!(self.cur().kind, TokenKind::Ident(_) | TokenKind::Number(_)) {
            let atom = self.atom()?;
            return Ok(Term::Atom(TermAtom { atom, node_id: 0 }));
        }

        self.eat(TokenKind::LParen)?;

        let un_op = match self.cur().kind {
            TokenKind::Neg => Some(UnOp::Neg),
            TokenKind::Not => Some(UnOp::Not),
            _ => None,
        };
        if let Some(op) = un_op {
            self.advance();
            let term = self.term()?;
            self.eat(TokenKind::RParen)?;
            return Ok(Term::Unary(TermUn {
                op,
                term: Box::new(term),
                node_id: 0,
            }));
        }

        let left = self.term()?;
        let op = match self.cur().kind {
            TokenKind::Eq => BinOp::Eq,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::Or => BinOp::Or,
            TokenKind::And => BinOp::And,
            TokenKind::Plus => BinOp::Plus,
            TokenKind::Minus => BinOp::Minus,
            TokenKind::Mult => BinOp::Mult,
            TokenKind::Div => BinOp::Div,
            _ => {
                let cur = self.cur();
                return error_at(
                    cur.line,
                    cur.col,
                    format!("expected binary operator, found {}", cur.kind.describe()),
                );
            }
        };
        self.advance();
        let right = self.term()?;
        self.eat(TokenKind::RParen)?;
        Ok(Term::Binary(TermBin {
            left: Box::new(left),
            op,
            right: Box::new(right),
            node_id: 0,
        }))
    }

    /// `ATOM ::= VAR | NUMBER`
    fn atom(&mut self) -> Result<Atom> {
        match self.cur().kind.clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Atom::Var(VarRef::new(name)))
            }
            TokenKind::Number(value) => {
                self.advance();
                Ok(Atom::Number(NumberLit { value, node_id: 0 }))
            }
            other => {
                let cur = self.cur();
                error_at(
                    cur.line,
                    cur.col,
                    format!("expected atom, found {}", other.describe()),
                )
            }
        }
    }
}
