pub mod parser;

pub use parser::Parser;

#[cfg(test)]
mod tests {
    use super::*;
    use spl_lexer::Lexer;
    use spl_syntax::ast::*;

    fn parse_program_str(input: &str) -> Program {
        let tokens = Lexer::new(input).tokenize().expect("Lexing should succeed");
        let mut parser = Parser::new(tokens);
        parser.parse_program().expect("Parsing should succeed")
    }

    fn parse_term_str(input: &str) -> Term {
        let tokens = Lexer::new(input).tokenize().expect("Lexing should succeed");
        let mut parser = Parser::new(tokens);
        parser.term().expect("Parsing should succeed")
    }

    fn parse_err(input: &str) -> String {
        let tokens = Lexer::new(input).tokenize().expect("Lexing should succeed");
        let mut parser = Parser::new(tokens);
        parser
            .parse_program()
            .expect_err("Parsing should fail")
            .to_string()
    }

    #[test]
    fn test_minimal_program() {
        let p = parse_program_str("glob { } proc { } func { } main { var { } halt }");
        assert!(p.globals.is_empty());
        assert!(p.procs.is_empty());
        assert!(p.funcs.is_empty());
        assert_eq!(p.main.algo.instrs.len(), 1);
        assert!(matches!(p.main.algo.instrs[0], Instr::Halt(_)));
    }

    #[test]
    fn test_global_and_main_variables() {
        let p = parse_program_str("glob { a b c } proc { } func { } main { var { t } halt }");
        assert_eq!(p.globals, vec!["a", "b", "c"]);
        assert_eq!(p.main.variables, vec!["t"]);
    }

    #[test]
    fn test_term_shapes() {
        assert!(matches!(parse_term_str("x"), Term::Atom(_)));
        assert!(matches!(parse_term_str("42"), Term::Atom(_)));
        assert!(matches!(
            parse_term_str("( neg x )"),
            Term::Unary(TermUn { op: UnOp::Neg, .. })
        ));
        assert!(matches!(
            parse_term_str("( not ( x eq 1 ) )"),
            Term::Unary(TermUn { op: UnOp::Not, .. })
        ));
        assert!(matches!(
            parse_term_str("( x plus 1 )"),
            Term::Binary(TermBin { op: BinOp::Plus, .. })
        ));
        assert!(matches!(
            parse_term_str("( x > 0 )"),
            Term::Binary(TermBin { op: BinOp::Gt, .. })
        ));
    }

    #[test]
    fn test_plain_grouping_is_rejected() {
        let tokens = Lexer::new("( ( x plus 1 ) )").tokenize().unwrap();
        let err = Parser::new(tokens).term().expect_err("should fail");
        assert!(err.msg.contains("expected binary operator"), "{}", err);
    }

    #[test]
    fn test_proc_call_statement() {
        let p = parse_program_str("glob { } proc { } func { } main { var { } p(a 1 b) ; halt }");
        match &p.main.algo.instrs[0] {
            Instr::Call(c) => {
                assert_eq!(c.name, "p");
                assert_eq!(c.args.len(), 3);
            }
            other => panic!("expected Call, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_from_term() {
        let p = parse_program_str("glob { } proc { } func { } main { var { x } x = 3 ; halt }");
        match &p.main.algo.instrs[0] {
            Instr::Assign(a) => {
                assert_eq!(a.target, "x");
                assert!(matches!(a.rhs, AssignRhs::Term(Term::Atom(_))));
            }
            other => panic!("expected Assign, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_from_function_call() {
        // `x = f(a b)` must become Assign(x, Call(f, [a, b])), never an
        // atom term followed by a stray '('.
        let p = parse_program_str("glob { } proc { } func { } main { var { x } x = f(a b) ; halt }");
        match &p.main.algo.instrs[0] {
            Instr::Assign(a) => match &a.rhs {
                AssignRhs::Call(c) => {
                    assert_eq!(c.name, "f");
                    assert_eq!(c.args.len(), 2);
                }
                other => panic!("expected Call rhs, got {:?}", other),
            },
            other => panic!("expected Assign, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_from_bare_variable() {
        let p = parse_program_str("glob { } proc { } func { } main { var { x } x = y ; halt }");
        match &p.main.algo.instrs[0] {
            Instr::Assign(a) => match &a.rhs {
                AssignRhs::Term(Term::Atom(TermAtom {
                    atom: Atom::Var(v), ..
                })) => assert_eq!(v.name, "y"),
                other => panic!("expected variable term rhs, got {:?}", other),
            },
            other => panic!("expected Assign, got {:?}", other),
        }
    }

    #[test]
    fn test_function_return_semicolon_not_absorbed() {
        // The ALGO repetition must stop before '; return a'.
        let p = parse_program_str(
            "glob { } proc { } func { f(a) { local { } print a ; return a } } \
             main { var { } halt }",
        );
        let f = &p.funcs[0];
        assert_eq!(f.name, "f");
        assert_eq!(f.body.algo.instrs.len(), 1);
        assert!(matches!(f.ret, Atom::Var(ref v) if v.name == "a"));
    }

    #[test]
    fn test_while_and_do_until() {
        let p = parse_program_str(
            "glob { i } proc { } func { } main { var { } \
             while ( i > 0 ) { i = ( i minus 1 ) } ; \
             do { i = ( i plus 1 ) } until ( i eq 10 ) ; halt }",
        );
        assert!(matches!(p.main.algo.instrs[0], Instr::While(_)));
        assert!(matches!(p.main.algo.instrs[1], Instr::DoUntil(_)));
        assert!(matches!(p.main.algo.instrs[2], Instr::Halt(_)));
    }

    #[test]
    fn test_if_with_and_without_else() {
        let p = parse_program_str(
            "glob { x } proc { } func { } main { var { } \
             if ( x eq 0 ) { halt } ; \
             if ( x > 1 ) { print x } else { print 0 } }",
        );
        match &p.main.algo.instrs[0] {
            Instr::If(b) => assert!(b.else_branch.is_none()),
            other => panic!("expected If, got {:?}", other),
        }
        match &p.main.algo.instrs[1] {
            Instr::If(b) => assert!(b.else_branch.is_some()),
            other => panic!("expected If, got {:?}", other),
        }
    }

    #[test]
    fn test_maxthree_accepts_up_to_three() {
        for params in ["", "a", "a b", "a b c"] {
            let src = format!(
                "glob {{ }} proc {{ p({}) {{ local {{ }} halt }} }} func {{ }} \
                 main {{ var {{ }} halt }}",
                params
            );
            let p = parse_program_str(&src);
            assert_eq!(p.procs[0].params.len(), params.split_whitespace().count());
        }
    }

    #[test]
    fn test_maxthree_rejects_four() {
        let err = parse_err(
            "glob { } proc { p(a b c d) { local { } halt } } func { } \
             main { var { } halt }",
        );
        assert!(err.contains("expected ')'"), "{}", err);
    }

    #[test]
    fn test_call_rejects_four_arguments() {
        let err = parse_err("glob { } proc { } func { } main { var { } p(a b c d) ; halt }");
        assert!(err.contains("expected ')'"), "{}", err);
    }

    #[test]
    fn test_print_output_forms() {
        let p = parse_program_str(
            "glob { x } proc { } func { } main { var { } print x ; print 7 ; print \"OK\" }",
        );
        assert!(matches!(
            &p.main.algo.instrs[0],
            Instr::Print(Print { output: Output::Atom(Atom::Var(_)), .. })
        ));
        assert!(matches!(
            &p.main.algo.instrs[1],
            Instr::Print(Print { output: Output::Atom(Atom::Number(_)), .. })
        ));
        assert!(matches!(
            &p.main.algo.instrs[2],
            Instr::Print(Print { output: Output::Str(_), .. })
        ));
    }

    #[test]
    fn test_bare_identifier_statement_is_rejected() {
        let err = parse_err("glob { } proc { } func { } main { var { } x }");
        assert!(err.contains("expected '(' or '='"), "{}", err);
    }
}
