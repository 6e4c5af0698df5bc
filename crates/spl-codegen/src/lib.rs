//! SPL code generation: AST → intermediate listing → numbered BASIC.

pub mod basic;
pub mod gen;

pub use basic::to_basic;
pub use gen::{generate, Generator};

#[cfg(test)]
mod tests {
    use super::*;
    use spl_analysis::assign_ids;
    use spl_lexer::Lexer;
    use spl_parser::Parser;

    fn compile_to_basic(src: &str) -> Vec<String> {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let mut program = Parser::new(tokens).parse_program().unwrap();
        assign_ids(&mut program);
        let listing = generate(&program).unwrap();
        to_basic(&listing).unwrap()
    }

    #[test]
    fn minimal_program_emits_a_single_stop() {
        assert_eq!(
            compile_to_basic("glob { } proc { } func { } main { var { } halt }"),
            vec!["10 STOP"]
        );
    }

    #[test]
    fn simple_assignment_end_to_end() {
        assert_eq!(
            compile_to_basic("glob { } proc { } func { } main { var { x } x = 3 ; halt }"),
            vec!["10 x = 3", "20 STOP"]
        );
    }

    #[test]
    fn while_loop_jumps_land_on_rem_lines() {
        let out = compile_to_basic(
            "glob { i } proc { } func { } main { var { } \
             while ( i > 0 ) { print i ; i = ( i minus 1 ) } ; halt }",
        );
        assert_eq!(
            out,
            vec![
                "10 REM WH1",
                "20 IF i > 0 THEN 40",
                "30 GOTO 80",
                "40 REM WB2",
                "50 PRINT i",
                "60 i = (i - 1)",
                "70 GOTO 10",
                "80 REM WE3",
                "90 STOP",
            ]
        );
    }

    #[test]
    fn codegen_output_is_byte_identical_across_runs() {
        let src = "glob { i } proc { step(k) { local { } i = ( i minus k ) } } func { } \
                   main { var { } while ( i > 0 ) { step(2) } ; halt }";
        assert_eq!(compile_to_basic(src), compile_to_basic(src));
    }
}
