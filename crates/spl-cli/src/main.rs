mod ast_print;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;
use owo_colors::OwoColorize;

use spl_analysis::{assign_ids, ScopeChecker, TypeChecker};
use spl_codegen::{generate, to_basic};
use spl_lexer::Lexer;
use spl_parser::Parser;
use spl_syntax::diag::Diagnostic;
use spl_syntax::error::Error;

#[derive(ClapParser, Debug)]
#[command(name = "splc", about = "Compile SPL source to numbered BASIC")]
struct Cli {
    /// SPL source file
    source: PathBuf,

    /// Pretty-print the AST to stdout
    #[arg(long = "print-ast", default_value_t = false)]
    print_ast: bool,

    /// Run scope analysis and report naming diagnostics
    #[arg(long = "check-scopes", default_value_t = false)]
    check_scopes: bool,

    /// Print the full scope tree with entries
    #[arg(long = "dump-scopes", default_value_t = false)]
    dump_scopes: bool,

    /// Run the type checker
    #[arg(long = "type-check", default_value_t = false)]
    type_check: bool,

    /// Write the intermediate listing to <input-stem>.txt
    #[arg(long = "codegen", default_value_t = false)]
    codegen: bool,

    /// Run the full pipeline and write numbered BASIC to <input-stem>.bas
    #[arg(long = "emit-basic", default_value_t = false)]
    emit_basic: bool,

    /// Override the output file for --codegen / --emit-basic
    #[arg(short = 'o', long = "out")]
    out: Option<PathBuf>,
}

/// Quote the offending source line behind a line-number gutter, with a
/// caret marking the reported column.
fn report_error(kind: &str, source: &str, err: &Error) {
    eprintln!("{}: {}", kind.red().bold(), err.msg);
    let Some((line, col)) = err.span else { return };
    match source.lines().nth(line - 1) {
        Some(text) => {
            let gutter = format!("{:>4} | ", line);
            eprintln!("{}{}", gutter.cyan(), text);
            let caret = format!("{:>width$}", "^", width = col);
            eprintln!("{}{}", " ".repeat(gutter.len()), caret.yellow().bold());
        }
        None => eprintln!("    (at {}:{})", line, col),
    }
}

fn render_fatal_diagnostic(diag: &Diagnostic) {
    eprintln!("{}", diag.to_string().red());
}

fn write_output(path: &PathBuf, lines: &[String]) -> Result<(), String> {
    let text = if lines.is_empty() {
        String::new()
    } else {
        format!("{}\n", lines.join("\n"))
    };
    fs::write(path, text).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let src = match fs::read_to_string(&cli.source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!(
                "{}: {}",
                "error".red().bold(),
                format!("Failed to read {}: {}", cli.source.display(), e).red()
            );
            return ExitCode::FAILURE;
        }
    };

    // fatal band: lexing and parsing stop at the first error
    let tokens = match Lexer::new(&src).tokenize() {
        Ok(t) => t,
        Err(e) => {
            report_error("LexicalError", &src, &e);
            return ExitCode::FAILURE;
        }
    };
    let mut program = match Parser::new(tokens).parse_program() {
        Ok(p) => p,
        Err(e) => {
            report_error("SyntaxError", &src, &e);
            return ExitCode::FAILURE;
        }
    };
    assign_ids(&mut program);

    if cli.print_ast {
        print!("{}", ast_print::program_to_string(&program));
    }

    let mut failed = false;
    let run_scopes = cli.check_scopes || cli.dump_scopes || cli.codegen || cli.emit_basic;
    let run_types = cli.type_check || cli.codegen || cli.emit_basic;

    let mut naming_ok = true;
    if run_scopes {
        let (table, diags) = ScopeChecker::new().run(&mut program);
        if cli.dump_scopes {
            print!("{}", table.pretty_print());
        }
        if diags.is_empty() {
            if cli.check_scopes {
                println!("Variable Naming and Function Naming accepted");
            }
        } else {
            naming_ok = false;
            failed = true;
            println!("Naming error(s):");
            for d in &diags {
                println!("{}", d);
            }
        }
    }

    let mut types_ok = true;
    if run_types && naming_ok {
        let typing = TypeChecker::new().run(&program);
        if typing.is_ok() {
            if cli.type_check {
                println!("Type checking passed");
            }
        } else {
            types_ok = false;
            failed = true;
            println!("Type error(s):");
            for d in &typing.diagnostics {
                println!("{}", d);
            }
        }
    }

    // codegen band runs only on a clean front half of the pipeline
    if (cli.codegen || cli.emit_basic) && naming_ok && types_ok {
        match generate(&program) {
            Ok(listing) => {
                if cli.codegen {
                    let path = cli
                        .out
                        .clone()
                        .unwrap_or_else(|| cli.source.with_extension("txt"));
                    match write_output(&path, &listing) {
                        Ok(()) => println!("Wrote {}", path.display()),
                        Err(e) => {
                            eprintln!("{}: {}", "error".red().bold(), e.red());
                            failed = true;
                        }
                    }
                }
                if cli.emit_basic {
                    match to_basic(&listing) {
                        Ok(numbered) => {
                            let path = cli
                                .out
                                .clone()
                                .unwrap_or_else(|| cli.source.with_extension("bas"));
                            match write_output(&path, &numbered) {
                                Ok(()) => println!("Wrote {}", path.display()),
                                Err(e) => {
                                    eprintln!("{}: {}", "error".red().bold(), e.red());
                                    failed = true;
                                }
                            }
                        }
                        Err(diag) => {
                            render_fatal_diagnostic(&diag);
                            failed = true;
                        }
                    }
                }
            }
            Err(diag) => {
                render_fatal_diagnostic(&diag);
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
