//! BASIC emission: turn the unnumbered intermediate listing into a numbered
//! program with all symbolic jump targets resolved.
//!
//! Every line, `REM` markers included, gets a line number (10, 20, 30, …).
//! A `GOTO` or `IF … THEN` that names a label is rewritten to the line
//! number of that label's `REM` line; the BASIC interpreter treats the `REM`
//! as a no-op and falls through to the labelled statement.

use std::collections::HashMap;

use spl_syntax::diag::{Diagnostic, DiagnosticKind};

const START: u32 = 10;
const STEP: u32 = 10;

/// A symbolic label: letters followed by at least one digit, e.g. `WH1`.
fn is_label(word: &str) -> bool {
    let letters: usize = word.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    letters > 0
        && letters < word.len()
        && word[letters..].chars().all(|c| c.is_ascii_digit())
}

/// The label a `REM` marker line defines, if it is one.
fn label_of(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("REM ")?;
    let rest = rest.trim();
    is_label(rest).then_some(rest)
}

/// Number the listing and resolve every label reference. Blank lines are
/// dropped; everything else keeps its relative order.
pub fn to_basic(lines: &[String]) -> Result<Vec<String>, Diagnostic> {
    // pass 1: number lines and collect label definitions
    let mut numbered: Vec<(u32, &str)> = Vec::new();
    let mut line_no = START;
    for raw in lines {
        if raw.trim().is_empty() {
            continue;
        }
        numbered.push((line_no, raw.as_str()));
        line_no += STEP;
    }

    let mut targets: HashMap<&str, u32> = HashMap::new();
    for (n, text) in &numbered {
        if let Some(label) = label_of(text) {
            if targets.insert(label, *n).is_some() {
                return Err(Diagnostic::new(
                    DiagnosticKind::EmitterError,
                    format!("label '{}' defined more than once", label),
                ));
            }
        }
    }

    // pass 2: rewrite GOTO/THEN label operands
    let mut out = Vec::with_capacity(numbered.len());
    for (n, text) in &numbered {
        let resolved = resolve_jumps(text, &targets)?;
        out.push(format!("{} {}", n, resolved));
    }
    Ok(out)
}

fn resolve_jumps(text: &str, targets: &HashMap<&str, u32>) -> Result<String, Diagnostic> {
    // REM marker lines pass through untouched so their label survives as
    // documentation in the output
    if label_of(text).is_some() {
        return Ok(text.to_string());
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut out: Vec<String> = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        out.push(words[i].to_string());
        if (words[i] == "GOTO" || words[i] == "THEN") && i + 1 < words.len() {
            let operand = words[i + 1];
            if is_label(operand) {
                let n = targets.get(operand).ok_or_else(|| {
                    Diagnostic::new(
                        DiagnosticKind::EmitterError,
                        format!("jump to undefined label '{}'", operand),
                    )
                })?;
                out.push(n.to_string());
                i += 2;
                continue;
            }
        }
        i += 1;
    }
    Ok(out.join(" "))
}
