//! SPL syntax definitions: tokens, AST, and error/diagnostic types.
//!
//! Every other crate in the workspace depends on these foundational types.
//! The crate is split into four modules:
//!
//! - [`token`]: token kinds and the positioned [`token::Token`] record
//! - [`ast`]: the AST node set, with post-parse [`ast::NodeId`]s
//! - [`error`]: the fatal error band (lexical, syntactic, emitter)
//! - [`diag`]: collected static-semantic diagnostics

pub mod ast;
pub mod diag;
pub mod error;
pub mod token;

pub use ast::*;
pub use diag::{Diagnostic, DiagnosticKind};
pub use error::{Error, Result};
pub use token::{Token, TokenKind};
