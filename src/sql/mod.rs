//! SQL layer - parsing and canonical rendering of DELETE statements
//!
//! This module provides:
//! - `Parser`: Parses SQL text into the internal AST
//! - `ast`: Immutable statement trees with clone-with-substitution
//! - `display`: Canonical, re-parseable rendering of those trees

pub mod ast;
pub mod display;
pub mod error;
pub mod parser;

pub use ast::*;
pub use error::{SqlError, SqlResult};
pub use parser::Parser;
