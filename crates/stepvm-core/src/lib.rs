//! Core types shared by the stepvm compiler and interpreter.
//!
//! ## Modules
//!
//! - [`ast`]: JSON-shaped AST of Java-like programs
//! - [`error`]: error hierarchy for decoding, compilation and execution
//! - [`ids`]: stable declaration identifiers
//! - [`value`]: runtime values

pub mod ast;
pub mod error;
pub mod ids;
pub mod value;

pub use error::{AstError, CompilationError, RuntimeError};
pub use ids::NodeId;
pub use value::Value;
