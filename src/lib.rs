//! stepvm
//!
//! Compile a Java-like program, given as a JSON AST, to a flat instruction
//! tape and run it one statement at a time.
//!
//! ## Modules
//!
//! - [`config`]: session configuration
//! - [`error`]: session-level error type
//! - [`session`]: compile / step / reset driver
//! - [`vm`]: single-step stack machine
//!
//! The AST and the compiler live in [`stepvm_core`] and [`stepvm_compiler`]
//! and are re-exported as [`ast`] and [`compiler`].
//!
//! # Example
//!
//! ```
//! use stepvm::{Session, SessionConfig, StepOutcome};
//!
//! let source = r#"{
//!   "node": "CompilationUnit",
//!   "types": [{
//!     "node": "TypeDeclaration",
//!     "name": { "node": "SimpleName", "identifier": "Main" },
//!     "bodyDeclarations": [{
//!       "node": "FieldDeclaration",
//!       "type": { "node": "PrimitiveType", "primitiveTypeCode": "int" },
//!       "fragments": [{
//!         "node": "VariableDeclarationFragment",
//!         "name": { "node": "SimpleName", "identifier": "x" },
//!         "initializer": { "node": "NumberLiteral", "token": "3" }
//!       }]
//!     }]
//!   }]
//! }"#;
//!
//! let mut session = Session::new(SessionConfig::default());
//! session.compile(source).unwrap();
//! let StepOutcome::Yielded(snapshot) = session.step().unwrap() else {
//!     panic!("expected the field initializer to yield");
//! };
//! assert_eq!(snapshot.binding("x"), Some(stepvm::Value::Int(3)));
//! assert_eq!(session.step().unwrap(), StepOutcome::Finished);
//! ```

pub mod config;
pub mod error;
pub mod session;
pub mod vm;

pub use config::SessionConfig;
pub use error::SessionError;
pub use session::{CompileSummary, Session};
pub use vm::{FrameSnapshot, Interpreter, Snapshot, StepOutcome};

pub use stepvm_compiler as compiler;
pub use stepvm_core::ast;
pub use stepvm_core::{AstError, CompilationError, RuntimeError, Value};
