//! Desugaring passes.
//!
//! Run in this order; each pass consumes the output of the previous ones.
//!
//! - [`constructors`]: Pass 1 - give every class a constructor
//! - [`super_calls`]: Pass 2 - make every constructor start with `super()`
//! - Pass 3 - build the scope tree ([`ScopeBuilder`](crate::scope::ScopeBuilder))
//! - [`captures`]: Pass 4 - record free variables of local classes
//! - [`overrides`]: Pass 5 - add delegations for inherited methods
//!
//! Passes 1, 2 and 5 only add nodes and are idempotent.

pub mod captures;
pub mod constructors;
pub mod overrides;
pub mod super_calls;

pub use captures::{CaptureOutput, CapturePass};
pub use constructors::{ConstructorOutput, ConstructorPass};
pub use overrides::{OverrideOutput, OverridePass};
pub use super_calls::{SuperCallOutput, SuperCallPass};
