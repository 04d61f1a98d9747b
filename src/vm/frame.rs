//! Binding frames and observable machine snapshots.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use stepvm_core::Value;

/// A named set of variable bindings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    name: String,
    bindings: FxHashMap<String, Value>,
}

impl Frame {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).copied()
    }

    #[inline]
    pub fn set(&mut self, name: &str, value: Value) {
        match self.bindings.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.bindings.insert(name.to_string(), value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            name: self.name.clone(),
            bindings: self
                .bindings
                .iter()
                .map(|(name, value)| (name.clone(), *value))
                .collect(),
        }
    }
}

/// Bindings of one frame, sorted by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub name: String,
    pub bindings: BTreeMap<String, Value>,
}

/// Observable machine state after a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Address of the next instruction.
    pub pc: usize,
    /// Outermost frame first.
    pub frames: Vec<FrameSnapshot>,
    /// Value on top of the operand stack when the statement completed.
    pub value: Option<Value>,
}

impl Snapshot {
    /// Visible binding of `name`, innermost frame first.
    pub fn binding(&self, name: &str) -> Option<Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.bindings.get(name).copied())
    }
}
