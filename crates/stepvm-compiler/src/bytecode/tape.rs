//! Compiled program: an instruction tape plus its label table.

use std::fmt::Write as _;

use rustc_hash::FxHashMap;

use stepvm_core::CompilationError;

use super::{Instruction, Label};

/// An instruction together with the loop labels in force where it was emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct TapeEntry {
    pub instruction: Instruction,
    /// End label of the innermost enclosing loop.
    pub enclosing_end: Option<Label>,
    /// Next-iteration label of the innermost enclosing loop.
    pub enclosing_next: Option<Label>,
}

impl TapeEntry {
    pub fn new(instruction: Instruction) -> Self {
        Self {
            instruction,
            enclosing_end: None,
            enclosing_next: None,
        }
    }
}

/// Maps label names to tape addresses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelTable {
    addresses: FxHashMap<Label, usize>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a label. Returns `false` if it was already defined.
    pub fn define(&mut self, label: Label, address: usize) -> bool {
        if self.addresses.contains_key(&label) {
            return false;
        }
        self.addresses.insert(label, address);
        true
    }

    pub fn address(&self, label: &Label) -> Option<usize> {
        self.addresses.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Label, usize)> {
        self.addresses.iter().map(|(label, address)| (label, *address))
    }
}

/// A compiled program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tape {
    entries: Vec<TapeEntry>,
    labels: LabelTable,
}

impl Tape {
    /// Assemble a tape, checking that every jump target is defined.
    pub fn new(entries: Vec<TapeEntry>, labels: LabelTable) -> Result<Self, CompilationError> {
        for entry in &entries {
            if let Some(target) = entry.instruction.jump_target() {
                if labels.address(target).is_none() {
                    return Err(CompilationError::UndefinedLabel {
                        label: target.to_string(),
                    });
                }
            }
        }
        Ok(Self { entries, labels })
    }

    #[inline]
    pub fn get(&self, pc: usize) -> Option<&TapeEntry> {
        self.entries.get(pc)
    }

    pub fn entries(&self) -> &[TapeEntry] {
        &self.entries
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.entries.iter().map(|entry| &entry.instruction)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn address_of(&self, label: &Label) -> Option<usize> {
        self.labels.address(label)
    }

    /// Number of statement boundaries on the tape.
    pub fn yield_count(&self) -> usize {
        self.instructions()
            .filter(|instr| matches!(instr, Instruction::Yield))
            .count()
    }

    /// Human-readable listing, one instruction per line.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for (pc, entry) in self.entries.iter().enumerate() {
            let _ = writeln!(out, "{pc:04}  {}", entry.instruction);
        }
        out
    }
}
