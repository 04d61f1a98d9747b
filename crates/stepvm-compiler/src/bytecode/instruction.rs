//! Instruction set.
//!
//! Instructions are symbolic: variables are addressed by name and jumps by
//! [`Label`]. The interpreter resolves labels through the tape's label table.

use std::fmt;

use stepvm_core::Value;

/// Binary operators understood by `BINARY_OP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Equal,
    NotEqual,
}

impl BinaryOperator {
    /// Parse an infix operator spelling.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Rem,
            ">" => Self::Greater,
            ">=" => Self::GreaterEqual,
            "<" => Self::Less,
            "<=" => Self::LessEqual,
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            _ => return None,
        })
    }

    /// Parse a compound assignment operator (`+=` yields `Add`).
    pub fn from_compound_assignment(symbol: &str) -> Option<Self> {
        match symbol.strip_suffix('=')? {
            arith @ ("+" | "-" | "*" | "/" | "%") => Self::from_symbol(arith),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
        }
    }

    pub fn is_comparison(self) -> bool {
        !matches!(
            self,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Rem
        )
    }
}

/// Unary operators understood by `UNARY_OP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Increment,
    Decrement,
    Negate,
    Plus,
    Not,
}

impl UnaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "++" => Self::Increment,
            "--" => Self::Decrement,
            "-" => Self::Negate,
            "+" => Self::Plus,
            "!" => Self::Not,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Increment => "++",
            Self::Decrement => "--",
            Self::Negate => "-",
            Self::Plus => "+",
            Self::Not => "!",
        }
    }

    /// `++` and `--` write their result back to a variable.
    pub fn writes_back(self) -> bool {
        matches!(self, Self::Increment | Self::Decrement)
    }
}

/// A symbolic jump target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(String);

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One instruction of the tape.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Push the value bound to a name in the current frame.
    LoadVar(String),
    /// Push a literal.
    LoadConst(Value),
    /// Pop a value and bind it to a name in the current frame.
    StoreVar(String),
    /// Pop the left operand, then the right one; push the result.
    BinaryOp(BinaryOperator),
    /// Pop one operand and push the result.
    ///
    /// With a `target`, `++`/`--` also store the new value under that name;
    /// the prefix form pushes the new value and the postfix form the old one.
    UnaryOp {
        op: UnaryOperator,
        prefix: bool,
        target: Option<String>,
    },
    /// Continue at a label.
    Jump(Label),
    /// Pop a condition; continue at the label when it is false.
    JumpIfFalse(Label),
    /// Marks a jump target; does nothing when executed.
    Label(Label),
    /// End of a statement: clear the operand stack and suspend.
    Yield,
}

impl Instruction {
    /// Label referenced by a jump, if any.
    pub fn jump_target(&self) -> Option<&Label> {
        match self {
            Instruction::Jump(label) | Instruction::JumpIfFalse(label) => Some(label),
            _ => None,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::LoadVar(_) => "LOAD_VAR",
            Instruction::LoadConst(_) => "LOAD_CONST",
            Instruction::StoreVar(_) => "STORE_VAR",
            Instruction::BinaryOp(_) => "BINARY_OP",
            Instruction::UnaryOp { .. } => "UNARY_OP",
            Instruction::Jump(_) => "JUMP",
            Instruction::JumpIfFalse(_) => "JUMP_IF_FALSE",
            Instruction::Label(_) => "LABEL",
            Instruction::Yield => "YIELD",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.mnemonic();
        match self {
            Instruction::LoadVar(name) | Instruction::StoreVar(name) => {
                write!(f, "{mnemonic} {name}")
            }
            Instruction::LoadConst(value) => write!(f, "{mnemonic} {value}"),
            Instruction::BinaryOp(op) => write!(f, "{mnemonic} {}", op.symbol()),
            Instruction::UnaryOp { op, prefix, target } => {
                let form = if *prefix { "prefix" } else { "postfix" };
                write!(f, "{mnemonic} {} {form}", op.symbol())?;
                if let Some(target) = target {
                    write!(f, " -> {target}")?;
                }
                Ok(())
            }
            Instruction::Jump(label)
            | Instruction::JumpIfFalse(label)
            | Instruction::Label(label) => write!(f, "{mnemonic} {label}"),
            Instruction::Yield => f.write_str(mnemonic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_symbols_round_trip() {
        for symbol in ["+", "-", "*", "/", "%", ">", ">=", "<", "<=", "==", "!="] {
            let op = BinaryOperator::from_symbol(symbol).unwrap();
            assert_eq!(op.symbol(), symbol);
        }
        assert_eq!(BinaryOperator::from_symbol("&&"), None);
    }

    #[test]
    fn compound_assignment_operators() {
        assert_eq!(
            BinaryOperator::from_compound_assignment("+="),
            Some(BinaryOperator::Add)
        );
        assert_eq!(
            BinaryOperator::from_compound_assignment("%="),
            Some(BinaryOperator::Rem)
        );
        assert_eq!(BinaryOperator::from_compound_assignment("=="), None);
        assert_eq!(BinaryOperator::from_compound_assignment("<<="), None);
        assert_eq!(BinaryOperator::from_compound_assignment("="), None);
    }

    #[test]
    fn unary_write_back() {
        assert!(UnaryOperator::Increment.writes_back());
        assert!(!UnaryOperator::Negate.writes_back());
        assert_eq!(UnaryOperator::from_symbol("~"), None);
    }

    #[test]
    fn display_forms() {
        assert_eq!(Instruction::LoadConst(Value::Int(3)).to_string(), "LOAD_CONST 3");
        assert_eq!(
            Instruction::BinaryOp(BinaryOperator::Mul).to_string(),
            "BINARY_OP *"
        );
        assert_eq!(
            Instruction::UnaryOp {
                op: UnaryOperator::Increment,
                prefix: false,
                target: Some("i".into())
            }
            .to_string(),
            "UNARY_OP ++ postfix -> i"
        );
        assert_eq!(
            Instruction::JumpIfFalse(Label::new("else_0")).to_string(),
            "JUMP_IF_FALSE else_0"
        );
    }
}
