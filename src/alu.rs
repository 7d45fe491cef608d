//! ALU implementation

/// Set of ALU operations needed by the control table
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum AluOp {
    #[default]
    Add,
    Sub,
    And,
    Or,
    Nor,
    Slt,
}

impl AluOp {
    /// Decodes the operation from a latch word. The control table only ever
    /// stages 0-5; anything else behaves as add, like an undecoded funct.
    pub fn from_word(word: u64) -> Self {
        match word {
            1 => AluOp::Sub,
            2 => AluOp::And,
            3 => AluOp::Or,
            4 => AluOp::Nor,
            5 => AluOp::Slt,
            _ => AluOp::Add,
        }
    }
}

/// Performs an atomic ALU operation on the headroom word representation.
/// Comparisons are unsigned, consistent with words never being negative.
pub fn alu(op: AluOp, op1: u64, op2: u64) -> u64 {
    match op {
        AluOp::Add => op1.wrapping_add(op2),
        AluOp::Sub => op1.wrapping_sub(op2),
        AluOp::And => op1 & op2,
        AluOp::Or => op1 | op2,
        AluOp::Nor => !(op1 | op2) & 0xFFFF_FFFF,
        AluOp::Slt => (op1 < op2) as u64,
    }
}
