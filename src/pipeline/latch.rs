//! Inter-stage pipeline latches

use crate::cpu::AdvanceGate;
use crate::cpu::Register;

use super::control::BUBBLE_OPCODE;

/// The data and control bus between two adjacent pipeline stages.
///
/// Every named signal is its own double-buffered [`Register`]: the producer
/// stage writes the pending side, the consumer reads the committed side, and
/// the clock edge moves one into the other. Fields never staged read 0,
/// except `opcode` which starts at the bubble sentinel so an empty pipeline
/// decodes as no-ops.
#[derive(Clone, Copy, Debug)]
pub struct PipelineLatch {
    /// Raw instruction word
    pub instruction: Register,
    /// PC snapshot taken at fetch, used for branch target math
    pub pc: Register,
    /// Decoded opcode field, or [`BUBBLE_OPCODE`] for an empty slot
    pub opcode: Register,

    // Decoded instruction fields
    pub rs: Register,
    pub rt: Register,
    pub rd: Register,
    pub shamt: Register,
    pub immediate: Register,
    pub address: Register,

    /// Register file value read for rs
    pub read_data1: Register,
    /// Register file value read for rt
    pub read_data2: Register,

    // Values computed downstream of decode
    pub alu_result: Register,
    pub mem_result: Register,
    pub write_data: Register,

    // Control signals, all derived by the decode table
    pub reg_dst: Register,
    pub alu_src: Register,
    pub mem_to_reg: Register,
    pub reg_write: Register,
    pub mem_read: Register,
    pub mem_write: Register,
    pub branch: Register,
    pub branch_ne: Register,
    pub jump: Register,
    pub jump_src: Register,
    pub alu_op: Register,
    pub halt: Register,

    gate: AdvanceGate,
}

impl Default for PipelineLatch {
    fn default() -> Self {
        Self {
            instruction: Register::default(),
            pc: Register::default(),
            opcode: Register::new(BUBBLE_OPCODE),
            rs: Register::default(),
            rt: Register::default(),
            rd: Register::default(),
            shamt: Register::default(),
            immediate: Register::default(),
            address: Register::default(),
            read_data1: Register::default(),
            read_data2: Register::default(),
            alu_result: Register::default(),
            mem_result: Register::default(),
            write_data: Register::default(),
            reg_dst: Register::default(),
            alu_src: Register::default(),
            mem_to_reg: Register::default(),
            reg_write: Register::default(),
            mem_read: Register::default(),
            mem_write: Register::default(),
            branch: Register::default(),
            branch_ne: Register::default(),
            jump: Register::default(),
            jump_src: Register::default(),
            alu_op: Register::default(),
            halt: Register::default(),
            gate: AdvanceGate::default(),
        }
    }
}

macro_rules! for_each_field {
    ($macro:ident) => {
        $macro!(
            instruction, pc, opcode, rs, rt, rd, shamt, immediate, address,
            read_data1, read_data2, alu_result, mem_result, write_data,
            reg_dst, alu_src, mem_to_reg, reg_write, mem_read, mem_write,
            branch, branch_ne, jump, jump_src, alu_op, halt
        );
    };
}

impl PipelineLatch {
    /// Stages every committed field of this latch into the next one: the
    /// "carry the instruction forward" step. The producer stage overwrites
    /// the fields it computes afterwards; last write wins on the pending
    /// side.
    pub fn forward_to(&self, next: &mut PipelineLatch) {
        macro_rules! forward {
            ($($field:ident),* $(,)?) => {
                $(next.$field.write(self.$field.read());)*
            };
        }
        for_each_field!(forward);
    }

    /// Stages an all-zero bubble: every control signal cleared and the
    /// opcode marker set to the sentinel. Data fields are left as staged;
    /// with zeroed controls they have no architectural effect.
    pub fn bubble(&mut self) {
        macro_rules! clear {
            ($($field:ident),* $(,)?) => {
                $(self.$field.write(0);)*
            };
        }
        clear!(
            reg_dst, alu_src, mem_to_reg, reg_write, mem_read, mem_write,
            branch, branch_ne, jump, jump_src, alu_op
        );
        self.opcode.write(BUBBLE_OPCODE);
    }

    /// Freezes the whole latch for one clock edge. Single-shot.
    pub fn hold_next_advance(&mut self) {
        self.gate = AdvanceGate::HoldOnce;
    }

    /// The clock edge for every field of the latch.
    pub fn advance(&mut self) {
        match self.gate {
            AdvanceGate::HoldOnce => self.gate = AdvanceGate::Open,
            AdvanceGate::Open => {
                macro_rules! tick {
                    ($($field:ident),* $(,)?) => {
                        $(self.$field.advance();)*
                    };
                }
                for_each_field!(tick);
            }
        }
    }
}
