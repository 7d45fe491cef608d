//! Instruction field layout and the control-signal decode table

// Field layout of a 32-bit instruction word, MSB to LSB
const OPCODE_MASK: u64 = 0xFC00_0000;
const OPCODE_SHIFT: u64 = 26;
const RS_MASK: u64 = 0x03E0_0000;
const RS_SHIFT: u64 = 21;
const RT_MASK: u64 = 0x001F_0000;
const RT_SHIFT: u64 = 16;
const RD_MASK: u64 = 0x0000_F800;
const RD_SHIFT: u64 = 11;
const SHAMT_MASK: u64 = 0x0000_07C0;
const SHAMT_SHIFT: u64 = 6;
const FUNCT_MASK: u64 = 0x0000_003F;
const IMMEDIATE_MASK: u64 = 0x0000_FFFF;
const ADDRESS_MASK: u64 = 0x03FF_FFFF;

// Opcodes
pub const OP_ARITH: u64 = 0x00;
pub const OP_J: u64 = 0x02;
pub const OP_BEQ: u64 = 0x04;
pub const OP_BNE: u64 = 0x05;
pub const OP_ADDI: u64 = 0x08;
pub const OP_SLTI: u64 = 0x0A;
pub const OP_ANDI: u64 = 0x0C;
pub const OP_ORI: u64 = 0x0D;
pub const OP_LW: u64 = 0x23;
pub const OP_SW: u64 = 0x2B;
pub const OP_HALT: u64 = 0x3F;

// Funct codes for OP_ARITH
pub const FUNCT_JR: u64 = 0x08;
pub const FUNCT_ADD: u64 = 0x20;
pub const FUNCT_SUB: u64 = 0x22;
pub const FUNCT_AND: u64 = 0x24;
pub const FUNCT_OR: u64 = 0x25;
pub const FUNCT_NOR: u64 = 0x27;
pub const FUNCT_SLT: u64 = 0x2A;

/// Raw encoding of halt: opcode 0x3F with every other field zero
pub const HALT_WORD: u64 = 0xFC00_0000;

/// Out-of-band opcode marker for a pipeline slot carrying no instruction
pub const BUBBLE_OPCODE: u64 = 0xFF;

/// All fields of an instruction word, extracted unconditionally.
/// `immediate` and `address` alias the low bits for I- and J-type forms.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InstructionFields {
    pub opcode: u64,
    pub rs: u64,
    pub rt: u64,
    pub rd: u64,
    pub shamt: u64,
    pub funct: u64,
    pub immediate: u64,
    pub address: u64,
}

impl InstructionFields {
    pub fn extract(word: u64) -> Self {
        Self {
            opcode: (word & OPCODE_MASK) >> OPCODE_SHIFT,
            rs: (word & RS_MASK) >> RS_SHIFT,
            rt: (word & RT_MASK) >> RT_SHIFT,
            rd: (word & RD_MASK) >> RD_SHIFT,
            shamt: (word & SHAMT_MASK) >> SHAMT_SHIFT,
            funct: word & FUNCT_MASK,
            immediate: word & IMMEDIATE_MASK,
            address: word & ADDRESS_MASK,
        }
    }
}

/// One row of the control table. Signals are latch words, 0 or 1, so they
/// can be staged into a pipeline latch unchanged; `alu_op` carries the ALU
/// operation code 0-5.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Controls {
    pub reg_dst: u64,
    pub alu_src: u64,
    pub mem_to_reg: u64,
    pub reg_write: u64,
    pub mem_read: u64,
    pub mem_write: u64,
    pub branch: u64,
    pub branch_ne: u64,
    pub jump: u64,
    pub jump_src: u64,
    pub alu_op: u64,
    pub halt: u64,
}

impl Controls {
    /// Derives the control signals for one opcode/funct pair. Unknown
    /// opcodes decode as an all-zero row, i.e. a no-op.
    pub fn decode(opcode: u64, funct: u64) -> Self {
        let mut controls = Self::default();

        match opcode {
            OP_ARITH => match funct {
                FUNCT_JR => {
                    controls.jump = 1;
                    controls.jump_src = 1;
                }
                _ => {
                    controls.reg_dst = 1;
                    controls.reg_write = 1;
                    controls.alu_op = match funct {
                        FUNCT_SUB => 1,
                        FUNCT_AND => 2,
                        FUNCT_OR => 3,
                        FUNCT_NOR => 4,
                        FUNCT_SLT => 5,
                        // FUNCT_ADD and any undecoded funct
                        _ => 0,
                    };
                }
            },
            OP_ADDI => {
                controls.alu_src = 1;
                controls.reg_write = 1;
            }
            OP_ANDI => {
                controls.alu_src = 1;
                controls.reg_write = 1;
                controls.alu_op = 2;
            }
            OP_ORI => {
                controls.alu_src = 1;
                controls.reg_write = 1;
                controls.alu_op = 3;
            }
            OP_SLTI => {
                controls.alu_src = 1;
                controls.reg_write = 1;
                controls.alu_op = 5;
            }
            OP_BEQ => {
                controls.branch = 1;
                // Subtract for the equality test
                controls.alu_op = 1;
            }
            OP_BNE => {
                controls.branch = 1;
                controls.branch_ne = 1;
                controls.alu_op = 1;
            }
            OP_J => {
                controls.jump = 1;
            }
            OP_LW => {
                controls.alu_src = 1;
                controls.mem_to_reg = 1;
                controls.reg_write = 1;
                controls.mem_read = 1;
            }
            OP_SW => {
                controls.alu_src = 1;
                controls.mem_write = 1;
            }
            OP_HALT => {
                controls.halt = 1;
            }
            _ => {}
        }

        controls
    }
}
