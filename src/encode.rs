//! Instruction encoders and memory-image assembly
//!
//! Used by the evaluation binaries and the end-to-end tests to synthesize
//! flat binary workloads without external fixtures.

use crate::cpu::PC_BASE;
use crate::pipeline::control::*;

/// Raw halt word
pub const HALT: u32 = HALT_WORD as u32;

fn r_type(funct: u64, rd: u32, rs: u32, rt: u32) -> u32 {
    (rs << 21) | (rt << 16) | (rd << 11) | funct as u32
}

fn i_type(opcode: u64, rt: u32, rs: u32, immediate: u16) -> u32 {
    ((opcode as u32) << 26) | (rs << 21) | (rt << 16) | immediate as u32
}

pub fn add(rd: u32, rs: u32, rt: u32) -> u32 {
    r_type(FUNCT_ADD, rd, rs, rt)
}

pub fn sub(rd: u32, rs: u32, rt: u32) -> u32 {
    r_type(FUNCT_SUB, rd, rs, rt)
}

pub fn and(rd: u32, rs: u32, rt: u32) -> u32 {
    r_type(FUNCT_AND, rd, rs, rt)
}

pub fn or(rd: u32, rs: u32, rt: u32) -> u32 {
    r_type(FUNCT_OR, rd, rs, rt)
}

pub fn nor(rd: u32, rs: u32, rt: u32) -> u32 {
    r_type(FUNCT_NOR, rd, rs, rt)
}

pub fn slt(rd: u32, rs: u32, rt: u32) -> u32 {
    r_type(FUNCT_SLT, rd, rs, rt)
}

pub fn jr(rs: u32) -> u32 {
    r_type(FUNCT_JR, 0, rs, 0)
}

/// Encodes as an R-type add with all fields zero; retires with no effect
pub fn nop() -> u32 {
    0
}

pub fn addi(rt: u32, rs: u32, immediate: u16) -> u32 {
    i_type(OP_ADDI, rt, rs, immediate)
}

pub fn andi(rt: u32, rs: u32, immediate: u16) -> u32 {
    i_type(OP_ANDI, rt, rs, immediate)
}

pub fn ori(rt: u32, rs: u32, immediate: u16) -> u32 {
    i_type(OP_ORI, rt, rs, immediate)
}

pub fn slti(rt: u32, rs: u32, immediate: u16) -> u32 {
    i_type(OP_SLTI, rt, rs, immediate)
}

/// Branch if equal; the offset is in words past the fall-through slot
/// (target = branch pc + 4 + 4 * offset)
pub fn beq(rs: u32, rt: u32, offset: u16) -> u32 {
    i_type(OP_BEQ, rt, rs, offset)
}

pub fn bne(rs: u32, rt: u32, offset: u16) -> u32 {
    i_type(OP_BNE, rt, rs, offset)
}

pub fn lw(rt: u32, offset: u16, base: u32) -> u32 {
    i_type(OP_LW, rt, base, offset)
}

pub fn sw(rt: u32, offset: u16, base: u32) -> u32 {
    i_type(OP_SW, rt, base, offset)
}

/// Jump to the given word address (the PC becomes `target * 4`)
pub fn j(target: u32) -> u32 {
    ((OP_J as u32) << 26) | (target & 0x03FF_FFFF)
}

/// Lays out a flat memory image: data words from byte 0, text at the
/// program-counter base. The data section must fit below the text base.
pub fn assemble_image(data: &[u32], text: &[u32]) -> Vec<u8> {
    assert!(data.len() * 4 <= PC_BASE as usize, "data section overlaps text");

    let mut image = vec![0u8; PC_BASE as usize];
    for (i, word) in data.iter().enumerate() {
        image[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
    }
    for word in text {
        image.extend_from_slice(&word.to_le_bytes());
    }
    image
}
