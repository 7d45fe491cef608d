//! The five pipeline stage functions
//!
//! Each stage reads the committed side of its upstream latch and stages the
//! pending side of its downstream latch; double buffering keeps the stages
//! order-independent within a cycle, with two deliberate exceptions. The
//! writeback stage commits its register-file write immediately so decode
//! (which runs later in the same cycle) observes it, and decode stages
//! flushes into IF/ID after fetch so its bubble marker wins the cycle.

use crate::alu;
use crate::alu::AluOp;
use crate::cpu::CPUState;
use crate::error::SimulatorError;
use crate::error::SimulatorResult;
use crate::memory::MemoryStore;

use super::control::Controls;
use super::control::InstructionFields;
use super::control::BUBBLE_OPCODE;
use super::control::HALT_WORD;
use super::latch::PipelineLatch;

/// IF stage: reads the word at the PC into IF/ID and advances the PC by one
/// word, unless the fetched word is the halt encoding, in which case the PC
/// freezes on it while the rest of the pipeline drains.
pub fn fetch(
    cpu: &mut CPUState,
    mem: &MemoryStore,
    if_id: &mut PipelineLatch,
) -> SimulatorResult<()> {
    let pc = cpu.pc.read();
    let instruction = mem.read(pc)?;

    if cpu.policy.verbose {
        eprintln!("[VERBOSE] PC: {:#010x}; Instruction: {:#010x}", pc, instruction);
    }

    if_id.instruction.write(instruction);
    // Mark the slot as holding a real fetch; a flush overrides this later
    // in the same cycle
    if_id.opcode.write(0);
    if_id.pc.write(pc);

    if instruction != HALT_WORD {
        cpu.pc.increment();
    }

    Ok(())
}

/// ID stage: extracts all instruction fields, derives the control signals,
/// reads the register file, and resolves stalls, branches and jumps.
pub fn decode(
    cpu: &mut CPUState,
    if_id: &mut PipelineLatch,
    id_ex: &mut PipelineLatch,
) -> SimulatorResult<()> {
    let instruction = if_id.instruction.read();
    let fields = InstructionFields::extract(instruction);

    id_ex.rs.write(fields.rs);
    id_ex.rt.write(fields.rt);
    id_ex.rd.write(fields.rd);
    id_ex.shamt.write(fields.shamt);
    id_ex.immediate.write(fields.immediate);
    id_ex.address.write(fields.address);
    id_ex.opcode.write(fields.opcode);

    // A flushed or empty IF/ID slot decodes as an all-zero control row no
    // matter what its stale instruction bits say
    let controls = if if_id.opcode.read() == BUBBLE_OPCODE {
        Controls::default()
    } else {
        Controls::decode(fields.opcode, fields.funct)
    };
    stage_controls(id_ex, &controls);

    let read_data1 = cpu.gpr.read(fields.rs)?;
    let read_data2 = cpu.gpr.read(fields.rt)?;
    id_ex.read_data1.write(read_data1);
    id_ex.read_data2.write(read_data2);

    // Load-use hazard: the load currently in ID/EX has not reached memory
    // yet, so its value cannot be forwarded; stall one cycle
    if id_ex.mem_read.read() == 1
        && (id_ex.rt.read() == fields.rs || id_ex.rt.read() == fields.rt)
    {
        if cpu.policy.verbose {
            eprintln!("[VERBOSE] Load-use hazard; stalling one cycle");
        }
        id_ex.bubble();
        if_id.hold_next_advance();
        cpu.pc.hold_next_advance();
    } else if controls.branch == 1
        && ((controls.branch_ne == 1 && read_data1 != read_data2)
            || (controls.branch_ne == 0 && read_data1 == read_data2))
    {
        // Taken branch, resolved on plain register-file reads. The compared
        // values carry a one-instruction forwarding gap on purpose.
        let target = if_id.pc.read() + 4 + 4 * fields.immediate;
        if cpu.policy.verbose {
            eprintln!("[VERBOSE] Branch taken to {:#010x}", target);
        }
        if_id.bubble();
        cpu.pc.write(target);
        cpu.pc.release();
    } else if controls.jump == 1 {
        let mut target = fields.address;

        if controls.jump_src == 1 {
            target = read_data1;
            if target % 4 != 0 {
                return Err(SimulatorError::MisalignedJumpTarget(target));
            }
            target /= 4;
        }

        if cpu.policy.verbose {
            eprintln!("[VERBOSE] Jump to {:#010x}", target * 4);
        }
        if_id.bubble();
        cpu.pc.write(target * 4);
        cpu.pc.release();
    }

    Ok(())
}

fn stage_controls(id_ex: &mut PipelineLatch, controls: &Controls) {
    id_ex.reg_dst.write(controls.reg_dst);
    id_ex.alu_src.write(controls.alu_src);
    id_ex.mem_to_reg.write(controls.mem_to_reg);
    id_ex.reg_write.write(controls.reg_write);
    id_ex.mem_read.write(controls.mem_read);
    id_ex.mem_write.write(controls.mem_write);
    id_ex.branch.write(controls.branch);
    id_ex.branch_ne.write(controls.branch_ne);
    id_ex.jump.write(controls.jump);
    id_ex.jump_src.write(controls.jump_src);
    id_ex.alu_op.write(controls.alu_op);
    id_ex.halt.write(controls.halt);
}

/// Writeback destination of the instruction held in a latch
fn destination(latch: &PipelineLatch) -> u64 {
    if latch.reg_dst.read() == 1 {
        latch.rd.read()
    } else {
        latch.rt.read()
    }
}

/// Result the instruction in MEM/WB is about to write back
fn wb_value(mem_wb: &PipelineLatch) -> u64 {
    if mem_wb.mem_to_reg.read() == 1 {
        mem_wb.mem_result.read()
    } else {
        mem_wb.alu_result.read()
    }
}

/// Resolves one ALU operand: EX/MEM forwarding first (one instruction
/// ahead), then MEM/WB (two ahead), then the value read at decode.
fn forward_operand(
    source: u64,
    fallback: u64,
    ex_mem: &PipelineLatch,
    mem_wb: &PipelineLatch,
) -> u64 {
    if ex_mem.reg_write.read() == 1
        && destination(ex_mem) != 0
        && destination(ex_mem) == source
    {
        // EX/MEM has not done its memory access yet; its result is the ALU's
        ex_mem.alu_result.read()
    } else if mem_wb.reg_write.read() == 1
        && destination(mem_wb) != 0
        && destination(mem_wb) == source
    {
        wb_value(mem_wb)
    } else {
        fallback
    }
}

/// EX stage: forwards operands, carries the instruction into EX/MEM and
/// computes the ALU result.
pub fn execute(
    id_ex: &PipelineLatch,
    ex_mem: &mut PipelineLatch,
    mem_wb: &PipelineLatch,
) {
    let op1 = forward_operand(
        id_ex.rs.read(),
        id_ex.read_data1.read(),
        ex_mem,
        mem_wb,
    );
    let write_data = forward_operand(
        id_ex.rt.read(),
        id_ex.read_data2.read(),
        ex_mem,
        mem_wb,
    );

    let op2 = if id_ex.alu_src.read() == 0 {
        write_data
    } else {
        id_ex.immediate.read()
    };

    id_ex.forward_to(ex_mem);

    let result = alu::alu(AluOp::from_word(id_ex.alu_op.read()), op1, op2);
    ex_mem.alu_result.write(result);
    ex_mem.write_data.write(write_data);
}

/// MEM stage: performs the load or store at the ALU-result address and
/// carries everything else into MEM/WB.
pub fn memory_access(
    mem: &mut MemoryStore,
    ex_mem: &PipelineLatch,
    mem_wb: &mut PipelineLatch,
) -> SimulatorResult<()> {
    ex_mem.forward_to(mem_wb);

    if ex_mem.mem_read.read() == 1 {
        let value = mem.read(ex_mem.alu_result.read())?;
        mem_wb.mem_result.write(value);
    }

    if ex_mem.mem_write.read() == 1 {
        mem.write(ex_mem.alu_result.read(), ex_mem.write_data.read())?;
    }

    Ok(())
}

/// WB stage: commits the register write immediately (not at the clock edge)
/// so a register written this cycle is visible to decode's read later in
/// the same cycle. Writes to register 0 are dropped here.
pub fn write_back(
    cpu: &mut CPUState,
    mem_wb: &PipelineLatch,
) -> SimulatorResult<()> {
    if mem_wb.reg_write.read() == 1 {
        let dest = destination(mem_wb);
        if dest != 0 {
            cpu.gpr.write(dest, wb_value(mem_wb))?;
            cpu.gpr.advance();
        }
    }
    Ok(())
}

/// True once the halt signal reaches MEM/WB
pub fn halted(mem_wb: &PipelineLatch) -> bool {
    mem_wb.halt.read() == 1
}

/// True iff the slot retiring from MEM/WB carries no architectural effect:
/// all eleven control signals read zero. Halt is excluded, so the halt
/// instruction itself is not counted as a retired instruction either.
pub fn is_bubble(mem_wb: &PipelineLatch) -> bool {
    mem_wb.reg_dst.read() == 0
        && mem_wb.alu_src.read() == 0
        && mem_wb.mem_to_reg.read() == 0
        && mem_wb.reg_write.read() == 0
        && mem_wb.mem_read.read() == 0
        && mem_wb.mem_write.read() == 0
        && mem_wb.branch.read() == 0
        && mem_wb.branch_ne.read() == 0
        && mem_wb.jump.read() == 0
        && mem_wb.jump_src.read() == 0
        && mem_wb.alu_op.read() == 0
}
