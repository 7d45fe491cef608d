//! Pipelined execution engine

use crate::cpu::CPUState;
use crate::error::SimulatorResult;
use crate::memory::MemoryStore;

pub mod control;
pub mod latch;
pub mod stages;

use latch::PipelineLatch;

/// The four latches between the five stages
#[derive(Clone, Copy, Debug, Default)]
pub struct Pipeline {
    pub if_id: PipelineLatch,
    pub id_ex: PipelineLatch,
    pub ex_mem: PipelineLatch,
    pub mem_wb: PipelineLatch,
}

impl Pipeline {
    /// The clock edge: commits every staged latch value simultaneously
    pub fn advance(&mut self) {
        self.if_id.advance();
        self.id_ex.advance();
        self.ex_mem.advance();
        self.mem_wb.advance();
    }
}

/// Runs the cycle loop until the halt signal retires from MEM/WB.
///
/// Phase 1 runs the stages combinationally; writeback deliberately runs
/// before decode so its immediate register-file commit is readable in the
/// same cycle. Phase 2 advances the PC and all four latches atomically.
pub fn run(cpu: &mut CPUState, mem: &mut MemoryStore) -> SimulatorResult<()> {
    let mut pipeline = Pipeline::default();

    while !stages::halted(&pipeline.mem_wb) {
        if cpu.policy.verbose {
            eprintln!("[VERBOSE] New cycle; PC: {:#010x}", cpu.pc.read());
        }

        let Pipeline { if_id, id_ex, ex_mem, mem_wb } = &mut pipeline;

        stages::fetch(cpu, mem, if_id)?;
        stages::write_back(cpu, mem_wb)?;
        stages::decode(cpu, if_id, id_ex)?;
        stages::execute(id_ex, ex_mem, mem_wb);
        stages::memory_access(mem, ex_mem, mem_wb)?;

        // Stall- and flush-injected bubbles consume a cycle but do not
        // retire as instructions
        if !stages::is_bubble(mem_wb) {
            cpu.update_inst_count(1);
        }
        cpu.update_cycle_count(1);

        cpu.pc.advance();
        pipeline.advance();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CPUPolicy;
    use crate::cpu::PC_BASE;
    use crate::encode;
    use crate::error::SimulatorError;

    // Pipeline fill plus drain: 4 extra cycles on top of one per retired
    // instruction or bubble
    const OVERHEAD_CYCLES: u64 = 4;

    fn run_program(
        data: &[u32],
        text: &[u32],
    ) -> SimulatorResult<(CPUState, MemoryStore)> {
        let image = encode::assemble_image(data, text);
        let mut mem = MemoryStore::from_bytes(&image);
        let mut cpu = CPUState::make(CPUPolicy::default());
        run(&mut cpu, &mut mem)?;
        Ok((cpu, mem))
    }

    fn reg(cpu: &CPUState, id: u64) -> u64 {
        cpu.gpr.read(id).unwrap()
    }

    #[test]
    fn test_two_addi_then_halt() {
        let (cpu, _) = run_program(
            &[],
            &[
                encode::addi(1, 0, 5),
                encode::addi(2, 0, 7),
                encode::HALT,
            ],
        )
        .unwrap();

        assert_eq!(reg(&cpu, 1), 5);
        assert_eq!(reg(&cpu, 2), 7);
        assert_eq!(reg(&cpu, 0), 0);
        assert_eq!(cpu.history.inst_count, 2);
        assert_eq!(cpu.history.cycle_count, 2 + OVERHEAD_CYCLES);
    }

    #[test]
    fn test_halt_only_program_retires_nothing() {
        let (cpu, _) = run_program(&[], &[encode::HALT]).unwrap();
        assert_eq!(cpu.history.inst_count, 0);
        assert_eq!(cpu.history.cycle_count, OVERHEAD_CYCLES);
        for id in 0..32 {
            assert_eq!(reg(&cpu, id), 0);
        }
    }

    #[test]
    fn test_load_use_stall_inserts_one_bubble() {
        let (cpu, _) = run_program(
            &[10],
            &[
                encode::lw(1, 0, 0),
                encode::add(2, 1, 1),
                encode::HALT,
            ],
        )
        .unwrap();

        // The dependent add sees the loaded value, not a stale zero
        assert_eq!(reg(&cpu, 1), 10);
        assert_eq!(reg(&cpu, 2), 20);
        assert_eq!(cpu.history.inst_count, 2);
        // Exactly one stall bubble between the load and the add
        assert_eq!(cpu.history.cycle_count, 2 + 1 + OVERHEAD_CYCLES);
    }

    #[test]
    fn test_forwarding_at_distance_one_and_two() {
        let (cpu, _) = run_program(
            &[],
            &[
                encode::addi(1, 0, 5),
                // r1 from EX/MEM, one cycle behind
                encode::add(2, 1, 1),
                // r2 from EX/MEM, r1 from MEM/WB
                encode::add(3, 2, 1),
                encode::HALT,
            ],
        )
        .unwrap();

        assert_eq!(reg(&cpu, 2), 10);
        assert_eq!(reg(&cpu, 3), 15);
        assert_eq!(cpu.history.inst_count, 3);
        // No stall bubbles
        assert_eq!(cpu.history.cycle_count, 3 + OVERHEAD_CYCLES);
    }

    #[test]
    fn test_writes_to_register_zero_are_dropped() {
        let (cpu, _) = run_program(
            &[],
            &[encode::addi(0, 0, 7), encode::HALT],
        )
        .unwrap();
        assert_eq!(reg(&cpu, 0), 0);
    }

    #[test]
    fn test_taken_branch_flushes_one_slot() {
        let (cpu, _) = run_program(
            &[],
            &[
                encode::addi(1, 0, 1),
                // Skip the next instruction: target = pc + 4 + 4*1
                encode::beq(0, 0, 1),
                encode::addi(2, 0, 99),
                encode::addi(3, 0, 3),
                encode::HALT,
            ],
        )
        .unwrap();

        // The slot fetched during the branch's decode never retires
        assert_eq!(reg(&cpu, 2), 0);
        assert_eq!(reg(&cpu, 3), 3);
        assert_eq!(cpu.history.inst_count, 3);
        // One flush bubble
        assert_eq!(cpu.history.cycle_count, 3 + 1 + OVERHEAD_CYCLES);
    }

    #[test]
    fn test_branch_not_taken_falls_through() {
        let (cpu, _) = run_program(
            &[],
            &[
                encode::addi(1, 0, 1),
                encode::nop(),
                encode::nop(),
                // r1 == 1, r0 == 0: beq not taken
                encode::beq(1, 0, 1),
                encode::addi(2, 0, 42),
                encode::HALT,
            ],
        )
        .unwrap();

        assert_eq!(reg(&cpu, 2), 42);
    }

    #[test]
    fn test_bne_taken_on_unequal_values() {
        // The compared register is written three instructions ahead of the
        // branch: writeback commits it the same cycle decode reads it
        let (cpu, _) = run_program(
            &[],
            &[
                encode::addi(1, 0, 1),
                encode::nop(),
                encode::nop(),
                encode::bne(1, 0, 1),
                encode::addi(2, 0, 99),
                encode::addi(3, 0, 3),
                encode::HALT,
            ],
        )
        .unwrap();

        assert_eq!(reg(&cpu, 2), 0);
        assert_eq!(reg(&cpu, 3), 3);
    }

    #[test]
    fn test_branch_comparison_is_not_forwarded() {
        // r1 is produced directly before the beq, so decode still reads the
        // stale zero: the branch compares 0 == 0 and is taken even though
        // the forwarded value would differ
        let (cpu, _) = run_program(
            &[],
            &[
                encode::addi(1, 0, 1),
                encode::beq(1, 0, 1),
                encode::addi(2, 0, 99),
                encode::addi(3, 0, 3),
                encode::HALT,
            ],
        )
        .unwrap();

        assert_eq!(reg(&cpu, 2), 0);
        assert_eq!(reg(&cpu, 3), 3);
    }

    #[test]
    fn test_absolute_jump() {
        // Word 0x404 is byte address 0x1010: the fifth text slot
        let (cpu, _) = run_program(
            &[],
            &[
                encode::j(0x404),
                encode::addi(2, 0, 99),
                encode::addi(3, 0, 99),
                encode::nop(),
                encode::addi(4, 0, 7),
                encode::HALT,
            ],
        )
        .unwrap();

        assert_eq!(reg(&cpu, 4), 7);
        // Flushed and never-fetched slots have no effect
        assert_eq!(reg(&cpu, 2), 0);
        assert_eq!(reg(&cpu, 3), 0);
    }

    #[test]
    fn test_register_jump() {
        let (cpu, _) = run_program(
            &[],
            &[
                encode::addi(1, 0, (PC_BASE as u16) + 0x14),
                encode::nop(),
                encode::nop(),
                encode::jr(1),
                encode::addi(2, 0, 99),
                encode::addi(3, 0, 3),
                encode::HALT,
            ],
        )
        .unwrap();

        assert_eq!(reg(&cpu, 2), 0);
        assert_eq!(reg(&cpu, 3), 3);
    }

    #[test]
    fn test_misaligned_register_jump_is_fatal() {
        let result = run_program(
            &[],
            &[
                encode::addi(1, 0, 6),
                encode::nop(),
                encode::nop(),
                encode::jr(1),
                encode::HALT,
            ],
        );

        assert!(matches!(
            result,
            Err(SimulatorError::MisalignedJumpTarget(6))
        ));
    }

    #[test]
    fn test_store_then_load_round_trips_through_memory() {
        let (cpu, mem) = run_program(
            &[0, 0],
            &[
                encode::addi(1, 0, 42),
                // The stored value arrives via forwarding
                encode::sw(1, 4, 0),
                encode::lw(2, 4, 0),
                encode::HALT,
            ],
        )
        .unwrap();

        assert_eq!(mem.read(4).unwrap(), 42);
        assert_eq!(reg(&cpu, 2), 42);
    }

    #[test]
    fn test_immediate_ops_through_forwarding() {
        let (cpu, _) = run_program(
            &[],
            &[
                encode::addi(1, 0, 0b1100),
                encode::andi(2, 1, 0b1010),
                encode::ori(3, 1, 0b0011),
                encode::slti(4, 1, 20),
                encode::slti(5, 1, 5),
                encode::HALT,
            ],
        )
        .unwrap();

        assert_eq!(reg(&cpu, 2), 0b1000);
        assert_eq!(reg(&cpu, 3), 0b1111);
        assert_eq!(reg(&cpu, 4), 1);
        assert_eq!(reg(&cpu, 5), 0);
    }

    #[test]
    fn test_r_type_ops_end_to_end() {
        let (cpu, _) = run_program(
            &[],
            &[
                encode::addi(1, 0, 5),
                encode::addi(2, 0, 3),
                encode::sub(3, 1, 2),
                encode::slt(4, 2, 1),
                encode::nor(5, 0, 0),
                encode::and(6, 1, 2),
                encode::or(7, 1, 2),
                encode::HALT,
            ],
        )
        .unwrap();

        assert_eq!(reg(&cpu, 3), 2);
        assert_eq!(reg(&cpu, 4), 1);
        assert_eq!(reg(&cpu, 5), 0xFFFF_FFFF);
        assert_eq!(reg(&cpu, 6), 1);
        assert_eq!(reg(&cpu, 7), 7);
        assert_eq!(cpu.history.inst_count, 7);
    }

    #[test]
    fn test_out_of_bounds_load_is_fatal() {
        let result = run_program(
            &[],
            &[encode::lw(1, 0x7000, 0), encode::HALT],
        );

        assert!(matches!(
            result,
            Err(SimulatorError::AddressOutOfBounds(_))
        ));
    }
}
