//! A simulator wrapper

use std::fmt;
use std::path::Path;

use crate::cpu::CPUPolicy;
use crate::cpu::CPUState;
use crate::cpu::NUM_REGISTERS;
use crate::error::SimulatorResult;
use crate::loader;
use crate::memory::MemoryStore;
use crate::pipeline;

/// Final statistics and architectural state of a completed run
#[derive(Clone, Copy, Debug)]
pub struct RunReport {
    pub instruction_count: u64,
    pub cycle_count: u64,
    pub registers: [u64; NUM_REGISTERS],
}

impl RunReport {
    /// Cycles per retired instruction
    pub fn cpi(&self) -> f64 {
        self.cycle_count as f64 / self.instruction_count as f64
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Instruction count: \t{}", self.instruction_count)?;
        writeln!(f, "Cycle count: \t\t{}", self.cycle_count)?;
        writeln!(f, "CPI: \t\t\t{:.3}", self.cpi())?;
        for (id, value) in self.registers.iter().enumerate() {
            writeln!(f, "$r{}\t{:x}", id, value)?;
        }
        Ok(())
    }
}

/// Run simulation on the given flat binary image file
pub fn run_file<P: AsRef<Path>>(
    path: P,
    policy: CPUPolicy,
) -> SimulatorResult<RunReport> {
    let mut mem = loader::load_image(path)?;
    run_image(&mut mem, policy)
}

/// Run simulation on an already-loaded memory image
pub fn run_image(
    mem: &mut MemoryStore,
    policy: CPUPolicy,
) -> SimulatorResult<RunReport> {
    let mut cpu = CPUState::make(policy);
    pipeline::run(&mut cpu, mem)?;

    let mut registers = [0u64; NUM_REGISTERS];
    for (id, slot) in registers.iter_mut().enumerate() {
        *slot = cpu.gpr.read(id as u64)?;
    }

    Ok(RunReport {
        instruction_count: cpu.history.inst_count,
        cycle_count: cpu.history.cycle_count,
        registers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode;

    #[test]
    fn test_report_of_simple_program() {
        let image = encode::assemble_image(
            &[],
            &[encode::addi(1, 0, 5), encode::addi(2, 0, 7), encode::HALT],
        );
        let mut mem = MemoryStore::from_bytes(&image);
        let report = run_image(&mut mem, CPUPolicy::default()).unwrap();

        assert_eq!(report.instruction_count, 2);
        assert_eq!(report.cycle_count, 6);
        assert!((report.cpi() - 3.0).abs() < f64::EPSILON);
        assert_eq!(report.registers[1], 5);
        assert_eq!(report.registers[2], 7);
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let result = run_file("no/such/image.bin", CPUPolicy::default());
        assert!(matches!(
            result,
            Err(crate::error::SimulatorError::ImageLoad(_, _))
        ));
    }
}
