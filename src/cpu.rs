//! Synchronous state elements: registers, the register file and the PC

use crate::error::SimulatorError;
use crate::error::SimulatorResult;

/// Number of architectural general-purpose registers
pub const NUM_REGISTERS: usize = 32;

/// Byte address of the first instruction in the memory image
pub const PC_BASE: u64 = 0x1000;

/// Whether the next clock edge commits pending values.
/// `HoldOnce` suppresses exactly one advance and then re-opens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdvanceGate {
    #[default]
    Open,
    HoldOnce,
}

/// A double-buffered storage cell. Writes stage a pending value that
/// becomes visible only when `advance` (the clock edge) is called.
#[derive(Clone, Copy, Debug, Default)]
pub struct Register {
    value: u64,
    pending: Option<u64>,
    gate: AdvanceGate,
}

impl Register {
    pub fn new(value: u64) -> Self {
        Self { value, pending: None, gate: AdvanceGate::Open }
    }

    /// Reads the committed value. Never observes a pending write.
    pub fn read(&self) -> u64 {
        self.value
    }

    /// Stages a value for the next clock edge. Last write wins.
    pub fn write(&mut self, value: u64) {
        self.pending = Some(value);
    }

    /// Suppresses the next advance. Single-shot: the edge after the
    /// suppressed one commits normally, including any retained pending value.
    pub fn hold_next_advance(&mut self) {
        self.gate = AdvanceGate::HoldOnce;
    }

    /// Cancels a pending hold so the next advance commits.
    pub fn release(&mut self) {
        self.gate = AdvanceGate::Open;
    }

    /// The clock edge: commits the pending value if the gate is open.
    pub fn advance(&mut self) {
        match self.gate {
            AdvanceGate::HoldOnce => self.gate = AdvanceGate::Open,
            AdvanceGate::Open => {
                if let Some(value) = self.pending.take() {
                    self.value = value;
                }
            }
        }
    }
}

/// The 32 architectural registers, $r0-$r31, all initialized to 0.
///
/// Register 0 reads as zero because the writeback stage drops writes to
/// destination 0 before they reach the file; the file itself does not guard.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegisterFile {
    registers: [Register; NUM_REGISTERS],
    gate: AdvanceGate,
}

impl RegisterFile {
    pub fn read(&self, id: u64) -> SimulatorResult<u64> {
        Ok(self.register(id)?.read())
    }

    pub fn write(&mut self, id: u64, value: u64) -> SimulatorResult<()> {
        self.register_mut(id)?.write(value);
        Ok(())
    }

    /// Freezes every architectural register for one cycle. Single-shot.
    pub fn hold_next_advance(&mut self) {
        self.gate = AdvanceGate::HoldOnce;
    }

    /// The clock edge for the whole file.
    pub fn advance(&mut self) {
        match self.gate {
            AdvanceGate::HoldOnce => self.gate = AdvanceGate::Open,
            AdvanceGate::Open => {
                for register in self.registers.iter_mut() {
                    register.advance();
                }
            }
        }
    }

    fn register(&self, id: u64) -> SimulatorResult<&Register> {
        self.registers
            .get(id as usize)
            .ok_or(SimulatorError::UnknownRegister(id))
    }

    fn register_mut(&mut self, id: u64) -> SimulatorResult<&mut Register> {
        self.registers
            .get_mut(id as usize)
            .ok_or(SimulatorError::UnknownRegister(id))
    }
}

/// The program counter: a register tracking the next fetch address,
/// initialized to the instruction-memory base.
#[derive(Clone, Copy, Debug)]
pub struct ProgramCounter {
    register: Register,
}

impl Default for ProgramCounter {
    fn default() -> Self {
        Self { register: Register::new(PC_BASE) }
    }
}

impl ProgramCounter {
    pub fn read(&self) -> u64 {
        self.register.read()
    }

    pub fn write(&mut self, value: u64) {
        self.register.write(value);
    }

    /// Stages an increment by one word.
    pub fn increment(&mut self) {
        self.register.write(self.register.read() + 4);
    }

    pub fn hold_next_advance(&mut self) {
        self.register.hold_next_advance();
    }

    pub fn release(&mut self) {
        self.register.release();
    }

    pub fn advance(&mut self) {
        self.register.advance();
    }
}

/// CPU state owned by the driver and threaded through the stages
#[derive(Clone, Copy, Debug, Default)]
pub struct CPUState {
    /// Program counter
    pub pc: ProgramCounter,
    /// General purpose registers
    pub gpr: RegisterFile,

    /// CPU policy
    pub policy: CPUPolicy,

    /// History of execution
    pub history: CPUHistory,
}

impl CPUState {
    pub fn make(policy: CPUPolicy) -> Self {
        Self { policy, ..Self::default() }
    }

    /// Increments history cycle count
    pub fn update_cycle_count(&mut self, value: u64) {
        self.history.cycle_count += value;
    }

    /// Increments history instruction count
    pub fn update_inst_count(&mut self, value: u64) {
        self.history.inst_count += value;
    }
}

/// CPU policy
#[derive(Clone, Copy, Debug, Default)]
pub struct CPUPolicy {
    pub verbose: bool,
}

/// History module
#[derive(Clone, Copy, Debug, Default)]
pub struct CPUHistory {
    pub cycle_count: u64,
    pub inst_count: u64,
}
