pub mod alu;
pub mod cpu;
pub mod encode;
pub mod loader;
pub mod memory;
pub mod run_wrapper;

pub mod pipeline;

pub mod error;
