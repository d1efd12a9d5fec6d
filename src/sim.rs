//! Simulating and execution for simple-asm programs.
//!
//! This module is focused on executing fully assembled code (i.e., [`ObjectFile`]).
//!
//! This module consists of:
//! - [`Machine`]: The struct that simulates assembled code.
//! - [`mem`]: The module handling memory and registers.
//! - [`preload`]: The module handling the data array memory is seeded with.
//! - [`debug`]: The module handling types of breakpoints for the machine.
//!
//! # Usage
//!
//! To simulate some code, you need to instantiate a Machine and load an object file to it:
//!
//! ```no_run
//! use simple_asm::sim::Machine;
//!
//! # let obj_file = panic!("don't actually make an object file");
//! let mut machine = Machine::new(Default::default());
//! machine.load_obj_file(&obj_file);
//! machine.run().unwrap();
//! ```
//!
//! ## Flags
//!
//! Here, we define `machine` to have the default flags.
//! We could also configure the machine by editing the flags. For example,
//! if we wish to start from cleared memory, we can edit the flags like so:
//!
//! ```no_run
//! # use simple_asm::sim::{Machine, SimFlags};
//! let mut machine = Machine::new(SimFlags { seed_data: false });
//! ```
//!
//! ## Execution
//!
//! Beyond the basic [`Machine::run`] (which runs until halting),
//! there are also:
//! - [`Machine::step_in`]: manual step-by-step simulation
//! - [`Machine::run_while`], [`Machine::run_with_limit`]: more advanced programmatic execution
//!
//! ```
//! use simple_asm::parse::parse_ast;
//! use simple_asm::asm::assemble;
//! use simple_asm::sim::{Machine, MachineState};
//! use simple_asm::ast::reg_consts::R0;
//!
//! let src = "
//!     LOAD R0, 101
//!     INCREMENT R0
//!     INCREMENT R0
//!     HALT
//! ";
//! let ast = parse_ast(src).unwrap();
//! let obj_file = assemble(ast).unwrap();
//!
//! let mut machine = Machine::new(Default::default());
//! machine.load_obj_file(&obj_file);
//!
//! // Running step by step:
//! machine.step_in().unwrap();
//! assert_eq!(machine.reg_file[R0], 5);
//! machine.step_in().unwrap();
//! assert_eq!(machine.reg_file[R0], 6);
//! machine.step_in().unwrap();
//! assert_eq!(machine.reg_file[R0], 7);
//! machine.step_in().unwrap();
//! assert_eq!(machine.state(), MachineState::Halted);
//! ```

pub mod debug;
pub mod mem;
pub mod preload;

use std::collections::HashSet;

use crate::asm::ObjectFile;
use crate::ast::sim::SimInstr;
use crate::ast::{Field, Opcode, Reg};

use self::debug::Breakpoint;
use self::mem::{MemArray, RegFile};
use self::preload::DataPreload;

/// The number of byte cells in memory.
pub const MEM_SIZE: usize = 256;
/// The address programs leave their result in.
pub const RESULT_ADDR: u8 = 150;

/// Errors that can occur during simulation.
///
/// Only [`SimErr::FetchOutOfBounds`] stops execution. The other errors are absorbed
/// by the machine: the instruction is skipped and the PC moves on to the next word.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum SimErr {
    /// The PC pointed at a word that does not fit in memory. Holds the PC.
    FetchOutOfBounds(u32),
    /// Word was decoded, but the opcode has no mnemonic. Holds the opcode.
    UnmappedOpcode(u8),
    /// The instruction named a register or memory address that does not exist.
    OperandOutOfRange(Opcode),
}
impl SimErr {
    /// Whether this error stops the machine.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SimErr::FetchOutOfBounds(_))
    }
}
impl std::fmt::Display for SimErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimErr::FetchOutOfBounds(pc)   => write!(f, "instruction fetch at {pc} is out of memory bounds"),
            SimErr::UnmappedOpcode(op)     => write!(f, "machine executed unknown opcode 0x{op:X}"),
            SimErr::OperandOutOfRange(op)  => write!(f, "{op} operand is out of range"),
        }
    }
}
impl std::error::Error for SimErr {}
impl crate::err::Error for SimErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            SimErr::FetchOutOfBounds(_)  => Some(format!("a program must halt before its PC reaches {}", MEM_SIZE - 3).into()),
            SimErr::UnmappedOpcode(_)    => None,
            SimErr::OperandOutOfRange(_) => Some(format!("registers are R0-R2 and addresses are 0-{}", MEM_SIZE - 1).into()),
        }
    }
}

/// Anything that can cause a step to abruptly fail to finish.
enum StepBreak {
    /// A halt was executed.
    Halt,
    /// A simulation error occurred.
    Err(SimErr),
}
impl From<SimErr> for StepBreak {
    fn from(value: SimErr) -> Self {
        Self::Err(value)
    }
}

/// The run state of a [`Machine`].
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum MachineState {
    /// The machine can execute instructions.
    #[default]
    Running,
    /// The machine executed `HALT`.
    Halted,
    /// The machine tried to fetch an instruction outside of memory.
    Faulted,
}
impl std::fmt::Display for MachineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MachineState::Running => f.write_str("RUNNING"),
            MachineState::Halted  => f.write_str("HALTED"),
            MachineState::Faulted => f.write_str("FAULTED"),
        }
    }
}

/// Reason for why execution stopped if it wasn't due to an error.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum StopReason {
    /// Program reached a halt.
    Halt,
    /// The PC moved past the end of memory.
    RanOffEnd,
    /// Program hit a breakpoint.
    Breakpoint,
    /// Program hit a tripwire condition (including the step limit of [`Machine::run_with_limit`]).
    Tripwire,
}
impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Halt       => f.write_str("halted"),
            StopReason::RanOffEnd  => f.write_str("ran off the end of memory"),
            StopReason::Breakpoint => f.write_str("hit breakpoint"),
            StopReason::Tripwire   => f.write_str("stopped by tripwire"),
        }
    }
}

/// Configuration flags for [`Machine`].
///
/// These can be modified after the `Machine` is created with [`Machine::new`];
/// they apply on the next [`Machine::reset`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SimFlags {
    /// Whether memory is seeded with the machine's [`DataPreload`]
    /// when it is created or reset.
    ///
    /// By default, this flag is `true`.
    pub seed_data: bool,
}
impl Default for SimFlags {
    fn default() -> Self {
        Self { seed_data: true }
    }
}

/// Executes assembled code.
#[derive(Debug)]
pub struct Machine {
    /// The machine's memory.
    ///
    /// Note that this is public for inspection purposes.
    /// Writing to it directly skips every check the instructions are subject to.
    pub mem: MemArray,

    /// The machine's register file.
    pub reg_file: RegFile,

    /// The program counter: the address of the next instruction to fetch.
    pub pc: u32,

    /// Breakpoints for the machine.
    pub breakpoints: HashSet<Breakpoint>,

    /// Configuration settings for the machine.
    pub flags: SimFlags,

    state: MachineState,
    preload: DataPreload,
    /// The cell written by the last executed instruction.
    last_write: Option<u8>,

    /// The number of instructions fetched and executed so far.
    instructions_run: u64,
    /// The number of instructions skipped because of an out of range operand.
    skipped_operations: u64,
    /// The number of instructions skipped because their opcode has no mnemonic.
    unmapped_opcodes: u64,
}

impl Machine {
    /// Creates a new machine with the provided flags and the default [`DataPreload`],
    /// but without a loaded object file.
    pub fn new(flags: SimFlags) -> Self {
        Self::with_preload(flags, DataPreload::default())
    }

    /// Creates a new machine which seeds memory with the provided data.
    ///
    /// The data is only written if [`SimFlags::seed_data`] is set.
    pub fn with_preload(flags: SimFlags, preload: DataPreload) -> Self {
        let mut machine = Self {
            mem: MemArray::new(),
            reg_file: RegFile::new(),
            pc: 0,
            breakpoints: HashSet::new(),
            flags,
            state: MachineState::Running,
            preload,
            last_write: None,
            instructions_run: 0,
            skipped_operations: 0,
            unmapped_opcodes: 0,
        };

        if flags.seed_data {
            machine.preload.apply(&mut machine.mem);
            tracing::info!(values = machine.preload.values().len(), "seeded data array");
        }
        machine
    }

    /// Resets the machine.
    ///
    /// This resets the state of the `Machine` back to before any execution calls,
    /// while preserving configuration and debug state.
    ///
    /// Note that this function preserves:
    /// - Flags
    /// - Breakpoints
    /// - The data preload (which is reapplied if [`SimFlags::seed_data`] is set)
    ///
    /// This also does not reload object files. Any object file data has to be reloaded into the Machine.
    pub fn reset(&mut self) {
        let flags = self.flags;
        let breakpoints = std::mem::take(&mut self.breakpoints);
        let preload = std::mem::take(&mut self.preload);

        *self = Machine::with_preload(flags, preload);
        self.breakpoints = breakpoints;
    }

    /// Loads an object file into this machine.
    ///
    /// Word `i` of the object file is written big-endian at address `4 * i`,
    /// over anything already in memory.
    pub fn load_obj_file(&mut self, obj: &ObjectFile) {
        self.mem.copy_image(&obj.to_bytes());
        tracing::info!(words = obj.len(), "loaded object file");
    }

    /// The run state of the machine.
    pub fn state(&self) -> MachineState {
        self.state
    }

    /// The data this machine seeds memory with.
    pub fn preload(&self) -> &DataPreload {
        &self.preload
    }

    /// The memory address the last executed instruction stored to,
    /// or `None` if it did not write to memory.
    pub fn last_write(&self) -> Option<u8> {
        self.last_write
    }

    /// The value of the result cell ([`RESULT_ADDR`]).
    pub fn result(&self) -> u8 {
        self.mem[RESULT_ADDR]
    }

    /// The number of instructions fetched and executed so far.
    pub fn instructions_run(&self) -> u64 {
        self.instructions_run
    }

    /// The number of instructions skipped because of an out of range register or address.
    pub fn skipped_operations(&self) -> u64 {
        self.skipped_operations
    }

    /// The number of instructions skipped because their opcode has no mnemonic.
    pub fn unmapped_opcodes(&self) -> u64 {
        self.unmapped_opcodes
    }

    /// Runs until the tripwire condition returns false (or any of the typical breaks occur).
    ///
    /// The typical break conditions are:
    /// - `HALT` is executed
    /// - the PC moves past the end of memory
    /// - A breakpoint matches
    ///
    /// An instruction fetch outside of memory stops the machine with an error.
    pub fn run_while(&mut self, mut tripwire: impl FnMut(&mut Machine) -> bool) -> Result<StopReason, SimErr> {
        self.state = MachineState::Running;
        tracing::info!(pc = self.pc, "starting execution");

        // event loop
        // run until:
        // 1. the PC is past the end of memory
        // 2. the tripwire condition returns false
        // 3. any of the breakpoints are hit
        let result = loop {
            if self.pc >= MEM_SIZE as u32 {
                break Ok(StopReason::RanOffEnd);
            }
            if !tripwire(self) {
                break Ok(StopReason::Tripwire);
            }

            // Run a step:
            match self.step() {
                Ok(()) => {},
                Err(StepBreak::Halt) => break Ok(StopReason::Halt),
                Err(StepBreak::Err(e)) => break Err(e)
            }

            // After executing, check that any breakpoints were hit.
            if self.breakpoints.iter().any(|bp| bp.check(self)) {
                break Ok(StopReason::Breakpoint);
            }
        };

        match &result {
            Ok(reason) => tracing::info!(pc = self.pc, instructions = self.instructions_run, "execution stopped: {reason}"),
            Err(e) => tracing::info!(pc = self.pc, instructions = self.instructions_run, "execution failed: {e}"),
        }
        result
    }

    /// Execute the program.
    ///
    /// This blocks until the program ends.
    /// If you would like to limit the maximum number of steps to execute, consider [`Machine::run_with_limit`].
    pub fn run(&mut self) -> Result<StopReason, SimErr> {
        self.run_while(|_| true)
    }

    /// Execute the program with a limit on how many steps to execute.
    ///
    /// This blocks until the program ends or until the number of steps to execute has been hit,
    /// in which case this returns [`StopReason::Tripwire`].
    pub fn run_with_limit(&mut self, max_steps: u64) -> Result<StopReason, SimErr> {
        let i = self.instructions_run;
        self.run_while(|m| m.instructions_run.wrapping_sub(i) < max_steps)
    }

    /// Simulate one step, executing one instruction.
    pub fn step_in(&mut self) -> Result<(), SimErr> {
        match self.step() {
            Ok(()) => Ok(()),
            Err(StepBreak::Halt) => Ok(()),
            Err(StepBreak::Err(e)) => Err(e)
        }
    }

    /// Fetches, decodes, and executes the instruction at the PC.
    fn step(&mut self) -> Result<(), StepBreak> {
        let pc = self.pc;
        let Some(word) = self.mem.read_word(pc) else {
            self.state = MachineState::Faulted;
            tracing::error!(pc, "instruction fetch out of bounds");
            return Err(SimErr::FetchOutOfBounds(pc).into());
        };
        let instr = SimInstr::decode(word);
        self.last_write = None;

        tracing::debug!(
            pc,
            instr = %instr,
            regs = %self.reg_file,
            mem150 = self.result(),
            "executing"
        );
        self.instructions_run += 1;

        // A fetched word ends at or before the last cell, so `pc + 4` cannot overflow.
        self.pc = match self.execute(instr) {
            Ok(Some(target)) => target,
            Ok(None) => pc + 4,
            Err(StepBreak::Err(e)) if !e.is_fatal() => {
                self.absorb(pc, e);
                pc + 4
            },
            Err(StepBreak::Halt) => {
                self.state = MachineState::Halted;
                return Err(StepBreak::Halt);
            },
            Err(brk) => return Err(brk),
        };

        Ok(())
    }

    /// Executes a decoded instruction.
    ///
    /// This returns the address to jump to if the instruction moves the PC anywhere but the next word.
    fn execute(&mut self, instr: SimInstr) -> Result<Option<u32>, StepBreak> {
        let SimInstr { opcode, literal, dest, op1: _, op2 } = instr;

        match opcode {
            Opcode::Load => {
                let dr = reg(opcode, dest)?;
                let addr = mem_addr(opcode, u32::from(literal.get()))?;
                self.reg_file[dr] = u32::from(self.mem[addr]);
            },
            Opcode::LoadInd => {
                let dr = reg(opcode, dest)?;
                let ar = reg(opcode, op2)?;
                let addr = mem_addr(opcode, self.reg_file[ar])?;
                self.reg_file[dr] = u32::from(self.mem[addr]);
            },
            Opcode::Store => {
                let sr = reg(opcode, dest)?;
                let addr = mem_addr(opcode, u32::from(literal.get()))?;
                self.mem[addr] = low_byte(self.reg_file[sr]);
                self.last_write = Some(addr);
            },
            Opcode::StoreInd => {
                let sr = reg(opcode, dest)?;
                let ar = reg(opcode, op2)?;
                let addr = mem_addr(opcode, self.reg_file[ar])?;
                self.mem[addr] = low_byte(self.reg_file[sr]);
                self.last_write = Some(addr);
            },
            Opcode::CmpInd => {
                let dr = reg(opcode, dest)?;
                let ar = reg(opcode, op2)?;
                let addr = mem_addr(opcode, self.reg_file[ar])?;

                let value = u32::from(self.mem[addr]);
                if value > self.reg_file[dr] {
                    self.reg_file[dr] = value;
                }
            },
            Opcode::Increment => {
                let dr = reg(opcode, dest)?;
                self.reg_file[dr] = self.reg_file[dr].wrapping_add(1);
            },
            Opcode::Decrement => {
                let dr = reg(opcode, dest)?;
                self.reg_file[dr] = self.reg_file[dr].wrapping_sub(1);
            },
            Opcode::Jump => return Ok(Some(instr.jump_target())),
            Opcode::Jz => {
                let tr = reg(opcode, op2)?;
                if self.reg_file[tr] == 0 {
                    return Ok(Some(instr.jump_target()));
                }
            },
            Opcode::Nop => {},
            Opcode::Halt => return Err(StepBreak::Halt),
            Opcode::Unknown(bits) => return Err(SimErr::UnmappedOpcode(bits).into()),
        }

        Ok(None)
    }

    /// Records an instruction that was skipped.
    fn absorb(&mut self, pc: u32, e: SimErr) {
        match e {
            SimErr::UnmappedOpcode(_) => {
                self.unmapped_opcodes += 1;
                tracing::warn!(pc, "{e}, skipping");
            },
            _ => {
                self.skipped_operations += 1;
                tracing::trace!(pc, "{e}, skipping");
            }
        }
    }
}

/// Checks that a register field names one of the machine's registers.
fn reg(opcode: Opcode, field: Field<4>) -> Result<Reg, SimErr> {
    Reg::new(field.get()).ok_or(SimErr::OperandOutOfRange(opcode))
}
/// Checks that a value is an address in memory.
fn mem_addr(opcode: Opcode, value: u32) -> Result<u8, SimErr> {
    u8::try_from(value).map_err(|_| SimErr::OperandOutOfRange(opcode))
}
/// Memory cells hold the low 8 bits of a stored register.
fn low_byte(value: u32) -> u8 {
    value.to_le_bytes()[0]
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::asm::{assemble, assemble_instrs, encode, ObjectFile};
    use crate::ast::asm::AsmInstr;
    use crate::ast::reg_consts::{R0, R1, R2};
    use crate::parse::parse_ast;

    use super::debug::{Breakpoint, Comparator};
    use super::preload::DataPreload;
    use super::{Machine, MachineState, SimErr, SimFlags, StopReason, MEM_SIZE};

    fn program(instrs: &[(&str, i64, i64)]) -> ObjectFile {
        assemble_instrs(instrs.iter().map(|&t| AsmInstr::from(t))).unwrap()
    }
    fn loaded(instrs: &[(&str, i64, i64)]) -> Machine {
        let mut machine = Machine::new(SimFlags::default());
        machine.load_obj_file(&program(instrs));
        machine
    }

    #[test]
    fn test_load_then_halt() {
        let mut machine = loaded(&[("LOAD", 0, 101), ("HALT", 0, 0)]);
        assert_eq!(machine.run(), Ok(StopReason::Halt));
        assert_eq!(machine.reg_file[R0], 5);
        assert_eq!(machine.state(), MachineState::Halted);
        // HALT leaves the PC on itself
        assert_eq!(machine.pc, 4);
    }

    #[test]
    fn test_jz_not_taken() {
        let mut machine = loaded(&[
            ("INCREMENT", 1, 0),
            ("INCREMENT", 1, 0),
            ("JZ", 5, 1),
            ("HALT", 0, 0),
        ]);
        assert_eq!(machine.run(), Ok(StopReason::Halt));
        assert_eq!(machine.reg_file[R1], 2);
        assert_eq!(machine.pc, 12);
    }

    #[test]
    fn test_jz_taken() {
        let mut machine = loaded(&[
            ("JZ", 2, 0),
            ("INCREMENT", 0, 0),
            ("HALT", 0, 0),
        ]);
        assert_eq!(machine.run(), Ok(StopReason::Halt));
        assert_eq!(machine.reg_file[R0], 0);
        assert_eq!(machine.instructions_run(), 2);
    }

    #[test]
    fn test_jump_skips() {
        let mut machine = loaded(&[("JUMP", 2, 0), ("NOP", 0, 0), ("HALT", 0, 0)]);
        assert_eq!(machine.run(), Ok(StopReason::Halt));
        assert_eq!(machine.pc, 8);
        assert_eq!(machine.instructions_run(), 2);
    }

    #[test]
    fn test_fetch_out_of_bounds() {
        let mut machine = Machine::new(SimFlags::default());
        let mem = machine.mem.clone();
        let regs = machine.reg_file;

        machine.pc = 253;
        assert_eq!(machine.run(), Err(SimErr::FetchOutOfBounds(253)));
        assert_eq!(machine.state(), MachineState::Faulted);
        assert_eq!(machine.mem, mem);
        assert_eq!(machine.reg_file, regs);
        assert_eq!(machine.instructions_run(), 0);

        // The last whole word is still fetchable:
        let mut machine = Machine::new(SimFlags::default());
        machine.mem.as_slice_mut()[252..].copy_from_slice(&encode("HALT", 0, 0).to_be_bytes());
        machine.pc = 252;
        assert_eq!(machine.run(), Ok(StopReason::Halt));

        let mut machine = Machine::new(SimFlags::default());
        machine.pc = 256;
        assert_eq!(machine.step_in(), Err(SimErr::FetchOutOfBounds(256)));
        assert_eq!(machine.state(), MachineState::Faulted);
    }

    #[test]
    fn test_invalid_register_skipped() {
        let mut machine = loaded(&[("STORE_IND", 0, 5)]);
        let mem = machine.mem.clone();

        assert_eq!(machine.step_in(), Ok(()));
        assert_eq!(machine.pc, 4);
        assert_eq!(machine.mem, mem);
        assert_eq!(machine.skipped_operations(), 1);
        assert_eq!(machine.state(), MachineState::Running);

        // negative register indices are masked to the field (R-1 is R15)
        let obj = assemble(parse_ast("LOAD R-1, 101\nHALT").unwrap()).unwrap();
        assert_eq!((obj.words()[0] >> 8) & 0xF, 15);
        let mut machine = Machine::new(SimFlags::default());
        machine.load_obj_file(&obj);
        assert_eq!(machine.run(), Ok(StopReason::Halt));
        assert_eq!(machine.reg_file.as_array(), [0, 0, 0]);
        assert_eq!(machine.skipped_operations(), 1);
    }

    #[test]
    fn test_guards() {
        // invalid dest
        let mut machine = loaded(&[("LOAD", 3, 101), ("INCREMENT", 15, 0), ("DECREMENT", 4, 0)]);
        for _ in 0..3 {
            machine.step_in().unwrap();
        }
        assert_eq!(machine.reg_file.as_array(), [0, 0, 0]);
        assert_eq!(machine.skipped_operations(), 3);

        // literal past the end of memory
        let mut machine = loaded(&[("LOAD", 0, 256), ("STORE", 0, 0xFFFF)]);
        let mem = machine.mem.clone();
        machine.reg_file[R0] = 9;
        machine.step_in().unwrap();
        machine.step_in().unwrap();
        assert_eq!(machine.reg_file[R0], 9);
        assert_eq!(machine.mem, mem);
        assert_eq!(machine.pc, 8);

        // indirect address past the end of memory
        let mut machine = loaded(&[("LOAD_IND", 0, 2), ("STORE_IND", 0, 2), ("CMP_IND", 0, 2)]);
        let mem = machine.mem.clone();
        machine.reg_file[R2] = 256;
        for _ in 0..3 {
            machine.step_in().unwrap();
        }
        assert_eq!(machine.reg_file[R0], 0);
        assert_eq!(machine.mem, mem);
        assert_eq!(machine.skipped_operations(), 3);
        assert_eq!(machine.last_write(), None);

        // JZ with an invalid register falls through
        let mut machine = loaded(&[("JZ", 3, 7), ("HALT", 0, 0)]);
        assert_eq!(machine.run(), Ok(StopReason::Halt));
        assert_eq!(machine.pc, 4);
    }

    #[test]
    fn test_unknown_opcode() {
        let mut machine = Machine::new(SimFlags { seed_data: false });
        // an empty program runs through 64 words of opcode 0
        assert_eq!(machine.run(), Ok(StopReason::RanOffEnd));
        assert_eq!(machine.pc, MEM_SIZE as u32);
        assert_eq!(machine.unmapped_opcodes(), 64);
        assert_eq!(machine.instructions_run(), 64);
        assert_eq!(machine.state(), MachineState::Running);
    }

    #[test]
    fn test_nop_unknown_idempotent() {
        let mut rng = StdRng::seed_from_u64(0x5A5A);

        for word in [encode("NOP", 0, 0), 0x0000_0000, 0xA123_4567, 0xD000_0001] {
            let mut machine = Machine::new(SimFlags::default());
            rng.fill(&mut machine.mem.as_slice_mut()[8..]);
            machine.mem.as_slice_mut()[4..8].copy_from_slice(&word.to_be_bytes());
            machine.reg_file[R0] = rng.gen();
            machine.reg_file[R1] = rng.gen();
            machine.reg_file[R2] = rng.gen();
            machine.pc = 4;

            let mem = machine.mem.clone();
            let regs = machine.reg_file;
            machine.step_in().unwrap();

            assert_eq!(machine.pc, 8);
            assert_eq!(machine.mem, mem);
            assert_eq!(machine.reg_file, regs);
        }
    }

    #[test]
    fn test_store_truncates() {
        let mut machine = loaded(&[("STORE", 0, 150), ("STORE_IND", 1, 2)]);
        machine.reg_file[R0] = 0x1_0042;
        machine.reg_file[R1] = 0x1FF;
        machine.reg_file[R2] = 149;
        machine.step_in().unwrap();
        machine.step_in().unwrap();
        assert_eq!(machine.result(), 0x42);
        assert_eq!(machine.mem[149], 0xFF);
    }

    #[test]
    fn test_cmp_ind() {
        let mut machine = loaded(&[("CMP_IND", 0, 2), ("CMP_IND", 1, 2), ("CMP_IND", 1, 2)]);
        machine.reg_file[R0] = 10;
        machine.reg_file[R1] = 1;
        machine.reg_file[R2] = 101;

        machine.step_in().unwrap();
        assert_eq!(machine.reg_file[R0], 10);
        machine.step_in().unwrap();
        assert_eq!(machine.reg_file[R1], 5);

        // equal does not overwrite
        machine.mem[101] = 5;
        machine.reg_file[R1] = 5;
        machine.step_in().unwrap();
        assert_eq!(machine.reg_file[R1], 5);
    }

    #[test]
    fn test_wrapping() {
        let mut machine = loaded(&[("DECREMENT", 0, 0), ("INCREMENT", 0, 0), ("INCREMENT", 0, 0)]);
        machine.step_in().unwrap();
        assert_eq!(machine.reg_file[R0], u32::MAX);
        machine.step_in().unwrap();
        assert_eq!(machine.reg_file[R0], 0);
        machine.step_in().unwrap();
        assert_eq!(machine.reg_file[R0], 1);
    }

    #[test]
    fn test_jump_off_end() {
        let mut machine = loaded(&[("JUMP", 64, 0)]);
        assert_eq!(machine.run(), Ok(StopReason::RanOffEnd));
        assert_eq!(machine.pc, 256);
        assert_eq!(machine.state(), MachineState::Running);

        let mut machine = loaded(&[("JUMP", 0xFFFF, 0)]);
        assert_eq!(machine.run(), Ok(StopReason::RanOffEnd));
        assert_eq!(machine.pc, 0xFFFF * 4);
    }

    #[test]
    fn test_find_max() {
        let src = "
            LOAD R1, 100      ; count
            LOAD R2, 99       ; pointer
            LOAD_IND R0, R2   ; max = first value
            CMP_IND R0, R2    ; loop:
            INCREMENT R2
            DECREMENT R1
            JZ 8, R1
            JUMP 3
            STORE R0, 150
            HALT
        ";
        let obj = assemble(parse_ast(src).unwrap()).unwrap();
        let mut machine = Machine::new(SimFlags::default());
        machine.load_obj_file(&obj);

        assert_eq!(machine.run(), Ok(StopReason::Halt));
        assert_eq!(machine.result(), 100);
        assert_eq!(machine.reg_file.as_array(), [100, 0, 116]);
        assert_eq!(machine.instructions_run(), 79);

        // Other data:
        let preload = DataPreload::new(vec![7, 42, 3]).unwrap();
        let mut machine = Machine::with_preload(SimFlags::default(), preload);
        machine.load_obj_file(&obj);
        assert_eq!(machine.run(), Ok(StopReason::Halt));
        assert_eq!(machine.result(), 42);
    }

    #[test]
    fn test_determinism() {
        let mut rng = StdRng::seed_from_u64(1234);

        for _ in 0..50 {
            let words: Vec<u32> = (0..64).map(|_| rng.gen()).collect();
            let obj = ObjectFile::from_words(words).unwrap();

            let run = || {
                let mut machine = Machine::new(SimFlags::default());
                machine.load_obj_file(&obj);
                let result = machine.run_with_limit(2_000);
                (result, machine.reg_file, machine.result(), machine.pc)
            };
            assert_eq!(run(), run());
        }
    }

    #[test]
    fn test_random_programs_stay_in_bounds() {
        // Any program stops on its own or by the step limit, without panicking
        let mut rng = StdRng::seed_from_u64(99);

        for _ in 0..200 {
            let words: Vec<u32> = (0..rng.gen_range(0..=64)).map(|_| rng.gen()).collect();
            let obj = ObjectFile::from_words(words).unwrap();

            let mut machine = Machine::new(SimFlags::default());
            machine.load_obj_file(&obj);
            match machine.run_with_limit(1_000) {
                Ok(StopReason::Halt) => assert_eq!(machine.state(), MachineState::Halted),
                Ok(StopReason::RanOffEnd) => assert!(machine.pc >= MEM_SIZE as u32),
                Ok(StopReason::Tripwire) => assert_eq!(machine.instructions_run(), 1_000),
                Ok(StopReason::Breakpoint) => unreachable!("no breakpoints were set"),
                Err(e) => panic!("aligned programs should not fault: {e}"),
            }
            assert_eq!(machine.pc % 4, 0);
        }
    }

    #[test]
    fn test_run_with_limit() {
        let mut machine = loaded(&[("INCREMENT", 0, 0), ("JUMP", 0, 0)]);
        assert_eq!(machine.run_with_limit(10), Ok(StopReason::Tripwire));
        assert_eq!(machine.instructions_run(), 10);
        assert_eq!(machine.reg_file[R0], 5);

        assert_eq!(machine.run_with_limit(10), Ok(StopReason::Tripwire));
        assert_eq!(machine.instructions_run(), 20);
    }

    #[test]
    fn test_breakpoints() {
        let mut machine = loaded(&[
            ("INCREMENT", 1, 0),
            ("INCREMENT", 1, 0),
            ("INCREMENT", 1, 0),
            ("STORE", 1, 150),
            ("HALT", 0, 0),
        ]);
        machine.breakpoints.insert(Breakpoint::Reg { reg: R1, value: Comparator::Eq(2) });

        assert_eq!(machine.run(), Ok(StopReason::Breakpoint));
        assert_eq!(machine.reg_file[R1], 2);
        assert_eq!(machine.pc, 8);

        machine.breakpoints.clear();
        machine.breakpoints.insert(Breakpoint::Mem { addr: 150, value: Comparator::Ne(0xFF) });
        assert_eq!(machine.run(), Ok(StopReason::Breakpoint));
        assert_eq!(machine.result(), 3);

        machine.breakpoints.clear();
        machine.breakpoints.insert(Breakpoint::PC(0));
        assert_eq!(machine.run(), Ok(StopReason::Halt));
    }

    #[test]
    fn test_reset() {
        let obj = program(&[("INCREMENT", 0, 0), ("STORE", 0, 101), ("HALT", 0, 0)]);
        let mut machine = Machine::new(SimFlags::default());
        machine.breakpoints.insert(Breakpoint::PC(4));
        machine.load_obj_file(&obj);
        assert_eq!(machine.run(), Ok(StopReason::Breakpoint));
        assert_eq!(machine.run(), Ok(StopReason::Halt));
        assert_eq!(machine.mem[101], 1);

        machine.reset();
        assert_eq!(machine.pc, 0);
        assert_eq!(machine.reg_file.as_array(), [0, 0, 0]);
        assert_eq!(machine.mem[101], 5);
        assert_eq!(machine.mem[0], 0);
        assert_eq!(machine.instructions_run(), 0);
        assert_eq!(machine.state(), MachineState::Running);
        assert_eq!(machine.breakpoints.len(), 1);

        machine.flags.seed_data = false;
        machine.reset();
        assert!(machine.mem.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_no_seed() {
        let machine = Machine::new(SimFlags { seed_data: false });
        assert_eq!(machine.result(), 0);
        assert_eq!(machine.mem[100], 0);

        let machine = Machine::new(SimFlags::default());
        assert_eq!(machine.result(), 0xFF);
        assert_eq!(machine.preload().values().len(), 15);
    }

    #[test]
    fn test_program_overwrites_data() {
        // A program long enough to reach the data header replaces it
        let mut instrs = vec![("NOP", 0, 0); 25];
        instrs.push(("HALT", 0, 0));
        let mut machine = loaded(&instrs);
        assert_eq!(machine.mem[96], 0xE0);
        assert_eq!(machine.mem[100], 0xF0);
        assert_eq!(machine.run(), Ok(StopReason::Halt));
        assert_eq!(machine.pc, 100);
    }
}
