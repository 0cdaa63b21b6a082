//! The execution engine.
//!
//! Implements the fetch-decode-execute cycle and all opcode behaviors.

use crate::machine::decode::{self, DecodeError, Opcode};
use crate::machine::io::Console;
use crate::machine::memory::{Memory, MemoryError};
use crate::machine::registers::Registers;
use crate::machine::Word;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Arithmetic wraps modulo 2^15.
pub const WORD_MODULUS: u32 = 32768;

/// Machine execution state.
///
/// There is no transition out of `Halted`: a finished run is not
/// resumable, whether it ended through `halt`, `ret` on an empty
/// stack, or a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VmState {
    /// The machine is executing instructions.
    Running,
    /// The machine has stopped.
    Halted,
}

/// The virtual machine.
pub struct Machine {
    /// The 8-register file.
    pub regs: Registers,
    /// Main memory, image loaded at address 0.
    pub mem: Memory,
    /// The unbounded value stack.
    pub stack: Vec<Word>,
    /// Program counter: memory index of the next instruction.
    pub pc: usize,
    /// Current execution state.
    pub state: VmState,
    /// Instructions executed so far.
    pub cycles: u64,
    /// The character I/O bridge.
    console: Console,
    /// Last executed opcode (for debugging).
    last_op: Option<Opcode>,
}

impl Machine {
    /// Create a machine with the given image loaded at address 0 and
    /// the given console as its connection to the outside world.
    pub fn new(image: &[Word], console: Console) -> Result<Self, VmError> {
        let mut mem = Memory::new();
        mem.load_image(image)?;
        Ok(Self {
            regs: Registers::new(),
            mem,
            stack: Vec::new(),
            pc: 0,
            state: VmState::Running,
            cycles: 0,
            console,
            last_op: None,
        })
    }

    /// Execute a single instruction.
    ///
    /// Returns the opcode that was executed. Any error halts the
    /// machine before it is returned; none are recoverable.
    pub fn step(&mut self) -> Result<Opcode, VmError> {
        if self.state != VmState::Running {
            return Err(VmError::NotRunning(self.state));
        }

        match self.dispatch() {
            Ok(op) => {
                self.cycles += 1;
                self.last_op = Some(op);
                Ok(op)
            }
            Err(e) => {
                self.state = VmState::Halted;
                Err(e)
            }
        }
    }

    /// Run until halt or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, VmError> {
        let start_cycles = self.cycles;

        while self.state == VmState::Running {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, VmError> {
        let start_cycles = self.cycles;
        let limit = self.cycles + max_cycles;

        while self.state == VmState::Running && self.cycles < limit {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// One fetch-decode-execute pass.
    fn dispatch(&mut self) -> Result<Opcode, VmError> {
        let raw = self.fetch(self.pc)?;
        let op = Opcode::from_word(raw)?;
        self.execute(op)?;
        Ok(op)
    }

    /// Execute a decoded opcode, updating state and the pc.
    fn execute(&mut self, op: Opcode) -> Result<(), VmError> {
        match op {
            Opcode::Halt => {
                self.state = VmState::Halted;
            }

            Opcode::Set => {
                let dst = self.target(1)?;
                let value = self.value(2)?;
                self.regs.set(dst, value);
            }

            Opcode::Push => {
                let value = self.value(1)?;
                self.stack.push(value);
            }

            Opcode::Pop => {
                let dst = self.target(1)?;
                let value = self.stack.pop().ok_or(VmError::StackUnderflow)?;
                self.regs.set(dst, value);
            }

            Opcode::Eq => {
                let dst = self.target(1)?;
                let (b, c) = (self.value(2)?, self.value(3)?);
                self.regs.set(dst, Word::from(b == c));
            }

            Opcode::Gt => {
                let dst = self.target(1)?;
                let (b, c) = (self.value(2)?, self.value(3)?);
                self.regs.set(dst, Word::from(b > c));
            }

            // Jumps set the pc themselves and skip the default advance
            Opcode::Jmp => {
                self.pc = self.value(1)? as usize;
            }

            Opcode::Jt => {
                let cond = self.value(1)?;
                let dest = self.value(2)?;
                if cond != 0 {
                    self.pc = dest as usize;
                } else {
                    self.pc += op.size();
                }
            }

            Opcode::Jf => {
                let cond = self.value(1)?;
                let dest = self.value(2)?;
                if cond == 0 {
                    self.pc = dest as usize;
                } else {
                    self.pc += op.size();
                }
            }

            Opcode::Add => {
                let dst = self.target(1)?;
                let (b, c) = (self.value(2)?, self.value(3)?);
                let sum = (u32::from(b) + u32::from(c)) % WORD_MODULUS;
                self.regs.set(dst, sum as Word);
            }

            Opcode::Mult => {
                let dst = self.target(1)?;
                let (b, c) = (self.value(2)?, self.value(3)?);
                let product = (u32::from(b) * u32::from(c)) % WORD_MODULUS;
                self.regs.set(dst, product as Word);
            }

            Opcode::Mod => {
                let dst = self.target(1)?;
                let (b, c) = (self.value(2)?, self.value(3)?);
                if c == 0 {
                    return Err(VmError::DivisionByZero);
                }
                self.regs.set(dst, b % c);
            }

            Opcode::And => {
                let dst = self.target(1)?;
                let (b, c) = (self.value(2)?, self.value(3)?);
                self.regs.set(dst, b & c);
            }

            Opcode::Or => {
                let dst = self.target(1)?;
                let (b, c) = (self.value(2)?, self.value(3)?);
                self.regs.set(dst, b | c);
            }

            Opcode::Not => {
                let dst = self.target(1)?;
                let b = self.value(2)?;
                // 15-bit complement
                self.regs.set(dst, !b & 0x7FFF);
            }

            Opcode::Rmem => {
                let dst = self.target(1)?;
                let addr = self.value(2)?;
                self.regs.set(dst, self.mem.read(addr)?);
            }

            Opcode::Wmem => {
                let addr = self.value(1)?;
                let value = self.value(2)?;
                self.mem.write(addr, value)?;
            }

            Opcode::Call => {
                let dest = self.value(1)?;
                self.stack.push((self.pc + op.size()) as Word);
                self.pc = dest as usize;
            }

            Opcode::Ret => match self.stack.pop() {
                Some(addr) => self.pc = addr as usize,
                // Returning with nothing to return to is a graceful
                // halt, not an underflow
                None => self.state = VmState::Halted,
            },

            Opcode::Out => {
                let code = self.value(1)?;
                self.console
                    .emit(code)
                    .map_err(|e| VmError::Io(e.to_string()))?;
            }

            Opcode::In => {
                let dst = self.target(1)?;
                let code = self
                    .console
                    .next_input_char()
                    .map_err(|e| VmError::Io(e.to_string()))?;
                self.regs.set(dst, code);
            }

            Opcode::Noop => {}
        }

        if !op.sets_pc() {
            self.pc += op.size();
        }

        Ok(())
    }

    /// Fetch the word at a raw memory index.
    fn fetch(&self, index: usize) -> Result<Word, VmError> {
        self.mem.fetch(index).ok_or(VmError::OutOfBoundsPc(index))
    }

    /// Resolve the operand at `pc + offset` in value form.
    fn value(&self, offset: usize) -> Result<Word, VmError> {
        let token = self.fetch(self.pc + offset)?;
        Ok(self.regs.resolve(token)?)
    }

    /// Resolve the operand at `pc + offset` as a register destination.
    fn target(&self, offset: usize) -> Result<usize, VmError> {
        let token = self.fetch(self.pc + offset)?;
        Ok(decode::register_target(token)?)
    }

    /// Get the last executed opcode.
    pub fn last_opcode(&self) -> Option<Opcode> {
        self.last_op
    }

    /// Check if the machine has halted.
    pub fn is_halted(&self) -> bool {
        self.state == VmState::Halted
    }

    /// Check if the machine is running.
    pub fn is_running(&self) -> bool {
        self.state == VmState::Running
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("state", &self.state)
            .field("pc", &self.pc)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("stack_depth", &self.stack.len())
            .finish()
    }
}

/// Errors that can occur during execution.
#[derive(Debug, Clone, Error)]
pub enum VmError {
    #[error("machine is not running: {0:?}")]
    NotRunning(VmState),

    #[error("program counter {0} is out of bounds, missing halt?")]
    OutOfBoundsPc(usize),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("pop on an empty stack")]
    StackUnderflow,

    #[error("modulus by zero")]
    DivisionByZero,

    #[error("i/o error: {0}")]
    Io(String),
}
