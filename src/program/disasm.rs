//! Disassembler for program images.
//!
//! Produces one line per instruction in the form
//! `<address> <mnemonic> <arg1> <arg2> ...`. Arguments render as their
//! literal decimal value or as `r<index>`; when a live register file is
//! supplied (the execution trace), register arguments render as
//! `r<index>=<current value>`.

use crate::machine::decode::{Opcode, Operand};
use crate::machine::registers::Registers;
use crate::machine::Word;

/// Disassemble a token sequence into a static listing.
///
/// Words whose opcode index falls outside the table are treated as
/// data, not instructions: they are skipped by advancing one word.
pub fn disassemble(tokens: &[Word]) -> String {
    let mut output = String::new();
    let mut pc = 0;

    while pc < tokens.len() {
        match Opcode::from_word(tokens[pc]) {
            Ok(op) => {
                output.push_str(&format_instruction(pc, tokens, None));
                output.push('\n');
                pc += op.size();
            }
            Err(_) => pc += 1,
        }
    }

    output
}

/// Format the single instruction at `pc`.
///
/// With a live register file, register arguments carry their current
/// value. The rendering inserts an `=` between the register name and
/// the value (`r1=777`) so the two numbers cannot be misread as one.
pub fn format_instruction(pc: usize, tokens: &[Word], regs: Option<&Registers>) -> String {
    let Some(&raw) = tokens.get(pc) else {
        return format!("{pc} ???");
    };
    let Ok(op) = Opcode::from_word(raw) else {
        return format!("{pc} ??? {raw}");
    };

    let mut line = format!("{} {}", pc, op.mnemonic());
    for offset in 1..op.size() {
        if let Some(&token) = tokens.get(pc + offset) {
            line.push(' ');
            line.push_str(&format_token(token, regs));
        }
    }
    line
}

fn format_token(token: Word, regs: Option<&Registers>) -> String {
    match Operand::decode(token) {
        Ok(Operand::Literal(value)) => value.to_string(),
        Ok(Operand::Register(index)) => match regs {
            Some(regs) => format!("r{}={}", index, regs.get(index)),
            None => format!("r{index}"),
        },
        Err(_) => format!("!{token}"),
    }
}
