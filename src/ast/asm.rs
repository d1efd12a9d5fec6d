//! This module holds assembly instructions ([`AsmInstr`]) and statements ([`Stmt`]).
//!
//! An assembly instruction is the assembler's source-level representation of one
//! instruction: a mnemonic triple `(mnemonic, operand1, operand2)`. The operands are plain
//! integers; whether each one is a register index or an immediate is decided by
//! the opcode's addressing mode when the instruction is encoded.

use std::ops::Range;

use super::Opcode;

/// A mnemonic triple.
///
/// ## Examples
///
/// ```text
/// LOAD R0, 101       => (LOAD, 0, 101)
/// STORE_IND R1, R2   => (STORE_IND, 1, 2)
/// JZ 5, R1           => (JZ, 5, 1)
/// HALT               => (HALT, 0, 0)
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct AsmInstr {
    /// The instruction's opcode. Mnemonics outside of the table are [`Opcode::UNMAPPED`].
    pub opcode: Opcode,
    /// First operand (0 if absent).
    pub operand1: i64,
    /// Second operand (0 if absent).
    pub operand2: i64,
}
impl AsmInstr {
    /// Creates an instruction from a mnemonic and its operands.
    ///
    /// Unknown mnemonics are accepted and become [`Opcode::UNMAPPED`].
    ///
    /// ```
    /// use simple_asm::ast::Opcode;
    /// use simple_asm::ast::asm::AsmInstr;
    ///
    /// assert_eq!(AsmInstr::new("LOAD", 0, 101).opcode, Opcode::Load);
    /// assert_eq!(AsmInstr::new("ADD", 1, 2).opcode, Opcode::Unknown(0));
    /// ```
    pub fn new(mnemonic: &str, operand1: i64, operand2: i64) -> Self {
        Self::from_opcode(Opcode::from_mnemonic_or_unmapped(mnemonic), operand1, operand2)
    }

    /// Creates an instruction from an already resolved opcode.
    pub fn from_opcode(opcode: Opcode, operand1: i64, operand2: i64) -> Self {
        Self { opcode, operand1, operand2 }
    }
}
impl std::fmt::Display for AsmInstr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.opcode, self.operand1, self.operand2)
    }
}
impl From<(&str, i64, i64)> for AsmInstr {
    fn from((mnemonic, operand1, operand2): (&str, i64, i64)) -> Self {
        AsmInstr::new(mnemonic, operand1, operand2)
    }
}

/// A line of assembly source: an instruction together with
/// the span of source code it was parsed from.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Stmt {
    /// The instruction.
    pub instr: AsmInstr,
    /// The span in source code.
    pub span: Range<usize>
}
impl From<AsmInstr> for Stmt {
    /// Wraps an instruction that did not come from source code.
    fn from(instr: AsmInstr) -> Self {
        Stmt { instr, span: 0..0 }
    }
}
