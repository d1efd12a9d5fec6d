//! This module is used for holding simulation instructions ([`SimInstr`]),
//! which are instructions that directly map to bytecode.
//!
//! Every instruction word has the same layout:
//!
//! | field     | bits  | width |
//! |-----------|-------|-------|
//! | `cmdtype` | 31-28 | 4     |
//! | `literal` | 27-12 | 16    |
//! | `dest`    | 11-8  | 4     |
//! | `op1`     | 7-4   | 4     |
//! | `op2`     | 3-0   | 4     |
//!
//! Which of these fields an opcode actually reads is decided by its addressing mode
//! (see [`AsmInstr::into_sim_instr`]).
//!
//! [`AsmInstr::into_sim_instr`]: crate::ast::asm::AsmInstr::into_sim_instr

use super::{Field, Opcode};

const OPCODE_SHIFT: u32  = 28;
const LITERAL_SHIFT: u32 = 12;
const DEST_SHIFT: u32    = 8;
const OP1_SHIFT: u32     = 4;
const OP2_SHIFT: u32     = 0;

/// A decoded instruction word.
///
/// Unlike assembly instructions, this keeps every field of the word,
/// including the ones the opcode does not use.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct SimInstr {
    /// The operation to perform.
    pub opcode: Opcode,
    /// The 16-bit immediate: a memory address or a jump target word index.
    pub literal: Field<16>,
    /// Destination (or source, for stores) register index.
    pub dest: Field<4>,
    /// Reserved. Decoded and re-encoded, but never read by any opcode.
    pub op1: Field<4>,
    /// Register index holding an indirect address or a test value.
    pub op2: Field<4>,
}

impl SimInstr {
    /// Creates an instruction with every operand field cleared.
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            literal: Field::default(),
            dest: Field::default(),
            op1: Field::default(),
            op2: Field::default(),
        }
    }

    /// Packs this instruction into a 32-bit word.
    pub fn encode(&self) -> u32 {
        (u32::from(self.opcode.bits())  << OPCODE_SHIFT)
        | (u32::from(self.literal.get()) << LITERAL_SHIFT)
        | (u32::from(self.dest.get())    << DEST_SHIFT)
        | (u32::from(self.op1.get())     << OP1_SHIFT)
        | (u32::from(self.op2.get())     << OP2_SHIFT)
    }

    /// Unpacks a 32-bit word into an instruction.
    ///
    /// This never fails: opcodes with no mnemonic decode to [`Opcode::Unknown`].
    pub fn decode(word: u32) -> Self {
        Self {
            opcode:  Opcode::from_bits((word >> OPCODE_SHIFT) as u8),
            literal: Field::new_trunc(i64::from(word >> LITERAL_SHIFT)),
            dest:    Field::new_trunc(i64::from(word >> DEST_SHIFT)),
            op1:     Field::new_trunc(i64::from(word >> OP1_SHIFT)),
            op2:     Field::new_trunc(i64::from(word >> OP2_SHIFT)),
        }
    }

    /// The byte address a jump to `literal` lands on.
    pub fn jump_target(&self) -> u32 {
        u32::from(self.literal.get()) * 4
    }
}

impl std::fmt::Display for SimInstr {
    /// Disassembles the instruction, showing only the fields its opcode uses.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self { opcode, literal, dest, op1: _, op2 } = *self;
        match opcode {
            Opcode::Load | Opcode::Store => write!(f, "{opcode} R{dest}, {literal}"),
            Opcode::LoadInd | Opcode::StoreInd | Opcode::CmpInd => write!(f, "{opcode} R{dest}, R{op2}"),
            Opcode::Increment | Opcode::Decrement => write!(f, "{opcode} R{dest}"),
            Opcode::Jump => write!(f, "{opcode} {literal}"),
            Opcode::Jz => write!(f, "{opcode} {literal}, R{op2}"),
            Opcode::Nop | Opcode::Halt => write!(f, "{opcode}"),
            Opcode::Unknown(b) => write!(f, "{opcode} (0x{b:X})"),
        }
    }
}
