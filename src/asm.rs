//! Assembling assembly source ASTs into object files.
//!
//! This module is used to convert source ASTs (`Vec<`[`Stmt`]`>`) into object files
//! that can be executed by the simulator.
//!
//! The assembler module notably consists of:
//! - [`encode`]: encodes a single mnemonic triple into an instruction word
//! - [`assemble`]: the main function which assembles the statements into an object file
//! - [`ObjectFile`]: a struct holding the object file, which can be loaded into the simulator and executed
//!
//! [`Stmt`]: crate::ast::asm::Stmt

pub mod encoding;

use crate::ast::asm::{AsmInstr, Stmt};
use crate::ast::sim::SimInstr;
use crate::ast::{Field, Opcode};
use crate::err::ErrSpan;
use crate::sim::MEM_SIZE;

/// The largest number of instruction words that fit in memory.
pub const MAX_PROGRAM_WORDS: usize = MEM_SIZE / 4;

/// Encodes a mnemonic triple into a 32-bit instruction word.
///
/// Operands are placed into the word's fields according to the mnemonic's
/// addressing mode (see [`AsmInstr::into_sim_instr`]).
/// Unknown mnemonics encode with opcode 0.
///
/// # Example
/// ```
/// use simple_asm::asm::encode;
///
/// assert_eq!(encode("LOAD", 0, 101), 0x1006_5000);
/// assert_eq!(encode("JZ", 5, 1),     0x9000_5001);
/// assert_eq!(encode("HALT", 0, 0),   0xF000_0000);
/// assert_eq!(encode("ADD", 1, 2),    0x0000_0000);
/// ```
pub fn encode(mnemonic: &str, operand1: i64, operand2: i64) -> u32 {
    AsmInstr::new(mnemonic, operand1, operand2)
        .into_sim_instr()
        .encode()
}

/// Assembles a assembly source code AST into an object file.
///
/// # Example
/// ```
/// use simple_asm::parse::parse_ast;
/// use simple_asm::asm::assemble;
///
/// let src = "
///     LOAD R0, 101
///     HALT
/// ";
/// let ast = parse_ast(src).unwrap();
///
/// let obj_file = assemble(ast).unwrap();
/// assert_eq!(obj_file.words(), [0x1006_5000, 0xF000_0000]);
/// ```
pub fn assemble(ast: Vec<Stmt>) -> Result<ObjectFile, AsmErr> {
    if let Some(stmt) = ast.get(MAX_PROGRAM_WORDS) {
        return Err(AsmErr::new(AsmErrKind::ProgramTooLarge(ast.len()), Some(stmt.span.clone())));
    }

    let words: Vec<_> = ast.into_iter()
        .map(|stmt| stmt.instr.into_sim_instr().encode())
        .collect();

    tracing::info!(words = words.len(), "assembled program");
    Ok(ObjectFile { words })
}

/// Assembles instructions which did not come from source code into an object file.
///
/// Errors from this function carry no span.
///
/// ```
/// use simple_asm::asm::assemble_instrs;
/// use simple_asm::ast::asm::AsmInstr;
///
/// let obj_file = assemble_instrs([
///     AsmInstr::new("INCREMENT", 1, 0),
///     AsmInstr::new("HALT", 0, 0),
/// ]).unwrap();
/// assert_eq!(obj_file.len(), 2);
/// ```
pub fn assemble_instrs(instrs: impl IntoIterator<Item=AsmInstr>) -> Result<ObjectFile, AsmErr> {
    let ast = instrs.into_iter().map(Stmt::from).collect();
    assemble(ast).map_err(|e| AsmErr { span: None, ..e })
}

/// Kinds of errors that can occur from assembling given assembly code.
///
/// See [`AsmErr`] for this error type with span information included.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum AsmErrKind {
    /// The program has more instructions than memory can hold.
    /// Holds the number of instructions in the program.
    ProgramTooLarge(usize),
}
impl std::fmt::Display for AsmErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProgramTooLarge(n) => write!(f, "program has {n} instructions, which do not fit in memory"),
        }
    }
}

/// Error from assembling given assembly code.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AsmErr {
    /// The value with a span.
    pub kind: AsmErrKind,
    /// The span in the source associated with this value, if the program came from source code.
    pub span: Option<ErrSpan>
}
impl AsmErr {
    /// Creates a new [`AsmErr`].
    pub fn new<E: Into<ErrSpan>>(kind: AsmErrKind, span: Option<E>) -> Self {
        AsmErr { kind, span: span.map(Into::into) }
    }
}
impl std::fmt::Display for AsmErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}
impl std::error::Error for AsmErr {}
impl crate::err::Error for AsmErr {
    fn span(&self) -> Option<crate::err::ErrSpan> {
        self.span.clone()
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match &self.kind {
            AsmErrKind::ProgramTooLarge(_) => Some(format!("programs can have at most {MAX_PROGRAM_WORDS} instructions").into()),
        }
    }
}

impl AsmInstr {
    /// Converts an ASM instruction into a simulator instruction ([`SimInstr`])
    /// by placing each operand in the field its addressing mode calls for.
    ///
    /// | mnemonic                          | `operand1` | `operand2` |
    /// |-----------------------------------|------------|------------|
    /// | `LOAD`, `STORE`                   | `dest`     | `literal`  |
    /// | `LOAD_IND`, `STORE_IND`, `CMP_IND`| `dest`     | `op2`      |
    /// | `INCREMENT`, `DECREMENT`          | `dest`     | -          |
    /// | `JUMP`                            | `literal`  | -          |
    /// | `JZ`                              | `literal`  | `op2`      |
    /// | `NOP`, `HALT`, unknown            | -          | -          |
    ///
    /// Operands that do not fit their field are truncated to the field's width:
    /// the literal keeps its low 16 bits and register fields keep their low 4 bits.
    /// The reserved `op1` field is always 0.
    pub fn into_sim_instr(self) -> SimInstr {
        let AsmInstr { opcode, operand1, operand2 } = self;
        let mut instr = SimInstr::new(opcode);

        match opcode {
            Opcode::Load | Opcode::Store => {
                instr.dest = trunc_field(opcode, operand1);
                instr.literal = trunc_field(opcode, operand2);
            },
            Opcode::LoadInd | Opcode::StoreInd | Opcode::CmpInd => {
                instr.dest = trunc_field(opcode, operand1);
                instr.op2 = trunc_field(opcode, operand2);
            },
            Opcode::Increment | Opcode::Decrement => {
                instr.dest = trunc_field(opcode, operand1);
            },
            Opcode::Jump => {
                instr.literal = trunc_field(opcode, operand1);
            },
            Opcode::Jz => {
                instr.literal = trunc_field(opcode, operand1);
                instr.op2 = trunc_field(opcode, operand2);
            },
            Opcode::Nop | Opcode::Halt | Opcode::Unknown(_) => {},
        }

        instr
    }
}
fn trunc_field<const N: u32>(opcode: Opcode, n: i64) -> Field<N> {
    if let Err(e) = Field::<N>::new(n) {
        tracing::debug!(%opcode, operand = n, "{e}, truncating");
    }
    Field::new_trunc(n)
}

/// An object file.
///
/// This is the final product after assembly source code is fully assembled.
/// This can be loaded in the simulator to run the assembled code.
///
/// An object file holds at most [`MAX_PROGRAM_WORDS`] words,
/// so it always fits in the simulator's memory.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Default)]
pub struct ObjectFile {
    words: Vec<u32>
}
impl ObjectFile {
    /// Creates an empty object file.
    pub fn empty() -> Self {
        ObjectFile { words: vec![] }
    }

    /// Creates an object file out of already encoded words,
    /// returning `None` if they would not fit in memory.
    pub(crate) fn from_words(words: Vec<u32>) -> Option<Self> {
        (words.len() <= MAX_PROGRAM_WORDS).then_some(ObjectFile { words })
    }

    /// The instruction words of this object file, in load order.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// The number of instruction words in this object file.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether this object file has no instructions.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Gets an iterator over each word and the memory address it is loaded at.
    pub fn addr_iter(&self) -> impl Iterator<Item=(u32, u32)> + '_ {
        (0..).step_by(4).zip(self.words.iter().copied())
    }

    /// Gets an iterator over the decoded instructions of this object file.
    pub fn instr_iter(&self) -> impl Iterator<Item=SimInstr> + '_ {
        self.words.iter().copied().map(SimInstr::decode)
    }

    /// The memory image of this object file: each word in big-endian byte order.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.words.iter()
            .flat_map(|w| w.to_be_bytes())
            .collect()
    }
}
