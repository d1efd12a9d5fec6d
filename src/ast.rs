//! Components relating to the abstract syntax trees (ASTs)
//! used in representing instructions.
//!
//! These components together are used to construct...
//! - [`asm::AsmInstr`] (a mnemonic triple, the assembler's source-level instruction),
//! - [`asm::Stmt`] (a mnemonic triple with its location in source code),
//! - and [`sim::SimInstr`] (a decoded 32-bit instruction word).

pub mod asm;
pub mod sim;

/// The number of general purpose registers in the machine.
pub const REG_COUNT: usize = 3;

/// A register. Must be between 0 and 2.
///
/// Instruction words carry 4-bit register fields, so a decoded word can
/// name registers that do not exist (`R3`-`R15`). Those fields only become
/// a `Reg` after passing the range check in [`Reg::new`].
///
/// ## Examples
///
/// ```text
/// LOAD R0, 101
///      ~~
/// CMP_IND R1, R2
///         ~~  ~~
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Reg(pub(crate) u8);

/// Register constants!
pub mod reg_consts {
    use super::Reg;

    /// The 0th register in the register file.
    pub const R0: Reg = Reg(0);
    /// The 1st register in the register file.
    pub const R1: Reg = Reg(1);
    /// The 2nd register in the register file.
    pub const R2: Reg = Reg(2);
}
impl Reg {
    /// Creates a register from its index, returning `None` if
    /// the index does not name one of the machine's registers.
    pub fn new(index: u16) -> Option<Self> {
        match usize::from(index) < REG_COUNT {
            true  => Some(Reg(index as u8)),
            false => None,
        }
    }

    /// Gets the register number of this [`Reg`]. This is always between 0 and 2.
    pub fn reg_no(self) -> u8 {
        self.0
    }
}
impl std::fmt::Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}", self.0)
    }
}
impl From<Reg> for usize {
    // Used for indexing the reg file in [`crate::sim::mem::RegFile`].
    fn from(value: Reg) -> Self {
        usize::from(value.0)
    }
}

/// An unsigned bit field of an instruction word.
///
/// `N` indicates the bit size of this field. Instruction words use
/// `Field<16>` for the literal and `Field<4>` for the opcode-independent
/// register fields (`dest`, `op1`, `op2`).
///
/// ## Examples
///
/// ```
/// # use simple_asm::ast::Field;
/// #
/// let lit = Field::<16>::new(101);
/// let reg = Field::<4>::new(16);
/// assert!(lit.is_ok());
/// assert!(reg.is_err());
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub struct Field<const N: u32>(u16);

/// The errors that can result from calling [`Field::new`].
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum FieldNewErr {
    /// The provided value cannot fit an unsigned integer of the given bitsize.
    CannotFit(u32)
}
impl std::fmt::Display for FieldNewErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldNewErr::CannotFit(n) => write!(f, "value is too big for unsigned {n}-bit field"),
        }
    }
}
impl std::error::Error for FieldNewErr {}
impl crate::err::Error for FieldNewErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            FieldNewErr::CannotFit(n) => Some(format!("the range for an unsigned {n}-bit field is [0, {}]", (1u32 << n) - 1).into()),
        }
    }
}

impl<const N: u32> Field<N> {
    const MASK: u64 = (1 << N) - 1;

    /// Creates a new field value.
    /// This must fit within `N` bits, otherwise an error is raised.
    ///
    /// # Panics
    ///
    /// This will panic if `N` is larger than 16.
    pub fn new(n: i64) -> Result<Self, FieldNewErr> {
        assert!(N <= 16, "bit size {N} exceeds size of backing (16)");
        match (0..=Self::MASK as i64).contains(&n) {
            true  => Ok(Field(n as u16)),
            false => Err(FieldNewErr::CannotFit(N)),
        }
    }

    /// Creates a new field by keeping the low `N` bits of the integer
    /// and discarding the rest.
    ///
    /// Negative values are taken in two's complement before masking,
    /// so `-1` becomes a field of all ones.
    ///
    /// This is the encoder's lossy path: out-of-range operands are
    /// truncated to whatever a real fixed-width field would hold.
    ///
    /// ```
    /// # use simple_asm::ast::Field;
    /// #
    /// assert_eq!(Field::<4>::new_trunc(5).get(), 5);
    /// assert_eq!(Field::<4>::new_trunc(17).get(), 1);
    /// assert_eq!(Field::<16>::new_trunc(-1).get(), 0xFFFF);
    /// ```
    pub fn new_trunc(n: i64) -> Self {
        assert!(N <= 16, "bit size {N} exceeds size of backing (16)");
        Field(((n as u64) & Self::MASK) as u16)
    }

    /// Gets the value of the field.
    pub fn get(&self) -> u16 {
        self.0
    }
}
impl<const N: u32> std::fmt::Display for Field<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

macro_rules! opcode_table {
    ($($name:ident = $value:literal => $mnemonic:literal),+ $(,)?) => {
        /// The operation selected by the 4-bit `cmdtype` field of an instruction word.
        ///
        /// | opcode | mnemonic |
        /// |--------|----------|
        $(
            #[doc = concat!("| `", stringify!($value), "` | `", $mnemonic, "` |")]
        )+
        ///
        /// Every other 4-bit value decodes to [`Opcode::Unknown`],
        /// which keeps the raw value so that it can be reported.
        #[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
        pub enum Opcode {
            $(
                #[allow(missing_docs)]
                $name
            ),+,
            /// An opcode with no mnemonic. Holds the raw 4-bit value.
            Unknown(u8)
        }

        impl Opcode {
            /// Decodes an opcode from the low 4 bits of `bits`.
            pub fn from_bits(bits: u8) -> Self {
                match bits & 0xF {
                    $($value => Self::$name),+,
                    b => Self::Unknown(b)
                }
            }

            /// The 4-bit value of this opcode.
            pub fn bits(self) -> u8 {
                match self {
                    $(Self::$name => $value),+,
                    Self::Unknown(b) => b & 0xF
                }
            }

            /// The mnemonic of this opcode (`"UNKNOWN"` for unmapped opcodes).
            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Self::$name => $mnemonic),+,
                    Self::Unknown(_) => "UNKNOWN"
                }
            }

            /// Looks up the opcode of a mnemonic.
            ///
            /// The lookup is exact (case-sensitive) and returns `None`
            /// for anything outside of the table, including `"UNKNOWN"`.
            pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
                match mnemonic {
                    $($mnemonic => Some(Self::$name)),+,
                    _ => None
                }
            }
        }
    }
}
opcode_table! {
    Load      = 0x1 => "LOAD",
    LoadInd   = 0x2 => "LOAD_IND",
    Store     = 0x3 => "STORE",
    StoreInd  = 0x4 => "STORE_IND",
    CmpInd    = 0x5 => "CMP_IND",
    Increment = 0x6 => "INCREMENT",
    Decrement = 0x7 => "DECREMENT",
    Jump      = 0x8 => "JUMP",
    Jz        = 0x9 => "JZ",
    Nop       = 0xE => "NOP",
    Halt      = 0xF => "HALT",
}

impl Opcode {
    /// Every opcode with a mnemonic, in table order.
    pub const ALL: [Opcode; 11] = [
        Opcode::Load, Opcode::LoadInd, Opcode::Store, Opcode::StoreInd,
        Opcode::CmpInd, Opcode::Increment, Opcode::Decrement, Opcode::Jump,
        Opcode::Jz, Opcode::Nop, Opcode::Halt,
    ];

    /// The opcode an unrecognized mnemonic assembles to.
    pub const UNMAPPED: Opcode = Opcode::Unknown(0x0);

    /// Looks up the opcode of a mnemonic, falling back to
    /// [`Opcode::UNMAPPED`] if it is not in the table.
    pub fn from_mnemonic_or_unmapped(mnemonic: &str) -> Self {
        Self::from_mnemonic(mnemonic).unwrap_or(Self::UNMAPPED)
    }
}
impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
