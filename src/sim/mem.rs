//! Memory handling for the simulator.
//!
//! This module consists of:
//! - [`MemArray`]: The memory.
//! - [`RegFile`]: The register file.

use crate::ast::{Reg, REG_COUNT};

use super::MEM_SIZE;

/// Memory. This consists of 256 byte cells.
///
/// Indexing takes a `u8`, which always names a cell. The machine narrows
/// an instruction's address operand to `u8` before it touches memory,
/// and skips the instruction if the operand does not fit.
///
/// Wider addresses go through the checked accessors
/// ([`MemArray::get`], [`MemArray::get_mut`], [`MemArray::read_word`]),
/// which return `None` for addresses past the end of memory.
/// Instruction fetch uses [`MemArray::read_word`].
///
/// ```
/// use simple_asm::sim::mem::MemArray;
///
/// let mut mem = MemArray::new();
/// mem[101] = 5;
/// assert_eq!(mem.get(101), Some(5));
/// assert_eq!(mem.get(256), None);
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct MemArray([u8; MEM_SIZE]);
impl MemArray {
    /// Creates a new memory with every cell cleared.
    pub fn new() -> Self {
        Self([0; MEM_SIZE])
    }

    /// Reads the cell at the provided address, if it exists.
    pub fn get(&self, addr: u32) -> Option<u8> {
        let index = usize::try_from(addr).ok()?;
        self.0.get(index).copied()
    }

    /// Gets a mutable reference to the cell at the provided address, if it exists.
    pub fn get_mut(&mut self, addr: u32) -> Option<&mut u8> {
        let index = usize::try_from(addr).ok()?;
        self.0.get_mut(index)
    }

    /// Reads the big-endian word whose first byte is at the provided address.
    ///
    /// This returns `None` unless all 4 of its cells are in memory.
    pub fn read_word(&self, addr: u32) -> Option<u32> {
        let start = usize::try_from(addr).ok()?;
        let bytes = self.0.get(start..start.checked_add(4)?)?;
        <[u8; 4]>::try_from(bytes).ok().map(u32::from_be_bytes)
    }

    /// Copies a memory image into this memory, starting at address 0.
    ///
    /// Bytes past the end of memory are dropped.
    pub fn copy_image(&mut self, image: &[u8]) {
        let len = image.len().min(MEM_SIZE);
        self.0[..len].copy_from_slice(&image[..len]);
    }

    /// Gets an immutable reference to the memory's cells.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Gets a mutable reference to the memory's cells.
    pub fn as_slice_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}
impl Default for MemArray {
    fn default() -> Self {
        Self::new()
    }
}
// Any u8 is a valid address, so these cannot go out of bounds.
impl std::ops::Index<u8> for MemArray {
    type Output = u8;

    fn index(&self, index: u8) -> &Self::Output {
        &self.0[usize::from(index)]
    }
}
impl std::ops::IndexMut<u8> for MemArray {
    fn index_mut(&mut self, index: u8) -> &mut Self::Output {
        &mut self.0[usize::from(index)]
    }
}

/// The register file.
///
/// It can be indexed with a [`Reg`]:
///
/// ```
/// use simple_asm::sim::mem::RegFile;
/// use simple_asm::ast::reg_consts::R0;
///
/// let mut reg = RegFile::new();
/// reg[R0] = 11;
/// assert_eq!(reg[R0], 11);
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub struct RegFile([u32; REG_COUNT]);
impl RegFile {
    /// Creates a register file with every register set to 0.
    pub fn new() -> Self {
        Self([0; REG_COUNT])
    }

    /// The values of all registers, in order.
    pub fn as_array(&self) -> [u32; REG_COUNT] {
        self.0
    }
}
impl std::ops::Index<Reg> for RegFile {
    type Output = u32;

    fn index(&self, index: Reg) -> &Self::Output {
        &self.0[usize::from(index)]
    }
}
impl std::ops::IndexMut<Reg> for RegFile {
    fn index_mut(&mut self, index: Reg) -> &mut Self::Output {
        &mut self.0[usize::from(index)]
    }
}
impl std::fmt::Display for RegFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r0, r1, r2] = self.0;
        write!(f, "[R0={r0}, R1={r1}, R2={r2}]")
    }
}
