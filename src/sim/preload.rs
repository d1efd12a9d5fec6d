//! The data region programs operate on.
//!
//! Before a program is loaded, the machine's memory is seeded with an array of values
//! and a small header describing it:
//!
//! | address            | contents                          |
//! |--------------------|-----------------------------------|
//! | [`DATA_PTR_ADDR`]  | the array's base address (101)    |
//! | [`DATA_LEN_ADDR`]  | the number of values in the array |
//! | [`DATA_BASE_ADDR`].. | the values                      |
//! | [`RESULT_ADDR`]    | [`RESULT_SENTINEL`]               |
//!
//! Programs are expected to leave their answer in [`RESULT_ADDR`].
//!
//! [`RESULT_ADDR`]: super::RESULT_ADDR

use std::ops::Range;

use super::mem::MemArray;
use super::RESULT_ADDR;

/// The address holding the base address of the array.
pub const DATA_PTR_ADDR: u8 = 99;
/// The address holding the number of values in the array.
pub const DATA_LEN_ADDR: u8 = 100;
/// The address of the array's first value.
pub const DATA_BASE_ADDR: u8 = 101;
/// The value of [`RESULT_ADDR`] before a program writes to it (-1 as a byte).
///
/// [`RESULT_ADDR`]: super::RESULT_ADDR
pub const RESULT_SENTINEL: u8 = 0xFF;
/// The array loaded by [`DataPreload::default`].
pub const DEFAULT_DATA: [u8; 15] = [5, 1, 9, 15, 3, 80, 2, 11, 21, 6, 10, 50, 60, 75, 100];

/// The largest array that fits between [`DATA_BASE_ADDR`] and [`RESULT_ADDR`].
///
/// [`RESULT_ADDR`]: super::RESULT_ADDR
pub const MAX_DATA_LEN: usize = (RESULT_ADDR - DATA_BASE_ADDR) as usize;

/// Errors from creating a [`DataPreload`].
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum PreloadErr {
    /// The array would run into the result cell. Holds the length of the array.
    TooManyValues(usize),
}
impl std::fmt::Display for PreloadErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreloadErr::TooManyValues(n) => write!(f, "data array of {n} values does not fit before the result cell"),
        }
    }
}
impl std::error::Error for PreloadErr {}
impl crate::err::Error for PreloadErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            PreloadErr::TooManyValues(_) => Some(format!("the data array can hold at most {MAX_DATA_LEN} values").into()),
        }
    }
}

/// An array of values to seed memory with.
///
/// ```
/// use simple_asm::sim::mem::MemArray;
/// use simple_asm::sim::preload::DataPreload;
///
/// let preload = DataPreload::new(vec![3, 1, 2]).unwrap();
/// let mut mem = MemArray::new();
/// preload.apply(&mut mem);
///
/// assert_eq!(mem[99], 101);
/// assert_eq!(mem[100], 3);
/// assert_eq!(&mem.as_slice()[101..104], [3, 1, 2]);
/// assert_eq!(mem[150], 0xFF);
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct DataPreload {
    values: Vec<u8>
}
impl DataPreload {
    /// Creates a preload out of an array of values.
    ///
    /// This errors if the array has more than [`MAX_DATA_LEN`] values.
    pub fn new(values: Vec<u8>) -> Result<Self, PreloadErr> {
        match values.len() <= MAX_DATA_LEN {
            true  => Ok(Self { values }),
            false => Err(PreloadErr::TooManyValues(values.len())),
        }
    }

    /// The values of the array.
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// The memory range the array occupies.
    pub fn data_range(&self) -> Range<usize> {
        let start = usize::from(DATA_BASE_ADDR);
        start..start + self.values.len()
    }

    /// Writes the array, its header, and the result sentinel into memory.
    pub fn apply(&self, mem: &mut MemArray) {
        // MAX_DATA_LEN < 256, so the length fits a cell
        mem[DATA_PTR_ADDR] = DATA_BASE_ADDR;
        mem[DATA_LEN_ADDR] = self.values.len() as u8;
        mem.as_slice_mut()[self.data_range()].copy_from_slice(&self.values);
        mem[RESULT_ADDR] = RESULT_SENTINEL;
    }
}
impl Default for DataPreload {
    fn default() -> Self {
        Self { values: DEFAULT_DATA.to_vec() }
    }
}
