//! Formatters which can read and write memory object files into disk.
//!
//! The [`ObjFileFormat`] trait describes an implementation of reading/writing object files into disk.
//! This module provides an implementation of the trait:
//! - [`BinaryFormat`]: A binary representation of object file data
//! - [`TextFormat`]: A text representation of object file data

use crate::ast::sim::SimInstr;

use super::ObjectFile;

/// A trait defining object file formats.
pub trait ObjFileFormat {
    /// Representation of the serialized format.
    ///
    /// For binary formats, `[u8]` should be used.
    /// For text-based formats,`str` should be used.
    type Stream: ToOwned + ?Sized;
    /// Serializes into the stream format.
    fn serialize(o: &ObjectFile) -> <Self::Stream as ToOwned>::Owned;
    /// Deserializes from the stream format, returning `None`
    /// if an error occurred during deserialization.
    fn deserialize(i: &Self::Stream) -> Option<ObjectFile>;
}

// BINARY!
/// A binary format of object file data.
pub struct BinaryFormat;

/// The magic number which starts every binary object file.
pub const BFMT_MAGIC: &[u8] = b"sasm";
const BFMT_VER: &[u8] = b"\x00\x01";
impl ObjFileFormat for BinaryFormat {
    type Stream = [u8];

    fn serialize(o: &ObjectFile) -> <Self::Stream as ToOwned>::Owned {
        // Object file specification:
        //
        // The header consists of:
        // - The magic number (b"sasm")
        // - The version (2 bytes)
        //
        // The body consists of:
        // - the number of words (2 bytes, big-endian)
        // - the words (4n bytes, each big-endian)
        //
        // Words are stored exactly as they are laid out in simulator memory.
        let mut bytes = BFMT_MAGIC.to_vec();
        bytes.extend_from_slice(BFMT_VER);

        // ObjectFile holds at most 64 words, so this cannot truncate.
        bytes.extend(u16::to_be_bytes(o.len() as u16));
        bytes.extend(o.to_bytes());

        bytes
    }

    fn deserialize(mut vec: &Self::Stream) -> Option<ObjectFile> {
        vec = vec.strip_prefix(BFMT_MAGIC)?
            .strip_prefix(BFMT_VER)?;

        let len = u16::from_be_bytes(take::<2>(&mut vec)?);
        let words = take_slice(&mut vec, 4 * usize::from(len))?
            .chunks_exact(4)
            .map(|c| <[u8; 4]>::try_from(c).ok().map(u32::from_be_bytes))
            .collect::<Option<_>>()?;

        // Trailing data is not part of the format.
        if !vec.is_empty() { return None; }
        ObjectFile::from_words(words)
    }
}

fn take<const N: usize>(data: &mut &[u8]) -> Option<[u8; N]> {
    take_slice(data, N)
        .and_then(|slice| <[_; N]>::try_from(slice).ok())
}
fn take_slice<'a>(data: &mut &'a [u8], n: usize) -> Option<&'a [u8]> {
    if n > data.len() { return None; }
    let (left, right) = data.split_at(n);
    *data = right;
    Some(left)
}

// TEXT!
/// A text-based format of object file data.
pub struct TextFormat;

const TFMT_MAGIC: &str = "SIMPLE-ASM OBJ FILE";

impl ObjFileFormat for TextFormat {
    type Stream = str;

    fn serialize(o: &ObjectFile) -> <Self::Stream as ToOwned>::Owned {
        // Text format specification.
        //
        // ```text
        // SIMPLE-ASM OBJ FILE
        // <instruction in hex>
        // <...>
        // // Support for comments, as well.
        // ```
        //
        // Each instruction is written as 8 uppercase hex digits,
        // followed by a comment holding its disassembly.
        let mut buf = String::new();
        buf.push_str(TFMT_MAGIC);
        buf.push('\n');

        for (addr, word) in o.addr_iter() {
            buf.push_str(&format!("{word:08X} // {addr:3}: {}\n", SimInstr::decode(word)));
        }

        buf
    }

    fn deserialize(string: &Self::Stream) -> Option<ObjectFile> {
        // Read all of the non-empty lines:
        let mut lines = string.lines()
            .map(|l| {
                l.split_once("//").map_or(l, |(left, _)| left) // remove comments
            })
            .map(str::trim)
            .filter(|l| !l.is_empty());
        if lines.next() != Some(TFMT_MAGIC) { return None };

        let words = lines.map(hex2u32).collect::<Option<_>>()?;
        ObjectFile::from_words(words)
    }
}

fn hex2u32(s: &str) -> Option<u32> {
    match s.len() == 8 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
        true => u32::from_str_radix(s, 16).ok(),
        false => None
    }
}
