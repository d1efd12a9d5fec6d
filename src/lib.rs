//! A parser, assembler, and simulator for a small 32-bit instruction set.
//!
//! The machine has 3 registers, 256 bytes of memory, and 11 instructions.
//! Programs are loaded at address 0 and run over an array of data
//! which is preloaded into memory, leaving their answer in address 150.
//!
//! # Usage
//!
//! To convert source code to an object file, it must be parsed and assembled:
//! ```
//! use simple_asm::parse::parse_ast;
//! use simple_asm::asm::{assemble, ObjectFile};
//!
//! let code = "
//!     LOAD R0, 101
//!     STORE R0, 150
//!     HALT
//! ";
//! let ast = parse_ast(code).unwrap();
//!
//! // Assemble AST into object file:
//! let obj_file: ObjectFile = assemble(ast).unwrap();
//! ```
//!
//! Single instructions can also be encoded directly:
//! ```
//! use simple_asm::asm::encode;
//! use simple_asm::ast::sim::SimInstr;
//!
//! let word = encode("CMP_IND", 0, 2);
//! assert_eq!(SimInstr::decode(word).to_string(), "CMP_IND R0, R2");
//! ```
//!
//! Once an object file has been created, it can be executed with the simulator:
//! ```
//! # // Parsing and assembling was shown in the previous example, so this doesn't need to be shown again.
//! # use simple_asm::parse::parse_ast;
//! # use simple_asm::asm::assemble;
//! #
//! # let code = "LOAD R0, 101\nSTORE R0, 150\nHALT";
//! # let ast = parse_ast(code).unwrap();
//! # let obj_file = assemble(ast).unwrap();
//! #
//! use simple_asm::sim::Machine;
//!
//! let mut machine = Machine::new(Default::default());
//! machine.load_obj_file(&obj_file);
//! machine.run().unwrap(); // <-- Result can be handled accordingly
//! assert_eq!(machine.result(), 5);
//! ```
//!
//! If more granularity is needed for simulation, there are also step and breakpoint functions.
//! See the [`sim`] module for more details.
#![warn(missing_docs)]

pub mod parse;
pub mod ast;
pub mod asm;
pub mod sim;
pub mod err;
