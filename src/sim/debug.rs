//! Breakpoints for pausing a [`Machine`] mid-run.
//!
//! A [`Breakpoint`] is added to [`Machine::breakpoints`]. The machine checks every
//! breakpoint after each instruction it executes and stops with
//! [`StopReason::Breakpoint`] once any of them match.
//!
//! [`StopReason::Breakpoint`]: super::StopReason::Breakpoint
use std::fmt;

use crate::ast::Reg;

use super::Machine;

/// A condition which stops a running [`Machine`].
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Breakpoint {
    /// Break once the next instruction to execute is at this address.
    PC(u32),

    /// Break once the register holds a value matching the comparator.
    Reg {
        /// Register to check.
        reg: Reg,
        /// Predicate on the register's value.
        value: Comparator
    },

    /// Break when a `STORE` or `STORE_IND` writes a value matching the comparator to this address.
    ///
    /// The cell is only checked on the step that writes to it,
    /// so data which is already in memory never triggers this breakpoint.
    Mem {
        /// Address to watch.
        addr: u8,
        /// Predicate on the stored byte.
        value: Comparator
    },
}

impl Breakpoint {
    /// Checks if the machine should break in its current state.
    pub fn check(&self, machine: &Machine) -> bool {
        match *self {
            Breakpoint::PC(addr) => machine.pc == addr,
            Breakpoint::Reg { reg, value } => value.check(machine.reg_file[reg]),
            Breakpoint::Mem { addr, value } => {
                machine.last_write() == Some(addr) && value.check(u32::from(machine.mem[addr]))
            },
        }
    }
}
impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Breakpoint::PC(addr) => write!(f, "PC == {addr}"),
            Breakpoint::Reg { reg, value } => write!(f, "{reg} {value}"),
            Breakpoint::Mem { addr, value } => write!(f, "store to mem[{addr}] {value}"),
        }
    }
}

/// A predicate comparing a value against a constant.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Comparator {
    /// Matches values less than the constant.
    Lt(u32),
    /// Matches values less than or equal to the constant.
    Le(u32),
    /// Matches values equal to the constant.
    Eq(u32),
    /// Matches values not equal to the constant.
    Ne(u32),
    /// Matches values greater than the constant.
    Gt(u32),
    /// Matches values greater than or equal to the constant.
    Ge(u32),
}
impl Comparator {
    /// Checks if the value matches.
    pub fn check(self, value: u32) -> bool {
        match self {
            Comparator::Lt(c) => value < c,
            Comparator::Le(c) => value <= c,
            Comparator::Eq(c) => value == c,
            Comparator::Ne(c) => value != c,
            Comparator::Gt(c) => value > c,
            Comparator::Ge(c) => value >= c,
        }
    }
}
impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sym, c) = match *self {
            Comparator::Lt(c) => ("<", c),
            Comparator::Le(c) => ("<=", c),
            Comparator::Eq(c) => ("==", c),
            Comparator::Ne(c) => ("!=", c),
            Comparator::Gt(c) => (">", c),
            Comparator::Ge(c) => (">=", c),
        };
        write!(f, "{sym} {c}")
    }
}
