//! Tokenizing assembly source.
//!
//! This module holds the tokens that characterize the assembly text format ([`Token`]).
//! This module is used by the parser to facilitate the conversion of
//! assembly source code into statements.
//!
//! The module's key data structure is the [`Token`] enum,
//! which lists all of the tokens of the assembly text format.

use std::num::IntErrorKind;

use logos::{Lexer, Logos};

use crate::ast::Opcode;

/// A unit of information in assembly source code.
#[derive(Debug, Logos, PartialEq, Eq)]
#[logos(skip r"[ \t]+", error = LexErr)]
pub enum Token {
    // Like the register regex, these regexes span over tokens that are technically invalid
    // (e.g., 23trst matches for a decimal even though it shouldn't).
    // This is intended.
    // These regexes collect what would be considered one discernable unit
    // and validates it using the validator function.

    /// An integer value (e.g., `9`, `-9`, `#14`, `0x7F`, etc.)
    #[regex(r"-?\d\w*", lex_dec)]
    #[regex(r"#-?\w*", lex_dec)]
    #[regex(r"-?0[Xx]\w*", lex_hex)]
    Int(i64),

    /// A register index (e.g., `R0`, `r2`).
    ///
    /// Any index is accepted here, even ones past `R2` or negative ones like `R-1`.
    /// The assembler masks the index to the register field,
    /// and instructions that name a nonexistent register are skipped at runtime.
    #[regex(r"[Rr]-?\d+", lex_reg)]
    Reg(i64),

    /// An identifier (in practice, a mnemonic like `LOAD` or `HALT`).
    ///
    /// This token type is case-insensitive.
    #[regex(r"[A-Za-z_]\w*", |lx| lx.slice().parse::<Ident>().unwrap_or_else(|e| match e {}))]
    Ident(Ident),

    /// A comma, which delineate operands of an instruction
    #[token(",")]
    Comma,

    /// A comment, which starts with a semicolon and spans the remaining part of the line.
    #[regex(r";.*")]
    Comment,

    /// A new line
    #[regex(r"\r?\n")]
    NewLine
}

/// An identifier.
///
/// Mnemonics in the opcode table are recognized regardless of case.
/// Every other identifier is kept as written: the assembler turns those into
/// [`Opcode::UNMAPPED`] rather than rejecting them.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Ident {
    /// A known mnemonic.
    Mnemonic(Opcode),
    /// Any other identifier.
    Other(String)
}
impl Ident {
    /// The opcode this identifier assembles to.
    pub fn opcode(&self) -> Opcode {
        match self {
            Ident::Mnemonic(op) => *op,
            Ident::Other(_) => Opcode::UNMAPPED,
        }
    }
}
impl std::str::FromStr for Ident {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Opcode::from_mnemonic(&s.to_uppercase()) {
            Some(op) => Ok(Ident::Mnemonic(op)),
            None => Ok(Ident::Other(s.to_string())),
        }
    }
}
impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ident::Mnemonic(op) => op.fmt(f),
            Ident::Other(id) => f.write_str(id),
        }
    }
}

/// Any errors raised in attempting to tokenize an input stream.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum LexErr {
    /// Numeric literal cannot fit within the range of an i64
    DoesNotFitI64,
    /// Hex literal (starting with 0x) has invalid hex digits
    InvalidHex,
    /// Numeric literal could not be parsed as a decimal literal because it has invalid digits (i.e., not 0-9)
    InvalidNumeric,
    /// Hex literal (starting with 0x) doesn't have digits after it.
    InvalidHexEmpty,
    /// Numeric literal could not be parsed as a decimal literal because there are no digits in it (it's just # or #-)
    InvalidDecEmpty,
    /// Int parsing failed but the reason why is unknown
    UnknownIntErr,
    /// Token had the format R\d+, but the index does not fit a 64-bit signed integer.
    InvalidReg,
    /// A symbol was used which is not allowed in assembly files
    #[default]
    InvalidSymbol
}
impl std::fmt::Display for LexErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexErr::DoesNotFitI64   => f.write_str("numeric token does not fit 64-bit signed integer"),
            LexErr::InvalidHex      => f.write_str("invalid hex literal"),
            LexErr::InvalidNumeric  => f.write_str("invalid decimal literal"),
            LexErr::InvalidHexEmpty => f.write_str("invalid hex literal"),
            LexErr::InvalidDecEmpty => f.write_str("invalid decimal literal"),
            LexErr::UnknownIntErr   => f.write_str("could not parse integer"),
            LexErr::InvalidReg      => f.write_str("invalid register"),
            LexErr::InvalidSymbol   => f.write_str("unrecognized symbol"),
        }
    }
}
impl std::error::Error for LexErr {}
impl crate::err::Error for LexErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            LexErr::DoesNotFitI64    => Some(format!("the range for a 64-bit signed integer is [{}, {}]", i64::MIN, i64::MAX).into()),
            LexErr::InvalidHex       => Some("a hex literal starts with '0x' and consists of 0-9, A-F".into()),
            LexErr::InvalidNumeric   => Some("a decimal literal only consists of digits 0-9".into()),
            LexErr::InvalidHexEmpty  => Some("there should be hex digits (0-9, A-F) here".into()),
            LexErr::InvalidDecEmpty  => Some("there should be digits (0-9) here".into()),
            LexErr::UnknownIntErr    => None,
            LexErr::InvalidReg       => Some("registers are R0-R2".into()),
            LexErr::InvalidSymbol    => Some("this char does not occur in any token in the assembly format".into()),
        }
    }
}
/// Helper that converts an int error kind to its corresponding LexErr, based on the provided inputs.
fn convert_int_error(
    e: &std::num::IntErrorKind,
    invalid_digits_err: LexErr,
    empty_err: LexErr,
    src: &str
) -> LexErr {
    match e {
        IntErrorKind::Empty        => empty_err,
        IntErrorKind::InvalidDigit if src == "-" => empty_err,
        IntErrorKind::InvalidDigit => invalid_digits_err,
        IntErrorKind::PosOverflow  => LexErr::DoesNotFitI64,
        IntErrorKind::NegOverflow  => LexErr::DoesNotFitI64,
        _ => LexErr::UnknownIntErr,
    }
}
fn lex_dec(lx: &Lexer<'_, Token>) -> Result<i64, LexErr> {
    let string = lx.slice().strip_prefix('#').unwrap_or(lx.slice());

    string.parse::<i64>()
        .map_err(|e| convert_int_error(e.kind(), LexErr::InvalidNumeric, LexErr::InvalidDecEmpty, string))
}
fn lex_hex(lx: &Lexer<'_, Token>) -> Result<i64, LexErr> {
    let (neg, rest) = match lx.slice().strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, lx.slice()),
    };
    let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) else {
        unreachable!("Lexer slice should have contained 0x or 0X");
    };
    // Parse the sign together with the digits so that i64::MIN is representable:
    let digits = match neg {
        true  => format!("-{hex}"),
        false => hex.to_string(),
    };
    i64::from_str_radix(&digits, 16)
        .map_err(|e| convert_int_error(e.kind(), LexErr::InvalidHex, LexErr::InvalidHexEmpty, &digits))
}
fn lex_reg(lx: &Lexer<'_, Token>) -> Result<i64, LexErr> {
    lx.slice()[1..].parse::<i64>()
        .map_err(|_| LexErr::InvalidReg)
}

#[cfg(test)]
mod tests {
    use logos::Logos;

    use crate::ast::Opcode;
    use crate::err::LexErr;
    use crate::parse::lex::{Ident, Token};

    fn other(s: &str) -> Token {
        Token::Ident(Ident::Other(s.to_string()))
    }
    fn mnemonic(op: Opcode) -> Token {
        Token::Ident(Ident::Mnemonic(op))
    }

    #[test]
    fn test_numeric_dec_success() {
        // Basic
        let mut tokens = Token::lexer("0 123 456 789");
        assert_eq!(tokens.next(), Some(Ok(Token::Int(0))));
        assert_eq!(tokens.next(), Some(Ok(Token::Int(123))));
        assert_eq!(tokens.next(), Some(Ok(Token::Int(456))));
        assert_eq!(tokens.next(), Some(Ok(Token::Int(789))));
        assert_eq!(tokens.next(), None);

        // Negative
        let mut tokens = Token::lexer("-123 -456 -1");
        assert_eq!(tokens.next(), Some(Ok(Token::Int(-123))));
        assert_eq!(tokens.next(), Some(Ok(Token::Int(-456))));
        assert_eq!(tokens.next(), Some(Ok(Token::Int(-1))));
        assert_eq!(tokens.next(), None);

        // Alternate syntax
        let mut tokens = Token::lexer("#100 #200 #-300");
        assert_eq!(tokens.next(), Some(Ok(Token::Int(100))));
        assert_eq!(tokens.next(), Some(Ok(Token::Int(200))));
        assert_eq!(tokens.next(), Some(Ok(Token::Int(-300))));
        assert_eq!(tokens.next(), None);
    }

    #[test]
    fn test_numeric_hex_success() {
        let mut tokens = Token::lexer("0x65 0XFF 0xabcd 0x0 -0x10");
        assert_eq!(tokens.next(), Some(Ok(Token::Int(0x65))));
        assert_eq!(tokens.next(), Some(Ok(Token::Int(0xFF))));
        assert_eq!(tokens.next(), Some(Ok(Token::Int(0xABCD))));
        assert_eq!(tokens.next(), Some(Ok(Token::Int(0))));
        assert_eq!(tokens.next(), Some(Ok(Token::Int(-0x10))));
        assert_eq!(tokens.next(), None);

        assert_eq!(Token::lexer("-0x8000000000000000").next(), Some(Ok(Token::Int(i64::MIN))));
    }

    #[test]
    fn test_numeric_overflow() {
        assert_eq!(Token::lexer("9223372036854775807").next(), Some(Ok(Token::Int(i64::MAX))));
        assert_eq!(Token::lexer("9223372036854775808").next(), Some(Err(LexErr::DoesNotFitI64)));
        assert_eq!(Token::lexer("-9223372036854775809").next(), Some(Err(LexErr::DoesNotFitI64)));
        assert_eq!(Token::lexer("0x10000000000000000").next(), Some(Err(LexErr::DoesNotFitI64)));
    }

    #[test]
    fn test_numeric_invalid() {
        assert_eq!(Token::lexer("#Q").next(), Some(Err(LexErr::InvalidNumeric)));
        assert_eq!(Token::lexer("3Q").next(), Some(Err(LexErr::InvalidNumeric)));
        assert_eq!(Token::lexer("#").next(), Some(Err(LexErr::InvalidDecEmpty)));
        assert_eq!(Token::lexer("#-").next(), Some(Err(LexErr::InvalidDecEmpty)));
        assert_eq!(Token::lexer("0xQ").next(), Some(Err(LexErr::InvalidHex)));
        assert_eq!(Token::lexer("0x").next(), Some(Err(LexErr::InvalidHexEmpty)));
    }

    #[test]
    fn test_regs() {
        let mut tokens = Token::lexer("R0 R1 R2 r2 R5 R15 R-1");
        assert_eq!(tokens.next(), Some(Ok(Token::Reg(0))));
        assert_eq!(tokens.next(), Some(Ok(Token::Reg(1))));
        assert_eq!(tokens.next(), Some(Ok(Token::Reg(2))));
        assert_eq!(tokens.next(), Some(Ok(Token::Reg(2))));
        assert_eq!(tokens.next(), Some(Ok(Token::Reg(5))));
        assert_eq!(tokens.next(), Some(Ok(Token::Reg(15))));
        assert_eq!(tokens.next(), Some(Ok(Token::Reg(-1))));
        assert_eq!(tokens.next(), None);

        assert_eq!(Token::lexer("R99999999999999999999").next(), Some(Err(LexErr::InvalidReg)));

        // Not registers:
        assert_eq!(Token::lexer("R").collect::<Result<Vec<_>, _>>(), Ok(vec![other("R")]));
        assert_eq!(Token::lexer("R1X").collect::<Result<Vec<_>, _>>(), Ok(vec![other("R1X")]));
    }

    #[test]
    fn test_mnemonics() {
        let src = "LOAD LOAD_IND STORE STORE_IND CMP_IND INCREMENT DECREMENT JUMP JZ NOP HALT";
        let tokens: Vec<_> = Token::lexer(src).collect::<Result<_, _>>().unwrap();
        let expected: Vec<_> = Opcode::ALL.into_iter().map(mnemonic).collect();
        assert_eq!(tokens, expected);

        // Case insensitivity
        let mut tokens = Token::lexer("load Load lOaD_iNd");
        assert_eq!(tokens.next(), Some(Ok(mnemonic(Opcode::Load))));
        assert_eq!(tokens.next(), Some(Ok(mnemonic(Opcode::Load))));
        assert_eq!(tokens.next(), Some(Ok(mnemonic(Opcode::LoadInd))));
        assert_eq!(tokens.next(), None);

        // Unknown identifiers
        let mut tokens = Token::lexer("ADD foo _");
        assert_eq!(tokens.next(), Some(Ok(other("ADD"))));
        assert_eq!(tokens.next(), Some(Ok(other("foo"))));
        assert_eq!(tokens.next(), Some(Ok(other("_"))));
        assert_eq!(tokens.next(), None);
    }

    #[test]
    fn test_punct() {
        let mut tokens = Token::lexer("0\n1,2\r\n3 ;; abcdef");
        assert_eq!(tokens.next(), Some(Ok(Token::Int(0))));
        assert_eq!(tokens.next(), Some(Ok(Token::NewLine)));
        assert_eq!(tokens.next(), Some(Ok(Token::Int(1))));
        assert_eq!(tokens.next(), Some(Ok(Token::Comma)));
        assert_eq!(tokens.next(), Some(Ok(Token::Int(2))));
        assert_eq!(tokens.next(), Some(Ok(Token::NewLine)));
        assert_eq!(tokens.next(), Some(Ok(Token::Int(3))));
        assert_eq!(tokens.next(), Some(Ok(Token::Comment)));
        assert_eq!(tokens.next(), None);
    }

    #[test]
    fn test_invalid_symbol() {
        for c in ['$', '%', '(', ')', '[', ']', '{', '}', '@', '!', '.', ':', '"'] {
            let string = c.to_string();
            assert_eq!(
                Token::lexer(&string).next(),
                Some(Err(LexErr::InvalidSymbol)),
                "Expected {string:?} to be an invalid symbol"
            );
        }
    }
}
