//! Parsing assembly source code into statements.
//!
//! The assembly text format is line-based: each non-empty line holds one instruction
//! written as `MNEMONIC operand1[, operand2]`.
//!
//! ```text
//! ; find the largest element of the array
//! LOAD R0, 101      ; R0 = mem[101]
//! LOAD R2, 99
//! CMP_IND R0, R2
//! STORE R0, 150
//! HALT
//! ```
//!
//! - Blank lines and comments (`;` to the end of the line) are ignored.
//! - An operand written `R<n>` is a register index; anything else is an integer immediate.
//! - Missing operands are 0.
//! - The comma between operands is optional.
//!
//! Unknown mnemonics are not errors; they assemble to an opcode
//! with no mnemonic (see [`Opcode::UNMAPPED`]).
//!
//! [`Opcode::UNMAPPED`]: crate::ast::Opcode::UNMAPPED

pub mod lex;

use logos::{Logos, Span};

use crate::ast::asm::{AsmInstr, Stmt};
use self::lex::{LexErr, Token};

/// Kinds of errors that can occur from parsing assembly source.
///
/// See [`ParseErr`] for this error type with span information included.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParseErrKind {
    /// A token could not be lexed.
    Lex(LexErr),
    /// The line does not start with a mnemonic.
    ExpectedMnemonic,
    /// An identifier appeared where an operand was expected.
    ExpectedOperand,
    /// The instruction has more than two operands.
    TooManyOperands,
}
impl std::fmt::Display for ParseErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lex(e)           => e.fmt(f),
            Self::ExpectedMnemonic => f.write_str("expected mnemonic"),
            Self::ExpectedOperand  => f.write_str("expected register or integer operand"),
            Self::TooManyOperands  => f.write_str("too many operands"),
        }
    }
}

/// Error from parsing assembly source.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ParseErr {
    /// The kind of error.
    pub kind: ParseErrKind,
    /// The span in the source associated with this error.
    pub span: Span
}
impl ParseErr {
    /// Creates a new [`ParseErr`].
    pub fn new(kind: ParseErrKind, span: Span) -> Self {
        ParseErr { kind, span }
    }
}
impl std::fmt::Display for ParseErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}
impl std::error::Error for ParseErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ParseErrKind::Lex(e) => Some(e),
            _ => None
        }
    }
}
impl crate::err::Error for ParseErr {
    fn span(&self) -> Option<crate::err::ErrSpan> {
        Some(self.span.clone().into())
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match &self.kind {
            ParseErrKind::Lex(e)           => crate::err::Error::help(e),
            ParseErrKind::ExpectedMnemonic => Some("each line should start with an instruction like LOAD or HALT".into()),
            ParseErrKind::ExpectedOperand  => Some("operands are registers (R0-R2) or integers".into()),
            ParseErrKind::TooManyOperands  => Some("instructions take at most two operands".into()),
        }
    }
}

/// Parses assembly source code into a list of statements.
///
/// # Example
/// ```
/// use simple_asm::parse::parse_ast;
/// use simple_asm::ast::asm::AsmInstr;
///
/// let src = "
///     ; comment
///     LOAD R0, 101
///     INCREMENT R0
///     HALT
/// ";
/// let ast = parse_ast(src).unwrap();
///
/// let instrs: Vec<_> = ast.into_iter().map(|stmt| stmt.instr).collect();
/// assert_eq!(instrs, [
///     AsmInstr::new("LOAD", 0, 101),
///     AsmInstr::new("INCREMENT", 0, 0),
///     AsmInstr::new("HALT", 0, 0),
/// ]);
/// ```
pub fn parse_ast(src: &str) -> Result<Vec<Stmt>, ParseErr> {
    let mut stmts = vec![];
    let mut line = vec![];

    for (m_token, span) in Token::lexer(src).spanned() {
        let token = m_token.map_err(|e| ParseErr::new(ParseErrKind::Lex(e), span.clone()))?;
        match token {
            Token::Comment => {},
            Token::NewLine => stmts.extend(parse_stmt(std::mem::take(&mut line))?),
            token => line.push((token, span)),
        }
    }
    stmts.extend(parse_stmt(line)?);

    Ok(stmts)
}

/// Parses a single line of assembly source code.
///
/// This returns `None` if the line holds no instruction (e.g., it is blank or a comment).
///
/// ```
/// use simple_asm::parse::parse_line;
/// use simple_asm::ast::asm::AsmInstr;
///
/// let stmt = parse_line("STORE R0, 150").unwrap().unwrap();
/// assert_eq!(stmt.instr, AsmInstr::new("STORE", 0, 150));
/// assert_eq!(parse_line("; nothing here"), Ok(None));
/// ```
pub fn parse_line(line: &str) -> Result<Option<Stmt>, ParseErr> {
    let stmts = parse_ast(line)?;
    Ok(stmts.into_iter().next())
}

/// Parses the tokens of one line into a statement.
fn parse_stmt(tokens: Vec<(Token, Span)>) -> Result<Option<Stmt>, ParseErr> {
    let mut it = tokens.into_iter();
    let Some((first, first_span)) = it.next() else {
        return Ok(None);
    };
    let Token::Ident(ident) = first else {
        return Err(ParseErr::new(ParseErrKind::ExpectedMnemonic, first_span));
    };

    let mut operands = vec![];
    let mut end = first_span.end;
    for (token, span) in it {
        end = span.end;
        let operand = match token {
            Token::Comma => continue,
            Token::Int(n) => n,
            Token::Reg(r) => r,
            _ => return Err(ParseErr::new(ParseErrKind::ExpectedOperand, span)),
        };
        if operands.len() == 2 {
            return Err(ParseErr::new(ParseErrKind::TooManyOperands, span));
        }
        operands.push(operand);
    }

    let operand1 = operands.first().copied().unwrap_or(0);
    let operand2 = operands.get(1).copied().unwrap_or(0);
    Ok(Some(Stmt {
        instr: AsmInstr::from_opcode(ident.opcode(), operand1, operand2),
        span: first_span.start..end
    }))
}
