//! DIMACS CNF parser and writer for the quadsat solver toolkit.

use std::{borrow::Borrow, io};

use quadsat_formula::{CnfFormula, Lit, Var};

use anyhow::Error;
use thiserror::Error;

/// Possible errors while parsing a DIMACS CNF formula.
///
/// Every variant records the 1-based line and the absolute byte offset of the
/// offending input.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("line {line}, byte {offset}: unexpected character '{unexpected}' in DIMACS CNF input")]
    UnexpectedInput {
        line: usize,
        offset: usize,
        unexpected: char,
    },
    #[error("line {line}, byte {offset}: invalid header syntax: {header}")]
    InvalidHeader {
        line: usize,
        offset: usize,
        header: String,
    },
    #[error("line {line}, byte {offset}: literal {literal} exceeds the declared {declared} variables")]
    InvalidLiteral {
        line: usize,
        offset: usize,
        literal: isize,
        declared: usize,
    },
    #[error("line {line}, byte {offset}: literal index is too large")]
    LiteralTooLarge { line: usize, offset: usize },
    #[error("line {line}, byte {offset}: unterminated clause at end of input")]
    UnterminatedClause { line: usize, offset: usize },
}

/// Parse a DIMACS CNF formula from a reader.
///
/// Reads the complete input and returns the parsed formula. An empty input is
/// a formula without variables or clauses.
pub fn parse_dimacs(input: impl io::Read) -> Result<CnfFormula, Error> {
    use io::Read;

    let mut buf = Vec::new();
    let mut input = input;
    input.read_to_end(&mut buf)?;
    Ok(parse_dimacs_bytes(&buf)?)
}

/// Parse a DIMACS CNF formula from a byte slice.
pub fn parse_dimacs_bytes(input: &[u8]) -> Result<CnfFormula, ParserError> {
    Scanner::new(input).parse()
}

/// Byte-level scanner over a complete DIMACS CNF input.
struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    line_start: bool,
    formula: CnfFormula,
    clause: Vec<Lit>,
    /// Variable count declared by the header, if one was seen.
    declared: Option<usize>,
    clause_data_seen: bool,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a [u8]) -> Scanner<'a> {
        Scanner {
            input,
            pos: 0,
            line: 1,
            line_start: true,
            formula: CnfFormula::new(),
            clause: vec![],
            declared: None,
            clause_data_seen: false,
        }
    }

    fn parse(mut self) -> Result<CnfFormula, ParserError> {
        while let Some(byte) = self.peek() {
            match byte {
                b' ' | b'\t' | b'\r' | b'\n' => self.advance(),
                b'c' if self.line_start => self.skip_line(),
                b'p' if self.line_start => self.parse_header()?,
                b'-' | b'0'..=b'9' => self.parse_literal()?,
                _ => return Err(self.unexpected(byte)),
            }
        }

        if !self.clause.is_empty() {
            return Err(ParserError::UnterminatedClause {
                line: self.line,
                offset: self.pos,
            });
        }

        Ok(self.formula)
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).cloned()
    }

    fn advance(&mut self) {
        if self.input[self.pos] == b'\n' {
            self.line += 1;
            self.line_start = true;
        } else {
            self.line_start = false;
        }
        self.pos += 1;
    }

    /// Skip input up to and including the next newline.
    fn skip_line(&mut self) {
        while let Some(byte) = self.peek() {
            self.advance();
            if byte == b'\n' {
                break;
            }
        }
    }

    fn unexpected(&self, byte: u8) -> ParserError {
        ParserError::UnexpectedInput {
            line: self.line,
            offset: self.pos,
            unexpected: byte as char,
        }
    }

    /// Parse a `p cnf <vars> <clauses>` line, the cursor sitting on the `p`.
    fn parse_header(&mut self) -> Result<(), ParserError> {
        let line = self.line;
        let offset = self.pos;

        let start = self.pos;
        while let Some(byte) = self.peek() {
            if byte == b'\n' {
                break;
            }
            self.advance();
        }
        let header = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();

        let invalid = || ParserError::InvalidHeader {
            line,
            offset,
            header: header.clone(),
        };

        if self.declared.is_some() || self.clause_data_seen {
            return Err(invalid());
        }

        let mut fields = header.split_whitespace();
        if fields.next() != Some("p") || fields.next() != Some("cnf") {
            return Err(invalid());
        }

        let var_count: usize = fields
            .next()
            .and_then(|value| value.parse().ok())
            .ok_or_else(invalid)?;
        let _clause_count: usize = fields
            .next()
            .and_then(|value| value.parse().ok())
            .ok_or_else(invalid)?;
        if fields.next().is_some() {
            return Err(invalid());
        }

        if var_count > Var::max_count() {
            return Err(ParserError::LiteralTooLarge { line, offset });
        }

        self.declared = Some(var_count);
        self.formula.set_var_count(var_count);

        Ok(())
    }

    /// Parse one signed integer; `0` terminates the pending clause.
    fn parse_literal(&mut self) -> Result<(), ParserError> {
        let line = self.line;
        let offset = self.pos;

        self.clause_data_seen = true;

        let negative = self.peek() == Some(b'-');
        if negative {
            self.advance();
            match self.peek() {
                Some(b'1'..=b'9') => {}
                Some(byte) => return Err(self.unexpected(byte)),
                None => {
                    return Err(ParserError::UnterminatedClause {
                        line: self.line,
                        offset: self.pos,
                    })
                }
            }
        }

        let mut index: usize = 0;
        while let Some(byte @ b'0'..=b'9') = self.peek() {
            index = index
                .checked_mul(10)
                .and_then(|index| index.checked_add((byte - b'0') as usize))
                .filter(|&index| index <= Var::max_count())
                .ok_or(ParserError::LiteralTooLarge { line, offset })?;
            self.advance();
        }

        // A literal must end at whitespace or the end of input.
        match self.peek() {
            None | Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {}
            Some(byte) => return Err(self.unexpected(byte)),
        }

        if index == 0 {
            self.formula.add_clause(self.clause.drain(..));
            return Ok(());
        }

        if let Some(declared) = self.declared {
            if index > declared {
                let literal = index as isize * if negative { -1 } else { 1 };
                return Err(ParserError::InvalidLiteral {
                    line,
                    offset,
                    literal,
                    declared,
                });
            }
        }

        self.clause
            .push(Lit::from_var(Var::from_dimacs(index as isize), !negative));

        Ok(())
    }
}

/// Write a DIMACS CNF header.
///
/// Can be used with [`write_dimacs_clauses`] to implement incremental writing.
pub fn write_dimacs_header(
    target: &mut impl io::Write,
    var_count: usize,
    clause_count: usize,
) -> io::Result<()> {
    writeln!(target, "p cnf {} {}", var_count, clause_count)
}

/// Write an iterator of clauses as headerless DIMACS CNF.
///
/// Can be used with [`write_dimacs_header`] to implement incremental writing.
pub fn write_dimacs_clauses(
    target: &mut impl io::Write,
    clauses: impl IntoIterator<Item = impl IntoIterator<Item = impl Borrow<Lit>>>,
) -> io::Result<()> {
    for clause in clauses.into_iter() {
        for lit in clause.into_iter() {
            itoa::write(&mut *target, lit.borrow().to_dimacs())?;
            target.write_all(b" ")?;
        }
        target.write_all(b"0\n")?;
    }
    Ok(())
}

/// Write a formula as DIMACS CNF.
pub fn write_dimacs(target: &mut impl io::Write, formula: &CnfFormula) -> io::Result<()> {
    write_dimacs_header(&mut *target, formula.var_count(), formula.len())?;
    write_dimacs_clauses(&mut *target, formula.iter())
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::{test_runner::TestCaseError, *};

    use quadsat_formula::{cnf::strategy::*, cnf_formula};

    macro_rules! expect_error {
        ( $input:expr, $( $cases:tt )* ) => {
            match parse_dimacs_bytes($input) {
                Ok(parsed) => panic!("expected error but got {:?}", parsed),
                Err(err) => match err {
                    $( $cases )*,
                    other => panic!("unexpected error {:?}", other),
                }
            }
        };
    }

    #[test]
    fn odd_whitespace() {
        let parsed = parse_dimacs_bytes(
            b"p  cnf  4   3  \n  1  \n 2  3\n0 -4 0 2\nccomment  \n\n0\n\n",
        )
        .unwrap();

        let expected = cnf_formula![
            1, 2, 3;
            -4;
            2;
        ];

        assert_eq!(parsed, expected);
    }

    #[test]
    fn empty_input_is_the_trivial_formula() {
        let parsed = parse_dimacs_bytes(b"").unwrap();
        assert_eq!(parsed.var_count(), 0);
        assert_eq!(parsed.len(), 0);
    }

    #[test]
    fn header_declares_unused_variables() {
        let parsed = parse_dimacs_bytes(b"p cnf 6 1\n1 -2 0\n").unwrap();
        assert_eq!(parsed.var_count(), 6);
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn missing_header_infers_the_var_count() {
        let parsed = parse_dimacs_bytes(b"1 -5 0\n2 0\n").unwrap();
        assert_eq!(parsed.var_count(), 5);
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn invalid_headers() {
        expect_error!(b"pcnf 1 3", ParserError::InvalidHeader { .. } => ());
        expect_error!(b"p notcnf 1 3", ParserError::InvalidHeader { .. } => ());
        expect_error!(b"p cnf 1", ParserError::InvalidHeader { .. } => ());
        expect_error!(b"p cnf 1 2 3", ParserError::InvalidHeader { .. } => ());
        expect_error!(b"p cnf foo bar", ParserError::InvalidHeader { .. } => ());
        expect_error!(b"p cnf -3 -6", ParserError::InvalidHeader { .. } => ());
        expect_error!(b"p cnf 1 2\np cnf 1 2\n", ParserError::InvalidHeader { .. } => ());
        expect_error!(b"1 2 0\np cnf 2 1\n", ParserError::InvalidHeader { .. } => ());

        expect_error!(b"p cnf 99999999999999999999 4", ParserError::InvalidHeader { .. } => ());
        expect_error!(
            format!("p cnf {} 4", Var::max_count() + 1).as_bytes(),
            ParserError::LiteralTooLarge { .. } => ()
        );
    }

    #[test]
    fn syntax_errors() {
        expect_error!(b"1 2 ?foo", ParserError::UnexpectedInput { unexpected: '?', .. } => ());
        expect_error!(b"1 2 - 3 0", ParserError::UnexpectedInput { unexpected: ' ', .. } => ());
        expect_error!(b"1 2 -\n3 0", ParserError::UnexpectedInput { unexpected: '\n', .. } => ());
        expect_error!(b"1 2 --3 0", ParserError::UnexpectedInput { unexpected: '-', .. } => ());
        expect_error!(b"1 2-3 0", ParserError::UnexpectedInput { unexpected: '-', .. } => ());
        expect_error!(b"1 -0 2 0", ParserError::UnexpectedInput { unexpected: '0', .. } => ());
    }

    #[test]
    fn unterminated_clause() {
        expect_error!(b"1 2 3", ParserError::UnterminatedClause { .. } => ());
        expect_error!(b"1 0 2 3\n", ParserError::UnterminatedClause { .. } => ());
    }

    #[test]
    fn literal_out_of_declared_range() {
        expect_error!(
            b"p cnf 1 1\n2 0\n",
            ParserError::InvalidLiteral { literal: 2, declared: 1, .. } => ()
        );
        expect_error!(
            b"p cnf 3 1\n1 -4 0\n",
            ParserError::InvalidLiteral { literal: -4, declared: 3, .. } => ()
        );
    }

    #[test]
    fn literal_too_large() {
        expect_error!(
            format!("1 {} 2 0", Var::max_count() + 1).as_bytes(),
            ParserError::LiteralTooLarge { .. } => ()
        );

        assert_eq!(
            parse_dimacs_bytes(format!("1 {} 2 0", Var::max_count()).as_bytes()).unwrap(),
            cnf_formula![
                1, Var::max_count() as isize, 2;
            ]
        );
    }

    #[test]
    fn error_offsets_point_at_the_token() {
        match parse_dimacs_bytes(b"1 2 ?") {
            Err(ParserError::UnexpectedInput { line, offset, .. }) => {
                assert_eq!((line, offset), (1, 4));
            }
            other => panic!("unexpected result {:?}", other),
        }
        match parse_dimacs_bytes(b"1 2 0\n3 ?") {
            Err(ParserError::UnexpectedInput { line, offset, .. }) => {
                assert_eq!((line, offset), (2, 8));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn roundtrip(input in cnf_formula(1..100usize, 0..100, 0..10)) {
            let mut buf = vec![];

            write_dimacs(&mut buf, &input)?;

            let parsed = parse_dimacs(&buf[..]).map_err(|e| TestCaseError::fail(e.to_string()))?;

            prop_assert_eq!(parsed, input);
        }
    }
}
