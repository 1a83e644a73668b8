//! SMT-LIB 2 commands and minimal response parsing
//!
//! The decision procedure is a client of the textual SMT-LIB protocol: it
//! serializes commands onto the solver pipe and parses responses only as far
//! as needed: `sat`/`unsat`/`unknown` lines and the literal values inside
//! `get-value` responses. No full grammar is parsed back.

use std::fmt;

use num_bigint::BigUint;

use crate::error::{SmtError, SmtResult};
use crate::sort::Sort;
use crate::term::{write_symbol, Identifier, Term};

/// An SMT-LIB 2 command issued to the solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `(set-option :produce-models <bool>)`
    SetOptionProduceModels(bool),
    /// `(set-logic <logic>)`
    SetLogic(String),
    /// `(declare-fun <name> (<params>) <sort>)`
    DeclareFun {
        /// Declared identifier; its sort is the return sort
        identifier: Identifier,
        /// Parameter sorts, empty for constants
        parameters: Vec<Sort>,
    },
    /// `(define-fun <name> () <sort> <body>)`
    DefineFun {
        /// Defined identifier; its sort is the body's sort
        identifier: Identifier,
        /// Body term
        body: Term,
    },
    /// `(assert <term>)`
    Assert(Term),
    /// `(push 1)`
    Push,
    /// `(pop 1)`
    Pop,
    /// `(check-sat)`
    CheckSat,
    /// `(get-value (<term>))`
    GetValue(Term),
    /// `(exit)`
    Exit,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetOptionProduceModels(value) => {
                write!(f, "(set-option :produce-models {value})")
            }
            Command::SetLogic(logic) => write!(f, "(set-logic {logic})"),
            Command::DeclareFun {
                identifier,
                parameters,
            } => {
                write!(f, "(declare-fun ")?;
                write_symbol(f, &identifier.name)?;
                write!(f, " (")?;
                for (i, parameter) in parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{parameter}")?;
                }
                write!(f, ") {})", identifier.sort)
            }
            Command::DefineFun { identifier, body } => {
                write!(f, "(define-fun ")?;
                write_symbol(f, &identifier.name)?;
                write!(f, " () {} {body})", identifier.sort)
            }
            Command::Assert(term) => write!(f, "(assert {term})"),
            Command::Push => write!(f, "(push 1)"),
            Command::Pop => write!(f, "(pop 1)"),
            Command::CheckSat => write!(f, "(check-sat)"),
            Command::GetValue(term) => write!(f, "(get-value ({term}))"),
            Command::Exit => write!(f, "(exit)"),
        }
    }
}

/// Response to a `check-sat` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckSatResponse {
    /// The assertion set is satisfiable
    Sat,
    /// The assertion set is unsatisfiable
    Unsat,
    /// The solver could not decide
    Unknown,
}

/// Parse the response line of a `check-sat` command.
pub fn parse_check_sat_response(line: &str) -> SmtResult<CheckSatResponse> {
    match line.trim() {
        "sat" => Ok(CheckSatResponse::Sat),
        "unsat" => Ok(CheckSatResponse::Unsat),
        "unknown" => Ok(CheckSatResponse::Unknown),
        other => Err(SmtError::MalformedResponse(format!(
            "expected sat/unsat/unknown, got `{other}`"
        ))),
    }
}

/// A literal value recovered from a `get-value` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValue {
    /// Boolean model value
    Bool(bool),
    /// Bitvector model value
    BitVector {
        /// Unsigned value
        value: BigUint,
        /// Bit width
        width: u32,
    },
}

/// Parse a `get-value` response of the form `((<term> <value>))` and decode
/// the value literal against the expected sort.
pub fn parse_value_response(response: &str, expected: &Sort) -> SmtResult<ModelValue> {
    let sexp = parse_sexp(response)?;
    // ((term value)), one queried term with one binding.
    let SExp::List(bindings) = &sexp else {
        return Err(SmtError::MalformedResponse(response.to_string()));
    };
    let [SExp::List(binding)] = bindings.as_slice() else {
        return Err(SmtError::MalformedResponse(response.to_string()));
    };
    let [_term, value] = binding.as_slice() else {
        return Err(SmtError::MalformedResponse(response.to_string()));
    };
    decode_literal(value, expected)
        .ok_or_else(|| SmtError::MalformedResponse(format!("uninterpretable value in {response}")))
}

fn decode_literal(value: &SExp, expected: &Sort) -> Option<ModelValue> {
    match (value, expected) {
        (SExp::Atom(atom), Sort::Bool) => match atom.as_str() {
            "true" => Some(ModelValue::Bool(true)),
            "false" => Some(ModelValue::Bool(false)),
            _ => None,
        },
        (SExp::Atom(atom), Sort::BitVec(width)) => {
            let value = if let Some(hex) = atom.strip_prefix("#x") {
                BigUint::parse_bytes(hex.as_bytes(), 16)?
            } else if let Some(bin) = atom.strip_prefix("#b") {
                BigUint::parse_bytes(bin.as_bytes(), 2)?
            } else {
                return None;
            };
            Some(ModelValue::BitVector {
                value,
                width: *width,
            })
        }
        // (_ bvN w)
        (SExp::List(parts), Sort::BitVec(_)) => {
            let [SExp::Atom(underscore), SExp::Atom(value), SExp::Atom(width)] = parts.as_slice()
            else {
                return None;
            };
            if underscore != "_" {
                return None;
            }
            let value = BigUint::parse_bytes(value.strip_prefix("bv")?.as_bytes(), 10)?;
            let width: u32 = width.parse().ok()?;
            Some(ModelValue::BitVector { value, width })
        }
        _ => None,
    }
}

/// Minimal s-expression shape for response parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SExp {
    Atom(String),
    List(Vec<SExp>),
}

fn parse_sexp(input: &str) -> SmtResult<SExp> {
    let mut rest = input.trim();
    let (sexp, remainder) = parse_one(rest)?;
    rest = remainder.trim();
    if !rest.is_empty() {
        return Err(SmtError::MalformedResponse(format!(
            "trailing content after response: `{rest}`"
        )));
    }
    Ok(sexp)
}

fn parse_one(input: &str) -> SmtResult<(SExp, &str)> {
    let input = input.trim_start();
    let Some(first) = input.chars().next() else {
        return Err(SmtError::MalformedResponse(
            "unexpected end of response".to_string(),
        ));
    };
    if first == '(' {
        let mut rest = &input[1..];
        let mut items = Vec::new();
        loop {
            rest = rest.trim_start();
            match rest.chars().next() {
                Some(')') => return Ok((SExp::List(items), &rest[1..])),
                Some(_) => {
                    let (item, remainder) = parse_one(rest)?;
                    items.push(item);
                    rest = remainder;
                }
                None => {
                    return Err(SmtError::MalformedResponse(
                        "unbalanced parenthesis in response".to_string(),
                    ))
                }
            }
        }
    } else if first == ')' {
        Err(SmtError::MalformedResponse(
            "unexpected `)` in response".to_string(),
        ))
    } else if first == '|' {
        let rest = &input[1..];
        let end = rest.find('|').ok_or_else(|| {
            SmtError::MalformedResponse("unterminated quoted symbol".to_string())
        })?;
        Ok((SExp::Atom(rest[..end].to_string()), &rest[end + 1..]))
    } else {
        let end = input
            .find(|c: char| c.is_whitespace() || c == '(' || c == ')')
            .unwrap_or(input.len());
        Ok((SExp::Atom(input[..end].to_string()), &input[end..]))
    }
}
