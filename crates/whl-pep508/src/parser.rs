//! A recursive descent parser for dependency specifiers.
//!
//! ```text
//! requirement   = wsp* name wsp* extras? wsp* (urlspec | versionspec)? wsp* (';' marker)? wsp*
//! extras        = '[' wsp* (name (wsp* ',' wsp* name)*)? wsp* ']'
//! urlspec       = '@' wsp* <URI_reference>
//! versionspec   = '(' version_many ')' | version_many
//! marker        = marker_and (wsp* 'or' marker_and)*
//! marker_and    = marker_expr (wsp* 'and' marker_expr)*
//! marker_expr   = wsp* '(' marker wsp* ')' | marker_var wsp* marker_op wsp* marker_var
//! ```

use std::str::FromStr;

use pep440_rs::VersionSpecifiers;

use whl_normalize::{ExtraName, PackageName};

use crate::marker::{MarkerExpression, MarkerOperand, MarkerOperator, MarkerTree, MarkerVariable};
use crate::scanner::{Scanner, is_name_char};
use crate::{ParseError, Requirement, VersionOrUrl};

pub(crate) fn parse_requirement(input: &str) -> Result<Requirement, ParseError> {
    let mut scanner = Scanner::new(input);

    scanner.skip_whitespace();
    let name = parse_name(&mut scanner)?;
    scanner.skip_whitespace();
    let extras = parse_extras(&mut scanner)?;
    scanner.skip_whitespace();

    let version_or_url = match scanner.peek() {
        Some('@') => {
            scanner.bump();
            Some(VersionOrUrl::Url(parse_url(&mut scanner)?))
        }
        Some('(') => Some(VersionOrUrl::VersionSpecifier(
            parse_parenthesized_specifiers(&mut scanner)?,
        )),
        Some('<' | '=' | '>' | '~' | '!') => Some(VersionOrUrl::VersionSpecifier(
            parse_specifiers(&mut scanner)?,
        )),
        Some(';') | None => None,
        Some(_) => return Err(scanner.expected("a version specifier, `@`, `;` or end of input")),
    };

    scanner.skip_whitespace();
    let marker = if scanner.eat(";") {
        Some(parse_or(&mut scanner)?)
    } else {
        None
    };

    scanner.skip_whitespace();
    if scanner.peek().is_some() {
        return Err(if marker.is_some() {
            scanner.expected("`and`, `or` or end of input")
        } else {
            scanner.expected("`;` or end of input")
        });
    }

    Ok(Requirement {
        name,
        extras,
        version_or_url,
        marker,
    })
}

pub(crate) fn parse_marker(input: &str) -> Result<MarkerTree, ParseError> {
    let mut scanner = Scanner::new(input);
    let marker = parse_or(&mut scanner)?;
    scanner.skip_whitespace();
    if scanner.peek().is_some() {
        return Err(scanner.expected("`and`, `or` or end of input"));
    }
    Ok(marker)
}

fn parse_name(scanner: &mut Scanner) -> Result<PackageName, ParseError> {
    if !scanner.peek().is_some_and(|char| char.is_ascii_alphanumeric()) {
        return Err(scanner.expected("a package name"));
    }
    let (span, name) = scanner.take_while(is_name_char);
    PackageName::from_str(name).map_err(|err| scanner.error(err.to_string(), span))
}

fn parse_extras(scanner: &mut Scanner) -> Result<Vec<ExtraName>, ParseError> {
    let open = scanner.pos();
    if !scanner.eat("[") {
        return Ok(Vec::new());
    }

    let mut extras = Vec::new();
    scanner.skip_whitespace();
    if scanner.eat("]") {
        return Ok(extras);
    }

    loop {
        scanner.skip_whitespace();
        match scanner.peek() {
            None => {
                return Err(scanner.error("Missing closing `]` for the extras", open..open + 1));
            }
            Some(char) if char.is_ascii_alphanumeric() => {}
            Some(_) => return Err(scanner.expected("an extra name")),
        }
        let (span, extra) = scanner.take_while(is_name_char);
        extras.push(ExtraName::from_str(extra).map_err(|err| scanner.error(err.to_string(), span))?);

        scanner.skip_whitespace();
        if scanner.eat("]") {
            return Ok(extras);
        }
        if !scanner.eat(",") {
            return Err(match scanner.peek() {
                None => scanner.error("Missing closing `]` for the extras", open..open + 1),
                Some(_) => scanner.expected("`,` or `]`"),
            });
        }
    }
}

/// The URL of a direct reference, kept as written.
fn parse_url(scanner: &mut Scanner) -> Result<String, ParseError> {
    scanner.skip_whitespace();
    let (_, url) = scanner.take_while(|char| !char.is_whitespace());
    if url.is_empty() {
        return Err(scanner.expected("a URL"));
    }
    Ok(url.to_string())
}

/// Specifiers such as `>=1.19,<2.0`, running up to the marker or the end of the input.
fn parse_specifiers(scanner: &mut Scanner) -> Result<VersionSpecifiers, ParseError> {
    let (span, text) = scanner.take_while(|char| char != ';');
    let text = text.trim_end();
    VersionSpecifiers::from_str(text)
        .map_err(|err| scanner.error(err.to_string(), span.start..span.start + text.len()))
}

/// Specifiers in the legacy `(>=1.19,<2.0)` form.
fn parse_parenthesized_specifiers(scanner: &mut Scanner) -> Result<VersionSpecifiers, ParseError> {
    let open = scanner.pos();
    scanner.bump();
    scanner.skip_whitespace();
    let (span, text) = scanner.take_while(|char| char != ')');
    if !scanner.eat(")") {
        return Err(scanner.error(
            "Missing closing `)` for the version specifiers",
            open..open + 1,
        ));
    }
    let text = text.trim_end();
    VersionSpecifiers::from_str(text)
        .map_err(|err| scanner.error(err.to_string(), span.start..span.start + text.len()))
}

/// Skip whitespace, then consume `keyword` if it comes next.
fn keyword(scanner: &mut Scanner, keyword: &str) -> bool {
    scanner.skip_whitespace();
    scanner.eat_keyword(keyword)
}

fn parse_or(scanner: &mut Scanner) -> Result<MarkerTree, ParseError> {
    let mut branches = vec![parse_and(scanner)?];
    while keyword(scanner, "or") {
        branches.push(parse_and(scanner)?);
    }
    Ok(MarkerTree::any(branches))
}

fn parse_and(scanner: &mut Scanner) -> Result<MarkerTree, ParseError> {
    let mut terms = vec![parse_atom(scanner)?];
    while keyword(scanner, "and") {
        terms.push(parse_atom(scanner)?);
    }
    Ok(MarkerTree::all(terms))
}

/// A parenthesized marker or a single comparison.
fn parse_atom(scanner: &mut Scanner) -> Result<MarkerTree, ParseError> {
    scanner.skip_whitespace();

    let open = scanner.pos();
    if scanner.eat("(") {
        let marker = parse_or(scanner)?;
        scanner.skip_whitespace();
        if !scanner.eat(")") {
            return Err(match scanner.peek() {
                None => scanner.error("Missing closing `)` for the marker group", open..open + 1),
                Some(_) => scanner.expected("`and`, `or` or `)`"),
            });
        }
        return Ok(marker);
    }

    let left = parse_operand(scanner)?;
    scanner.skip_whitespace();
    let operator = parse_operator(scanner)?;
    scanner.skip_whitespace();
    let right = parse_operand(scanner)?;
    Ok(MarkerTree::Expression(MarkerExpression {
        left,
        operator,
        right,
    }))
}

fn parse_operand(scanner: &mut Scanner) -> Result<MarkerOperand, ParseError> {
    match scanner.peek() {
        Some(quote @ ('\'' | '"')) => {
            let open = scanner.pos();
            scanner.bump();
            let (_, value) = scanner.take_while(|char| char != quote);
            if scanner.bump().is_none() {
                return Err(scanner.error(
                    format!("Missing closing {quote} for the string"),
                    open..open + 1,
                ));
            }
            Ok(MarkerOperand::Literal(value.to_string()))
        }
        Some(char) if char.is_ascii_alphabetic() => {
            let (span, name) = scanner.take_while(is_name_char);
            if name == "extra" {
                return Ok(MarkerOperand::Extra);
            }
            MarkerVariable::from_str(name)
                .map(MarkerOperand::Variable)
                .map_err(|err| scanner.error(err.to_string(), span))
        }
        _ => Err(scanner.expected("a marker variable or a quoted string")),
    }
}

fn parse_operator(scanner: &mut Scanner) -> Result<MarkerOperator, ParseError> {
    let start = scanner.pos();
    if scanner.eat("===") {
        return Err(scanner.error(
            "The `===` operator is not supported in markers",
            start..scanner.pos(),
        ));
    }

    // Two-character operators first, so that `<=` isn't read as `<`.
    let symbols = [
        ("==", MarkerOperator::Equal),
        ("!=", MarkerOperator::NotEqual),
        ("<=", MarkerOperator::LessEqual),
        (">=", MarkerOperator::GreaterEqual),
        ("~=", MarkerOperator::TildeEqual),
        ("<", MarkerOperator::LessThan),
        (">", MarkerOperator::GreaterThan),
    ];
    for (symbol, operator) in symbols {
        if scanner.eat(symbol) {
            return Ok(operator);
        }
    }

    if scanner.eat_keyword("in") {
        return Ok(MarkerOperator::In);
    }
    if scanner.eat_keyword("not") {
        let before = scanner.pos();
        scanner.skip_whitespace();
        if scanner.pos() > before && scanner.eat_keyword("in") {
            return Ok(MarkerOperator::NotIn);
        }
        return Err(scanner.expected("`in` after `not`"));
    }

    Err(scanner.expected("a marker operator"))
}
