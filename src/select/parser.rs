//! Tokenizer and recursive-descent parser for selection expressions.
//!
//! Grammar (case-insensitive keywords, `or` binds loosest):
//!
//! ```text
//! expr      := and ( "or" and )*
//! and       := unary ( "and" unary )*
//! unary     := "not" unary | "within" FLOAT "of" unary | primary
//! primary   := "(" expr ")" | predicate
//! predicate := "all" | "none" | FLAG
//!            | "chain" ids | "resname" ids | "element" ids | "name" ids
//!            | "resi" ranges
//! ids       := WORD ( "," WORD )*
//! ranges    := INT ( "-" INT )? ( "," INT ( "-" INT )? )*
//! ```

use crate::chem::ResidueFlags;
use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Int(i64),
    Float(f32),
    LParen,
    RParen,
    Comma,
    Dash,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Word(w) => write!(f, "{w}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::LParen => f.write_str("("),
            Self::RParen => f.write_str(")"),
            Self::Comma => f.write_str(","),
            Self::Dash => f.write_str("-"),
        }
    }
}

/// Parsed selection expression tree.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Expr {
    /// Every atom.
    All,
    /// No atom.
    None,
    /// Atoms whose chain id is in the list.
    Chain(Vec<String>),
    /// Atoms whose residue code is in the list.
    ResName(Vec<String>),
    /// Atoms whose element symbol is in the list.
    Element(Vec<String>),
    /// Atoms whose name is in the list.
    Name(Vec<String>),
    /// Atoms whose residue sequence number falls in any of the ranges.
    Resi(Vec<(i64, i64)>),
    /// Atoms whose residue type carries any of the flags.
    Flags(ResidueFlags),
    /// Atoms from HETATM-style records.
    Hetero,
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    /// Atoms within the given distance of any atom of the inner selection
    /// (the inner atoms themselves included).
    Within(f32, Box<Expr>),
}

fn syntax(msg: impl Into<String>) -> Error {
    Error::SelectionSyntax(msg.into())
}

fn tokenize(input: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                let _ = chars.next();
            }
            '(' => {
                let _ = chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                let _ = chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                let _ = chars.next();
                tokens.push(Token::Comma);
            }
            '-' => {
                let _ = chars.next();
                tokens.push(Token::Dash);
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut text = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        text.push(d);
                        let _ = chars.next();
                    } else {
                        break;
                    }
                }
                if text.contains('.') {
                    let value = text.parse::<f32>().map_err(|_| {
                        syntax(format!("malformed number {text:?}"))
                    })?;
                    tokens.push(Token::Float(value));
                } else {
                    let value = text.parse::<i64>().map_err(|_| {
                        syntax(format!("malformed number {text:?}"))
                    })?;
                    tokens.push(Token::Int(value));
                }
            }
            c if is_word_char(c) => {
                let mut text = String::new();
                while let Some(&d) = chars.peek() {
                    if is_word_char(d) || d.is_ascii_digit() {
                        text.push(d);
                        let _ = chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Word(text));
            }
            other => {
                return Err(syntax(format!("unexpected character {other:?}")));
            }
        }
    }

    Ok(tokens)
}

// Atom names allow primes and asterisks (nucleotide sugars, e.g. O2').
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '\'' || c == '*' || c == '+'
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn keyword(&self) -> Option<String> {
        match self.peek() {
            Some(Token::Word(w)) => Some(w.to_ascii_lowercase()),
            _ => None,
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.keyword().as_deref() == Some(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<Expr, Error> {
        let mut left = self.and_expr()?;
        while self.eat_keyword("or") {
            let right = self.and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, Error> {
        let mut left = self.unary()?;
        while self.eat_keyword("and") {
            let right = self.unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, Error> {
        if self.eat_keyword("not") {
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        if self.eat_keyword("within") {
            let radius = match self.next() {
                Some(Token::Float(x)) => x,
                Some(Token::Int(n)) => n as f32,
                other => {
                    return Err(syntax(format!(
                        "expected a distance after `within`, found {}",
                        describe(other.as_ref())
                    )));
                }
            };
            if radius < 0.0 {
                return Err(syntax("`within` distance must be non-negative"));
            }
            if !self.eat_keyword("of") {
                return Err(syntax(format!(
                    "expected `of` after `within {radius}`, found {}",
                    describe(self.peek())
                )));
            }
            return Ok(Expr::Within(radius, Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, Error> {
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            let inner = self.expr()?;
            match self.next() {
                Some(Token::RParen) => return Ok(inner),
                other => {
                    return Err(syntax(format!(
                        "expected `)`, found {}",
                        describe(other.as_ref())
                    )));
                }
            }
        }

        let Some(keyword) = self.keyword() else {
            return Err(syntax(format!(
                "expected a predicate, found {}",
                describe(self.peek())
            )));
        };
        self.pos += 1;

        match keyword.as_str() {
            "all" => Ok(Expr::All),
            "none" => Ok(Expr::None),
            "hetero" | "het" => Ok(Expr::Hetero),
            "chain" => Ok(Expr::Chain(self.id_list("chain")?)),
            "resname" => Ok(Expr::ResName(upper(self.id_list("resname")?))),
            "element" => Ok(Expr::Element(upper(self.id_list("element")?))),
            "name" => Ok(Expr::Name(upper(self.id_list("name")?))),
            "resi" => Ok(Expr::Resi(self.range_list()?)),
            other => flag_for_keyword(other).map(Expr::Flags).ok_or_else(|| {
                syntax(format!("unknown predicate `{other}`"))
            }),
        }
    }

    /// Comma-separated identifiers. Chain ids and atom names may be plain
    /// integers in odd files, so bare integers are accepted as words.
    fn id_list(&mut self, what: &str) -> Result<Vec<String>, Error> {
        let mut ids = Vec::new();
        loop {
            match self.next() {
                Some(Token::Word(w)) => ids.push(w),
                Some(Token::Int(n)) => ids.push(n.to_string()),
                other => {
                    return Err(syntax(format!(
                        "expected an identifier after `{what}`, found {}",
                        describe(other.as_ref())
                    )));
                }
            }
            if self.peek() == Some(&Token::Comma) {
                self.pos += 1;
            } else {
                return Ok(ids);
            }
        }
    }

    fn range_list(&mut self) -> Result<Vec<(i64, i64)>, Error> {
        let mut ranges = Vec::new();
        loop {
            let start = match self.next() {
                Some(Token::Int(n)) => n,
                other => {
                    return Err(syntax(format!(
                        "expected a residue number after `resi`, found {}",
                        describe(other.as_ref())
                    )));
                }
            };
            let end = if self.peek() == Some(&Token::Dash) {
                self.pos += 1;
                match self.next() {
                    Some(Token::Int(n)) => n,
                    other => {
                        return Err(syntax(format!(
                            "expected a range end after `{start}-`, found {}",
                            describe(other.as_ref())
                        )));
                    }
                }
            } else {
                start
            };
            if end < start {
                return Err(syntax(format!(
                    "descending residue range {start}-{end}"
                )));
            }
            ranges.push((start, end));
            if self.peek() == Some(&Token::Comma) {
                self.pos += 1;
            } else {
                return Ok(ranges);
            }
        }
    }
}

fn describe(token: Option<&Token>) -> String {
    match token {
        Some(t) => format!("`{t}`"),
        None => "end of expression".to_owned(),
    }
}

fn upper(ids: Vec<String>) -> Vec<String> {
    ids.into_iter().map(|s| s.to_ascii_uppercase()).collect()
}

fn flag_for_keyword(kw: &str) -> Option<ResidueFlags> {
    Some(match kw {
        "protein" => ResidueFlags::PROTEIN,
        "nucleic" => ResidueFlags::NUCLEIC,
        "water" => ResidueFlags::WATER,
        "basic" => ResidueFlags::BASIC,
        "acidic" => ResidueFlags::ACIDIC,
        "polar" => ResidueFlags::POLAR,
        "nonpolar" => ResidueFlags::NONPOLAR,
        "aromatic" => ResidueFlags::AROMATIC,
        "purine" => ResidueFlags::PURINE,
        "pyrimidine" => ResidueFlags::PYRIMIDINE,
        "dna" => ResidueFlags::DNA,
        "rna" => ResidueFlags::RNA,
        _ => return None,
    })
}

/// Parse a selection expression into its tree.
pub(super) fn parse(input: &str) -> Result<Expr, Error> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(syntax("empty selection expression"));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(syntax(format!(
            "trailing input starting at {}",
            describe(parser.peek())
        )));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_predicates() {
        assert_eq!(parse("all").unwrap(), Expr::All);
        assert_eq!(
            parse("chain A,B").unwrap(),
            Expr::Chain(vec!["A".to_owned(), "B".to_owned()])
        );
        assert_eq!(
            parse("resname ala").unwrap(),
            Expr::ResName(vec!["ALA".to_owned()])
        );
        assert_eq!(
            parse("resi 10-20,35").unwrap(),
            Expr::Resi(vec![(10, 20), (35, 35)])
        );
        assert_eq!(
            parse("protein").unwrap(),
            Expr::Flags(ResidueFlags::PROTEIN)
        );
    }

    #[test]
    fn precedence_or_binds_loosest() {
        let expr = parse("chain A and protein or water").unwrap();
        let Expr::Or(left, right) = expr else {
            panic!("expected top-level or");
        };
        assert!(matches!(*left, Expr::And(_, _)));
        assert_eq!(*right, Expr::Flags(ResidueFlags::WATER));
    }

    #[test]
    fn parses_within() {
        let expr = parse("within 5.0 of (resname LIG)").unwrap();
        let Expr::Within(radius, inner) = expr else {
            panic!("expected within");
        };
        assert!((radius - 5.0).abs() < f32::EPSILON);
        assert_eq!(*inner, Expr::ResName(vec!["LIG".to_owned()]));
    }

    #[test]
    fn within_accepts_integer_distance() {
        assert!(parse("within 4 of name CA").is_ok());
    }

    #[test]
    fn malformed_expressions_fail() {
        assert!(matches!(parse(""), Err(Error::SelectionSyntax(_))));
        assert!(matches!(parse("chain"), Err(Error::SelectionSyntax(_))));
        assert!(matches!(
            parse("resname ALA or"),
            Err(Error::SelectionSyntax(_))
        ));
        assert!(matches!(
            parse("(chain A"),
            Err(Error::SelectionSyntax(_))
        ));
        assert!(matches!(
            parse("resi 20-10"),
            Err(Error::SelectionSyntax(_))
        ));
        assert!(matches!(
            parse("frobnicate X"),
            Err(Error::SelectionSyntax(_))
        ));
        assert!(matches!(
            parse("chain A chain B"),
            Err(Error::SelectionSyntax(_))
        ));
        assert!(matches!(
            parse("within 5.0 resname LIG"),
            Err(Error::SelectionSyntax(_))
        ));
    }

    #[test]
    fn nucleotide_atom_names_tokenize() {
        assert_eq!(
            parse("name O2'").unwrap(),
            Expr::Name(vec!["O2'".to_owned()])
        );
    }
}
