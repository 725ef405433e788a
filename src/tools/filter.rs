//! Restricted row filter used by the `query` tool.
//!
//! A caller's `where` text is parsed into a [`Filter`] tree. Column names must
//! be plain identifiers and every literal becomes a bound parameter, so the
//! text never reaches the SQL string.
//!
//! ```text
//! expr     := and_expr ( OR and_expr )*
//! and_expr := term ( AND term )*
//! term     := '(' expr ')' | ident op literal | ident IS [NOT] NULL
//! op       := = | != | <> | < | <= | > | >= | LIKE
//! literal  := integer | decimal | 'string' | TRUE | FALSE
//! ```

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),
    #[error("unexpected character '{0}' at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("expected {expected}, found {found}")]
    Unexpected { expected: &'static str, found: String },
    #[error("filter nested too deeply (max {} levels)", MAX_DEPTH)]
    TooDeep,
}

/// Deepest parenthesis nesting accepted in a filter.
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Like => "LIKE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Compare { column: String, op: CompareOp, value: Literal },
    IsNull { column: String, negated: bool },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    /// Render as a SQL fragment with `?` placeholders, appending bound values to `params`.
    pub fn to_sql(&self, params: &mut Vec<Literal>) -> String {
        match self {
            Filter::Compare { column, op, value } => {
                params.push(value.clone());
                format!("{} {} ?", quote_ident(column), op.as_sql())
            }
            Filter::IsNull { column, negated } => {
                let not = if *negated { " NOT" } else { "" };
                format!("{} IS{not} NULL", quote_ident(column))
            }
            Filter::And(parts) => join(parts, " AND ", params),
            Filter::Or(parts) => join(parts, " OR ", params),
        }
    }
}

fn join(parts: &[Filter], sep: &str, params: &mut Vec<Literal>) -> String {
    let rendered: Vec<String> = parts.iter().map(|p| p.to_sql(params)).collect();
    format!("({})", rendered.join(sep))
}

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quote an identifier that already passed [`is_identifier`]. Brackets rather
/// than double quotes: SQLite reads an unknown double-quoted name as a string.
pub fn quote_ident(s: &str) -> String {
    format!("[{s}]")
}

/// Parse filter text. Blank input yields `Ok(None)`.
pub fn parse(input: &str) -> Result<Option<Filter>, FilterError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Ok(None);
    }
    let mut p = Parser { tokens, pos: 0, depth: 0 };
    let f = p.expr()?;
    match p.peek() {
        None => Ok(Some(f)),
        Some(t) => Err(FilterError::Unexpected { expected: "end of filter", found: t.describe() }),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Op(CompareOp),
    Lit(Literal),
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("'{s}'"),
            Token::Op(op) => format!("'{}'", op.as_sql()),
            Token::Lit(l) => format!("literal {l:?}"),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
        }
    }

    fn is_keyword(&self, kw: &str) -> bool {
        matches!(self, Token::Ident(s) if s.eq_ignore_ascii_case(kw))
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, FilterError> {
    let chars: Vec<char> = input.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => { out.push(Token::LParen); i += 1; }
            ')' => { out.push(Token::RParen); i += 1; }
            '=' => { out.push(Token::Op(CompareOp::Eq)); i += 1; }
            '!' if chars.get(i + 1) == Some(&'=') => { out.push(Token::Op(CompareOp::Ne)); i += 2; }
            '<' => match chars.get(i + 1) {
                Some('=') => { out.push(Token::Op(CompareOp::Le)); i += 2; }
                Some('>') => { out.push(Token::Op(CompareOp::Ne)); i += 2; }
                _ => { out.push(Token::Op(CompareOp::Lt)); i += 1; }
            },
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    out.push(Token::Op(CompareOp::Ge));
                    i += 2;
                } else {
                    out.push(Token::Op(CompareOp::Gt));
                    i += 1;
                }
            }
            '\'' => {
                let mut s = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(FilterError::UnterminatedString),
                        Some('\'') if chars.get(i + 1) == Some(&'\'') => { s.push('\''); i += 2; }
                        Some('\'') => { i += 1; break; }
                        Some(&ch) => { s.push(ch); i += 1; }
                    }
                }
                out.push(Token::Lit(Literal::Text(s)));
            }
            c if c.is_ascii_digit() || (c == '-' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())) => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let lit = if text.contains('.') {
                    text.parse::<f64>().map(Literal::Real)
                        .map_err(|_| FilterError::Unexpected { expected: "number", found: text.clone() })?
                } else {
                    text.parse::<i64>().map(Literal::Integer)
                        .map_err(|_| FilterError::Unexpected { expected: "number", found: text.clone() })?
                };
                out.push(Token::Lit(lit));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let tok = if word.eq_ignore_ascii_case("like") {
                    Token::Op(CompareOp::Like)
                } else if word.eq_ignore_ascii_case("true") {
                    Token::Lit(Literal::Bool(true))
                } else if word.eq_ignore_ascii_case("false") {
                    Token::Lit(Literal::Bool(false))
                } else {
                    Token::Ident(word)
                };
                out.push(tok);
            }
            other => return Err(FilterError::UnexpectedChar(other, i)),
        }
    }
    Ok(out)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_keyword(kw)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<Filter, FilterError> {
        let mut parts = vec![self.and_expr()?];
        while self.eat_keyword("or") {
            parts.push(self.and_expr()?);
        }
        Ok(if parts.len() == 1 { parts.remove(0) } else { Filter::Or(parts) })
    }

    fn and_expr(&mut self) -> Result<Filter, FilterError> {
        let mut parts = vec![self.term()?];
        while self.eat_keyword("and") {
            parts.push(self.term()?);
        }
        Ok(if parts.len() == 1 { parts.remove(0) } else { Filter::And(parts) })
    }

    fn term(&mut self) -> Result<Filter, FilterError> {
        match self.next() {
            Some(Token::LParen) => {
                if self.depth == MAX_DEPTH {
                    return Err(FilterError::TooDeep);
                }
                self.depth += 1;
                let inner = self.expr()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    other => Err(unexpected("')'", other)),
                }
            }
            Some(Token::Ident(column)) if !is_reserved(&column) => {
                if self.eat_keyword("is") {
                    let negated = self.eat_keyword("not");
                    if !self.eat_keyword("null") {
                        return Err(unexpected("NULL", self.next()));
                    }
                    return Ok(Filter::IsNull { column, negated });
                }
                let op = match self.next() {
                    Some(Token::Op(op)) => op,
                    other => return Err(unexpected("comparison operator", other)),
                };
                let value = match self.next() {
                    Some(Token::Lit(l)) => l,
                    other => return Err(unexpected("literal value", other)),
                };
                Ok(Filter::Compare { column, op, value })
            }
            Some(Token::Ident(word)) => Err(FilterError::InvalidIdentifier(word)),
            other => Err(unexpected("column name or '('", other)),
        }
    }
}

fn is_reserved(word: &str) -> bool {
    ["and", "or", "not", "is", "null"].iter().any(|kw| word.eq_ignore_ascii_case(kw))
}

fn unexpected(expected: &'static str, found: Option<Token>) -> FilterError {
    FilterError::Unexpected {
        expected,
        found: found.map(|t| t.describe()).unwrap_or_else(|| "end of filter".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(input: &str) -> (String, Vec<Literal>) {
        let f = parse(input).unwrap().unwrap();
        let mut params = Vec::new();
        let sql = f.to_sql(&mut params);
        (sql, params)
    }

    #[test]
    fn blank_filter_is_none() {
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn simple_comparison_binds_literal() {
        let (sql, params) = render("age >= 21");
        assert_eq!(sql, "[age] >= ?");
        assert_eq!(params, vec![Literal::Integer(21)]);
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let (sql, params) = render("a = 1 OR b = 'x' and c != 2.5");
        assert_eq!(sql, "([a] = ? OR ([b] = ? AND [c] <> ?))");
        assert_eq!(
            params,
            vec![Literal::Integer(1), Literal::Text("x".into()), Literal::Real(2.5)]
        );
    }

    #[test]
    fn parentheses_and_null_checks() {
        let (sql, params) = render("(name LIKE 'A%' or name is null) AND deleted_at IS NOT NULL");
        assert_eq!(
            sql,
            "(([name] LIKE ? OR [name] IS NULL) AND [deleted_at] IS NOT NULL)"
        );
        assert_eq!(params, vec![Literal::Text("A%".into())]);
    }

    #[test]
    fn quotes_in_strings_stay_inside_the_parameter() {
        let (sql, params) = render("name = 'x'' OR ''1''=''1'");
        assert_eq!(sql, "[name] = ?");
        assert_eq!(params, vec![Literal::Text("x' OR '1'='1".into())]);
    }

    #[test]
    fn injection_attempts_are_rejected() {
        assert!(parse("1=1; DROP TABLE records").is_err());
        assert!(parse("name = 'a' --").is_err());
        assert!(parse("\"name\" = 1").is_err());
        assert!(parse("[name] = 1").is_err());
        assert!(parse("name = other_column").is_err());
    }

    #[test]
    fn malformed_filters_report_what_was_expected() {
        let e = parse("age >").unwrap_err();
        assert_eq!(e.to_string(), "expected literal value, found end of filter");
        assert!(matches!(parse("(a = 1"), Err(FilterError::Unexpected { expected: "')'", .. })));
        assert_eq!(parse("name = 'open").unwrap_err(), FilterError::UnterminatedString);
        assert_eq!(parse("and = 1").unwrap_err(), FilterError::InvalidIdentifier("and".into()));
    }

    #[test]
    fn nesting_is_capped() {
        let nested = |n: usize| format!("{}a = 1{}", "(".repeat(n), ")".repeat(n));
        assert!(parse(&nested(MAX_DEPTH)).unwrap().is_some());
        assert_eq!(parse(&nested(MAX_DEPTH + 1)).unwrap_err(), FilterError::TooDeep);
        assert_eq!(parse(&nested(100_000)).unwrap_err(), FilterError::TooDeep);
        // unbalanced input stops at the cap too
        assert_eq!(parse(&"(".repeat(100_000)).unwrap_err(), FilterError::TooDeep);
    }

    #[test]
    fn negative_numbers_and_booleans() {
        let (_, params) = render("delta > -3 and active = TRUE");
        assert_eq!(params, vec![Literal::Integer(-3), Literal::Bool(true)]);
    }

    #[test]
    fn identifier_allow_list() {
        assert!(is_identifier("col_1"));
        assert!(is_identifier("_x"));
        assert!(!is_identifier("1col"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier("a\"b"));
        assert!(!is_identifier(""));
    }
}
