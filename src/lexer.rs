use chumsky::prelude::*;

use crate::diagnostic::{Diagnostic, Label, Span};

/// Tokens of the host language. Localized source text lexes to the same
/// stream: localized words come out as `Name` tokens, which is what the
/// translator rewrites. Host keywords get dedicated tokens and are never
/// rewritten.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    If,
    Elif,
    Else,
    While,
    For,
    In,
    Def,
    Class,
    Return,
    Break,
    Continue,
    Pass,
    With,
    As,
    Import,
    From,
    Try,
    Except,
    Finally,
    Raise,
    Assert,
    Global,
    Nonlocal,
    Lambda,
    Yield,
    And,
    Or,
    Not,
    TrueLit,
    FalseLit,
    NoneLit,

    Name(String),
    Number(f64, bool), // (value, is_float)
    Str(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
    Assign,
    Eq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Semicolon,

    // Structure
    Newline,
    Indent,
    Dedent,
}

impl Token {
    /// Human-readable description used in parse diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Token::Name(name) => format!("identifier `{}`", name),
            Token::Number(..) => "number".to_string(),
            Token::Str(_) => "string".to_string(),
            Token::Newline => "end of line".to_string(),
            Token::Indent => "indent".to_string(),
            Token::Dedent => "end of block".to_string(),
            Token::If => "keyword `if`".to_string(),
            Token::Elif => "keyword `elif`".to_string(),
            Token::Else => "keyword `else`".to_string(),
            Token::While => "keyword `while`".to_string(),
            Token::For => "keyword `for`".to_string(),
            Token::In => "keyword `in`".to_string(),
            Token::Def => "keyword `def`".to_string(),
            Token::Class => "keyword `class`".to_string(),
            Token::Return => "keyword `return`".to_string(),
            Token::Break => "keyword `break`".to_string(),
            Token::Continue => "keyword `continue`".to_string(),
            Token::Pass => "keyword `pass`".to_string(),
            Token::With => "keyword `with`".to_string(),
            Token::As => "keyword `as`".to_string(),
            Token::Import => "keyword `import`".to_string(),
            Token::From => "keyword `from`".to_string(),
            Token::Try => "keyword `try`".to_string(),
            Token::Except => "keyword `except`".to_string(),
            Token::Finally => "keyword `finally`".to_string(),
            Token::Raise => "keyword `raise`".to_string(),
            Token::Assert => "keyword `assert`".to_string(),
            Token::Global => "keyword `global`".to_string(),
            Token::Nonlocal => "keyword `nonlocal`".to_string(),
            Token::Lambda => "keyword `lambda`".to_string(),
            Token::Yield => "keyword `yield`".to_string(),
            Token::And => "keyword `and`".to_string(),
            Token::Or => "keyword `or`".to_string(),
            Token::Not => "keyword `not`".to_string(),
            Token::TrueLit => "`True`".to_string(),
            Token::FalseLit => "`False`".to_string(),
            Token::NoneLit => "`None`".to_string(),
            other => format!("`{}`", other.glyph()),
        }
    }

    fn glyph(&self) -> &'static str {
        match self {
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::DoubleSlash => "//",
            Token::Percent => "%",
            Token::DoubleStar => "**",
            Token::Assign => "=",
            Token::Eq => "==",
            Token::NotEq => "!=",
            Token::Less => "<",
            Token::Greater => ">",
            Token::LessEq => "<=",
            Token::GreaterEq => ">=",
            Token::PlusEq => "+=",
            Token::MinusEq => "-=",
            Token::StarEq => "*=",
            Token::SlashEq => "/=",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Dot => ".",
            Token::Semicolon => ";",
            _ => "?",
        }
    }
}

/// Failure to tokenize the raw source text.
#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

impl LexError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.message.clone())
            .with_code("E0001")
            .with_label(Label::primary(self.span, ""))
    }
}

fn lexer<'a>() -> impl Parser<'a, &'a str, Vec<(Token, SimpleSpan)>, extra::Err<Simple<'a, char>>> {
    let number = text::int(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .map(|s: &str| Token::Number(s.parse().unwrap(), s.contains('.')));

    let escape = just('\\').ignore_then(choice((
        just('\\'),
        just('\''),
        just('"'),
        just('n').to('\n'),
        just('r').to('\r'),
        just('t').to('\t'),
        just('0').to('\0'),
    )));

    let double_quoted = just('"')
        .ignore_then(none_of("\\\"\n").or(escape.clone()).repeated().collect::<String>())
        .then_ignore(just('"'));
    let single_quoted = just('\'')
        .ignore_then(none_of("\\'\n").or(escape).repeated().collect::<String>())
        .then_ignore(just('\''));
    let string = double_quoted.or(single_quoted).map(Token::Str);

    // Identifiers admit any alphabetic character, so accented localized
    // words lex as ordinary names.
    let ident = any()
        .filter(|c: &char| c.is_alphabetic() || *c == '_')
        .then(
            any()
                .filter(|c: &char| c.is_alphanumeric() || *c == '_')
                .repeated(),
        )
        .to_slice()
        .map(|s: &str| match s {
            "if" => Token::If,
            "elif" => Token::Elif,
            "else" => Token::Else,
            "while" => Token::While,
            "for" => Token::For,
            "in" => Token::In,
            "def" => Token::Def,
            "class" => Token::Class,
            "return" => Token::Return,
            "break" => Token::Break,
            "continue" => Token::Continue,
            "pass" => Token::Pass,
            "with" => Token::With,
            "as" => Token::As,
            "import" => Token::Import,
            "from" => Token::From,
            "try" => Token::Try,
            "except" => Token::Except,
            "finally" => Token::Finally,
            "raise" => Token::Raise,
            "assert" => Token::Assert,
            "global" => Token::Global,
            "nonlocal" => Token::Nonlocal,
            "lambda" => Token::Lambda,
            "yield" => Token::Yield,
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "True" => Token::TrueLit,
            "False" => Token::FalseLit,
            "None" => Token::NoneLit,
            _ => Token::Name(s.to_string()),
        });

    let op_double = choice((
        just("**").to(Token::DoubleStar),
        just("//").to(Token::DoubleSlash),
        just("==").to(Token::Eq),
        just("!=").to(Token::NotEq),
        just("<=").to(Token::LessEq),
        just(">=").to(Token::GreaterEq),
        just("+=").to(Token::PlusEq),
        just("-=").to(Token::MinusEq),
        just("*=").to(Token::StarEq),
        just("/=").to(Token::SlashEq),
    ));

    let op_single = choice((
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Star),
        just('/').to(Token::Slash),
        just('%').to(Token::Percent),
        just('=').to(Token::Assign),
        just('<').to(Token::Less),
        just('>').to(Token::Greater),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
        just('{').to(Token::LBrace),
        just('}').to(Token::RBrace),
        just(',').to(Token::Comma),
        just(':').to(Token::Colon),
        just('.').to(Token::Dot),
        just(';').to(Token::Semicolon),
    ));

    let newline = just('\n').to(Token::Newline);

    let token = choice((newline, number, string, ident, op_double, op_single))
        .map_with(|tok, e| (tok, e.span()));

    let inline_ws = one_of(" \t\r").ignored();
    let comment = just('#').then(none_of("\n").repeated()).ignored();
    let padding = inline_ws.or(comment).repeated();

    token.padded_by(padding).repeated().collect().then_ignore(end())
}

/// Lex raw source text into a flat token stream. Newlines are tokens;
/// indentation is not interpreted here (see [`layout`]).
pub fn lex(source: &str) -> Result<Vec<(Token, Span)>, LexError> {
    let (output, errors) = lexer().parse(source).into_output_errors();
    if let Some(err) = errors.first() {
        let span = err.span();
        let message = match err.found() {
            Some(c) => format!("unexpected character {:?}", c),
            None => "unexpected end of input while scanning".to_string(),
        };
        return Err(LexError {
            message,
            span: Span::new(span.start, span.end),
        });
    }
    match output {
        Some(tokens) => Ok(tokens
            .into_iter()
            .map(|(tok, span)| (tok, Span::new(span.start, span.end)))
            .collect()),
        None => Err(LexError {
            message: "failed to tokenize input".to_string(),
            span: Span::dummy(),
        }),
    }
}

fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn indent_width(source: &str, offset: usize) -> usize {
    let start = line_start(source, offset);
    let mut col = 0;
    for ch in source[start..offset].chars() {
        if ch == '\t' {
            col = col / 8 * 8 + 8;
        } else {
            col += 1;
        }
    }
    col
}

/// Convert a raw token stream into the parser's block-structured stream:
/// suppresses newlines inside brackets, drops blank lines, and turns
/// line-leading indentation into `Indent`/`Dedent` tokens. An open bracket
/// at end of input suppresses the final newline and dedents, so the parser
/// reports end-of-input there (which the interactive driver reads as
/// "needs more lines").
pub fn layout(tokens: Vec<(Token, Span)>, source: &str) -> Result<Vec<(Token, Span)>, LexError> {
    let mut out = Vec::with_capacity(tokens.len() + 8);
    let mut indents: Vec<usize> = vec![0];
    let mut depth = 0usize;
    let mut line_open = false;

    for (token, span) in tokens {
        if token == Token::Newline {
            if depth == 0 && line_open {
                out.push((Token::Newline, span));
                line_open = false;
            }
            continue;
        }

        if depth == 0 && !line_open {
            let width = indent_width(source, span.start);
            let current = *indents.last().unwrap();
            if width > current {
                indents.push(width);
                out.push((
                    Token::Indent,
                    Span::new(line_start(source, span.start), span.start),
                ));
            } else if width < current {
                while indents.len() > 1 && width < *indents.last().unwrap() {
                    indents.pop();
                    out.push((Token::Dedent, Span::new(span.start, span.start)));
                }
                if width != *indents.last().unwrap() {
                    return Err(LexError {
                        message: "unindent does not match any outer indentation level"
                            .to_string(),
                        span,
                    });
                }
            }
            line_open = true;
        }

        match token {
            Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
            Token::RParen | Token::RBracket | Token::RBrace => {
                depth = depth.saturating_sub(1)
            }
            _ => {}
        }
        out.push((token, span));
    }

    if depth == 0 {
        let eof = Span::new(source.len(), source.len());
        if line_open {
            out.push((Token::Newline, eof));
        }
        while indents.len() > 1 {
            indents.pop();
            out.push((Token::Dedent, eof));
        }
    }

    Ok(out)
}
