//! Hand-written lexer. Lexer failures surface as `ErrorKind::Syntax`
//! (spec §6/§7).

use crate::error::{CodeLoc, EvalError, EvalResult};
use crate::value::QuoteStyle;

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Number(f64),
    Str(String, QuoteStyle),
    Ident(String),
    If,
    ElseIf,
    Else,
    End,
    Plus,
    Minus,
    Star,
    Slash,
    Backslash,
    DotStar,
    DotSlash,
    DotBackslash,
    Caret,
    DotCaret,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    AndAnd,
    OrOr,
    Amp,
    Pipe,
    Tilde,
    Assign,
    Comma,
    Semicolon,
    Colon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Dot,
    Transpose,
    DotTranspose,
    Newline,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: Tok,
    pub loc: CodeLoc,
    /// Raw lexeme text, needed when a line turns out to be command syntax
    /// (`clear x y`) rather than an expression statement.
    pub text: String,
}

/// Whether the previous significant token means a following `'` should be
/// read as a transpose operator rather than the start of a string. The
/// same set of tokens also marks "a value just ended here" for the
/// bracket-interior whitespace-as-separator rule below.
fn prev_allows_transpose(prev: Option<&Tok>) -> bool {
    matches!(
        prev,
        Some(Tok::Ident(_))
            | Some(Tok::Number(_))
            | Some(Tok::RParen)
            | Some(Tok::RBracket)
            | Some(Tok::RBrace)
            | Some(Tok::Transpose)
            | Some(Tok::DotTranspose)
            | Some(Tok::End)
    )
}

/// Which bracket kind we're nested inside, for the whitespace-separator
/// rule: `[`/`{` rows allow a bare space to separate elements, `(` call
/// argument lists never do (those always need `,`).
#[derive(Clone, Copy, PartialEq)]
enum BracketCtx {
    Matrix,
    Paren,
}

/// True when the next significant character (the first non-space/tab at
/// or after `chars[j]`) begins a new matrix element rather than
/// continuing the previous one as a binary operator. `+`/`-` are
/// ambiguous: `a -b` is two elements, `a - b` is one, disambiguated by
/// whether a space follows the sign.
fn starts_new_matrix_element(chars: &[char], j: usize) -> bool {
    let Some(&c) = chars.get(j) else { return false };
    match c {
        ',' | ';' | ']' | '}' | ')' => false,
        '*' | '/' | '\\' | '^' | '<' | '>' | '=' | '&' | '|' | ':' => false,
        '.' => chars.get(j + 1).is_some_and(|n| n.is_ascii_digit()),
        '+' | '-' => !chars.get(j + 1).is_some_and(|n| *n == ' ' || *n == '\t'),
        c if c.is_alphanumeric() || c == '_' || c == '\'' || c == '"' || c == '[' || c == '{' || c == '(' || c == '~' => true,
        _ => false,
    }
}

pub fn lex(source: &str) -> EvalResult<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0usize;
    let mut line = 1u32;
    let mut col = 1u32;
    let mut out = Vec::new();
    let mut brackets: Vec<BracketCtx> = Vec::new();

    macro_rules! push {
        ($kind:expr, $text:expr, $start_line:expr, $start_col:expr) => {
            out.push(Token { kind: $kind, loc: CodeLoc { line: $start_line, column: $start_col }, text: $text })
        };
    }

    while i < chars.len() {
        let (start_line, start_col) = (line, col);
        let c = chars[i];
        if c == '\n' {
            push!(Tok::Newline, "\n".to_string(), start_line, start_col);
            i += 1;
            line += 1;
            col = 1;
            continue;
        }
        if c == '\r' {
            i += 1;
            col += 1;
            continue;
        }
        if c.is_whitespace() {
            if matches!(brackets.last(), Some(BracketCtx::Matrix)) && prev_allows_transpose(out.last().map(|t| &t.kind)) {
                let mut j = i;
                while j < chars.len() && (chars[j] == ' ' || chars[j] == '\t') {
                    j += 1;
                }
                if starts_new_matrix_element(&chars, j) {
                    push!(Tok::Comma, ",".to_string(), start_line, start_col);
                }
            }
            i += 1;
            col += 1;
            continue;
        }
        if c == '%' || (c == '#' && chars.get(i + 1) != Some(&'(')) {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())) {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            if i < chars.len() && chars[i] == '.' {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mark = i;
                i += 1;
                if i < chars.len() && (chars[i] == '+' || chars[i] == '-') {
                    i += 1;
                }
                if i < chars.len() && chars[i].is_ascii_digit() {
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                } else {
                    i = mark;
                }
            }
            let imaginary = i < chars.len() && (chars[i] == 'i' || chars[i] == 'j');
            let text: String = chars[start..i].iter().collect();
            let n: f64 = text.parse().map_err(|_| EvalError::syntax(format!("invalid number literal '{text}'")).with_loc(CodeLoc { line: start_line, column: start_col }))?;
            if imaginary {
                i += 1;
                // The parser recognizes the trailing `i`/`j` in `text` and
                // desugars this into `n * i` rather than a distinct node.
                push!(Tok::Number(n), format!("{text}i"), start_line, start_col);
            } else {
                push!(Tok::Number(n), text, start_line, start_col);
            }
            col += (i - start) as u32;
            continue;
        }
        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            col += (i - start) as u32;
            let kind = match text.as_str() {
                "if" => Tok::If,
                "elseif" => Tok::ElseIf,
                "else" => Tok::Else,
                "end" | "endif" | "endfunction" => Tok::End,
                _ => Tok::Ident(text.clone()),
            };
            push!(kind, text, start_line, start_col);
            continue;
        }
        if c == '\'' && !prev_allows_transpose(out.last().map(|t| &t.kind)) {
            i += 1;
            col += 1;
            let start_text = i;
            let mut s = String::new();
            loop {
                if i >= chars.len() {
                    return Err(EvalError::syntax("unterminated string literal").with_loc(CodeLoc { line: start_line, column: start_col }));
                }
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        s.push('\'');
                        i += 2;
                        col += 2;
                        continue;
                    }
                    i += 1;
                    col += 1;
                    break;
                }
                s.push(chars[i]);
                i += 1;
                col += 1;
            }
            let _ = start_text;
            push!(Tok::Str(s.clone(), QuoteStyle::Single), s, start_line, start_col);
            continue;
        }
        if c == '"' {
            i += 1;
            col += 1;
            let mut s = String::new();
            loop {
                if i >= chars.len() {
                    return Err(EvalError::syntax("unterminated string literal").with_loc(CodeLoc { line: start_line, column: start_col }));
                }
                if chars[i] == '"' {
                    i += 1;
                    col += 1;
                    break;
                }
                s.push(chars[i]);
                i += 1;
                col += 1;
            }
            push!(Tok::Str(s.clone(), QuoteStyle::Double), s, start_line, start_col);
            continue;
        }

        macro_rules! two {
            ($a:expr, $b:expr, $two:expr, $one:expr) => {{
                if chars.get(i + 1) == Some(&$b) {
                    push!($two, format!("{}{}", $a, $b), start_line, start_col);
                    i += 2;
                    col += 2;
                } else {
                    push!($one, $a.to_string(), start_line, start_col);
                    i += 1;
                    col += 1;
                }
            }};
        }

        match c {
            '+' => {
                push!(Tok::Plus, "+".to_string(), start_line, start_col);
                i += 1;
                col += 1;
            }
            '-' => {
                push!(Tok::Minus, "-".to_string(), start_line, start_col);
                i += 1;
                col += 1;
            }
            '*' => {
                push!(Tok::Star, "*".to_string(), start_line, start_col);
                i += 1;
                col += 1;
            }
            '/' => {
                push!(Tok::Slash, "/".to_string(), start_line, start_col);
                i += 1;
                col += 1;
            }
            '\\' => {
                push!(Tok::Backslash, "\\".to_string(), start_line, start_col);
                i += 1;
                col += 1;
            }
            '^' => {
                push!(Tok::Caret, "^".to_string(), start_line, start_col);
                i += 1;
                col += 1;
            }
            '=' => two!('=', '=', Tok::EqEq, Tok::Assign),
            '<' => two!('<', '=', Tok::Le, Tok::Lt),
            '>' => two!('>', '=', Tok::Ge, Tok::Gt),
            '~' => two!('~', '=', Tok::Ne, Tok::Tilde),
            '&' => two!('&', '&', Tok::AndAnd, Tok::Amp),
            '|' => two!('|', '|', Tok::OrOr, Tok::Pipe),
            ',' => {
                push!(Tok::Comma, ",".to_string(), start_line, start_col);
                i += 1;
                col += 1;
            }
            ';' => {
                push!(Tok::Semicolon, ";".to_string(), start_line, start_col);
                i += 1;
                col += 1;
            }
            ':' => {
                push!(Tok::Colon, ":".to_string(), start_line, start_col);
                i += 1;
                col += 1;
            }
            '(' => {
                push!(Tok::LParen, "(".to_string(), start_line, start_col);
                brackets.push(BracketCtx::Paren);
                i += 1;
                col += 1;
            }
            ')' => {
                push!(Tok::RParen, ")".to_string(), start_line, start_col);
                brackets.pop();
                i += 1;
                col += 1;
            }
            '[' => {
                push!(Tok::LBracket, "[".to_string(), start_line, start_col);
                brackets.push(BracketCtx::Matrix);
                i += 1;
                col += 1;
            }
            ']' => {
                push!(Tok::RBracket, "]".to_string(), start_line, start_col);
                brackets.pop();
                i += 1;
                col += 1;
            }
            '{' => {
                push!(Tok::LBrace, "{".to_string(), start_line, start_col);
                brackets.push(BracketCtx::Matrix);
                i += 1;
                col += 1;
            }
            '}' => {
                push!(Tok::RBrace, "}".to_string(), start_line, start_col);
                brackets.pop();
                i += 1;
                col += 1;
            }
            '\'' => {
                push!(Tok::Transpose, "'".to_string(), start_line, start_col);
                i += 1;
                col += 1;
            }
            '.' => {
                if chars.get(i + 1) == Some(&'*') {
                    push!(Tok::DotStar, ".*".to_string(), start_line, start_col);
                    i += 2;
                    col += 2;
                } else if chars.get(i + 1) == Some(&'/') {
                    push!(Tok::DotSlash, "./".to_string(), start_line, start_col);
                    i += 2;
                    col += 2;
                } else if chars.get(i + 1) == Some(&'\\') {
                    push!(Tok::DotBackslash, ".\\".to_string(), start_line, start_col);
                    i += 2;
                    col += 2;
                } else if chars.get(i + 1) == Some(&'^') {
                    push!(Tok::DotCaret, ".^".to_string(), start_line, start_col);
                    i += 2;
                    col += 2;
                } else if chars.get(i + 1) == Some(&'\'') {
                    push!(Tok::DotTranspose, ".'".to_string(), start_line, start_col);
                    i += 2;
                    col += 2;
                } else {
                    push!(Tok::Dot, ".".to_string(), start_line, start_col);
                    i += 1;
                    col += 1;
                }
            }
            other => {
                return Err(EvalError::syntax(format!("unexpected character '{other}'")).with_loc(CodeLoc { line: start_line, column: start_col }));
            }
        }
    }
    out.push(Token { kind: Tok::Eof, loc: CodeLoc { line, column: col }, text: String::new() });
    Ok(out)
}
