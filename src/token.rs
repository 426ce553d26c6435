//! Module defining the lexer: source text to a token stream, with
//! significant indentation converted into explicit INDENT/DEDENT markers.

use crate::error::{ConvoError, ConvoResult};

/// The kind of a single token. Literal payloads (numbers, strings,
/// identifiers) live on the variant itself rather than alongside it on
/// [`Token`], since most kinds carry none.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    Str(String),
    True,
    False,
    Null,

    // Identifiers
    Identifier(String),

    // Keywords
    Say,
    Let,
    Be,
    Define,
    With,
    Call,
    If,
    Then,
    Else,
    While,
    Do,
    Each,
    ForEach,
    In,
    Try,
    Catch,
    Throw,
    Return,
    Import,
    Stop,
    New,
    And,
    Or,
    Not,

    // Comparisons (multi-word, merged by the lexer)
    Equals,
    NotEquals,
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,

    // Punctuation / operators
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Assign,

    // Structural
    Newline,
    Indent,
    Dedent,
    Eof,
}

/// A single token: its kind and the 1-based source line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

impl Token {
    fn new(kind: TokenKind, line: usize) -> Self {
        Self { kind, line }
    }
}

/// A bare word scanned off the source before keyword resolution, kept
/// around long enough for the two-word lookahead (`greater than`,
/// `for each`, `not equals`, ...) described in §4.1 of the spec.
enum Word {
    Exact(TokenKind),
    /// One half of a multi-word comparison/keyword; resolved in
    /// [`Lexer::merge_multi_word`] by peeking at the following word.
    Greater,
    Less,
    For,
    Not,
}

fn lookup_keyword(word: &str) -> Option<Word> {
    use TokenKind::*;
    Some(match word {
        "Say" => Word::Exact(Say),
        "Let" => Word::Exact(Let),
        "be" => Word::Exact(Be),
        "Define" => Word::Exact(Define),
        "with" => Word::Exact(With),
        "Call" => Word::Exact(Call),
        "If" => Word::Exact(If),
        "then" => Word::Exact(Then),
        "Else" => Word::Exact(Else),
        "While" => Word::Exact(While),
        "do" => Word::Exact(Do),
        "each" => Word::Exact(Each),
        "in" => Word::Exact(In),
        "Try" => Word::Exact(Try),
        "Catch" => Word::Exact(Catch),
        "Throw" => Word::Exact(Throw),
        "Return" => Word::Exact(Return),
        "Import" => Word::Exact(Import),
        "Stop" => Word::Exact(Stop),
        "New" => Word::Exact(New),
        "and" => Word::Exact(And),
        "or" => Word::Exact(Or),
        "equals" => Word::Exact(Equals),
        "true" => Word::Exact(True),
        "false" => Word::Exact(False),
        "null" => Word::Exact(Null),
        "greater" => Word::Greater,
        "less" => Word::Less,
        "for" | "For" => Word::For,
        "not" => Word::Not,
        _ => return None,
    })
}

/// All documented keyword spellings, used only to detect a case-insensitive
/// collision with a would-be identifier (see the keyword case-sensitivity
/// design note: identifiers may not shadow a keyword under any casing).
const ALL_KEYWORD_SPELLINGS: &[&str] = &[
    "Say", "Let", "be", "Define", "with", "Call", "If", "then", "Else", "While", "do", "For",
    "each", "in", "Try", "Catch", "Throw", "Return", "Import", "Stop", "New", "and", "or", "not",
    "greater", "less", "equals", "than", "true", "false", "null",
];

/// Tokenizes Convo source text, synthesizing `Indent`/`Dedent` tokens from
/// leading whitespace per line. [`Lexer::tokenize`] consumes the whole
/// source at once; there is no streaming/incremental mode.
pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
    indent_stack: Vec<usize>,
    tab_width: usize,
    strict_keywords: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str, tab_width: usize, strict_keywords: bool) -> Self {
        Self {
            src: src.as_bytes(),
            pos: 0,
            line: 1,
            indent_stack: vec![0],
            tab_width: tab_width.max(1),
            strict_keywords,
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        Some(b)
    }

    /// Tokenize the entire source, returning a flat token list ending in `Eof`.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn tokenize(mut self) -> ConvoResult<Vec<Token>> {
        let mut raw: Vec<(RawTok, usize)> = Vec::new();
        let mut at_line_start = true;

        loop {
            if at_line_start {
                at_line_start = false;
                self.handle_indentation(&mut raw)?;
            }

            let Some(b) = self.peek_byte() else {
                while self.indent_stack.len() > 1 {
                    self.indent_stack.pop();
                    raw.push((RawTok::Token(TokenKind::Dedent), self.line));
                }
                raw.push((RawTok::Token(TokenKind::Eof), self.line));
                break;
            };

            match b {
                b' ' | b'\t' | b'\r' => {
                    self.advance();
                }
                b'\n' => {
                    self.advance();
                    raw.push((RawTok::Token(TokenKind::Newline), self.line));
                    self.line += 1;
                    at_line_start = true;
                }
                b'#' => {
                    while !matches!(self.peek_byte(), None | Some(b'\n')) {
                        self.advance();
                    }
                }
                b'"' => raw.push((self.scan_string()?, self.line)),
                b'0'..=b'9' => raw.push((self.scan_number(), self.line)),
                b'+' => raw.push(self.single(TokenKind::Plus)),
                b'-' => raw.push(self.single(TokenKind::Minus)),
                b'*' => raw.push(self.single(TokenKind::Star)),
                b'/' => raw.push(self.single(TokenKind::Slash)),
                b'(' => raw.push(self.single(TokenKind::LParen)),
                b')' => raw.push(self.single(TokenKind::RParen)),
                b'[' => raw.push(self.single(TokenKind::LBracket)),
                b']' => raw.push(self.single(TokenKind::RBracket)),
                b'{' => raw.push(self.single(TokenKind::LBrace)),
                b'}' => raw.push(self.single(TokenKind::RBrace)),
                b',' => raw.push(self.single(TokenKind::Comma)),
                b':' => raw.push(self.single(TokenKind::Colon)),
                b'.' => raw.push(self.single(TokenKind::Dot)),
                b'=' => raw.push(self.single(TokenKind::Assign)),
                c if c.is_ascii_alphabetic() || c == b'_' => {
                    let line = self.line;
                    raw.push((self.scan_word()?, line));
                }
                c => {
                    return Err(ConvoError::syntax(
                        format!("invalid character '{}'", c as char),
                        self.line,
                    )
                    .into())
                }
            }
        }

        let tokens = Self::merge_multi_word(raw);
        tracing::debug!(token_count = tokens.len(), "lexed source");
        Ok(tokens)
    }

    fn single(&mut self, kind: TokenKind) -> (RawTok, usize) {
        let line = self.line;
        self.advance();
        (RawTok::Token(kind), line)
    }

    /// Measure leading whitespace on the current line and emit the
    /// Indent/Dedent tokens it implies. Blank and comment-only lines do
    /// not affect the indentation stack (§4.1).
    fn handle_indentation(&mut self, raw: &mut Vec<(RawTok, usize)>) -> ConvoResult<()> {
        let mut col = 0usize;
        loop {
            match self.peek_byte() {
                Some(b' ') => {
                    col += 1;
                    self.advance();
                }
                Some(b'\t') => {
                    col += self.tab_width;
                    self.advance();
                }
                _ => break,
            }
        }

        match self.peek_byte() {
            None | Some(b'\n') | Some(b'#') => Ok(()),
            Some(_) => {
                let top = *self.indent_stack.last().unwrap();
                if col > top {
                    self.indent_stack.push(col);
                    raw.push((RawTok::Token(TokenKind::Indent), self.line));
                } else {
                    while col < *self.indent_stack.last().unwrap() {
                        self.indent_stack.pop();
                        raw.push((RawTok::Token(TokenKind::Dedent), self.line));
                    }
                    if col != *self.indent_stack.last().unwrap() {
                        return Err(ConvoError::syntax("inconsistent dedent", self.line).into());
                    }
                }
                Ok(())
            }
        }
    }

    fn scan_string(&mut self) -> ConvoResult<RawTok> {
        let line = self.line;
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.advance() {
                None | Some(b'\n') => {
                    return Err(ConvoError::syntax("unterminated string", line).into())
                }
                Some(b'"') => break,
                Some(b'\\') => match self.advance() {
                    Some(b'\\') => s.push('\\'),
                    Some(b'"') => s.push('"'),
                    Some(b'n') => s.push('\n'),
                    Some(b't') => s.push('\t'),
                    Some(c) => {
                        return Err(ConvoError::syntax(
                            format!("invalid escape sequence '\\{}'", c as char),
                            line,
                        )
                        .into())
                    }
                    None => return Err(ConvoError::syntax("unterminated string", line).into()),
                },
                Some(c) => s.push(c as char),
            }
        }
        Ok(RawTok::Token(TokenKind::Str(s)))
    }

    fn scan_number(&mut self) -> RawTok {
        let start = self.pos;
        while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
            self.advance();
        }
        if self.peek_byte() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            self.advance();
            while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
                self.advance();
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap();
        let value: f64 = text.parse().expect("lexer only admits valid number text");
        RawTok::Token(TokenKind::Number(value))
    }

    fn scan_word(&mut self) -> ConvoResult<RawTok> {
        let line = self.line;
        let start = self.pos;
        while matches!(self.peek_byte(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
            self.advance();
        }
        let word = std::str::from_utf8(&self.src[start..self.pos]).unwrap().to_string();

        if let Some(w) = lookup_keyword(&word) {
            return Ok(match w {
                Word::Exact(kind) => RawTok::Token(kind),
                Word::Greater => RawTok::Greater,
                Word::Less => RawTok::Less,
                Word::For => RawTok::For,
                Word::Not => RawTok::Not,
            });
        }

        if self.strict_keywords {
            if let Some(spelling) = ALL_KEYWORD_SPELLINGS
                .iter()
                .find(|k| k.eq_ignore_ascii_case(&word))
            {
                return Err(ConvoError::syntax(
                    format!("identifier '{}' collides with keyword '{}'", word, spelling),
                    line,
                )
                .into());
            }
        }

        Ok(RawTok::Word(word))
    }

    /// Second pass: fold `greater`/`less` + `than`/`equal`, `not` + `equals`,
    /// and `for` + `each` into their single comparison/keyword tokens.
    fn merge_multi_word(raw: Vec<(RawTok, usize)>) -> Vec<Token> {
        let mut out = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            let (cur, line) = &raw[i];
            let line = *line;
            match cur {
                RawTok::Greater | RawTok::Less => {
                    let is_greater = matches!(cur, RawTok::Greater);
                    match raw.get(i + 1).map(|(t, _)| t) {
                        Some(RawTok::Word(w)) if w == "than" => {
                            out.push(Token::new(
                                if is_greater { TokenKind::GreaterThan } else { TokenKind::LessThan },
                                line,
                            ));
                            i += 2;
                        }
                        Some(RawTok::Word(w)) if w == "equal" => {
                            out.push(Token::new(
                                if is_greater { TokenKind::GreaterEqual } else { TokenKind::LessEqual },
                                line,
                            ));
                            i += 2;
                        }
                        _ => {
                            out.push(Token::new(
                                if is_greater { TokenKind::GreaterThan } else { TokenKind::LessThan },
                                line,
                            ));
                            i += 1;
                        }
                    }
                }
                RawTok::Not => {
                    if matches!(raw.get(i + 1).map(|(t, _)| t), Some(RawTok::Token(TokenKind::Equals))) {
                        out.push(Token::new(TokenKind::NotEquals, line));
                        i += 2;
                    } else {
                        out.push(Token::new(TokenKind::Not, line));
                        i += 1;
                    }
                }
                RawTok::For => {
                    match raw.get(i + 1).map(|(t, _)| t) {
                        Some(RawTok::Token(TokenKind::Each)) => {
                            out.push(Token::new(TokenKind::ForEach, line));
                            i += 2;
                        }
                        _ => {
                            // Bare `for` without `each`: surface as an identifier so the
                            // parser reports the usual "unexpected token" diagnostic.
                            out.push(Token::new(TokenKind::Identifier("for".into()), line));
                            i += 1;
                        }
                    }
                }
                RawTok::Token(k) => {
                    out.push(Token::new(k.clone(), line));
                    i += 1;
                }
                RawTok::Word(w) => {
                    out.push(Token::new(TokenKind::Identifier(w.clone()), line));
                    i += 1;
                }
            }
        }
        out
    }
}

enum RawTok {
    Token(TokenKind),
    Greater,
    Less,
    For,
    Not,
    Word(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src, 4, true)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_say_string() {
        let k = kinds("Say \"hi\"\n");
        assert_eq!(
            k,
            vec![TokenKind::Say, TokenKind::Str("hi".into()), TokenKind::Newline, TokenKind::Eof]
        );
    }

    #[test]
    fn merges_greater_than() {
        let k = kinds("Say x greater than 3\n");
        assert!(k.contains(&TokenKind::GreaterThan));
    }

    #[test]
    fn merges_less_equal() {
        let k = kinds("Say x less equal 3\n");
        assert!(k.contains(&TokenKind::LessEqual));
    }

    #[test]
    fn merges_not_equals() {
        let k = kinds("Say x not equals 3\n");
        assert!(k.contains(&TokenKind::NotEquals));
    }

    #[test]
    fn merges_for_each() {
        let k = kinds("For each v in xs do:\n");
        assert_eq!(k[0], TokenKind::ForEach);
    }

    #[test]
    fn indentation_produces_indent_dedent() {
        let k = kinds("If true then:\n    Say 1\nSay 2\n");
        assert!(k.contains(&TokenKind::Indent));
        assert!(k.contains(&TokenKind::Dedent));
    }

    #[test]
    fn comment_only_and_blank_lines_do_not_affect_indentation() {
        let k = kinds("If true then:\n    Say 1\n\n    # a comment\n    Say 2\nSay 3\n");
        // Only one Indent (entering the block) and one Dedent (leaving it) total.
        assert_eq!(k.iter().filter(|t| **t == TokenKind::Indent).count(), 1);
        assert_eq!(k.iter().filter(|t| **t == TokenKind::Dedent).count(), 1);
    }

    #[test]
    fn strict_keywords_rejects_case_collision() {
        let err = Lexer::new("Let SAY be 1\n", 4, true).tokenize();
        assert!(err.is_err());
    }

    #[test]
    fn division_by_operator_is_distinct_from_comment() {
        let k = kinds("Say 4 / 2 # divide\n");
        assert!(k.contains(&TokenKind::Slash));
    }

    #[test]
    fn unterminated_string_errors_with_line() {
        let err = Lexer::new("Say \"oops\n", 4, true).tokenize().unwrap_err();
        assert_eq!(err.line, 1);
    }
}
