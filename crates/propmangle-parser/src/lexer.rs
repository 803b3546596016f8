//! Lexer (tokenizer) for JavaScript source.
//!
//! The lexer converts source text into a stream of tokens.
//! It's called on-demand by the parser, not upfront, which enables
//! context-sensitive tokenization (e.g., regex vs division, template
//! continuations after `}`).

use crate::span::Span;
use crate::token::{keyword_from_str, Token, TokenKind};

/// The lexer state.
#[derive(Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    /// Source code as bytes (for fast indexing).
    bytes: &'a [u8],
    /// Current byte position.
    pos: usize,
    /// Start position of the current token.
    token_start: usize,
    /// Whether the previous token allows a regex to follow.
    /// This disambiguates `/regex/` vs `a / b`.
    allow_regex: bool,
    /// Whether whitespace skipped before the current token contained a newline.
    saw_newline: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            token_start: 0,
            allow_regex: true,
            saw_newline: false,
        }
    }

    /// Get the current byte position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token {
        self.saw_newline = false;
        self.skip_whitespace_and_comments();
        self.token_start = self.pos;

        if self.is_eof() {
            return self.make_token(TokenKind::Eof);
        }

        let ch = self.current();
        let kind = match ch {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' | b'\\' => self.scan_identifier(),
            b'0'..=b'9' => self.scan_number(),
            b'"' | b'\'' => self.scan_string(ch),
            b'`' => self.scan_template(),

            b'(' => { self.advance(); TokenKind::LParen }
            b')' => { self.advance(); TokenKind::RParen }
            b'{' => { self.advance(); TokenKind::LBrace }
            b'}' => { self.advance(); TokenKind::RBrace }
            b'[' => { self.advance(); TokenKind::LBracket }
            b']' => { self.advance(); TokenKind::RBracket }
            b';' => { self.advance(); TokenKind::Semicolon }
            b',' => { self.advance(); TokenKind::Comma }
            b':' => { self.advance(); TokenKind::Colon }
            b'#' => { self.advance(); TokenKind::Hash }
            b'~' => { self.advance(); TokenKind::Tilde }

            b'.' => self.scan_dot(),
            b'?' => self.scan_question(),
            b'+' => self.scan_plus(),
            b'-' => self.scan_minus(),
            b'*' => self.scan_star(),
            b'/' => self.scan_slash(),
            b'%' => self.scan_percent(),
            b'=' => self.scan_equals(),
            b'!' => self.scan_bang(),
            b'<' => self.scan_less_than(),
            b'>' => self.scan_greater_than(),
            b'&' => self.scan_ampersand(),
            b'|' => self.scan_pipe(),
            b'^' => self.scan_caret(),

            _ if ch >= 0x80 && self.current_char().is_some_and(is_id_start) => self.scan_identifier(),

            _ => {
                self.advance_char();
                TokenKind::Invalid
            }
        };

        self.allow_regex = kind.allows_regex_after();
        self.make_token(kind)
    }

    /// Treat a `/` starting the next token as a regex. The parser calls this
    /// before stepping past a `)` that closes a statement head, where an
    /// expression statement may follow.
    pub fn expect_operand(&mut self) {
        self.allow_regex = true;
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&mut self) -> Token {
        let saved = self.clone();
        let token = self.next_token();
        *self = saved;
        token
    }

    /// Scan a template middle or tail. Called by the parser when it reaches
    /// the `}` closing a `${` substitution; the lexer position is just past
    /// that brace.
    pub fn scan_template_continuation(&mut self) -> Token {
        self.saw_newline = false;
        self.token_start = self.pos;
        let kind = match self.scan_template_chunk() {
            Some((text, true)) => TokenKind::TemplateTail(text),
            Some((text, false)) => TokenKind::TemplateMiddle(text),
            None => TokenKind::Invalid,
        };
        self.allow_regex = kind.allows_regex_after();
        self.make_token(kind)
    }

    // === Helper methods ===

    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn current(&self) -> u8 {
        self.bytes.get(self.pos).copied().unwrap_or(0)
    }

    fn current_char(&self) -> Option<char> {
        self.source.get(self.pos..).and_then(|rest| rest.chars().next())
    }

    fn peek_char(&self) -> u8 {
        self.bytes.get(self.pos + 1).copied().unwrap_or(0)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    /// Advance past one full UTF-8 character.
    fn advance_char(&mut self) {
        let width = self.current_char().map_or(1, char::len_utf8);
        self.pos += width;
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(
            kind,
            Span::new(self.token_start as u32, self.pos as u32),
            self.saw_newline,
        )
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        self.source.get(start..end).unwrap_or("")
    }

    // === Whitespace and comments ===

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.current() {
                b' ' | b'\t' | b'\r' | 0x0b | 0x0c => self.advance(),
                b'\n' => {
                    self.saw_newline = true;
                    self.advance();
                }
                b'/' if self.peek_char() == b'/' => self.skip_line_comment(),
                b'/' if self.peek_char() == b'*' => self.skip_block_comment(),
                ch if ch >= 0x80 => match self.current_char() {
                    Some('\u{2028}' | '\u{2029}') => {
                        self.saw_newline = true;
                        self.advance_char();
                    }
                    Some(c) if c.is_whitespace() || c == '\u{feff}' => self.advance_char(),
                    _ => break,
                },
                _ => break,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        self.advance_n(2); // Skip //
        while !self.is_eof() && self.current() != b'\n' {
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance_n(2); // Skip /*
        while !self.is_eof() {
            if self.current() == b'*' && self.peek_char() == b'/' {
                self.advance_n(2);
                return;
            }
            if self.current() == b'\n' {
                self.saw_newline = true;
            }
            self.advance();
        }
    }

    // === Token scanning ===

    fn scan_identifier(&mut self) -> TokenKind {
        let mut name = String::new();
        let mut escaped = false;
        while !self.is_eof() {
            match self.current() {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'$' => {
                    name.push(self.current() as char);
                    self.advance();
                }
                b'\\' if self.peek_char() == b'u' => {
                    self.advance_n(2);
                    escaped = true;
                    let ch = if self.current() == b'{' {
                        self.scan_unicode_escape_braces()
                    } else {
                        self.scan_hex_escape(4)
                    };
                    name.push(ch);
                }
                ch if ch >= 0x80 => match self.current_char() {
                    Some(c) if is_id_continue(c) => {
                        name.push(c);
                        self.advance_char();
                    }
                    _ => break,
                },
                _ => break,
            }
        }

        if name.is_empty() {
            self.advance();
            return TokenKind::Invalid;
        }

        // Escaped keywords are identifiers, not keywords.
        if escaped {
            return TokenKind::Identifier(name);
        }
        keyword_from_str(&name).unwrap_or(TokenKind::Identifier(name))
    }

    fn scan_number(&mut self) -> TokenKind {
        let start = self.pos;

        if self.current() == b'0' {
            match self.peek_char() {
                b'x' | b'X' => return self.scan_radix_number(16),
                b'b' | b'B' => return self.scan_radix_number(2),
                b'o' | b'O' => return self.scan_radix_number(8),
                _ => {}
            }
        }

        self.skip_digits();

        if self.current() == b'.' {
            self.advance();
            self.skip_digits();
        }

        if self.current() == b'e' || self.current() == b'E' {
            self.advance();
            if self.current() == b'+' || self.current() == b'-' {
                self.advance();
            }
            self.skip_digits();
        }

        // BigInt literals are outside the supported grammar.
        if self.current() == b'n' {
            self.advance();
            return TokenKind::Invalid;
        }

        let text: String = self.slice(start, self.pos).chars().filter(|&c| c != '_').collect();
        TokenKind::Number(text.parse().unwrap_or(f64::NAN))
    }

    fn skip_digits(&mut self) {
        while self.current().is_ascii_digit() || self.current() == b'_' {
            self.advance();
        }
    }

    fn scan_radix_number(&mut self, radix: u32) -> TokenKind {
        self.advance_n(2); // Skip 0x / 0b / 0o
        let digits_start = self.pos;
        while (self.current() as char).is_digit(radix) || self.current() == b'_' {
            self.advance();
        }
        if self.current() == b'n' {
            self.advance();
            return TokenKind::Invalid;
        }
        let digits: String = self
            .slice(digits_start, self.pos)
            .chars()
            .filter(|&c| c != '_')
            .collect();
        match u64::from_str_radix(&digits, radix) {
            Ok(value) => TokenKind::Number(value as f64),
            Err(_) => TokenKind::Invalid,
        }
    }

    fn scan_string(&mut self, quote: u8) -> TokenKind {
        self.advance(); // Skip opening quote

        let mut value = String::new();
        let mut chunk_start = self.pos;
        loop {
            if self.is_eof() {
                return TokenKind::Invalid;
            }
            match self.current() {
                c if c == quote => {
                    value.push_str(self.slice(chunk_start, self.pos));
                    self.advance();
                    return TokenKind::String(value);
                }
                b'\\' => {
                    value.push_str(self.slice(chunk_start, self.pos));
                    self.advance();
                    self.scan_escape_sequence(&mut value);
                    chunk_start = self.pos;
                }
                b'\n' => return TokenKind::Invalid,
                _ => self.advance(),
            }
        }
    }

    /// Decode one escape sequence (the backslash is already consumed).
    fn scan_escape_sequence(&mut self, out: &mut String) {
        let ch = self.current();
        match ch {
            b'n' => { self.advance(); out.push('\n') }
            b'r' => { self.advance(); out.push('\r') }
            b't' => { self.advance(); out.push('\t') }
            b'b' => { self.advance(); out.push('\u{8}') }
            b'f' => { self.advance(); out.push('\u{c}') }
            b'v' => { self.advance(); out.push('\u{b}') }
            b'0' if !self.peek_char().is_ascii_digit() => { self.advance(); out.push('\0') }
            b'x' => {
                self.advance();
                out.push(self.scan_hex_escape(2));
            }
            b'u' => {
                self.advance();
                let decoded = if self.current() == b'{' {
                    self.scan_unicode_escape_braces()
                } else {
                    self.scan_hex_escape(4)
                };
                out.push(decoded);
            }
            // Line continuation
            b'\r' => {
                self.advance();
                if self.current() == b'\n' {
                    self.advance();
                }
            }
            b'\n' => self.advance(),
            _ => {
                if let Some(c) = self.current_char() {
                    out.push(c);
                    self.advance_char();
                }
            }
        }
    }

    fn scan_hex_escape(&mut self, len: usize) -> char {
        let mut value = 0u32;
        for _ in 0..len {
            match (self.current() as char).to_digit(16) {
                Some(digit) => {
                    value = value * 16 + digit;
                    self.advance();
                }
                None => break,
            }
        }
        char::from_u32(value).unwrap_or('\u{FFFD}')
    }

    fn scan_unicode_escape_braces(&mut self) -> char {
        self.advance(); // Skip {
        let mut value = 0u32;
        while let Some(digit) = (self.current() as char).to_digit(16) {
            value = value.saturating_mul(16).saturating_add(digit);
            self.advance();
        }
        if self.current() == b'}' {
            self.advance();
        }
        char::from_u32(value).unwrap_or('\u{FFFD}')
    }

    fn scan_template(&mut self) -> TokenKind {
        self.advance(); // Skip `
        match self.scan_template_chunk() {
            Some((text, true)) => TokenKind::TemplateNoSub(text),
            Some((text, false)) => TokenKind::TemplateHead(text),
            None => TokenKind::Invalid,
        }
    }

    /// Scan template characters up to the closing backtick (`true`) or a
    /// `${` substitution (`false`). Returns `None` if unterminated.
    fn scan_template_chunk(&mut self) -> Option<(String, bool)> {
        let mut value = String::new();
        let mut chunk_start = self.pos;
        while !self.is_eof() {
            match self.current() {
                b'`' => {
                    value.push_str(self.slice(chunk_start, self.pos));
                    self.advance();
                    return Some((value, true));
                }
                b'$' if self.peek_char() == b'{' => {
                    value.push_str(self.slice(chunk_start, self.pos));
                    self.advance_n(2);
                    return Some((value, false));
                }
                b'\\' => {
                    value.push_str(self.slice(chunk_start, self.pos));
                    self.advance();
                    self.scan_escape_sequence(&mut value);
                    chunk_start = self.pos;
                }
                _ => self.advance(),
            }
        }
        None
    }

    fn scan_regex(&mut self) -> TokenKind {
        self.advance(); // Skip opening /
        let pattern_start = self.pos;

        let mut in_class = false;
        while !self.is_eof() {
            match self.current() {
                b'/' if !in_class => break,
                b'[' => {
                    in_class = true;
                    self.advance();
                }
                b']' => {
                    in_class = false;
                    self.advance();
                }
                b'\\' => {
                    self.advance();
                    if !self.is_eof() {
                        self.advance_char();
                    }
                }
                b'\n' | b'\r' => break,
                _ => self.advance(),
            }
        }

        let pattern = self.slice(pattern_start, self.pos).to_string();

        if self.current() != b'/' {
            return TokenKind::Invalid;
        }
        self.advance(); // Skip closing /

        let flags_start = self.pos;
        while self.current().is_ascii_alphabetic() {
            self.advance();
        }
        let flags = self.slice(flags_start, self.pos).to_string();

        TokenKind::Regex { pattern, flags }
    }

    // === Multi-character operators ===

    fn scan_dot(&mut self) -> TokenKind {
        if self.peek_char().is_ascii_digit() {
            return self.scan_number();
        }
        self.advance();
        if self.current() == b'.' && self.peek_char() == b'.' {
            self.advance_n(2);
            TokenKind::Spread
        } else {
            TokenKind::Dot
        }
    }

    fn scan_question(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'?' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::QuestionQuestionEq
                } else {
                    TokenKind::QuestionQuestion
                }
            }
            // `a?.5:b` is a conditional, not optional chaining
            b'.' if !self.peek_char().is_ascii_digit() => {
                self.advance();
                TokenKind::QuestionDot
            }
            _ => TokenKind::Question,
        }
    }

    fn scan_plus(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'+' => { self.advance(); TokenKind::PlusPlus }
            b'=' => { self.advance(); TokenKind::PlusEq }
            _ => TokenKind::Plus,
        }
    }

    fn scan_minus(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'-' => { self.advance(); TokenKind::MinusMinus }
            b'=' => { self.advance(); TokenKind::MinusEq }
            _ => TokenKind::Minus,
        }
    }

    fn scan_star(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'*' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::StarStarEq
                } else {
                    TokenKind::StarStar
                }
            }
            b'=' => { self.advance(); TokenKind::StarEq }
            _ => TokenKind::Star,
        }
    }

    fn scan_slash(&mut self) -> TokenKind {
        if self.allow_regex {
            return self.scan_regex();
        }
        self.advance();
        if self.current() == b'=' {
            self.advance();
            TokenKind::SlashEq
        } else {
            TokenKind::Slash
        }
    }

    fn scan_percent(&mut self) -> TokenKind {
        self.advance();
        if self.current() == b'=' {
            self.advance();
            TokenKind::PercentEq
        } else {
            TokenKind::Percent
        }
    }

    fn scan_equals(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'=' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::EqEqEq
                } else {
                    TokenKind::EqEq
                }
            }
            b'>' => { self.advance(); TokenKind::Arrow }
            _ => TokenKind::Eq,
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        self.advance();
        if self.current() == b'=' {
            self.advance();
            if self.current() == b'=' {
                self.advance();
                TokenKind::BangEqEq
            } else {
                TokenKind::BangEq
            }
        } else {
            TokenKind::Bang
        }
    }

    fn scan_less_than(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'<' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::LtLtEq
                } else {
                    TokenKind::LtLt
                }
            }
            b'=' => { self.advance(); TokenKind::LtEq }
            _ => TokenKind::Lt,
        }
    }

    fn scan_greater_than(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'>' => {
                self.advance();
                match self.current() {
                    b'>' => {
                        self.advance();
                        if self.current() == b'=' {
                            self.advance();
                            TokenKind::GtGtGtEq
                        } else {
                            TokenKind::GtGtGt
                        }
                    }
                    b'=' => { self.advance(); TokenKind::GtGtEq }
                    _ => TokenKind::GtGt,
                }
            }
            b'=' => { self.advance(); TokenKind::GtEq }
            _ => TokenKind::Gt,
        }
    }

    fn scan_ampersand(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'&' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::AmpAmpEq
                } else {
                    TokenKind::AmpAmp
                }
            }
            b'=' => { self.advance(); TokenKind::AmpEq }
            _ => TokenKind::Amp,
        }
    }

    fn scan_pipe(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'|' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::PipePipeEq
                } else {
                    TokenKind::PipePipe
                }
            }
            b'=' => { self.advance(); TokenKind::PipeEq }
            _ => TokenKind::Pipe,
        }
    }

    fn scan_caret(&mut self) -> TokenKind {
        self.advance();
        if self.current() == b'=' {
            self.advance();
            TokenKind::CaretEq
        } else {
            TokenKind::Caret
        }
    }
}

fn is_id_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_id_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '\u{200c}' || c == '\u{200d}'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            if matches!(token.kind, TokenKind::Eof) {
                break;
            }
            tokens.push(token.kind);
        }
        tokens
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(
            tokenize("foo bar _baz $qux get"),
            vec![
                TokenKind::Identifier("foo".into()),
                TokenKind::Identifier("bar".into()),
                TokenKind::Identifier("_baz".into()),
                TokenKind::Identifier("$qux".into()),
                TokenKind::Identifier("get".into()),
            ]
        );
    }

    #[test]
    fn test_unicode_identifier() {
        assert_eq!(tokenize("café"), vec![TokenKind::Identifier("café".into())]);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            tokenize("const let var function"),
            vec![TokenKind::Const, TokenKind::Let, TokenKind::Var, TokenKind::Function]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokenize("42 2.5 0xff 0b101 0o77 1_000 .5"),
            vec![
                TokenKind::Number(42.0),
                TokenKind::Number(2.5),
                TokenKind::Number(255.0),
                TokenKind::Number(5.0),
                TokenKind::Number(63.0),
                TokenKind::Number(1000.0),
                TokenKind::Number(0.5),
            ]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            tokenize(r#""hello" 'wörld' "a\nb""#),
            vec![
                TokenKind::String("hello".into()),
                TokenKind::String("wörld".into()),
                TokenKind::String("a\nb".into()),
            ]
        );
    }

    #[test]
    fn test_regex_vs_division() {
        assert_eq!(
            tokenize("a / b"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Slash,
                TokenKind::Identifier("b".into()),
            ]
        );
        assert_eq!(
            tokenize("x = /ab+c/gi"),
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Eq,
                TokenKind::Regex { pattern: "ab+c".into(), flags: "gi".into() },
            ]
        );
    }

    #[test]
    fn test_expect_operand_after_paren() {
        let mut lexer = Lexer::new(") /a/");
        assert_eq!(lexer.next_token().kind, TokenKind::RParen);
        lexer.expect_operand();
        assert_eq!(
            lexer.next_token().kind,
            TokenKind::Regex { pattern: "a".into(), flags: String::new() }
        );

        let mut lexer = Lexer::new(") /a/");
        lexer.next_token();
        assert_eq!(lexer.next_token().kind, TokenKind::Slash);
    }

    #[test]
    fn test_newline_tracking() {
        let mut lexer = Lexer::new("a\nb c");
        assert!(!lexer.next_token().had_newline_before);
        assert!(lexer.next_token().had_newline_before);
        assert!(!lexer.next_token().had_newline_before);
    }

    #[test]
    fn test_optional_chaining() {
        assert_eq!(
            tokenize("a?.b a?.5:1"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::QuestionDot,
                TokenKind::Identifier("b".into()),
                TokenKind::Identifier("a".into()),
                TokenKind::Question,
                TokenKind::Number(0.5),
                TokenKind::Colon,
                TokenKind::Number(1.0),
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            tokenize("a // line comment\nb /* block */ c"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Identifier("b".into()),
                TokenKind::Identifier("c".into()),
            ]
        );
    }

    #[test]
    fn test_template_literal() {
        let mut lexer = Lexer::new("`a${x}b`");
        assert_eq!(lexer.next_token().kind, TokenKind::TemplateHead("a".into()));
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier("x".into()));
        assert_eq!(lexer.next_token().kind, TokenKind::RBrace);
        assert_eq!(
            lexer.scan_template_continuation().kind,
            TokenKind::TemplateTail("b".into())
        );
        assert_eq!(tokenize("`hello world`"), vec![TokenKind::TemplateNoSub("hello world".into())]);
    }
}
