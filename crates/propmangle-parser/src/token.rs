//! Token types for the JavaScript script grammar.
//!
//! Contextual words (`get`, `set`, `static`, `async`, `of`, ...) are lexed as
//! plain identifiers; the parser gives them meaning where the grammar needs it.

use crate::span::Span;

/// A token with its kind and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Whether a line terminator appeared between the previous token and this one.
    pub had_newline_before: bool,
}

impl Token {
    /// Create a new token.
    #[inline]
    pub const fn new(kind: TokenKind, span: Span, had_newline_before: bool) -> Self {
        Self { kind, span, had_newline_before }
    }
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // === Literals ===
    /// Identifier: `foo`, `_bar`, `$baz`
    Identifier(String),
    /// String literal: `"hello"`, `'world'`
    String(String),
    /// Number literal: `42`, `3.14`, `0xff`
    Number(f64),
    /// Regular expression: `/pattern/flags`
    Regex { pattern: String, flags: String },
    /// Template literal without substitutions
    TemplateNoSub(String),
    /// Template head: `` `hello ${``
    TemplateHead(String),
    /// Template middle: `` } middle ${``
    TemplateMiddle(String),
    /// Template tail: `` } end` ``
    TemplateTail(String),

    // === Keywords ===
    Var,
    Let,
    Const,
    Function,
    Class,

    If,
    Else,
    Switch,
    Case,
    Default,
    For,
    While,
    Do,
    Break,
    Continue,
    Return,

    Try,
    Catch,
    Finally,
    Throw,

    New,
    Delete,
    Typeof,
    Void,
    In,
    Instanceof,

    This,
    Super,
    Null,
    True,
    False,

    Import,
    Export,

    Await,
    Yield,

    Extends,
    With,
    Debugger,

    // === Punctuation ===
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    LBracket,   // [
    RBracket,   // ]

    Semicolon,  // ;
    Comma,      // ,
    Colon,      // :
    Dot,        // .
    Question,   // ?
    Hash,       // # (private names, rejected by the parser)

    Arrow,      // =>
    Spread,     // ...
    QuestionDot, // ?.

    // === Operators ===
    Eq,         // =
    PlusEq,     // +=
    MinusEq,    // -=
    StarEq,     // *=
    SlashEq,    // /=
    PercentEq,  // %=
    StarStarEq, // **=
    AmpEq,      // &=
    PipeEq,     // |=
    CaretEq,    // ^=
    LtLtEq,     // <<=
    GtGtEq,     // >>=
    GtGtGtEq,   // >>>=
    AmpAmpEq,   // &&=
    PipePipeEq, // ||=
    QuestionQuestionEq, // ??=

    EqEq,       // ==
    EqEqEq,     // ===
    BangEq,     // !=
    BangEqEq,   // !==
    Lt,         // <
    LtEq,       // <=
    Gt,         // >
    GtEq,       // >=

    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    StarStar,   // **
    PlusPlus,   // ++
    MinusMinus, // --

    Amp,        // &
    Pipe,       // |
    Caret,      // ^
    Tilde,      // ~
    LtLt,       // <<
    GtGt,       // >>
    GtGtGt,     // >>>

    AmpAmp,     // &&
    PipePipe,   // ||
    Bang,       // !
    QuestionQuestion, // ??

    // === Special ===
    /// End of file
    Eof,
    /// Invalid token (lexer error)
    Invalid,
}

impl TokenKind {
    /// Whether a `/` following this token starts a regular expression.
    ///
    /// Identifiers, literals and closing brackets end an operand, so a slash
    /// after them is division.
    pub fn allows_regex_after(&self) -> bool {
        !matches!(
            self,
            TokenKind::Identifier(_)
                | TokenKind::String(_)
                | TokenKind::Number(_)
                | TokenKind::Regex { .. }
                | TokenKind::TemplateNoSub(_)
                | TokenKind::TemplateTail(_)
                | TokenKind::This
                | TokenKind::Super
                | TokenKind::Null
                | TokenKind::True
                | TokenKind::False
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
        )
    }

    /// The source text of a keyword token.
    ///
    /// Keywords are valid property names (`o.default`, `{ class: 1 }`), so the
    /// parser needs their spelling back.
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::Var => "var",
            TokenKind::Let => "let",
            TokenKind::Const => "const",
            TokenKind::Function => "function",
            TokenKind::Class => "class",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::Switch => "switch",
            TokenKind::Case => "case",
            TokenKind::Default => "default",
            TokenKind::For => "for",
            TokenKind::While => "while",
            TokenKind::Do => "do",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Return => "return",
            TokenKind::Try => "try",
            TokenKind::Catch => "catch",
            TokenKind::Finally => "finally",
            TokenKind::Throw => "throw",
            TokenKind::New => "new",
            TokenKind::Delete => "delete",
            TokenKind::Typeof => "typeof",
            TokenKind::Void => "void",
            TokenKind::In => "in",
            TokenKind::Instanceof => "instanceof",
            TokenKind::This => "this",
            TokenKind::Super => "super",
            TokenKind::Null => "null",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Import => "import",
            TokenKind::Export => "export",
            TokenKind::Await => "await",
            TokenKind::Yield => "yield",
            TokenKind::Extends => "extends",
            TokenKind::With => "with",
            TokenKind::Debugger => "debugger",
            _ => return None,
        };
        Some(text)
    }

    /// Check if this is an assignment operator.
    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::PlusEq
                | TokenKind::MinusEq
                | TokenKind::StarEq
                | TokenKind::SlashEq
                | TokenKind::PercentEq
                | TokenKind::StarStarEq
                | TokenKind::AmpEq
                | TokenKind::PipeEq
                | TokenKind::CaretEq
                | TokenKind::LtLtEq
                | TokenKind::GtGtEq
                | TokenKind::GtGtGtEq
                | TokenKind::AmpAmpEq
                | TokenKind::PipePipeEq
                | TokenKind::QuestionQuestionEq
        )
    }

    /// Get the precedence of a binary operator (higher = binds tighter).
    /// Returns None if not a binary operator.
    pub fn binary_precedence(&self) -> Option<u8> {
        match self {
            TokenKind::QuestionQuestion => Some(1),
            TokenKind::PipePipe => Some(2),
            TokenKind::AmpAmp => Some(3),
            TokenKind::Pipe => Some(4),
            TokenKind::Caret => Some(5),
            TokenKind::Amp => Some(6),
            TokenKind::EqEq | TokenKind::EqEqEq | TokenKind::BangEq | TokenKind::BangEqEq => Some(7),
            TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq
            | TokenKind::In | TokenKind::Instanceof => Some(8),
            TokenKind::LtLt | TokenKind::GtGt | TokenKind::GtGtGt => Some(9),
            TokenKind::Plus | TokenKind::Minus => Some(10),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some(11),
            TokenKind::StarStar => Some(12), // Right associative
            _ => None,
        }
    }

    /// Check if this binary operator is right associative.
    pub fn is_right_associative(&self) -> bool {
        matches!(self, TokenKind::StarStar)
    }
}

/// Look up a keyword from an identifier string.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "var" => Some(TokenKind::Var),
        "let" => Some(TokenKind::Let),
        "const" => Some(TokenKind::Const),
        "function" => Some(TokenKind::Function),
        "class" => Some(TokenKind::Class),
        "if" => Some(TokenKind::If),
        "else" => Some(TokenKind::Else),
        "switch" => Some(TokenKind::Switch),
        "case" => Some(TokenKind::Case),
        "default" => Some(TokenKind::Default),
        "for" => Some(TokenKind::For),
        "while" => Some(TokenKind::While),
        "do" => Some(TokenKind::Do),
        "break" => Some(TokenKind::Break),
        "continue" => Some(TokenKind::Continue),
        "return" => Some(TokenKind::Return),
        "try" => Some(TokenKind::Try),
        "catch" => Some(TokenKind::Catch),
        "finally" => Some(TokenKind::Finally),
        "throw" => Some(TokenKind::Throw),
        "new" => Some(TokenKind::New),
        "delete" => Some(TokenKind::Delete),
        "typeof" => Some(TokenKind::Typeof),
        "void" => Some(TokenKind::Void),
        "in" => Some(TokenKind::In),
        "instanceof" => Some(TokenKind::Instanceof),
        "this" => Some(TokenKind::This),
        "super" => Some(TokenKind::Super),
        "null" => Some(TokenKind::Null),
        "true" => Some(TokenKind::True),
        "false" => Some(TokenKind::False),
        "import" => Some(TokenKind::Import),
        "export" => Some(TokenKind::Export),
        "await" => Some(TokenKind::Await),
        "yield" => Some(TokenKind::Yield),
        "extends" => Some(TokenKind::Extends),
        "with" => Some(TokenKind::With),
        "debugger" => Some(TokenKind::Debugger),
        _ => None,
    }
}

/// Words that can never be used as a variable name.
///
/// Generated substitutes are checked against this list because they may land
/// in reference position (`foo.bar` renames `foo` too).
pub fn is_reserved_word(name: &str) -> bool {
    matches!(
        name,
        "do" | "if" | "in" | "for" | "let" | "new" | "try" | "var" | "case" | "else" | "enum"
            | "eval" | "null" | "this" | "true" | "void" | "with" | "await" | "break"
            | "catch" | "class" | "const" | "false" | "super" | "throw" | "while" | "yield"
            | "delete" | "export" | "import" | "return" | "switch" | "typeof"
            | "default" | "extends" | "finally" | "continue" | "debugger" | "function"
            | "arguments" | "instanceof" | "static" | "package" | "private" | "public"
            | "protected" | "interface" | "implements"
    )
}
