//! The token definition for the search language.

/// A token is a single unit of the language, with a specific kind and location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    /// The end-of-input sentinel appended by the lexer.
    pub const EOF: Token<'static> = Token {
        kind: TokenKind::Eof,
        lexeme: "",
        span: Span { start: 0, end: 0 },
    };
}

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Spacecraft model atoms
    ModelH1, // "h1"
    ModelH2, // "h2"
    ModelH3, // "h3"
    ModelH4, // "h4"
    ModelH5, // "h5"
    ModelH6, // "h6"

    // Configuration-type atoms
    ConfigAcq,    // "acq"
    ConfigAcq0,   // "acq0"
    ConfigAsic0,  // "asic0"
    ConfigAsic1,  // "asic1"
    ConfigBee,    // "bee"
    ConfigLiktrg, // "liktrg"
    ConfigObs,    // "obs"

    // Status words
    Submitted,
    Uplinked,

    // Keywords
    By,
    And,
    Or,
    Not,

    // Comparators
    Eq,    // =
    NotEq, // !=
    Gt,    // >
    Gte,   // >=
    Lt,    // <
    Lte,   // <=

    // Punctuation
    LParen, // (
    RParen, // )

    // Literals
    Datetime,
    Literal,

    // Keys synthesized by the parser when building query leaves
    Model,
    IsNull,

    // Special
    Eof, // End of input
}

impl TokenKind {
    pub fn is_model_atom(self) -> bool {
        matches!(
            self,
            TokenKind::ModelH1
                | TokenKind::ModelH2
                | TokenKind::ModelH3
                | TokenKind::ModelH4
                | TokenKind::ModelH5
                | TokenKind::ModelH6
        )
    }

    pub fn is_config_atom(self) -> bool {
        matches!(
            self,
            TokenKind::ConfigAcq
                | TokenKind::ConfigAcq0
                | TokenKind::ConfigAsic0
                | TokenKind::ConfigAsic1
                | TokenKind::ConfigBee
                | TokenKind::ConfigLiktrg
                | TokenKind::ConfigObs
        )
    }

    pub fn is_status_word(self) -> bool {
        matches!(self, TokenKind::Submitted | TokenKind::Uplinked)
    }

    pub fn is_comparator(self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::Gt
                | TokenKind::Gte
                | TokenKind::Lt
                | TokenKind::Lte
        )
    }
}

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}
