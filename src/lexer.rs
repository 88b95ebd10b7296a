use super::*;

use log::*;

/// The reserved words of the definition language, one per block kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Keyword {
    Device,
    Switch,
    Clock,
    Monitor,
    Connection,
}

impl Keyword {
    /// Every keyword in the order its block must appear in a definition file.
    pub const BLOCK_ORDER: [Keyword; 5] = [
        Keyword::Device,
        Keyword::Switch,
        Keyword::Clock,
        Keyword::Monitor,
        Keyword::Connection,
    ];

    pub fn from_str(text: &str) -> Option<Keyword> {
        match text {
            "DEVICE" => Some(Keyword::Device),
            "SWITCH" => Some(Keyword::Switch),
            "CLOCK" => Some(Keyword::Clock),
            "MONITOR" => Some(Keyword::Monitor),
            "CONNECTION" => Some(Keyword::Connection),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Device => "DEVICE",
            Keyword::Switch => "SWITCH",
            Keyword::Clock => "CLOCK",
            Keyword::Monitor => "MONITOR",
            Keyword::Connection => "CONNECTION",
        }
    }

    /// Position of this keyword's block in [`Keyword::BLOCK_ORDER`].
    pub fn rank(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    Name(SymbolId),
    /// The digits as written, so that leading zeros can still be rejected.
    Number(String),
    Comma,
    Semicolon,
    Colon,
    FullStop,
    Arrow,
    OpenBrace,
    CloseBrace,
    Eof,
    Invalid(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: LineCol,
}

impl Token {
    pub fn is(&self, kind: &TokenKind) -> bool {
        &self.kind == kind
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    pub fn name(&self) -> Option<SymbolId> {
        match self.kind {
            TokenKind::Name(id) => Some(id),
            _ => None,
        }
    }

    pub fn number(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Number(digits) => Some(digits),
            _ => None,
        }
    }

    /// The token as it appears in the source. EOF renders as the empty string.
    pub fn text(&self, symbols: &SymbolTable) -> String {
        match &self.kind {
            TokenKind::Keyword(keyword) => keyword.to_string(),
            TokenKind::Name(id) => symbols.get_name_string(*id).unwrap_or_default().to_string(),
            TokenKind::Number(digits) => digits.clone(),
            TokenKind::Comma => ",".to_string(),
            TokenKind::Semicolon => ";".to_string(),
            TokenKind::Colon => ":".to_string(),
            TokenKind::FullStop => ".".to_string(),
            TokenKind::Arrow => ">".to_string(),
            TokenKind::OpenBrace => "{".to_string(),
            TokenKind::CloseBrace => "}".to_string(),
            TokenKind::Eof => String::new(),
            TokenKind::Invalid(c) => c.to_string(),
        }
    }
}

impl HasLoc for Token {
    fn loc(&self) -> LineCol {
        self.loc
    }
}

/// Failures while opening a definition file. These are the only fatal lexer errors;
/// bad characters inside a readable file become [`TokenKind::Invalid`] tokens instead.
#[derive(Debug)]
pub enum LexerError {
    FileAccess(std::path::PathBuf, std::io::Error),
    Encoding(std::path::PathBuf, std::string::FromUtf8Error),
}

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LexerError::FileAccess(path, err) => write!(f, "Cannot open {}: {err}", path.display()),
            LexerError::Encoding(path, err) => write!(f, "{} is not valid UTF-8 text: {err}", path.display()),
        }
    }
}

impl std::error::Error for LexerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LexerError::FileAccess(_path, err) => Some(err),
            LexerError::Encoding(_path, err) => Some(err),
        }
    }
}

/// Turns definition text into [`Token`]s.
///
/// Names are interned into the [`SymbolTable`] passed to [`Lexer::next_token`],
/// so the lexer itself never owns symbol state.
pub struct Lexer {
    source_info: SourceInfo,
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Lexer, LexerError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|err| LexerError::FileAccess(path.to_owned(), err))?;
        let text = String::from_utf8(bytes).map_err(|err| LexerError::Encoding(path.to_owned(), err))?;
        info!("Lexing {} ({} bytes)", path.display(), text.len());
        Ok(Lexer::new(SourceInfo::from_file(path, &text), &text))
    }

    pub fn from_string(text: &str) -> Lexer {
        Lexer::new(SourceInfo::from_string(text), text)
    }

    fn new(source_info: SourceInfo, text: &str) -> Lexer {
        Lexer {
            source_info,
            chars: text.chars().collect(),
            pos: 0,
            line: 0,
            col: 0,
        }
    }

    pub fn source_info(&self) -> &SourceInfo {
        &self.source_info
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            text.push(c);
            self.bump();
        }
        text
    }

    /// Skips whitespace and both comment forms: `#` to end of line, and `/` to the next `/`.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                },
                Some('#') => {
                    self.bump_while(|c| c != '\n');
                },
                Some('/') => {
                    self.bump();
                    self.bump_while(|c| c != '/');
                    self.bump();
                },
                _ => return,
            }
        }
    }

    pub fn next_token(&mut self, symbols: &mut SymbolTable) -> Token {
        self.skip_trivia();
        let loc = LineCol::new(self.line, self.col);

        let kind = match self.peek() {
            None => TokenKind::Eof,
            Some(c) if c.is_alphabetic() => {
                let text = self.bump_while(|c| c.is_alphanumeric() || c == '_');
                match Keyword::from_str(&text) {
                    Some(keyword) => TokenKind::Keyword(keyword),
                    None => TokenKind::Name(symbols.lookup(&text)),
                }
            },
            Some(c) if c.is_ascii_digit() => TokenKind::Number(self.bump_while(|c| c.is_ascii_digit())),
            Some(c) => {
                self.bump();
                match c {
                    ',' => TokenKind::Comma,
                    ';' => TokenKind::Semicolon,
                    ':' => TokenKind::Colon,
                    '.' => TokenKind::FullStop,
                    '>' => TokenKind::Arrow,
                    '{' => TokenKind::OpenBrace,
                    '}' => TokenKind::CloseBrace,
                    c => TokenKind::Invalid(c),
                }
            },
        };

        trace!("{loc}: {kind:?}");
        Token { kind, loc }
    }
}
