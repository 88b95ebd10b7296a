use super::*;

/// Diagnostics kept before the rest are suppressed.
pub const MAX_DIAGNOSTICS: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxError {
    ExpectIdentifier,
    ExpectInputDevice,
    ExpectVariableInputNumber,
    ExpectClockCycle,
    ExpectInitialState,
    ExpectPinIn,
    ExpectPinOut,
    ExpectPinInOrOut,
    ExpectKeyword,
    ExpectOpenCurlyBracket,
    ExpectComma,
    ExpectSemicolon,
    ExpectColon,
    ExpectFullStopOrSemicolon,
    ExpectFullStop,
    ExpectArrow,
    ExpectFullStopOrArrow,
    DuplicateKeyword,
    WrongBlockOrder,
    ExpectCloseCurlyBracket,
    ExpectRcTriggerCycle,
}

/// Problems with the definition file as a whole rather than with one line of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileError {
    MissingInputToPin,
    MissingMonitor,
    MissingClockOrSwitch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    Syntax(SyntaxError),
    Device(DeviceError),
    Connection(ConnectionError),
    Monitor(MonitorError),
    File(FileError),
}

impl From<SyntaxError> for ErrorCode {
    fn from(error: SyntaxError) -> ErrorCode {
        ErrorCode::Syntax(error)
    }
}

impl From<DeviceError> for ErrorCode {
    fn from(error: DeviceError) -> ErrorCode {
        ErrorCode::Device(error)
    }
}

impl From<ConnectionError> for ErrorCode {
    fn from(error: ConnectionError) -> ErrorCode {
        ErrorCode::Connection(error)
    }
}

impl From<MonitorError> for ErrorCode {
    fn from(error: MonitorError) -> ErrorCode {
        ErrorCode::Monitor(error)
    }
}

impl From<FileError> for ErrorCode {
    fn from(error: FileError) -> ErrorCode {
        ErrorCode::File(error)
    }
}

impl ErrorCode {
    /// The user-facing message. `name` is the text of the offending token or pin.
    pub fn message(&self, name: &str) -> String {
        let name = format!("'{name}'");
        match self {
            ErrorCode::Syntax(error) => match error {
                SyntaxError::ExpectIdentifier => format!("Found {name}, expected a non-keyword identifier"),
                SyntaxError::ExpectInputDevice => format!("Found {name}, expected 'AND', 'NAND', 'OR', 'NOR', 'XOR', 'DTYPE' or 'RC'"),
                SyntaxError::ExpectVariableInputNumber => format!("Found {name}, expected integer between 1 and 16"),
                SyntaxError::ExpectClockCycle | SyntaxError::ExpectRcTriggerCycle => {
                    format!("Found {name}, expected positive integer with no leading zero")
                },
                SyntaxError::ExpectInitialState => format!("Found {name}, expected 0 or 1"),
                SyntaxError::ExpectPinIn => format!("Found {name}, expected 'I1-16', 'DATA', 'CLK', 'SET' or 'CLEAR'"),
                SyntaxError::ExpectPinOut => format!("Found {name}, expected 'Q' or 'QBAR'"),
                SyntaxError::ExpectPinInOrOut => {
                    format!("Found {name}, expected 'I1-16', 'DATA', 'CLK', 'SET', 'CLEAR', 'Q' or 'QBAR'")
                },
                SyntaxError::ExpectKeyword => {
                    format!("Found {name}, expected a keyword ('DEVICE', 'CLOCK', 'SWITCH', 'MONITOR' or 'CONNECTION')")
                },
                SyntaxError::ExpectOpenCurlyBracket => format!("Found {name}, expected '{{'"),
                SyntaxError::ExpectComma => format!("Found {name}, expected ','"),
                SyntaxError::ExpectSemicolon => format!("Found {name}, expected ';'"),
                SyntaxError::ExpectColon => format!("Found {name}, expected ':'"),
                SyntaxError::ExpectFullStopOrSemicolon => {
                    format!("Found {name}, expected '.' (if pin has to be defined) or ';' (if pin does not have to be defined)")
                },
                SyntaxError::ExpectFullStop => format!("Found {name}, expected '.'"),
                SyntaxError::ExpectArrow => format!("Found {name}, expected '>'"),
                SyntaxError::ExpectFullStopOrArrow => {
                    format!("Found {name}, expected '.' (if pin has to be defined) or '>' (if pin does not have to be defined)")
                },
                SyntaxError::DuplicateKeyword => format!("{name} block should not be redefined"),
                SyntaxError::WrongBlockOrder => format!("{name} block order is wrong"),
                SyntaxError::ExpectCloseCurlyBracket => format!("Found {name}, expected '}}'"),
            },
            ErrorCode::Device(DeviceError::DevicePresent) => format!("Identifier {name} should not be redefined"),
            ErrorCode::Device(_) => format!("Qualifier {name} is not valid for this device"),
            ErrorCode::Connection(error) => match error {
                ConnectionError::OutputDeviceAbsent | ConnectionError::InputDeviceAbsent => {
                    format!("Identifier {name} is not defined")
                },
                ConnectionError::OutputPortAbsent | ConnectionError::InputPortAbsent => format!("Pin {name} does not exist"),
                ConnectionError::InputConnected => format!("Connection repeatedly assigned to input pin {name}"),
            },
            ErrorCode::Monitor(error) => match error {
                MonitorError::MonitorDeviceAbsent => format!("Identifier {name} is not defined"),
                MonitorError::MonitorPortAbsent => format!("Pin {name} does not exist"),
                MonitorError::MonitorIdentifierPresent => format!("Identifier {name} should not be redefined"),
            },
            ErrorCode::File(error) => match error {
                FileError::MissingInputToPin => format!("Missing input to pin {name}"),
                FileError::MissingMonitor => "At least one monitor should be defined".to_string(),
                FileError::MissingClockOrSwitch => {
                    "At least one list between 'CLOCK' and 'SWITCH' is needed. neither is found".to_string()
                },
            },
        }
    }
}

/// One entry in the error report for a definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Line {
        location: LineCol,
        excerpt: String,
        caret: String,
        message: String,
        code: ErrorCode,
    },
    File {
        message: String,
        code: ErrorCode,
    },
    /// Stands in for everything after the first [`MAX_DIAGNOSTICS`] entries.
    Suppressed {
        limit: usize,
    },
}

impl Diagnostic {
    pub fn code(&self) -> Option<&ErrorCode> {
        match self {
            Diagnostic::Line { code, .. } => Some(code),
            Diagnostic::File { code, .. } => Some(code),
            Diagnostic::Suppressed { .. } => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Diagnostic::Line { message, .. } => message.clone(),
            Diagnostic::File { message, .. } => message.clone(),
            Diagnostic::Suppressed { limit } => format!("Over {limit} errors, further errors will not be reported!!"),
        }
    }

    pub fn location(&self) -> Option<LineCol> {
        match self {
            Diagnostic::Line { location, .. } => Some(*location),
            _ => None,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Diagnostic::Line { location, excerpt, caret, message, .. } => {
                write!(f, "Line {}:\n{excerpt}\n{caret}\n{message}", location.line())
            },
            Diagnostic::File { message, .. } => write!(f, "File error: {message}"),
            Diagnostic::Suppressed { .. } => write!(f, "{}", self.message()),
        }
    }
}

/// Collects diagnostics for one parse, quoting lines from the source being parsed.
#[derive(Debug, Clone)]
pub struct ErrorHandler {
    source_info: SourceInfo,
    diagnostics: Vec<Diagnostic>,
}

impl ErrorHandler {
    pub fn new(source_info: SourceInfo) -> ErrorHandler {
        ErrorHandler {
            source_info,
            diagnostics: vec![],
        }
    }

    /// Reports an error at `location`. `name` is the offending token's text.
    pub fn line_error(&mut self, code: impl Into<ErrorCode>, location: LineCol, name: &str) {
        let code = code.into();
        let (excerpt, caret) = self.source_info.excerpt(&location);
        self.push(Diagnostic::Line {
            location,
            excerpt,
            caret,
            message: code.message(name),
            code,
        });
    }

    pub fn file_error(&mut self, code: impl Into<ErrorCode>, name: &str) {
        let code = code.into();
        self.push(Diagnostic::File {
            message: code.message(name),
            code,
        });
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        if self.diagnostics.len() < MAX_DIAGNOSTICS {
            self.diagnostics.push(diagnostic);
        } else if self.diagnostics.len() == MAX_DIAGNOSTICS {
            self.diagnostics.push(Diagnostic::Suppressed { limit: MAX_DIAGNOSTICS });
        }
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Why a definition file could not be turned into a [`Circuit`].
#[derive(Debug)]
pub enum CircuitError {
    Lexer(LexerError),
    Invalid(Vec<Diagnostic>),
}

impl From<LexerError> for CircuitError {
    fn from(error: LexerError) -> CircuitError {
        CircuitError::Lexer(error)
    }
}

impl std::fmt::Display for CircuitError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CircuitError::Lexer(error) => write!(f, "{error}"),
            CircuitError::Invalid(diagnostics) => {
                let errors = diagnostics.iter().filter(|diagnostic| diagnostic.code().is_some()).count();
                write!(f, "Definition file has {errors} errors")
            },
        }
    }
}

impl std::error::Error for CircuitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CircuitError::Lexer(error) => Some(error),
            CircuitError::Invalid(_diagnostics) => None,
        }
    }
}
