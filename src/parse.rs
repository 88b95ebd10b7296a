use super::*;


use log::*;
use std::collections::BTreeSet;

pub fn load_circuit_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Circuit, CircuitError> {
    let lexer = Lexer::from_file(path)?;
    circuit_from_lexer(lexer)
}

pub fn load_circuit_from_string(text: &str) -> Result<Circuit, CircuitError> {
    circuit_from_lexer(Lexer::from_string(text))
}

fn circuit_from_lexer(lexer: Lexer) -> Result<Circuit, CircuitError> {
    let mut symbols = SymbolTable::new();
    let mut network = Network::new(Devices::new(&mut symbols));
    let mut monitors = Monitors::new();

    {
        let mut parser = Parser::new(lexer, &mut symbols, &mut network, &mut monitors);
        if !parser.parse_network() {
            return Err(CircuitError::Invalid(parser.into_diagnostics()));
        }
    }
    Ok(Circuit::new(symbols, network, monitors))
}

/// Recursive descent parser for definition files.
///
/// Each statement is checked in full before its device, connection or monitor is built,
/// so a malformed statement produces one diagnostic and no semantic errors.
/// After an error the parser resynchronises on the next `;` or `}`.
pub struct Parser<'a> {
    lexer: Lexer,
    symbols: &'a mut SymbolTable,
    network: &'a mut Network,
    monitors: &'a mut Monitors,
    errors: ErrorHandler,
    token: Token,
    /// Blocks already seen, including rejected ones.
    blocks_parsed: BTreeSet<Keyword>,
    /// Blocks that may no longer appear because a later block has been seen.
    blocks_closed: BTreeSet<Keyword>,
}

impl<'a> Parser<'a> {
    pub fn new(
        lexer: Lexer,
        symbols: &'a mut SymbolTable,
        network: &'a mut Network,
        monitors: &'a mut Monitors,
    ) -> Parser<'a> {
        let errors = ErrorHandler::new(lexer.source_info().clone());
        Parser {
            lexer,
            symbols,
            network,
            monitors,
            errors,
            token: Token {
                kind: TokenKind::Eof,
                loc: LineCol::default(),
            },
            blocks_parsed: BTreeSet::new(),
            blocks_closed: BTreeSet::new(),
        }
    }

    /// Parses the whole file, building the circuit as it goes.
    /// Returns true if no diagnostics were produced.
    pub fn parse_network(&mut self) -> bool {
        self.advance();
        while !self.token.is_eof() {
            match self.token.kind {
                TokenKind::Keyword(keyword) => {
                    if self.blocks_parsed.contains(&keyword) {
                        self.error(SyntaxError::DuplicateKeyword);
                        self.skip_to_close_brace();
                    } else if self.blocks_closed.contains(&keyword) || !self.may_start(keyword) {
                        self.error(SyntaxError::WrongBlockOrder);
                        self.skip_to_close_brace();
                    } else {
                        self.parse_list(keyword);
                    }
                    self.advance();
                    self.set_flag(keyword);
                },
                _ => {
                    self.error(SyntaxError::ExpectKeyword);
                    self.skip_to_close_brace();
                    self.advance();
                },
            }
        }

        self.check_file();
        info!("Parsed definition file with {} errors", self.errors.error_count());
        self.errors.error_count() == 0
    }

    pub fn fetch_error_output(&self) -> &[Diagnostic] {
        self.errors.diagnostics()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.errors.into_diagnostics()
    }

    fn may_start(&self, keyword: Keyword) -> bool {
        keyword != Keyword::Connection || self.blocks_parsed.contains(&Keyword::Monitor)
    }

    fn set_flag(&mut self, keyword: Keyword) {
        self.blocks_parsed.insert(keyword);
        for earlier in Keyword::BLOCK_ORDER.iter().take_while(|earlier| **earlier != keyword) {
            self.blocks_closed.insert(*earlier);
        }
    }

    fn check_file(&mut self) {
        if !self.blocks_parsed.contains(&Keyword::Monitor) {
            self.errors.file_error(FileError::MissingMonitor, "");
        }
        if !self.blocks_parsed.contains(&Keyword::Clock) && !self.blocks_parsed.contains(&Keyword::Switch) {
            self.errors.file_error(FileError::MissingClockOrSwitch, "");
        }
        if self.errors.error_count() == 0 {
            for port in self.network.unconnected_inputs() {
                let name = self.network.devices().get_signal_name(self.symbols, port.device, port.port).unwrap_or_default();
                self.errors.file_error(FileError::MissingInputToPin, &name);
            }
        }
    }

    fn parse_list(&mut self, keyword: Keyword) {
        self.advance();
        if !self.token.is(&TokenKind::OpenBrace) {
            self.error(SyntaxError::ExpectOpenCurlyBracket);
            self.skip_to_close_brace();
            return;
        }
        self.advance();

        loop {
            let ok = match keyword {
                Keyword::Device => self.device(),
                Keyword::Switch => self.switch(),
                Keyword::Clock => self.clock(),
                Keyword::Monitor => self.monitor(),
                Keyword::Connection => self.connection(),
            };
            if !ok {
                self.skip_after_semicolon_or_to_close_brace();
            }
            if self.token.is(&TokenKind::CloseBrace) || self.token.is_eof() {
                break;
            }
        }

        if self.token.is_eof() {
            self.error(SyntaxError::ExpectCloseCurlyBracket);
        }
        info!("Parsed {keyword} block");
    }

    // name ':' (VARGATE ',' n | XOR | DTYPE | RC ',' n) ';'
    fn device(&mut self) -> bool {
        let Some(name) = self.identifier() else { return false };
        self.advance();
        if !self.expect(TokenKind::Colon, SyntaxError::ExpectColon) {
            return false;
        }
        self.advance();
        let Some((kind, qualifier)) = self.input_device() else { return false };
        self.advance();
        if !self.semicolon() {
            return false;
        }
        self.make_device(&name, kind, qualifier);
        true
    }

    // name ':' (0 | 1) ';'
    fn switch(&mut self) -> bool {
        let Some(name) = self.identifier() else { return false };
        self.advance();
        if !self.expect(TokenKind::Colon, SyntaxError::ExpectColon) {
            return false;
        }
        self.advance();
        let level = match self.token.number() {
            Some("0") => 0,
            Some("1") => 1,
            _ => return self.error(SyntaxError::ExpectInitialState),
        };
        let qualifier = (self.token.clone(), level);
        self.advance();
        if !self.semicolon() {
            return false;
        }
        self.make_device(&name, DeviceKind::Switch, Some(qualifier));
        true
    }

    // name ':' n ';'
    fn clock(&mut self) -> bool {
        let Some(name) = self.identifier() else { return false };
        self.advance();
        if !self.expect(TokenKind::Colon, SyntaxError::ExpectColon) {
            return false;
        }
        self.advance();
        let Some(qualifier) = self.positive_number(SyntaxError::ExpectClockCycle) else { return false };
        self.advance();
        if !self.semicolon() {
            return false;
        }
        self.make_device(&name, DeviceKind::Clock, Some(qualifier));
        true
    }

    // identifier ':' device ['.' pin] ';'
    fn monitor(&mut self) -> bool {
        let Some(identifier) = self.identifier() else { return false };
        self.advance();
        if !self.expect(TokenKind::Colon, SyntaxError::ExpectColon) {
            return false;
        }
        self.advance();
        let Some(device) = self.identifier() else { return false };
        self.advance();

        let mut port = None;
        if self.token.is(&TokenKind::FullStop) {
            self.advance();
            if !self.pin(Self::is_input_pin, true, SyntaxError::ExpectPinInOrOut) {
                return false;
            }
            port = Some(self.token.clone());
            self.advance();
        } else if !self.token.is(&TokenKind::Semicolon) {
            return self.error(SyntaxError::ExpectFullStopOrSemicolon);
        }

        if !self.semicolon() {
            return false;
        }
        self.make_monitor(&identifier, &device, port.as_ref());
        true
    }

    // device ['.' pin] '>' device '.' pin ';'
    fn connection(&mut self) -> bool {
        let Some(out_device) = self.identifier() else { return false };
        self.advance();

        let mut out_port = None;
        if self.token.is(&TokenKind::FullStop) {
            self.advance();
            if !self.pin(|_text| false, true, SyntaxError::ExpectPinOut) {
                return false;
            }
            out_port = Some(self.token.clone());
            self.advance();
        } else if !self.token.is(&TokenKind::Arrow) {
            return self.error(SyntaxError::ExpectFullStopOrArrow);
        }

        if !self.expect(TokenKind::Arrow, SyntaxError::ExpectArrow) {
            return false;
        }
        self.advance();
        let Some(in_device) = self.identifier() else { return false };
        self.advance();
        if !self.expect(TokenKind::FullStop, SyntaxError::ExpectFullStop) {
            return false;
        }
        self.advance();
        if !self.pin(Self::is_input_pin, false, SyntaxError::ExpectPinIn) {
            return false;
        }
        let in_port = self.token.clone();
        self.advance();
        if !self.semicolon() {
            return false;
        }
        self.make_connection(&out_device, out_port.as_ref(), &in_device, &in_port);
        true
    }

    fn identifier(&mut self) -> Option<Token> {
        if self.token.name().is_some() {
            Some(self.token.clone())
        } else {
            self.error(SyntaxError::ExpectIdentifier);
            None
        }
    }

    fn expect(&mut self, kind: TokenKind, code: SyntaxError) -> bool {
        if self.token.is(&kind) {
            true
        } else {
            self.error(code)
        }
    }

    /// Checks for `;` and steps past it.
    fn semicolon(&mut self) -> bool {
        if !self.expect(TokenKind::Semicolon, SyntaxError::ExpectSemicolon) {
            return false;
        }
        self.advance();
        true
    }

    fn input_device(&mut self) -> Option<(DeviceKind, Option<(Token, u32)>)> {
        let kind = self
            .token
            .name()
            .and_then(|id| self.symbols.get_name_string(id))
            .and_then(DeviceKind::from_device_name);
        let Some(kind) = kind else {
            self.error(SyntaxError::ExpectInputDevice);
            return None;
        };
        if !kind.takes_qualifier() {
            return Some((kind, None));
        }

        self.advance();
        if !self.expect(TokenKind::Comma, SyntaxError::ExpectComma) {
            return None;
        }
        self.advance();
        if kind == DeviceKind::Rc {
            let qualifier = self.positive_number(SyntaxError::ExpectRcTriggerCycle)?;
            return Some((kind, Some(qualifier)));
        }

        match self.number_without_leading_zero() {
            Some(inputs) if (1..=MAX_GATE_INPUTS).contains(&inputs) => Some((kind, Some((self.token.clone(), inputs)))),
            _ => {
                self.error(SyntaxError::ExpectVariableInputNumber);
                None
            },
        }
    }

    fn number_without_leading_zero(&self) -> Option<u32> {
        let digits = self.token.number()?;
        if digits.starts_with('0') {
            return None;
        }
        digits.parse().ok()
    }

    fn positive_number(&mut self, code: SyntaxError) -> Option<(Token, u32)> {
        match self.number_without_leading_zero() {
            Some(value) => Some((self.token.clone(), value)),
            None => {
                self.error(code);
                None
            },
        }
    }

    fn is_input_pin(text: &str) -> bool {
        if ["DATA", "CLK", "SET", "CLEAR"].contains(&text) {
            return true;
        }
        match text.strip_prefix('I') {
            Some(digits) if !digits.starts_with('0') && digits.chars().all(|c| c.is_ascii_digit()) => {
                digits.parse::<u32>().map(|i| (1..=MAX_GATE_INPUTS).contains(&i)).unwrap_or(false)
            },
            _ => false,
        }
    }

    fn is_output_pin(text: &str) -> bool {
        ["Q", "QBAR"].contains(&text)
    }

    /// Checks the current token names a pin accepted by `accepts`, or an output pin if `outputs` is set.
    fn pin(&mut self, accepts: fn(&str) -> bool, outputs: bool, code: SyntaxError) -> bool {
        let text = self.token.name().and_then(|id| self.symbols.get_name_string(id)).unwrap_or_default();
        if accepts(text) || (outputs && Self::is_output_pin(text)) {
            true
        } else {
            self.error(code)
        }
    }

    fn make_device(&mut self, name: &Token, kind: DeviceKind, qualifier: Option<(Token, u32)>) {
        let Some(id) = name.name() else { return };
        let value = qualifier.as_ref().map(|(_token, value)| *value);
        match self.network.devices_mut().make_device(id, kind, value) {
            Ok(()) => debug!("Declared {kind} {}", name.text(self.symbols)),
            Err(error) => {
                warn!("Rejected {kind} {}: {error}", name.text(self.symbols));
                let token = match (&error, &qualifier) {
                    (DeviceError::DevicePresent, _) | (_, None) => name,
                    (_, Some((token, _value))) => token,
                };
                self.report(error, token);
            },
        }
    }

    fn make_monitor(&mut self, identifier: &Token, device: &Token, port: Option<&Token>) {
        let (Some(device_id), Some(identifier_id)) = (device.name(), identifier.name()) else { return };
        let port_id = port.and_then(|port| port.name());
        let name = self.symbols.get_name_string(identifier_id).unwrap_or_default().to_string();
        match self.monitors.make_monitor(self.network, device_id, port_id, &name) {
            Ok(()) => debug!("Monitoring {} as {name}", device.text(self.symbols)),
            Err(error) => {
                warn!("Rejected monitor {name}: {error}");
                let token = match error {
                    MonitorError::MonitorDeviceAbsent => device,
                    MonitorError::MonitorPortAbsent => port.unwrap_or(device),
                    MonitorError::MonitorIdentifierPresent => identifier,
                };
                self.report(error, token);
            },
        }
    }

    fn make_connection(&mut self, out_device: &Token, out_port: Option<&Token>, in_device: &Token, in_port: &Token) {
        let (Some(out_id), Some(in_id), Some(in_port_id)) = (out_device.name(), in_device.name(), in_port.name()) else {
            return;
        };
        let out_port_id = out_port.and_then(|port| port.name());
        match self.network.make_connection(out_id, out_port_id, in_id, in_port_id) {
            Ok(()) => debug!("Connected {} to {}", out_device.text(self.symbols), in_device.text(self.symbols)),
            Err(error) => {
                warn!("Rejected connection to {}: {error}", in_device.text(self.symbols));
                let token = match error {
                    ConnectionError::OutputDeviceAbsent => out_device,
                    ConnectionError::InputDeviceAbsent => in_device,
                    ConnectionError::OutputPortAbsent => out_port.unwrap_or(out_device),
                    ConnectionError::InputPortAbsent | ConnectionError::InputConnected => in_port,
                };
                self.report(error, token);
            },
        }
    }

    /// Reports a syntax error at the current token. Always returns false.
    fn error(&mut self, code: SyntaxError) -> bool {
        let token = self.token.clone();
        self.report(code, &token);
        false
    }

    fn report(&mut self, code: impl Into<ErrorCode>, token: &Token) {
        let name = token.text(self.symbols);
        self.errors.line_error(code, token.loc(), &name);
    }

    fn advance(&mut self) {
        self.token = self.lexer.next_token(self.symbols);
    }

    fn skip_after_semicolon_or_to_close_brace(&mut self) {
        while !self.token.is(&TokenKind::Semicolon) && !self.token.is(&TokenKind::CloseBrace) && !self.token.is_eof() {
            self.advance();
        }
        if self.token.is(&TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn skip_to_close_brace(&mut self) {
        while !self.token.is(&TokenKind::CloseBrace) && !self.token.is_eof() {
            self.advance();
        }
    }
}
