// Recursive-descent parser for the circuit definition grammar:
//
//   network     = "DEVICE" device_def* "CONNECT" connection*
//                 "MONITOR" output_ref ("," output_ref)* "END" EOF
//   device_def  = DEVICE_TYPE device ("," device)* ";"
//   device      = device_name ("(" NUMBER ")")?
//   connection  = output_ref "->" input_ref ("," input_ref)* ";"
//   output_ref  = device_name ("." NAME_CAPS)?
//   input_ref   = device_name "." (NAME_CAPS | NAME_CAPSNUM)
//
// On a syntax error the parser fast-forwards to a per-context stopping
// set and resumes at the next plausible unit, so one run can report
// many problems. Build calls into devices/network/monitors happen only
// while the error counter is zero. The four missing top-level keywords
// abort parsing; the binary maps that to a nonzero exit.


use crate::devices::Devices;
use crate::diag::{self, Diag};
use crate::monitors::Monitors;
use crate::names::{NameId, Names};
use crate::network::Network;
use crate::scanner::{Scanner, Token, TokenKind};
use tracing::debug;

/// A missing top-level keyword. The diagnostic has already been
/// printed; the caller just exits nonzero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("fatal parse error")]
pub struct FatalParse;

/// Stopping-set contexts for error recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recover {
    /// Inside the DEVICE section: any keyword or EOF.
    DeviceSection,
    /// Inside the CONNECT section: MONITOR, END or EOF.
    ConnectSection,
    /// Inside the MONITOR section: END or EOF.
    MonitorSection,
    /// Within a statement: `;`, any keyword, or EOF.
    Statement,
    /// After END: EOF only.
    FileEnd,
}

/// The four reserved keywords, interned once per parse.
struct Keywords {
    device: NameId,
    connect: NameId,
    monitor: NameId,
    end: NameId,
}

pub struct Parser<'a> {
    names: &'a mut Names,
    devices: &'a mut Devices,
    network: &'a mut Network,
    monitors: &'a mut Monitors,
    scanner: Scanner,
    keywords: Keywords,
    current: Token,
    error_count: u32,
}

impl<'a> Parser<'a> {
    pub fn new(
        names: &'a mut Names,
        devices: &'a mut Devices,
        network: &'a mut Network,
        monitors: &'a mut Monitors,
        scanner: Scanner,
    ) -> Self {
        let keyword = |names: &mut Names, s: &str| {
            names
                .intern(s)
                .unwrap_or_else(|| unreachable!("keywords are non-empty"))
        };
        let keywords = Keywords {
            device: keyword(names, "DEVICE"),
            connect: keyword(names, "CONNECT"),
            monitor: keyword(names, "MONITOR"),
            end: keyword(names, "END"),
        };
        Parser {
            names,
            devices,
            network,
            monitors,
            scanner,
            keywords,
            // Placeholder until the first advance.
            current: Token {
                kind: TokenKind::Eof,
                name: None,
                value: None,
                line: 0,
                col: 0,
            },
            error_count: 0,
        }
    }

    /// Number of diagnostics reported so far.
    #[must_use]
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Parses the whole definition file, building the network as it
    /// goes. `Ok(true)` means a clean parse with a complete network;
    /// `Ok(false)` means recoverable errors were reported; `Err` means
    /// a top-level keyword was missing.
    pub fn parse_network(&mut self) -> Result<bool, FatalParse> {
        self.advance();
        let mut ok = self.parse_device_section()?;
        ok &= self.parse_connect_section()?;
        ok &= self.parse_monitor_section()?;

        // END, then EOF.
        if !self.at_keyword(self.keywords.end) {
            self.report(Diag::NoEnd, Recover::FileEnd)?;
            return Ok(false);
        }
        self.advance();
        if self.current.kind != TokenKind::Eof {
            self.report(Diag::NoEof, Recover::FileEnd)?;
            return Ok(false);
        }

        // Circuit-global completeness check.
        if let Err(e) = self.network.check_network(self.devices) {
            self.error_count += 1;
            eprint!("{}", diag::render_global(&self.scanner, Diag::Network(e)));
            return Ok(false);
        }

        debug!(errors = self.error_count, "parse finished");
        Ok(ok && self.error_count == 0)
    }

    // --- section parsers ---

    fn parse_device_section(&mut self) -> Result<bool, FatalParse> {
        if !self.at_keyword(self.keywords.device) {
            self.report(Diag::NoDevice, Recover::DeviceSection)?;
            unreachable!("NoDevice is fatal");
        }
        self.advance();

        let mut ok = true;
        while !matches!(self.current.kind, TokenKind::Keyword | TokenKind::Eof) {
            ok &= self.parse_device_def()?;
            if self.current.kind == TokenKind::Semicolon {
                self.advance();
            }
        }
        // Running off the end is reported by the CONNECT check.
        Ok(ok && self.current.kind != TokenKind::Eof)
    }

    fn parse_connect_section(&mut self) -> Result<bool, FatalParse> {
        if !self.at_keyword(self.keywords.connect) {
            self.report(Diag::NoConnect, Recover::ConnectSection)?;
            unreachable!("NoConnect is fatal");
        }
        self.advance();

        let mut ok = true;
        while !matches!(self.current.kind, TokenKind::Keyword | TokenKind::Eof) {
            ok &= self.parse_connection()?;
            if self.current.kind == TokenKind::Semicolon {
                self.advance();
            }
        }
        Ok(ok && self.current.kind != TokenKind::Eof)
    }

    fn parse_monitor_section(&mut self) -> Result<bool, FatalParse> {
        if !self.at_keyword(self.keywords.monitor) {
            self.report(Diag::NoMonitor, Recover::MonitorSection)?;
            unreachable!("NoMonitor is fatal");
        }
        self.advance();

        let mut ok = self.parse_monitor_ref()?;
        while self.current.kind == TokenKind::Comma {
            self.advance();
            ok &= self.parse_monitor_ref()?;
        }
        Ok(ok && self.current.kind != TokenKind::Eof)
    }

    // --- statement parsers ---

    /// One device definition line: `AND a1(2), a2(1);`
    fn parse_device_def(&mut self) -> Result<bool, FatalParse> {
        // DEVICE_TYPE is an all-caps identifier.
        if self.current.kind != TokenKind::NameCaps {
            self.report(Diag::NotValidDeviceType, Recover::Statement)?;
            return Ok(false);
        }
        let kind_name = self.current.name.expect("name token carries an id");
        self.advance();

        let mut ok = true;
        let mut parsed = Vec::new();
        match self.parse_device()? {
            Some(device) => parsed.push(device),
            None => return Ok(false),
        }
        while self.current.kind == TokenKind::Comma {
            self.advance();
            match self.parse_device()? {
                Some(device) => parsed.push(device),
                None => return Ok(false),
            }
        }
        if self.current.kind != TokenKind::Semicolon {
            self.report(Diag::NoPunctuation, Recover::Statement)?;
            return Ok(false);
        }

        if self.error_count == 0 {
            for (id, qualifier) in parsed {
                if let Err(e) = self.devices.make_device(self.names, id, kind_name, qualifier) {
                    self.report(Diag::Device(e), Recover::Statement)?;
                    ok = false;
                }
            }
        }
        Ok(ok)
    }

    /// One device instance: `a1` or `a1(2)`.
    fn parse_device(&mut self) -> Result<Option<(NameId, Option<u32>)>, FatalParse> {
        let Some(id) = self.parse_device_name()? else {
            return Ok(None);
        };
        self.advance();

        let mut qualifier = None;
        if self.current.kind == TokenKind::OpenParen {
            self.advance();
            if self.current.kind != TokenKind::Number {
                self.report(Diag::NoParameter, Recover::Statement)?;
                return Ok(None);
            }
            qualifier = self.current.value;
            self.advance();
            if self.current.kind != TokenKind::CloseParen {
                self.report(Diag::NoCloseBracket, Recover::Statement)?;
                return Ok(None);
            }
            self.advance();
        }
        Ok(Some((id, qualifier)))
    }

    fn parse_device_name(&mut self) -> Result<Option<NameId>, FatalParse> {
        if !self.current.kind.is_name() {
            self.report(Diag::NoName, Recover::Statement)?;
            return Ok(None);
        }
        Ok(self.current.name)
    }

    /// One connection statement: `a -> g.I1, g.I2;`
    fn parse_connection(&mut self) -> Result<bool, FatalParse> {
        let Some((src, src_port)) = self.parse_output_ref()? else {
            return Ok(false);
        };

        if self.current.kind != TokenKind::ConnectionOp {
            self.report(Diag::NoConnectionOp, Recover::Statement)?;
            return Ok(false);
        }
        self.advance();

        let mut ok = true;
        let mut sinks = Vec::new();
        match self.parse_input_ref()? {
            Some(sink) => sinks.push(sink),
            None => return Ok(false),
        }
        while self.current.kind == TokenKind::Comma {
            self.advance();
            match self.parse_input_ref()? {
                Some(sink) => sinks.push(sink),
                None => return Ok(false),
            }
        }
        if self.current.kind != TokenKind::Semicolon {
            self.report(Diag::NoPunctuation, Recover::Statement)?;
            return Ok(false);
        }

        if self.error_count == 0 {
            for (sink, sink_port) in sinks {
                if let Err(e) =
                    self.network
                        .make_connection(self.devices, src, src_port, sink, sink_port)
                {
                    self.report(Diag::Network(e), Recover::Statement)?;
                    ok = false;
                }
            }
        }
        Ok(ok)
    }

    /// `device` or `device.PORT` where PORT is all-caps. Leaves the
    /// current token at the first unconsumed symbol.
    fn parse_output_ref(&mut self) -> Result<Option<(NameId, Option<NameId>)>, FatalParse> {
        let Some(device) = self.parse_device_name()? else {
            return Ok(None);
        };
        self.advance();

        let mut port = None;
        if self.current.kind == TokenKind::Dot {
            self.advance();
            if self.current.kind != TokenKind::NameCaps {
                self.report(Diag::NotValidOutput, Recover::Statement)?;
                return Ok(None);
            }
            port = self.current.name;
            self.advance();
        }
        Ok(Some((device, port)))
    }

    /// `device.PORT` where PORT is all-caps or caps+digits.
    fn parse_input_ref(&mut self) -> Result<Option<(NameId, NameId)>, FatalParse> {
        let Some(device) = self.parse_device_name()? else {
            return Ok(None);
        };
        self.advance();

        if self.current.kind != TokenKind::Dot {
            self.report(Diag::NoDot, Recover::Statement)?;
            return Ok(None);
        }
        self.advance();
        if !matches!(
            self.current.kind,
            TokenKind::NameCaps | TokenKind::NameCapsNum
        ) {
            self.report(Diag::NotValidInput, Recover::Statement)?;
            return Ok(None);
        }
        let port = self.current.name.expect("name token carries an id");
        self.advance();
        Ok(Some((device, port)))
    }

    /// One monitored output in the MONITOR list.
    fn parse_monitor_ref(&mut self) -> Result<bool, FatalParse> {
        let Some((device, port)) = self.parse_output_ref()? else {
            return Ok(false);
        };
        if self.error_count == 0 {
            if let Err(e) = self.monitors.make_monitor(self.devices, device, port, 0) {
                self.report(Diag::Monitor(e), Recover::Statement)?;
                return Ok(false);
            }
        }
        Ok(true)
    }

    // --- plumbing ---

    fn advance(&mut self) {
        self.current = self.scanner.next_token(self.names);
    }

    fn at_keyword(&self, keyword: NameId) -> bool {
        self.current.kind == TokenKind::Keyword && self.current.name == Some(keyword)
    }

    /// Prints the diagnostic, bumps the counter, then either aborts
    /// (fatal keyword errors) or fast-forwards to the context's
    /// stopping set.
    fn report(&mut self, diag: Diag, recover: Recover) -> Result<(), FatalParse> {
        self.error_count += 1;
        eprint!("{}", diag::render(&self.scanner, self.current, diag));
        if diag.is_fatal() {
            return Err(FatalParse);
        }
        while !self.in_stopping_set(recover) {
            self.advance();
        }
        Ok(())
    }

    fn in_stopping_set(&self, recover: Recover) -> bool {
        if self.current.kind == TokenKind::Eof {
            return true;
        }
        match recover {
            Recover::DeviceSection => self.current.kind == TokenKind::Keyword,
            Recover::ConnectSection => {
                self.at_keyword(self.keywords.monitor) || self.at_keyword(self.keywords.end)
            }
            Recover::MonitorSection => self.at_keyword(self.keywords.end),
            Recover::Statement => {
                self.current.kind == TokenKind::Semicolon
                    || self.current.kind == TokenKind::Keyword
            }
            Recover::FileEnd => false,
        }
    }
}
