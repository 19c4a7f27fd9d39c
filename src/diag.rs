// Diagnostic taxonomy and rendering. Every error the parser can report
// funnels through here: one closed set of kinds, each with a stable
// unique code, a category tag, and a one-sentence message. The code
// bands replace the original runtime error-code allocator: 2xx for
// syntax (including the fatal keyword omissions), 3xx for semantics.

use crate::devices::DeviceError;
use crate::monitors::MonitorError;
use crate::network::NetworkError;
use crate::scanner::{Scanner, Token};

/// Category tag printed in front of every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Keyword,
    Device,
    Connection,
    File,
    Semantic,
}

impl Category {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Category::Keyword => "KeywordError",
            Category::Device => "DeviceError",
            Category::Connection => "ConnectionError",
            Category::File => "FileError",
            Category::Semantic => "SemanticError",
        }
    }
}

/// Everything the parser can report. Syntax kinds are listed directly;
/// semantic kinds wrap the subsystem error enums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diag {
    // Missing top-level keywords: fatal.
    NoDevice,
    NoConnect,
    NoMonitor,
    NoEnd,
    // Recoverable syntax errors.
    NoEof,
    NotValidDeviceType,
    NoName,
    NoParameter,
    NoCloseBracket,
    NoPunctuation,
    NotValidOutput,
    NotValidInput,
    NoConnectionOp,
    NoDot,
    NoSemicolon,
    // Semantic errors from the build calls.
    Device(DeviceError),
    Network(NetworkError),
    Monitor(MonitorError),
}

impl Diag {
    /// The four missing-keyword errors terminate parsing.
    #[must_use]
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            Diag::NoDevice | Diag::NoConnect | Diag::NoMonitor | Diag::NoEnd
        )
    }

    #[must_use]
    pub fn category(self) -> Category {
        match self {
            Diag::NoDevice | Diag::NoConnect | Diag::NoMonitor | Diag::NoEnd => Category::Keyword,
            Diag::NoEof | Diag::NoPunctuation | Diag::NoSemicolon => Category::File,
            Diag::NotValidDeviceType | Diag::NoName | Diag::NoParameter | Diag::NoCloseBracket => {
                Category::Device
            }
            Diag::NotValidOutput | Diag::NotValidInput | Diag::NoConnectionOp | Diag::NoDot => {
                Category::Connection
            }
            Diag::Device(_) | Diag::Network(_) | Diag::Monitor(_) => Category::Semantic,
        }
    }

    /// Stable unique code, for callers filtering diagnostics.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            Diag::NoDevice => 201,
            Diag::NoConnect => 202,
            Diag::NoMonitor => 203,
            Diag::NoEnd => 204,
            Diag::NoEof => 205,
            Diag::NotValidDeviceType => 206,
            Diag::NoName => 207,
            Diag::NoParameter => 208,
            Diag::NoCloseBracket => 209,
            Diag::NoPunctuation => 210,
            Diag::NotValidOutput => 211,
            Diag::NotValidInput => 212,
            Diag::NoConnectionOp => 213,
            Diag::NoDot => 214,
            Diag::NoSemicolon => 215,
            Diag::Device(e) => match e {
                DeviceError::DevicePresent => 301,
                DeviceError::NoQualifier => 302,
                DeviceError::InvalidQualifier => 303,
                DeviceError::QualifierPresent => 304,
                DeviceError::BadDevice => 305,
                DeviceError::InvalidSwitch => 306,
            },
            Diag::Network(e) => match e {
                NetworkError::DeviceAbsent => 310,
                NetworkError::InputConnected => 311,
                NetworkError::InputToInput => 312,
                NetworkError::PortAbsent => 313,
                NetworkError::InputsNotConnected => 314,
            },
            Diag::Monitor(e) => match e {
                MonitorError::DeviceAbsent => 320,
                MonitorError::NotOutput => 321,
                MonitorError::MonitorPresent => 322,
            },
        }
    }

    #[must_use]
    pub fn message(self) -> String {
        match self {
            Diag::NoDevice => "expected keyword \"DEVICE\" at start of file".to_string(),
            Diag::NoConnect => "expected keyword \"CONNECT\" before connections".to_string(),
            Diag::NoMonitor => "expected keyword \"MONITOR\" before monitored signals".to_string(),
            Diag::NoEnd => "expected keyword \"END\" at end of file".to_string(),
            Diag::NoEof => "expected definition file to end here".to_string(),
            Diag::NotValidDeviceType => "not a valid device type".to_string(),
            Diag::NoName => "missing device name".to_string(),
            Diag::NoParameter => "missing device parameter".to_string(),
            Diag::NoCloseBracket => "missing closing parenthesis".to_string(),
            Diag::NoPunctuation => "missing comma or semicolon".to_string(),
            Diag::NotValidOutput => "not a valid device output".to_string(),
            Diag::NotValidInput => "not a valid device input".to_string(),
            Diag::NoConnectionOp => "missing connection operator \"->\"".to_string(),
            Diag::NoDot => "missing input operator \".\"".to_string(),
            Diag::NoSemicolon => "missing semicolon".to_string(),
            Diag::Device(e) => e.to_string(),
            Diag::Network(e) => e.to_string(),
            Diag::Monitor(e) => e.to_string(),
        }
    }
}

/// Renders a positioned diagnostic: path, line, the offending source
/// line, a caret under the column, then the tagged message.
#[must_use]
pub fn render(scanner: &Scanner, token: Token, diag: Diag) -> String {
    let mut out = String::new();
    if scanner.is_empty_file() {
        out.push_str(&format!("File \"{}\" is empty\n", scanner.path().display()));
    } else {
        out.push_str(&format!(
            "File \"{}\", line {}\n",
            scanner.path().display(),
            token.line + 1
        ));
        if let Some(line) = scanner.line(token.line) {
            out.push_str(&format!("  {line}\n"));
            out.push_str(&format!("  {}^\n", " ".repeat(token.col.saturating_sub(1))));
        }
    }
    out.push_str(&format!(
        "{}[E{}]: {}\n",
        diag.category().label(),
        diag.code(),
        diag.message()
    ));
    out
}

/// Renders a circuit-global diagnostic with no source location.
#[must_use]
pub fn render_global(scanner: &Scanner, diag: Diag) -> String {
    format!(
        "File \"{}\"\n{}[E{}]: {}\n",
        scanner.path().display(),
        diag.category().label(),
        diag.code(),
        diag.message()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::Names;
    use crate::scanner::TokenKind;
    use std::collections::HashSet;
    use std::path::Path;

    #[test]
    fn codes_are_unique() {
        let all = [
            Diag::NoDevice,
            Diag::NoConnect,
            Diag::NoMonitor,
            Diag::NoEnd,
            Diag::NoEof,
            Diag::NotValidDeviceType,
            Diag::NoName,
            Diag::NoParameter,
            Diag::NoCloseBracket,
            Diag::NoPunctuation,
            Diag::NotValidOutput,
            Diag::NotValidInput,
            Diag::NoConnectionOp,
            Diag::NoDot,
            Diag::NoSemicolon,
            Diag::Device(DeviceError::DevicePresent),
            Diag::Device(DeviceError::NoQualifier),
            Diag::Device(DeviceError::InvalidQualifier),
            Diag::Device(DeviceError::QualifierPresent),
            Diag::Device(DeviceError::BadDevice),
            Diag::Device(DeviceError::InvalidSwitch),
            Diag::Network(NetworkError::DeviceAbsent),
            Diag::Network(NetworkError::InputConnected),
            Diag::Network(NetworkError::InputToInput),
            Diag::Network(NetworkError::PortAbsent),
            Diag::Network(NetworkError::InputsNotConnected),
            Diag::Monitor(MonitorError::DeviceAbsent),
            Diag::Monitor(MonitorError::NotOutput),
            Diag::Monitor(MonitorError::MonitorPresent),
        ];
        let codes: HashSet<u16> = all.iter().map(|d| d.code()).collect();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn caret_lands_under_the_column() {
        let mut names = Names::new();
        let mut scanner = Scanner::from_source(Path::new("c.circuit"), "DEVICE AND ;\nEND");
        let mut tok = scanner.next_token(&mut names);
        while tok.kind != TokenKind::Semicolon {
            tok = scanner.next_token(&mut names);
        }
        let text = render(&scanner, tok, Diag::NoName);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "File \"c.circuit\", line 1");
        assert_eq!(lines[1], "  DEVICE AND ;");
        // Two-space indent plus eleven columns puts the caret under ';'.
        assert_eq!(lines[2], format!("  {}^", " ".repeat(11)));
        assert!(lines[3].starts_with("DeviceError[E207]: missing device name"));
    }

    #[test]
    fn empty_file_renders_without_source_quote() {
        let mut names = Names::new();
        let mut scanner = Scanner::from_source(Path::new("empty.circuit"), "");
        let tok = scanner.next_token(&mut names);
        let text = render(&scanner, tok, Diag::NoDevice);
        assert!(text.contains("is empty"));
        assert!(text.contains("KeywordError[E201]"));
    }
}
