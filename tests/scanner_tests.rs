//! Scanner behaviour through the public API: token classification,
//! positions, comment and whitespace handling, EOF behaviour.

use logsim::names::Names;
use logsim::scanner::{Scanner, Token, TokenKind};
use std::path::Path;

mod common;
use common::circuit_file;

fn tokens_of(src: &str) -> Vec<Token> {
    let mut names = Names::new();
    let mut scanner = Scanner::from_source(Path::new("scan.circuit"), src);
    let mut out = Vec::new();
    loop {
        let tok = scanner.next_token(&mut names);
        let done = tok.kind == TokenKind::Eof;
        out.push(tok);
        if done {
            return out;
        }
    }
}

#[test]
fn scans_a_full_definition_file() {
    let src = "\
DEVICE SWITCH a(1); # drive
CONNECT a -> g.I1;
MONITOR a
END
";
    let kinds: Vec<TokenKind> = tokens_of(src).iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Keyword,      // DEVICE
            TokenKind::NameCaps,     // SWITCH
            TokenKind::NameAlnum,    // a
            TokenKind::OpenParen,
            TokenKind::Number,
            TokenKind::CloseParen,
            TokenKind::Semicolon,
            TokenKind::Keyword,      // CONNECT
            TokenKind::NameAlnum,    // a
            TokenKind::ConnectionOp, // ->
            TokenKind::NameAlnum,    // g
            TokenKind::Dot,
            TokenKind::NameCapsNum,  // I1
            TokenKind::Semicolon,
            TokenKind::Keyword,      // MONITOR
            TokenKind::NameAlnum,    // a
            TokenKind::Keyword,      // END
            TokenKind::Eof,
        ]
    );
}

#[test]
fn every_stray_symbol_is_an_invalid_token() {
    for ch in ['!', '$', '%', '^', '&', '*', '_', '+', '=', '@', '~', '?', '/', '|', '\\', '£'] {
        let src = ch.to_string();
        let tokens = tokens_of(&src);
        assert_eq!(tokens[0].kind, TokenKind::Invalid, "char {ch:?}");
        assert_eq!(tokens[1].kind, TokenKind::Eof, "char {ch:?}");
    }
}

#[test]
fn eof_position_is_after_the_last_symbol_and_stable() {
    let mut names = Names::new();
    let mut scanner = Scanner::from_source(Path::new("scan.circuit"), "DEVICE\nEND");
    let mut tok = scanner.next_token(&mut names);
    while tok.kind != TokenKind::Eof {
        tok = scanner.next_token(&mut names);
    }
    assert_eq!((tok.line, tok.col), (1, 4));
    // Asking again and again yields the same token.
    for _ in 0..3 {
        assert_eq!(scanner.next_token(&mut names), tok);
    }
}

#[test]
fn comments_can_cover_whole_and_partial_lines() {
    let src = "\
# leading comment
DEVICE # trailing comment
# interleaved
END
";
    let tokens = tokens_of(src);
    assert_eq!(tokens.len(), 3);
    assert_eq!((tokens[0].line, tokens[0].col), (1, 1));
    assert_eq!((tokens[1].line, tokens[1].col), (3, 1));
}

#[test]
fn unterminated_final_line_still_scans() {
    let tokens = tokens_of("END"); // no trailing newline
    assert_eq!(tokens[0].kind, TokenKind::Keyword);
    assert_eq!(tokens[1].kind, TokenKind::Eof);
}

#[test]
fn identifiers_split_at_non_alphanumerics() {
    let tokens = tokens_of("ab1.CD2(x)");
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::NameAlnum,
            TokenKind::Dot,
            TokenKind::NameCapsNum,
            TokenKind::OpenParen,
            TokenKind::NameAlnum,
            TokenKind::CloseParen,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn number_values_survive_the_token() {
    let tokens = tokens_of("CLOCK ck(12)");
    let number = tokens.iter().find(|t| t.kind == TokenKind::Number).unwrap();
    assert_eq!(number.value, Some(12));
    assert_eq!(number.name, None);
}

#[test]
fn same_identifier_gets_one_id_across_the_file() {
    let mut names = Names::new();
    let mut scanner = Scanner::from_source(Path::new("scan.circuit"), "abc xyz abc");
    let first = scanner.next_token(&mut names);
    let middle = scanner.next_token(&mut names);
    let last = scanner.next_token(&mut names);
    assert_eq!(first.name, last.name);
    assert_ne!(first.name, middle.name);
}

#[test]
fn from_path_reads_real_files() {
    let file = circuit_file("MONITOR x END");
    let mut names = Names::new();
    let mut scanner = Scanner::from_path(file.path()).unwrap();
    assert_eq!(scanner.next_token(&mut names).kind, TokenKind::Keyword);
    assert_eq!(scanner.next_token(&mut names).kind, TokenKind::NameAlnum);
}

#[test]
fn from_path_missing_file_is_an_error() {
    assert!(Scanner::from_path(Path::new("/no/such/file.circuit")).is_err());
}
