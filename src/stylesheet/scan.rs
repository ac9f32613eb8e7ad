//! Declaration span lookup using the `cssparser` tokenizer.
//!
//! Finds the byte range of every declaration value that sits below a
//! qualified rule. Values are never re-serialized: the ranges point into the
//! original text so callers can splice changed values back in place.

use std::ops::Range;

use cssparser::{ParseError, Parser, ParserInput, Token};

use crate::log;

/// Blocks nested deeper than this are skipped, not walked.
pub const MAX_NESTING: usize = 64;

/// A declaration located in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDecl {
    /// Property name, trimmed.
    pub property: String,
    /// Byte range of the value, whitespace-trimmed.
    pub value: Range<usize>,
}

/// Scan `src` and return declarations of qualified rules in source order.
///
/// Declarations directly inside top-level at-rule blocks (`@font-face`,
/// `@page`) are not reported. Everything below a qualified rule is, including
/// declarations inside at-rules nested in that rule.
pub fn scan_declarations(src: &str) -> Vec<RawDecl> {
    let mut input = ParserInput::new(src);
    let mut parser = Parser::new(&mut input);
    let mut walker = Walker {
        src,
        found: Vec::new(),
    };
    walker.block(&mut parser, false, 0);
    walker.found
}

struct Walker<'a> {
    src: &'a str,
    found: Vec<RawDecl>,
}

/// Token kinds the walker cares about.
#[derive(Clone, Copy)]
enum Piece {
    Semicolon,
    Block,
    Nested,
    Colon,
    StrayBrace,
    Other,
    End,
}

impl Walker<'_> {
    /// Walk one block (or the whole sheet) segment by segment.
    ///
    /// A segment ends at `;`, at a `{}` block, or at the end of the block.
    fn block(&mut self, p: &mut Parser<'_, '_>, in_rule: bool, depth: usize) {
        loop {
            p.skip_whitespace();
            let start = p.position().byte_index();
            let mut colon = None;

            loop {
                let before = p.position().byte_index();
                let piece = match p.next() {
                    Ok(Token::Semicolon) => Piece::Semicolon,
                    Ok(Token::CurlyBracketBlock) => Piece::Block,
                    Ok(Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock) => {
                        Piece::Nested
                    }
                    Ok(Token::Colon) => Piece::Colon,
                    Ok(Token::CloseCurlyBracket) => Piece::StrayBrace,
                    Ok(_) => Piece::Other,
                    Err(_) => Piece::End,
                };

                match piece {
                    Piece::Semicolon => {
                        if in_rule {
                            self.declaration(start, colon, before);
                        }
                        break;
                    }
                    Piece::End => {
                        if in_rule {
                            self.declaration(start, colon, before);
                        }
                        return;
                    }
                    Piece::Block => {
                        let prelude = self.src[start..before].trim();
                        let child_in_rule = in_rule || !prelude.starts_with('@');
                        if depth >= MAX_NESTING {
                            log!("warning"; "blocks nested deeper than {} levels are left untouched", MAX_NESTING);
                        } else {
                            let _ = p.parse_nested_block(|nested| {
                                self.block(nested, child_in_rule, depth + 1);
                                Ok::<_, ParseError<'_, ()>>(())
                            });
                        }
                        break;
                    }
                    Piece::Nested => skip_nested(p),
                    Piece::Colon if colon.is_none() => colon = Some(before),
                    Piece::StrayBrace => break,
                    Piece::Colon | Piece::Other => {}
                }
            }
        }
    }

    /// Record `property: value` found in `start..end`, if it is one.
    fn declaration(&mut self, start: usize, colon: Option<usize>, end: usize) {
        let Some(colon) = colon else {
            return;
        };
        let property = self.src[start..colon].trim();
        if property.is_empty() || property.starts_with('@') {
            return;
        }

        let raw = &self.src[colon + 1..end];
        let lead = raw.len() - raw.trim_start().len();
        let value_start = colon + 1 + lead;
        let value_end = value_start + raw.trim().len();

        self.found.push(RawDecl {
            property: property.to_string(),
            value: value_start..value_end,
        });
    }
}

/// Consume a function or bracket block so the parser position lands after it.
///
/// Blocks inside it are skipped by the tokenizer without recursion.
fn skip_nested(p: &mut Parser<'_, '_>) {
    let _ = p.parse_nested_block(|nested| {
        while nested.next().is_ok() {}
        Ok::<_, ParseError<'_, ()>>(())
    });
}
