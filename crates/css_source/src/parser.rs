//! Range-collecting stylesheet and declaration parsing on top of `cssparser`.

use cssparser::AtRuleParser as CssAtRuleParser;
use cssparser::BasicParseErrorKind;
use cssparser::CowRcStr;
use cssparser::ParseError;
use cssparser::Parser;
use cssparser::ParserInput;
use cssparser::ParserState;
use cssparser::QualifiedRuleParser as CssQualifiedRuleParser;
use cssparser::RuleBodyItemParser as CssRuleBodyItemParser;
use cssparser::RuleBodyParser as CssRuleBodyParser;
use cssparser::SourcePosition;
use cssparser::StyleSheetParser;
use cssparser::Token;
use cssparser::DeclarationParser as CssDeclarationParser;

use crate::{PropertySourceData, RuleSourceData, SourceRange, StyleSourceData};

/// One top-level rule produced by [`parse_sheet_text`].
///
/// At-rules are preserved as opaque text so callers can keep them as
/// non-style items; only style rules carry source data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedRule {
    Style {
        selector: String,
        source: RuleSourceData,
    },
    At {
        text: String,
    },
}

/// Byte offset of `position` within the text being parsed.
#[inline]
fn byte_offset(input: &Parser<'_, '_>, doc_start: SourcePosition, position: SourcePosition) -> u32 {
    input.slice(doc_start..position).len() as u32
}

/// Parse `!important` at the end of a value, returning
/// (`value_without_important`, `important_flag`).
fn split_important_tail(value: &str) -> (String, bool) {
    let trimmed = value.trim();
    let lowered = trimmed.to_ascii_lowercase();
    if let Some(pos) = lowered.rfind("!important")
        && lowered[pos + "!important".len()..].trim().is_empty()
        && let Some(prefix) = trimmed.get(..pos)
    {
        return (prefix.trim_end().to_owned(), true);
    }
    (trimmed.to_owned(), false)
}

/// Whether a declaration value survives the shape checks beyond tokenization.
#[inline]
fn value_parsed_ok(value: &str) -> bool {
    !value.is_empty() && !value.contains('!')
}

/// Grow `range` over an optional run of whitespace followed by `;`.
fn extend_range_over_semicolon(text: &str, range: &mut SourceRange) {
    let bytes = text.as_bytes();
    let mut index = range.end as usize;
    while index < bytes.len() && matches!(bytes[index], b' ' | b'\t' | b'\n' | b'\r' | b'\x0c') {
        index += 1;
    }
    if index < bytes.len() && bytes[index] == b';' {
        range.end = (index + 1) as u32;
    }
}

/// A declaration parser that records property name, raw value, and the
/// declaration's byte range.
struct BodyDeclParser {
    doc_start: SourcePosition,
}

impl CssDeclarationParser<'_> for BodyDeclParser {
    type Declaration = PropertySourceData;
    type Error = ();

    fn parse_value<'input>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, '_>,
        decl_start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'input, Self::Error>> {
        let start = decl_start.position();
        let value_start = input.position();
        let mut value_end = input.position();
        while input.next().is_ok() {
            value_end = input.position();
        }
        let raw = input.slice(value_start..value_end);
        let (value, important) = split_important_tail(raw);
        let parsed_ok = value_parsed_ok(&value);
        let range = SourceRange::new(
            byte_offset(input, self.doc_start, start),
            byte_offset(input, self.doc_start, value_end),
        );
        Ok(PropertySourceData {
            name: name.to_ascii_lowercase(),
            value,
            important,
            parsed_ok,
            range,
        })
    }
}

impl CssAtRuleParser<'_> for BodyDeclParser {
    type Prelude = ();
    type AtRule = PropertySourceData; // Not produced
    type Error = ();

    #[inline]
    fn parse_prelude<'input>(
        &mut self,
        _name: CowRcStr<'input>,
        _input: &mut Parser<'input, '_>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        Ok(())
    }

    #[inline]
    fn parse_block<'input>(
        &mut self,
        _prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::AtRule, ParseError<'input, Self::Error>> {
        // Not produced by this parser
        Err(input.new_error(BasicParseErrorKind::AtRuleBodyInvalid))
    }

    #[inline]
    fn rule_without_block(
        &mut self,
        _prelude: Self::Prelude,
        _state: &ParserState,
    ) -> Result<Self::AtRule, Self::Error> {
        Err(())
    }
}

impl CssQualifiedRuleParser<'_> for BodyDeclParser {
    type Prelude = ();
    type QualifiedRule = PropertySourceData; // Not produced
    type Error = ();

    #[inline]
    fn parse_prelude<'input>(
        &mut self,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid))
    }

    #[inline]
    fn parse_block<'input>(
        &mut self,
        _prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::QualifiedRule, ParseError<'input, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid))
    }
}

impl CssRuleBodyItemParser<'_, PropertySourceData, ()> for BodyDeclParser {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Top-level parser producing [`ParsedRule`] items for qualified rules and
/// opaque text for at-rules.
struct TopLevelParser {
    doc_start: SourcePosition,
}

impl CssAtRuleParser<'_> for TopLevelParser {
    type Prelude = String;
    type AtRule = ParsedRule;
    type Error = ();

    fn parse_prelude<'input>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        let start = input.position();
        while input.next_including_whitespace_and_comments().is_ok() {}
        let raw = input.slice_from(start).trim();
        let mut text = format!("@{name}");
        if !raw.is_empty() {
            text.push(' ');
            text.push_str(raw);
        }
        Ok(text)
    }

    fn parse_block<'input>(
        &mut self,
        prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::AtRule, ParseError<'input, Self::Error>> {
        let content_start = input.position();
        while input.next_including_whitespace_and_comments().is_ok() {}
        let content = input.slice_from(content_start);
        Ok(ParsedRule::At {
            text: format!("{prelude} {{{content}}}"),
        })
    }

    #[inline]
    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        _state: &ParserState,
    ) -> Result<Self::AtRule, Self::Error> {
        Ok(ParsedRule::At {
            text: format!("{prelude};"),
        })
    }
}

impl CssQualifiedRuleParser<'_> for TopLevelParser {
    type Prelude = (String, SourceRange);
    type QualifiedRule = ParsedRule;
    type Error = ();

    fn parse_prelude<'input>(
        &mut self,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        let start = input.position();
        while input.next_including_whitespace_and_comments().is_ok() {}
        let end = input.position();
        let raw = input.slice(start..end);
        let leading = (raw.len() - raw.trim_start().len()) as u32;
        let trailing = (raw.len() - raw.trim_end().len()) as u32;
        let range = SourceRange::new(
            byte_offset(input, self.doc_start, start) + leading,
            byte_offset(input, self.doc_start, end) - trailing,
        );
        Ok((raw.trim().to_owned(), range))
    }

    fn parse_block<'input>(
        &mut self,
        prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::QualifiedRule, ParseError<'input, Self::Error>> {
        let (selector, selector_range) = prelude;
        let body_start = input.position();
        let mut properties = Vec::new();
        let mut body = BodyDeclParser {
            doc_start: self.doc_start,
        };
        for declaration in CssRuleBodyParser::new(input, &mut body).flatten() {
            properties.push(declaration);
        }
        let body_end = input.position();
        let body_range = SourceRange::new(
            byte_offset(input, self.doc_start, body_start),
            byte_offset(input, self.doc_start, body_end),
        );
        Ok(ParsedRule::Style {
            selector,
            source: RuleSourceData {
                selector_range,
                style: StyleSourceData {
                    body_range,
                    properties,
                },
            },
        })
    }
}

/// Parse a full stylesheet, producing rules in source order together with
/// their byte ranges. Fragments the parser rejects are skipped.
pub fn parse_sheet_text(text: &str) -> Vec<ParsedRule> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let doc_start = parser.position();
    let mut top = TopLevelParser { doc_start };
    let mut rules = Vec::new();
    for result in StyleSheetParser::new(&mut parser, &mut top) {
        match result {
            Ok(rule) => rules.push(rule),
            Err((error, slice)) => {
                log::debug!("skipping unparsable rule fragment {slice:?}: {error:?}");
            }
        }
    }
    for rule in &mut rules {
        if let ParsedRule::Style { source, .. } = rule {
            for property in &mut source.style.properties {
                extend_range_over_semicolon(text, &mut property.range);
            }
        }
    }
    rules
}

/// Declaration-level parse for inline style text. The synthetic body range
/// spans the whole input; empty input yields an empty zero-width body.
pub fn parse_declaration_text(text: &str) -> StyleSourceData {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let doc_start = parser.position();
    let mut body = BodyDeclParser { doc_start };
    let mut properties = Vec::new();
    for declaration in CssRuleBodyParser::new(&mut parser, &mut body).flatten() {
        properties.push(declaration);
    }
    for property in &mut properties {
        extend_range_over_semicolon(text, &mut property.range);
    }
    StyleSourceData {
        body_range: SourceRange::new(0, text.len() as u32),
        properties,
    }
}

/// Whether `text` can be spliced into a declaration block without escaping
/// it: rejects any unmatched closing delimiter at the top level.
pub fn declaration_block_is_valid(text: &str) -> bool {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    loop {
        match parser.next_including_whitespace_and_comments() {
            Ok(token) => {
                if matches!(
                    token,
                    Token::CloseCurlyBracket | Token::CloseParenthesis | Token::CloseSquareBracket
                ) {
                    return false;
                }
            }
            Err(_) => return true,
        }
    }
}
