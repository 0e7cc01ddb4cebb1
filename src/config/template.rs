//! Identifier template grammar
//!
//! A template is a separator-delimited run of segments, each either literal
//! text or a `%(name)s` placeholder:
//!
//! ```text
//! CMIP6.%(activity_id)s.%(institution_id)s.%(source_id)s
//! %(variable)s_%(cmor_table)s_%(model)s[_%(time_range)s].nc
//! ```
//!
//! Segments inside `[...]` are optional. For filename templates a trailing
//! `.ext` is the file suffix and counts as one more element marker.

use cv_model::IdentifierType;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1, take_while1},
    character::complete::char,
    combinator::{all_consuming, cut, map},
    error::{context, ContextError, ParseError as NomParseError, VerboseError},
    multi::many0,
    sequence::delimited,
    IResult,
};

use crate::error::ConfigError;

/// Kind of a template segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Fixed text the identifier element must equal
    Literal(String),
    /// `%(name)s` marker, bound to a collection or expression
    Placeholder(String),
}

/// One separator-delimited element of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSegment {
    pub kind: SegmentKind,
    pub optional: bool,
}

/// Result of scanning a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedTemplate {
    pub segments: Vec<TemplateSegment>,
    /// Filename extension, without the dot
    pub suffix: Option<String>,
}

impl ScannedTemplate {
    /// Number of identifier elements the template describes
    pub fn marker_count(&self) -> usize {
        self.segments.len() + usize::from(self.suffix.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Separator,
    Text(&'a str),
    Placeholder(&'a str),
    Optional(Vec<Token<'a>>),
}

// ============================================================================
// Public API
// ============================================================================

/// Scan a raw template into segments
pub fn scan_template(
    template: &str,
    separator: char,
    identifier_type: IdentifierType,
) -> Result<ScannedTemplate, ConfigError> {
    let syntax_error = |message: String| ConfigError::TemplateSyntax {
        template: template.to_string(),
        message,
    };

    let (body, suffix) = match identifier_type {
        IdentifierType::Filename => split_suffix(template, separator),
        _ => (template, None),
    };
    if body.trim().is_empty() {
        return Err(syntax_error("template is empty".to_string()));
    }

    let tokens = match all_consuming(tokens::<VerboseError<&str>>(separator))(body) {
        Ok((_, tokens)) => tokens,
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            return Err(syntax_error(nom::error::convert_error(body, e)));
        }
        Err(nom::Err::Incomplete(_)) => return Err(syntax_error("incomplete input".to_string())),
    };

    let mut assembler = SegmentAssembler::default();
    for token in &tokens {
        assembler.push(token, false).map_err(syntax_error)?;
    }
    let segments = assembler.finish().map_err(syntax_error)?;

    Ok(ScannedTemplate { segments, suffix })
}

/// Split a trailing `.ext` off a filename template
fn split_suffix(template: &str, separator: char) -> (&str, Option<String>) {
    match template.rsplit_once('.') {
        Some((body, ext))
            if !ext.is_empty()
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
                && !ext.contains(separator) =>
        {
            (body, Some(ext.to_string()))
        }
        _ => (template, None),
    }
}

// ============================================================================
// Internal Parsers
// ============================================================================

fn tokens<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    separator: char,
) -> impl FnMut(&'a str) -> IResult<&'a str, Vec<Token<'a>>, E> {
    move |input| many0(alt((optional_group(separator), plain_token(separator))))(input)
}

fn optional_group<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    separator: char,
) -> impl FnMut(&'a str) -> IResult<&'a str, Token<'a>, E> {
    move |input| {
        map(
            delimited(
                char('['),
                many0(plain_token(separator)),
                cut(context("closing bracket", char(']'))),
            ),
            Token::Optional,
        )(input)
    }
}

fn plain_token<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    separator: char,
) -> impl FnMut(&'a str) -> IResult<&'a str, Token<'a>, E> {
    move |input| {
        alt((
            map(char(separator), |_| Token::Separator),
            map(placeholder, Token::Placeholder),
            map(
                take_till1(|c| c == separator || c == '[' || c == ']' || c == '%'),
                Token::Text,
            ),
        ))(input)
    }
}

fn placeholder<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    delimited(
        tag("%("),
        cut(context(
            "placeholder name",
            take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-'),
        )),
        cut(context("placeholder terminator ')s'", tag(")s"))),
    )(input)
}

// ============================================================================
// Segment assembly
// ============================================================================

#[derive(Default)]
struct SegmentAssembler<'a> {
    segments: Vec<TemplateSegment>,
    current: Vec<&'a Token<'a>>,
    current_optional: bool,
}

impl<'a> SegmentAssembler<'a> {
    fn push(&mut self, token: &'a Token<'a>, optional: bool) -> Result<(), String> {
        match token {
            Token::Separator => self.flush(),
            Token::Optional(inner) => {
                self.flush()?;
                for token in inner {
                    self.push(token, true)?;
                }
                self.flush()
            }
            Token::Text(_) | Token::Placeholder(_) => {
                if self.current.is_empty() {
                    self.current_optional = optional;
                }
                self.current.push(token);
                Ok(())
            }
        }
    }

    fn flush(&mut self) -> Result<(), String> {
        let pieces = std::mem::take(&mut self.current);
        let kind = match pieces.as_slice() {
            [] => return Ok(()),
            [Token::Placeholder(name)] => SegmentKind::Placeholder(name.to_string()),
            pieces if pieces.iter().all(|p| matches!(p, Token::Text(_))) => {
                let text: String = pieces
                    .iter()
                    .filter_map(|p| match p {
                        Token::Text(t) => Some(*t),
                        _ => None,
                    })
                    .collect();
                SegmentKind::Literal(text)
            }
            _ => {
                return Err(format!(
                    "segment {} mixes literal text and placeholders",
                    self.segments.len() + 1
                ))
            }
        };
        self.segments.push(TemplateSegment {
            kind,
            optional: self.current_optional,
        });
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<TemplateSegment>, String> {
        self.flush()?;
        Ok(self.segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn literal(text: &str) -> TemplateSegment {
        TemplateSegment {
            kind: SegmentKind::Literal(text.to_string()),
            optional: false,
        }
    }

    fn placeholder(name: &str, optional: bool) -> TemplateSegment {
        TemplateSegment {
            kind: SegmentKind::Placeholder(name.to_string()),
            optional,
        }
    }

    #[test]
    fn test_dataset_template() {
        let scanned = scan_template(
            "CMIP6.%(activity_id)s.%(institution_id)s",
            '.',
            IdentifierType::Dataset,
        )
        .unwrap();

        assert_eq!(
            scanned.segments,
            vec![
                literal("CMIP6"),
                placeholder("activity_id", false),
                placeholder("institution_id", false),
            ]
        );
        assert_eq!(scanned.suffix, None);
        assert_eq!(scanned.marker_count(), 3);
    }

    #[test]
    fn test_filename_template_with_optional_group_and_suffix() {
        let scanned = scan_template(
            "%(variable)s_%(cmor_table)s_%(ensemble)s[_%(time_range)s].nc",
            '_',
            IdentifierType::Filename,
        )
        .unwrap();

        assert_eq!(
            scanned.segments,
            vec![
                placeholder("variable", false),
                placeholder("cmor_table", false),
                placeholder("ensemble", false),
                placeholder("time_range", true),
            ]
        );
        assert_eq!(scanned.suffix.as_deref(), Some("nc"));
        assert_eq!(scanned.marker_count(), 5);
    }

    #[test]
    fn test_directory_template() {
        let scanned = scan_template(
            "CMIP6/%(activity_id)s/%(version)s",
            '/',
            IdentifierType::Directory,
        )
        .unwrap();
        assert_eq!(scanned.marker_count(), 3);
    }

    #[test]
    fn test_suffix_only_split_for_filenames() {
        let scanned = scan_template("cmip5.%(product)s", '.', IdentifierType::Dataset).unwrap();
        assert_eq!(scanned.suffix, None);
        assert_eq!(scanned.segments.len(), 2);
    }

    #[test]
    fn test_mixed_segment_rejected() {
        let err = scan_template("v%(version)s", '.', IdentifierType::Dataset).unwrap_err();
        assert!(matches!(err, ConfigError::TemplateSyntax { .. }));
    }

    #[test]
    fn test_unclosed_bracket_rejected() {
        let err = scan_template("%(a)s.[%(b)s", '.', IdentifierType::Dataset).unwrap_err();
        assert!(matches!(err, ConfigError::TemplateSyntax { .. }));
    }

    #[test]
    fn test_unterminated_placeholder_rejected() {
        let err = scan_template("%(a.%(b)s", '.', IdentifierType::Dataset).unwrap_err();
        assert!(matches!(err, ConfigError::TemplateSyntax { .. }));
    }

    #[test]
    fn test_empty_template_rejected() {
        assert!(scan_template("  ", '.', IdentifierType::Dataset).is_err());
    }
}
