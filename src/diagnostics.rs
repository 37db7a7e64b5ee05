use crate::{EvalError, ParseError, Span};
use ariadne::{Config, Label, Report, ReportKind, Source};
use std::io::{self, Write};
use std::ops::Range;

type SourceSpan<'a> = (&'a str, Range<usize>);

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedCloseParen { span }
            | ParseError::UnexpectedEof { span }
            | ParseError::TrailingInput { span }
            | ParseError::TooDeeplyNested { span, .. } => *span,
            ParseError::Lexer(lex_err) => lex_err.span,
        }
    }

    fn build_report<'a>(&self, source_id: &'a str, color: bool) -> Report<'a, SourceSpan<'a>> {
        let mut range = self.span().to_range();
        // Point end-of-input errors at the last character read.
        if range.is_empty() && range.start > 0 {
            range = range.start - 1..range.start;
        }
        let builder = Report::build(ReportKind::Error, (source_id, range.clone()))
            .with_config(Config::default().with_color(color));
        let builder = match self {
            ParseError::UnexpectedCloseParen { .. } => builder
                .with_message("Unexpected ')'")
                .with_label(
                    Label::new((source_id, range))
                        .with_message("This parenthesis closes nothing"),
                ),
            ParseError::UnexpectedEof { .. } => builder
                .with_message("Unexpected end of input")
                .with_label(Label::new((source_id, range)).with_message("Expected ')'")),
            ParseError::TrailingInput { .. } => builder
                .with_message("Unexpected input after a complete expression")
                .with_label(
                    Label::new((source_id, range)).with_message("Only one expression is read"),
                ),
            ParseError::TooDeeplyNested { limit, .. } => builder
                .with_message(format!("Lists nested deeper than {}", limit))
                .with_label(
                    Label::new((source_id, range)).with_message("Nesting limit reached here"),
                ),
            ParseError::Lexer(lex_err) => builder
                .with_message("Lexer Error")
                .with_label(Label::new((source_id, range)).with_message(lex_err.to_string())),
        };
        builder.finish()
    }

    pub fn write_report<W: Write>(
        &self,
        source_id: &str,
        input: &str,
        color: bool,
        writer: W,
    ) -> io::Result<()> {
        self.build_report(source_id, color)
            .write((source_id, Source::from(input)), writer)
    }

    /// Prints a labelled report of this error against `input` to stderr.
    pub fn report(&self, source_id: &str, input: &str) -> io::Result<()> {
        self.build_report(source_id, true)
            .eprint((source_id, Source::from(input)))
    }
}

impl EvalError {
    // Evaluation errors carry no span, so the whole input is labelled.
    fn build_report<'a>(
        &self,
        source_id: &'a str,
        input: &str,
        color: bool,
    ) -> Report<'a, SourceSpan<'a>> {
        let range = 0..input.len();
        let builder = Report::build(ReportKind::Error, (source_id, range.clone()))
            .with_config(Config::default().with_color(color));
        let builder = match self {
            EvalError::DepthExceeded { limit } => builder
                .with_message(format!("Evaluation exceeded the depth limit of {}", limit))
                .with_label(
                    Label::new((source_id, range))
                        .with_message("This expression recursed too deeply"),
                ),
            EvalError::Output(io_err) => builder
                .with_message("Could not write output")
                .with_label(Label::new((source_id, range)).with_message(io_err.to_string())),
        };
        builder.finish()
    }

    pub fn write_report<W: Write>(
        &self,
        source_id: &str,
        input: &str,
        color: bool,
        writer: W,
    ) -> io::Result<()> {
        self.build_report(source_id, input, color)
            .write((source_id, Source::from(input)), writer)
    }

    pub fn report(&self, source_id: &str, input: &str) -> io::Result<()> {
        self.build_report(source_id, input, true)
            .eprint((source_id, Source::from(input)))
    }
}
