use chumsky::error::RichReason;
use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::ast::{CallStatement, Identifier, Literal, Program};
use crate::error::SyntaxError;
use crate::lexer::{self, Token, TokenKind};

/// Spans handed to chumsky are token indices, not byte offsets, so an error
/// span maps straight back to the offending token's [`Location`](crate::Location).
type Span = SimpleSpan;

fn token<'a, I>(kind: TokenKind) -> impl Parser<'a, I, Token, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    any().filter(move |t: &Token| t.kind == kind)
}

fn punct<'a, I>(kind: TokenKind, label: &'static str) -> impl Parser<'a, I, (), extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    token(kind).ignored().labelled(label)
}

/// Build the program parser.
fn program_parser<'a, I>() -> impl Parser<'a, I, Program, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    let identifier = token(TokenKind::Identifier)
        .map(|t: Token| Identifier {
            name: t.lexeme,
            location: t.location,
        })
        .labelled("identifier");

    // -- Literals --

    let number = token(TokenKind::Number).validate(|t: Token, e, emitter| {
        let value = t.lexeme.parse::<f64>().unwrap_or(f64::NAN);
        if !value.is_finite() {
            emitter.emit(Rich::custom(e.span(), "Invalid number literal"));
        }
        Literal::Number {
            value,
            raw: t.lexeme,
            location: t.location,
        }
    });
    let boolean = token(TokenKind::Boolean).map(|t: Token| Literal::Boolean {
        value: t.lexeme == "true",
        location: t.location,
    });
    let hex_color = token(TokenKind::HexColor).map(|t: Token| Literal::HexColor {
        value: t.lexeme,
        location: t.location,
    });
    let literal = choice((number, boolean, hex_color)).labelled("literal");

    // -- Statements --

    let arguments = literal
        .separated_by(punct(TokenKind::Comma, "','"))
        .collect::<Vec<_>>()
        .delimited_by(punct(TokenKind::LeftParen, "'('"), punct(TokenKind::RightParen, "')'"));

    let call = identifier
        .clone()
        .then_ignore(punct(TokenKind::Dot, "'.'"))
        .then(identifier)
        .then(arguments)
        .map(|((module, function), arguments)| CallStatement {
            location: module.location,
            module,
            function,
            arguments,
        })
        .labelled("call statement");

    // Zero or more statement terminators
    let nl = token(TokenKind::StatementEnd).repeated();
    // One or more
    let nl1 = token(TokenKind::StatementEnd).repeated().at_least(1);

    call.separated_by(nl1)
        .allow_trailing()
        .collect::<Vec<_>>()
        .padded_by(nl)
        .then_ignore(end())
        .map(|statements| Program { statements })
}

/// `found` is the token at the error span, `None` past the last token.
fn describe(error: &Rich<'_, Token>, found: Option<&Token>) -> String {
    match (error.reason(), found) {
        (RichReason::Custom(message), _) => message.clone(),
        (_, Some(token)) => format!("Unexpected {token}"),
        (_, None) => "Unexpected end of input".to_string(),
    }
}

/// Parse a token stream ending in [`TokenKind::Eof`] into a [`Program`].
///
/// Only the earliest error is reported.
pub fn parse(tokens: &[Token]) -> Result<Program, SyntaxError> {
    let (body, eof_location) = match tokens.split_last() {
        Some((last, body)) if last.kind == TokenKind::Eof => (body, last.location),
        Some((last, _)) => (tokens, last.location),
        None => (tokens, Default::default()),
    };

    let token_iter = body
        .iter()
        .enumerate()
        .map(|(i, tok)| (tok.clone(), Span::from(i..i + 1)));
    let eoi: Span = (body.len()..body.len()).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let (output, errors) = program_parser().parse(stream).into_output_errors();

    if let Some(error) = errors.into_iter().min_by_key(|e| e.span().start) {
        let found = body.get(error.span().start);
        let location = found.map_or(eof_location, |t| t.location);
        return Err(SyntaxError::new(describe(&error, found), location));
    }

    output.ok_or_else(|| SyntaxError::new("Unexpected end of input", eof_location))
}

/// Tokenize and parse in one step.
pub fn parse_source(source: &str) -> Result<Program, SyntaxError> {
    let tokens = lexer::tokenize(source)?;
    parse(&tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Location;

    fn parse_ok(source: &str) -> Program {
        match parse_source(source) {
            Ok(program) => program,
            Err(e) => panic!("parse failed: {e}"),
        }
    }

    #[test]
    fn parse_single_call() {
        let program = parse_ok("motor.forward(10)");
        assert_eq!(program.statements.len(), 1);
        let call = &program.statements[0];
        assert_eq!(call.module.name, "motor");
        assert_eq!(call.function.name, "forward");
        assert_eq!(call.location, Location::new(0, 1, 1));
        assert!(matches!(
            &call.arguments[0],
            Literal::Number { value, raw, .. } if *value == 10.0 && raw == "10"
        ));
    }

    #[test]
    fn parse_all_literal_kinds() {
        let program = parse_ok("x.y(-2.5, true, #FF00FF)");
        let args = &program.statements[0].arguments;
        assert_eq!(args.len(), 3);
        assert!(matches!(&args[0], Literal::Number { value, .. } if *value == -2.5));
        assert!(matches!(&args[1], Literal::Boolean { value: true, .. }));
        assert!(matches!(&args[2], Literal::HexColor { value, .. } if value == "#ff00ff"));
        assert_eq!(args[2].location().column, 17);
    }

    #[test]
    fn parse_empty_argument_list() {
        let program = parse_ok("debug.reset()");
        assert!(program.statements[0].arguments.is_empty());
    }

    #[test]
    fn blank_lines_produce_no_statements() {
        assert!(parse_ok("\n\n").statements.is_empty());
        assert!(parse_ok("").statements.is_empty());
        assert!(parse_ok(";;\n").statements.is_empty());
    }

    #[test]
    fn terminators_are_flexible() {
        let program = parse_ok("\n\na.b(1);;\n\nc.d(2)\n\n");
        assert_eq!(program.statements.len(), 2);
        let program = parse_ok("a.b(1); c.d(2); e.f(3)");
        assert_eq!(program.statements.len(), 3);
    }

    #[test]
    fn comments_between_statements() {
        let program = parse_ok("# setup\nmotor.left(90) // turn\n\n// done\n");
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn unterminated_call_fails_at_end() {
        let err = parse_source("motor.forward(10").unwrap_err();
        assert_eq!(err.message, "Unexpected end of input");
        assert_eq!(err.location, Location::new(16, 1, 17));
    }

    #[test]
    fn identifier_argument_is_rejected() {
        let err = parse_source("debug.color(red)").unwrap_err();
        assert_eq!(err.location.column, 13);
        assert_eq!(err.message, "Unexpected 'red'");
    }

    #[test]
    fn two_statements_on_one_line_fail() {
        let err = parse_source("a.b(1) c.d(2)").unwrap_err();
        assert_eq!(err.message, "Unexpected 'c'");
        assert_eq!(err.location.column, 8);
    }

    #[test]
    fn trailing_comma_fails() {
        let err = parse_source("a.b(1,)").unwrap_err();
        assert_eq!(err.message, "Unexpected ')'");
        assert_eq!(err.location.column, 7);
    }

    #[test]
    fn missing_dot_fails() {
        let err = parse_source("motor forward(1)").unwrap_err();
        assert_eq!(err.message, "Unexpected 'forward'");
        assert_eq!(err.location.column, 7);
    }

    #[test]
    fn stray_closing_paren_and_missing_function_name() {
        let err = parse_source("a.b(1))").unwrap_err();
        assert_eq!(err.message, "Unexpected ')'");
        assert_eq!(err.location.column, 7);

        let err = parse_source("a.(1)").unwrap_err();
        assert_eq!(err.message, "Unexpected '('");
        assert_eq!(err.location.column, 3);
    }

    #[test]
    fn enormous_number_is_invalid() {
        let source = format!("a.b(1{})", "0".repeat(400));
        let err = parse_source(&source).unwrap_err();
        assert_eq!(err.message, "Invalid number literal");
        assert_eq!(err.location.column, 5);
    }

    #[test]
    fn lex_errors_pass_through() {
        let err = parse_source("a.b(10.)").unwrap_err();
        assert_eq!(err.message, "Malformed decimal literal");
    }
}
