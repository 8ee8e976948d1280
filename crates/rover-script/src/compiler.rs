use crate::ast::{CallStatement, Literal, Program};
use crate::command::{Argument, Command, Value};

/// Lower a parsed program into executable commands.
///
/// Total: every well-formed program compiles. Commands keep source order.
pub fn compile(program: &Program) -> Vec<Command> {
    program.statements.iter().map(compile_call).collect()
}

fn compile_call(statement: &CallStatement) -> Command {
    Command {
        module: statement.module.name.clone(),
        function: statement.function.name.clone(),
        arguments: statement.arguments.iter().map(compile_literal).collect(),
        location: statement.location,
    }
}

fn compile_literal(literal: &Literal) -> Argument {
    let value = match literal {
        Literal::Number { value, raw, .. } => Value::Number {
            value: *value,
            raw: raw.clone(),
        },
        Literal::Boolean { value, .. } => Value::Boolean(*value),
        Literal::HexColor { value, .. } => Value::HexColor(value.clone()),
    };
    Argument::new(value, literal.location())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn compile_source(source: &str) -> Vec<Command> {
        compile(&parse_source(source).unwrap())
    }

    #[test]
    fn compiles_in_source_order() {
        let commands = compile_source("motor.forward(10)\nmotor.left(90)\ndebug.pen(true)");
        let rendered: Vec<_> = commands.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["motor.forward(10)", "motor.left(90)", "debug.pen(true)"]
        );
    }

    #[test]
    fn keeps_raw_number_text_and_locations() {
        let commands = compile_source("\n  motor.forward(2.50)");
        let command = &commands[0];
        assert_eq!(command.location.line, 2);
        assert_eq!(command.location.column, 3);
        let arg = &command.arguments[0];
        assert_eq!(arg.value, Value::Number { value: 2.5, raw: "2.50".into() });
        assert_eq!(arg.location.column, 17);
    }

    #[test]
    fn empty_program_compiles_to_nothing() {
        assert!(compile_source("// nothing\n").is_empty());
    }
}
