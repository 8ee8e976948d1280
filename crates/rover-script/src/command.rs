use std::fmt;

use crate::lexer::Location;

/// The type of a script value, as declared by function parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A finite `f64`.
    Number,
    /// `true` / `false`.
    Boolean,
    /// `#rgb` / `#rrggbb`.
    HexColor,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::HexColor => write!(f, "hexcolor"),
        }
    }
}

/// A runtime value passed to a module function.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A number and the text it was written as.
    Number {
        /// Parsed value.
        value: f64,
        /// Source text, e.g. `10` or `-2.50`.
        raw: String,
    },
    /// A boolean.
    Boolean(bool),
    /// A lowercased hex color, including the `#`.
    HexColor(String),
}

impl Value {
    /// A number value whose raw text is its default formatting.
    pub fn number(value: f64) -> Self {
        Self::Number {
            value,
            raw: value.to_string(),
        }
    }

    /// The value's kind.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Number { .. } => ValueKind::Number,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::HexColor(_) => ValueKind::HexColor,
        }
    }

    /// The number, if this is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The color string, if this is one.
    pub fn as_hex_color(&self) -> Option<&str> {
        match self {
            Self::HexColor(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number { raw, .. } => f.write_str(raw),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::HexColor(c) => f.write_str(c),
        }
    }
}

/// A value and where it appeared.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    /// The value.
    pub value: Value,
    /// Its source position.
    pub location: Location,
}

impl Argument {
    /// Create an argument.
    pub fn new(value: Value, location: Location) -> Self {
        Self { value, location }
    }
}

/// One compiled `module.function(args)` invocation, ready to run.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Target module name.
    pub module: String,
    /// Target function name.
    pub function: String,
    /// Arguments in call order.
    pub arguments: Vec<Argument>,
    /// Position of the statement.
    pub location: Location,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.module, self.function)?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg.value)?;
        }
        f.write_str(")")
    }
}
