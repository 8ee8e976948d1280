use crate::lexer::Location;

/// A parsed script: call statements in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    /// The statements.
    pub statements: Vec<CallStatement>,
}

/// A name together with where it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    /// The name.
    pub name: String,
    /// Its position.
    pub location: Location,
}

/// `module.function(arg, ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct CallStatement {
    /// The module being called.
    pub module: Identifier,
    /// The function being called.
    pub function: Identifier,
    /// Literal arguments.
    pub arguments: Vec<Literal>,
    /// Position of the module name.
    pub location: Location,
}

/// A literal argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// A finite number and the text it was written as.
    Number {
        /// Parsed value.
        value: f64,
        /// Source text.
        raw: String,
        /// Position.
        location: Location,
    },
    /// `true` or `false`.
    Boolean {
        /// Parsed value.
        value: bool,
        /// Position.
        location: Location,
    },
    /// A lowercased hex color.
    HexColor {
        /// The color, including the `#`.
        value: String,
        /// Position.
        location: Location,
    },
}

impl Literal {
    /// Where the literal was written.
    pub fn location(&self) -> Location {
        match self {
            Self::Number { location, .. }
            | Self::Boolean { location, .. }
            | Self::HexColor { location, .. } => *location,
        }
    }
}
