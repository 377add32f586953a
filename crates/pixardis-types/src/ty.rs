use std::fmt;

/// A Pixardis type. Arrays carry their compile-time fixed size; function
/// signatures are only ever constructed by the semantic analyzer when it
/// registers a declaration, never written by a user.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Int,
    Float,
    Bool,
    Colour,
    Array(Box<Type>, usize),
    Function(Vec<Type>, Box<Type>),
}

impl Type {
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Int | Type::Float | Type::Bool | Type::Colour)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(elem, _) => Some(elem),
            _ => None,
        }
    }

    /// The pairs permitted by `expr as T`, per the cast table in §3.
    pub fn cast_allowed(&self, target: &Type) -> bool {
        matches!(
            (self, target),
            (Type::Int, Type::Float)
                | (Type::Float, Type::Int)
                | (Type::Int, Type::Colour)
                | (Type::Colour, Type::Int)
                | (Type::Bool, Type::Int)
                | (Type::Int, Type::Bool)
        )
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::Colour => write!(f, "colour"),
            Type::Array(elem, size) => write!(f, "{}[{}]", elem, size),
            Type::Function(params, ret) => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
        }
    }
}
