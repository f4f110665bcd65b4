//! Runtime values.
//!
//! Simple types hold their data directly; composite types hold a handle into
//! the [`DomainWorld`](crate::world::DomainWorld) or the list heap, so that
//! assignment and argument passing copy the handle, never the target.

use std::fmt;

use crate::world::{FileId, FolderId};

/// Handle into the list heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListId(pub usize);

/// A runtime value, tagged with its type.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Folder(FolderId),
    File(FileId),
    Audio(FileId),
    List(ListId),
    /// The absent composite value.
    Null,
    /// Result of a void call; never stored in a variable.
    Void,
}

impl Value {
    /// Human-readable type tag for internal errors and traces.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Folder(_) => "Folder",
            Value::File(_) => "File",
            Value::Audio(_) => "Audio",
            Value::List(_) => "List",
            Value::Null => "null",
            Value::Void => "void",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::Null => write!(f, "null"),
            other => write!(f, "<{}>", other.type_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Int(1).type_name(), "int");
        assert_eq!(Value::List(ListId(0)).type_name(), "List");
        assert_eq!(Value::Null.type_name(), "null");
    }

    #[test]
    fn test_handles_are_copied_not_deep() {
        let a = Value::File(FileId(3));
        let b = a.clone();
        assert_eq!(a, b);
    }
}
