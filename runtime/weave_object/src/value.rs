//! Runtime values passed to and returned from methods.

use std::fmt;

use crate::module::ModuleId;
use crate::object::{ClassId, ObjectId, Receiver};

/// A dynamically typed value.
///
/// Objects, classes, and modules are referenced by arena id, so values are
/// cheap to clone and never keep graph nodes alive on their own.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Void,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Value>),
    Object(ObjectId),
    Class(ClassId),
    Module(ModuleId),
}

impl Value {
    /// Build a string value.
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Name of the value's kind, used in type-mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Class(_) => "class",
            Value::Module(_) => "module",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// The receiver this value denotes, if it can be sent messages.
    pub fn as_receiver(&self) -> Option<Receiver> {
        match self {
            Value::Object(id) => Some(Receiver::Object(*id)),
            Value::Class(id) => Some(Receiver::Class(*id)),
            Value::Module(id) => Some(Receiver::Module(*id)),
            _ => None,
        }
    }
}

impl From<Receiver> for Value {
    fn from(receiver: Receiver) -> Self {
        match receiver {
            Receiver::Object(id) => Value::Object(id),
            Receiver::Class(id) => Value::Class(id),
            Receiver::Module(id) => Value::Module(id),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(id) => write!(f, "<object {}>", id.index()),
            Value::Class(id) => write!(f, "<class {}>", id.index()),
            Value::Module(id) => write!(f, "<module {}>", id.index()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_accessors_match_variant() {
        assert_eq!(Value::str("hi").as_str(), Some("hi"));
        assert_eq!(Value::Int(4).as_int(), Some(4));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(4).as_str(), None);
        assert_eq!(Value::Void.as_list(), None);
    }

    #[test]
    fn test_display_list() {
        let list = Value::List(vec![Value::Int(1), Value::str("a"), Value::Bool(false)]);
        assert_eq!(list.to_string(), "[1, a, false]");
    }

    #[test]
    fn test_receiver_round_trip() {
        let receiver = Receiver::Object(ObjectId::from_raw(3));
        let value = Value::from(receiver);
        assert_eq!(value.as_receiver(), Some(receiver));
        assert_eq!(Value::Int(3).as_receiver(), None);
    }
}
