//! Bound call arguments.

use std::any::Any;
use std::fmt;

use crate::dispatch::Fault;

/// One bound argument value.
pub enum Argument {
    /// Absent optional value.
    Null,
    String(String),
    Integer(i64),
    Float(f64),
    List(Vec<String>),
    /// A freshly constructed body value of the registered schema type.
    Object(Box<dyn Any + Send>),
}

impl Argument {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::List(_) => "array",
            Self::Object(_) => "object",
        }
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::Integer(i) => f.debug_tuple("Integer").field(i).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::List(l) => f.debug_tuple("List").field(l).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// Positional arguments, aligned with the operation's declared parameters.
#[derive(Debug, Default)]
pub struct Arguments {
    values: Vec<Argument>,
}

impl Arguments {
    pub fn new(values: Vec<Argument>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.values.get(index)
    }

    /// String value at `index`, `None` when absent or of another kind.
    pub fn str(&self, index: usize) -> Option<&str> {
        match self.values.get(index) {
            Some(Argument::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn integer(&self, index: usize) -> Option<i64> {
        match self.values.get(index) {
            Some(Argument::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Float value at `index`; integers are widened.
    pub fn float(&self, index: usize) -> Option<f64> {
        match self.values.get(index) {
            Some(Argument::Float(v)) => Some(*v),
            Some(Argument::Integer(i)) => Some(*i as f64),
            _ => None,
        }
    }

    /// List value at `index`; anything else reads as empty.
    pub fn list(&self, index: usize) -> &[String] {
        match self.values.get(index) {
            Some(Argument::List(l)) => l,
            _ => &[],
        }
    }

    /// Integer at `index` or an `InvalidArgument` fault naming the position.
    pub fn require_integer(&self, index: usize) -> Result<i64, Fault> {
        self.integer(index).ok_or_else(|| self.mismatch(index, "integer"))
    }

    /// String at `index` or an `InvalidArgument` fault naming the position.
    pub fn require_str(&self, index: usize) -> Result<&str, Fault> {
        self.str(index).ok_or_else(|| self.mismatch(index, "string"))
    }

    /// Move the body object at `index` out as `T`.
    ///
    /// The slot is left as `Null`; a type mismatch leaves it untouched.
    pub fn take_object<T: Any + Send>(&mut self, index: usize) -> Result<T, Fault> {
        let Some(slot) = self.values.get_mut(index) else {
            return Err(self.mismatch(index, std::any::type_name::<T>()));
        };

        match std::mem::replace(slot, Argument::Null) {
            Argument::Object(obj) => match obj.downcast::<T>() {
                Ok(value) => Ok(*value),
                Err(obj) => {
                    *slot = Argument::Object(obj);
                    Err(self.mismatch(index, std::any::type_name::<T>()))
                }
            },
            other => {
                *slot = other;
                Err(self.mismatch(index, std::any::type_name::<T>()))
            }
        }
    }

    pub fn into_vec(self) -> Vec<Argument> {
        self.values
    }

    fn mismatch(&self, index: usize, expected: &str) -> Fault {
        let found = self.values.get(index).map(Argument::kind).unwrap_or("missing");
        Fault::InvalidArgument {
            name: format!("#{index}"),
            value: found.to_string(),
            expected: expected.to_string(),
        }
    }
}

impl From<Vec<Argument>> for Arguments {
    fn from(values: Vec<Argument>) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pet {
        name: String,
    }

    #[test]
    fn test_typed_accessors() {
        let args = Arguments::new(vec![
            Argument::Integer(7),
            Argument::String("x".into()),
            Argument::List(vec!["a".into()]),
            Argument::Null,
        ]);

        assert_eq!(args.integer(0), Some(7));
        assert_eq!(args.float(0), Some(7.0));
        assert_eq!(args.str(1), Some("x"));
        assert_eq!(args.list(2), &["a".to_string()]);
        assert!(args.list(3).is_empty());
        assert!(args.get(3).unwrap().is_null());
        assert!(args.require_integer(1).is_err());
    }

    #[test]
    fn test_take_object() {
        let mut args = Arguments::new(vec![Argument::Object(Box::new(Pet { name: "rex".into() }))]);

        assert!(args.take_object::<String>(0).is_err());
        let pet: Pet = args.take_object(0).unwrap();
        assert_eq!(pet.name, "rex");
        assert!(args.get(0).unwrap().is_null());
    }
}
