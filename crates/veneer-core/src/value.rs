use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

/// Nesting path into the state tree. Short in practice.
pub type Path = SmallVec<[String; 4]>;

pub type Map = BTreeMap<String, Value>;

/// One node of the application state tree.
///
/// The tree is logically immutable: `clone` is a reference bump for the
/// container variants, and every update goes through [`Value::set_path`],
/// which recreates only the spine from the root to the written slot.
/// Untouched sibling subtrees keep their `Rc` identity, which is what makes
/// the render fast path (`same`) and the structural-sharing tests work.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Num(f64),
    Str(Rc<str>),
    Map(Rc<Map>),
}

impl Value {
    pub fn map<K: Into<String>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Value::Map(Rc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    pub fn empty_map() -> Self {
        Value::Map(Rc::new(Map::new()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_map(&self) -> Option<&Rc<Map>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Map member lookup; `Null` for anything that is not a map or has no
    /// such key.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Map(m) => m.get(key).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// Identity comparison in the sense the action boundary needs it:
    /// containers compare by reference, scalars by value.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Value at `path`, walking maps; `Null` past a leaf or a missing key.
    pub fn get_path(&self, path: &[String]) -> Value {
        let mut current = self.clone();
        for key in path {
            current = current.get(key);
        }
        current
    }

    /// New tree with `value` written at `path`. Only the maps along the path
    /// are recreated; sibling entries are carried over by reference.
    pub fn set_path(&self, path: &[String], value: Value) -> Value {
        match path.split_first() {
            None => value,
            Some((head, rest)) => {
                let mut map = match self {
                    Value::Map(m) => (**m).clone(),
                    _ => Map::new(),
                };
                let child = map.get(head).cloned().unwrap_or(Value::Null);
                map.insert(head.clone(), child.set_path(rest, value));
                Value::Map(Rc::new(map))
            }
        }
    }

    /// Shallow merge of a partial update onto this value. Map onto map merges
    /// keys with the update winning; any other combination replaces the value
    /// wholesale.
    pub fn merge(&self, update: &Value) -> Value {
        match (self, update) {
            (Value::Map(base), Value::Map(patch)) => {
                let mut merged = (**base).clone();
                for (k, v) in patch.iter() {
                    merged.insert(k.clone(), v.clone());
                }
                Value::Map(Rc::new(merged))
            }
            _ => update.clone(),
        }
    }
}

impl PartialEq for Value {
    /// Deep structural equality (unlike [`Value::same`], which is identity).
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Num(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Num(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Num(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v.into())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Num(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
