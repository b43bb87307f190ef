//! Value comparison used to decide whether a write is a real change.
//!
//! Composite values are usually rebuilt by value (`Settings { name, ..old }`)
//! rather than mutated in place, so "did it change" has to be answered
//! structurally. `Equality::Structural` defers to `PartialEq`; a derived
//! `PartialEq` walks every field, and `Rc`/`Arc` compare their pointees.
//!
//! Known limitation: values that form `Rc` cycles can make a structural
//! comparison recurse forever. Nothing here detects cycles.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

pub enum Equality<T> {
    /// Deep comparison through `PartialEq`.
    Structural,
    /// Every write counts as a change.
    Never,
    /// Caller-defined comparison, e.g. one that ignores a timestamp field.
    Custom(Rc<dyn Fn(&T, &T) -> bool>),
}

impl<T> Equality<T> {
    pub fn custom(f: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Equality::Custom(Rc::new(f))
    }
}

impl<T: PartialEq> Equality<T> {
    pub fn same(&self, a: &T, b: &T) -> bool {
        match self {
            Equality::Structural => a == b,
            Equality::Never => false,
            Equality::Custom(f) => f(a, b),
        }
    }

    /// `None` ("not loaded yet") only equals `None`.
    pub fn same_opt(&self, a: Option<&T>, b: Option<&T>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.same(a, b),
            _ => false,
        }
    }
}

impl<T> Default for Equality<T> {
    fn default() -> Self {
        Equality::Structural
    }
}

impl<T> Clone for Equality<T> {
    fn clone(&self) -> Self {
        match self {
            Equality::Structural => Equality::Structural,
            Equality::Never => Equality::Never,
            Equality::Custom(f) => Equality::Custom(f.clone()),
        }
    }
}

impl<T> fmt::Debug for Equality<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Equality::Structural => f.write_str("Structural"),
            Equality::Never => f.write_str("Never"),
            Equality::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Deep comparison of JSON documents where `1` and `1.0` are the same number.
///
/// Object key order never matters; array order does.
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x == y {
                return true;
            }
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}
