//! Dynamically typed values and reference cells.
//!
//! Property defaults, attribute writes, injected bindings and template
//! interpolations all carry a [`Value`]. A [`ValueRef`] is the reference cell
//! of the component model: a reactive container around a single `Value`,
//! either writable or derived from other reactive reads.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use sprig_core::{Memo, Signal};

use crate::error::ComponentError;

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    /// No value at all (an unresolved injection, an unset member).
    #[default]
    Absent,
    /// An explicit empty value (a removed attribute).
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A reference cell; unwrapped before it reaches a template.
    Ref(ValueRef),
    /// Any other value, compared by identity.
    Any(Rc<dyn Any>),
}

impl Value {
    /// Wrap an arbitrary Rust value.
    pub fn any<T: Any>(value: T) -> Self {
        Value::Any(Rc::new(value))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_ref_cell(&self) -> Option<&ValueRef> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Downcast an [`Value::Any`] payload.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Any(any) => any.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// The value itself, or the current contents if it is a reference cell.
    ///
    /// Reading through a reference cell is tracked.
    pub fn unwrap_ref(&self) -> Value {
        match self {
            Value::Ref(r) => r.get(),
            other => other.clone(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Absent, Value::Absent) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => a.ptr_eq(b),
            (Value::Any(a), Value::Any(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => f.write_str("Absent"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(n) => write!(f, "Float({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Ref(r) => fmt::Debug::fmt(r, f),
            Value::Any(_) => f.write_str("Any(..)"),
        }
    }
}

/// Renders the value the way a template shows it.
///
/// Absent and null values render as nothing; reference cells render their
/// current contents without subscribing.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent | Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::Ref(r) => fmt::Display::fmt(&r.get_untracked(), f),
            Value::Any(_) => f.write_str("[object]"),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Int(n as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32, usize);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(n as f64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl From<ValueRef> for Value {
    fn from(r: ValueRef) -> Self {
        Value::Ref(r)
    }
}

impl From<&ValueRef> for Value {
    fn from(r: &ValueRef) -> Self {
        Value::Ref(r.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

// ============================================================================
// Reference cells
// ============================================================================

/// A reactive reference cell holding a [`Value`].
///
/// Reads are tracked by the reactive runtime; writes notify subscribers.
/// Derived cells recompute lazily and cannot be written.
#[derive(Clone)]
pub enum ValueRef {
    Cell(Signal<Value>),
    Derived(Memo<Value>),
}

impl ValueRef {
    /// Current contents (tracked).
    pub fn get(&self) -> Value {
        match self {
            ValueRef::Cell(signal) => signal.get(),
            ValueRef::Derived(memo) => memo.get(),
        }
    }

    /// Current contents without subscribing the running observer.
    pub fn get_untracked(&self) -> Value {
        sprig_core::untracked(|| self.get())
    }

    /// Replace the contents of a writable cell.
    pub fn set(&self, value: impl Into<Value>) -> Result<(), ComponentError> {
        match self {
            ValueRef::Cell(signal) => {
                signal.set(value.into());
                Ok(())
            }
            ValueRef::Derived(_) => Err(ComponentError::DerivedRefWrite),
        }
    }

    pub fn is_writable(&self) -> bool {
        matches!(self, ValueRef::Cell(_))
    }

    pub fn ptr_eq(&self, other: &ValueRef) -> bool {
        match (self, other) {
            (ValueRef::Cell(a), ValueRef::Cell(b)) => a.ptr_eq(b),
            (ValueRef::Derived(a), ValueRef::Derived(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for ValueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            ValueRef::Cell(_) => "Ref",
            ValueRef::Derived(_) => "Computed",
        };
        f.debug_tuple(kind).field(&self.get_untracked()).finish()
    }
}

/// Create a writable reference cell.
pub fn ref_cell(value: impl Into<Value>) -> ValueRef {
    ValueRef::Cell(Signal::new(value.into()))
}

/// Create a derived reference cell from a computation.
pub fn computed<F, V>(f: F) -> ValueRef
where
    F: Fn() -> V + 'static,
    V: Into<Value>,
{
    ValueRef::Derived(Memo::new(move || f().into()))
}

/// Whether a value is a reference cell.
pub fn is_ref(value: &Value) -> bool {
    matches!(value, Value::Ref(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(Value::from(3), Value::Int(3));
        assert_eq!(Value::from("x"), Value::Str("x".into()));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(1.5).as_float(), Some(1.5));
    }

    #[test]
    fn refs_compare_by_identity() {
        let a = ref_cell(1);
        let b = ref_cell(1);
        assert_eq!(Value::from(&a), Value::from(&a));
        assert_ne!(Value::from(&a), Value::from(&b));
        assert!(is_ref(&Value::from(a)));
        assert!(!is_ref(&Value::Int(1)));
    }

    #[test]
    fn computed_follows_source_and_rejects_writes() {
        let source = ref_cell(2);
        let source_c = source.clone();
        let doubled = computed(move || source_c.get().as_int().unwrap_or(0) * 2);

        assert_eq!(doubled.get(), Value::Int(4));
        source.set(5).unwrap();
        assert_eq!(doubled.get(), Value::Int(10));

        assert!(matches!(doubled.set(1), Err(ComponentError::DerivedRefWrite)));
    }

    #[test]
    fn display_renders_template_text() {
        assert_eq!(Value::Absent.to_string(), "");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::from(ref_cell("hi")).to_string(), "hi");
        assert_eq!(Value::from(false).to_string(), "false");
    }
}
