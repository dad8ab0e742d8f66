//! Polymorphic JSON value representation
//!
//! A [`Value`] is one of the JSON kinds (null, boolean, number, string,
//! array, object) plus three machine-level extras: `Undefined`, a distinct
//! integer kind, and an opaque host pointer. Integers are kept separate from
//! doubles so that whole numbers survive JSON round-trips, but the two kinds
//! obey the same numeric laws: normalization promotes any integer in the safe
//! range to a double, and equality/ordering are defined on normalized forms.
//!
//! All coercions are total. There is no conversion that can fail; unconvertible
//! inputs collapse to `false`, `0`, `NaN` or `"null"` as the kind demands.

use std::fmt;
use std::ptr::NonNull;

use rustc_hash::FxHashMap;

/// Largest integer magnitude exactly representable as an IEEE 754 double.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Opaque host pointer payload of [`Value::Ptr`].
///
/// Host pointers never originate from JSON; they exist so extension
/// instructions can thread native data through the operand stack. A null
/// pointer is not representable — constructing a pointer value from null
/// yields [`Value::Null`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostPtr(NonNull<()>);

impl HostPtr {
    /// Wrap a raw pointer, returning `None` for null.
    pub fn new(ptr: *mut ()) -> Option<Self> {
        NonNull::new(ptr).map(HostPtr)
    }

    /// The wrapped address.
    pub fn as_ptr(self) -> *mut () {
        self.0.as_ptr()
    }
}

/// The type of a JSON value, as reported by [`Value::value_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// No value at all
    Undefined,
    /// JSON null
    Null,
    /// true or false
    Boolean,
    /// Integer or double
    Number,
    /// UTF-8 string
    String,
    /// Ordered sequence of values
    Array,
    /// String-keyed mapping
    Object,
    /// Opaque host pointer
    Pointer,
}

/// A JSON value as manipulated by the machine.
///
/// `PartialEq` on this type is strict representation equality: it is
/// kind-sensitive, so `Int(1) != Num(1.0)`. The machine's own comparison
/// instructions go through [`Value::equal`] and [`Value::less`], which apply
/// the JSON equivalence laws instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// No value at all; collapses to `Null` under normalization
    Undefined,
    /// JSON null
    #[default]
    Null,
    /// true or false
    Bool(bool),
    /// A whole number, 64-bit signed
    Int(i64),
    /// A double-precision number
    Num(f64),
    /// A UTF-8 string
    Str(String),
    /// An ordered sequence of values
    Arr(Vec<Value>),
    /// A string-keyed mapping; iteration order is not significant
    Obj(FxHashMap<String, Value>),
    /// An opaque host pointer; marshals as JSON null
    Ptr(HostPtr),
}

impl Value {
    /// Build a pointer value, collapsing null to [`Value::Null`].
    pub fn pointer(ptr: *mut ()) -> Value {
        match HostPtr::new(ptr) {
            Some(p) => Value::Ptr(p),
            None => Value::Null,
        }
    }

    /// The type of this value. Integers report `Number`.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Undefined => ValueType::Undefined,
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Boolean,
            Value::Int(_) | Value::Num(_) => ValueType::Number,
            Value::Str(_) => ValueType::String,
            Value::Arr(_) => ValueType::Array,
            Value::Obj(_) => ValueType::Object,
            Value::Ptr(_) => ValueType::Pointer,
        }
    }

    /// Coerce to a boolean.
    ///
    /// Null, undefined, `false`, zero, NaN and the empty string are false;
    /// everything else, including empty arrays and objects, is true.
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Num(f) => *f != 0.0 && !f.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Arr(_) | Value::Obj(_) | Value::Ptr(_) => true,
        }
    }

    /// Coerce to a double.
    ///
    /// Strings parse in full as a float and yield NaN on failure; arrays,
    /// objects and pointers are NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined | Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Int(i) => *i as f64,
            Value::Num(f) => *f,
            Value::Str(s) => str_to_number(s),
            Value::Arr(_) | Value::Obj(_) | Value::Ptr(_) => f64::NAN,
        }
    }

    /// Coerce to a 64-bit integer.
    ///
    /// NaN maps to 0; ±∞ and out-of-range magnitudes saturate at
    /// `i64::MIN`/`i64::MAX`; finite doubles truncate toward zero.
    pub fn to_integer(&self) -> i64 {
        match self {
            Value::Undefined | Value::Null => 0,
            Value::Bool(b) => {
                if *b {
                    1
                } else {
                    0
                }
            }
            Value::Int(i) => *i,
            Value::Num(f) => float_to_int(*f),
            Value::Str(s) => float_to_int(str_to_number(s)),
            Value::Arr(_) | Value::Obj(_) | Value::Ptr(_) => 0,
        }
    }

    /// Coerce to a host pointer. Everything but `Ptr` is `None`.
    pub fn to_pointer(&self) -> Option<HostPtr> {
        match self {
            Value::Ptr(p) => Some(*p),
            _ => None,
        }
    }

    /// Whether this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Extract the boolean, without coercion.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract the integer, without coercion.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract the double, without coercion.
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(f) => Some(*f),
            _ => None,
        }
    }

    /// Borrow the string, without coercion.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the array elements.
    pub fn as_arr(&self) -> Option<&[Value]> {
        match self {
            Value::Arr(a) => Some(a),
            _ => None,
        }
    }

    /// Borrow the object entries.
    pub fn as_obj(&self) -> Option<&FxHashMap<String, Value>> {
        match self {
            Value::Obj(o) => Some(o),
            _ => None,
        }
    }

    /// The normalized form used by equality, ordering and JSON output.
    ///
    /// Integers within the safe range promote to doubles, `Undefined`
    /// collapses to `Null`, and composites normalize element-wise.
    /// Normalization is idempotent.
    pub fn normalize(&self) -> Value {
        match self {
            Value::Undefined => Value::Null,
            Value::Int(i) if in_safe_range(*i) => Value::Num(*i as f64),
            Value::Arr(a) => Value::Arr(a.iter().map(Value::normalize).collect()),
            Value::Obj(o) => Value::Obj(
                o.iter()
                    .map(|(k, v)| (k.clone(), v.normalize()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Deep structural equality on normalized forms.
    ///
    /// `NaN != NaN`. Null and undefined are mutually equal. An integer and a
    /// double are equal only when the integer is in the safe range and its
    /// promotion matches the double exactly.
    pub fn equal(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Undefined | Null, Undefined | Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Num(a), Num(b)) => a == b,
            (Int(i), Num(f)) | (Num(f), Int(i)) => in_safe_range(*i) && *i as f64 == *f,
            (Str(a), Str(b)) => a == b,
            (Arr(a), Arr(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equal(y))
            }
            (Obj(a), Obj(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| v.equal(w)))
            }
            (Ptr(a), Ptr(b)) => a == b,
            _ => false,
        }
    }

    /// Total-order test on comparable kinds.
    ///
    /// Defined only when both operands are booleans, numbers or strings of
    /// the same comparable kind; every other pairing, and any comparison
    /// involving NaN, is false. `false < true`; strings compare by byte
    /// order; two integers compare at full 64-bit precision while a mixed
    /// integer/double pair compares as doubles.
    pub fn less(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Bool(a), Bool(b)) => !*a && *b,
            (Int(a), Int(b)) => a < b,
            (Num(a), Num(b)) => a < b,
            (Int(i), Num(f)) => (*i as f64) < *f,
            (Num(f), Int(i)) => *f < (*i as f64),
            (Str(a), Str(b)) => a.as_bytes() < b.as_bytes(),
            _ => false,
        }
    }
}

fn in_safe_range(i: i64) -> bool {
    (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&i)
}

/// Full-string float parse; NaN on failure, so `""` is NaN.
fn str_to_number(s: &str) -> f64 {
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// Truncate toward zero; NaN maps to 0, ±∞ saturate at the i64 bounds.
fn float_to_int(f: f64) -> i64 {
    f as i64
}

fn float_to_string(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f < 0.0 {
            "-Infinity".to_string()
        } else {
            "Infinity".to_string()
        }
    } else {
        format!("{}", f)
    }
}

/// The ToString coercion.
///
/// Arrays render as the comma-join of their elements, objects as their JSON
/// serialization, pointers and nulls as `"null"`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined | Value::Null | Value::Ptr(_) => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Num(n) => f.write_str(&float_to_string(*n)),
            Value::Str(s) => f.write_str(s),
            Value::Arr(a) => {
                for (i, v) in a.iter().enumerate() {
                    if i != 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", v)?;
                }
                Ok(())
            }
            Value::Obj(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Num(f)
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

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Arr(a)
    }
}

impl From<FxHashMap<String, Value>> for Value {
    fn from(o: FxHashMap<String, Value>) -> Self {
        Value::Obj(o)
    }
}
