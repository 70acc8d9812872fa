use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Declared interpretation of a parameter value.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Dtype {
    Bool,
    Float,
    Int,
    #[default]
    Str,
    FloatList,
}

/// Presentation hint consumed by an external UI layer.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Wtype {
    CheckBox,
    #[default]
    TextBox,
    PickFile,
    PickDirectory,
    ComboBox,
    RadioButton,
    Group,
}

/// A parameter default or runtime value. `Empty` is the distinct
/// no-value state used by group markers and by numeric text boxes whose
/// default means "derive automatically".
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamValue {
    #[default]
    Empty,
    Bool(bool),
    Float(f64),
    Int(i64),
    Str(String),
    FloatList(Vec<f64>),
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParamValue::Empty, ParamValue::Empty) => true,
            (ParamValue::Bool(left), ParamValue::Bool(right)) => left == right,
            (ParamValue::Float(left), ParamValue::Float(right)) => {
                left.to_bits() == right.to_bits()
            }
            (ParamValue::Int(left), ParamValue::Int(right)) => left == right,
            (ParamValue::Str(left), ParamValue::Str(right)) => left == right,
            (ParamValue::FloatList(left), ParamValue::FloatList(right)) => {
                left.len() == right.len()
                    && left
                        .iter()
                        .zip(right.iter())
                        .all(|(a, b)| a.to_bits() == b.to_bits())
            }
            _ => false,
        }
    }
}

impl Eq for ParamValue {}

impl ParamValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, ParamValue::Empty)
    }

    pub fn as_bool(&self) -> bool {
        match self {
            ParamValue::Bool(value) => *value,
            _ => {
                panic!("Value is not a bool")
            }
        }
    }
    pub fn as_float(&self) -> f64 {
        match self {
            ParamValue::Float(value) => *value,
            _ => {
                panic!("Value is not a float")
            }
        }
    }
    pub fn as_int(&self) -> i64 {
        match self {
            ParamValue::Int(value) => *value,
            _ => {
                panic!("Value is not an int")
            }
        }
    }
    pub fn as_str(&self) -> &str {
        match self {
            ParamValue::Str(value) => value,
            _ => {
                panic!("Value is not a string")
            }
        }
    }
    pub fn as_float_list(&self) -> &[f64] {
        match self {
            ParamValue::FloatList(value) => value,
            _ => {
                panic!("Value is not a float list")
            }
        }
    }

    /// The dtype tag matching this value's variant. `Empty` reports the
    /// machinery default `str`.
    pub fn dtype(&self) -> Dtype {
        match self {
            ParamValue::Empty => Dtype::Str,
            ParamValue::Bool(_) => Dtype::Bool,
            ParamValue::Float(_) => Dtype::Float,
            ParamValue::Int(_) => Dtype::Int,
            ParamValue::Str(_) => Dtype::Str,
            ParamValue::FloatList(_) => Dtype::FloatList,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Float(value as f64)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(value: Vec<f64>) -> Self {
        ParamValue::FloatList(value)
    }
}

impl From<&[f64]> for ParamValue {
    fn from(value: &[f64]) -> Self {
        ParamValue::FloatList(value.to_vec())
    }
}
