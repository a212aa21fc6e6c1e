use crate::director::lingo::datum::Datum;

/// A literal value with no container/reader state attached, suitable for
/// holding a cast member or script property's default value in a plain
/// map (§4.5 "property_defaults").
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StaticDatum {
    Int(i32),
    Float(f32),
    String(String),
    Symbol(String),
    List(Vec<StaticDatum>),
    Void,
}

impl From<Datum> for StaticDatum {
    fn from(d: Datum) -> Self {
        match d {
            Datum::Int(i) => StaticDatum::Int(i),
            Datum::Float(f) => StaticDatum::Float(f),
            Datum::String(s) => StaticDatum::String(s),
            Datum::Symbol(s) => StaticDatum::Symbol(s),
            Datum::List(items) => {
                StaticDatum::List(items.into_iter().map(StaticDatum::from).collect())
            }
            Datum::Void => StaticDatum::Void,
        }
    }
}

impl StaticDatum {
    pub fn as_string(&self) -> Option<String> {
        match self {
            StaticDatum::String(s) => Some(s.clone()),
            StaticDatum::Symbol(s) => Some(s.clone()),
            StaticDatum::Int(i) => Some(i.to_string()),
            StaticDatum::Float(f) => Some(f.to_string()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            StaticDatum::Int(i) => Some(*i),
            StaticDatum::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            StaticDatum::Float(f) => Some(*f),
            StaticDatum::Int(i) => Some(*i as f32),
            StaticDatum::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            StaticDatum::Int(i) => Some(*i != 0),
            _ => None,
        }
    }
}
