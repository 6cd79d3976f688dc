//! XML property list support.
//!
//! UFO metadata files (metainfo.plist, fontinfo.plist, lib.plist,
//! layercontents.plist, glyphs/contents.plist) and glif `<lib>` elements are
//! XML plists. Only the value kinds those files actually use are supported:
//! strings, integers, reals, booleans, arrays, and dicts.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A parsed plist value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Array(Vec<Value>),
    Dict(Dict),
}

/// A plist dict, preserving key order.
pub type Dict = IndexMap<String, Value>;

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value; integers coerce to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(r) => Some(*r),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn into_dict(self) -> Option<Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(r)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(a)
    }
}

impl From<Dict> for Value {
    fn from(d: Dict) -> Self {
        Value::Dict(d)
    }
}

/// One plist XML element. Dicts are flat `<key>`/value sequences, so both
/// dict and array bodies deserialize as a `$value` list of these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Elem {
    Key(String),
    String(String),
    Integer(i64),
    Real(f64),
    #[serde(rename = "true")]
    True,
    #[serde(rename = "false")]
    False,
    Array(ElemList),
    Dict(ElemList),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub(crate) struct ElemList {
    #[serde(rename = "$value", default)]
    pub(crate) items: Vec<Elem>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "plist")]
struct Document {
    #[serde(rename = "@version")]
    version: String,
    #[serde(rename = "$value")]
    root: Elem,
}

fn value_from_elem(elem: Elem) -> Result<Value, String> {
    Ok(match elem {
        Elem::Key(k) => return Err(format!("stray <key>{k}</key> outside a dict")),
        Elem::String(s) => Value::String(s),
        Elem::Integer(i) => Value::Integer(i),
        Elem::Real(r) => Value::Real(r),
        Elem::True => Value::Boolean(true),
        Elem::False => Value::Boolean(false),
        Elem::Array(list) => Value::Array(
            list.items.into_iter().map(value_from_elem).collect::<Result<_, _>>()?,
        ),
        Elem::Dict(list) => Value::Dict(dict_from_elems(list)?),
    })
}

pub(crate) fn dict_from_elems(list: ElemList) -> Result<Dict, String> {
    let mut dict = Dict::new();
    let mut items = list.items.into_iter();
    while let Some(item) = items.next() {
        let Elem::Key(key) = item else {
            return Err("expected <key> in dict".to_string());
        };
        let Some(value) = items.next() else {
            return Err(format!("dict key '{key}' has no value"));
        };
        dict.insert(key, value_from_elem(value)?);
    }
    Ok(dict)
}

fn elem_from_value(value: &Value) -> Elem {
    match value {
        Value::String(s) => Elem::String(s.clone()),
        Value::Integer(i) => Elem::Integer(*i),
        Value::Real(r) => Elem::Real(*r),
        Value::Boolean(true) => Elem::True,
        Value::Boolean(false) => Elem::False,
        Value::Array(a) => Elem::Array(ElemList { items: a.iter().map(elem_from_value).collect() }),
        Value::Dict(d) => Elem::Dict(dict_to_elems(d)),
    }
}

pub(crate) fn dict_to_elems(dict: &Dict) -> ElemList {
    let mut items = Vec::with_capacity(dict.len() * 2);
    for (key, value) in dict {
        items.push(Elem::Key(key.clone()));
        items.push(elem_from_value(value));
    }
    ElemList { items }
}

/// Parse a complete plist document.
pub fn parse(xml: &str) -> Result<Value, String> {
    let doc: Document = quick_xml::de::from_str(xml).map_err(|e| e.to_string())?;
    value_from_elem(doc.root)
}

/// Serialize a value as a complete plist document.
pub fn to_xml(value: &Value) -> Result<String, String> {
    let doc = Document { version: "1.0".to_string(), root: elem_from_value(value) };
    let body = quick_xml::se::to_string(&doc).map_err(|e| e.to_string())?;
    Ok(format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n{body}\n"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dict() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
  <key>familyName</key>
  <string>Lectura</string>
  <key>unitsPerEm</key>
  <integer>1000</integer>
  <key>italicAngle</key>
  <real>-4.5</real>
  <key>openTypeOS2Selection</key>
  <array>
    <integer>7</integer>
  </array>
</dict>
</plist>"#;
        let value = parse(xml).unwrap();
        let dict = value.as_dict().unwrap();
        assert_eq!(dict["familyName"].as_str(), Some("Lectura"));
        assert_eq!(dict["unitsPerEm"].as_i64(), Some(1000));
        assert_eq!(dict["italicAngle"].as_f64(), Some(-4.5));
        assert_eq!(dict["openTypeOS2Selection"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn key_order_preserved() {
        let xml = r#"<plist version="1.0"><dict>
  <key>b</key><string>1</string>
  <key>a</key><string>2</string>
  <key>c</key><string>3</string>
</dict></plist>"#;
        let dict = parse(xml).unwrap().into_dict().unwrap();
        let keys: Vec<&str> = dict.keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn roundtrip() {
        let mut dict = Dict::new();
        dict.insert("name".to_string(), "test".into());
        dict.insert("count".to_string(), 3i64.into());
        dict.insert("scale".to_string(), 0.25.into());
        dict.insert("enabled".to_string(), true.into());
        dict.insert(
            "mark".to_string(),
            Value::Array(vec![0.0.into(), 0.0.into(), 0.0.into(), 0.5.into()]),
        );
        let mut nested = Dict::new();
        nested.insert("inner".to_string(), false.into());
        dict.insert("sub".to_string(), nested.into());

        let value = Value::Dict(dict);
        let xml = to_xml(&value).unwrap();
        let parsed = parse(&xml).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn stray_key_rejected() {
        let xml = r#"<plist version="1.0"><dict><key>orphan</key></dict></plist>"#;
        assert!(parse(xml).is_err());
    }
}
