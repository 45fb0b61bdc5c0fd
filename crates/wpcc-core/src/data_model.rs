//! Data Model: ValueType, ClassifiedValue
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Aggregation hint reported for every described value
pub const DEFAULT_AGGREGATION: &str = "NONE";

/// Semantic type the connector assigns to a leaf value.
///
/// `Unknown` is written as an empty string: the connector treats it as
/// "no type hint".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Duration,
    Url,
    Image,
    Number,
    Text,
    Boolean,
    Unknown,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duration => "DURATION",
            Self::Url => "URL",
            Self::Image => "IMAGE",
            Self::Number => "NUMBER",
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
            Self::Unknown => "",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "DURATION" => Self::Duration,
            "URL" => Self::Url,
            "IMAGE" => Self::Image,
            "NUMBER" => Self::Number,
            "TEXT" => Self::Text,
            "BOOLEAN" => Self::Boolean,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ValueType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// Descriptor produced for a leaf value in describe mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedValue {
    /// Display name derived from the key
    pub name: String,
    /// Same as `name` unless overridden
    pub description: String,
    /// Spreadsheet formula hint, empty when none applies
    pub formula: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub aggregation: String,
    /// The original leaf value, untouched
    pub value: Value,
}

impl ClassifiedValue {
    pub fn new(name: String, description: String, value: Value) -> Self {
        Self {
            name,
            description,
            formula: String::new(),
            value_type: ValueType::Unknown,
            aggregation: DEFAULT_AGGREGATION.to_string(),
            value,
        }
    }

    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn with_formula(mut self, formula: String) -> Self {
        self.formula = formula;
        self
    }

    /// Render as a JSON object in connector field order
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
