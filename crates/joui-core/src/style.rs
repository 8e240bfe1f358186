#![forbid(unsafe_code)]

//! Style specifications accepted by [`Surface::set_style`](crate::Surface::set_style).
//!
//! A style is either a bare class name or an ordered property map. In a
//! property map the keys `id` and `className` address the node itself; every
//! other key is an inline style property.
//!
//! Style specs frequently arrive as loosely-typed configuration, so
//! [`StyleSpec::from_json`] accepts a [`serde_json::Value`] and rejects
//! anything that is not a string or a flat object.

use serde_json::Value;

use crate::error::SurfaceError;

/// Property key that sets the node's element id.
pub const ID_KEY: &str = "id";

/// Property key that replaces the node's class list.
pub const CLASS_NAME_KEY: &str = "className";

/// A single `name: value` style entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StyleProperty {
    /// Property name, e.g. `"background"`.
    pub name: String,
    /// Property value, already stringified.
    pub value: String,
}

impl StyleProperty {
    /// Create a property entry.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// How a node should be styled.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StyleSpec {
    /// Replace the node's class list with this (space separated) class name.
    ClassName(String),
    /// Apply each property in order.
    Properties(Vec<StyleProperty>),
}

impl StyleSpec {
    /// Style spec that only sets a class name.
    pub fn class(name: impl Into<String>) -> Self {
        Self::ClassName(name.into())
    }

    /// Empty property map.
    #[must_use]
    pub fn properties() -> Self {
        Self::Properties(Vec::new())
    }

    /// Append a property, turning a class-name spec into a property map that
    /// keeps the class name.
    #[must_use]
    pub fn with(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut props = match self {
            Self::ClassName(class) => vec![StyleProperty::new(CLASS_NAME_KEY, class)],
            Self::Properties(props) => props,
        };
        props.push(StyleProperty::new(name, value));
        Self::Properties(props)
    }

    /// Parse a loosely-typed style value.
    ///
    /// - string: class name
    /// - object: property map; values must be strings, numbers or bools
    /// - null: empty property map
    ///
    /// # Errors
    ///
    /// [`SurfaceError::UnrecognizedStyle`] for arrays, numbers and bools, and
    /// [`SurfaceError::InvalidStyleProperty`] for nested values inside an object.
    pub fn from_json(value: &Value) -> Result<Self, SurfaceError> {
        match value {
            Value::String(class) => Ok(Self::ClassName(class.clone())),
            Value::Null => Ok(Self::properties()),
            Value::Object(map) => {
                let mut props = Vec::with_capacity(map.len());
                for (name, v) in map {
                    let value = match v {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        _ => {
                            tracing::warn!(property = %name, "rejected nested style property");
                            return Err(SurfaceError::InvalidStyleProperty { name: name.clone() });
                        }
                    };
                    props.push(StyleProperty::new(name.clone(), value));
                }
                Ok(Self::Properties(props))
            }
            other => {
                let found = json_type_name(other);
                tracing::warn!(found, "rejected style specification");
                Err(SurfaceError::UnrecognizedStyle { found })
            }
        }
    }
}

impl From<&str> for StyleSpec {
    fn from(class: &str) -> Self {
        Self::ClassName(class.to_owned())
    }
}

impl From<String> for StyleSpec {
    fn from(class: String) -> Self {
        Self::ClassName(class)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;

    #[test]
    fn string_is_class_name() {
        let spec = StyleSpec::from_json(&json!("card selected")).unwrap();
        assert_eq!(spec, StyleSpec::class("card selected"));
    }

    #[test]
    fn object_keeps_scalar_properties() {
        let spec = StyleSpec::from_json(&json!({
            "id": "main",
            "opacity": 0.5,
            "hidden": false,
        }))
        .unwrap();
        let StyleSpec::Properties(props) = spec else {
            panic!("expected a property map");
        };
        assert_eq!(props.len(), 3);
        assert!(props.contains(&StyleProperty::new("id", "main")));
        assert!(props.contains(&StyleProperty::new("opacity", "0.5")));
        assert!(props.contains(&StyleProperty::new("hidden", "false")));
    }

    #[test]
    fn null_is_empty_map() {
        assert_eq!(
            StyleSpec::from_json(&Value::Null).unwrap(),
            StyleSpec::properties()
        );
    }

    #[test]
    fn array_is_rejected() {
        let err = StyleSpec::from_json(&json!(["a", "b"])).unwrap_err();
        assert_eq!(err, SurfaceError::UnrecognizedStyle { found: "array" });
    }

    #[test]
    fn number_is_rejected() {
        let err = StyleSpec::from_json(&json!(12)).unwrap_err();
        assert_eq!(err, SurfaceError::UnrecognizedStyle { found: "number" });
    }

    #[test]
    fn nested_property_is_rejected() {
        let err = StyleSpec::from_json(&json!({ "border": { "width": 1 } })).unwrap_err();
        assert_eq!(
            err,
            SurfaceError::InvalidStyleProperty {
                name: "border".into()
            }
        );
    }

    #[test]
    fn with_promotes_class_name() {
        let spec = StyleSpec::class("row").with("color", "#000");
        assert_eq!(
            spec,
            StyleSpec::Properties(vec![
                StyleProperty::new(CLASS_NAME_KEY, "row"),
                StyleProperty::new("color", "#000"),
            ])
        );
    }

    #[test]
    #[traced_test]
    fn rejection_is_logged() {
        assert!(StyleSpec::from_json(&json!(true)).is_err());
        assert!(logs_contain("rejected style specification"));
    }
}
