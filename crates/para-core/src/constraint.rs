//! Validation constraints understood by the Para server.
//!
//! Each constraint has a name (the last segment of
//! `_constraints/{type}/{field}/{name}`) and a JSON payload sent as the
//! request body. Every payload carries a `message` key of the form
//! `messages.<name>`; some add parameters.

use serde_json::{Map, Value, json};

/// A field validation constraint.
///
/// # Examples
///
/// ```
/// use para_core::Constraint;
///
/// let size = Constraint::Size { min: 2, max: 20 };
/// assert_eq!(size.name(), "size");
/// assert_eq!(
///     serde_json::Value::Object(size.payload()),
///     serde_json::json!({"min": 2, "max": 20, "message": "messages.size"})
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Field must be present and non-blank.
    Required,
    /// Numeric value must be at least this.
    Min(i64),
    /// Numeric value must be at most this.
    Max(i64),
    /// Length must be within `min..=max`.
    Size {
        /// Minimum length.
        min: i64,
        /// Maximum length.
        max: i64,
    },
    /// Number of integer and fraction digits allowed.
    Digits {
        /// Maximum integer digits.
        integer: i64,
        /// Maximum fraction digits.
        fraction: i64,
    },
    /// Value must match this regular expression.
    Pattern(String),
    /// Value must be an email address.
    Email,
    /// Value must be `false`.
    False,
    /// Value must be `true`.
    True,
    /// Date must lie in the future.
    Future,
    /// Date must lie in the past.
    Past,
    /// Value must be a URL.
    Url,
}

impl Constraint {
    /// Every constraint name, in declaration order.
    pub const NAMES: [&'static str; 12] = [
        "required", "min", "max", "size", "digits", "pattern", "email", "false", "true", "future",
        "past", "url",
    ];

    /// The constraint name used on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Min(_) => "min",
            Self::Max(_) => "max",
            Self::Size { .. } => "size",
            Self::Digits { .. } => "digits",
            Self::Pattern(_) => "pattern",
            Self::Email => "email",
            Self::False => "false",
            Self::True => "true",
            Self::Future => "future",
            Self::Past => "past",
            Self::Url => "url",
        }
    }

    /// The JSON payload sent to the server.
    #[must_use]
    pub fn payload(&self) -> Map<String, Value> {
        let mut payload = match self {
            Self::Min(value) | Self::Max(value) => object(json!({ "value": value })),
            Self::Size { min, max } => object(json!({ "min": min, "max": max })),
            Self::Digits { integer, fraction } => {
                object(json!({ "integer": integer, "fraction": fraction }))
            }
            Self::Pattern(regex) => object(json!({ "value": regex })),
            _ => Map::new(),
        };
        payload.insert(
            "message".to_owned(),
            Value::String(format!("messages.{}", self.name())),
        );
        payload
    }

    /// Rebuild a constraint from its name and payload, as returned by the server.
    ///
    /// Returns `None` for unknown names or payloads missing a required parameter.
    ///
    /// # Examples
    ///
    /// ```
    /// use para_core::Constraint;
    ///
    /// let payload = serde_json::json!({"value": 5, "message": "messages.min"});
    /// assert_eq!(Constraint::from_payload("min", &payload), Some(Constraint::Min(5)));
    /// assert_eq!(Constraint::from_payload("min", &serde_json::json!({})), None);
    /// ```
    #[must_use]
    pub fn from_payload(name: &str, payload: &Value) -> Option<Self> {
        let int = |key: &str| payload.get(key).and_then(Value::as_i64);
        let constraint = match name {
            "required" => Self::Required,
            "min" => Self::Min(int("value")?),
            "max" => Self::Max(int("value")?),
            "size" => Self::Size {
                min: int("min")?,
                max: int("max")?,
            },
            "digits" => Self::Digits {
                integer: int("integer")?,
                fraction: int("fraction")?,
            },
            "pattern" => Self::Pattern(payload.get("value")?.as_str()?.to_owned()),
            "email" => Self::Email,
            "false" => Self::False,
            "true" => Self::True,
            "future" => Self::Future,
            "past" => Self::Past,
            "url" => Self::Url,
            _ => return None,
        };
        Some(constraint)
    }

    /// Whether `name` is a known constraint name.
    #[must_use]
    pub fn is_valid_name(name: &str) -> bool {
        Self::NAMES.contains(&name)
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
