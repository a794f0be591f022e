//! The generic Para domain object.
//!
//! A [`ParaObject`] has a fixed set of core fields and an open bag of custom
//! properties. On the wire both sit side by side in one JSON object: unknown
//! keys are collected into [`ParaObject::properties`], core fields never are.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Type assigned to objects that do not name one.
pub const DEFAULT_TYPE: &str = "sysprop";

/// App id assumed when an object carries none.
pub const DEFAULT_APPID: &str = "para";

/// A Para object: core fields plus custom properties.
///
/// # Examples
///
/// ```
/// use para_core::ParaObject;
///
/// let mut obj = ParaObject::new().with_id("123").with_name("First post");
/// obj.add_property("rating", 5);
///
/// let json = serde_json::to_value(&obj).unwrap();
/// assert_eq!(json["id"], "123");
/// assert_eq!(json["type"], "sysprop");
/// assert_eq!(json["rating"], 5);
/// assert!(json.get("parentid").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParaObject {
    /// Unique id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Creation time, epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Object type, e.g. `user`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    /// Owning app.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appid: Option<String>,
    /// Parent object id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parentid: Option<String>,
    /// Id of the creating user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creatorid: Option<String>,
    /// Last update time, epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<i64>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Vote count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<i64>,
    /// Version for optimistic locking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    /// Whether the object is persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored: Option<bool>,
    /// Whether the object is indexed for search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed: Option<bool>,
    /// Whether the object is cached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    /// Plural form of the type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural: Option<String>,

    /// Custom properties. Never contains `null` values.
    #[serde(flatten, deserialize_with = "deserialize_properties")]
    pub properties: Map<String, Value>,
}

impl ParaObject {
    /// A new object of the default type.
    #[must_use]
    pub fn new() -> Self {
        Self {
            object_type: Some(DEFAULT_TYPE.to_owned()),
            ..Self::default()
        }
    }

    /// Set the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the type.
    #[must_use]
    pub fn with_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = Some(object_type.into());
        self
    }

    /// Set the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The type, or [`DEFAULT_TYPE`] when unset.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.object_type.as_deref().unwrap_or(DEFAULT_TYPE)
    }

    /// The app id, or [`DEFAULT_APPID`] when unset.
    #[must_use]
    pub fn app_id(&self) -> &str {
        self.appid.as_deref().unwrap_or(DEFAULT_APPID)
    }

    /// Creation time in epoch milliseconds; zero counts as unset.
    #[must_use]
    pub fn created_at(&self) -> Option<i64> {
        self.timestamp.filter(|&t| t != 0)
    }

    /// Last update time in epoch milliseconds; zero counts as unset.
    #[must_use]
    pub fn updated_at(&self) -> Option<i64> {
        self.updated.filter(|&t| t != 0)
    }

    /// Set a custom property. Blank names and `null` values are ignored.
    pub fn add_property(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        if !name.trim().is_empty() && !value.is_null() {
            self.properties.insert(name.to_owned(), value);
        }
        self
    }

    /// Get a custom property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        if name.trim().is_empty() {
            return None;
        }
        self.properties.get(name)
    }

    /// Remove a custom property, returning its value.
    pub fn remove_property(&mut self, name: &str) -> Option<Value> {
        if name.trim().is_empty() {
            return None;
        }
        self.properties.remove(name)
    }

    /// Whether a custom property with this name exists.
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        !name.trim().is_empty() && self.properties.contains_key(name)
    }

    /// The object's resource path: `/{type}` or `/{type}/{id}`.
    ///
    /// Segments are not encoded here; the signer percent-encodes the whole
    /// path exactly once when it builds the request URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use para_core::ParaObject;
    ///
    /// assert_eq!(ParaObject::new().object_uri(), "/sysprop");
    /// assert_eq!(
    ///     ParaObject::new().with_type("blog post").with_id("a b").object_uri(),
    ///     "/blog post/a b"
    /// );
    /// ```
    #[must_use]
    pub fn object_uri(&self) -> String {
        match &self.id {
            Some(id) => format!("/{}/{id}", self.type_name()),
            None => format!("/{}", self.type_name()),
        }
    }
}

fn deserialize_properties<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut properties = Map::deserialize(deserializer)?;
    properties.retain(|_, value| !value.is_null());
    Ok(properties)
}
