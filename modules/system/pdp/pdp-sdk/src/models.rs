//! Request model for the policy decision point.
//!
//! A [`Request`] is the atomic unit submitted for evaluation: one [`Subject`]
//! performing one [`Operation`] on one [`Resource`]. Fields are optional at
//! this level so that incomplete requests coming off the wire can still be
//! represented and rejected by validation instead of failing to parse.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute bag attached to subjects and resources.
///
/// Ordered so that serialized input documents and denial descriptions are
/// stable across calls.
pub type Attributes = BTreeMap<String, Value>;

/// Declares an open-world string enumeration: known values map to variants,
/// everything else is preserved in `Other`.
macro_rules! open_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// A value outside the known set, kept verbatim.
            Other(String),
        }

        impl $name {
            /// Wire representation of the value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $wire, )+
                    Self::Other(s) => s,
                }
            }

            /// Returns `true` if the value is one of the known variants.
            #[must_use]
            pub fn is_known(&self) -> bool {
                !matches!(self, Self::Other(_))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::Other(String::new())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $( $wire => Self::$variant, )+
                    other => Self::Other(other.to_owned()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $( $wire => Self::$variant, )+
                    _ => Self::Other(s),
                }
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> Self {
                match v {
                    $name::Other(s) => s,
                    known => known.as_str().to_owned(),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

open_enum! {
    /// Kind of principal making the request.
    pub enum SubjectKind {
        /// A human user.
        Person => "person",
        /// A bot, service account or other automated principal.
        NonPersonEntity => "non_person_entity",
    }
}

open_enum! {
    /// Type tag of the resource being acted upon.
    ///
    /// Opaque to the decision engine: it is passed through to the rule
    /// evaluator, so new resource kinds need no code change.
    pub enum ResourceKind {
        Post => "post",
    }
}

open_enum! {
    /// The action being attempted (NIST SP 800-162 operation set).
    pub enum Operation {
        Read => "read",
        Write => "write",
        Edit => "edit",
        Delete => "delete",
        Copy => "copy",
        Execute => "execute",
        Modify => "modify",
    }
}

/// The requesting principal. Assumed already authenticated by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Principal kind. Serialized as `"type"`.
    #[serde(rename = "type", default)]
    pub kind: SubjectKind,
    /// Opaque unique identifier. Must be non-empty.
    #[serde(default)]
    pub id: String,
    /// Contextual attributes (role, team membership, ...). Must be present,
    /// may be empty.
    #[serde(default)]
    pub attributes: Option<Attributes>,
}

impl Subject {
    /// Create a subject with an empty attribute bag.
    #[must_use]
    pub fn new(kind: SubjectKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            attributes: Some(Attributes::new()),
        }
    }

    /// Add a single attribute.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes
            .get_or_insert_with(Attributes::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replace the attribute bag.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

/// The object being acted upon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource class. Serialized as `"type"`.
    #[serde(rename = "type", default)]
    pub kind: ResourceKind,
    /// Attributes describing this instance (owner, team, channel, ...).
    /// Must be present, may be empty.
    #[serde(default)]
    pub attributes: Option<Attributes>,
}

impl Resource {
    /// Create a resource with an empty attribute bag.
    #[must_use]
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            attributes: Some(Attributes::new()),
        }
    }

    /// Add a single attribute.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes
            .get_or_insert_with(Attributes::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replace the attribute bag.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

/// Authorization decision request (the evaluator's `input`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Who is asking (aka requestor).
    #[serde(default)]
    pub subject: Option<Subject>,
    /// What they want to do.
    #[serde(default)]
    pub operation: Option<Operation>,
    /// What they want to do it to.
    #[serde(default)]
    pub resource: Option<Resource>,
}

impl Request {
    /// Compose a complete request. Pure value construction.
    #[must_use]
    pub fn new(subject: Subject, operation: Operation, resource: Resource) -> Self {
        Self {
            subject: Some(subject),
            operation: Some(operation),
            resource: Some(resource),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_values_parse_to_variants() {
        assert_eq!(Operation::from("delete"), Operation::Delete);
        assert_eq!(
            SubjectKind::from("non_person_entity"),
            SubjectKind::NonPersonEntity
        );
        assert_eq!(ResourceKind::from("post"), ResourceKind::Post);
    }

    #[test]
    fn unknown_values_are_kept_verbatim() {
        let op = Operation::from("archive");
        assert_eq!(op, Operation::Other("archive".to_owned()));
        assert!(!op.is_known());
        assert_eq!(op.as_str(), "archive");
        assert_eq!(String::from(ResourceKind::from("channel")), "channel");
    }

    #[test]
    fn request_deserializes_from_wire_shape() {
        let request: Request = serde_json::from_value(json!({
            "subject": {"type": "person", "id": "u1", "attributes": {"role": "member"}},
            "operation": "read",
            "resource": {"type": "post", "attributes": {"owner": "u1"}}
        }))
        .unwrap();

        let subject = request.subject.as_ref().unwrap();
        assert_eq!(subject.kind, SubjectKind::Person);
        assert_eq!(subject.id, "u1");
        assert_eq!(
            subject.attributes.as_ref().unwrap().get("role"),
            Some(&json!("member"))
        );
        assert_eq!(request.operation, Some(Operation::Read));
        assert_eq!(request.resource.unwrap().kind, ResourceKind::Post);
    }

    #[test]
    fn missing_fields_deserialize_as_absent() {
        let request: Request = serde_json::from_value(json!({
            "subject": {"type": "person"},
            "resource": null
        }))
        .unwrap();

        let subject = request.subject.unwrap();
        assert!(subject.id.is_empty());
        assert!(subject.attributes.is_none());
        assert!(request.operation.is_none());
        assert!(request.resource.is_none());
    }

    #[test]
    fn builders_populate_attributes() {
        let resource = Resource::new(ResourceKind::Post)
            .attribute("owner", "u1")
            .attribute("pinned", true);
        let attrs = resource.attributes.unwrap();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs["pinned"], json!(true));

        let subject = Subject::new(SubjectKind::Person, "u1");
        assert_eq!(subject.attributes, Some(Attributes::new()));
    }
}
