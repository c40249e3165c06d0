//! Adapter for the legacy flat request shape.
//!
//! Older callers send a single flat object instead of the subject/resource
//! attribute bags. It is mapped into the canonical [`Request`] before it
//! reaches the decision engine.

use serde::{Deserialize, Serialize};

use crate::models::{Attributes, Operation, Request, Resource, ResourceKind, Subject, SubjectKind};

/// Flat request as sent by legacy callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRequest {
    /// post, channel, channel name, etc.
    #[serde(default)]
    pub resource: String,
    /// user, bot, etc.
    #[serde(default)]
    pub subject_type: String,
    #[serde(default)]
    pub subject_id: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub resource_team_id: String,
    #[serde(default)]
    pub resource_channel_id: String,
}

fn subject_kind(subject_type: &str) -> SubjectKind {
    match subject_type {
        "user" => SubjectKind::Person,
        "bot" => SubjectKind::NonPersonEntity,
        other => SubjectKind::from(other),
    }
}

impl From<FlatRequest> for Request {
    fn from(flat: FlatRequest) -> Self {
        let mut resource_attributes = Attributes::new();
        if !flat.resource_team_id.is_empty() {
            resource_attributes.insert("team_id".to_owned(), flat.resource_team_id.into());
        }
        if !flat.resource_channel_id.is_empty() {
            resource_attributes.insert("channel_id".to_owned(), flat.resource_channel_id.into());
        }

        Request::new(
            Subject::new(subject_kind(&flat.subject_type), flat.subject_id),
            Operation::from(flat.action),
            Resource::new(ResourceKind::from(flat.resource)).with_attributes(resource_attributes),
        )
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_request_maps_into_canonical_shape() {
        let flat: FlatRequest = serde_json::from_value(json!({
            "resource": "post",
            "subject_type": "user",
            "subject_id": "u1",
            "action": "edit",
            "resource_team_id": "t1",
            "resource_channel_id": "c1"
        }))
        .unwrap();

        let request = Request::from(flat);
        let subject = request.subject.as_ref().unwrap();
        assert_eq!(subject.kind, SubjectKind::Person);
        assert_eq!(subject.id, "u1");
        assert_eq!(request.operation, Some(Operation::Edit));

        let resource = request.resource.as_ref().unwrap();
        assert_eq!(resource.kind, ResourceKind::Post);
        let attrs = resource.attributes.as_ref().unwrap();
        assert_eq!(attrs["team_id"], json!("t1"));
        assert_eq!(attrs["channel_id"], json!("c1"));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn empty_ids_are_not_turned_into_attributes() {
        let request = Request::from(FlatRequest {
            resource: "channel".to_owned(),
            subject_type: "bot".to_owned(),
            subject_id: "b1".to_owned(),
            action: "read".to_owned(),
            ..FlatRequest::default()
        });

        let resource = request.resource.unwrap();
        assert_eq!(resource.kind, ResourceKind::Other("channel".to_owned()));
        assert!(resource.attributes.unwrap().is_empty());
        assert_eq!(
            request.subject.unwrap().kind,
            SubjectKind::NonPersonEntity
        );
    }

    #[test]
    fn missing_subject_id_still_fails_validation() {
        let request = Request::from(FlatRequest {
            resource: "post".to_owned(),
            subject_type: "user".to_owned(),
            action: "read".to_owned(),
            ..FlatRequest::default()
        });
        assert!(request.validate().is_err());
    }
}
