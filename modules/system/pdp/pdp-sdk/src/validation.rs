//! Structural validation of decision requests.
//!
//! Validation turns a borrowed [`Request`] into a [`ValidatedRequest`], the
//! only type that can produce the evaluator input document.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::models::{Attributes, Operation, Request, Resource, Subject};

/// Reason a request was rejected before reaching the rule evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRequest {
    #[error("request has no subject")]
    MissingSubject,

    #[error("request has no operation")]
    MissingOperation,

    #[error("request has no resource")]
    MissingResource,

    #[error("subject id is empty")]
    EmptySubjectId,

    #[error("subject type is empty")]
    EmptySubjectKind,

    #[error("subject attributes are absent")]
    MissingSubjectAttributes,

    #[error("resource type is empty")]
    EmptyResourceKind,

    #[error("resource attributes are absent")]
    MissingResourceAttributes,

    #[error("operation is empty")]
    EmptyOperation,

    #[error("operation '{0}' is not recognized")]
    UnknownOperation(String),
}

/// Knobs for request validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOptions {
    /// Reject operations outside the known set instead of passing them through.
    pub strict_operations: bool,
}

/// A request that passed structural validation.
///
/// Borrows from the caller's [`Request`]; nothing is copied until the input
/// document is built.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedRequest<'a> {
    subject: &'a Subject,
    subject_attributes: &'a Attributes,
    operation: &'a Operation,
    resource: &'a Resource,
    resource_attributes: &'a Attributes,
}

impl<'a> ValidatedRequest<'a> {
    #[must_use]
    pub fn subject(&self) -> &'a Subject {
        self.subject
    }

    #[must_use]
    pub fn operation(&self) -> &'a Operation {
        self.operation
    }

    #[must_use]
    pub fn resource(&self) -> &'a Resource {
        self.resource
    }

    /// Build the evaluator input document.
    ///
    /// ```json
    /// {"subject": {"type", "id", "attributes"}, "operation", "resource": {"type", "attributes"}}
    /// ```
    #[must_use]
    pub fn to_input(&self) -> Value {
        json!({
            "subject": {
                "type": self.subject.kind.as_str(),
                "id": self.subject.id,
                "attributes": self.subject_attributes,
            },
            "operation": self.operation.as_str(),
            "resource": {
                "type": self.resource.kind.as_str(),
                "attributes": self.resource_attributes,
            },
        })
    }
}

impl Request {
    /// Validate with default options (open-world operations).
    ///
    /// # Errors
    ///
    /// Returns the first structural defect found.
    pub fn validate(&self) -> Result<ValidatedRequest<'_>, MalformedRequest> {
        self.validate_with(ValidationOptions::default())
    }

    /// Validate the request.
    ///
    /// Checks, in order: subject, resource and operation presence; subject id,
    /// kind and attributes; resource kind and attributes; operation name.
    ///
    /// # Errors
    ///
    /// Returns the first structural defect found.
    pub fn validate_with(
        &self,
        options: ValidationOptions,
    ) -> Result<ValidatedRequest<'_>, MalformedRequest> {
        let subject = self.subject.as_ref().ok_or(MalformedRequest::MissingSubject)?;
        let resource = self
            .resource
            .as_ref()
            .ok_or(MalformedRequest::MissingResource)?;
        let operation = self
            .operation
            .as_ref()
            .ok_or(MalformedRequest::MissingOperation)?;

        if subject.id.is_empty() {
            return Err(MalformedRequest::EmptySubjectId);
        }
        if subject.kind.as_str().is_empty() {
            return Err(MalformedRequest::EmptySubjectKind);
        }
        let subject_attributes = subject
            .attributes
            .as_ref()
            .ok_or(MalformedRequest::MissingSubjectAttributes)?;

        if resource.kind.as_str().is_empty() {
            return Err(MalformedRequest::EmptyResourceKind);
        }
        let resource_attributes = resource
            .attributes
            .as_ref()
            .ok_or(MalformedRequest::MissingResourceAttributes)?;

        if operation.as_str().is_empty() {
            return Err(MalformedRequest::EmptyOperation);
        }
        if options.strict_operations && !operation.is_known() {
            return Err(MalformedRequest::UnknownOperation(
                operation.as_str().to_owned(),
            ));
        }

        Ok(ValidatedRequest {
            subject,
            subject_attributes,
            operation,
            resource,
            resource_attributes,
        })
    }
}
