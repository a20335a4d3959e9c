//! Mapping of SDK failures onto [`CloudError`]

use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use stackflow_cloud::CloudError;

/// CloudFormation reports most client-side problems as `ValidationError`;
/// these message fragments tell them apart.
const DOES_NOT_EXIST: &str = "does not exist";
const NO_UPDATES: &str = "No updates are to be performed";
const CANNOT_BE_UPDATED: &str = "state and can not be updated";

const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
];

const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
    "ExpiredToken",
    "InvalidClientTokenId",
];

/// Convert an SDK error into the provider-neutral error type
pub(crate) fn from_sdk<E, R>(err: SdkError<E, R>) -> CloudError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            CloudError::Transport(DisplayErrorContext(&err).to_string())
        }
        SdkError::ServiceError(_) => {
            classify(err.code(), err.message().unwrap_or_default())
        }
        _ => CloudError::ApiError(DisplayErrorContext(&err).to_string()),
    }
}

/// Classify a service error by its code and message
pub(crate) fn classify(code: Option<&str>, message: &str) -> CloudError {
    let message = message.to_string();
    match code {
        Some(code) if THROTTLING_CODES.contains(&code) => CloudError::Transport(message),
        Some(code) if ACCESS_DENIED_CODES.contains(&code) => CloudError::PermissionDenied(message),
        Some("ValidationError") if message.contains(CANNOT_BE_UPDATED) => {
            CloudError::Conflict(message)
        }
        Some("ValidationError") => CloudError::Validation(message),
        Some("AlreadyExistsException") => CloudError::Validation(message),
        Some("LimitExceededException") | Some("InsufficientCapabilitiesException") => {
            CloudError::Validation(message)
        }
        Some(code) => CloudError::ApiError(format!("{}: {}", code, message)),
        None => CloudError::ApiError(message),
    }
}

/// `DescribeStacks` fails instead of returning an empty list for unknown stacks
pub(crate) fn is_missing_stack(err: &CloudError) -> bool {
    matches!(err, CloudError::Validation(message) if message.contains(DOES_NOT_EXIST))
}

/// `UpdateStack` fails when the template and parameters are unchanged
pub(crate) fn is_no_changes(err: &CloudError) -> bool {
    matches!(err, CloudError::Validation(message) if message.contains(NO_UPDATES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_validation_messages() {
        let missing = classify(
            Some("ValidationError"),
            "Stack with id sample-stack does not exist",
        );
        assert!(is_missing_stack(&missing));
        assert!(!is_no_changes(&missing));

        let unchanged = classify(Some("ValidationError"), "No updates are to be performed.");
        assert!(is_no_changes(&unchanged));

        let busy = classify(
            Some("ValidationError"),
            "Stack:arn:aws:cloudformation:ap-northeast-1:123456789012:stack/sample-stack/1 is in UPDATE_IN_PROGRESS state and can not be updated.",
        );
        assert!(matches!(busy, CloudError::Conflict(_)));
    }

    #[test]
    fn test_classify_codes() {
        assert!(classify(Some("Throttling"), "Rate exceeded").is_transient());
        assert!(matches!(
            classify(Some("AccessDenied"), "not authorized"),
            CloudError::PermissionDenied(_)
        ));
        assert!(matches!(
            classify(Some("AlreadyExistsException"), "Stack [sample-stack] already exists"),
            CloudError::Validation(_)
        ));
        assert!(matches!(
            classify(Some("InternalFailure"), "boom"),
            CloudError::ApiError(ref m) if m == "InternalFailure: boom"
        ));
        assert!(matches!(classify(None, "?"), CloudError::ApiError(_)));
    }
}
