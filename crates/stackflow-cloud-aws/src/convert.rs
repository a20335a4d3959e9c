//! SDK type conversions

use aws_sdk_cloudformation::primitives::DateTime as SmithyDateTime;
use aws_sdk_cloudformation::types;
use chrono::{DateTime, Utc};
use stackflow_cloud::{StackDescription, StackEvent, StackStatus};

/// Members the service model marks as required come back as plain references,
/// the rest as `Option`. This lets call sites treat both the same way.
pub(crate) trait Present<'a, T: ?Sized> {
    fn present(self) -> Option<&'a T>;
}

impl<'a, T: ?Sized> Present<'a, T> for &'a T {
    fn present(self) -> Option<&'a T> {
        Some(self)
    }
}

impl<'a, T: ?Sized> Present<'a, T> for Option<&'a T> {
    fn present(self) -> Option<&'a T> {
        self
    }
}

pub(crate) fn to_utc(timestamp: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

pub(crate) fn to_utc_or_epoch(timestamp: Option<&SmithyDateTime>) -> DateTime<Utc> {
    timestamp.and_then(to_utc).unwrap_or_default()
}

pub(crate) fn stack_description(stack: &types::Stack) -> StackDescription {
    let stack_name = stack.stack_name().present().unwrap_or_default().to_string();
    StackDescription {
        stack_id: stack
            .stack_id()
            .present()
            .map(str::to_string)
            .unwrap_or_else(|| stack_name.clone()),
        stack_name,
        status: stack
            .stack_status()
            .present()
            .map(|s| StackStatus::parse(s.as_str()))
            .unwrap_or_else(|| StackStatus::Unknown(String::new())),
        status_reason: stack.stack_status_reason().map(str::to_string),
    }
}

pub(crate) fn stack_event(event: &types::StackEvent) -> StackEvent {
    StackEvent {
        event_id: event.event_id().present().unwrap_or_default().to_string(),
        timestamp: to_utc_or_epoch(event.timestamp().present()),
        logical_name: event
            .logical_resource_id()
            .present()
            .unwrap_or_default()
            .to_string(),
        resource_type: event
            .resource_type()
            .present()
            .unwrap_or_default()
            .to_string(),
        status: event
            .resource_status()
            .present()
            .map(|s| StackStatus::parse(s.as_str()))
            .unwrap_or_else(|| StackStatus::Unknown(String::new())),
        status_reason: event.resource_status_reason().map(str::to_string),
        physical_id: event
            .physical_resource_id()
            .present()
            .filter(|id| !id.is_empty())
            .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_utc() {
        let ts = SmithyDateTime::from_secs(1_700_000_000);
        let converted = to_utc(&ts).unwrap();
        assert_eq!(converted.timestamp(), 1_700_000_000);
        assert_eq!(converted.timestamp_subsec_nanos(), 0);

        assert_eq!(to_utc_or_epoch(None).timestamp(), 0);
    }

    #[test]
    fn test_present_normalizes_accessors() {
        let required: &str = "CREATE_COMPLETE";
        let optional: Option<&str> = None;
        assert_eq!(required.present(), Some("CREATE_COMPLETE"));
        assert_eq!(optional.present(), None);
    }
}
