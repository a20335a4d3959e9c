mod common;

use common::{STACK, ScriptedClient, Step, fast_retry, stack};
use futures_util::StreamExt;
use stackflow_cloud::{CloudError, ProvisioningClient, StackStatus, StatusPoller};
use std::time::Duration;

fn client() -> ScriptedClient {
    ScriptedClient::new().with_stack(StackStatus::CreateInProgress)
}

#[tokio::test]
async fn test_next_batch_yields_each_event_once() {
    let client = client().with_steps([
        Step::Events(vec![stack(StackStatus::CreateInProgress)]),
        Step::Events(vec![]),
        Step::Events(vec![
            ("VPC", StackStatus::CreateInProgress, None),
            ("VPC", StackStatus::CreateComplete, None),
        ]),
    ]);
    let mut poller = StatusPoller::new(&client, STACK, None).with_retry(fast_retry());

    let first = poller.next_batch().await.unwrap();
    assert_eq!(first.len(), 1);

    // The service returns the full history again; nothing new
    let second = poller.next_batch().await.unwrap();
    assert!(second.is_empty());

    let third = poller.next_batch().await.unwrap();
    let statuses: Vec<_> = third.iter().map(|e| e.status.clone()).collect();
    assert_eq!(
        statuses,
        vec![StackStatus::CreateInProgress, StackStatus::CreateComplete]
    );
    assert_eq!(poller.polls(), 3);
}

#[tokio::test]
async fn test_events_before_since_are_ignored() {
    let client = client().with_steps([Step::Events(vec![stack(StackStatus::CreateComplete)])]);
    let mut poller = StatusPoller::new(&client, STACK, None);
    assert_eq!(poller.next_batch().await.unwrap().len(), 1);

    let later = chrono::Utc::now() + chrono::Duration::seconds(1);
    let mut fresh = StatusPoller::new(&client, STACK, Some(later));
    assert!(fresh.next_batch().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stream_ends_after_terminal_event() {
    let client = client().with_steps([
        Step::Events(vec![stack(StackStatus::CreateInProgress)]),
        Step::Events(vec![
            ("VPC", StackStatus::CreateComplete, None),
            stack(StackStatus::CreateComplete),
        ]),
        Step::Events(vec![("VPC", StackStatus::DeleteInProgress, None)]),
    ]);

    let events: Vec<_> = StatusPoller::new(&client, STACK, None)
        .into_stream(Duration::from_secs(5))
        .collect()
        .await;

    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.is_ok()));
    let last = events.last().unwrap().as_ref().unwrap();
    assert!(last.is_terminal_for(STACK));
    // The batch after the terminal event is never fetched
    assert_eq!(client.calls().list_events, 2);
}

#[tokio::test(start_paused = true)]
async fn test_stream_stops_on_permanent_error() {
    let client = client().with_steps([
        Step::Events(vec![stack(StackStatus::CreateInProgress)]),
        Step::Fail(CloudError::PermissionDenied("cloudformation:DescribeStackEvents".into())),
    ]);

    let events: Vec<_> = StatusPoller::new(&client, STACK, None)
        .with_retry(fast_retry())
        .into_stream(Duration::from_secs(5))
        .collect()
        .await;

    assert_eq!(events.len(), 2);
    assert!(matches!(events[1], Err(CloudError::PermissionDenied(_))));
    assert_eq!(client.calls().list_events, 2);
}

#[tokio::test]
async fn test_after_skips_earlier_operations() {
    // Service clock runs ahead of ours
    let client = client()
        .with_clock_offset(3)
        .with_history(vec![
            stack(StackStatus::CreateInProgress),
            stack(StackStatus::CreateComplete),
        ])
        .with_steps([Step::Events(vec![stack(StackStatus::UpdateInProgress)])]);
    let baseline = client.recent_events(STACK).await.unwrap();

    let mut poller = StatusPoller::new(&client, STACK, None).after(&baseline);
    let batch = poller.next_batch().await.unwrap();

    let statuses: Vec<_> = batch.iter().map(|e| e.status.clone()).collect();
    assert_eq!(statuses, vec![StackStatus::UpdateInProgress]);
}
