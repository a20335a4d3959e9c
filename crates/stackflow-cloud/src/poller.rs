//! Stack event polling
//!
//! Re-queries the provisioning service for stack events at a fixed interval
//! and yields each event once, oldest first. The sequence ends right after
//! the event that puts the stack itself into a terminal status.

use crate::error::Result;
use crate::event::StackEvent;
use crate::provider::{ProvisioningClient, RetryConfig};
use chrono::{DateTime, Utc};
use futures_util::Stream;
use futures_util::stream;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;

/// Incremental event reader for one stack
pub struct StatusPoller<'a> {
    client: &'a dyn ProvisioningClient,
    stack_name: String,
    since: Option<DateTime<Utc>>,
    seen: HashSet<String>,
    retry: RetryConfig,
    polls: u32,
}

impl<'a> StatusPoller<'a> {
    /// Start polling `stack_name`, ignoring events older than `since`
    pub fn new(
        client: &'a dyn ProvisioningClient,
        stack_name: impl Into<String>,
        since: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            client,
            stack_name: stack_name.into(),
            since,
            seen: HashSet::new(),
            retry: RetryConfig::default(),
            polls: 0,
        }
    }

    /// Treat `events` as already observed and start from the newest of them.
    ///
    /// The cursor comes from the service's own timestamps, so a skewed
    /// local clock neither replays old events nor hides new ones.
    pub fn after(mut self, events: &[StackEvent]) -> Self {
        self.seen.extend(events.iter().map(|e| e.event_id.clone()));
        if let Some(newest) = events.iter().map(|e| e.timestamp).max() {
            self.since = Some(self.since.map_or(newest, |since| since.max(newest)));
        }
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    /// Number of completed fetches
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Fetch once and return events not yielded before, in timestamp order.
    ///
    /// Transient failures are retried according to the retry configuration.
    pub async fn next_batch(&mut self) -> Result<Vec<StackEvent>> {
        let client = self.client;
        let stack_name = self.stack_name.as_str();
        let since = self.since;
        let events = self
            .retry
            .run("list_events", move || client.list_events(stack_name, since))
            .await?;
        self.polls += 1;

        let mut fresh: Vec<StackEvent> = events
            .into_iter()
            .filter(|e| since.is_none_or(|since| e.timestamp >= since))
            .filter(|e| self.seen.insert(e.event_id.clone()))
            .collect();
        fresh.sort_by_key(|e| e.timestamp);

        // Later fetches only need events at or after the newest one seen;
        // equal timestamps are filtered by event id.
        if let Some(last) = fresh.last() {
            self.since = Some(last.timestamp);
        }

        tracing::debug!(
            "Poll #{} for '{}' returned {} new event(s)",
            self.polls,
            self.stack_name,
            fresh.len()
        );
        Ok(fresh)
    }

    /// Lazy event sequence, fetching a new batch every `interval` when drained.
    ///
    /// Ends after yielding the stack's terminal event, or after the first error.
    pub fn into_stream(self, interval: Duration) -> impl Stream<Item = Result<StackEvent>> + 'a {
        let state = StreamState {
            poller: self,
            interval,
            buffered: VecDeque::new(),
            finished: false,
        };

        stream::unfold(state, |mut state| async move {
            if state.finished {
                return None;
            }
            loop {
                if let Some(event) = state.buffered.pop_front() {
                    if event.is_terminal_for(&state.poller.stack_name) {
                        state.finished = true;
                        state.buffered.clear();
                    }
                    return Some((Ok(event), state));
                }

                if state.poller.polls > 0 {
                    tokio::time::sleep(state.interval).await;
                }
                match state.poller.next_batch().await {
                    Ok(batch) => state.buffered.extend(batch),
                    Err(e) => {
                        state.finished = true;
                        return Some((Err(e), state));
                    }
                }
            }
        })
    }
}

struct StreamState<'a> {
    poller: StatusPoller<'a>,
    interval: Duration,
    buffered: VecDeque<StackEvent>,
    finished: bool,
}
