use std::thread;
use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};

use crate::ApiClient;

use super::series::SeriesId;
use super::DateRange;

/// Records of one series exactly as the API returned them
pub type RawRecords = Vec<Value>;

/// How many times a request is attempted and how long to wait after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

pub struct Dataset<'a> {
    client: &'a dyn ApiClient,
    policy: RetryPolicy,
}

impl<'a> Dataset<'a> {
    pub fn new(client: &'a dyn ApiClient) -> Self {
        Self {
            client,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the records of `series` within `date_range`.
    ///
    /// Failed attempts are retried after a fixed delay. Once the attempts are
    /// used up the result is empty, which callers cannot tell apart from a
    /// series that has no data in the range.
    pub fn fetch(&self, series: SeriesId, date_range: DateRange) -> RawRecords {
        let path = series.path();
        let qs = date_range.to_query_string();

        for attempt in 1..=self.policy.attempts {
            match self.try_fetch(&path, &qs) {
                Ok(records) => return records,
                Err(e) => {
                    warn!(
                        series = %series,
                        attempt,
                        "attempt {}/{} failed: {:#}",
                        attempt,
                        self.policy.attempts,
                        e
                    );
                }
            }
            thread::sleep(self.policy.delay);
        }

        info!(series = %series, "giving up after {} attempts", self.policy.attempts);
        vec![]
    }

    fn try_fetch(&self, path: &str, qs: &[(String, String)]) -> Result<RawRecords, anyhow::Error> {
        let reply = self.client.http_get(path, qs)?;

        let res: Result<RawRecords, _> = serde_json::from_str(&reply);
        match res {
            Ok(records) => Ok(records),
            Err(e) => Err(anyhow::Error::msg(format!(
                "failed to parse reply of {}?{:?}: {}",
                path, qs, e
            ))),
        }
    }
}
