//! Issue enrichment: correlated events and container log tails

use crate::events::EventCorrelator;
use crate::fetch::{LogRequest, ResourceFetcher};
use crate::issue::Issue;
use crate::records::EventRecord;
use tracing::debug;

/// Marker line inserted where log lines were dropped
pub const TRUNCATION_MARKER: &str = "...[logs truncated]...";

/// Logs at or below this many characters are never truncated
pub const MAX_LOG_CHARS: usize = 2000;
/// Logs at or below this many lines are never truncated
pub const MAX_LOG_LINES: usize = 20;

const HEAD_LINES: usize = 5;
const TAIL_LINES: usize = 15;

/// Bound a log tail to its first and last lines.
///
/// Only logs that exceed both the character and the line limit are cut; the
/// result keeps the first 5 lines, the marker, then the last 15 lines.
pub fn truncate_logs(logs: &str) -> String {
    let lines: Vec<&str> = logs.lines().collect();
    if logs.chars().count() <= MAX_LOG_CHARS || lines.len() <= MAX_LOG_LINES {
        return logs.to_string();
    }

    let mut kept = Vec::with_capacity(HEAD_LINES + 1 + TAIL_LINES);
    kept.extend_from_slice(&lines[..HEAD_LINES]);
    kept.push(TRUNCATION_MARKER);
    kept.extend_from_slice(&lines[lines.len() - TAIL_LINES..]);
    kept.join("\n")
}

/// Attach correlated events to an issue
pub fn attach_events(
    issue: &mut Issue,
    correlator: &EventCorrelator,
    events: &[EventRecord],
    limit: usize,
) {
    issue.events = correlator.for_resource(events, &issue.name, limit);
}

/// Fetch a container's log tail, retrying once against the previous instance.
///
/// Returns `None` when neither instance produced logs; failures are not
/// propagated.
pub async fn fetch_container_logs(
    fetcher: &dyn ResourceFetcher,
    pod: &str,
    namespace: &str,
    container: &str,
    tail_lines: i64,
) -> Option<String> {
    let mut request = LogRequest {
        pod: pod.to_string(),
        namespace: namespace.to_string(),
        container: container.to_string(),
        tail_lines,
        previous: false,
    };

    match fetcher.fetch_logs(&request).await {
        Ok(logs) => return Some(truncate_logs(&logs)),
        Err(e) => {
            debug!(pod, namespace, container, error = %e, "Current logs unavailable, trying previous instance");
        }
    }

    request.previous = true;
    match fetcher.fetch_logs(&request).await {
        Ok(logs) => Some(truncate_logs(&logs)),
        Err(e) => {
            debug!(pod, namespace, container, error = %e, "Previous logs unavailable");
            None
        }
    }
}

/// Attach log tails for every container listed on a pod issue.
///
/// Returns the number of containers whose logs could not be fetched.
pub async fn attach_logs(issue: &mut Issue, fetcher: &dyn ResourceFetcher, tail_lines: i64) -> usize {
    let containers: Vec<String> = issue.containers().iter().map(|c| c.name.clone()).collect();
    let mut failures = 0;

    for container in containers {
        match fetch_container_logs(fetcher, &issue.name, &issue.namespace, &container, tail_lines).await
        {
            Some(logs) => {
                issue.logs.insert(container, logs);
            }
            None => failures += 1,
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_log(lines: usize) -> String {
        (1..=lines)
            .map(|i| format!("line {:02} {}", i, "x".repeat(100)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_short_logs_untouched() {
        let logs = "starting\nlistening on :8080\npanic: nil map";
        assert_eq!(truncate_logs(logs), logs);
    }

    #[test]
    fn test_many_short_lines_untouched() {
        // More than 20 lines but under the character limit
        let logs = (1..=40).map(|i| format!("l{}", i)).collect::<Vec<_>>().join("\n");
        assert_eq!(truncate_logs(&logs), logs);
    }

    #[test]
    fn test_few_long_lines_untouched() {
        let logs = (1..=10).map(|_| "y".repeat(500)).collect::<Vec<_>>().join("\n");
        assert!(logs.len() > MAX_LOG_CHARS);
        assert_eq!(truncate_logs(&logs), logs);
    }

    #[test]
    fn test_thirty_line_log_keeps_head_and_tail() {
        let logs = long_log(30);
        assert!(logs.chars().count() > MAX_LOG_CHARS);

        let truncated = truncate_logs(&logs);
        let out: Vec<&str> = truncated.lines().collect();
        let original: Vec<&str> = logs.lines().collect();

        assert_eq!(out.len(), 21);
        assert_eq!(&out[..5], &original[..5]);
        assert_eq!(out[5], TRUNCATION_MARKER);
        assert_eq!(&out[6..], &original[15..]);
    }
}
