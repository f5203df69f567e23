use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::time;

use crate::logging;

use super::chunk::{number_segments, pack_blocks, plain_header, MessageSegment};

/// A size-limited outbound message channel.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Packing budget per segment, leaving headroom for the numbering header.
    fn pack_limit(&self) -> usize;

    /// Absolute per-message limit enforced by the remote service.
    fn hard_limit(&self) -> usize;

    fn header(&self, index: usize, total: usize) -> String {
        plain_header(index, total)
    }

    /// Delivers one message. Transport failures are logged by the
    /// implementation and reported as `false`.
    async fn send(&self, text: &str) -> bool;

    /// Uploads the whole report as a file. `None` when the channel has no
    /// attachment support.
    async fn send_attachment(&self, _file_name: &str, _contents: &str) -> Option<bool> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub sent: usize,
    pub total: usize,
    pub attachment: Option<bool>,
}

impl DispatchOutcome {
    pub fn complete(&self) -> bool {
        self.sent == self.total
    }
}

/// Sends segments in order, pausing `pacing` after each delivery. The
/// first failure ends the run; nothing after it is attempted.
pub async fn dispatch<C>(channel: &C, segments: &[MessageSegment], pacing: Duration) -> usize
where
    C: Channel + ?Sized,
{
    let mut sent = 0usize;
    for segment in segments {
        logging::info(
            "dispatch.segment",
            "Sending segment",
            json!({
                "channel": channel.name(),
                "index": segment.index,
                "total": segment.total,
                "chars": segment.text.chars().count(),
            }),
        );

        if !channel.send(&segment.text).await {
            logging::error(
                "dispatch.segment_failed",
                "Segment delivery failed, stopping",
                json!({
                    "channel": channel.name(),
                    "index": segment.index,
                    "sent": sent,
                    "total": segment.total,
                }),
            );
            break;
        }
        sent += 1;

        if !pacing.is_zero() {
            time::sleep(pacing).await;
        }
    }
    sent
}

/// Packs, numbers and dispatches a report, then offers the full text as an
/// attachment whether or not every segment went through.
pub async fn deliver_report<C>(
    channel: &C,
    report: &str,
    file_name: &str,
    pacing: Duration,
) -> DispatchOutcome
where
    C: Channel + ?Sized,
{
    let packed = pack_blocks(report, channel.pack_limit());
    let segments = number_segments(packed, channel.hard_limit(), |index, total| {
        channel.header(index, total)
    });
    let total = segments.len();
    logging::info(
        "dispatch.start",
        "Dispatching report",
        json!({ "channel": channel.name(), "segments": total }),
    );

    let sent = dispatch(channel, &segments, pacing).await;
    let attachment = channel.send_attachment(file_name, report).await;

    let outcome = DispatchOutcome {
        sent,
        total,
        attachment,
    };
    logging::info(
        "dispatch.finish",
        "Report dispatch finished",
        json!({
            "channel": channel.name(),
            "sent": outcome.sent,
            "total": outcome.total,
            "attachment": outcome.attachment,
        }),
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BLOCK_DELIMITER;
    use std::sync::Mutex;

    struct RecordingChannel {
        fail_at: Option<usize>,
        attempts: Mutex<Vec<String>>,
        attachments: Mutex<Vec<String>>,
        supports_attachment: bool,
    }

    impl RecordingChannel {
        fn new(fail_at: Option<usize>, supports_attachment: bool) -> Self {
            Self {
                fail_at,
                attempts: Mutex::new(Vec::new()),
                attachments: Mutex::new(Vec::new()),
                supports_attachment,
            }
        }

        fn attempts(&self) -> Vec<String> {
            self.attempts.lock().expect("attempts lock").clone()
        }
    }

    #[async_trait]
    impl Channel for RecordingChannel {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn pack_limit(&self) -> usize {
            60
        }

        fn hard_limit(&self) -> usize {
            80
        }

        async fn send(&self, text: &str) -> bool {
            let mut attempts = self.attempts.lock().expect("attempts lock");
            attempts.push(text.to_string());
            Some(attempts.len()) != self.fail_at
        }

        async fn send_attachment(&self, file_name: &str, _contents: &str) -> Option<bool> {
            if !self.supports_attachment {
                return None;
            }
            self.attachments
                .lock()
                .expect("attachments lock")
                .push(file_name.to_string());
            Some(true)
        }
    }

    fn segments(count: usize) -> Vec<MessageSegment> {
        (1..=count)
            .map(|index| MessageSegment {
                index,
                total: count,
                text: format!("segment {index}"),
                truncated: false,
            })
            .collect()
    }

    #[tokio::test]
    async fn sends_every_segment_in_order() {
        let channel = RecordingChannel::new(None, false);
        let sent = dispatch(&channel, &segments(4), Duration::ZERO).await;

        assert_eq!(sent, 4);
        assert_eq!(
            channel.attempts(),
            vec!["segment 1", "segment 2", "segment 3", "segment 4"]
        );
    }

    #[tokio::test]
    async fn stops_after_first_failure() {
        let channel = RecordingChannel::new(Some(2), false);
        let sent = dispatch(&channel, &segments(5), Duration::ZERO).await;

        assert_eq!(sent, 1);
        assert_eq!(channel.attempts(), vec!["segment 1", "segment 2"]);
    }

    #[tokio::test]
    async fn attachment_follows_partial_failure() {
        let channel = RecordingChannel::new(Some(1), true);
        let report = format!("first block\n\n{BLOCK_DELIMITER}\n\nsecond block with more text in it");
        let outcome = deliver_report(&channel, &report, "report.txt", Duration::ZERO).await;

        assert_eq!(outcome.sent, 0);
        assert_eq!(outcome.total, 2);
        assert!(!outcome.complete());
        assert_eq!(outcome.attachment, Some(true));
        assert_eq!(
            *channel.attachments.lock().expect("attachments lock"),
            vec!["report.txt".to_string()]
        );
    }

    #[tokio::test]
    async fn deliver_report_numbers_segments() {
        let channel = RecordingChannel::new(None, false);
        let report = format!("alpha\n\n{BLOCK_DELIMITER}\n\nbeta");
        let outcome = deliver_report(&channel, &report, "report.txt", Duration::ZERO).await;

        assert!(outcome.complete());
        assert_eq!(outcome.attachment, None);
        let attempts = channel.attempts();
        assert_eq!(attempts.len(), 1);
        assert!(attempts[0].starts_with("(1/1)\nalpha"));
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_waits_between_segments() {
        let channel = RecordingChannel::new(None, false);
        let started = time::Instant::now();
        dispatch(&channel, &segments(3), Duration::from_secs(1)).await;
        assert!(started.elapsed() >= Duration::from_secs(3));
    }
}
