//! Progress events emitted while a launch runs.
//!
//! Events are delivered to a [`ProgressSink`]; the CLI renders them as log
//! lines and tests collect them through a channel or closure.

use std::fmt;

use tokio::sync::mpsc;
use tracing::Level;

use campaign_launcher_core::{AdAccountId, CreativeStage, StoreKey};

/// Which piece of work an event refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitId {
    pub account: AdAccountId,
    pub store: StoreKey,
    /// Creative index within the request, for creative-level events.
    pub creative: Option<usize>,
}

impl UnitId {
    #[must_use]
    pub const fn unit(account: AdAccountId, store: StoreKey) -> Self {
        Self {
            account,
            store,
            creative: None,
        }
    }

    #[must_use]
    pub fn creative(&self, index: usize) -> Self {
        Self {
            creative: Some(index),
            ..self.clone()
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.account, self.store)?;
        if let Some(index) = self.creative {
            write!(f, " / #{}", index + 1)?;
        }
        Ok(())
    }
}

/// Step of the launch an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Whole run; `Succeeded`/`Failed` carries the aggregate report.
    Run,
    /// One (account, store) unit.
    Unit,
    Campaign,
    /// Shared ad set under ABO/CBO.
    SharedAdSet,
    Creative(CreativeStage),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run => f.write_str("run"),
            Self::Unit => f.write_str("unit"),
            Self::Campaign => f.write_str("creating campaign"),
            Self::SharedAdSet => f.write_str("creating shared ad set"),
            Self::Creative(stage) => stage.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventStatus {
    Started,
    Succeeded,
    Failed(String),
}

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// `None` for run-level events.
    pub unit: Option<UnitId>,
    pub phase: Phase,
    pub status: EventStatus,
    /// Extra context: object names, created IDs, report counts.
    pub detail: Option<String>,
}

impl ProgressEvent {
    #[must_use]
    pub const fn new(unit: Option<UnitId>, phase: Phase, status: EventStatus) -> Self {
        Self {
            unit,
            phase,
            status,
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Severity for rendering.
    #[must_use]
    pub const fn level(&self) -> Level {
        match (&self.status, self.phase) {
            (EventStatus::Failed(_), Phase::Run | Phase::Unit) => Level::ERROR,
            (EventStatus::Failed(_), _) => Level::WARN,
            (EventStatus::Started, Phase::Creative(_)) => Level::DEBUG,
            _ => Level::INFO,
        }
    }

    /// Human-readable one-line message.
    #[must_use]
    pub fn message(&self) -> String {
        let mut message = match &self.unit {
            Some(unit) => format!("[{unit}] {}", self.phase),
            None => self.phase.to_string(),
        };
        match &self.status {
            EventStatus::Started => message.push_str(": started"),
            EventStatus::Succeeded => message.push_str(": ok"),
            EventStatus::Failed(reason) => {
                message.push_str(": failed: ");
                message.push_str(reason);
            }
        }
        if let Some(detail) = &self.detail {
            message.push_str(" (");
            message.push_str(detail);
            message.push(')');
        }
        message
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self.status, EventStatus::Failed(_))
    }
}

/// Receiver of progress events.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        self(event);
    }
}

/// Renders events as `tracing` log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn emit(&self, event: ProgressEvent) {
        let message = event.message();
        let level = event.level();
        if level == Level::ERROR {
            tracing::error!(target: "campaign_launcher::progress", "{message}");
        } else if level == Level::WARN {
            tracing::warn!(target: "campaign_launcher::progress", "{message}");
        } else if level == Level::INFO {
            tracing::info!(target: "campaign_launcher::progress", "{message}");
        } else {
            tracing::debug!(target: "campaign_launcher::progress", "{message}");
        }
    }
}

/// Forwards events into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiving end of its channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        // Receiver dropped means nobody is listening any more.
        let _ = self.sender.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn unit() -> UnitId {
        UnitId::unit(
            AdAccountId::parse("42").expect("valid"),
            StoreKey::new("TABO"),
        )
    }

    #[test]
    fn test_message_format() {
        let event = ProgressEvent::new(
            Some(unit().creative(1)),
            Phase::Creative(CreativeStage::CreatingAd),
            EventStatus::Failed("Invalid parameter".to_string()),
        );
        assert_eq!(
            event.message(),
            "[act_42 / TABO / #2] creating ad: failed: Invalid parameter"
        );
        assert_eq!(event.level(), Level::WARN);

        let event = ProgressEvent::new(Some(unit()), Phase::Campaign, EventStatus::Succeeded)
            .with_detail("id 120");
        assert_eq!(event.message(), "[act_42 / TABO] creating campaign: ok (id 120)");
        assert_eq!(event.level(), Level::INFO);
    }

    #[test]
    fn test_unit_failure_is_error() {
        let event = ProgressEvent::new(
            Some(unit()),
            Phase::Unit,
            EventStatus::Failed("boom".to_string()),
        );
        assert_eq!(event.level(), Level::ERROR);
        assert!(event.is_failure());
    }

    #[tokio::test]
    async fn test_channel_sink_delivers_events() {
        let (sink, mut receiver) = ChannelSink::new();
        sink.emit(ProgressEvent::new(None, Phase::Run, EventStatus::Started));
        let event = receiver.recv().await.expect("event");
        assert_eq!(event.phase, Phase::Run);

        drop(receiver);
        sink.emit(ProgressEvent::new(None, Phase::Run, EventStatus::Succeeded));
    }

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |event: ProgressEvent| {
            seen.lock().expect("lock").push(event.message());
        };
        sink.emit(ProgressEvent::new(None, Phase::Run, EventStatus::Started));
        NullSink.emit(ProgressEvent::new(None, Phase::Run, EventStatus::Started));
        assert_eq!(seen.lock().expect("lock").as_slice(), ["run: started"]);
    }
}
