//! Destinations for observed temperature changes.
//!
//! The monitor hands every changed value to a [`MonitoringSink`]. The
//! transport towards an external monitoring dashboard is left to the
//! implementation: the default [`LogSink`] only records the value, closures
//! can be injected directly, and the WebSocket bridge provides a
//! [`DashboardSink`](crate::ws_bridge::DashboardSink).

use std::sync::Arc;

pub trait MonitoringSink: Send + Sync {
    fn send(&self, value: i32);
}

impl<F> MonitoringSink for F
where
    F: Fn(i32) + Send + Sync,
{
    fn send(&self, value: i32) {
        self(value)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl MonitoringSink for LogSink {
    fn send(&self, value: i32) {
        tracing::info!("Sending value to monitor: {}", value);
    }
}

/// Forwards each value to every inner sink in order.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn MonitoringSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn MonitoringSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl MonitoringSink for FanoutSink {
    fn send(&self, value: i32) {
        for sink in &self.sinks {
            sink.send(value);
        }
    }
}
