use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::alerts::types::{AlertSeverity, WeatherAlert};

/// Receiver of newly admitted alerts
#[async_trait]
pub trait AlertListener: Send + Sync {
    async fn on_alert(&self, alert: &WeatherAlert) -> Result<()>;

    fn name(&self) -> &str {
        "listener"
    }
}

/// Adapts a synchronous closure into an [`AlertListener`]
pub struct FnListener<F> {
    name: String,
    callback: F,
}

impl<F> FnListener<F>
where
    F: Fn(&WeatherAlert) -> Result<()> + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

#[async_trait]
impl<F> AlertListener for FnListener<F>
where
    F: Fn(&WeatherAlert) -> Result<()> + Send + Sync + 'static,
{
    async fn on_alert(&self, alert: &WeatherAlert) -> Result<()> {
        (self.callback)(alert)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Writes each alert to the log at a level matching its severity
#[derive(Debug, Default)]
pub struct LogListener;

#[async_trait]
impl AlertListener for LogListener {
    async fn on_alert(&self, alert: &WeatherAlert) -> Result<()> {
        match alert.severity {
            AlertSeverity::Low => info!("Weather alert [{}] {}: {}", alert.id, alert.title, alert.message),
            AlertSeverity::Moderate | AlertSeverity::High => {
                warn!("Weather alert [{}] {}: {}", alert.id, alert.title, alert.message)
            }
            AlertSeverity::Extreme => {
                error!("Weather alert [{}] {}: {}", alert.id, alert.title, alert.message)
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Best-effort surface that shows alerts to the user
pub trait AlertDisplay: Send + Sync {
    fn show(&self, alert: &WeatherAlert) -> Result<()>;
}

/// Delivers alerts to listeners one at a time, in registration order.
///
/// Each listener runs to completion (or to its timeout) before the next one
/// starts. A failing or panicking listener is logged and skipped.
#[derive(Clone, Default)]
pub struct NotificationDispatcher {
    listeners: Vec<Arc<dyn AlertListener>>,
    display: Option<Arc<dyn AlertDisplay>>,
    listener_timeout: Option<Duration>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_display(mut self, display: Arc<dyn AlertDisplay>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn set_display(&mut self, display: Option<Arc<dyn AlertDisplay>>) {
        self.display = display;
    }

    pub fn set_listener_timeout(&mut self, timeout: Option<Duration>) {
        self.listener_timeout = timeout;
    }

    /// Returns `false` if this exact listener is already registered
    pub fn register(&mut self, listener: Arc<dyn AlertListener>) -> bool {
        if self.listeners.iter().any(|l| same_listener(l, &listener)) {
            debug!("Listener {} already registered", listener.name());
            return false;
        }
        self.listeners.push(listener);
        true
    }

    pub fn unregister(&mut self, listener: &Arc<dyn AlertListener>) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !same_listener(l, listener));
        before != self.listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub async fn dispatch(&self, alert: &WeatherAlert) {
        for listener in &self.listeners {
            if let Err(e) = self.notify_listener(listener, alert).await {
                warn!(
                    "Listener {} failed for alert {}: {:#}",
                    listener.name(),
                    alert.id,
                    e
                );
            }
        }

        if let Some(display) = &self.display {
            match catch_unwind(AssertUnwindSafe(|| display.show(alert))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!("Display failed for alert {}: {:#}", alert.id, e),
                Err(_) => debug!("Display panicked for alert {}", alert.id),
            }
        }
    }

    /// Runs the listener on its own task so a panic surfaces as an error
    async fn notify_listener(&self, listener: &Arc<dyn AlertListener>, alert: &WeatherAlert) -> Result<()> {
        let task_listener = Arc::clone(listener);
        let task_alert = alert.clone();
        let mut handle = tokio::spawn(async move { task_listener.on_alert(&task_alert).await });

        let joined = match self.listener_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    handle.abort();
                    return Err(anyhow!("timed out after {:?}", limit));
                }
            },
            None => handle.await,
        };

        joined.map_err(|e| anyhow!("listener task failed: {e}"))?
    }
}

fn same_listener(a: &Arc<dyn AlertListener>, b: &Arc<dyn AlertListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
