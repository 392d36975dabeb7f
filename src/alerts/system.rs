use chrono::Duration;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::alerts::{
    clock::{Clock, SystemClock},
    evaluator::{AlertTtl, ConditionEvaluator},
    notifications::{AlertDisplay, AlertListener, NotificationDispatcher},
    store::AlertLifecycleStore,
    text::{AlertText, Translator},
    thresholds::{ThresholdConfig, ThresholdRegistry},
    types::{AlertType, WeatherAlert},
};
use crate::config::store::{SettingsError, SettingsStore};
use crate::weather::{ForecastEntry, WeatherSnapshot};

/// Timing knobs for alert admission and expiry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecyclePolicy {
    pub dedup_window: Duration,
    pub ttl: AlertTtl,
    pub forecast_hours: usize,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            dedup_window: Duration::hours(1),
            ttl: AlertTtl::default(),
            forecast_hours: 24,
        }
    }
}

/// Read-only view of the alert configuration for settings screens
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertSettings {
    pub enabled_types: Vec<AlertType>,
    pub thresholds: BTreeMap<AlertType, ThresholdConfig>,
}

/// Entry point for the alerting engine.
///
/// `check_conditions` passes run one after another under a pass lock. The
/// store lock is released before listeners are notified, so a listener may
/// read `active_alerts` or `acknowledge`, but must not start another
/// `check_conditions` pass.
pub struct AlertingService {
    pass: Mutex<()>,
    registry: RwLock<ThresholdRegistry>,
    store: Mutex<AlertLifecycleStore>,
    dispatcher: RwLock<NotificationDispatcher>,
    evaluator: ConditionEvaluator,
    settings: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
}

impl AlertingService {
    /// Loads thresholds from `settings` (healing them on first run)
    pub fn new(settings: Arc<dyn SettingsStore>, translator: Arc<dyn Translator>) -> Self {
        let registry = ThresholdRegistry::loaded(settings.as_ref());
        info!(
            "Alerting service ready with {} of {} alert types enabled",
            registry.enabled_types().len(),
            AlertType::all().len()
        );

        Self {
            pass: Mutex::new(()),
            registry: RwLock::new(registry),
            store: Mutex::new(AlertLifecycleStore::default()),
            dispatcher: RwLock::new(NotificationDispatcher::new()),
            evaluator: ConditionEvaluator::new(AlertText::new(translator)),
            settings,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_display(mut self, display: Arc<dyn AlertDisplay>) -> Self {
        self.dispatcher.get_mut().set_display(Some(display));
        self
    }

    pub fn with_listener_timeout(mut self, timeout: Option<std::time::Duration>) -> Self {
        self.dispatcher.get_mut().set_listener_timeout(timeout);
        self
    }

    pub fn with_policy(mut self, policy: LifecyclePolicy) -> Self {
        self.evaluator = self
            .evaluator
            .with_ttl(policy.ttl)
            .with_forecast_hours(policy.forecast_hours);
        *self.store.get_mut() = AlertLifecycleStore::new(policy.dedup_window);
        self
    }

    pub async fn register_listener(&self, listener: Arc<dyn AlertListener>) -> bool {
        self.dispatcher.write().await.register(listener)
    }

    pub async fn unregister_listener(&self, listener: &Arc<dyn AlertListener>) -> bool {
        self.dispatcher.write().await.unregister(listener)
    }

    /// Run one evaluation pass and return the alerts it newly admitted.
    /// Re-detections inside the dedup window are not returned or re-notified.
    pub async fn check_conditions(
        &self,
        snapshot: &WeatherSnapshot,
        forecast: Option<&[ForecastEntry]>,
    ) -> Vec<WeatherAlert> {
        let _pass = self.pass.lock().await;
        let now = self.clock.now();

        let candidates = {
            let registry = self.registry.read().await;
            self.evaluator.evaluate(&registry, snapshot, forecast, now)
        };
        let admitted = self.store.lock().await.admit(candidates, now);

        if !admitted.is_empty() {
            // Listeners registered mid-pass only see the next pass
            let dispatcher = self.dispatcher.read().await.clone();
            for alert in &admitted {
                dispatcher.dispatch(alert).await;
            }
        }

        self.store.lock().await.prune(self.clock.now());
        debug!("Evaluation pass admitted {} alert(s)", admitted.len());
        admitted
    }

    pub async fn active_alerts(&self) -> Vec<WeatherAlert> {
        let now = self.clock.now();
        self.store.lock().await.list(now)
    }

    /// Active alerts for persistence; unlike `active_alerts` this neither
    /// prunes nor sorts
    pub async fn export_active(&self) -> Vec<WeatherAlert> {
        let now = self.clock.now();
        self.store.lock().await.snapshot(now)
    }

    /// `false` when the id is not (or no longer) in the active map
    pub async fn acknowledge(&self, id: &str) -> bool {
        self.store.lock().await.acknowledge(id)
    }

    pub async fn acknowledge_all(&self) -> usize {
        let now = self.clock.now();
        let mut store = self.store.lock().await;
        let count = store.acknowledge_all(now);
        store.prune(now);
        count
    }

    pub async fn configure(
        &self,
        alert_type: AlertType,
        threshold: f64,
        enabled: Option<bool>,
    ) -> Result<(), SettingsError> {
        self.registry
            .write()
            .await
            .update(alert_type, threshold, enabled, self.settings.as_ref())
    }

    /// Same as [`configure`](Self::configure) for a type given by name.
    /// Unknown names change nothing and return `Ok(false)`.
    pub async fn configure_named(
        &self,
        name: &str,
        threshold: f64,
        enabled: Option<bool>,
    ) -> Result<bool, SettingsError> {
        self.registry
            .write()
            .await
            .update_named(name, threshold, enabled, self.settings.as_ref())
    }

    pub async fn toggle(&self, alert_type: AlertType, enabled: bool) -> Result<(), SettingsError> {
        self.registry
            .write()
            .await
            .set_enabled(alert_type, enabled, self.settings.as_ref())
    }

    pub async fn settings(&self) -> AlertSettings {
        let registry = self.registry.read().await;
        AlertSettings {
            enabled_types: registry.enabled_types(),
            thresholds: registry.all_configs(),
        }
    }

    /// Re-read thresholds from the settings store
    pub async fn reload_settings(&self) {
        self.registry.write().await.load(self.settings.as_ref());
    }

    /// Seed the active map from a previous export; returns how many survived pruning
    pub async fn restore(&self, alerts: Vec<WeatherAlert>) -> usize {
        let now = self.clock.now();
        self.store.lock().await.restore(alerts, now)
    }
}
