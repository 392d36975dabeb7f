use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::alerts::types::WeatherAlert;

/// Owner of the active-alert map.
///
/// Every read prunes first, so nothing handed out is expired or
/// acknowledged. Acknowledged entries stay in the map until the next prune.
#[derive(Debug, Clone)]
pub struct AlertLifecycleStore {
    active: HashMap<String, WeatherAlert>,
    dedup_window: Duration,
}

impl Default for AlertLifecycleStore {
    fn default() -> Self {
        Self::new(Duration::hours(1))
    }
}

impl AlertLifecycleStore {
    pub fn new(dedup_window: Duration) -> Self {
        Self {
            active: HashMap::new(),
            dedup_window,
        }
    }

    pub fn dedup_window(&self) -> Duration {
        self.dedup_window
    }

    /// An active alert of the same type created within the dedup window
    pub fn is_duplicate(&self, candidate: &WeatherAlert, now: DateTime<Utc>) -> bool {
        self.active.values().any(|existing| {
            existing.alert_type == candidate.alert_type
                && existing.is_active_at(now)
                && now - existing.created_at < self.dedup_window
        })
    }

    /// Insert every candidate that is not a duplicate; returns only the ones inserted.
    /// Candidates in the same batch dedup against each other too.
    pub fn admit(&mut self, candidates: Vec<WeatherAlert>, now: DateTime<Utc>) -> Vec<WeatherAlert> {
        let mut admitted = Vec::new();

        for candidate in candidates {
            if self.is_duplicate(&candidate, now) {
                debug!("Suppressing duplicate {} alert", candidate.alert_type);
                continue;
            }
            if self.active.contains_key(&candidate.id) {
                debug!("Suppressing {} alert with taken id {}", candidate.alert_type, candidate.id);
                continue;
            }

            info!(
                "Admitting {} alert {} ({})",
                candidate.alert_type, candidate.id, candidate.severity
            );
            self.active.insert(candidate.id.clone(), candidate.clone());
            admitted.push(candidate);
        }

        admitted
    }

    /// Drop every entry that is expired or acknowledged; returns how many went
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.active.len();
        self.active.retain(|_, alert| alert.is_active_at(now));
        let removed = before - self.active.len();
        if removed > 0 {
            debug!("Pruned {} inactive alert(s)", removed);
        }
        removed
    }

    /// Mark an alert acknowledged.
    ///
    /// Returns `true` when the id is still in the map, including when it was
    /// already acknowledged but not yet pruned, and `false` otherwise.
    pub fn acknowledge(&mut self, id: &str) -> bool {
        match self.active.get_mut(id) {
            Some(alert) => {
                if !alert.acknowledged {
                    info!("Alert acknowledged: {}", id);
                }
                alert.acknowledge();
                true
            }
            None => false,
        }
    }

    /// Acknowledge every currently active alert; returns how many changed
    pub fn acknowledge_all(&mut self, now: DateTime<Utc>) -> usize {
        let mut count = 0;
        for alert in self.active.values_mut() {
            if alert.is_active_at(now) {
                alert.acknowledge();
                count += 1;
            }
        }
        if count > 0 {
            info!("Acknowledged {} alert(s)", count);
        }
        count
    }

    /// Active alerts, most severe first, then newest first
    pub fn list(&mut self, now: DateTime<Utc>) -> Vec<WeatherAlert> {
        self.prune(now);
        let mut alerts: Vec<WeatherAlert> = self.active.values().cloned().collect();
        alerts.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        alerts
    }

    /// Copy of the active alerts for persistence, in no particular order.
    /// Does not prune.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Vec<WeatherAlert> {
        self.active
            .values()
            .filter(|alert| alert.is_active_at(now))
            .cloned()
            .collect()
    }

    /// Replace the map with previously exported alerts, dropping inactive ones
    pub fn restore(&mut self, alerts: Vec<WeatherAlert>, now: DateTime<Utc>) -> usize {
        self.active = alerts
            .into_iter()
            .map(|alert| (alert.id.clone(), alert))
            .collect();
        self.prune(now);
        self.active.len()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
