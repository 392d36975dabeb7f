// Weather alerting engine
//
// - types.rs: alert types, severities and the WeatherAlert record
// - thresholds.rs: per-type thresholds and enablement, persisted via a settings store
// - severity.rs: threshold crossing and severity buckets
// - evaluator.rs: snapshot/forecast -> candidate alerts
// - store.rs: active alerts, dedup, acknowledgement and expiry
// - notifications.rs: listener and display fan-out
// - system.rs: AlertingService, which ties the above together
pub mod clock;
pub mod evaluator;
pub mod notifications;
pub mod severity;
pub mod store;
pub mod system;
pub mod text;
pub mod thresholds;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use evaluator::{AlertTtl, ConditionEvaluator};
pub use notifications::{AlertDisplay, AlertListener, FnListener, LogListener, NotificationDispatcher};
pub use severity::{Direction, MetricFamily, SeverityClassifier};
pub use store::AlertLifecycleStore;
pub use system::{AlertSettings, AlertingService, LifecyclePolicy};
pub use text::{AlertText, BuiltinCatalog, Translator};
pub use thresholds::{ThresholdConfig, ThresholdRegistry};
pub use types::{AlertSeverity, AlertType, WeatherAlert};
