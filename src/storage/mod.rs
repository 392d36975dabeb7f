// Persistence for state that outlives a single run
pub mod alert_state;

// Re-export key types for easier access
pub use alert_state::AlertStateFile;
