// Operation monitoring for schema conversions
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, OnceLock};
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tracing::{info, warn, error, debug};
use uuid::Uuid;

/// Configuration for the monitoring system
#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    pub enable_performance_tracking: bool,
    pub max_completed_operations: usize,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_performance_tracking: true,
            max_completed_operations: 1000,
        }
    }
}

/// Status of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    InProgress,
    Completed,
    Failed,
}

/// Performance metrics for an operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetric {
    pub operation_id: String,
    pub operation_name: String,
    pub status: OperationStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub tables_processed: Option<usize>,
    pub error: Option<String>,
}

/// System statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStats {
    pub active_operations: usize,
    pub completed_operations: usize,
    pub total_operations: usize,
    pub successful_operations: usize,
    pub failed_operations: usize,
    pub avg_duration_ms: f64,
    pub total_tables_processed: u64,
    pub started_at: DateTime<Utc>,
}

/// Tracks a single operation from start to completion
pub struct OperationTracker {
    pub operation_id: String,
    pub operation_name: String,
    pub start_time: DateTime<Utc>,
    monitoring_system: Arc<MonitoringSystem>,
}

impl OperationTracker {
    /// Mark operation as successfully completed
    pub fn complete_success(self, tables_processed: usize) {
        let duration_ms = self.elapsed_ms();

        info!(
            operation_id = %self.operation_id,
            operation_name = %self.operation_name,
            duration_ms = duration_ms,
            tables = tables_processed,
            "Operation completed successfully"
        );

        self.monitoring_system.complete_operation(
            &self.operation_id,
            OperationStatus::Completed,
            duration_ms,
            Some(tables_processed),
            None,
        );
    }

    /// Mark operation as failed
    pub fn complete_failure(self, error: &str) {
        let duration_ms = self.elapsed_ms();

        error!(
            operation_id = %self.operation_id,
            operation_name = %self.operation_name,
            duration_ms = duration_ms,
            error = error,
            "Operation failed"
        );

        self.monitoring_system.complete_operation(
            &self.operation_id,
            OperationStatus::Failed,
            duration_ms,
            None,
            Some(error.to_string()),
        );
    }

    fn elapsed_ms(&self) -> u64 {
        let duration = Utc::now().signed_duration_since(self.start_time);
        duration.num_milliseconds().max(0) as u64
    }
}

/// Main monitoring system
pub struct MonitoringSystem {
    config: MonitoringConfig,
    started_at: DateTime<Utc>,
    active_operations: Mutex<HashMap<String, PerformanceMetric>>,
    completed_operations: Mutex<VecDeque<PerformanceMetric>>,
}

impl MonitoringSystem {
    /// Create a new monitoring system with configuration
    pub fn new(config: MonitoringConfig) -> Self {
        info!("Initializing monitoring system with config: {:?}", config);

        Self {
            config,
            started_at: Utc::now(),
            active_operations: Mutex::new(HashMap::new()),
            completed_operations: Mutex::new(VecDeque::new()),
        }
    }

    /// Start tracking a new operation
    pub fn start_operation(self: &Arc<Self>, operation_name: &str) -> OperationTracker {
        let operation_id = Uuid::new_v4().to_string();
        let start_time = Utc::now();

        if self.config.enable_performance_tracking {
            let metric = PerformanceMetric {
                operation_id: operation_id.clone(),
                operation_name: operation_name.to_string(),
                status: OperationStatus::InProgress,
                start_time,
                end_time: None,
                duration_ms: None,
                tables_processed: None,
                error: None,
            };

            if let Ok(mut active) = self.active_operations.lock() {
                active.insert(operation_id.clone(), metric);
            }
        }

        debug!(
            operation_id = %operation_id,
            operation_name = operation_name,
            "Started operation tracking"
        );

        OperationTracker {
            operation_id,
            operation_name: operation_name.to_string(),
            start_time,
            monitoring_system: Arc::clone(self),
        }
    }

    fn complete_operation(
        &self,
        operation_id: &str,
        status: OperationStatus,
        duration_ms: u64,
        tables_processed: Option<usize>,
        error: Option<String>,
    ) {
        if !self.config.enable_performance_tracking {
            return;
        }

        let metric = match self.active_operations.lock() {
            Ok(mut active) => active.remove(operation_id),
            Err(_) => {
                warn!(operation_id = operation_id, "Failed to lock active operations");
                None
            }
        };

        if let Some(mut metric) = metric {
            metric.status = status;
            metric.end_time = Some(Utc::now());
            metric.duration_ms = Some(duration_ms);
            metric.tables_processed = tables_processed;
            metric.error = error;

            if let Ok(mut completed) = self.completed_operations.lock() {
                completed.push_back(metric);
                while completed.len() > self.config.max_completed_operations {
                    completed.pop_front();
                }
            }
        }
    }

    /// Get system statistics
    pub fn get_system_stats(&self) -> SystemStats {
        let active_count = self
            .active_operations
            .lock()
            .map(|active| active.len())
            .unwrap_or(0);
        let completed_ops: Vec<PerformanceMetric> = match self.completed_operations.lock() {
            Ok(completed) => completed.iter().cloned().collect(),
            Err(_) => {
                warn!("Failed to lock operations for stats");
                Vec::new()
            }
        };

        let successful_operations = completed_ops
            .iter()
            .filter(|op| op.status == OperationStatus::Completed)
            .count();
        let failed_operations = completed_ops
            .iter()
            .filter(|op| op.status == OperationStatus::Failed)
            .count();
        let total_tables_processed = completed_ops
            .iter()
            .filter_map(|op| op.tables_processed)
            .map(|tables| tables as u64)
            .sum();

        let avg_duration_ms = if !completed_ops.is_empty() {
            completed_ops
                .iter()
                .filter_map(|op| op.duration_ms)
                .map(|d| d as f64)
                .sum::<f64>()
                / completed_ops.len() as f64
        } else {
            0.0
        };

        SystemStats {
            active_operations: active_count,
            completed_operations: completed_ops.len(),
            total_operations: active_count + completed_ops.len(),
            successful_operations,
            failed_operations,
            avg_duration_ms,
            total_tables_processed,
            started_at: self.started_at,
        }
    }

    /// Completed operations, optionally filtered by name
    pub fn get_performance_metrics(&self, operation_filter: Option<&str>) -> Vec<PerformanceMetric> {
        match self.completed_operations.lock() {
            Ok(completed) => completed
                .iter()
                .filter(|metric| operation_filter.map_or(true, |filter| metric.operation_name.contains(filter)))
                .cloned()
                .collect(),
            Err(_) => {
                warn!("Failed to lock completed operations for metrics");
                Vec::new()
            }
        }
    }
}

// Global monitoring system instance
static MONITORING_SYSTEM: OnceLock<Arc<MonitoringSystem>> = OnceLock::new();

/// Initialize the global monitoring system; later calls keep the first configuration
pub fn initialize_monitoring(config: MonitoringConfig) {
    if MONITORING_SYSTEM.set(Arc::new(MonitoringSystem::new(config))).is_err() {
        debug!("Monitoring system already initialized");
    }
}

/// Get the global monitoring system, initializing it with defaults if needed
pub fn get_monitoring_system() -> Arc<MonitoringSystem> {
    MONITORING_SYSTEM
        .get_or_init(|| Arc::new(MonitoringSystem::new(MonitoringConfig::default())))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_lifecycle_updates_stats() {
        let system = Arc::new(MonitoringSystem::new(MonitoringConfig::default()));

        let tracker = system.start_operation("parse_table_dbml");
        assert_eq!(system.get_system_stats().active_operations, 1);
        tracker.complete_success(3);

        system.start_operation("dbml_to_table_def").complete_failure("bad input");

        let stats = system.get_system_stats();
        assert_eq!(stats.active_operations, 0);
        assert_eq!(stats.completed_operations, 2);
        assert_eq!(stats.successful_operations, 1);
        assert_eq!(stats.failed_operations, 1);
        assert_eq!(stats.total_tables_processed, 3);

        let failed = system.get_performance_metrics(Some("dbml_to_table_def"));
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].error.as_deref(), Some("bad input"));
    }

    #[test]
    fn test_completed_history_is_bounded() {
        let config = MonitoringConfig {
            max_completed_operations: 2,
            ..MonitoringConfig::default()
        };
        let system = Arc::new(MonitoringSystem::new(config));

        for _ in 0..5 {
            system.start_operation("render").complete_success(1);
        }

        assert_eq!(system.get_system_stats().completed_operations, 2);
    }

    #[test]
    fn test_tracking_disabled() {
        let config = MonitoringConfig {
            enable_performance_tracking: false,
            ..MonitoringConfig::default()
        };
        let system = Arc::new(MonitoringSystem::new(config));

        system.start_operation("render").complete_success(1);

        let stats = system.get_system_stats();
        assert_eq!(stats.total_operations, 0);
    }
}
