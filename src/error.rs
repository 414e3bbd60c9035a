//! Error types shared by every planning stage.

use thiserror::Error;

/// Errors and reportable conditions raised while planning deliveries.
///
/// `InvalidInput` and `InvalidMethod` abort the stage that raised them.
/// `CapacityExceeded` and `NoAllocation` are collected in the allocation
/// report instead of aborting the run.
#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown method '{name}', expected one of: {expected}")]
    InvalidMethod { name: String, expected: &'static str },

    #[error(
        "vehicle {vehicle_id} is over capacity with load {load_id}: \
         weight {weight:.2}/{weight_capacity:.2}, boxes {boxes:.2}/{box_capacity:.2}"
    )]
    CapacityExceeded {
        load_id: u32,
        vehicle_id: String,
        weight: f64,
        weight_capacity: f64,
        boxes: f64,
        box_capacity: f64,
    },

    #[error("only {allocated} of {total} orders could be allocated")]
    NoAllocation { allocated: usize, total: usize },

    #[error("no route found: {0}")]
    NoRouteFound(String),

    #[error("no external routing solver is configured")]
    SolverUnavailable,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RoutingError {
    /// Whether the condition is a partial-success report rather than a failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RoutingError::CapacityExceeded { .. }
                | RoutingError::NoAllocation { .. }
                | RoutingError::SolverUnavailable
        )
    }
}

pub type Result<T> = std::result::Result<T, RoutingError>;
