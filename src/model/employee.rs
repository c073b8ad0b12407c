//! Employee model for shiftx.
//!
//! Employees form the roster dataset and provide display names for
//! submission rows.

use serde::{Deserialize, Serialize};

/// An employee on the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Numeric identifier assigned by the data layer
    pub id: i64,

    /// Human-facing employee code (e.g., "E-0042"), unique
    pub code: String,

    /// Name shown in exports
    pub display_name: String,

    /// Optional department label
    pub department: Option<String>,

    /// Whether the employee is currently active
    pub is_active: bool,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
}

impl Employee {
    /// Create a new active employee. The id is assigned on insert.
    pub fn new(code: String, display_name: String, department: Option<String>) -> Self {
        Self {
            id: 0,
            code,
            display_name,
            department,
            is_active: true,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Label used when a submission references an id missing from the roster.
    #[must_use]
    pub fn fallback_name(id: i64) -> String {
        format!("employee-{id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_employee_is_active() {
        let employee = Employee::new("E-1".to_string(), "Aiko".to_string(), None);
        assert!(employee.is_active);
        assert_eq!(employee.id, 0);
    }

    #[test]
    fn test_fallback_name() {
        assert_eq!(Employee::fallback_name(17), "employee-17");
    }
}
