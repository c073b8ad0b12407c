//! Row projection.
//!
//! Turns domain records into flat rows with a natural key and a fixed
//! column order. Projection is pure: the same record always yields the same
//! rows.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::{Employee, Submission};
use crate::sync::dataset::DatasetKind;
use crate::sync::types::{SyncError, SyncResult};

/// One availability line of a submission, flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRow {
    pub submission_id: i64,
    pub year_month: String,
    pub employee_id: i64,
    pub employee_name: String,
    pub target_date: String,
    pub availability: String,
    pub time_range: String,
}

/// One roster entry, flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeRow {
    pub employee_id: i64,
    pub employee_code: String,
    pub display_name: String,
    pub department: String,
    /// `1` when active, `0` otherwise.
    pub is_active: u8,
}

/// A projected row, tagged by dataset kind.
///
/// Field order of the inner structs is the export column order; serde keeps
/// declaration order, which makes the JSON form canonical for hashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Row {
    Submission(SubmissionRow),
    Employee(EmployeeRow),
}

impl Row {
    /// Key matching this row across successive exports of one dataset.
    #[must_use]
    pub fn natural_key(&self) -> String {
        match self {
            Self::Submission(r) => format!("{}:{}", r.submission_id, r.target_date),
            Self::Employee(r) => r.employee_id.to_string(),
        }
    }

    /// Field values in column order.
    #[must_use]
    pub fn fields(&self) -> Vec<String> {
        match self {
            Self::Submission(r) => vec![
                r.submission_id.to_string(),
                r.year_month.clone(),
                r.employee_id.to_string(),
                r.employee_name.clone(),
                r.target_date.clone(),
                r.availability.clone(),
                r.time_range.clone(),
            ],
            Self::Employee(r) => vec![
                r.employee_id.to_string(),
                r.employee_code.clone(),
                r.display_name.clone(),
                r.department.clone(),
                r.is_active.to_string(),
            ],
        }
    }

    /// Whether this row may be written to a dataset of `kind`.
    #[must_use]
    pub fn belongs_to(&self, kind: DatasetKind) -> bool {
        matches!(
            (self, kind),
            (Self::Submission(_), DatasetKind::Submissions(_))
                | (Self::Employee(_), DatasetKind::Employees)
        )
    }
}

/// Map employee ids to display names for submission projection.
#[must_use]
pub fn employee_names(employees: &[Employee]) -> HashMap<i64, String> {
    employees
        .iter()
        .map(|e| (e.id, e.display_name.clone()))
        .collect()
}

/// Project a submission into one row per detail line.
///
/// # Errors
///
/// Rejects a submission with no detail lines, or with two lines for the
/// same target date.
pub fn project_submission(
    submission: &Submission,
    names: &HashMap<i64, String>,
) -> SyncResult<Vec<Row>> {
    let record_id = submission.id.to_string();

    if submission.details.is_empty() {
        return Err(SyncError::Projection {
            record_id,
            reason: "submission has no detail lines".to_string(),
        });
    }

    let employee_name = names
        .get(&submission.employee_id)
        .cloned()
        .unwrap_or_else(|| Employee::fallback_name(submission.employee_id));
    let year_month = submission.year_month.to_string();

    let mut seen = HashSet::with_capacity(submission.details.len());
    let mut rows = Vec::with_capacity(submission.details.len());

    for detail in &submission.details {
        if !seen.insert(detail.target_date) {
            return Err(SyncError::Projection {
                record_id,
                reason: format!("duplicate target date {}", detail.target_date),
            });
        }

        rows.push(Row::Submission(SubmissionRow {
            submission_id: submission.id,
            year_month: year_month.clone(),
            employee_id: submission.employee_id,
            employee_name: employee_name.clone(),
            target_date: detail.target_date.format("%Y-%m-%d").to_string(),
            availability: detail.availability.as_str().to_string(),
            time_range: detail.time_range.clone().unwrap_or_default(),
        }));
    }

    Ok(rows)
}

/// Project a roster entry into exactly one row.
#[must_use]
pub fn project_employee(employee: &Employee) -> Row {
    Row::Employee(EmployeeRow {
        employee_id: employee.id,
        employee_code: employee.code.clone(),
        display_name: employee.display_name.clone(),
        department: employee.department.clone().unwrap_or_default(),
        is_active: u8::from(employee.is_active),
    })
}

/// Sort rows by natural key so output never depends on completion order.
pub fn sort_rows(rows: &mut [Row]) {
    rows.sort_by_cached_key(Row::natural_key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Availability, SubmissionDetail, YearMonth};
    use chrono::NaiveDate;

    fn detail(id: i64, day: u32, availability: Availability, memo: Option<&str>) -> SubmissionDetail {
        SubmissionDetail {
            id,
            target_date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            availability,
            time_range: memo.map(String::from),
        }
    }

    fn submission(id: i64, employee_id: i64, details: Vec<SubmissionDetail>) -> Submission {
        Submission {
            id,
            year_month: "2026-03".parse::<YearMonth>().unwrap(),
            employee_id,
            submitted_at: 0,
            details,
        }
    }

    #[test]
    fn test_project_submission_one_row_per_detail() {
        let names = HashMap::from([(7, "Aiko".to_string())]);
        let sub = submission(
            3,
            7,
            vec![
                detail(1, 2, Availability::Available, Some("09:00-13:00")),
                detail(2, 3, Availability::Unavailable, None),
            ],
        );

        let rows = project_submission(&sub, &names).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].fields(),
            vec!["3", "2026-03", "7", "Aiko", "2026-03-02", "available", "09:00-13:00"]
        );
        assert_eq!(rows[1].fields()[6], "");
        assert_eq!(rows[0].natural_key(), "3:2026-03-02");
    }

    #[test]
    fn test_project_submission_unknown_employee_falls_back() {
        let sub = submission(1, 99, vec![detail(1, 5, Availability::Tentative, None)]);
        let rows = project_submission(&sub, &HashMap::new()).unwrap();
        assert_eq!(rows[0].fields()[3], "employee-99");
    }

    #[test]
    fn test_project_submission_rejects_empty() {
        let sub = submission(4, 1, Vec::new());
        let err = project_submission(&sub, &HashMap::new()).unwrap_err();
        assert!(matches!(err, SyncError::Projection { ref record_id, .. } if record_id == "4"));
    }

    #[test]
    fn test_project_submission_rejects_duplicate_dates() {
        let sub = submission(
            5,
            1,
            vec![
                detail(1, 9, Availability::Available, None),
                detail(2, 9, Availability::Unavailable, None),
            ],
        );
        assert!(project_submission(&sub, &HashMap::new()).is_err());
    }

    #[test]
    fn test_project_employee() {
        let mut employee = Employee::new("E-1".to_string(), "Ben".to_string(), None);
        employee.id = 12;
        employee.is_active = false;

        let row = project_employee(&employee);
        assert_eq!(row.fields(), vec!["12", "E-1", "Ben", "", "0"]);
        assert_eq!(row.natural_key(), "12");
        assert!(row.belongs_to(DatasetKind::Employees));
        assert!(!row.belongs_to(DatasetKind::Submissions("2026-03".parse().unwrap())));
    }

    #[test]
    fn test_sort_rows_by_key() {
        let make = |id| {
            let mut e = Employee::new(format!("E-{id}"), "x".to_string(), None);
            e.id = id;
            project_employee(&e)
        };
        let mut rows = vec![make(3), make(10), make(1)];
        sort_rows(&mut rows);
        let keys: Vec<_> = rows.iter().map(Row::natural_key).collect();
        assert_eq!(keys, vec!["1", "10", "3"]);
    }
}
