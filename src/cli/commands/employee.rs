//! Employee roster commands.
//!
//! Roster changes do not trigger an export on their own; the roster dataset
//! is refreshed by the next export run.

use crate::cli::EmployeeCommands;
use crate::error::{Error, Result};
use crate::model::Employee;
use crate::storage::SqliteStorage;
use std::path::PathBuf;

use super::open_storage;

/// Execute employee commands.
///
/// # Errors
///
/// Returns an error if the database is missing or the operation fails.
pub fn execute(command: &EmployeeCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let mut storage = open_storage(db_path)?;

    match command {
        EmployeeCommands::Add {
            code,
            name,
            department,
        } => add(&mut storage, code, name, department.as_deref(), json),
        EmployeeCommands::List { all } => list(&storage, *all, json),
        EmployeeCommands::Deactivate { employee } => {
            set_active(&mut storage, employee, false, json)
        }
        EmployeeCommands::Activate { employee } => set_active(&mut storage, employee, true, json),
    }
}

/// Look up an employee by code or ID.
pub(crate) fn resolve(storage: &SqliteStorage, code_or_id: &str) -> Result<Employee> {
    storage
        .find_employee(code_or_id)?
        .ok_or_else(|| Error::EmployeeNotFound {
            id: code_or_id.to_string(),
        })
}

fn add(
    storage: &mut SqliteStorage,
    code: &str,
    name: &str,
    department: Option<&str>,
    json: bool,
) -> Result<()> {
    let employee = storage.create_employee(code, name, department)?;

    if json {
        println!("{}", serde_json::to_string(&employee)?);
    } else {
        println!(
            "Added employee {} ({}) with ID {}",
            employee.display_name, employee.code, employee.id
        );
    }
    Ok(())
}

fn list(storage: &SqliteStorage, all: bool, json: bool) -> Result<()> {
    let employees = storage.list_employees(all)?;

    if json {
        let output = serde_json::json!({
            "employees": employees,
            "count": employees.len(),
        });
        println!("{output}");
        return Ok(());
    }

    if employees.is_empty() {
        println!("No employees.");
        return Ok(());
    }

    println!("{:<6} {:<10} {:<24} {:<16} {}", "ID", "CODE", "NAME", "DEPARTMENT", "ACTIVE");
    for e in &employees {
        println!(
            "{:<6} {:<10} {:<24} {:<16} {}",
            e.id,
            e.code,
            e.display_name,
            e.department.as_deref().unwrap_or("-"),
            if e.is_active { "yes" } else { "no" }
        );
    }
    Ok(())
}

fn set_active(
    storage: &mut SqliteStorage,
    code_or_id: &str,
    active: bool,
    json: bool,
) -> Result<()> {
    let employee = resolve(storage, code_or_id)?;
    storage.set_employee_active(employee.id, active)?;

    if json {
        let output = serde_json::json!({
            "id": employee.id,
            "code": employee.code,
            "is_active": active,
        });
        println!("{output}");
    } else if active {
        println!("Activated {} ({})", employee.display_name, employee.code);
    } else {
        println!("Deactivated {} ({})", employee.display_name, employee.code);
    }
    Ok(())
}
