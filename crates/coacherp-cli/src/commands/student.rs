//! Student command handlers

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::Mutex;

use coacherp_core::{AppStore, Student, StudentStatus};

use crate::output::Output;

/// Enroll a single student
#[allow(clippy::too_many_arguments)]
pub async fn add(
    store: &Arc<Mutex<AppStore>>,
    name: String,
    guardian: String,
    contact: String,
    email: String,
    batch: String,
    fees: f64,
    discount: f64,
    output: &Output,
) -> Result<()> {
    if fees < 0.0 || discount < 0.0 {
        bail!("Fees and discount must be non-negative");
    }

    let mut store = store.lock().await;
    let student = Student {
        id: store.next_student_id(0),
        name,
        guardian_name: guardian,
        contact,
        email,
        batch,
        enrollment_date: Utc::now(),
        status: StudentStatus::Active,
        total_fees: fees,
        discount,
        payments: Vec::new(),
    };
    store.add_student(student.clone());

    output.success(&format!("Enrolled student: {}", student.id));
    output.print_student(&student);
    Ok(())
}

/// List students, optionally filtered by batch
pub async fn list(
    store: &Arc<Mutex<AppStore>>,
    batch: Option<String>,
    output: &Output,
) -> Result<()> {
    let store = store.lock().await;
    let students: Vec<&Student> = store
        .students()
        .iter()
        .filter(|s| batch.as_deref().map(|b| s.batch == b).unwrap_or(true))
        .collect();

    output.print_students(&students);
    Ok(())
}

/// Show a single student with their ledger
pub async fn show(store: &Arc<Mutex<AppStore>>, id: String, output: &Output) -> Result<()> {
    let store = store.lock().await;
    let student = store
        .get_student(&id)
        .with_context(|| format!("Student not found: {}", id))?;

    output.print_student(student);
    Ok(())
}

/// Change a student's enrollment status
pub async fn set_status(
    store: &Arc<Mutex<AppStore>>,
    id: String,
    status: String,
    output: &Output,
) -> Result<()> {
    let status = match status.to_ascii_lowercase().as_str() {
        "active" => StudentStatus::Active,
        "left" => StudentStatus::Left,
        other => bail!("Unknown status '{}'. Use 'active' or 'left'.", other),
    };

    let mut store = store.lock().await;
    let mut student = store
        .get_student(&id)
        .with_context(|| format!("Student not found: {}", id))?
        .clone();
    student.status = status;
    store.update_student(student)?;

    output.success(&format!("Updated status of {} to {}", id, status));
    Ok(())
}

/// A pre-parsed bulk enrollment row
///
/// Spreadsheet parsing happens outside this tool; import takes a JSON
/// array of records with the wire field names.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportRow {
    name: String,
    guardian_name: String,
    contact: String,
    email: String,
    batch: String,
    #[serde(default)]
    total_fees: f64,
    #[serde(default)]
    discount: f64,
}

/// Bulk-enroll students from a JSON file
pub async fn import(store: &Arc<Mutex<AppStore>>, file: PathBuf, output: &Output) -> Result<()> {
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let rows: Vec<ImportRow> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} as a JSON array of records", file.display()))?;

    if rows.is_empty() {
        bail!("No records found in {}", file.display());
    }

    let mut store = store.lock().await;
    let now = Utc::now();
    let students: Vec<Student> = rows
        .into_iter()
        .enumerate()
        .map(|(offset, row)| Student {
            id: store.next_student_id(offset),
            name: row.name,
            guardian_name: row.guardian_name,
            contact: row.contact,
            email: row.email,
            batch: row.batch,
            enrollment_date: now,
            status: StudentStatus::Active,
            total_fees: row.total_fees,
            discount: row.discount,
            payments: Vec::new(),
        })
        .collect();

    let count = students.len();
    store.add_students_batch(students);

    output.success(&format!("Imported {} student(s)", count));
    Ok(())
}
