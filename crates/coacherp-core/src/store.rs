//! Local state store
//!
//! The `AppStore` owns the in-memory application state: students, team
//! members, batches, and the profile picture, plus the student currently
//! selected for detail viewing. There is exactly one writer; every
//! operation is synchronous and preserves insertion order.
//!
//! Mutations bump a revision counter. The change observer compares
//! revisions to decide when to schedule a sync push; the store itself
//! never talks to the network.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use tracing::debug;

use crate::models::{AppState, Payment, PaymentMode, Student, StudentStatus, TeamMember};

/// Error returned by store operations that reference a record by id
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Student not found: {0}")]
    StudentNotFound(String),
}

/// Single-writer in-memory application state
#[derive(Debug, Default)]
pub struct AppStore {
    state: AppState,
    selected_student_id: Option<String>,
    revision: u64,
}

impl AppStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with an existing state (e.g. a loaded snapshot)
    pub fn with_state(state: AppState) -> Self {
        Self {
            state,
            selected_student_id: None,
            revision: 0,
        }
    }

    /// Monotonic counter bumped by every mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    // ==================== Students ====================

    pub fn students(&self) -> &[Student] {
        &self.state.students
    }

    pub fn get_student(&self, id: &str) -> Option<&Student> {
        self.state.students.iter().find(|s| s.id == id)
    }

    /// Append a student
    pub fn add_student(&mut self, student: Student) {
        debug!(student_id = %student.id, "Adding student");
        self.state.students.push(student);
        self.touch();
    }

    /// Append a batch of imported students
    pub fn add_students_batch(&mut self, students: Vec<Student>) {
        debug!(count = students.len(), "Adding students in bulk");
        self.state.students.extend(students);
        self.touch();
    }

    /// Replace a student record by id
    ///
    /// The selection is keyed by id, so a selected student stays selected
    /// and dependent views observe the updated record.
    pub fn update_student(&mut self, updated: Student) -> Result<(), StoreError> {
        let slot = self
            .state
            .students
            .iter_mut()
            .find(|s| s.id == updated.id)
            .ok_or_else(|| StoreError::StudentNotFound(updated.id.clone()))?;
        *slot = updated;
        self.touch();
        Ok(())
    }

    /// Allocate the next enrollment id for the current year
    pub fn next_student_id(&self, offset: usize) -> String {
        Student::allocate_id(Utc::now().year(), self.state.students.len(), offset)
    }

    // ==================== Payments ====================

    /// Append a payment to a student's ledger
    pub fn add_payment(
        &mut self,
        student_id: &str,
        amount: f64,
        mode: PaymentMode,
        reference_image: Option<String>,
    ) -> Result<Payment, StoreError> {
        let payment = Payment::new(amount, mode, reference_image);
        self.append_payments(student_id, vec![payment.clone()])?;
        Ok(payment)
    }

    /// Append a batch of payments to a student's ledger
    pub fn add_payments_batch(
        &mut self,
        student_id: &str,
        entries: Vec<(f64, PaymentMode)>,
    ) -> Result<Vec<Payment>, StoreError> {
        let payments: Vec<Payment> = entries
            .into_iter()
            .map(|(amount, mode)| Payment::new_batch_entry(amount, mode))
            .collect();
        self.append_payments(student_id, payments.clone())?;
        Ok(payments)
    }

    fn append_payments(
        &mut self,
        student_id: &str,
        payments: Vec<Payment>,
    ) -> Result<(), StoreError> {
        let student = self
            .state
            .students
            .iter_mut()
            .find(|s| s.id == student_id)
            .ok_or_else(|| StoreError::StudentNotFound(student_id.to_string()))?;
        debug!(student_id, count = payments.len(), "Recording payments");
        student.payments.extend(payments);
        self.touch();
        Ok(())
    }

    // ==================== Selection ====================

    /// Select a student for detail viewing, or clear the selection
    pub fn select_student(&mut self, id: Option<&str>) {
        self.selected_student_id = id.map(|s| s.to_string());
    }

    /// The currently selected student, if any
    ///
    /// Resolved by id on every read, so the selection always reflects the
    /// latest record even after payments were appended.
    pub fn selected_student(&self) -> Option<&Student> {
        self.selected_student_id
            .as_deref()
            .and_then(|id| self.get_student(id))
    }

    // ==================== Team ====================

    pub fn team_members(&self) -> &[TeamMember] {
        &self.state.team_members
    }

    pub fn add_team_member(&mut self, name: impl Into<String>, role: impl Into<String>) -> TeamMember {
        let member = TeamMember::new(name, role);
        self.state.team_members.push(member.clone());
        self.touch();
        member
    }

    pub fn remove_team_member(&mut self, id: &str) {
        self.state.team_members.retain(|m| m.id != id);
        self.touch();
    }

    // ==================== Batches ====================

    pub fn batches(&self) -> &[String] {
        &self.state.batches
    }

    /// Add a batch name; empty or duplicate names are ignored
    pub fn add_batch(&mut self, batch: impl Into<String>) {
        let batch = batch.into();
        if batch.is_empty() || self.state.batches.contains(&batch) {
            return;
        }
        self.state.batches.push(batch);
        self.touch();
    }

    /// Remove a batch name from the list
    ///
    /// Students referencing the batch keep their label; there is no cascade.
    pub fn remove_batch(&mut self, batch: &str) {
        self.state.batches.retain(|b| b != batch);
        self.touch();
    }

    // ==================== Profile ====================

    pub fn profile_picture(&self) -> &str {
        &self.state.profile_picture
    }

    pub fn set_profile_picture(&mut self, picture: impl Into<String>) {
        self.state.profile_picture = picture.into();
        self.touch();
    }

    // ==================== Snapshots ====================

    /// Clone the complete persisted surface
    pub fn snapshot(&self) -> AppState {
        self.state.clone()
    }

    /// Replace the entire state wholesale (used by pull)
    pub fn replace(&mut self, state: AppState) {
        self.state = state;
        self.touch();
    }

    // ==================== Reports ====================

    /// Headline dashboard figures
    pub fn dashboard_stats(&self) -> DashboardStats {
        DashboardStats::compute(&self.state.students)
    }

    /// Active-student head count per batch, in first-seen order
    pub fn batch_distribution(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for student in &self.state.students {
            if student.status != StudentStatus::Active {
                continue;
            }
            match counts.iter_mut().find(|(name, _)| *name == student.batch) {
                Some((_, count)) => *count += 1,
                None => counts.push((student.batch.clone(), 1)),
            }
        }
        counts
    }

    /// Fees collected per month ("Apr 24"), in first-seen order
    pub fn monthly_collection(&self) -> Vec<(String, f64)> {
        let mut totals: Vec<(String, f64)> = Vec::new();
        for student in &self.state.students {
            for payment in &student.payments {
                let month = payment.date.format("%b %y").to_string();
                match totals.iter_mut().find(|(name, _)| *name == month) {
                    Some((_, total)) => *total += payment.amount,
                    None => totals.push((month, payment.amount)),
                }
            }
        }
        totals
    }
}

/// Headline dashboard aggregates
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub total_students: usize,
    pub active_students: usize,
    /// Payments summed across all students, active or not
    pub total_fees_collected: f64,
    /// Outstanding balances of active students, negatives clamped to zero
    pub total_fees_due: f64,
}

impl DashboardStats {
    pub fn compute(students: &[Student]) -> Self {
        let total_students = students.len();
        let active_students = students
            .iter()
            .filter(|s| s.status == StudentStatus::Active)
            .count();
        let total_fees_collected = students.iter().map(|s| s.total_paid()).sum();
        let total_fees_due = students
            .iter()
            .filter(|s| s.status == StudentStatus::Active)
            .map(|s| s.balance_due().max(0.0))
            .sum();
        Self {
            total_students,
            active_students,
            total_fees_collected,
            total_fees_due,
        }
    }
}

/// Criteria for filtering a payment ledger
///
/// Date bounds are inclusive whole days: `from` matches from midnight,
/// `to` matches through the end of that day.
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub mode: Option<PaymentMode>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

impl LedgerFilter {
    fn matches(&self, payment: &Payment) -> bool {
        if let Some(from) = self.from {
            let start = start_of_day(from);
            if payment.date < start {
                return false;
            }
        }
        if let Some(to) = self.to {
            let end = end_of_day(to);
            if payment.date > end {
                return false;
            }
        }
        if let Some(mode) = self.mode {
            if payment.mode != mode {
                return false;
            }
        }
        if let Some(min) = self.min_amount {
            if payment.amount < min {
                return false;
            }
        }
        if let Some(max) = self.max_amount {
            if payment.amount > max {
                return false;
            }
        }
        true
    }
}

/// Filter and sort a student's ledger for presentation
///
/// Storage order is untouched; the result is sorted by date descending.
pub fn filter_ledger<'a>(student: &'a Student, filter: &LedgerFilter) -> Vec<&'a Payment> {
    let mut payments: Vec<&Payment> = student
        .payments
        .iter()
        .filter(|p| filter.matches(p))
        .collect();
    payments.sort_by(|a, b| b.date.cmp(&a.date));
    payments
}

fn start_of_day(dt: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(dt.year(), dt.month(), dt.day(), 0, 0, 0)
        .unwrap()
}

fn end_of_day(dt: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(dt.year(), dt.month(), dt.day(), 23, 59, 59)
        .unwrap()
        + chrono::Duration::milliseconds(999)
}
