//! Data models for CoachERP
//!
//! Defines the core records: Student, Payment, TeamMember, and the AppState
//! aggregate that is persisted as a single JSON document. Field names are
//! serialized in camelCase because the structs double as the wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Enrollment status of a student
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StudentStatus {
    Active,
    Left,
}

impl std::fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StudentStatus::Active => write!(f, "Active"),
            StudentStatus::Left => write!(f, "Left"),
        }
    }
}

/// How a payment was made
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMode {
    Cash,
    Card,
    #[serde(rename = "UPI")]
    Upi,
    Cheque,
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMode::Cash => write!(f, "Cash"),
            PaymentMode::Card => write!(f, "Card"),
            PaymentMode::Upi => write!(f, "UPI"),
            PaymentMode::Cheque => write!(f, "Cheque"),
        }
    }
}

impl std::str::FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMode::Cash),
            "card" => Ok(PaymentMode::Card),
            "upi" => Ok(PaymentMode::Upi),
            "cheque" => Ok(PaymentMode::Cheque),
            _ => Err(format!("Unknown payment mode: {}", s)),
        }
    }
}

/// A single fee payment, append-only child of one student
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Receipt identifier, `PAY<millis>` with a random suffix for batch entries
    pub id: String,
    /// When the payment was recorded
    pub date: DateTime<Utc>,
    /// Amount paid (positive)
    pub amount: f64,
    /// Payment mode
    pub mode: PaymentMode,
    /// Optional encoded receipt image or URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<String>,
}

impl Payment {
    /// Record a new payment, stamped with the current time
    pub fn new(amount: f64, mode: PaymentMode, reference_image: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("PAY{}", now.timestamp_millis()),
            date: now,
            amount,
            mode,
            reference_image,
        }
    }

    /// Record a payment as part of a batch
    ///
    /// Batch entries share a timestamp, so the id gets a random suffix to
    /// keep receipt ids unique within the student's ledger.
    pub fn new_batch_entry(amount: f64, mode: PaymentMode) -> Self {
        let now = Utc::now();
        let id = format!(
            "PAY{}{}",
            now.timestamp_millis(),
            &Uuid::new_v4().simple().to_string()[..5]
        );
        Self {
            id,
            date: now,
            amount,
            mode,
            reference_image: None,
        }
    }
}

/// An enrolled student with their fee ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// Enrollment identifier, format `CE<year><seq>` (e.g. `CE2024001`)
    pub id: String,
    pub name: String,
    pub guardian_name: String,
    pub contact: String,
    pub email: String,
    /// Batch label; a loose reference into the batch list, not enforced
    pub batch: String,
    pub enrollment_date: DateTime<Utc>,
    pub status: StudentStatus,
    /// Gross fees for the course (non-negative)
    pub total_fees: f64,
    /// Discount granted (non-negative, expected at most total_fees)
    pub discount: f64,
    /// Payments in the order they were recorded
    pub payments: Vec<Payment>,
}

impl Student {
    /// Allocate an enrollment id for the next student
    ///
    /// `existing` is the current number of students; `offset` numbers rows
    /// within a bulk import so each gets a distinct sequence.
    pub fn allocate_id(year: i32, existing: usize, offset: usize) -> String {
        format!("CE{}{:03}", year, existing + 1 + offset)
    }

    /// Fees actually owed after discount
    pub fn net_payable(&self) -> f64 {
        self.total_fees - self.discount
    }

    /// Sum of all recorded payments
    pub fn total_paid(&self) -> f64 {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Outstanding balance; negative when overpaid
    ///
    /// Every fee summary in the system (dashboard, ledger, detail views)
    /// must go through this so the figures never drift apart.
    pub fn balance_due(&self) -> f64 {
        self.net_payable() - self.total_paid()
    }
}

/// A staff member; unrelated to students or payments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub role: String,
}

impl TeamMember {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: format!("TM{}", Utc::now().timestamp_millis()),
            name: name.into(),
            role: role.into(),
        }
    }
}

/// The complete persisted surface of the application
///
/// This is the unit of sync: every push writes all of it, every pull may
/// replace all of it. There is no partial sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub students: Vec<Student>,
    pub team_members: Vec<TeamMember>,
    pub batches: Vec<String>,
    /// Encoded image or URL shown in the header
    pub profile_picture: String,
}
