//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use coacherp_core::{Payment, Student, TeamMember};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single student with their fee summary
    pub fn print_student(&self, student: &Student) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:          {}", student.id);
                println!("Name:        {}", student.name);
                println!("Guardian:    {}", student.guardian_name);
                println!("Contact:     {}", student.contact);
                println!("Email:       {}", student.email);
                println!("Batch:       {}", student.batch);
                println!("Enrolled:    {}", student.enrollment_date.format("%Y-%m-%d"));
                println!("Status:      {}", student.status);
                println!("Total Fees:  ₹{}", student.total_fees);
                println!("Discount:    ₹{}", student.discount);
                println!("Paid:        ₹{}", student.total_paid());
                println!("Balance Due: ₹{}", student.balance_due());
                if !student.payments.is_empty() {
                    println!();
                    println!("── Payments ({}) ──", student.payments.len());
                    for payment in &student.payments {
                        println!(
                            "[{}] ₹{} via {} - {}",
                            payment.date.format("%Y-%m-%d"),
                            payment.amount,
                            payment.mode,
                            payment.id
                        );
                    }
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(student).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", student.id);
            }
        }
    }

    /// Print a list of students
    pub fn print_students(&self, students: &[&Student]) {
        match self.format {
            OutputFormat::Human => {
                if students.is_empty() {
                    println!("No students found.");
                    return;
                }
                for student in students {
                    println!(
                        "{} | {} | {} | {} | due ₹{}",
                        student.id,
                        truncate(&student.name, 25),
                        truncate(&student.batch, 20),
                        student.status,
                        student.balance_due()
                    );
                }
                println!("\n{} student(s)", students.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(students).unwrap());
            }
            OutputFormat::Quiet => {
                for student in students {
                    println!("{}", student.id);
                }
            }
        }
    }

    /// Print a filtered payment ledger
    pub fn print_ledger(&self, student: &Student, payments: &[&Payment]) {
        match self.format {
            OutputFormat::Human => {
                println!("Ledger for: {} - {}", student.id, student.name);
                println!();
                if payments.is_empty() {
                    if student.payments.is_empty() {
                        println!("No payments have been recorded for this student.");
                    } else {
                        println!("No payments match the current filter criteria.");
                    }
                    return;
                }
                for payment in payments {
                    println!(
                        "{} | ₹{} | {} | {}",
                        payment.date.format("%Y-%m-%d"),
                        payment.amount,
                        payment.mode,
                        payment.id
                    );
                }
                println!("\n{} payment(s)", payments.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(payments).unwrap());
            }
            OutputFormat::Quiet => {
                for payment in payments {
                    println!("{}", payment.id);
                }
            }
        }
    }

    /// Print the team roster
    pub fn print_team(&self, members: &[TeamMember]) {
        match self.format {
            OutputFormat::Human => {
                if members.is_empty() {
                    println!("No team members found.");
                    return;
                }
                for member in members {
                    println!("{} | {} | {}", member.id, member.name, member.role);
                }
                println!("\n{} member(s)", members.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(members).unwrap());
            }
            OutputFormat::Quiet => {
                for member in members {
                    println!("{}", member.id);
                }
            }
        }
    }

    /// Print the batch list
    pub fn print_batches(&self, batches: &[String]) {
        match self.format {
            OutputFormat::Human => {
                if batches.is_empty() {
                    println!("No batches found.");
                    return;
                }
                for batch in batches {
                    println!("{}", batch);
                }
                println!("\n{} batch(es)", batches.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(batches).unwrap());
            }
            OutputFormat::Quiet => {
                for batch in batches {
                    println!("{}", batch);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
    }
}
