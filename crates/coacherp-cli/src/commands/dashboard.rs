//! Dashboard command handler

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;

use coacherp_core::AppStore;

use crate::output::{Output, OutputFormat};

/// Show headline figures, batch distribution, and monthly collections
pub async fn show(store: &Arc<Mutex<AppStore>>, output: &Output) -> Result<()> {
    let store = store.lock().await;
    let stats = store.dashboard_stats();
    let distribution = store.batch_distribution();
    let monthly = store.monthly_collection();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "totalStudents": stats.total_students,
                    "activeStudents": stats.active_students,
                    "feesCollected": stats.total_fees_collected,
                    "outstandingDues": stats.total_fees_due,
                    "batchDistribution": distribution
                        .iter()
                        .map(|(name, count)| serde_json::json!({"batch": name, "students": count}))
                        .collect::<Vec<_>>(),
                    "monthlyCollection": monthly
                        .iter()
                        .map(|(month, fees)| serde_json::json!({"month": month, "fees": fees}))
                        .collect::<Vec<_>>(),
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", stats.total_students);
        }
        OutputFormat::Human => {
            println!("CoachERP Dashboard");
            println!("==================");
            println!();
            println!("Students:");
            println!("  Total:  {}", stats.total_students);
            println!("  Active: {}", stats.active_students);
            println!();
            println!("Fees:");
            println!("  Collected:   ₹{}", stats.total_fees_collected);
            println!("  Outstanding: ₹{}", stats.total_fees_due);

            if !distribution.is_empty() {
                println!();
                println!("Active students by batch:");
                for (batch, count) in &distribution {
                    println!("  {} ({})", batch, count);
                }
            }

            if !monthly.is_empty() {
                println!();
                println!("Monthly collection:");
                for (month, fees) in &monthly {
                    println!("  {}: ₹{}", month, fees);
                }
            }
        }
    }

    Ok(())
}
