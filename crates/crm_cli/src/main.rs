//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `crm_core` linkage without the Flutter runtime.
//! - Given a storage file path, print a short summary of the persisted CRM.

use crm_core::{CrmStore, SqliteLocalStorage, StoreConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("crm_core ping={}", crm_core::ping());
    println!("crm_core version={}", crm_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match summarize(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("crm_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn summarize(db_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let storage = SqliteLocalStorage::open(db_path)?;
    let store = CrmStore::open(storage, StoreConfig::default())?;
    let metrics = store.metrics();

    println!(
        "clients={} leads={} opportunities={} tasks={} activities={}",
        store.clients().len(),
        store.leads().len(),
        store.opportunities().len(),
        store.tasks().len(),
        store.activities().len()
    );
    println!(
        "pipeline_value={:.2} active_opportunities={} lead_conversion_rate={}",
        metrics.opportunities.pipeline_value,
        metrics.opportunities.active,
        metrics.leads.conversion_rate
    );
    for stage in store.pipeline_summary().non_empty() {
        println!(
            "stage={} count={} value={:.2}",
            stage.stage, stage.count, stage.value
        );
    }
    println!("backup_file={}", store.export_file_name());
    Ok(())
}
