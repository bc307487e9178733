//! Terminal output helpers

use colored::Colorize;
use connector_lib::ImportReport;

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a step of the import
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// One line per counter of an import report
pub fn report_lines(report: &ImportReport) -> Vec<String> {
    vec![
        format!(
            "designs: {} uploaded, {} already present",
            report.designs_uploaded, report.designs_skipped
        ),
        format!("design materials: {}", report.design_materials),
        format!("prints: {}", report.prints),
        format!("batches: {}", report.batches),
    ]
}

pub fn format_elapsed(seconds: i64) -> String {
    format!("Imported models in {} seconds", seconds)
}
