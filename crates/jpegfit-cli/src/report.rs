//! Human-readable output on stdout. Diagnostics go through tracing on stderr.

use jpegfit_core::convert::ConversionReport;

pub fn kilobytes(bytes: u64) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

pub fn print_conversion(report: &ConversionReport) {
    for (input, output) in &report.converted {
        println!("Converted: {} -> {}", input.display(), output.display());
    }
    for (input, reason) in &report.failed {
        println!("Failed: {} ({reason})", input.display());
    }
    println!(
        "{} converted, {} skipped, {} failed",
        report.converted.len(),
        report.skipped.len(),
        report.failed.len()
    );
}
