//! Human-readable batch summaries.

use aspect_sdk::{BatchReport, ReferenceCheck};

pub fn summary_lines(report: &BatchReport) -> Vec<String> {
    let mut lines = vec![
        format!("Successfully calculated: {}", report.succeeded),
        format!("Failed: {}", report.failures.len()),
        format!("Success rate: {:.1}%", report.success_rate()),
    ];

    let methods = report.methods_by_frequency();
    if !methods.is_empty() {
        lines.push("Calculation methods used:".to_string());
        for (method, count) in methods {
            let share = count as f64 * 100.0 / report.succeeded as f64;
            lines.push(format!("  {method:<20} {count:>4} ({share:.1}%)"));
        }
    }

    for failure in &report.failures {
        lines.push(format!("  failed: {} ({}): {}", failure.name, failure.id, failure.error));
    }
    lines
}

pub fn reference_line(check: &ReferenceCheck) -> String {
    let Some(name) = &check.matched else {
        return format!("? {}: not found", check.reference);
    };
    let status = if check.within_tolerance { "ok" } else { "!!" };
    let actual = check
        .actual_deg
        .map(|deg| format!("{deg}°"))
        .unwrap_or_else(|| "none".to_string());
    let diff = check
        .difference_deg
        .map(|diff| format!(" (diff: {diff:.0}°)"))
        .unwrap_or_default();
    let method = check
        .method
        .map(|method| method.as_str())
        .unwrap_or("unknown");
    format!(
        "{status} {name}: {actual} (expected ~{:.0}°){diff} [{method}]",
        check.expected_deg
    )
}
