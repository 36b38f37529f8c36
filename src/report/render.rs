use std::time::Duration;

use super::recommend::{ServerStatus, recommendations};
use super::summary::RunSummary;

const RULE_WIDTH: usize = 80;

/// Run-level facts the summary cannot derive from the records.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub base_url: String,
    pub server: ServerStatus,
    pub wall_time: Duration,
    pub log_path: Option<String>,
}

fn fixed2(value_x100: u64) -> String {
    format!("{}.{:02}", value_x100 / 100, value_x100 % 100)
}

fn seconds(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f64())
}

fn percent_of(part: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    let scaled = u128::from(part)
        .saturating_mul(10_000)
        .checked_div(u128::from(total))
        .unwrap_or(0);
    u64::try_from(scaled).map_or(u64::MAX, |value| value)
}

/// Final report as console lines.
#[must_use]
pub fn summary_lines(summary: &RunSummary, context: &ReportContext) -> Vec<String> {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        String::new(),
        rule.clone(),
        "📊 COMPREHENSIVE TEST SUMMARY".to_owned(),
        rule.clone(),
    ];

    lines.push(String::new());
    lines.push("🖥️  SERVER STATUS:".to_owned());
    lines.push(match context.server {
        ServerStatus::Responding => format!("   ✅ Server is responding at {}", context.base_url),
        ServerStatus::NotResponding => {
            format!("   ❌ Server is not responding at {}", context.base_url)
        }
        ServerStatus::Unknown => "   ❓ Server status unknown".to_owned(),
    });

    lines.push(String::new());
    lines.push("📈 OVERALL STATISTICS:".to_owned());
    lines.push(format!("   • Total Tests: {}", summary.total));
    lines.push(format!(
        "   • Passed: {} ({}%)",
        summary.passed,
        fixed2(percent_of(summary.passed, summary.total))
    ));
    lines.push(format!(
        "   • Failed: {} ({}%)",
        summary.failed,
        fixed2(percent_of(summary.failed, summary.total))
    ));
    lines.push(format!("   • Total Duration: {}", seconds(context.wall_time)));
    lines.push(format!(
        "   • Average Test Duration: {}",
        seconds(summary.average_duration())
    ));
    let (p50, p90, p99) = summary.duration_percentiles();
    lines.push(format!(
        "   • P50/P90/P99 Duration: {}ms / {}ms / {}ms",
        p50, p90, p99
    ));
    if summary.sink_errors > 0 {
        lines.push(format!(
            "   • Log Write Failures: {}",
            summary.sink_errors
        ));
    }

    if !summary.categories.is_empty() {
        lines.push(String::new());
        lines.push("📋 CATEGORY BREAKDOWN:".to_owned());
        for (name, tally) in &summary.categories {
            lines.push(format!("   {}:", name.to_uppercase()));
            lines.push(format!(
                "     • Tests: {} | Passed: {} | Failed: {}",
                tally.total, tally.passed, tally.failed
            ));
            lines.push(format!(
                "     • Duration: {} (avg: {})",
                seconds(tally.total_duration),
                seconds(tally.average_duration())
            ));
        }
    }

    if !summary.failures.is_empty() {
        lines.push(String::new());
        lines.push("❌ FAILED TESTS DETAIL:".to_owned());
        for (index, failure) in summary.failures.iter().enumerate() {
            lines.push(format!(
                "   {}. {} ({}) | Duration: {}",
                index.saturating_add(1),
                failure.test_name,
                failure.category,
                seconds(failure.duration)
            ));
            lines.push(format!("      Error: {}", failure.reason));
        }
    }

    if !summary.slowest.is_empty() {
        lines.push(String::new());
        lines.push("⏱️  SLOWEST TESTS:".to_owned());
        for (index, test) in summary.slowest.iter().enumerate() {
            lines.push(format!(
                "   {}. {}: {} ({})",
                index.saturating_add(1),
                test.test_name,
                seconds(test.duration),
                test.category
            ));
        }
    }

    lines.push(String::new());
    lines.push("🎯 FINAL RESULT:".to_owned());
    if summary.total == 0 {
        lines.push("   ❓ NO TESTS WERE RUN".to_owned());
    } else if summary.failed == 0 {
        lines.push("   🎉 ALL TESTS PASSED!".to_owned());
    } else {
        lines.push(format!("   ⚠️  {} TEST(S) FAILED", summary.failed));
    }
    lines.push(format!(
        "   📊 Success Rate: {}%",
        fixed2(summary.success_rate_x100())
    ));
    if let Some(path) = context.log_path.as_ref() {
        lines.push(format!("   📝 Detailed log: {}", path));
    }

    let recommendations = recommendations(summary, context.server, &context.base_url);
    if !recommendations.is_empty() {
        lines.push(String::new());
        lines.push("💡 RECOMMENDATIONS:".to_owned());
        for (index, recommendation) in recommendations.iter().enumerate() {
            lines.push(format!("   {}. {}", index.saturating_add(1), recommendation));
        }
    }
    lines.push(rule);
    lines
}

pub fn print_summary(summary: &RunSummary, context: &ReportContext) {
    for line in summary_lines(summary, context) {
        println!("{}", line);
    }
}
