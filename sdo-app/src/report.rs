use crate::driver::StreamSummary;
use sdo_anomaly::AnomalyRecord;

pub fn format_alert(record: &AnomalyRecord) -> String {
    let when = record
        .timestamp
        .map(|ts| ts.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "⚠️ #{:<5} {:>10}  value {:>12.4}  score {:>10.4} > {:.4}",
        record.index, when, record.value, record.score, record.threshold
    )
}

fn format_stat(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.4}", v))
        .unwrap_or_else(|| "n/a".to_string())
}

pub fn format_summary(source: &str, summary: &StreamSummary) -> String {
    let rate = if summary.points > 0 {
        summary.anomalies.len() as f64 / summary.points as f64 * 100.0
    } else {
        0.0
    };

    let mut lines = vec![
        format!("📊 SDO stream summary for {}", source),
        format!("  points processed    {}", summary.points),
        format!(
            "  anomalies           {} ({:.2}%)",
            summary.anomalies.len(),
            rate
        ),
        format!("  threshold           {:.4}", summary.threshold),
        format!(
            "  adaptations         {} ({} skipped)",
            summary.adaptations, summary.skipped_adaptations
        ),
        format!("  score mean          {}", format_stat(summary.score_mean)),
        format!("  score std dev       {}", format_stat(summary.score_std_dev)),
        format!("  score max           {}", format_stat(summary.score_max)),
        format!("  observers           {}", summary.observers.len()),
    ];

    if let (Some(low), Some(high)) = (
        summary.observers.iter().copied().reduce(f64::min),
        summary.observers.iter().copied().reduce(f64::max),
    ) {
        lines.push(format!("  observer range      {:.4} .. {:.4}", low, high));
    }

    lines.join("\n")
}
