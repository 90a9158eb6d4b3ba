// 📤 Summary Export - CSV view of the rebuilt summary records

use crate::summary::SummaryRecord;
use anyhow::{Context, Result};
use std::path::Path;

/// Write summary records to a CSV file, display-formatted the way the
/// summary sheet shows them. Returns the number of data rows written.
pub fn export_summary_to_csv(records: &[SummaryRecord], path: &Path) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV at {}", path.display()))?;

    writer.write_record(["User", "Month", "Completion Rate", "Charges"])?;

    for record in records {
        let rate = record.rate_display();
        let charge = record.charge_display();
        writer.write_record([
            record.user.as_str(),
            record.period.as_str(),
            rate.as_str(),
            charge.as_str(),
        ])?;
    }

    writer.flush().context("Failed to flush CSV")?;
    Ok(records.len())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_records() -> Vec<SummaryRecord> {
        vec![
            SummaryRecord {
                user: "Alice".to_string(),
                period: "Jan24".to_string(),
                completion_rate: Some(2.0 / 3.0),
                charge: 3.0,
            },
            SummaryRecord {
                user: "Ben".to_string(),
                period: "Jan24".to_string(),
                completion_rate: None,
                charge: 0.0,
            },
        ]
    }

    #[test]
    fn test_export_summary_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");

        let written = export_summary_to_csv(&test_records(), &path).unwrap();
        assert_eq!(written, 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "User,Month,Completion Rate,Charges");
        assert_eq!(lines[1], "Alice,Jan24,66.7%,£3.00");
        assert_eq!(lines[2], "Ben,Jan24,n/a,£0.00");
    }

    #[test]
    fn test_export_empty_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");

        let written = export_summary_to_csv(&[], &path).unwrap();
        assert_eq!(written, 0);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1); // header only
    }
}
