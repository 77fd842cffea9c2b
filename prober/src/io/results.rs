//! Result log output: JSON file or console dump.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::types::TaskRecord;

/// Write the result log as pretty JSON (temp file + rename).
pub fn write_results(path: &Path, records: &[TaskRecord]) -> Result<()> {
    write_json_atomic(path, &records)
}

/// Render the result log for the console, one pretty JSON object per record.
pub fn render_results(records: &[TaskRecord]) -> Result<String> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string_pretty(record).context("serialize result")?);
        out.push('\n');
    }
    Ok(out)
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut payload = serde_json::to_string_pretty(value).context("serialize json")?;
    payload.push('\n');
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, payload)
        .with_context(|| format!("write temp output {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace output {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CachedProposal;
    use crate::test_support::{command_result, offer};
    use chrono::{TimeZone, Utc};

    fn record(name: &str) -> TaskRecord {
        let o = offer("0x01", name, 0.1, 0.0, 0.0);
        TaskRecord {
            name: name.to_string(),
            id: o.provider.id.clone(),
            score: Some(0.25),
            result: command_result("GNU Octave, version 8.4.0"),
            proposal: Some(CachedProposal::from(&o)),
            bench: None,
            finished_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn written_file_parses_back() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("out").join("results.json");
        let records = vec![record("nodeA"), record("nodeB")];

        write_results(&path, &records).expect("write");

        let raw = fs::read_to_string(&path).expect("read");
        assert!(raw.ends_with('\n'));
        let parsed: Vec<TaskRecord> = serde_json::from_str(&raw).expect("parse");
        assert_eq!(parsed, records);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn empty_log_is_empty_array() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("results.json");
        write_results(&path, &[]).expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "[]\n");
    }

    #[test]
    fn console_dump_has_one_object_per_record() {
        let text = render_results(&[record("nodeA")]).expect("render");
        assert!(text.contains("\"name\": \"nodeA\""));
        assert!(text.contains("\"score\": 0.25"));
        assert!(!text.contains("\"bench\":"));
    }
}
