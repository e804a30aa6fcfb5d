use egx30_lib::{CleanArtifact, ExtractionArtifact, LoadScriptArtifact, RunSummary};
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Tabled)]
struct StageRow {
    #[tabled(rename = "Stage")]
    stage: &'static str,
    #[tabled(rename = "Artifact")]
    artifact: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn extraction_detail(a: &ExtractionArtifact) -> String {
    if a.skipped.is_empty() {
        format!("{} records", a.records)
    } else {
        format!("{} records, skipped: {}", a.records, a.skipped.join(" "))
    }
}

fn clean_detail(a: &CleanArtifact) -> String {
    format!(
        "{} kept of {} ({} malformed, {} duplicates)",
        a.kept, a.rows_read, a.malformed, a.duplicates
    )
}

fn script_detail(a: &LoadScriptArtifact) -> String {
    format!("{} statements", a.statements)
}

fn build_stage_rows(summary: &RunSummary) -> Vec<StageRow> {
    vec![
        StageRow {
            stage: "extract",
            artifact: summary.extraction.path.display().to_string(),
            detail: extraction_detail(&summary.extraction),
        },
        StageRow {
            stage: "validate",
            artifact: summary.clean.path.display().to_string(),
            detail: clean_detail(&summary.clean),
        },
        StageRow {
            stage: "generate",
            artifact: summary.script.path.display().to_string(),
            detail: script_detail(&summary.script),
        },
    ]
}

pub fn print_run_summary(summary: &RunSummary) {
    println!("{}", Table::new(build_stage_rows(summary)));
    println!(
        "Run {}: {} attempt(s), {}",
        summary.run_date,
        summary.attempts,
        if summary.executed {
            "load script executed"
        } else {
            "load script not executed"
        }
    );
}

/// Stage commands print only the artifact path on stdout so a scheduler can
/// hand it to the next stage; details go to stderr.
pub fn print_extraction(artifact: &ExtractionArtifact) {
    eprintln!("{}", extraction_detail(artifact));
    println!("{}", artifact.path.display());
}

pub fn print_clean(artifact: &CleanArtifact) {
    eprintln!("{}", clean_detail(artifact));
    println!("{}", artifact.path.display());
}

pub fn print_script(artifact: &LoadScriptArtifact) {
    eprintln!("{}", script_detail(artifact));
    println!("{}", artifact.path.display());
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn summary() -> RunSummary {
        let run_date = NaiveDate::from_ymd_opt(2024, 6, 16).unwrap();
        RunSummary {
            run_date,
            attempts: 2,
            extraction: ExtractionArtifact {
                path: PathBuf::from("/tmp/egx30_2024-06-16.csv"),
                run_date,
                records: 8,
                skipped: vec!["ORAS".to_string()],
            },
            clean: CleanArtifact {
                path: PathBuf::from("/tmp/hive_data_2024-06-16.txt"),
                run_date,
                rows_read: 8,
                malformed: 1,
                duplicates: 0,
                kept: 7,
            },
            script: LoadScriptArtifact {
                path: PathBuf::from("/tmp/load_hive_2024-06-16.hql"),
                run_date,
                statements: 7,
            },
            executed: false,
        }
    }

    #[test]
    fn test_build_stage_rows_order() {
        let rows = build_stage_rows(&summary());
        let stages: Vec<_> = rows.iter().map(|r| r.stage).collect();
        assert_eq!(stages, vec!["extract", "validate", "generate"]);
        assert_eq!(rows[1].artifact, "/tmp/hive_data_2024-06-16.txt");
    }

    #[test]
    fn test_extraction_detail_lists_skipped() {
        let s = summary();
        assert_eq!(extraction_detail(&s.extraction), "8 records, skipped: ORAS");
    }

    #[test]
    fn test_extraction_detail_without_skips() {
        let mut s = summary();
        s.extraction.skipped.clear();
        assert_eq!(extraction_detail(&s.extraction), "8 records");
    }

    #[test]
    fn test_clean_detail_counts() {
        assert_eq!(
            clean_detail(&summary().clean),
            "7 kept of 8 (1 malformed, 0 duplicates)"
        );
    }

    #[test]
    fn test_run_summary_json_shape() {
        let value = serde_json::to_value(summary()).unwrap();
        assert_eq!(value["run_date"], "2024-06-16");
        assert_eq!(value["attempts"], 2);
        assert_eq!(value["clean"]["kept"], 7);
        assert_eq!(value["extraction"]["skipped"][0], "ORAS");
    }

    #[test]
    fn test_table_renders_headers() {
        let table = Table::new(build_stage_rows(&summary())).to_string();
        assert!(table.contains("Stage"));
        assert!(table.contains("Artifact"));
        assert!(table.contains("load_hive_2024-06-16.hql"));
    }
}
