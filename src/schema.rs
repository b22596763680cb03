//! Plan output formats.
//!
//! JSON reports carry run metadata alongside the steps. The TSV form is what
//! executors consume: a header line containing `InU`, then one
//! `uniques\ttrials\tinput_offset` row per step.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::plan::{IterationPlan, PlanParams, PlanSequence};

pub const SCHEMA_VERSION: u32 = 1;

pub const TSV_HEADER: &str = "InU\tTrials\tVIn";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub schema_version: u32,
    pub bench_version: String,
    pub timestamp_utc: String,
    pub git_sha: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub step: usize,
    pub uniques: u64,
    pub trials: u64,
    pub input_offset: u64,
    pub operations: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanReport {
    pub run: RunMeta,
    pub params: PlanParams,
    pub steps: Vec<PlanStep>,
}

impl PlanReport {
    pub fn new(run: RunMeta, params: PlanParams, plan: &PlanSequence) -> Self {
        let steps = plan
            .iter()
            .map(|(step, p)| PlanStep {
                step,
                uniques: p.uniques,
                trials: p.trials,
                input_offset: p.input_offset,
                operations: p.operations(),
            })
            .collect();
        Self { run, params, steps }
    }
}

pub fn write_tsv<W: Write>(plan: &PlanSequence, mut writer: W) -> Result<()> {
    writeln!(writer, "{TSV_HEADER}")?;
    for step in plan {
        writeln!(
            writer,
            "{}\t{}\t{}",
            step.uniques, step.trials, step.input_offset
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn parse_field(line: usize, name: &str, raw: Option<&str>) -> Result<u64> {
    let raw = raw.ok_or_else(|| PlanError::MalformedRow {
        line,
        reason: format!("missing {name} column"),
    })?;
    raw.trim().parse().map_err(|e| PlanError::MalformedRow {
        line,
        reason: format!("{name} {raw:?}: {e}"),
    })
}

/// Read a TSV plan back, checking the ordering and offset invariants.
pub fn read_tsv<R: BufRead>(reader: R) -> Result<PlanSequence> {
    let mut steps: Vec<IterationPlan> = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        if line.trim().is_empty() || line.contains("InU") {
            continue;
        }

        let mut cols = line.split('\t');
        let step = IterationPlan {
            uniques: parse_field(line_no, "uniques", cols.next())?,
            trials: parse_field(line_no, "trials", cols.next())?,
            input_offset: parse_field(line_no, "input offset", cols.next())?,
        };
        if cols.next().is_some() {
            return Err(PlanError::MalformedRow {
                line: line_no,
                reason: "expected 3 columns".to_string(),
            });
        }
        if step.uniques == 0 || step.trials == 0 {
            return Err(PlanError::MalformedRow {
                line: line_no,
                reason: "uniques and trials must be positive".to_string(),
            });
        }

        if let Some(prev) = steps.last() {
            if step.uniques <= prev.uniques {
                return Err(PlanError::MalformedRow {
                    line: line_no,
                    reason: format!("uniques {} does not exceed {}", step.uniques, prev.uniques),
                });
            }
            let expected = prev
                .uniques
                .checked_mul(prev.trials)
                .and_then(|ops| prev.input_offset.checked_add(ops));
            if expected != Some(step.input_offset) {
                return Err(PlanError::MalformedRow {
                    line: line_no,
                    reason: format!(
                        "input offset {} does not follow the previous step",
                        step.input_offset
                    ),
                });
            }
        }
        steps.push(step);
    }

    Ok(PlanSequence::from_steps(steps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::build_plan_with;
    use std::fs::File;
    use std::io::{BufReader, BufWriter, Cursor};
    use tempfile::tempdir;

    #[test]
    fn test_tsv_layout() {
        let plan = build_plan_with(0, 3, 1, 0, 3, 1, 2, 0).unwrap();
        let mut buf = Vec::new();
        write_tsv(&plan, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "InU\tTrials\tVIn\n1\t4\t0\n2\t3\t4\n4\t2\t10\n8\t2\t18\n"
        );
    }

    #[test]
    fn test_tsv_file_round_trip() {
        let plan = build_plan_with(0, 12, 8, 2, 10, 3, 12, 500).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("plan.tsv");

        write_tsv(&plan, BufWriter::new(File::create(&path).unwrap())).unwrap();
        let loaded = read_tsv(BufReader::new(File::open(&path).unwrap())).unwrap();

        assert_eq!(loaded, plan);
    }

    #[test]
    fn test_read_skips_headers_and_blank_lines() {
        let text = "InU\tTrials\tVIn\n\n1\t4\t0\n# InU repeated\n2\t3\t4\n";
        let plan = read_tsv(Cursor::new(text)).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.get(2).map(|p| p.input_offset), Some(4));
    }

    #[test]
    fn test_read_rejects_broken_rows() {
        let cases = [
            ("1\t4\n", "missing input offset"),
            ("1\tx\t0\n", "trials"),
            ("1\t4\t0\t9\n", "expected 3 columns"),
            ("1\t0\t0\n", "must be positive"),
            ("2\t4\t0\n2\t4\t8\n", "does not exceed"),
            ("1\t4\t0\n2\t3\t5\n", "does not follow"),
        ];
        for (text, needle) in cases {
            match read_tsv(Cursor::new(text)) {
                Err(PlanError::MalformedRow { reason, .. }) => {
                    assert!(reason.contains(needle), "{text:?}: {reason}")
                }
                other => panic!("{text:?}: expected malformed row, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_report_steps() {
        let params = PlanParams {
            lg_min_u: 0,
            lg_max_u: 3,
            u_ppo: 1,
            lg_min_bp_u: 0,
            lg_max_bp_u: 3,
            lg_min_t: 1,
            lg_max_t: 2,
            start_offset: 0,
        };
        let plan = crate::plan::build_plan(&params).unwrap();
        let report = PlanReport::new(
            RunMeta {
                schema_version: SCHEMA_VERSION,
                bench_version: "test".to_string(),
                timestamp_utc: "unix:0".to_string(),
                git_sha: None,
            },
            params,
            &plan,
        );

        assert_eq!(report.steps.len(), 4);
        assert_eq!(
            report.steps[1],
            PlanStep {
                step: 2,
                uniques: 2,
                trials: 3,
                input_offset: 4,
                operations: 6,
            }
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["params"]["u_ppo"], 1);
        assert_eq!(json["steps"][3]["input_offset"], 18);
    }
}
