use crate::types::{EdgeOutcome, ImportCycle, IncludedFile, SkipReason, TraceRun};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Outcome totals over all edges of a run. `skipped` also counts file-level
/// skips.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub resolved: usize,
    pub not_found: usize,
    pub ambiguous: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
    /// Resolved edges that close an import cycle; also counted in `resolved`
    #[serde(default)]
    pub cycles: usize,
}

impl OutcomeCounts {
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// A specifier or file that did not resolve cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<PathBuf>,
    /// `not-found`, `ambiguous`, `cycle` or a skip reason
    pub outcome: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Summary of one trace run for display or serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub files: Vec<IncludedFile>,
    pub seeds: usize,
    pub visited: usize,
    pub counts: OutcomeCounts,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cycles: Vec<ImportCycle>,
}

impl ResolutionReport {
    pub fn new(run: &TraceRun) -> Self {
        let mut counts = OutcomeCounts::default();
        let mut diagnostics = Vec::new();

        for edge in run.log.normalized_edges() {
            let candidates = match &edge.outcome {
                EdgeOutcome::Resolved => {
                    counts.resolved += 1;
                    continue;
                }
                EdgeOutcome::NotFound => {
                    counts.not_found += 1;
                    Vec::new()
                }
                EdgeOutcome::Ambiguous { candidates } => {
                    counts.ambiguous += 1;
                    candidates.clone()
                }
                EdgeOutcome::Skipped { reason } => {
                    *counts.skipped.entry(*reason).or_default() += 1;
                    Vec::new()
                }
            };
            diagnostics.push(Diagnostic {
                file: edge.from().to_path_buf(),
                line: Some(edge.specifier.line),
                column: Some(edge.specifier.column),
                specifier: Some(edge.specifier.raw.clone()),
                target: edge.to.clone(),
                outcome: edge.outcome.label().to_string(),
                candidates,
                detail: None,
            });
        }

        for skip in run.log.file_skips() {
            *counts.skipped.entry(skip.reason).or_default() += 1;
            diagnostics.push(Diagnostic {
                file: skip.path.clone(),
                line: None,
                column: None,
                specifier: None,
                target: None,
                outcome: skip.reason.to_string(),
                candidates: Vec::new(),
                detail: skip.detail.clone(),
            });
        }

        for cycle in run.log.cycles() {
            counts.cycles += 1;
            let closing = run.log.edges().iter().find(|edge| edge.key == cycle.edge);
            diagnostics.push(Diagnostic {
                file: cycle.files.last().cloned().unwrap_or_default(),
                line: closing.map(|edge| edge.specifier.line),
                column: closing.map(|edge| edge.specifier.column),
                specifier: closing.map(|edge| edge.specifier.raw.clone()),
                target: cycle.files.first().cloned(),
                outcome: "cycle".to_string(),
                candidates: Vec::new(),
                detail: Some(cycle.describe()),
            });
        }

        let files = run.inclusion.files().to_vec();
        Self {
            seeds: files.iter().filter(|file| file.seed).count(),
            visited: run.log.visits().len(),
            files,
            counts,
            diagnostics,
            cycles: run.log.cycles().to_vec(),
        }
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str("# Import trace report\n\n");
        md.push_str(&format!(
            "- Files: `{}` (seeds `{}`, visited `{}`)\n",
            self.files.len(),
            self.seeds,
            self.visited
        ));
        md.push_str(&format!(
            "- Edges: resolved `{}`, not found `{}`, ambiguous `{}`, skipped `{}`\n",
            self.counts.resolved,
            self.counts.not_found,
            self.counts.ambiguous,
            self.counts.skipped_total()
        ));
        for (reason, count) in &self.counts.skipped {
            md.push_str(&format!("  - {reason}: `{count}`\n"));
        }
        if self.counts.cycles > 0 {
            md.push_str(&format!("- Import cycles: `{}`\n", self.counts.cycles));
        }
        md.push('\n');

        md.push_str("## Files\n\n");
        md.push_str("| # | depth | seed | path |\n");
        md.push_str("|---:|---:|---|---|\n");
        for (idx, file) in self.files.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {} | `{}` |\n",
                idx + 1,
                file.depth,
                if file.seed { "yes" } else { "" },
                escape_cell(&file.path.display().to_string())
            ));
        }
        md.push('\n');

        if self.diagnostics.is_empty() {
            return md;
        }

        md.push_str("## Diagnostics\n\n");
        md.push_str("| file | line | specifier | outcome | detail |\n");
        md.push_str("|---|---:|---|---|---|\n");
        for diag in &self.diagnostics {
            let location = match (diag.line, diag.column) {
                (Some(line), Some(column)) => format!("{line}:{column}"),
                _ => String::new(),
            };
            let detail = if diag.candidates.is_empty() {
                diag.detail.clone().unwrap_or_default()
            } else {
                diag.candidates
                    .iter()
                    .map(|c| c.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            md.push_str(&format!(
                "| `{}` | {} | `{}` | {} | {} |\n",
                escape_cell(&diag.file.display().to_string()),
                location,
                escape_cell(diag.specifier.as_deref().unwrap_or("")),
                diag.outcome,
                escape_cell(&detail)
            ));
        }
        md.push('\n');
        md
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::types::{
        EdgeKey, EdgeLog, FileSkip, ImportSpecifier, InclusionSet, ResolutionEdge, SpecifierKind,
    };
    use pretty_assertions::assert_eq;

    fn spec(raw: &str, line: usize) -> ImportSpecifier {
        ImportSpecifier {
            raw: raw.to_string(),
            origin: PathBuf::from("/p/main.py"),
            language: Language::Python,
            line,
            column: 6,
            kind: SpecifierKind::DottedModule,
        }
    }

    fn sample_run() -> TraceRun {
        let mut log = EdgeLog::new();
        let mut ok = ResolutionEdge::resolved(spec("util", 1), PathBuf::from("/p/util.py"));
        ok.key = EdgeKey {
            from_depth: 0,
            from_seq: 0,
            ordinal: 0,
        };
        let mut missing = ResolutionEdge::not_found(spec("gone", 2));
        missing.key = EdgeKey {
            from_depth: 0,
            from_seq: 0,
            ordinal: 1,
        };
        let mut os = ResolutionEdge::skipped(spec("os", 3), None, SkipReason::External);
        os.key = EdgeKey {
            from_depth: 0,
            from_seq: 0,
            ordinal: 2,
        };
        log.push_edge(os);
        log.push_edge(missing);
        log.push_edge(ok);
        log.push_cycle(ImportCycle {
            files: vec![PathBuf::from("/p/main.py"), PathBuf::from("/p/util.py")],
            edge: EdgeKey {
                from_depth: 1,
                from_seq: 1,
                ordinal: 0,
            },
        });
        let mut back = ResolutionEdge::resolved(
            ImportSpecifier {
                origin: PathBuf::from("/p/util.py"),
                ..spec("main", 4)
            },
            PathBuf::from("/p/main.py"),
        );
        back.key = EdgeKey {
            from_depth: 1,
            from_seq: 1,
            ordinal: 0,
        };
        log.push_edge(back);
        log.push_file_skip(FileSkip {
            path: PathBuf::from("/p/blob.py"),
            reason: SkipReason::Undecodable,
            detail: Some("invalid utf-8".to_string()),
        });

        let inclusion = InclusionSet::from_entries(vec![
            IncludedFile {
                path: PathBuf::from("/p/main.py"),
                depth: 0,
                seq: 0,
                seed: true,
            },
            IncludedFile {
                path: PathBuf::from("/p/util.py"),
                depth: 1,
                seq: 1,
                seed: false,
            },
        ]);
        TraceRun { inclusion, log }
    }

    #[test]
    fn test_counts_and_diagnostic_order() {
        let report = ResolutionReport::new(&sample_run());
        assert_eq!(report.seeds, 1);
        assert_eq!(report.counts.resolved, 2);
        assert_eq!(report.counts.not_found, 1);
        assert_eq!(report.counts.cycles, 1);
        assert_eq!(report.counts.skipped.get(&SkipReason::External), Some(&1));
        assert_eq!(report.counts.skipped.get(&SkipReason::Undecodable), Some(&1));

        let outcomes: Vec<_> = report.diagnostics.iter().map(|d| d.outcome.as_str()).collect();
        assert_eq!(outcomes, vec!["not-found", "external", "undecodable", "cycle"]);
        assert_eq!(report.diagnostics[0].line, Some(2));
    }

    #[test]
    fn test_cycle_diagnostic_points_at_closing_import() {
        let report = ResolutionReport::new(&sample_run());
        let cycle = report
            .diagnostics
            .iter()
            .find(|d| d.outcome == "cycle")
            .unwrap();
        assert_eq!(cycle.file, PathBuf::from("/p/util.py"));
        assert_eq!(cycle.line, Some(4));
        assert_eq!(cycle.specifier.as_deref(), Some("main"));
        assert_eq!(cycle.target, Some(PathBuf::from("/p/main.py")));
        assert_eq!(
            cycle.detail.as_deref(),
            Some("/p/main.py -> /p/util.py -> /p/main.py")
        );
        assert_eq!(report.cycles.len(), 1);
    }

    #[test]
    fn test_markdown_renders_sections() {
        let md = ResolutionReport::new(&sample_run()).to_markdown();
        assert!(md.starts_with("# Import trace report"));
        assert!(md.contains("- Files: `2` (seeds `1`, visited `0`)"));
        assert!(md.contains("| `/p/main.py` | 2:6 | `gone` | not-found |"));
        assert!(md.contains("  - undecodable: `1`"));
        assert!(md.contains("- Import cycles: `1`"));
        assert!(md.contains("| cycle | /p/main.py -> /p/util.py -> /p/main.py |"));
    }

    #[test]
    fn test_json_uses_kebab_reason_keys() {
        let json = ResolutionReport::new(&sample_run()).to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["counts"]["skipped"]["external"], 1);
        assert_eq!(value["files"][1]["path"], "/p/util.py");
        assert!(value["diagnostics"][0].get("candidates").is_none());
    }
}
