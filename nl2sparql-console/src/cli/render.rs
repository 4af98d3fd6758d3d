//! Plain-text rendering of console state for the terminal front end.

use nl2sparql_console::app::notices::Notice;
use nl2sparql_console::app::templates::TEMPLATES;
use nl2sparql_console::app::view::{ConsoleViewModel, TokenView};
use nl2sparql_console::domain::activity::{LogRecord, PerfSnapshot, PerfStats};
use nl2sparql_console::domain::knowledge::{OntologyTerm, OntologyTerms, RdfTerm, SelectResults};
use nl2sparql_console::domain::session::{ExplainReport, ValidationReport};
use std::fmt::Write as _;

const MAX_CELL_WIDTH: usize = 48;
const TERM_PREVIEW: usize = 25;

pub fn validation(report: &ValidationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "validation: {}", if report.ok { "ok" } else { "failed" });
    for error in &report.errors {
        let _ = writeln!(out, "  error: {}", error);
    }
    for warning in &report.warnings {
        let _ = writeln!(out, "  warning: {}", warning);
    }
    if !report.used_classes().is_empty() {
        let _ = writeln!(out, "  classes: {}", report.used_classes().join(", "));
    }
    if !report.used_properties().is_empty() {
        let _ = writeln!(out, "  properties: {}", report.used_properties().join(", "));
    }
    out
}

pub fn explain(report: &ExplainReport) -> String {
    let mut out = format!(
        "explain: {} ({} line{})\n",
        report.kind,
        report.line_count,
        if report.line_count == 1 { "" } else { "s" }
    );
    if !report.summary.is_empty() {
        let _ = writeln!(out, "  {}", report.summary);
    }
    if !report.predicates.is_empty() {
        let _ = writeln!(out, "  predicates: {}", report.predicates.join(", "));
    }
    out
}

pub fn token(token: Option<&TokenView>) -> String {
    match token {
        None => "token: none".to_string(),
        Some(token) if token.executable => format!(
            "token: valid for {}s (expires {})",
            token.seconds_remaining,
            token.expires_at.format("%H:%M:%S")
        ),
        Some(token) => format!("token: expired at {}", token.expires_at.format("%H:%M:%S")),
    }
}

pub fn notice(notice: &Notice) -> String {
    format!("[{}] {}", notice.kind, notice.text)
}

fn cell(term: Option<&RdfTerm>) -> String {
    let Some(term) = term else {
        return String::new();
    };
    let mut text = match &term.lang {
        Some(lang) => format!("{}@{}", term.value, lang),
        None => term.value.clone(),
    };
    if text.chars().count() > MAX_CELL_WIDTH {
        text = text.chars().take(MAX_CELL_WIDTH - 1).collect();
        text.push('…');
    }
    text
}

/// Column-aligned table; ASK results print their boolean.
pub fn select(results: &SelectResults) -> String {
    if let Some(answer) = results.boolean {
        return format!("ASK: {}\n", answer);
    }
    let vars = results.vars();
    if vars.is_empty() {
        return "(no columns)\n".to_string();
    }
    let rows: Vec<Vec<String>> = (0..results.row_count())
        .map(|row| {
            vars.iter()
                .map(|var| cell(results.cell(row, var)))
                .collect()
        })
        .collect();
    let widths: Vec<usize> = vars
        .iter()
        .enumerate()
        .map(|(index, var)| {
            rows.iter()
                .map(|row| row[index].chars().count())
                .chain(std::iter::once(var.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = vars
        .iter()
        .zip(&widths)
        .map(|(var, width)| format!("{:<width$}", var, width = *width))
        .collect();
    let _ = writeln!(out, "{}", header.join(" | ").trim_end());
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{:<width$}", value, width = *width))
            .collect();
        let _ = writeln!(out, "{}", line.join(" | ").trim_end());
    }
    let _ = writeln!(out, "({} row{})", rows.len(), if rows.len() == 1 { "" } else { "s" });
    out
}

pub fn logs(records: &[LogRecord]) -> String {
    if records.is_empty() {
        return "no activity recorded\n".to_string();
    }
    let mut out = String::new();
    for (index, record) in records.iter().enumerate() {
        let marker = if record.can_undo() { " [undo]" } else { "" };
        let first_line = record.statement.lines().next().unwrap_or("").trim();
        let _ = writeln!(
            out,
            "#{:<3} {} {:<12} {}{}",
            index, record.timestamp, record.status(), first_line, marker
        );
        if let Some(error) = record.error.as_deref().filter(|e| !e.is_empty()) {
            let _ = writeln!(out, "      error: {}", error);
        }
    }
    out
}

fn stats_line(label: &str, stats: &PerfStats) -> String {
    format!(
        "{:<14} n={:<6} p50={:.1}ms p95={:.1}ms max={:.1}ms",
        label, stats.count, stats.p50_ms, stats.p95_ms, stats.max_ms
    )
}

pub fn perf(snapshot: &PerfSnapshot) -> String {
    let mut out = format!("performance, last {} min\n", snapshot.window_minutes);
    let _ = writeln!(out, "  {}", stats_line("http", &snapshot.http));
    let _ = writeln!(out, "  {}", stats_line("fuseki select", snapshot.fuseki_select()));
    let _ = writeln!(out, "  {}", stats_line("fuseki update", snapshot.fuseki_update()));
    if !snapshot.top_http_paths.is_empty() {
        let _ = writeln!(out, "  top paths:");
        for path in &snapshot.top_http_paths {
            let _ = writeln!(out, "    {:>6}  {}", path.count, path.path);
        }
    }
    out
}

pub fn terms(terms: &OntologyTerms) -> String {
    let mut out = format!(
        "{} classes, {} properties\n",
        terms.classes.len(),
        terms.properties.len()
    );
    let preview = |label: &str, list: &[OntologyTerm]| {
        let names: Vec<&str> = list
            .iter()
            .take(TERM_PREVIEW)
            .map(|term| term.display_label())
            .collect();
        let more = list.len().saturating_sub(TERM_PREVIEW);
        if more > 0 {
            format!("  {}: {} … (+{})\n", label, names.join(", "), more)
        } else {
            format!("  {}: {}\n", label, names.join(", "))
        }
    };
    if !terms.classes.is_empty() {
        out.push_str(&preview("classes", &terms.classes));
    }
    if !terms.properties.is_empty() {
        out.push_str(&preview("properties", &terms.properties));
    }
    out
}

pub fn templates() -> String {
    let mut out = String::new();
    for (index, template) in TEMPLATES.iter().enumerate() {
        let _ = writeln!(out, "{:>2}  {:<6} {}", index, template.kind.as_str(), template.label);
    }
    out
}

/// Full status screen for the interactive console.
pub fn status(view: &ConsoleViewModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "request: {}", view.nl_text);
    let _ = writeln!(out, "statement:\n{}", indent(view.statement.as_str()));
    if let Some(report) = &view.validation {
        out.push_str(&validation(report));
    }
    if let Some(report) = &view.explain {
        out.push_str(&explain(report));
    }
    let _ = writeln!(out, "{}", token(view.token.as_ref()));
    match view.backend_reachable {
        Some(true) => out.push_str("backend: reachable\n"),
        Some(false) => out.push_str("backend: unreachable\n"),
        None => {}
    }
    if !view.busy.is_empty() {
        let busy: Vec<&str> = view.busy.iter().map(|action| action.as_str()).collect();
        let _ = writeln!(out, "in flight: {}", busy.join(", "));
    }
    if let Some(limit) = view.log_limit {
        let undoable = view.undoable_logs().count();
        let _ = writeln!(
            out,
            "activity: {} record(s), limit {}, {} undoable",
            view.logs.len(),
            limit,
            undoable
        );
    }
    if let Some(notice_text) = view.notice.as_ref().map(notice) {
        let _ = writeln!(out, "{}", notice_text);
    }
    out
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_table_aligns_columns() {
        let results: SelectResults = serde_json::from_value(serde_json::json!({
            "head": {"vars": ["person", "name"]},
            "results": {"bindings": [
                {"person": {"type": "uri", "value": "urn:p:1"}, "name": {"type": "literal", "value": "Max", "xml:lang": "de"}},
                {"person": {"type": "uri", "value": "urn:p:22"}}
            ]}
        }))
        .unwrap();

        let table = select(&results);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "person   | name");
        assert_eq!(lines[2], "urn:p:1  | Max@de");
        assert_eq!(lines[3], "urn:p:22 |");
        assert_eq!(lines[4], "(2 rows)");
    }

    #[test]
    fn ask_results_print_boolean() {
        let results = SelectResults {
            boolean: Some(true),
            ..SelectResults::default()
        };
        assert_eq!(select(&results), "ASK: true\n");
    }

    #[test]
    fn logs_mark_undoable_rows() {
        let records: Vec<LogRecord> = vec![serde_json::from_value(serde_json::json!({
            "ts": "2024-05-01T12:00:05Z",
            "status": "applied",
            "sparql": "INSERT DATA {}\n# trailing",
            "undo_sparql": "DELETE DATA {}",
        }))
        .unwrap()];
        let text = logs(&records);
        assert!(text.starts_with("#0"));
        assert!(text.contains("applied"));
        assert!(text.trim_end().ends_with("[undo]"));
        assert!(!text.contains("trailing"));
    }

    #[test]
    fn validation_lists_errors() {
        let report = ValidationReport {
            ok: false,
            errors: vec!["unknown prefix voc".into()],
            ..ValidationReport::default()
        };
        let text = validation(&report);
        assert!(text.starts_with("validation: failed"));
        assert!(text.contains("error: unknown prefix voc"));
    }
}
