//! Report generation and formatting

use std::collections::BTreeMap;

use prettytable::{Table, Row, Cell, format};
use serde_json::json;

use crate::data::records::{Dimension, FinalScore};
use crate::display::ColourManager;
use crate::scoring::Grade;

/// Format a compact table with headers and rows using prettytable-rs clean format
pub fn format_compact_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);

    let header_cells: Vec<Cell> = headers.iter()
        .map(|header| Cell::new(header))
        .collect();
    table.add_row(Row::new(header_cells));

    for row in rows {
        let data_cells: Vec<Cell> = row.iter()
            .map(|cell| Cell::new(cell))
            .collect();
        table.add_row(Row::new(data_cells));
    }

    // 2-space indent under section headings
    let table_output = table.to_string();
    let mut result = String::new();
    for line in table_output.lines() {
        result.push_str("  ");
        result.push_str(line.trim_end());
        result.push('\n');
    }

    result
}

/// Short column headings, in `Dimension::ALL` order
fn dimension_heading(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::CommitQuality => "Quality",
        Dimension::Contribution => "Contrib",
        Dimension::TechBreadth => "Breadth",
        Dimension::Collaboration => "Collab",
        Dimension::CodeReview => "Review",
        Dimension::WorkPattern => "Pattern",
        Dimension::Progress => "Progress",
    }
}

fn score_cell(score: Option<f64>) -> String {
    score.map_or_else(|| "-".to_string(), |s| format!("{:.2}", s))
}

/// Ranked results table; unavailable dimensions show as `-`
pub fn format_results_table(results: &[FinalScore], limit: Option<usize>) -> String {
    let mut headers = vec!["#", "Developer", "Email"];
    headers.extend(Dimension::ALL.iter().map(|d| dimension_heading(*d)));
    headers.extend(["Final", "Grade"]);

    let shown = limit.unwrap_or(results.len()).min(results.len());
    let rows: Vec<Vec<String>> = results
        .iter()
        .take(shown)
        .enumerate()
        .map(|(rank, result)| {
            let mut row = vec![
                (rank + 1).to_string(),
                if result.name.is_empty() { result.username.clone() } else { result.name.clone() },
                result.email.clone(),
            ];
            row.extend(Dimension::ALL.iter().map(|d| score_cell(result.dimension_score(*d))));
            row.push(format!("{:.2}", result.final_score));
            row.push(result.grade_level.clone());
            row
        })
        .collect();

    let mut output = format_compact_table(&headers, &rows);
    if shown < results.len() {
        output.push_str(&format!("  ... {} more developer(s), see final_scores.csv\n", results.len() - shown));
    }
    output
}

/// One line per grade, highest first
pub fn format_grade_distribution(distribution: &BTreeMap<Grade, usize>, colours: &ColourManager) -> String {
    let total: usize = distribution.values().sum();
    let mut output = String::new();
    for grade in Grade::ALL {
        let count = distribution.get(&grade).copied().unwrap_or(0);
        let share = if total > 0 { count as f64 * 100.0 / total as f64 } else { 0.0 };
        output.push_str(&format!(
            "  {} {:>4} ({:>5.1}%)\n",
            colours.grade(&format!("{:<24}", grade.title()), grade),
            count,
            share
        ));
    }
    output
}

fn score_bar(score: f64) -> String {
    let filled = (score.clamp(0.0, 10.0) * 2.0).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(20 - filled))
}

/// Detailed single-developer report with the grade profile
pub fn format_developer_report(result: &FinalScore, rank: usize, total: usize, colours: &ColourManager) -> String {
    let grade = Grade::from_level(&result.grade_level).unwrap_or(Grade::Junior);
    let mut output = String::new();

    let display_name = if result.name.is_empty() { &result.username } else { &result.name };
    output.push_str(&format!("{}\n", colours.highlight(&format!("Developer report: {}", display_name))));
    output.push_str(&format!("  Email:    {}\n", result.email));
    if !result.username.is_empty() {
        output.push_str(&format!("  Username: {}\n", result.username));
    }
    output.push_str(&format!("  Rank:     {} of {}\n\n", rank, total));

    output.push_str("Dimension scores:\n");
    for dimension in Dimension::ALL {
        match result.dimension_score(dimension) {
            Some(score) => output.push_str(&format!(
                "  {:<16} {} {}\n",
                dimension.label(),
                score_bar(score),
                colours.score(score)
            )),
            None => output.push_str(&format!(
                "  {:<16} {}\n",
                dimension.label(),
                colours.muted("no data")
            )),
        }
    }

    output.push_str(&format!(
        "\nFinal score: {} / 10 ({} of {} dimensions)\n",
        colours.score(result.final_score),
        result.available_dimensions(),
        Dimension::ALL.len()
    ));
    output.push_str(&format!("Grade:       {}\n\n", colours.grade(grade.title(), grade)));

    output.push_str("Typical profile:\n");
    for line in grade.description() {
        output.push_str(&format!("  - {}\n", line));
    }
    output
}

/// Find a developer by email, username or name (case-insensitive).
/// Returns the 1-based rank with the result.
pub fn find_developer<'a>(results: &'a [FinalScore], query: &str) -> Option<(usize, &'a FinalScore)> {
    let query = query.trim();
    results
        .iter()
        .enumerate()
        .find(|(_, r)| {
            [&r.email, &r.username, &r.name]
                .iter()
                .any(|field| !field.is_empty() && field.eq_ignore_ascii_case(query))
        })
        .map(|(index, r)| (index + 1, r))
}

/// JSON document for `--format json`
pub fn results_json(results: &[FinalScore], distribution: &BTreeMap<Grade, usize>, limit: Option<usize>) -> serde_json::Value {
    let developers: Vec<serde_json::Value> = results
        .iter()
        .take(limit.unwrap_or(results.len()))
        .map(developer_json)
        .collect();

    json!({
        "developers": developers,
        "total": results.len(),
        "grade_distribution": distribution
            .iter()
            .map(|(grade, count)| (grade.level().to_string(), json!(count)))
            .collect::<serde_json::Map<String, serde_json::Value>>(),
    })
}

/// One developer as JSON; unavailable dimensions are `null`
pub fn developer_json(result: &FinalScore) -> serde_json::Value {
    let scores: serde_json::Map<String, serde_json::Value> = result
        .dimension_scores
        .iter()
        .map(|(dimension, score)| (dimension.key().to_string(), json!(score)))
        .collect();

    json!({
        "email": result.email,
        "username": result.username,
        "name": result.name,
        "scores": scores,
        "final_score": result.final_score,
        "grade": result.grade,
        "grade_level": result.grade_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(email: &str, name: &str, score: f64, level: &str) -> FinalScore {
        FinalScore {
            email: email.to_string(),
            username: email.split('@').next().unwrap_or("").to_string(),
            name: name.to_string(),
            dimension_scores: Dimension::ALL
                .iter()
                .map(|d| (*d, (*d == Dimension::CommitQuality).then_some(score)))
                .collect(),
            final_score: score,
            grade: Grade::from_level(level).map(|g| g.title().to_string()).unwrap_or_default(),
            grade_level: level.to_string(),
        }
    }

    fn colours() -> ColourManager {
        ColourManager::with_colours(false)
    }

    #[test]
    fn test_compact_table_empty() {
        assert_eq!(format_compact_table(&["a"], &[]), "");
    }

    #[test]
    fn test_results_table_limit_and_missing_dimensions() {
        let results = vec![
            result("alice@example.com", "Alice", 8.5, "senior"),
            result("bob@example.com", "", 4.0, "junior"),
        ];
        let table = format_results_table(&results, Some(1));
        assert!(table.contains("Alice"));
        assert!(table.contains("8.50"));
        assert!(table.contains(" - "));
        assert!(!table.contains("bob@example.com"));
        assert!(table.contains("1 more developer(s)"));
    }

    #[test]
    fn test_find_developer_by_any_identifier() {
        let results = vec![
            result("alice@example.com", "Alice", 8.5, "senior"),
            result("bob@example.com", "Bob Li", 4.0, "junior"),
        ];
        assert_eq!(find_developer(&results, "BOB").map(|(rank, _)| rank), Some(2));
        assert_eq!(find_developer(&results, "bob li").map(|(rank, _)| rank), Some(2));
        assert_eq!(find_developer(&results, "Alice@Example.com").map(|(rank, _)| rank), Some(1));
        assert!(find_developer(&results, "carol").is_none());
    }

    #[test]
    fn test_developer_report_lists_profile() {
        let report = format_developer_report(&result("alice@example.com", "Alice", 8.5, "senior"), 1, 3, &colours());
        assert!(report.contains("Rank:     1 of 3"));
        assert!(report.contains("no data"));
        assert!(report.contains("(1 of 7 dimensions)"));
        assert!(report.contains("Works across 3+ tech stacks"));
    }

    #[test]
    fn test_results_json_uses_null_for_missing() {
        let results = vec![result("alice@example.com", "Alice", 8.5, "senior")];
        let mut distribution = BTreeMap::new();
        distribution.insert(Grade::Senior, 1);
        let value = results_json(&results, &distribution, None);

        assert_eq!(value["total"], 1);
        assert_eq!(value["developers"][0]["scores"]["commit_quality"], 8.5);
        assert!(value["developers"][0]["scores"]["progress"].is_null());
        assert_eq!(value["grade_distribution"]["senior"], 1);
    }

    #[test]
    fn test_grade_distribution_lines() {
        let mut distribution = BTreeMap::new();
        distribution.insert(Grade::Senior, 1);
        distribution.insert(Grade::Mid, 1);
        distribution.insert(Grade::Junior, 2);
        let text = format_grade_distribution(&distribution, &colours());
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Senior Engineer"));
        assert!(lines[2].contains("50.0%"));
    }
}
