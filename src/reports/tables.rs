use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use scoreforge_core::consts::MAX_RATING;
use scoreforge_core::{BatchReport, ConfigIssue, Product, Severity, StageStatus, VerticalConfig};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn align_right(table: &mut Table, columns: std::ops::RangeInclusive<usize>) {
    for i in columns {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

pub fn stages(report: &BatchReport) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Stage").add_attribute(Attribute::Bold),
        Cell::new("Status"),
        Cell::new("Processed").fg(Color::Green),
        Cell::new("Skipped"),
        Cell::new("Failed").fg(Color::Red),
        Cell::new("Unrated").fg(Color::Yellow),
        Cell::new("ms"),
    ]);
    align_right(&mut table, 2..=6);

    for stage in &report.stages {
        let status = match &stage.status {
            StageStatus::Completed => Cell::new("ok").fg(Color::Green),
            StageStatus::Failed(reason) => Cell::new(format!("FAILED: {}", reason)).fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(&stage.name).add_attribute(Attribute::Bold),
            status,
            Cell::new(stage.processed),
            Cell::new(stage.skipped),
            Cell::new(stage.failed),
            Cell::new(stage.resolution_failures),
            Cell::new(stage.elapsed_ms),
        ]);
    }
    println!("\n{}", table);
}

pub fn ranking(products: &[Product], score_name: &str, top: usize) {
    let mut ranked: Vec<&Product> = products
        .iter()
        .filter(|p| p.ranking.global_position.is_some())
        .collect();
    ranked.sort_by_key(|p| p.ranking.global_position);

    if ranked.is_empty() {
        println!("No product holds a real {} score.", score_name);
        return;
    }

    let mut table = new_table();
    table.add_row(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Product"),
        Cell::new("Group"),
        Cell::new(score_name).fg(Color::Cyan),
        Cell::new("/20"),
        Cell::new("Group #"),
        Cell::new("Better"),
    ]);
    align_right(&mut table, 3..=5);

    for p in ranked.iter().take(top) {
        let score = p.score(score_name);
        let specialized = match (p.ranking.specialized_position, p.ranking.specialized_count) {
            (Some(pos), count) => format!("{}/{}", pos, count),
            (None, _) => "-".to_string(),
        };
        table.add_row(vec![
            Cell::new(p.ranking.global_position.unwrap_or_default()).add_attribute(Attribute::Bold),
            Cell::new(p.id),
            Cell::new(p.sub_population.as_deref().unwrap_or("-")),
            Cell::new(fmt_opt(score.and_then(|s| s.value))).fg(Color::Cyan),
            Cell::new(
                score
                    .and_then(|s| s.on_20(MAX_RATING))
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(specialized),
            Cell::new(
                p.ranking
                    .global_better
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }
    println!("\n{}", table);
    println!(
        "{} ranked / {} products",
        ranked.len(),
        products.len()
    );
}

pub fn score_details(products: &[Product], vertical: &VerticalConfig) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Product").add_attribute(Attribute::Bold),
        Cell::new("Score"),
        Cell::new("Raw"),
        Cell::new("Relativ").fg(Color::Cyan),
        Cell::new("Virtual"),
        Cell::new("Band"),
    ]);
    align_right(&mut table, 2..=3);

    for p in products {
        for (name, score) in &p.scores {
            let label = vertical
                .attribute(name)
                .map(|a| a.display_name().to_string())
                .unwrap_or_else(|| name.clone());
            let band = if p.best_scores.contains(name) {
                Cell::new("best").fg(Color::Green)
            } else if p.worst_scores.contains(name) {
                Cell::new("worst").fg(Color::Red)
            } else {
                Cell::new("")
            };
            table.add_row(vec![
                Cell::new(p.id),
                Cell::new(label),
                Cell::new(fmt_opt(score.absolute_value())),
                Cell::new(fmt_opt(score.value)).fg(Color::Cyan),
                Cell::new(if score.is_virtual { "yes" } else { "" }),
                band,
            ]);
        }
    }
    println!("\n{}", table);
}

pub fn issues(issues: &[ConfigIssue]) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Severity").add_attribute(Attribute::Bold),
        Cell::new("Subject"),
        Cell::new("Issue"),
    ]);

    for issue in issues {
        let color = match issue.severity {
            Severity::Info => Color::Blue,
            Severity::Warning => Color::Yellow,
            Severity::Error => Color::Red,
        };
        table.add_row(vec![
            Cell::new(issue.severity).fg(color),
            Cell::new(&issue.subject).add_attribute(Attribute::Bold),
            Cell::new(&issue.message),
        ]);
    }
    println!("\n{}", table);
}
