use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use deid_model::{CrosswalkSummary, SourceSummary};

use crate::types::RunResult;

pub fn print_summary(result: &RunResult) {
    if result.dry_run {
        println!("Dry run: nothing was written");
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Rows"),
        header_cell("Unmatched"),
        header_cell("Unparseable"),
        header_cell("Missing columns"),
        header_cell("Output"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);

    let mut total_rows = 0usize;
    let mut total_unmatched = 0usize;
    let mut total_unparseable = 0usize;
    for file in &result.files {
        let report = &file.report;
        total_rows += report.rows;
        total_unmatched += report.unmatched_identifiers;
        total_unparseable += report.unparseable_count();
        let missing = report
            .missing_columns
            .iter()
            .map(|missing| format!("{} ({})", missing.column, missing.role))
            .collect::<Vec<_>>();
        table.add_row(vec![
            Cell::new(file.input.display()),
            Cell::new(report.rows),
            count_cell(report.unmatched_identifiers, Color::Yellow),
            count_cell(report.unparseable_count(), Color::Yellow),
            if missing.is_empty() {
                dim_cell("-")
            } else {
                Cell::new(missing.join(", ")).fg(Color::Yellow)
            },
            match &file.output {
                Some(path) => Cell::new(path.display()).fg(Color::Green),
                None => dim_cell("-"),
            },
        ]);
    }
    for failure in &result.failures {
        table.add_row(vec![
            Cell::new(failure.input.display()).fg(Color::Red),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            Cell::new("failed").fg(Color::Red).add_attribute(Attribute::Bold),
        ]);
    }
    if result.files.len() + result.failures.len() > 1 {
        table.add_row(vec![
            Cell::new("TOTAL")
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold),
            Cell::new(total_rows).add_attribute(Attribute::Bold),
            count_cell(total_unmatched, Color::Yellow).add_attribute(Attribute::Bold),
            count_cell(total_unparseable, Color::Yellow).add_attribute(Attribute::Bold),
            dim_cell("-"),
            dim_cell("-"),
        ]);
    }
    println!("{table}");
    print_unparseable_table(result);
    if !result.failures.is_empty() {
        eprintln!("Errors:");
        for failure in &result.failures {
            eprintln!("- {}: {}", failure.input.display(), failure.error);
        }
    }
}

fn print_unparseable_table(result: &RunResult) {
    let rows: Vec<(String, &String, usize)> = result
        .files
        .iter()
        .flat_map(|file| {
            let input = file.input.display().to_string();
            file.report
                .unparseable
                .iter()
                .filter(|(_, count)| **count > 0)
                .map(move |(column, count)| (input.clone(), column, *count))
        })
        .collect();
    if rows.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Column"),
        header_cell("Unparseable"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for (input, column, count) in rows {
        table.add_row(vec![
            Cell::new(input),
            Cell::new(column),
            count_cell(count, Color::Yellow),
        ]);
    }
    println!();
    println!("Values left empty because they did not match the column's pattern:");
    println!("{table}");
}

/// Prints a crosswalk build summary.
pub fn print_crosswalk_summary(summary: &CrosswalkSummary, fingerprint: &str) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Source"),
        header_cell("File"),
        header_cell("Rows read"),
        header_cell("Duplicates removed"),
        header_cell("Incomplete dropped"),
        header_cell("Entries"),
    ]);
    apply_table_style(&mut table);
    for index in 2..=5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for source in [&summary.token_source, &summary.offset_source]
        .into_iter()
        .flatten()
    {
        table.add_row(source_row(source));
    }
    table.add_row(vec![
        Cell::new("crosswalk")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        count_cell(summary.dropped_by_join, Color::Yellow),
        Cell::new(summary.entries).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    println!(
        "Identifier comparison: {}",
        if summary.compare_numeric {
            "numeric"
        } else {
            "exact"
        }
    );
    println!("Fingerprint: {fingerprint}");
}

fn source_row(source: &SourceSummary) -> Vec<Cell> {
    vec![
        Cell::new(source.kind)
            .fg(Color::Blue)
            .add_attribute(Attribute::Bold),
        Cell::new(&source.name),
        Cell::new(source.rows_read),
        count_cell(source.exact_duplicates_removed, Color::Yellow),
        count_cell(source.incomplete_rows_dropped, Color::Yellow),
        Cell::new(source.entries),
    ]
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
