use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use omx_cli::types::{BatchResult, FileOutcome};

pub fn print_summary(result: &BatchResult) {
    if result.total() > 1 {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Input"),
            header_cell("Direction"),
            header_cell("Output"),
            header_cell("Zones"),
            header_cell("Tables"),
            header_cell("Rows"),
            header_cell("Time"),
            header_cell("Status"),
        ]);
        apply_summary_table_style(&mut table);
        for column in 3..=6 {
            align_column(&mut table, column, CellAlignment::Right);
        }
        align_column(&mut table, 7, CellAlignment::Center);
        for outcome in &result.outcomes {
            table.add_row(outcome_row(outcome));
        }
        println!("{table}");
    }
    let line = result.closing_line();
    if result.failed() > 0 {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

fn outcome_row(outcome: &FileOutcome) -> Vec<Cell> {
    let input = Cell::new(outcome.input.display());
    match &outcome.result {
        Ok(report) => vec![
            input,
            Cell::new(report.direction),
            Cell::new(report.destination.display()),
            Cell::new(report.zones),
            Cell::new(report.tables),
            Cell::new(report.rows_copied),
            Cell::new(format!("{:.2}s", report.elapsed.as_secs_f64())),
            Cell::new("✓")
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ],
        Err(err) => vec![
            input,
            dim_cell("-"),
            if err.left_partial_output() {
                Cell::new("partial").fg(Color::Yellow)
            } else {
                dim_cell("-")
            },
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            Cell::new("✗").fg(Color::Red).add_attribute(Attribute::Bold),
        ],
    }
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
