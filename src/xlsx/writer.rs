use crate::error::Result;
use crate::evaluation::{Standing, TotalsTable};
use crate::model::{EvaluationRow, Player, PlayerId, Totals};
use rust_xlsxwriter::{
    ConditionalFormat3ColorScale, Format, FormatAlign, FormatBorder, Workbook, Worksheet,
};
use std::collections::HashMap;
use std::path::Path;

const ROW_HEADERS: [&str; 11] = [
    "Player", "Points", "Won", "Won Pts", "Lost", "Lost Pts", "Table", "Opp Lost",
    "Opp Lost Pts", "Score", "Remarks",
];

const TOTAL_HEADERS: [&str; 9] = [
    "Player", "Points", "Won", "Won Pts", "Lost", "Lost Pts", "Opp Lost", "Opp Lost Pts", "Score",
];

/// Write a ranked series evaluation to an Excel file
pub fn write_evaluation_to_xlsx(
    standings: &[Standing],
    players: &[Player],
    title: &str,
    path: &Path,
) -> Result<()> {
    let names = player_names(players);
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name(title))?;

    let header_format = header_format();
    let center_format = Format::new().set_align(FormatAlign::Center);

    sheet.set_column_width(0, 6)?; // Pos
    sheet.write_string_with_format(0, 0, "Pos", &header_format)?;
    write_row_headers(sheet, 1, &header_format)?;

    for (idx, standing) in standings.iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet.write_number_with_format(row, 0, standing.position as f64, &center_format)?;
        write_evaluation_row(sheet, row, 1, &standing.row, &names, &center_format)?;
    }

    add_score_scale(sheet, standings.len(), 10)?;

    workbook.save(path)?;
    Ok(())
}

/// Write one sheet per series plus a "Total" sheet
pub fn write_totals_to_xlsx(totals: &TotalsTable, players: &[Player], path: &Path) -> Result<()> {
    let names = player_names(players);
    let mut workbook = Workbook::new();

    let header_format = header_format();
    let center_format = Format::new().set_align(FormatAlign::Center);

    for &series_id in &totals.series_ids {
        let sheet = workbook.add_worksheet();
        sheet.set_name(format!("Series {}", series_id))?;
        write_row_headers(sheet, 0, &header_format)?;

        let rows: Vec<&EvaluationRow> = totals
            .rows
            .iter()
            .filter_map(|t| t.per_series.get(&series_id))
            .collect();
        for (idx, eval) in rows.iter().enumerate() {
            write_evaluation_row(sheet, (idx + 1) as u32, 0, eval, &names, &center_format)?;
        }
        add_score_scale(sheet, rows.len(), 9)?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("Total")?;
    sheet.set_column_width(0, 24)?;
    for (col, header) in TOTAL_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    let left_format = Format::new().set_align(FormatAlign::Left);
    for (idx, total_row) in totals.rows.iter().enumerate() {
        let row = (idx + 1) as u32;
        let name = display_name(&names, total_row.player_id);
        sheet.write_string_with_format(row, 0, &name, &left_format)?;
        write_totals(sheet, row, &total_row.total, &center_format)?;
    }
    add_score_scale(sheet, totals.rows.len(), 8)?;

    workbook.save(path)?;
    Ok(())
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_border_bottom(FormatBorder::Thin)
}

/// Excel limits sheet names to 31 characters
fn sheet_name(title: &str) -> String {
    let name: String = title.chars().filter(|c| !"[]:*?/\\".contains(*c)).take(31).collect();
    if name.is_empty() {
        "Evaluation".to_string()
    } else {
        name
    }
}

fn player_names(players: &[Player]) -> HashMap<PlayerId, &str> {
    players.iter().map(|p| (p.id, p.name.as_str())).collect()
}

/// "Name (id)", or a marker when the player no longer exists
fn display_name(names: &HashMap<PlayerId, &str>, player_id: PlayerId) -> String {
    match names.get(&player_id) {
        Some(name) => format!("{} ({})", name, player_id),
        None => format!("<unknown player> ({})", player_id),
    }
}

fn write_row_headers(sheet: &mut Worksheet, first_col: u16, format: &Format) -> Result<()> {
    sheet.set_column_width(first_col, 24)?;
    sheet.set_column_width(first_col + 10, 24)?;
    for (col, header) in ROW_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, first_col + col as u16, *header, format)?;
    }
    Ok(())
}

fn write_evaluation_row(
    sheet: &mut Worksheet,
    row: u32,
    first_col: u16,
    eval: &EvaluationRow,
    names: &HashMap<PlayerId, &str>,
    format: &Format,
) -> Result<()> {
    let name = display_name(names, eval.player_id);
    sheet.write_string(row, first_col, &name)?;

    let values = [
        eval.points as f64,
        eval.won as f64,
        eval.won_points as f64,
        eval.lost as f64,
        eval.lost_points as f64,
        eval.table_size as f64,
        eval.opponents_lost as f64,
        eval.opponents_lost_points as f64,
        eval.score as f64,
    ];
    for (offset, value) in values.into_iter().enumerate() {
        sheet.write_number_with_format(row, first_col + 1 + offset as u16, value, format)?;
    }

    if !eval.remarks.is_empty() {
        sheet.write_string(row, first_col + 10, &eval.remarks)?;
    }
    Ok(())
}

fn write_totals(sheet: &mut Worksheet, row: u32, totals: &Totals, format: &Format) -> Result<()> {
    let values = [
        totals.points as f64,
        totals.won as f64,
        totals.won_points as f64,
        totals.lost as f64,
        totals.lost_points as f64,
        totals.opponents_lost as f64,
        totals.opponents_lost_points as f64,
        totals.score as f64,
    ];
    for (offset, value) in values.into_iter().enumerate() {
        sheet.write_number_with_format(row, 1 + offset as u16, value, format)?;
    }
    Ok(())
}

/// Red-yellow-green scale over the score column
fn add_score_scale(sheet: &mut Worksheet, row_count: usize, col: u16) -> Result<()> {
    if row_count == 0 {
        return Ok(());
    }

    let scale = ConditionalFormat3ColorScale::new()
        .set_minimum_color("F8696B") // Red
        .set_midpoint_color("FFEB84") // Yellow
        .set_maximum_color("63BE7B"); // Green

    sheet.add_conditional_format(1, col, row_count as u32, col, &scale)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{evaluate_total, rank_rows, SortKey};
    use crate::model::{GameResult, NewPlayer};

    fn rows() -> Vec<EvaluationRow> {
        let mut a = EvaluationRow::from_result(&GameResult::new(1, 1, 50, 7, 3));
        a.table_size = 4;
        a.score = 340;
        let mut b = EvaluationRow::from_result(&GameResult::new(2, 1, 20, 1, 0).with_remarks("late"));
        b.table_size = 3;
        b.score = 210;
        vec![a, b]
    }

    #[test]
    fn test_sheet_name() {
        assert_eq!(sheet_name("Series 1"), "Series 1");
        assert_eq!(sheet_name("a/b"), "ab");
        assert_eq!(sheet_name(""), "Evaluation");
        assert_eq!(sheet_name(&"x".repeat(40)).len(), 31);
    }

    #[test]
    fn test_display_name_unknown_player() {
        let players = vec![NewPlayer::new("Anna").into_player(1)];
        let names = player_names(&players);
        assert_eq!(display_name(&names, 1), "Anna (1)");
        assert_eq!(display_name(&names, 2), "<unknown player> (2)");
    }

    #[test]
    fn test_write_workbooks() {
        let dir = tempfile::tempdir().unwrap();
        let players = vec![NewPlayer::new("Anna").into_player(1)];

        let standings = rank_rows(&rows(), SortKey::Score, false);
        let path = dir.path().join("series.xlsx");
        write_evaluation_to_xlsx(&standings, &players, "Series 1", &path).unwrap();
        assert!(path.exists());

        let totals = evaluate_total(&rows()).unwrap();
        let path = dir.path().join("total.xlsx");
        write_totals_to_xlsx(&totals, &players, &path).unwrap();
        assert!(path.exists());
    }
}
