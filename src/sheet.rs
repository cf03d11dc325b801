//! Spreadsheet ingestion.
//!
//! A workbook is an ordered list of named sheets, each a row-major cell grid
//! with no special-cased rows; the grid→chart conversion is what treats row 0
//! as headers and column 0 as labels.

use std::io::Read;

use crate::data::{ChartData, DataValue, Dataset, Paint};
use crate::error::IngestError;
use crate::scheme::random_color;

/// One cell of a sheet grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
}

impl Cell {
    pub fn as_string(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => b.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }

    fn to_data_value(&self) -> DataValue {
        match self {
            // Empty cells chart as zero rather than holes.
            Cell::Empty => DataValue::Num(0.0),
            Cell::Number(n) => DataValue::Num(*n),
            Cell::Bool(b) => DataValue::Num(if *b { 1.0 } else { 0.0 }),
            Cell::Text(s) => match s.trim().parse::<f64>() {
                Ok(n) => DataValue::Num(n),
                Err(_) => DataValue::Text(s.clone()),
            },
        }
    }
}

// Integral numbers print without a trailing ".0" so labels read like the
// sheet showed them.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

pub type Grid = Vec<Vec<Cell>>;

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub grid: Grid,
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn first_sheet(&self) -> Option<&Sheet> {
        self.sheets.first()
    }
}

/// Read CSV into a single-sheet workbook. Numeric-looking fields become
/// number cells so the grid matches what a workbook parser would produce.
pub fn read_csv<R: Read>(reader: R) -> Result<Workbook, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut grid: Grid = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let row = record.iter().map(parse_field).collect();
        grid.push(row);
    }

    Ok(Workbook { sheets: vec![Sheet { name: "Sheet1".to_string(), grid }] })
}

fn parse_field(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(n) => Cell::Number(n),
        Err(_) => Cell::Text(field.to_string()),
    }
}

/// Header row of a grid, stringified.
pub fn headers(grid: &Grid) -> Vec<String> {
    grid.first().map_or_else(Vec::new, |row| row.iter().map(Cell::as_string).collect())
}

/// Convert a grid to chart data: row 0 columns 1.. are dataset labels,
/// column 0 of every later row is the shared label array.
///
/// A grid with fewer than 2 rows or fewer than 2 columns cannot chart and
/// fails without touching caller state.
pub fn chart_data_from_grid(grid: &Grid) -> Result<ChartData, IngestError> {
    if grid.len() < 2 {
        return Err(IngestError::NotEnoughRows);
    }
    let header_row = &grid[0];
    if header_row.len() < 2 {
        return Err(IngestError::NotEnoughRows);
    }

    let rows = &grid[1..];
    let labels: Vec<String> =
        rows.iter().map(|row| row.first().map(Cell::as_string).unwrap_or_default()).collect();

    let mut datasets = Vec::new();
    for col in 1..header_row.len() {
        let header = header_row[col].as_string();
        let label = if header.is_empty() { format!("Dataset {col}") } else { header };
        let data: Vec<DataValue> = rows
            .iter()
            .map(|row| row.get(col).unwrap_or(&Cell::Empty).to_data_value())
            .collect();
        let mut ds = Dataset::new(label, data);
        ds.background_color = Some(Paint::Single(random_color(1.0)));
        ds.border_color = Some(Paint::Single(random_color(1.0)));
        datasets.push(ds);
    }

    Ok(ChartData::new(labels, datasets))
}

/// Chart one sheet of a workbook: the named sheet, or the first when no
/// name is given, optionally re-sliced to a column subset.
pub fn chart_sheet(
    workbook: &Workbook,
    name: Option<&str>,
    columns: Option<&[String]>,
) -> Result<ChartData, IngestError> {
    let sheet = match name {
        Some(name) => workbook
            .sheet(name)
            .ok_or_else(|| IngestError::Workbook(format!("no sheet named {name:?}")))?,
        None => workbook
            .first_sheet()
            .ok_or_else(|| IngestError::Workbook("workbook has no sheets".into()))?,
    };
    match columns {
        Some(names) => chart_data_from_columns(&sheet.grid, names),
        None => chart_data_from_grid(&sheet.grid),
    }
}

/// Re-slice the grid to the named columns (by header lookup, unmatched names
/// silently dropped) and convert the result. Fewer than 2 selected names is
/// a no-op error so the caller never fires its data-loaded callback.
pub fn chart_data_from_columns(grid: &Grid, names: &[String]) -> Result<ChartData, IngestError> {
    if names.len() < 2 {
        return Err(IngestError::SelectionTooSmall(names.len()));
    }
    let header: Vec<String> = headers(grid);
    let indices: Vec<usize> =
        names.iter().filter_map(|name| header.iter().position(|h| h == name)).collect();

    let filtered: Grid = grid
        .iter()
        .map(|row| {
            indices.iter().map(|&i| row.get(i).cloned().unwrap_or(Cell::Empty)).collect()
        })
        .collect();

    chart_data_from_grid(&filtered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: Vec<Vec<&str>>) -> Grid {
        rows.into_iter().map(|row| row.into_iter().map(parse_field).collect()).collect()
    }

    #[test]
    fn test_grid_roundtrip_dimensions() {
        let g = grid(vec![
            vec!["Month", "Sales", "Costs"],
            vec!["Jan", "10", "4"],
            vec!["Feb", "20", "5"],
            vec!["Mar", "30", "6"],
        ]);
        let data = chart_data_from_grid(&g).unwrap();
        assert_eq!(data.labels.len(), g.len() - 1);
        assert_eq!(data.datasets.len(), g[0].len() - 1);
        for ds in &data.datasets {
            assert_eq!(ds.data.len(), data.labels.len());
        }
        assert_eq!(data.labels, vec!["Jan", "Feb", "Mar"]);
        assert_eq!(data.datasets[0].label, "Sales");
        assert_eq!(data.datasets[1].data[2], DataValue::Num(6.0));
    }

    #[test]
    fn test_single_row_fails() {
        let g = grid(vec![vec!["Month", "Sales"]]);
        assert!(matches!(chart_data_from_grid(&g), Err(IngestError::NotEnoughRows)));
    }

    #[test]
    fn test_single_column_fails() {
        let g = grid(vec![vec!["Month"], vec!["Jan"]]);
        assert!(matches!(chart_data_from_grid(&g), Err(IngestError::NotEnoughRows)));
    }

    #[test]
    fn test_empty_cells_chart_as_zero() {
        let g = grid(vec![vec!["Month", "Sales"], vec!["Jan", ""], vec!["Feb", "5"]]);
        let data = chart_data_from_grid(&g).unwrap();
        assert_eq!(data.datasets[0].data, vec![DataValue::Num(0.0), DataValue::Num(5.0)]);
    }

    #[test]
    fn test_blank_header_gets_fallback_label() {
        let g = grid(vec![vec!["Month", ""], vec!["Jan", "1"]]);
        let data = chart_data_from_grid(&g).unwrap();
        assert_eq!(data.datasets[0].label, "Dataset 1");
    }

    #[test]
    fn test_ragged_rows_padded_with_empty() {
        let g = grid(vec![vec!["Month", "Sales", "Costs"], vec!["Jan", "10"]]);
        let data = chart_data_from_grid(&g).unwrap();
        assert_eq!(data.datasets[1].data, vec![DataValue::Num(0.0)]);
    }

    #[test]
    fn test_column_subset() {
        let g = grid(vec![
            vec!["Month", "Sales", "Costs", "Units"],
            vec!["Jan", "10", "4", "100"],
            vec!["Feb", "20", "5", "200"],
        ]);
        let names = vec!["Month".to_string(), "Units".to_string()];
        let data = chart_data_from_columns(&g, &names).unwrap();
        assert_eq!(data.datasets.len(), 1);
        assert_eq!(data.datasets[0].label, "Units");
        assert_eq!(data.datasets[0].data, vec![DataValue::Num(100.0), DataValue::Num(200.0)]);
    }

    #[test]
    fn test_unmatched_column_names_silently_dropped() {
        let g = grid(vec![
            vec!["Month", "Sales", "Costs"],
            vec!["Jan", "10", "4"],
        ]);
        let names =
            vec!["Month".to_string(), "Nope".to_string(), "Costs".to_string()];
        let data = chart_data_from_columns(&g, &names).unwrap();
        assert_eq!(data.datasets.len(), 1);
        assert_eq!(data.datasets[0].label, "Costs");
    }

    #[test]
    fn test_selection_below_two_is_gated() {
        let g = grid(vec![vec!["Month", "Sales"], vec!["Jan", "1"]]);
        let err = chart_data_from_columns(&g, &["Month".to_string()]).unwrap_err();
        assert!(matches!(err, IngestError::SelectionTooSmall(1)));
    }

    #[test]
    fn test_chart_sheet_by_name() {
        let wb = Workbook {
            sheets: vec![
                Sheet { name: "Summary".to_string(), grid: grid(vec![vec!["only one column"]]) },
                Sheet {
                    name: "Data".to_string(),
                    grid: grid(vec![vec!["Month", "Sales"], vec!["Jan", "10"], vec!["Feb", "20"]]),
                },
            ],
        };
        let data = chart_sheet(&wb, Some("Data"), None).unwrap();
        assert_eq!(data.labels, vec!["Jan", "Feb"]);
        assert_eq!(data.datasets[0].label, "Sales");

        assert!(matches!(
            chart_sheet(&wb, Some("Nope"), None),
            Err(IngestError::Workbook(_))
        ));
        // The first sheet cannot chart, so the default selection fails too.
        assert!(matches!(chart_sheet(&wb, None, None), Err(IngestError::NotEnoughRows)));

        let columns = vec!["Month".to_string(), "Sales".to_string()];
        let data = chart_sheet(&wb, Some("Data"), Some(&columns)).unwrap();
        assert_eq!(data.datasets.len(), 1);
    }

    #[test]
    fn test_read_csv_types_cells() {
        let csv = "Month,Sales\nJan,10\nFeb,20.5\n";
        let wb = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(wb.sheet_names(), vec!["Sheet1"]);
        let sheet = wb.first_sheet().unwrap();
        assert_eq!(sheet.grid[0][0], Cell::Text("Month".to_string()));
        assert_eq!(sheet.grid[1][1], Cell::Number(10.0));
        assert_eq!(sheet.grid[2][1], Cell::Number(20.5));
    }

    #[test]
    fn test_number_labels_print_without_decimal_point() {
        assert_eq!(Cell::Number(2023.0).as_string(), "2023");
        assert_eq!(Cell::Number(2.5).as_string(), "2.5");
    }
}
