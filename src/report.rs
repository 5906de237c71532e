use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use tracing::info;

use crate::config::HEADER_COLOR;
use crate::error::Result;
use crate::types::QualifyingMatch;

pub const SHEET_NAME: &str = "Jogos 0x0";

pub const COLUMNS: [&str; 10] = [
    "Competição",
    "Time Casa",
    "Placar Casa",
    "Time Visitante",
    "Placar Visitante",
    "Tempo Jogo",
    "Minutos",
    "Status",
    "Data",
    "Hora",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    Written(usize),
    /// Nothing qualified this cycle; the previous file is left alone.
    Skipped,
}

enum Cell {
    Text(String),
    Number(u32),
}

fn row_cells(m: &QualifyingMatch) -> [Cell; 10] {
    [
        Cell::Text(m.competition.clone()),
        Cell::Text(m.home_team.clone()),
        Cell::Number(m.home_score),
        Cell::Text(m.away_team.clone()),
        Cell::Number(m.away_score),
        Cell::Text(m.time.display.clone()),
        Cell::Number(m.time.minutes),
        Cell::Text(m.status.to_string()),
        Cell::Text(m.capture_date()),
        Cell::Text(m.capture_time()),
    ]
}

/// Writes the cycle's qualifying matches to a styled xlsx file, replacing the
/// previous one.
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The workbook goes to `<path>.tmp` first and is renamed over `<path>`,
    /// so an interrupted write never leaves a truncated report behind.
    pub async fn write(&self, matches: &[QualifyingMatch]) -> Result<ReportOutcome> {
        if matches.is_empty() {
            info!("No qualifying matches, report not written");
            return Ok(ReportOutcome::Skipped);
        }

        let buf = render(matches)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &buf).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        info!(
            rows = matches.len(),
            "Report saved to '{}'",
            self.path.display()
        );
        Ok(ReportOutcome::Written(matches.len()))
    }
}

/// Serialize the report to xlsx bytes.
pub fn render(matches: &[QualifyingMatch]) -> Result<Vec<u8>> {
    let header = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_font_size(11)
        .set_background_color(Color::RGB(HEADER_COLOR))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin);
    let body = Format::new()
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        for (col, title) in COLUMNS.iter().enumerate() {
            let col = col as u16;
            sheet.write_string_with_format(0, col, *title, &header)?;
            let width = (title.chars().count() + 2).max(15);
            sheet.set_column_width(col, width as f64)?;
        }

        for (i, m) in matches.iter().enumerate() {
            let row = i as u32 + 1;
            for (col, cell) in row_cells(m).into_iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::Text(s) => sheet.write_string_with_format(row, col, s, &body)?,
                    Cell::Number(n) => sheet.write_number_with_format(row, col, n, &body)?,
                };
            }
        }

        sheet.set_freeze_panes(1, 0)?;
        sheet.autofilter(0, 0, matches.len() as u32, COLUMNS.len() as u16 - 1)?;
    }

    Ok(workbook.save_to_buffer()?)
}
