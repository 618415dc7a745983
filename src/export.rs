//! Two-column `X,Y` export of a final point set.

use thiserror::Error;

use crate::types::Point;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("missing X,Y header")]
    MissingHeader,
    #[error("malformed row {line}: {text:?}")]
    MalformedRow { line: usize, text: String },
}

/// Renders points as UTF-8 CSV with an `X,Y` header, one integer pair per
/// row, in the given order.
pub fn points_to_csv(points: &[Point]) -> String {
    let mut out = String::from("X,Y\n");
    for p in points {
        out.push_str(&format!("{},{}\n", p.x, p.y));
    }
    out
}

/// Parses the format written by [`points_to_csv`]; round-trips exactly,
/// order included.
pub fn points_from_csv(text: &str) -> Result<Vec<Point>, ExportError> {
    let mut lines = text.lines().enumerate();
    match lines.next() {
        Some((_, header)) if header.trim() == "X,Y" => {}
        _ => return Err(ExportError::MissingHeader),
    }
    let mut points = Vec::new();
    for (line, row) in lines {
        let row = row.trim();
        if row.is_empty() {
            continue;
        }
        let malformed = || ExportError::MalformedRow {
            line: line + 1,
            text: row.to_string(),
        };
        let (x, y) = row.split_once(',').ok_or_else(malformed)?;
        let x = x.trim().parse::<i32>().map_err(|_| malformed())?;
        let y = y.trim().parse::<i32>().map_err(|_| malformed())?;
        points.push(Point::new(x, y));
    }
    Ok(points)
}
