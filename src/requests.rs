//! Request builder for the Sheets `batchUpdate` protocol
//!
//! Each primitive on [`RequestBatch`] appends exactly one declarative
//! [`Request`] (two for a merged cell write: the merge, then the write).
//! Nothing is sent here; the batch is handed to the
//! [`dispatcher`](crate::dispatcher) once a payload is fully rendered.
//! Builders never fail: a bad range is only reported by the remote side.

use crate::geometry::GridRange;
use serde::Serialize;

/// RGB color with 0..1 channels, as the Sheets API expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const GREY: Color = Color::rgb(0.4, 0.4, 0.4);
    pub const LIGHT_GREY: Color = Color::rgb(0.95, 0.95, 0.95);
    pub const CYAN: Color = Color::rgb(0.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const LIGHT_RED: Color = Color::rgb(1.0, 0.5, 0.5);

    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }
}

/// Font color of a cell write. At most one per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Foreground {
    Cyan,
    Red,
    LightRed,
    White,
}

impl Foreground {
    pub fn color(self) -> Color {
        match self {
            Foreground::Cyan => Color::CYAN,
            Foreground::Red => Color::RED,
            Foreground::LightRed => Color::LIGHT_RED,
            Foreground::White => Color::WHITE,
        }
    }
}

/// Fill color of a cell write. At most one per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    Grey,
    LightGrey,
    Black,
}

impl Background {
    pub fn color(self) -> Color {
        match self {
            Background::Grey => Color::GREY,
            Background::LightGrey => Color::LIGHT_GREY,
            Background::Black => Color::BLACK,
        }
    }
}

/// Style bundle applied by [`RequestBatch::set_cell_content`].
///
/// ```
/// use runbun::requests::{Background, CellStyle, Foreground};
///
/// let header = CellStyle::new()
///     .merge()
///     .bold()
///     .center()
///     .foreground(Foreground::Cyan)
///     .background(Background::Grey);
/// assert!(header.merge && header.bold);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellStyle {
    pub merge: bool,
    pub bold: bool,
    pub center: bool,
    pub foreground: Option<Foreground>,
    pub background: Option<Background>,
}

impl CellStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(mut self) -> Self {
        self.merge = true;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn center(mut self) -> Self {
        self.center = true;
        self
    }

    pub fn foreground(mut self, foreground: Foreground) -> Self {
        self.foreground = Some(foreground);
        self
    }

    pub fn background(mut self, background: Background) -> Self {
        self.background = Some(background);
        self
    }
}

/// Value written into a cell: literal text or a formula, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellContent {
    Text(String),
    Formula(String),
}

impl CellContent {
    pub fn text(s: impl Into<String>) -> Self {
        CellContent::Text(s.into())
    }

    pub fn formula(s: impl Into<String>) -> Self {
        CellContent::Formula(s.into())
    }

    pub fn blank() -> Self {
        CellContent::Text(String::new())
    }
}

// === Wire types ===

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtendedValue {
    StringValue(String),
    FormulaValue(String),
}

impl From<CellContent> for ExtendedValue {
    fn from(content: CellContent) -> Self {
        match content {
            CellContent::Text(s) => ExtendedValue::StringValue(s),
            CellContent::Formula(s) => ExtendedValue::FormulaValue(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HorizontalAlignment {
    Center,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFormat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<Color>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellFormat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_format: Option<TextFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_alignment: Option<HorizontalAlignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFormatRun {
    pub start_index: usize,
    pub format: TextFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_entered_value: Option<ExtendedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_entered_format: Option<CellFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_format_runs: Option<Vec<TextFormatRun>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowData {
    pub values: Vec<CellData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Dimension {
    Rows,
    Columns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionRange {
    pub sheet_id: i64,
    pub dimension: Dimension,
    pub start_index: usize,
    pub end_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionProperties {
    pub pixel_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeType {
    MergeAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BorderStyle {
    Solid,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Border {
    pub style: BorderStyle,
    pub width: u32,
    pub color: Color,
}

impl Border {
    pub const THIN_BLACK: Border = Border {
        style: BorderStyle::Solid,
        width: 1,
        color: Color::BLACK,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatCellRequest {
    pub range: GridRange,
    pub cell: CellData,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateCellsRequest {
    pub range: GridRange,
    pub rows: Vec<RowData>,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeCellsRequest {
    pub range: GridRange,
    pub merge_type: MergeType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmergeCellsRequest {
    pub range: GridRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateDimensionPropertiesRequest {
    pub range: DimensionRange,
    pub properties: DimensionProperties,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateBordersRequest {
    pub range: GridRange,
    pub top: Border,
    pub bottom: Border,
    pub left: Border,
    pub right: Border,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertDimensionRequest {
    pub range: DimensionRange,
}

/// One mutation of a `batchUpdate` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    RepeatCell(RepeatCellRequest),
    UpdateCells(UpdateCellsRequest),
    MergeCells(MergeCellsRequest),
    UnmergeCells(UnmergeCellsRequest),
    UpdateDimensionProperties(UpdateDimensionPropertiesRequest),
    UpdateBorders(UpdateBordersRequest),
    InsertDimension(InsertDimensionRequest),
}

impl Request {
    /// Cell range the request touches, if it targets cells.
    pub fn range(&self) -> Option<&GridRange> {
        match self {
            Request::RepeatCell(r) => Some(&r.range),
            Request::UpdateCells(r) => Some(&r.range),
            Request::MergeCells(r) => Some(&r.range),
            Request::UnmergeCells(r) => Some(&r.range),
            Request::UpdateBorders(r) => Some(&r.range),
            Request::UpdateDimensionProperties(_) | Request::InsertDimension(_) => None,
        }
    }
}

/// Length of a string in the document store's character offsets (UTF-16).
fn char_offset(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Ordered list of requests accumulated while rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestBatch {
    requests: Vec<Request>,
}

impl RequestBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    fn push(&mut self, request: Request) {
        self.requests.push(request);
    }

    /// Write text or a formula and apply a style bundle. A merged style
    /// merges the range first.
    pub fn set_cell_content(&mut self, range: GridRange, content: CellContent, style: CellStyle) {
        if style.merge {
            self.merge_cells(range);
        }

        let mut fields = String::from("userEnteredValue,userEnteredFormat(textFormat");
        let text_format = TextFormat {
            bold: style.bold.then_some(true),
            foreground_color: style.foreground.map(Foreground::color),
        };
        let horizontal_alignment = style.center.then_some(HorizontalAlignment::Center);
        if horizontal_alignment.is_some() {
            fields.push_str(",horizontalAlignment");
        }
        let background_color = style.background.map(Background::color);
        if background_color.is_some() {
            fields.push_str(",backgroundColor");
        }
        fields.push(')');

        self.push(Request::RepeatCell(RepeatCellRequest {
            range,
            cell: CellData {
                user_entered_value: Some(content.into()),
                user_entered_format: Some(CellFormat {
                    text_format: Some(text_format),
                    horizontal_alignment,
                    background_color,
                }),
                text_format_runs: None,
            },
            fields,
        }));
    }

    pub fn merge_cells(&mut self, range: GridRange) {
        self.push(Request::MergeCells(MergeCellsRequest {
            range,
            merge_type: MergeType::MergeAll,
        }));
    }

    pub fn unmerge_cells(&mut self, range: GridRange) {
        self.push(Request::UnmergeCells(UnmergeCellsRequest { range }));
    }

    /// Write `"{bold} {regular}"` with the first part bold.
    pub fn set_cell_bold_split_content(&mut self, range: GridRange, bold: &str, regular: &str) {
        let runs = vec![
            TextFormatRun {
                start_index: 0,
                format: TextFormat {
                    bold: Some(true),
                    foreground_color: None,
                },
            },
            TextFormatRun {
                start_index: char_offset(bold),
                format: TextFormat {
                    bold: Some(false),
                    foreground_color: None,
                },
            },
        ];

        self.push(Request::UpdateCells(UpdateCellsRequest {
            range,
            rows: vec![RowData {
                values: vec![CellData {
                    user_entered_value: Some(ExtendedValue::StringValue(format!(
                        "{} {}",
                        bold, regular
                    ))),
                    user_entered_format: None,
                    text_format_runs: Some(runs),
                }],
            }],
            fields: "userEnteredValue,textFormatRuns".to_string(),
        }));
    }

    /// Clear values, keep formatting.
    pub fn empty_cell(&mut self, range: GridRange) {
        self.push(Request::RepeatCell(RepeatCellRequest {
            range,
            cell: CellData::default(),
            fields: "userEnteredValue".to_string(),
        }));
    }

    /// Clear formatting, keep values.
    pub fn clear_formatting(&mut self, range: GridRange) {
        self.push(Request::RepeatCell(RepeatCellRequest {
            range,
            cell: CellData {
                user_entered_format: Some(CellFormat::default()),
                ..CellData::default()
            },
            fields: "userEnteredFormat".to_string(),
        }));
    }

    pub fn update_column_size(
        &mut self,
        sheet_id: i64,
        pixel_size: u32,
        start_column: usize,
        column_count: usize,
    ) {
        self.push(Request::UpdateDimensionProperties(
            UpdateDimensionPropertiesRequest {
                range: DimensionRange {
                    sheet_id,
                    dimension: Dimension::Columns,
                    start_index: start_column,
                    end_index: start_column + column_count,
                },
                properties: DimensionProperties { pixel_size },
                fields: "pixelSize".to_string(),
            },
        ));
    }

    /// Solid 1px black border on all four sides of the range.
    pub fn add_borders(&mut self, range: GridRange) {
        self.push(Request::UpdateBorders(UpdateBordersRequest {
            range,
            top: Border::THIN_BLACK,
            bottom: Border::THIN_BLACK,
            left: Border::THIN_BLACK,
            right: Border::THIN_BLACK,
        }));
    }

    /// Insert blank rows at the very top of the sheet.
    pub fn insert_rows(&mut self, sheet_id: i64, count: usize) {
        self.push(Request::InsertDimension(InsertDimensionRequest {
            range: DimensionRange {
                sheet_id,
                dimension: Dimension::Rows,
                start_index: 0,
                end_index: count,
            },
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn range() -> GridRange {
        GridRange {
            sheet_id: 3,
            start_row_index: 2,
            end_row_index: 3,
            start_column_index: 1,
            end_column_index: 9,
        }
    }

    fn to_json(batch: &RequestBatch) -> serde_json::Value {
        serde_json::to_value(batch).unwrap()
    }

    #[test]
    fn test_plain_text_write() {
        let mut batch = RequestBatch::new();
        batch.set_cell_content(range(), CellContent::text("Run start"), CellStyle::new());

        assert_eq!(batch.len(), 1);
        let json = to_json(&batch);
        let repeat = &json["requests"][0]["repeatCell"];
        assert_eq!(repeat["cell"]["userEnteredValue"], json!({"stringValue": "Run start"}));
        assert_eq!(repeat["cell"]["userEnteredFormat"], json!({"textFormat": {}}));
        assert_eq!(repeat["fields"], "userEnteredValue,userEnteredFormat(textFormat)");
        assert_eq!(repeat["range"]["startRowIndex"], 2);
        assert_eq!(repeat["range"]["endColumnIndex"], 9);
    }

    #[test]
    fn test_merged_styled_formula_write() {
        let mut batch = RequestBatch::new();
        let style = CellStyle::new()
            .merge()
            .bold()
            .center()
            .foreground(Foreground::Cyan)
            .background(Background::Grey);
        batch.set_cell_content(range(), CellContent::formula("=1+1"), style);

        assert_eq!(batch.len(), 2);
        let json = to_json(&batch);
        assert_eq!(json["requests"][0]["mergeCells"]["mergeType"], "MERGE_ALL");

        let repeat = &json["requests"][1]["repeatCell"];
        assert_eq!(repeat["cell"]["userEnteredValue"], json!({"formulaValue": "=1+1"}));
        let format = &repeat["cell"]["userEnteredFormat"];
        assert_eq!(format["textFormat"]["bold"], true);
        assert_eq!(
            format["textFormat"]["foregroundColor"],
            json!({"red": 0.0, "green": 1.0, "blue": 1.0})
        );
        assert_eq!(format["horizontalAlignment"], "CENTER");
        assert_eq!(format["backgroundColor"]["red"], 0.4);
        assert_eq!(
            repeat["fields"],
            "userEnteredValue,userEnteredFormat(textFormat,horizontalAlignment,backgroundColor)"
        );
    }

    #[test]
    fn test_bold_split_uses_utf16_offsets() {
        let mut batch = RequestBatch::new();
        batch.set_cell_bold_split_content(range(), "Élise", "(Ralts)");

        let json = to_json(&batch);
        let update = &json["requests"][0]["updateCells"];
        let cell = &update["rows"][0]["values"][0];
        assert_eq!(cell["userEnteredValue"]["stringValue"], "Élise (Ralts)");
        assert_eq!(cell["textFormatRuns"][0], json!({"startIndex": 0, "format": {"bold": true}}));
        assert_eq!(cell["textFormatRuns"][1], json!({"startIndex": 5, "format": {"bold": false}}));
        assert_eq!(update["fields"], "userEnteredValue,textFormatRuns");
    }

    #[test]
    fn test_empty_cell_and_clear_formatting() {
        let mut batch = RequestBatch::new();
        batch.empty_cell(range());
        batch.clear_formatting(range());

        let json = to_json(&batch);
        assert_eq!(json["requests"][0]["repeatCell"]["cell"], json!({}));
        assert_eq!(json["requests"][0]["repeatCell"]["fields"], "userEnteredValue");
        assert_eq!(
            json["requests"][1]["repeatCell"]["cell"],
            json!({"userEnteredFormat": {}})
        );
        assert_eq!(json["requests"][1]["repeatCell"]["fields"], "userEnteredFormat");
    }

    #[test]
    fn test_dimension_requests() {
        let mut batch = RequestBatch::new();
        batch.update_column_size(3, 55, 1, 8);
        batch.insert_rows(3, 18);

        let json = to_json(&batch);
        assert_eq!(
            json["requests"][0]["updateDimensionProperties"],
            json!({
                "range": {"sheetId": 3, "dimension": "COLUMNS", "startIndex": 1, "endIndex": 9},
                "properties": {"pixelSize": 55},
                "fields": "pixelSize"
            })
        );
        assert_eq!(
            json["requests"][1]["insertDimension"],
            json!({"range": {"sheetId": 3, "dimension": "ROWS", "startIndex": 0, "endIndex": 18}})
        );
    }

    #[test]
    fn test_borders_on_all_sides() {
        let mut batch = RequestBatch::new();
        batch.add_borders(range());
        let json = to_json(&batch);
        let borders = &json["requests"][0]["updateBorders"];
        for side in ["top", "bottom", "left", "right"] {
            assert_eq!(borders[side]["style"], "SOLID");
            assert_eq!(borders[side]["width"], 1);
        }
        assert_eq!(batch.requests()[0].range(), Some(&range()));
    }
}
