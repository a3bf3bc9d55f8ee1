//! 위치 기반 원시 표 (RawTable / RawRow).
//!
//! 거래소 응답은 안정적인 필드명이 없으므로 셀은 위치(인덱스)로만 접근합니다.
//! 기대한 위치에 셀이 없으면 레이아웃이 바뀐 것으로 보고 파싱 오류를 반환합니다.

use rust_decimal::Decimal;

use crate::error::{Result, ScraperError};
use crate::numeral::{has_digits, parse_number};

/// 원시 행 (셀 문자열의 순서열).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow(pub Vec<String>);

impl RawRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self(cells)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn cells(&self) -> &[String] {
        &self.0
    }

    /// 위치 `index`의 셀. 없으면 파싱 오류.
    pub fn cell(&self, index: usize) -> Result<&str> {
        self.0.get(index).map(String::as_str).ok_or_else(|| {
            ScraperError::Parse(format!(
                "셀 위치 {} 없음 (행 길이 {}): {:?}",
                index,
                self.0.len(),
                self.0
            ))
        })
    }

    /// 위치 `index`의 셀이 비어 있지 않은지 확인 (없는 셀은 빈 셀로 취급).
    pub fn is_filled(&self, index: usize) -> bool {
        self.0.get(index).is_some_and(|c| !c.trim().is_empty())
    }

    /// 위치 `index`의 셀을 숫자로 파싱.
    pub fn number(&self, index: usize) -> Result<Decimal> {
        parse_number(self.cell(index)?)
    }

    /// 첫 셀(라벨)을 제외한 나머지 셀.
    pub fn without_label(&self) -> &[String] {
        self.0.get(1..).unwrap_or(&[])
    }
}

impl From<Vec<String>> for RawRow {
    fn from(cells: Vec<String>) -> Self {
        Self(cells)
    }
}

impl From<Vec<&str>> for RawRow {
    fn from(cells: Vec<&str>) -> Self {
        Self(cells.into_iter().map(str::to_string).collect())
    }
}

/// 원시 표.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// 헤더 행 (`no_header = false`로 파싱한 경우)
    pub header: Option<RawRow>,
    /// 데이터 행
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(header: Option<RawRow>, rows: Vec<RawRow>) -> Self {
        Self { header, rows }
    }

    /// 헤더 표식 (헤더 행의 첫 셀).
    pub fn header_marker(&self) -> Option<&str> {
        self.header
            .as_ref()
            .and_then(|h| h.0.first())
            .map(|s| s.trim_start_matches('\u{feff}').trim())
    }

    /// 헤더 표식이 기대값과 같은지 확인. 실제 데이터 여부의 유일한 신호입니다.
    pub fn has_marker(&self, expected: &str) -> bool {
        self.header_marker() == Some(expected)
    }

    /// 위치 `index`의 데이터 행. 없으면 파싱 오류.
    pub fn row(&self, index: usize) -> Result<&RawRow> {
        self.rows.get(index).ok_or_else(|| {
            ScraperError::Parse(format!(
                "행 위치 {} 없음 (데이터 행 {}개)",
                index,
                self.rows.len()
            ))
        })
    }

    /// 위치 `(row, col)`의 셀을 숫자로 파싱.
    pub fn number_at(&self, row: usize, col: usize) -> Result<Decimal> {
        self.row(row)?.number(col)
    }

    /// 조건을 만족하는 행만 남긴 표 (헤더 유지).
    pub fn filter_rows<F>(&self, mut predicate: F) -> RawTable
    where
        F: FnMut(&RawRow) -> bool,
    {
        RawTable {
            header: self.header.clone(),
            rows: self.rows.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }
}

/// 행들의 라벨(첫 셀)을 제외하고 이어 붙여 숫자 목록으로 만듭니다.
///
/// TWSE/TPEx 요약 표는 이렇게 평탄화한 뒤 고정 위치로 값을 읽습니다.
pub fn flatten_numbers<'a, I>(rows: I) -> Result<Vec<Decimal>>
where
    I: IntoIterator<Item = &'a RawRow>,
{
    rows.into_iter()
        .flat_map(|row| row.without_label().iter())
        .map(|cell| parse_number(cell))
        .collect()
}

/// 숫자가 들어 있는 셀만 골라 숫자 목록으로 만듭니다 (라벨/빈 셀 제외).
pub fn numeric_cells<'a, I>(cells: I) -> Result<Vec<Decimal>>
where
    I: IntoIterator<Item = &'a String>,
{
    cells
        .into_iter()
        .filter(|cell| has_digits(cell))
        .map(|cell| parse_number(cell))
        .collect()
}

/// 평탄화된 숫자 목록에서 위치 `index`의 값. 없으면 파싱 오류.
pub fn value_at(values: &[Decimal], index: usize) -> Result<Decimal> {
    values.get(index).copied().ok_or_else(|| {
        ScraperError::Parse(format!(
            "값 위치 {} 없음 (값 {}개)",
            index,
            values.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn table() -> RawTable {
        RawTable::new(
            Some(RawRow::from(vec!["日期", "商品名稱"])),
            vec![
                RawRow::from(vec!["2024/01/02", "臺股期貨", "1,200"]),
                RawRow::from(vec!["2024/01/02", "小型臺指", "(300)"]),
            ],
        )
    }

    #[test]
    fn test_header_marker() {
        let t = table();
        assert_eq!(t.header_marker(), Some("日期"));
        assert!(t.has_marker("日期"));
        assert!(!t.has_marker("交易日期"));
        assert!(!RawTable::default().has_marker("日期"));
    }

    #[test]
    fn test_positional_access() {
        let t = table();
        assert_eq!(t.number_at(0, 2).unwrap(), dec!(1200));
        assert_eq!(t.number_at(1, 2).unwrap(), dec!(-300));
        assert!(t.number_at(2, 0).unwrap_err().is_parse());
        assert!(t.number_at(0, 9).unwrap_err().is_parse());
        assert!(t.number_at(0, 1).unwrap_err().is_parse());
    }

    #[test]
    fn test_flatten_numbers_skips_labels() {
        let rows = vec![
            RawRow::from(vec!["自營商", "10", "20", "(10)"]),
            RawRow::from(vec!["投信", "5", "1", "4"]),
        ];
        let values = flatten_numbers(&rows).unwrap();
        assert_eq!(values, vec![dec!(10), dec!(20), dec!(-10), dec!(5), dec!(1), dec!(4)]);
        assert_eq!(value_at(&values, 5).unwrap(), dec!(4));
        assert!(value_at(&values, 6).unwrap_err().is_parse());
    }

    #[test]
    fn test_numeric_cells() {
        let cells: Vec<String> = ["合計", "", "1,000", "0", "(5)"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(numeric_cells(&cells).unwrap(), vec![dec!(1000), dec!(0), dec!(-5)]);
    }
}
