//! 민국력(ROC) 날짜 변환.
//!
//! 대만 거래소는 서기 연도에서 1911을 뺀 연도를 사용합니다 (예: 2024 → 113).
//! 조회 파라미터와 일부 응답 본문이 이 형식을 사용합니다.

use chrono::{Datelike, Months, NaiveDate};
use std::fmt;

use crate::error::{Result, ScraperError};

/// 민국력 기준 연도 오프셋.
pub const ROC_EPOCH_OFFSET: i32 = 1911;

/// TAIFEX 조회 기간 시작일 계산용 (년).
pub const LOOKBACK_YEARS: u32 = 3;

/// 민국력 날짜.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RocDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl RocDate {
    /// `113/01/02` 또는 `113-01-02` 형식 파싱.
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(['/', '-']).collect();
        if parts.len() != 3 {
            return Err(ScraperError::Parse(format!("민국력 날짜 형식 아님: {:?}", s)));
        }

        let parse_err = |e: std::num::ParseIntError| {
            ScraperError::Parse(format!("민국력 날짜 파싱 실패: {:?} - {}", s, e))
        };

        Ok(Self {
            year: parts[0].trim().parse::<i32>().map_err(parse_err)?,
            month: parts[1].trim().parse::<u32>().map_err(parse_err)?,
            day: parts[2].trim().parse::<u32>().map_err(parse_err)?,
        })
    }

    /// 서기 날짜로 변환.
    pub fn to_date(self) -> Result<NaiveDate> {
        from_roc(self.year, self.month, self.day)
    }
}

impl fmt::Display for RocDate {
    /// 조회 파라미터 형식 (`113/01/02`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

/// 서기 날짜 → 민국력.
pub fn to_roc(date: NaiveDate) -> RocDate {
    RocDate {
        year: date.year() - ROC_EPOCH_OFFSET,
        month: date.month(),
        day: date.day(),
    }
}

/// 민국력 → 서기 날짜.
pub fn from_roc(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    year.checked_add(ROC_EPOCH_OFFSET)
        .and_then(|gregorian| NaiveDate::from_ymd_opt(gregorian, month, day))
        .ok_or_else(|| {
            ScraperError::Parse(format!("유효하지 않은 민국력 날짜: {}/{}/{}", year, month, day))
        })
}

/// 민국력 날짜 문자열을 서기 날짜로 변환.
pub fn parse_roc_date(s: &str) -> Result<NaiveDate> {
    RocDate::parse(s)?.to_date()
}

/// 정확히 3년 전 날짜 (2월 29일은 2월 28일로 맞춤).
pub fn lookback_start(date: NaiveDate) -> NaiveDate {
    date.checked_sub_months(Months::new(LOOKBACK_YEARS * 12))
        .unwrap_or(NaiveDate::MIN)
}

/// `yyyyMMdd` (TWSE 조회 파라미터).
pub fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// `yyyy/MM/dd` (TAIFEX 조회 파라미터).
pub fn slash_date(date: NaiveDate) -> String {
    date.format("%Y/%m/%d").to_string()
}

/// `yyyy/MM/dd HH:mm` (TAIFEX 기간 파라미터, 자정 기준).
pub fn slash_datetime(date: NaiveDate) -> String {
    date.format("%Y/%m/%d 00:00").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_to_roc() {
        let roc = to_roc(ymd(2024, 1, 2));
        assert_eq!(roc, RocDate { year: 113, month: 1, day: 2 });
        assert_eq!(roc.to_string(), "113/01/02");
    }

    #[test]
    fn test_parse_roc_date() {
        assert_eq!(parse_roc_date("113/01/02").unwrap(), ymd(2024, 1, 2));
        assert_eq!(parse_roc_date("113-12-31").unwrap(), ymd(2024, 12, 31));
        assert_eq!(parse_roc_date(" 99/05/20 ").unwrap(), ymd(2010, 5, 20));
        assert!(parse_roc_date("113/02/30").unwrap_err().is_parse());
        assert!(parse_roc_date("2024-01").unwrap_err().is_parse());
        assert!(parse_roc_date("abc/01/02").unwrap_err().is_parse());
    }

    #[test]
    fn test_parse_roc_date_out_of_range_year() {
        assert!(parse_roc_date("4294967295/01/01").unwrap_err().is_parse());
        assert!(parse_roc_date("2147483647/01/01").unwrap_err().is_parse());
        assert!(from_roc(i32::MAX, 1, 1).unwrap_err().is_parse());
    }

    #[test]
    fn test_lookback_start() {
        assert_eq!(lookback_start(ymd(2024, 1, 2)), ymd(2021, 1, 2));
        assert_eq!(lookback_start(ymd(2024, 2, 29)), ymd(2021, 2, 28));
    }

    #[test]
    fn test_query_formats() {
        let date = ymd(2024, 3, 5);
        assert_eq!(compact_date(date), "20240305");
        assert_eq!(slash_date(date), "2024/03/05");
        assert_eq!(slash_datetime(date), "2024/03/05 00:00");
    }

    proptest! {
        #[test]
        fn prop_roc_round_trip(days in 0i64..80_000) {
            let date = ymd(1912, 1, 1) + chrono::Duration::days(days);
            let roc = to_roc(date);
            prop_assert_eq!(from_roc(roc.year, roc.month, roc.day).unwrap(), date);
            prop_assert_eq!(parse_roc_date(&roc.to_string()).unwrap(), date);
        }
    }
}
