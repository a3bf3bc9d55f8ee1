//! 거래소 숫자 문자열 파싱.
//!
//! 천 단위 쉼표, 괄호 음수 `(1,234)`, 선행 부호를 허용합니다.
//! 숫자가 아닌 문자열은 부재가 아니라 [`ScraperError::Parse`]입니다.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{Result, ScraperError};

/// 숫자 문자열을 Decimal로 파싱.
///
/// ```
/// use rust_decimal::Decimal;
/// use twmarket_core::numeral::parse_number;
///
/// assert_eq!(parse_number("(1,234)").unwrap(), Decimal::from(-1234));
/// assert_eq!(parse_number("1,234").unwrap(), Decimal::from(1234));
/// assert!(parse_number("abc").is_err());
/// ```
pub fn parse_number(text: &str) -> Result<Decimal> {
    let trimmed = text.trim();

    let (negative, body) = match trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (true, inner.trim()),
        None => (false, trimmed),
    };

    let cleaned = body.replace(',', "");
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);

    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Err(ScraperError::Parse(format!("숫자 아님: {:?}", text)));
    }

    let value = Decimal::from_str(cleaned)
        .map_err(|e| ScraperError::Parse(format!("숫자 파싱 실패: {:?} - {}", text, e)))?;

    Ok(if negative { -value } else { value })
}

/// 숫자가 들어 있는 셀인지 확인 (라벨/빈 셀 구분용).
pub fn has_digits(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}
