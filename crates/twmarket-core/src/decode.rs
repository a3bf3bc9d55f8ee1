//! 바이트/텍스트 디코더.
//!
//! - Big5 레거시 인코딩 디코딩 (TAIFEX CSV, TWSE ISIN 페이지)
//! - CSV 텍스트 → [`RawTable`]
//! - JSON 응답 봉투(envelope) → 상태 플래그에 따라 `Some`/`None`
//! - HTML 표 → [`RawRow`] 목록
//!
//! 필드 의미는 알지 못합니다. 의미 해석은 거래소별 추출기가 담당합니다.

use encoding_rs::BIG5;
use scraper::{Html, Selector};
use serde::de::DeserializeOwned;

use crate::error::{Result, ScraperError};
use crate::table::{RawRow, RawTable};

/// 응답 본문 인코딩.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Big5 (번체 중국어 레거시 인코딩)
    Big5,
    /// UTF-8
    Utf8,
}

/// 바이트를 텍스트로 디코딩. 잘못된 바이트 시퀀스는 디코딩 오류입니다.
pub fn decode(bytes: &[u8], encoding: TextEncoding) -> Result<String> {
    match encoding {
        TextEncoding::Big5 => BIG5
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
            .ok_or_else(|| {
                ScraperError::Decode(format!("Big5 디코딩 실패 ({} bytes)", bytes.len()))
            }),
        TextEncoding::Utf8 => String::from_utf8(bytes.to_vec())
            .map_err(|e| ScraperError::Decode(format!("UTF-8 디코딩 실패: {}", e))),
    }
}

/// CSV 파싱 옵션.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableOptions {
    /// true면 첫 행도 데이터로 취급 (헤더 분리 안 함)
    pub no_header: bool,
}

/// CSV 텍스트를 위치 기반 표로 파싱.
///
/// 행마다 셀 수가 달라도 허용하며, 셀 앞뒤 공백은 제거합니다.
/// 완전히 빈 행은 건너뜁니다.
pub fn parse_tabular(text: &str, options: TableOptions) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells: Vec<String> = record.iter().map(str::to_string).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        rows.push(RawRow::new(cells));
    }

    if options.no_header || rows.is_empty() {
        return Ok(RawTable::new(None, rows));
    }

    let header = rows.remove(0);
    Ok(RawTable::new(Some(header), rows))
}

/// HTML 오류/안내 페이지인지 확인 (CSV 대신 HTML이 오는 경우).
pub fn looks_like_html(text: &str) -> bool {
    let head = text.trim_start_matches('\u{feff}').trim_start();
    head.starts_with('<')
}

/// 상태 플래그를 가진 JSON 응답.
pub trait Envelope {
    /// 거래소가 해당 날짜의 데이터가 있다고 확인했는지 여부.
    fn has_data(&self) -> bool;
}

/// JSON 응답을 파싱하고 상태 플래그가 긍정일 때만 `Some`을 반환.
pub fn parse_json_envelope<T>(bytes: &[u8]) -> Result<Option<T>>
where
    T: DeserializeOwned + Envelope,
{
    let envelope: T = serde_json::from_slice(bytes).map_err(|e| {
        let preview = String::from_utf8_lossy(&bytes[..bytes.len().min(200)]).into_owned();
        ScraperError::Decode(format!("JSON 파싱 실패: {} - {}", e, preview))
    })?;

    if envelope.has_data() {
        Ok(Some(envelope))
    } else {
        Ok(None)
    }
}

/// JSON 값을 셀 문자열로 변환 (문자열/숫자 혼용 응답 대응).
pub fn json_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// JSON 2차원 배열을 원시 행 목록으로 변환.
pub fn json_rows(data: &[Vec<serde_json::Value>]) -> Vec<RawRow> {
    data.iter()
        .map(|row| RawRow::new(row.iter().map(json_cell).collect()))
        .collect()
}

/// HTML 문서에서 `selector`에 맞는 행(`tr`)을 셀 텍스트 목록으로 추출.
pub fn parse_html_rows(html: &str, selector: &str) -> Result<Vec<RawRow>> {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse(selector)
        .map_err(|e| ScraperError::Decode(format!("셀렉터 파싱 실패: {} - {:?}", selector, e)))?;
    let cell_selector = Selector::parse("td")
        .map_err(|e| ScraperError::Decode(format!("셀렉터 파싱 실패: td - {:?}", e)))?;

    Ok(document
        .select(&row_selector)
        .map(|tr| {
            RawRow::new(
                tr.select(&cell_selector)
                    .map(|td| td.text().collect::<String>().trim().to_string())
                    .collect(),
            )
        })
        .collect())
}
