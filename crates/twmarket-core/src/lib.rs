//! # TwMarket Core
//!
//! 대만 거래소(TWSE, TPEx, TAIFEX) 일별 리포트 정규화를 위한 핵심 타입과 순수 함수.
//!
//! - 오류 분류 (부재는 오류가 아님)
//! - 숫자 문자열 파싱
//! - 민국력 날짜 변환
//! - Big5/CSV/JSON/HTML 디코더
//! - 정규화 레코드 및 파생 지표 계산
//! - 로깅 초기화

pub mod calendar;
pub mod compose;
pub mod decode;
pub mod error;
pub mod logging;
pub mod numeral;
pub mod records;
pub mod report;
pub mod table;

pub use calendar::{from_roc, lookback_start, parse_roc_date, to_roc, RocDate, ROC_EPOCH_OFFSET};
pub use compose::{
    compose_retail_position, margin_balance_changes, net_large_traders, LargeTraderRows,
    LongShort, MarginOffsets,
};
pub use decode::{decode, parse_json_envelope, parse_tabular, Envelope, TableOptions, TextEncoding};
pub use error::{Result, ScraperError};
pub use numeral::parse_number;
pub use records::*;
pub use report::{ListingMarket, Provider, Report};
pub use table::{RawRow, RawTable};
