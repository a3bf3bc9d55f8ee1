//! 거래소별 데이터 Provider 모듈.
//!
//! ## TWSE (대만증권거래소)
//! - `TwseScraper`: 상장 시장 일별 리포트 (JSON, `stat` 플래그)
//! - 종목 목록 (ISIN 사이트, Big5 HTML)
//!
//! ## TPEx (타이베이 거래소)
//! - `TpexScraper`: 장외 시장 일별 리포트 (JSON, `iTotalRecords` 플래그)
//!
//! ## TAIFEX (대만선물거래소)
//! - `TaifexScraper`: 선물/옵션 법인 미결제약정, 대형 거래자, 개인 포지션 (Big5 CSV)
//!
//! 모든 조회는 데이터가 없으면 `Ok(None)`을 반환합니다.

pub mod board;
pub mod taifex;
pub mod tpex;
pub mod twse;

pub use board::BoardReportSource;
pub use taifex::TaifexScraper;
pub use tpex::TpexScraper;
pub use twse::TwseScraper;

use chrono::NaiveDate;
use twmarket_core::{Provider, Report, Result};

/// 조회 결과를 로그로 남기고 오류에 리포트 문맥을 붙입니다.
pub(crate) fn settle<T>(
    provider: Provider,
    report: Report,
    date: NaiveDate,
    result: Result<Option<T>>,
) -> Result<Option<T>> {
    match result {
        Ok(Some(record)) => {
            tracing::info!(provider = %provider, report = %report, %date, "리포트 추출 완료");
            Ok(Some(record))
        }
        Ok(None) => {
            tracing::info!(provider = %provider, report = %report, %date, "해당 날짜 데이터 없음");
            Ok(None)
        }
        Err(e) => {
            tracing::warn!(provider = %provider, report = %report, %date, error = %e, "리포트 조회 실패");
            Err(e.in_report(provider, report, date))
        }
    }
}

/// `base` + `path` URL 조합.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use twmarket_core::ScraperError;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://www.twse.com.tw/", "/rwd/zh/fund/BFI82U"),
            "https://www.twse.com.tw/rwd/zh/fund/BFI82U"
        );
    }

    #[test]
    fn test_settle_adds_context() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let result: Result<Option<()>> = Err(ScraperError::Transport("timeout".into()));
        let err = settle(Provider::Tpex, Report::MarketBreadth, date, result).unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("TPEX/market_breadth"));
    }
}
