//! 스크래퍼 오류 타입.
//!
//! "데이터 없음"은 오류가 아닙니다. 모든 계층은 `Ok(None)`으로 부재를 표현하며,
//! 이 모듈의 오류는 전송 실패, 디코딩 실패, 숫자 파싱 실패(레이아웃 변경)만 나타냅니다.

use chrono::NaiveDate;
use thiserror::Error;

use crate::report::{ListingMarket, Provider, Report};

/// 스크래퍼 관련 오류.
#[derive(Debug, Error)]
pub enum ScraperError {
    /// 네트워크/HTTP 오류 (전송 계층)
    #[error("Transport error: {0}")]
    Transport(String),

    /// 바이트 스트림 또는 표 구조 디코딩 실패
    #[error("Decode error: {0}")]
    Decode(String),

    /// 숫자여야 하는 셀의 파싱 실패 또는 기대한 위치에 셀이 없음
    #[error("Parse error: {0}")]
    Parse(String),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    Config(String),

    /// 리포트 문맥이 붙은 오류
    #[error("[{provider}/{report} {date}] {source}")]
    Report {
        provider: Provider,
        report: Report,
        date: NaiveDate,
        #[source]
        source: Box<ScraperError>,
    },

    /// 종목 목록 조회 문맥이 붙은 오류 (날짜 없음)
    #[error("[TWSE/listed_instruments {market}] {source}")]
    Listing {
        market: ListingMarket,
        #[source]
        source: Box<ScraperError>,
    },
}

impl ScraperError {
    /// 리포트 문맥(거래소, 리포트, 날짜)을 붙입니다.
    ///
    /// 이미 문맥이 붙은 오류는 그대로 반환합니다.
    pub fn in_report(self, provider: Provider, report: Report, date: NaiveDate) -> Self {
        match self {
            err @ (ScraperError::Report { .. } | ScraperError::Listing { .. }) => err,
            other => ScraperError::Report {
                provider,
                report,
                date,
                source: Box::new(other),
            },
        }
    }

    /// 문맥 래퍼를 벗긴 원래 오류.
    pub fn root(&self) -> &ScraperError {
        match self {
            ScraperError::Report { source, .. } | ScraperError::Listing { source, .. } => {
                source.root()
            }
            other => other,
        }
    }

    /// 전송 계층 오류인지 확인.
    pub fn is_transport(&self) -> bool {
        matches!(self.root(), ScraperError::Transport(_))
    }

    /// 디코딩 오류인지 확인.
    pub fn is_decode(&self) -> bool {
        matches!(self.root(), ScraperError::Decode(_))
    }

    /// 파싱 오류(레이아웃 변경 의심)인지 확인.
    pub fn is_parse(&self) -> bool {
        matches!(self.root(), ScraperError::Parse(_))
    }
}

impl From<serde_json::Error> for ScraperError {
    fn from(err: serde_json::Error) -> Self {
        ScraperError::Decode(err.to_string())
    }
}

impl From<csv::Error> for ScraperError {
    fn from(err: csv::Error) -> Self {
        ScraperError::Decode(err.to_string())
    }
}

/// 스크래퍼 작업 Result 타입.
pub type Result<T> = std::result::Result<T, ScraperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_context_wraps_once() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let err = ScraperError::Parse("bad cell".to_string())
            .in_report(Provider::Taifex, Report::InstInvestorsTxfTrades, date)
            .in_report(Provider::Twse, Report::MarketTrades, date);

        match &err {
            ScraperError::Report {
                provider, report, ..
            } => {
                assert_eq!(*provider, Provider::Taifex);
                assert_eq!(*report, Report::InstInvestorsTxfTrades);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_parse());
        assert!(!err.is_transport());
        assert!(err.to_string().contains("2024-01-02"));
    }
}
