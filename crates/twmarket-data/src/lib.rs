//! # TwMarket Data
//!
//! 대만 거래소 일별 리포트 수집기.
//!
//! - `config`: 거래소 주소/HTTP 설정 (환경변수)
//! - `transport`: HTTP 전송 계층 (원시 바이트)
//! - `provider`: 거래소별 스크래퍼 (TWSE, TPEx, TAIFEX)
//!
//! 모든 조회는 `Result<Option<T>>`를 반환합니다. 해당 날짜 데이터가 없으면
//! `Ok(None)`, 전송/디코딩/파싱 실패는 `Err`입니다.

pub mod config;
pub mod provider;
pub mod transport;

use std::sync::Arc;

pub use config::{Endpoints, HttpConfig, ScraperConfig};
pub use provider::{BoardReportSource, TaifexScraper, TpexScraper, TwseScraper};
pub use transport::{HttpTransport, Params, Transport};

use twmarket_core::Result;

/// 세 거래소 스크래퍼 묶음 (하나의 전송 계층 공유).
#[derive(Clone)]
pub struct Scrapers {
    pub twse: TwseScraper,
    pub tpex: TpexScraper,
    pub taifex: TaifexScraper,
}

impl Scrapers {
    /// 주어진 전송 계층으로 생성.
    pub fn new(transport: Arc<dyn Transport>, endpoints: &Endpoints) -> Self {
        Self {
            twse: TwseScraper::new(Arc::clone(&transport), endpoints),
            tpex: TpexScraper::new(Arc::clone(&transport), endpoints),
            taifex: TaifexScraper::new(transport, endpoints),
        }
    }

    /// 설정으로 HTTP 전송 계층을 만들어 생성.
    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config.http)?);
        Ok(Self::new(transport, &config.endpoints))
    }

    /// 시장 구분에 맞는 주식 시장 스크래퍼.
    pub fn board(&self, market: twmarket_core::ListingMarket) -> &dyn BoardReportSource {
        match market {
            twmarket_core::ListingMarket::Tse => &self.twse,
            twmarket_core::ListingMarket::Otc => &self.tpex,
        }
    }
}
