//! TWSE (대만증권거래소) 스크래퍼.
//!
//! 상장(TSE) 시장의 일별 리포트와 ISIN 종목 목록을 수집합니다.
//!
//! # 응답 형식
//!
//! - 일별 리포트: JSON, `stat`이 `"OK"`일 때만 데이터가 있음
//! - 종목 목록: Big5 HTML (`.h4` 표)
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use twmarket_data::{HttpTransport, ScraperConfig, TwseScraper};
//!
//! let config = ScraperConfig::from_env();
//! let transport = Arc::new(HttpTransport::new(&config.http)?);
//! let twse = TwseScraper::new(transport, &config.endpoints);
//!
//! let trades = twse.fetch_market_trades(date).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;
use twmarket_core::calendar::compact_date;
use twmarket_core::decode::{json_rows, parse_html_rows};
use twmarket_core::table::{flatten_numbers, value_at};
use twmarket_core::{
    decode, margin_balance_changes, parse_json_envelope, Envelope, InstInvestorsTrades,
    ListedInstrument, ListingMarket, MarginOffsets, MarginTransactions, MarketBreadth,
    MarketTrades, Provider, RawRow, Report, Result, ScraperError, TextEncoding,
};

use super::board::{market_trades_from_rows, split_count_with_limit, BoardReportSource};
use super::{join_url, settle};
use crate::config::Endpoints;
use crate::transport::{Params, Transport};

const MARKET_TRADES_PATH: &str = "/rwd/zh/afterTrading/FMTQIK";
const MARKET_BREADTH_PATH: &str = "/rwd/zh/afterTrading/MI_INDEX";
const INST_INVESTORS_PATH: &str = "/rwd/zh/fund/BFI82U";
const MARGIN_PATH: &str = "/rwd/zh/marginTrading/MI_MARGN";
const ISIN_LISTING_PATH: &str = "/isin/class_main.jsp";

/// MI_INDEX 등락 표 레이아웃.
mod breadth_layout {
    /// `tables` 중 등락 종목 수 표 위치
    pub const TABLE: usize = 7;
    /// 주식(股票) 열. 1열은 전체 시장(整體市場)
    pub const COLUMN: usize = 2;
    /// `수(상한가 수)`
    pub const UP_ROW: usize = 0;
    /// `수(하한가 수)`
    pub const DOWN_ROW: usize = 1;
    pub const UNCHANGED_ROW: usize = 2;
    pub const UNMATCHED_ROW: usize = 3;
    pub const NOT_APPLICABLE_ROW: usize = 4;
}

/// BFI82U 평탄화 위치.
mod inst_layout {
    /// 외자 (외국인 + 외국계 자기매매)
    pub const FINI: [usize; 2] = [14, 11];
    /// 투신
    pub const SITC: usize = 8;
    /// 자영상 (자기매매 + 헤지)
    pub const DEALERS: [usize; 2] = [2, 5];
}

/// MI_MARGN 신용거래 요약 표 (`tables[0]`) 평탄화 위치.
const MARGIN_OFFSETS: MarginOffsets = MarginOffsets {
    margin_balance: (4, 3),
    margin_balance_value: (14, 13),
    short_balance: (9, 8),
};

/// ISIN 목록 표 열 위치.
mod listing_layout {
    pub const ROW_SELECTOR: &str = ".h4 tr";
    pub const SYMBOL: usize = 2;
    pub const NAME: usize = 3;
    pub const MARKET: usize = 4;
    pub const INDUSTRY: usize = 6;
}

// ==================== 응답 타입 ====================

/// TWSE JSON 응답.
///
/// 리포트에 따라 `data` 또는 `tables`(구 응답은 `table`)에 행이 들어 있습니다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TwseResponse {
    #[serde(default)]
    pub stat: String,
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
    #[serde(default, alias = "table")]
    pub tables: Vec<TwseTable>,
}

/// TWSE 응답 내 표.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TwseTable {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

impl Envelope for TwseResponse {
    fn has_data(&self) -> bool {
        self.stat.trim().eq_ignore_ascii_case("OK")
    }
}

impl TwseResponse {
    /// 위치 `index`의 표 행. 표가 없으면 파싱 오류.
    fn table_rows(&self, index: usize) -> Result<Vec<RawRow>> {
        let table = self.tables.get(index).ok_or_else(|| {
            ScraperError::Parse(format!(
                "표 위치 {} 없음 (표 {}개)",
                index,
                self.tables.len()
            ))
        })?;
        Ok(json_rows(&table.data))
    }
}

// ==================== 추출기 ====================

/// FMTQIK 월간 표에서 요청 날짜의 시장 거래 추출.
pub fn extract_market_trades(
    response: &TwseResponse,
    date: NaiveDate,
) -> Result<Option<MarketTrades>> {
    market_trades_from_rows(&json_rows(&response.data), date)
}

/// MI_INDEX 등락 표에서 시장 폭 추출.
pub fn extract_market_breadth(response: &TwseResponse, date: NaiveDate) -> Result<MarketBreadth> {
    use breadth_layout::*;

    let rows = response.table_rows(TABLE)?;
    let cell = |row: usize| -> Result<&str> {
        rows.get(row)
            .ok_or_else(|| ScraperError::Parse(format!("등락 표 행 {} 없음", row)))?
            .cell(COLUMN)
    };

    let (up, limit_up) = split_count_with_limit(cell(UP_ROW)?)?;
    let (down, limit_down) = split_count_with_limit(cell(DOWN_ROW)?)?;
    let unchanged = twmarket_core::parse_number(cell(UNCHANGED_ROW)?)?;
    let unmatched = twmarket_core::parse_number(cell(UNMATCHED_ROW)?)?
        + twmarket_core::parse_number(cell(NOT_APPLICABLE_ROW)?)?;

    Ok(MarketBreadth {
        date,
        up,
        limit_up,
        down,
        limit_down,
        unchanged,
        unmatched,
    })
}

/// BFI82U 3대 법인 매매 금액에서 순매수 추출.
pub fn extract_inst_investors_trades(
    response: &TwseResponse,
    date: NaiveDate,
) -> Result<InstInvestorsTrades> {
    use inst_layout::*;

    let values = flatten_numbers(&json_rows(&response.data))?;

    Ok(InstInvestorsTrades {
        date,
        fini_net_buy_sell: value_at(&values, FINI[0])? + value_at(&values, FINI[1])?,
        sitc_net_buy_sell: value_at(&values, SITC)?,
        dealers_net_buy_sell: value_at(&values, DEALERS[0])? + value_at(&values, DEALERS[1])?,
    })
}

/// MI_MARGN 신용거래 요약 표에서 잔고와 증감 추출.
pub fn extract_margin_transactions(
    response: &TwseResponse,
    date: NaiveDate,
) -> Result<MarginTransactions> {
    let values = flatten_numbers(&response.table_rows(0)?)?;
    margin_balance_changes(date, &values, &MARGIN_OFFSETS)
}

/// ISIN 목록 페이지 (디코딩된 HTML)에서 종목 추출.
///
/// 첫 행(제목 행)은 건너뛰고, 종목 코드가 없는 행(구분 행)은 제외합니다.
pub fn extract_listed_instruments(html: &str) -> Result<Vec<ListedInstrument>> {
    use listing_layout::*;

    let rows = parse_html_rows(html, ROW_SELECTOR)?;
    let text = |row: &RawRow, index: usize| -> String {
        row.cells().get(index).cloned().unwrap_or_default()
    };

    Ok(rows
        .iter()
        .skip(1)
        .map(|row| ListedInstrument {
            symbol: text(row, SYMBOL),
            name: text(row, NAME),
            market: text(row, MARKET),
            industry: text(row, INDUSTRY),
        })
        .filter(|instrument| !instrument.symbol.is_empty())
        .collect())
}

// ==================== 스크래퍼 ====================

/// TWSE 스크래퍼.
#[derive(Clone)]
pub struct TwseScraper {
    transport: Arc<dyn Transport>,
    base_url: String,
    isin_base_url: String,
}

impl TwseScraper {
    /// 새 스크래퍼 생성.
    pub fn new(transport: Arc<dyn Transport>, endpoints: &Endpoints) -> Self {
        Self {
            transport,
            base_url: endpoints.twse.clone(),
            isin_base_url: endpoints.twse_isin.clone(),
        }
    }

    /// 일별 리포트 JSON 조회. `stat`이 OK가 아니면 `None`.
    async fn fetch_envelope(&self, path: &str, query: Params) -> Result<Option<TwseResponse>> {
        let url = join_url(&self.base_url, path);
        let body = self.transport.get(&url, &query).await?;
        parse_json_envelope(&body)
    }

    /// 상장/장외 종목 목록 조회.
    ///
    /// 날짜와 무관하며, 목록이 비어 있어도 오류가 아닙니다.
    #[instrument(skip(self))]
    pub async fn fetch_listed_instruments(
        &self,
        market: ListingMarket,
    ) -> Result<Vec<ListedInstrument>> {
        let (market_code, issue_type) = match market {
            ListingMarket::Tse => ("1", "1"),
            ListingMarket::Otc => ("2", "4"),
        };
        let query: Params = vec![
            ("market", market_code.to_string()),
            ("issuetype", issue_type.to_string()),
        ];
        let url = join_url(&self.isin_base_url, ISIN_LISTING_PATH);

        let result = async {
            let body = self.transport.get(&url, &query).await?;
            let html = decode(&body, TextEncoding::Big5)?;
            extract_listed_instruments(&html)
        }
        .await;

        match result {
            Ok(instruments) => {
                tracing::info!(market = %market, count = instruments.len(), "종목 목록 조회 완료");
                Ok(instruments)
            }
            Err(e) => {
                tracing::warn!(market = %market, error = %e, "종목 목록 조회 실패");
                Err(ScraperError::Listing {
                    market,
                    source: Box::new(e),
                })
            }
        }
    }
}

#[async_trait]
impl BoardReportSource for TwseScraper {
    fn provider(&self) -> Provider {
        Provider::Twse
    }

    fn reports(&self) -> &'static [Report] {
        &[
            Report::ListedInstruments,
            Report::MarketTrades,
            Report::MarketBreadth,
            Report::InstInvestorsTrades,
            Report::MarginTransactions,
        ]
    }

    #[instrument(skip(self))]
    async fn fetch_market_trades(&self, date: NaiveDate) -> Result<Option<MarketTrades>> {
        let query: Params = vec![("date", compact_date(date)), ("response", "json".into())];
        let result = async {
            match self.fetch_envelope(MARKET_TRADES_PATH, query).await? {
                Some(response) => extract_market_trades(&response, date),
                None => Ok(None),
            }
        }
        .await;

        settle(Provider::Twse, Report::MarketTrades, date, result)
    }

    #[instrument(skip(self))]
    async fn fetch_market_breadth(&self, date: NaiveDate) -> Result<Option<MarketBreadth>> {
        let query: Params = vec![("date", compact_date(date)), ("response", "json".into())];
        let result = async {
            self.fetch_envelope(MARKET_BREADTH_PATH, query)
                .await?
                .map(|response| extract_market_breadth(&response, date))
                .transpose()
        }
        .await;

        settle(Provider::Twse, Report::MarketBreadth, date, result)
    }

    #[instrument(skip(self))]
    async fn fetch_inst_investors_trades(
        &self,
        date: NaiveDate,
    ) -> Result<Option<InstInvestorsTrades>> {
        let query: Params = vec![
            ("dayDate", compact_date(date)),
            ("type", "day".into()),
            ("response", "json".into()),
        ];
        let result = async {
            self.fetch_envelope(INST_INVESTORS_PATH, query)
                .await?
                .map(|response| extract_inst_investors_trades(&response, date))
                .transpose()
        }
        .await;

        settle(Provider::Twse, Report::InstInvestorsTrades, date, result)
    }

    #[instrument(skip(self))]
    async fn fetch_margin_transactions(
        &self,
        date: NaiveDate,
    ) -> Result<Option<MarginTransactions>> {
        let query: Params = vec![
            ("date", compact_date(date)),
            ("selectType", "MS".into()),
            ("response", "json".into()),
        ];
        let result = async {
            self.fetch_envelope(MARGIN_PATH, query)
                .await?
                .map(|response| extract_margin_transactions(&response, date))
                .transpose()
        }
        .await;

        settle(Provider::Twse, Report::MarginTransactions, date, result)
    }
}
