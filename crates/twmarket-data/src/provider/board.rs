//! 주식 시장(TWSE, TPEx) 공통 리포트 인터페이스와 공통 레이아웃.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use twmarket_core::calendar::parse_roc_date;
use twmarket_core::{
    InstInvestorsTrades, MarginTransactions, MarketBreadth, MarketTrades, Provider, RawRow, Report,
    Result, ScraperError,
};

/// 주식 시장 일별 리포트 Provider trait.
#[async_trait]
pub trait BoardReportSource: Send + Sync {
    /// 거래소 식별자.
    fn provider(&self) -> Provider;

    /// 이 거래소에서 조회할 수 있는 리포트.
    fn reports(&self) -> &'static [Report];

    /// 시장 전체 거래량/거래대금.
    async fn fetch_market_trades(&self, date: NaiveDate) -> Result<Option<MarketTrades>>;

    /// 등락 종목 수.
    async fn fetch_market_breadth(&self, date: NaiveDate) -> Result<Option<MarketBreadth>>;

    /// 3대 법인 순매수.
    async fn fetch_inst_investors_trades(
        &self,
        date: NaiveDate,
    ) -> Result<Option<InstInvestorsTrades>>;

    /// 신용거래 잔고.
    async fn fetch_margin_transactions(
        &self,
        date: NaiveDate,
    ) -> Result<Option<MarginTransactions>>;
}

/// 일별 시장 거래 표 (TWSE FMTQIK, TPEx st41) 열 위치.
///
/// 두 거래소가 같은 열 구성을 사용합니다.
pub mod daily_trades {
    /// 민국력 날짜 (`113/01/02`)
    pub const DATE: usize = 0;
    pub const TRADE_VOLUME: usize = 1;
    pub const TRADE_VALUE: usize = 2;
    pub const TRANSACTION: usize = 3;
    pub const PRICE: usize = 4;
    pub const CHANGE: usize = 5;
}

/// 여러 날짜가 담긴 월간 표에서 요청 날짜 행을 찾아 변환합니다.
///
/// 요청 날짜 행이 없으면 `None`.
pub fn market_trades_from_rows(rows: &[RawRow], date: NaiveDate) -> Result<Option<MarketTrades>> {
    for row in rows {
        if parse_roc_date(row.cell(daily_trades::DATE)?)? != date {
            continue;
        }

        return Ok(Some(MarketTrades {
            date,
            trade_volume: row.number(daily_trades::TRADE_VOLUME)?,
            trade_value: row.number(daily_trades::TRADE_VALUE)?,
            transaction: row.number(daily_trades::TRANSACTION)?,
            price: row.number(daily_trades::PRICE)?,
            change: row.number(daily_trades::CHANGE)?,
        }));
    }

    Ok(None)
}

/// `"4,567(123)"` 형식 셀을 `(4567, 123)`으로 분리 (종목 수, 상/하한가 종목 수).
pub fn split_count_with_limit(cell: &str) -> Result<(Decimal, Decimal)> {
    let (count, limit) = cell
        .trim()
        .trim_end_matches(')')
        .split_once('(')
        .ok_or_else(|| ScraperError::Parse(format!("`수(상하한)` 형식 아님: {:?}", cell)))?;

    Ok((
        twmarket_core::parse_number(count)?,
        twmarket_core::parse_number(limit)?,
    ))
}
