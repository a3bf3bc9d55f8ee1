//! 파생 지표 계산.
//!
//! 이미 추출된 레코드(또는 파싱된 숫자)만으로 계산하는 순수 함수들입니다.
//! 입력 중 하나라도 없으면 결과도 없습니다. 부분 계산은 하지 않습니다.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::Result;
use crate::records::{
    InstInvestorsMxfOi, LargeTradersTxPosition, MarginTransactions, MxfMarketOi, RetailMxPosition,
};
use crate::table::value_at;

/// 비율 소수점 자리수.
pub const RATIO_DECIMAL_PLACES: u32 = 4;

/// 개인투자자 MXF 포지션 계산.
///
/// - 개인 매수 = 시장 OI - 법인 매수 OI
/// - 개인 매도 = 시장 OI - 법인 매도 OI
/// - 개인 순포지션 = 개인 매수 - 개인 매도
/// - 비율 = round(순포지션 / 시장 OI, 4), 0.5는 0에서 먼 쪽으로 반올림
pub fn compose_retail_position(
    market: Option<&MxfMarketOi>,
    institutional: Option<&InstInvestorsMxfOi>,
) -> Option<RetailMxPosition> {
    let (market, institutional) = (market?, institutional?);
    let market_oi = market.mxf_market_oi;

    let retail_mxf_long_oi = market_oi - institutional.inst_investors_mxf_long_oi;
    let retail_mxf_short_oi = market_oi - institutional.inst_investors_mxf_short_oi;
    let retail_mxf_net_oi = retail_mxf_long_oi - retail_mxf_short_oi;
    let retail_mxf_long_short_ratio = ratio(retail_mxf_net_oi, market_oi);

    Some(RetailMxPosition {
        date: market.date,
        retail_mxf_long_oi,
        retail_mxf_short_oi,
        retail_mxf_net_oi,
        retail_mxf_long_short_ratio,
    })
}

/// `numerator / denominator`를 소수점 4자리로 반올림. 분모가 0이면 0.
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator
        .checked_div(denominator)
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(RATIO_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// 매수/매도 미결제약정 한 쌍.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LongShort {
    pub long: Decimal,
    pub short: Decimal,
}

impl LongShort {
    pub fn new(long: Decimal, short: Decimal) -> Self {
        Self { long, short }
    }

    /// 순포지션 (매수 - 매도).
    pub fn net(&self) -> Decimal {
        self.long - self.short
    }
}

/// 대형 거래자 리포트에서 읽은 다섯 값.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LargeTraderRows {
    /// 근월물, 상위 10 전체
    pub front_month_all: LongShort,
    /// 근월물, 상위 10 중 특정법인
    pub front_month_specific: LongShort,
    /// 전체 월물, 상위 10 전체
    pub all_months_all: LongShort,
    /// 전체 월물, 상위 10 중 특정법인
    pub all_months_specific: LongShort,
    /// 전체 월물 시장 미결제약정
    pub all_months_market_oi: Decimal,
}

/// 대형 거래자 계층 순포지션 계산.
///
/// 뒤 단계 값이 앞 단계 값에 의존하므로 아래 순서대로 계산합니다.
pub fn net_large_traders(date: NaiveDate, rows: &LargeTraderRows) -> LargeTradersTxPosition {
    // 근월물
    let front_month_net = rows.front_month_all.net();
    let specific_front_month_net = rows.front_month_specific.net();
    let nonspecific_front_month_net = front_month_net - specific_front_month_net;

    // 전체 월물
    let all_months_net = rows.all_months_all.net();
    let specific_all_months_net = rows.all_months_specific.net();
    let nonspecific_all_months_net = all_months_net - specific_all_months_net;

    // 원월물 = 전체 월물 - 근월물
    let specific_back_months_net = specific_all_months_net - specific_front_month_net;
    let nonspecific_back_months_net = nonspecific_all_months_net - nonspecific_front_month_net;

    LargeTradersTxPosition {
        date,
        top_ten_specific_front_month_net_oi: specific_front_month_net,
        top_ten_specific_back_months_txf_net_oi: specific_back_months_net,
        top_ten_nonspecific_front_month_txf_net_oi: nonspecific_front_month_net,
        top_ten_nonspecific_back_months_txf_net_oi: nonspecific_back_months_net,
        all_months_txf_market_oi: rows.all_months_market_oi,
    }
}

/// 신용거래 잔고 값 위치 (평탄화된 숫자 목록 기준).
///
/// 각 항목은 `(현재 잔고 위치, 전일 잔고 위치)`입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarginOffsets {
    pub margin_balance: (usize, usize),
    pub margin_balance_value: (usize, usize),
    pub short_balance: (usize, usize),
}

/// 같은 응답 안의 현재/전일 잔고로 증감을 계산.
pub fn margin_balance_changes(
    date: NaiveDate,
    values: &[Decimal],
    offsets: &MarginOffsets,
) -> Result<MarginTransactions> {
    let delta = |(current, prior): (usize, usize)| -> Result<(Decimal, Decimal)> {
        let current = value_at(values, current)?;
        let prior = value_at(values, prior)?;
        Ok((current, current - prior))
    };

    let (margin_balance, margin_balance_change) = delta(offsets.margin_balance)?;
    let (margin_balance_value, margin_balance_value_change) = delta(offsets.margin_balance_value)?;
    let (short_balance, short_balance_change) = delta(offsets.short_balance)?;

    Ok(MarginTransactions {
        date,
        margin_balance,
        margin_balance_change,
        margin_balance_value,
        margin_balance_value_change,
        short_balance,
        short_balance_change,
    })
}
