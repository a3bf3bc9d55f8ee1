//! Taiwan market daily-report collector.
//!
//! 거래소 리포트를 조회해 JSON으로 출력하는 CLI의 실행 로직입니다.

pub mod commands;
pub mod stats;

pub use commands::{collect_daily, daily_plan, fetch_report, today_in_taipei, ReportRequest};
pub use stats::CollectionStats;
