//! 수집 통계 구조체.

use serde::Serialize;
use std::time::Duration;

/// 일괄 수집 통계
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionStats {
    /// 조회한 리포트 수
    pub total: usize,
    /// 데이터가 있었던 리포트 수
    pub present: usize,
    /// 데이터가 없었던 리포트 수 (휴장일 등)
    pub absent: usize,
    /// 실패한 리포트 수
    pub errors: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 리포트 하나의 결과 기록.
    pub fn record<T, E>(&mut self, result: &Result<Option<T>, E>) {
        self.total += 1;
        match result {
            Ok(Some(_)) => self.present += 1,
            Ok(None) => self.absent += 1,
            Err(_) => self.errors += 1,
        }
    }

    /// 데이터가 있었던 비율 (%)
    pub fn coverage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.present as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            present = self.present,
            absent = self.absent,
            errors = self.errors,
            coverage = format!("{:.1}%", self.coverage()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}
