//! Cálculo de tarifas
//!
//! `fee = max(minimum_fee, ceil(minutos) * per_minute_rate)`: cualquier
//! fracción de minuto se cobra como minuto completo.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::utils::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeCalculator {
    per_minute_rate: Decimal,
    minimum_fee: Decimal,
}

impl FeeCalculator {
    pub fn new(per_minute_rate: Decimal, minimum_fee: Decimal) -> Self {
        Self {
            per_minute_rate,
            minimum_fee,
        }
    }

    pub fn per_minute_rate(&self) -> Decimal {
        self.per_minute_rate
    }

    pub fn minimum_fee(&self) -> Decimal {
        self.minimum_fee
    }

    /// Minutos facturables de un intervalo, redondeando hacia arriba
    pub fn billable_minutes(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> AppResult<i64> {
        if ended_at < started_at {
            return Err(AppError::InvalidInput(format!(
                "Rental cannot end ({}) before it started ({})",
                ended_at.to_rfc3339(),
                started_at.to_rfc3339()
            )));
        }

        let elapsed = ended_at - started_at;
        let whole_minutes = elapsed.num_minutes();
        let remainder = elapsed - Duration::minutes(whole_minutes);

        Ok(if remainder > Duration::zero() {
            whole_minutes + 1
        } else {
            whole_minutes
        })
    }

    pub fn fee(&self, started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> AppResult<Decimal> {
        let minutes = Self::billable_minutes(started_at, ended_at)?;
        let usage = Decimal::from(minutes) * self.per_minute_rate;
        Ok(usage.max(self.minimum_fee))
    }
}

impl Default for FeeCalculator {
    /// 0.5 por minuto, mínimo 1.0
    fn default() -> Self {
        Self::new(Decimal::new(5, 1), Decimal::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_partial_minutes_are_billed_in_full() {
        let calc = FeeCalculator::default();
        let fee = calc.fee(t0(), t0() + Duration::seconds(150)).unwrap();
        assert_eq!(fee, Decimal::new(15, 1));
    }

    #[test]
    fn test_exact_minutes_are_not_rounded_up() {
        assert_eq!(
            FeeCalculator::billable_minutes(t0(), t0() + Duration::minutes(4)).unwrap(),
            4
        );
        assert_eq!(
            FeeCalculator::billable_minutes(t0(), t0() + Duration::milliseconds(240_001)).unwrap(),
            5
        );
    }

    #[test]
    fn test_short_rentals_pay_minimum_fee() {
        let calc = FeeCalculator::default();
        for secs in [0, 1, 30, 59, 60, 120] {
            let fee = calc.fee(t0(), t0() + Duration::seconds(secs)).unwrap();
            assert_eq!(fee, Decimal::ONE, "duration {}s", secs);
        }
        let fee = calc.fee(t0(), t0() + Duration::seconds(121)).unwrap();
        assert_eq!(fee, Decimal::new(15, 1));
    }

    #[test]
    fn test_fee_is_monotonic() {
        let calc = FeeCalculator::new(Decimal::new(3, 1), Decimal::new(2, 0));
        let mut previous = Decimal::ZERO;
        for secs in (0..3600).step_by(7) {
            let fee = calc.fee(t0(), t0() + Duration::seconds(secs)).unwrap();
            assert!(fee >= previous, "fee dropped at {}s", secs);
            assert!(fee >= calc.minimum_fee());
            previous = fee;
        }
    }

    #[test]
    fn test_negative_interval_is_rejected() {
        let calc = FeeCalculator::default();
        let err = calc.fee(t0(), t0() - Duration::seconds(1)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
