use super::{ensure_non_negative, ensure_positive, monthly_rate, CalcError};
use chrono::{Months, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRow {
    pub period: u32,
    pub due_date: Option<NaiveDate>,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub balance: f64,
}

/// Rounding drift tolerated per elapsed period: half a rupee from the
/// rounded installment plus half a rupee from the rounded interest.
const DRIFT_PER_PERIOD: f64 = 1.0;

/// Split each installment into interest and principal.
///
/// Interest is `round(balance * r)`; the principal part is the rest of the
/// installment, clamped to what is still owed. The last requested period also
/// settles a residue no larger than the accumulated rounding drift, so a
/// full-tenure schedule ends at exactly zero. A shorter preview keeps its real
/// closing balance. Stops early once the balance is repaid.
pub fn amortization_schedule(
    principal: f64,
    annual_rate_percent: f64,
    emi: f64,
    periods: u32,
) -> Result<Vec<ScheduleRow>, CalcError> {
    ensure_positive("principal", principal)?;
    ensure_non_negative("annual_rate_percent", annual_rate_percent)?;
    ensure_positive("emi", emi)?;
    if periods == 0 {
        return Err(CalcError::invalid("periods", "at least one period", 0.0));
    }

    let r = monthly_rate(annual_rate_percent);
    let mut balance = principal;
    let mut rows = Vec::new();

    for period in 1..=periods {
        if balance <= 0.0 {
            break;
        }
        let interest = (balance * r).round();
        let mut principal_part = emi - interest;
        if principal_part <= 0.0 {
            return Err(CalcError::NonAmortizing {
                period,
                installment: emi,
                interest,
            });
        }
        let residue = balance - principal_part;
        let drift = DRIFT_PER_PERIOD * f64::from(period);
        if residue <= 0.0 || (period == periods && residue <= drift) {
            principal_part = balance;
        }
        balance -= principal_part;

        rows.push(ScheduleRow {
            period,
            due_date: None,
            payment: interest + principal_part,
            interest,
            principal: principal_part,
            balance,
        });
    }

    Ok(rows)
}

/// Stamp monthly due dates starting at `first_due`. Month-end dates clamp
/// (31 Jan → 29 Feb in a leap year).
pub fn stamp_due_dates(rows: &mut [ScheduleRow], first_due: NaiveDate) {
    for row in rows {
        row.due_date = first_due.checked_add_months(Months::new(row.period.saturating_sub(1)));
    }
}

pub fn write_schedule_csv<W: std::io::Write>(
    rows: &[ScheduleRow],
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::monthly_installment;

    #[test]
    fn full_tenure_ends_at_zero_and_interest_matches_annuity() {
        let emi = monthly_installment(250_000.0, 8.5, 120).unwrap();
        let rows = amortization_schedule(250_000.0, 8.5, emi, 120).unwrap();

        assert_eq!(rows.len(), 120);
        assert_eq!(rows.last().map(|r| r.balance), Some(0.0));

        let interest: f64 = rows.iter().map(|r| r.interest).sum();
        let expected = emi * 120.0 - 250_000.0;
        // One half-rupee of rounding per period at most.
        assert!((interest - expected).abs() <= 60.0, "{interest} vs {expected}");

        let repaid: f64 = rows.iter().map(|r| r.principal).sum();
        assert!((repaid - 250_000.0).abs() < 1e-6);
    }

    #[test]
    fn first_rows_match_dashboard_breakdown() {
        let rows = amortization_schedule(250_000.0, 8.5, 3_100.0, 120).unwrap();
        assert_eq!(rows[0].interest, 1_771.0);
        assert_eq!(rows[0].principal, 1_329.0);
        assert_eq!(rows[0].balance, 248_671.0);
        assert_eq!(rows[0].payment, 3_100.0);
    }

    #[test]
    fn rounded_installment_settles_in_final_period() {
        let rows = amortization_schedule(250_000.0, 8.5, 3_100.0, 120).unwrap();
        let last = rows.last().unwrap();
        assert_eq!(last.period, 120);
        assert_eq!(last.balance, 0.0);
        assert!(last.payment < 3_100.0);
        assert!(rows.iter().all(|r| r.balance >= 0.0));
    }

    #[test]
    fn partial_schedule_stops_after_requested_periods() {
        let emi = monthly_installment(250_000.0, 8.5, 120).unwrap();
        let rows = amortization_schedule(250_000.0, 8.5, emi, 6).unwrap();
        assert_eq!(rows.len(), 6);
        assert!(rows[5].balance > 200_000.0);
        assert!(rows.iter().all(|r| (r.payment - emi).abs() < 1e-9));
    }

    #[test]
    fn preview_one_short_of_tenure_keeps_last_installment_outstanding() {
        let emi = monthly_installment(250_000.0, 8.5, 120).unwrap();
        let rows = amortization_schedule(250_000.0, 8.5, emi, 119).unwrap();
        assert_eq!(rows.len(), 119);
        let last = rows.last().unwrap();
        assert!((last.payment - emi).abs() < 1e-9, "{last:?}");
        assert!(last.balance > 3_000.0 && last.balance < emi, "{last:?}");
    }

    #[test]
    fn short_preview_does_not_settle_a_whole_installment() {
        let rows = amortization_schedule(10_000.0, 12.0, 3_000.0, 3).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.payment == 3_000.0));
        assert_eq!(rows[2].balance, 1_213.0);

        let full = amortization_schedule(10_000.0, 12.0, 3_000.0, 4).unwrap();
        assert_eq!(full.len(), 4);
        assert_eq!(full[3].principal, 1_213.0);
        assert_eq!(full[3].payment, 1_225.0);
        assert_eq!(full[3].balance, 0.0);
    }

    #[test]
    fn huge_period_count_stops_at_payoff() {
        let rows = amortization_schedule(1_200.0, 0.0, 1_200.0, u32::MAX).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].balance, 0.0);
    }

    #[test]
    fn overpaying_installment_terminates_early_without_negative_balance() {
        let rows = amortization_schedule(10_000.0, 12.0, 6_000.0, 12).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].principal, 5_900.0);
        assert_eq!(rows[1].principal, 4_100.0);
        assert_eq!(rows[1].balance, 0.0);
    }

    #[test]
    fn zero_rate_schedule_is_straight_line() {
        let rows = amortization_schedule(1_200.0, 0.0, 100.0, 12).unwrap();
        assert!(rows.iter().all(|r| r.interest == 0.0 && r.principal == 100.0));
        assert_eq!(rows[11].balance, 0.0);
    }

    #[test]
    fn installment_below_interest_is_rejected() {
        let err = amortization_schedule(1_000_000.0, 12.0, 5_000.0, 12).unwrap_err();
        assert!(matches!(err, CalcError::NonAmortizing { period: 1, .. }));
    }

    #[test]
    fn due_dates_step_monthly_and_clamp() {
        let mut rows = amortization_schedule(1_200.0, 0.0, 100.0, 3).unwrap();
        stamp_due_dates(&mut rows, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        let dates: Vec<_> = rows.iter().filter_map(|r| r.due_date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            ]
        );
    }

    #[test]
    fn csv_export_has_header_and_rows() {
        let rows = amortization_schedule(1_200.0, 0.0, 600.0, 2).unwrap();
        let mut out = Vec::new();
        write_schedule_csv(&rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("period,due_date,payment,interest,principal,balance")
        );
        assert_eq!(lines.next(), Some("1,,600.0,0.0,600.0,600.0"));
        assert_eq!(lines.next(), Some("2,,600.0,0.0,600.0,0.0"));
    }
}
