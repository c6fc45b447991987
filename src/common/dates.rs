// src/common/dates.rs

use chrono::{Datelike, Days, NaiveDate};

/// Soma `months` meses a `date` com "estouro" do dia para o mês seguinte,
/// como faz o `Date.setMonth` do navegador: 31/01 + 1 mês = 03/03 (ano não bissexto).
pub fn add_months_rollover(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let month_index = date.year() * 12 + date.month0() as i32 + months as i32;
    let year = month_index.div_euclid(12);
    let month = month_index.rem_euclid(12) as u32 + 1;

    NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_days(Days::new(date.day0() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn adds_plain_months() {
        assert_eq!(add_months_rollover(ymd(2025, 3, 10), 0), Some(ymd(2025, 3, 10)));
        assert_eq!(add_months_rollover(ymd(2025, 3, 10), 2), Some(ymd(2025, 5, 10)));
    }

    #[test]
    fn crosses_year_boundary() {
        assert_eq!(add_months_rollover(ymd(2025, 11, 15), 3), Some(ymd(2026, 2, 15)));
    }

    #[test]
    fn month_end_overflows_into_next_month() {
        assert_eq!(add_months_rollover(ymd(2025, 1, 31), 1), Some(ymd(2025, 3, 3)));
        // 2024 é bissexto: 31/01 + 1 mês = 02/03
        assert_eq!(add_months_rollover(ymd(2024, 1, 31), 1), Some(ymd(2024, 3, 2)));
        assert_eq!(add_months_rollover(ymd(2025, 3, 31), 1), Some(ymd(2025, 5, 1)));
    }
}
