//! Published annual inflation rates (percent), 1995-2024.
//!
//! Static reference data: adding a year means shipping a new build.

/// `(year, inflation %)`, ascending and contiguous.
pub const INFLATION_RATES: &[(i32, f64)] = &[
    (1995, 2.50),
    (1996, 3.30),
    (1997, 1.70),
    (1998, 1.60),
    (1999, 2.70),
    (2000, 3.40),
    (2001, 1.60),
    (2002, 2.40),
    (2003, 1.90),
    (2004, 3.30),
    (2005, 3.40),
    (2006, 2.50),
    (2007, 4.10),
    (2008, 0.10),
    (2009, 2.70),
    (2010, 1.50),
    (2011, 3.00),
    (2012, 1.70),
    (2013, 1.50),
    (2014, 0.80),
    (2015, 0.70),
    (2016, 2.10),
    (2017, 2.10),
    (2018, 1.90),
    (2019, 2.30),
    (2020, 1.40),
    (2021, 7.00),
    (2022, 6.50),
    (2023, 3.40),
    (2024, 2.90),
];

/// Inflation for `year`, or `None` when the table has no entry.
pub fn inflation_for(year: i32) -> Option<f64> {
    INFLATION_RATES
        .binary_search_by_key(&year, |&(y, _)| y)
        .ok()
        .map(|idx| INFLATION_RATES[idx].1)
}

/// Table entries whose year falls in `[start_year, end_year]`.
pub fn inflation_in_range(start_year: i32, end_year: i32) -> impl Iterator<Item = f64> {
    INFLATION_RATES
        .iter()
        .filter(move |&&(y, _)| y >= start_year && y <= end_year)
        .map(|&(_, rate)| rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_and_contiguous() {
        for w in INFLATION_RATES.windows(2) {
            assert_eq!(w[1].0, w[0].0 + 1);
        }
        assert_eq!(INFLATION_RATES.first().map(|e| e.0), Some(1995));
        assert_eq!(INFLATION_RATES.last().map(|e| e.0), Some(2024));
    }

    #[test]
    fn lookup_outside_table_is_absent() {
        assert_eq!(inflation_for(2021), Some(7.00));
        assert_eq!(inflation_for(1994), None);
        assert_eq!(inflation_for(2025), None);
    }

    #[test]
    fn range_excludes_unknown_years() {
        let rates: Vec<f64> = inflation_in_range(2023, 2030).collect();
        assert_eq!(rates, vec![3.40, 2.90]);
        assert_eq!(inflation_in_range(2010, 2005).count(), 0);
    }
}
