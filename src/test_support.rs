use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;
use time::{Date, Month};

use crate::model::{Period, ProviderRecord, ReferenceRow, ReferenceSegment};

/// Synthetic security master and a provider panel observing it.
#[derive(Debug, Clone)]
pub struct GeneratedUniverse {
    pub reference: Vec<ReferenceSegment>,
    pub panel: Vec<ProviderRecord>,
}

/// Issuer CUSIP6 of generated security `i`, zero-padded.
pub fn cusip6_for(i: u32) -> String {
    format!("{:06}", i)
}

/// Ticker of generated security `i`: four letters, unique for `i < 26^4`.
pub fn ticker_for(i: u32) -> String {
    let mut value = i;
    let mut letters = [b'A'; 4];
    for slot in letters.iter_mut().rev() {
        *slot = b'A' + (value % 26) as u8;
        value /= 26;
    }
    String::from_utf8_lossy(&letters).into_owned()
}

/// Entity key holding security `i` before any corporate action.
pub fn entity_key_for(i: u32) -> String {
    format!("{}", 1_000 + i)
}

/// Entity key holding security `i` after a corporate action.
pub fn successor_key_for(i: u32) -> String {
    format!("{}", 500_000 + i)
}

fn january_first(year: i32) -> Date {
    Date::from_calendar_date(year, Month::January, 1).expect("valid date")
}

/// One security per `i` in `1..=securities`, some split by a corporate action
/// that hands the security to a successor entity key.
pub fn generate_reference(
    securities: u32,
    corporate_action_probability: f64,
    seed: u64,
) -> Vec<ReferenceSegment> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut segments = Vec::with_capacity(securities as usize);

    for i in 1..=securities {
        let start = january_first(rng.random_range(1990..2010));
        let share_code = if rng.random_bool(0.9) { 11 } else { 73 };
        let exchange_code = rng.random_range(1..=3);
        let link_primary = if rng.random_bool(0.8) { "P" } else { "J" };
        let row = |entity_key: String, from: Date, to: Option<Date>| ReferenceRow {
            entity_key,
            security_key: format!("{}", 10_000 + i),
            valid_from: from,
            valid_to: to,
            cusip: Some(cusip6_for(i)),
            ticker: Some(ticker_for(i)),
            share_code: Some(share_code),
            exchange_code: Some(exchange_code),
            link_primary: Some(link_primary.to_string()),
            link_type: Some("LC".to_string()),
            primary_security: Some("1".to_string()),
        };

        if rng.random_bool(corporate_action_probability) {
            let split = january_first(rng.random_range(2012..2020));
            segments.push(row(entity_key_for(i), start, Some(split)).into_segment());
            segments.push(row(successor_key_for(i), split, None).into_segment());
        } else {
            segments.push(row(entity_key_for(i), start, None).into_segment());
        }
    }

    segments
}

/// Entity `E{i}` observes security `i` in each year of `years` with some
/// probability, carrying a random subset of its identifiers. Every tenth
/// entity also reports an unknown ticker only.
pub fn generate_panel(
    securities: u32,
    years: RangeInclusive<i32>,
    seed: u64,
) -> Vec<ProviderRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut records = Vec::new();

    for i in 1..=securities {
        for year in years.clone() {
            if !rng.random_bool(0.85) {
                continue;
            }
            let cusip = format!("{}101", cusip6_for(i));
            let mut record = ProviderRecord::new(format!("E{i}"), Period::Year(year))
                .with_name(format!("Issuer {i}"));
            // Numeric storage upstream drops leading zeros.
            if rng.random_bool(0.6) {
                record = record.with_cusip(cusip.trim_start_matches('0'));
            }
            if rng.random_bool(0.7) {
                record = record.with_isin(format!("US{cusip}0"));
            }
            if rng.random_bool(0.8) {
                record = record.with_ticker(ticker_for(i));
            }
            records.push(record);
        }
        if i % 10 == 0 {
            records.push(
                ProviderRecord::new(format!("X{i}"), Period::Year(*years.end()))
                    .with_ticker("ZZZZ"),
            );
        }
    }

    records
}

pub fn generate_universe(securities: u32, seed: u64) -> GeneratedUniverse {
    GeneratedUniverse {
        reference: generate_reference(securities, 0.2, seed),
        panel: generate_panel(securities, 2015..=2022, seed.wrapping_add(1)),
    }
}

/// Copy of `items` in a seeded random order.
pub fn shuffled<T: Clone>(items: &[T], seed: u64) -> Vec<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = items.to_vec();
    out.shuffle(&mut rng);
    out
}
