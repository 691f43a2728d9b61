// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod memory;
mod server;

pub use memory::MemoryAccountService;
pub use server::{MockAccountServer, RecordedRequest};

use stationbook_app::{Account, AccountFields, AccountId};

const STREET_NAMES: [&str; 18] = [
    "Cedar",
    "Maple",
    "Oak",
    "Pine",
    "Willow",
    "Elm",
    "Birch",
    "Juniper",
    "Sunset",
    "Ridge",
    "Valley",
    "Lakeview",
    "Northview",
    "Hillcrest",
    "Brookside",
    "Meadow",
    "Aspen",
    "Canyon",
];

const SITE_SUFFIXES: [&str; 8] = [
    "St", "Rd", "Depot", "Yard", "Plaza", "Junction", "Terminal", "Crossing",
];

const STATION_BRANDS: [&str; 12] = [
    "Shell",
    "Chevron",
    "Texaco",
    "BP",
    "Exxon",
    "Mobil",
    "Sunoco",
    "Valero",
    "Citgo",
    "Marathon",
    "Phillips 66",
    "Circle K",
];

const STATION_QUALIFIERS: [&str; 6] = ["", "Express", "Truck Stop", "Station", "Fuel", "Center"];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for plausible account records.
#[derive(Debug, Clone)]
pub struct AccountFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl AccountFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn fields(&mut self) -> AccountFields {
        let site_name = format!(
            "{} {}",
            self.pick(&STREET_NAMES),
            self.pick(&SITE_SUFFIXES)
        );
        let brand = self.pick(&STATION_BRANDS);
        let qualifier = self.pick(&STATION_QUALIFIERS);
        let service_station = if qualifier.is_empty() {
            brand.to_owned()
        } else {
            format!("{brand} {qualifier}")
        };
        let digits = 4 + self.rng.int_n(4);
        let account_number = (0..digits)
            .map(|index| {
                let digit = self.rng.int_n(10);
                // no leading zero
                if index == 0 && digit == 0 { 1 } else { digit }
            })
            .map(|digit| char::from(b'0' + digit as u8))
            .collect();

        AccountFields {
            site_name,
            service_station,
            account_number,
        }
    }

    /// `count` accounts with ids `1..=count`.
    pub fn accounts(&mut self, count: usize) -> Vec<Account> {
        (1..=count)
            .map(|id| Account::with_fields(AccountId::new(id as i64), self.fields()))
            .collect()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

pub fn station_brands() -> &'static [&'static str] {
    &STATION_BRANDS
}
