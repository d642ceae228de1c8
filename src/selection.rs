use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::SelectionError;
use crate::types::CountryRecord;

/// The census years present in the population table, in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Year {
    Y1970,
    Y1980,
    Y1990,
    Y2000,
    Y2010,
    Y2015,
    Y2020,
    Y2022,
}

impl Year {
    pub const COUNT: usize = 8;

    pub const ALL: [Year; Year::COUNT] = [
        Year::Y1970,
        Year::Y1980,
        Year::Y1990,
        Year::Y2000,
        Year::Y2010,
        Year::Y2015,
        Year::Y2020,
        Year::Y2022,
    ];

    pub const fn value(self) -> u16 {
        match self {
            Year::Y1970 => 1970,
            Year::Y1980 => 1980,
            Year::Y1990 => 1990,
            Year::Y2000 => 2000,
            Year::Y2010 => 2010,
            Year::Y2015 => 2015,
            Year::Y2020 => 2020,
            Year::Y2022 => 2022,
        }
    }

    /// Position in `Year::ALL`.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_value(value: u16) -> Option<Year> {
        Year::ALL.into_iter().find(|y| y.value() == value)
    }

    /// Column header and selector option, e.g. `"1970 Population"`.
    pub fn label(self) -> String {
        format!("{} Population", self.value())
    }

    /// Accepts either the full label (`"2020 Population"`) or the bare year.
    pub fn parse_label(label: &str) -> Result<Year, SelectionError> {
        let trimmed = label.trim();
        let year_part = trimmed
            .strip_suffix("Population")
            .map(str::trim_end)
            .unwrap_or(trimmed);

        year_part
            .parse::<u16>()
            .ok()
            .and_then(Year::from_value)
            .ok_or_else(|| SelectionError::UnknownYear(label.to_string()))
    }

    pub fn labels() -> Vec<String> {
        Year::ALL.iter().map(|y| y.label()).collect()
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl Serialize for Year {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.value())
    }
}

/// What the user picked for the current render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub country: Option<String>,
    pub years: BTreeSet<Year>,
}

impl Selection {
    /// An empty or whitespace-only country means nothing is selected.
    pub fn new(country: Option<&str>, years: BTreeSet<Year>) -> Self {
        let country = country
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Selection { country, years }
    }

    pub fn from_labels<I, S>(country: Option<&str>, labels: I) -> Result<Self, SelectionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let years = labels
            .into_iter()
            .map(|l| Year::parse_label(l.as_ref()))
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Selection::new(country, years))
    }

    /// Parses a comma separated list of year labels, as sent in a query string.
    pub fn parse_year_list(list: &str) -> Result<BTreeSet<Year>, SelectionError> {
        list.split(',')
            .filter(|s| !s.trim().is_empty())
            .map(Year::parse_label)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PopulationPoint {
    pub year: Year,
    pub population: u64,
}

/// Population of `record` for each chosen year, in chronological order.
pub fn filter_population(record: &CountryRecord, chosen_years: &BTreeSet<Year>) -> Vec<PopulationPoint> {
    Year::ALL
        .iter()
        .filter(|year| chosen_years.contains(year))
        .map(|&year| PopulationPoint {
            year,
            population: record.population_at(year),
        })
        .collect()
}
