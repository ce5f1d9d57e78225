//! The length and first-base filter applied to (possibly trimmed) reads.

use std::{collections::BTreeSet, fmt::Display, str::FromStr};

use clap::{ArgEnum, PossibleValue};
use itertools::Itertools;
use thiserror::Error;

/// The default set of allowed first bases.
pub const DEFAULT_FIRST_BASES: &str = "A,T,G,C";
/// The default inclusive size range.
pub const DEFAULT_SIZE_RANGE: &str = "18,30";

/// Values accepted as an unbounded maximum size.
const UNBOUNDED: &[&str] = &["", "inf", "max"];

/// The errors that occur when parsing filter options.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FilterParamError {
    #[error("Invalid first base `{0}`, expected a single letter")]
    InvalidBase(String),

    #[error("At least one allowed first base must be given")]
    NoBases,

    #[error("Invalid size range `{0}`, expected `min,max`")]
    InvalidRange(String),

    #[error("Invalid size range `{range}`: min size {min} is greater than max size {max}")]
    MinAboveMax { range: String, min: usize, max: usize },
}

/// The set of bases a read may start with, stored upper-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstBases(BTreeSet<u8>);

impl FirstBases {
    /// True if `base`, upper-cased, is in the set.
    pub fn contains(&self, base: u8) -> bool {
        self.0.contains(&base.to_ascii_uppercase())
    }
}

impl FromStr for FirstBases {
    type Err = FilterParamError;

    /// Parse a comma separated list of bases, e.g. `A,T,G,C`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bases = BTreeSet::new();
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.as_bytes() {
                [b] if b.is_ascii_alphabetic() => {
                    bases.insert(b.to_ascii_uppercase());
                }
                _ => return Err(FilterParamError::InvalidBase(token.to_string())),
            }
        }
        if bases.is_empty() {
            return Err(FilterParamError::NoBases);
        }
        Ok(Self(bases))
    }
}

impl Display for FirstBases {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().map(|b| *b as char).join(","))
    }
}

/// An inclusive range of read lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRange {
    pub min: usize,
    pub max: usize,
}

impl SizeRange {
    /// Create a new [`SizeRange`], `min` must not exceed `max`.
    pub fn new(min: usize, max: usize) -> Result<Self, FilterParamError> {
        if min > max {
            return Err(FilterParamError::MinAboveMax { range: format!("{},{}", min, max), min, max });
        }
        Ok(Self { min, max })
    }

    /// True if `len` lies within the range, both ends included.
    pub fn contains(&self, len: usize) -> bool {
        self.min <= len && len <= self.max
    }
}

impl FromStr for SizeRange {
    type Err = FilterParamError;

    /// Parse `min,max`.  The max may be `inf`, `max` or empty for no upper bound.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FilterParamError::InvalidRange(s.to_string());
        let (min, max) = s.split_once(',').ok_or_else(invalid)?;
        let min: usize = min.trim().parse().map_err(|_| invalid())?;
        let max = max.trim();
        let max: usize = if UNBOUNDED.contains(&max.to_ascii_lowercase().as_str()) {
            usize::MAX
        } else {
            max.parse().map_err(|_| invalid())?
        };
        if min > max {
            return Err(FilterParamError::MinAboveMax { range: s.to_string(), min, max });
        }
        Ok(Self { min, max })
    }
}

impl Display for SizeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.max == usize::MAX {
            write!(f, "{},inf", self.min)
        } else {
            write!(f, "{},{}", self.min, self.max)
        }
    }
}

/// Well known small RNA classes that fix both the first base and the length.
#[derive(ArgEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmallRnaClass {
    /// 22 nt reads starting with G.
    #[clap(name = "22g")]
    G22,
    /// 21 nt reads starting with T (U).
    #[clap(name = "21u")]
    U21,
}

impl SmallRnaClass {
    pub fn possible_values<'a>() -> impl Iterator<Item = PossibleValue<'a>> {
        SmallRnaClass::value_variants().iter().filter_map(ArgEnum::to_possible_value)
    }

    /// The filter selecting this class.
    pub fn filter_params(self) -> FilterParams {
        let (base, len) = match self {
            SmallRnaClass::G22 => (b'G', 22),
            SmallRnaClass::U21 => (b'T', 21),
        };
        FilterParams {
            first_bases: FirstBases(BTreeSet::from([base])),
            size_range: SizeRange { min: len, max: len },
        }
    }
}

impl FromStr for SmallRnaClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for variant in Self::value_variants() {
            if variant.to_possible_value().unwrap().matches(s, true) {
                return Ok(*variant);
            }
        }
        Err(anyhow::anyhow!("Invalid small RNA class: {}", s))
    }
}

/// The parameters of the read filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterParams {
    pub first_bases: FirstBases,
    pub size_range: SizeRange,
}

impl FilterParams {
    pub fn new(first_bases: FirstBases, size_range: SizeRange) -> Self {
        Self { first_bases, size_range }
    }

    /// True if a read with sequence `seq` should be kept.
    ///
    /// The read must be non-empty, have a length within the size range and start with one of the
    /// allowed bases (ignoring case).
    pub fn keep(&self, seq: &[u8]) -> bool {
        match seq.first() {
            Some(first) => self.size_range.contains(seq.len()) && self.first_bases.contains(*first),
            None => false,
        }
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            first_bases: FirstBases::from_str(DEFAULT_FIRST_BASES).unwrap(),
            size_range: SizeRange::from_str(DEFAULT_SIZE_RANGE).unwrap(),
        }
    }
}
