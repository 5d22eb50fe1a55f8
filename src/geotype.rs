//! Geotypes classify assets by the size of the exchange serving them and by line length.
use crate::units::Mbps;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

/// Line lengths (m) at or below which smaller exchanges count as variant (a)
const SHORT_LINE_LENGTH_SMALL_EXCHANGE: f64 = 1000.0;

/// Line lengths (m) at or below which exchanges of 10,000+ premises count as variant (a)
const SHORT_LINE_LENGTH_LARGE_EXCHANGE: f64 = 2000.0;

/// A classification bucket derived from premises density.
///
/// Variants are listed in order of geotype number (1-13), densest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum Geotype {
    /// Inner London exchanges
    #[string = "Inner London"]
    InnerLondon,
    /// Exchanges in large cities
    #[string = "Large City"]
    LargeCity,
    /// Exchanges in small cities
    #[string = "Small City"]
    SmallCity,
    /// Exchanges of 20,000+ premises, short lines
    #[string = "Above 20,000 (a)"]
    Above20kShort,
    /// Exchanges of 20,000+ premises, long lines
    #[string = "Above 20,000 (b)"]
    Above20kLong,
    /// Exchanges of 10,000-19,999 premises, short lines
    #[string = "Above 10,000 (a)"]
    Above10kShort,
    /// Exchanges of 10,000-19,999 premises, long lines
    #[string = "Above 10,000 (b)"]
    Above10kLong,
    /// Exchanges of 3,000-9,999 premises, short lines
    #[string = "Above 3,000 (a)"]
    Above3kShort,
    /// Exchanges of 3,000-9,999 premises, long lines
    #[string = "Above 3,000 (b)"]
    Above3kLong,
    /// Exchanges of 1,000-2,999 premises, short lines
    #[string = "Above 1,000 (a)"]
    Above1kShort,
    /// Exchanges of 1,000-2,999 premises, long lines
    #[string = "Above 1,000 (b)"]
    Above1kLong,
    /// Exchanges of fewer than 1,000 premises, short lines
    #[string = "Below 1,000 (a)"]
    Below1kShort,
    /// Exchanges of fewer than 1,000 premises, long lines
    #[string = "Below 1,000 (b)"]
    Below1kLong,
}

impl Geotype {
    /// Classify an asset from the total premises at its exchange and its line length (m)
    pub fn classify(exchange_premises: u64, line_length: f64) -> Self {
        let short_line = |threshold| line_length <= threshold;
        match exchange_premises {
            20_000.. if short_line(SHORT_LINE_LENGTH_LARGE_EXCHANGE) => Self::Above20kShort,
            20_000.. => Self::Above20kLong,
            10_000.. if short_line(SHORT_LINE_LENGTH_LARGE_EXCHANGE) => Self::Above10kShort,
            10_000.. => Self::Above10kLong,
            3_000.. if short_line(SHORT_LINE_LENGTH_SMALL_EXCHANGE) => Self::Above3kShort,
            3_000.. => Self::Above3kLong,
            1_000.. if short_line(SHORT_LINE_LENGTH_SMALL_EXCHANGE) => Self::Above1kShort,
            1_000.. => Self::Above1kLong,
            _ if short_line(SHORT_LINE_LENGTH_SMALL_EXCHANGE) => Self::Below1kShort,
            _ => Self::Below1kLong,
        }
    }

    /// Speed available to premises served by legacy infrastructure in this geotype
    pub fn baseline_speed(self) -> Mbps {
        match self {
            Self::InnerLondon | Self::LargeCity | Self::SmallCity => Mbps(50.0),
            Self::Above20kShort
            | Self::Above20kLong
            | Self::Above10kShort
            | Self::Above10kLong
            | Self::Above3kShort => Mbps(30.0),
            _ => Mbps(10.0),
        }
    }
}
