use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Money in paise (1/100 rupee).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u64);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("amount is not a number: {0}")]
    NotANumber(String),

    #[error("amount has more than two decimal places: {0}")]
    TooPrecise(String),

    #[error("amount is too large: {0}")]
    Overflow(String),
}

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_paise(paise: u64) -> Self {
        Self(paise)
    }

    pub fn from_rupees(rupees: u64) -> Option<Self> {
        rupees.checked_mul(100).map(Self)
    }

    pub const fn paise(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }

        let (whole, frac) = match s.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (s, ""),
        };

        let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !digits_only(whole) || !digits_only(frac) {
            return Err(AmountError::NotANumber(s.to_string()));
        }
        if s.ends_with('.') {
            return Err(AmountError::NotANumber(s.to_string()));
        }
        if frac.len() > 2 {
            return Err(AmountError::TooPrecise(s.to_string()));
        }

        let rupees: u64 = whole
            .parse()
            .map_err(|_| AmountError::Overflow(s.to_string()))?;
        let paise: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().unwrap_or(0) * 10,
            _ => frac.parse::<u64>().unwrap_or(0),
        };

        rupees
            .checked_mul(100)
            .and_then(|p| p.checked_add(paise))
            .map(Amount)
            .ok_or_else(|| AmountError::Overflow(s.to_string()))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Whole(u64),
            Decimal(f64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text.parse().map_err(de::Error::custom),
            Raw::Whole(rupees) => Amount::from_rupees(rupees)
                .ok_or_else(|| de::Error::custom(AmountError::Overflow(rupees.to_string()))),
            Raw::Decimal(value) => {
                if !value.is_finite() || value < 0.0 {
                    return Err(de::Error::custom(AmountError::NotANumber(value.to_string())));
                }
                // Round-trip through text so 10.005 is rejected rather than rounded.
                format!("{}", value).parse().map_err(de::Error::custom)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_rupees() {
        assert_eq!("150".parse::<Amount>().unwrap(), Amount::from_paise(15_000));
        assert_eq!("150.5".parse::<Amount>().unwrap(), Amount::from_paise(15_050));
        assert_eq!("150.05".parse::<Amount>().unwrap(), Amount::from_paise(15_005));
        assert_eq!(" 0.99 ".parse::<Amount>().unwrap(), Amount::from_paise(99));
    }

    #[test]
    fn rejects_malformed_amounts() {
        assert_eq!("".parse::<Amount>(), Err(AmountError::Empty));
        assert!(matches!("-5".parse::<Amount>(), Err(AmountError::NotANumber(_))));
        assert!(matches!("1.".parse::<Amount>(), Err(AmountError::NotANumber(_))));
        assert!(matches!(".5".parse::<Amount>(), Err(AmountError::NotANumber(_))));
        assert!(matches!("1e3".parse::<Amount>(), Err(AmountError::NotANumber(_))));
        assert!(matches!("10.005".parse::<Amount>(), Err(AmountError::TooPrecise(_))));
        assert!(matches!(
            "99999999999999999999".parse::<Amount>(),
            Err(AmountError::Overflow(_))
        ));
    }

    #[test]
    fn displays_two_decimals() {
        assert_eq!(Amount::from_paise(15_050).to_string(), "150.50");
        assert_eq!(Amount::from_paise(7).to_string(), "0.07");
    }

    #[test]
    fn json_accepts_strings_and_numbers() {
        let from_str: Amount = serde_json::from_str("\"25.75\"").unwrap();
        let from_int: Amount = serde_json::from_str("25").unwrap();
        let from_float: Amount = serde_json::from_str("25.75").unwrap();

        assert_eq!(from_str, Amount::from_paise(2_575));
        assert_eq!(from_int, Amount::from_paise(2_500));
        assert_eq!(from_float, Amount::from_paise(2_575));
        assert_eq!(serde_json::to_string(&from_str).unwrap(), "\"25.75\"");
        assert!(serde_json::from_str::<Amount>("-1").is_err());
    }
}
