use std::fmt;
use std::str::FromStr;

/// Largest value a 24-bit transponder address can hold.
pub const MAX_ICAO: u32 = 0x00FF_FFFF;

/// 24-bit ICAO transponder address, the per-aircraft key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IcaoAddress(u32);

impl IcaoAddress {
    pub fn new(value: u32) -> Option<Self> {
        (value <= MAX_ICAO).then_some(Self(value))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for IcaoAddress {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("icao address {value:#x} exceeds 24 bits"))
    }
}

impl From<IcaoAddress> for u32 {
    fn from(address: IcaoAddress) -> Self {
        address.0
    }
}

impl FromStr for IcaoAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty()
            || trimmed.len() > 6
            || !trimmed.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(format!("invalid icao address {s:?}"));
        }
        let value =
            u32::from_str_radix(trimmed, 16).map_err(|_| format!("invalid icao address {s:?}"))?;
        Self::try_from(value)
    }
}

impl fmt::Display for IcaoAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06x}", self.0)
    }
}

/// Mode A transponder code. Upstream reports `0` when no code has been decoded yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Squawk(u32);

impl Squawk {
    pub const UNSET: Squawk = Squawk(0);

    pub fn new(code: u32) -> Self {
        Self(code)
    }

    pub fn code(self) -> u32 {
        self.0
    }

    pub fn is_set(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Squawk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_set() {
            write!(f, "{:04}", self.0)
        } else {
            f.write_str("----")
        }
    }
}

/// One tracked aircraft as of the enclosing snapshot's timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct AircraftRecord {
    pub icao: IcaoAddress,
    pub callsign: Option<String>,
    pub squawk: Option<Squawk>,
    /// Feet.
    pub altitude: Option<i32>,
    /// Knots.
    pub ground_speed: Option<i32>,
    /// Degrees.
    pub heading: Option<i32>,
    /// Nautical miles from the receiver.
    pub range: Option<f64>,
    pub signal_strength: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Feet per minute.
    pub vertical_rate: Option<i32>,
    pub mlat: bool,
}

impl AircraftRecord {
    /// Record with only the key populated; every optional field is absent.
    pub fn new(icao: IcaoAddress) -> Self {
        Self {
            icao,
            callsign: None,
            squawk: None,
            altitude: None,
            ground_speed: None,
            heading: None,
            range: None,
            signal_strength: None,
            latitude: None,
            longitude: None,
            vertical_rate: None,
            mlat: false,
        }
    }

    pub fn has_position(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icao_renders_fixed_width_hex() {
        let icao = IcaoAddress::new(0x00_0abc).unwrap();
        assert_eq!(icao.to_string(), "000abc");
    }

    #[test]
    fn icao_parses_mixed_case_and_rejects_overflow() {
        assert_eq!("A1B2C3".parse::<IcaoAddress>().unwrap().value(), 0xa1b2c3);
        assert!("1000000".parse::<IcaoAddress>().is_err());
        assert!("".parse::<IcaoAddress>().is_err());
        assert!("+abc".parse::<IcaoAddress>().is_err());
        assert!("-1".parse::<IcaoAddress>().is_err());
        assert!("zz".parse::<IcaoAddress>().is_err());
        assert!(IcaoAddress::new(0x0100_0000).is_none());
    }

    #[test]
    fn squawk_sentinel_renders_distinctly() {
        assert_eq!(Squawk::new(7700).to_string(), "7700");
        assert_eq!(Squawk::new(1200).to_string(), "1200");
        assert_eq!(Squawk::UNSET.to_string(), "----");
        assert!(!Squawk::new(0).is_set());
    }
}
