use crate::properties;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Gain {
    X50 = 0,
    X125 = 1,
    X250 = 2,
    X500 = 3,
    X1000 = 4,
    X1500 = 5,
    X2000 = 6,
    X3000 = 7,
}

impl Gain {
    pub const ALL: [Gain; 8] = [
        Gain::X50,
        Gain::X125,
        Gain::X250,
        Gain::X500,
        Gain::X1000,
        Gain::X1500,
        Gain::X2000,
        Gain::X3000,
    ];

    /// Register value, also the column of this gain in the calibration table.
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn multiplier(self) -> u16 {
        match self {
            Gain::X50 => 50,
            Gain::X125 => 125,
            Gain::X250 => 250,
            Gain::X500 => 500,
            Gain::X1000 => 1000,
            Gain::X1500 => 1500,
            Gain::X2000 => 2000,
            Gain::X3000 => 3000,
        }
    }
}

impl std::fmt::Display for Gain {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "x{}", self.multiplier())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseGainError {
    on: String,
}

impl std::fmt::Display for ParseGainError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(formatter, "Unknown gain \"{}\"", self.on)
    }
}

impl std::error::Error for ParseGainError {}

impl std::str::FromStr for Gain {
    type Err = ParseGainError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let multiplier = string
            .strip_prefix('x')
            .unwrap_or(string)
            .parse::<u16>()
            .map_err(|_| Self::Err {
                on: string.to_owned(),
            })?;
        Gain::ALL
            .iter()
            .copied()
            .find(|gain| gain.multiplier() == multiplier)
            .ok_or_else(|| Self::Err {
                on: string.to_owned(),
            })
    }
}

// 3-bit selection written once per channel
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Reference {
    External = 0b001,
    Tip = 0b010,
}

impl Reference {
    pub fn bits(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Configuration {
    pub ap_gain: Gain,
    pub lfp_gain: Gain,
    pub reference: Reference,
    pub ap_filter: bool, // true engages the AP high-pass filter, false is full bandwidth
}

impl Default for Configuration {
    fn default() -> Self {
        PROPERTIES.default_configuration
    }
}

impl Configuration {
    pub fn serialize_bincode(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }

    pub fn deserialize_bincode(data: &[u8]) -> bincode::Result<Configuration> {
        bincode::deserialize(data)
    }
}

pub const PROPERTIES: properties::Probe<Configuration> = properties::Probe {
    name: "Neuropixels 1.0f",
    channel_count: 384,
    converter_count: 32,
    default_configuration: Configuration {
        ap_gain: Gain::X500,
        lfp_gain: Gain::X125,
        reference: Reference::External,
        ap_filter: true,
    },
};
