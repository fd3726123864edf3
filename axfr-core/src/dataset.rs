//! Dataset codes.
//!
//! Every query targets exactly one dataset: either a full-zone dump of a TLD
//! (`se`, `nu`, `ch`, `li`, `ee`, `sk`) or one of the daily diff tables
//! (`se_diff`, `nu_diff`). The code is the only piece of routing information
//! a client supplies, so parsing it is also where unknown TLDs are rejected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Short identifier selecting which credential set and backing tables a
/// query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetCode {
    Se,
    Nu,
    Ch,
    Li,
    Ee,
    Sk,
    SeDiff,
    NuDiff,
}

impl DatasetCode {
    /// All supported datasets, dumps first.
    pub const ALL: [DatasetCode; 8] = [
        DatasetCode::Se,
        DatasetCode::Nu,
        DatasetCode::Ch,
        DatasetCode::Li,
        DatasetCode::Ee,
        DatasetCode::Sk,
        DatasetCode::SeDiff,
        DatasetCode::NuDiff,
    ];

    /// The code as it appears in URLs and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetCode::Se => "se",
            DatasetCode::Nu => "nu",
            DatasetCode::Ch => "ch",
            DatasetCode::Li => "li",
            DatasetCode::Ee => "ee",
            DatasetCode::Sk => "sk",
            DatasetCode::SeDiff => "se_diff",
            DatasetCode::NuDiff => "nu_diff",
        }
    }

    /// Infix of the environment variables holding this dataset's credentials.
    ///
    /// Dumps use `<TLD>DUMP`, diff tables use the bare TLD.
    pub fn env_name(&self) -> &'static str {
        match self {
            DatasetCode::Se => "SEDUMP",
            DatasetCode::Nu => "NUDUMP",
            DatasetCode::Ch => "CHDUMP",
            DatasetCode::Li => "LIDUMP",
            DatasetCode::Ee => "EEDUMP",
            DatasetCode::Sk => "SKDUMP",
            DatasetCode::SeDiff => "SE",
            DatasetCode::NuDiff => "NU",
        }
    }

    /// Human-readable name used in health reports.
    pub fn label(&self) -> &'static str {
        match self {
            DatasetCode::Se => "SE dump",
            DatasetCode::Nu => "NU dump",
            DatasetCode::Ch => "CH dump",
            DatasetCode::Li => "LI dump",
            DatasetCode::Ee => "EE dump",
            DatasetCode::Sk => "SK dump",
            DatasetCode::SeDiff => "SE",
            DatasetCode::NuDiff => "NU",
        }
    }

    /// Whether this is a daily diff table rather than a full dump.
    pub fn is_diff(&self) -> bool {
        matches!(self, DatasetCode::SeDiff | DatasetCode::NuDiff)
    }
}

impl fmt::Display for DatasetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasetCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| ValidationError::UnsupportedDataset {
                code: s.to_string(),
            })
    }
}

/// The TLDs that have daily diff tables.
///
/// Date listings, per-date domain listings and first-appearance lookups are
/// only defined for these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffTld {
    Se,
    Nu,
}

impl DiffTld {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffTld::Se => "se",
            DiffTld::Nu => "nu",
        }
    }

    /// The diff dataset backing this TLD.
    pub fn dataset(&self) -> DatasetCode {
        match self {
            DiffTld::Se => DatasetCode::SeDiff,
            DiffTld::Nu => DatasetCode::NuDiff,
        }
    }
}

impl fmt::Display for DiffTld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiffTld {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "se" => Ok(DiffTld::Se),
            "nu" => Ok(DiffTld::Nu),
            other => Err(ValidationError::UnsupportedDataset {
                code: other.to_string(),
            }),
        }
    }
}
