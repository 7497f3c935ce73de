//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during ETL and fitting
//! - written to the canonical CSV artifact
//! - persisted inside the model bundle and reloaded at serving time

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};

/// PJM load-area codes as published in the instantaneous load feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Zone {
    Ae,
    Aep,
    Aps,
    Atsi,
    Bc,
    Comed,
    Dayton,
    Deok,
    Dom,
    Dpl,
    Duq,
    Ekpc,
    Jc,
    Me,
    Ovec,
    Pe,
    Pep,
    Pl,
    Pn,
    Ps,
    Reco,
}

impl Zone {
    pub const ALL: [Zone; 21] = [
        Zone::Ae,
        Zone::Aep,
        Zone::Aps,
        Zone::Atsi,
        Zone::Bc,
        Zone::Comed,
        Zone::Dayton,
        Zone::Deok,
        Zone::Dom,
        Zone::Dpl,
        Zone::Duq,
        Zone::Ekpc,
        Zone::Jc,
        Zone::Me,
        Zone::Ovec,
        Zone::Pe,
        Zone::Pep,
        Zone::Pl,
        Zone::Pn,
        Zone::Ps,
        Zone::Reco,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Zone::Ae => "AE",
            Zone::Aep => "AEP",
            Zone::Aps => "APS",
            Zone::Atsi => "ATSI",
            Zone::Bc => "BC",
            Zone::Comed => "COMED",
            Zone::Dayton => "DAYTON",
            Zone::Deok => "DEOK",
            Zone::Dom => "DOM",
            Zone::Dpl => "DPL",
            Zone::Duq => "DUQ",
            Zone::Ekpc => "EKPC",
            Zone::Jc => "JC",
            Zone::Me => "ME",
            Zone::Ovec => "OVEC",
            Zone::Pe => "PE",
            Zone::Pep => "PEP",
            Zone::Pl => "PL",
            Zone::Pn => "PN",
            Zone::Ps => "PS",
            Zone::Reco => "RECO",
        }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Zone {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Zone::ALL
            .into_iter()
            .find(|z| z.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                AppError::new(
                    ErrorKind::InvalidParameter,
                    format!("Unknown PJM zone '{wanted}'."),
                )
            })
    }
}

/// One row of the canonical load table.
///
/// `load_diffed` is absent until the seasonal transform has run, and stays
/// absent for the first `season_len` rows of every zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRecord {
    pub datetime: DateTime<Utc>,
    pub load: f64,
    pub zone: Zone,
    #[serde(default)]
    pub load_diffed: Option<f64>,
}

/// Fixed ARIMA order applied to every zone.
///
/// `(1, 1, 1)` is a deliberate simplification: no order search is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self { p: 1, d: 1, q: 1 }
    }
}

impl std::fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_parse_is_case_insensitive() {
        assert_eq!("pep".parse::<Zone>().unwrap(), Zone::Pep);
        assert_eq!(" PE ".parse::<Zone>().unwrap(), Zone::Pe);
        let err = "XYZ".parse::<Zone>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn zone_serializes_as_code() {
        let json = serde_json::to_string(&Zone::Comed).unwrap();
        assert_eq!(json, "\"COMED\"");
        for z in Zone::ALL {
            let back: Zone = serde_json::from_str(&format!("\"{}\"", z.code())).unwrap();
            assert_eq!(back, z);
        }
    }
}
