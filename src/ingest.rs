//! Request shapes used by the ingestion and query endpoints.
//!
//! Devices upload plain text `deviceKey,ts1,volume1,ts2,volume2,...`. Queries arrive as
//! JSON `{"deviceKey": .., "timestampStart": .., "timestampEnd": ..}`.

use serde::{Deserialize, Serialize};

use crate::reading::Reading;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePayload {
    pub device_key: String,
    pub readings: Vec<Reading>,
}

/// Parse a comma-delimited upload.
///
/// Empty tokens are ignored. A blank body carries no readings and yields `None`.
pub fn parse_store_payload(body: &str) -> Result<Option<StorePayload>> {
    let items: Vec<&str> = body
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect();
    let Some((device_key, values)) = items.split_first() else {
        return Ok(None);
    };
    if values.len() % 2 != 0 {
        return Err(Error::validation("Invalid number of arguments"));
    }

    let readings = values
        .chunks_exact(2)
        .map(|pair| -> Result<Reading> {
            Ok(Reading::new(parse_i64(pair[0])?, parse_i64(pair[1])?))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(StorePayload {
        device_key: (*device_key).to_string(),
        readings,
    }))
}

fn parse_i64(token: &str) -> Result<i64> {
    token
        .parse()
        .map_err(|_| Error::validation(format!("invalid integer {token:?}")))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalQuery {
    pub device_key: String,
    pub timestamp_start: i64,
    pub timestamp_end: i64,
}

impl IntervalQuery {
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| Error::validation(format!("invalid query: {e}")))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalQueryResult {
    pub measurements: Vec<Reading>,
}

impl IntervalQueryResult {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::invariant(format!("result encoding: {e}")))
    }
}
