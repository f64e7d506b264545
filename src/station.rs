//! Station records read from a system table, and the entries written out

use serde::Serialize;
use std::fmt;

use crate::error::ConvertError;
use crate::libconfig::Value;

/// Station identifier, an integer in dumphfdl tables but free-form text is accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StationId {
    Int(i64),
    Text(String),
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationId::Int(id) => write!(f, "{}", id),
            StationId::Text(id) => write!(f, "{}", id),
        }
    }
}

/// A longitude or latitude exactly as written in the table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinate {
    Int(i64),
    Float(f64),
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coordinate::Int(v) => fmt::Display::fmt(&Value::Int(*v), f),
            Coordinate::Float(v) => fmt::Display::fmt(&Value::Float(*v), f),
        }
    }
}

/// One `stations` element of the system table
#[derive(Debug, Clone, PartialEq)]
pub struct StationRecord {
    pub id: StationId,
    pub name: String,
    pub lon: Coordinate,
    pub lat: Coordinate,
    /// Frequencies in table order, truncated toward zero
    pub frequencies: Vec<i64>,
}

impl StationRecord {
    /// Extract a station from its configuration group. `index` is the
    /// station's position in the `stations` list, used in diagnostics.
    pub fn from_value(index: usize, value: &Value) -> Result<Self, ConvertError> {
        let context = format!("stations[{}]", index);
        if value.as_group().is_none() {
            return Err(ConvertError::schema(
                context,
                format!("expected a group, found {}", value.type_name()),
            ));
        }

        let name = match field(value, &context, "name")? {
            Value::Str(name) => name.clone(),
            other => {
                return Err(ConvertError::schema(
                    &context,
                    format!("`name` must be a string, found {}", other.type_name()),
                ))
            }
        };
        // the name is the more useful handle from here on
        let context = format!("stations[{}] ({:?})", index, name);

        let id = match field(value, &context, "id")? {
            Value::Int(id) => StationId::Int(*id),
            Value::Str(id) => StationId::Text(id.clone()),
            other => {
                return Err(ConvertError::schema(
                    &context,
                    format!("`id` must be an integer or string, found {}", other.type_name()),
                ))
            }
        };

        let lon = coordinate(&context, "lon", field(value, &context, "lon")?)?;
        let lat = coordinate(&context, "lat", field(value, &context, "lat")?)?;

        let frequencies = match field(value, &context, "frequencies")?.as_seq() {
            Some(items) => items
                .iter()
                .map(|item| frequency(&context, item))
                .collect::<Result<Vec<_>, _>>()?,
            None => {
                return Err(ConvertError::schema(
                    &context,
                    "`frequencies` must be a list or array",
                ))
            }
        };

        Ok(StationRecord {
            id,
            name,
            lon,
            lat,
            frequencies,
        })
    }

    /// Well-known-text point geometry, longitude first
    pub fn wkt_coords(&self) -> String {
        format!("POINT ({} {})", self.lon, self.lat)
    }

    pub fn entry(&self) -> StationEntry {
        StationEntry {
            id: self.id.clone(),
            name: self.name.clone(),
            wkt_coords: self.wkt_coords(),
        }
    }
}

/// A station as it appears in the output station table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationEntry {
    pub id: StationId,
    pub name: String,
    pub wkt_coords: String,
}

/// Read every station from a parsed system table
pub fn stations_from_config(config: &Value) -> Result<Vec<StationRecord>, ConvertError> {
    let stations = config
        .get("stations")
        .ok_or_else(|| ConvertError::schema("system table", "missing `stations`"))?;
    let items = stations.as_seq().ok_or_else(|| {
        ConvertError::schema(
            "system table",
            format!("`stations` must be a list, found {}", stations.type_name()),
        )
    })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| StationRecord::from_value(index, item))
        .collect()
}

fn field<'v>(value: &'v Value, context: &str, name: &str) -> Result<&'v Value, ConvertError> {
    value
        .get(name)
        .ok_or_else(|| ConvertError::schema(context, format!("missing field `{}`", name)))
}

fn coordinate(context: &str, name: &str, value: &Value) -> Result<Coordinate, ConvertError> {
    match value {
        Value::Int(v) => Ok(Coordinate::Int(*v)),
        Value::Float(v) => Ok(Coordinate::Float(*v)),
        other => Err(ConvertError::schema(
            context,
            format!("`{}` must be a number, found {}", name, other.type_name()),
        )),
    }
}

/// Integer value of a frequency. Floats truncate toward zero, strings must
/// hold an integer.
fn frequency(context: &str, value: &Value) -> Result<i64, ConvertError> {
    let invalid = || ConvertError::schema(context, format!("frequency {} is not numeric", value));

    match value {
        Value::Int(freq) => Ok(*freq),
        Value::Float(freq) if freq.is_finite() => {
            let truncated = freq.trunc();
            if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
                return Err(invalid());
            }
            Ok(truncated as i64)
        }
        Value::Str(text) => text.trim().parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}
