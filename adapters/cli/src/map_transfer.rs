#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use rampart_core::{MapData, MapDataError};

const SHARE_DOMAIN: &str = "rampart";
const SHARE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded map payload.
pub(crate) const SHARE_HEADER: &str = "rampart:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Encodes the map into a single-line string suitable for clipboard transfer.
pub(crate) fn encode(map: &MapData) -> Result<String, MapTransferError> {
    let json = serde_json::to_vec(map).map_err(MapTransferError::InvalidPayload)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!(
        "{SHARE_HEADER}:{}x{}:{encoded}",
        map.width, map.height
    ))
}

/// Decodes and validates a map from its shared string representation.
pub(crate) fn decode(value: &str) -> Result<MapData, MapTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MapTransferError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts.next().ok_or(MapTransferError::MissingPrefix)?;
    let version = parts.next().ok_or(MapTransferError::MissingVersion)?;
    let dimensions = parts.next().ok_or(MapTransferError::MissingDimensions)?;
    let payload = parts.next().ok_or(MapTransferError::MissingPayload)?;

    if domain != SHARE_DOMAIN {
        return Err(MapTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != SHARE_VERSION {
        return Err(MapTransferError::UnsupportedVersion(version.to_owned()));
    }

    let (columns, rows) = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(MapTransferError::InvalidEncoding)?;
    let map: MapData = serde_json::from_slice(&bytes).map_err(MapTransferError::InvalidPayload)?;

    if map.width != columns || map.height != rows {
        return Err(MapTransferError::DimensionMismatch {
            declared: (columns, rows),
            found: (map.width, map.height),
        });
    }
    map.validate().map_err(MapTransferError::InvalidMap)?;

    Ok(map)
}

/// Errors that can occur while encoding or decoding shared map strings.
#[derive(Debug)]
pub(crate) enum MapTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded map.
    MissingPrefix,
    /// The encoded map did not contain a version segment.
    MissingVersion,
    /// The encoded map did not include grid dimensions.
    MissingDimensions,
    /// The encoded map did not include the payload segment.
    MissingPayload,
    /// The encoded map used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded map used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded map.
    InvalidDimensions(String),
    /// The header dimensions disagree with the decoded map.
    DimensionMismatch {
        /// Dimensions written in the header.
        declared: (u32, u32),
        /// Dimensions carried by the payload.
        found: (u32, u32),
    },
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The payload could not be converted to or from JSON.
    InvalidPayload(serde_json::Error),
    /// The decoded map failed structural validation.
    InvalidMap(MapDataError),
}

impl fmt::Display for MapTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "shared map string was empty"),
            Self::MissingPrefix => write!(f, "map string is missing the prefix"),
            Self::MissingVersion => write!(f, "map string is missing the version"),
            Self::MissingDimensions => write!(f, "map string is missing the grid dimensions"),
            Self::MissingPayload => write!(f, "map string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "map prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "map version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse grid dimensions '{dimensions}'")
            }
            Self::DimensionMismatch { declared, found } => write!(
                f,
                "header declares {}x{} but the map is {}x{}",
                declared.0, declared.1, found.0, found.1
            ),
            Self::InvalidEncoding(error) => write!(f, "could not decode map payload: {error}"),
            Self::InvalidPayload(error) => write!(f, "could not convert map payload: {error}"),
            Self::InvalidMap(error) => write!(f, "shared map is malformed: {error}"),
        }
    }
}

impl Error for MapTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            Self::InvalidMap(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), MapTransferError> {
    let invalid = || MapTransferError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    if columns == 0 || rows == 0 {
        return Err(invalid());
    }

    Ok((columns, rows))
}
