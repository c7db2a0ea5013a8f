//! Static capability registry for the S25FL family

use super::types::{ChipId, DeviceGeometry};
use crate::error::{Error, Result};

/// All supported parts, in match precedence order
///
/// Lookup is a first-match scan, so specific entries (non-zero secondary
/// id) must come before a generic entry with the same primary id.
pub static CHIPS: &[DeviceGeometry] = &[
    DeviceGeometry::new("S25FL008A", 0x0213, 0, 256, 256, 16),
    DeviceGeometry::new("S25FL016A", 0x0214, 0, 256, 256, 32),
    DeviceGeometry::new("S25FL032P", 0x0215, 0x4D00, 256, 256, 64),
    DeviceGeometry::new("S25FL032A", 0x0215, 0, 256, 256, 64),
    DeviceGeometry::new("S25FL064A", 0x0216, 0, 256, 256, 128),
    DeviceGeometry::new("S25FL128P_64K", 0x2018, 0x0301, 256, 256, 256),
    DeviceGeometry::new("S25FL128P_256K", 0x2018, 0x0300, 256, 1024, 64),
    DeviceGeometry::new("S25FL512S", 0x0220, 0x4D00, 512, 512, 256),
];

/// Find the geometry for an identifier pair
pub fn lookup(primary: u16, secondary: u16) -> Result<&'static DeviceGeometry> {
    CHIPS
        .iter()
        .find(|g| g.matches(primary, secondary))
        .ok_or(Error::UnsupportedDevice { primary, secondary })
}

/// Find the geometry for a raw RDID response
pub fn lookup_id_bytes(id: &[u8]) -> Result<&'static DeviceGeometry> {
    let id = ChipId::parse(id).ok_or(Error::InvalidIdentifier)?;
    lookup(id.primary, id.secondary)
}

/// Find a chip by name (case-insensitive)
pub fn find_by_name(name: &str) -> Option<&'static DeviceGeometry> {
    CHIPS.iter().find(|g| g.name.eq_ignore_ascii_case(name))
}
