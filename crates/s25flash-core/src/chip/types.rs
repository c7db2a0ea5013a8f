//! Flash chip type definitions

/// Device geometry of a supported flash part
///
/// Entries live in the static registry and are never mutated after
/// process start. Page size, pages per sector and sector count are all
/// non-zero for every registered part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceGeometry {
    /// Chip model name (e.g., "S25FL128P_64K")
    pub name: &'static str,
    /// Primary identifier (bytes 1-2 of the RDID response)
    pub primary_id: u16,
    /// Secondary (extended) identifier (bytes 3-4 of the RDID response)
    ///
    /// Zero marks a generic entry that matches any secondary id.
    pub secondary_id: u16,
    /// Page size in bytes (largest unit of a single program command)
    pub page_size: u16,
    /// Number of pages in one erase sector
    pub pages_per_sector: u16,
    /// Number of sectors in the device
    pub sector_count: u16,
}

impl DeviceGeometry {
    /// Create a new geometry entry
    pub const fn new(
        name: &'static str,
        primary_id: u16,
        secondary_id: u16,
        page_size: u16,
        pages_per_sector: u16,
        sector_count: u16,
    ) -> Self {
        Self {
            name,
            primary_id,
            secondary_id,
            page_size,
            pages_per_sector,
            sector_count,
        }
    }

    /// Size of one erase sector in bytes
    pub const fn sector_size(&self) -> u32 {
        self.page_size as u32 * self.pages_per_sector as u32
    }

    /// Total capacity in bytes
    pub const fn total_size(&self) -> u32 {
        self.sector_size() * self.sector_count as u32
    }

    /// Check if this entry accepts the given identifier pair
    ///
    /// The primary id must be equal. The secondary id only has to match
    /// when this entry's secondary id is non-zero.
    pub const fn matches(&self, primary: u16, secondary: u16) -> bool {
        self.primary_id == primary && (self.secondary_id == 0 || self.secondary_id == secondary)
    }
}

/// JEDEC manufacturer IDs
pub mod manufacturer {
    /// AMD/Spansion (now Infineon)
    pub const SPANSION: u8 = 0x01;
}

/// Identifier pair parsed out of an RDID response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipId {
    /// Manufacturer byte
    pub manufacturer: u8,
    /// Primary identifier
    pub primary: u16,
    /// Secondary identifier
    pub secondary: u16,
}

impl ChipId {
    /// Number of RDID bytes needed to parse an identifier
    pub const RESPONSE_LEN: usize = 5;

    /// Parse an identifier response
    ///
    /// Layout: manufacturer, primary id (big-endian), secondary id
    /// (big-endian). Returns `None` if the response is too short.
    pub fn parse(id: &[u8]) -> Option<Self> {
        match id {
            [manufacturer, p_hi, p_lo, s_hi, s_lo, ..] => Some(Self {
                manufacturer: *manufacturer,
                primary: u16::from_be_bytes([*p_hi, *p_lo]),
                secondary: u16::from_be_bytes([*s_hi, *s_lo]),
            }),
            _ => None,
        }
    }

    /// Encode back into the 5-byte RDID layout
    pub fn to_bytes(&self) -> [u8; Self::RESPONSE_LEN] {
        let [p_hi, p_lo] = self.primary.to_be_bytes();
        let [s_hi, s_lo] = self.secondary.to_be_bytes();
        [self.manufacturer, p_hi, p_lo, s_hi, s_lo]
    }
}
