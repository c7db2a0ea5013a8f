//! SPI command structure

use heapless::Vec;

use super::AddressWidth;

/// Longest header: opcode, 4 address bytes and one dummy byte
pub const MAX_HEADER_LEN: usize = 6;

/// A single SPI transaction
///
/// Designed to avoid allocation - uses slices for data.
/// The lifetime parameter `'a` ties the command to the buffers it references.
pub struct SpiCommand<'a> {
    /// The opcode byte
    pub opcode: u8,

    /// Address (if any)
    pub address: Option<u32>,

    /// Address width
    pub address_width: AddressWidth,

    /// Number of dummy cycles after address
    pub dummy_cycles: u8,

    /// Data to write after opcode/address/dummy
    pub write_data: &'a [u8],

    /// Buffer to read into (mutable)
    pub read_buf: &'a mut [u8],
}

impl<'a> SpiCommand<'a> {
    /// Create a simple command with no address or data (e.g., WREN)
    pub fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            address_width: AddressWidth::None,
            dummy_cycles: 0,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Create a read register command with no address (e.g., RDSR, RDID)
    pub fn read_reg(opcode: u8, buf: &'a mut [u8]) -> Self {
        Self {
            read_buf: buf,
            ..Self::simple(opcode)
        }
    }

    /// Create a write register command with no address (e.g., BRWR)
    pub fn write_reg(opcode: u8, data: &'a [u8]) -> Self {
        Self {
            write_data: data,
            ..Self::simple(opcode)
        }
    }

    /// Create an addressed read command
    pub fn read(opcode: u8, addr: u32, width: AddressWidth, buf: &'a mut [u8]) -> Self {
        Self {
            address: Some(addr),
            address_width: width,
            read_buf: buf,
            ..Self::simple(opcode)
        }
    }

    /// Create an addressed write command (e.g., PP)
    pub fn write(opcode: u8, addr: u32, width: AddressWidth, data: &'a [u8]) -> Self {
        Self {
            address: Some(addr),
            address_width: width,
            write_data: data,
            ..Self::simple(opcode)
        }
    }

    /// Create an addressed command without data phase (e.g., SE)
    pub fn erase(opcode: u8, addr: u32, width: AddressWidth) -> Self {
        Self {
            address: Some(addr),
            address_width: width,
            ..Self::simple(opcode)
        }
    }

    /// Set the number of dummy cycles
    pub fn with_dummy_cycles(mut self, cycles: u8) -> Self {
        self.dummy_cycles = cycles;
        self
    }

    /// Returns true if this command has a read phase
    pub fn has_read(&self) -> bool {
        !self.read_buf.is_empty()
    }

    /// Returns true if this command has a write phase
    pub fn has_write(&self) -> bool {
        !self.write_data.is_empty()
    }

    /// Returns true if this command has an address phase
    pub fn has_address(&self) -> bool {
        self.address.is_some()
    }

    /// Number of header bytes: opcode, address and dummy bytes
    pub fn header_len(&self) -> usize {
        let addr_len = if self.has_address() {
            self.address_width.bytes() as usize
        } else {
            0
        };
        1 + addr_len + (self.dummy_cycles as usize).div_ceil(8)
    }

    /// Encode the opcode, address and dummy bytes as sent on the wire
    ///
    /// The length varies with the address width, so narrow commands are
    /// four bytes (five with a dummy byte) and wide ones one byte longer.
    pub fn header(&self) -> Vec<u8, MAX_HEADER_LEN> {
        let mut buf = [0u8; MAX_HEADER_LEN];
        let len = self.header_len().min(MAX_HEADER_LEN);
        buf[0] = self.opcode;
        if let Some(addr) = self.address {
            self.address_width.encode(addr, &mut buf[1..]);
        }
        // Dummy bytes are already zero
        let mut header = Vec::new();
        // Capacity is MAX_HEADER_LEN and len is clamped to it
        let _ = header.extend_from_slice(&buf[..len]);
        header
    }

    /// Calculate the total number of bytes to transfer
    pub fn total_bytes(&self) -> usize {
        self.header_len() + self.write_data.len() + self.read_buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spi::opcodes;

    #[test]
    fn test_header_narrow_program() {
        let data = [0xAA; 4];
        let cmd = SpiCommand::write(opcodes::PP, 0x01_0203, AddressWidth::ThreeByte, &data);
        assert_eq!(cmd.header().as_slice(), &[0x02, 0x01, 0x02, 0x03]);
        assert_eq!(cmd.total_bytes(), 8);
    }

    #[test]
    fn test_header_wide_fast_read() {
        let mut buf = [0u8; 16];
        let cmd = SpiCommand::read(
            opcodes::FAST_READ_4B,
            0x0100_0000,
            AddressWidth::FourByte,
            &mut buf,
        )
        .with_dummy_cycles(opcodes::FAST_READ_DUMMY_CYCLES);
        assert_eq!(
            cmd.header().as_slice(),
            &[0x0C, 0x01, 0x00, 0x00, 0x00, 0x00]
        );
        assert!(cmd.has_read());
        assert!(!cmd.has_write());
    }

    #[test]
    fn test_header_simple() {
        let cmd = SpiCommand::simple(opcodes::WREN);
        assert_eq!(cmd.header().as_slice(), &[0x06]);
        assert!(!cmd.has_address());
    }
}
