//! Bound flash handle with the read, write and erase engines

use crate::chip::DeviceGeometry;
use crate::config::FlashConfig;
use crate::error::{Error, Result};
use crate::programmer::{BusGuard, Clock, SpiMaster};
use crate::protocol;
use crate::spi::AddressWidth;

/// A detected flash device bound to its transport
///
/// Created by [`bind`](super::bind) or [`probe`](super::probe). The handle
/// borrows the transport for as long as it lives and keeps no background
/// state; dropping it releases the device.
pub struct FlashHandle<'a, M: SpiMaster + ?Sized, C: Clock> {
    master: &'a mut M,
    clock: C,
    geometry: &'static DeviceGeometry,
    config: FlashConfig,
    sector_size: u32,
    size: u32,
    memory_map: Option<&'a [u8]>,
}

impl<'a, M: SpiMaster + ?Sized, C: Clock> FlashHandle<'a, M, C> {
    pub(crate) fn new(
        master: &'a mut M,
        clock: C,
        geometry: &'static DeviceGeometry,
        config: FlashConfig,
    ) -> Self {
        Self {
            master,
            clock,
            geometry,
            config,
            sector_size: geometry.sector_size(),
            size: geometry.total_size(),
            memory_map: None,
        }
    }

    /// Serve reads from a memory-mapped window instead of the bus
    ///
    /// `window` must map the device starting at offset 0. Reads beyond the
    /// end of the window fail with `AddressOutOfBounds`.
    pub fn with_memory_map(mut self, window: &'a [u8]) -> Self {
        self.memory_map = Some(window);
        self
    }

    /// Display name of the matched device
    pub fn name(&self) -> &'static str {
        self.geometry.name
    }

    /// Total capacity in bytes
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Erase sector size in bytes
    pub fn sector_size(&self) -> u32 {
        self.sector_size
    }

    /// Device page size in bytes
    pub fn page_size(&self) -> u32 {
        self.geometry.page_size as u32
    }

    /// Page size used for write chunking (doubled for dual-chip wiring)
    pub fn effective_page_size(&self) -> u32 {
        effective_page_size(self.geometry, &self.config)
    }

    /// Geometry from the registry
    pub fn geometry(&self) -> &'static DeviceGeometry {
        self.geometry
    }

    /// Configuration the handle was bound with
    pub fn config(&self) -> &FlashConfig {
        &self.config
    }

    /// Get a reference to the underlying transport
    pub fn master(&mut self) -> &mut M {
        self.master
    }

    /// Get a reference to the clock used for completion polling
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Consume the handle and return the transport and clock
    pub fn into_parts(self) -> (&'a mut M, C) {
        (self.master, self.clock)
    }

    /// Number of bytes reachable with the configured addressing mode
    pub fn addressable_size(&self) -> u32 {
        core::cmp::min(self.size as u64, self.config.addressing.max_size()) as u32
    }

    /// Check if a range is valid for this device
    pub fn is_valid_range(&self, offset: u32, len: usize) -> bool {
        // Use u64 arithmetic to avoid truncation when len > u32::MAX
        let end = offset as u64 + len as u64;
        end <= self.addressable_size() as u64
    }

    fn check_range(&self, offset: u32, len: usize) -> Result<()> {
        if self.is_valid_range(offset, len) {
            Ok(())
        } else {
            log::debug!(
                "SF: Range 0x{:x}+0x{:x} outside device (0x{:x})",
                offset,
                len,
                self.addressable_size()
            );
            Err(Error::AddressOutOfBounds)
        }
    }

    /// Read `buf.len()` bytes starting at `offset`
    ///
    /// With a memory-mapped window this is a plain copy. Otherwise a single
    /// fast read streams the whole range; no chunking is done.
    pub fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()> {
        self.check_range(offset, buf.len())?;

        if let Some(window) = self.memory_map {
            let start = offset as usize;
            let src = window
                .get(start..start + buf.len())
                .ok_or(Error::AddressOutOfBounds)?;
            buf.copy_from_slice(src);
            return Ok(());
        }

        if buf.is_empty() {
            return Ok(());
        }

        log::debug!("SF: READ 0x{:x} len 0x{:x}", offset, buf.len());
        protocol::fast_read(self.master, self.config.addressing, offset, buf)
    }

    /// Program `data` starting at `offset`
    ///
    /// The target region should be erased first. Unaligned offsets are
    /// fine: the data is split so that no program command crosses a page
    /// boundary or exceeds the transport's transfer limit. The bus is held
    /// for the whole sequence. The first failing step aborts the write and
    /// is returned; chunks programmed before it stay programmed.
    ///
    /// With dual-chip wiring in the 32-bit modes each bus address covers a
    /// byte pair, so `offset` should be even. An odd offset is rounded down
    /// to the start of its pair and the data lands one byte early.
    pub fn write(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        self.check_range(offset, data.len())?;

        let mode = self.config.addressing;
        let halve = self.config.dual_chip && mode.address_width() == AddressWidth::FourByte;
        let timeouts = self.config.timeouts;
        let page_size = effective_page_size(self.geometry, &self.config);
        let mut max_write = self.master.max_write_len().max(1);
        if self.config.dual_chip {
            // Chunks must not split a byte pair
            max_write = (max_write & !1).max(2);
        }

        let mut page_index = offset / page_size;
        let mut byte_addr = offset % page_size;

        let mut bus = BusGuard::claim(&mut *self.master)?;

        let mut actual = 0usize;
        while actual < data.len() {
            let chunk_len = (data.len() - actual)
                .min((page_size - byte_addr) as usize)
                .min(max_write);
            let chunk = &data[actual..actual + chunk_len];

            let addr = device_address(page_index * page_size + byte_addr, halve);
            log::debug!(
                "SF: PP page {} byte 0x{:x} => addr 0x{:08x} chunk_len {}",
                page_index,
                byte_addr,
                addr,
                chunk_len
            );

            protocol::program_page(
                &mut *bus,
                &self.clock,
                mode,
                addr,
                chunk,
                timeouts.program_poll_us,
                timeouts.program_us,
            )
            .inspect_err(|e| {
                log::warn!(
                    "SF: Write aborted at 0x{:x} after {} bytes: {}",
                    offset as usize + actual,
                    actual,
                    e
                );
            })?;

            actual += chunk_len;
            byte_addr += chunk_len as u32;
            if byte_addr == page_size {
                page_index += 1;
                byte_addr = 0;
            }
        }

        log::debug!(
            "SF: Successfully programmed {} bytes @ 0x{:x}",
            data.len(),
            offset
        );
        Ok(())
    }

    /// Erase `len` bytes starting at `offset`, one sector at a time
    ///
    /// Both `offset` and `len` must be multiples of the sector size; this
    /// is checked before any command is sent. The bus is held for the
    /// whole sequence and the first failure aborts it. Sectors erased
    /// before the failure stay erased.
    pub fn erase(&mut self, offset: u32, len: u32) -> Result<()> {
        let sector_size = self.sector_size;

        if !offset.is_multiple_of(sector_size) || !len.is_multiple_of(sector_size) {
            log::debug!("SF: Erase offset/length not multiple of sector size");
            return Err(Error::MisalignedErase);
        }
        self.check_range(offset, len as usize)?;

        let mode = self.config.addressing;
        let timeouts = self.config.timeouts;

        let mut bus = BusGuard::claim(&mut *self.master)?;

        for addr in (offset..offset + len).step_by(sector_size as usize) {
            log::debug!("SF: SE sector {} => addr 0x{:08x}", addr / sector_size, addr);

            protocol::erase_sector(
                &mut *bus,
                &self.clock,
                mode,
                addr,
                timeouts.erase_poll_us,
                timeouts.erase_us,
            )
            .inspect_err(|e| {
                log::warn!(
                    "SF: Erase aborted at 0x{:x} after {} bytes: {}",
                    addr,
                    addr - offset,
                    e
                );
            })?;
        }

        log::debug!("SF: Successfully erased {} bytes @ 0x{:x}", len, offset);
        Ok(())
    }
}

fn effective_page_size(geometry: &DeviceGeometry, config: &FlashConfig) -> u32 {
    let page_size = geometry.page_size as u32;
    if config.dual_chip {
        page_size * 2
    } else {
        page_size
    }
}

/// Map a logical byte offset to the address sent on the bus
///
/// With two devices in lockstep on 4-byte addresses each address step
/// covers two payload bytes, one per device. The 3-byte page/byte form is
/// sent unchanged.
fn device_address(logical: u32, halve: bool) -> u32 {
    if halve {
        logical / 2
    } else {
        logical
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip;
    use crate::spi::{opcodes, AddressingMode};
    use crate::test_support::{MockClock, MockMaster};
    use std::vec::Vec;

    fn handle<'a, 'c>(
        master: &'a mut MockMaster<'c>,
        clock: &'a MockClock,
        name: &str,
        config: FlashConfig,
    ) -> FlashHandle<'a, MockMaster<'c>, &'a MockClock> {
        let geometry = chip::find_by_name(name).unwrap();
        FlashHandle::new(master, clock, geometry, config)
    }

    fn program_chunks(master: &MockMaster<'_>) -> Vec<(u32, usize)> {
        master
            .log
            .iter()
            .filter(|r| r.opcode == opcodes::PP || r.opcode == opcodes::PP_4B)
            .map(|r| (r.address.unwrap(), r.payload_len))
            .collect()
    }

    #[test]
    fn test_write_never_crosses_page() {
        let clock = MockClock::new();
        let mut master = MockMaster::new(&clock);
        let data = [0xA5u8; 1000];

        handle(&mut master, &clock, "S25FL128P_64K", FlashConfig::default())
            .write(200, &data)
            .unwrap();

        let chunks = program_chunks(&master);
        assert_eq!(
            chunks,
            [(200, 56), (256, 256), (512, 256), (768, 256), (1024, 176)]
        );
        for (addr, len) in chunks {
            assert!(addr as usize % 256 + len <= 256);
        }
        assert_eq!(master.count_opcode(opcodes::WREN), 5);
        assert_eq!((master.claims, master.releases), (1, 1));
    }

    #[test]
    fn test_write_respects_transport_limit() {
        let clock = MockClock::new();
        let mut master = MockMaster::new(&clock);
        master.max_write = 100;
        let data = [0u8; 300];

        handle(&mut master, &clock, "S25FL016A", FlashConfig::default())
            .write(0, &data)
            .unwrap();

        assert_eq!(
            program_chunks(&master),
            [(0, 100), (100, 100), (200, 56), (256, 44)]
        );
    }

    #[test]
    fn test_write_empty_still_claims_bus() {
        let clock = MockClock::new();
        let mut master = MockMaster::new(&clock);

        handle(&mut master, &clock, "S25FL016A", FlashConfig::default())
            .write(0x100, &[])
            .unwrap();

        assert!(master.log.is_empty());
        assert_eq!((master.claims, master.releases), (1, 1));
    }

    #[test]
    fn test_write_claim_failure_sends_nothing() {
        let clock = MockClock::new();
        let mut master = MockMaster::new(&clock);
        master.fail_claim = true;

        let err = handle(&mut master, &clock, "S25FL016A", FlashConfig::default())
            .write(0, &[1, 2, 3])
            .unwrap_err();

        assert_eq!(err, Error::TransportClaimFailed);
        assert!(master.log.is_empty());
        assert_eq!(master.releases, 0);
    }

    #[test]
    fn test_write_failure_releases_bus() {
        let clock = MockClock::new();
        let mut master = MockMaster::new(&clock);
        master.fail_opcode = Some(opcodes::PP);

        let err = handle(&mut master, &clock, "S25FL016A", FlashConfig::default())
            .write(0x10, &[0u8; 600])
            .unwrap_err();

        assert_eq!(err, Error::ProgramCommandFailed { addr: 0x10 });
        assert_eq!(master.count_opcode(opcodes::PP), 1);
        assert_eq!((master.claims, master.releases), (1, 1));
    }

    #[test]
    fn test_write_poll_timeout_aborts() {
        let clock = MockClock::new();
        let mut master = MockMaster::new(&clock);
        master.stuck_busy = true;

        let err = handle(&mut master, &clock, "S25FL016A", FlashConfig::default())
            .write(0, &[0u8; 512])
            .unwrap_err();

        assert_eq!(err, Error::PollTimeout);
        assert_eq!(master.count_opcode(opcodes::PP), 1);
        assert_eq!(master.releases, 1);
    }

    #[test]
    fn test_write_out_of_bounds() {
        let clock = MockClock::new();
        let mut master = MockMaster::new(&clock);

        let mut h = handle(&mut master, &clock, "S25FL008A", FlashConfig::default());
        let size = h.size();
        assert_eq!(h.write(size - 1, &[0, 0]), Err(Error::AddressOutOfBounds));
        assert!(h.write(size - 2, &[0, 0]).is_ok());
    }

    #[test]
    fn test_narrow_mode_limits_large_devices() {
        let clock = MockClock::new();
        let mut master = MockMaster::new(&clock);

        let mut h = handle(&mut master, &clock, "S25FL512S", FlashConfig::default());
        assert_eq!(h.addressable_size(), 16 * 1024 * 1024);
        assert_eq!(
            h.write(16 * 1024 * 1024, &[0]),
            Err(Error::AddressOutOfBounds)
        );
    }

    #[test]
    fn test_wide_write_uses_4byte_opcode() {
        let clock = MockClock::new();
        let mut master = MockMaster::new(&clock);
        let config = FlashConfig::new(AddressingMode::Wide32);

        handle(&mut master, &clock, "S25FL512S", config)
            .write(0x0200_0100, &[0u8; 8])
            .unwrap();

        let pp: Vec<_> = master.commands().filter(|r| r.opcode == opcodes::PP_4B).collect();
        assert_eq!(pp.len(), 1);
        assert_eq!(pp[0].header.as_slice(), &[0x12, 0x02, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_dual_chip_addressing() {
        let clock = MockClock::new();
        let config = FlashConfig::new(AddressingMode::Wide32).with_dual_chip(true);

        let mut master = MockMaster::new(&clock);
        let mut h = handle(&mut master, &clock, "S25FL128P_64K", config);
        assert_eq!(h.effective_page_size(), 512);
        h.write(0x400, &[0u8; 1024]).unwrap();
        // Chunks double to 512 bytes, addresses advance by half the payload
        assert_eq!(program_chunks(&master), [(0x200, 512), (0x300, 512)]);

        let mut master = MockMaster::new(&clock);
        handle(&mut master, &clock, "S25FL128P_64K", config.with_dual_chip(false))
            .write(0x400, &[0u8; 1024])
            .unwrap();
        assert_eq!(
            program_chunks(&master),
            [(0x400, 256), (0x500, 256), (0x600, 256), (0x700, 256)]
        );
    }

    #[test]
    fn test_dual_chip_odd_transport_limit_keeps_pairs() {
        let clock = MockClock::new();
        let mut master = MockMaster::new(&clock);
        master.max_write = 255;
        let config = FlashConfig::new(AddressingMode::Wide32).with_dual_chip(true);

        handle(&mut master, &clock, "S25FL128P_64K", config)
            .write(0, &[0u8; 512])
            .unwrap();

        assert_eq!(
            program_chunks(&master),
            [(0, 254), (127, 254), (254, 4)]
        );

        let mut master = MockMaster::new(&clock);
        master.max_write = 1;
        handle(&mut master, &clock, "S25FL128P_64K", config)
            .write(0, &[0u8; 4])
            .unwrap();
        assert_eq!(program_chunks(&master), [(0, 2), (1, 2)]);
    }

    #[test]
    fn test_dual_chip_narrow_sends_page_and_byte() {
        let clock = MockClock::new();
        let mut master = MockMaster::new(&clock);
        let config = FlashConfig::default().with_dual_chip(true);

        handle(&mut master, &clock, "S25FL016A", config)
            .write(0x1F0, &[0u8; 64])
            .unwrap();

        assert_eq!(program_chunks(&master), [(0x1F0, 16), (0x200, 48)]);
        let program = master
            .log
            .iter()
            .find(|r| r.opcode == opcodes::PP)
            .unwrap();
        assert_eq!(program.header.as_slice(), [0x02, 0x00, 0x01, 0xF0]);
    }

    #[test]
    fn test_erase_misaligned_issues_nothing() {
        let clock = MockClock::new();
        let mut master = MockMaster::new(&clock);
        let mut h = handle(&mut master, &clock, "S25FL128P_64K", FlashConfig::default());

        assert_eq!(h.erase(0x1000, 0x10000), Err(Error::MisalignedErase));
        assert_eq!(h.erase(0x10000, 0x1000), Err(Error::MisalignedErase));
        assert_eq!(h.erase(0, 0x10001), Err(Error::MisalignedErase));

        assert!(master.log.is_empty());
        assert_eq!(master.claims, 0);
    }

    #[test]
    fn test_erase_sector_sequence() {
        let clock = MockClock::new();
        let mut master = MockMaster::new(&clock);

        handle(&mut master, &clock, "S25FL128P_64K", FlashConfig::default())
            .erase(0x20000, 0x30000)
            .unwrap();

        let headers: Vec<_> = master
            .commands()
            .filter(|r| r.opcode == opcodes::SE)
            .map(|r| r.header.clone())
            .collect();
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[0].as_slice(), &[0xD8, 0x02, 0x00, 0x00]);
        assert_eq!(headers[1].as_slice(), &[0xD8, 0x03, 0x00, 0x00]);
        assert_eq!(headers[2].as_slice(), &[0xD8, 0x04, 0x00, 0x00]);
        assert_eq!(master.count_opcode(opcodes::WREN), 3);
        assert_eq!((master.claims, master.releases), (1, 1));
    }

    #[test]
    fn test_erase_wide_256k_sectors() {
        let clock = MockClock::new();
        let mut master = MockMaster::new(&clock);
        let config = FlashConfig::new(AddressingMode::Wide32);

        handle(&mut master, &clock, "S25FL512S", config)
            .erase(0x0200_0000, 0x80000)
            .unwrap();

        let addrs: Vec<_> = master
            .commands()
            .filter(|r| r.opcode == opcodes::SE_4B)
            .map(|r| r.address.unwrap())
            .collect();
        assert_eq!(addrs, [0x0200_0000, 0x0204_0000]);
    }

    #[test]
    fn test_erase_timeout_stops_sequence() {
        let clock = MockClock::new();
        let mut master = MockMaster::new(&clock);
        master.stuck_busy = true;
        let config = FlashConfig::default();

        let err = handle(&mut master, &clock, "S25FL016A", config)
            .erase(0, 0x30000)
            .unwrap_err();

        assert_eq!(err, Error::PollTimeout);
        assert_eq!(master.count_opcode(opcodes::SE), 1);
        assert_eq!(master.releases, 1);
        let elapsed = clock.now_us();
        assert!(elapsed >= config.timeouts.erase_us as u64);
        assert!(elapsed <= (config.timeouts.erase_us + config.timeouts.erase_poll_us) as u64);
    }

    #[test]
    fn test_erase_command_failure() {
        let clock = MockClock::new();
        let mut master = MockMaster::new(&clock);
        master.fail_opcode = Some(opcodes::SE);

        let err = handle(&mut master, &clock, "S25FL016A", FlashConfig::default())
            .erase(0x10000, 0x10000)
            .unwrap_err();
        assert_eq!(err, Error::EraseCommandFailed { addr: 0x10000 });
        assert_eq!(master.releases, 1);
    }

    #[test]
    fn test_read_is_single_fast_read() {
        let clock = MockClock::new();
        let mut master = MockMaster::new(&clock);
        let mut buf = [0u8; 5000];

        handle(&mut master, &clock, "S25FL128P_64K", FlashConfig::default())
            .read(0x1234, &mut buf)
            .unwrap();

        assert_eq!(master.log.len(), 1);
        assert_eq!(master.log[0].header.as_slice(), &[0x0B, 0x00, 0x12, 0x34, 0x00]);
        assert_eq!(master.log[0].read_len, 5000);
        // Reads do not claim the bus
        assert_eq!(master.claims, 0);
    }

    #[test]
    fn test_read_memory_mapped() {
        let clock = MockClock::new();
        let mut master = MockMaster::new(&clock);
        let window: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let mut buf = [0u8; 4];

        let mut h = handle(&mut master, &clock, "S25FL016A", FlashConfig::default())
            .with_memory_map(&window);
        h.read(0x102, &mut buf).unwrap();
        assert_eq!(buf, [0x02, 0x03, 0x04, 0x05]);
        assert_eq!(h.read(4094, &mut buf), Err(Error::AddressOutOfBounds));

        assert!(master.log.is_empty());
    }
}
