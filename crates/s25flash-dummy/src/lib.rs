//! s25flash-dummy - In-memory S25FL emulator for testing
//!
//! This crate provides a transport that emulates a Spansion S25FL flash
//! chip in memory. Program and erase operations keep the chip busy for a
//! configurable time measured on a [`SimClock`], which only advances when
//! the driver delays between status polls. Failures can be injected per
//! opcode and every command is recorded for inspection.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::rc::Rc;
#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;
#[cfg(feature = "alloc")]
use core::cell::Cell;

use s25flash_core::chip::{manufacturer, DeviceGeometry};
use s25flash_core::error::{Error, Result};
use s25flash_core::programmer::{Clock, SpiMaster};
use s25flash_core::spi::{opcodes, AddressWidth, BankRegister, SpiCommand, StatusRegister};

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Manufacturer byte of the RDID response
    pub manufacturer_id: u8,
    /// Primary identifier
    pub primary_id: u16,
    /// Secondary identifier
    pub secondary_id: u16,
    /// Flash size in bytes
    pub size: usize,
    /// Page size for programming
    pub page_size: usize,
    /// Sector size for erasing
    pub sector_size: usize,
    /// Time a page program keeps the chip busy
    pub program_busy_us: u64,
    /// Time a sector erase keeps the chip busy
    pub erase_busy_us: u64,
    /// Largest payload accepted in one transaction
    pub max_write_len: usize,
    /// Two devices in lockstep: pages double and 4-byte program addresses
    /// count byte pairs
    pub dual_chip: bool,
}

impl DummyConfig {
    /// Emulate a registered part
    pub fn for_chip(geometry: &DeviceGeometry) -> Self {
        Self {
            manufacturer_id: manufacturer::SPANSION,
            primary_id: geometry.primary_id,
            secondary_id: geometry.secondary_id,
            size: geometry.total_size() as usize,
            page_size: geometry.page_size as usize,
            sector_size: geometry.sector_size() as usize,
            ..Self::default()
        }
    }

    /// Set the dual-chip flag
    pub fn with_dual_chip(mut self, dual_chip: bool) -> Self {
        self.dual_chip = dual_chip;
        self
    }
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            manufacturer_id: manufacturer::SPANSION,
            primary_id: 0x2018, // S25FL128P, 64 KiB sectors
            secondary_id: 0x0301,
            size: 16 * 1024 * 1024,
            page_size: 256,
            sector_size: 64 * 1024,
            program_busy_us: 700,
            erase_busy_us: 500_000,
            max_write_len: 4096,
            dual_chip: false,
        }
    }
}

/// Shared simulated clock
///
/// Clones observe the same time. The emulator advances it from `delay_us`,
/// so a driver polling for completion sees time pass exactly as fast as it
/// waits.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<u64>>,
}

#[cfg(feature = "alloc")]
impl SimClock {
    /// Create a clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward
    pub fn advance(&self, us: u64) {
        self.now.set(self.now.get() + us);
    }
}

#[cfg(feature = "alloc")]
impl Clock for SimClock {
    fn now_us(&self) -> u64 {
        self.now.get()
    }
}

/// One command as seen by the emulator
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    /// Opcode byte
    pub opcode: u8,
    /// Decoded address, if the command carried one
    pub address: Option<u32>,
    /// Encoded opcode, address and dummy bytes
    pub header: Vec<u8>,
    /// Number of payload bytes written
    pub payload_len: usize,
    /// Number of bytes read back
    pub read_len: usize,
}

/// Dummy flash programmer
///
/// Emulates one S25FL device (or a lockstep pair) in memory.
#[cfg(feature = "alloc")]
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u8>,
    clock: SimClock,
    busy_until: u64,
    write_enabled: bool,
    bank: BankRegister,
    stuck_busy: bool,
    fail_opcode: Option<u8>,
    fail_claim: bool,
    claimed: bool,
    claims: usize,
    releases: usize,
    record: bool,
    log: Vec<CommandRecord>,
}

#[cfg(feature = "alloc")]
impl DummyFlash {
    /// Create a new dummy flash with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![0xFF; config.size];
        Self {
            config,
            data,
            clock: SimClock::new(),
            busy_until: 0,
            write_enabled: false,
            bank: BankRegister::empty(),
            stuck_busy: false,
            fail_opcode: None,
            fail_claim: false,
            claimed: false,
            claims: 0,
            releases: 0,
            record: true,
            log: Vec::new(),
        }
    }

    /// Create a new dummy flash with default configuration (S25FL128P)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a dummy flash with pre-filled data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Get a handle to the simulated clock
    pub fn clock(&self) -> SimClock {
        self.clock.clone()
    }

    /// Current bank register contents
    pub fn bank_register(&self) -> BankRegister {
        self.bank
    }

    /// Keep the busy bit set forever
    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Make every command with this opcode fail at the transport level
    pub fn fail_opcode(&mut self, opcode: Option<u8>) {
        self.fail_opcode = opcode;
    }

    /// Make `claim_bus` fail
    pub fn fail_claim(&mut self, fail: bool) {
        self.fail_claim = fail;
    }

    /// Change the largest payload accepted in one transaction
    pub fn set_max_write_len(&mut self, len: usize) {
        self.config.max_write_len = len;
    }

    /// Every command executed so far
    pub fn command_log(&self) -> &[CommandRecord] {
        &self.log
    }

    /// Turn command recording on or off (on by default)
    pub fn set_command_log(&mut self, enabled: bool) {
        self.record = enabled;
    }

    /// Forget the recorded commands
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Number of recorded commands with the given opcode
    pub fn count_opcode(&self, opcode: u8) -> usize {
        self.log.iter().filter(|r| r.opcode == opcode).count()
    }

    /// Number of successful bus claims
    pub fn claims(&self) -> usize {
        self.claims
    }

    /// Number of bus releases
    pub fn releases(&self) -> usize {
        self.releases
    }

    /// Whether the bus is currently claimed
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    fn is_busy(&self) -> bool {
        self.stuck_busy || self.clock.now_us() < self.busy_until
    }

    fn status(&self) -> StatusRegister {
        let mut status = StatusRegister::empty();
        status.set(StatusRegister::WIP, self.is_busy());
        status.set(StatusRegister::WEL, self.write_enabled);
        status
    }

    /// Resolve the address of a legacy or 4-byte opcode
    ///
    /// Legacy opcodes take 3 address bytes, or 4 once EXTADD is set. In
    /// 3-byte mode BA24 selects the upper 16 MiB.
    fn resolve_address(&self, cmd: &SpiCommand<'_>, four_byte_opcode: bool) -> Result<usize> {
        let addr = cmd.address.ok_or(Error::OpcodeNotSupported)?;
        let expected = if four_byte_opcode || self.bank.contains(BankRegister::EXTADD) {
            AddressWidth::FourByte
        } else {
            AddressWidth::ThreeByte
        };
        if cmd.address_width != expected {
            log::warn!(
                "dummy: opcode 0x{:02x} sent with {:?} address, device expects {:?}",
                cmd.opcode,
                cmd.address_width,
                expected
            );
            return Err(Error::OpcodeNotSupported);
        }

        let mut addr = addr as usize;
        if expected == AddressWidth::ThreeByte && self.bank.contains(BankRegister::BA24) {
            addr += 1 << 24;
        }
        Ok(addr)
    }

    fn handle_read(&mut self, cmd: &mut SpiCommand<'_>, four_byte_opcode: bool) -> Result<()> {
        let addr = self.resolve_address(cmd, four_byte_opcode)?;
        let len = cmd.read_buf.len();

        if cmd.dummy_cycles != opcodes::FAST_READ_DUMMY_CYCLES {
            return Err(Error::OpcodeNotSupported);
        }
        if addr + len > self.data.len() {
            return Err(Error::AddressOutOfBounds);
        }

        cmd.read_buf.copy_from_slice(&self.data[addr..addr + len]);
        Ok(())
    }

    fn handle_page_program(&mut self, cmd: &SpiCommand<'_>, four_byte_opcode: bool) -> Result<()> {
        let addr = self.resolve_address(cmd, four_byte_opcode)?;
        if !self.accept_modify(cmd.opcode) {
            return Ok(());
        }

        // A lockstep pair presents two bytes per 4-byte address; the 3-byte
        // page/byte form already names the linear offset
        let (start, page_size) = match (self.config.dual_chip, cmd.address_width) {
            (true, AddressWidth::FourByte) => (addr * 2, self.config.page_size * 2),
            (true, _) => (addr, self.config.page_size * 2),
            (false, _) => (addr, self.config.page_size),
        };
        let page_base = start - start % page_size;

        if page_base + page_size > self.data.len() {
            return Err(Error::AddressOutOfBounds);
        }

        // Programming only clears bits and wraps within the page
        for (i, &byte) in cmd.write_data.iter().enumerate() {
            let idx = page_base + (start % page_size + i) % page_size;
            self.data[idx] &= byte;
        }

        self.write_enabled = false;
        self.busy_until = self.clock.now_us() + self.config.program_busy_us;
        Ok(())
    }

    fn handle_sector_erase(&mut self, cmd: &SpiCommand<'_>, four_byte_opcode: bool) -> Result<()> {
        let addr = self.resolve_address(cmd, four_byte_opcode)?;
        if !self.accept_modify(cmd.opcode) {
            return Ok(());
        }

        let erase_size = self.config.sector_size;
        let aligned_addr = addr - addr % erase_size;

        if aligned_addr + erase_size > self.data.len() {
            return Err(Error::AddressOutOfBounds);
        }

        self.data[aligned_addr..aligned_addr + erase_size].fill(0xFF);

        self.write_enabled = false;
        self.busy_until = self.clock.now_us() + self.config.erase_busy_us;
        Ok(())
    }

    /// A modifying command is ignored unless the write latch is set and
    /// the previous operation has completed
    fn accept_modify(&self, opcode: u8) -> bool {
        if self.is_busy() {
            log::warn!("dummy: opcode 0x{:02x} ignored while busy", opcode);
            false
        } else if !self.write_enabled {
            log::warn!("dummy: opcode 0x{:02x} ignored without write enable", opcode);
            false
        } else {
            true
        }
    }
}

#[cfg(feature = "alloc")]
impl SpiMaster for DummyFlash {
    fn max_write_len(&self) -> usize {
        self.config.max_write_len
    }

    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        if self.record {
            self.log.push(CommandRecord {
                opcode: cmd.opcode,
                address: cmd.address,
                header: cmd.header().to_vec(),
                payload_len: cmd.write_data.len(),
                read_len: cmd.read_buf.len(),
            });
        }

        if self.fail_opcode == Some(cmd.opcode) {
            return Err(Error::SpiTransferFailed);
        }
        if cmd.write_data.len() > self.config.max_write_len {
            return Err(Error::SpiTransferFailed);
        }

        match cmd.opcode {
            opcodes::RDID => {
                let id = [
                    self.config.manufacturer_id,
                    (self.config.primary_id >> 8) as u8,
                    self.config.primary_id as u8,
                    (self.config.secondary_id >> 8) as u8,
                    self.config.secondary_id as u8,
                ];
                let n = cmd.read_buf.len().min(id.len());
                cmd.read_buf[..n].copy_from_slice(&id[..n]);
                Ok(())
            }

            opcodes::RDSR => {
                if !cmd.read_buf.is_empty() {
                    cmd.read_buf[0] = self.status().bits();
                }
                Ok(())
            }

            opcodes::WREN => {
                if !self.is_busy() {
                    self.write_enabled = true;
                }
                Ok(())
            }
            opcodes::WRDI => {
                self.write_enabled = false;
                Ok(())
            }

            opcodes::BRRD => {
                if !cmd.read_buf.is_empty() {
                    cmd.read_buf[0] = self.bank.bits();
                }
                Ok(())
            }
            opcodes::BRWR => {
                if let Some(&value) = cmd.write_data.first() {
                    self.bank = BankRegister::from_bits_truncate(value);
                }
                Ok(())
            }

            opcodes::FAST_READ => self.handle_read(cmd, false),
            opcodes::FAST_READ_4B => self.handle_read(cmd, true),

            opcodes::PP => self.handle_page_program(cmd, false),
            opcodes::PP_4B => self.handle_page_program(cmd, true),

            opcodes::SE => self.handle_sector_erase(cmd, false),
            opcodes::SE_4B => self.handle_sector_erase(cmd, true),

            // Unknown opcode
            _ => Err(Error::OpcodeNotSupported),
        }
    }

    fn claim_bus(&mut self) -> Result<()> {
        if self.fail_claim || self.claimed {
            return Err(Error::SpiTransferFailed);
        }
        self.claimed = true;
        self.claims += 1;
        Ok(())
    }

    fn release_bus(&mut self) {
        self.claimed = false;
        self.releases += 1;
    }

    fn delay_us(&mut self, us: u32) {
        self.clock.advance(us as u64);
    }
}
