//! Recording transport and manual clock for unit tests

use core::cell::Cell;
use std::vec::Vec;

use crate::error::{Error, Result};
use crate::programmer::{Clock, SpiMaster};
use crate::spi::{opcodes, SpiCommand, MAX_HEADER_LEN};

/// Clock that only moves when the mock transport delays
pub(crate) struct MockClock {
    now: Cell<u64>,
}

impl MockClock {
    pub(crate) fn new() -> Self {
        Self { now: Cell::new(0) }
    }

    pub(crate) fn advance(&self, us: u64) {
        self.now.set(self.now.get() + us);
    }
}

impl Clock for MockClock {
    fn now_us(&self) -> u64 {
        self.now.get()
    }
}

/// One executed command
pub(crate) struct Recorded {
    pub opcode: u8,
    pub address: Option<u32>,
    pub header: heapless::Vec<u8, MAX_HEADER_LEN>,
    pub payload: Vec<u8>,
    pub payload_len: usize,
    pub read_len: usize,
}

/// Transport that records every command and answers status reads from a script
///
/// It does not model memory contents; that is the emulator crate's job.
pub(crate) struct MockMaster<'c> {
    clock: &'c MockClock,
    pub log: Vec<Recorded>,
    pub id: [u8; 5],
    pub busy_polls: usize,
    pub stuck_busy: bool,
    pub fail_opcode: Option<u8>,
    pub fail_claim: bool,
    pub max_write: usize,
    pub claims: usize,
    pub releases: usize,
}

impl<'c> MockMaster<'c> {
    pub(crate) fn new(clock: &'c MockClock) -> Self {
        Self {
            clock,
            log: Vec::new(),
            id: [0x01, 0x20, 0x18, 0x03, 0x01],
            busy_polls: 0,
            stuck_busy: false,
            fail_opcode: None,
            fail_claim: false,
            max_write: usize::MAX,
            claims: 0,
            releases: 0,
        }
    }

    pub(crate) fn count_opcode(&self, opcode: u8) -> usize {
        self.log.iter().filter(|r| r.opcode == opcode).count()
    }

    /// Commands other than status polls
    pub(crate) fn commands(&self) -> impl Iterator<Item = &Recorded> {
        self.log.iter().filter(|r| r.opcode != opcodes::RDSR)
    }
}

impl SpiMaster for MockMaster<'_> {
    fn max_write_len(&self) -> usize {
        self.max_write
    }

    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        self.log.push(Recorded {
            opcode: cmd.opcode,
            address: cmd.address,
            header: cmd.header(),
            payload: cmd.write_data.to_vec(),
            payload_len: cmd.write_data.len(),
            read_len: cmd.read_buf.len(),
        });

        if self.fail_opcode == Some(cmd.opcode) {
            return Err(Error::SpiTransferFailed);
        }

        match cmd.opcode {
            opcodes::RDID => {
                let n = cmd.read_buf.len().min(self.id.len());
                cmd.read_buf[..n].copy_from_slice(&self.id[..n]);
            }
            opcodes::RDSR => {
                let busy = if self.stuck_busy {
                    true
                } else if self.busy_polls > 0 {
                    self.busy_polls -= 1;
                    true
                } else {
                    false
                };
                cmd.read_buf[0] = if busy { opcodes::StatusRegister::WIP.bits() } else { 0 };
            }
            _ => cmd.read_buf.fill(0xFF),
        }
        Ok(())
    }

    fn claim_bus(&mut self) -> Result<()> {
        if self.fail_claim {
            return Err(Error::SpiTransferFailed);
        }
        self.claims += 1;
        Ok(())
    }

    fn release_bus(&mut self) {
        self.releases += 1;
    }

    fn delay_us(&mut self, us: u32) {
        self.clock.advance(us as u64);
    }
}
