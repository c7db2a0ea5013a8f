//! S25FL protocol implementation
//!
//! Single commands and the write-enable / command / poll sequences used
//! by the write and erase engines. None of these claim the bus; callers
//! that issue several of them back to back hold a `BusGuard`.

use crate::chip::ChipId;
use crate::error::{Error, Result};
use crate::programmer::{Clock, SpiMaster};
use crate::spi::{opcodes, AddressingMode, BankRegister, FlashOp, SpiCommand, StatusRegister};

/// Read the raw identification response (manufacturer, primary id, secondary id)
pub fn read_id<M: SpiMaster + ?Sized>(master: &mut M) -> Result<[u8; ChipId::RESPONSE_LEN]> {
    let mut buf = [0u8; ChipId::RESPONSE_LEN];
    let mut cmd = SpiCommand::read_reg(opcodes::RDID, &mut buf);
    master.execute(&mut cmd)?;
    Ok(buf)
}

/// Read the status register
pub fn read_status<M: SpiMaster + ?Sized>(master: &mut M) -> Result<StatusRegister> {
    let mut buf = [0u8; 1];
    let mut cmd = SpiCommand::read_reg(opcodes::RDSR, &mut buf);
    master.execute(&mut cmd)?;
    Ok(StatusRegister::from_bits_retain(buf[0]))
}

/// Send the Write Enable command
pub fn write_enable<M: SpiMaster + ?Sized>(master: &mut M) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcodes::WREN);
    master.execute(&mut cmd).map_err(|e| {
        log::debug!("SF: Enabling Write failed ({})", e);
        Error::WriteEnableFailed
    })
}

/// Send the Write Disable command
pub fn write_disable<M: SpiMaster + ?Sized>(master: &mut M) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcodes::WRDI);
    master.execute(&mut cmd)
}

/// Wait for the WIP (Write In Progress) bit to clear
///
/// The baseline is taken from `clock` before the first status read. After
/// every busy reading the elapsed time is compared against `timeout_us`,
/// so a timeout is reported no earlier than the budget and no later than
/// one `poll_delay_us` past it. A failed status read is returned as is.
///
/// # Typical budgets
/// * Page program: 10us poll, 10ms timeout
/// * Sector erase: 10ms poll, several seconds timeout
pub fn wait_ready<M: SpiMaster + ?Sized, C: Clock + ?Sized>(
    master: &mut M,
    clock: &C,
    poll_delay_us: u32,
    timeout_us: u32,
) -> Result<()> {
    let baseline = clock.now_us();

    loop {
        let status = read_status(master)?;
        if !status.is_busy() {
            return Ok(());
        }
        if clock.elapsed_us(baseline) >= timeout_us as u64 {
            return Err(Error::PollTimeout);
        }
        master.delay_us(poll_delay_us);
    }
}

/// Check if a program or erase operation is in progress
pub fn is_busy<M: SpiMaster + ?Sized>(master: &mut M) -> Result<bool> {
    Ok(read_status(master)?.is_busy())
}

/// Write the bank address register
pub fn write_bank_register<M: SpiMaster + ?Sized>(master: &mut M, value: BankRegister) -> Result<()> {
    let data = [value.bits()];
    let mut cmd = SpiCommand::write_reg(opcodes::BRWR, &data);
    master.execute(&mut cmd)
}

/// Read the bank address register
pub fn read_bank_register<M: SpiMaster + ?Sized>(master: &mut M) -> Result<BankRegister> {
    let mut buf = [0u8; 1];
    let mut cmd = SpiCommand::read_reg(opcodes::BRRD, &mut buf);
    master.execute(&mut cmd)?;
    Ok(BankRegister::from_bits_retain(buf[0]))
}

/// Make the legacy opcodes take 4-byte addresses
///
/// Sets the EXTADD bit of the bank register. Needed once per session in
/// `AddressingMode::Wide32WithBank`.
pub fn enable_extended_addressing<M: SpiMaster + ?Sized>(master: &mut M) -> Result<()> {
    write_bank_register(master, BankRegister::EXTADD).map_err(|e| {
        log::error!("SF: Failed to Bank Register Write command ({})", e);
        Error::BankSetupFailed
    })
}

/// Issue one fast read streaming `buf.len()` bytes from `addr`
pub fn fast_read<M: SpiMaster + ?Sized>(
    master: &mut M,
    mode: AddressingMode,
    addr: u32,
    buf: &mut [u8],
) -> Result<()> {
    let mut cmd = SpiCommand::read(
        mode.opcode(FlashOp::FastRead),
        addr,
        mode.address_width(),
        buf,
    )
    .with_dummy_cycles(opcodes::FAST_READ_DUMMY_CYCLES);
    master.execute(&mut cmd)
}

/// Program a single chunk: write enable, page program, wait for completion
///
/// The data must not cross a page boundary.
pub fn program_page<M: SpiMaster + ?Sized, C: Clock + ?Sized>(
    master: &mut M,
    clock: &C,
    mode: AddressingMode,
    addr: u32,
    data: &[u8],
    poll_delay_us: u32,
    timeout_us: u32,
) -> Result<()> {
    write_enable(master)?;

    let mut cmd = SpiCommand::write(
        mode.opcode(FlashOp::PageProgram),
        addr,
        mode.address_width(),
        data,
    );
    master.execute(&mut cmd).map_err(|e| {
        log::debug!("SF: Page Program failed ({})", e);
        Error::ProgramCommandFailed { addr }
    })?;

    wait_ready(master, clock, poll_delay_us, timeout_us).inspect_err(|_| {
        log::debug!("SF: Page programming timed out at 0x{:08X}", addr);
    })
}

/// Erase a single sector: write enable, sector erase, wait for completion
pub fn erase_sector<M: SpiMaster + ?Sized, C: Clock + ?Sized>(
    master: &mut M,
    clock: &C,
    mode: AddressingMode,
    addr: u32,
    poll_delay_us: u32,
    timeout_us: u32,
) -> Result<()> {
    write_enable(master)?;

    let mut cmd = SpiCommand::erase(
        mode.opcode(FlashOp::SectorErase),
        addr,
        mode.address_width(),
    );
    master.execute(&mut cmd).map_err(|e| {
        log::debug!("SF: Sector Erase failed ({})", e);
        Error::EraseCommandFailed { addr }
    })?;

    wait_ready(master, clock, poll_delay_us, timeout_us).inspect_err(|_| {
        log::debug!("SF: Sector erase timed out at 0x{:08X}", addr);
    })
}
