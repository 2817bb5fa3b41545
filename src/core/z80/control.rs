// genesis-hal/src/core/z80/control.rs

//! Rotinas de controle do Z80: reset, limpeza da RAM e carga de programas.
//! A RAM do Z80 só aceita acessos de 8 bits vindos do 68000.

use log::{debug, info};
use thiserror::Error;

use crate::core::memory::port::RegisterPort;
use crate::core::memory::{Z80_RAM_ADDRESS, Z80_RAM_SIZE, Z80_RESET_PORT};
use crate::core::z80::bus::{AcquireMode, BusArbiter, BusGuard};
use crate::core::z80::{BusError, Z80Line};

/// Erros de carga na RAM do Z80
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Z80Error {
    #[error("{len} bytes at offset {offset:#06X} do not fit in Z80 RAM")]
    TooLarge { offset: u16, len: usize },
    #[error("Z80 RAM access needs a confirmed bus grant, not a fast request")]
    NotGranted,
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Pulsa a linha de reset do Z80
pub(crate) fn pulse_reset<P: RegisterPort + ?Sized>(port: &mut P, delay: u16) {
    port.write_u16(Z80_RESET_PORT, 0);
    port.delay(delay);
    port.write_u16(Z80_RESET_PORT, Z80Line::ACTIVE.bits());
}

impl<'a, P: RegisterPort> BusGuard<'a, P> {
    /// Copia `src` para a RAM do Z80 a partir de `dest`
    pub fn load_data(&mut self, src: &[u8], dest: u16) -> Result<(), Z80Error> {
        if self.mode() != Some(AcquireMode::Safe) {
            return Err(Z80Error::NotGranted);
        }
        if dest as usize + src.len() > Z80_RAM_SIZE {
            return Err(Z80Error::TooLarge { offset: dest, len: src.len() });
        }
        let base = Z80_RAM_ADDRESS + dest as u32;
        for (i, byte) in src.iter().enumerate() {
            self.write_u8(base + i as u32, *byte);
        }
        Ok(())
    }

    /// Zera toda a RAM do Z80
    pub fn clear_ram(&mut self) -> Result<(), Z80Error> {
        if self.mode() != Some(AcquireMode::Safe) {
            return Err(Z80Error::NotGranted);
        }
        for offset in 0..Z80_RAM_SIZE as u32 {
            self.write_u8(Z80_RAM_ADDRESS + offset, 0);
        }
        Ok(())
    }
}

/// Visão sobre a porta e o árbitro para controlar o Z80
pub struct Z80Control<'a, P: RegisterPort> {
    port: &'a mut P,
    bus: &'a mut BusArbiter,
    reset_delay: u16,
}

impl<'a, P: RegisterPort> Z80Control<'a, P> {
    pub fn new(port: &'a mut P, bus: &'a mut BusArbiter, reset_delay: u16) -> Self {
        Self { port, bus, reset_delay }
    }

    /// Para o Z80, limpa sua RAM, reseta e deixa rodar
    pub fn init(&mut self) -> Result<(), Z80Error> {
        let delay = self.reset_delay;
        let mut guard = self.bus.lock(&mut *self.port)?;
        guard.clear_ram()?;
        pulse_reset(&mut *guard, delay);
        drop(guard);
        info!("Z80 initialised ({} bytes of RAM cleared)", Z80_RAM_SIZE);
        Ok(())
    }

    /// Força o Z80 a recomeçar do endereço 0
    pub fn reset(&mut self) {
        pulse_reset(&mut *self.port, self.reset_delay);
        debug!("Z80 reset");
    }

    /// Carrega um programa no início da RAM do Z80 e o reinicia
    pub fn program_load(&mut self, program: &[u8]) -> Result<(), Z80Error> {
        let delay = self.reset_delay;
        let mut guard = self.bus.lock(&mut *self.port)?;
        guard.load_data(program, 0)?;
        pulse_reset(&mut *guard, delay);
        drop(guard);
        info!("Z80 program loaded: {} bytes", program.len());
        Ok(())
    }

    /// Obtém o barramento para acessar a RAM do Z80
    pub fn lock(&mut self) -> Result<BusGuard<'_, P>, BusError> {
        self.bus.lock(&mut *self.port)
    }

    pub fn is_bus_free(&mut self) -> bool {
        self.bus.is_free(&mut *self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::{MemRegion, PortAccess, RecordingPort, Z80_BUS_PORT};

    #[test]
    fn test_reset_pulse() {
        let mut port = RecordingPort::new();
        let mut bus = BusArbiter::new();
        Z80Control::new(&mut port, &mut bus, 0x20).reset();

        assert_eq!(
            port.accesses(),
            &[
                PortAccess::Write16 { addr: Z80_RESET_PORT, value: 0x000 },
                PortAccess::Write16 { addr: Z80_RESET_PORT, value: 0x100 },
            ]
        );
        assert_eq!(port.relax_count(), 0x20);
        assert!(port.reset_released());
    }

    #[test]
    fn test_init_clears_ram_under_bus() {
        let mut port = RecordingPort::new();
        let mut bus = BusArbiter::new();
        Z80Control::new(&mut port, &mut bus, 4).init().unwrap();

        assert!(port.zram().iter().all(|b| *b == 0));
        assert_eq!(port.writes_in(MemRegion::Zram).len(), Z80_RAM_SIZE);
        assert_eq!(port.bus_writes(), vec![0x100, 0x000]);
        assert!(!bus.is_held());

        // Last two accesses: reset deasserted, then bus released
        let tail = &port.accesses()[port.accesses().len() - 2..];
        assert_eq!(
            tail,
            &[
                PortAccess::Write16 { addr: Z80_RESET_PORT, value: 0x100 },
                PortAccess::Write16 { addr: Z80_BUS_PORT, value: 0x000 },
            ]
        );
    }

    #[test]
    fn test_program_load() {
        let mut port = RecordingPort::new();
        let mut bus = BusArbiter::new();
        let program = [0xF3, 0xC3, 0x00, 0x01];
        Z80Control::new(&mut port, &mut bus, 1).program_load(&program).unwrap();

        assert_eq!(&port.zram()[..4], &program);
        assert!(!bus.is_held());
    }

    #[test]
    fn test_load_data_bounds() {
        let mut port = RecordingPort::new();
        let mut bus = BusArbiter::new();
        let mut z80 = Z80Control::new(&mut port, &mut bus, 1);

        let mut guard = z80.lock().unwrap();
        guard.load_data(&[1, 2, 3], 0x1FFD).unwrap();
        assert_eq!(
            guard.load_data(&[1, 2], 0x1FFF),
            Err(Z80Error::TooLarge { offset: 0x1FFF, len: 2 })
        );
        drop(guard);
        assert_eq!(&port.zram()[0x1FFD..], &[1, 2, 3]);
    }

    #[test]
    fn test_load_data_needs_safe_grant() {
        let mut port = RecordingPort::new();
        let mut bus = BusArbiter::new();
        let mut guard = bus.lock_fast(&mut port).unwrap();
        assert_eq!(guard.load_data(&[1], 0), Err(Z80Error::NotGranted));
        assert_eq!(guard.clear_ram(), Err(Z80Error::NotGranted));
    }

    #[test]
    fn test_program_load_rejects_reentry() {
        let mut port = RecordingPort::new();
        let mut bus = BusArbiter::new();
        bus.request_fast(&mut port).unwrap();
        let result = Z80Control::new(&mut port, &mut bus, 1).program_load(&[0]);
        assert_eq!(result, Err(Z80Error::Bus(BusError::AlreadyOwned)));
    }
}
