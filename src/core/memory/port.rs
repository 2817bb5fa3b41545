// genesis-hal/src/core/memory/port.rs

//! Interface mínima de porta de registradores.
//!
//! Toda escrita no VDP e no controle do Z80 passa por esta trait. Em hardware
//! ela é implementada com acessos voláteis (`MmioPort`); nos testes com uma
//! porta que grava cada acesso (`RecordingPort`).

/// Porta de registradores mapeada em memória
pub trait RegisterPort {
    /// Escreve um byte (a RAM do Z80 só aceita acessos de 8 bits)
    fn write_u8(&mut self, addr: u32, value: u8);

    /// Escreve uma palavra de 16 bits
    fn write_u16(&mut self, addr: u32, value: u16);

    /// Escreve um par de palavras como um único acesso de 32 bits
    fn write_u32(&mut self, addr: u32, value: u32);

    /// Lê uma palavra de 16 bits (status do VDP, linha de barramento do Z80)
    fn read_u16(&mut self, addr: u32) -> u16;

    /// Chamado a cada volta de uma espera ativa
    fn relax(&mut self) {
        std::hint::spin_loop();
    }

    /// Espera um número fixo de voltas sem tocar no hardware
    fn delay(&mut self, iterations: u16) {
        for _ in 0..iterations {
            self.relax();
        }
    }
}

impl<P: RegisterPort + ?Sized> RegisterPort for &mut P {
    fn write_u8(&mut self, addr: u32, value: u8) {
        (**self).write_u8(addr, value)
    }

    fn write_u16(&mut self, addr: u32, value: u16) {
        (**self).write_u16(addr, value)
    }

    fn write_u32(&mut self, addr: u32, value: u32) {
        (**self).write_u32(addr, value)
    }

    fn read_u16(&mut self, addr: u32) -> u16 {
        (**self).read_u16(addr)
    }

    fn relax(&mut self) {
        (**self).relax()
    }

    fn delay(&mut self, iterations: u16) {
        (**self).delay(iterations)
    }
}
