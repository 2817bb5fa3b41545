//! Porta real: acessos voláteis aos endereços físicos do console.

use crate::core::memory::port::RegisterPort;
use crate::core::memory::ADDRESS_MASK;

/// Acesso direto às portas mapeadas em memória do 68000
#[derive(Debug)]
pub struct MmioPort {
    _private: (),
}

impl MmioPort {
    /// Cria a porta de hardware.
    ///
    /// # Safety
    ///
    /// Só pode ser usada num processo cujo espaço de endereços mapeia o VDP
    /// e o controle do Z80 nos endereços do Mega Drive, e deve existir apenas
    /// uma instância ativa.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterPort for MmioPort {
    fn write_u8(&mut self, addr: u32, value: u8) {
        // SAFETY: endereço de porta válido garantido pelo contrato de `new`
        unsafe { std::ptr::write_volatile((addr & ADDRESS_MASK) as usize as *mut u8, value) }
    }

    fn write_u16(&mut self, addr: u32, value: u16) {
        // SAFETY: idem; portas são alinhadas em palavra
        unsafe { std::ptr::write_volatile((addr & ADDRESS_MASK) as usize as *mut u16, value) }
    }

    fn write_u32(&mut self, addr: u32, value: u32) {
        // SAFETY: idem
        unsafe { std::ptr::write_volatile((addr & ADDRESS_MASK) as usize as *mut u32, value) }
    }

    fn read_u16(&mut self, addr: u32) -> u16 {
        // SAFETY: idem
        unsafe { std::ptr::read_volatile((addr & ADDRESS_MASK) as usize as *const u16) }
    }
}
