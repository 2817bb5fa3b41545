// genesis-hal/src/core/z80/bus.rs

//! Arbitragem do barramento compartilhado entre o 68000 e o Z80.
//!
//! O estado de posse é mantido aqui e nunca é reentrante: um `request`
//! precisa de um `release` antes do próximo. O caminho preferido é o
//! `BusGuard`, que libera o barramento no `Drop` em qualquer saída.

use std::ops::{Deref, DerefMut};

use log::{trace, warn};

use crate::core::memory::port::RegisterPort;
use crate::core::memory::{Z80_BUS_PORT, Z80_RESET_PORT};
use crate::core::z80::{BusError, Z80Line};

/// Dono atual do barramento
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusOwner {
    /// 68000 (o Z80 está parado)
    Main,
    /// Z80 rodando
    #[default]
    Coprocessor,
}

/// Como o barramento foi obtido
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireMode {
    /// Esperou a confirmação do Z80; a RAM do Z80 pode ser acessada
    Safe,
    /// Só pediu o barramento para silenciar o Z80 (ex.: disparo de DMA)
    Fast,
}

/// Estado de posse do barramento do Z80
#[derive(Debug, Default)]
pub struct BusArbiter {
    owner: BusOwner,
    mode: Option<AcquireMode>,
}

impl BusArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(&self) -> BusOwner {
        self.owner
    }

    /// Modo da posse atual, se o 68000 detém o barramento
    pub fn mode(&self) -> Option<AcquireMode> {
        self.mode
    }

    pub fn is_held(&self) -> bool {
        self.owner == BusOwner::Main
    }

    /// Pede o barramento e espera o Z80 confirmar.
    ///
    /// Também libera a linha de reset: um reset em andamento impediria o Z80
    /// de responder. A espera não tem limite.
    pub fn request<P: RegisterPort>(&mut self, port: &mut P) -> Result<(), BusError> {
        self.claim(AcquireMode::Safe)?;
        port.write_u16(Z80_BUS_PORT, Z80Line::ACTIVE.bits());
        port.write_u16(Z80_RESET_PORT, Z80Line::ACTIVE.bits());
        while Z80Line::from_bits_truncate(port.read_u16(Z80_BUS_PORT)).contains(Z80Line::ACTIVE) {
            port.relax();
        }
        trace!("Z80 bus acquired");
        Ok(())
    }

    /// Pede o barramento sem esperar a confirmação.
    ///
    /// Válido apenas quando a seção crítica não acessa a memória do Z80.
    pub fn request_fast<P: RegisterPort>(&mut self, port: &mut P) -> Result<(), BusError> {
        self.claim(AcquireMode::Fast)?;
        port.write_u16(Z80_BUS_PORT, Z80Line::ACTIVE.bits());
        trace!("Z80 bus requested (fast)");
        Ok(())
    }

    /// Devolve o barramento ao Z80
    pub fn release<P: RegisterPort>(&mut self, port: &mut P) -> Result<(), BusError> {
        if !self.is_held() {
            warn!("Z80 bus release without a matching request");
            return Err(BusError::NotOwned);
        }
        self.relinquish(port);
        Ok(())
    }

    /// Consulta sem bloquear: true se o Z80 não é mais o dono do barramento
    pub fn is_free<P: RegisterPort>(&self, port: &mut P) -> bool {
        !Z80Line::from_bits_truncate(port.read_u16(Z80_BUS_PORT)).contains(Z80Line::ACTIVE)
    }

    /// Obtém o barramento com espera e devolve um guard que o libera no drop
    pub fn lock<'a, P: RegisterPort>(
        &'a mut self,
        port: &'a mut P,
    ) -> Result<BusGuard<'a, P>, BusError> {
        self.request(port)?;
        Ok(BusGuard { arbiter: self, port })
    }

    /// Como `lock`, mas com `request_fast`
    pub fn lock_fast<'a, P: RegisterPort>(
        &'a mut self,
        port: &'a mut P,
    ) -> Result<BusGuard<'a, P>, BusError> {
        self.request_fast(port)?;
        Ok(BusGuard { arbiter: self, port })
    }

    fn claim(&mut self, mode: AcquireMode) -> Result<(), BusError> {
        if self.is_held() {
            warn!("reentrant Z80 bus request ({:?}) refused", mode);
            return Err(BusError::AlreadyOwned);
        }
        self.owner = BusOwner::Main;
        self.mode = Some(mode);
        Ok(())
    }

    fn relinquish<P: RegisterPort>(&mut self, port: &mut P) {
        port.write_u16(Z80_BUS_PORT, 0);
        self.owner = BusOwner::Coprocessor;
        self.mode = None;
        trace!("Z80 bus released");
    }
}

/// Posse do barramento com escopo; libera no drop
pub struct BusGuard<'a, P: RegisterPort> {
    arbiter: &'a mut BusArbiter,
    port: &'a mut P,
}

impl<'a, P: RegisterPort> BusGuard<'a, P> {
    pub fn mode(&self) -> Option<AcquireMode> {
        self.arbiter.mode()
    }
}

impl<'a, P: RegisterPort> Deref for BusGuard<'a, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.port
    }
}

impl<'a, P: RegisterPort> DerefMut for BusGuard<'a, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.port
    }
}

impl<'a, P: RegisterPort> Drop for BusGuard<'a, P> {
    fn drop(&mut self) {
        self.arbiter.relinquish(self.port);
    }
}
