// genesis-hal/src/core/system.rs

//! Contexto do sistema: dono da porta, do árbitro do barramento e da fila
//! de DMA. Substitui o estado global; cada instância é independente.

use log::info;

use crate::core::config::HalConfig;
use crate::core::memory::port::RegisterPort;
use crate::core::vdp::{DmaEngine, DmaQueue, DmaResult};
use crate::core::z80::{BusArbiter, BusError, BusGuard, Z80Control, Z80Error};

/// Camada de hardware do Mega Drive sobre uma porta de registradores
pub struct MegaDrive<P: RegisterPort> {
    port: P,
    bus: BusArbiter,
    dma_queue: DmaQueue,
    config: HalConfig,
}

impl<P: RegisterPort> MegaDrive<P> {
    pub fn new(port: P, config: HalConfig) -> Self {
        Self {
            port,
            bus: BusArbiter::new(),
            dma_queue: DmaQueue::new(config.dma_queue_capacity),
            config,
        }
    }

    /// Sequência de boot: inicializa o Z80 e esvazia a fila de DMA
    pub fn init(&mut self) -> Result<(), Z80Error> {
        self.z80().init()?;
        self.dma_queue.clear();
        info!(
            "system initialised: DMA queue capacity {}",
            self.dma_queue.capacity()
        );
        Ok(())
    }

    /// Operações de DMA imediatas
    pub fn dma(&mut self) -> DmaEngine<'_, P> {
        DmaEngine::new(&mut self.port, &mut self.bus)
    }

    pub fn dma_queue(&mut self) -> &mut DmaQueue {
        &mut self.dma_queue
    }

    /// Executa a fila de DMA; chamar uma vez por quadro, após o VBlank
    pub fn flush_dma_queue(&mut self) -> DmaResult<usize> {
        self.dma_queue.flush(&mut self.port, &mut self.bus)
    }

    pub fn z80(&mut self) -> Z80Control<'_, P> {
        Z80Control::new(&mut self.port, &mut self.bus, self.config.z80_reset_delay)
    }

    /// Barramento do Z80 com espera, liberado no drop do guard
    pub fn lock_bus(&mut self) -> Result<BusGuard<'_, P>, BusError> {
        self.bus.lock(&mut self.port)
    }

    /// Executa `f` com o barramento obtido; libera em qualquer saída
    pub fn with_bus<R>(&mut self, f: impl FnOnce(&mut P) -> R) -> Result<R, BusError> {
        let mut guard = self.bus.lock(&mut self.port)?;
        Ok(f(&mut guard))
    }

    /// Como `with_bus`, mas só silencia o Z80 (sem acesso à RAM dele)
    pub fn with_bus_fast<R>(&mut self, f: impl FnOnce(&mut P) -> R) -> Result<R, BusError> {
        let mut guard = self.bus.lock_fast(&mut self.port)?;
        Ok(f(&mut guard))
    }

    pub fn bus(&self) -> &BusArbiter {
        &self.bus
    }

    pub fn config(&self) -> &HalConfig {
        &self.config
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn into_port(self) -> P {
        self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::{MemRegion, RecordingPort, Z80_RAM_SIZE};
    use crate::core::vdp::DmaError;

    fn system() -> MegaDrive<RecordingPort> {
        MegaDrive::new(RecordingPort::new(), HalConfig::default().with_dma_queue_capacity(4))
    }

    #[test]
    fn test_init() {
        let mut md = system();
        md.dma_queue().push_vram(0x1000, 0, 1, 2).unwrap();
        md.init().unwrap();

        assert!(md.dma_queue().is_empty());
        assert_eq!(md.port().writes_in(MemRegion::Zram).len(), Z80_RAM_SIZE);
        assert!(!md.bus().is_held());
    }

    #[test]
    fn test_frame_cycle() {
        let mut md = system();
        md.dma_queue().push_vram(0x1000, 0xC000, 10, 2).unwrap();
        md.dma_queue().push_cram(0x2000, 0x0000, 16, 2).unwrap();
        assert_eq!(md.flush_dma_queue(), Ok(2));
        assert_eq!(md.port().writes_in(MemRegion::VdpCtrl).len(), 16);

        md.port_mut().clear();
        assert_eq!(md.flush_dma_queue(), Ok(0));
        assert!(md.port().accesses().is_empty());
    }

    #[test]
    fn test_lock_bus_guard() {
        let mut md = system();
        {
            let mut guard = md.lock_bus().unwrap();
            guard.load_data(&[0xAA, 0xBB], 0x100).unwrap();
        }
        assert!(!md.bus().is_held());
        assert_eq!(&md.port().zram()[0x100..0x102], &[0xAA, 0xBB]);
    }

    #[test]
    fn test_independent_instances() {
        let mut a = system();
        let mut b = system();
        a.dma_queue().push_vram(0x1000, 0, 1, 2).unwrap();
        assert_eq!(a.dma_queue().size(), 1);
        assert_eq!(b.dma_queue().size(), 0);
    }

    #[test]
    fn test_with_bus_releases() {
        let mut md = system();
        let value = md.with_bus(|port| {
            port.write_u8(0xA00000, 0x55);
            7
        });
        assert_eq!(value, Ok(7));
        assert!(!md.bus().is_held());
        assert_eq!(md.port().zram()[0], 0x55);

        assert_eq!(md.with_bus_fast(|_| ()), Ok(()));
        assert_eq!(md.into_port().bus_writes(), vec![0x100, 0x000, 0x100, 0x000]);
    }

    #[test]
    fn test_borrowed_port() {
        let mut port = RecordingPort::new();
        {
            let mut md = MegaDrive::new(&mut port, HalConfig::default());
            md.dma().fill(0x0000, 4, 0x00, 1).unwrap();
        }
        assert_eq!(port.writes_in(MemRegion::VdpData).len(), 1);
    }

    #[test]
    fn test_dma_refused_inside_bus_section() {
        let mut md = system();
        md.bus.request_fast(&mut md.port).unwrap();
        assert_eq!(
            md.dma().vram_transfer(0x1000, 0, 8, 2),
            Err(DmaError::Bus(BusError::AlreadyOwned))
        );
        assert!(matches!(md.flush_dma_queue(), Ok(0)));
    }
}
