use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A level-triggered interrupt output.
///
/// Devices call [`IrqLine::set_level`] whenever their interrupt condition may have changed; the
/// platform routes the level to whatever interrupt controller the line is wired to.
pub trait IrqLine {
    fn set_level(&self, level: bool);
}

/// An unconnected interrupt line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIrq;

impl IrqLine for NoIrq {
    fn set_level(&self, _level: bool) {}
}

/// IRQ line whose level can be observed from another context (host polling, tests).
#[derive(Debug, Clone, Default)]
pub struct AtomicIrqLine {
    level: Arc<AtomicBool>,
}

impl AtomicIrqLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }
}

impl IrqLine for AtomicIrqLine {
    fn set_level(&self, level: bool) {
        self.level.store(level, Ordering::SeqCst);
    }
}

impl<T: IrqLine + ?Sized> IrqLine for Arc<T> {
    fn set_level(&self, level: bool) {
        <T as IrqLine>::set_level(&**self, level);
    }
}

impl<T: IrqLine + ?Sized> IrqLine for Box<T> {
    fn set_level(&self, level: bool) {
        <T as IrqLine>::set_level(&**self, level);
    }
}
