//! Host-side wiring primitives shared by device models: port I/O dispatch and interrupt lines.
#![forbid(unsafe_code)]

pub mod io;
pub mod irq;

pub use io::{IoPortBus, PortIoDevice};
pub use irq::{AtomicIrqLine, IrqLine, NoIrq};
