use std::thread;

use ethemu_net_backend::FrameQueueBackend;
use ethemu_net_eth194::{
    Eth194Config, Eth194Device, FbdHeader, FbdState, Isr, RxRefusal, RxStatus, SharedEth194,
    ETH194_IO_SIZE, FBD_HEADER_LEN,
};
use ethemu_platform::{AtomicIrqLine, IoPortBus};
use memory::{DenseMemory, MemoryBus};

const IO_BASE: u16 = 0xc100;

fn shared_nic() -> (SharedEth194<DenseMemory, FrameQueueBackend>, AtomicIrqLine) {
    let mut nic = Eth194Device::new([0x52, 0x54, 0x00, 0x12, 0x34, 0x56]);
    let line = AtomicIrqLine::new();
    nic.set_irq_line(Box::new(line.clone()));
    let mem = DenseMemory::new(0x20_000).unwrap();
    let shared = SharedEth194::new(IO_BASE, nic, mem, FrameQueueBackend::new());
    (shared, line)
}

fn write_fbd(mem: &mut DenseMemory, addr: u64, nphy: u32, payload: &[u8]) {
    let hdr = FbdHeader {
        df: FbdState::Free as u8,
        hf: 0,
        nphy,
        cnt: payload.len() as u16,
    };
    mem.write_physical(addr, &hdr.to_bytes());
    mem.write_physical(addr + FBD_HEADER_LEN as u64, payload);
}

#[test]
fn port_bus_drives_transmit_into_backend() {
    let (shared, line) = shared_nic();
    let mut bus = IoPortBus::new();
    bus.register_range(IO_BASE, ETH194_IO_SIZE, Box::new(shared.clone()));

    shared.with_parts(|_, mem, _| {
        write_fbd(mem, 0x1000, 0x2000, b"first frame");
        write_fbd(mem, 0x2000, 0, b"second frame");
    });

    bus.write_u8(IO_BASE, 0xe2); // page 3
    // CURR0/CURR1 are not adjacent; program them byte by byte.
    bus.write_u8(IO_BASE + 0x2, 0x00);
    bus.write_u8(IO_BASE + 0x4, 0x10);
    bus.write_u8(IO_BASE + 0x7, 0x00);
    bus.write_u8(IO_BASE + 0x8, 0x00);
    bus.write_u8(IO_BASE, 0x22);
    bus.write_u8(IO_BASE + 0xf, 0x02); // IMR = TX

    bus.write_u8(IO_BASE, 0x26);

    let sent = shared.with_parts(|nic, _, backend| {
        assert_eq!(nic.pending_tx_frames(), 0);
        backend.drain_tx()
    });
    assert_eq!(sent, vec![b"first frame".to_vec(), b"second frame".to_vec()]);
    assert!(line.level());
    assert!(shared.irq_level());
}

#[test]
fn chain_longer_than_tx_queue_reaches_backend_intact() {
    const DESCRIPTORS: u32 = 1100;

    let nic = Eth194Device::with_config(Eth194Config {
        max_tx_chain_len: 2048,
        max_tx_queue_frames: 16,
        ..Eth194Config::default()
    });
    let shared = SharedEth194::new(
        IO_BASE,
        nic,
        DenseMemory::new(0x10_0000).unwrap(),
        FrameQueueBackend::with_capacity(4096),
    );
    let mut bus = IoPortBus::new();
    bus.register_range(IO_BASE, ETH194_IO_SIZE, Box::new(shared.clone()));

    shared.with_parts(|_, mem, _| {
        for i in 0..DESCRIPTORS {
            let addr = 0x1000 + i * 0x20;
            let nphy = if i + 1 == DESCRIPTORS { 0 } else { addr + 0x20 };
            write_fbd(mem, u64::from(addr), nphy, &i.to_le_bytes());
        }
    });

    bus.write_u8(IO_BASE, 0xe2);
    bus.write_u8(IO_BASE + 0x4, 0x10);
    bus.write_u8(IO_BASE, 0x22);
    bus.write_u8(IO_BASE, 0x26);

    shared.with_parts(|nic, mem, backend| {
        assert_eq!(nic.take_fault(), None);
        assert_eq!(nic.curr(), 0);
        assert!(!nic.isr().contains(Isr::TX_ERR));
        assert_eq!(nic.pending_tx_frames(), 0);

        let sent = backend.drain_tx();
        assert_eq!(sent.len(), DESCRIPTORS as usize);
        for (i, frame) in sent.iter().enumerate() {
            assert_eq!(frame[..], (i as u32).to_le_bytes());
            let addr = 0x1000 + i as u64 * 0x20;
            assert_eq!(mem.read_u8(addr), FbdState::Done as u8);
        }
    });
}

#[test]
fn multi_byte_accesses_split_into_increasing_offsets() {
    let (shared, _line) = shared_nic();
    let mut bus = IoPortBus::new();
    bus.register_range(IO_BASE, ETH194_IO_SIZE, Box::new(shared.clone()));

    bus.write_u8(IO_BASE, 0xe2);
    // CURW0..CURW3 are contiguous at 0x0a..=0x0d.
    bus.write(IO_BASE + 0xa, 4, 0x0001_8000);
    assert_eq!(shared.with_parts(|nic, _, _| nic.curw()), 0x0001_8000);
    assert_eq!(bus.read(IO_BASE + 0xa, 4), 0x0001_8000);

    bus.write_u8(IO_BASE, 0x62); // page 1
    assert_eq!(bus.read(IO_BASE + 0x1, 4), u32::from_le_bytes([0x52, 0x54, 0x00, 0x12]));
    assert_eq!(bus.read(IO_BASE + 0x5, 2), u16::from_le_bytes([0x34, 0x56]) as u32);

    bus.write_u8(IO_BASE, 0x22);
    assert_eq!(bus.read(IO_BASE + 0xa, 2), 0x4350);
}

#[test]
fn host_delivery_respects_backpressure() {
    let (shared, _line) = shared_nic();
    assert!(!shared.can_receive());
    assert_eq!(
        shared.deliver(&[0u8; 40]),
        RxStatus::Refused(RxRefusal::NoBuffer)
    );

    shared.with_parts(|nic, mem, _| {
        write_fbd(mem, 0x4000, 0, &[]);
        nic.io_write(mem, 0x00, 0xe2);
        nic.io_write(mem, 0x0a, 0x00);
        nic.io_write(mem, 0x0b, 0x40);
        nic.io_write(mem, 0x00, 0x22);
    });
    assert!(shared.can_receive());
    assert_eq!(shared.deliver(&[0xcc; 40]), RxStatus::Accepted { len: 60 });
    assert!(!shared.can_receive());
}

#[test]
fn reset_port_and_bus_reset() {
    let (shared, _line) = shared_nic();
    let mut bus = IoPortBus::new();
    bus.register_range(IO_BASE, ETH194_IO_SIZE, Box::new(shared.clone()));

    bus.write_u8(IO_BASE, 0x22);
    assert_eq!(bus.read_u8(IO_BASE + 0x7), 0x00);
    assert_eq!(bus.read_u8(IO_BASE + 0x1f), 0x00);
    assert_eq!(bus.read_u8(IO_BASE + 0x7), 0x80);

    bus.write_u8(IO_BASE, 0x22);
    bus.reset();
    assert_eq!(shared.io_read_u8(0x7), 0x80);
}

#[test]
fn host_thread_and_cpu_share_one_lock() {
    let (shared, _line) = shared_nic();

    // 32 single-descriptor receive slots chained back to back.
    shared.with_parts(|nic, mem, _| {
        for i in 0..32u32 {
            let addr = 0x1000 + i * 0x800;
            let nphy = if i == 31 { 0 } else { addr + 0x800 };
            write_fbd(mem, u64::from(addr), nphy, &[]);
        }
        nic.io_write(mem, 0x00, 0xe2);
        nic.io_write(mem, 0x0a, 0x00);
        nic.io_write(mem, 0x0b, 0x10);
        nic.io_write(mem, 0x00, 0x22);
    });

    let host = {
        let shared = shared.clone();
        thread::spawn(move || {
            let mut accepted = 0;
            for i in 0..64u8 {
                if shared.deliver(&[i; 64]).is_accepted() {
                    accepted += 1;
                }
            }
            accepted
        })
    };
    for _ in 0..64 {
        let _ = shared.io_read_u8(0x7);
        shared.io_write_u8(0x7, 0x01);
    }
    let accepted = host.join().unwrap();

    assert_eq!(accepted, 32);
    shared.with_parts(|nic, mem, _| {
        assert_eq!(nic.curw(), 0);
        for i in 0..32u64 {
            assert_eq!(mem.read_u8(0x1000 + i * 0x800), FbdState::Written as u8);
        }
    });
}
