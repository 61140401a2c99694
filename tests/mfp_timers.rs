use approx::assert_abs_diff_eq;
use st_sndh_bus::{
    Channels, IdleCpu, Machine, MachineConfig, MfpClock, Register, MFP_BASE,
};

const TIMER_A_VECTOR: u8 = 0x40 | 13;

fn reg(r: Register) -> u32 {
    MFP_BASE + r.offset()
}

fn machine(config: &MachineConfig) -> Machine {
    let mut machine = Machine::idle(config).unwrap();
    machine.write_u8(reg(Register::Vr), 0x40).unwrap();
    machine
}

/// Timer A in delay mode, interrupt enabled and unmasked.
fn start_timer_a(machine: &mut Machine, control: u8, data: u8) {
    machine.write_u8(reg(Register::Tadr), data).unwrap();
    machine.write_u8(reg(Register::Iera), 0x20).unwrap();
    machine.write_u8(reg(Register::Imra), 0x20).unwrap();
    machine.write_u8(reg(Register::Tacr), control).unwrap();
}

#[test]
fn timer_a_first_timeout() {
    let mut machine = Machine::idle(&MachineConfig::default()).unwrap();
    machine.write_u8(reg(Register::Tadr), 10).unwrap();
    machine.write_u8(reg(Register::Iera), 0x20).unwrap();
    machine.write_u8(reg(Register::Tacr), 1).unwrap();

    // Run until the timeout has been processed; events fire at the start of
    // a slice, so the cycle before the call that set the bit is the firing
    // cycle.
    let mut fired_at = None;
    for _ in 0..100 {
        let cycle = machine.cycle();
        machine.device_run(1_000).unwrap();
        if machine.bus().mfp().ipr().contains(Channels::TIMER_A) {
            fired_at = Some(cycle);
            break;
        }
    }

    // 10 counts x /4 = 40 MFP cycles = 80 machine cycles.
    assert_eq!(fired_at, Some(80));
    assert_eq!(machine.read_u8(reg(Register::Ipra)).unwrap() & 0x20, 0x20);
}

#[test]
fn timer_a_rate_legacy_clock() {
    let mut machine = machine(&MachineConfig::default());
    // /4, 100 counts at 4 MHz: 10 kHz.
    start_timer_a(&mut machine, 1, 100);
    machine.run(8_000_000).unwrap();

    // The timeout landing exactly on the last cycle is not taken yet.
    let taken = machine.cpu().acknowledged(TIMER_A_VECTOR) as f64;
    assert_abs_diff_eq!(taken, 10_000.0, epsilon = 1.0);
}

#[test]
fn timer_a_rate_hardware_clock() {
    let config = MachineConfig::default().with_mfp_clock(MfpClock::Hardware);
    let mut machine = machine(&config);
    // /4, 100 counts at 2.4576 MHz: 6144 Hz.
    start_timer_a(&mut machine, 1, 100);
    machine.run(8_000_000).unwrap();

    let taken = machine.cpu().acknowledged(TIMER_A_VECTOR) as f64;
    assert_abs_diff_eq!(taken, 6_144.0, epsilon = 1.0);
}

#[test]
fn stopped_counter_is_frozen() {
    let mut machine = machine(&MachineConfig::default());
    machine.write_u8(reg(Register::Tbdr), 77).unwrap();
    for cycle in [0, 1, 999, 1_000_000, 123_456_789] {
        assert_eq!(machine.bus_mut().read_u8(cycle, reg(Register::Tbdr)), 77);
    }
}

#[test]
fn running_counter_wraps_after_one_period() {
    let mut machine = machine(&MachineConfig::default());
    // P = 200, K = 10: one period is 2000 MFP cycles, 4000 machine cycles.
    start_timer_a(&mut machine, 2, 200);

    assert_eq!(counter_at(&mut machine, 0), 200);
    assert_eq!(counter_at(&mut machine, 4_000), 200);
    assert!(counter_at(&mut machine, 2_000).abs_diff(100) <= 1);
    assert!(counter_at(&mut machine, 6_000).abs_diff(100) <= 1);
}

fn counter_at(machine: &mut Machine, cycle: u64) -> u8 {
    machine.bus_mut().read_u8(cycle, reg(Register::Tadr))
}

#[test]
fn software_eoi_blocks_until_cleared() {
    let mut machine = machine(&MachineConfig::default());
    machine.write_u8(reg(Register::Vr), 0x40 | 0x08).unwrap();
    start_timer_a(&mut machine, 1, 10);

    machine.run(1_000).unwrap();
    assert_eq!(machine.cpu().acknowledged(TIMER_A_VECTOR), 1);
    assert_eq!(machine.read_u8(reg(Register::Isra)).unwrap(), 0x20);
    assert_eq!(machine.read_u8(reg(Register::Ipra)).unwrap(), 0x20);

    // End of interrupt: the pending request is taken at once.
    machine.write_u8(reg(Register::Isra), !0x20).unwrap();
    machine.run(10).unwrap();
    assert_eq!(machine.cpu().acknowledged(TIMER_A_VECTOR), 2);
}

#[test]
fn disabling_timer_drops_its_request() {
    let config = MachineConfig::default();
    let cpu = IdleCpu::new().with_interrupt_mask(7);
    let mut machine = Machine::new(&config, cpu).unwrap();
    start_timer_a(&mut machine, 1, 10);
    machine.run(100).unwrap();
    assert_eq!(machine.bus().interrupt_level(), 6);

    machine.write_u8(reg(Register::Iera), 0).unwrap();
    assert!(machine.bus().mfp().ipr().is_empty());
    assert_eq!(machine.bus().interrupt_level(), 0);

    // Inert while disabled.
    machine.run(1_000).unwrap();
    assert!(machine.bus().mfp().ipr().is_empty());
}
