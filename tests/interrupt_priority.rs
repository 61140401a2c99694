use st_sndh_bus::{
    IdleCpu, Machine, MachineConfig, Register, MFP_BASE, SPURIOUS_VECTOR, VBL_PERIOD, VBL_VECTOR,
};

fn reg(r: Register) -> u32 {
    MFP_BASE + r.offset()
}

/// A processor that never takes an interrupt, so levels can be inspected.
fn masked_machine() -> Machine {
    let cpu = IdleCpu::new().with_interrupt_mask(7);
    let mut machine = Machine::new(&MachineConfig::default(), cpu).unwrap();
    machine.write_u8(reg(Register::Vr), 0x40).unwrap();
    machine
}

#[test]
fn mfp_level_wins_over_vertical_blank() {
    let mut machine = masked_machine();
    machine.write_u8(reg(Register::Tadr), 10).unwrap();
    machine.write_u8(reg(Register::Iera), 0x20).unwrap();
    machine.write_u8(reg(Register::Imra), 0x20).unwrap();
    machine.write_u8(reg(Register::Tacr), 1).unwrap();
    machine.run_frames(1).unwrap();

    let cycle = machine.cycle();
    let bus = machine.bus_mut();
    assert_eq!(bus.glue().pending(), (1 << 6) | (1 << 4));
    assert_eq!(bus.interrupt_level(), 6);

    assert_eq!(bus.acknowledge_interrupt(cycle, 6), 0x4D);
    assert_eq!(bus.interrupt_level(), 4);
    assert_eq!(bus.acknowledge_interrupt(cycle, 4), VBL_VECTOR);
    assert_eq!(bus.interrupt_level(), 0);
}

#[test]
fn vertical_blank_every_frame() {
    let mut machine = Machine::idle(&MachineConfig::default()).unwrap();
    machine.run_frames(50).unwrap();
    assert_eq!(machine.frames(), 50);
    assert_eq!(machine.cycle(), 50 * VBL_PERIOD);
    // The blank raised at the very end has not been taken yet.
    assert_eq!(machine.cpu().acknowledged(VBL_VECTOR), 49);
    assert_eq!(machine.cpu().total_acknowledged(), 49);
}

#[test]
fn gpip_edge_vectors_through_mfp() {
    let mut machine = masked_machine();
    // GPI7 (monochrome detect), channel 15.
    machine.write_u8(reg(Register::Iera), 0x80).unwrap();
    machine.write_u8(reg(Register::Imra), 0x80).unwrap();
    machine.bus_mut().set_mfp_input(0, 7, false);
    assert_eq!(machine.bus().interrupt_level(), 6);
    assert_eq!(machine.bus_mut().acknowledge_interrupt(0, 6), 0x4F);
}

#[test]
fn spurious_acknowledge() {
    let mut machine = masked_machine();
    assert_eq!(machine.bus_mut().acknowledge_interrupt(0, 6), SPURIOUS_VECTOR);
    assert_eq!(machine.bus().interrupt_level(), 0);
}

#[test]
fn lower_priority_waits_for_higher_in_service() {
    let mut machine = masked_machine();
    machine.write_u8(reg(Register::Vr), 0x48).unwrap();
    machine.write_u8(reg(Register::Iera), 0xFF).unwrap();
    machine.write_u8(reg(Register::Imra), 0xFF).unwrap();
    machine.write_u8(reg(Register::Ierb), 0xFF).unwrap();
    machine.write_u8(reg(Register::Imrb), 0xFF).unwrap();

    let bus = machine.bus_mut();
    bus.set_mfp_input(0, 6, false);
    assert_eq!(bus.acknowledge_interrupt(0, 6), 0x4E);

    // GPI4 (channel 6) is below the in-service channel 14.
    bus.set_mfp_input(0, 4, false);
    assert_eq!(bus.interrupt_level(), 0);

    bus.write_u8(0, reg(Register::Isra), 0);
    assert_eq!(bus.interrupt_level(), 6);
    assert_eq!(bus.acknowledge_interrupt(0, 6), 0x46);
}
