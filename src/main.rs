//! Runs the bus with an idle processor and reports interrupt statistics.
//!
//! Useful for checking timer programming against the vertical blank without a
//! 68000 core: program a timer from the command line, run some frames, and
//! see how often each vector was taken.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use st_sndh_bus::{
    DeviceId, Machine, MachineConfig, MfpClock, Register, TimerId, MFP_BASE, VBL_VECTOR,
};

#[derive(Parser)]
#[command(name = "st-sndh-bus")]
#[command(about = "Run the Atari ST bus model and report interrupt statistics")]
struct Args {
    /// Machine configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Vertical blanks to run
    #[arg(short, long, default_value_t = 50)]
    frames: u32,

    /// Program MFP timer A as CONTROL:DATA (e.g. 1:123 for /4, 123 counts)
    #[arg(long, value_parser = parse_timer)]
    timer_a: Option<(u8, u8)>,

    /// Clock the MFP at 2.4576 MHz instead of half the processor clock
    #[arg(long)]
    hardware_mfp: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn parse_timer(s: &str) -> std::result::Result<(u8, u8), String> {
    let (control, data) = s
        .split_once(':')
        .ok_or_else(|| format!("expected CONTROL:DATA, got '{s}'"))?;
    let control: u8 = control
        .parse()
        .map_err(|e| format!("control '{control}': {e}"))?;
    let data: u8 = data.parse().map_err(|e| format!("data '{data}': {e}"))?;
    if control > 0x0F {
        return Err(format!("control {control} does not fit 4 bits"));
    }
    Ok((control, data))
}

#[derive(Serialize)]
struct Report {
    frames: u64,
    cycles: u64,
    vbl_taken: u64,
    timer_a_taken: u64,
    timer_a_counter: u8,
    interrupts_taken: u64,
    mfp_frequency: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => MachineConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => MachineConfig::default(),
    };
    if args.hardware_mfp {
        config = config.with_mfp_clock(MfpClock::Hardware);
    }

    let mut machine = Machine::idle(&config).context("building machine")?;
    // Vectors 0x40-0x4F, software EOI off.
    machine.write_u8(MFP_BASE + Register::Vr.offset(), 0x40)?;

    if let Some((control, data)) = args.timer_a {
        info!("timer A: control {control}, data {data}");
        machine.write_u8(MFP_BASE + Register::Tadr.offset(), data)?;
        machine.write_u8(MFP_BASE + Register::Iera.offset(), 0x20)?;
        machine.write_u8(MFP_BASE + Register::Imra.offset(), 0x20)?;
        machine.write_u8(MFP_BASE + Register::Tacr.offset(), control)?;
    }

    machine
        .run_frames(args.frames)
        .with_context(|| format!("running {} frames", args.frames))?;

    let mfp_cycle = machine.bus().device_cycle(DeviceId::Mfp, machine.cycle());
    let report = Report {
        frames: machine.frames(),
        cycles: machine.cycle(),
        vbl_taken: machine.cpu().acknowledged(VBL_VECTOR),
        timer_a_taken: machine.cpu().acknowledged(0x40 | 13),
        timer_a_counter: machine.bus().mfp().timer_counter(TimerId::A, mfp_cycle),
        interrupts_taken: machine.cpu().total_acknowledged(),
        mfp_frequency: machine.bus().mfp_frequency(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("frames:           {}", report.frames);
        println!("cycles:           {}", report.cycles);
        println!("mfp clock:        {} Hz", report.mfp_frequency);
        println!("vbl taken:        {}", report.vbl_taken);
        println!("timer A taken:    {}", report.timer_a_taken);
        println!("timer A counter:  {}", report.timer_a_counter);
        println!("interrupts taken: {}", report.interrupts_taken);
    }
    Ok(())
}
