//! voltsim - runs a built-in sample design
//!
//! Elaborates a small clocked counter through the builder API and runs it,
//! mainly as a smoke test and a demonstration of the embedding surface.
//! `RUST_LOG=debug` shows the simulator lifecycle events.

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use volt_core::Type;
use volt_sim::ir::{BinaryOp, BlockMode, Edge, TimeUnit, build};
use volt_sim::{Design, OutMode, SimConfig, Simulator, Stmt, SystemTId};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Out {
    Standard,
    Mute,
    Vcd,
}

impl From<Out> for OutMode {
    fn from(out: Out) -> OutMode {
        match out {
            Out::Standard => OutMode::Standard,
            Out::Mute => OutMode::Mute,
            Out::Vcd => OutMode::Vcd,
        }
    }
}

/// Run the built-in counter sample on the Volt simulator.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Trace name; also the VCD file prefix
    #[arg(long, default_value = "counter")]
    name: String,

    /// Output mode
    #[arg(long, value_enum, default_value_t = Out::Vcd)]
    out: Out,

    /// Time limit in ps
    #[arg(long, default_value_t = 1_000)]
    limit: u64,

    /// Number of clock periods to drive (10 ps each)
    #[arg(long, default_value_t = 16)]
    cycles: i64,
}

/// A 4-bit counter clocked by a generated 10ps-period clock.
fn counter_design(cycles: i64) -> (Design, SystemTId) {
    let bit = Type::bit();
    let nibble = Type::vector(bit, 4);

    let mut design = Design::new();
    let top = design.add_system("counter");
    let scope = design.add_scope("main");
    design.set_system_scope(top, scope);

    let clk = design.add_signal("clk", bit);
    let count = design.add_signal("count", nibble);
    design.add_scope_inner(scope, clk);
    design.add_system_output(top, count);
    design.set_signal_value(clk, build::value_numeric(bit, 0));
    design.set_signal_value(count, build::value_numeric(nibble, 0));

    // Clock driver: half period low, half period high.
    let driver = design.add_behavior(true);
    design.add_scope_behavior(scope, driver);
    design.set_behavior_block(
        driver,
        build::block(
            BlockMode::Par,
            vec![build::time_repeat(
                cycles,
                Stmt::Block(build::block(
                    BlockMode::Par,
                    vec![
                        build::transmit(build::sig_ref(clk), build::value_numeric(bit, 0)),
                        build::time_wait(5, TimeUnit::Ps),
                        build::transmit(build::sig_ref(clk), build::value_numeric(bit, 1)),
                        build::time_wait(5, TimeUnit::Ps),
                    ],
                )),
            )],
        ),
    );

    // count <= count + 1 on every rising clock edge.
    let beh = design.add_behavior(false);
    design.add_scope_behavior(scope, beh);
    design.add_behavior_event(beh, Edge::Pos, clk);
    design.set_behavior_block(
        beh,
        build::block(
            BlockMode::Seq,
            vec![build::transmit(
                build::sig_ref(count),
                build::binary(
                    BinaryOp::Add,
                    build::sig(count),
                    build::value_numeric(nibble, 1),
                ),
            )],
        ),
    );

    (design, top)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let (design, top) = counter_design(args.cycles);
    let config = SimConfig {
        name: args.name.clone(),
        out_mode: args.out.into(),
        limit_ps: args.limit,
    };

    let mut sim = match Simulator::new(design, top, config) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("voltsim: {e}");
            std::process::exit(1);
        }
    };
    sim.run();

    let count = sim.find_port("count").expect("count port exists");
    println!(
        "finished at {} ps with count = {}",
        sim.time(),
        sim.read_port(count)
    );
}
