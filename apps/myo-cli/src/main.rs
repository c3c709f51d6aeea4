mod rig;

use clap::{Parser, Subcommand};
use myo_core::units::seconds;
use myo_hw::{
    Clock, CycleOutcome, HardwareError, JointControlLoop, LoopConfig, ManualClock,
    PassthroughController, RobotHardware,
};
use myo_muscle::{DescriptorError, MuscleDescriptor, MuscleError, MuscleUnit, load_json, load_yaml};
use rig::MuscleRig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "myo-cli")]
#[command(about = "Myoflow CLI - tendon-driven muscle simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a muscle descriptor file
    Validate {
        /// Path to the descriptor (YAML or JSON)
        descriptor_path: PathBuf,
    },
    /// Run the joint control loop against a simulated muscle
    Run {
        /// Path to the descriptor (YAML or JSON)
        descriptor_path: PathBuf,
        /// Spooled tendon length setpoint in meters
        #[arg(long, default_value_t = 0.005)]
        setpoint: f64,
        /// Simulated duration in seconds
        #[arg(long, default_value_t = 5.0)]
        duration: f64,
        /// Control loop rate in Hz (overrides --loop-config)
        #[arg(long)]
        rate: Option<f64>,
        /// Muscle integration step in seconds
        #[arg(long, default_value_t = 0.001)]
        sim_step: f64,
        /// Loop configuration YAML file
        #[arg(long)]
        loop_config: Option<PathBuf>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Muscle(#[from] MuscleError),

    #[error(transparent)]
    Hardware(#[from] HardwareError),

    #[error("Loop config error: {0}")]
    LoopConfig(String),
}

type CliResult<T> = Result<T, CliError>;

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { descriptor_path } => cmd_validate(&descriptor_path),
        Commands::Run {
            descriptor_path,
            setpoint,
            duration,
            rate,
            sim_step,
            loop_config,
        } => cmd_run(
            &descriptor_path,
            setpoint,
            duration,
            rate,
            sim_step,
            loop_config.as_deref(),
        ),
    }
}

fn load_descriptor(path: &Path) -> CliResult<MuscleDescriptor> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let descriptor = if is_json {
        load_json(path)?
    } else {
        load_yaml(path)?
    };
    Ok(descriptor)
}

fn load_loop_config(path: Option<&Path>, rate: Option<f64>) -> CliResult<LoopConfig> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| CliError::LoopConfig(format!("{}: {e}", path.display())))?;
            serde_yaml::from_str(&content).map_err(|e| CliError::LoopConfig(e.to_string()))?
        }
        None => LoopConfig::default(),
    };
    if let Some(rate) = rate {
        config.rate_hz = rate;
    }
    config.validate()?;
    Ok(config)
}

fn cmd_validate(descriptor_path: &Path) -> CliResult<()> {
    println!("Validating descriptor: {}", descriptor_path.display());
    let descriptor = load_descriptor(descriptor_path)?;
    let unit = MuscleUnit::init(Arc::new(descriptor))?;
    let d = unit.descriptor();
    println!("✓ Muscle '{}' is valid", d.name);
    println!(
        "  {} joints, {} via-points, {} segments, tendon length {:.4} m",
        d.joints.len(),
        d.via_point_count(),
        d.segment_count(),
        unit.topology().length()
    );
    println!(
        "  max stable integration step: {:.3e} s",
        unit.actuator().max_substep()
    );
    Ok(())
}

fn cmd_run(
    descriptor_path: &Path,
    setpoint: f64,
    duration: f64,
    rate: Option<f64>,
    sim_step: f64,
    loop_config: Option<&Path>,
) -> CliResult<()> {
    let config = load_loop_config(loop_config, rate)?;
    let descriptor = load_descriptor(descriptor_path)?;
    let unit = MuscleUnit::init(Arc::new(descriptor))?;
    let rig = MuscleRig::new(unit, sim_step)?;
    let joint = rig.joint_name().to_string();

    let manager = PassthroughController::new([joint.as_str()]);
    if let Some(handle) = manager.handle(&joint) {
        handle.store(setpoint);
    }

    info!(
        muscle = %joint,
        setpoint,
        duration,
        period = seconds(config.period()),
        sim_step,
        "starting simulated run"
    );

    let mut control = JointControlLoop::new(rig, manager, ManualClock::new(0.0), config)?;
    println!(
        "{:>8}  {:>10}  {:>10}  {:>10}  {:>10}",
        "t [s]", "cmd [m]", "pos [m]", "vel [m/s]", "F_see [N]"
    );
    while control.clock().now() < duration {
        if let CycleOutcome::Completed { time, .. } = control.tick() {
            if let Some(state) = control.hardware().joints().get(&joint) {
                println!(
                    "{:>8.3}  {:>10.5}  {:>10.5}  {:>10.5}  {:>10.3}",
                    time, state.command, state.position, state.velocity, state.effort
                );
            }
        }
    }

    let stats = control.stats();
    println!(
        "✓ Run complete: {} cycles, {} idle, {} overruns, {} failed, {} skipped muscle updates",
        stats.cycles,
        stats.idle_cycles,
        stats.overruns,
        stats.failed_cycles,
        control.hardware().skipped()
    );
    Ok(())
}
