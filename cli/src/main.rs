use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use cadence_core::{
    AbilityUseResult, CycleProcessor, FlatScalingModel, SimRecord, SimulationResult,
    SimulationSettings,
};

mod kit;

use kit::SampleKit;

#[derive(Parser)]
#[command(version, about = "Cadence rotation simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate the bundled sample rotation and print the timeline
    Run {
        /// Path to a SimulationSettings TOML file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the fight length in seconds
        #[arg(long)]
        total_time: Option<f64>,
    },
    /// Print the default settings as TOML
    DefaultConfig,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Run { config, total_time } => run(config, total_time),
        Commands::DefaultConfig => print_default_config(),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn load_settings(path: Option<PathBuf>) -> Result<SimulationSettings, String> {
    let Some(path) = path else {
        return Ok(SimulationSettings::default());
    };
    let text = std::fs::read_to_string(&path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    toml::from_str(&text).map_err(|e| format!("failed to parse {}: {e}", path.display()))
}

fn print_default_config() -> Result<(), String> {
    let text = toml::to_string_pretty(&SimulationSettings::default())
        .map_err(|e| e.to_string())?;
    print!("{text}");
    Ok(())
}

fn run(config: Option<PathBuf>, total_time: Option<f64>) -> Result<(), String> {
    let mut settings = load_settings(config)?;
    if let Some(total) = total_time {
        settings.total_time = total;
    }

    let kit = SampleKit::new();
    let mut processor = CycleProcessor::new(settings, Box::new(FlatScalingModel::default()))
        .with_party_buffs(vec![kit.standard_of_war.clone()]);

    drive_rotation(&mut processor, &kit).map_err(|e| e.to_string())?;
    let result = processor.finalize();
    print_report(&result);
    Ok(())
}

/// Opener plus DoT-refreshing combo cycles, weaving the oGCDs whenever
/// they are ready.
fn drive_rotation(
    processor: &mut CycleProcessor,
    kit: &SampleKit,
) -> Result<(), cadence_core::SimError> {
    // Pre-pull: raise the damage window so the opener snapshots inside it.
    processor.use_ability(&kit.battle_cry)?;
    processor.use_ability(&kit.serrated_wound)?;

    let mut error = None;
    processor.remaining_cycles(|ctx| {
        let run = (|| -> Result<(), cadence_core::SimError> {
            ctx.use_ability(&kit.rend)?;
            weave(ctx, kit)?;
            ctx.use_ability(&kit.cleave)?;
            weave(ctx, kit)?;
            ctx.use_ability(&kit.decimate)?;
            ctx.use_ability(&kit.serrated_wound)?;
            while ctx.remaining_cycle_time() > 0.0 {
                if matches!(ctx.use_ability(&kit.rend)?, AbilityUseResult::None) {
                    break;
                }
                weave(ctx, kit)?;
                if matches!(ctx.use_ability(&kit.cleave)?, AbilityUseResult::None) {
                    break;
                }
                if matches!(ctx.use_ability(&kit.decimate)?, AbilityUseResult::None) {
                    break;
                }
            }
            ctx.use_until_end()
        })();
        if let Err(e) = run {
            error.get_or_insert(e);
        }
    });
    match error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn weave(
    ctx: &mut cadence_core::CycleContext<'_>,
    kit: &SampleKit,
) -> Result<(), cadence_core::SimError> {
    let processor = ctx.processor();
    if processor.can_use(&kit.battle_cry)? {
        processor.use_ability(&kit.battle_cry)?;
    }
    if processor.can_use(&kit.onslaught)? {
        processor.use_ability(&kit.onslaught)?;
    }
    Ok(())
}

fn print_report(result: &SimulationResult) {
    println!("{:>9}  {:<20} {:>10}  {}", "time", "ability", "damage", "buffs");
    for record in &result.records {
        match record {
            SimRecord::Ability(used) => {
                let damage = match used.direct {
                    Some(direct) => {
                        let rate = used.partial_rate.unwrap_or(1.0);
                        format!("{:>10.2}", direct.expected * rate)
                    }
                    None => format!("{:>10}", "-"),
                };
                let buffs: Vec<&str> = used.buffs.iter().map(|b| b.name.as_str()).collect();
                println!(
                    "{:>8.3}s  {:<20} {}  {}",
                    used.used_at,
                    used.ability.name,
                    damage,
                    buffs.join(", ")
                );
                if let Some(dot) = &used.dot {
                    println!(
                        "{:>9}  {:<20} {:>10.2}  ({} ticks)",
                        "",
                        format!("  {} (dot)", used.ability.name),
                        dot.total_expected(),
                        dot.tick_count.unwrap_or(0)
                    );
                }
            }
            SimRecord::Marker { time, label } => {
                println!("{time:>8.3}s  {label}");
            }
        }
    }

    println!();
    for cycle in &result.cycles {
        println!(
            "cycle {}: {:.3}s -> {:.3}s",
            cycle.index, cycle.start, cycle.end
        );
    }
    println!();
    println!(
        "total damage: {:.2} (stddev {:.2}) over {:.3}s",
        result.total_damage.expected, result.total_damage.std_dev, result.finalized_time_basis
    );
    println!("dps: {:.2}", result.dps);
}
