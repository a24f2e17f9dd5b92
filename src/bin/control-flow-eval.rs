//! Run random and expert actors in a control-flow environment and summarise the results.
use clap::{Parser, ValueEnum};
use ctrlflow::agents::{ControlFlowExpert, GridworldExpert};
use ctrlflow::envs::{BuildEnv, ControlFlowConfig, EnvStructure, GridworldConfig};
use ctrlflow::logging::{ByTime, DisplayLogger, ScopedLogger, StatsLogger};
use ctrlflow::{run_actor, Actor, Environment, Prng, RandomActor, StepsSummary};
use rand::SeedableRng;
use std::time::Duration;

#[derive(ValueEnum, Debug, Copy, Clone, PartialEq, Eq)]
enum EnvType {
    ControlFlow,
    Gridworld,
}

#[derive(Parser, Debug)]
#[command(version, author, about)]
struct Options {
    /// Environment type
    #[arg(value_enum, default_value = "control-flow")]
    environment: EnvType,

    /// Minimum number of program lines
    #[arg(long, default_value_t = 1)]
    min_lines: usize,

    /// Maximum number of program lines
    #[arg(long, default_value_t = 6)]
    max_lines: usize,

    /// Maximum loop repetitions. Loops are disabled if unset.
    #[arg(long)]
    max_loops: Option<u32>,

    /// Number of simulation steps per actor
    #[arg(long, default_value_t = 10_000)]
    steps: usize,

    /// Random seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Seconds between displayed log summaries
    #[arg(long, default_value_t = 5.0)]
    log_interval: f64,
}

fn evaluate<E, X>(
    name: &'static str,
    env: &E,
    actor: X,
    opts: &Options,
    logger: &mut dyn StatsLogger,
) -> StepsSummary
where
    E: Environment,
    X: Actor<E::Observation, E::Action>,
{
    let mut scoped = ScopedLogger::new(logger, name);
    let summary: StepsSummary = run_actor(env, actor, Prng::seed_from_u64(opts.seed), &mut scoped)
        .take(opts.steps)
        .collect();
    println!("\n== {} ==\n{}", name, summary);
    summary
}

fn main() {
    let opts = Options::parse();
    println!("{:#?}", opts);
    let mut rng = Prng::seed_from_u64(opts.seed);
    let mut logger = DisplayLogger::new(ByTime::new(Duration::from_secs_f64(opts.log_interval)));

    let result = match opts.environment {
        EnvType::ControlFlow => ControlFlowConfig {
            min_lines: opts.min_lines,
            max_lines: opts.max_lines,
            max_loops: opts.max_loops,
            ..ControlFlowConfig::default()
        }
        .build_env(&mut rng)
        .map(|env| {
            evaluate("random", &env, RandomActor::new(env.action_space()), &opts, &mut logger);
            evaluate("expert", &env, ControlFlowExpert::new(&env), &opts, &mut logger);
        }),
        EnvType::Gridworld => GridworldConfig {
            min_lines: opts.min_lines,
            max_lines: opts.max_lines,
            max_loops: opts.max_loops,
            ..GridworldConfig::default()
        }
        .build_env(&mut rng)
        .map(|env| {
            evaluate("random", &env, RandomActor::new(env.action_space()), &opts, &mut logger);
            evaluate("expert", &env, GridworldExpert, &opts, &mut logger);
        }),
    };
    logger.flush();
    if let Err(err) = result {
        eprintln!("invalid environment configuration: {}", err);
        std::process::exit(2);
    }
}
