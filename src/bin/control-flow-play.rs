//! Play a control-flow environment from the keyboard.
use clap::{Parser, ValueEnum};
use ctrlflow::envs::control_flow::gridworld::{Interaction, Item, Subtask};
use ctrlflow::envs::{
    BuildEnv, ControlFlowAction, ControlFlowConfig, ControlFlowEnv, GridworldConfig, GridworldEnv,
};
use ctrlflow::logging::{ByTime, DisplayLogger, StatsLogger};
use ctrlflow::{Environment, Prng, Successor};
use rand::SeedableRng;
use std::io::{self, BufRead, Write};

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

    /// Probability of flipping the condition after each subtask
    #[arg(long, default_value_t = 0.5)]
    flip_prob: f64,

    /// Random seed
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

/// Read the next non-empty input line. `None` on end of input or `q`.
fn prompt(message: &str, input: &mut impl BufRead) -> io::Result<Option<String>> {
    loop {
        print!("{}", message);
        io::stdout().flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match line.trim() {
            "" => continue,
            "q" => return Ok(None),
            text => return Ok(Some(text.to_owned())),
        }
    }
}

fn parse_control_flow_action(text: &str, env: &ControlFlowEnv) -> Option<ControlFlowAction> {
    let mut fields = text.split_whitespace().map(str::parse::<usize>);
    let subtask = fields.next()?.ok()?;
    if subtask > env.num_subtasks() {
        return None;
    }
    if env.config().baseline {
        return Some(ControlFlowAction::Subtask(subtask));
    }
    let delta = match fields.next() {
        Some(delta) => delta.ok()?,
        None => env.n_lines(),
    };
    Some(ControlFlowAction::SubtaskAndMove { subtask, delta })
}

fn parse_gridworld_action(text: &str) -> Option<usize> {
    let mut fields = text.split_whitespace();
    let (interaction_name, item_name) = (fields.next()?, fields.next()?);
    let interaction = Interaction::ALL
        .into_iter()
        .find(|i| i.to_string() == interaction_name)?;
    let item = Item::ALL.into_iter().find(|i| i.to_string() == item_name)?;
    Some(Subtask { interaction, item }.index())
}

/// Run episodes until the input ends.
fn play<E, P, R>(
    env: &E,
    render: R,
    parse: P,
    usage: &str,
    rng: &mut Prng,
    logger: &mut dyn StatsLogger,
) -> io::Result<()>
where
    E: Environment,
    P: Fn(&str) -> Option<E::Action>,
    R: Fn(&E::State) -> String,
{
    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        let mut state = env.initial_state(rng);
        loop {
            println!("\n{}", render(&state));
            let action = loop {
                let text = match prompt(usage, &mut input)? {
                    Some(text) => text,
                    None => return Ok(()),
                };
                match parse(&text) {
                    Some(action) => break action,
                    None => println!("invalid action: {}", text),
                }
            };
            let (successor, reward) = env.step(state, &action, rng, logger);
            println!("reward: {}", reward);
            state = match successor {
                Successor::Continue(state) => state,
                Successor::Terminate => {
                    println!("episode terminated");
                    break;
                }
                Successor::Interrupt(_) => {
                    println!("out of time");
                    break;
                }
            };
        }
    }
}

fn run(opts: &Options, rng: &mut Prng, logger: &mut dyn StatsLogger) -> Result<(), String> {
    match opts.environment {
        EnvType::ControlFlow => {
            let env: ControlFlowEnv = ControlFlowConfig {
                min_lines: opts.min_lines,
                max_lines: opts.max_lines,
                max_loops: opts.max_loops,
                flip_prob: opts.flip_prob,
                ..ControlFlowConfig::default()
            }
            .build_env(rng)
            .map_err(|err| err.to_string())?;
            let usage = format!(
                "subtask (0..{}, {} = no-op) [cursor move] or q: ",
                env.num_subtasks(),
                env.num_subtasks()
            );
            play(
                &env,
                |state| env.render(state),
                |text| parse_control_flow_action(text, &env),
                &usage,
                rng,
                logger,
            )
            .map_err(|err| err.to_string())
        }
        EnvType::Gridworld => {
            let env: GridworldEnv = GridworldConfig {
                min_lines: opts.min_lines,
                max_lines: opts.max_lines,
                max_loops: opts.max_loops,
                ..GridworldConfig::default()
            }
            .build_env(rng)
            .map_err(|err| err.to_string())?;
            play(
                &env,
                |state| env.render(state),
                parse_gridworld_action,
                "<mine|sell|goto> <wood|gold|iron|merchant> or q: ",
                rng,
                logger,
            )
            .map_err(|err| err.to_string())
        }
    }
}

fn main() {
    let opts = Options::parse();
    let mut rng = Prng::seed_from_u64(opts.seed);
    let mut logger = DisplayLogger::new(ByTime::default());
    let result = run(&opts, &mut rng, &mut logger);
    logger.flush();
    if let Err(err) = result {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
