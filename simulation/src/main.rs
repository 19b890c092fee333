//! Adaptnet - routing convergence across heterogeneous protocol stacks
//!
//! Runs a canned scenario and prints every node's routing table and a summary,
//! or measures reachability over a series of random networks.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;

use adaptnet_core::{AdaptationFunction, NodeId, Protocol};
use adaptnet_logging::{AdaptnetSubscriberBuilder, LogConfig, RotationStrategy};
use adaptnet_simulation::{NetworkConfig, Probe, RandomNetwork, scenarios};

#[derive(Parser)]
#[command(
    name = "adaptnet",
    about = "Simulate route convergence across adaptation functions",
    version
)]
struct Cli {
    /// Capacity of every protocol stack
    #[arg(long, global = true, default_value_t = 4)]
    max_stack: usize,

    /// Idle window that counts as convergence, in milliseconds
    #[arg(long, global = true, default_value_t = 50)]
    idle_ms: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Write JSONL logs to this directory instead of the console
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log file rotation: daily, hourly or never
    #[arg(long, global = true, default_value_t = RotationStrategy::Daily)]
    log_rotation: RotationStrategy,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a canned scenario with known routes
    Scenario {
        /// Scenario to run
        #[arg(value_enum, default_value_t = ScenarioName::TunnelLine)]
        name: ScenarioName,

        /// Send a message after convergence, as SOURCE:DEST:TAGS (e.g. A:D:x)
        #[arg(long, value_parser = parse_probe)]
        send: Option<Probe>,

        /// Skip the scenario's own probe message
        #[arg(long)]
        no_probe: bool,

        /// Print the topology and function catalogue before running
        #[arg(long)]
        describe: bool,
    },

    /// Run a series of random networks
    Random {
        /// Number of nodes
        #[arg(short = 'n', long, default_value_t = 10)]
        nodes: u32,

        /// Number of protocols the function catalogue is built over (max 26)
        #[arg(long, default_value_t = 3)]
        protocols: usize,

        /// Probability that a node owns any one catalogue function
        #[arg(short = 'p', long, default_value_t = 0.3)]
        function_prob: f64,

        /// Probability that any two nodes are linked
        #[arg(short = 'c', long, default_value_t = 0.4)]
        connection_prob: f64,

        /// Number of networks to generate and run
        #[arg(short = 'i', long, default_value_t = 1)]
        iterations: usize,

        /// Seed for reproducible networks
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScenarioName {
    SingleLink,
    UniformLine,
    TranslatedLine,
    TunnelLine,
    Detour,
    SplitPaths,
}

impl ScenarioName {
    fn build(self) -> scenarios::Scenario {
        match self {
            ScenarioName::SingleLink => scenarios::single_link(),
            ScenarioName::UniformLine => scenarios::uniform_line(),
            ScenarioName::TranslatedLine => scenarios::translated_line(),
            ScenarioName::TunnelLine => scenarios::tunnel_line(),
            ScenarioName::Detour => scenarios::detour(),
            ScenarioName::SplitPaths => scenarios::split_paths(),
        }
    }
}

fn parse_probe(s: &str) -> Result<Probe, String> {
    let mut parts = s.splitn(3, ':');
    let mut node = |what: &str| -> Result<NodeId, String> {
        parts
            .next()
            .and_then(|p| p.chars().next())
            .and_then(|c| NodeId::from_letter(c.to_ascii_uppercase()))
            .ok_or_else(|| format!("missing or invalid {} node in '{}'", what, s))
    };
    let source = node("source")?;
    let dest = node("destination")?;
    let tags = parts.next().filter(|t| !t.is_empty()).unwrap_or("x");
    Ok(Probe::new(source, dest, tags))
}

fn describe(scenario: &scenarios::Scenario) {
    println!("{}: {}", scenario.name, scenario.description);
    println!("{}", scenario.mesh.visualize());
    for (node, functions) in &scenario.functions {
        let names: Vec<String> = functions.iter().map(|f| f.to_string()).collect();
        println!("  {} knows {}", node, names.join(", "));
    }
    let protocols: BTreeSet<Protocol> = scenario
        .functions
        .values()
        .flatten()
        .flat_map(|f| [f.input, f.output])
        .collect();
    let protocols: Vec<Protocol> = protocols.into_iter().collect();
    let assigned: BTreeSet<AdaptationFunction> =
        scenario.functions.values().flatten().copied().collect();
    println!(
        "  {} of {} possible functions over {} protocols assigned\n",
        assigned.len(),
        AdaptationFunction::catalogue(&protocols).len(),
        protocols.len()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_config = match &cli.log_dir {
        Some(dir) => LogConfig::production(dir.clone(), cli.log_rotation),
        None => LogConfig::development(),
    };
    let level = match (cli.verbose, cli.log_dir.is_some()) {
        (true, _) => "debug",
        (false, true) => "info",
        (false, false) => "warn",
    };
    let _guard = AdaptnetSubscriberBuilder::new()
        .with_config(log_config)
        .with_level(level)
        .init();

    let config = NetworkConfig::default()
        .with_max_stack(cli.max_stack)
        .with_idle_timeout(Duration::from_millis(cli.idle_ms));

    match cli.command {
        Commands::Scenario {
            name,
            send,
            no_probe,
            describe: show,
        } => {
            let mut scenario = name.build();
            if no_probe {
                scenario = scenario.without_probe();
            }
            if let Some(probe) = send {
                scenario.probe = Some(probe);
            }
            if show {
                describe(&scenario);
            }

            let report = scenario.network(config)?.run().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report);
            }
        }
        Commands::Random {
            nodes,
            protocols,
            function_prob,
            connection_prob,
            iterations,
            seed,
        } => {
            let params = RandomNetwork::new(nodes, protocols)
                .with_function_probability(function_prob)
                .with_connection_probability(connection_prob);
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };

            let summaries = params.run(config, iterations, &mut rng).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                for summary in &summaries {
                    println!("{}", summary);
                }
                if !summaries.is_empty() {
                    let runs = summaries.len() as f64;
                    let reachability = summaries.iter().map(|s| s.reachability).sum::<f64>() / runs;
                    let convergence = summaries
                        .iter()
                        .map(|s| s.convergence_time)
                        .sum::<Duration>()
                        / summaries.len() as u32;
                    println!(
                        "Mean over {} runs: reachability {:.1}%, convergence {:?}",
                        summaries.len(),
                        reachability * 100.0,
                        convergence
                    );
                }
            }
        }
    }

    Ok(())
}
