use clap::{ArgAction, Parser, Subcommand};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "flagquiz", version, about = "Timed flag quiz")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect, schedule or reset the saved session
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Play a live session in the terminal
    Play {
        /// Schedule a new session this many seconds from now
        #[arg(long = "in", value_name = "SECS")]
        start_in: Option<i64>,
        /// Also print a state snapshot after every tick
        #[arg(long)]
        ticks: bool,
    },
    /// Question bank tools
    Questions {
        #[command(subcommand)]
        action: commands::questions::QuestionsAction,
    },
    /// Look up the flag image for a country code
    Flag {
        /// ISO country code (case-insensitive)
        code: String,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Session { action } => commands::session::run(action),
        Commands::Play { start_in, ticks } => commands::play::run(start_in, ticks),
        Commands::Questions { action } => commands::questions::run(action),
        Commands::Flag { code } => commands::flag::run(&code),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
