use clap::{Parser, Subcommand};
use colored::Colorize;
use coursestore::config::DEFAULT_CONFIG_FILE;
use coursestore::{AnyStore, ClassQuery, Config, CourseError, ErrorKind, Scheduler, init_data};
use serde::Serialize;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "coursestore")]
#[command(about = "CourseStore CLI - class catalog, favorites, comments and timetable registration")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override the data directory from the config
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create empty collection documents (and an empty catalog) where missing
    Init,

    /// Search the class catalog
    Classes {
        /// Substring of the class name
        #[arg(short, long)]
        keyword: Option<String>,
        #[arg(long)]
        day: Option<String>,
        #[arg(long)]
        period: Option<i64>,
        #[arg(long)]
        term: Option<i64>,
    },

    /// Manage favorite classes
    #[command(subcommand)]
    Favorites(FavoriteCommands),

    /// Manage class comments
    #[command(subcommand)]
    Comments(CommentCommands),

    /// Manage timetable registrations
    #[command(subcommand)]
    Timetable(TimetableCommands),

    /// Print an encouragement comment for a class
    Encourage { class_id: u64 },
}

#[derive(Subcommand)]
enum FavoriteCommands {
    List {
        #[arg(long)]
        user: u64,
    },
    Add {
        #[arg(long)]
        user: u64,
        #[arg(long = "class")]
        class_id: u64,
    },
    Delete { favorite_id: u64 },
}

#[derive(Subcommand)]
enum CommentCommands {
    List {
        #[arg(long = "class")]
        class_id: u64,
    },
    Add {
        #[arg(long)]
        user: u64,
        #[arg(long = "class")]
        class_id: u64,
        #[arg(long)]
        content: String,
    },
    Delete { comment_id: u64 },
}

#[derive(Subcommand)]
enum TimetableCommands {
    Register {
        #[arg(long)]
        user: u64,
        #[arg(long = "class")]
        class_id: u64,
    },
    List {
        #[arg(long)]
        user: u64,
    },
    Delete { timetable_id: u64 },
}

fn main() {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(()) => 0,
        Err(e) => report(e),
    };
    process::exit(code);
}

fn run(cli: Cli) -> std::result::Result<(), CourseError> {
    let mut config = Config::load(&cli.config)?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    match cli.command {
        Commands::Init => {
            let store = AnyStore::open(&config)?;
            init_data(&store, &config)?;
            println!("Initialized data directory {}", config.data_dir.display());
            Ok(())
        }
        command => dispatch(&Scheduler::open(config)?, command),
    }
}

fn dispatch(scheduler: &Scheduler<AnyStore>, command: Commands) -> std::result::Result<(), CourseError> {
    match command {
        // Handled in run before the catalog is needed
        Commands::Init => Ok(()),
        Commands::Classes {
            keyword,
            day,
            period,
            term,
        } => {
            let query = ClassQuery {
                keyword,
                day,
                period,
                term,
            };
            print_json(&scheduler.classes(&query))
        }
        Commands::Favorites(cmd) => {
            let favorites = scheduler.favorites();
            match cmd {
                FavoriteCommands::List { user } => print_json(&favorites.list(user)?),
                FavoriteCommands::Add { user, class_id } => print_json(&favorites.create(user, class_id)?),
                FavoriteCommands::Delete { favorite_id } => {
                    favorites.delete(favorite_id)?;
                    print_deleted()
                }
            }
        }
        Commands::Comments(cmd) => {
            let comments = scheduler.comments();
            match cmd {
                CommentCommands::List { class_id } => print_json(&comments.list(class_id)?),
                CommentCommands::Add {
                    user,
                    class_id,
                    content,
                } => print_json(&comments.create(user, class_id, &content)?),
                CommentCommands::Delete { comment_id } => {
                    comments.delete(comment_id)?;
                    print_deleted()
                }
            }
        }
        Commands::Timetable(cmd) => {
            let timetable = scheduler.timetable();
            match cmd {
                TimetableCommands::Register { user, class_id } => print_json(&timetable.register(user, class_id)?),
                TimetableCommands::List { user } => print_json(&timetable.list(user)?),
                TimetableCommands::Delete { timetable_id } => {
                    timetable.delete(timetable_id)?;
                    print_deleted()
                }
            }
        }
        Commands::Encourage { class_id } => {
            let comment = scheduler.encourage(class_id)?;
            print_json(&serde_json::json!({ "comment": comment }))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> std::result::Result<(), CourseError> {
    let json = serde_json::to_string_pretty(value).map_err(eyre::Report::from)?;
    println!("{}", json);
    Ok(())
}

fn print_deleted() -> std::result::Result<(), CourseError> {
    print_json(&serde_json::json!({ "status": "deleted" }))
}

/// Print the error payload on stdout and a readable line on stderr; returns the exit code
fn report(err: CourseError) -> i32 {
    println!("{}", err.to_payload());

    match err.kind() {
        ErrorKind::Storage => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            2
        }
        ErrorKind::NotFound | ErrorKind::Conflict => {
            eprintln!("{} {}", "rejected:".yellow().bold(), err.reason());
            if let CourseError::TimeConflict { conflict_with } = &err {
                eprintln!(
                    "  conflicts with #{} {} ({} period {})",
                    conflict_with.id, conflict_with.name, conflict_with.day, conflict_with.period
                );
            }
            1
        }
    }
}
