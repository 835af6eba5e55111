use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use stretch_core::*;

/// Poll interval while nothing is scheduled (paused, manual-only)
const IDLE_POLL: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "stretch")]
#[command(about = "Guided stretching routine player", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List available routines
    List,

    /// Show the exercises in a routine
    Show {
        /// Routine id (see `stretch list`)
        routine: String,
    },

    /// Run a routine to completion on simulated time
    Simulate {
        /// Routine id (see `stretch list`)
        routine: String,

        /// Emit presenter events as JSON lines
        #[arg(long)]
        json: bool,

        /// Skip the exercise at this index as soon as it starts
        #[arg(long)]
        skip_at: Option<usize>,
    },

    /// Play a routine in real time (stdin: p=play/pause s=skip n=next b=back q=quit)
    Play {
        /// Routine id (see `stretch list`)
        routine: String,

        /// Time multiplier, e.g. 10 plays ten times faster
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        stretch_core::logging::init_with_level("debug");
    } else {
        stretch_core::logging::init();
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let catalog = load_catalog(&config)?;

    match cli.command {
        Commands::List => cmd_list(&catalog),
        Commands::Show { routine } => cmd_show(&catalog, &routine),
        Commands::Simulate {
            routine,
            json,
            skip_at,
        } => {
            if json {
                let sink = JsonlEventSink::new(io::stdout());
                cmd_simulate(&catalog, &config, &routine, skip_at, sink)
            } else {
                let sink = TerminalSink::new(&catalog, false);
                cmd_simulate(&catalog, &config, &routine, skip_at, sink)
            }
        }
        Commands::Play { routine, speed } => cmd_play(&catalog, &config, &routine, speed),
    }
}

fn load_catalog(config: &Config) -> Result<Catalog> {
    let mut catalog = build_default_catalog();
    catalog.merge_config(config);

    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }
    tracing::debug!(
        "Catalog ready: {} exercises, {} routines",
        catalog.exercises.len(),
        catalog.routines.len()
    );
    Ok(catalog)
}

fn cmd_list(catalog: &Catalog) -> Result<()> {
    for id in catalog.routine_ids() {
        let Some(routine) = catalog.get_routine(id) else {
            continue;
        };
        println!(
            "{:<20} {:<22} {:>2} exercises  {}",
            id,
            catalog.label(id),
            routine.exercises.len(),
            format_duration(routine.total_duration_seconds())
        );
    }
    Ok(())
}

fn cmd_show(catalog: &Catalog, routine_id: &str) -> Result<()> {
    let routine = catalog
        .get_routine(routine_id)
        .ok_or_else(|| Error::RoutineNotFound(routine_id.to_string()))?;

    println!("{}", catalog.label(routine_id));
    println!();
    for (i, exercise) in routine.exercises.iter().enumerate() {
        let sides = if exercise.needs_side_switch {
            " each side"
        } else {
            ""
        };
        println!(
            "  {:>2}. {:<28} {}{}",
            i + 1,
            catalog.label(&exercise.id),
            format_duration(exercise.base_duration_seconds),
            sides
        );
    }
    println!();
    println!(
        "  Total: {}",
        format_duration(routine.total_duration_seconds())
    );
    Ok(())
}

fn cmd_simulate<E: EventSink>(
    catalog: &Catalog,
    config: &Config,
    routine_id: &str,
    skip_at: Option<usize>,
    sink: E,
) -> Result<()> {
    let mut engine = PlaybackEngine::with_config(
        catalog,
        VirtualScheduler::new(),
        sink,
        config.playback.clone(),
    );
    engine.start(routine_id)?;
    engine.play();

    let mut skipped = false;
    while engine.phase() != Phase::Completed {
        let index = engine.session().map(PlaybackSession::current_index);
        if !skipped && skip_at.is_some() && index == skip_at {
            engine.skip();
            skipped = true;
            continue;
        }
        if !engine.step() {
            break;
        }
    }
    Ok(())
}

fn cmd_play(catalog: &Catalog, config: &Config, routine_id: &str, speed: f64) -> Result<()> {
    let sink = TerminalSink::new(catalog, true);
    let mut engine = PlaybackEngine::with_config(
        catalog,
        RealtimeScheduler::with_speed(speed),
        sink,
        config.playback.clone(),
    );
    engine.start(routine_id)?;
    engine.play();
    println!("Commands: p=play/pause  s=skip  n=next  b=back  q=quit");

    let commands = spawn_stdin_reader();
    let mut stdin_open = true;
    let auto_play = config.playback.auto_play_on_navigate;

    loop {
        engine.pump();
        if engine.phase() == Phase::Completed {
            break;
        }

        let wait = engine.scheduler().wait_until_next();
        if !stdin_open {
            match wait {
                Some(wait) => thread::sleep(wait),
                // Nothing scheduled and nobody to press play
                None => break,
            }
            continue;
        }

        match commands.recv_timeout(wait.unwrap_or(IDLE_POLL)) {
            Ok(line) => match line.trim() {
                "p" => engine.toggle(),
                "s" => engine.skip(),
                "n" => {
                    engine.next();
                    if auto_play {
                        engine.play();
                    }
                }
                "b" => {
                    engine.previous();
                    if auto_play {
                        engine.play();
                    }
                }
                "q" => {
                    engine.reset();
                    println!();
                    println!("Stopped.");
                    break;
                }
                "" => {}
                other => eprintln!("Unknown command: {}", other),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                tracing::debug!("stdin closed, continuing without commands");
                stdin_open = false;
            }
        }
    }
    Ok(())
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Terminal presenter
struct TerminalSink<'a> {
    catalog: &'a Catalog,
    show_ticks: bool,
}

impl<'a> TerminalSink<'a> {
    fn new(catalog: &'a Catalog, show_ticks: bool) -> Self {
        Self {
            catalog,
            show_ticks,
        }
    }
}

impl EventSink for TerminalSink<'_> {
    fn emit(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::ExerciseChanged {
                exercise,
                index,
                total,
                side,
            } => {
                let side_note = match (exercise.needs_side_switch, side) {
                    (false, _) => "",
                    (true, Side::First) => " - first side",
                    (true, Side::Second) => " - second side",
                };
                println!();
                println!(
                    "▶ [{}/{}] {} ({}){}",
                    index + 1,
                    total,
                    self.catalog.label(&exercise.id),
                    format_duration(exercise.base_duration_seconds),
                    side_note
                );
            }
            PlaybackEvent::Tick { remaining_seconds } => {
                if self.show_ticks {
                    print!("\r  {:>5} ", format_duration(remaining_seconds));
                    let _ = io::stdout().flush();
                }
            }
            PlaybackEvent::Expired => {
                if self.show_ticks {
                    println!();
                }
                println!("  ✓ Done");
            }
            PlaybackEvent::SideSwitchAnnounced => println!("  ↔ Switch sides"),
            PlaybackEvent::Completed(stats) => {
                println!();
                println!(
                    "★ Routine complete: {} exercises in {} min",
                    stats.total_exercises, stats.elapsed_minutes
                );
            }
        }
    }
}

fn format_duration(seconds: u32) -> String {
    let (minutes, seconds) = (seconds / 60, seconds % 60);
    match (minutes, seconds) {
        (0, s) => format!("{}s", s),
        (m, 0) => format!("{}m", m),
        (m, s) => format!("{}m{:02}s", m, s),
    }
}
