//! focusd - The focus timer service
//!
//! This is the main entry point for the focusd service.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization
//! - Session engine
//! - One second ticker
//! - JSON line commands on stdin, responses and events on stdout

use anyhow::{Context, Result};
use clap::Parser;
use focus_api::{
    Command, ErrorCode, ErrorInfo, Event, EventPayload, Outbound, Request, Response,
    ResponsePayload, API_VERSION,
};
use focus_config::{load_config, load_config_or_default, ConfigError};
use focus_core::{CoreEvent, SessionEngine, StartDecision};
use focus_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use focus_util::{default_config_path, FocusError, SystemClock, DB_FILENAME};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// focusd - Pomodoro focus timer service
#[derive(Parser, Debug)]
#[command(name = "focusd")]
#[command(about = "Pomodoro focus/break session engine", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/focusd/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set FOCUS_DATA_DIR env var)
    #[arg(short, long, env = "FOCUS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    engine: SessionEngine,
    store: Arc<dyn Store>,
    config_path: PathBuf,
    tick_interval: Duration,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        // Load configuration
        let config = load_config_or_default(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            focus_secs = config.timer.focus_seconds,
            daily_goal = config.timer.daily_goal,
            "Configuration loaded"
        );

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| config.service.data_dir.clone());

        // Create data directory
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        // Initialize store
        let db_path = data_dir.join(DB_FILENAME);
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        // Log service start
        store.append_audit(AuditEvent::new(AuditEventType::ServiceStarted))?;

        let engine = SessionEngine::new(config.timer, store.clone(), Arc::new(SystemClock));

        Ok(Self {
            engine,
            store,
            config_path: args.config.clone(),
            tick_interval: config.service.tick_interval,
        })
    }

    /// Single-task event loop. Ticks, commands and signals are handled one at
    /// a time, so a completion finishes before the next tick is looked at.
    async fn run(self) -> Result<()> {
        let Service {
            mut engine,
            store,
            config_path,
            tick_interval,
        } = self;

        let mut out = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;

        // Set up signal handlers
        let mut sigterm = signal(SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup())
            .context("Failed to create SIGHUP handler")?;

        // Main event loop
        let mut tick_timer = tokio::time::interval(tick_interval);
        tick_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick fires immediately; a second has not passed yet
        tick_timer.tick().await;

        emit(&mut out, Outbound::Event(Event::new(EventPayload::StateChanged(engine.snapshot())))).await;

        info!("Service running");

        loop {
            tokio::select! {
                // Signal: SIGTERM or SIGINT - graceful shutdown
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                // Signal: SIGHUP - reload configuration
                _ = sighup.recv() => {
                    info!("Received SIGHUP, reloading configuration");
                    match reload_config(&mut engine, &config_path) {
                        Ok(events) => emit_core_events(&mut out, events).await,
                        Err(e) => warn!(error = %e, "Config reload failed, keeping current config"),
                    }
                }

                // Tick timer - one second of countdown. Late ticks are skipped,
                // never replayed
                _ = tick_timer.tick() => {
                    let events = engine.tick();
                    emit_core_events(&mut out, events).await;
                }

                // Commands, one JSON request per line
                line = lines.next_line(), if stdin_open => {
                    match line {
                        Ok(Some(line)) => {
                            if line.trim().is_empty() {
                                continue;
                            }
                            let (response, events) = handle_line(&mut engine, &config_path, &line);
                            emit(&mut out, Outbound::Response(response)).await;
                            for payload in events {
                                emit(&mut out, Outbound::Event(Event::new(payload))).await;
                            }
                        }
                        Ok(None) => {
                            info!("Command input closed, timer keeps running");
                            stdin_open = false;
                        }
                        Err(e) => {
                            warn!(error = %e, "Failed to read command input");
                            stdin_open = false;
                        }
                    }
                }
            }
        }

        // Graceful shutdown
        info!("Shutting down focusd");

        engine.save_snapshot();
        emit(&mut out, Outbound::Event(Event::new(EventPayload::Shutdown))).await;

        // Log shutdown
        if let Err(e) = store.append_audit(AuditEvent::new(AuditEventType::ServiceStopped)) {
            warn!(error = %e, "Failed to log service shutdown");
        }

        info!("Shutdown complete");
        Ok(())
    }
}

/// Write one JSON line to the output stream
async fn emit(out: &mut Stdout, message: Outbound) {
    let mut line = match serde_json::to_vec(&message) {
        Ok(line) => line,
        Err(e) => {
            warn!(error = %e, "Failed to serialize output");
            return;
        }
    };
    line.push(b'\n');

    if let Err(e) = out.write_all(&line).await {
        warn!(error = %e, "Failed to write output");
        return;
    }
    let _ = out.flush().await;
}

async fn emit_core_events(out: &mut Stdout, events: Vec<CoreEvent>) {
    for event in events {
        emit(out, Outbound::Event(Event::new(event_payload(event)))).await;
    }
}

/// Map an engine event to its wire form
fn event_payload(event: CoreEvent) -> EventPayload {
    match event {
        CoreEvent::TimerStarted {
            session_id,
            phase,
            remaining_seconds,
        } => EventPayload::TimerStarted {
            session_id,
            phase,
            remaining_seconds,
        },
        CoreEvent::TimerPaused {
            session_id,
            phase,
            remaining_seconds,
        } => EventPayload::TimerPaused {
            session_id,
            phase,
            remaining_seconds,
        },
        CoreEvent::SessionCompleted {
            session_id,
            phase,
            planned_seconds,
            actual_seconds,
            natural,
            linked_task,
            intention,
        } => EventPayload::SessionCompleted {
            session_id,
            phase,
            planned_seconds,
            actual_seconds,
            natural,
            linked_task,
            intention,
        },
        CoreEvent::PhaseChanged {
            session_id,
            phase,
            remaining_seconds,
            is_running,
        } => EventPayload::PhaseChanged {
            session_id,
            phase,
            remaining_seconds,
            is_running,
        },
        CoreEvent::DailyGoalReached {
            daily_goal,
            goal_streak_days,
        } => EventPayload::DailyGoalReached {
            daily_goal,
            goal_streak_days,
        },
        CoreEvent::AchievementUnlocked {
            id,
            title,
            icon,
            celebrate,
        } => EventPayload::AchievementUnlocked {
            id,
            title,
            icon,
            celebrate,
        },
        CoreEvent::ConfigChanged(config) => EventPayload::ConfigChanged {
            focus_seconds: config.focus_seconds,
            short_break_seconds: config.short_break_seconds,
            long_break_seconds: config.long_break_seconds,
            sessions_per_round: config.sessions_per_round,
            daily_goal: config.daily_goal,
        },
        CoreEvent::ProgressReset => EventPayload::ProgressReset,
    }
}

fn error_info(e: &FocusError) -> ErrorInfo {
    let code = match e {
        FocusError::TaskNotFound(_) => ErrorCode::TaskNotFound,
        FocusError::ConfigError(_) => ErrorCode::ConfigError,
        FocusError::ValidationError(_) => ErrorCode::InvalidRequest,
        FocusError::StoreError(_) => ErrorCode::StoreError,
    };
    ErrorInfo::new(code, e.to_string())
}

/// Re-read the config file and apply its timer settings. Service settings
/// only take effect on restart. A missing or invalid file leaves the current
/// config in place.
fn reload_config(engine: &mut SessionEngine, path: &Path) -> Result<Vec<CoreEvent>, FocusError> {
    let config = match load_config(path) {
        Ok(config) => config,
        Err(ConfigError::ReadError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FocusError::config(format!(
                "config file {} not found",
                path.display()
            )));
        }
        Err(e) => return Err(FocusError::config(e.to_string())),
    };
    engine.set_config(config.timer)
}

/// Parse and dispatch one input line
fn handle_line(
    engine: &mut SessionEngine,
    config_path: &Path,
    line: &str,
) -> (Response, Vec<EventPayload>) {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, "Malformed request");
            return (
                Response::error(0, ErrorInfo::new(ErrorCode::InvalidRequest, e.to_string())),
                Vec::new(),
            );
        }
    };

    if request.api_version != API_VERSION {
        return (
            Response::error(
                request.request_id,
                ErrorInfo::new(
                    ErrorCode::UnsupportedVersion,
                    format!("Unsupported API version {}", request.api_version),
                ),
            ),
            Vec::new(),
        );
    }

    handle_command(engine, config_path, request.request_id, request.command)
}

fn handle_command(
    engine: &mut SessionEngine,
    config_path: &Path,
    request_id: u64,
    command: Command,
) -> (Response, Vec<EventPayload>) {
    let ok = |payload: ResponsePayload, events: Vec<CoreEvent>| {
        (
            Response::success(request_id, payload),
            events.into_iter().map(event_payload).collect::<Vec<_>>(),
        )
    };
    let err = |e: FocusError| -> (Response, Vec<EventPayload>) {
        (Response::error(request_id, error_info(&e)), Vec::new())
    };

    match command {
        Command::GetState => ok(ResponsePayload::State(engine.snapshot()), Vec::new()),

        Command::Start => match engine.start() {
            StartDecision::Started(events) => ok(ResponsePayload::Timer(engine.timer()), events),
            StartDecision::AlreadyRunning => ok(ResponsePayload::Timer(engine.timer()), Vec::new()),
            StartDecision::IntentionRequired => (
                Response::error(
                    request_id,
                    ErrorInfo::new(
                        ErrorCode::IntentionRequired,
                        "Set an intention before starting a focus session",
                    ),
                ),
                vec![EventPayload::IntentionRequired],
            ),
        },

        Command::Pause => {
            let events = engine.pause();
            ok(ResponsePayload::Timer(engine.timer()), events)
        }

        Command::Skip => {
            let events = engine.skip();
            ok(ResponsePayload::Timer(engine.timer()), events)
        }

        Command::SetConfig { timer } => {
            let config = match engine.config().with_settings(&timer) {
                Ok(config) => config,
                Err(errors) => {
                    let message = errors
                        .iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<_>>()
                        .join("; ");
                    return err(FocusError::config(message));
                }
            };
            match engine.set_config(config) {
                Ok(events) => ok(ResponsePayload::ConfigUpdated, events),
                Err(e) => err(e),
            }
        }

        Command::LinkTask { task_id } => match engine.link_task(task_id.clone()) {
            Ok(()) => ok(ResponsePayload::TaskLinked { task_id }, Vec::new()),
            Err(e) => err(e),
        },

        Command::SetIntention { text } => {
            engine.set_intention(text);
            ok(ResponsePayload::IntentionSet, Vec::new())
        }

        Command::AddTask { title } => match engine.add_task(&title) {
            Ok(task) => ok(ResponsePayload::TaskCreated(task), Vec::new()),
            Err(e) => err(e),
        },

        Command::CompleteTask { task_id } => match engine.complete_task(&task_id) {
            Ok((task, events)) => ok(ResponsePayload::TaskCompleted(task), events),
            Err(e) => err(e),
        },

        Command::ListTasks => match engine.list_tasks() {
            Ok(tasks) => ok(ResponsePayload::Tasks { tasks }, Vec::new()),
            Err(e) => err(e),
        },

        Command::GetStats => ok(ResponsePayload::Stats(engine.stats()), Vec::new()),

        Command::GetWeek => ok(
            ResponsePayload::Days {
                days: engine.weekly_window().to_vec(),
            },
            Vec::new(),
        ),

        Command::GetMonth => ok(
            ResponsePayload::Days {
                days: engine.month_window(),
            },
            Vec::new(),
        ),

        Command::ListAchievements => ok(
            ResponsePayload::Achievements {
                achievements: engine.achievements(),
            },
            Vec::new(),
        ),

        Command::ResetProgress => {
            let events = engine.reset_progress();
            let (response, mut payloads) = ok(ResponsePayload::ProgressReset, events);
            payloads.push(EventPayload::StateChanged(engine.snapshot()));
            (response, payloads)
        }

        Command::ReloadConfig => match reload_config(engine, config_path) {
            Ok(events) => ok(ResponsePayload::ConfigReloaded, events),
            Err(e) => err(e),
        },

        Command::Ping => ok(ResponsePayload::Pong, Vec::new()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout carries the protocol
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "focusd starting"
    );

    // Create and run the service
    let service = Service::new(&args)?;
    service.run().await
}
