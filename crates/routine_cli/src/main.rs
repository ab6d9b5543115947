use clap::{CommandFactory, Parser};
use routine_cli::cli::{
    CONFIG_OVERRIDE_FLAG, Cli, Command, ConfigOverrideTarget, parse_config_override,
};
use routine_core::config::{self, Config, ConfigOverrides};
use routine_core::error::AppError;
use routine_core::model::{RoutineKind, Task, TaskUpdate};
use routine_core::schedule::{progress_counts, total_duration};
use routine_core::storage::persist::{self, SyncPersister};
use routine_core::storage::{FileBackend, store_dir};
use routine_core::store::{RoutineStore, initial_state};
use routine_core::templates::{RoutineTip, tips_for};
use std::io::{self, BufRead};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

/// One hydrated store plus what is needed to rebuild it.
struct Session {
    config: Config,
    backend: FileBackend,
    store: RoutineStore,
}

impl Session {
    fn open(config: Config) -> Result<Self, AppError> {
        let backend = FileBackend::new(store_dir()?);
        let templates = config.templates();
        let fallback = initial_state(&templates, config.finish_by())?;
        let store = RoutineStore::hydrate(&backend, fallback)
            .with_templates(templates.morning)
            .with_observer(Box::new(SyncPersister::new(backend.clone())));
        Ok(Self {
            config,
            backend,
            store,
        })
    }

    fn wipe(&mut self) -> Result<(), AppError> {
        persist::clear_state(&self.backend)?;
        let templates = self.config.templates();
        let fresh = initial_state(&templates, self.config.finish_by())?;
        self.store = RoutineStore::from_state(fresh)
            .with_templates(templates.morning)
            .with_observer(Box::new(SyncPersister::new(self.backend.clone())));
        Ok(())
    }
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "")]
    done: &'static str,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Task")]
    title: String,
    #[tabled(rename = "Min")]
    duration: u32,
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Morning")]
    morning: String,
    #[tabled(rename = "Evening")]
    evening: String,
    #[tabled(rename = "Saved at")]
    completed_at: String,
}

fn task_table(tasks: &[Task]) -> String {
    let rows = tasks.iter().map(|task| TaskRow {
        done: if task.completed { "[x]" } else { "[ ]" },
        time: task.time.clone(),
        id: task.id.clone(),
        title: if task.icon.is_empty() {
            task.title.clone()
        } else {
            format!("{} {}", task.icon, task.title)
        },
        duration: task.duration,
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

fn routine_json(store: &RoutineStore, kind: RoutineKind) -> serde_json::Value {
    let tasks = store.tasks(kind);
    let (completed, total) = progress_counts(tasks);
    serde_json::json!({
        "progress": store.progress(kind),
        "completed": completed,
        "total": total,
        "durationMinutes": total_duration(tasks),
        "tasks": tasks,
    })
}

fn print_routine_plain(store: &RoutineStore, kind: RoutineKind) {
    let tasks = store.tasks(kind);
    let (completed, total) = progress_counts(tasks);
    let heading = match kind {
        RoutineKind::Morning => "Morning",
        RoutineKind::Evening => "Evening",
    };
    println!(
        "{heading} routine: {completed}/{total} done ({}%)",
        store.progress(kind)
    );
    if !tasks.is_empty() {
        println!("{}", task_table(tasks));
    }
}

fn print_sleep_plain(store: &RoutineStore) {
    let sleep = store.sleep_times();
    println!(
        "Bedtime: {} for 8h sleep, {} for 7.5h sleep",
        sleep.eight, sleep.seven_half
    );
}

fn print_status(store: &RoutineStore, json: bool) -> Result<(), AppError> {
    let starts_previous_day = store.starts_previous_day()?;
    if json {
        let payload = serde_json::json!({
            "finishBy": store.finish_by(),
            "startsPreviousDay": starts_previous_day,
            "sleepTimes": store.sleep_times(),
            "morning": routine_json(store, RoutineKind::Morning),
            "evening": routine_json(store, RoutineKind::Evening),
        });
        println!("{payload}");
        return Ok(());
    }

    let previous_day = if starts_previous_day {
        " (starts the previous day)"
    } else {
        ""
    };
    println!("Finish by {}{previous_day}", store.finish_by());
    print_sleep_plain(store);
    println!();
    print_routine_plain(store, RoutineKind::Morning);
    println!();
    print_routine_plain(store, RoutineKind::Evening);
    Ok(())
}

fn print_task_result(store: &RoutineStore, task: &Task, kind: RoutineKind, verb: &str, json: bool) {
    if json {
        let payload = serde_json::json!({
            "routine": kind,
            "task": task,
            "progress": store.progress(kind),
            "sleepTimes": store.sleep_times(),
        });
        println!("{payload}");
    } else {
        println!(
            "{verb} {kind} task: {} ({}) - {}% done",
            task.title,
            task.id,
            store.progress(kind)
        );
    }
}

fn print_history(store: &RoutineStore, json: bool) {
    let history = store.completion_history();
    if json {
        println!("{}", serde_json::json!(history));
        return;
    }
    if history.is_empty() {
        println!("No saved days yet");
        return;
    }
    let rows = history.iter().map(|(date, snapshot)| HistoryRow {
        date: date.clone(),
        morning: format!("{}%", snapshot.morning_progress),
        evening: format!("{}%", snapshot.evening_progress),
        completed_at: snapshot.completed_at.clone(),
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn print_tips(tips: &[&RoutineTip], json: bool) {
    if json {
        println!("{}", serde_json::json!(tips));
        return;
    }
    for tip in tips {
        println!("{} {}: {}", tip.icon, tip.title, tip.description);
    }
}

fn find_task(store: &RoutineStore, id: &str, kind: RoutineKind) -> Result<Task, AppError> {
    store
        .tasks(kind)
        .iter()
        .find(|task| task.id == id)
        .cloned()
        .ok_or_else(|| AppError::invalid_input(format!("no task '{id}' in the {kind} routine")))
}

fn new_task_id() -> String {
    format!("task-{}", OffsetDateTime::now_utc().unix_timestamp_nanos())
}

fn run_command(session: &mut Session, cli: Cli) -> Result<(), AppError> {
    let json = cli.json;
    let store = &mut session.store;

    match cli.command {
        Command::Status => print_status(store, json)?,
        Command::List { routine } => {
            let kind = RoutineKind::from(routine);
            if json {
                println!("{}", routine_json(store, kind));
            } else {
                print_routine_plain(store, kind);
            }
        }
        Command::Toggle { id, evening } => {
            let kind = RoutineKind::from_evening_flag(evening);
            if !store.toggle_task(&id, kind) {
                return Err(AppError::invalid_input(format!(
                    "no task '{id}' in the {kind} routine"
                )));
            }
            let task = find_task(store, &id, kind)?;
            let verb = if task.completed { "Completed" } else { "Reopened" };
            print_task_result(store, &task, kind, verb, json);
        }
        Command::Add {
            title,
            evening,
            time,
            duration,
            description,
            icon,
        } => {
            let kind = RoutineKind::from_evening_flag(evening);
            let task = Task {
                id: new_task_id(),
                time: time.unwrap_or_else(|| store.finish_by().to_string()),
                title: title.trim().to_string(),
                description: description.unwrap_or_default(),
                duration,
                icon: icon.unwrap_or_default(),
                completed: false,
            };
            store.add_task(task.clone(), kind)?;
            print_task_result(store, &task, kind, "Added", json);
        }
        Command::Edit {
            id,
            evening,
            title,
            time,
            duration,
            description,
            icon,
        } => {
            let kind = RoutineKind::from_evening_flag(evening);
            let updates = TaskUpdate {
                time,
                title,
                description,
                duration,
                icon,
                completed: None,
            };
            if updates.is_empty() {
                return Err(AppError::invalid_input("nothing to update"));
            }
            if !store.edit_task(&id, &updates, kind)? {
                return Err(AppError::invalid_input(format!(
                    "no task '{id}' in the {kind} routine"
                )));
            }
            let task = find_task(store, &id, kind)?;
            print_task_result(store, &task, kind, "Updated", json);
        }
        Command::Delete { id, evening } => {
            let kind = RoutineKind::from_evening_flag(evening);
            let task = find_task(store, &id, kind)?;
            store.delete_task(&id, kind);
            print_task_result(store, &task, kind, "Deleted", json);
        }
        Command::Reorder { evening, ids } => {
            let kind = RoutineKind::from_evening_flag(evening);
            store.reorder_tasks(ids.as_slice(), kind)?;
            if json {
                println!("{}", routine_json(store, kind));
            } else {
                print_routine_plain(store, kind);
            }
        }
        Command::Reset { routine } => {
            let kind = RoutineKind::from(routine);
            store.reset(kind);
            if json {
                println!("{}", routine_json(store, kind));
            } else {
                println!("Reset {kind} routine");
            }
        }
        Command::FinishBy { time } => {
            store.update_finish_by(time.trim())?;
            print_status(store, json)?;
        }
        Command::Sleep => {
            if json {
                println!("{}", serde_json::json!(store.sleep_times()));
            } else {
                print_sleep_plain(store);
            }
        }
        Command::Save => {
            let date = store.save_completion()?;
            if json {
                println!("{}", serde_json::json!({ "date": date }));
            } else {
                println!(
                    "Saved {date}: morning {}%, evening {}%",
                    store.progress(RoutineKind::Morning),
                    store.progress(RoutineKind::Evening)
                );
            }
        }
        Command::History => print_history(store, json),
        Command::Tips { evening } => {
            print_tips(&tips_for(RoutineKind::from_evening_flag(evening)), json);
        }
        Command::Wipe => {
            session.wipe()?;
            if json {
                println!("{}", serde_json::json!({ "wiped": true }));
            } else {
                println!("Stored routine removed");
            }
        }
    }

    Ok(())
}

fn apply_overrides(base: &Config, raw_overrides: &[String]) -> Result<Config, AppError> {
    let mut overrides = ConfigOverrides::default();
    for raw in raw_overrides {
        let parsed = parse_config_override(raw).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::FinishBy => overrides.default_finish_by = Some(parsed.value),
            ConfigOverrideTarget::LogFilter => overrides.log_filter = Some(parsed.value),
        }
    }
    config::merge_overrides(base, &overrides)
}

fn init_tracing(config: &Config) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .init();
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_session_loop(config: Config) -> Result<(), AppError> {
    let mut session = Session::open(config)?;
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("routine".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if !cli.config_override.is_empty() {
            tracing::warn!("{CONFIG_OVERRIDE_FLAG} is only read at startup; ignoring");
        }

        if let Err(err) = run_command(&mut session, cli) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn run_once() -> Result<(), AppError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => return Err(normalize_parse_error(err)),
    };

    let loaded = config::load_config_with_fallback();
    let config = apply_overrides(&loaded.config, &cli.config_override)?;
    init_tracing(&config);
    if let Some(err) = loaded.error {
        tracing::warn!(error = %err, "using default configuration");
    }

    let mut session = Session::open(config)?;
    run_command(&mut session, cli)
}

fn run_interactive() -> Result<(), AppError> {
    let loaded = config::load_config_with_fallback();
    init_tracing(&loaded.config);
    if let Some(err) = loaded.error {
        tracing::warn!(error = %err, "using default configuration");
    }
    run_session_loop(loaded.config)
}

fn main() {
    let mut args = std::env::args_os();
    args.next();
    let interactive = args.next().is_none();

    let result = if interactive {
        run_interactive()
    } else {
        run_once()
    };

    if let Err(err) = result {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
