use anyhow::{Context, Result, anyhow};
use chrono::Local;
use std::{
    fs::File,
    io::{self, IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

// --- Formatter ---

const DIM: &str = "\x1b[2m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

fn level_color(level: Level) -> &'static str {
    match level {
        Level::ERROR => "\x1b[1;31m",
        Level::WARN => "\x1b[1;33m",
        Level::INFO => "\x1b[1;32m",
        Level::DEBUG => "\x1b[1;34m",
        Level::TRACE => "\x1b[1;35m",
    }
}

/// `<local time> <LEVEL> <module:line> <fields>`. ANSI colors only when the
/// writer supports them.
struct CompactLocal;

impl<S, N> FormatEvent<S, N> for CompactLocal
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let paint = |style: &'static str| if writer.has_ansi_escapes() { style } else { "" };
        let (dim, cyan, reset) = (paint(DIM), paint(CYAN), paint(RESET));
        let level = paint(level_color(*meta.level()));

        let now = Local::now().format("%H:%M:%S%.3f");
        write!(writer, "{dim}{now}{reset} {level}{:>5}{reset} ", meta.level())?;
        if let Some(module) = meta.module_path() {
            write!(writer, "{cyan}{module}:{}{reset} ", meta.line().unwrap_or(0))?;
        }
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

// --- Log file ---

type SharedFile = Arc<Mutex<Option<File>>>;

/// Writer target that can be pointed at a file after the subscriber is
/// installed. Records are dropped while it is empty.
#[derive(Clone)]
struct LogFile(SharedFile);

struct LogFileWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for LogFileWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.0.as_mut().map_or(Ok(buf.len()), |f| f.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.as_mut().map_or(Ok(()), File::flush)
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileWriter(lock(&self.0))
    }
}

fn lock(file: &SharedFile) -> MutexGuard<'_, Option<File>> {
    file.lock().unwrap_or_else(PoisonError::into_inner)
}

// --- Runtime handles ---

type ReloadFn = Box<dyn Fn(EnvFilter) -> Result<()> + Send + Sync>;

static RELOAD_FILTER: OnceLock<ReloadFn> = OnceLock::new();
static LOG_FILE: OnceLock<SharedFile> = OnceLock::new();

// --- Public API ---

/// True when `RUST_LOG` is set; its filter then wins over configured levels.
pub fn env_filter_overrides() -> bool {
    std::env::var_os(EnvFilter::DEFAULT_ENV).is_some()
}

/// Replaces the active filter. Takes a bare level (`debug`) or a full
/// directive (`agro_core=trace,info`).
pub fn set_log_level(directive: &str) -> Result<()> {
    let filter = EnvFilter::try_new(directive)
        .with_context(|| format!("invalid log level '{directive}'"))?;
    let reload = RELOAD_FILTER.get().context("logging not yet initialized")?;
    reload(filter)
}

/// Starts appending log records to `path`, replacing any open log file.
/// The directory must already exist.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let slot = LOG_FILE.get().context("logging not yet initialized")?;
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file '{}'", path.display()))?;
    *lock(slot) = Some(file);
    Ok(())
}

/// Installs the global subscriber: records at `default_level` (or the
/// `RUST_LOG` filter) go to stderr, and to the log file once
/// [`enable_file_logging`] has opened one. Later calls are no-ops.
pub fn init_logging(default_level: &str) {
    let file: SharedFile = Arc::default();
    let _ = LOG_FILE.set(Arc::clone(&file));

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let (filter, handle) = reload::Layer::new(filter);

    let stderr = tracing_subscriber::fmt::layer()
        .event_format(CompactLocal)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);
    let to_file = tracing_subscriber::fmt::layer()
        .event_format(CompactLocal)
        .with_ansi(false)
        .with_writer(LogFile(file));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(to_file)
        .try_init();
    if installed.is_ok() {
        let _ = RELOAD_FILTER.set(Box::new(move |filter: EnvFilter| {
            handle
                .reload(filter)
                .map_err(|e| anyhow!("filter reload failed: {e}"))
        }));
    }
}
