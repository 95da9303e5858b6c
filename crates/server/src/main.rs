#![forbid(unsafe_code)]

mod entry;
mod handlers;
mod identity;
mod seed;
mod server;
mod support;

pub(crate) use support::*;

use identity::{IdentityProvider, StaticSessions};
use mp_storage::SqliteStore;
use std::fmt::Write as _;

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "mentorpath-progression";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const CRASH_FILE: &str = "mentorpath_last_crash.txt";

pub(crate) struct ProgressionServer {
    initialized: bool,
    store: SqliteStore,
    identity: Box<dyn IdentityProvider>,
}

fn write_last_crash(storage_dir: &std::path::Path, kind: &str, detail: &str) {
    let _ = std::fs::create_dir_all(storage_dir);
    let path = storage_dir.join(CRASH_FILE);

    let mut out = String::new();
    let _ = writeln!(out, "ts={}", ts_ms_to_rfc3339(now_ms_i64()));
    let _ = writeln!(out, "pid={}", std::process::id());
    let _ = writeln!(out, "kind={kind}");
    let _ = writeln!(out, "version={}", version_line());
    let _ = writeln!(
        out,
        "args={:?}",
        redact_args(&std::env::args().collect::<Vec<_>>())
    );
    let _ = writeln!(out, "detail={detail}");

    let _ = std::fs::write(path, out);
}

fn install_crash_reporter(storage_dir: std::path::PathBuf) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let mut detail = info.to_string();
        let backtrace = std::backtrace::Backtrace::force_capture();
        let _ = write!(&mut detail, "\nbacktrace:\n{backtrace}");
        write_last_crash(&storage_dir, "panic", &detail);
        default_hook(info);
    }));
}

fn usage() -> &'static str {
    "mp_server: mentorpath task progression engine (JSON-RPC over stdio)\n\n\
USAGE:\n\
  mp_server [--storage-dir DIR] [--seed FILE] [--session TOKEN=USER]...\n\
\n\
FLAGS:\n\
  --storage-dir DIR       SQLite store directory (env MENTORPATH_STORAGE_DIR, default .mentorpath)\n\
  --seed FILE             YAML catalog applied at startup (env MENTORPATH_SEED)\n\
  --session TOKEN=USER    Accept TOKEN as a session for USER; repeatable\n\
                          (env MENTORPATH_SESSIONS=\"tok=user,tok2=user2\")\n\
  -h, --help              Print this help and exit\n\
  -V, --version           Print version and exit\n"
}

pub(crate) fn version_line() -> String {
    let profile = if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    };
    format!("mp_server {SERVER_VERSION} build={profile}")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = std::env::args().collect::<Vec<_>>();
    if args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        print!("{}", usage());
        return Ok(());
    }
    if args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-V" | "--version"))
    {
        println!("{}", version_line());
        return Ok(());
    }

    let config = RuntimeConfig::from_process()?;
    let storage_dir = config.storage_dir.clone();
    install_crash_reporter(storage_dir.clone());
    let mut session_log = SessionLog::new(&storage_dir);

    let result = run(config, &mut session_log);
    match &result {
        Ok(()) => session_log.note_exit("eof"),
        Err(err) => {
            session_log.note_error(&err.to_string());
            session_log.note_exit("error");
            write_last_crash(&storage_dir, "error", &format!("{err:?}"));
        }
    }
    result
}

fn run(
    config: RuntimeConfig,
    session_log: &mut SessionLog,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = SqliteStore::open(&config.storage_dir)?;
    if let Some(seed_path) = config.seed_path.as_deref() {
        let catalog = seed::load_seed(seed_path)?;
        store.apply_catalog(&catalog)?;
    }
    let identity = StaticSessions::new(config.sessions);
    if identity.is_empty() {
        session_log.note_error("no sessions configured; progression calls will be UNAUTHENTICATED");
    }

    let mut server = ProgressionServer::new(store, Box::new(identity));
    entry::run_stdio(&mut server, session_log)
}
