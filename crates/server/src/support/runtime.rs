#![forbid(unsafe_code)]

use mp_core::UserId;
use std::path::PathBuf;

const DEFAULT_STORAGE_DIR: &str = ".mentorpath";
const ENV_STORAGE_DIR: &str = "MENTORPATH_STORAGE_DIR";
const ENV_SEED: &str = "MENTORPATH_SEED";
const ENV_SESSIONS: &str = "MENTORPATH_SESSIONS";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RuntimeConfig {
    pub(crate) storage_dir: PathBuf,
    pub(crate) seed_path: Option<PathBuf>,
    /// `(token, user)` pairs; CLI entries come after environment entries.
    pub(crate) sessions: Vec<(String, UserId)>,
}

impl RuntimeConfig {
    pub(crate) fn from_process() -> Result<Self, String> {
        let args = std::env::args().skip(1).collect::<Vec<_>>();
        Self::parse(&args, |key| std::env::var(key).ok())
    }

    /// Flags win over environment variables. Unknown flags are ignored.
    pub(crate) fn parse(
        args: &[String],
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        let mut storage_dir: Option<PathBuf> = None;
        let mut seed_path: Option<PathBuf> = None;
        let mut cli_sessions = Vec::new();

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--storage-dir" => {
                    let value = iter.next().ok_or("--storage-dir requires a value")?;
                    storage_dir = Some(PathBuf::from(value));
                }
                "--seed" => {
                    let value = iter.next().ok_or("--seed requires a value")?;
                    seed_path = Some(PathBuf::from(value));
                }
                "--session" => {
                    let value = iter.next().ok_or("--session requires TOKEN=USER")?;
                    cli_sessions.push(parse_session_entry(value)?);
                }
                _ => {}
            }
        }

        let storage_dir = storage_dir
            .or_else(|| non_empty(env(ENV_STORAGE_DIR)).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR));
        let seed_path = seed_path.or_else(|| non_empty(env(ENV_SEED)).map(PathBuf::from));

        let mut sessions = Vec::new();
        if let Some(raw) = non_empty(env(ENV_SESSIONS)) {
            for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
                sessions.push(parse_session_entry(entry)?);
            }
        }
        sessions.extend(cli_sessions);

        Ok(Self {
            storage_dir,
            seed_path,
            sessions,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_session_entry(raw: &str) -> Result<(String, UserId), String> {
    let Some((token, user)) = raw.split_once('=') else {
        return Err("session entries must look like TOKEN=USER".to_string());
    };
    let token = token.trim();
    if token.is_empty() {
        return Err("session token must not be empty".to_string());
    }
    let user = UserId::try_new(user.trim())
        .map_err(|err| format!("session user id: {}", err.message()))?;
    Ok((token.to_string(), user))
}

/// Replaces the value after every `--session` flag so tokens never reach log files.
pub(crate) fn redact_args(args: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len());
    let mut redact_next = false;
    for arg in args {
        if redact_next {
            out.push("<redacted>".to_string());
            redact_next = false;
            continue;
        }
        redact_next = arg == "--session";
        out.push(arg.clone());
    }
    out
}
