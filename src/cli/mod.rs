//!
//! churchman command-line front-end
//! --------------------------------
//! One-shot commands and an interactive interpreter over the client flows. Stands in
//! for the browser pages: login/signup forms, the level chooser shown on the home
//! page, and the hierarchy list.

pub mod outputformatter;

use std::io::{self, BufRead, Write};

use anyhow::Context;
use tokio::sync::watch;
use tracing::info;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, Surface};
use crate::flows::{
    guard, AuthFlow, AuthOutcome, Guarded, HierarchyOutcome, HierarchyView, LevelSelection, LoadOutcome, SelectOutcome,
    SignupRequest,
};
use crate::session::{SessionState, SessionStore};

pub fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--base-url <url>] [--store <path>] <command> [args]\n\nCommands:\n  login <usercode> [password]        sign in; reads the password from stdin when omitted\n  signup <usercode> <password> [--email <e>] [--first-name <f>] [--last-name <l>]\n  levels                             list the church levels you can act under\n  select <code>                      switch the session to a church level\n  hierarchy [code]                   show active hierarchy levels (or one level by code)\n  whoami                             show access records for the current token\n  status                             show the stored session\n  logout                             forget the stored token\n  repl                               start the interactive interpreter\n  help                               show this help\n\nFlags:\n  --base-url <url>   API base URL (env CHURCHMAN_BASE_URL, default http://localhost:8000)\n  --store <path>     session file (env CHURCHMAN_STORE, default ~/.churchman/session.json)\n  -h, --help         show this help\n\nEnvironment:\n  CHURCHMAN_TIMEOUT_SECS   per-request timeout in seconds (default: none)\n  RUST_LOG                 log filter (default: info)"
    );
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { username: String, password: Option<String> },
    Signup { username: String, password: String, email: Option<String>, first_name: Option<String>, last_name: Option<String> },
    Levels,
    Select { code: String },
    Hierarchy { code: Option<String> },
    Whoami,
    Status,
    Logout,
    Repl,
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub base_url: Option<String>,
    pub store: Option<String>,
    pub command: Command,
}

fn take_value(args: &[String], i: usize, flag: &str) -> Result<String, String> {
    args.get(i + 1).cloned().ok_or_else(|| format!("{} requires a value", flag))
}

/// Parse arguments after the program name.
pub fn parse_args(args: &[String]) -> Result<Invocation, String> {
    let mut base_url = None;
    let mut store = None;
    let mut words: Vec<String> = Vec::new();
    let mut email = None;
    let mut first_name = None;
    let mut last_name = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--base-url" => { base_url = Some(take_value(args, i, "--base-url")?); i += 2; continue; }
            "--store" => { store = Some(take_value(args, i, "--store")?); i += 2; continue; }
            "--email" => { email = Some(take_value(args, i, "--email")?); i += 2; continue; }
            "--first-name" => { first_name = Some(take_value(args, i, "--first-name")?); i += 2; continue; }
            "--last-name" => { last_name = Some(take_value(args, i, "--last-name")?); i += 2; continue; }
            "-h" | "--help" => return Ok(Invocation { base_url, store, command: Command::Help }),
            flag if flag.starts_with("--") => return Err(format!("Unrecognized flag: {}", flag)),
            w => { words.push(w.to_string()); i += 1; }
        }
    }

    let command = parse_command(&words)?;
    let signup_only = email.is_some() || first_name.is_some() || last_name.is_some();
    let command = match command {
        Command::Signup { username, password, .. } => Command::Signup { username, password, email, first_name, last_name },
        _ if signup_only => return Err("--email/--first-name/--last-name only apply to signup".to_string()),
        other => other,
    };
    Ok(Invocation { base_url, store, command })
}

/// Parse one command line (also used by the interpreter).
pub fn parse_command(words: &[String]) -> Result<Command, String> {
    let Some(first) = words.first() else { return Err("missing command".to_string()); };
    let rest = &words[1..];
    let arity = |min: usize, max: usize, usage: &str| -> Result<(), String> {
        if rest.len() < min || rest.len() > max { Err(format!("usage: {}", usage)) } else { Ok(()) }
    };
    match first.to_ascii_lowercase().as_str() {
        "login" => {
            arity(1, 2, "login <usercode> [password]")?;
            Ok(Command::Login { username: rest[0].clone(), password: rest.get(1).cloned() })
        }
        "signup" => {
            arity(2, 2, "signup <usercode> <password>")?;
            Ok(Command::Signup { username: rest[0].clone(), password: rest[1].clone(), email: None, first_name: None, last_name: None })
        }
        "levels" => { arity(0, 0, "levels")?; Ok(Command::Levels) }
        "select" => { arity(1, 1, "select <code>")?; Ok(Command::Select { code: rest[0].clone() }) }
        "hierarchy" => { arity(0, 1, "hierarchy [code]")?; Ok(Command::Hierarchy { code: rest.first().cloned() }) }
        "whoami" => { arity(0, 0, "whoami")?; Ok(Command::Whoami) }
        "status" => { arity(0, 0, "status")?; Ok(Command::Status) }
        "logout" => { arity(0, 0, "logout")?; Ok(Command::Logout) }
        "repl" => { arity(0, 0, "repl")?; Ok(Command::Repl) }
        "help" => Ok(Command::Help),
        other => Err(format!("Unrecognized command: {}", other)),
    }
}

/// All flows for one process, sharing one client and one session store.
pub struct Shell {
    client: ApiClient,
    auth: AuthFlow,
    levels: LevelSelection,
    hierarchy: HierarchyView,
}

impl Shell {
    pub fn new(cfg: &ClientConfig) -> ClientResult<Self> {
        let session = SessionStore::open(&cfg.store_path);
        let client = ApiClient::new(cfg, session)?;
        Ok(Self {
            auth: AuthFlow::new(client.clone()),
            levels: LevelSelection::new(client.clone()),
            hierarchy: HierarchyView::new(client.clone()),
            client,
        })
    }

    pub fn session(&self) -> &SessionStore { self.client.session() }

    pub fn levels(&self) -> &LevelSelection { &self.levels }

    pub fn hierarchy(&self) -> &HierarchyView { &self.hierarchy }

    pub async fn exec(&mut self, cmd: Command) -> ClientResult<()> {
        match cmd {
            Command::Login { username, password } => {
                let password = match password {
                    Some(p) => p,
                    None => prompt("password: ")?,
                };
                let out = self.auth.login(&username, &password).await?;
                self.report_auth(out).await
            }
            Command::Signup { username, password, email, first_name, last_name } => {
                let req = SignupRequest { username, password, email, first_name, last_name };
                let out = self.auth.signup(&req).await?;
                self.report_auth(out).await
            }
            Command::Levels => self.show_levels().await,
            Command::Select { code } => {
                match self.levels.select_level(&code).await? {
                    SelectOutcome::NotLoggedIn => not_signed_in(),
                    SelectOutcome::Reselected { message, access, .. } => {
                        alert(message.as_deref());
                        if let Some(t) = outputformatter::access_table(&access) { println!("{}", t); }
                    }
                    SelectOutcome::Rejected { status, message } => return Err(ClientError::rejected(status, message)),
                }
                Ok(())
            }
            Command::Hierarchy { code } => {
                let out = match code.as_deref() {
                    Some(c) => self.hierarchy.fetch_level(c).await?,
                    None => self.hierarchy.fetch_hierarchy().await?,
                };
                match out {
                    HierarchyOutcome::NotLoggedIn => not_signed_in(),
                    HierarchyOutcome::Loaded { message } => {
                        alert(message.as_deref());
                        println!("Church Hierarchy");
                        match outputformatter::hierarchy_table(&self.hierarchy.visible()) {
                            Some(t) => println!("{}", t),
                            None => println!("(no active levels)"),
                        }
                    }
                    HierarchyOutcome::Rejected { status, detail } => return Err(ClientError::rejected(status, detail)),
                }
                Ok(())
            }
            Command::Whoami => {
                match guard("whoami", self.client.current_user_access().await)? {
                    Guarded::NotLoggedIn => not_signed_in(),
                    Guarded::Ran(grants) => match outputformatter::access_table(&grants) {
                        Some(t) => println!("{}", t),
                        None => println!("(no access records)"),
                    },
                }
                Ok(())
            }
            Command::Status => {
                println!("{}", describe_state(&self.session().state()));
                Ok(())
            }
            Command::Logout => {
                let route = self.auth.logout()?;
                println!("signed out; next: {}", route.path());
                Ok(())
            }
            Command::Repl | Command::Help => {
                print_usage("churchman");
                Ok(())
            }
        }
    }

    async fn report_auth(&mut self, out: AuthOutcome) -> ClientResult<()> {
        match out {
            AuthOutcome::SignedIn { message, navigate } => {
                alert(message.as_deref());
                info!(target: "churchman::cli", route = navigate.path(), "navigate");
                // the home page mounts the level chooser; its failure does not undo the sign-in
                if let Err(e) = self.show_levels().await {
                    report_error(&e);
                }
                Ok(())
            }
            AuthOutcome::Rejected { status, message } => Err(ClientError::rejected(status, message)),
        }
    }

    async fn show_levels(&mut self) -> ClientResult<()> {
        match self.levels.load().await? {
            LoadOutcome::NotLoggedIn => not_signed_in(),
            LoadOutcome::Loaded { modal_open: false, .. } => println!("(no church levels available)"),
            LoadOutcome::Loaded { .. } => {
                println!("Please select a church level to continue:");
                if let Some(t) = outputformatter::levels_table(self.levels.levels()) { println!("{}", t); }
                println!("run `select <code>` to continue");
            }
        }
        Ok(())
    }
}

fn alert(message: Option<&str>) {
    if let Some(m) = message.filter(|m| !m.is_empty()) { println!("{}", m); }
}

fn not_signed_in() { eprintln!("not signed in; run `login <usercode>` first"); }

fn prompt(label: &str) -> ClientResult<String> {
    eprint!("{}", label);
    let _ = io::stderr().flush();
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).map_err(|e| ClientError::config(format!("cannot read from stdin: {}", e)))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn describe_state(s: &SessionState) -> String {
    if !s.signed_in { return "signed out".to_string(); }
    let mut out = String::from("signed in");
    if let Some(u) = &s.usercode { out.push_str(&format!(" as {}", u)); }
    match &s.level {
        Some(l) => out.push_str(&format!(", level {}", l)),
        None => out.push_str(", no church level selected"),
    }
    if let Some(t) = s.expires_at { out.push_str(&format!(", expires {}", t.to_rfc3339())); }
    out
}

/// Print a user-facing line for an error according to how it should surface. Returns the exit code.
pub fn report_error(err: &ClientError) -> i32 {
    match err.surface() {
        Surface::Silent => { not_signed_in(); 0 }
        // already logged where it happened
        Surface::LogOnly => 1,
        Surface::Alert => {
            eprintln!("error: {}", err.server_message().map(str::to_string).unwrap_or_else(|| err.to_string()));
            1
        }
    }
}

/// Entry point used by the `churchman` binary. Returns the process exit code.
pub fn run(args: Vec<String>) -> anyhow::Result<i32> {
    let mut args = args;
    let program = if args.is_empty() { "churchman".to_string() } else { args.remove(0) };
    if args.is_empty() { print_usage(&program); return Ok(2); }

    let inv = match parse_args(&args) {
        Ok(v) => v,
        Err(msg) => { eprintln!("{}", msg); print_usage(&program); return Ok(2); }
    };
    if inv.command == Command::Help { print_usage(&program); return Ok(0); }

    let mut cfg = ClientConfig::from_env()?;
    if let Some(b) = inv.base_url.as_deref() { cfg = cfg.with_base_url(b)?; }
    if let Some(s) = inv.store.as_deref() { cfg.store_path = s.into(); }
    info!(target: "churchman::cli", base = %cfg.base_url, store = %cfg.store_path.display(), "churchman starting");

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;
    let mut shell = Shell::new(&cfg)?;

    if inv.command == Command::Repl {
        return run_repl(&rt, &mut shell);
    }
    Ok(match rt.block_on(shell.exec(inv.command)) {
        Ok(()) => 0,
        Err(e) => report_error(&e),
    })
}

fn run_repl(rt: &tokio::runtime::Runtime, shell: &mut Shell) -> anyhow::Result<i32> {
    let mut watcher: watch::Receiver<SessionState> = shell.session().subscribe();
    println!("churchman interpreter. Type 'help' for commands.");
    println!("{}", describe_state(&watcher.borrow_and_update()));
    if shell.session().state().signed_in {
        if let Err(e) = rt.block_on(shell.show_levels()) { report_error(&e); }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input = String::new();
    loop {
        input.clear();
        print!("> "); let _ = stdout.flush();
        match stdin.lock().read_line(&mut input) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let line = input.trim();
        if line.is_empty() { continue; }
        let up = line.to_ascii_uppercase();
        if up == "EXIT" || up == "QUIT" { break; }
        let words: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        match parse_command(&words) {
            Ok(Command::Repl) => println!("already in the interpreter"),
            Ok(cmd) => {
                if let Err(e) = rt.block_on(shell.exec(cmd)) { report_error(&e); }
            }
            Err(msg) => eprintln!("{}", msg),
        }
        // session changes re-render here instead of restarting anything
        if watcher.has_changed().unwrap_or(false) {
            println!("[session] {}", describe_state(&watcher.borrow_and_update()));
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> { s.split_whitespace().map(str::to_string).collect() }

    #[test]
    fn parses_commands_and_global_flags() {
        let inv = parse_args(&words("--base-url http://h:1 --store /tmp/s.json login M0001 pw")).unwrap();
        assert_eq!(inv.base_url.as_deref(), Some("http://h:1"));
        assert_eq!(inv.store.as_deref(), Some("/tmp/s.json"));
        assert_eq!(inv.command, Command::Login { username: "M0001".into(), password: Some("pw".into()) });

        assert_eq!(parse_args(&words("select 5")).unwrap().command, Command::Select { code: "5".into() });
        assert_eq!(parse_args(&words("hierarchy")).unwrap().command, Command::Hierarchy { code: None });
        assert_eq!(parse_args(&words("-h")).unwrap().command, Command::Help);
    }

    #[test]
    fn signup_flags_attach_to_signup_only() {
        let inv = parse_args(&words("signup M1 pw --email a@b.org --last-name Obi")).unwrap();
        assert_eq!(inv.command, Command::Signup {
            username: "M1".into(), password: "pw".into(),
            email: Some("a@b.org".into()), first_name: None, last_name: Some("Obi".into()),
        });
        assert!(parse_args(&words("levels --email a@b.org")).is_err());
    }

    #[test]
    fn rejects_bad_arity_and_unknown_words() {
        assert!(parse_command(&words("select")).is_err());
        assert!(parse_command(&words("levels extra")).is_err());
        assert!(parse_command(&words("pray")).is_err());
        assert!(parse_args(&words("--base-url")).is_err());
        assert!(parse_args(&words("--verbose levels")).is_err());
    }

    #[test]
    fn describes_session_state() {
        assert_eq!(describe_state(&SessionState::signed_out()), "signed out");
        let s = SessionState { signed_in: true, usercode: Some("M1".into()), level: Some("PAR".into()), expires_at: None };
        assert_eq!(describe_state(&s), "signed in as M1, level PAR");
    }
}
