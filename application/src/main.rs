use std::{fmt::Write as _, io, num::NonZeroUsize, sync::OnceLock};

use application::{
    control::lookup::{Msg, Nav, State},
    Args, Config, Control, Service,
};
use service::infra::{postgres, Postgres};
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (!STDERR_LEVELS.contains(meta.level()))
                            && LOG_LEVEL
                                .get()
                                .copied()
                                .unwrap_or(log::Level::INFO)
                                >= *meta.level()
                })),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (STDERR_LEVELS.contains(meta.level()))
                            && LOG_LEVEL
                                .get()
                                .copied()
                                .unwrap_or(log::Level::INFO)
                                >= *meta.level()
                })),
        )
        .init();

    _ = start().await;
}

async fn start() -> Result<(), ()> {
    let Args { config, value } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        lookup,
        postgres,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let postgres_config = postgres.into();
    let mut postgres = Postgres::new(&postgres_config).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;

    migrations::runner()
        .run_async(&mut postgres)
        .await
        .map_err(|e| {
            log::error!("failed to run database migrations: {e}");
        })?;

    let service = Service::new(lookup.into(), postgres);
    let mut control =
        Control::new(service.lookup(), lookup.into(), value, |value| {
            println!("confirmed: {value}");
        });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            () = control.next() => print!("{}", render(control.state())),
            line = lines.next_line() => {
                let Some(line) = line.map_err(|e| {
                    log::error!("failed to read input: {e}");
                })?
                else {
                    break;
                };
                match parse(&line) {
                    Some(Input::Quit) => break,
                    Some(Input::Msg(msg)) => {
                        control.dispatch(msg);
                        print!("{}", render(control.state()));
                    }
                    None => log::warn!("unknown command: `{line}`"),
                }
            }
        }
    }

    control.dispose();
    Ok(())
}

/// Line of the terminal input.
enum Input {
    /// [`Msg`] to the lookup control.
    Msg(Msg),

    /// Exit request.
    Quit,
}

/// Parses the provided input `line`.
fn parse(line: &str) -> Option<Input> {
    let line = line.trim();
    let (cmd, arg) = line.split_once(' ').unwrap_or((line, ""));
    let num = || arg.trim().parse::<usize>().ok();
    let msg = match cmd {
        "search" => Msg::Input(arg.to_owned()),
        "first" => Msg::Navigate(Nav::First),
        "prev" => Msg::Navigate(Nav::Previous),
        "next" => Msg::Navigate(Nav::Next),
        "last" => Msg::Navigate(Nav::Last),
        "page" => Msg::Navigate(Nav::To(num()?)),
        "toggle" => Msg::Toggle(num()?.checked_sub(1)?),
        "all" => Msg::ShowAll,
        "reload" => Msg::Reload,
        "size" => Msg::SetPageSize(NonZeroUsize::new(num()?)?),
        "confirm" => Msg::Confirm,
        "quit" => return Some(Input::Quit),
        _ => return None,
    };
    Some(Input::Msg(msg))
}

/// Renders the provided [`State`] of the lookup control as terminal lines.
fn render(state: &State) -> String {
    let mut out = String::new();
    if let Some(message) = state.message() {
        _ = writeln!(out, "! {message}");
    }
    for (i, (user, selected)) in state.rows().enumerate() {
        _ = writeln!(
            out,
            "[{}] {:>3}. {} <{}>",
            if selected { 'x' } else { ' ' },
            i + 1,
            user.full_name(),
            user.email,
        );
    }
    if let Some(info) = state.info() {
        _ = writeln!(out, "{info}");
    }
    _ = writeln!(out, "selected: {}", state.selection().serialize());
    out
}
