pub mod auth;
pub mod logging;

use crate::config::{DEFAULT_CORS_ORIGINS, DEFAULT_DB_PATH, DEFAULT_ENVIRONMENT, DEFAULT_HOST};
use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("conduit")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("CONDUIT_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .help("Address to bind")
                .default_value(DEFAULT_HOST)
                .env("CONDUIT_HOST"),
        )
        .arg(
            Arg::new("db-path")
                .short('d')
                .long("db-path")
                .help("SQLite database file, created if missing")
                .default_value(DEFAULT_DB_PATH)
                .env("CONDUIT_DB_PATH"),
        )
        .arg(
            Arg::new("cors-origins")
                .long("cors-origins")
                .help("Comma separated list of allowed origins, or *")
                .default_value(DEFAULT_CORS_ORIGINS)
                .env("CONDUIT_CORS_ORIGINS"),
        )
        .arg(
            Arg::new("env")
                .long("env")
                .help("Deployment environment; production refuses the placeholder JWT secret")
                .default_value(DEFAULT_ENVIRONMENT)
                .env("CONDUIT_ENV"),
        );

    let command = auth::with_args(command);
    logging::with_args(command)
}
