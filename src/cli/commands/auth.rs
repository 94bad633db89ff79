use crate::config::{DEFAULT_BCRYPT_COST, DEFAULT_JWT_EXPIRY_HOURS};
use clap::{Arg, Command};

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_JWT_EXPIRY_HOURS: &str = "jwt-expiry-hours";
pub const ARG_BCRYPT_COST: &str = "bcrypt-cost";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("HMAC secret used to sign tokens")
                .long_help(
                    "HMAC secret used to sign tokens. A development placeholder is used when unset, which is refused with --env production.",
                )
                .env("CONDUIT_JWT_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_JWT_EXPIRY_HOURS)
                .long(ARG_JWT_EXPIRY_HOURS)
                .help("Token lifetime in hours")
                .default_value(DEFAULT_JWT_EXPIRY_HOURS.to_string())
                .env("CONDUIT_JWT_EXPIRY_HOURS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_BCRYPT_COST)
                .long(ARG_BCRYPT_COST)
                .help("bcrypt work factor for password hashes")
                .default_value(DEFAULT_BCRYPT_COST.to_string())
                .env("CONDUIT_BCRYPT_COST")
                .value_parser(clap::value_parser!(u32).range(4..=31)),
        )
}
