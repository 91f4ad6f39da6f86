use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use sqlcli::logging;
use std::io::{self, Write};

mod cli;

use cli::Cli;

fn prompt_password() -> anyhow::Result<String> {
    print!("Enter password: ");
    io::stdout().flush()?;
    Ok(rpassword::read_password().unwrap_or_default())
}

fn main() -> anyhow::Result<()> {
    let matches = Command::new("sqlcli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("An interactive SQL client with psql-style backslash commands")
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Connect to host")
                .default_value("localhost"),
        )
        .arg(
            Arg::new("port")
                .short('P')
                .long("port")
                .value_name("PORT")
                .help("Port number to use for connection")
                .value_parser(clap::value_parser!(u16))
                .default_value("3306"),
        )
        .arg(
            Arg::new("user")
                .short('u')
                .long("user")
                .value_name("USER")
                .help("User for login")
                .required(true),
        )
        .arg(
            Arg::new("password")
                .short('p')
                .long("password")
                .value_name("PASSWORD")
                .help("Password to use when connecting to server")
                .num_args(0..=1)
                .require_equals(true),
        )
        .arg(
            Arg::new("database")
                .short('D')
                .long("database")
                .value_name("DATABASE")
                .help("Database to use"),
        )
        .arg(
            Arg::new("log-stderr")
                .long("log-stderr")
                .help("Write logs to stderr instead of the log file")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("log-stderr") {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging();
    }

    let host = matches
        .get_one::<String>("host")
        .context("missing --host")?;
    let port = *matches.get_one::<u16>("port").context("missing --port")?;
    let user = matches
        .get_one::<String>("user")
        .context("missing --user")?;

    let password = match matches.get_one::<String>("password") {
        Some(p) => p.clone(),
        None => prompt_password()?,
    };

    let database = matches.get_one::<String>("database").cloned();

    let mut cli = Cli::new(host, port, user, &password, database.as_deref())?;
    cli.run()?;

    Ok(())
}
