use std::{process::ExitCode, sync::Arc};

use eyre::{OptionExt, WrapErr};
use gator::{
	commands::{Command, Commands},
	config::{Config, Ressources},
	database::PgStore,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

#[tokio::main]
async fn main() -> ExitCode {
	setup_tracing();

	match run().await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			eprintln!("error: {err:#}");
			ExitCode::FAILURE
		}
	}
}

async fn run() -> eyre::Result<()> {
	let config = Config::load_file_from_env().wrap_err("could not load the config")?;
	let commands = Commands::builtin();

	let command =
		Command::from_args(std::env::args().skip(1)).ok_or_eyre("please enter a command")?;

	let store = PgStore::connect(&config.db_url).wrap_err("could not connect to the database")?;
	store.run_migrations()?;

	let mut ressources = Ressources::new(config, Arc::new(store));
	commands.run(&mut ressources, &command).await?;

	Ok(())
}

fn setup_tracing() {
	Registry::default()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn,gator=info".into()))
		.with(
			tracing_subscriber::fmt::layer()
				.with_writer(std::io::stderr)
				.with_file(true)
				.with_line_number(true),
		)
		.init();
}
