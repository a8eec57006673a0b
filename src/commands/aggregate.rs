use async_trait::async_trait;

use super::{Handler, required_arg};
use crate::{
	config::Ressources,
	error::{CommandError, CommandResult},
	fetcher::Fetcher,
	scheduler::Aggregator,
	utils::{parse_duration, shutdown_signal},
};

/// Runs the aggregator until the process is asked to stop
pub struct Aggregate;

#[async_trait]
impl Handler for Aggregate {
	async fn run(&self, ressources: &mut Ressources, args: &[String]) -> CommandResult {
		let raw = required_arg(args, "agg <time between requests, e.g. 1s, 1m, 1h>")?;
		let interval =
			parse_duration(raw).map_err(|err| CommandError::InvalidArgument(err.to_string()))?;

		let aggregator = Aggregator::new(ressources.store.clone(), Fetcher::new()?, interval)?;

		println!("Collecting feeds every {:?}", aggregator.interval());
		aggregator.run(shutdown_signal()).await;

		Ok(())
	}
}
