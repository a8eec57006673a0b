use std::time::Duration;

use tokio::signal;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid duration '{0}', expected something like 30s, 1m or 1h30m")]
pub struct InvalidDuration(pub String);

/// Parses durations written as a sequence of decimal numbers with a unit
/// suffix (`ns`, `us`/`µs`, `ms`, `s`, `m`, `h`), e.g. `1h30m` or `1.5s`.
pub fn parse_duration(input: &str) -> Result<Duration, InvalidDuration> {
	let invalid = || InvalidDuration(input.to_owned());

	let mut rest = input.trim();
	if rest.is_empty() {
		return Err(invalid());
	}
	if rest == "0" {
		return Ok(Duration::ZERO);
	}

	let mut total = 0f64;
	while !rest.is_empty() {
		let number_len = rest
			.find(|c: char| !(c.is_ascii_digit() || c == '.'))
			.ok_or_else(invalid)?;
		if number_len == 0 {
			return Err(invalid());
		}
		let (number, tail) = rest.split_at(number_len);
		let value = number.parse::<f64>().map_err(|_| invalid())?;

		let unit_len = tail
			.find(|c: char| c.is_ascii_digit() || c == '.')
			.unwrap_or(tail.len());
		let (unit, tail) = tail.split_at(unit_len);
		let nanos_per_unit = match unit {
			"ns" => 1.0,
			"us" | "µs" => 1e3,
			"ms" => 1e6,
			"s" => 1e9,
			"m" => 60.0 * 1e9,
			"h" => 3600.0 * 1e9,
			_ => return Err(invalid()),
		};

		total += value * nanos_per_unit;
		rest = tail;
	}

	#[allow(clippy::cast_precision_loss)]
	let max = u64::MAX as f64;
	if !total.is_finite() || total >= max {
		return Err(invalid());
	}

	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	let nanos = total.round() as u64;
	Ok(Duration::from_nanos(nanos))
}

/// Resolves on Ctrl+C or, on unix, SIGTERM
pub async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(err) = signal::ctrl_c().await {
			tracing::error!(err = %err, "failed to install Ctrl+C handler");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			}
			Err(err) => {
				tracing::error!(err = %err, "failed to install signal handler");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => {},
		() = terminate => {},
	}
}
