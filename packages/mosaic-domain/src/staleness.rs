//! Decides whether a session's derived summary metadata is due for
//! regeneration. The watermark is `generated_at`: metadata is stale when it
//! predates the session's most recent activity.

use time::{Duration, OffsetDateTime};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Freshness {
	/// Recently active, or the summary already covers the latest activity.
	Fresh,
	/// Quiet long enough and the summary lags the last activity.
	NeedsRegeneration,
	/// Imported archives are discoverable but never auto-processed.
	Locked,
}

pub fn classify(
	last_active_at: OffsetDateTime,
	metadata_generated_at: Option<OffsetDateTime>,
	imported: bool,
	now: OffsetDateTime,
	inactivity: Duration,
) -> Freshness {
	if imported {
		return Freshness::Locked;
	}
	if now - last_active_at < inactivity {
		return Freshness::Fresh;
	}

	match metadata_generated_at {
		None => Freshness::NeedsRegeneration,
		Some(generated_at) if generated_at < last_active_at => Freshness::NeedsRegeneration,
		Some(_) => Freshness::Fresh,
	}
}
