//! Text budgets for synthesis snapshots.
//!
//! Prompt size must stay proportional to the number of sessions selected,
//! not to transcript length, so each session contributes at most a bounded
//! block of its earliest short exchanges.

/// How many of a session's earliest messages are considered at all.
pub const MAX_EXCHANGES: usize = 20;
/// Messages longer than this are not exchanges; they are dumps. Skip them.
pub const SHORT_EXCHANGE_CHARS: usize = 500;
/// Kept messages are cut to this many characters.
pub const EXCHANGE_TRUNCATE_CHARS: usize = 300;
/// Hard cap on the whole exchange block per session.
pub const EXCHANGES_CAP_CHARS: usize = 2_000;

pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
	match text.char_indices().nth(max_chars) {
		Some((index, _)) => &text[..index],
		None => text,
	}
}

/// Builds the bounded "key exchanges" block from `(role, content)` pairs in
/// transcript order.
pub fn bounded_exchanges<'a, I>(messages: I) -> String
where
	I: IntoIterator<Item = (&'a str, &'a str)>,
{
	let mut out = String::new();

	for (role, content) in messages.into_iter().take(MAX_EXCHANGES) {
		let content = content.trim();

		if content.is_empty() || content.chars().count() > SHORT_EXCHANGE_CHARS {
			continue;
		}

		if !out.is_empty() {
			out.push('\n');
		}

		out.push_str(role);
		out.push_str(": ");
		out.push_str(truncate_chars(content, EXCHANGE_TRUNCATE_CHARS));

		if out.chars().count() >= EXCHANGES_CAP_CHARS {
			out = truncate_chars(&out, EXCHANGES_CAP_CHARS).to_string();

			break;
		}
	}

	out
}
