//! Word-window chunking for document indexing.
//!
//! Short documents become a single chunk so the embedding count stays
//! proportional to real size. Longer documents are cut into fixed-size word
//! windows that overlap, so a concept spanning a window boundary is still
//! visible to retrieval.

#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	pub window_words: usize,
	pub overlap_words: usize,
	pub small_doc_words: usize,
}

#[derive(Clone, Debug)]
pub struct Chunk {
	pub chunk_index: i32,
	pub text: String,
}

pub fn split_text(text: &str, cfg: &ChunkingConfig) -> Vec<Chunk> {
	let words: Vec<&str> = text.split_whitespace().collect();

	if words.is_empty() {
		return Vec::new();
	}
	if words.len() < cfg.small_doc_words {
		return vec![Chunk { chunk_index: 0, text: text.trim().to_string() }];
	}

	let step = cfg.window_words.saturating_sub(cfg.overlap_words).max(1);
	let mut chunks = Vec::new();
	let mut start = 0_usize;
	let mut chunk_index = 0_i32;

	loop {
		let end = (start + cfg.window_words).min(words.len());

		chunks.push(Chunk { chunk_index, text: words[start..end].join(" ") });

		if end >= words.len() {
			break;
		}

		chunk_index += 1;
		start += step;
	}

	chunks
}

#[cfg(test)]
mod tests {
	use super::*;

	fn cfg() -> ChunkingConfig {
		ChunkingConfig { window_words: 500, overlap_words: 75, small_doc_words: 600 }
	}

	fn numbered_words(count: usize) -> String {
		(0..count).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
	}

	#[test]
	fn short_document_is_a_single_trimmed_chunk() {
		let text = format!("  {}  ", numbered_words(599));
		let chunks = split_text(&text, &cfg());

		assert_eq!(chunks.len(), 1);
		assert_eq!(chunks[0].chunk_index, 0);
		assert_eq!(chunks[0].text, numbered_words(599));
	}

	#[test]
	fn empty_and_whitespace_input_yield_no_chunks() {
		assert!(split_text("", &cfg()).is_empty());
		assert!(split_text("   \n\t  ", &cfg()).is_empty());
	}

	#[test]
	fn threshold_document_splits_with_overlap() {
		let text = numbered_words(600);
		let chunks = split_text(&text, &cfg());

		assert_eq!(chunks.len(), 2);

		let first: Vec<&str> = chunks[0].text.split_whitespace().collect();
		let second: Vec<&str> = chunks[1].text.split_whitespace().collect();

		assert_eq!(first.len(), 500);
		assert_eq!(second.len(), 175);
		assert_eq!(&first[425..], &second[..75]);
	}

	#[test]
	fn every_word_is_covered_and_indices_are_contiguous() {
		let total = 1_300_usize;
		let text = numbered_words(total);
		let chunks = split_text(&text, &cfg());
		let mut covered = vec![false; total];

		for (position, chunk) in chunks.iter().enumerate() {
			assert_eq!(chunk.chunk_index, position as i32);

			for word in chunk.text.split_whitespace() {
				let index: usize = word[1..].parse().expect("Expected a numbered word.");

				covered[index] = true;
			}
		}

		assert!(covered.iter().all(|seen| *seen));
		assert_eq!(chunks.len(), 3);
	}

	#[test]
	fn adjacent_chunks_overlap_by_exactly_the_configured_words() {
		let text = numbered_words(1_300);
		let chunks = split_text(&text, &cfg());

		for pair in chunks.windows(2) {
			let left: Vec<&str> = pair[0].text.split_whitespace().collect();
			let right: Vec<&str> = pair[1].text.split_whitespace().collect();
			let tail = &left[left.len() - 75..];

			assert_eq!(tail, &right[..75]);
		}
	}

	#[test]
	fn final_chunk_may_be_shorter_than_the_window() {
		let chunks = split_text(&numbered_words(1_300), &cfg());
		let last: Vec<&str> = chunks.last().expect("Expected chunks.").text.split_whitespace().collect();

		assert_eq!(last.len(), 450);
		assert_eq!(last[449], "w1299");
	}
}
