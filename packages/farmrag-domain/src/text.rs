use unicode_normalization::UnicodeNormalization;

/// Canonical form used for every query before it reaches a search channel.
///
/// Vietnamese diacritics arrive both precomposed and as combining sequences depending on the
/// input method, and trigram similarity treats the two forms as different strings. NFC keeps
/// them comparable with stored chunk text, which is normalised the same way at ingestion.
pub fn normalize_query(input: &str) -> String {
	let normalized: String = input.nfc().collect();
	let mut out = String::with_capacity(normalized.len());
	let mut pending_space = false;

	for ch in normalized.chars() {
		if ch.is_whitespace() {
			pending_space = !out.is_empty();

			continue;
		}
		if ch.is_control() || is_zero_width(ch) {
			continue;
		}
		if pending_space {
			out.push(' ');

			pending_space = false;
		}

		out.push(ch);
	}

	out
}

/// NFC without whitespace folding; chunk text keeps its paragraph structure.
pub fn normalize_document_text(input: &str) -> String {
	input.nfc().filter(|ch| !is_zero_width(*ch)).collect::<String>().trim().to_string()
}

fn is_zero_width(ch: char) -> bool {
	matches!(ch, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}')
}
