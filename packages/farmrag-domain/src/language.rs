use unicode_script::{Script, UnicodeScript};

/// True only when the text is confidently English prose.
///
/// Postgres ships stemming dictionaries for English but not for Vietnamese, so the lexical
/// channel only uses full-text ranking for queries that pass this check.
pub fn is_confident_english(input: &str) -> bool {
	if !is_latin_only(input) || has_non_ascii_letters(input) {
		return false;
	}

	let Some(info) = whatlang::detect(input) else {
		return false;
	};

	info.lang() == whatlang::Lang::Eng && info.is_reliable()
}

fn is_latin_only(input: &str) -> bool {
	let mut letters = 0usize;

	for ch in input.chars() {
		if !ch.is_alphabetic() {
			continue;
		}

		letters += 1;

		if !matches!(ch.script(), Script::Latin | Script::Common | Script::Inherited) {
			return false;
		}
	}

	letters > 0
}

// Vietnamese is Latin script but always carries diacritics on most words.
fn has_non_ascii_letters(input: &str) -> bool {
	input.chars().any(|ch| ch.is_alphabetic() && !ch.is_ascii())
}
