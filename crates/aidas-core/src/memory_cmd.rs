//! Memory-command recognition for Lithuanian "remember" phrases.
//!
//! Detection works on a diacritic-folded, lowercased copy of the input;
//! content extraction re-scans the original message so stored memory keeps
//! its casing and diacritics. A trigger only counts at the start of the
//! message, optionally followed by a space or comma.

/// Trigger phrases, already in folded (lowercase ASCII) form.
pub const MEMORY_TRIGGERS: &[&str] = &[
    "prisimink",
    "prisiminti",
    "isimink",
    "isiminti",
    "issaugok",
    "issaugoti",
    "isirasyk",
    "irasik",
    "atsimink",
    "uzfiksuok",
    "turek omenyje",
    "atmink",
];

/// Lowercase and fold Lithuanian diacritics to ASCII.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'ą' => 'a',
            'č' => 'c',
            'ę' | 'ė' => 'e',
            'į' => 'i',
            'š' => 's',
            'ų' | 'ū' => 'u',
            'ž' => 'z',
            other => other,
        })
        .collect()
}

/// Whether the message is an instruction to append to persistent memory.
pub fn is_memory_command(message: &str) -> bool {
    let cleaned = fold(message.trim());
    MEMORY_TRIGGERS.iter().any(|trigger| {
        cleaned == *trigger
            || cleaned.starts_with(&format!("{} ", trigger))
            || cleaned.starts_with(&format!("{},", trigger))
    })
}

/// Extract the content to remember, preserving original casing/diacritics.
///
/// Finds the matched trigger on the folded copy, then walks the original
/// words (folding each for comparison) to locate the first word past the
/// trigger. Returns the original message unchanged when no word position
/// can be found.
pub fn extract_memory_content(message: &str) -> String {
    let trimmed = message.trim();
    let folded = fold(trimmed);

    let found_trigger = match MEMORY_TRIGGERS.iter().find(|t| folded.starts_with(**t)) {
        Some(t) => t,
        None => return message.to_string(),
    };

    let original_words: Vec<&str> = trimmed.split_whitespace().collect();
    let trigger_words: Vec<&str> = found_trigger.split_whitespace().collect();

    let mut start_index = None;
    if original_words.len() >= trigger_words.len() {
        for i in 0..=original_words.len() - trigger_words.len() {
            let matches = trigger_words
                .iter()
                .enumerate()
                .all(|(j, tw)| fold(original_words[i + j]).trim_end_matches(',') == *tw);
            if matches {
                start_index = Some(i + trigger_words.len());
                break;
            }
        }
    }

    match start_index {
        Some(idx) => original_words[idx..].join(" ").trim().to_string(),
        None => message.to_string(),
    }
}
