//! Kana classification and normalization for the word-chain rules.
//!
//! Words are accepted in hiragana or katakana (plus the long-vowel mark `ー`)
//! and normalized to hiragana before any rule runs. The chaining rule is
//! defined by [`first_char`] and [`last_char`]: the next word must begin with
//! the last meaningful character of the previous one.

/// Maps small kana to their normal-sized equivalents.
fn normalize_small_kana(c: char) -> char {
    match c {
        'ゃ' => 'や',
        'ゅ' => 'ゆ',
        'ょ' => 'よ',
        'ぁ' => 'あ',
        'ぃ' => 'い',
        'ぅ' => 'う',
        'ぇ' => 'え',
        'ぉ' => 'お',
        'っ' => 'つ',
        'ゎ' => 'わ',
        other => other,
    }
}

/// Returns the vowel-row character for a hiragana rune, used to resolve the
/// long-vowel mark `ー`.
fn vowel_for_hiragana(c: char) -> Option<char> {
    let vowel = match c {
        // a-row
        'あ' | 'か' | 'さ' | 'た' | 'な' | 'は' | 'ま' | 'や' | 'ら' | 'わ' | 'が' | 'ざ'
        | 'だ' | 'ば' | 'ぱ' => 'あ',
        // i-row
        'い' | 'き' | 'し' | 'ち' | 'に' | 'ひ' | 'み' | 'り' | 'ゐ' | 'ぎ' | 'じ' | 'ぢ'
        | 'び' | 'ぴ' => 'い',
        // u-row
        'う' | 'く' | 'す' | 'つ' | 'ぬ' | 'ふ' | 'む' | 'ゆ' | 'る' | 'ぐ' | 'ず' | 'づ'
        | 'ぶ' | 'ぷ' => 'う',
        // e-row
        'え' | 'け' | 'せ' | 'て' | 'ね' | 'へ' | 'め' | 'れ' | 'ゑ' | 'げ' | 'ぜ' | 'で'
        | 'べ' | 'ぺ' => 'え',
        // o-row
        'お' | 'こ' | 'そ' | 'と' | 'の' | 'ほ' | 'も' | 'よ' | 'ろ' | 'を' | 'ご' | 'ぞ'
        | 'ど' | 'ぼ' | 'ぽ' => 'お',
        'ん' => 'ん',
        _ => return None,
    };
    Some(vowel)
}

/// Converts a single katakana rune to hiragana; other runes pass through.
fn katakana_to_hiragana(c: char) -> char {
    match c {
        '\u{30A1}'..='\u{30F6}' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
        other => other,
    }
}

/// Converts an entire string from katakana to hiragana.
/// Non-katakana characters are left unchanged.
pub fn to_hiragana(s: &str) -> String {
    s.chars().map(katakana_to_hiragana).collect()
}

fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

fn is_katakana(c: char) -> bool {
    ('\u{30A0}'..='\u{30FF}').contains(&c)
}

fn is_long_vowel_mark(c: char) -> bool {
    c == 'ー'
}

/// True if the string is non-empty and contains only hiragana, katakana, or
/// long-vowel marks. Kanji is not allowed in this game.
pub fn is_japanese(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| is_hiragana(c) || is_katakana(c) || is_long_vowel_mark(c))
}

/// Returns the last meaningful hiragana character of a word, resolving a
/// trailing `ー` via the vowel of the preceding character and normalizing
/// small kana. The input must already be in hiragana.
pub fn last_char(hiragana: &str) -> Option<char> {
    let runes: Vec<char> = hiragana.chars().collect();
    if runes.is_empty() {
        return None;
    }

    for i in (0..runes.len()).rev() {
        let c = runes[i];
        if is_long_vowel_mark(c) {
            if i > 0 {
                let prev = normalize_small_kana(runes[i - 1]);
                if let Some(v) = vowel_for_hiragana(prev) {
                    return Some(v);
                }
            }
            continue;
        }
        return Some(normalize_small_kana(c));
    }

    runes.last().copied().map(normalize_small_kana)
}

/// Returns the first character of a word, with small kana normalized.
/// The input must already be in hiragana.
pub fn first_char(hiragana: &str) -> Option<char> {
    hiragana.chars().next().map(normalize_small_kana)
}

/// Number of characters (runes) in a string.
pub fn char_count(s: &str) -> usize {
    s.chars().count()
}

/// The ten kana rows and their member characters. Dakuten and handakuten
/// variants share a row with their base character; `ん` belongs to `わ行`.
const KANA_ROWS: &[(&str, &str)] = &[
    ("あ行", "あいうえおぁぃぅぇぉ"),
    ("か行", "かきくけこがぎぐげご"),
    ("さ行", "さしすせそざじずぜぞ"),
    ("た行", "たちつてとだぢづでどっ"),
    ("な行", "なにぬねの"),
    ("は行", "はひふへほばびぶべぼぱぴぷぺぽ"),
    ("ま行", "まみむめも"),
    ("や行", "やゆよゃゅょ"),
    ("ら行", "らりるれろ"),
    ("わ行", "わをんゎゐゑ"),
];

const DAKUTEN_CHARS: &str = "がぎぐげござじずぜぞだぢづでどばびぶべぼ";
const HANDAKUTEN_CHARS: &str = "ぱぴぷぺぽ";

/// The row labels, in syllabary order.
pub fn kana_row_names() -> Vec<String> {
    KANA_ROWS.iter().map(|(name, _)| name.to_string()).collect()
}

/// The row a hiragana character belongs to, if known.
pub fn row_of(c: char) -> Option<&'static str> {
    KANA_ROWS
        .iter()
        .find(|(_, members)| members.contains(c))
        .map(|(name, _)| *name)
}

/// Returns the first character that falls outside the allowed rows, along
/// with its row label. The long-vowel mark and characters with no known row
/// are skipped. `None` means every character is allowed.
pub fn validate_allowed_rows(hiragana: &str, allowed: &[String]) -> Option<(char, &'static str)> {
    if allowed.is_empty() {
        return None;
    }
    for c in hiragana.chars() {
        if is_long_vowel_mark(c) {
            continue;
        }
        if let Some(row) = row_of(c) {
            if !allowed.iter().any(|a| a == row) {
                return Some((c, row));
            }
        }
    }
    None
}

/// Returns the first dakuten/handakuten character, if any.
pub fn validate_no_dakuten(hiragana: &str) -> Option<char> {
    hiragana
        .chars()
        .find(|c| DAKUTEN_CHARS.contains(*c) || HANDAKUTEN_CHARS.contains(*c))
}
