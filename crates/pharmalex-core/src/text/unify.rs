/// Canonical list separator between ingredient tokens.
pub const LIST_SEPARATOR: char = '·';

const OPEN_BRACKETS: &[char] = &[
    '（', '［', '｛', '{', '[', '【', '〔', '「', '『', '｢', '〈', '《',
];
const CLOSE_BRACKETS: &[char] = &[
    '）', '］', '｝', '}', ']', '】', '〕', '」', '』', '｣', '〉', '》',
];
const MIDDLE_DOTS: &[char] = &['ᆞ', 'ㆍ', '•', '・'];

fn map_char(ch: char, out: &mut String) {
    match ch {
        '\u{feff}' => {}
        '→' => out.push_str("->"),
        '，' => out.push(','),
        c if OPEN_BRACKETS.contains(&c) => out.push('('),
        c if CLOSE_BRACKETS.contains(&c) => out.push(')'),
        c if MIDDLE_DOTS.contains(&c) => out.push(LIST_SEPARATOR),
        c => out.push(c),
    }
}

/// Brings a raw field into normalized form: ASCII parentheses only, one list
/// separator, single spaces, no byte-order mark, `→` spelled as `->`.
///
/// Blank input yields an empty string.
pub fn unify(raw: &str) -> String {
    let mut mapped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        map_char(ch, &mut mapped);
    }

    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True for the precomposed Hangul syllable block.
pub fn is_hangul(ch: char) -> bool {
    ('가'..='힣').contains(&ch)
}

pub fn has_hangul(s: &str) -> bool {
    s.chars().any(is_hangul)
}

pub fn has_latin(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_alphabetic())
}
