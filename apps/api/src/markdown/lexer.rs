/// One classified input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Heading { level: usize, text: &'a str },
    Bullet(&'a str),
    Text(&'a str),
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based.
    pub number: usize,
    /// The line with surrounding whitespace removed, markers included.
    pub raw: &'a str,
    pub token: Token<'a>,
}

/// Splits input into classified lines. Never fails; structure is checked
/// by the parser.
pub fn tokenize(input: &str) -> Vec<Line<'_>> {
    input
        .lines()
        .enumerate()
        .map(|(i, raw)| Line {
            number: i + 1,
            raw: raw.trim(),
            token: classify(raw),
        })
        .collect()
}

fn classify(raw: &str) -> Token<'_> {
    let line = raw.trim();
    if line.is_empty() {
        return Token::Blank;
    }

    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if hashes > 0 {
        let rest = &line[hashes..];
        if rest.is_empty() || rest.starts_with(' ') {
            return Token::Heading {
                level: hashes,
                text: rest.trim(),
            };
        }
    }

    for marker in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Token::Bullet(rest.trim());
        }
    }
    if line == "-" || line == "*" {
        return Token::Bullet("");
    }

    Token::Text(line)
}

/// Splits `Key: value`. Keys are letters and spaces only, so URLs and
/// times inside prose do not match.
pub fn split_field(text: &str) -> Option<(&str, &str)> {
    let (key, value) = text.split_once(':')?;
    let key = key.trim();
    if key.is_empty()
        || value.starts_with("//")
        || !key.chars().all(|c| c.is_ascii_alphabetic() || c == ' ')
    {
        return None;
    }
    Some((key, value.trim()))
}
