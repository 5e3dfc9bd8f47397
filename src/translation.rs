use std::borrow::Cow;

/// Bind-parameter style a dialect expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style placeholders like `$1`.
    Dollar,
    /// SQLite-style placeholders: bare `?` or numbered `?1`.
    Question,
}

/// Rewrite the placeholders in `sql` into the `target` style.
///
/// Queries are written with positional placeholders: bare `?`, numbered `?N`, or `$N`.
/// For [`PlaceholderStyle::Dollar`] every bare `?` becomes `$k` where `k` counts bare
/// placeholders from 1, and `?N` becomes `$N`. For [`PlaceholderStyle::Question`] `$N`
/// becomes `?N` and bare `?` is kept.
///
/// Placeholders inside quoted strings, comments, and dollar-quoted bodies are left alone.
/// Returns a borrowed `Cow` when no changes are needed.
#[must_use]
pub fn rebind(sql: &str, target: PlaceholderStyle) -> Cow<'_, str> {
    let mut out: Option<Vec<u8>> = None;
    let mut state = State::Normal;
    let mut idx = 0;
    let mut bare_count = 0usize;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        let mut replaced = false;
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'-' if bytes.get(idx + 1) == Some(&b'-') => {
                    state = State::LineComment;
                    idx += 1;
                    copy_through(&mut out, &bytes[idx - 1..=idx]);
                    idx += 1;
                    continue;
                }
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    state = State::BlockComment(1);
                    idx += 1;
                    copy_through(&mut out, &bytes[idx - 1..=idx]);
                    idx += 1;
                    continue;
                }
                b'$' => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        copy_through(&mut out, &bytes[idx..=advance]);
                        state = State::DollarQuoted(tag);
                        idx = advance + 1;
                        continue;
                    } else if matches!(target, PlaceholderStyle::Question)
                        && let Some((digits_end, digits)) = scan_digits(bytes, idx + 1)
                    {
                        let buf = out.get_or_insert_with(|| bytes[..idx].to_vec());
                        buf.push(b'?');
                        buf.extend_from_slice(digits.as_bytes());
                        idx = digits_end - 1;
                        replaced = true;
                    }
                }
                b'?' if matches!(target, PlaceholderStyle::Dollar) => {
                    let buf = out.get_or_insert_with(|| bytes[..idx].to_vec());
                    buf.push(b'$');
                    if let Some((digits_end, digits)) = scan_digits(bytes, idx + 1) {
                        buf.extend_from_slice(digits.as_bytes());
                        idx = digits_end - 1;
                    } else {
                        bare_count += 1;
                        buf.extend_from_slice(bare_count.to_string().as_bytes());
                    }
                    replaced = true;
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        // escaped quote
                        copy_through(&mut out, &bytes[idx..=idx]);
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        copy_through(&mut out, &bytes[idx..=idx]);
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if b == b'/' && bytes.get(idx + 1) == Some(&b'*') {
                    state = State::BlockComment(depth + 1);
                    copy_through(&mut out, &bytes[idx..=idx]);
                    idx += 1;
                } else if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                    copy_through(&mut out, &bytes[idx..=idx]);
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    let end = idx + tag.len() + 2;
                    copy_through(&mut out, &bytes[idx..end]);
                    state = State::Normal;
                    idx = end;
                    continue;
                }
            }
        }

        if !replaced {
            copy_through(&mut out, &bytes[idx..=idx]);
        }

        idx += 1;
    }

    match out {
        // Only ASCII bytes are ever substituted, so the buffer stays valid UTF-8.
        Some(buf) => Cow::Owned(String::from_utf8_lossy(&buf).into_owned()),
        None => Cow::Borrowed(sql),
    }
}

#[derive(Clone)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

fn copy_through(out: &mut Option<Vec<u8>>, chunk: &[u8]) {
    if let Some(buf) = out {
        buf.extend_from_slice(chunk);
    }
}

fn scan_digits(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    let mut idx = start;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx == start {
        None
    } else {
        std::str::from_utf8(&bytes[start..idx])
            .ok()
            .map(|digits| (idx, digits))
    }
}

/// Returns the tag and the index of the closing `$` of an opening `$tag$`.
fn try_start_dollar_quote(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    // `$1` is a placeholder, never a tag.
    if bytes.get(start + 1).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let mut idx = start + 1;
    while idx < bytes.len() && bytes[idx] != b'$' {
        let b = bytes[idx];
        if !(b.is_ascii_alphanumeric() || b == b'_') {
            return None;
        }
        idx += 1;
    }

    if idx < bytes.len() && bytes[idx] == b'$' {
        let tag = String::from_utf8(bytes[start + 1..idx].to_vec()).ok()?;
        Some((tag, idx))
    } else {
        None
    }
}

fn matches_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let end = idx + 1 + tag.len();
    end < bytes.len()
        && bytes[idx + 1..end] == *tag.as_bytes()
        && bytes.get(end) == Some(&b'$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_question_marks_become_numbered_dollars() {
        let sql = "select * from t where a = ? and b = ?";
        let res = rebind(sql, PlaceholderStyle::Dollar);
        assert_eq!(res, "select * from t where a = $1 and b = $2");
    }

    #[test]
    fn numbered_question_marks_keep_their_index() {
        let sql = "select * from t where a = ?2 and b = ?1";
        let res = rebind(sql, PlaceholderStyle::Dollar);
        assert_eq!(res, "select * from t where a = $2 and b = $1");
    }

    #[test]
    fn dollars_become_question_marks_for_sqlite() {
        let sql = "insert into t values($1, $2)";
        let res = rebind(sql, PlaceholderStyle::Question);
        assert_eq!(res, "insert into t values(?1, ?2)");
    }

    #[test]
    fn bare_question_marks_untouched_for_sqlite() {
        let sql = "insert into t values(?, ?)";
        let res = rebind(sql, PlaceholderStyle::Question);
        assert!(matches!(res, Cow::Borrowed(_)));
    }

    #[test]
    fn skips_inside_literals_and_comments() {
        let sql = "select '?', ? -- ?\n/* ? /* ? */ */ from t where a = ?";
        let res = rebind(sql, PlaceholderStyle::Dollar);
        assert_eq!(res, "select '?', $1 -- ?\n/* ? /* ? */ */ from t where a = $2");
    }

    #[test]
    fn skips_dollar_quoted_blocks() {
        let sql = "$foo$ select $1 from t $foo$ where a = $1";
        let res = rebind(sql, PlaceholderStyle::Question);
        assert_eq!(res, "$foo$ select $1 from t $foo$ where a = ?1");
    }

    #[test]
    fn keeps_escaped_quotes_and_multibyte_text() {
        let sql = "select 'it''s ?', 'žluť' from t where a = ?";
        let res = rebind(sql, PlaceholderStyle::Dollar);
        assert_eq!(res, "select 'it''s ?', 'žluť' from t where a = $1");
    }
}
