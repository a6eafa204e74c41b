use crate::format::escape_html;

// Token-pair budget for the LCS table; larger inputs fall back to a
// whole-text replacement.
const MAX_TABLE_CELLS: usize = 4_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Keep,
    Remove,
    Insert,
}

/// Split text into alternating runs of whitespace and non-whitespace so
/// the rendered diff reproduces the original spacing.
fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;

    for (idx, ch) in text.char_indices() {
        let is_space = ch.is_whitespace();
        if in_space.is_some_and(|prev| prev != is_space) {
            tokens.push(&text[start..idx]);
            start = idx;
        }
        in_space = Some(is_space);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

fn diff_tokens<'a>(old: &[&'a str], new: &[&'a str]) -> Vec<(Op, &'a str)> {
    let (n, m) = (old.len(), new.len());

    if n.saturating_mul(m) > MAX_TABLE_CELLS {
        return old
            .iter()
            .map(|t| (Op::Remove, *t))
            .chain(new.iter().map(|t| (Op::Insert, *t)))
            .collect();
    }

    // lcs[i][j] = LCS length of old[i..] and new[j..]
    let mut lcs = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if old[i] == new[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            ops.push((Op::Keep, old[i]));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            ops.push((Op::Remove, old[i]));
            i += 1;
        } else {
            ops.push((Op::Insert, new[j]));
            j += 1;
        }
    }
    ops.extend(old[i..].iter().map(|t| (Op::Remove, *t)));
    ops.extend(new[j..].iter().map(|t| (Op::Insert, *t)));
    ops
}

/// Render an inline HTML diff: removed text struck through, inserted
/// text in bold, everything escaped.
pub fn render_diff(original: &str, edited: &str) -> String {
    let old = tokenize(original);
    let new = tokenize(edited);

    let mut out = String::new();
    let mut run_op: Option<Op> = None;
    let mut run = String::new();

    let flush = |op: Option<Op>, run: &mut String, out: &mut String| {
        if run.is_empty() {
            return;
        }
        let escaped = escape_html(run);
        match op {
            Some(Op::Remove) => out.push_str(&format!("<s>{}</s>", escaped)),
            Some(Op::Insert) => out.push_str(&format!("<b>{}</b>", escaped)),
            _ => out.push_str(&escaped),
        }
        run.clear();
    };

    for (op, token) in diff_tokens(&old, &new) {
        if run_op != Some(op) {
            flush(run_op, &mut run, &mut out);
            run_op = Some(op);
        }
        run.push_str(token);
    }
    flush(run_op, &mut run, &mut out);

    out
}
