//! Fence-character selection.
//!
//! A value may itself contain fenced content; naive ``` reuse would let the
//! value close its own fence early. The serializer therefore scans the value
//! and picks whichever fence character has the smaller maximum line-start
//! run, one longer than that run (minimum three).

/// Longest run of `ch` at the start of a line, over all lines that CommonMark
/// would not already treat as indented code (4+ leading spaces).
fn max_line_start_run(value: &str, ch: char) -> usize {
    let mut max_run = 0;
    for line in value.lines() {
        let leading_spaces = line.chars().take_while(|c| *c == ' ').count();
        if leading_spaces >= 4 {
            continue;
        }
        let run = line[leading_spaces..].chars().take_while(|c| *c == ch).count();
        max_run = max_run.max(run);
    }
    max_run
}

/// Pick the fence string (e.g. ```` ``` ```` or `~~~~`) for a value.
pub fn select_fence(value: &str) -> String {
    let backticks = max_line_start_run(value, '`');
    let tildes = max_line_start_run(value, '~');
    // Tie prefers backticks.
    let (ch, run) = if tildes < backticks {
        ('~', tildes)
    } else {
        ('`', backticks)
    };
    let length = (run + 1).max(3);
    std::iter::repeat_n(ch, length).collect()
}
