//! Output assembly.
//!
//! The writer only decides what to say and where a line could break; an
//! [`Assembler`] decides how that ends up laid out.

/// Column past which the pretty layout wraps at the last break point.
pub const MAX_LINE: usize = 120;

const INDENT: &str = "    ";

pub trait Assembler {
    /// Append text as-is.
    fn token(&mut self, text: &str);

    /// A single separating space, collapsed with neighbors.
    fn space(&mut self);

    /// Clause boundary: a new line in pretty output, a space otherwise.
    fn line(&mut self);

    /// A new line in pretty output, nothing otherwise.
    fn soft_line(&mut self);

    /// A line break in every layout, for statement ends and `--` comments.
    fn hard_line(&mut self);

    fn indent(&mut self);

    fn dedent(&mut self);

    /// Place where a long line may be wrapped.
    fn breakable(&mut self);

    fn finish(self) -> String;
}

fn trim_trailing_spaces(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
}

fn at_line_start(out: &str) -> bool {
    out.is_empty() || out.ends_with('\n')
}

/// One statement per line, single spaces between tokens.
#[derive(Debug, Default)]
pub struct PlainAssembler {
    out: String,
}

impl PlainAssembler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Assembler for PlainAssembler {
    fn token(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn space(&mut self) {
        if !at_line_start(&self.out) && !self.out.ends_with(' ') && !self.out.ends_with('(') {
            self.out.push(' ');
        }
    }

    fn line(&mut self) {
        self.space();
    }

    fn soft_line(&mut self) {}

    fn hard_line(&mut self) {
        trim_trailing_spaces(&mut self.out);
        if !at_line_start(&self.out) {
            self.out.push('\n');
        }
    }

    fn indent(&mut self) {}

    fn dedent(&mut self) {}

    fn breakable(&mut self) {}

    fn finish(mut self) -> String {
        trim_trailing_spaces(&mut self.out);
        while self.out.ends_with('\n') {
            self.out.pop();
        }
        self.out
    }
}

/// Indented output wrapped at [`MAX_LINE`] columns.
#[derive(Debug, Default)]
pub struct PrettyAssembler {
    out: String,
    level: usize,
    /// Byte offset of the current line.
    line_start: usize,
    /// Last break point on the current line and the level in force there.
    break_at: Option<(usize, usize)>,
}

impl PrettyAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    fn column(&self) -> usize {
        self.out[self.line_start..].chars().count()
    }

    fn wrap(&mut self) {
        let Some((at, level)) = self.break_at.take() else {
            return;
        };
        if self.out[self.line_start..at].trim().is_empty() {
            return;
        }
        let rest = self.out.split_off(at);
        trim_trailing_spaces(&mut self.out);
        self.out.push('\n');
        self.line_start = self.out.len();
        self.out.push_str(&INDENT.repeat(level + 1));
        self.out.push_str(rest.trim_start());
    }
}

impl Assembler for PrettyAssembler {
    fn token(&mut self, text: &str) {
        if self.line_start == self.out.len() {
            self.out.push_str(&INDENT.repeat(self.level));
        }
        self.out.push_str(text);
        if let Some(last) = text.rfind('\n') {
            self.line_start = self.out.len() - (text.len() - last - 1);
            self.break_at = None;
        }
        if self.column() > MAX_LINE {
            self.wrap();
        }
    }

    fn space(&mut self) {
        if self.line_start < self.out.len() && !self.out.ends_with(' ') && !self.out.ends_with('(') {
            self.out.push(' ');
        }
    }

    fn line(&mut self) {
        if self.out[self.line_start..].trim().is_empty() {
            return;
        }
        trim_trailing_spaces(&mut self.out);
        self.out.push('\n');
        self.line_start = self.out.len();
        self.break_at = None;
    }

    fn soft_line(&mut self) {
        self.line();
    }

    fn hard_line(&mut self) {
        self.line();
    }

    fn indent(&mut self) {
        self.level += 1;
    }

    fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    fn breakable(&mut self) {
        self.break_at = Some((self.out.len(), self.level));
    }

    fn finish(mut self) -> String {
        let trimmed = self.out.trim_end().len();
        self.out.truncate(trimmed);
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_collapses_layout() {
        let mut out = PlainAssembler::new();
        out.token("SELECT");
        out.space();
        out.space();
        out.token("a");
        out.line();
        out.token("FROM T;");
        out.hard_line();
        out.token("-- note");
        out.hard_line();
        assert_eq!(out.finish(), "SELECT a FROM T;\n-- note");
    }

    #[test]
    fn test_pretty_indents_lines() {
        let mut out = PrettyAssembler::new();
        out.token("BEGIN");
        out.indent();
        out.line();
        out.token("SELECT 1;");
        out.dedent();
        out.line();
        out.line();
        out.token("END;");
        assert_eq!(out.finish(), "BEGIN\n    SELECT 1;\nEND;");
    }

    #[test]
    fn test_pretty_wraps_at_break_point() {
        let mut out = PrettyAssembler::new();
        out.token("SELECT");
        for i in 0..30 {
            out.space();
            out.breakable();
            out.token(&format!("column_{:02},", i));
        }
        let text = out.finish();
        assert!(text.lines().count() > 1);
        assert!(text.lines().all(|line| line.chars().count() <= MAX_LINE));
        assert!(text.lines().nth(1).is_some_and(|line| line.starts_with("    column_")));
    }
}
