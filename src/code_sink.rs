//! Module with the output abstraction of the code emitter.

/// Receiver of generated scanner text. The emitter only ever appends lines and adjusts the
/// indentation level; the sink decides how the text is stored.
pub trait CodeSink {
    /// Append text to the current line. The first fragment of a line is indented.
    fn print(&mut self, text: &str);

    /// Append text and terminate the line.
    fn println(&mut self, text: &str);

    /// Increase the indentation of subsequent lines by one level.
    fn indent(&mut self);

    /// Decrease the indentation of subsequent lines by one level.
    fn unindent(&mut self);

    /// Terminate the current line.
    fn newline(&mut self) {
        self.println("");
    }

    /// Append the items to the current line, separated by `sep`.
    fn print_joined(&mut self, sep: &str, items: &[String]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.print(sep);
            }
            self.print(item);
        }
    }
}

/// A [`CodeSink`] that collects the generated text in a string, indenting with four spaces per
/// level.
#[derive(Debug, Default)]
pub struct StringSink {
    buffer: String,
    level: usize,
    at_line_start: bool,
}

impl StringSink {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            level: 0,
            at_line_start: true,
        }
    }

    /// The collected text.
    pub fn into_string(self) -> String {
        self.buffer
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    fn pad(&mut self) {
        if self.at_line_start {
            for _ in 0..self.level {
                self.buffer.push_str("    ");
            }
            self.at_line_start = false;
        }
    }
}

impl CodeSink for StringSink {
    fn print(&mut self, text: &str) {
        if !text.is_empty() {
            self.pad();
            self.buffer.push_str(text);
        }
    }

    fn println(&mut self, text: &str) {
        if !text.is_empty() {
            self.pad();
            self.buffer.push_str(text);
        }
        self.buffer.push('\n');
        self.at_line_start = true;
    }

    fn indent(&mut self) {
        self.level += 1;
    }

    fn unindent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }
}
