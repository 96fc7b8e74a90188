//! Indentation-tracking text buffer, grounded on the original
//! implementation's `CCodeBuilder` (`l0_c_emitter.py`).

#[derive(Default)]
pub struct Writer {
    lines: Vec<String>,
    indent_level: usize,
}

const INDENT: &str = "    ";

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    /// Emits one line at the current indentation. An empty string emits a
    /// blank line (no indentation prefix), matching `CCodeBuilder.emit()`'s
    /// `line = ""` short-circuit.
    pub fn emit(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        if line.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{}", INDENT.repeat(self.indent_level), line));
        }
    }

    pub fn emit_blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn emit_raw(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn into_string(self) -> String {
        self.lines.join("\n")
    }
}
