//! Phase-based status reporting
//!
//! A [`Reporter`] renders one phase at a time. Messages queued while a phase
//! is open are held back and flushed, in order, under the phase headline when
//! the phase ends. The phase result is derived from the queued message kinds
//! unless the caller picks one explicitly.

use owo_colors::{OwoColorize, Stream};
use std::fmt;
use std::io::Write;

/// Kind of a reported message, also used as a phase result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Success,
    Warning,
    Failure,
}

impl MessageKind {
    pub fn glyph(&self) -> &'static str {
        match self {
            MessageKind::Success => "✓",
            MessageKind::Warning => "⚠",
            MessageKind::Failure => "✗",
        }
    }

    /// Glyph colored for stdout, honouring the global color override
    fn colored_glyph(&self) -> String {
        let glyph = self.glyph();
        match self {
            MessageKind::Success => glyph.if_supports_color(Stream::Stdout, |g| g.green()).to_string(),
            MessageKind::Warning => glyph.if_supports_color(Stream::Stdout, |g| g.yellow()).to_string(),
            MessageKind::Failure => glyph.if_supports_color(Stream::Stdout, |g| g.red()).to_string(),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Success => write!(f, "success"),
            MessageKind::Warning => write!(f, "warning"),
            MessageKind::Failure => write!(f, "failure"),
        }
    }
}

/// A queued message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
}

impl Message {
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Derive a result from message kinds: failure over warning over success
pub fn result_from_messages(messages: &[Message]) -> MessageKind {
    if messages.iter().any(|m| m.kind == MessageKind::Failure) {
        MessageKind::Failure
    } else if messages.iter().any(|m| m.kind == MessageKind::Warning) {
        MessageKind::Warning
    } else {
        MessageKind::Success
    }
}

#[derive(Debug)]
struct Phase {
    label: String,
    pending: Vec<Message>,
}

enum Sink {
    Stdout,
    Buffer(Vec<String>),
}

/// Status reporter shared by every check
pub struct Reporter {
    interactive: bool,
    sink: Sink,
    phase: Option<Phase>,
}

impl Reporter {
    /// Reporter writing to stdout; `interactive` enables colors and in-place headlines
    pub fn new(interactive: bool) -> Self {
        Self {
            interactive,
            sink: Sink::Stdout,
            phase: None,
        }
    }

    /// Reporter recording rendered lines in memory
    pub fn buffered() -> Self {
        Self {
            interactive: false,
            sink: Sink::Buffer(Vec::new()),
            phase: None,
        }
    }

    /// Recording reporter that renders like an interactive terminal
    pub fn buffered_interactive() -> Self {
        Self {
            interactive: true,
            sink: Sink::Buffer(Vec::new()),
            phase: None,
        }
    }

    /// Lines rendered so far (always empty for stdout reporters)
    pub fn lines(&self) -> &[String] {
        match &self.sink {
            Sink::Buffer(lines) => lines,
            Sink::Stdout => &[],
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_some()
    }

    /// Label of the open phase
    pub fn phase_label(&self) -> Option<&str> {
        self.phase.as_ref().map(|p| p.label.as_str())
    }

    /// Messages queued in the open phase
    pub fn pending(&self) -> &[Message] {
        self.phase.as_ref().map(|p| p.pending.as_slice()).unwrap_or(&[])
    }

    /// Open a phase, closing any phase that is still open
    pub fn start(&mut self, label: impl Into<String>) {
        if self.phase.is_some() {
            self.end();
        }
        let label = label.into();
        tracing::debug!(phase = %label, "phase started");

        if self.interactive {
            let bullet = "•".if_supports_color(Stream::Stdout, |b| b.cyan()).to_string();
            self.emit_partial(&format!(" {} {} ...", bullet, label));
        } else {
            self.emit(format!(" • {} ...", label));
        }
        self.phase = Some(Phase {
            label,
            pending: Vec::new(),
        });
    }

    pub fn queue_success(&mut self, text: impl Into<String>) {
        self.queue(MessageKind::Success, text.into());
    }

    pub fn queue_warning(&mut self, text: impl Into<String>) {
        self.queue(MessageKind::Warning, text.into());
    }

    pub fn queue_failure(&mut self, text: impl Into<String>) {
        self.queue(MessageKind::Failure, text.into());
    }

    /// Result the open phase would end with
    pub fn result_from_messages(&self) -> MessageKind {
        result_from_messages(self.pending())
    }

    /// Close the open phase with the result derived from its messages
    pub fn end(&mut self) {
        let result = self.result_from_messages();
        self.end_with(result);
    }

    /// Close the open phase with an explicit result
    pub fn end_with(&mut self, result: MessageKind) {
        let Some(phase) = self.phase.take() else {
            return;
        };
        tracing::debug!(phase = %phase.label, %result, "phase ended");

        let headline = self.render(result, &phase.label);
        if self.interactive {
            // Overwrite the "• label ..." line
            self.emit(format!("\r\x1b[2K{}", headline));
        } else {
            self.emit(headline);
        }
        for message in &phase.pending {
            let line = self.render(message.kind, &message.text);
            self.emit(line);
        }
    }

    pub fn end_with_success(&mut self, text: impl Into<String>) {
        self.queue_success(text);
        self.end_with(MessageKind::Success);
    }

    pub fn end_with_warning(&mut self, text: impl Into<String>) {
        self.queue_warning(text);
        self.end_with(MessageKind::Warning);
    }

    pub fn end_with_failure(&mut self, text: impl Into<String>) {
        self.queue_failure(text);
        self.end_with(MessageKind::Failure);
    }

    /// Print a plain line outside any phase, closing an open phase first
    pub fn print(&mut self, line: impl Into<String>) {
        if self.phase.is_some() {
            self.end();
        }
        let line = line.into();
        if self.interactive && !line.is_empty() {
            self.emit(line.if_supports_color(Stream::Stdout, |l| l.bold()).to_string());
        } else {
            self.emit(line);
        }
    }

    fn queue(&mut self, kind: MessageKind, text: String) {
        if text.is_empty() {
            return;
        }
        match &mut self.phase {
            Some(phase) => phase.pending.push(Message { kind, text }),
            None => {
                // No phase to attach to
                let line = self.render(kind, &text);
                self.emit(line);
            }
        }
    }

    fn render(&self, kind: MessageKind, text: &str) -> String {
        if self.interactive {
            format!(" {} {}", kind.colored_glyph(), text)
        } else {
            format!(" {} {}", kind.glyph(), text)
        }
    }

    fn emit(&mut self, line: String) {
        match &mut self.sink {
            Sink::Stdout => println!("{}", line),
            Sink::Buffer(lines) => lines.push(line),
        }
    }

    fn emit_partial(&mut self, text: &str) {
        match &mut self.sink {
            Sink::Stdout => {
                let mut stdout = std::io::stdout();
                let _ = write!(stdout, "{}", text);
                let _ = stdout.flush();
            }
            Sink::Buffer(lines) => lines.push(text.to_string()),
        }
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        if self.phase.is_some() {
            self.end();
        }
    }
}
