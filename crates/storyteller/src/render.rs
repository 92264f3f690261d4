use std::io::{self, Write};

use story_stream::StoryView;

/// Writes a story to a terminal as it grows: the title once, then only the
/// new part of the body on each update.
pub struct StoryPrinter<W: Write> {
    out: W,
    title_printed: bool,
    body_printed: String,
}

impl<W: Write> StoryPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            title_printed: false,
            body_printed: String::new(),
        }
    }

    pub fn update(&mut self, view: &StoryView) -> io::Result<()> {
        if !self.title_printed && !view.title.is_empty() {
            writeln!(self.out, "{}", view.title)?;
            writeln!(self.out, "{}", "=".repeat(view.title.chars().count()))?;
            self.title_printed = true;
        }
        if !self.title_printed {
            return Ok(());
        }

        match view.body.strip_prefix(self.body_printed.as_str()) {
            Some(delta) => write!(self.out, "{delta}")?,
            // A span closed over text already shown; start the body over.
            None => write!(self.out, "\n\n{}", view.body)?,
        }
        self.body_printed.clone_from(&view.body);
        self.out.flush()
    }

    /// Terminate the output with a newline once the story is complete.
    pub fn finish(&mut self, view: &StoryView) -> io::Result<()> {
        if !self.title_printed && !view.body.is_empty() {
            write!(self.out, "{}", view.body)?;
        }
        writeln!(self.out)?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use story_stream::{StoryView, StreamState};

    use super::StoryPrinter;

    fn view(title: &str, body: &str) -> StoryView {
        StoryView {
            title: title.to_string(),
            body: body.to_string(),
            state: StreamState::Streaming,
            ..StoryView::default()
        }
    }

    fn printed(printer: StoryPrinter<Vec<u8>>) -> String {
        String::from_utf8(printer.into_inner()).expect("utf8 output")
    }

    #[test]
    fn title_then_body_deltas() {
        let mut printer = StoryPrinter::new(Vec::new());
        printer.update(&view("", "")).expect("write");
        printer.update(&view("Rex", " Once")).expect("write");
        printer.update(&view("Rex", " Once upon")).expect("write");
        printer.finish(&view("Rex", " Once upon")).expect("write");

        assert_eq!(printed(printer), "Rex\n===\n Once upon\n");
    }

    #[test]
    fn rewritten_body_is_printed_again() {
        let mut printer = StoryPrinter::new(Vec::new());
        printer.update(&view("T", " a [note")).expect("write");
        printer.update(&view("T", " a ")).expect("write");

        assert_eq!(printed(printer), "T\n=\n a [note\n\n a ");
    }

    #[test]
    fn untitled_story_is_printed_on_finish() {
        let mut printer = StoryPrinter::new(Vec::new());
        printer.update(&view("", "plain text")).expect("write");
        printer.finish(&view("", "plain text")).expect("write");

        assert_eq!(printed(printer), "plain text\n");
    }
}
