pub mod test_helpers {
    use crate::book::{Book, MemorySource, NavEntry};
    use crate::event_source::{Event, KeyCode, KeyModifiers, MouseButton, SimulatedEventSource};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    /// Builder for creating test scenarios with simulated user input
    #[derive(Default)]
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        pub fn press_ctrl_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::ctrl_char_key(c));
            self
        }

        pub fn press(mut self, code: KeyCode) -> Self {
            self.events
                .push(SimulatedEventSource::key_event(code, KeyModifiers::empty()));
            self
        }

        pub fn press_enter(self) -> Self {
            self.press(KeyCode::Enter)
        }

        pub fn press_tab(self) -> Self {
            self.press(KeyCode::Tab)
        }

        /// Scroll down n rows (press 'j' n times)
        pub fn scroll_down(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::char_key('j'));
            }
            self
        }

        pub fn scroll_up(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::char_key('k'));
            }
            self
        }

        pub fn next_chapter(self) -> Self {
            self.press_char('l')
        }

        pub fn prev_chapter(self) -> Self {
            self.press_char('h')
        }

        pub fn half_screen_down(self) -> Self {
            self.press_ctrl_char('d')
        }

        pub fn toggle_reading_mode(self) -> Self {
            self.press_char('m')
        }

        pub fn click(mut self, button: MouseButton, column: u16, row: u16) -> Self {
            self.events
                .push(SimulatedEventSource::mouse_down(button, column, row));
            self
        }

        pub fn wheel_down(mut self, column: u16, row: u16) -> Self {
            self.events
                .push(SimulatedEventSource::scroll_down(column, row));
            self
        }

        pub fn quit(self) -> Self {
            self.press_char('q')
        }

        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// Capture the current terminal buffer as a string
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            lines.push(line.trim_end().to_string());
        }

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        lines.join("\n")
    }

    /// In-memory book with `chapters` chapters of `paragraphs` paragraphs
    /// each. Chapter 1 carries a text input after its first paragraph.
    pub fn sample_book(chapters: usize, paragraphs: usize) -> Book {
        let mut source = MemorySource::new("Test Book");
        for idx in 0..chapters {
            let mut body = String::new();
            for p in 0..paragraphs {
                body.push_str(&format!("<p>Chapter {idx} paragraph {p}</p>"));
                if idx == 1 && p == 0 {
                    body.push_str("<input type=\"text\" placeholder=\"Answer\"/>");
                }
            }
            let path = format!("Text/chapter{idx}.xhtml");
            source = source
                .chapter(&path, &format!("<html><body>{body}</body></html>"))
                .nav(NavEntry::new(format!("Chapter {idx}"), path));
        }
        Book::from_source(Box::new(source), "test-book", true)
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;

    #[test]
    fn test_scenario_builder() {
        let scenario = TestScenarioBuilder::new()
            .scroll_down(2)
            .press_enter()
            .press_tab()
            .scroll_up(1)
            .quit()
            .build();

        assert_eq!(scenario.events.len(), 6);
    }

    #[test]
    fn sample_book_shape() {
        let book = sample_book(3, 5);
        assert_eq!(book.chapter_count(), 3);
        assert_eq!(book.toc().len(), 3);
        assert_eq!(book.toc()[2].chapter, Some(2));
    }
}
