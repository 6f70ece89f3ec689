use folio::book::{Book, MemorySource};
use folio::bookmark::Bookmarks;
use folio::event_source::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use folio::main_app::{App, run_app_with_event_source};
use folio::settings::SettingsStore;
use folio::test_utils::test_helpers::{
    TestScenarioBuilder, capture_terminal_state, create_test_terminal, sample_book,
};
use ratatui::layout::Rect;

// 80x20 screen: TOC in columns 0..32, content in 32..80 over rows 0..19,
// status line on row 19. The scrollbar sits in column 79.
const CONTENT_X: u16 = 50;
const SCROLLBAR_X: u16 = 79;

fn reading_app() -> App {
    let mut app = App::new(SettingsStore::ephemeral(), Bookmarks::ephemeral());
    app.set_reading_mode(true);
    app.open_book(sample_book(4, 30));
    app
}

fn run(app: &mut App, scenario: TestScenarioBuilder) {
    let mut terminal = create_test_terminal(80, 20);
    let mut events = scenario.quit().build();
    run_app_with_event_source(&mut terminal, app, &mut events).unwrap();
}

fn click(app: &mut App, button: MouseButton, column: u16, row: u16) {
    app.handle_mouse_event(MouseEvent {
        kind: MouseEventKind::Down(button),
        column,
        row,
        modifiers: KeyModifiers::empty(),
    });
}

#[test]
fn primary_click_turns_forward() {
    let mut app = reading_app();
    run(
        &mut app,
        TestScenarioBuilder::new().click(MouseButton::Left, CONTENT_X, 10),
    );
    assert_eq!(app.session().current_chapter(), 1);
    assert_eq!(app.surface().offset(), 0);
}

#[test]
fn secondary_click_turns_back() {
    let mut app = reading_app();
    run(
        &mut app,
        TestScenarioBuilder::new()
            .next_chapter()
            .next_chapter()
            .click(MouseButton::Right, CONTENT_X, 10),
    );
    assert_eq!(app.session().current_chapter(), 1);
}

#[test]
fn secondary_click_on_first_chapter_stays_put() {
    let mut app = reading_app();
    run(
        &mut app,
        TestScenarioBuilder::new()
            .scroll_down(5)
            .click(MouseButton::Right, CONTENT_X, 10),
    );
    assert_eq!(app.session().current_chapter(), 0);
    assert_eq!(app.surface().offset(), 5);
}

#[test]
fn middle_click_does_nothing() {
    let mut app = reading_app();
    run(
        &mut app,
        TestScenarioBuilder::new().click(MouseButton::Middle, CONTENT_X, 10),
    );
    assert_eq!(app.session().current_chapter(), 0);
}

#[test]
fn clicks_are_ignored_outside_reading_mode() {
    let mut app = App::new(SettingsStore::ephemeral(), Bookmarks::ephemeral());
    app.open_book(sample_book(4, 30));
    run(
        &mut app,
        TestScenarioBuilder::new()
            .click(MouseButton::Left, CONTENT_X, 10)
            .click(MouseButton::Right, CONTENT_X, 10),
    );
    assert_eq!(app.session().current_chapter(), 0);
}

#[test]
fn reading_mode_toggle_enables_clicks() {
    let mut app = App::new(SettingsStore::ephemeral(), Bookmarks::ephemeral());
    app.open_book(sample_book(4, 30));
    run(
        &mut app,
        TestScenarioBuilder::new()
            .toggle_reading_mode()
            .click(MouseButton::Left, CONTENT_X, 10),
    );
    assert!(app.session().reading_mode());
    assert!(app.settings().get().reading_mode);
    assert_eq!(app.session().current_chapter(), 1);
}

#[test]
fn scrollbar_clicks_are_suppressed() {
    let mut app = reading_app();
    run(
        &mut app,
        TestScenarioBuilder::new()
            .click(MouseButton::Left, SCROLLBAR_X, 4)
            .click(MouseButton::Right, SCROLLBAR_X, 12),
    );
    assert_eq!(app.session().current_chapter(), 0);
}

#[test]
fn clicks_in_the_toc_never_turn_pages() {
    let mut app = reading_app();
    run(
        &mut app,
        TestScenarioBuilder::new().click(MouseButton::Right, 10, 3),
    );
    // Row 3 is the third entry: a TOC jump, not a previous-chapter turn.
    assert_eq!(app.session().current_chapter(), 2);
}

#[test]
fn clicks_on_text_inputs_are_suppressed() {
    let mut app = reading_app();
    app.resize(Rect::new(0, 0, 80, 20));
    app.pump();
    app.handle_key_event(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::empty()));
    app.pump();
    assert_eq!(app.session().current_chapter(), 1);
    assert_eq!(app.surface().offset(), 0);

    // Paragraph on row 0, gap on row 1, the input on row 2.
    click(&mut app, MouseButton::Left, CONTENT_X, 2);
    app.pump();
    assert_eq!(app.session().current_chapter(), 1);

    click(&mut app, MouseButton::Left, CONTENT_X, 0);
    app.pump();
    assert_eq!(app.session().current_chapter(), 2);
}

#[test]
fn rapid_clicks_land_two_chapters_ahead_at_the_same_position() {
    let mut app = reading_app();
    run(
        &mut app,
        TestScenarioBuilder::new()
            .scroll_down(10)
            .click(MouseButton::Left, CONTENT_X, 10)
            .click(MouseButton::Left, CONTENT_X, 10),
    );
    assert_eq!(app.session().current_chapter(), 2);
    assert!(!app.session().is_loading());
    assert_eq!(app.surface().max_offset(), 40);
    assert_eq!(app.surface().offset(), 10);
}

#[test]
fn turned_chapter_is_on_screen() {
    let mut app = reading_app();
    let mut terminal = create_test_terminal(80, 20);
    app.resize(Rect::new(0, 0, 80, 20));
    app.pump();
    click(&mut app, MouseButton::Left, CONTENT_X, 10);
    app.pump();
    terminal.draw(|f| app.draw(f)).unwrap();

    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains("Chapter 1 paragraph 0"), "{screen}");
    assert!(!screen.contains("Chapter 0 paragraph 0"), "{screen}");
}

#[test]
fn clicks_on_fields_inside_list_items_are_suppressed() {
    let source = MemorySource::new("Quiz")
        .chapter(
            "q1.xhtml",
            "<body><ul><li>Answer: <input type=\"text\"/></li></ul><p>after</p></body>",
        )
        .chapter("q2.xhtml", "<body><p>next</p></body>");
    let mut app = App::new(SettingsStore::ephemeral(), Bookmarks::ephemeral());
    app.set_reading_mode(true);
    app.open_book(Book::from_source(Box::new(source), "quiz", true));
    app.resize(Rect::new(0, 0, 80, 20));
    app.pump();

    // "• Answer:" on row 0, the input on row 2.
    click(&mut app, MouseButton::Left, CONTENT_X, 2);
    app.pump();
    assert_eq!(app.session().current_chapter(), 0);

    click(&mut app, MouseButton::Left, CONTENT_X, 0);
    app.pump();
    assert_eq!(app.session().current_chapter(), 1);
}

#[test]
fn context_menu_is_prevented_in_every_mode() {
    let mut app = App::new(SettingsStore::ephemeral(), Bookmarks::ephemeral());
    app.open_book(sample_book(4, 30));
    run(
        &mut app,
        TestScenarioBuilder::new()
            .next_chapter()
            .click(MouseButton::Right, CONTENT_X, 10)
            .toggle_reading_mode()
            .click(MouseButton::Right, CONTENT_X, 10),
    );
    assert_eq!(app.context_menus_prevented(), 2);
    // Only the secondary click made in reading mode turned back.
    assert_eq!(app.session().current_chapter(), 0);
}

#[test]
fn keyboard_round_trip_keeps_the_scrolled_position() {
    let mut app = reading_app();
    run(
        &mut app,
        TestScenarioBuilder::new()
            .wheel_down(CONTENT_X, 10)
            .half_screen_down()
            .next_chapter()
            .prev_chapter(),
    );
    assert_eq!(app.session().current_chapter(), 0);
    // Three wheel rows plus half of the 19-row viewport.
    assert_eq!(app.surface().offset(), 12);
}
