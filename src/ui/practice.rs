use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Padding, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{NoticeKind, Overlay};
use crate::metrics::SessionStats;
use crate::session::{CharState, Phase};
use crate::ui::{library, AppView, Palette, HORIZONTAL_MARGIN, SIDEBAR_WIDTH};

const SHORTCUTS: &str = "^L library  ^O upload  ^T theme  ^B sidebar  ^X log out  Esc quit";

pub fn render_practice(view: &AppView, area: Rect, buf: &mut Buffer) {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(view, header, buf);

    let main = if view.app.is_sidebar_open() {
        let [sidebar, main] =
            Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)]).areas(body);
        render_sidebar(view, sidebar, buf);
        main
    } else {
        body
    };

    render_main(view, main, buf);
    render_notice(view, footer, buf);

    match view.app.overlay() {
        Overlay::None => {}
        Overlay::Library { highlighted } => library::render_library(view, *highlighted, area, buf),
        Overlay::UploadPrompt { path } => library::render_upload_prompt(view, path, area, buf),
    }
}

fn render_header(view: &AppView, area: Rect, buf: &mut Buffer) {
    let user = view.app.current_user().map(|user| user.label()).unwrap_or_default();
    let right = format!("{user}   {SHORTCUTS}");

    let [title, hints] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(right.width() as u16),
    ])
    .horizontal_margin(HORIZONTAL_MARGIN)
    .areas(area);

    Paragraph::new("FocusWriter")
        .style(view.palette.accent())
        .render(title, buf);
    Paragraph::new(right)
        .style(view.palette.muted())
        .right_aligned()
        .render(hints, buf);
}

fn stat_line<'a>(name: &'a str, value: String, palette: &Palette) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{name:<10}"), palette.muted()),
        Span::styled(value, Style::new().add_modifier(Modifier::BOLD)),
    ])
}

fn render_sidebar(view: &AppView, area: Rect, buf: &mut Buffer) {
    let palette = &view.palette;
    let SessionStats {
        wpm,
        accuracy,
        errors,
        page_number,
        page_count,
        ..
    } = view.app.stats(view.now);

    let mut lines = vec![
        stat_line("WPM", wpm.to_string(), palette),
        stat_line("Accuracy", format!("{accuracy}%"), palette),
        stat_line("Errors", errors.to_string(), palette),
        stat_line("Page", format!("{page_number} of {page_count}"), palette),
    ];

    if let Some(text) = view.app.controller().session().selected_text() {
        lines.push(Line::default());
        lines.push(Line::styled(text.title.clone(), palette.accent()));
        lines.push(Line::styled(text.category.to_string(), palette.muted()));
    }
    if view.app.is_uploading() {
        lines.push(Line::default());
        lines.push(Line::styled("Extracting upload...", palette.muted()));
    }

    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::bordered()
                .title(" Stats ")
                .border_style(palette.muted())
                .padding(Padding::horizontal(1)),
        )
        .render(area, buf);
}

fn render_main(view: &AppView, area: Rect, buf: &mut Buffer) {
    let palette = &view.palette;
    let controller = view.app.controller();
    let session = controller.session();

    let Some(text) = session.selected_text() else {
        let message = vec![
            Line::from("Select a text from the library (Ctrl-l)"),
            Line::from("or upload your own (Ctrl-o)"),
        ];
        Paragraph::new(message)
            .style(palette.muted())
            .centered()
            .wrap(Wrap { trim: true })
            .render(crate::ui::centered(area, area.width, 2), buf);
        return;
    };

    let [reference, input, status] = Layout::vertical([
        Constraint::Percentage(55),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .horizontal_margin(HORIZONTAL_MARGIN)
    .areas(area);

    let page_label = format!(
        " Page {} of {} ",
        session.current_page_index() + 1,
        session.page_count().max(1)
    );
    Paragraph::new(reference_lines(&controller.char_states(), palette))
        .wrap(Wrap { trim: false })
        .block(
            Block::bordered()
                .title(format!(" {} ", text.title))
                .title(Line::from(page_label).right_aligned())
                .border_style(palette.muted())
                .padding(Padding::horizontal(1)),
        )
        .render(reference, buf);

    let typed = session.user_input().chars().count();
    let page_chars = session.current_page().chars().count();
    let mut input_lines: Vec<Line> = session.user_input().split('\n').map(Line::from).collect();
    if let Some(last) = input_lines.last_mut() {
        last.push_span(Span::styled("▏", Style::new().fg(palette.accent)));
    }
    Paragraph::new(input_lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::bordered()
                .title(" Type here ")
                .title_bottom(Line::from(format!(" Characters {typed} / {page_chars} ")).right_aligned())
                .border_style(palette.muted())
                .padding(Padding::horizontal(1)),
        )
        .render(input, buf);

    let (message, style) = match controller.phase() {
        Phase::PageComplete(_) => (
            "Page Completed! Moving to the next page...",
            Style::new().fg(palette.correct).add_modifier(Modifier::BOLD),
        ),
        Phase::AllComplete => (
            "All Completed! Pick another text from the library.",
            Style::new().fg(palette.correct).add_modifier(Modifier::BOLD),
        ),
        Phase::Typing(_) | Phase::NoSelection => ("PgUp/PgDn: change page", palette.muted()),
    };
    Paragraph::new(message).style(style).render(status, buf);
}

/// Page text styled char by char. Newlines break the line; a typed or
/// current newline is drawn as a return symbol so it can be seen.
pub(crate) fn reference_lines(states: &[(char, CharState)], palette: &Palette) -> Vec<Line<'static>> {
    let correct = Style::new().fg(palette.correct);
    let incorrect = Style::new()
        .fg(palette.background)
        .bg(palette.incorrect);
    let cursor = Style::new().add_modifier(Modifier::UNDERLINED | Modifier::BOLD);
    let pending = palette.muted();

    let mut lines = Vec::new();
    let mut spans = Vec::new();

    for &(c, state) in states {
        let style = match state {
            CharState::Correct => correct,
            CharState::Incorrect => incorrect,
            CharState::Cursor => cursor,
            CharState::Pending => pending,
        };

        if c == '\n' {
            if state != CharState::Pending {
                spans.push(Span::styled("⏎", style));
            }
            lines.push(Line::from(std::mem::take(&mut spans)));
            continue;
        }

        let symbol = match (c, state) {
            (' ', CharState::Incorrect) => '·',
            _ => c,
        };
        spans.push(Span::styled(symbol.to_string(), style));
    }
    lines.push(Line::from(spans));

    lines
}

fn render_notice(view: &AppView, area: Rect, buf: &mut Buffer) {
    let Some(notice) = view.app.notice() else {
        return;
    };
    let style = match notice.kind {
        NoticeKind::Info => Style::new().fg(view.palette.accent),
        NoticeKind::Error => Style::new().fg(view.palette.error).add_modifier(Modifier::BOLD),
    };

    let [line] = Layout::horizontal([Constraint::Min(0)])
        .horizontal_margin(HORIZONTAL_MARGIN)
        .areas(area);
    Paragraph::new(notice.message.as_str())
        .style(style)
        .render(line, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_reference_lines_split_on_newline() {
        let states = vec![
            ('a', CharState::Correct),
            ('\n', CharState::Cursor),
            ('b', CharState::Pending),
        ];

        let lines = reference_lines(&states, &Palette::LIGHT);
        assert_eq!(lines.len(), 2);
        assert_eq!(text_of(&lines[0]), "a⏎");
        assert_eq!(text_of(&lines[1]), "b");
    }

    #[test]
    fn test_pending_newline_is_invisible() {
        let states = vec![('a', CharState::Cursor), ('\n', CharState::Pending)];

        let lines = reference_lines(&states, &Palette::DARK);
        assert_eq!(text_of(&lines[0]), "a");
        assert_eq!(text_of(&lines[1]), "");
    }

    #[test]
    fn test_mistyped_space_is_visible() {
        let states = vec![(' ', CharState::Incorrect), ('x', CharState::Cursor)];

        let lines = reference_lines(&states, &Palette::LIGHT);
        assert_eq!(text_of(&lines[0]), "·x");
        assert_eq!(lines[0].spans[0].style.bg, Some(Palette::LIGHT.incorrect));
    }
}
