use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, List, ListState, Padding, Paragraph, StatefulWidget, Widget},
};

use crate::extract::SUPPORTED_EXTENSIONS;
use crate::library::Category;
use crate::ui::{centered, AppView};

const POPUP_WIDTH: u16 = 64;

/// Popup listing every text, defaults first.
pub fn render_library(view: &AppView, highlighted: usize, area: Rect, buf: &mut Buffer) {
    let palette = &view.palette;
    let library = view.app.library();
    let selected_id = view
        .app
        .controller()
        .session()
        .selected_text()
        .map(|text| &text.id);

    let popup = centered(area, POPUP_WIDTH, library.len() as u16 + 4);
    Clear.render(popup, buf);

    let items: Vec<Line> = library
        .texts()
        .map(|text| {
            let marker = if Some(&text.id) == selected_id { "● " } else { "  " };
            let category_style = match text.category {
                Category::Uploaded => Style::new().fg(palette.accent),
                _ => palette.muted(),
            };
            Line::from(vec![
                Span::raw(marker),
                Span::raw(text.title.clone()),
                Span::raw("  "),
                Span::styled(text.category.to_string(), category_style),
            ])
        })
        .collect();

    let list = List::new(items)
        .style(palette.base())
        .highlight_style(Style::new().add_modifier(Modifier::REVERSED))
        .block(
            Block::bordered()
                .title(" Library ")
                .title_bottom(Line::from(" Enter select  Del delete  Esc close ").centered())
                .border_style(Style::new().fg(palette.accent))
                .padding(Padding::horizontal(1)),
        );

    let mut state = ListState::default().with_selected(Some(highlighted));
    StatefulWidget::render(list, popup, buf, &mut state);
}

/// Popup asking for the path of a document to upload.
pub fn render_upload_prompt(view: &AppView, path: &str, area: Rect, buf: &mut Buffer) {
    let palette = &view.palette;
    let popup = centered(area, POPUP_WIDTH, 6);
    Clear.render(popup, buf);

    let block = Block::bordered()
        .title(" Upload a file ")
        .title_bottom(Line::from(" Enter upload  Esc cancel ").centered())
        .border_style(Style::new().fg(palette.accent))
        .padding(Padding::horizontal(1))
        .style(palette.base());
    let inner = block.inner(popup);
    block.render(popup, buf);

    let [formats, input] =
        Layout::vertical([Constraint::Length(2), Constraint::Length(1)]).areas(inner);

    Paragraph::new(format!("Formats: {}", SUPPORTED_EXTENSIONS.join(", ")))
        .style(palette.muted())
        .render(formats, buf);
    Paragraph::new(Line::from(vec![
        Span::styled("> ", palette.accent()),
        Span::raw(path),
        Span::styled("▏", Style::new().fg(palette.accent)),
    ]))
    .render(input, buf);
}
