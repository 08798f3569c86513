use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget, Wrap},
};

use crate::app::{AuthField, AuthMode};
use crate::ui::{centered, AppView};

const FORM_WIDTH: u16 = 52;

fn label(field: AuthField) -> &'static str {
    match field {
        AuthField::DisplayName => "Display name (optional)",
        AuthField::Email => "Email",
        AuthField::Password => "Password",
    }
}

/// Login / sign-up form.
pub fn render_auth(view: &AppView, area: Rect, buf: &mut Buffer) {
    let form = view.app.auth_form();
    let palette = &view.palette;
    let fields = form.fields();

    let height = 2 + 2 + fields.len() as u16 * 3 + 1 + 3;
    let outer = centered(area, FORM_WIDTH, height);
    let block = Block::bordered()
        .title(Line::from(" FocusWriter ").centered())
        .border_style(palette.muted())
        .title_style(palette.accent());
    let inner = block.inner(outer);
    block.render(outer, buf);

    let mut constraints = vec![Constraint::Length(2)];
    constraints.extend(fields.iter().map(|_| Constraint::Length(3)));
    constraints.push(Constraint::Length(1));
    constraints.push(Constraint::Min(0));
    let rows = Layout::vertical(constraints).split(inner);

    Paragraph::new(form.mode.to_string())
        .style(palette.accent())
        .centered()
        .render(rows[0], buf);

    for (i, field) in fields.iter().enumerate() {
        let focused = *field == form.focus;
        let value = form.value(*field);
        let shown = match field {
            AuthField::Password => "•".repeat(value.chars().count()),
            _ => value.to_string(),
        };

        let mut spans = vec![Span::raw(shown)];
        if focused {
            spans.push(Span::styled("█", Style::new().fg(palette.accent)));
        }

        let border = if focused {
            Style::new().fg(palette.accent)
        } else {
            palette.muted()
        };
        Paragraph::new(Line::from(spans))
            .block(Block::bordered().title(label(*field)).border_style(border))
            .render(rows[i + 1], buf);
    }

    let error_row = rows[fields.len() + 1];
    if let Some(error) = &form.error {
        Paragraph::new(error.as_str())
            .style(Style::new().fg(palette.error).add_modifier(Modifier::BOLD))
            .render(error_row, buf);
    }

    let switch = match form.mode {
        AuthMode::Login => "Ctrl-n: sign up",
        AuthMode::SignUp => "Ctrl-n: log in",
    };
    let hints = vec![
        Line::from("Enter: submit   Tab: next field"),
        Line::from(format!("{switch}   Ctrl-g: local account")),
        Line::from("Esc: quit"),
    ];
    Paragraph::new(hints)
        .style(palette.muted())
        .wrap(Wrap { trim: true })
        .render(rows[fields.len() + 2], buf);
}
