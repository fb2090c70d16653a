use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use ava_core::{ChatMessage, ChatRole, Exchange, FailureKind};
use crate::app::App;

const PANEL_WIDTH: u16 = 60;
const PANEL_HEIGHT: u16 = 26;
const INPUT_PLACEHOLDER: &str = "Type a message...";

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_host_page(frame, body_area);

    let launcher_area = launcher_rect(body_area, app.controller.is_open());
    if app.controller.is_open() {
        let panel_area = panel_rect(body_area, launcher_area);
        render_panel(app, frame, panel_area);
    } else {
        app.chat_area = None;
    }
    render_launcher(app, frame, launcher_area);

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Ava ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            app.controller.config().backend_url.clone(),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!(" [{} sent]", app.user_message_count()),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

/// Stand-in for the page the widget is embedded in.
fn render_host_page(frame: &mut Frame, area: Rect) {
    let text = Text::from(vec![
        Line::default(),
        Line::from(Span::styled("Tars Group", Style::default().bold())),
        Line::default(),
        Line::from("Welcome to the Tars Group website. Explore our services."),
        Line::from(Span::styled(
            "Ava is waiting in the bottom right corner.",
            Style::default().fg(Color::DarkGray),
        )),
    ]);

    let page = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(page, area);
}

fn launcher_rect(body: Rect, open: bool) -> Rect {
    let width: u16 = if open { 5 } else { 14 };
    let width = width.min(body.width);
    let height = 3u16.min(body.height);
    Rect {
        x: body.x + body.width.saturating_sub(width + 1),
        y: body.y + body.height.saturating_sub(height),
        width,
        height,
    }
}

fn panel_rect(body: Rect, launcher: Rect) -> Rect {
    let width = PANEL_WIDTH.min(body.width.saturating_sub(2));
    let max_height = launcher.y.saturating_sub(body.y);
    let height = PANEL_HEIGHT.min(max_height);
    Rect {
        x: body.x + body.width.saturating_sub(width + 1),
        y: launcher.y.saturating_sub(height),
        width,
        height,
    }
}

fn render_launcher(app: &App, frame: &mut Frame, area: Rect) {
    let label = if app.controller.is_open() { "✕" } else { "💬 Chat" };
    let button = Paragraph::new(Line::from(label))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White).bold());

    frame.render_widget(Clear, area);
    frame.render_widget(button, area);
}

fn render_panel(app: &mut App, frame: &mut Frame, area: Rect) {
    frame.render_widget(Clear, area);

    let [title_area, chat_area, input_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    let title = Line::from(vec![
        Span::styled(" A ", Style::default().bg(Color::Cyan).fg(Color::Black).bold()),
        Span::styled(" Ava Support", Style::default().bold()),
    ]);
    frame.render_widget(
        Paragraph::new(title).style(Style::default().bg(Color::DarkGray)),
        title_area,
    );

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_area = Some(chat_area);
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let mut lines: Vec<Line> = Vec::new();
    for msg in app.controller.transcript().messages() {
        lines.extend(message_lines(msg));
    }

    if app.controller.is_loading() {
        lines.push(role_line(ChatRole::Model));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            dots,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .wrap(Wrap { trim: true })
        .scroll((app.scroll, 0));
    frame.render_widget(chat, chat_area);

    render_input(app, frame, input_area);
}

fn role_line(role: ChatRole) -> Line<'static> {
    match role {
        ChatRole::User => Line::from(Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        ChatRole::Model => Line::from(Span::styled(
            "Ava:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    }
}

fn message_lines(msg: &ChatMessage) -> Vec<Line<'static>> {
    let mut lines = vec![role_line(msg.role)];

    match (&msg.link_url, msg.is_link) {
        (Some(url), true) => {
            lines.push(Line::from(vec![
                Span::styled(
                    msg.content.clone(),
                    Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
                ),
                Span::styled(format!(" ({url})"), Style::default().fg(Color::DarkGray)),
            ]));
        }
        _ => {
            for line in msg.content.lines() {
                lines.push(Line::from(line.to_string()));
            }
            if msg.content.is_empty() {
                lines.push(Line::default());
            }
        }
    }

    lines.push(Line::default());
    lines
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let loading = app.controller.is_loading();
    let border_color = if loading {
        Color::DarkGray
    } else if app.controller.can_submit() {
        Color::Yellow
    } else {
        Color::Cyan
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(input_title(app.controller.exchange()));

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let draft = app.controller.draft();
    let input = if draft.is_empty() {
        Paragraph::new(INPUT_PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
    } else {
        let visible_text: String = draft
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        let color = if loading { Color::DarkGray } else { Color::Cyan };
        Paragraph::new(visible_text).style(Style::default().fg(color))
    };

    frame.render_widget(input.block(input_block), area);

    if !loading {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

/// Input box title reflecting the last exchange.
fn input_title(exchange: &Exchange) -> &'static str {
    match exchange {
        Exchange::Pending => " Waiting for Ava ",
        Exchange::Failed(FailureKind::Transport) => " Couldn't reach Ava, Enter to retry ",
        Exchange::Failed(FailureKind::Protocol) => " Ava had a problem, Enter to retry ",
        Exchange::Succeeded(reply) if reply.wants_contact_support() => " Contact link above, Enter to send ",
        Exchange::Idle | Exchange::Succeeded(_) => " Enter to send ",
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = if app.controller.is_open() {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" PgUp/PgDn ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" close ", label_style),
            Span::styled(" ^C ", key_style),
            Span::styled(" quit ", label_style),
        ]
    } else {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" open chat ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ]
    };

    let mode_style = if app.controller.is_loading() {
        Style::default().bg(Color::Yellow).fg(Color::Black)
    } else {
        Style::default().bg(Color::Blue).fg(Color::White)
    };
    let mode_text = if app.controller.is_open() { " CHAT " } else { " PAGE " };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    spans.extend(hints);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ava_core::ChatReply;

    #[test]
    fn test_link_message_lines() {
        let lines = message_lines(&ChatMessage::contact_support());
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1].to_string(),
            "Click here to visit our Contact Page. (https://tarsgroup.co/contact)"
        );
    }

    #[test]
    fn test_multiline_message_lines() {
        let lines = message_lines(&ChatMessage::model("one\ntwo"));
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].to_string(), "Ava:");
    }

    #[test]
    fn test_input_title_follows_exchange() {
        assert_eq!(input_title(&Exchange::Idle), " Enter to send ");
        assert_eq!(input_title(&Exchange::Pending), " Waiting for Ava ");
        assert_eq!(
            input_title(&Exchange::Failed(FailureKind::Transport)),
            " Couldn't reach Ava, Enter to retry "
        );
        assert_eq!(
            input_title(&Exchange::Failed(FailureKind::Protocol)),
            " Ava had a problem, Enter to retry "
        );

        let plain = ChatReply { response: "Hi".into(), action: None };
        assert_eq!(input_title(&Exchange::Succeeded(plain)), " Enter to send ");
        let contact = ChatReply {
            response: "Let me connect you.".into(),
            action: Some("contact_support".into()),
        };
        assert_eq!(
            input_title(&Exchange::Succeeded(contact)),
            " Contact link above, Enter to send "
        );
    }

    #[test]
    fn test_panel_sits_above_launcher() {
        let body = Rect::new(0, 1, 100, 40);
        let launcher = launcher_rect(body, true);
        let panel = panel_rect(body, launcher);
        assert_eq!(panel.y + panel.height, launcher.y);
        assert_eq!(panel.width, PANEL_WIDTH);
        assert!(panel.x + panel.width <= body.width);
    }
}
