//! UI rendering for the front panel.

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use super::app::PanelApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &PanelApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_display(frame, chunks[0], app);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(12), Constraint::Min(4)])
        .split(middle[0]);

    draw_registers(frame, left[0], app);
    draw_help(frame, left[1]);
    draw_disassembly(frame, middle[1], app);

    draw_status(frame, chunks[2], app);
}

/// The calculator display line.
fn draw_display(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let text = if app.calc.error() {
        "Error".to_string()
    } else {
        app.calc.display_text().to_string()
    };

    let style = if app.calc.error() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD)
    };

    let display = Paragraph::new(text)
        .style(style)
        .block(Block::default().title(" Display ").borders(Borders::ALL));

    frame.render_widget(display, area);
}

/// Register file view.
fn draw_registers(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let regs = &app.calc.cpu().regs;

    let reg_line = |name: &str, value: &crate::bcd::Reg| {
        Line::from(vec![
            Span::raw(format!("{}: ", name)),
            Span::styled(format!("{}", value), Style::default().fg(Color::White)),
        ])
    };

    let status: String = (0..crate::cpu::STATUS_BITS)
        .map(|i| if regs.s[i] { '1' } else { '0' })
        .collect();

    let content = vec![
        reg_line("A", &regs.a),
        reg_line("B", &regs.b),
        reg_line("C", &regs.c),
        reg_line("D", &regs.d),
        reg_line("E", &regs.e),
        reg_line("F", &regs.f),
        reg_line("M", &regs.m),
        reg_line("T", &regs.t),
        Line::from(vec![
            Span::raw(format!(
                "P: {:X}  PC: {}:{:03}  RET: {:03}  ",
                regs.p, regs.offset, regs.pc, regs.ret
            )),
            Span::styled(
                format!("CY: {}{}", regs.carry, if regs.display_on { "  DISP" } else { "" }),
                Style::default().fg(Color::Yellow),
            ),
        ]),
        Line::from(vec![
            Span::raw("S: "),
            Span::styled(status, Style::default().fg(Color::Cyan)),
            Span::raw(format!("   cycles: {}", app.calc.cpu().cycles)),
        ]),
    ];

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)),
    );

    frame.render_widget(paragraph, area);
}

/// Disassembly around the program counter.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let lines = (area.height as usize).saturating_sub(2);
    let items: Vec<ListItem> = app
        .disassembly(lines)
        .into_iter()
        .map(|(addr, text, is_current)| {
            let prefix = if is_current { "> " } else { "  " };
            let style = if is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("{}{:03}: {}", prefix, addr, text)).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Microcode ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(list, area);
}

/// Key legend.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("digits . + - * / Enter   Bksp: CLX  Del: CLR"),
        Line::from("S/C/T sin cos tan  A arc  L ln  G log  E e^x"),
        Line::from("W x^y  Q sqrt  I 1/x  P pi  V chs  e EEX  H hyp"),
        Line::from("M sto  R rcl  X swap  D rot"),
        Line::from("space: run/pause  s: step  x: reset  q: quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default().title(" Keys ").borders(Borders::ALL));

    frame.render_widget(help, area);
}

/// Status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let mut text = app.status.clone();
    if app.calc.script_active() {
        text.push_str("  [script running]");
    }
    let status = Paragraph::new(text)
        .style(Style::default().fg(Color::White))
        .block(Block::default().title(" Status ").borders(Borders::ALL));

    frame.render_widget(status, area);
}
