//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::cpu::CpuState;
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(frame.area());

    // Left side: code and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(10),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_control_unit(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: registers, I/O and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(10),
            Constraint::Min(6),
            Constraint::Length(5),
        ])
        .split(chunks[1]);

    draw_register_file(frame, right_chunks[0], app);
    draw_io_and_stack(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Draw disassembly view around the program counter.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(addr) { "●" } else { " " };
            let sub = app.cpu.program().subroutine_name(*addr);
            let text = format!("{}{:03}: {:<18} {}", prefix, addr, instr, sub);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}", bp, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Program ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw control unit registers and FSM state.
fn draw_control_unit(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let snap = app.cpu.snapshot();
    let fields = app.cpu.fields();

    let content = vec![
        Line::from(vec![
            Span::raw("State: "),
            Span::styled(snap.state.name(), state_style(snap.state)),
            Span::raw("   Cycles: "),
            Span::styled(format!("{}", app.cpu.cycles()), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::raw("PC: "),
            Span::styled(format!("{:03}", snap.pc), Style::default().fg(Color::Yellow)),
            Span::raw("   MAR: "),
            Span::styled(format!("{:03}", app.cpu.mar()), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("Fields: "),
            Span::styled(
                format!("opcode={:#04x} op1={:#04x} op2={:#04x}", fields.opcode, fields.op1, fields.op2),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::raw("IR: "),
            Span::styled(snap.ir_binary(), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("SR (ISNZVC): "),
            Span::styled(snap.sr_binary(), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("Instruction: "),
            Span::styled(snap.instruction.clone(), Style::default().fg(Color::Green)),
            Span::raw("   in "),
            Span::styled(snap.subroutine.clone(), Style::default().fg(Color::Magenta)),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Control Unit ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw R0-R31 as an 8x4 grid.
fn draw_register_file(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let regs = app.cpu.regs.as_slice();

    let lines: Vec<Line> = regs
        .chunks(4)
        .enumerate()
        .map(|(row, chunk)| {
            let spans: Vec<Span> = chunk
                .iter()
                .enumerate()
                .map(|(col, value)| {
                    let style = if *value != 0 {
                        Style::default().fg(Color::White)
                    } else {
                        Style::default().fg(Color::DarkGray)
                    };
                    Span::styled(format!("R{:<2}={:02x}  ", row * 4 + col, value), style)
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(paragraph, area);
}

/// Draw named I/O registers and the stack.
fn draw_io_and_stack(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let snap = app.cpu.snapshot();

    let mut items: Vec<ListItem> = snap
        .io
        .iter()
        .map(|io| ListItem::new(format!("{:<6} {:08b}", io.name, io.value)))
        .collect();

    let page: Vec<String> = app
        .extended_page(8)
        .iter()
        .map(|(_, value)| format!("{:02x}", value))
        .collect();
    items.push(ListItem::new(format!("Ext 0x100: {}", page.join(" "))));

    items.push(ListItem::new(format!(
        "Stack: depth {}  last pushed {}",
        snap.stack_depth, snap.stack_top
    )).style(Style::default().fg(Color::Cyan)));

    items.extend(
        app.cpu.stack.as_slice()
            .iter()
            .rev()
            .map(|v| ListItem::new(format!("  {:3} ({:#04x})", v, v)))
    );

    let list = List::new(items)
        .block(Block::default()
            .title(" I/O & Stack ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: State step  c: Cycle  r: Run  p: Pause"),
        Line::from("b: Breakpoint  x: Reset  0-9: Force state"),
        Line::from("q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

/// Get color style for an FSM state.
fn state_style(state: CpuState) -> Style {
    match state {
        CpuState::Fetch => Style::default().fg(Color::Cyan),
        CpuState::Decode => Style::default().fg(Color::Yellow),
        CpuState::Execute => Style::default().fg(Color::Green),
    }
}
