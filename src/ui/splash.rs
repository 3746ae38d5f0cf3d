//! Splash Screen
//!
//! Startup checklist shown while the backend connection is prepared.

use ratatui::{
    layout::{Alignment, Constraint, Flex, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepState {
    Pending,
    Running,
    Done,
}

#[derive(Debug, Clone)]
struct Step {
    label: String,
    detail: Option<String>,
    state: StepState,
}

/// Ordered startup steps and how far along they are
#[derive(Debug, Clone)]
pub struct SplashState {
    steps: Vec<Step>,
}

impl SplashState {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            steps: labels
                .into_iter()
                .map(|label| Step {
                    label: label.into(),
                    detail: None,
                    state: StepState::Pending,
                })
                .collect(),
        }
    }

    /// Mark the first unfinished step as running, with what it is doing
    pub fn start(&mut self, detail: impl Into<String>) {
        if let Some(step) = self.current_mut() {
            step.state = StepState::Running;
            step.detail = Some(detail.into());
        }
    }

    pub fn finish(&mut self) {
        if let Some(step) = self.current_mut() {
            step.state = StepState::Done;
        }
    }

    pub fn progress(&self) -> f64 {
        if self.steps.is_empty() {
            return 1.0;
        }
        let done = self.steps.iter().filter(|s| s.state == StepState::Done).count();
        done as f64 / self.steps.len() as f64
    }

    fn current_mut(&mut self) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.state != StepState::Done)
    }

    fn status(&self) -> &str {
        self.steps
            .iter()
            .find(|s| s.state == StepState::Running)
            .and_then(|s| s.detail.as_deref())
            .unwrap_or(if self.progress() >= 1.0 { "Listo" } else { "Iniciando" })
    }

    fn checklist(&self) -> Vec<Line<'_>> {
        self.steps
            .iter()
            .map(|step| {
                let (mark, color) = match step.state {
                    StepState::Done => ("✓", Color::Green),
                    StepState::Running => ("›", Color::Cyan),
                    StepState::Pending => ("·", Color::DarkGray),
                };
                let mut spans = vec![
                    Span::styled(format!(" {} ", mark), Style::default().fg(color)),
                    Span::styled(step.label.as_str(), Style::default().fg(color)),
                ];
                if let (StepState::Done, Some(detail)) = (step.state, &step.detail) {
                    spans.push(Span::styled(
                        format!("  {}", detail),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                Line::from(spans)
            })
            .collect()
    }
}

pub fn render(f: &mut Frame, state: &SplashState) {
    let height = state.steps.len() as u16 + 8;
    let [band] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(f.area());
    let [panel] = Layout::horizontal([Constraint::Max(64)])
        .flex(Flex::Center)
        .areas(band);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" sygt {} ", crate::VERSION),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);
    let inner = block.inner(panel);
    f.render_widget(block, panel);

    let [title, steps, gauge] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "Sistema de Gestión Tributaria",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center),
        title,
    );
    f.render_widget(Paragraph::new(state.checklist()), steps);
    f.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(state.progress().clamp(0.0, 1.0))
            .label(state.status().to_string()),
        gauge,
    );
}
