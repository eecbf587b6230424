//! Interactive Stable-Fluids Demo
//!
//! A terminal viewer for the fluid simulation. Each character cell shows two
//! output pixels with a half-block glyph, so the view has twice as many
//! pixel rows as the terminal has lines.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package demo-interactive
//! ```
//!
//! # Controls
//!
//! - Left drag - Push the fluid
//! - Right button - Inject density and temperature
//! - `space` - Pause / resume
//! - `r` - Reset every field
//! - `1`-`5` - Show velocity, density, temperature, pressure, divergence
//! - `tab` - Cycle the displayed field
//! - `q` / `esc` - Quit
//!
//! Logs go to a file (`--log-file`) since the terminal is taken by the view.

use clap::Parser;
use fluid_sim_core::solver::{BackendPreference, QualityPreset};
use fluid_sim_core::{
    Action, DisplayField, DisplayFrame, Grid, PointerSample, Simulation, SimulationParams,
};
use nalgebra::Vector2;
use ratatui::buffer::Buffer;
use ratatui::crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use ratatui::crossterm::execute;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Widget};
use ratatui::DefaultTerminal;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Terminal stable-fluids viewer
#[derive(Parser, Debug)]
#[command(name = "fluid-sim-interactive")]
#[command(about = "Interactive stable-fluids simulation in the terminal", long_about = None)]
struct Args {
    /// Display width the grid is derived from, in pixels
    #[arg(long, default_value_t = 1366)]
    display_width: u32,

    /// Display height the grid is derived from, in pixels
    #[arg(long, default_value_t = 768)]
    display_height: u32,

    /// Grid quality (ultra, high, medium, low)
    #[arg(short, long, default_value = "low")]
    quality: String,

    /// Frame rate cap
    #[arg(long, default_value_t = 30)]
    fps: u64,

    /// Force the CPU backend
    #[arg(long)]
    cpu: bool,

    /// Start paused
    #[arg(long)]
    paused: bool,

    /// Log file
    #[arg(long, default_value = "fluid-sim.log")]
    log_file: PathBuf,
}

/// Mouse state accumulated between ticks
#[derive(Debug, Default)]
struct Pointer {
    /// Terminal cell under the mouse
    cell: Option<(u16, u16)>,
    primary: bool,
    secondary: bool,
}

impl Pointer {
    fn handle(&mut self, mouse: MouseEvent) {
        self.cell = Some((mouse.column, mouse.row));
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.primary = true,
            MouseEventKind::Up(MouseButton::Left) => self.primary = false,
            MouseEventKind::Down(MouseButton::Right) => self.secondary = true,
            MouseEventKind::Up(MouseButton::Right) => self.secondary = false,
            _ => {}
        }
    }

    /// Grid-space sample, `None` position when the mouse is off the view
    fn sample(&self, view: Rect, grid: &Grid) -> PointerSample {
        let position = self.cell.and_then(|(column, row)| {
            let inside = column >= view.x
                && column < view.x + view.width
                && row >= view.y
                && row < view.y + view.height;
            inside.then(|| {
                let screen = Vector2::new(
                    f32::from(column - view.x) + 0.5,
                    f32::from(row - view.y) * 2.0 + 1.0,
                );
                let display = (f32::from(view.width), f32::from(view.height) * 2.0);
                grid.screen_to_grid(screen, display)
            })
        });
        PointerSample {
            position,
            primary: self.primary,
            secondary: self.secondary,
        }
    }
}

/// Half-block rendering of a frame: top pixel as foreground, bottom as
/// background
struct FieldView<'a> {
    frame: &'a DisplayFrame,
}

impl Widget for FieldView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for column in 0..area.width {
                let px = usize::from(column);
                let top = self.frame.sample_output(px, usize::from(row) * 2);
                let bottom = self.frame.sample_output(px, usize::from(row) * 2 + 1);
                if let Some(cell) = buf.cell_mut((area.x + column, area.y + row)) {
                    cell.set_char('▀')
                        .set_fg(to_color(top))
                        .set_bg(to_color(bottom));
                }
            }
        }
    }
}

fn to_color(rgba: [f32; 4]) -> Color {
    let [r, g, b, _] = rgba.map(|c| (c * 255.0).round() as u8);
    Color::Rgb(r, g, b)
}

fn parse_quality(name: &str) -> QualityPreset {
    match name.to_lowercase().as_str() {
        "ultra" => QualityPreset::Ultra,
        "high" => QualityPreset::High,
        "medium" => QualityPreset::Medium,
        "low" => QualityPreset::Low,
        _ => QualityPreset::recommended(),
    }
}

fn init_logging(path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let params = SimulationParams::default();
    let grid = Grid::from_display(
        args.display_width,
        args.display_height,
        parse_quality(&args.quality),
        params.grid_scale,
    )
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let backend = if args.cpu {
        BackendPreference::Cpu
    } else {
        BackendPreference::Auto
    };
    let mut sim = Simulation::with_backend(grid.width(), grid.height(), params, backend)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    if args.paused {
        sim.handle(Action::TogglePause);
    }

    let mut terminal = ratatui::init();
    execute!(io::stdout(), EnableMouseCapture)?;
    let result = run(&mut terminal, &mut sim, args.fps);
    execute!(io::stdout(), DisableMouseCapture)?;
    ratatui::restore();

    if let Err(e) = &result {
        error!("Interactive session failed: {}", e);
    }
    info!(
        "Session ended after {} ticks (mean {:.2} ms/tick)",
        sim.ticks(),
        sim.timer().mean_frame_time_ms()
    );
    result
}

fn run(terminal: &mut DefaultTerminal, sim: &mut Simulation, fps: u64) -> io::Result<()> {
    let frame_time = Duration::from_millis(1000 / fps.clamp(1, 240));
    let mut field = DisplayField::default();
    let mut pointer = Pointer::default();
    let mut view = Rect::default();

    loop {
        let frame_start = Instant::now();

        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q' | 'Q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char(' ') => sim.handle(Action::TogglePause),
                    KeyCode::Char('r' | 'R') => sim.handle(Action::Reset),
                    KeyCode::Tab => field = field.next(),
                    KeyCode::Char(c @ '1'..='5') => {
                        let index = c as usize - '1' as usize;
                        field = DisplayField::ALL[index];
                    }
                    _ => {}
                },
                Event::Mouse(mouse) => pointer.handle(mouse),
                _ => {}
            }
        }

        let grid = sim.grid();
        sim.tick(&pointer.sample(view, &grid));

        let mut draw_error = None;
        terminal.draw(|f| {
            let [field_area, status_area] =
                Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(f.area());
            view = field_area;

            let output = (
                usize::from(field_area.width),
                usize::from(field_area.height) * 2,
            );
            match sim.frame(field, output) {
                Ok(frame) => f.render_widget(FieldView { frame: &frame }, field_area),
                Err(e) => draw_error = Some(e),
            }

            let status = format!(
                " {} | {}x{} {} | {:.1} ms/tick | {} | [space] pause [r] reset [1-5/tab] field [q] quit",
                field,
                grid.width(),
                grid.height(),
                if sim.is_gpu_accelerated() { "GPU" } else { "CPU" },
                sim.timer().last_frame_time_ms(),
                if sim.is_paused() { "PAUSED" } else { "running" },
            );
            f.render_widget(
                Paragraph::new(Line::from(status)).style(Style::default().fg(Color::Black).bg(Color::Gray)),
                status_area,
            );
        })?;
        if let Some(e) = draw_error {
            return Err(io::Error::other(e));
        }

        if let Some(remaining) = frame_time.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(remaining);
        }
    }
}
