/// Interactive terminal preview for the software rasterizer
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color as TermColor, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use sr3d_core::{
    Color, Framebuffer, Mesh, Perspective, PhoneSpec, RasterMode, Renderer, RotationState, Vec3,
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod renderer;

pub use renderer::HalfBlockPresenter;

const BACKGROUND: Color = Color::rgb(20, 20, 30);
const ROTATE_STEP: f32 = 0.1;
const SPIN_STEP: (f32, f32, f32) = (0.01, 0.015, 0.005);

/// What the `M` key cycles through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    Cube,
    Phone,
    Loaded,
}

/// Meshes available to the preview plus which one is on screen
pub struct Scene {
    cube: Mesh,
    phone: Mesh,
    loaded: Option<Mesh>,
    current: Model,
}

impl Scene {
    pub fn new(loaded: Option<Mesh>) -> Self {
        let current = if loaded.is_some() {
            Model::Loaded
        } else {
            Model::Cube
        };
        Self {
            cube: Mesh::cube(2.0),
            phone: Mesh::phone(&PhoneSpec::default()),
            loaded,
            current,
        }
    }

    pub fn current(&self) -> Model {
        self.current
    }

    pub fn mesh(&self) -> &Mesh {
        match (self.current, &self.loaded) {
            (Model::Cube, _) => &self.cube,
            (Model::Phone, _) => &self.phone,
            (Model::Loaded, Some(mesh)) => mesh,
            (Model::Loaded, None) => &self.cube,
        }
    }

    /// Cube -> phone -> loaded STL (if any) -> cube
    pub fn cycle(&mut self) {
        self.current = match self.current {
            Model::Cube => Model::Phone,
            Model::Phone if self.loaded.is_some() => Model::Loaded,
            Model::Phone | Model::Loaded => Model::Cube,
        };
    }
}

/// Rotation, spin and raster mode, driven by key presses
#[derive(Debug, Clone, Copy)]
pub struct Controls {
    pub rotation: RotationState,
    pub auto_spin: bool,
    pub mode: RasterMode,
    pub quit: bool,
    pub cycle_model: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            rotation: RotationState::new(0.3, 0.3, 0.0),
            auto_spin: true,
            mode: RasterMode::Filled,
            quit: false,
            cycle_model: false,
        }
    }
}

impl Controls {
    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Char('w') | KeyCode::Up => self.rotation.rotate(ROTATE_STEP, 0.0, 0.0),
            KeyCode::Char('s') | KeyCode::Down => self.rotation.rotate(-ROTATE_STEP, 0.0, 0.0),
            KeyCode::Char('a') | KeyCode::Left => self.rotation.rotate(0.0, -ROTATE_STEP, 0.0),
            KeyCode::Char('d') | KeyCode::Right => self.rotation.rotate(0.0, ROTATE_STEP, 0.0),
            KeyCode::Char('e') => self.rotation.rotate(0.0, 0.0, ROTATE_STEP),
            KeyCode::Char('r') => self.rotation.rotate(0.0, 0.0, -ROTATE_STEP),
            KeyCode::Char(' ') => self.auto_spin = !self.auto_spin,
            KeyCode::Char('f') => self.mode = self.mode.toggled(),
            KeyCode::Char('m') => self.cycle_model = true,
            _ => {}
        }
    }

    pub fn tick(&mut self) {
        if self.auto_spin {
            let (dx, dy, dz) = SPIN_STEP;
            self.rotation.rotate(dx, dy, dz);
        }
    }
}

/// Main application struct for the terminal preview
pub struct TerminalApp {
    scene: Scene,
    controls: Controls,
    translation: Vec3,
    renderer: Renderer,
    framebuffer: Framebuffer,
    presenter: HalfBlockPresenter,
    term_size: (u16, u16),
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(scene: Scene) -> io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        let (width, height) = renderer::framebuffer_size(cols, rows);

        Ok(Self {
            scene,
            controls: Controls::default(),
            translation: Vec3::new(0.0, 0.0, -8.0),
            renderer: Renderer::new(Perspective::new(width, height)),
            framebuffer: Framebuffer::new(width, height),
            presenter: HalfBlockPresenter::new(),
            term_size: (cols, rows),
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30);

        while !self.controls.quit {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                self.handle_input()?;
            }

            self.controls.tick();
            self.render()?;

            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        match event::read()? {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) => {
                self.controls.handle_key(code);
                if std::mem::take(&mut self.controls.cycle_model) {
                    self.scene.cycle();
                }
            }
            Event::Resize(cols, rows) => self.resize(cols, rows)?,
            _ => {}
        }
        Ok(())
    }

    fn resize(&mut self, cols: u16, rows: u16) -> io::Result<()> {
        self.term_size = (cols, rows);
        let (width, height) = renderer::framebuffer_size(cols, rows);
        self.renderer = Renderer::new(Perspective::new(width, height));
        self.framebuffer = Framebuffer::new(width, height);
        execute!(stdout(), terminal::Clear(ClearType::All))
    }

    fn render(&mut self) -> io::Result<()> {
        let model = self.controls.rotation.model_matrix(self.translation);

        self.framebuffer.clear(BACKGROUND);
        let stats = self.renderer.render(
            self.scene.mesh(),
            &model,
            &mut self.framebuffer,
            self.controls.mode,
        );

        let mut stdout = stdout();
        self.presenter.draw(&mut stdout, &self.framebuffer)?;

        let (cols, rows) = self.term_size;
        let status = format!(
            "SR3D | FPS: {:.1} | {:?} {:?} | tris {}/{} | WASD/Arrows=Rotate E/R=Roll Space=Spin F=Wire M=Model Q=Quit",
            self.fps,
            self.scene.current(),
            self.controls.mode,
            stats.drawn,
            stats.submitted(),
        );
        let status: String = status.chars().take(cols as usize).collect();
        queue!(
            stdout,
            cursor::MoveTo(0, rows.saturating_sub(1)),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(TermColor::Yellow),
            Print(status),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_rotate_and_roll() {
        let mut c = Controls::default();
        let start = c.rotation;
        c.handle_key(KeyCode::Up);
        c.handle_key(KeyCode::Char('d'));
        c.handle_key(KeyCode::Char('e'));
        assert!((c.rotation.x - start.x - ROTATE_STEP).abs() < 1e-6);
        assert!((c.rotation.y - start.y - ROTATE_STEP).abs() < 1e-6);
        assert!((c.rotation.z - start.z - ROTATE_STEP).abs() < 1e-6);
    }

    #[test]
    fn space_stops_the_spin() {
        let mut c = Controls::default();
        c.handle_key(KeyCode::Char(' '));
        assert!(!c.auto_spin);
        let before = c.rotation;
        c.tick();
        assert_eq!(c.rotation, before);

        c.handle_key(KeyCode::Char(' '));
        c.tick();
        assert_ne!(c.rotation, before);
    }

    #[test]
    fn f_toggles_wireframe_and_q_quits() {
        let mut c = Controls::default();
        c.handle_key(KeyCode::Char('f'));
        assert_eq!(c.mode, RasterMode::Wireframe);
        c.handle_key(KeyCode::Char('f'));
        assert_eq!(c.mode, RasterMode::Filled);
        assert!(!c.quit);
        c.handle_key(KeyCode::Esc);
        assert!(c.quit);
    }

    #[test]
    fn scene_cycles_through_models() {
        let mut scene = Scene::new(None);
        assert_eq!(scene.current(), Model::Cube);
        assert_eq!(scene.mesh().triangle_count(), 12);
        scene.cycle();
        assert_eq!(scene.current(), Model::Phone);
        scene.cycle();
        assert_eq!(scene.current(), Model::Cube);
    }

    #[test]
    fn loaded_mesh_joins_the_cycle() {
        let mut scene = Scene::new(Some(Mesh::cube(1.0).with_color(Color::WHITE)));
        assert_eq!(scene.current(), Model::Loaded);
        assert!(scene.mesh().face_colors().iter().all(|&c| c == Color::WHITE));
        scene.cycle();
        assert_eq!(scene.current(), Model::Cube);
        scene.cycle();
        scene.cycle();
        assert_eq!(scene.current(), Model::Loaded);
    }
}
