use std::collections::HashSet;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use grid_raycaster::camera::Observer;
use grid_raycaster::renderer::Renderer;
use grid_raycaster::scaler::{ScaleLut, blit_nearest_stretch, build_scale_lut};
use grid_raycaster::settings::Settings;
use grid_raycaster::textures::TextureAtlas;
use grid_raycaster::world::{DEFAULT_LEVEL, GridMap};

const START_POS: [f32; 2] = [1.5, 5.0];

struct App {
    window: Option<Rc<Window>>,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,
    world: GridMap,
    atlas: TextureAtlas,
    observer: Observer,
    renderer: Renderer,

    // Loaded settings and the ones currently rendered with
    settings: Settings,
    view: Settings,
    low_detail: bool,

    // HUD
    frame_counter: u32,
    last_fps_print: Instant,

    // Internal framebuffer, stretched to the window
    fb: Vec<u32>,
    scale_lut: ScaleLut,

    // Input and frame pacing
    keys_down: HashSet<KeyCode>,
    last_tick: Instant,
    next_frame: Instant,
    frame_interval: Duration,
}

impl App {
    fn new(settings: Settings, world: GridMap, atlas: TextureAtlas) -> Self {
        let observer = Observer::new(START_POS, 0.0, &settings);
        let renderer = Renderer::new(&settings);
        let now = Instant::now();

        Self {
            window: None,
            surface: None,
            world,
            atlas,
            observer,
            renderer,

            view: settings.clone(),
            frame_interval: Duration::from_secs_f64(1.0 / settings.fps_cap as f64),
            fb: vec![0; settings.width * settings.height],
            settings,
            low_detail: false,

            frame_counter: 0,
            last_fps_print: now,

            scale_lut: ScaleLut::empty(),

            keys_down: HashSet::new(),
            last_tick: now,
            next_frame: now,
        }
    }

    fn tick(&mut self) {
        // Compute dt with cap to avoid huge jumps if the app was paused
        let now = Instant::now();
        let mut dt = now.duration_since(self.last_tick);
        self.last_tick = now;
        if dt > Duration::from_millis(100) {
            dt = Duration::from_millis(100);
        }
        let dt_s = dt.as_secs_f32();

        let held = |codes: &[KeyCode]| codes.iter().any(|c| self.keys_down.contains(c));

        let mut fwd = 0.0;
        let mut strafe = 0.0;
        if held(&[KeyCode::KeyW, KeyCode::ArrowUp]) {
            fwd += 1.0;
        }
        if held(&[KeyCode::KeyS, KeyCode::ArrowDown]) {
            fwd -= 1.0;
        }
        if held(&[KeyCode::KeyD]) {
            strafe += 1.0;
        }
        if held(&[KeyCode::KeyA]) {
            strafe -= 1.0;
        }

        let mut turn = 0.0;
        if held(&[KeyCode::KeyQ, KeyCode::ArrowLeft]) {
            turn -= 1.0;
        }
        if held(&[KeyCode::KeyE, KeyCode::ArrowRight]) {
            turn += 1.0;
        }

        // Normalize diagonal speed
        if fwd != 0.0 || strafe != 0.0 {
            let inv = 1.0 / ((fwd * fwd + strafe * strafe) as f32).sqrt();
            fwd *= inv;
            strafe *= inv;
        }

        self.observer.turn(turn * self.settings.turn_speed * dt_s);

        if fwd != 0.0 || strafe != 0.0 {
            let [c, s] = self.observer.direction();
            // right of heading is +90 degrees with y pointing down the map
            let step = self.settings.move_speed * dt_s;
            let dx = (c * fwd - s * strafe) * step;
            let dy = (s * fwd + c * strafe) * step;
            self.observer.slide(dx, dy, &self.world);
        }
    }

    fn toggle_detail(&mut self) {
        self.low_detail = !self.low_detail;
        self.view = if self.low_detail {
            self.settings.scaled(2)
        } else {
            self.settings.clone()
        };

        if let Err(e) = self.view.validate() {
            warn!("Detail level rejected: {}", e);
            self.low_detail = false;
            self.view = self.settings.clone();
        }

        self.fb = vec![0; self.view.width * self.view.height];
        self.renderer.resize(&self.view);
        self.observer
            .set_fov_from_horizontal(self.view.width as f32, self.view.fov_degrees);
        self.rebuild_scale_lut();
        info!(
            width = self.view.width,
            height = self.view.height,
            rays = self.view.num_rays,
            "render resolution changed"
        );
    }

    fn rebuild_scale_lut(&mut self) {
        if let Some(window) = &self.window {
            let size = window.inner_size();
            self.scale_lut = build_scale_lut(
                size.width as usize,
                size.height as usize,
                self.view.width,
                self.view.height,
            );
        }
    }

    fn redraw(&mut self, id: WindowId) {
        self.tick();

        let (window, surface) = match (&self.window, &mut self.surface) {
            (Some(w), Some(s)) if w.id() == id => (w, s),
            _ => return,
        };

        let size = window.inner_size();
        let (Some(dw), Some(dh)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return; // Minimized window, skip drawing
        };

        if let Err(e) = surface.resize(dw, dh) {
            error!("Failed to resize surface: {}", e);
            return;
        }

        self.renderer.render_frame(
            &mut self.fb,
            self.view.width,
            self.view.height,
            &self.world,
            &self.atlas,
            &self.observer,
        );

        let (dw, dh) = (dw.get() as usize, dh.get() as usize);
        if !self.scale_lut.matches(dw, dh) {
            self.scale_lut = build_scale_lut(dw, dh, self.view.width, self.view.height);
        }

        let mut buf = match surface.buffer_mut() {
            Ok(buf) => buf,
            Err(e) => {
                error!("Failed to acquire surface buffer: {}", e);
                return;
            }
        };
        blit_nearest_stretch(&mut buf, dw, &self.fb, &self.scale_lut);
        if let Err(e) = buf.present() {
            error!("Failed to present frame: {}", e);
        }

        // Report FPS
        self.frame_counter += 1;
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_fps_print).as_secs_f32();
        if elapsed >= 1.0 {
            let fps = self.frame_counter as f32 / elapsed;
            info!(
                "FPS: {:.1} at ({:.2}, {:.2})",
                fps, self.observer.pos[0], self.observer.pos[1]
            );
            self.frame_counter = 0;
            self.last_fps_print = now;
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let attributes = Window::default_attributes()
            .with_title("Grid Raycaster")
            .with_inner_size(LogicalSize::new(self.settings.width as f64, self.settings.height as f64));

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Rc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let surface = softbuffer::Context::new(window.clone())
            .and_then(|context| softbuffer::Surface::new(&context, window.clone()));
        let surface = match surface {
            Ok(surface) => surface,
            Err(e) => {
                error!("Failed to create softbuffer surface: {}", e);
                event_loop.exit();
                return;
            }
        };

        self.surface = Some(surface);
        self.window = Some(window);
        self.rebuild_scale_lut();

        self.last_tick = Instant::now();
        self.next_frame = self.last_tick;
        info!("Window ready");
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested; stopping");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => {
                    match code {
                        KeyCode::Escape => event_loop.exit(),
                        KeyCode::KeyR if !repeat => self.toggle_detail(),
                        _ => {}
                    }
                    self.keys_down.insert(code);
                }
                ElementState::Released => {
                    self.keys_down.remove(&code);
                }
            },

            WindowEvent::RedrawRequested => self.redraw(id),

            WindowEvent::Resized(new_size) => {
                debug!(width = new_size.width, height = new_size.height, "window resized");
                self.rebuild_scale_lut();
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Fixed cadence: one redraw per frame interval
        let now = Instant::now();
        if now >= self.next_frame {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame = now + self.frame_interval;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let settings = Settings::load().context("loading settings")?;
    settings.validate().context("validating settings")?;

    let atlas = TextureAtlas::procedural(settings.texture_size);
    let world = GridMap::parse(DEFAULT_LEVEL).context("parsing level")?;
    world
        .validate(&atlas)
        .context("checking level textures")?;
    info!(
        walls = world.wall_count(),
        textures = atlas.len(),
        tile = atlas.tile_size(),
        "level ready"
    );

    let event_loop = EventLoop::new().context("creating event loop")?;
    let mut app = App::new(settings, world, atlas);
    event_loop.run_app(&mut app).context("running event loop")?;
    Ok(())
}
