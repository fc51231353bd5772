//! Cosmodrift - an ambient cosmic audio player
//!
//! A drifting particle field, wandering force fields, and a pulsing glow
//! orb trail behind a minimal one-track transport.

mod audio;
mod cli;
mod galaxy;
mod params;
mod rendering;
mod transport;

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalPosition,
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use audio::{pulse_level, AudioSystem, TrackBuffer};
use cli::Args;
use galaxy::{Bounds, CircleInstance, GalaxySystem};
use params::*;
use rendering::{HudUniforms, OrbUniforms, RenderSystem};
use transport::{format_time, progress_fraction, ProgressBar};

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Simulation systems
    galaxy: GalaxySystem,
    audio: Option<AudioSystem>,
    pending_track: Option<TrackBuffer>,

    // Configuration
    render_config: RenderConfig,
    orb_params: OrbParams,
    pulse_params: PulseParams,
    progress_bar: ProgressBar,
    instance_capacity: usize,

    // Per-frame scratch and UI state
    instances: Vec<CircleInstance>,
    cursor: PhysicalPosition<f64>,
    title: String,

    // Time tracking
    start_time: Instant,
}

impl App {
    fn new(args: &Args) -> Self {
        let galaxy_params = GalaxyParams::default();
        let orb_params = OrbParams::default();
        let pulse_params = PulseParams::default();
        let render_config = RenderConfig {
            window_width: args.width,
            window_height: args.height,
            ..RenderConfig::default()
        };

        // Worst case: every particle, every field ring, a full wave pool,
        // and the orb halo ring
        let instance_capacity = galaxy_params.particle_count
            + galaxy_params.field_count
            + galaxy_params.wave_capacity
            + 1;

        let bounds = Bounds::new(args.width as f32, args.height as f32);
        let galaxy = GalaxySystem::new(galaxy_params, orb_params.clone(), bounds, args.rng());
        let pending_track = args.load_track();

        Self {
            window: None,
            render_system: None,
            galaxy,
            audio: None,
            pending_track,
            render_config,
            orb_params,
            pulse_params,
            progress_bar: ProgressBar::default(),
            instance_capacity,
            instances: Vec::new(),
            cursor: PhysicalPosition::new(0.0, 0.0),
            title: String::new(),
            start_time: Instant::now(),
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        // Create window
        let window_attributes = Window::default_attributes()
            .with_title("Cosmodrift")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        // Initialize rendering system
        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.render_config,
            self.instance_capacity,
        ))
        .unwrap();

        // Initialize audio playback if a track was loaded
        self.audio = self
            .pending_track
            .take()
            .map(|track| AudioSystem::new(track).unwrap());

        println!("\nCosmodrift is running!");
        println!("Space: play/pause   Click the bar: seek   ESC: quit\n");

        self.window = Some(window);
        self.render_system = Some(render_system);
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Space => self.toggle_playback(),
                _ => {}
            },
            WindowEvent::Resized(size) if size.width > 0 && size.height > 0 => {
                if let Some(render_system) = self.render_system.as_mut() {
                    render_system.resize(size.width, size.height);
                }
                self.galaxy
                    .resize(Bounds::new(size.width as f32, size.height as f32));
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = position;
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.seek_at_cursor(),
            WindowEvent::RedrawRequested => {
                self.render_frame();
            }
            _ => {}
        }
    }
}

impl App {
    /// Toggle play/pause and fire a wave burst from the orb
    fn toggle_playback(&mut self) {
        if let Some(audio) = &self.audio {
            audio.toggle();
            let origin = self.galaxy.orb().pos;
            self.galaxy.burst(origin);
        }
    }

    /// Seek to the clicked fraction if the pointer is on the progress bar
    fn seek_at_cursor(&mut self) {
        let Some(audio) = &self.audio else {
            return;
        };

        let bounds = self.galaxy.bounds();
        let (x, y) = (self.cursor.x as f32, self.cursor.y as f32);

        if self.progress_bar.contains(x, y, bounds.width, bounds.height) {
            let fraction = self.progress_bar.fraction_at(x, bounds.width);
            audio.seek(fraction * audio.duration());
        }
    }

    /// Advance the simulation and render a single frame
    fn render_frame(&mut self) {
        let Some(render_system) = self.render_system.as_mut() else {
            return;
        };

        let time_s = self.start_time.elapsed().as_secs_f32();
        let level = pulse_level(time_s, &self.pulse_params);

        self.galaxy.step();

        let overlay_start = self.galaxy.write_instances(&mut self.instances);
        render_system.update_instances(&self.instances, overlay_start);

        let bounds = self.galaxy.bounds();
        let orb = self.galaxy.orb();
        render_system.update_orb(&OrbUniforms {
            viewport: [bounds.width, bounds.height],
            center: orb.pos.to_array(),
            radius: orb.size,
            core_alpha: self.orb_params.core_alpha_base + level * self.orb_params.core_alpha_gain,
            mid_alpha: self.orb_params.mid_alpha_base + level * self.orb_params.mid_alpha_gain,
            _padding: 0.0,
        });

        let (position, duration) = match &self.audio {
            Some(audio) => (audio.position(), audio.duration()),
            None => (0.0, 0.0),
        };

        let (bar_x, bar_y, bar_w, bar_h) = self.progress_bar.rect(bounds.width, bounds.height);
        render_system.update_hud(&HudUniforms {
            viewport: [bounds.width, bounds.height],
            bar_pos: [bar_x, bar_y],
            bar_size: [bar_w, bar_h],
            progress: progress_fraction(position, duration),
            _padding: 0.0,
        });

        if let Err(e) = render_system.render() {
            eprintln!("Render error: {:?}", e);
        }

        self.update_title(position, duration);
    }

    /// Mirror transport state into the window title (elapsed / total)
    fn update_title(&mut self, position: f32, duration: f32) {
        let Some(window) = &self.window else {
            return;
        };

        let state = match &self.audio {
            Some(audio) if audio.is_playing() => "playing",
            Some(_) => "paused",
            None => "no track",
        };
        let title = format!(
            "Cosmodrift [{}] {} / {}",
            state,
            format_time(position),
            format_time(duration)
        );

        if title != self.title {
            window.set_title(&title);
            self.title = title;
        }
    }
}

fn main() {
    let args = Args::parse();

    println!("Cosmodrift - ambient cosmic audio player");

    let mut app = App::new(&args);
    let event_loop = EventLoop::new().unwrap();
    let _ = event_loop.run_app(&mut app);
}
