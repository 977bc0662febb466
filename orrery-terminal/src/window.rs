/// Terminal window: raw-mode setup, keyboard state, frame pacing and output
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags, ModifierKeyCode,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use log::{debug, info};
use orrery_core::{Key, Window, WindowEvent};
use std::collections::HashMap;
use std::io::{self, stdout, Stdout, Write};
use std::time::{Duration, Instant};

use crate::renderer::Framebuffer;

/// How long a key stays down after a press when the terminal cannot report
/// releases. Covers the delay before the terminal's auto-repeat starts.
const PRESS_HOLD: Duration = Duration::from_millis(250);

/// How long a key stays down after an auto-repeat event
const REPEAT_HOLD: Duration = Duration::from_millis(100);

/// Pixel size of a terminal of `cols` x `rows` cells; each cell is two
/// pixels tall
pub fn pixel_size(cols: u16, rows: u16) -> (u32, u32) {
    (cols as u32, rows as u32 * 2)
}

fn map_key(code: KeyCode) -> Option<Key> {
    Some(match code {
        KeyCode::Char('w') | KeyCode::Char('W') => Key::W,
        KeyCode::Char('a') | KeyCode::Char('A') => Key::A,
        KeyCode::Char('s') | KeyCode::Char('S') => Key::S,
        KeyCode::Char('d') | KeyCode::Char('D') => Key::D,
        KeyCode::Char(' ') => Key::Space,
        // Shift alone is only reported with keyboard enhancement; 'c' works everywhere
        KeyCode::Modifier(ModifierKeyCode::LeftShift) | KeyCode::Char('c') | KeyCode::Char('C') => Key::LShift,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        _ => return None,
    })
}

fn is_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Which keys are held, from press/repeat/release events.
///
/// When the terminal reports releases, a key is down from its press until
/// its release. Otherwise a key counts as down for a short while after each
/// press or repeat.
#[derive(Debug, Clone)]
pub struct KeyTracker {
    held_until: HashMap<Key, Option<Instant>>,
    reports_release: bool,
}

impl KeyTracker {
    pub fn new(reports_release: bool) -> Self {
        Self {
            held_until: HashMap::new(),
            reports_release,
        }
    }

    pub fn record(&mut self, key: Key, kind: KeyEventKind, now: Instant) {
        let deadline = match (kind, self.reports_release) {
            (KeyEventKind::Release, _) => {
                self.held_until.remove(&key);
                return;
            }
            (_, true) => None,
            (KeyEventKind::Press, false) => Some(now + PRESS_HOLD),
            (KeyEventKind::Repeat, false) => Some(now + REPEAT_HOLD),
        };
        self.held_until.insert(key, deadline);
    }

    pub fn is_down(&self, key: Key, now: Instant) -> bool {
        match self.held_until.get(&key) {
            Some(None) => true,
            Some(Some(deadline)) => now <= *deadline,
            None => false,
        }
    }
}

/// Frames per second over the last full second
#[derive(Debug)]
struct FpsCounter {
    since: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn tick(&mut self, now: Instant) {
        self.frames += 1;
        let elapsed = now - self.since;
        if elapsed.as_secs() >= 1 {
            self.fps = self.frames as f32 / elapsed.as_secs_f32();
            self.frames = 0;
            self.since = now;
        }
    }
}

/// The terminal as a window. Raw mode and the alternate screen are active
/// while this value lives.
pub struct TerminalWindow {
    stdout: Stdout,
    keys: KeyTracker,
    enhanced_keyboard: bool,
    size: (u32, u32),
    last_tick: Instant,
    last_present: Instant,
    target_frame_time: Duration,
    fps: FpsCounter,
}

impl TerminalWindow {
    pub fn open(target_fps: u32) -> io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        let size = pixel_size(cols, rows);

        terminal::enable_raw_mode()?;
        // Restored by Drop from here on
        let now = Instant::now();
        let mut window = Self {
            stdout: stdout(),
            keys: KeyTracker::new(false),
            enhanced_keyboard: false,
            size,
            last_tick: now,
            last_present: now,
            target_frame_time: Duration::from_secs(1) / target_fps.max(1),
            fps: FpsCounter {
                since: now,
                frames: 0,
                fps: 0.0,
            },
        };

        execute!(window.stdout, terminal::EnterAlternateScreen, cursor::Hide)?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                window.stdout,
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                        | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
                )
            )?;
            window.enhanced_keyboard = true;
            window.keys = KeyTracker::new(true);
        } else {
            info!("Terminal does not report key releases; held keys are approximated from repeats");
        }

        info!("Terminal window opened at {}x{} pixels", size.0, size.1);
        Ok(window)
    }

    fn draw_overlay(&mut self) -> io::Result<()> {
        queue!(
            self.stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Orrery | FPS: {:.1} | WASD=Move Space/C=Up/Down Arrows=Look Q=Quit",
                self.fps.fps
            )),
            ResetColor
        )
    }
}

impl Window for TerminalWindow {
    type Surface = Framebuffer;

    fn poll_event(&mut self) -> io::Result<Option<WindowEvent>> {
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press && is_quit(&key) => {
                    return Ok(Some(WindowEvent::Closed));
                }
                Event::Key(key) => {
                    if let Some(mapped) = map_key(key.code) {
                        self.keys.record(mapped, key.kind, Instant::now());
                    }
                }
                Event::Resize(cols, rows) => {
                    let (width, height) = pixel_size(cols, rows);
                    self.size = (width, height);
                    return Ok(Some(WindowEvent::Resized { width, height }));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn is_key_down(&self, key: Key) -> bool {
        self.keys.is_down(key, Instant::now())
    }

    fn elapsed_seconds(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last_tick).as_secs_f32();
        self.last_tick = now;
        dt
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn present(&mut self, surface: &Framebuffer) -> io::Result<()> {
        queue!(self.stdout, cursor::MoveTo(0, 0))?;
        surface.draw(&mut self.stdout)?;
        self.draw_overlay()?;
        self.stdout.flush()?;

        // Frame timing
        let elapsed = self.last_present.elapsed();
        if elapsed < self.target_frame_time {
            std::thread::sleep(self.target_frame_time - elapsed);
        }
        self.last_present = Instant::now();
        self.fps.tick(self.last_present);
        Ok(())
    }
}

impl Drop for TerminalWindow {
    fn drop(&mut self) {
        if self.enhanced_keyboard {
            let _ = execute!(self.stdout, PopKeyboardEnhancementFlags);
        }
        let _ = execute!(self.stdout, terminal::LeaveAlternateScreen, cursor::Show);
        let _ = terminal::disable_raw_mode();
        debug!("Terminal restored");
    }
}
