/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Images are drawn with upper-half blocks: every terminal cell carries two
/// vertically stacked pixels (foreground = top, background = bottom), which
/// keeps pixels roughly square on ordinary terminal fonts.

use std::collections::HashMap;
use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use image::RgbImage;

use crate::domain::catalog::ImageAsset;
use crate::domain::pixelate::{fit, Sampler};
use crate::sim::controller::{ActiveFrame, Frame};

/// Explicit dark background for every cell, so terminal row gaps never show
/// a different default colour.
const BASE_RGB: [u8; 3] = [22, 22, 35];
const BASE_BG: Color = Color::Rgb { r: BASE_RGB[0], g: BASE_RGB[1], b: BASE_RGB[2] };

const HALF_BLOCK: char = '▀';

const RED: Color = Color::Rgb { r: 255, g: 80, b: 80 };
const GREEN: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const DIM: Color = Color::DarkGrey;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn text(ch: char, fg: Color) -> Self {
        Cell { ch, fg, bg: BASE_BG }
    }

    fn pixels(top: [u8; 3], bottom: [u8; 3]) -> Self {
        Cell { ch: HALF_BLOCK, fg: rgb(top), bg: rgb(bottom) }
    }
}

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::Rgb { r, g, b }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn invalidate(&mut self) {
        self.cells.fill(Cell::INVALID);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::text(ch, fg));
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color) {
        let len = s.chars().count();
        self.put_str(self.width.saturating_sub(len) / 2, y, s, fg);
    }

    fn put_right(&mut self, y: usize, s: &str, fg: Color) {
        let len = s.chars().count();
        self.put_str(self.width.saturating_sub(len + 1), y, s, fg);
    }
}

// ── Textures ──

/// Decode an asset into an opaque RGB texture. Categories that keep their
/// alpha channel are composited onto the base background.
fn decode_texture(asset: &ImageAsset) -> Result<RgbImage, image::ImageError> {
    let img = image::load_from_memory(&asset.data)?;
    if !asset.has_alpha() {
        return Ok(img.into_rgb8());
    }
    let rgba = img.into_rgba8();
    Ok(RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        image::Rgb(blend([r, g, b], BASE_RGB, a))
    }))
}

fn blend(src: [u8; 3], dst: [u8; 3], alpha: u8) -> [u8; 3] {
    let a = alpha as u32;
    let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * (255 - a) + 127) / 255) as u8;
    [mix(src[0], dst[0]), mix(src[1], dst[1]), mix(src[2], dst[2])]
}

// ── Renderer ──

/// Vertical layout
const HUD_ROW: usize = 0;
const IMAGE_ROW: usize = 2;
/// Rows below the image: answer line + help bar.
const FOOTER_ROWS: usize = 3;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<Screen>,
    /// Decoded images by name; `None` marks an image that failed to decode.
    textures: HashMap<String, Option<RgbImage>>,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
            textures: HashMap::new(),
            enhanced_keys: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns whether the terminal
    /// reports key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }
        log::debug!("Keyboard release events: {}", self.enhanced_keys);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.on_resize(tw, th);

        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Adopt a new terminal size and force a full repaint.
    pub fn on_resize(&mut self, w: u16, h: u16) {
        self.term_w = w as usize;
        self.term_h = h as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.invalidate();
        log::debug!("Terminal size {w}x{h}");
    }

    pub fn render(&mut self, frame: &Frame<'_>, pad_connected: bool) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.on_resize(tw, th);
        }

        // Screen change: clear for a clean transition
        let screen = screen_kind(frame);
        if self.last_screen != Some(screen) {
            self.back.invalidate();
            self.last_screen = Some(screen);
        }
        if self.back.cells.first() == Some(&Cell::INVALID) {
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
        }

        self.compose(frame, pad_connected);
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = BASE_BG;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            let mut need_move = true;
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, frame: &Frame<'_>, pad_connected: bool) {
        self.front.clear();
        match frame {
            Frame::Menu { lines } => self.compose_menu(lines),
            Frame::Active(active) => self.compose_active(active),
            Frame::NoImages => self.compose_no_images(),
            Frame::Win { message } => self.compose_win(message),
        }
        self.compose_help(frame, pad_connected);
    }

    fn compose_menu(&mut self, lines: &[&str; 2]) {
        let mid = self.front.height / 2;
        self.front.put_centered(mid.saturating_sub(1), lines[0], RED);
        self.front.put_centered(mid + 1, lines[1], Color::White);
    }

    fn compose_win(&mut self, message: &str) {
        self.front.put_centered(self.front.height / 2, message, GREEN);
    }

    fn compose_no_images(&mut self) {
        let mid = self.front.height / 2;
        self.front.put_centered(mid.saturating_sub(1), "No images found in the database", GOLD);
        self.front.put_centered(mid + 1, "Add some and restart the game", DIM);
    }

    fn compose_active(&mut self, f: &ActiveFrame<'_>) {
        self.front.put_str(1, HUD_ROW, &f.score_text, GOLD);
        let mut status = format!(
            "Image {}/{}  [{}]  {:.1}s",
            f.position, f.total, f.image.category, f.duration
        );
        if f.paused {
            status.push_str("  PAUSED");
        }
        self.front.put_right(HUD_ROW, &status, if f.paused { GOLD } else { DIM });

        let rows = self.front.height.saturating_sub(IMAGE_ROW + FOOTER_ROWS);
        if !self.textures.contains_key(&f.image.name) {
            let texture = decode_texture(f.image)
                .map_err(|e| log::warn!("Could not decode '{}': {e}", f.image.name))
                .ok();
            self.textures.insert(f.image.name.clone(), texture);
        }
        match self.textures.get(&f.image.name) {
            Some(Some(texture)) => {
                draw_pixelated(&mut self.front, texture, IMAGE_ROW, rows, f.pixel_size);
            }
            _ => {
                let y = IMAGE_ROW + rows / 2;
                self.front.put_centered(y, "[ image could not be decoded ]", DIM);
            }
        }

        let answer_row = self.front.height.saturating_sub(2);
        match &f.answer {
            Some(answer) => self.front.put_centered(answer_row, answer, GREEN),
            None => self.front.put_centered(answer_row, "What is it?", DIM),
        }
    }

    fn compose_help(&mut self, frame: &Frame<'_>, pad_connected: bool) {
        let row = self.front.height.saturating_sub(1);
        let help = match frame {
            Frame::Menu { .. } => "ENTER Start   Q Quit",
            Frame::Active(_) | Frame::NoImages => {
                "←→ Image   SPACE Pause   R Restart   +- Duration   F/ESC Finish"
            }
            Frame::Win { .. } => "ENTER Menu",
        };
        self.front.put_str(1, row, help, DIM);
        if pad_connected {
            self.front.put_right(row, "[pad]", DIM);
        }
    }
}

/// Kind of screen, ignoring the frame's contents.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Screen {
    Menu,
    Game,
    Win,
}

fn screen_kind(frame: &Frame<'_>) -> Screen {
    match frame {
        Frame::Menu { .. } => Screen::Menu,
        Frame::Active(_) | Frame::NoImages => Screen::Game,
        Frame::Win { .. } => Screen::Win,
    }
}

/// Draw `texture` pixelated into `rows` terminal rows starting at `top`,
/// centred horizontally, two image pixels per cell.
fn draw_pixelated(buf: &mut FrameBuffer, texture: &RgbImage, top: usize, rows: usize, pixel_size: f32) {
    let (vw, vh) = (buf.width as u32, rows as u32 * 2);
    let rect = fit(texture.width(), texture.height(), vw, vh);
    if rect.w == 0 || rect.h == 0 {
        return;
    }
    let sampler = Sampler::new(texture.width(), texture.height(), rect.w, rect.h, pixel_size);
    let pixel = |vx: u32, vy: u32| -> [u8; 3] {
        let inside = vx >= rect.x && vx < rect.x + rect.w && vy >= rect.y && vy < rect.y + rect.h;
        if !inside {
            return BASE_RGB;
        }
        let (sx, sy) = sampler.sample(vx - rect.x, vy - rect.y);
        texture.get_pixel(sx, sy).0
    };

    let first_row = rect.y / 2;
    let last_row = (rect.y + rect.h).div_ceil(2);
    for row in first_row..last_row {
        for vx in rect.x..rect.x + rect.w {
            let cell = Cell::pixels(pixel(vx, row * 2), pixel(vx, row * 2 + 1));
            buf.set(vx as usize, top + row as usize, cell);
        }
    }
}
