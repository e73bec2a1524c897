/*
 * This file is part of moeselect.
 * Copyright (C) 2021 fence.
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */
use std::error::Error;
use std::thread;
use std::time::Duration;

use rgb::RGB8;
use x11rb::atom_manager;
use x11rb::connection::Connection;
use x11rb::errors::{ReplyError, ReplyOrIdError};
use x11rb::protocol::xproto::{ConnectionExt as _, *};
use x11rb::protocol::Event;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::xcb_ffi::XCBConnection;

use crate::config::{Config, Font, Position};
use crate::draw::{self, DrawCommand, Frame, TextMeasure};
use crate::keys::{self, Key, Modifiers};
use crate::menu::{Menu, Outcome, Status};
use crate::{Selection, UserInterface};

atom_manager! {
    pub AtomCollection: AtomCollectionCookie {
        _NET_WM_NAME,
        UTF8_STRING,
    }
}

const TITLE: &str = "moeselect";
const GRAB_ATTEMPTS: usize = 1000;

const SHIFT_MASK: u16 = 1;
const CONTROL_MASK: u16 = 1 << 2;
const MOD1_MASK: u16 = 1 << 3;

pub struct XorgUserInterface {
    connection: XCBConnection,
    window: Window,
    width: u16,
    height: u16,
    surface: cairo::XCBSurface,
    keymap: Keymap,
    font: Font,
    config: Config,
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct xcb_visualtype_t {
    pub visual_id: u32,
    pub class: u8,
    pub bits_per_rgb_value: u8,
    pub colormap_entries: u16,
    pub red_mask: u32,
    pub green_mask: u32,
    pub blue_mask: u32,
    pub pad0: [u8; 4],
}

impl From<Visualtype> for xcb_visualtype_t {
    fn from(value: Visualtype) -> xcb_visualtype_t {
        xcb_visualtype_t {
            visual_id: value.visual_id,
            class: value.class.into(),
            bits_per_rgb_value: value.bits_per_rgb_value,
            colormap_entries: value.colormap_entries,
            red_mask: value.red_mask,
            green_mask: value.green_mask,
            blue_mask: value.blue_mask,
            pad0: [0; 4],
        }
    }
}

/// Find a `xcb_visualtype_t` based on its ID number
fn find_xcb_visualtype(conn: &impl Connection, visual_id: u32) -> Option<xcb_visualtype_t> {
    conn.setup()
        .roots
        .iter()
        .flat_map(|root| &root.allowed_depths)
        .flat_map(|depth| &depth.visuals)
        .find(|visual| visual.visual_id == visual_id)
        .map(|visual| (*visual).into())
}

/// Keycode to keysym table, fetched once at startup.
struct Keymap {
    min_keycode: u8,
    per_keycode: usize,
    keysyms: Vec<Keysym>,
}

impl Keymap {
    fn load(conn: &impl Connection) -> Result<Keymap, ReplyError> {
        let setup = conn.setup();
        let (min, max) = (setup.min_keycode, setup.max_keycode);
        let reply = conn.get_keyboard_mapping(min, max - min + 1)?.reply()?;
        Ok(Keymap {
            min_keycode: min,
            per_keycode: reply.keysyms_per_keycode as usize,
            keysyms: reply.keysyms,
        })
    }

    fn keysym(&self, keycode: u8, column: usize) -> Keysym {
        if keycode < self.min_keycode || column >= self.per_keycode {
            return 0;
        }
        let at = (keycode - self.min_keycode) as usize * self.per_keycode + column;
        self.keysyms.get(at).copied().unwrap_or(0)
    }

    fn translate(&self, keycode: u8, state: u16) -> Option<(Key, Modifiers)> {
        let mods = Modifiers {
            shift: state & SHIFT_MASK != 0,
            ctrl: state & CONTROL_MASK != 0,
            alt: state & MOD1_MASK != 0,
        };
        let base = self.keysym(keycode, 0);
        let shifted = self.keysym(keycode, 1);
        let key = match (mods.shift, shifted) {
            (true, 0) => match keysym_to_key(base)? {
                Key::Char(c) => Key::Char(c.to_uppercase().next().unwrap_or(c)),
                other => other,
            },
            (true, sym) => keysym_to_key(sym).or_else(|| keysym_to_key(base))?,
            (false, _) => keysym_to_key(base)?,
        };
        Some((key, mods))
    }
}

fn keysym_to_key(keysym: Keysym) -> Option<Key> {
    let key = match keysym {
        0xff0d | 0xff8d => Key::Return,
        0xff1b => Key::Escape,
        0xff09 | 0xfe20 => Key::Tab,
        0xff08 => Key::Backspace,
        0xffff | 0xff9f => Key::Delete,
        0xff50 | 0xff95 => Key::Home,
        0xff51 | 0xff96 => Key::Left,
        0xff52 | 0xff97 => Key::Up,
        0xff53 | 0xff98 => Key::Right,
        0xff54 | 0xff99 => Key::Down,
        0xff55 | 0xff9a => Key::PageUp,
        0xff56 | 0xff9b => Key::PageDown,
        0xff57 | 0xff9c => Key::End,
        0x20..=0x7e | 0xa0..=0xff => Key::Char(std::char::from_u32(keysym)?),
        0x0100_0100..=0x0110_ffff => Key::Char(std::char::from_u32(keysym - 0x0100_0000)?),
        _ => return None,
    };
    Some(key)
}

/// Font metrics straight from a cairo context.
struct CairoMeasure<'a> {
    cr: &'a cairo::Context,
    line_height: f64,
}

impl<'a> CairoMeasure<'a> {
    fn new(cr: &'a cairo::Context, font: &Font) -> Self {
        cr.select_font_face(&font.family, cairo::FontSlant::Normal, cairo::FontWeight::Normal);
        // points to pixels at 96 dpi
        cr.set_font_size(font.size * 96.0 / 72.0);
        let line_height = cr.font_extents().height;
        CairoMeasure { cr, line_height }
    }
}

impl TextMeasure for CairoMeasure<'_> {
    fn text_width(&self, text: &str) -> f64 {
        self.cr.text_extents(text).x_advance
    }

    fn line_height(&self) -> f64 {
        self.line_height
    }
}

fn set_color(cr: &cairo::Context, rgb: RGB8) {
    let convert = |x| 1.0 / 255.0 * (x as f64);
    cr.set_source_rgb(convert(rgb.r), convert(rgb.g), convert(rgb.b));
}

fn paint(cr: &cairo::Context, frame: &Frame) {
    let extents = cr.font_extents();
    let baseline = (frame.row_height - extents.height) / 2.0 + extents.ascent;
    cr.set_operator(cairo::Operator::Source);
    for command in &frame.commands {
        match command {
            DrawCommand::Rect {
                x,
                y,
                width,
                height,
                color,
            } => {
                set_color(cr, *color);
                cr.rectangle(*x, *y, *width, *height);
                cr.fill();
            }
            DrawCommand::Text { x, y, text, color } => {
                set_color(cr, *color);
                cr.move_to(*x, *y + baseline);
                cr.show_text(text);
            }
        }
    }
}

/// Measures the configured font off-screen so the window can be sized
/// before it exists.
fn window_height(config: &Config, font: &Font) -> Result<u16, Box<dyn Error>> {
    let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, 1, 1)
        .map_err(|e| format!("cannot create measuring surface: {:?}", e))?;
    let cr = cairo::Context::new(&surface);
    let measure = CairoMeasure::new(&cr, font);
    Ok(draw::frame_height(config, &measure).ceil() as u16)
}

fn create_window<C>(
    conn: &C,
    screen: &Screen,
    atoms: &AtomCollection,
    (x, y, width, height): (i16, i16, u16, u16),
) -> Result<Window, ReplyOrIdError>
where
    C: Connection,
{
    let window = conn.generate_id()?;
    let win_aux = CreateWindowAux::new()
        .event_mask(EventMask::EXPOSURE | EventMask::KEY_PRESS | EventMask::VISIBILITY_CHANGE)
        .background_pixel(screen.black_pixel)
        .override_redirect(1);
    conn.create_window(
        screen.root_depth,
        window,
        screen.root,
        x,
        y,
        width,
        height,
        0,
        WindowClass::INPUT_OUTPUT,
        screen.root_visual,
        &win_aux,
    )?;

    conn.change_property8(
        PropMode::REPLACE,
        window,
        AtomEnum::WM_NAME,
        AtomEnum::STRING,
        TITLE.as_bytes(),
    )?;
    conn.change_property8(
        PropMode::REPLACE,
        window,
        atoms._NET_WM_NAME,
        atoms.UTF8_STRING,
        TITLE.as_bytes(),
    )?;
    conn.change_property8(
        PropMode::REPLACE,
        window,
        AtomEnum::WM_CLASS,
        AtomEnum::STRING,
        b"moeselect\0moeselect\0",
    )?;

    conn.map_window(window)?;
    Ok(window)
}

/// Another client may still hold the keyboard right after launch (a hotkey
/// daemon, usually), so keep asking for a while.
fn grab_keyboard(conn: &impl Connection, root: Window) -> Result<(), Box<dyn Error>> {
    for attempt in 0..GRAB_ATTEMPTS {
        let reply = conn
            .grab_keyboard(true, root, x11rb::CURRENT_TIME, GrabMode::ASYNC, GrabMode::ASYNC)?
            .reply()?;
        if reply.status == GrabStatus::SUCCESS {
            return Ok(());
        }
        tracing::debug!(attempt, "keyboard grab refused, retrying");
        thread::sleep(Duration::from_millis(1));
    }
    Err("cannot grab keyboard".into())
}

impl XorgUserInterface {
    pub fn new(config: &Config) -> Result<XorgUserInterface, Box<dyn Error>> {
        let font = config.font()?;
        let (conn, screen_num) = XCBConnection::connect(None)?;
        let screen = &conn.setup().roots[screen_num];
        let atoms = AtomCollection::new(&conn)?.reply()?;
        let keymap = Keymap::load(&conn)?;

        let width = screen.width_in_pixels;
        let height = window_height(config, &font)?;
        let y = match config.position {
            Position::Top => 0,
            Position::Bottom => screen.height_in_pixels.saturating_sub(height) as i16,
        };
        grab_keyboard(&conn, screen.root)?;
        let window = create_window(&conn, screen, &atoms, (0, y, width, height))?;
        conn.set_input_focus(InputFocus::PARENT, window, x11rb::CURRENT_TIME)?;

        let mut visual = find_xcb_visualtype(&conn, screen.root_visual)
            .ok_or("root visual is missing from the setup")?;
        // SAFETY: cairo-rs just passes the pointer to C code and C code uses the xcb_connection_t, so
        // "nothing really" happens here, except that the borrow checked cannot check the lifetimes.
        let cairo_conn =
            unsafe { cairo::XCBConnection::from_raw_none(conn.get_raw_xcb_connection() as _) };
        let visual = unsafe { cairo::XCBVisualType::from_raw_none(&mut visual as *mut _ as _) };
        let surface = cairo::XCBSurface::create(
            &cairo_conn,
            &cairo::XCBDrawable(window),
            &visual,
            width.into(),
            height.into(),
        )
        .map_err(|e| format!("cannot create window surface: {:?}", e))?;

        Ok(XorgUserInterface {
            connection: conn,
            window,
            width,
            height,
            surface,
            keymap,
            font,
            config: config.clone(),
        })
    }

    fn redraw(&self, menu: &mut Menu) {
        let cr = cairo::Context::new(&self.surface);
        let measure = CairoMeasure::new(&cr, &self.font);
        let frame = draw::render(menu, &self.config, &measure, self.width as f64);
        menu.set_page_len(frame.visible.len());
        paint(&cr, &frame);
        self.surface.flush();
    }
}

impl Drop for XorgUserInterface {
    fn drop(&mut self) {
        let _ = self.connection.ungrab_keyboard(x11rb::CURRENT_TIME);
        let _ = self.connection.destroy_window(self.window);
        let _ = self.connection.flush();
    }
}

impl UserInterface for XorgUserInterface {
    fn run(
        &mut self,
        menu: &mut Menu,
        emit: &mut dyn FnMut(&Selection),
    ) -> Result<Outcome, Box<dyn Error>> {
        tracing::debug!(width = self.width, height = self.height, "window mapped");
        self.redraw(menu);
        loop {
            self.connection.flush()?;
            let event = self.connection.wait_for_event()?;
            let mut event_option = Some(event);
            let mut need_redraw = false;
            while let Some(event) = event_option {
                match event {
                    Event::Expose(_) => need_redraw = true,
                    Event::VisibilityNotify(e) if e.state != Visibility::UNOBSCURED => {
                        self.connection.configure_window(
                            self.window,
                            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
                        )?;
                    }
                    Event::KeyPress(e) => {
                        let pressed = self.keymap.translate(e.detail, u16::from(e.state));
                        if let Some((key, mods)) = pressed {
                            match keys::dispatch(menu, key, mods) {
                                Status::Running => {}
                                Status::Emit(selection) => emit(&selection),
                                Status::Finished(outcome) => return Ok(outcome),
                            }
                            need_redraw = true;
                        }
                    }
                    Event::Error(e) => tracing::warn!("unexpected X11 error: {:?}", e),
                    _ => {}
                }
                event_option = self.connection.poll_for_event()?;
            }
            if need_redraw {
                self.redraw(menu);
            }
        }
    }
}
