//! Joypad (player input) functions and structures.

use std::io::Cursor;

use dotmatrix_common::{
    data::{read_u8, write_u8},
    error::Error,
};

use crate::{
    mmu::BusComponent,
    state::{StateComponent, StateFormat},
};

pub struct Joypad {
    down: bool,
    up: bool,
    left: bool,
    right: bool,
    start: bool,
    select: bool,
    b: bool,
    a: bool,
    selection: JoypadSelection,

    /// Set whenever a key transitions from released to pressed while
    /// its selection line is active, signalling the joypad interrupt.
    int_pad: bool,
}

#[derive(Clone, Copy, PartialEq)]
pub enum JoypadSelection {
    Action,
    Direction,
}

pub enum JoypadKey {
    Up,
    Down,
    Left,
    Right,
    Start,
    Select,
    A,
    B,
}

impl Joypad {
    pub fn new() -> Self {
        Self {
            down: false,
            up: false,
            left: false,
            right: false,
            start: false,
            select: false,
            b: false,
            a: false,
            selection: JoypadSelection::Action,
            int_pad: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn int_pad(&self) -> bool {
        self.int_pad
    }

    pub fn set_int_pad(&mut self, value: bool) {
        self.int_pad = value;
    }

    pub fn ack_pad(&mut self) {
        self.int_pad = false;
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr & 0x00ff {
            0x0000 => {
                let mut value;
                match self.selection {
                    JoypadSelection::Action => {
                        value = if self.a { 0x00 } else { 0x01 }
                            | if self.b { 0x00 } else { 0x02 }
                            | if self.select { 0x00 } else { 0x04 }
                            | if self.start { 0x00 } else { 0x08 }
                    }
                    JoypadSelection::Direction => {
                        value = if self.right { 0x00 } else { 0x01 }
                            | if self.left { 0x00 } else { 0x02 }
                            | if self.up { 0x00 } else { 0x04 }
                            | if self.down { 0x00 } else { 0x08 }
                    }
                }
                value |= if self.selection == JoypadSelection::Direction {
                    0x10
                } else {
                    0x00
                } | if self.selection == JoypadSelection::Action {
                    0x20
                } else {
                    0x00
                };
                value
            }
            addr => panic!("Reading from unknown Joypad location 0x{:04x}", addr),
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr & 0x00ff {
            0x0000 => {
                self.selection = if value & 0x10 == 0x00 {
                    JoypadSelection::Direction
                } else {
                    JoypadSelection::Action
                }
            }
            addr => panic!("Writing to unknown Joypad location 0x{:04x}", addr),
        }
    }

    /// Marks a key as pressed, raising the joypad interrupt when the key's
    /// selection line (Action or Direction) is the one currently active,
    /// matching the real hardware's edge-triggered behaviour.
    pub fn key_press(&mut self, key: JoypadKey) {
        let selection = self.key_selection(&key);
        self.set_key(&key, true);
        if selection == self.selection {
            self.int_pad = true;
        }
    }

    pub fn key_lift(&mut self, key: JoypadKey) {
        self.set_key(&key, false);
    }

    fn key_selection(&self, key: &JoypadKey) -> JoypadSelection {
        match key {
            JoypadKey::Up | JoypadKey::Down | JoypadKey::Left | JoypadKey::Right => {
                JoypadSelection::Direction
            }
            JoypadKey::Start | JoypadKey::Select | JoypadKey::A | JoypadKey::B => {
                JoypadSelection::Action
            }
        }
    }

    fn set_key(&mut self, key: &JoypadKey, value: bool) {
        match key {
            JoypadKey::Up => self.up = value,
            JoypadKey::Down => self.down = value,
            JoypadKey::Left => self.left = value,
            JoypadKey::Right => self.right = value,
            JoypadKey::Start => self.start = value,
            JoypadKey::Select => self.select = value,
            JoypadKey::A => self.a = value,
            JoypadKey::B => self.b = value,
        }
    }
}

impl Default for Joypad {
    fn default() -> Self {
        Self::new()
    }
}

impl StateComponent for Joypad {
    fn state(&self, _format: Option<StateFormat>) -> Result<Vec<u8>, Error> {
        let mut cursor = Cursor::new(vec![]);
        let buttons = (self.up as u8)
            | ((self.down as u8) << 1)
            | ((self.left as u8) << 2)
            | ((self.right as u8) << 3)
            | ((self.start as u8) << 4)
            | ((self.select as u8) << 5)
            | ((self.a as u8) << 6)
            | ((self.b as u8) << 7);
        write_u8(&mut cursor, buttons)?;
        write_u8(
            &mut cursor,
            match self.selection {
                JoypadSelection::Action => 0,
                JoypadSelection::Direction => 1,
            },
        )?;
        write_u8(&mut cursor, self.int_pad as u8)?;
        Ok(cursor.into_inner())
    }

    fn set_state(&mut self, data: &[u8], _format: Option<StateFormat>) -> Result<(), Error> {
        let mut cursor = Cursor::new(data);
        let buttons = read_u8(&mut cursor)?;
        self.up = buttons & 0x01 != 0;
        self.down = buttons & 0x02 != 0;
        self.left = buttons & 0x04 != 0;
        self.right = buttons & 0x08 != 0;
        self.start = buttons & 0x10 != 0;
        self.select = buttons & 0x20 != 0;
        self.a = buttons & 0x40 != 0;
        self.b = buttons & 0x80 != 0;
        self.selection = match read_u8(&mut cursor)? {
            1 => JoypadSelection::Direction,
            _ => JoypadSelection::Action,
        };
        self.int_pad = read_u8(&mut cursor)? != 0;
        Ok(())
    }
}

impl BusComponent for Joypad {
    fn read(&self, addr: u16) -> u8 {
        self.read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.write(addr, value)
    }
}
