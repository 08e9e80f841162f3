//! Game Boy emulation entrypoint and associated functions and structures.
//!
//! Most of the meaningful publicly available functions and structures to build
//! a working emulator should be present here.
//!
//! # Examples
//!
//! Creates a simple [`Machine`] instance and boots the boot ROM. Does that by
//! clocking the CPU until PC reaches 0x0100 (post boot address).
//!
//! ```rust
//! use dotmatrix::machine::{Machine, SystemMode};
//! let mut game_boy = Machine::new(Some(SystemMode::Dmg));
//! game_boy.load(true).unwrap();
//! game_boy.load_rom_empty().unwrap();
//! let cycles = game_boy.step_to(0x0100);
//! println!("Ran {} cycles", cycles);
//! ```

use dotmatrix_common::error::Error;
use std::{
    collections::VecDeque,
    fmt::{self, Display, Formatter},
    io::Cursor,
    sync::{Arc, Mutex},
};

use dotmatrix_common::{
    data::{read_bytes, read_u32, write_bytes, write_u32},
    util::{read_file, SharedThread},
};

use crate::{
    audio::SoundChip,
    cpu::Cpu,
    devices::stdout::StdoutDevice,
    dma::Dma,
    info::Info,
    joypad::{Joypad, JoypadKey},
    mmu::Mmu,
    cartridge::{Cartridge, RamSize},
    serial::{NullDevice, Serial, SerialDevice},
    state::{StateComponent, StateFormat},
    timer::Timer,
    video::{
        VideoChip, VideoMode, Tile, DISPLAY_HEIGHT, DISPLAY_WIDTH, FRAME_BUFFER_RGB1555_SIZE,
        FRAME_BUFFER_RGB565_SIZE, FRAME_BUFFER_SIZE, FRAME_BUFFER_XRGB8888_SIZE,
    },
};

/// Marks the boundary between save-state sections, making truncated or
/// otherwise corrupted save files fail fast on restore instead of
/// silently desyncing a component from the one written after it.
const STATE_SECTION_MARKER: u32 = 0xdead_beef;

/// Bumped whenever the section layout written by [`Machine::snapshot`]
/// changes in a way older [`Machine::restore`] implementations can't read.
const STATE_VERSION: u32 = 1;

/// Enumeration that describes the multiple running
// modes of the Game Boy emulator.
// DMG = Original Game Boy
// CGB = Game Boy Color
// SGB = Super Game Boy
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SystemMode {
    Dmg = 1,
    Cgb = 2,
    Sgb = 3,
}

impl SystemMode {
    pub fn description(&self) -> &'static str {
        match self {
            SystemMode::Dmg => "Game Boy (DMG)",
            SystemMode::Cgb => "Game Boy Color (CGB)",
            SystemMode::Sgb => "Super Game Boy (SGB)",
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => SystemMode::Dmg,
            2 => SystemMode::Cgb,
            3 => SystemMode::Sgb,
            _ => panic!("Invalid mode value: {}", value),
        }
    }

    pub fn from_string(value: &str) -> Self {
        match value {
            "dmg" | "DMG" => SystemMode::Dmg,
            "cgb" | "CGB" => SystemMode::Cgb,
            "sgb" | "SGB" => SystemMode::Sgb,
            _ => panic!("Invalid mode value: {}", value),
        }
    }

    pub fn to_string(&self, uppercase: Option<bool>) -> String {
        let uppercase = uppercase.unwrap_or(false);
        match self {
            SystemMode::Dmg => (if uppercase { "DMG" } else { "dmg" }).to_string(),
            SystemMode::Cgb => (if uppercase { "CGB" } else { "cgb" }).to_string(),
            SystemMode::Sgb => (if uppercase { "SGB" } else { "sgb" }).to_string(),
        }
    }

    pub fn is_dmg(&self) -> bool {
        *self == SystemMode::Dmg
    }

    pub fn is_cgb(&self) -> bool {
        *self == SystemMode::Cgb
    }

    pub fn is_sgb(&self) -> bool {
        *self == SystemMode::Sgb
    }
}

impl Display for SystemMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl From<u8> for SystemMode {
    fn from(value: u8) -> Self {
        Self::from_u8(value)
    }
}

impl From<&str> for SystemMode {
    fn from(value: &str) -> Self {
        Self::from_string(value)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ClockSpeed {
    Normal = 0,
    Double = 1,
}

impl ClockSpeed {
    pub fn description(&self) -> &'static str {
        match self {
            ClockSpeed::Normal => "Normal Speed",
            ClockSpeed::Double => "Double Speed",
        }
    }

    pub fn switch(&self) -> Self {
        match self {
            ClockSpeed::Normal => ClockSpeed::Double,
            ClockSpeed::Double => ClockSpeed::Normal,
        }
    }

    pub fn multiplier(&self) -> u8 {
        match self {
            ClockSpeed::Normal => 1,
            ClockSpeed::Double => 2,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => ClockSpeed::Normal,
            1 => ClockSpeed::Double,
            _ => panic!("Invalid speed value: {}", value),
        }
    }
}

impl Display for ClockSpeed {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl From<u8> for ClockSpeed {
    fn from(value: u8) -> Self {
        Self::from_u8(value)
    }
}

/// Identifies the boot ROM variant that was (or should be) mapped
/// into the system's memory before the cartridge starts executing.
///
/// None of these variants ship with embedded firmware images, boot
/// ROMs are always loaded from an external file supplied by the host
/// application through [`Machine::load_boot_path`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BootRom {
    Dmg,
    Sgb,
    DmgBootix,
    MgbBootix,
    Cgb,
    Other,
    None,
}

impl BootRom {
    pub fn description(&self) -> &'static str {
        match self {
            BootRom::Dmg => "DMG",
            BootRom::Sgb => "SGB",
            BootRom::DmgBootix => "DMG Bootix",
            BootRom::MgbBootix => "MGB Bootix",
            BootRom::Cgb => "CGB",
            BootRom::Other => "Other",
            BootRom::None => "None",
        }
    }

    pub fn is_dmg_compat(&self) -> bool {
        matches!(
            self,
            BootRom::Dmg | BootRom::Sgb | BootRom::DmgBootix | BootRom::MgbBootix | BootRom::Other
        )
    }

    pub fn is_cgb_compat(&self) -> bool {
        matches!(self, BootRom::Cgb | BootRom::Other)
    }

    /// Whether this boot ROM remains valid when switching into `mode`,
    /// used to decide if a previously loaded boot ROM can be reused
    /// across a [`Machine::reload`].
    pub fn reusable(&self, mode: SystemMode) -> Option<BootRom> {
        match (self, mode) {
            (BootRom::None, _) => None,
            (boot_rom, SystemMode::Dmg | SystemMode::Sgb) if boot_rom.is_dmg_compat() => {
                Some(*boot_rom)
            }
            (boot_rom, SystemMode::Cgb) if boot_rom.is_cgb_compat() => Some(*boot_rom),
            _ => None,
        }
    }
}

impl Display for BootRom {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    /// The current running mode of the emulator, this
    /// may affect many aspects of the emulation, like
    /// CPU frequency, PPU frequency, Boot rome size, etc.
    mode: SystemMode,

    /// If the PPU is enabled, it will be clocked.
    ppu_enabled: bool,

    /// If the APU is enabled, it will be clocked.
    apu_enabled: bool,

    /// if the DMA is enabled, it will be clocked.
    dma_enabled: bool,

    /// If the timer is enabled, it will be clocked.
    timer_enabled: bool,

    /// If the serial is enabled, it will be clocked.
    serial_enabled: bool,

    /// The current frequency at which the Game Boy
    /// emulator is being handled. This is a "hint" that
    /// may help components to adjust their internal
    /// logic to match the current frequency. For example
    /// the APU will adjust its internal clock to match
    /// this hint.
    clock_freq: u32,
}

impl MachineConfig {
    pub fn is_dmg(&self) -> bool {
        self.mode == SystemMode::Dmg
    }

    pub fn is_cgb(&self) -> bool {
        self.mode == SystemMode::Cgb
    }

    pub fn is_sgb(&self) -> bool {
        self.mode == SystemMode::Sgb
    }

    pub fn mode(&self) -> SystemMode {
        self.mode
    }

    pub fn set_mode(&mut self, value: SystemMode) {
        self.mode = value;
    }

    pub fn ppu_enabled(&self) -> bool {
        self.ppu_enabled
    }

    pub fn set_ppu_enabled(&mut self, value: bool) {
        self.ppu_enabled = value;
    }

    pub fn apu_enabled(&self) -> bool {
        self.apu_enabled
    }

    pub fn set_apu_enabled(&mut self, value: bool) {
        self.apu_enabled = value;
    }

    pub fn dma_enabled(&self) -> bool {
        self.dma_enabled
    }

    pub fn set_dma_enabled(&mut self, value: bool) {
        self.dma_enabled = value;
    }

    pub fn timer_enabled(&self) -> bool {
        self.timer_enabled
    }

    pub fn set_timer_enabled(&mut self, value: bool) {
        self.timer_enabled = value;
    }

    pub fn serial_enabled(&self) -> bool {
        self.serial_enabled
    }

    pub fn set_serial_enabled(&mut self, value: bool) {
        self.serial_enabled = value;
    }

    pub fn clock_freq(&self) -> u32 {
        self.clock_freq
    }

    pub fn set_clock_freq(&mut self, value: u32) {
        self.clock_freq = value;
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            mode: SystemMode::Dmg,
            ppu_enabled: true,
            apu_enabled: true,
            dma_enabled: true,
            timer_enabled: true,
            serial_enabled: true,
            clock_freq: Machine::CPU_FREQ,
        }
    }
}

/// Aggregation structure allowing the bundling of
/// all the components of a Machine into a single
/// element for easy access.
pub struct Components {
    pub ppu: VideoChip,
    pub apu: SoundChip,
    pub dma: Dma,
    pub pad: Joypad,
    pub timer: Timer,
    pub serial: Serial,
}

pub struct Registers {
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub scy: u8,
    pub scx: u8,
    pub wy: u8,
    pub wx: u8,
    pub ly: u8,
    pub lyc: u8,
}

pub trait AudioProvider {
    fn audio_output(&self) -> u8;
    fn audio_buffer(&self) -> &VecDeque<u8>;
    fn clear_audio_buffer(&mut self);
}

pub struct ClockFrame {
    pub cycles: u64,
    pub frames: u16,
    frame_buffer: Option<Vec<u8>>,
}

impl ClockFrame {
    pub fn frame_buffer_eager(&mut self) -> Option<Vec<u8>> {
        self.frame_buffer.take()
    }
}

/// Top level structure that abstracts the usage of the
/// Game Boy system under the Dotmatrix emulator.
///
/// Should serve as the main entry-point API.
pub struct Machine {
    /// The current running mode of the emulator, this
    /// may affect many aspects of the emulation, like
    /// CPU frequency, PPU frequency, Boot rome size, etc.
    ///
    /// This is a clone of the configuration value
    /// kept for performance reasons.
    mode: SystemMode,

    /// If the PPU is enabled, it will be clocked.
    ///
    /// This is a clone of the configuration value
    /// kept for performance reasons.
    ppu_enabled: bool,

    /// If the APU is enabled, it will be clocked.
    ///
    /// This is a clone of the configuration value
    /// kept for performance reasons.
    apu_enabled: bool,

    /// If the DMA is enabled, it will be clocked.
    ///
    /// This is a clone of the configuration value
    /// kept for performance reasons.
    dma_enabled: bool,

    /// If the timer is enabled, it will be clocked.
    ///
    /// This is a clone of the configuration value
    /// kept for performance reasons.
    timer_enabled: bool,

    /// If the serial is enabled, it will be clocked.
    ///
    /// This is a clone of the configuration value
    /// kept for performance reasons.
    serial_enabled: bool,

    /// The current frequency at which the Game Boy
    /// emulator is being handled. This is a "hint" that
    /// may help components to adjust their internal
    /// logic to match the current frequency. For example
    /// the APU will adjust its internal clock to match
    /// this hint.
    ///
    /// This is a clone of the configuration value
    /// kept for performance reasons.
    clock_freq: u32,

    /// The boot ROM that will (or was) used to boot the
    /// current Game Boy system.
    ///
    /// This should be explicitly set by the developed when
    /// set the boot ROM in the system's memory.
    ///
    /// The loading process used to load the boot ROM is not
    /// taken in consideration for this value.
    boot_rom: BootRom,

    /// Reference to the Game Boy CPU component to be
    /// used as the main element of the system, when
    /// clocked, the amount of ticks from it will be
    /// used as reference or the rest of the components.
    cpu: Cpu,

    /// The reference counted and mutable reference to
    /// Game Boy configuration structure that can be
    /// used by the GB components to access global
    /// configuration values on the current emulator.
    ///
    /// If performance is required (may value access)
    /// the values should be cloned and stored locally.
    gbc: SharedThread<MachineConfig>,

    /// Host-controlled flag inspected between CPU instructions by
    /// `run_until`, allowing the host to request a cooperative stop
    /// with bounded latency.
    paused: bool,

    /// Number of simulated frames per `FrameReady` handed back to the
    /// host. `1` (the default) reports every frame; higher values let a
    /// host trade display smoothness for throughput on slow hardware
    /// without affecting game logic or audio, which keep ticking on the
    /// skipped frames.
    frame_skip: u32,
    frame_skip_counter: u32,
}

/// Reason a call to [`Machine::run_until`] returned control to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A full frame was rendered (a V-Blank boundary was crossed).
    FrameReady,
    /// The requested cycle budget was exhausted before a frame completed.
    CycleBudget,
    /// The host's pause flag was observed between two instructions.
    Paused,
    /// The CPU hit an undefined opcode and halted for good.
    Fatal,
}

impl Machine {
    pub fn new(mode: Option<SystemMode>) -> Self {
        let mode = mode.unwrap_or(SystemMode::Dmg);
        let gbc = Arc::new(Mutex::new(MachineConfig {
            mode,
            ppu_enabled: true,
            apu_enabled: true,
            dma_enabled: true,
            timer_enabled: true,
            serial_enabled: true,
            clock_freq: Machine::CPU_FREQ,
        }));

        let components = Components {
            ppu: VideoChip::new(mode, gbc.clone()),
            apu: SoundChip::default(),
            dma: Dma::default(),
            pad: Joypad::default(),
            timer: Timer::default(),
            serial: Serial::default(),
        };
        let mmu = Mmu::new(components, mode, gbc.clone());
        let cpu = Cpu::new(mmu, gbc.clone());

        Self {
            mode,
            boot_rom: BootRom::None,
            ppu_enabled: true,
            apu_enabled: true,
            dma_enabled: true,
            timer_enabled: true,
            serial_enabled: true,
            clock_freq: Machine::CPU_FREQ,
            cpu,
            gbc,
            paused: false,
            frame_skip: 1,
            frame_skip_counter: 0,
        }
    }

    pub fn verify_rom(data: &[u8]) -> bool {
        Cartridge::from_data(data).is_ok()
    }

    pub fn reset(&mut self) {
        self.ppu().reset();
        self.apu().reset();
        self.timer().reset();
        self.serial().reset();
        self.mmu().reset();
        self.cpu.reset();
    }

    pub fn reload(&mut self) {
        let rom = self.rom().clone();
        self.reset();
        self.load(true).unwrap();
        self.load_cartridge(rom).unwrap();
    }

    /// Advance the clock of the system by one tick, this will
    /// usually imply executing one CPU instruction and advancing
    /// all the other components of the system by the required
    /// amount of cycles.
    ///
    /// This method takes into account the current speed of the
    /// system (single or double) and will execute the required
    /// amount of cycles in the other components of the system
    /// accordingly.
    ///
    /// The amount of cycles executed by the CPU is returned.
    pub fn clock(&mut self) -> u16 {
        let cycles = self.cpu_clock() as u16;
        let cycles_n = cycles / self.multiplier() as u16;
        self.clock_devices(cycles, cycles_n);
        cycles
    }

    /// Risky function that will clock the CPU multiple times
    /// allowing an undefined number of cycles to be executed
    /// in the other Game Boy components.
    ///
    /// This can cause unwanted behaviour in components like
    /// the PPU where only one mode switch operation is expected
    /// per each clock call.
    ///
    /// At the end of this execution major synchronization issues
    /// may arise, so use with caution.
    pub fn clock_many(&mut self, count: usize) -> u16 {
        let mut cycles = 0u16;
        for _ in 0..count {
            cycles += self.cpu_clock() as u16;
        }
        let cycles_n = cycles / self.multiplier() as u16;
        self.clock_devices(cycles, cycles_n);
        cycles
    }

    /// Function equivalent to `clock()` but that allows pre-emptive
    /// breaking of the clock cycle loop if the PC (Program Counter)
    /// reaches the provided address, making sure that in such a situation
    /// the devices are not clocked.
    pub fn clock_step(&mut self, addr: u16) -> u16 {
        let cycles = self.cpu_clock() as u16;
        if self.cpu_i().pc() == addr {
            return cycles;
        }
        let cycles_n = cycles / self.multiplier() as u16;
        self.clock_devices(cycles, cycles_n);
        cycles
    }

    /// Equivalent to `clock()` but allows the execution of multiple
    /// clock operations in a single call.
    pub fn clocks(&mut self, count: usize) -> u64 {
        let mut cycles = 0_u64;
        for _ in 0..count {
            cycles += self.clock() as u64;
        }
        cycles
    }

    /// Clocks the emulator until the limit of cycles that has been
    /// provided and returns the amount of cycles that have been
    /// clocked.
    pub fn clocks_cycles(&mut self, limit: usize) -> u64 {
        let mut cycles = 0_u64;
        while cycles < limit as u64 {
            cycles += self.clock() as u64;
        }
        cycles
    }

    /// Clocks the emulator until the limit of cycles that has been
    /// provided and returns the amount of cycles that have been
    /// clocked together with the frame buffer of the PPU.
    ///
    /// Allows a caller to clock the emulator and at the same time
    /// retrieve the frame buffer of the PPU at the proper timing
    /// (on V-Blank).
    ///
    /// This method allows for complex foreign call optimizations
    /// by preventing the need to call the emulator clock multiple
    /// times to obtain the right frame buffer retrieval timing.
    pub fn clocks_frame_buffer(&mut self, limit: usize) -> ClockFrame {
        let mut cycles = 0_u64;
        let mut frames = 0_u16;
        let mut frame_buffer: Option<Vec<u8>> = None;
        let mut last_frame = self.ppu_frame();
        while cycles < limit as u64 {
            cycles += self.clock() as u64;
            if self.ppu_frame() != last_frame {
                frame_buffer = Some(self.frame_buffer().to_vec());
                last_frame = self.ppu_frame();
                frames += 1;
            }
        }
        ClockFrame {
            cycles,
            frames,
            frame_buffer,
        }
    }

    /// Cooperative host entry point: clocks the emulator until either a
    /// full frame has been produced, `max_cycles` have been spent, the
    /// host's pause flag is observed, or the CPU hits a fatal condition
    /// (an undefined opcode).
    ///
    /// This is the only suspension point a host needs to drive the
    /// emulator in real time: it returns once per frame boundary in the
    /// common case, handing the host a natural ~16.7ms yield point.
    pub fn run_until(&mut self, max_cycles: u64) -> StopReason {
        let mut cycles = 0_u64;
        let mut last_frame = self.ppu_frame();

        while cycles < max_cycles {
            if self.paused {
                return StopReason::Paused;
            }
            if self.cpu.is_fatal() {
                return StopReason::Fatal;
            }

            cycles += self.clock() as u64;

            let frame = self.ppu_frame();
            if frame != last_frame {
                last_frame = frame;
                self.frame_skip_counter += 1;
                if self.frame_skip_counter >= self.frame_skip {
                    self.frame_skip_counter = 0;
                    return StopReason::FrameReady;
                }
            }
        }

        StopReason::CycleBudget
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Sets how many simulated frames elapse between `FrameReady` results
    /// from `run_until`. `n` is clamped to at least `1`.
    pub fn set_frame_skip(&mut self, n: u32) {
        self.frame_skip = n.max(1);
        self.frame_skip_counter = 0;
    }

    pub fn frame_skip(&self) -> u32 {
        self.frame_skip
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn next_frame(&mut self) -> u32 {
        let mut cycles = 0u32;
        let current_frame = self.ppu_frame();
        while self.ppu_frame() == current_frame {
            cycles += self.clock() as u32;
        }
        cycles
    }

    pub fn step_to(&mut self, addr: u16) -> u32 {
        let mut cycles = 0u32;
        while self.cpu_i().pc() != addr {
            cycles += self.clock_step(addr) as u32;
        }
        cycles
    }

    #[inline(always)]
    fn clock_devices(&mut self, cycles: u16, cycles_n: u16) {
        if self.ppu_enabled {
            self.ppu_clock(cycles_n);
        }
        if self.apu_enabled {
            self.apu_clock(cycles_n);
        }
        if self.dma_enabled {
            self.dma_clock(cycles);
        }
        if self.timer_enabled {
            self.timer_clock(cycles);
        }
        if self.serial_enabled {
            self.serial_clock(cycles);
        }
    }

    pub fn key_press(&mut self, key: JoypadKey) {
        self.pad().key_press(key);
    }

    pub fn key_lift(&mut self, key: JoypadKey) {
        self.pad().key_lift(key);
    }

    /// Host-facing button toggle, equivalent to [`Machine::key_press`] /
    /// [`Machine::key_lift`] depending on `pressed`.
    pub fn set_button(&mut self, key: JoypadKey, pressed: bool) {
        if pressed {
            self.key_press(key);
        } else {
            self.key_lift(key);
        }
    }

    pub fn cpu_clock(&mut self) -> u8 {
        self.cpu.clock()
    }

    pub fn ppu_clock(&mut self, cycles: u16) {
        self.ppu().clock(cycles)
    }

    pub fn apu_clock(&mut self, cycles: u16) {
        self.apu().clock(cycles)
    }

    pub fn dma_clock(&mut self, cycles: u16) {
        self.mmu().clock_dma(cycles);
    }

    pub fn timer_clock(&mut self, cycles: u16) {
        self.timer().clock(cycles)
    }

    pub fn serial_clock(&mut self, cycles: u16) {
        self.serial().clock(cycles)
    }

    pub fn ppu_ly(&mut self) -> u8 {
        self.ppu().ly()
    }

    pub fn ppu_mode(&mut self) -> VideoMode {
        self.ppu().mode()
    }

    pub fn ppu_frame(&mut self) -> u16 {
        self.ppu().frame_index()
    }

    /// Direct boot method that immediately jumps the machine
    /// to the post boot state, this will effectively skip the
    /// boot sequence and jump to the cartridge execution.
    pub fn boot(&mut self) {
        self.load_boot_state();
    }

    /// Unsafe load strategy that will panic the current system
    /// in case there are boot ROM loading issues.
    pub fn load_unsafe(&mut self, boot: bool) {
        self.load(boot).unwrap();
    }

    /// Loads the machine directly to after the boot execution state,
    /// setting the state of the system accordingly and updating the
    /// Program Counter (PC) to the post boot address (0x0100).
    ///
    /// Should allow the machine to jump to the cartridge (ROM) execution
    /// directly, skipping the boot sequence.
    ///
    /// Currently supports only DMG machines.
    pub fn load_boot_state(&mut self) {
        self.cpu.boot();
    }

    pub fn vram_eager(&mut self) -> Vec<u8> {
        self.ppu().vram().to_vec()
    }

    pub fn hram_eager(&mut self) -> Vec<u8> {
        self.ppu().vram().to_vec()
    }

    pub fn frame_buffer_eager(&mut self) -> Vec<u8> {
        self.frame_buffer().to_vec()
    }

    pub fn frame_buffer_raw_eager(&mut self) -> Vec<u8> {
        self.frame_buffer_raw().to_vec()
    }

    pub fn audio_buffer_eager(&mut self, clear: bool) -> Vec<u8> {
        let buffer = Vec::from(self.audio_buffer().clone());
        if clear {
            self.clear_audio_buffer();
        }
        buffer
    }

    /// Hands the host the frame most recently completed by `run_until`.
    /// The returned reference is only valid until the next call that
    /// clocks the PPU, the host must copy it out before then.
    pub fn take_framebuffer(&mut self) -> &[u8; FRAME_BUFFER_SIZE] {
        self.frame_buffer()
    }

    /// Drains up to `out.len()` queued audio samples into `out`, converting
    /// the APU's unsigned 8-bit PCM output into signed samples. Returns the
    /// number of samples written, which is less than `out.len()` only when
    /// the internal buffer ran dry.
    pub fn take_audio(&mut self, out: &mut [i8]) -> usize {
        let buffer = self.apu().audio_buffer_mut();
        let count = out.len().min(buffer.len());
        for slot in out.iter_mut().take(count) {
            let sample = buffer.pop_front().unwrap_or(0x80);
            *slot = (sample as i16 - 0x80) as i8;
        }
        count
    }

    /// Returns the raw concatenation of all external RAM banks, suitable
    /// for persisting as a `.sav` file alongside the ROM.
    pub fn export_battery(&mut self) -> Vec<u8> {
        self.ram_data_eager()
    }

    pub fn audio_output(&self) -> u8 {
        self.apu_i().output()
    }

    pub fn audio_all_output(&self) -> Vec<u8> {
        vec![
            self.audio_output(),
            self.audio_ch1_output(),
            self.audio_ch2_output(),
            self.audio_ch3_output(),
            self.audio_ch4_output(),
        ]
    }

    pub fn audio_ch1_output(&self) -> u8 {
        self.apu_i().ch1_output()
    }

    pub fn audio_ch2_output(&self) -> u8 {
        self.apu_i().ch2_output()
    }

    pub fn audio_ch3_output(&self) -> u8 {
        self.apu_i().ch3_output()
    }

    pub fn audio_ch4_output(&self) -> u8 {
        self.apu_i().ch4_output()
    }

    pub fn audio_ch1_enabled(&self) -> bool {
        self.apu_i().ch2_out_enabled()
    }

    pub fn set_audio_ch1_enabled(&mut self, enabled: bool) {
        self.apu().set_ch1_out_enabled(enabled)
    }

    pub fn audio_ch2_enabled(&self) -> bool {
        self.apu_i().ch2_out_enabled()
    }

    pub fn set_audio_ch2_enabled(&mut self, enabled: bool) {
        self.apu().set_ch2_out_enabled(enabled)
    }

    pub fn audio_ch3_enabled(&self) -> bool {
        self.apu_i().ch3_out_enabled()
    }

    pub fn set_audio_ch3_enabled(&mut self, enabled: bool) {
        self.apu().set_ch3_out_enabled(enabled)
    }

    pub fn audio_ch4_enabled(&self) -> bool {
        self.apu_i().ch4_out_enabled()
    }

    pub fn set_audio_ch4_enabled(&mut self, enabled: bool) {
        self.apu().set_ch4_out_enabled(enabled)
    }

    pub fn audio_sampling_rate(&self) -> u16 {
        self.apu_i().sampling_rate()
    }

    pub fn audio_channels(&self) -> u8 {
        self.apu_i().channels()
    }

    pub fn cartridge_eager(&mut self) -> Cartridge {
        self.mmu().rom().clone()
    }

    pub fn ram_data_eager(&mut self) -> Vec<u8> {
        self.mmu().rom().ram_data_eager()
    }

    pub fn set_ram_data(&mut self, ram_data: Vec<u8>) {
        self.mmu().rom().set_ram_data(&ram_data)
    }

    pub fn registers(&mut self) -> Registers {
        let ppu_registers = self.ppu().registers();
        Registers {
            pc: self.cpu.pc,
            sp: self.cpu.sp,
            a: self.cpu.a,
            b: self.cpu.b,
            c: self.cpu.c,
            d: self.cpu.d,
            e: self.cpu.e,
            h: self.cpu.h,
            l: self.cpu.l,
            scy: ppu_registers.scy,
            scx: ppu_registers.scx,
            wy: ppu_registers.wy,
            wx: ppu_registers.wx,
            ly: ppu_registers.ly,
            lyc: ppu_registers.lyc,
        }
    }

    /// Obtains the tile structure for the tile at the
    /// given index, no conversion in the pixel buffer
    /// is done so that the color reference is the GB one.
    pub fn get_tile(&mut self, index: usize) -> Tile {
        self.ppu().tiles()[index]
    }

    /// Obtains the pixel buffer for the tile at the
    /// provided index, converting the color buffer
    /// using the currently loaded (background) palette.
    pub fn get_tile_buffer(&mut self, index: usize) -> Vec<u8> {
        let tile = self.get_tile(index);
        tile.palette_buffer(self.ppu().palette_bg())
    }

    pub fn is_dmg(&self) -> bool {
        self.mode == SystemMode::Dmg
    }

    pub fn is_cgb(&self) -> bool {
        self.mode == SystemMode::Cgb
    }

    pub fn is_sgb(&self) -> bool {
        self.mode == SystemMode::Sgb
    }

    pub fn speed(&self) -> ClockSpeed {
        self.mmu_i().speed()
    }

    pub fn multiplier(&self) -> u8 {
        self.mmu_i().speed().multiplier()
    }

    pub fn mode(&self) -> SystemMode {
        self.mode
    }

    pub fn set_mode(&mut self, value: SystemMode) {
        self.mode = value;
        (*self.gbc).lock().unwrap().set_mode(value);
        self.mmu().set_mode(value);
        self.ppu().set_gb_mode(value);
    }

    pub fn ppu_enabled(&self) -> bool {
        self.ppu_enabled
    }

    pub fn set_ppu_enabled(&mut self, value: bool) {
        self.ppu_enabled = value;
        (*self.gbc).lock().unwrap().set_ppu_enabled(value);
    }

    pub fn apu_enabled(&self) -> bool {
        self.apu_enabled
    }

    pub fn set_apu_enabled(&mut self, value: bool) {
        self.apu_enabled = value;
        (*self.gbc).lock().unwrap().set_apu_enabled(value);
    }

    pub fn dma_enabled(&self) -> bool {
        self.dma_enabled
    }

    pub fn set_dma_enabled(&mut self, value: bool) {
        self.dma_enabled = value;
        (*self.gbc).lock().unwrap().set_dma_enabled(value);
    }

    pub fn timer_enabled(&self) -> bool {
        self.timer_enabled
    }

    pub fn set_timer_enabled(&mut self, value: bool) {
        self.timer_enabled = value;
        (*self.gbc).lock().unwrap().set_timer_enabled(value);
    }

    pub fn serial_enabled(&self) -> bool {
        self.serial_enabled
    }

    pub fn set_serial_enabled(&mut self, value: bool) {
        self.serial_enabled = value;
        (*self.gbc).lock().unwrap().set_serial_enabled(value);
    }

    pub fn set_all_enabled(&mut self, value: bool) {
        self.set_ppu_enabled(value);
        self.set_apu_enabled(value);
        self.set_dma_enabled(value);
        self.set_timer_enabled(value);
        self.set_serial_enabled(value);
    }

    pub fn clock_freq(&self) -> u32 {
        self.clock_freq
    }

    pub fn set_clock_freq(&mut self, value: u32) {
        self.clock_freq = value;
        (*self.gbc).lock().unwrap().set_clock_freq(value);
        self.apu().set_clock_freq(value);
    }

    pub fn clock_freq_s(&self) -> String {
        format!("{:.02} Mhz", self.clock_freq() as f32 / 1000.0 / 1000.0)
    }

    pub fn boot_rom(&self) -> BootRom {
        self.boot_rom
    }

    pub fn set_boot_rom(&mut self, value: BootRom) {
        self.boot_rom = value;
    }

    pub fn boot_rom_s(&self) -> String {
        String::from(self.boot_rom().description())
    }

    pub fn attach_null_serial(&mut self) {
        self.attach_serial(Box::<NullDevice>::default());
    }

    pub fn attach_stdout_serial(&mut self) {
        self.attach_serial(Box::<StdoutDevice>::default());
    }

    pub fn display_width(&self) -> usize {
        DISPLAY_WIDTH
    }

    pub fn display_height(&self) -> usize {
        DISPLAY_HEIGHT
    }

    pub fn ram_size(&self) -> RamSize {
        match self.mode {
            SystemMode::Dmg => RamSize::Size8K,
            SystemMode::Cgb => RamSize::Size32K,
            SystemMode::Sgb => RamSize::Size8K,
        }
    }

    pub fn vram_size(&self) -> RamSize {
        match self.mode {
            SystemMode::Dmg => RamSize::Size8K,
            SystemMode::Cgb => RamSize::Size16K,
            SystemMode::Sgb => RamSize::Size8K,
        }
    }

    pub fn description(&self, column_length: usize) -> String {
        let version_l = format!("{:width$}", "Version", width = column_length);
        let mode_l = format!("{:width$}", "Mode", width = column_length);
        let boot_rom_l = format!("{:width$}", "Boot ROM", width = column_length);
        let clock_l = format!("{:width$}", "Clock", width = column_length);
        let ram_size_l = format!("{:width$}", "RAM Size", width = column_length);
        let vram_size_l = format!("{:width$}", "VRAM Size", width = column_length);
        let serial_l = format!("{:width$}", "Serial", width = column_length);
        format!(
            "{}  {}\n{}  {}\n{}  {}\n{}  {}\n{}  {}\n{}  {}\n{}  {}",
            version_l,
            Info::version(),
            mode_l,
            self.mode(),
            boot_rom_l,
            self.boot_rom(),
            clock_l,
            self.clock_freq_s(),
            ram_size_l,
            self.ram_size(),
            vram_size_l,
            self.vram_size(),
            serial_l,
            self.serial_i().device().description(),
        )
    }

    pub fn description_debug(&self) -> String {
        format!(
            "{}\nCPU:\n{}\nDMA:\n{}",
            self.description(12),
            self.cpu_i().description_default(),
            self.dma_i().description()
        )
    }
}

/// Gameboy implementations that are meant with performance
/// in mind and that do not support WASM interface of copy.
impl Machine {
    /// The logic frequency of the Game Boy
    /// CPU in hz.
    pub const CPU_FREQ: u32 = 4194304;

    /// The visual frequency (refresh rate)
    /// of the Game Boy, close to 60 hz.
    pub const VISUAL_FREQ: f32 = 59.7275;

    /// The cycles taken to run a complete frame
    /// loop in the Game Boy's PPU (in CPU cycles).
    pub const LCD_CYCLES: u32 = 70224;

    pub fn cpu(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn cpu_i(&self) -> &Cpu {
        &self.cpu
    }

    pub fn mmu(&mut self) -> &mut Mmu {
        self.cpu.mmu()
    }

    pub fn mmu_i(&self) -> &Mmu {
        self.cpu.mmu_i()
    }

    pub fn ppu(&mut self) -> &mut VideoChip {
        self.cpu.ppu()
    }

    pub fn ppu_i(&self) -> &VideoChip {
        self.cpu.ppu_i()
    }

    pub fn apu(&mut self) -> &mut SoundChip {
        self.cpu.apu()
    }

    pub fn apu_i(&self) -> &SoundChip {
        self.cpu.apu_i()
    }

    pub fn dma(&mut self) -> &mut Dma {
        self.cpu.dma()
    }

    pub fn dma_i(&self) -> &Dma {
        self.cpu.dma_i()
    }

    pub fn pad(&mut self) -> &mut Joypad {
        self.cpu.pad()
    }

    pub fn pad_i(&self) -> &Joypad {
        self.cpu.pad_i()
    }

    pub fn timer(&mut self) -> &mut Timer {
        self.cpu.timer()
    }

    pub fn timer_i(&self) -> &Timer {
        self.cpu.timer_i()
    }

    pub fn serial(&mut self) -> &mut Serial {
        self.cpu.serial()
    }

    pub fn serial_i(&self) -> &Serial {
        self.cpu.serial_i()
    }

    pub fn rom(&mut self) -> &mut Cartridge {
        self.mmu().rom()
    }

    pub fn rom_i(&self) -> &Cartridge {
        self.mmu_i().rom_i()
    }

    pub fn frame_buffer(&mut self) -> &[u8; FRAME_BUFFER_SIZE] {
        self.ppu().frame_buffer()
    }

    pub fn frame_buffer_xrgb8888(&mut self) -> [u8; FRAME_BUFFER_XRGB8888_SIZE] {
        self.ppu().frame_buffer_xrgb8888()
    }

    pub fn frame_buffer_xrgb8888_u32(&mut self) -> [u32; FRAME_BUFFER_SIZE] {
        self.ppu().frame_buffer_xrgb8888_u32()
    }

    pub fn frame_buffer_rgb1555(&mut self) -> [u8; FRAME_BUFFER_RGB1555_SIZE] {
        self.ppu().frame_buffer_rgb1555()
    }

    pub fn frame_buffer_rgb1555_u16(&mut self) -> [u16; FRAME_BUFFER_SIZE] {
        self.ppu().frame_buffer_rgb1555_u16()
    }

    pub fn frame_buffer_rgb565(&mut self) -> [u8; FRAME_BUFFER_RGB565_SIZE] {
        self.ppu().frame_buffer_rgb565()
    }

    pub fn frame_buffer_rgb565_u16(&mut self) -> [u16; FRAME_BUFFER_SIZE] {
        self.ppu().frame_buffer_rgb565_u16()
    }

    pub fn frame_buffer_raw(&mut self) -> [u8; FRAME_BUFFER_SIZE] {
        self.ppu().frame_buffer_raw()
    }

    pub fn audio_buffer(&mut self) -> &VecDeque<u8> {
        self.apu().audio_buffer()
    }

    pub fn cartridge(&mut self) -> &mut Cartridge {
        self.mmu().rom()
    }

    pub fn cartridge_i(&self) -> &Cartridge {
        self.mmu_i().rom_i()
    }

    /// Serializes the full machine into a single buffer: a version header,
    /// the cartridge's title (so the host can verify/re-bind the correct
    /// ROM before restoring), then one length-prefixed section per
    /// stateful component, each followed by a marker so a truncated or
    /// misaligned save fails fast on restore instead of silently
    /// desyncing components from one another.
    pub fn snapshot(&mut self) -> Result<Vec<u8>, Error> {
        let mut cursor = Cursor::new(vec![]);

        write_u32(&mut cursor, STATE_VERSION)?;
        write_bytes(&mut cursor, self.cartridge().title().as_bytes())?;

        write_bytes(&mut cursor, &self.cpu().state(Some(StateFormat::Dotmatrix))?)?;
        write_u32(&mut cursor, STATE_SECTION_MARKER)?;

        write_bytes(
            &mut cursor,
            &self.cartridge().state(Some(StateFormat::Dotmatrix))?,
        )?;
        write_u32(&mut cursor, STATE_SECTION_MARKER)?;

        write_bytes(&mut cursor, &self.ppu().state(Some(StateFormat::Dotmatrix))?)?;
        write_u32(&mut cursor, STATE_SECTION_MARKER)?;

        write_bytes(&mut cursor, &self.apu().state(Some(StateFormat::Dotmatrix))?)?;
        write_u32(&mut cursor, STATE_SECTION_MARKER)?;

        write_bytes(&mut cursor, &self.pad().state(Some(StateFormat::Dotmatrix))?)?;
        write_u32(&mut cursor, STATE_SECTION_MARKER)?;

        write_bytes(
            &mut cursor,
            &self.timer().state(Some(StateFormat::Dotmatrix))?,
        )?;
        write_u32(&mut cursor, STATE_SECTION_MARKER)?;

        write_bytes(&mut cursor, &self.dma().state(Some(StateFormat::Dotmatrix))?)?;
        write_u32(&mut cursor, STATE_SECTION_MARKER)?;

        write_bytes(
            &mut cursor,
            &self.serial().state(Some(StateFormat::Dotmatrix))?,
        )?;
        write_u32(&mut cursor, STATE_SECTION_MARKER)?;

        Ok(cursor.into_inner())
    }

    /// Restores a machine previously serialized with [`Machine::snapshot`].
    ///
    /// The ROM currently loaded is expected to already match the one the
    /// snapshot was taken against (the host is responsible for re-binding
    /// it beforehand using the title returned by [`Machine::snapshot_rom_title`]);
    /// this call only restores runtime state, it never (re)loads ROM data.
    pub fn restore(&mut self, data: &[u8]) -> Result<(), Error> {
        let result = self.restore_sections(data);
        if result.is_err() {
            // a version or marker mismatch means the buffer can't be
            // trusted from this point on; leave the machine paused
            // instead of running with a partially restored state
            self.pause();
        }
        result
    }

    fn restore_sections(&mut self, data: &[u8]) -> Result<(), Error> {
        let mut cursor = Cursor::new(data);

        let version = read_u32(&mut cursor)?;
        if version != STATE_VERSION {
            return Err(Error::InvalidParameter(format!(
                "unsupported save state version {}",
                version
            )));
        }

        // the ROM title is informational at this layer, the host decides
        // what to do in case it doesn't match the currently loaded ROM
        read_bytes(&mut cursor)?;

        let section = read_bytes(&mut cursor)?;
        self.cpu().set_state(&section, Some(StateFormat::Dotmatrix))?;
        Self::expect_marker(&mut cursor)?;

        let section = read_bytes(&mut cursor)?;
        self.cartridge()
            .set_state(&section, Some(StateFormat::Dotmatrix))?;
        Self::expect_marker(&mut cursor)?;

        let section = read_bytes(&mut cursor)?;
        self.ppu().set_state(&section, Some(StateFormat::Dotmatrix))?;
        Self::expect_marker(&mut cursor)?;

        let section = read_bytes(&mut cursor)?;
        self.apu().set_state(&section, Some(StateFormat::Dotmatrix))?;
        Self::expect_marker(&mut cursor)?;

        let section = read_bytes(&mut cursor)?;
        self.pad().set_state(&section, Some(StateFormat::Dotmatrix))?;
        Self::expect_marker(&mut cursor)?;

        let section = read_bytes(&mut cursor)?;
        self.timer()
            .set_state(&section, Some(StateFormat::Dotmatrix))?;
        Self::expect_marker(&mut cursor)?;

        let section = read_bytes(&mut cursor)?;
        self.dma().set_state(&section, Some(StateFormat::Dotmatrix))?;
        Self::expect_marker(&mut cursor)?;

        let section = read_bytes(&mut cursor)?;
        self.serial()
            .set_state(&section, Some(StateFormat::Dotmatrix))?;
        Self::expect_marker(&mut cursor)?;

        Ok(())
    }

    /// Reads back the ROM title a snapshot was taken against, without
    /// restoring any other part of it. Hosts use this to confirm the
    /// currently loaded ROM matches before calling [`Machine::restore`].
    pub fn snapshot_rom_title(data: &[u8]) -> Result<String, Error> {
        let mut cursor = Cursor::new(data);
        read_u32(&mut cursor)?;
        let title = read_bytes(&mut cursor)?;
        String::from_utf8(title)
            .map_err(|_| Error::InvalidData)
    }

    fn expect_marker(cursor: &mut Cursor<&[u8]>) -> Result<(), Error> {
        let marker = read_u32(cursor)?;
        if marker != STATE_SECTION_MARKER {
            return Err(Error::InvalidParameter(
                "save state section marker mismatch".to_string(),
            ));
        }
        Ok(())
    }

    pub fn load(&mut self, boot: bool) -> Result<(), Error> {
        let boot_rom = self.boot_rom().reusable(self.mode());
        match self.mode() {
            SystemMode::Dmg => self.load_dmg(boot, boot_rom)?,
            SystemMode::Cgb => self.load_cgb(boot, boot_rom)?,
            SystemMode::Sgb => unimplemented!("SGB is not supported"),
        }
        Ok(())
    }

    pub fn load_dmg(&mut self, boot: bool, boot_rom: Option<BootRom>) -> Result<(), Error> {
        self.mmu().allocate_dmg();
        if boot {
            self.load_boot_dmg(boot_rom)?;
        }
        Ok(())
    }

    pub fn load_cgb(&mut self, boot: bool, boot_rom: Option<BootRom>) -> Result<(), Error> {
        self.mmu().allocate_cgb();
        if boot {
            self.load_boot_cgb(boot_rom)?;
        }
        Ok(())
    }

    pub fn load_boot(&mut self, data: &[u8]) {
        self.cpu.mmu().write_boot(0x0000, data);
    }

    pub fn load_boot_path(&mut self, path: &str) -> Result<(), Error> {
        let data = read_file(path)?;
        self.load_boot(&data);
        self.boot_rom = BootRom::Other;
        Ok(())
    }

    /// Loads the boot ROM matching `boot_rom` from its conventional
    /// location under `./res/boot`, the file must be supplied by the
    /// host application as it is not distributed with the emulator.
    pub fn load_boot_file(&mut self, boot_rom: BootRom) -> Result<(), Error> {
        match boot_rom {
            BootRom::Dmg => self.load_boot_path("./res/boot/dmg_boot.bin")?,
            BootRom::Sgb => self.load_boot_path("./res/boot/sgb_boot.bin")?,
            BootRom::DmgBootix => self.load_boot_path("./res/boot/dmg_bootix.bin")?,
            BootRom::MgbBootix => self.load_boot_path("./res/boot/mgb_bootix.bin")?,
            BootRom::Cgb => self.load_boot_path("./res/boot/cgb_boot.bin")?,
            BootRom::Other | BootRom::None => (),
        }
        self.boot_rom = boot_rom;
        Ok(())
    }

    pub fn load_boot_default(&mut self, boot_rom: Option<BootRom>) -> Result<(), Error> {
        self.load_boot_dmg(boot_rom)
    }

    pub fn load_boot_smart(&mut self, boot_rom: Option<BootRom>) -> Result<(), Error> {
        match self.mode() {
            SystemMode::Dmg => self.load_boot_dmg(boot_rom)?,
            SystemMode::Cgb => self.load_boot_cgb(boot_rom)?,
            SystemMode::Sgb => unimplemented!("SGB is not supported"),
        }
        Ok(())
    }

    pub fn load_boot_dmg(&mut self, boot_rom: Option<BootRom>) -> Result<(), Error> {
        let boot_rom = boot_rom.unwrap_or(BootRom::DmgBootix);
        if !boot_rom.is_dmg_compat() {
            return Err(Error::IncompatibleBootRom);
        }
        self.load_boot_file(boot_rom)
    }

    pub fn load_boot_cgb(&mut self, boot_rom: Option<BootRom>) -> Result<(), Error> {
        let boot_rom = boot_rom.unwrap_or(BootRom::Cgb);
        if !boot_rom.is_cgb_compat() {
            return Err(Error::IncompatibleBootRom);
        }
        self.load_boot_file(boot_rom)
    }

    pub fn load_cartridge(&mut self, rom: Cartridge) -> Result<&mut Cartridge, Error> {
        self.mmu().set_rom(rom);
        Ok(self.mmu().rom())
    }

    pub fn load_rom(
        &mut self,
        data: &[u8],
        ram_data: Option<&[u8]>,
    ) -> Result<&mut Cartridge, Error> {
        let mut rom = Cartridge::from_data(data)?;
        if let Some(ram_data) = ram_data {
            rom.set_ram_data(ram_data)
        }
        self.load_cartridge(rom)
    }

    pub fn load_rom_file(
        &mut self,
        path: &str,
        ram_path: Option<&str>,
    ) -> Result<&mut Cartridge, Error> {
        let data = read_file(path)?;
        match ram_path {
            Some(ram_path) => {
                let ram_data = read_file(ram_path)?;
                self.load_rom(&data, Some(&ram_data))
            }
            None => self.load_rom(&data, None),
        }
    }

    pub fn load_rom_empty(&mut self) -> Result<&mut Cartridge, Error> {
        let data = [0u8; 32 * 1024];
        self.load_rom(&data, None)
    }

    pub fn attach_serial(&mut self, device: Box<dyn SerialDevice>) {
        self.serial().set_device(device);
    }

    pub fn read_memory(&mut self, addr: u16) -> u8 {
        self.mmu().read(addr)
    }

    pub fn write_memory(&mut self, addr: u16, value: u8) {
        self.mmu().write(addr, value);
    }

    pub fn set_speed_callback(&mut self, callback: fn(speed: ClockSpeed)) {
        self.mmu().set_speed_callback(callback);
    }

}

impl AudioProvider for Machine {
    fn audio_output(&self) -> u8 {
        self.apu_i().output()
    }

    fn audio_buffer(&self) -> &VecDeque<u8> {
        self.apu_i().audio_buffer()
    }

    fn clear_audio_buffer(&mut self) {
        self.apu().clear_audio_buffer()
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Display for Machine {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description(9))
    }
}
