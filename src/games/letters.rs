//! Letters and Digits
//!
//! Symbols fall toward a line near the bottom of the field. Typing a real
//! symbol scores a point; letting a fake one cross the line scores a point.
//! A real symbol crossing the line, or a fake one being typed, ends the run.
//! Both games share this module and differ only in their [`Alphabet`].

use std::time::Duration;

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::{Game, GameKind};
use crate::sim::{EntityId, GamePhase, GameRng, IdAllocator, Sprite, SpriteKind, seeded_rng};

pub const FIELD_WIDTH: f32 = 800.0;
/// y of the line symbols must not cross
pub const LINE_Y: f32 = 500.0;
pub const SYMBOL_RADIUS: f32 = 28.0;
pub const TICK_MS: u64 = 16;

pub const FAKE_CHANCE: f64 = 0.10;
pub const BASE_SPEED: f32 = 1.0;
pub const SPEED_STEP: f32 = 0.05;
pub const MAX_SPEED: f32 = 6.0;

pub const MIN_SPAWN_DELAY_MS: f32 = 700.0;
pub const MAX_SPAWN_DELAY_MS: f32 = 2000.0;
pub const SPAWN_FACTOR: f32 = 0.98;
/// On-screen count the spawn pacing steers toward
pub const TARGET_ON_SCREEN: usize = 6;

const LATIN: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S',
    'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];
const DIGITS: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// ЙЦУКЕН keys and the Latin letter sharing the same physical key
const CYRILLIC_KEYS: [(char, char); 26] = [
    ('Й', 'Q'),
    ('Ц', 'W'),
    ('У', 'E'),
    ('К', 'R'),
    ('Е', 'T'),
    ('Н', 'Y'),
    ('Г', 'U'),
    ('Ш', 'I'),
    ('Щ', 'O'),
    ('З', 'P'),
    ('Ф', 'A'),
    ('Ы', 'S'),
    ('В', 'D'),
    ('А', 'F'),
    ('П', 'G'),
    ('Р', 'H'),
    ('О', 'J'),
    ('Л', 'K'),
    ('Д', 'L'),
    ('Я', 'Z'),
    ('Ч', 'X'),
    ('С', 'C'),
    ('М', 'V'),
    ('И', 'B'),
    ('Т', 'N'),
    ('Ь', 'M'),
];

/// Which symbols fall
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    Letters,
    Digits,
}

impl Alphabet {
    pub fn glyphs(self) -> &'static [char] {
        match self {
            Alphabet::Letters => &LATIN,
            Alphabet::Digits => &DIGITS,
        }
    }

    pub fn kind(self) -> GameKind {
        match self {
            Alphabet::Letters => GameKind::Letters,
            Alphabet::Digits => GameKind::Digits,
        }
    }

    /// Map a typed character onto a glyph of this alphabet
    pub fn normalize_key(self, key: char) -> Option<char> {
        match self {
            Alphabet::Letters => {
                let upper = key.to_uppercase().next()?;
                let latin = CYRILLIC_KEYS
                    .iter()
                    .find(|(cyr, _)| *cyr == upper)
                    .map_or(upper, |(_, lat)| *lat);
                latin.is_ascii_uppercase().then_some(latin)
            }
            Alphabet::Digits => key.is_ascii_digit().then_some(key),
        }
    }
}

/// Delay before the next spawn, given the symbols now on screen
pub fn next_spawn_delay(current_ms: f32, on_screen: usize) -> f32 {
    if on_screen < TARGET_ON_SCREEN {
        (current_ms * SPAWN_FACTOR).max(MIN_SPAWN_DELAY_MS)
    } else {
        (current_ms / SPAWN_FACTOR).min(MAX_SPAWN_DELAY_MS)
    }
}

/// Fall speed multiplier for a symbol that has been on screen `age_secs`
pub fn fall_multiplier(age_secs: f32) -> f32 {
    1.0 + (age_secs / 8.0).powf(1.5).min(4.0)
}

/// A falling symbol; `pos` is its center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Symbol {
    pub id: EntityId,
    pub glyph: char,
    pub fake: bool,
    pub pos: Vec2,
    /// Game speed when it spawned
    pub speed: f32,
    pub age_ticks: u32,
}

impl Symbol {
    pub fn age(&self) -> Duration {
        Duration::from_millis(u64::from(self.age_ticks) * TICK_MS)
    }

    pub fn crossed_line(&self) -> bool {
        self.pos.y - SYMBOL_RADIUS > LINE_Y
    }
}

/// Why the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallingEnd {
    RealCrossed(char),
    FakeTyped(char),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FallingEvent {
    Started,
    Spawned { glyph: char, fake: bool },
    /// Every glyph is already on screen
    SpawnSkipped,
    Hit { glyph: char },
    FakeDodged { glyph: char },
    Missed { key: char },
    GameOver(FallingEnd),
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct FallingInput {
    /// Enter pressed
    pub start: bool,
    /// Characters typed since the last tick, in order
    pub keys: Vec<char>,
}

/// Complete Letters/Digits state
#[derive(Debug, Clone)]
pub struct FallingState {
    rng: GameRng,
    ids: IdAllocator,
    pub alphabet: Alphabet,
    pub phase: GamePhase,
    pub score: u64,
    pub speed: f32,
    pub spawn_delay_ms: f32,
    /// Time left until the next spawn
    pub spawn_timer_ms: f32,
    pub symbols: Vec<Symbol>,
    pub end: Option<FallingEnd>,
    pub events: Vec<FallingEvent>,
}

impl FallingState {
    pub fn new(alphabet: Alphabet, seed: u64) -> Self {
        Self {
            rng: seeded_rng(seed),
            ids: IdAllocator::default(),
            alphabet,
            phase: GamePhase::Idle,
            score: 0,
            speed: BASE_SPEED,
            spawn_delay_ms: MAX_SPAWN_DELAY_MS,
            spawn_timer_ms: 0.0,
            symbols: Vec::new(),
            end: None,
            events: Vec::new(),
        }
    }

    pub fn letters(seed: u64) -> Self {
        Self::new(Alphabet::Letters, seed)
    }

    pub fn digits(seed: u64) -> Self {
        Self::new(Alphabet::Digits, seed)
    }

    fn start(&mut self) {
        self.phase = GamePhase::Active;
        self.events.push(FallingEvent::Started);
        log::info!("{} started", self.alphabet.kind().display_name());
        self.spawn();
    }

    /// Drop a new symbol whose glyph is not already on screen, then re-pace spawning
    pub fn spawn(&mut self) -> Option<EntityId> {
        let free: Vec<char> = self
            .alphabet
            .glyphs()
            .iter()
            .copied()
            .filter(|g| !self.symbols.iter().any(|s| s.glyph == *g))
            .collect();

        let spawned = match free.choose(&mut self.rng).copied() {
            Some(glyph) => {
                let fake = self.rng.random_bool(FAKE_CHANCE);
                let x = self
                    .rng
                    .random_range(SYMBOL_RADIUS as i32..=(FIELD_WIDTH - SYMBOL_RADIUS) as i32);
                let id = self.ids.next_id();
                self.symbols.push(Symbol {
                    id,
                    glyph,
                    fake,
                    pos: Vec2::new(x as f32, -SYMBOL_RADIUS),
                    speed: self.speed,
                    age_ticks: 0,
                });
                self.events.push(FallingEvent::Spawned { glyph, fake });
                Some(id)
            }
            None => {
                log::debug!("No free glyph to spawn");
                self.events.push(FallingEvent::SpawnSkipped);
                None
            }
        };

        self.spawn_delay_ms = next_spawn_delay(self.spawn_delay_ms, self.symbols.len());
        self.spawn_timer_ms = self.spawn_delay_ms;
        spawned
    }

    /// Handle one typed character
    pub fn press(&mut self, key: char) {
        if self.phase != GamePhase::Active {
            return;
        }
        let Some(glyph) = self.alphabet.normalize_key(key) else {
            return;
        };
        let Some(idx) = self.symbols.iter().position(|s| s.glyph == glyph) else {
            self.events.push(FallingEvent::Missed { key: glyph });
            return;
        };

        if self.symbols[idx].fake {
            self.finish(FallingEnd::FakeTyped(glyph));
            return;
        }
        self.symbols.remove(idx);
        self.score += 1;
        self.speed = (self.speed + SPEED_STEP).min(MAX_SPEED);
        self.events.push(FallingEvent::Hit { glyph });
    }

    fn finish(&mut self, end: FallingEnd) {
        self.phase = GamePhase::GameOver;
        self.end = Some(end);
        self.events.push(FallingEvent::GameOver(end));
        log::info!(
            "{} over ({:?}) Score: {}",
            self.alphabet.kind().display_name(),
            end,
            self.score
        );
    }
}

/// Advance Letters/Digits by one tick
pub fn tick(state: &mut FallingState, input: &FallingInput) {
    match state.phase {
        GamePhase::GameOver => return,
        GamePhase::Idle => {
            if input.start {
                state.start();
            }
            return;
        }
        GamePhase::Active => {}
    }

    for key in &input.keys {
        state.press(*key);
        if state.phase == GamePhase::GameOver {
            return;
        }
    }

    state.spawn_timer_ms -= TICK_MS as f32;
    if state.spawn_timer_ms <= 0.0 {
        state.spawn();
    }

    let mut idx = 0;
    while idx < state.symbols.len() {
        let symbol = &mut state.symbols[idx];
        symbol.age_ticks += 1;
        symbol.pos.y += symbol.speed * fall_multiplier(symbol.age().as_secs_f32());

        if !symbol.crossed_line() {
            idx += 1;
            continue;
        }
        let glyph = symbol.glyph;
        if symbol.fake {
            state.symbols.remove(idx);
            state.score += 1;
            state.events.push(FallingEvent::FakeDodged { glyph });
        } else {
            state.finish(FallingEnd::RealCrossed(glyph));
            return;
        }
    }
}

impl Game for FallingState {
    type Input = FallingInput;
    type Event = FallingEvent;

    fn kind(&self) -> GameKind {
        self.alphabet.kind()
    }

    fn tick_period(&self) -> Duration {
        Duration::from_millis(TICK_MS)
    }

    fn tick(&mut self, input: &FallingInput) {
        tick(self, input);
    }

    fn phase(&self) -> GamePhase {
        self.phase
    }

    fn score(&self) -> u64 {
        self.score
    }

    fn sprites(&self) -> Vec<Sprite> {
        self.symbols
            .iter()
            .map(|s| Sprite {
                id: s.id,
                kind: SpriteKind::Symbol {
                    glyph: s.glyph,
                    fake: s.fake,
                },
                pos: s.pos,
                size: SYMBOL_RADIUS * 2.0,
            })
            .collect()
    }

    fn drain_events(&mut self) -> Vec<FallingEvent> {
        std::mem::take(&mut self.events)
    }
}
