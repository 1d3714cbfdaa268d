//! The decoder runs in the pin-change context and is the only writer of the
//! [`DirectionMailbox`]. The lock controller is its only reader. Every shared
//! field is a single atomic word, so the poller never sees a torn update.
use crate::hal::EncoderPins;
use anyhow::Result;
use log::debug;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
    None,
}

impl From<u8> for Direction {
    fn from(s: u8) -> Self {
        match s {
            1 => Direction::Clockwise,
            2 => Direction::CounterClockwise,
            _ => Direction::None,
        }
    }
}

impl From<Direction> for u8 {
    fn from(d: Direction) -> Self {
        match d {
            Direction::None => 0,
            Direction::Clockwise => 1,
            Direction::CounterClockwise => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    HighHigh,
    HighLow,
    LowLow,
    LowHigh,
}

impl Phase {
    // Raw sample is (B << 1) | A, named B first
    pub fn from_bits(bits: u8) -> Phase {
        match bits & 0b11 {
            0b11 => Phase::HighHigh,
            0b10 => Phase::HighLow,
            0b00 => Phase::LowLow,
            _ => Phase::LowHigh,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Phase::HighHigh => 0b11,
            Phase::HighLow => 0b10,
            Phase::LowLow => 0b00,
            Phase::LowHigh => 0b01,
        }
    }

    // Position on the gray-code ring HH -> HL -> LL -> LH -> HH.
    fn ring_index(self) -> u8 {
        match self {
            Phase::HighHigh => 0,
            Phase::HighLow => 1,
            Phase::LowLow => 2,
            Phase::LowHigh => 3,
        }
    }

    pub fn is_adjacent(self, other: Phase) -> bool {
        let step = (4 + other.ring_index() - self.ring_index()) % 4;
        step == 1 || step == 3
    }
}

#[derive(Debug, Default)]
pub struct DirectionMailbox {
    direction: AtomicU8,
    clockwise_count: AtomicU32,
    counterclockwise_count: AtomicU32,
}

impl DirectionMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, direction: Direction) {
        match direction {
            Direction::Clockwise => {
                self.clockwise_count.fetch_add(1, Ordering::Relaxed);
            }
            Direction::CounterClockwise => {
                self.counterclockwise_count.fetch_add(1, Ordering::Relaxed);
            }
            Direction::None => return,
        }
        self.direction.store(direction.into(), Ordering::Release);
    }

    /// Latest detent, clearing the slot. An unread detent is overwritten by
    /// the next one.
    pub fn get_direction(&self) -> Direction {
        self.direction
            .swap(Direction::None.into(), Ordering::AcqRel)
            .into()
    }

    pub fn clockwise_count(&self) -> u32 {
        self.clockwise_count.load(Ordering::Relaxed)
    }

    pub fn counterclockwise_count(&self) -> u32 {
        self.counterclockwise_count.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.direction.store(Direction::None.into(), Ordering::Release);
        self.clockwise_count.store(0, Ordering::Relaxed);
        self.counterclockwise_count.store(0, Ordering::Relaxed);
    }

    pub fn count_rotations(&self) -> String {
        format!(
            "CW:{:2} CCW:{:2}",
            self.clockwise_count(),
            self.counterclockwise_count()
        )
    }
}

pub struct QuadratureDecoder<P: EncoderPins> {
    pins: P,
    state: Phase,
    last_state: Phase,
    mailbox: Arc<DirectionMailbox>,
}

impl<P: EncoderPins> QuadratureDecoder<P> {
    pub fn new(mut pins: P, mailbox: Arc<DirectionMailbox>) -> Result<Self> {
        let state = Phase::from_bits(pins.quadrature()?);
        mailbox.reset();
        Ok(Self {
            pins,
            state,
            last_state: Phase::HighHigh,
            mailbox,
        })
    }

    pub fn sample(&mut self) -> Result<Phase> {
        Ok(Phase::from_bits(self.pins.quadrature()?))
    }

    pub fn on_sample_changed(&mut self) -> Result<Direction> {
        let phase = self.sample()?;
        Ok(self.advance(phase))
    }

    /// Repeats and two-bit jumps are dropped without touching any state.
    /// Arriving at `LowLow` from `HighHigh` through one quarter phase
    /// confirms a detent.
    pub fn advance(&mut self, phase: Phase) -> Direction {
        if !self.state.is_adjacent(phase) {
            return Direction::None;
        }

        let mut detent = Direction::None;
        if phase == Phase::LowLow && self.last_state == Phase::HighHigh {
            detent = match self.state {
                Phase::HighLow => Direction::Clockwise,
                Phase::LowHigh => Direction::CounterClockwise,
                _ => Direction::None,
            };
        }

        self.last_state = self.state;
        self.state = phase;

        if detent != Direction::None {
            debug!("Detent {:?} ({})", detent, self.mailbox.count_rotations());
            self.mailbox.post(detent);
        }
        detent
    }

    pub fn state(&self) -> Phase {
        self.state
    }

    pub fn last_state(&self) -> Phase {
        self.last_state
    }

    pub fn mailbox(&self) -> &Arc<DirectionMailbox> {
        &self.mailbox
    }
}
