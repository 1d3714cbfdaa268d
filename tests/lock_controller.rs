use combolock::hal::{ServoCommand, SwitchPosition};
use combolock::mock::{FakeClock, MockPanel, ScriptedPins};
use combolock::{
    DirectionMailbox, LockController, LockMode, Peripherals, QuadratureDecoder,
    RetainedCombination,
};
use proptest::prelude::*;
use std::sync::Arc;

const CLOCKWISE_EDGES: [u8; 4] = [0b10, 0b00, 0b01, 0b11];
const COUNTERCLOCKWISE_EDGES: [u8; 4] = [0b01, 0b00, 0b10, 0b11];

struct Rig {
    controller: LockController,
    decoder: QuadratureDecoder<ScriptedPins>,
    panel: MockPanel,
    clock: FakeClock,
    retained: Arc<RetainedCombination>,
}

impl Rig {
    fn new(retained: RetainedCombination) -> Rig {
        let panel = MockPanel::new();
        let clock = FakeClock::new();
        let mailbox = Arc::new(DirectionMailbox::new());
        let retained = Arc::new(retained);
        let decoder = QuadratureDecoder::new(ScriptedPins::new(0b11), mailbox.clone()).unwrap();
        let peripherals = Peripherals {
            controls: Box::new(panel.clone()),
            leds: Box::new(panel.clone()),
            display: Box::new(panel.clone()),
            actuator: Box::new(panel.clone()),
            clock: Box::new(clock.clone()),
        };
        let mut controller = LockController::new(mailbox, retained.clone(), peripherals);
        controller.initialize().unwrap();
        Rig {
            controller,
            decoder,
            panel,
            clock,
            retained,
        }
    }

    fn tick(&mut self) {
        self.clock.advance(10);
        self.controller.tick().unwrap();
    }

    // one detent per tick
    fn turn(&mut self, clockwise: bool, detents: usize) {
        let edges = if clockwise {
            CLOCKWISE_EDGES
        } else {
            COUNTERCLOCKWISE_EDGES
        };
        for _ in 0..detents {
            for bits in edges.iter() {
                self.decoder.advance(combolock::Phase::from_bits(*bits));
            }
            self.tick();
        }
    }

    fn press(&mut self, left: bool, right: bool) {
        self.panel.set_buttons(left, right);
        self.tick();
        self.panel.set_buttons(false, false);
        self.tick();
    }

    fn dial(&mut self, first: u8, second: u8, third: u8) {
        let first = usize::from(first);
        let second = usize::from(second);
        let third = usize::from(third);
        self.turn(true, first + 32);
        self.turn(false, 1);
        self.turn(false, (second + 16 - first) % 16 + 16);
        self.turn(true, 1);
        self.turn(true, (third + 16 - second) % 16);
    }

    fn wait(&mut self, ms: u64) {
        self.clock.advance(ms);
        self.controller.tick().unwrap();
    }
}

#[test]
fn default_combination_opens_the_lock() {
    let mut rig = Rig::new(RetainedCombination::uninitialized());
    rig.dial(5, 10, 15);
    assert_eq!(rig.panel.row(4), "05-10-15");
    rig.press(true, false);
    assert_eq!(rig.controller.mode(), &LockMode::Unlocked);
    assert_eq!(rig.controller.bad_tries(), 0);
    assert_eq!(rig.panel.last_servo(), Some(ServoCommand::FullCounterClockwise));
    assert_eq!(rig.panel.row(0), "OPEN");
    assert_eq!(rig.panel.leds(), (false, true));
}

#[test]
fn three_wrong_entries_raise_the_alarm() {
    let mut rig = Rig::new(RetainedCombination::uninitialized());
    for attempt in 1..=3u8 {
        rig.turn(false, 1);
        rig.turn(true, 1);
        assert_eq!(rig.panel.row(4), "00-00-00");
        rig.press(true, false);
        if attempt < 3 {
            assert_eq!(rig.panel.row(0), format!("BAD ATTEMPT #{}", attempt));
            rig.wait(u64::from(attempt) * 1000);
        }
    }
    assert_eq!(rig.controller.mode(), &LockMode::Alarmed);
    assert_eq!(rig.controller.bad_tries(), 3);
    assert_eq!(rig.panel.row(0), "ALERT!");

    // nothing but initialize leaves the alarm
    rig.dial(5, 10, 15);
    rig.press(true, false);
    rig.press(true, true);
    assert_eq!(rig.controller.mode(), &LockMode::Alarmed);

    rig.controller.initialize().unwrap();
    assert_eq!(rig.controller.mode(), &LockMode::Locked);
    assert_eq!(rig.controller.bad_tries(), 0);
}

#[test]
fn change_then_reopen_with_new_combination() {
    let mut rig = Rig::new(RetainedCombination::uninitialized());
    rig.dial(5, 10, 15);
    rig.press(true, false);

    rig.panel.set_switch(SwitchPosition::Right);
    rig.press(false, true);
    assert!(matches!(rig.controller.mode(), LockMode::Changing(_)));
    assert_eq!(rig.panel.row(4), "__-__-__");

    rig.panel.type_keys("3#7#12");
    rig.panel.type_keys("3#7#12");
    for _ in 0..12 {
        rig.tick();
    }
    assert_eq!(rig.panel.row(4), "03-07-12");
    assert_eq!(rig.panel.row(5), "03-07-12");

    rig.panel.set_switch(SwitchPosition::Left);
    rig.tick();
    assert_eq!(rig.controller.mode(), &LockMode::Unlocked);
    assert_eq!(rig.panel.row(1), "CHANGED");
    assert_eq!(rig.controller.combination().digits(), [3, 7, 12]);
    assert_eq!(rig.retained.raw(), [3, 7, 12]);

    rig.press(true, true);
    assert_eq!(rig.controller.mode(), &LockMode::Locked);
    assert_eq!(rig.panel.last_servo(), Some(ServoCommand::FullClockwise));

    rig.dial(3, 7, 12);
    rig.press(true, false);
    assert_eq!(rig.controller.mode(), &LockMode::Unlocked);
}

#[test]
fn mismatched_confirmation_changes_nothing() {
    let mut rig = Rig::new(RetainedCombination::uninitialized());
    rig.dial(5, 10, 15);
    rig.press(true, false);
    rig.panel.set_switch(SwitchPosition::Right);
    rig.press(false, true);
    rig.panel.type_keys("3#7#12");
    rig.panel.type_keys("3#7#13");
    for _ in 0..12 {
        rig.tick();
    }
    rig.panel.set_switch(SwitchPosition::Left);
    rig.tick();
    assert_eq!(rig.controller.mode(), &LockMode::Unlocked);
    assert_eq!(rig.panel.row(1), "NO CHANGE");
    assert_eq!(rig.controller.combination().digits(), [5, 10, 15]);
    assert_eq!(rig.retained.raw(), [5, 10, 15]);
}

#[test]
fn corrupted_retained_combination_is_replaced() {
    let rig = Rig::new(RetainedCombination::with_digits([3, 16, 12]));
    assert_eq!(rig.controller.combination().digits(), [5, 10, 15]);
    assert_eq!(rig.retained.raw(), [5, 10, 15]);
}

#[test]
fn glitches_between_detents_are_absorbed() {
    let mut rig = Rig::new(RetainedCombination::uninitialized());
    // diagonal jumps from the rest position never count
    for bits in [0b00u8, 0b00, 0b11].iter() {
        rig.decoder.advance(combolock::Phase::from_bits(*bits));
    }
    rig.tick();
    assert_eq!(rig.panel.row(4), "__-__-__");
    assert_eq!(rig.decoder.mailbox().count_rotations(), "CW: 0 CCW: 0");

    rig.turn(true, 2);
    assert_eq!(rig.panel.row(4), "02-__-__");
}

proptest! {
    #[test]
    fn dial_values_stay_in_range(turns in proptest::collection::vec(any::<bool>(), 0..200)) {
        let mut rig = Rig::new(RetainedCombination::uninitialized());
        for clockwise in turns {
            rig.turn(clockwise, 1);
            let row = rig.panel.row(4);
            for cell in row.split('-') {
                if cell != "__" {
                    let value: u8 = cell.parse().unwrap();
                    prop_assert!(value <= 15);
                }
            }
        }
    }
}
