pub mod changing;
pub mod combination;
pub mod config;
pub mod controller;
pub mod gpio;
pub mod hal;
pub mod keypad;
pub mod lcd;
pub mod lock;
pub mod mock;
pub mod rotary;
pub mod servo;

pub use combination::{Combination, RetainedCombination};
pub use controller::{LockController, Peripherals};
pub use lock::{LockMachine, LockMode};
pub use rotary::{Direction, DirectionMailbox, Phase, QuadratureDecoder};
