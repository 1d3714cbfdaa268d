use anyhow::{Context, Result};
use combolock::config::{Configuration, DisplayKind};
use combolock::gpio::{self, EncoderWipers, LedPins, PanelPins};
use combolock::hal::{Display, SystemClock};
use combolock::keypad::Keypad;
use combolock::lcd::{self, LcdDisplay, LogDisplay};
use combolock::servo::Servo;
use combolock::{
    DirectionMailbox, LockController, Peripherals, QuadratureDecoder, RetainedCombination,
};
use lazy_static::lazy_static;
use log::{error, info};
use mio::{Events, Poll, PollOpt, Ready, Token};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const WIPER_A: Token = Token(0);
const WIPER_B: Token = Token(1);

// Log the rotation counters every this many ticks
const STATUS_EVERY_TICKS: u64 = 1000;

lazy_static! {
    // Outlives every controller built in this process, soft resets included
    static ref RETAINED: Arc<RetainedCombination> =
        Arc::new(RetainedCombination::uninitialized());
}

fn run_encoder(mut decoder: QuadratureDecoder<EncoderWipers>, poll: Poll) -> Result<()> {
    let mut events = Events::with_capacity(128);

    // Ditch first OS event
    poll.poll(&mut events, None)?;

    loop {
        poll.poll(&mut events, None)?;
        for event in &events {
            match event.token() {
                WIPER_A | WIPER_B => {
                    decoder.on_sample_changed()?;
                }
                _ => {}
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = match env::var("COMBOLOCK_CONFIG") {
        Ok(path) => Configuration::load_from_path(&path)?,
        Err(_) => Configuration::default(),
    };
    info!("Configuration {:?}", config);

    // Encoder, decoded on its own thread
    let mailbox = Arc::new(DirectionMailbox::new());
    let wipers = EncoderWipers::new(config.encoder_a, config.encoder_b)?;
    let (a_events, b_events) = wipers.pollers()?;
    let poll = Poll::new()?;
    poll.register(&a_events, WIPER_A, Ready::readable(), PollOpt::edge())?;
    poll.register(&b_events, WIPER_B, Ready::readable(), PollOpt::edge())?;
    let decoder = QuadratureDecoder::new(wipers, mailbox.clone())?;
    thread::spawn(move || {
        // keep the pollers registered for as long as the thread runs
        let _pollers = (a_events, b_events);
        if let Err(e) = run_encoder(decoder, poll) {
            error!("Encoder stopped {:?}", e);
        }
    });

    let servo = Servo::spawn(gpio::output_pin(config.servo)?);

    let display: Box<dyn Display> = match config.display {
        DisplayKind::Lcd => Box::new(LcdDisplay::new(
            lcd::init_lcd(&config.lcd).context("could not initialize the LCD")?,
        )),
        DisplayKind::Log => Box::new(LogDisplay::new()),
    };

    let soft_reset = Arc::new(AtomicBool::new(false));
    let mut peripherals = Peripherals {
        controls: Box::new(PanelPins::new(
            config.left_button,
            config.right_button,
            config.left_switch,
            Keypad::from_stdin(soft_reset.clone()),
        )?),
        leds: Box::new(LedPins::new(config.left_led, config.right_led)?),
        display,
        actuator: Box::new(servo),
        clock: Box::new(SystemClock::new()),
    };

    let mut ticks: u64 = 0;
    loop {
        let mut controller = LockController::new(mailbox.clone(), RETAINED.clone(), peripherals);
        controller.initialize()?;
        info!("Lock ready, mode {:?}", controller.mode());

        while !soft_reset.swap(false, Ordering::AcqRel) {
            controller.tick()?;
            ticks += 1;
            if ticks % STATUS_EVERY_TICKS == 0 {
                info!("{:?} {}", controller.mode(), mailbox.count_rotations());
            }
            thread::sleep(Duration::from_millis(config.tick_ms));
        }

        info!("Soft reset, rebuilding the controller");
        peripherals = controller.into_peripherals();
    }
}
