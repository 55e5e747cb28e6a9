use std::{cell::RefCell, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::utils::clock::Clock;

use super::Timer;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Drives [Timer::tick] at a fixed cadence until cancelled. Deadlines are absolute, so slow
/// ticks don't make the cadence drift.
pub struct TimerTicker<'a> {
    timer: &'a RefCell<Timer>,
    shutdown: CancellationToken,
    frequency: Duration,
    clock: Box<dyn Clock>,
}

impl<'a> TimerTicker<'a> {
    pub fn new(
        timer: &'a RefCell<Timer>,
        shutdown: CancellationToken,
        frequency: Duration,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            timer,
            shutdown,
            frequency,
            clock,
        }
    }

    /// Executes the ticking loop.
    pub async fn run(self) {
        let mut tick_point = self.clock.instant();
        loop {
            tick_point += self.frequency;

            trace!("Tick");
            self.timer.borrow_mut().tick();

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    debug!("Ticker cancelled");
                    return
                }
                _ = self.clock.sleep_until(tick_point) => ()
            }
        }
    }
}
