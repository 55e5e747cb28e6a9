//! Live timing of a single ticket. The [Timer] never touches storage: [Timer::stop] hands the
//! finished [TimerSession] back to the caller, which decides whether to log it.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::utils::{clock::Clock, time::duration_to_hours};

use super::entities::TicketId;

pub mod shutdown;
pub mod ticker;

/// Ticks are dropped for lagging observers once this many events are queued.
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running {
        ticket: TicketId,
        started_at: DateTime<Utc>,
    },
}

/// Published to observers on every state change and on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Started { ticket: TicketId },
    Tick { ticket: TicketId, elapsed: Duration },
    Stopped { session: TimerSession },
}

/// A finished timing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSession {
    pub ticket: TicketId,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl TimerSession {
    pub fn duration(&self) -> Duration {
        self.ended_at - self.started_at
    }

    pub fn hours(&self) -> f64 {
        duration_to_hours(self.duration())
    }

    /// Sessions that lasted no time at all (or went backwards with the clock) are not worth
    /// logging.
    pub fn is_empty(&self) -> bool {
        self.duration() <= Duration::zero()
    }
}

pub struct Timer {
    clock: Box<dyn Clock>,
    state: TimerState,
    elapsed: Duration,
    events: broadcast::Sender<TimerEvent>,
}

impl Timer {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            clock,
            state: TimerState::Idle,
            elapsed: Duration::zero(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn active_ticket(&self) -> Option<TicketId> {
        match self.state {
            TimerState::Idle => None,
            TimerState::Running { ticket, .. } => Some(ticket),
        }
    }

    pub fn is_running(&self) -> bool {
        self.active_ticket().is_some()
    }

    /// Elapsed time as of the last [Timer::tick]. Zero while idle.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Starts timing `ticket`. A session already running is dropped without being saved, its
    /// time can't be recovered.
    pub fn start(&mut self, ticket: TicketId) {
        let now = self.clock.time();
        if let TimerState::Running {
            ticket: previous,
            started_at,
        } = self.state
        {
            warn!(
                "Switching timer from ticket {previous} to {ticket}, discarding {}s",
                (now - started_at).num_seconds()
            );
        }

        info!("Starting timer for ticket {ticket}");
        self.state = TimerState::Running {
            ticket,
            started_at: now,
        };
        self.elapsed = Duration::zero();
        self.publish(TimerEvent::Started { ticket });
    }

    /// Refreshes the elapsed time of a running session. Does nothing while idle.
    pub fn tick(&mut self) {
        let TimerState::Running { ticket, started_at } = self.state else {
            return;
        };
        self.elapsed = self.clock.time() - started_at;
        self.publish(TimerEvent::Tick {
            ticket,
            elapsed: self.elapsed,
        });
    }

    /// Ends the running session and returns it. Returns `None` when idle.
    pub fn stop(&mut self) -> Option<TimerSession> {
        let TimerState::Running { ticket, started_at } = self.state else {
            return None;
        };
        let session = TimerSession {
            ticket,
            started_at,
            ended_at: self.clock.time(),
        };
        info!(
            "Stopped timer for ticket {ticket} after {}s",
            session.duration().num_seconds()
        );
        self.state = TimerState::Idle;
        self.elapsed = Duration::zero();
        self.publish(TimerEvent::Stopped { session });
        Some(session)
    }

    fn publish(&self, event: TimerEvent) {
        // Having no observers is fine.
        let _ = self.events.send(event);
    }
}
