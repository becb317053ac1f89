//! Last-write-wins holder for the most recent complete trip assessment.
//!
//! Every calculation takes a [`Ticket`] before it starts. When it finishes
//! the board accepts the outcome only if no newer ticket has completed in
//! the meantime. Failures keep the previously rendered assessment and only
//! record a notice. Presentation adapters subscribe to the watch channel
//! instead of polling.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::pricing::TripAssessment;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn number(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoardSnapshot {
    /// Highest ticket that has completed, successfully or not.
    pub completed_ticket: u64,
    /// Ticket whose assessment is on display.
    pub rendered_ticket: Option<u64>,
    pub assessment: Option<Arc<TripAssessment>>,
    pub notice: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoardUpdate {
    Rendered,
    FailureNoticed,
    /// A newer ticket already completed; the outcome was dropped.
    Stale,
}

pub struct DisplayBoard {
    next_ticket: AtomicU64,
    sender: watch::Sender<BoardSnapshot>,
}

impl Default for DisplayBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayBoard {
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(BoardSnapshot::default());
        Self { next_ticket: AtomicU64::new(0), sender }
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn complete<E: fmt::Display>(
        &self,
        ticket: Ticket,
        outcome: Result<TripAssessment, E>,
    ) -> BoardUpdate {
        let mut update = BoardUpdate::Stale;

        self.sender.send_if_modified(|snapshot| {
            if ticket.0 <= snapshot.completed_ticket {
                return false;
            }
            snapshot.completed_ticket = ticket.0;

            match outcome {
                Ok(assessment) => {
                    snapshot.rendered_ticket = Some(ticket.0);
                    snapshot.assessment = Some(Arc::new(assessment));
                    snapshot.notice = None;
                    update = BoardUpdate::Rendered;
                }
                Err(error) => {
                    snapshot.notice = Some(error.to_string());
                    update = BoardUpdate::FailureNoticed;
                }
            }
            true
        });

        match update {
            BoardUpdate::Stale => debug!(
                event_name = "board.completion.stale",
                ticket = ticket.0,
                "discarding superseded calculation"
            ),
            BoardUpdate::FailureNoticed => warn!(
                event_name = "board.completion.failed",
                ticket = ticket.0,
                "calculation failed, keeping previous assessment"
            ),
            BoardUpdate::Rendered => {
                debug!(event_name = "board.completion.rendered", ticket = ticket.0, "assessment rendered")
            }
        }
        update
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BoardSnapshot> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{BoardUpdate, DisplayBoard};
    use crate::domain::trip::{Location, TimeOfDay, TripRequest, VehicleClass};
    use crate::pricing::{FarePipeline, TripAssessment};

    fn assessment(distance_km: f64) -> TripAssessment {
        let pipeline: FarePipeline = FarePipeline::default();
        let request = TripRequest::new(
            distance_km,
            20.0,
            VehicleClass::Sedan,
            Location::named("Chicago"),
            TimeOfDay::Midday,
        );
        pipeline.assess(&request).expect("assessment")
    }

    #[test]
    fn tickets_increase_monotonically() {
        let board = DisplayBoard::new();
        let first = board.issue();
        let second = board.issue();
        assert!(second > first);
        assert_eq!(first.number(), 1);
    }

    #[test]
    fn superseded_completion_is_discarded() {
        let board = DisplayBoard::new();
        let slow = board.issue();
        let fast = board.issue();

        assert_eq!(board.complete::<String>(fast, Ok(assessment(12.0))), BoardUpdate::Rendered);
        assert_eq!(board.complete::<String>(slow, Ok(assessment(3.0))), BoardUpdate::Stale);

        let snapshot = board.snapshot();
        assert_eq!(snapshot.rendered_ticket, Some(fast.number()));
        let shown = snapshot.assessment.expect("assessment on display");
        assert_eq!(shown.request.distance_km, 12.0);
    }

    #[test]
    fn failure_keeps_previous_assessment_and_sets_notice() {
        let board = DisplayBoard::new();
        let first = board.issue();
        board.complete::<String>(first, Ok(assessment(5.0)));

        let second = board.issue();
        let update = board.complete(second, Err("Fare service is unreachable."));
        assert_eq!(update, BoardUpdate::FailureNoticed);

        let snapshot = board.snapshot();
        assert_eq!(snapshot.rendered_ticket, Some(first.number()));
        assert!(snapshot.assessment.is_some());
        assert_eq!(snapshot.notice.as_deref(), Some("Fare service is unreachable."));

        let third = board.issue();
        board.complete::<String>(third, Ok(assessment(6.0)));
        assert_eq!(board.snapshot().notice, None);
    }

    #[tokio::test]
    async fn subscribers_are_signalled_on_render() {
        let board = DisplayBoard::new();
        let mut receiver = board.subscribe();

        let ticket = board.issue();
        board.complete::<String>(ticket, Ok(assessment(7.5)));

        tokio::time::timeout(Duration::from_secs(1), receiver.changed())
            .await
            .expect("signal within timeout")
            .expect("sender alive");
        assert_eq!(receiver.borrow().rendered_ticket, Some(ticket.number()));
    }
}
