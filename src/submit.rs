//! The submission pipeline: acquire a location fix, file the report, then
//! tell the user how it went.
//!
//! One [`Submitter::run`] call handles one submission on its own tokio
//! task. It owns no UI state; every visible effect is an [`Event`] applied
//! by the main loop, and the submit control is re-enabled on every exit
//! path.

use crate::alert::Severity;
use crate::api::{ApiError, ReportApi};
use crate::events::{ControlState, Event, StatusKind, StatusLine};
use crate::geocode::AddressResolver;
use crate::location::{acquire_fix, FixOptions, LocationError, PositionSource};
use crate::models::{LocationFix, Report, ReportRecord};
use tokio::sync::mpsc;
use tracing::warn;

/// Everything one submission needs. Cloned into the task that runs it.
#[derive(Clone)]
pub struct Submitter<S, R, A> {
    source: S,
    resolver: R,
    api: A,
    options: FixOptions,
    tx: mpsc::UnboundedSender<Event>,
}

enum SubmitFailure {
    Location(LocationError),
    Api(ApiError),
}

impl SubmitFailure {
    /// The failure's own sentence, before the submit lead-in is prepended.
    /// Location failures always mention the word "location"; the status
    /// line redisplay keys on that.
    fn underlying_message(&self) -> String {
        match self {
            SubmitFailure::Location(e) => e.user_message(),
            SubmitFailure::Api(e) => e.to_string(),
        }
    }

    fn alert_text(&self) -> String {
        format!("Could not send your report. {}", self.underlying_message())
    }
}

impl<S, R, A> Submitter<S, R, A>
where
    S: PositionSource,
    R: AddressResolver,
    A: ReportApi,
{
    pub fn new(
        source: S,
        resolver: R,
        api: A,
        options: FixOptions,
        tx: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            source,
            resolver,
            api,
            options,
            tx,
        }
    }

    /// Runs one submission end to end. Infallible from the caller's side;
    /// both outcomes surface as an alert.
    pub async fn run(&self, phone: String, message: String) {
        self.send(Event::Control(ControlState::Busy(
            "Getting your location...".to_string(),
        )));

        match self.attempt(phone.trim(), message.trim()).await {
            Ok((fix, _record)) => {
                self.send(Event::Alert(Some(Severity::Success), success_text(&fix)));
                self.send(Event::ResetForm);
                self.send(Event::Status(None));
            }
            Err(failure) => {
                let underlying = failure.underlying_message();
                warn!("Submission failed: {}", underlying);
                self.send(Event::Alert(Some(Severity::Error), failure.alert_text()));
                if underlying.to_lowercase().contains("location") {
                    self.send(Event::Status(Some(StatusLine::new(
                        StatusKind::Error,
                        underlying,
                    ))));
                }
            }
        }

        self.send(Event::Control(ControlState::Ready));
    }

    async fn attempt(
        &self,
        phone: &str,
        message: &str,
    ) -> Result<(LocationFix, Option<ReportRecord>), SubmitFailure> {
        let fix = acquire_fix(&self.source, &self.resolver, &self.options, &self.tx)
            .await
            .map_err(SubmitFailure::Location)?;

        self.send(Event::Control(ControlState::Busy("Sending...".to_string())));

        let report = Report {
            phone: phone.to_string(),
            message: message.to_string(),
            lat: fix.latitude,
            lng: fix.longitude,
        };
        let record = self
            .api
            .submit(&report)
            .await
            .map_err(SubmitFailure::Api)?;

        Ok((fix, record))
    }

    fn send(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

/// The success alert: a thank-you line plus the location the report went
/// out with, so the user can double-check what responders will see.
fn success_text(fix: &LocationFix) -> String {
    format!(
        "Thank you! Your report has been sent successfully.\n\n\
         Location: {}\nCoordinates: {}, {}\n\n\
         We will contact you as soon as possible.",
        fix.address, fix.latitude, fix.longitude
    )
}
