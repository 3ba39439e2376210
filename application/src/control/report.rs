//! Report generation [`Button`].

use std::{cell::RefCell, fmt};

use common::{operations::Perform, Handler};

/// Request to generate a report about a record of the host form.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Report {
    /// ID of the record the report is about.
    pub record_id: String,
}

/// State of a [`Button`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Status {
    /// Nothing was triggered yet.
    #[default]
    Idle,

    /// Generation is triggered and not finished yet.
    InFlight,

    /// Generation has finished.
    Done,

    /// Generation has failed with the provided message.
    Failed(String),
}

/// Button triggering a [`Report`] generation.
///
/// Its label is derived from its [`Status`] only.
#[derive(Clone, Debug, Default)]
pub struct Button {
    /// Current [`Status`].
    status: Status,
}

impl Button {
    /// Returns the current [`Status`].
    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Returns the label to show.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self.status {
            Status::Idle => "Generate report",
            Status::InFlight => "Generating report...",
            Status::Done => "Report generated",
            Status::Failed(_) => "Report failed, retry",
        }
    }

    /// Indicates whether this [`Button`] may be pressed.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.status != Status::InFlight
    }

    /// Presses this [`Button`], returning the operation to trigger.
    ///
    /// Returns [`None`] while a generation is in flight.
    pub fn press(&mut self, report: Report) -> Option<Perform<Report>> {
        if !self.is_enabled() {
            return None;
        }
        self.status = Status::InFlight;
        Some(Perform(report))
    }

    /// Finishes the in-flight generation with the provided `result`.
    pub fn settle<E: fmt::Display>(&mut self, result: Result<(), E>) {
        self.status = match result {
            Ok(()) => Status::Done,
            Err(e) => {
                tracing::warn!("report generation failed: {e}");
                Status::Failed(e.to_string())
            }
        };
    }
}

/// Clicks the provided [`Button`], performing the [`Report`] generation with
/// the provided `trigger`.
///
/// The [`Button`] stays observable while the generation is in flight.
pub async fn click<H>(button: &RefCell<Button>, trigger: &H, report: Report)
where
    H: Handler<Perform<Report>, Ok = ()>,
    H::Err: fmt::Display,
{
    let Some(op) = button.borrow_mut().press(report) else {
        return;
    };
    let result = trigger.execute(op).await;
    button.borrow_mut().settle(result);
}
