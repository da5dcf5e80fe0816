//! The engine's composition root: one `Workbench` owns the loaded
//! catalog, the narrowing selection, and the roster being edited, and
//! drives every load and submission through the backing service. One
//! logical flow owns a workbench; the sidecar loop serializes access.

use tracing::{debug, info, warn};

use crate::cascade::{self, ClassOption, SubjectOption};
use crate::catalog::{order_sessions, ClassId, StudentId, SubjectId, TeachingSession};
use crate::error::EngineError;
use crate::reconcile;
use crate::roster::{self, RosterEntry, Student};
use crate::scope::{PeriodKey, RecordValue, ScopeKey};
use crate::service::{RecordService, ServiceError};
use crate::submit::{self, SubmitReport};
use crate::tracker::EditTracker;

/// The narrowing selection, downstream pieces optional until chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub class: Option<ClassId>,
    pub subject: Option<SubjectId>,
    pub period: Option<PeriodKey>,
}

/// Roster state distinguishes "never searched" from "searched, zero
/// students": an empty loaded roster is still `Loaded`.
#[derive(Debug)]
pub enum RosterState {
    NotLoaded,
    Loaded(LoadedRoster),
}

#[derive(Debug)]
pub struct LoadedRoster {
    pub scope: ScopeKey,
    students: Vec<Student>,
    tracker: EditTracker,
}

impl LoadedRoster {
    /// Entries in presentation order: every student paired with their
    /// current working value.
    pub fn entries(&self) -> impl Iterator<Item = (&Student, Option<RecordValue>)> + '_ {
        self.students
            .iter()
            .map(|s| (s, self.tracker.value_of(s.id)))
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn tracker(&self) -> &EditTracker {
        &self.tracker
    }
}

/// Claim on an in-flight roster load. The generation pins the scope
/// state the load was started under.
#[derive(Debug, Clone, Copy)]
pub struct LoadTicket {
    scope: ScopeKey,
    generation: u64,
}

impl LoadTicket {
    pub fn scope(&self) -> ScopeKey {
        self.scope
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The fetched roster became the live one.
    Applied,
    /// The scope moved on while the fetch was in flight; the result
    /// was discarded without touching state.
    Stale,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Empty working map; the service was never called.
    NothingToSubmit,
    /// The fan-out ran. `refreshed` is false when the follow-up roster
    /// reload failed and the displayed values are still the local ones.
    Submitted {
        report: SubmitReport,
        refreshed: bool,
    },
}

pub struct Workbench {
    catalog: Option<Vec<TeachingSession>>,
    selection: Selection,
    generation: u64,
    roster: RosterState,
}

impl Workbench {
    pub fn new() -> Workbench {
        Workbench {
            catalog: None,
            selection: Selection::default(),
            generation: 0,
            roster: RosterState::NotLoaded,
        }
    }

    /// Fetches and stores the session catalog, ordered for stable
    /// presentation. Reloading resets the selection and any roster.
    pub async fn load_catalog(&mut self, service: &dyn RecordService) -> Result<(), EngineError> {
        let mut sessions = service.fetch_sessions().await?;
        order_sessions(&mut sessions);
        info!(sessions = sessions.len(), "session catalog loaded");
        self.selection = Selection::default();
        self.invalidate_roster();
        self.catalog = Some(sessions);
        Ok(())
    }

    pub fn sessions(&self) -> Result<&[TeachingSession], EngineError> {
        self.catalog.as_deref().ok_or(EngineError::CatalogNotLoaded)
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn class_options(&self) -> Result<Vec<ClassOption>, EngineError> {
        Ok(cascade::classes_of(self.sessions()?))
    }

    pub fn subject_options(&self) -> Result<Vec<SubjectOption>, EngineError> {
        let sessions = self.sessions()?;
        let class = self
            .selection
            .class
            .ok_or(EngineError::ScopeIncomplete { missing: "class" })?;
        Ok(cascade::subjects_of(sessions, class))
    }

    /// Selects a class from the catalog. A previously chosen subject
    /// survives only if the new class is also taught that subject.
    pub fn select_class(&mut self, class: ClassId) -> Result<(), EngineError> {
        let sessions = self.sessions()?;
        if !sessions.iter().any(|s| s.class_id == class) {
            return Err(EngineError::ClassNotFound(class));
        }
        let surviving_subject = self.selection.subject.filter(|&subject| {
            sessions
                .iter()
                .any(|s| s.class_id == class && s.subject_id == subject)
        });
        if self.selection.subject.is_some() && surviving_subject.is_none() {
            debug!("class change invalidated the subject selection");
        }
        self.selection.class = Some(class);
        self.selection.subject = surviving_subject;
        self.invalidate_roster();
        Ok(())
    }

    pub fn select_subject(&mut self, subject: SubjectId) -> Result<(), EngineError> {
        let sessions = self.sessions()?;
        let class = self
            .selection
            .class
            .ok_or(EngineError::ScopeIncomplete { missing: "class" })?;
        if !sessions
            .iter()
            .any(|s| s.class_id == class && s.subject_id == subject)
        {
            return Err(EngineError::SubjectNotFound(subject));
        }
        self.selection.subject = Some(subject);
        self.invalidate_roster();
        Ok(())
    }

    /// Selects the period: an attendance date or an assessment tag.
    /// The period's variant decides which record kind the scope edits.
    pub fn select_period(&mut self, period: PeriodKey) -> Result<(), EngineError> {
        self.sessions()?;
        self.selection.period = Some(period);
        self.invalidate_roster();
        Ok(())
    }

    /// Every selection change obsoletes in-flight loads and drops the
    /// loaded roster with its pending edits.
    fn invalidate_roster(&mut self) {
        self.generation += 1;
        if matches!(self.roster, RosterState::Loaded(_)) {
            debug!("dropping loaded roster after scope change");
        }
        self.roster = RosterState::NotLoaded;
    }

    pub fn resolved_scope(&self) -> Result<ScopeKey, EngineError> {
        self.sessions()?;
        let class = self
            .selection
            .class
            .ok_or(EngineError::ScopeIncomplete { missing: "class" })?;
        let subject = self
            .selection
            .subject
            .ok_or(EngineError::ScopeIncomplete { missing: "subject" })?;
        let period = self
            .selection
            .period
            .ok_or(EngineError::ScopeIncomplete { missing: "period" })?;
        Ok(ScopeKey::new(class, subject, period))
    }

    /// Starts a roster load for the resolved scope. The caller runs
    /// the fetch and hands the result back to [`Workbench::finish_load`].
    pub fn begin_load(&self) -> Result<LoadTicket, EngineError> {
        let scope = self.resolved_scope()?;
        Ok(LoadTicket {
            scope,
            generation: self.generation,
        })
    }

    /// Applies a finished load if its ticket is still current. A stale
    /// ticket discards the result, success or failure alike, and
    /// leaves state untouched.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<RosterEntry>, ServiceError>,
    ) -> Result<LoadOutcome, EngineError> {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale roster load"
            );
            return Ok(LoadOutcome::Stale);
        }
        let mut entries = result.map_err(EngineError::Fetch)?;
        roster::order_entries(&mut entries);
        let kind = ticket.scope.kind();
        let baseline = reconcile::reconcile(&entries, kind.default_value());
        let tracker = EditTracker::seed(kind, entries.iter().map(|e| e.student.id), baseline);
        let students: Vec<Student> = entries.into_iter().map(|e| e.student).collect();
        info!(students = students.len(), "roster loaded and reconciled");
        self.roster = RosterState::Loaded(LoadedRoster {
            scope: ticket.scope,
            students,
            tracker,
        });
        Ok(LoadOutcome::Applied)
    }

    /// begin → fetch → finish in one call. Serial callers cannot race
    /// themselves, so the outcome is always `Applied` or an error.
    pub async fn load_roster(
        &mut self,
        service: &dyn RecordService,
    ) -> Result<LoadOutcome, EngineError> {
        let ticket = self.begin_load()?;
        let result = service.fetch_roster(ticket.scope()).await;
        self.finish_load(ticket, result)
    }

    pub fn roster(&self) -> &RosterState {
        &self.roster
    }

    pub fn loaded(&self) -> Result<&LoadedRoster, EngineError> {
        match &self.roster {
            RosterState::Loaded(loaded) => Ok(loaded),
            RosterState::NotLoaded => Err(EngineError::RosterNotLoaded),
        }
    }

    fn loaded_mut(&mut self) -> Result<&mut LoadedRoster, EngineError> {
        match &mut self.roster {
            RosterState::Loaded(loaded) => Ok(loaded),
            RosterState::NotLoaded => Err(EngineError::RosterNotLoaded),
        }
    }

    pub fn set_entry(&mut self, student: StudentId, value: RecordValue) -> Result<(), EngineError> {
        self.loaded_mut()?.tracker.set(student, value)
    }

    pub fn clear_entry(&mut self, student: StudentId) -> Result<(), EngineError> {
        self.loaded_mut()?.tracker.clear(student)
    }

    /// Submits the working map, then reloads the roster so displayed
    /// values reflect confirmed server state. The reload runs whether
    /// or not some upserts failed; if the reload itself fails the local
    /// state is kept and the outcome says so.
    pub async fn submit(
        &mut self,
        service: &dyn RecordService,
    ) -> Result<SubmitOutcome, EngineError> {
        let scope = self.resolved_scope()?;
        let loaded = self.loaded()?;
        let report = match submit::submit_all(service, scope, loaded.tracker.snapshot()).await {
            None => return Ok(SubmitOutcome::NothingToSubmit),
            Some(report) => report,
        };
        let refreshed = match self.load_roster(service).await {
            Ok(LoadOutcome::Applied) => true,
            Ok(LoadOutcome::Stale) => false,
            Err(err) => {
                warn!(error = %err, "roster refresh after submit failed, keeping local values");
                false
            }
        };
        Ok(SubmitOutcome::Submitted { report, refreshed })
    }
}

impl Default for Workbench {
    fn default() -> Self {
        Workbench::new()
    }
}
