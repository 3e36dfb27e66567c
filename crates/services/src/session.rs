//! Per-session state machine driving identity → discovery → hydration.
//!
//! Every run takes a generation number; results are committed only while that
//! generation is still current, so a run that outlives an identity change or
//! an invalidation cannot overwrite newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mentornet_core::Clock;
use mentornet_core::model::{Enrollment, StudentId};
use storage::repository::IdentityCache;

use crate::diagnostics::Diagnostics;
use crate::discovery::CourseDiscovery;
use crate::hydration::ProgressHydrator;
use crate::identity::IdentityResolver;
use crate::transport::Transport;
use crate::view::EnrollmentView;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPhase {
    #[default]
    Idle,
    ResolvingIdentity,
    DiscoveringCourses,
    HydratingProgress,
    Ready,
}

/// User-visible conditions that are not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    IdentityUnresolved,
    NoCoursesDiscovered,
}

/// What a renderer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    IdentityUnresolved,
    Empty,
    Populated,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub phase: LoadPhase,
    pub student_id: Option<StudentId>,
    pub view: EnrollmentView,
    pub notice: Option<Notice>,
    pub diagnostics: Diagnostics,
}

impl SessionSnapshot {
    #[must_use]
    pub fn view_state(&self) -> ViewState {
        match (self.phase, self.notice) {
            (_, Some(Notice::IdentityUnresolved)) => ViewState::IdentityUnresolved,
            (LoadPhase::Ready, _) if self.view.is_empty() => ViewState::Empty,
            (LoadPhase::Ready, _) => ViewState::Populated,
            (LoadPhase::Idle, _) => ViewState::Empty,
            _ if !self.view.is_empty() => ViewState::Populated,
            _ => ViewState::Loading,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Completed(SessionSnapshot),
    /// A newer run or an invalidation took over; nothing was committed.
    Superseded,
}

impl LoadOutcome {
    #[must_use]
    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        match self {
            LoadOutcome::Completed(snapshot) => Some(snapshot),
            LoadOutcome::Superseded => None,
        }
    }
}

pub struct EnrollmentSession {
    resolver: Mutex<IdentityResolver>,
    discovery: CourseDiscovery,
    hydrator: ProgressHydrator,
    generation: AtomicU64,
    state: Mutex<SessionSnapshot>,
}

impl EnrollmentSession {
    #[must_use]
    pub fn new(
        resolver: IdentityResolver,
        discovery: CourseDiscovery,
        hydrator: ProgressHydrator,
    ) -> Self {
        Self {
            resolver: Mutex::new(resolver),
            discovery,
            hydrator,
            generation: AtomicU64::new(0),
            state: Mutex::new(SessionSnapshot::default()),
        }
    }

    /// Wire every stage to one transport and identity cache.
    #[must_use]
    pub fn from_transport(
        transport: Arc<dyn Transport>,
        cache: Arc<dyn IdentityCache>,
        clock: Clock,
        explicit: Option<StudentId>,
    ) -> Self {
        let resolver =
            IdentityResolver::new(Arc::clone(&transport), cache, clock).with_explicit(explicit);
        Self::new(
            resolver,
            CourseDiscovery::new(Arc::clone(&transport)),
            ProgressHydrator::new(transport),
        )
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply `update` if `generation` is still current.
    fn commit(
        &self,
        generation: u64,
        update: impl FnOnce(&mut SessionSnapshot),
    ) -> Option<SessionSnapshot> {
        let mut state = self.lock_state();
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "discarding stale session result");
            return None;
        }
        update(&mut state);
        Some(state.clone())
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock_state().clone()
    }

    /// Drop the view model and make every in-flight run stale.
    pub fn invalidate(&self) {
        let mut state = self.lock_state();
        self.generation.fetch_add(1, Ordering::SeqCst);
        *state = SessionSnapshot::default();
    }

    /// Switch to another explicit identity (or none) and reset the session.
    pub fn change_identity(&self, explicit: Option<StudentId>) {
        self.resolver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_explicit(explicit);
        self.invalidate();
    }

    pub fn select(&self, index: usize) {
        self.lock_state().view.select(index);
    }

    /// Full run: resolve identity, discover, hydrate.
    pub async fn load(&self) -> LoadOutcome {
        let generation = self.begin();
        if self
            .commit(generation, |state| {
                *state = SessionSnapshot {
                    phase: LoadPhase::ResolvingIdentity,
                    ..SessionSnapshot::default()
                };
            })
            .is_none()
        {
            return LoadOutcome::Superseded;
        }

        let resolver = self
            .resolver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let mut diagnostics = Diagnostics::new();
        let resolution = resolver.resolve(&mut diagnostics).await;

        let Some(student_id) = resolution.student_id().cloned() else {
            return self.finish(generation, |state| {
                state.phase = LoadPhase::Idle;
                state.notice = Some(Notice::IdentityUnresolved);
                state.diagnostics = diagnostics;
            });
        };

        self.run_from_discovery(generation, student_id, diagnostics)
            .await
    }

    /// Re-run discovery and hydration for the resolved identity.
    ///
    /// Falls back to a full [`load`](Self::load) when no identity is known yet.
    pub async fn refresh(&self) -> LoadOutcome {
        let Some(student_id) = self.snapshot().student_id else {
            return self.load().await;
        };
        let generation = self.begin();
        self.run_from_discovery(generation, student_id, Diagnostics::new())
            .await
    }

    async fn run_from_discovery(
        &self,
        generation: u64,
        student_id: StudentId,
        mut diagnostics: Diagnostics,
    ) -> LoadOutcome {
        let started = self.commit(generation, |state| {
            state.phase = LoadPhase::DiscoveringCourses;
            state.student_id = Some(student_id.clone());
            state.notice = None;
        });
        if started.is_none() {
            return LoadOutcome::Superseded;
        }

        let discovered = self
            .discovery
            .discover_courses(&student_id, &mut diagnostics)
            .await;

        tracing::debug!(source = ?discovered.source, "discovery finished");
        if discovered.is_exhausted() {
            return self.finish(generation, |state| {
                state.phase = LoadPhase::Ready;
                state.view.replace_entries(Vec::new());
                state.notice = Some(Notice::NoCoursesDiscovered);
                state.diagnostics = diagnostics;
            });
        }

        let placeholders: Vec<Enrollment> = discovered
            .courses
            .iter()
            .map(|item| Enrollment::new(item.course.clone(), item.prefetched.clone()))
            .collect();
        let hydrating = self.commit(generation, |state| {
            state.phase = LoadPhase::HydratingProgress;
            state.view.replace_entries(placeholders);
        });
        if hydrating.is_none() {
            return LoadOutcome::Superseded;
        }

        let entries = self
            .hydrator
            .hydrate_progress(&student_id, &discovered.courses, &mut diagnostics)
            .await;

        tracing::info!(
            student_id = student_id.as_str(),
            courses = entries.len(),
            misses = diagnostics.misses().count(),
            "enrollment view ready"
        );
        self.finish(generation, |state| {
            state.phase = LoadPhase::Ready;
            state.view.replace_entries(entries);
            state.diagnostics = diagnostics;
        })
    }

    fn finish(
        &self,
        generation: u64,
        update: impl FnOnce(&mut SessionSnapshot),
    ) -> LoadOutcome {
        self.commit(generation, update)
            .map_or(LoadOutcome::Superseded, LoadOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(phase: LoadPhase, notice: Option<Notice>, courses: usize) -> SessionSnapshot {
        use mentornet_core::model::{CourseId, CourseRef};
        let entries = (0..courses)
            .map(|i| {
                Enrollment::new(
                    CourseRef::new(CourseId::new(format!("c{i}")).unwrap(), None),
                    None,
                )
            })
            .collect();
        SessionSnapshot {
            phase,
            notice,
            view: EnrollmentView::new(entries),
            ..SessionSnapshot::default()
        }
    }

    #[test]
    fn view_state_mapping() {
        assert_eq!(
            snapshot(LoadPhase::Idle, Some(Notice::IdentityUnresolved), 0).view_state(),
            ViewState::IdentityUnresolved
        );
        assert_eq!(
            snapshot(LoadPhase::DiscoveringCourses, None, 0).view_state(),
            ViewState::Loading
        );
        assert_eq!(
            snapshot(LoadPhase::HydratingProgress, None, 2).view_state(),
            ViewState::Populated
        );
        assert_eq!(
            snapshot(LoadPhase::Ready, Some(Notice::NoCoursesDiscovered), 0).view_state(),
            ViewState::Empty
        );
        assert_eq!(snapshot(LoadPhase::Ready, None, 1).view_state(), ViewState::Populated);
    }

    #[test]
    fn session_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EnrollmentSession>();
    }
}
