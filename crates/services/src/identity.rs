use std::sync::Arc;

use mentornet_core::Clock;
use mentornet_core::model::StudentId;
use serde_json::Value;
use storage::repository::{CachedIdentity, IdentityCache};

use crate::diagnostics::{Diagnostics, Stage};
use crate::endpoints::SESSION_LOOKUP;
use crate::error::CandidateMissReason;
use crate::shape::{first_id, id_text};
use crate::transport::{Transport, fetch_success};

const IDENTITY_FIELDS: [&str; 4] = ["id", "_id", "userId", "studentId"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    Explicit,
    Cache,
    SessionLookup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityResolution {
    Resolved {
        student_id: StudentId,
        source: IdentitySource,
    },
    /// No identity anywhere; downstream stages must not run.
    Unresolved,
}

impl IdentityResolution {
    #[must_use]
    pub fn student_id(&self) -> Option<&StudentId> {
        match self {
            IdentityResolution::Resolved { student_id, .. } => Some(student_id),
            IdentityResolution::Unresolved => None,
        }
    }
}

/// Read the identity out of a session-lookup body.
///
/// Accepts `id`, `_id`, `userId`, `studentId` at the top level or under `user`.
#[must_use]
pub fn identity_of(body: &Value) -> Option<StudentId> {
    let obj = body.as_object()?;
    first_id(obj, &IDENTITY_FIELDS)
        .or_else(|| match obj.get("user") {
            Some(Value::Object(user)) => first_id(user, &IDENTITY_FIELDS),
            Some(other) => id_text(other),
            None => None,
        })
        .and_then(|raw| StudentId::new(raw).ok())
}

/// Resolves the student identity: explicit value, then local cache, then session lookup.
#[derive(Clone)]
pub struct IdentityResolver {
    explicit: Option<StudentId>,
    cache: Arc<dyn IdentityCache>,
    transport: Arc<dyn Transport>,
    clock: Clock,
}

impl IdentityResolver {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<dyn IdentityCache>, clock: Clock) -> Self {
        Self {
            explicit: None,
            cache,
            transport,
            clock,
        }
    }

    /// Identity supplied directly by the caller; wins over everything else.
    #[must_use]
    pub fn with_explicit(mut self, explicit: Option<StudentId>) -> Self {
        self.explicit = explicit;
        self
    }

    pub fn set_explicit(&mut self, explicit: Option<StudentId>) {
        self.explicit = explicit;
    }

    /// Resolve the identity. Never fails: errors degrade to `Unresolved`.
    pub async fn resolve(&self, diagnostics: &mut Diagnostics) -> IdentityResolution {
        if let Some(student_id) = &self.explicit {
            return IdentityResolution::Resolved {
                student_id: student_id.clone(),
                source: IdentitySource::Explicit,
            };
        }

        match self.cache.load_identity().await {
            Ok(Some(cached)) => {
                return IdentityResolution::Resolved {
                    student_id: cached.student_id,
                    source: IdentitySource::Cache,
                };
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "identity cache unreadable"),
        }

        let looked_up = match fetch_success(self.transport.as_ref(), SESSION_LOOKUP).await {
            Ok(body) => identity_of(&body).ok_or(CandidateMissReason::UnrecognizedShape),
            Err(reason) => Err(reason),
        };
        diagnostics.record(
            Stage::Identity,
            SESSION_LOOKUP,
            None,
            looked_up.as_ref().map(|_| 1).map_err(CandidateMissReason::clone),
        );

        let Ok(student_id) = looked_up else {
            tracing::info!("student identity unresolved");
            return IdentityResolution::Unresolved;
        };

        let entry = CachedIdentity {
            student_id: student_id.clone(),
            stored_at: self.clock.now(),
        };
        if let Err(err) = self.cache.store_identity(&entry).await {
            tracing::warn!(error = %err, "failed to cache student identity");
        }

        IdentityResolution::Resolved {
            student_id,
            source: IdentitySource::SessionLookup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FixtureTransport;
    use mentornet_core::time::fixed_now;
    use serde_json::json;
    use storage::repository::InMemoryRepository;

    fn resolver(transport: &Arc<FixtureTransport>, cache: &InMemoryRepository) -> IdentityResolver {
        IdentityResolver::new(
            transport.clone(),
            Arc::new(cache.clone()),
            Clock::fixed(fixed_now()),
        )
    }

    #[test]
    fn identity_aliases() {
        assert_eq!(identity_of(&json!({ "id": "s1" })).unwrap().as_str(), "s1");
        assert_eq!(identity_of(&json!({ "userId": 42 })).unwrap().as_str(), "42");
        assert_eq!(
            identity_of(&json!({ "user": { "_id": "s2" } })).unwrap().as_str(),
            "s2"
        );
        assert_eq!(identity_of(&json!({ "user": null })), None);
        assert_eq!(identity_of(&json!({ "id": "" })), None);
    }

    #[tokio::test]
    async fn explicit_identity_skips_cache_and_lookup() {
        let transport = Arc::new(FixtureTransport::new());
        let cache = InMemoryRepository::new();
        let resolver =
            resolver(&transport, &cache).with_explicit(Some(StudentId::new("given").unwrap()));

        let mut diagnostics = Diagnostics::new();
        let resolved = resolver.resolve(&mut diagnostics).await;

        assert_eq!(resolved.student_id().unwrap().as_str(), "given");
        assert!(transport.calls().is_empty());
        assert_eq!(cache.load_identity().await.unwrap(), None);
    }

    #[tokio::test]
    async fn session_lookup_is_cached_and_reused() {
        let transport =
            Arc::new(FixtureTransport::new().with_json(SESSION_LOOKUP, 200, json!({ "id": "s1" })));
        let cache = InMemoryRepository::new();
        let resolver = resolver(&transport, &cache);

        let mut diagnostics = Diagnostics::new();
        let first = resolver.resolve(&mut diagnostics).await;
        assert_eq!(
            first,
            IdentityResolution::Resolved {
                student_id: StudentId::new("s1").unwrap(),
                source: IdentitySource::SessionLookup,
            }
        );
        let cached = cache.load_identity().await.unwrap().unwrap();
        assert_eq!(cached.student_id.as_str(), "s1");
        assert_eq!(cached.stored_at, fixed_now());

        let second = resolver.resolve(&mut diagnostics).await;
        assert_eq!(
            second,
            IdentityResolution::Resolved {
                student_id: StudentId::new("s1").unwrap(),
                source: IdentitySource::Cache,
            }
        );
        assert_eq!(transport.call_count(SESSION_LOOKUP), 1);
    }

    #[tokio::test]
    async fn failed_lookup_is_unresolved_and_not_cached() {
        let transport =
            Arc::new(FixtureTransport::new().with_failure(SESSION_LOOKUP, "offline"));
        let cache = InMemoryRepository::new();

        let mut diagnostics = Diagnostics::new();
        let resolved = resolver(&transport, &cache).resolve(&mut diagnostics).await;

        assert_eq!(resolved, IdentityResolution::Unresolved);
        assert_eq!(cache.load_identity().await.unwrap(), None);
        assert_eq!(diagnostics.misses().count(), 1);
    }

    #[tokio::test]
    async fn lookup_without_id_field_is_unresolved() {
        let transport = Arc::new(
            FixtureTransport::new().with_json(SESSION_LOOKUP, 200, json!({ "email": "a@b.c" })),
        );
        let cache = InMemoryRepository::new();

        let mut diagnostics = Diagnostics::new();
        let resolved = resolver(&transport, &cache).resolve(&mut diagnostics).await;

        assert_eq!(resolved, IdentityResolution::Unresolved);
        assert_eq!(
            diagnostics.attempts()[0].outcome,
            Err(CandidateMissReason::UnrecognizedShape)
        );
    }
}
